// Copyright 2025 Webmobix Solutions AG
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUTHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration document of the writer.
//!
//! One invocation is driven by a single `config.json` inside the data
//! directory: which top-level action to run, which tables to push into which
//! spreadsheet tabs, and the authorization material used to build the Google
//! API transport.

use crate::utils::errors::WriterError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default pre-flight ceiling on `columns * rows` of a source table.
pub const DEFAULT_CELL_LIMIT: u64 = 10_000_000;

/// Top-level operation selected by the configuration document.
///
/// `Run` performs the full synchronization over all configured tables; the
/// remaining actions are single-target introspection/management operations
/// that consume the first `tables` entry and print a JSON result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppAction {
    Run,
    GetSpreadsheet,
    CreateSpreadsheet,
    AddSheet,
    DeleteSheet,
}

impl Default for AppAction {
    fn default() -> Self {
        AppAction::Run
    }
}

impl AppAction {
    pub fn name(&self) -> &'static str {
        match self {
            AppAction::Run => "run",
            AppAction::GetSpreadsheet => "getSpreadsheet",
            AppAction::CreateSpreadsheet => "createSpreadsheet",
            AppAction::AddSheet => "addSheet",
            AppAction::DeleteSheet => "deleteSheet",
        }
    }
}

/// Per-sheet synchronization action.
///
/// `Create` never reaches the upload engine: the orchestrator resolves it
/// against live spreadsheet state into `Append` (tab already exists) or
/// `Update` (tab freshly added) before any data is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetAction {
    Create,
    Update,
    Append,
}

/// Optional parent folder reference, used by the create flows only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// One configured synchronization job: a source table mapped to a spreadsheet
/// tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetTarget {
    /// Ordering key, informational.
    pub id: u32,
    #[serde(rename = "fileId", default)]
    pub file_id: String,
    /// Spreadsheet display name, used for diagnostics only.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub folder: Option<Folder>,
    pub action: SheetAction,
    #[serde(rename = "tableId", default)]
    pub table_id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Numeric id of the tab. Absent for `create` until resolved. Accepts a
    /// numeric string, which some upstream producers emit.
    #[serde(
        rename = "sheetId",
        default,
        deserialize_with = "deserialize_sheet_id"
    )]
    pub sheet_id: Option<i64>,
    #[serde(rename = "sheetTitle", default)]
    pub sheet_title: String,
}

impl SheetTarget {
    /// Human-readable spreadsheet label for error messages: the configured
    /// title when present, the file id otherwise.
    pub fn file_label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.file_id)
    }
}

fn default_enabled() -> bool {
    true
}

fn deserialize_sheet_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(number)) => number
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom("sheetId must be an integer")),
        Some(serde_json::Value::String(raw)) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("sheetId is not numeric: \"{raw}\""))),
        Some(other) => Err(D::Error::custom(format!(
            "sheetId must be a number or numeric string, got {other}"
        ))),
    }
}

/// `parameters` block of the configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct Parameters {
    /// Injected from the `--data` CLI argument; a value in the file is
    /// overwritten on load.
    #[serde(default)]
    pub data_dir: String,
    /// Pre-flight cell ceiling. Platform policy value, kept configurable.
    #[serde(default = "default_cell_limit")]
    pub cell_limit: u64,
    /// Service-account key, either as an embedded object or a JSON string.
    #[serde(rename = "#serviceAccountJson", default)]
    pub service_account_json: Option<serde_json::Value>,
    pub tables: Vec<SheetTarget>,
}

fn default_cell_limit() -> u64 {
    DEFAULT_CELL_LIMIT
}

/// OAuth credential block as provisioned by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct OauthCredentials {
    #[serde(rename = "appKey", default)]
    pub app_key: String,
    #[serde(rename = "#appSecret", default)]
    pub app_secret: String,
    /// JSON string holding the token payload (`access_token`,
    /// `refresh_token`).
    #[serde(rename = "#data", default)]
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OauthApi {
    pub credentials: OauthCredentials,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Authorization {
    #[serde(default)]
    pub oauth_api: Option<OauthApi>,
}

/// The full configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub action: AppAction,
    pub parameters: Parameters,
    #[serde(default)]
    pub authorization: Option<Authorization>,
}

impl Config {
    /// Loads and validates `config.json` from the data directory, injecting
    /// the directory path into `parameters.data_dir`.
    pub fn load(data_dir: &Path) -> Result<Self, WriterError> {
        let path = data_dir.join("config.json");
        let raw = std::fs::read_to_string(&path).map_err(|err| {
            WriterError::user(format!("Cannot read configuration {}: {err}", path.display()))
        })?;
        let mut config = Self::parse(&raw)?;
        config.parameters.data_dir = data_dir.display().to_string();
        config.validate()?;
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self, WriterError> {
        serde_json::from_str(raw)
            .map_err(|err| WriterError::user(format!("Invalid configuration: {err}")))
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.parameters.data_dir)
    }

    pub fn validate(&self) -> Result<(), WriterError> {
        if self.parameters.data_dir.is_empty() {
            return Err(WriterError::user("Data folder not set."));
        }

        if self.action != AppAction::Run && self.parameters.tables.is_empty() {
            return Err(WriterError::user(format!(
                "Action \"{}\" requires one configured table entry.",
                self.action.name()
            )));
        }

        for table in &self.parameters.tables {
            if table.file_id.is_empty() {
                return Err(WriterError::user(format!(
                    "Table {} is missing \"fileId\".",
                    table.id
                )));
            }
            // Management actions only need ids; a sheet title is required
            // where data will be written.
            if self.action == AppAction::Run && table.enabled && table.sheet_title.is_empty() {
                return Err(WriterError::user(format!(
                    "Table {} is missing \"sheetTitle\".",
                    table.id
                )));
            }
        }

        Ok(())
    }

    /// First configured table entry, consumed by the single-target actions.
    pub fn first_table(&self) -> Result<&SheetTarget, WriterError> {
        self.parameters
            .tables
            .first()
            .ok_or_else(|| WriterError::user("No table configured."))
    }
}
