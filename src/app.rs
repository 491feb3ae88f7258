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

//! Top-level action dispatch and API error translation.

use crate::config::{AppAction, Config};
use crate::input::TableFactory;
use crate::sheets::api::{ApiError, SheetsApi};
use crate::sheets::writer::SheetsWriter;
use crate::utils::errors::WriterError;
use serde_json::json;
use tracing::{info, warn};

/// Outcome of translating a transport error at the application boundary.
pub enum Translation {
    /// Access silently denied; the run ends with an empty result instead of
    /// failing.
    SoftForbidden,
    Fail(WriterError),
}

/// Maps an untranslated transport error into the operator-facing taxonomy.
pub fn translate_api_error(err: ApiError) -> Translation {
    match err {
        ApiError::Http { status: 401, .. } => Translation::Fail(WriterError::user(
            "Expired or wrong credentials, please reauthorize.",
        )),
        ApiError::Http {
            status: 403,
            reason,
            ..
        } if reason.eq_ignore_ascii_case("forbidden") => Translation::SoftForbidden,
        ApiError::Http {
            status: 403,
            reason,
            ..
        } => Translation::Fail(WriterError::user(format!("Reason: {reason}"))),
        ApiError::Http {
            status: 400,
            reason,
            body,
        } => Translation::Fail(WriterError::user(format!(
            "Google API request failed with status 400 ({reason}): {body}"
        ))),
        ApiError::Http { status: 404, .. } => {
            Translation::Fail(WriterError::user("File or folder not found."))
        }
        ApiError::Http {
            status,
            reason,
            body,
        } if (500..600).contains(&status) => Translation::Fail(WriterError::user(format!(
            "Google API error: status {status} ({reason}): {body}"
        ))),
        ApiError::Http {
            status,
            reason,
            body,
        } => Translation::Fail(WriterError::application(format!(
            "Google API request failed with status {status} ({reason}): {body}"
        ))),
        ApiError::Transport(message) => Translation::Fail(WriterError::application(message)),
    }
}

pub struct Application<C> {
    config: Config,
    writer: SheetsWriter<C>,
}

impl<C: SheetsApi> Application<C> {
    pub fn new(config: Config, client: C) -> Self {
        let input = TableFactory::new(config.data_dir());
        let writer = SheetsWriter::new(client, input, config.parameters.cell_limit);

        Self { config, writer }
    }

    /// Runs the configured action and returns its JSON result object.
    ///
    /// Transport errors that escaped every inner boundary are translated
    /// here; a 403 with reason "forbidden" downgrades to a warning and an
    /// empty result.
    pub async fn run(&self) -> Result<serde_json::Value, WriterError> {
        let result = match self.config.action {
            AppAction::Run => self.run_action().await,
            AppAction::GetSpreadsheet => self.get_spreadsheet_action().await,
            AppAction::CreateSpreadsheet => self.create_spreadsheet_action().await,
            AppAction::AddSheet => self.add_sheet_action().await,
            AppAction::DeleteSheet => self.delete_sheet_action().await,
        };

        match result {
            Err(WriterError::Api(api_error)) => match translate_api_error(api_error) {
                Translation::SoftForbidden => {
                    warn!("You don't have access to Google Drive resource.");
                    Ok(serde_json::Value::Array(Vec::new()))
                }
                Translation::Fail(err) => Err(err),
            },
            other => other,
        }
    }

    async fn run_action(&self) -> Result<serde_json::Value, WriterError> {
        self.writer.process(&self.config.parameters.tables).await?;

        Ok(json!({"status": "ok"}))
    }

    async fn get_spreadsheet_action(&self) -> Result<serde_json::Value, WriterError> {
        let table = self.config.first_table()?;
        let spreadsheet = self.writer.get_spreadsheet(&table.file_id).await?;

        Ok(json!({"status": "ok", "spreadsheet": spreadsheet}))
    }

    async fn create_spreadsheet_action(&self) -> Result<serde_json::Value, WriterError> {
        let table = self.config.first_table()?;
        info!("🆕 Create spreadsheet \"{}\"", table.file_label());
        let spreadsheet = self.writer.create_spreadsheet(table).await?;

        Ok(json!({"status": "ok", "spreadsheet": spreadsheet}))
    }

    async fn add_sheet_action(&self) -> Result<serde_json::Value, WriterError> {
        let table = self.config.first_table()?;
        let sheet = self.writer.add_sheet(table).await?;

        Ok(json!({"status": "ok", "sheet": sheet}))
    }

    async fn delete_sheet_action(&self) -> Result<serde_json::Value, WriterError> {
        let table = self.config.first_table()?;
        info!("🗑️ Delete sheet \"{}\"", table.sheet_title);
        self.writer.delete_sheet(table).await?;

        Ok(json!({"status": "ok"}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::mock::{MockSheetsApi, RecordedCall};
    use std::io::Write;
    use tempfile::TempDir;

    fn http(status: u16, reason: &str) -> ApiError {
        ApiError::Http {
            status,
            reason: reason.to_string(),
            body: String::new(),
        }
    }

    fn fail(translation: Translation) -> WriterError {
        match translation {
            Translation::Fail(err) => err,
            Translation::SoftForbidden => panic!("expected a hard failure"),
        }
    }

    #[test]
    fn translates_expired_credentials() {
        let err = fail(translate_api_error(http(401, "Unauthorized")));
        assert!(err.is_user());
        assert_eq!(
            err.to_string(),
            "Expired or wrong credentials, please reauthorize."
        );
    }

    #[test]
    fn forbidden_is_a_soft_failure() {
        assert!(matches!(
            translate_api_error(http(403, "forbidden")),
            Translation::SoftForbidden
        ));
        assert!(matches!(
            translate_api_error(http(403, "Forbidden")),
            Translation::SoftForbidden
        ));
    }

    #[test]
    fn other_403_reasons_fail_naming_the_reason() {
        let err = fail(translate_api_error(http(403, "dailyLimitExceeded")));
        assert!(err.is_user());
        assert_eq!(err.to_string(), "Reason: dailyLimitExceeded");
    }

    #[test]
    fn translates_not_found() {
        let err = fail(translate_api_error(http(404, "notFound")));
        assert!(err.is_user());
        assert_eq!(err.to_string(), "File or folder not found.");
    }

    #[test]
    fn bad_requests_surface_the_raw_message() {
        let err = fail(translate_api_error(ApiError::Http {
            status: 400,
            reason: "badRequest".into(),
            body: "{\"error\": {\"message\": \"Invalid range\"}}".into(),
        }));
        assert!(err.is_user());
        assert!(err.to_string().contains("Invalid range"));
    }

    #[test]
    fn server_errors_become_google_api_user_errors() {
        let err = fail(translate_api_error(http(502, "Bad Gateway")));
        assert!(err.is_user());
        assert!(err.to_string().starts_with("Google API error"));
    }

    #[test]
    fn everything_else_is_an_application_error() {
        let err = fail(translate_api_error(http(418, "teapot")));
        assert!(!err.is_user());

        let err = fail(translate_api_error(ApiError::Transport("dns failure".into())));
        assert!(!err.is_user());
    }

    fn config(action: &str, dir: &TempDir) -> Config {
        let raw = format!(
            r#"{{
                "action": "{action}",
                "parameters": {{
                    "data_dir": "{}",
                    "tables": [{{
                        "id": 0,
                        "fileId": "file-1",
                        "title": "titanic",
                        "action": "update",
                        "tableId": "casualties",
                        "sheetId": 99,
                        "sheetTitle": "casualties"
                    }}]
                }}
            }}"#,
            dir.path().display()
        );
        Config::parse(&raw).unwrap()
    }

    fn write_table(dir: &TempDir) {
        let tables_dir = dir.path().join("in").join("tables");
        std::fs::create_dir_all(&tables_dir).unwrap();
        let mut file = std::fs::File::create(tables_dir.join("casualties.csv")).unwrap();
        writeln!(file, "id,name").unwrap();
        writeln!(file, "1,Braund").unwrap();
    }

    #[tokio::test]
    async fn run_action_reports_ok() {
        let dir = TempDir::new().unwrap();
        write_table(&dir);
        let client = MockSheetsApi::with_sheet(99, "casualties", 5, 2);

        let app = Application::new(config("run", &dir), client);
        let result = app.run().await.unwrap();

        assert_eq!(result, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn get_spreadsheet_action_returns_the_document() {
        let dir = TempDir::new().unwrap();
        let client = MockSheetsApi::with_sheet(99, "casualties", 5, 2);

        let app = Application::new(config("getSpreadsheet", &dir), client);
        let result = app.run().await.unwrap();

        assert_eq!(result["status"], "ok");
        assert_eq!(result["spreadsheet"]["spreadsheetId"], "file-1");
    }

    #[tokio::test]
    async fn forbidden_resource_yields_an_empty_result() {
        let dir = TempDir::new().unwrap();
        let client = MockSheetsApi::new();
        client.fail_next(http(403, "forbidden"));

        let app = Application::new(config("getSpreadsheet", &dir), client);
        let result = app.run().await.unwrap();

        assert_eq!(result, serde_json::Value::Array(Vec::new()));
    }

    #[tokio::test]
    async fn quota_exhaustion_fails_with_the_reason() {
        let dir = TempDir::new().unwrap();
        let client = MockSheetsApi::new();
        client.fail_next(http(403, "dailyLimitExceeded"));

        let app = Application::new(config("getSpreadsheet", &dir), client);
        let err = app.run().await.unwrap_err();

        assert!(err.is_user());
        assert_eq!(err.to_string(), "Reason: dailyLimitExceeded");
    }

    #[tokio::test]
    async fn delete_sheet_action_reports_ok() {
        let dir = TempDir::new().unwrap();
        let client = MockSheetsApi::with_sheet(99, "casualties", 5, 2);

        let app = Application::new(config("deleteSheet", &dir), client);
        let result = app.run().await.unwrap();

        assert_eq!(result, json!({"status": "ok"}));
        assert!(matches!(
            app.writer.client.calls().last(),
            Some(RecordedCall::DeleteSheet { sheet_id: 99, .. })
        ));
    }

    #[tokio::test]
    async fn user_errors_from_the_engine_pass_through_untouched() {
        let dir = TempDir::new().unwrap();
        write_table(&dir);
        // The configured sheet id does not exist in the spreadsheet.
        let client = MockSheetsApi::with_sheet(7, "other", 5, 2);

        let app = Application::new(config("run", &dir), client);
        let err = app.run().await.unwrap_err();

        assert!(err.is_user());
        assert!(err.to_string().contains("not found in file"));
    }
}
