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

//! Orchestration across configured sheet targets, plus the single-target
//! management operations behind the non-`run` actions.

use crate::config::{SheetAction, SheetTarget};
use crate::input::TableFactory;
use crate::sheets::api::SheetsApi;
use crate::sheets::sheet::SheetSync;
use crate::utils::errors::WriterError;
use google_sheets4::api::{SheetProperties, Spreadsheet};
use tracing::{info, warn};

/// Tab count above which a warning is emitted when adding another one.
const TAB_COUNT_WARNING: usize = 150;
/// The platform's documented ceiling on tabs per spreadsheet.
const TAB_COUNT_LIMIT: usize = 200;

pub struct SheetsWriter<C> {
    pub(crate) client: C,
    input: TableFactory,
    cell_limit: u64,
}

impl<C: SheetsApi> SheetsWriter<C> {
    pub fn new(client: C, input: TableFactory, cell_limit: u64) -> Self {
        Self {
            client,
            input,
            cell_limit,
        }
    }

    /// Synchronizes every enabled target, strictly in configured order. Each
    /// target fully completes (including row-count validation) before the
    /// next begins; disabled targets cause no API traffic at all.
    pub async fn process(&self, targets: &[SheetTarget]) -> Result<(), WriterError> {
        for target in targets {
            if !target.enabled {
                info!("⏭️ Sheet \"{}\" is disabled, skipping", target.sheet_title);
                continue;
            }

            let mut target = target.clone();
            if target.action == SheetAction::Create {
                target = self.resolve_create_action(target).await?;
            }

            info!(
                "📊 Processing sheet \"{}\" in file \"{}\"",
                target.sheet_title,
                target.file_label()
            );

            let table = self.input.table(&target.table_id)?;
            let sheet = SheetSync::new(&self.client, &table, self.cell_limit);
            sheet.process(&target).await?;
        }

        Ok(())
    }

    /// Rewrites a `create` target against live spreadsheet state: when a tab
    /// with the configured title already exists its id is adopted and data is
    /// appended; otherwise the tab is added and written from scratch.
    async fn resolve_create_action(
        &self,
        mut target: SheetTarget,
    ) -> Result<SheetTarget, WriterError> {
        let spreadsheet = self.client.get_spreadsheet(&target.file_id).await?;
        let sheets = spreadsheet.sheets.unwrap_or_default();

        for sheet in &sheets {
            let Some(properties) = sheet.properties.as_ref() else {
                continue;
            };
            if properties.title.as_deref() == Some(target.sheet_title.as_str()) {
                target.sheet_id = properties.sheet_id.map(i64::from);
                target.action = SheetAction::Append;
                info!(
                    "Sheet \"{}\" found in spreadsheet, appending data",
                    target.sheet_title
                );
                return Ok(target);
            }
        }

        let response = self
            .client
            .add_sheet(&target.file_id, &target.sheet_title)
            .await?;
        target.sheet_id = Some(added_sheet_id(response.replies)?);
        target.action = SheetAction::Update;
        info!(
            "Sheet \"{}\" not found in spreadsheet, creating new tab",
            target.sheet_title
        );

        let tab_count = sheets.len() + 1;
        if tab_count > TAB_COUNT_WARNING {
            warn!(
                "Spreadsheet has {} tabs. Google Sheets limit is {}.",
                tab_count, TAB_COUNT_LIMIT
            );
        }

        Ok(target)
    }

    pub async fn get_spreadsheet(&self, file_id: &str) -> Result<Spreadsheet, WriterError> {
        Ok(self.client.get_spreadsheet(file_id).await?)
    }

    /// Creates an empty spreadsheet file (optionally inside the configured
    /// folder) and returns the freshly fetched document.
    pub async fn create_spreadsheet(
        &self,
        target: &SheetTarget,
    ) -> Result<Spreadsheet, WriterError> {
        let file_id = self.create_file_metadata(target).await?;

        self.get_spreadsheet(&file_id).await
    }

    pub async fn create_file_metadata(&self, target: &SheetTarget) -> Result<String, WriterError> {
        let parent_folder = target
            .folder
            .as_ref()
            .and_then(|folder| folder.id.as_deref());
        let title = target.title.as_deref().unwrap_or(&target.sheet_title);

        let file = self
            .client
            .create_file_metadata(title, parent_folder)
            .await?;

        file.id.ok_or_else(|| {
            WriterError::application("File creation response carries no file id")
        })
    }

    /// Find-or-add a tab by title; returns its properties either way.
    pub async fn add_sheet(&self, target: &SheetTarget) -> Result<SheetProperties, WriterError> {
        info!("➕ Add sheet \"{}\"", target.sheet_title);

        let spreadsheet = self.client.get_spreadsheet(&target.file_id).await?;
        if let Some(sheets) = spreadsheet.sheets {
            for sheet in sheets {
                if let Some(properties) = sheet.properties
                    && properties.title.as_deref() == Some(target.sheet_title.as_str())
                {
                    return Ok(properties);
                }
            }
        }

        let response = self
            .client
            .add_sheet(&target.file_id, &target.sheet_title)
            .await?;

        response
            .replies
            .and_then(|mut replies| replies.drain(..).next())
            .and_then(|reply| reply.add_sheet)
            .and_then(|added| added.properties)
            .ok_or_else(|| {
                WriterError::application("Add-sheet response carries no sheet properties")
            })
    }

    pub async fn delete_sheet(&self, target: &SheetTarget) -> Result<(), WriterError> {
        let sheet_id = target
            .sheet_id
            .ok_or_else(|| WriterError::user("Cannot delete a sheet without \"sheetId\"."))?;

        self.client.delete_sheet(&target.file_id, sheet_id).await?;

        Ok(())
    }
}

/// Digs the new tab's numeric id out of an add-sheet batch response.
fn added_sheet_id(
    replies: Option<Vec<google_sheets4::api::Response>>,
) -> Result<i64, WriterError> {
    replies
        .and_then(|mut replies| replies.drain(..).next())
        .and_then(|reply| reply.add_sheet)
        .and_then(|added| added.properties)
        .and_then(|properties| properties.sheet_id)
        .map(i64::from)
        .ok_or_else(|| {
            WriterError::application("Add-sheet response carries no sheet id")
        })
}
