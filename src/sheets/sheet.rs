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

//! Per-target sheet synchronization engine.
//!
//! Takes one resolved [`SheetTarget`] and one source [`Table`] and reconciles
//! the remote tab's metadata and cell contents with the source, page by page.

use crate::config::{SheetAction, SheetTarget};
use crate::input::paginator::Paginator;
use crate::input::table::Table;
use crate::sheets::api::{ApiError, SheetsApi, UploadResponse, count_updated_rows};
use crate::sheets::range::build_range;
use crate::utils::errors::WriterError;
use google_sheets4::FieldMask;
use google_sheets4::api::{
    GridProperties, Request, SheetProperties, Spreadsheet, UpdateSheetPropertiesRequest,
};
use tracing::{debug, info};

/// Locates a tab's properties in a spreadsheet document by numeric sheet id.
pub fn find_sheet_properties(spreadsheet: &Spreadsheet, sheet_id: i64) -> Option<SheetProperties> {
    spreadsheet.sheets.as_ref()?.iter().find_map(|sheet| {
        let properties = sheet.properties.as_ref()?;
        (properties.sheet_id.map(i64::from) == Some(sheet_id)).then(|| properties.clone())
    })
}

/// Grid extent sent with a metadata update.
#[derive(Debug, Clone, Copy)]
struct GridSize {
    column_count: usize,
    row_count: usize,
}

pub struct SheetSync<'a, C> {
    client: &'a C,
    table: &'a Table,
    cell_limit: u64,
}

impl<'a, C: SheetsApi> SheetSync<'a, C> {
    pub fn new(client: &'a C, table: &'a Table, cell_limit: u64) -> Self {
        Self {
            client,
            table,
            cell_limit,
        }
    }

    /// Synchronizes one target and validates the written row count.
    ///
    /// Any HTTP 4xx raised along the way is re-wrapped into a user error
    /// carrying the response body and reason, so the operator sees the remote
    /// diagnosis instead of a bare transport failure.
    pub async fn process(&self, target: &SheetTarget) -> Result<Vec<UploadResponse>, WriterError> {
        match self.sync(target).await {
            Err(WriterError::Api(ApiError::Http {
                status,
                reason,
                body,
            })) if (400..500).contains(&status) => Err(WriterError::User(format!(
                "Google API request failed with status {status} ({reason}): {body}"
            ))),
            other => other,
        }
    }

    async fn sync(&self, target: &SheetTarget) -> Result<Vec<UploadResponse>, WriterError> {
        let sheet_id = target.sheet_id.ok_or_else(|| {
            WriterError::application(format!(
                "Sheet id missing for \"{}\" after action resolution",
                target.sheet_title
            ))
        })?;

        let properties = self.sheet_properties(&target.file_id, sheet_id).await?;
        let properties = self.pre_flight_checks(target, sheet_id, properties)?;

        let column_count_src = self.table.column_count();
        let row_count_src = self.table.row_count();
        let row_count_dst = properties
            .grid_properties
            .as_ref()
            .and_then(|grid| grid.row_count)
            .unwrap_or(0)
            .max(0) as usize;

        // Adjust the column extent first while keeping the destination row
        // count: shrinking rows before columns are set produces a transient
        // truncated rendering in the Sheets UI.
        self.update_metadata(
            target,
            sheet_id,
            Some(GridSize {
                column_count: column_count_src,
                row_count: row_count_dst,
            }),
        )
        .await?;

        let responses = match target.action {
            SheetAction::Update => {
                // Clear the prior extent so no stale cells survive a shrink.
                self.client
                    .clear_values(
                        &target.file_id,
                        &build_range(&target.sheet_title, column_count_src, 1, row_count_dst),
                    )
                    .await?;

                // Only now shrink/grow the row extent to match the source.
                self.update_metadata(
                    target,
                    sheet_id,
                    Some(GridSize {
                        column_count: column_count_src,
                        row_count: row_count_src,
                    }),
                )
                .await?;

                self.update_action(target).await?
            }
            SheetAction::Append => self.append_action(target).await?,
            SheetAction::Create => {
                // Resolution upstream rewrites create into update/append;
                // reaching this arm is a defect, not bad input.
                return Err(WriterError::application(format!(
                    "Unknown action \"create\" for sheet \"{}\"",
                    target.sheet_title
                )));
            }
        };

        let row_count_written = count_updated_rows(&responses);
        validate_row_count(row_count_src, row_count_written, target)?;

        Ok(responses)
    }

    fn pre_flight_checks(
        &self,
        target: &SheetTarget,
        sheet_id: i64,
        properties: Option<SheetProperties>,
    ) -> Result<SheetProperties, WriterError> {
        let Some(properties) = properties else {
            return Err(WriterError::user(format!(
                "Sheet \"{}\" ({}) not found in file \"{}\" ({})",
                target.sheet_title,
                sheet_id,
                target.file_label(),
                target.file_id
            )));
        };

        let cell_count = self.table.column_count() as u64 * self.table.row_count() as u64;
        if cell_count > self.cell_limit {
            return Err(WriterError::user(format!(
                "CSV file exceeds the limit of {} cells",
                self.cell_limit
            )));
        }

        Ok(properties)
    }

    async fn update_action(
        &self,
        target: &SheetTarget,
    ) -> Result<Vec<UploadResponse>, WriterError> {
        info!(
            "📤 Updating values in sheet \"{}\" of file \"{}\"",
            target.sheet_title,
            target.file_label()
        );

        let mut responses = Vec::new();
        for page in Paginator::new(self.table.rows()?) {
            let page = page?;
            let offset = page.offset();
            let range = build_range(
                &target.sheet_title,
                self.table.column_count(),
                offset,
                page.limit(),
            );

            let response = self
                .client
                .update_values(&target.file_id, &range, page.into_values())
                .await?;
            debug!(
                "Updated range {} of file \"{}\" (offset {}): {:?}",
                range, target.file_id, offset, response
            );
            responses.push(UploadResponse::Updated(response));
        }

        Ok(responses)
    }

    async fn append_action(
        &self,
        target: &SheetTarget,
    ) -> Result<Vec<UploadResponse>, WriterError> {
        info!(
            "📥 Appending values to sheet \"{}\" of file \"{}\"",
            target.sheet_title,
            target.file_label()
        );

        // One probe decides the header handling for the whole run; a
        // concurrent edit of the destination after this point is not detected.
        let sheet_has_header = self.has_header(target).await?;

        let mut responses = Vec::new();
        let encoded_title = urlencoding::encode(&target.sheet_title).into_owned();
        for page in Paginator::new(self.table.rows()?) {
            let page = page?;
            let offset = page.offset();
            let is_first = page.is_first();
            let mut values = page.into_values();
            if is_first && sheet_has_header && !values.is_empty() {
                // The destination already carries a header row; drop the
                // source's copy so it is not appended twice.
                values.remove(0);
            }

            let response = self
                .client
                .append_values(&target.file_id, &encoded_title, values)
                .await?;
            debug!(
                "Appended to sheet \"{}\" of file \"{}\" (offset {}): {:?}",
                target.sheet_title, target.file_id, offset, response
            );
            responses.push(UploadResponse::Appended(response));
        }

        Ok(responses)
    }

    /// Whether the destination sheet already has any value in its first row.
    async fn has_header(&self, target: &SheetTarget) -> Result<bool, WriterError> {
        let range = build_range(&target.sheet_title, self.table.column_count(), 1, 1);
        let first_row = self.client.get_values(&target.file_id, &range).await?;

        Ok(!first_row.values.unwrap_or_default().is_empty())
    }

    /// Updates the tab's title and, when given, its grid extent in one batch
    /// call. The fields mask lists exactly what changes; a superset would
    /// reset the unnamed properties on the remote side.
    async fn update_metadata(
        &self,
        target: &SheetTarget,
        sheet_id: i64,
        grid: Option<GridSize>,
    ) -> Result<(), WriterError> {
        let mut properties = SheetProperties {
            sheet_id: Some(sheet_id as i32),
            title: Some(target.sheet_title.clone()),
            ..Default::default()
        };

        let fields = if let Some(grid) = grid {
            properties.grid_properties = Some(GridProperties {
                column_count: Some(grid.column_count as i32),
                row_count: Some(grid.row_count as i32),
                ..Default::default()
            });
            FieldMask::new(&["title", "gridProperties"])
        } else {
            FieldMask::new(&["title"])
        };

        let request = Request {
            update_sheet_properties: Some(UpdateSheetPropertiesRequest {
                properties: Some(properties),
                fields: Some(fields),
                ..Default::default()
            }),
            ..Default::default()
        };

        self.client
            .batch_update_spreadsheet(&target.file_id, vec![request])
            .await?;

        Ok(())
    }

    async fn sheet_properties(
        &self,
        file_id: &str,
        sheet_id: i64,
    ) -> Result<Option<SheetProperties>, WriterError> {
        let spreadsheet = self.client.get_spreadsheet(file_id).await?;

        Ok(find_sheet_properties(&spreadsheet, sheet_id))
    }
}

/// Reconciles the API-reported written row count with the source row count.
///
/// Append accepts an undercount of exactly one row: when the destination
/// already had a header, the source's header row was deduplicated away. Every
/// other action requires exact equality.
///
/// Runs only after all pages of a target have been uploaded. There is no
/// rollback: a mismatch leaves the already-written pages on the destination
/// sheet.
pub fn validate_row_count(
    row_count_src: usize,
    row_count_written: usize,
    target: &SheetTarget,
) -> Result<(), WriterError> {
    let is_append = target.action == SheetAction::Append;
    let exact_match = row_count_src == row_count_written;
    let append_match = is_append && (exact_match || row_count_written + 1 == row_count_src);

    if exact_match || append_match {
        return Ok(());
    }

    Err(WriterError::user(format!(
        "Number of written rows ({}) in the sheet does not match with source table ({}). \
         File \"{}\" ({}), sheet \"{}\" ({}). \
         Try disabling all filters in the sheet and run the writer again.",
        row_count_written,
        row_count_src,
        target.file_label(),
        target.file_id,
        target.sheet_title,
        target.sheet_id.unwrap_or_default()
    )))
}
