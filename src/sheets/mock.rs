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

//! Recording [`SheetsApi`] double for the engine and orchestrator tests.

use crate::sheets::api::{ApiError, SheetsApi};
use google_sheets4::api::{
    AddSheetResponse, AppendValuesResponse, BatchUpdateSpreadsheetResponse, GridProperties,
    Request, Response, Sheet, SheetProperties, Spreadsheet, SpreadsheetProperties,
    UpdateValuesResponse, ValueRange,
};
use std::sync::Mutex;

/// Every remote call the mock has served, in order.
#[derive(Debug, Clone)]
pub enum RecordedCall {
    GetSpreadsheet {
        file_id: String,
    },
    BatchUpdate {
        file_id: String,
        requests: Vec<Request>,
        /// `(column_count, row_count)` of the first update-sheet-properties
        /// request, for terse assertions.
        grid: Option<(i32, i32)>,
    },
    ClearValues {
        file_id: String,
        range: String,
    },
    UpdateValues {
        file_id: String,
        range: String,
        rows: Vec<Vec<String>>,
    },
    AppendValues {
        file_id: String,
        range: String,
        rows: Vec<Vec<String>>,
    },
    GetValues {
        file_id: String,
        range: String,
    },
    AddSheet {
        file_id: String,
        title: String,
    },
    DeleteSheet {
        file_id: String,
        sheet_id: i64,
    },
    CreateFile {
        title: String,
        parent_folder: Option<String>,
    },
}

impl RecordedCall {
    fn is_write(&self) -> bool {
        matches!(
            self,
            RecordedCall::BatchUpdate { .. }
                | RecordedCall::ClearValues { .. }
                | RecordedCall::UpdateValues { .. }
                | RecordedCall::AppendValues { .. }
                | RecordedCall::AddSheet { .. }
                | RecordedCall::DeleteSheet { .. }
                | RecordedCall::CreateFile { .. }
        )
    }
}

pub struct MockSheetsApi {
    spreadsheet: Mutex<Spreadsheet>,
    first_row: Mutex<Option<Vec<String>>>,
    written_rows_override: Mutex<Option<i32>>,
    fail_next: Mutex<Option<ApiError>>,
    next_sheet_id: Mutex<i64>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockSheetsApi {
    pub fn new() -> Self {
        Self::with_spreadsheet(Spreadsheet {
            spreadsheet_id: Some("file-1".into()),
            properties: Some(SpreadsheetProperties {
                title: Some("titanic".into()),
                ..Default::default()
            }),
            sheets: Some(Vec::new()),
            ..Default::default()
        })
    }

    pub fn with_spreadsheet(spreadsheet: Spreadsheet) -> Self {
        Self {
            spreadsheet: Mutex::new(spreadsheet),
            first_row: Mutex::new(None),
            written_rows_override: Mutex::new(None),
            fail_next: Mutex::new(None),
            next_sheet_id: Mutex::new(1000),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A spreadsheet with a single tab of the given identity and grid extent.
    pub fn with_sheet(sheet_id: i64, title: &str, row_count: i32, column_count: i32) -> Self {
        let mock = Self::new();
        mock.add_existing_sheet(sheet_id, title, row_count, column_count);
        mock
    }

    pub fn add_existing_sheet(
        &self,
        sheet_id: i64,
        title: &str,
        row_count: i32,
        column_count: i32,
    ) {
        let mut spreadsheet = self.spreadsheet.lock().unwrap();
        spreadsheet
            .sheets
            .get_or_insert_with(Vec::new)
            .push(Sheet {
                properties: Some(SheetProperties {
                    sheet_id: Some(sheet_id as i32),
                    title: Some(title.to_string()),
                    grid_properties: Some(GridProperties {
                        row_count: Some(row_count),
                        column_count: Some(column_count),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            });
    }

    /// Makes the header probe return this row.
    pub fn set_first_row(&self, row: Vec<String>) {
        *self.first_row.lock().unwrap() = Some(row);
    }

    /// Makes every upload response report this row count instead of the
    /// actual payload size, simulating a destination-side undercount.
    pub fn set_written_rows_override(&self, rows: i32) {
        *self.written_rows_override.lock().unwrap() = Some(rows);
    }

    /// Arms a one-shot failure served by the next call.
    pub fn fail_next(&self, err: ApiError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn write_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.is_write())
            .count()
    }

    fn record(&self, call: RecordedCall) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn written_rows(&self, actual: usize) -> i32 {
        self.written_rows_override
            .lock()
            .unwrap()
            .unwrap_or(actual as i32)
    }
}

fn first_grid_update(requests: &[Request]) -> Option<(i32, i32)> {
    requests.iter().find_map(|request| {
        let grid = request
            .update_sheet_properties
            .as_ref()?
            .properties
            .as_ref()?
            .grid_properties
            .as_ref()?;
        Some((grid.column_count?, grid.row_count?))
    })
}

impl SheetsApi for MockSheetsApi {
    async fn get_spreadsheet(&self, file_id: &str) -> Result<Spreadsheet, ApiError> {
        self.record(RecordedCall::GetSpreadsheet {
            file_id: file_id.to_string(),
        })?;
        Ok(self.spreadsheet.lock().unwrap().clone())
    }

    async fn batch_update_spreadsheet(
        &self,
        file_id: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateSpreadsheetResponse, ApiError> {
        self.record(RecordedCall::BatchUpdate {
            file_id: file_id.to_string(),
            grid: first_grid_update(&requests),
            requests,
        })?;
        Ok(BatchUpdateSpreadsheetResponse::default())
    }

    async fn clear_values(&self, file_id: &str, range: &str) -> Result<(), ApiError> {
        self.record(RecordedCall::ClearValues {
            file_id: file_id.to_string(),
            range: range.to_string(),
        })
    }

    async fn update_values(
        &self,
        file_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<UpdateValuesResponse, ApiError> {
        let written = self.written_rows(rows.len());
        self.record(RecordedCall::UpdateValues {
            file_id: file_id.to_string(),
            range: range.to_string(),
            rows,
        })?;
        Ok(UpdateValuesResponse {
            updated_rows: Some(written),
            ..Default::default()
        })
    }

    async fn append_values(
        &self,
        file_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<AppendValuesResponse, ApiError> {
        let written = self.written_rows(rows.len());
        self.record(RecordedCall::AppendValues {
            file_id: file_id.to_string(),
            range: range.to_string(),
            rows,
        })?;
        Ok(AppendValuesResponse {
            updates: Some(UpdateValuesResponse {
                updated_rows: Some(written),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    async fn get_values(&self, file_id: &str, range: &str) -> Result<ValueRange, ApiError> {
        self.record(RecordedCall::GetValues {
            file_id: file_id.to_string(),
            range: range.to_string(),
        })?;
        let values = self.first_row.lock().unwrap().clone().map(|row| {
            vec![row.into_iter().map(serde_json::Value::String).collect()]
        });
        Ok(ValueRange {
            values,
            ..Default::default()
        })
    }

    async fn add_sheet(
        &self,
        file_id: &str,
        title: &str,
    ) -> Result<BatchUpdateSpreadsheetResponse, ApiError> {
        self.record(RecordedCall::AddSheet {
            file_id: file_id.to_string(),
            title: title.to_string(),
        })?;

        let sheet_id = {
            let mut next = self.next_sheet_id.lock().unwrap();
            *next += 1;
            *next
        };
        // New tabs come with the platform's default grid.
        self.add_existing_sheet(sheet_id, title, 1000, 26);

        Ok(BatchUpdateSpreadsheetResponse {
            replies: Some(vec![Response {
                add_sheet: Some(AddSheetResponse {
                    properties: Some(SheetProperties {
                        sheet_id: Some(sheet_id as i32),
                        title: Some(title.to_string()),
                        ..Default::default()
                    }),
                }),
                ..Default::default()
            }]),
            ..Default::default()
        })
    }

    async fn delete_sheet(
        &self,
        file_id: &str,
        sheet_id: i64,
    ) -> Result<BatchUpdateSpreadsheetResponse, ApiError> {
        self.record(RecordedCall::DeleteSheet {
            file_id: file_id.to_string(),
            sheet_id,
        })?;
        Ok(BatchUpdateSpreadsheetResponse::default())
    }

    async fn create_file_metadata(
        &self,
        title: &str,
        parent_folder: Option<&str>,
    ) -> Result<google_drive3::api::File, ApiError> {
        self.record(RecordedCall::CreateFile {
            title: title.to_string(),
            parent_folder: parent_folder.map(str::to_string),
        })?;
        Ok(google_drive3::api::File {
            id: Some("created-file".into()),
            name: Some(title.to_string()),
            ..Default::default()
        })
    }
}
