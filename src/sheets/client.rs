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

//! Production [`SheetsApi`] implementation over the Google Sheets and Drive
//! hubs, with transient-failure retries and error normalization.

use crate::auth::GoogleAuthenticator;
use crate::sheets::api::{ApiError, SheetsApi};
use crate::utils::errors::WriterError;
use google_drive3::DriveHub;
use google_sheets4::api::{
    AddSheetRequest, AppendValuesResponse, BatchUpdateSpreadsheetRequest,
    BatchUpdateSpreadsheetResponse, ClearValuesRequest, DeleteSheetRequest, Request,
    SheetProperties, Spreadsheet, UpdateValuesResponse, ValueRange,
};
use google_sheets4::{Sheets, hyper_rustls};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::future::Future;
use std::io::Cursor;
use tokio::time::{Duration, sleep};
use tracing::warn;

type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

/// Retry budget for the batch `run` action.
pub const RUN_RETRY_BUDGET: usize = 5;
/// Retry budget for the interactive introspection/management actions, where
/// fast failure beats persistence.
pub const ACTION_RETRY_BUDGET: usize = 2;

const MIME_TYPE_SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";

pub struct GoogleSheetsClient {
    sheets: Sheets<Connector>,
    drive: DriveHub<Connector>,
    max_retries: usize,
}

impl GoogleSheetsClient {
    pub fn new(auth: GoogleAuthenticator, max_retries: usize) -> Result<Self, WriterError> {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|err| {
                WriterError::application(format!("Failed to load native TLS roots: {err}"))
            })?
            .https_or_http()
            .enable_http1()
            .build();

        let client =
            hyper_util::client::legacy::Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            sheets: Sheets::new(client.clone(), auth.clone()),
            drive: DriveHub::new(client, auth),
            max_retries,
        })
    }

    /// Runs one remote call, retrying transient failures (429 and 5xx) with
    /// exponential backoff up to the configured budget.
    async fn call_with_retry<T, F, Fut>(
        &self,
        description: &str,
        mut operation: F,
    ) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, google_sheets4::Error>>,
    {
        let mut attempt = 0usize;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let mapped = map_google_error(err);
                    if attempt >= self.max_retries || !mapped.is_transient() {
                        return Err(mapped);
                    }
                    attempt += 1;
                    let delay = retry_delay(attempt);
                    warn!(
                        "🔁 {} hit a transient Google API error (attempt {}/{}), retrying in {:?}",
                        description, attempt, self.max_retries, delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

fn retry_delay(attempt: usize) -> Duration {
    let base_ms: u64 = 500;
    let exponent = attempt.saturating_sub(1) as u32;
    let multiplier = 2_u64.saturating_pow(exponent).min(16);
    Duration::from_millis(base_ms * multiplier)
}

/// Normalizes a hub error into [`ApiError`].
///
/// API-level rejections arrive as a parsed JSON error document; the status
/// lives under `error.code` and the machine-readable cause (when Google sends
/// one) under `error.errors[0].reason`, falling back to `error.status` and
/// finally the canonical HTTP reason phrase.
fn map_google_error(err: google_sheets4::Error) -> ApiError {
    match err {
        google_sheets4::Error::BadRequest(body) => {
            let status = body["error"]["code"].as_u64().unwrap_or(0) as u16;
            let reason = body["error"]["errors"][0]["reason"]
                .as_str()
                .or_else(|| body["error"]["status"].as_str())
                .map(str::to_string)
                .unwrap_or_else(|| canonical_reason(status));
            ApiError::Http {
                status,
                reason,
                body: body.to_string(),
            }
        }
        google_sheets4::Error::Failure(response) => {
            let status = response.status().as_u16();
            ApiError::Http {
                status,
                reason: canonical_reason(status),
                body: String::new(),
            }
        }
        other => ApiError::Transport(other.to_string()),
    }
}

fn canonical_reason(status: u16) -> String {
    google_sheets4::hyper::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
        .to_string()
}

fn to_json_rows(rows: Vec<Vec<String>>) -> Vec<Vec<serde_json::Value>> {
    rows.into_iter()
        .map(|row| row.into_iter().map(serde_json::Value::String).collect())
        .collect()
}

impl SheetsApi for GoogleSheetsClient {
    async fn get_spreadsheet(&self, file_id: &str) -> Result<Spreadsheet, ApiError> {
        self.call_with_retry("fetch spreadsheet", || async {
            self.sheets
                .spreadsheets()
                .get(file_id)
                .doit()
                .await
                .map(|(_, spreadsheet)| spreadsheet)
        })
        .await
    }

    async fn batch_update_spreadsheet(
        &self,
        file_id: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateSpreadsheetResponse, ApiError> {
        let request = BatchUpdateSpreadsheetRequest {
            requests: Some(requests),
            ..Default::default()
        };

        self.call_with_retry("batch update spreadsheet", || {
            let request = request.clone();
            async move {
                self.sheets
                    .spreadsheets()
                    .batch_update(request, file_id)
                    .doit()
                    .await
                    .map(|(_, response)| response)
            }
        })
        .await
    }

    async fn clear_values(&self, file_id: &str, range: &str) -> Result<(), ApiError> {
        self.call_with_retry("clear values", || async {
            self.sheets
                .spreadsheets()
                .values_clear(ClearValuesRequest::default(), file_id, range)
                .doit()
                .await
                .map(|_| ())
        })
        .await
    }

    async fn update_values(
        &self,
        file_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<UpdateValuesResponse, ApiError> {
        let values = ValueRange {
            range: Some(range.to_string()),
            values: Some(to_json_rows(rows)),
            major_dimension: Some("ROWS".to_string()),
            ..Default::default()
        };

        self.call_with_retry("update values", || {
            let values = values.clone();
            async move {
                self.sheets
                    .spreadsheets()
                    .values_update(values, file_id, range)
                    .value_input_option("USER_ENTERED")
                    .doit()
                    .await
                    .map(|(_, response)| response)
            }
        })
        .await
    }

    async fn append_values(
        &self,
        file_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<AppendValuesResponse, ApiError> {
        let values = ValueRange {
            values: Some(to_json_rows(rows)),
            major_dimension: Some("ROWS".to_string()),
            ..Default::default()
        };

        self.call_with_retry("append values", || {
            let values = values.clone();
            async move {
                self.sheets
                    .spreadsheets()
                    .values_append(values, file_id, range)
                    .value_input_option("USER_ENTERED")
                    .insert_data_option("INSERT_ROWS")
                    .doit()
                    .await
                    .map(|(_, response)| response)
            }
        })
        .await
    }

    async fn get_values(&self, file_id: &str, range: &str) -> Result<ValueRange, ApiError> {
        self.call_with_retry("get values", || async {
            self.sheets
                .spreadsheets()
                .values_get(file_id, range)
                .doit()
                .await
                .map(|(_, response)| response)
        })
        .await
    }

    async fn add_sheet(
        &self,
        file_id: &str,
        title: &str,
    ) -> Result<BatchUpdateSpreadsheetResponse, ApiError> {
        let request = Request {
            add_sheet: Some(AddSheetRequest {
                properties: Some(SheetProperties {
                    title: Some(title.to_string()),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        };

        self.batch_update_spreadsheet(file_id, vec![request]).await
    }

    async fn delete_sheet(
        &self,
        file_id: &str,
        sheet_id: i64,
    ) -> Result<BatchUpdateSpreadsheetResponse, ApiError> {
        let request = Request {
            delete_sheet: Some(DeleteSheetRequest {
                sheet_id: Some(sheet_id as i32),
            }),
            ..Default::default()
        };

        self.batch_update_spreadsheet(file_id, vec![request]).await
    }

    async fn create_file_metadata(
        &self,
        title: &str,
        parent_folder: Option<&str>,
    ) -> Result<google_drive3::api::File, ApiError> {
        let file = google_drive3::api::File {
            name: Some(title.to_string()),
            mime_type: Some(MIME_TYPE_SPREADSHEET.to_string()),
            parents: parent_folder.map(|folder| vec![folder.to_string()]),
            ..Default::default()
        };
        let mime_type: mime::Mime = match MIME_TYPE_SPREADSHEET.parse() {
            Ok(mime) => mime,
            Err(_) => {
                return Err(ApiError::Transport(
                    "Invalid spreadsheet MIME type".to_string(),
                ));
            }
        };

        self.call_with_retry("create file metadata", || {
            let file = file.clone();
            let mime_type = mime_type.clone();
            async move {
                // The metadata-only create still goes through the upload
                // endpoint; an empty payload creates an empty spreadsheet.
                self.drive
                    .files()
                    .create(file)
                    .supports_all_drives(true)
                    .upload(Cursor::new(Vec::<u8>::new()), mime_type)
                    .await
                    .map(|(_, created)| created)
            }
        })
        .await
    }
}
