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

//! External Google Sheets/Drive surface consumed by the sync engine.
//!
//! The engine only ever talks to this trait; the production implementation
//! lives in [`crate::sheets::client`] and the tests drive a recording mock.

use google_sheets4::api::{
    AppendValuesResponse, BatchUpdateSpreadsheetResponse, Request, Spreadsheet,
    UpdateValuesResponse, ValueRange,
};
use thiserror::Error;

/// Typed failure of a remote call: either an HTTP rejection carrying the
/// status, a reason string and the response body, or a transport-level
/// failure with no HTTP exchange to report.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Google API request failed with status {status} ({reason}): {body}")]
    Http {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Google API transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Transient failures the transport layer may retry: rate limiting and
    /// server-side errors.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Http { status, .. } => *status == 429 || (500..600).contains(status),
            ApiError::Transport(_) => false,
        }
    }
}

/// One synchronous remote operation per method; structured success payload or
/// a typed [`ApiError`]. Retries and backoff for transient failures are owned
/// by the implementation, never by callers.
#[allow(async_fn_in_trait)]
pub trait SheetsApi {
    async fn get_spreadsheet(&self, file_id: &str) -> Result<Spreadsheet, ApiError>;

    async fn batch_update_spreadsheet(
        &self,
        file_id: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateSpreadsheetResponse, ApiError>;

    async fn clear_values(&self, file_id: &str, range: &str) -> Result<(), ApiError>;

    async fn update_values(
        &self,
        file_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<UpdateValuesResponse, ApiError>;

    async fn append_values(
        &self,
        file_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<AppendValuesResponse, ApiError>;

    async fn get_values(&self, file_id: &str, range: &str) -> Result<ValueRange, ApiError>;

    async fn add_sheet(
        &self,
        file_id: &str,
        title: &str,
    ) -> Result<BatchUpdateSpreadsheetResponse, ApiError>;

    async fn delete_sheet(
        &self,
        file_id: &str,
        sheet_id: i64,
    ) -> Result<BatchUpdateSpreadsheetResponse, ApiError>;

    async fn create_file_metadata(
        &self,
        title: &str,
        parent_folder: Option<&str>,
    ) -> Result<google_drive3::api::File, ApiError>;
}

/// One upload call's result. The two wire shapes differ: range updates report
/// the written row count directly, appends nest it under an `updates`
/// sub-object. Both normalize through [`UploadResponse::updated_rows`].
#[derive(Debug)]
pub enum UploadResponse {
    Updated(UpdateValuesResponse),
    Appended(AppendValuesResponse),
}

impl UploadResponse {
    pub fn updated_rows(&self) -> usize {
        let count = match self {
            UploadResponse::Updated(response) => response.updated_rows,
            UploadResponse::Appended(response) => response
                .updates
                .as_ref()
                .and_then(|updates| updates.updated_rows),
        };
        count.map(|rows| rows.max(0) as usize).unwrap_or(0)
    }
}

/// Total rows the API reported as written across all pages of one target.
pub fn count_updated_rows(responses: &[UploadResponse]) -> usize {
    responses.iter().map(UploadResponse::updated_rows).sum()
}
