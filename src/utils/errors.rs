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

use crate::sheets::api::ApiError;
use thiserror::Error;

/// Process exit code for user errors.
pub const EXIT_USER_ERROR: u8 = 1;
/// Process exit code for application errors.
pub const EXIT_APPLICATION_ERROR: u8 = 2;

/// Error taxonomy of the writer.
///
/// `User` errors are actionable by the operator (bad configuration, missing
/// sheets, oversized sources, rejected requests) and exit with code 1.
/// `Application` errors indicate a defect or an unexpected remote response and
/// exit with code 2. `Api` carries an untranslated transport error upward
/// until the application boundary maps it into one of the other two variants.
#[derive(Error, Debug)]
pub enum WriterError {
    #[error("{0}")]
    User(String),

    #[error("{0}")]
    Application(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl WriterError {
    pub fn user(message: impl Into<String>) -> Self {
        WriterError::User(message.into())
    }

    pub fn application(message: impl Into<String>) -> Self {
        WriterError::Application(message.into())
    }

    pub fn is_user(&self) -> bool {
        matches!(self, WriterError::User(_))
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            WriterError::User(_) => EXIT_USER_ERROR,
            WriterError::Application(_) | WriterError::Api(_) => EXIT_APPLICATION_ERROR,
        }
    }
}
