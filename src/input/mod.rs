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

pub mod paginator;
pub mod table;

use crate::utils::errors::WriterError;
use self::table::Table;
use std::path::PathBuf;

/// Resolves table ids from the configuration into [`Table`]s rooted at the
/// data directory.
pub struct TableFactory {
    data_dir: PathBuf,
}

impl TableFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn table(&self, table_id: &str) -> Result<Table, WriterError> {
        Table::new(&self.data_dir, table_id)
    }
}
