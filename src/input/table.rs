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

//! Source tables backed by CSV extracts under `<data_dir>/in/tables/`.

use crate::utils::errors::WriterError;
use std::fs::File;
use std::path::{Path, PathBuf};

/// One source table: an ordered sequence of string rows read from a CSV file.
///
/// Row and column counts are computed once with a dedicated scan pass when the
/// table is opened; upload passes obtain fresh forward-only cursors via
/// [`Table::rows`], so counting never consumes the iteration cursor. The file
/// itself is never held in memory.
#[derive(Debug)]
pub struct Table {
    table_id: String,
    path: PathBuf,
    row_count: usize,
    column_count: usize,
}

impl Table {
    pub fn new(data_dir: &Path, table_id: &str) -> Result<Self, WriterError> {
        let path = data_dir
            .join("in")
            .join("tables")
            .join(format!("{table_id}.csv"));

        let mut reader = open_reader(&path, table_id)?;
        let mut row_count = 0usize;
        let mut column_count = 0usize;
        let mut record = csv::StringRecord::new();
        loop {
            let read = reader.read_record(&mut record).map_err(|err| {
                WriterError::user(format!("Cannot read CSV table \"{table_id}\": {err}"))
            })?;
            if !read {
                break;
            }
            if row_count == 0 {
                column_count = record.len();
            }
            row_count += 1;
        }

        Ok(Self {
            table_id: table_id.to_string(),
            path,
            row_count,
            column_count,
        })
    }

    /// Total number of data rows, header included.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Cell count of the first row. Every row is assumed to match; the
    /// upstream extract guarantees rectangular data.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Opens a fresh forward-only cursor over all rows.
    pub fn rows(&self) -> Result<Rows, WriterError> {
        let reader = open_reader(&self.path, &self.table_id)?;
        Ok(Rows {
            table_id: self.table_id.clone(),
            inner: reader.into_records(),
        })
    }
}

fn open_reader(path: &Path, table_id: &str) -> Result<csv::Reader<File>, WriterError> {
    let file = File::open(path).map_err(|err| {
        WriterError::user(format!(
            "CSV file for table \"{table_id}\" not found at {}: {err}",
            path.display()
        ))
    })?;

    // Headers stay part of the data; the writer pushes them as the first row.
    Ok(csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file))
}

/// Forward-only cursor over a table's rows.
pub struct Rows {
    table_id: String,
    inner: csv::StringRecordsIntoIter<File>,
}

impl Iterator for Rows {
    type Item = Result<Vec<String>, WriterError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next()? {
            Ok(record) => Some(Ok(record.iter().map(str::to_string).collect())),
            Err(err) => Some(Err(WriterError::user(format!(
                "Cannot read CSV table \"{}\": {err}",
                self.table_id
            )))),
        }
    }
}
