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

//! Bounded-memory pagination over source-table rows.

use crate::utils::errors::WriterError;

/// Default number of rows per upload call.
pub const DEFAULT_PAGE_SIZE: usize = 5000;

/// One materialized window of source rows.
///
/// `offset` is the 1-based row number of the window's first row; `limit` is
/// the configured page size, which the final page may undershoot.
#[derive(Debug)]
pub struct Page {
    values: Vec<Vec<String>>,
    offset: usize,
    limit: usize,
}

impl Page {
    pub fn new(values: Vec<Vec<String>>, offset: usize, limit: usize) -> Self {
        Self {
            values,
            offset,
            limit,
        }
    }

    pub fn into_values(self) -> Vec<Vec<String>> {
        self.values
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn row_count(&self) -> usize {
        self.values.len()
    }

    pub fn is_first(&self) -> bool {
        self.offset == 1
    }
}

/// Pull-based pager over a row cursor.
///
/// Yields consecutive non-overlapping [`Page`]s until the cursor is
/// exhausted; at most one page of rows is resident at a time, so arbitrarily
/// large tables stream through in bounded memory.
pub struct Paginator<I> {
    rows: I,
    limit: usize,
    offset: usize,
}

impl<I> Paginator<I>
where
    I: Iterator<Item = Result<Vec<String>, WriterError>>,
{
    pub fn new(rows: I) -> Self {
        Self::with_limit(rows, DEFAULT_PAGE_SIZE)
    }

    pub fn with_limit(rows: I, limit: usize) -> Self {
        debug_assert!(limit >= 1);
        Self {
            rows,
            limit,
            offset: 1,
        }
    }
}

impl<I> Iterator for Paginator<I>
where
    I: Iterator<Item = Result<Vec<String>, WriterError>>,
{
    type Item = Result<Page, WriterError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut values = Vec::new();
        while values.len() < self.limit {
            match self.rows.next() {
                Some(Ok(row)) => values.push(row),
                Some(Err(err)) => return Some(Err(err)),
                None => break,
            }
        }

        if values.is_empty() {
            return None;
        }

        let page = Page::new(values, self.offset, self.limit);
        self.offset += page.row_count();
        Some(Ok(page))
    }
}
