//! A1-style cell addresses
//!
//! Rows and columns are zero-based everywhere in this crate. Addresses use one-based
//! row numbers and bijective base-26 column letters (A..Z, AA..AZ, BA..ZZ, AAA..).

/// Column letters for a zero-based column index: 0 → `A`, 25 → `Z`, 26 → `AA`.
pub fn column_name(col: usize) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Address of a single cell: (0, 0) → `A1`, (41, 2) → `C42`.
pub fn cell_name(row: usize, col: usize) -> String {
    format!("{}{}", column_name(col), row + 1)
}

/// Prefix a range with its sheet name, quoting it the way the Sheets API expects.
/// An empty sheet name leaves the range unqualified (the first sheet).
pub fn qualify(sheet_name: &str, range: &str) -> String {
    if sheet_name.is_empty() {
        range.to_string()
    } else {
        format!("'{}'!{}", sheet_name.replace('\'', "''"), range)
    }
}

#[cfg(test)]
#[path = "cell_tests.rs"]
mod tests;
