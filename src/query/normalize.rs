//! Per-cell normalization into SQL literal tokens.
//!
//! | raw cell          | column class     | token        |
//! |-------------------|------------------|--------------|
//! | NULL              | any              | `NULL`       |
//! | empty             | any              | `NULL`       |
//! | numeric text      | numeric / other  | text as-is   |
//! | numeric text      | text             | `'text'`     |
//! | non-numeric text  | any              | `'text'`     |
//!
//! Empty strings fold into `NULL` on purpose, so sources that tell the two
//! apart and sources that do not produce the same output. Callers that need
//! to write real empty strings must special-case them.

use crate::db::ColumnClass;
use serde::{Deserialize, Serialize};

/// Token emitted for NULL and empty values.
pub const NULL_TOKEN: &str = "NULL";

/// Options controlling how quoted tokens are built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Double embedded single quotes (`O'Brien` becomes `'O''Brien'`).
    ///
    /// Off by default: embedded quotes are emitted verbatim.
    #[serde(default)]
    pub escape_quotes: bool,
}

/// Normalizes one raw cell.
pub fn normalize_cell(raw: Option<&[u8]>, class: ColumnClass, options: NormalizeOptions) -> String {
    let Some(bytes) = raw else {
        return NULL_TOKEN.to_string();
    };
    if bytes.is_empty() {
        return NULL_TOKEN.to_string();
    }

    let text = String::from_utf8_lossy(bytes);
    if !class.is_text() && is_numeric(&text) {
        return text.into_owned();
    }

    quote(&text, options)
}

fn quote(text: &str, options: NormalizeOptions) -> String {
    if options.escape_quotes {
        format!("'{}'", text.replace('\'', "''"))
    } else {
        format!("'{text}'")
    }
}

/// Lexical numeric test.
///
/// Accepts `[+-]? (digits ('.' digits*)? | '.' digits) ([eE] [+-]? digits)?`.
/// No surrounding whitespace, no `inf`/`nan`, no hex, no range check.
pub fn is_numeric(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_digits = count_digits(&bytes[i..]);
    i += int_digits;

    let mut frac_digits = 0;
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        frac_digits = count_digits(&bytes[i..]);
        i += frac_digits;
    }

    if int_digits + frac_digits == 0 {
        return false;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_digits = count_digits(&bytes[i..]);
        if exp_digits == 0 {
            return false;
        }
        i += exp_digits;
    }

    i == bytes.len()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Recovers the text behind a token: `None` for `NULL`, the inner text for a
/// quoted token, the token itself for a bare numeric.
///
/// Doubled quotes are not collapsed.
pub fn literal_text(token: &str) -> Option<&str> {
    if token == NULL_TOKEN {
        return None;
    }
    match token
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        Some(inner) => Some(inner),
        None => Some(token),
    }
}
