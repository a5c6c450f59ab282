//! Expense line parsing.
//!
//! Grammar, matched from the start of the message:
//!
//! ```text
//! <category> <whitespace> <amount> [<whitespace> <remarks>]
//! ```
//!
//! `category` is a run of word characters, `amount` is a run of digits with
//! an optional `.digits` fraction, and `remarks` is the rest of the first line.

use thiserror::Error;

/// The text line does not follow `<category> <amount> [remarks]`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid format")]
pub struct FormatError;

/// Fields extracted from one expense line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExpense {
    /// Capitalized category
    pub category: String,
    /// Numeric amount
    pub amount: f64,
    /// Amount as the user typed it
    pub amount_text: String,
    /// Free-text remarks, possibly empty
    pub remarks: String,
}

/// Parse a free-text expense line.
///
/// # Examples
///
/// ```
/// use expense_bot_core::parser::parse_expense_line;
///
/// let parsed = parse_expense_line("food 500 Dinner with friends").unwrap();
/// assert_eq!(parsed.category, "Food");
/// assert_eq!(parsed.amount, 500.0);
/// assert_eq!(parsed.remarks, "Dinner with friends");
/// ```
///
/// # Errors
///
/// Returns [`FormatError`] if the line does not start with a category token,
/// whitespace, and a number.
pub fn parse_expense_line(line: &str) -> Result<ParsedExpense, FormatError> {
    let (category, rest) = split_leading(line, is_word_char);
    if category.is_empty() {
        return Err(FormatError);
    }

    let (gap, rest) = split_leading(rest, char::is_whitespace);
    if gap.is_empty() {
        return Err(FormatError);
    }

    let (amount_text, rest) = split_amount(rest);
    if amount_text.is_empty() {
        return Err(FormatError);
    }
    let amount = amount_text.parse::<f64>().map_err(|_| FormatError)?;

    Ok(ParsedExpense {
        category: capitalize(category),
        amount,
        amount_text: amount_text.to_string(),
        remarks: remarks(rest).to_string(),
    })
}

/// Uppercase the first character and lowercase the remainder.
#[must_use]
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect()
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split `s` after the longest prefix whose characters satisfy `pred`.
fn split_leading(s: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
    let end = s.find(|c: char| !pred(c)).unwrap_or(s.len());
    s.split_at(end)
}

/// Split off `digits[.digits]`. A dot without following digits is not part of it.
fn split_amount(s: &str) -> (&str, &str) {
    let (int_part, rest) = split_leading(s, |c| c.is_ascii_digit());
    if int_part.is_empty() {
        return ("", s);
    }

    if let Some(after_dot) = rest.strip_prefix('.') {
        let (fraction, _) = split_leading(after_dot, |c| c.is_ascii_digit());
        if !fraction.is_empty() {
            return s.split_at(int_part.len() + 1 + fraction.len());
        }
    }
    (int_part, rest)
}

/// Remarks follow the amount after whitespace and end at the first newline.
///
/// Anything glued to the amount without whitespace is ignored.
fn remarks(rest: &str) -> &str {
    let (gap, text) = split_leading(rest, char::is_whitespace);
    if gap.is_empty() {
        return "";
    }
    text.split('\n').next().unwrap_or_default().trim_end_matches('\r')
}
