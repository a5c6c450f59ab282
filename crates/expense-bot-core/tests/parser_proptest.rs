use expense_bot_core::parser::parse_expense_line;
use proptest::prelude::*;

proptest! {
    /// The parser never panics, whatever the sender types.
    #[test]
    fn does_not_crash(s in "\\PC*") {
        let _ = parse_expense_line(&s);
    }

    /// Well-formed lines always parse back into their parts.
    #[test]
    fn parses_well_formed_lines(
        category in "[a-zA-Z][a-zA-Z0-9_]{0,15}",
        whole in 0u32..1_000_000,
        cents in proptest::option::of(0u32..100),
        remarks in "([a-zA-Z0-9][a-zA-Z0-9 ,.!]{0,30})?",
    ) {
        let amount_text = match cents {
            Some(c) => format!("{whole}.{c:02}"),
            None => whole.to_string(),
        };
        let line = if remarks.is_empty() {
            format!("{category} {amount_text}")
        } else {
            format!("{category} {amount_text} {remarks}")
        };

        let parsed = parse_expense_line(&line)
            .map_err(|e| TestCaseError::fail(format!("rejected {line:?}: {e}")))?;

        prop_assert!(parsed.category.eq_ignore_ascii_case(&category));
        prop_assert!(parsed.category.chars().next().is_some_and(char::is_uppercase));
        prop_assert_eq!(&parsed.amount_text, &amount_text);
        prop_assert!(parsed.amount >= 0.0);
        prop_assert_eq!(parsed.remarks.trim_end(), remarks.trim_end());
    }

    /// Lines without an amount after the category are rejected.
    #[test]
    fn rejects_missing_amount(
        category in "[a-zA-Z]{1,10}",
        tail in "[a-zA-Z ]{0,20}",
    ) {
        let line = format!("{category} {tail}");
        prop_assert!(parse_expense_line(&line).is_err());
    }
}
