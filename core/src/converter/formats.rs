//! Patterns and canonical examples for the string-like rule kinds.

use crate::rules::CurrencyRule;

/// Example for `email` rules.
pub const EMAIL_EXAMPLE: &str = "user@example.com";
/// Example for `url` rules.
pub const URL_EXAMPLE: &str = "https://example.com";

/// Pattern for `mac` rules (colon, dash or dotted notation).
pub const MAC_PATTERN: &str = r"^(?:(?:[0-9A-Fa-f]{2}-){5}|(?:[0-9A-Fa-f]{2}:){5})[0-9A-Fa-f]{2}$|^(?:[0-9A-Fa-f]{4}\.){2}[0-9A-Fa-f]{4}$";
/// Example for `mac` rules.
pub const MAC_EXAMPLE: &str = "01:C8:95:4B:65:FE";

/// Pattern for `luhn` rules. Spaces and dashes between digits are allowed.
pub const LUHN_PATTERN: &str = r"^[0-9](?:[0-9 -]*[0-9])?$";
/// Example for `luhn` rules; passes the checksum.
pub const LUHN_EXAMPLE: &str = "4242424242424242";

/// Pattern for `objectID` rules.
pub const OBJECT_ID_PATTERN: &str = r"^[0-9a-fA-F]{24}$";
/// Example for `objectID` rules.
pub const OBJECT_ID_EXAMPLE: &str = "507f1f77bcf86cd799439011";

/// ISO-8601 example for converted `date` rules.
pub const DATE_ISO_EXAMPLE: &str = "2024-01-01T00:00:00.000Z";
/// Epoch (milliseconds) example for converted `date` rules, same instant.
pub const DATE_EPOCH_EXAMPLE: i64 = 1_704_067_200_000;

/// One exemplar per UUID version, indexed by `version - 1`.
pub const UUID_EXAMPLES: [&str; 5] = [
    "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
    "000003e8-2d6c-21ef-9100-325096b39f47",
    "a3bb189e-8bf9-3888-9912-ace4e6543002",
    "10ba038e-48da-487b-96e8-8d3b99b6d18a",
    "a6edc906-2f9f-5fb2-a373-efac406f0ef2",
];

const UUID_ANY_PATTERN: &str =
    r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

/// String flag patterns, in precedence order.
pub const ALPHA_PATTERN: &str = r"^[a-zA-Z]+$";
/// See [`ALPHA_PATTERN`].
pub const NUMERIC_PATTERN: &str = r"^-?[0-9]+(?:\.[0-9]+)?$";
/// See [`ALPHA_PATTERN`].
pub const ALPHANUM_PATTERN: &str = r"^[a-zA-Z0-9]+$";
/// See [`ALPHA_PATTERN`].
pub const ALPHADASH_PATTERN: &str = r"^[a-zA-Z0-9_-]+$";
/// See [`ALPHA_PATTERN`].
pub const HEX_PATTERN: &str = r"^[0-9a-fA-F]+$";
/// See [`ALPHA_PATTERN`].
pub const BASE64_PATTERN: &str =
    r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$";
/// See [`ALPHA_PATTERN`].
pub const SINGLE_LINE_PATTERN: &str = r"^[^\r\n]*$";

/// Pattern for a UUID of the given version. `None`, `0` and versions
/// without an exemplar accept any UUID.
pub fn uuid_pattern(version: Option<u8>) -> String {
    match version {
        Some(v @ 1..=5) => format!(
            r"^[0-9a-fA-F]{{8}}-[0-9a-fA-F]{{4}}-{}[0-9a-fA-F]{{3}}-[89abAB][0-9a-fA-F]{{3}}-[0-9a-fA-F]{{12}}$",
            v
        ),
        _ => UUID_ANY_PATTERN.to_string(),
    }
}

/// Example for a UUID of the given version.
pub fn uuid_example(version: Option<u8>) -> &'static str {
    match version {
        Some(v @ 1..=5) => UUID_EXAMPLES[usize::from(v) - 1],
        _ => UUID_EXAMPLES[3],
    }
}

/// Pattern for a currency amount, honouring symbol and separators.
pub fn currency_pattern(rule: &CurrencyRule) -> String {
    if let Some(custom) = &rule.custom_regex {
        return custom.clone();
    }
    let symbol = match rule.currency_symbol.as_deref() {
        Some(sym) if rule.symbol_optional => format!("(?:{})?", regex::escape(sym)),
        Some(sym) => regex::escape(sym),
        None => String::new(),
    };
    let thousands = regex::escape(rule.thousand_separator.as_deref().unwrap_or(","));
    let decimal = regex::escape(rule.decimal_separator.as_deref().unwrap_or("."));
    format!(
        "^-?{}(?:[0-9]{{1,3}}(?:{}[0-9]{{3}})*|[0-9]+)(?:{}[0-9]{{1,2}})?$",
        symbol, thousands, decimal
    )
}

/// Example amount matching [`currency_pattern`]. `None` for custom patterns.
pub fn currency_example(rule: &CurrencyRule) -> Option<String> {
    if rule.custom_regex.is_some() {
        return None;
    }
    Some(format!(
        "{}12{}345{}67",
        rule.currency_symbol.as_deref().unwrap_or(""),
        rule.thousand_separator.as_deref().unwrap_or(","),
        rule.decimal_separator.as_deref().unwrap_or(".")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn matches(pattern: &str, value: &str) -> bool {
        Regex::new(pattern).unwrap().is_match(value)
    }

    #[test]
    fn test_uuid_examples_match_their_version() {
        for version in 1..=5u8 {
            let example = uuid_example(Some(version));
            assert!(matches(&uuid_pattern(Some(version)), example), "v{}", version);
            assert!(matches(&uuid_pattern(None), example));
        }
        assert!(!matches(&uuid_pattern(Some(4)), UUID_EXAMPLES[0]));
    }

    #[test]
    fn test_fixed_examples_match_patterns() {
        assert!(matches(MAC_PATTERN, MAC_EXAMPLE));
        assert!(matches(MAC_PATTERN, "01c8.954b.65fe"));
        assert!(!matches(MAC_PATTERN, "01:C8:95"));
        assert!(matches(LUHN_PATTERN, LUHN_EXAMPLE));
        assert!(matches(LUHN_PATTERN, "4242 4242 4242 4242"));
        assert!(matches(OBJECT_ID_PATTERN, OBJECT_ID_EXAMPLE));
        assert!(matches(BASE64_PATTERN, "aGVsbG8="));
        assert!(!matches(SINGLE_LINE_PATTERN, "a\nb"));
    }

    #[test]
    fn test_currency_pattern_with_symbol() {
        let rule = CurrencyRule {
            currency_symbol: Some("$".into()),
            ..CurrencyRule::default()
        };
        let pattern = currency_pattern(&rule);
        let example = currency_example(&rule).unwrap();
        assert_eq!(example, "$12,345.67");
        assert!(matches(&pattern, &example));
        assert!(!matches(&pattern, "12,345.67"));
    }

    #[test]
    fn test_currency_pattern_optional_symbol_and_separators() {
        let rule = CurrencyRule {
            currency_symbol: Some("€".into()),
            symbol_optional: true,
            thousand_separator: Some(".".into()),
            decimal_separator: Some(",".into()),
            custom_regex: None,
        };
        let pattern = currency_pattern(&rule);
        assert!(matches(&pattern, "€12.345,67"));
        assert!(matches(&pattern, "12.345,67"));
    }

    #[test]
    fn test_custom_currency_regex_wins() {
        let rule = CurrencyRule {
            custom_regex: Some("^[0-9]+ EUR$".into()),
            ..CurrencyRule::default()
        };
        assert_eq!(currency_pattern(&rule), "^[0-9]+ EUR$");
        assert_eq!(currency_example(&rule), None);
    }
}
