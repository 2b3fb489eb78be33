//! Cell-level numeric cleaning.
//!
//! Raw metric cells arrive as currency-, percent-, and comma-formatted text,
//! sometimes with accounting-style parenthesized negatives. Cleaning is a
//! pure per-cell transform; anything that does not parse becomes `None` and
//! stays missing downstream (never coerced to zero).

use regex::Regex;

/// Parse one raw cell into a nullable numeric value.
///
/// Configured characters are stripped first, then whitespace trimmed.
/// `"(12.5)"` parses to `-12.5`. Returns `None` for anything that still
/// fails to parse.
pub fn clean_numeric(raw: &str, strip_chars: &str) -> Option<f64> {
    let stripped: String = raw
        .chars()
        .filter(|c| !strip_chars.contains(*c))
        .collect();
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Accounting negatives: "(12.5)" means -12.5.
    let paren_re = Regex::new(r"^\((.+)\)$").ok()?;
    if let Some(captures) = paren_re.captures(trimmed) {
        let inner = captures.get(1)?.as_str().trim();
        return inner.parse::<f64>().ok().map(|v| -v);
    }

    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRIP: &str = "$%,";

    #[test]
    fn test_currency_with_thousands_separator() {
        assert_eq!(clean_numeric("$1,234.50", STRIP), Some(1234.50));
    }

    #[test]
    fn test_percent() {
        assert_eq!(clean_numeric("12.3%", STRIP), Some(12.3));
    }

    #[test]
    fn test_parenthesized_negative() {
        assert_eq!(clean_numeric("(12.3%)", STRIP), Some(-12.3));
        assert_eq!(clean_numeric("($1,000.00)", STRIP), Some(-1000.0));
    }

    #[test]
    fn test_plain_and_scientific() {
        assert_eq!(clean_numeric("42", STRIP), Some(42.0));
        assert_eq!(clean_numeric("-3.97E+07", STRIP), Some(-39700000.0));
    }

    #[test]
    fn test_unparseable_becomes_null() {
        assert_eq!(clean_numeric("N/A", STRIP), None);
        assert_eq!(clean_numeric("", STRIP), None);
        assert_eq!(clean_numeric("   ", STRIP), None);
        assert_eq!(clean_numeric("()", STRIP), None);
        assert_eq!(clean_numeric("(abc)", STRIP), None);
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(clean_numeric("  5.5 ", STRIP), Some(5.5));
    }

    #[test]
    fn test_infinite_rejected() {
        assert_eq!(clean_numeric("inf", STRIP), None);
        assert_eq!(clean_numeric("NaN", STRIP), None);
    }
}
