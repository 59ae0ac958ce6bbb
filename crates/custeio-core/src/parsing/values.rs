use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a spreadsheet cell into a decimal, returning `fallback` when the
/// cell is absent, empty or not a number.
///
/// Handles formats like:
/// - "12,50" -> 12.50 (Brazilian decimal comma)
/// - "R$ 7,00" -> 7.00
/// - "5%" -> 5 (the caller divides by 100 where a fraction is meant)
///
/// Only the first comma is swapped for a dot and parsing stops at the first
/// character that cannot continue the number, so "1.234,56" reads as 1.234.
pub fn parse_decimal(raw: Option<&str>, fallback: Decimal) -> Decimal {
    parse_decimal_opt(raw).unwrap_or(fallback)
}

/// Like [`parse_decimal`] but reports a missing or unparseable value as `None`.
pub fn parse_decimal_opt(raw: Option<&str>) -> Option<Decimal> {
    let cleaned = raw?.replace("R$", "").replace('%', "");
    let cleaned = cleaned.trim().replacen(',', ".", 1);
    let number = numeric_prefix(&cleaned)?;
    Decimal::from_str(&number).ok()
}

/// Longest leading `[+-]?digits[.digits]` run, rewritten so that
/// `Decimal::from_str` accepts it (".5" -> "0.5", "5." -> "5").
fn numeric_prefix(s: &str) -> Option<String> {
    let mut chars = s.chars().peekable();
    let mut sign = "";
    if let Some(&c) = chars.peek() {
        if c == '-' || c == '+' {
            sign = if c == '-' { "-" } else { "" };
            chars.next();
        }
    }

    let mut int_part = String::new();
    let mut frac_part = String::new();
    let mut seen_dot = false;
    for c in chars {
        match c {
            '0'..='9' if seen_dot => frac_part.push(c),
            '0'..='9' => int_part.push(c),
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
    }

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if int_part.is_empty() {
        int_part.push('0');
    }

    let mut out = format!("{sign}{int_part}");
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(&frac_part);
    }
    Some(out)
}

/// Wastage cells hold a percentage ("5%", "5" or "2,5"); stored as a fraction.
/// Values outside [0, 1) after conversion fall back to zero.
pub fn wastage_fraction(raw: Option<&str>) -> Decimal {
    let fraction = parse_decimal(raw, Decimal::ZERO) / Decimal::ONE_HUNDRED;
    if fraction.is_sign_negative() || fraction >= Decimal::ONE {
        tracing::debug!(raw = raw.unwrap_or_default(), "wastage out of range, using 0");
        return Decimal::ZERO;
    }
    fraction
}

/// Parse a `DD/MM/YYYY` quotation date. A time-of-day after the date is ignored.
pub fn parse_quotation_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%d/%m/%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decimal_comma() {
        assert_eq!(parse_decimal(Some("12,50"), Decimal::ZERO), dec!(12.50));
    }

    #[test]
    fn test_currency_prefix() {
        assert_eq!(parse_decimal(Some("R$ 7,00"), Decimal::ZERO), dec!(7.00));
        assert_eq!(parse_decimal(Some("R$7"), Decimal::ZERO), dec!(7));
    }

    #[test]
    fn test_percent_is_not_divided() {
        assert_eq!(parse_decimal(Some("5%"), Decimal::ZERO), dec!(5));
    }

    #[test]
    fn test_empty_and_absent_use_fallback() {
        assert_eq!(parse_decimal(Some(""), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(parse_decimal(None, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(parse_decimal(Some("   "), dec!(3)), dec!(3));
    }

    #[test]
    fn test_garbage_uses_fallback() {
        assert_eq!(parse_decimal(Some("abc"), dec!(1)), dec!(1));
        assert!(parse_decimal_opt(Some("-")).is_none());
    }

    #[test]
    fn test_thousands_separator_is_not_handled() {
        // "1.234,56" -> "1.234.56" -> stops at the second dot
        assert_eq!(parse_decimal(Some("1.234,56"), Decimal::ZERO), dec!(1.234));
    }

    #[test]
    fn test_trailing_text_is_ignored() {
        assert_eq!(parse_decimal(Some("2,5 kg"), Decimal::ZERO), dec!(2.5));
    }

    #[test]
    fn test_leading_dot_and_sign() {
        assert_eq!(parse_decimal_opt(Some(",5")), Some(dec!(0.5)));
        assert_eq!(parse_decimal_opt(Some("-3")), Some(dec!(-3)));
        assert_eq!(parse_decimal_opt(Some("4.")), Some(dec!(4)));
    }

    #[test]
    fn test_wastage_fraction() {
        assert_eq!(wastage_fraction(Some("5%")), dec!(0.05));
        assert_eq!(wastage_fraction(Some("2,5")), dec!(0.025));
        assert_eq!(wastage_fraction(None), Decimal::ZERO);
        assert_eq!(wastage_fraction(Some("n/a")), Decimal::ZERO);
    }

    #[test]
    fn test_wastage_out_of_range() {
        assert_eq!(wastage_fraction(Some("100%")), Decimal::ZERO);
        assert_eq!(wastage_fraction(Some("-5%")), Decimal::ZERO);
    }

    #[test]
    fn test_quotation_date() {
        assert_eq!(
            parse_quotation_date("15/01/2024"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(
            parse_quotation_date("1/2/2024 10:30"),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
    }

    #[test]
    fn test_quotation_date_rejects_other_formats() {
        assert!(parse_quotation_date("2024-01-15").is_none());
        assert!(parse_quotation_date("31/02/2024").is_none());
        assert!(parse_quotation_date("").is_none());
    }
}
