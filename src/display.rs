// Formatting helpers for profile and schedule output

use chrono::{DateTime, NaiveDate};

const CURRENCY_SYMBOL: &str = "₦";

/// `300000.0` → `₦300,000`, `1234.5` → `₦1,234.50`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let fraction = cents % 100;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };

    if fraction == 0 {
        format!("{}{}{}", sign, CURRENCY_SYMBOL, whole)
    } else {
        format!("{}{}{}.{:02}", sign, CURRENCY_SYMBOL, whole, fraction)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `under_review` → `Under Review`
pub fn format_status(status: &str) -> String {
    status
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// `2025-01-05` → `Jan 5, 2025`; missing → `N/A`; unparseable → as given
pub fn format_date(value: Option<&str>) -> String {
    let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return "N/A".to_string();
    };

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()));

    match date {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "₦0");
        assert_eq!(format_currency(950.0), "₦950");
        assert_eq!(format_currency(300000.0), "₦300,000");
        assert_eq!(format_currency(1234567.0), "₦1,234,567");
        assert_eq!(format_currency(1234.5), "₦1,234.50");
        assert_eq!(format_currency(-2500.0), "-₦2,500");
    }

    #[test]
    fn test_format_status() {
        assert_eq!(format_status("under_review"), "Under Review");
        assert_eq!(format_status("not_submitted"), "Not Submitted");
        assert_eq!(format_status("approved"), "Approved");
        assert_eq!(format_status(""), "");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some("2025-01-05")), "Jan 5, 2025");
        assert_eq!(format_date(Some("2024-11-02T09:30:00Z")), "Nov 2, 2024");
        assert_eq!(format_date(Some("next week")), "next week");
        assert_eq!(format_date(Some("  ")), "N/A");
        assert_eq!(format_date(None), "N/A");
    }

    proptest! {
        #[test]
        fn prop_grouped_digits_round_trip(value in 0u64..10_000_000_000u64) {
            let formatted = format_currency(value as f64);
            let digits: String = formatted
                .trim_start_matches(CURRENCY_SYMBOL)
                .chars()
                .filter(|c| *c != ',')
                .collect();
            prop_assert_eq!(digits, value.to_string());
        }

        #[test]
        fn prop_groups_have_three_digits(value in 1_000u64..10_000_000_000u64) {
            let formatted = format_currency(value as f64);
            let body = formatted.trim_start_matches(CURRENCY_SYMBOL);
            for group in body.split(',').skip(1) {
                prop_assert_eq!(group.len(), 3);
            }
        }
    }
}
