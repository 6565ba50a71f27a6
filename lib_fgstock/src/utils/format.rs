//! # Display Formatting
//!
//! Helpers that turn raw numbers into the strings shown on the dashboard:
//! Indian digit grouping (`1,24,580`), lakh-denominated currency, quantities
//! in kilograms, and "N mins ago" recency labels.

use std::time::Duration;

const ONE_LAKH: u64 = 100_000;

/// Groups digits the Indian way: the last three digits, then pairs.
///
/// ```rust
/// use lib_fgstock::utils::format::format_indian;
///
/// assert_eq!(format_indian(124580), "1,24,580");
/// assert_eq!(format_indian(950), "950");
/// ```
pub fn format_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Fixed one-decimal rendering used by the value-type KPI cards.
pub fn format_fixed1(value: f64) -> String {
    format!("{:.1}", value)
}

/// Rupee amount: lakhs with two decimals from one lakh upward, grouped digits below.
pub fn format_currency(value: u64) -> String {
    if value >= ONE_LAKH {
        format!("₹ {:.2} L", value as f64 / ONE_LAKH as f64)
    } else {
        format!("₹ {}", format_indian(value))
    }
}

/// Quantity in kilograms.
pub fn format_quantity(value: u64) -> String {
    format!("{} Kg", format_indian(value))
}

/// Coarse "time ago" label for the insight panel.
pub fn format_recency(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        return "Just now".to_string();
    }

    let mins = secs / 60;
    if mins < 60 {
        return plural(mins, "min");
    }

    let hours = mins / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }

    plural(hours / 24, "day")
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}
