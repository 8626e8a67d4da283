use chrono::{DateTime, Utc};

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional timestamp, returning a default if None
pub fn format_time(value: Option<&DateTime<Utc>>, default: &str) -> String {
    value
        .map(|dt| dt.format("%b %d, %Y %H:%M").to_string())
        .unwrap_or_else(|| default.to_string())
}

pub fn format_price(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Format a duration in hours, dropping the fraction when it is whole
pub fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{}h", hours as u64)
    } else {
        format!("{:.1}h", hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Estação Central", 10), "Estação...");
    }

    #[test]
    fn test_format_time() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 1, 10, 5, 0).unwrap();
        assert_eq!(format_time(Some(&dt), "-"), "Mar 01, 2026 10:05");
        assert_eq!(format_time(None, "-"), "-");
    }

    #[test]
    fn test_format_price_and_hours() {
        assert_eq!(format_price(13.5), "$13.50");
        assert_eq!(format_hours(2.0), "2h");
        assert_eq!(format_hours(1.5), "1.5h");
    }
}
