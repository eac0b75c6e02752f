pub mod auth;
pub mod export;
pub mod plans;
pub mod tips;

use chrono::{DateTime, Utc};

/// Render a stored RFC 3339 timestamp as a short date, falling back to the raw
/// value when it does not parse.
pub fn format_date(timestamp: &str) -> String {
    timestamp
        .parse::<DateTime<Utc>>()
        .map(|dt| dt.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}
