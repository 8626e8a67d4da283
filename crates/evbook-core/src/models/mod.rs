//! Data models for the charging API.
//!
//! - `Station`: a bookable charger and its hourly price
//! - `Booking`, `BookingRequest`: booking history and new reservations
//! - `Locale`: language preference sent with every request

pub mod booking;
pub mod locale;
pub mod station;

pub use booking::{Booking, BookingError, BookingRequest, BookingStatus, StationSummary};
pub use locale::Locale;
pub use station::{Station, StationStatus};

use serde::{Deserialize, Deserializer};

/// Ids arrive as strings from some deployments and numbers from others.
pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_id(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}
