use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{deserialize_id, Locale, Station, StationStatus};

/// Shortest booking the service accepts, in hours
pub const MIN_BOOKING_HOURS: u32 = 1;

/// Longest booking the service accepts, in hours
pub const MAX_BOOKING_HOURS: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
    Unknown,
}

impl BookingStatus {
    /// The API sends `PENDING`, older deployments send `pending`
    pub fn from_api(value: &str) -> Self {
        value.parse().unwrap_or(BookingStatus::Unknown)
    }

    pub fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (BookingStatus::Pending, Locale::En) => "Pending",
            (BookingStatus::Active, Locale::En) => "Active",
            (BookingStatus::Completed, Locale::En) => "Completed",
            (BookingStatus::Cancelled, Locale::En) => "Cancelled",
            (BookingStatus::Unknown, Locale::En) => "Unknown",
            (BookingStatus::Pending, Locale::Pt) => "Pendente",
            (BookingStatus::Active, Locale::Pt) => "Ativa",
            (BookingStatus::Completed, Locale::Pt) => "Concluída",
            (BookingStatus::Cancelled, Locale::Pt) => "Cancelada",
            (BookingStatus::Unknown, Locale::Pt) => "Desconhecido",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "active" => Ok(BookingStatus::Active),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            _ => Err(()),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label(Locale::En))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct StationSummary {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    pub location: String,
    pub power: f64,
}

/// A booking as returned by `GET /bookings`, with missing numbers defaulted
/// to zero and the status normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase", from = "BookingRecord")]
pub struct Booking {
    pub id: String,
    pub station_id: String,
    pub station: Option<StationSummary>,
    pub duration_minutes: u32,
    pub total_price: f64,
    pub status: BookingStatus,
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub start_time: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub end_time: Option<DateTime<Utc>>,
    pub power_kw: f64,
}

impl Booking {
    pub fn duration_hours(&self) -> f64 {
        f64::from(self.duration_minutes) / 60.0
    }

    pub fn station_name(&self) -> &str {
        self.station
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or(&self.station_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingRecord {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    #[serde(deserialize_with = "deserialize_id")]
    station_id: String,
    #[serde(default)]
    station: Option<StationSummary>,
    #[serde(default)]
    duration_minutes: Option<u32>,
    #[serde(default)]
    total_price: Option<f64>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    power_kw: Option<f64>,
}

impl From<BookingRecord> for Booking {
    fn from(record: BookingRecord) -> Self {
        Self {
            id: record.id,
            station_id: record.station_id,
            station: record.station,
            duration_minutes: record.duration_minutes.unwrap_or(0),
            total_price: record.total_price.unwrap_or(0.0),
            status: record
                .status
                .as_deref()
                .map(BookingStatus::from_api)
                .unwrap_or(BookingStatus::Unknown),
            start_time: record.start_time.as_deref().and_then(parse_timestamp),
            end_time: record.end_time.as_deref().and_then(parse_timestamp),
            power_kw: record.power_kw.unwrap_or(0.0),
        }
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Error, Debug, PartialEq)]
pub enum BookingError {
    #[error("Duration must be between 1 and 24 hours, got {0}")]
    InvalidDuration(u32),

    #[error("Station {name} is {status} and cannot be booked")]
    StationUnavailable { name: String, status: StationStatus },
}

/// Body of `POST /bookings`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub station_id: String,
    pub duration_minutes: u32,
}

impl BookingRequest {
    pub fn new(station_id: impl Into<String>, hours: u32) -> Result<Self, BookingError> {
        if !(MIN_BOOKING_HOURS..=MAX_BOOKING_HOURS).contains(&hours) {
            return Err(BookingError::InvalidDuration(hours));
        }
        Ok(Self {
            station_id: station_id.into(),
            duration_minutes: hours * 60,
        })
    }

    /// Like [`BookingRequest::new`], also refusing stations that are not available
    pub fn for_station(station: &Station, hours: u32) -> Result<Self, BookingError> {
        if !station.is_available() {
            return Err(BookingError::StationUnavailable {
                name: station.name.clone(),
                status: station.status,
            });
        }
        Self::new(station.id.clone(), hours)
    }
}
