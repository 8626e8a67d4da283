use std::fmt;

use serde::{Deserialize, Serialize};

use super::deserialize_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum StationStatus {
    Available,
    Occupied,
    Maintenance,
}

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationStatus::Available => write!(f, "available"),
            StationStatus::Occupied => write!(f, "occupied"),
            StationStatus::Maintenance => write!(f, "maintenance"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Station {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    /// Charger output in kW
    pub power: f64,
    pub location: String,
    pub status: StationStatus,
    pub price_per_hour: f64,
}

impl Station {
    pub fn is_available(&self) -> bool {
        self.status == StationStatus::Available
    }

    pub fn estimated_price(&self, hours: u32) -> f64 {
        f64::from(hours) * self.price_per_hour
    }

    pub fn display_power(&self) -> String {
        format!("{} kW", self.power)
    }

    pub fn display_price(&self) -> String {
        format!("${:.2}/hr", self.price_per_hour)
    }
}
