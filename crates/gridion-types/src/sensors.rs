// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of GridION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use serde::{Deserialize, Serialize};

use crate::series::Resolution;

/// Attribution name for data taken directly from the transparency platform.
pub const DIRECT_SOURCE_NAME: &str = "ENTSO-E";

/// Default attribution name for data we derive locally (CO₂ intensity).
/// Configurable so operators can rename the derived signal.
pub const DEFAULT_DERIVED_SOURCE_NAME: &str = "ENTSO-E Derived";

/// Source type recorded for both attribution entries.
pub const SOURCE_TYPE: &str = "forecasting script";

/// Static declaration of a sensor this tool writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSpec {
    pub name: &'static str,
    pub unit: &'static str,
    pub resolution: Resolution,

    /// True when the platform publishes this quantity itself; false for
    /// quantities we derive. Refreshed on the stored sensor every import.
    pub sourced_directly: bool,
}

/// Sensors written by the day-ahead generation import.
pub static GENERATION_SENSORS: [SensorSpec; 5] = [
    SensorSpec {
        name: "Scheduled generation",
        unit: "MW",
        resolution: Resolution::from_minutes(15),
        sourced_directly: true,
    },
    SensorSpec {
        name: "Solar",
        unit: "MW",
        resolution: Resolution::from_minutes(60),
        sourced_directly: true,
    },
    SensorSpec {
        name: "Wind Onshore",
        unit: "MW",
        resolution: Resolution::from_minutes(60),
        sourced_directly: true,
    },
    SensorSpec {
        name: "Wind Offshore",
        unit: "MW",
        resolution: Resolution::from_minutes(60),
        sourced_directly: true,
    },
    SensorSpec {
        name: "CO₂ intensity",
        unit: "kg/MWh",
        resolution: Resolution::from_minutes(15),
        sourced_directly: false,
    },
];

/// Sensors written by the day-ahead price import.
pub static PRICING_SENSORS: [SensorSpec; 1] = [SensorSpec {
    name: "Day-ahead prices",
    unit: "EUR/MWh",
    resolution: Resolution::from_minutes(60),
    sourced_directly: true,
}];

/// Derived asset name for a transmission zone.
pub fn zone_asset_name(country_code: &str) -> String {
    format!("{country_code} transmission zone")
}

/// A transmission zone asset row: one balancing area, usually a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmissionZone {
    pub id: i64,
    pub name: String,
    pub country_code: String,
}

/// A sensor row. Immutable after creation except for `sourced_directly`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: i64,
    pub zone_id: i64,
    pub name: String,
    pub unit: String,
    pub resolution: Resolution,

    /// IANA timezone the sensor's events are localized in.
    pub timezone: String,

    pub sourced_directly: bool,
}

/// A data-source attribution row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: i64,
    pub name: String,
    pub kind: String,
}
