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

//! Collaborator traits the pipeline runs against.
//!
//! The real implementations live in gridion-entsoe (network) and
//! gridion-store (SQLite); tests substitute in-memory fakes.

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Utc};
use gridion_types::{BeliefsCollection, GenerationTable, Sensor, SensorSpec, SourceRecord,
    TimeSeries, TransmissionZone};

/// Day-ahead forecast data provider.
///
/// All fetches return empty results (not errors) when the platform has
/// not published the requested window yet. Time windows are half-open
/// `[from, until)` in UTC.
pub trait ForecastProvider {
    /// Overall scheduled (non-renewable) generation forecast.
    fn fetch_scheduled_generation(
        &self,
        country_code: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<TimeSeries>;

    /// Solar and wind generation forecasts, one column per production type.
    fn fetch_renewable_generation(
        &self,
        country_code: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<GenerationTable>;

    /// Day-ahead market prices.
    fn fetch_day_ahead_prices(
        &self,
        country_code: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<TimeSeries>;
}

/// Registry of transmission zones, sensors and data sources.
///
/// All ensure operations are create-if-absent and safe to repeat; the
/// backing store's uniqueness constraints guard the narrow race between
/// two simultaneous first-time imports for the same zone.
pub trait SensorRegistry {
    fn ensure_zone(&self, country_code: &str) -> Result<TransmissionZone>;

    /// Look up or create the sensor for `spec` under `zone`. Refreshes the
    /// `sourced_directly` flag on an existing sensor; everything else is
    /// immutable after creation.
    fn ensure_sensor(
        &self,
        zone: &TransmissionZone,
        spec: &SensorSpec,
        timezone: &str,
    ) -> Result<Sensor>;

    fn find_sensor(&self, zone: &TransmissionZone, name: &str) -> Result<Option<Sensor>>;

    fn ensure_source(&self, name: &str, kind: &str) -> Result<SourceRecord>;
}

/// Persistence for belief collections.
pub trait BeliefStore {
    /// Write a collection, skipping beliefs whose value is unchanged
    /// against what is already stored for (sensor, event time, source).
    fn save(&self, collection: &BeliefsCollection) -> Result<SaveOutcome>;
}

/// What a save call actually did. Logged, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// All submitted beliefs were new.
    Created(usize),

    /// Every belief had already been saved before.
    Unchanged,

    /// Some beliefs were new, some had been saved before.
    PartiallyUnchanged { created: usize, skipped: usize },
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(n) => write!(f, "{n} new beliefs saved"),
            Self::Unchanged => write!(f, "all beliefs had already been saved before"),
            Self::PartiallyUnchanged { created, skipped } => {
                write!(f, "{created} new beliefs saved, {skipped} already known")
            }
        }
    }
}
