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

//! Mapping generation sensors to the series that feed them.
//!
//! The mapping is validated exhaustively before any network call, so an
//! unmapped sensor fails fast instead of after a fetch.

use gridion_types::SensorSpec;

use crate::error::{ImportError, Result};

/// The computed series a generation sensor can be fed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    ScheduledGeneration,
    Solar,
    WindOnshore,
    WindOffshore,
    CarbonIntensity,
}

/// Resolve a generation sensor name to its series.
pub fn generation_series_kind(sensor_name: &str) -> Option<SeriesKind> {
    match sensor_name {
        "Scheduled generation" => Some(SeriesKind::ScheduledGeneration),
        "Solar" => Some(SeriesKind::Solar),
        "Wind Onshore" => Some(SeriesKind::WindOnshore),
        "Wind Offshore" => Some(SeriesKind::WindOffshore),
        "CO₂ intensity" => Some(SeriesKind::CarbonIntensity),
        _ => None,
    }
}

/// Check that every configured sensor has a series feeding it.
pub fn validate_generation_routing(specs: &[SensorSpec]) -> Result<()> {
    for spec in specs {
        if generation_series_kind(spec.name).is_none() {
            return Err(ImportError::Mapping(spec.name.to_owned()));
        }
    }
    Ok(())
}
