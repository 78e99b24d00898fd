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

//! Knowledge-time computation and the series-to-belief packager.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use gridion_types::{Belief, BeliefsCollection, Sensor, SourceRecord, TimeSeries};

use crate::error::{ImportError, Result};
use crate::timerange::local_midnight;

/// Compute one knowledge time per event time in `series`.
///
/// Day-ahead data for a calendar day is published no later than 18:00
/// local time on the preceding day: floor the event to its local day,
/// subtract 6 hours. The result is clipped to `now` so retroactive
/// imports never claim a forecast was knowable in the future.
pub fn knowledge_times(series: &TimeSeries, timezone: Tz, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    series
        .points()
        .iter()
        .map(|point| {
            let event_day = point.start.with_timezone(&timezone).date_naive();
            let published = local_midnight(event_day, timezone) - Duration::hours(6);
            published.min(now)
        })
        .collect()
}

/// Bind a value series to its sensor, source and knowledge times.
///
/// An empty series is rejected: it means the forecast is not published
/// yet, which must abort the run before any persistence happens.
pub fn package(
    series: &TimeSeries,
    sensor: &Sensor,
    source: &SourceRecord,
    timezone: Tz,
    now: DateTime<Utc>,
) -> Result<BeliefsCollection> {
    if series.is_empty() {
        return Err(ImportError::EmptySeries(sensor.name.clone()));
    }

    let times = knowledge_times(series, timezone, now);
    let beliefs = series
        .points()
        .iter()
        .zip(times)
        .map(|(point, belief_time)| Belief {
            event_start: point.start,
            belief_time,
            event_value: point.value,
        })
        .collect();

    Ok(BeliefsCollection {
        sensor_id: sensor.id,
        source_id: source.id,
        beliefs,
    })
}
