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

//! Aligning a raw series to a sensor's sampling resolution.

use chrono::{DateTime, TimeZone, Utc};
use gridion_types::{Resolution, TimePoint, TimeSeries};
use tracing::debug;

use crate::error::{ImportError, Result};

/// Resample a series to exactly `target` resolution.
///
/// The source resolution is inferred from timestamp spacing. A series
/// from which no uniform resolution can be inferred (fewer than two
/// points, or irregular spacing) is an error rather than a pass-through.
pub fn resample_to(series: &TimeSeries, target: Resolution) -> Result<TimeSeries> {
    let source = series.infer_resolution().ok_or_else(|| {
        ImportError::Resolution(format!(
            "series of {} points has no discernible frequency from which to derive an event resolution",
            series.len()
        ))
    })?;

    if source == target {
        return Ok(series.clone());
    }
    if source > target {
        debug!("Upsampling data from {source} to {target} ...");
        Ok(upsample(series, source, target))
    } else {
        debug!("Downsampling data from {source} to {target} ...");
        Ok(downsample(series, target))
    }
}

/// Forward-fill onto a finer grid spanning `[first, last + source)`,
/// left-closed.
fn upsample(series: &TimeSeries, source: Resolution, target: Resolution) -> TimeSeries {
    let points = series.points();
    let first = points[0].start;
    let end = points[points.len() - 1].start + source.to_duration();
    let step = target.to_duration();

    let mut out = Vec::new();
    let mut idx = 0;
    let mut cursor = first;
    while cursor < end {
        while idx + 1 < points.len() && points[idx + 1].start <= cursor {
            idx += 1;
        }
        out.push(TimePoint {
            start: cursor,
            value: points[idx].value,
        });
        cursor += step;
    }
    TimeSeries::from_points(out)
}

/// Arithmetic mean per target bucket. Buckets are floored to multiples of
/// the target resolution from the epoch, matching day-aligned bucketing
/// for the resolutions in use here (all divide 24 h evenly).
fn downsample(series: &TimeSeries, target: Resolution) -> TimeSeries {
    let mut out: Vec<TimePoint> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();

    for point in series.points() {
        let bucket = floor_to(point.start, target);
        match out.last_mut() {
            Some(last) if last.start == bucket => {
                last.value += point.value;
                if let Some(count) = counts.last_mut() {
                    *count += 1;
                }
            }
            _ => {
                out.push(TimePoint {
                    start: bucket,
                    value: point.value,
                });
                counts.push(1);
            }
        }
    }

    for (point, count) in out.iter_mut().zip(counts) {
        point.value /= count as f64;
    }
    TimeSeries::from_points(out)
}

/// Floor a timestamp to a multiple of `resolution` from the epoch.
pub fn floor_to(ts: DateTime<Utc>, resolution: Resolution) -> DateTime<Utc> {
    let step = i64::from(resolution.minutes()) * 60;
    let secs = ts.timestamp();
    let floored = secs - secs.rem_euclid(step);
    Utc.timestamp_opt(floored, 0).single().unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_identity_when_resolutions_match() {
        let s = TimeSeries::from_values(ts(0, 0), Resolution::from_minutes(15), &[1.0, 2.0, 3.0]);
        let out = resample_to(&s, Resolution::from_minutes(15)).unwrap();
        assert_eq!(out, s);
    }

    #[test]
    fn test_upsample_forward_fills_full_span() {
        // Two 4-hour values expanded to hourly cover the full 8-hour span.
        let s = TimeSeries::from_values(ts(0, 0), Resolution::from_minutes(240), &[10.0, 20.0]);
        let out = resample_to(&s, Resolution::from_minutes(60)).unwrap();
        assert_eq!(
            out.values(),
            vec![10.0, 10.0, 10.0, 10.0, 20.0, 20.0, 20.0, 20.0]
        );
        assert_eq!(out.first().unwrap().start, ts(0, 0));
        assert_eq!(out.last().unwrap().start, ts(7, 0));
    }

    #[test]
    fn test_downsample_takes_bucket_mean() {
        let s = TimeSeries::from_values(
            ts(0, 0),
            Resolution::from_minutes(15),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        );
        let out = resample_to(&s, Resolution::from_minutes(60)).unwrap();
        assert_eq!(out.values(), vec![2.5, 6.5]);
        assert_eq!(out.timestamps(), vec![ts(0, 0), ts(1, 0)]);
    }

    #[test]
    fn test_upsample_then_downsample_round_trips() {
        // Round-trip is exact when the resolution ratio is integral.
        let s = TimeSeries::from_values(ts(0, 0), Resolution::from_minutes(60), &[5.0, 7.0, 9.0]);
        let up = resample_to(&s, Resolution::from_minutes(15)).unwrap();
        let down = resample_to(&up, Resolution::from_minutes(60)).unwrap();
        assert_eq!(down, s);
    }

    #[test]
    fn test_single_point_series_is_an_error() {
        let s = TimeSeries::from_values(ts(0, 0), Resolution::from_minutes(60), &[1.0]);
        let err = resample_to(&s, Resolution::from_minutes(15)).unwrap_err();
        assert!(matches!(err, ImportError::Resolution(_)));
    }

    #[test]
    fn test_irregular_series_is_an_error() {
        let s = TimeSeries::from_points(vec![
            TimePoint {
                start: ts(0, 0),
                value: 1.0,
            },
            TimePoint {
                start: ts(0, 15),
                value: 2.0,
            },
            TimePoint {
                start: ts(1, 0),
                value: 3.0,
            },
        ]);
        assert!(matches!(
            resample_to(&s, Resolution::from_minutes(15)),
            Err(ImportError::Resolution(_))
        ));
    }

    #[test]
    fn test_floor_to_hour() {
        assert_eq!(floor_to(ts(3, 47), Resolution::from_minutes(60)), ts(3, 0));
        assert_eq!(floor_to(ts(3, 0), Resolution::from_minutes(60)), ts(3, 0));
    }
}
