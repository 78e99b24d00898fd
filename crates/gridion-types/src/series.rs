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

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Sampling resolution of a series or sensor, in whole minutes.
///
/// The resolutions we receive from the transparency platform are 15, 30 and
/// 60 minutes, but any positive minute count is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resolution(u32);

impl Resolution {
    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn to_duration(self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }

    /// Build a resolution from a timestamp spacing, if it is a positive
    /// whole number of minutes.
    pub fn from_duration(duration: Duration) -> Option<Self> {
        let seconds = duration.num_seconds();
        if seconds <= 0 || seconds % 60 != 0 {
            return None;
        }
        u32::try_from(seconds / 60).ok().map(Self)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

/// A single observation: the start of the event period and its value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub start: DateTime<Utc>,

    /// Value in the unit of the owning series. NaN marks an undefined
    /// value and propagates through arithmetic.
    pub value: f64,
}

/// An ordered series of timestamped values.
///
/// Timestamps are kept in UTC; localization only happens at the edges
/// (belief-time computation, date-range interpretation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    points: Vec<TimePoint>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Build a series from points, sorting them by start time.
    pub fn from_points(mut points: Vec<TimePoint>) -> Self {
        points.sort_by_key(|p| p.start);
        Self { points }
    }

    /// Build a series from evenly spaced values starting at `start`.
    pub fn from_values(start: DateTime<Utc>, resolution: Resolution, values: &[f64]) -> Self {
        let step = resolution.to_duration();
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &value)| TimePoint {
                start: start + step * i32::try_from(i).unwrap_or(i32::MAX),
                value,
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&TimePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TimePoint> {
        self.points.last()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.start).collect()
    }

    pub fn value_at(&self, start: DateTime<Utc>) -> Option<f64> {
        self.points
            .binary_search_by_key(&start, |p| p.start)
            .ok()
            .map(|idx| self.points[idx].value)
    }

    /// Infer the uniform sampling resolution from timestamp spacing.
    ///
    /// Returns `None` for series with fewer than two points or with
    /// irregular spacing.
    pub fn infer_resolution(&self) -> Option<Resolution> {
        if self.points.len() < 2 {
            return None;
        }
        let step = self.points[1].start - self.points[0].start;
        for pair in self.points.windows(2) {
            if pair[1].start - pair[0].start != step {
                return None;
            }
        }
        Resolution::from_duration(step)
    }

    /// Apply `f` to every value, keeping timestamps.
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| TimePoint {
                    start: p.start,
                    value: f(p.value),
                })
                .collect(),
        }
    }

    pub fn scale(&self, factor: f64) -> Self {
        self.map_values(|v| v * factor)
    }

    /// Combine two series over the union of their timestamps.
    ///
    /// A timestamp missing on either side contributes NaN, so misaligned
    /// series degrade to undefined values instead of panicking.
    pub fn zip_union(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let mut starts: Vec<DateTime<Utc>> = self
            .points
            .iter()
            .chain(other.points.iter())
            .map(|p| p.start)
            .collect();
        starts.sort_unstable();
        starts.dedup();

        let points = starts
            .into_iter()
            .map(|start| TimePoint {
                start,
                value: f(
                    self.value_at(start).unwrap_or(f64::NAN),
                    other.value_at(start).unwrap_or(f64::NAN),
                ),
            })
            .collect();
        Self { points }
    }

    pub fn add(&self, other: &Self) -> Self {
        self.zip_union(other, |a, b| a + b)
    }

    pub fn div(&self, other: &Self) -> Self {
        self.zip_union(other, |a, b| a / b)
    }
}

/// Renewable generation forecast, one column per production type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationTable {
    pub solar: TimeSeries,
    pub wind_onshore: TimeSeries,
    pub wind_offshore: TimeSeries,
}

impl GenerationTable {
    /// True when no column holds any data.
    pub fn is_empty(&self) -> bool {
        self.solar.is_empty() && self.wind_onshore.is_empty() && self.wind_offshore.is_empty()
    }

    /// Aggregate all columns into one series.
    pub fn sum_columns(&self) -> TimeSeries {
        self.solar.add(&self.wind_onshore).add(&self.wind_offshore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_from_values_spacing() {
        let s = TimeSeries::from_values(ts(0, 0), Resolution::from_minutes(15), &[1.0, 2.0, 3.0]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.points()[1].start, ts(0, 15));
        assert_eq!(s.points()[2].start, ts(0, 30));
    }

    #[test]
    fn test_infer_resolution_uniform() {
        let s = TimeSeries::from_values(ts(0, 0), Resolution::from_minutes(60), &[1.0, 2.0, 3.0]);
        assert_eq!(s.infer_resolution(), Some(Resolution::from_minutes(60)));
    }

    #[test]
    fn test_infer_resolution_single_point_is_none() {
        let s = TimeSeries::from_values(ts(0, 0), Resolution::from_minutes(60), &[1.0]);
        assert_eq!(s.infer_resolution(), None);
    }

    #[test]
    fn test_infer_resolution_irregular_is_none() {
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
        assert_eq!(s.infer_resolution(), None);
    }

    #[test]
    fn test_zip_union_misaligned_yields_nan() {
        let a = TimeSeries::from_values(ts(0, 0), Resolution::from_minutes(60), &[1.0, 2.0]);
        let b = TimeSeries::from_values(ts(0, 30), Resolution::from_minutes(60), &[10.0, 20.0]);
        let sum = a.add(&b);
        assert_eq!(sum.len(), 4);
        assert!(sum.values().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_add_aligned() {
        let a = TimeSeries::from_values(ts(0, 0), Resolution::from_minutes(60), &[1.0, 2.0]);
        let b = TimeSeries::from_values(ts(0, 0), Resolution::from_minutes(60), &[10.0, 20.0]);
        assert_eq!(a.add(&b).values(), vec![11.0, 22.0]);
    }

    #[test]
    fn test_generation_table_sum() {
        let start = ts(0, 0);
        let r = Resolution::from_minutes(60);
        let table = GenerationTable {
            solar: TimeSeries::from_values(start, r, &[1.0, 2.0]),
            wind_onshore: TimeSeries::from_values(start, r, &[3.0, 4.0]),
            wind_offshore: TimeSeries::from_values(start, r, &[5.0, 6.0]),
        };
        assert_eq!(table.sum_columns().values(), vec![9.0, 12.0]);
        assert!(!table.is_empty());
        assert!(GenerationTable::default().is_empty());
    }
}
