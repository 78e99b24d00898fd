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

//! Turning inclusive calendar dates into a half-open query window.

use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Half-open time window `[from, until)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

/// Midnight of `day` in `timezone`.
///
/// On days where local midnight is ambiguous the earlier instant wins; on
/// days where it does not exist (a DST gap) the first valid instant of
/// the day is used.
pub fn local_midnight(day: NaiveDate, timezone: Tz) -> DateTime<Utc> {
    match timezone.from_local_datetime(&day.and_time(NaiveTime::MIN)) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            let fallback = day.and_time(NaiveTime::MIN) + chrono::Duration::hours(1);
            timezone
                .from_local_datetime(&fallback)
                .earliest()
                .map_or_else(
                    || Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)),
                    |dt| dt.with_timezone(&Utc),
                )
        }
    }
}

/// Build the query window from optional inclusive CLI dates, defaulting
/// to today and tomorrow in the zone-local timezone.
///
/// The inclusive end date becomes exclusive by adding one calendar day
/// (not 24 hours), so windows spanning a DST transition stay aligned to
/// local midnights.
pub fn query_window(
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
    timezone: Tz,
    now: DateTime<Utc>,
) -> QueryWindow {
    let today = now.with_timezone(&timezone).date_naive();
    let from = from_date.unwrap_or(today);
    let to = to_date.unwrap_or_else(|| today + Days::new(1));
    let until = to + Days::new(1);

    QueryWindow {
        from: local_midnight(from, timezone),
        until: local_midnight(until, timezone),
    }
}
