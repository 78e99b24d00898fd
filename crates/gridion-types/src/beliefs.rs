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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped claim about a sensor value.
///
/// `belief_time` is when the claim became knowable, not when the event
/// occurs; for day-ahead forecasts it lies before `event_start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    pub event_start: DateTime<Utc>,
    pub belief_time: DateTime<Utc>,
    pub event_value: f64,
}

/// A batch of beliefs for one sensor from one source, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefsCollection {
    pub sensor_id: i64,
    pub source_id: i64,
    pub beliefs: Vec<Belief>,
}

impl BeliefsCollection {
    pub fn len(&self) -> usize {
        self.beliefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beliefs.is_empty()
    }
}
