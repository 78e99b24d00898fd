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

//! Carbon-intensity estimation from the generation mix.
//!
//! Scheduled ("grey") generation is weighted with a constant intensity
//! factor built from fixed national fuel-mix shares; renewable ("green")
//! generation contributes its own per-type footprint. The coefficient
//! table is a versioned policy value so revisions don't touch pipeline
//! code.

use gridion_types::{GenerationTable, TimeSeries};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shares of the grey (non-renewable) energy mix by fuel.
///
/// The shares deliberately sum to less than 1.0: nuclear, hydro and
/// biomass are excluded from the grey estimate and the remainder is
/// ignored, not renormalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GreyEnergyMix {
    pub gas: f64,
    pub oil: f64,
    pub coal: f64,
}

/// Emission intensity per production type, in kg CO₂ per MWh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionIntensity {
    /// Lignite.
    pub coal: f64,

    /// Natural gas.
    pub gas: f64,

    pub oil: f64,

    /// Mix of utility and residential, expressed per kWh; divided by
    /// 1000 where applied to match the MWh-based factors.
    pub solar: f64,

    pub wind_onshore: f64,

    pub wind_offshore: f64,
}

/// A versioned coefficient table for the carbon-intensity estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionPolicy {
    pub grey_mix: GreyEnergyMix,
    pub intensity: EmissionIntensity,
}

impl EmissionPolicy {
    /// Dutch 2020 energy-mix shares with levelized emission intensities.
    pub fn nl_2020() -> Self {
        Self {
            grey_mix: GreyEnergyMix {
                gas: 0.598,
                oil: 0.045,
                coal: 0.0718,
            },
            intensity: EmissionIntensity {
                coal: 870.0,
                gas: 464.0,
                oil: 652.0,
                solar: 44.5,
                wind_onshore: 14.0,
                wind_offshore: 17.0,
            },
        }
    }

    /// Constant intensity factor for scheduled generation, kg CO₂ per MWh.
    pub fn grey_intensity_factor(&self) -> f64 {
        self.grey_mix.coal * self.intensity.coal
            + self.grey_mix.gas * self.intensity.gas
            + self.grey_mix.oil * self.intensity.oil
    }

    /// Total CO₂ mass in kg: grey generation times the grey factor, plus
    /// each renewable column times its own coefficient.
    pub fn co2_mass_kg(&self, scheduled: &TimeSeries, green: &GenerationTable) -> TimeSeries {
        let grey_factor = self.grey_intensity_factor();
        debug!("Grey intensity factor: {grey_factor}");

        let grey_mass = scheduled.scale(grey_factor);
        let solar_mass = green.solar.scale(self.intensity.solar / 1000.0);
        let wind_onshore_mass = green.wind_onshore.scale(self.intensity.wind_onshore);
        let wind_offshore_mass = green.wind_offshore.scale(self.intensity.wind_offshore);

        grey_mass
            .add(&solar_mass)
            .add(&wind_onshore_mass)
            .add(&wind_offshore_mass)
    }

    /// Forecasted carbon intensity in kg CO₂ per MWh: total mass over
    /// combined generation, elementwise. Periods without any generation
    /// divide to NaN, which propagates instead of crashing.
    pub fn intensity_kg_per_mwh(&self, scheduled: &TimeSeries, green: &GenerationTable) -> TimeSeries {
        let mass = self.co2_mass_kg(scheduled, green);
        let combined = scheduled.add(&green.sum_columns());
        mass.div(&combined)
    }
}

impl Default for EmissionPolicy {
    fn default() -> Self {
        Self::nl_2020()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use gridion_types::Resolution;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap()
    }

    fn hourly(values: &[f64]) -> TimeSeries {
        TimeSeries::from_values(start(), Resolution::from_minutes(60), values)
    }

    fn zero_green(len: usize) -> GenerationTable {
        GenerationTable {
            solar: hourly(&vec![0.0; len]),
            wind_onshore: hourly(&vec![0.0; len]),
            wind_offshore: hourly(&vec![0.0; len]),
        }
    }

    #[test]
    fn test_grey_intensity_factor() {
        let factor = EmissionPolicy::nl_2020().grey_intensity_factor();
        let expected = 870.0 * 0.0718 + 464.0 * 0.598 + 652.0 * 0.045;
        assert!((factor - expected).abs() < 1e-12);
        assert!((factor - 369.278).abs() < 1e-3);
    }

    #[test]
    fn test_intensity_without_renewables_is_grey_factor() {
        let policy = EmissionPolicy::nl_2020();
        let intensity = policy.intensity_kg_per_mwh(&hourly(&[100.0, 200.0]), &zero_green(2));
        let factor = policy.grey_intensity_factor();
        for value in intensity.values() {
            assert!((value - factor).abs() < 1e-9);
        }
    }

    #[test]
    fn test_intensity_is_scale_invariant() {
        let policy = EmissionPolicy::nl_2020();
        let scheduled = hourly(&[120.0, 80.0]);
        let green = GenerationTable {
            solar: hourly(&[30.0, 10.0]),
            wind_onshore: hourly(&[5.0, 15.0]),
            wind_offshore: hourly(&[25.0, 20.0]),
        };
        let scaled_green = GenerationTable {
            solar: green.solar.scale(3.0),
            wind_onshore: green.wind_onshore.scale(3.0),
            wind_offshore: green.wind_offshore.scale(3.0),
        };

        let base = policy.intensity_kg_per_mwh(&scheduled, &green);
        let scaled = policy.intensity_kg_per_mwh(&scheduled.scale(3.0), &scaled_green);
        for (a, b) in base.values().into_iter().zip(scaled.values()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_generation_yields_nan() {
        let policy = EmissionPolicy::nl_2020();
        let intensity = policy.intensity_kg_per_mwh(&hourly(&[0.0, 100.0]), &zero_green(2));
        let values = intensity.values();
        assert!(values[0].is_nan());
        assert!(values[1].is_finite());
    }

    #[test]
    fn test_solar_coefficient_is_per_kwh() {
        let policy = EmissionPolicy::nl_2020();
        let green = GenerationTable {
            solar: hourly(&[1000.0]),
            wind_onshore: hourly(&[0.0]),
            wind_offshore: hourly(&[0.0]),
        };
        // A single-point series has no inferable resolution, but the
        // estimator itself is indifferent to it.
        let mass = policy.co2_mass_kg(&hourly(&[0.0]), &green);
        assert!((mass.values()[0] - 44.5).abs() < 1e-9);
    }
}
