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

//! The import orchestrator.
//!
//! One invocation runs one zone and one date range through
//! fetch → validate → normalize → derive → route → package → persist.
//! Any fatal condition aborts the whole run before anything is written;
//! dry-run mode executes every stage except persistence.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use gridion_types::{
    DIRECT_SOURCE_NAME, GENERATION_SENSORS, GenerationTable, PRICING_SENSORS, SOURCE_TYPE, Sensor,
    SensorSpec, SourceRecord, TimeSeries,
};
use tracing::{debug, info};

use crate::belief;
use crate::carbon::EmissionPolicy;
use crate::error::{ImportError, Result};
use crate::resample::resample_to;
use crate::routing::{self, SeriesKind};
use crate::timerange::QueryWindow;
use crate::traits::{BeliefStore, ForecastProvider, SaveOutcome, SensorRegistry};

/// Everything resolved from configuration before a run starts.
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub country_code: String,
    pub timezone: Tz,
    pub derived_source_name: String,
    pub policy: EmissionPolicy,

    /// Wall-clock time captured once per run; every knowledge time in the
    /// run is clipped against the same instant.
    pub now: DateTime<Utc>,
}

impl ImportContext {
    pub fn new(
        country_code: impl Into<String>,
        timezone: Tz,
        derived_source_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            country_code: country_code.into(),
            timezone,
            derived_source_name: derived_source_name.into(),
            policy: EmissionPolicy::default(),
            now,
        }
    }
}

/// Options specific to the price import.
#[derive(Debug, Clone, Default)]
pub struct PriceImportOptions {
    /// Store into this existing sensor instead of the default one.
    pub sensor_name: Option<String>,

    /// Attribute the data to this source name instead of the default.
    pub source_name: Option<String>,
}

/// Per-sensor result of one import invocation, for monitoring.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub entries: Vec<SensorOutcome>,
}

#[derive(Debug, Clone)]
pub struct SensorOutcome {
    pub sensor_name: String,
    pub beliefs: usize,

    /// `None` when persistence was skipped (dry run).
    pub outcome: Option<SaveOutcome>,
}

impl ImportReport {
    fn record(&mut self, sensor_name: &str, beliefs: usize, outcome: Option<SaveOutcome>) {
        self.entries.push(SensorOutcome {
            sensor_name: sensor_name.to_owned(),
            beliefs,
            outcome,
        });
    }

    pub fn total_beliefs(&self) -> usize {
        self.entries.iter().map(|e| e.beliefs).sum()
    }
}

/// The pipeline over its three collaborators.
pub struct ImportPipeline<'a> {
    pub provider: &'a dyn ForecastProvider,
    pub registry: &'a dyn SensorRegistry,
    pub store: &'a dyn BeliefStore,
}

impl ImportPipeline<'_> {
    /// Import forecasted generation, defaulting to today and tomorrow.
    ///
    /// Saves scheduled generation, solar, onshore and offshore wind, and
    /// the estimated CO₂ intensity.
    pub fn import_day_ahead_generation(
        &self,
        ctx: &ImportContext,
        window: &QueryWindow,
        dry_run: bool,
    ) -> Result<ImportReport> {
        routing::validate_generation_routing(&GENERATION_SENSORS)?;

        let (sensors, direct_source, derived_source) = self.ensure_generation_registry(ctx)?;

        info!(
            "Importing day-ahead generation for {} (timezone {}), starting at {}, up until {} ...",
            ctx.country_code, ctx.timezone, window.from, window.until
        );

        info!("Getting scheduled generation ...");
        // Green (solar & wind) generation is not scheduled, so it is not
        // part of this series.
        let scheduled = self
            .provider
            .fetch_scheduled_generation(&ctx.country_code, window.from, window.until)
            .map_err(ImportError::Provider)?;
        if scheduled.is_empty() {
            return Err(ImportError::EmptyResult("scheduled generation".to_owned()));
        }

        info!("Getting green generation ...");
        let green = self
            .provider
            .fetch_renewable_generation(&ctx.country_code, window.from, window.until)
            .map_err(ImportError::Provider)?;
        if green.is_empty() {
            return Err(ImportError::EmptyResult("renewable generation".to_owned()));
        }
        // A partially published table is the same condition as an empty
        // one: the derived sensors would be left without their inputs.
        for (name, column) in [
            ("solar generation", &green.solar),
            ("onshore wind generation", &green.wind_onshore),
            ("offshore wind generation", &green.wind_offshore),
        ] {
            if column.is_empty() {
                return Err(ImportError::EmptyResult(name.to_owned()));
            }
        }

        // Normalize every directly sourced series to its sensor's
        // resolution.
        let scheduled = normalize_for(&sensors, SeriesKind::ScheduledGeneration, &scheduled)?;
        let solar = normalize_for(&sensors, SeriesKind::Solar, &green.solar)?;
        let wind_onshore = normalize_for(&sensors, SeriesKind::WindOnshore, &green.wind_onshore)?;
        let wind_offshore =
            normalize_for(&sensors, SeriesKind::WindOffshore, &green.wind_offshore)?;

        // Reconcile all inputs onto the derived sensor's grid, then
        // derive the intensity series.
        info!("Computing CO₂ intensity from the MWh values ...");
        let derived_resolution = sensor_for(&sensors, SeriesKind::CarbonIntensity)?.1.resolution;
        let aligned_scheduled = resample_to(&scheduled, derived_resolution)?;
        let aligned_green = GenerationTable {
            solar: resample_to(&green.solar, derived_resolution)?,
            wind_onshore: resample_to(&green.wind_onshore, derived_resolution)?,
            wind_offshore: resample_to(&green.wind_offshore, derived_resolution)?,
        };
        let intensity = ctx
            .policy
            .intensity_kg_per_mwh(&aligned_scheduled, &aligned_green);
        debug!("Overall CO₂ intensity (kg/MWh): {:?}", intensity.values());

        let mut report = ImportReport::default();
        for (spec, sensor) in &sensors {
            let kind = routing::generation_series_kind(spec.name)
                .ok_or_else(|| ImportError::Mapping(spec.name.to_owned()))?;
            let series = match kind {
                SeriesKind::ScheduledGeneration => &scheduled,
                SeriesKind::Solar => &solar,
                SeriesKind::WindOnshore => &wind_onshore,
                SeriesKind::WindOffshore => &wind_offshore,
                SeriesKind::CarbonIntensity => &intensity,
            };
            let source = if spec.sourced_directly {
                &direct_source
            } else {
                &derived_source
            };
            self.persist(ctx, sensor, source, series, dry_run, &mut report)?;
        }
        Ok(report)
    }

    /// Import forecasted day-ahead prices, defaulting to today and
    /// tomorrow.
    pub fn import_day_ahead_prices(
        &self,
        ctx: &ImportContext,
        window: &QueryWindow,
        dry_run: bool,
        options: &PriceImportOptions,
    ) -> Result<ImportReport> {
        let zone = self
            .registry
            .ensure_zone(&ctx.country_code)
            .map_err(ImportError::Store)?;

        let spec = &PRICING_SENSORS[0];
        let sensor = match &options.sensor_name {
            None => self
                .registry
                .ensure_sensor(&zone, spec, ctx.timezone.name())
                .map_err(ImportError::Store)?,
            Some(name) => self
                .registry
                .find_sensor(&zone, name)
                .map_err(ImportError::Store)?
                .ok_or_else(|| {
                    ImportError::Config(format!("price sensor {name} does not exist"))
                })?,
        };
        let source_name = options
            .source_name
            .as_deref()
            .unwrap_or(DIRECT_SOURCE_NAME);
        let source = self
            .registry
            .ensure_source(source_name, SOURCE_TYPE)
            .map_err(ImportError::Store)?;

        info!(
            "Importing day-ahead prices for {} (timezone {}), starting at {}, up until {} ...",
            ctx.country_code, ctx.timezone, window.from, window.until
        );

        info!("Getting prices ...");
        let prices = self
            .provider
            .fetch_day_ahead_prices(&ctx.country_code, window.from, window.until)
            .map_err(ImportError::Provider)?;
        if prices.is_empty() {
            return Err(ImportError::EmptyResult("day-ahead prices".to_owned()));
        }

        let prices = resample_to(&prices, sensor.resolution)?;

        let mut report = ImportReport::default();
        self.persist(ctx, &sensor, &source, &prices, dry_run, &mut report)?;
        Ok(report)
    }

    fn ensure_generation_registry(
        &self,
        ctx: &ImportContext,
    ) -> Result<(Vec<(&'static SensorSpec, Sensor)>, SourceRecord, SourceRecord)> {
        let zone = self
            .registry
            .ensure_zone(&ctx.country_code)
            .map_err(ImportError::Store)?;

        let mut sensors = Vec::with_capacity(GENERATION_SENSORS.len());
        for spec in &GENERATION_SENSORS {
            let sensor = self
                .registry
                .ensure_sensor(&zone, spec, ctx.timezone.name())
                .map_err(ImportError::Store)?;
            sensors.push((spec, sensor));
        }

        let direct = self
            .registry
            .ensure_source(DIRECT_SOURCE_NAME, SOURCE_TYPE)
            .map_err(ImportError::Store)?;
        let derived = self
            .registry
            .ensure_source(&ctx.derived_source_name, SOURCE_TYPE)
            .map_err(ImportError::Store)?;
        Ok((sensors, direct, derived))
    }

    fn persist(
        &self,
        ctx: &ImportContext,
        sensor: &Sensor,
        source: &SourceRecord,
        series: &TimeSeries,
        dry_run: bool,
        report: &mut ImportReport,
    ) -> Result<()> {
        let collection = belief::package(series, sensor, source, ctx.timezone, ctx.now)?;
        if dry_run {
            info!(
                "Dry run: would save {} beliefs for sensor {}",
                collection.len(),
                sensor.name
            );
            report.record(&sensor.name, collection.len(), None);
            return Ok(());
        }

        info!(
            "Saving {} beliefs for sensor {} ...",
            collection.len(),
            sensor.name
        );
        let outcome = self.store.save(&collection).map_err(ImportError::Store)?;
        info!("Done. {outcome}");
        report.record(&sensor.name, collection.len(), Some(outcome));
        Ok(())
    }
}

fn sensor_for<'a>(
    sensors: &'a [(&'static SensorSpec, Sensor)],
    kind: SeriesKind,
) -> Result<&'a (&'static SensorSpec, Sensor)> {
    sensors
        .iter()
        .find(|(spec, _)| routing::generation_series_kind(spec.name) == Some(kind))
        .ok_or_else(|| ImportError::Mapping(format!("{kind:?}")))
}

fn normalize_for(
    sensors: &[(&'static SensorSpec, Sensor)],
    kind: SeriesKind,
    series: &TimeSeries,
) -> Result<TimeSeries> {
    let (_, sensor) = sensor_for(sensors, kind)?;
    resample_to(series, sensor.resolution)
}
