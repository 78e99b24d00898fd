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

//! SQLite persistence for zones, sensors, sources and beliefs.
//!
//! Ensure operations are create-if-absent inside a transaction; the
//! uniqueness constraints make repeats (and the narrow race between two
//! simultaneous first-time imports) harmless. Saving dedupes against
//! unchanged prior beliefs per (sensor, event time, source).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gridion_core::{BeliefStore, SaveOutcome, SensorRegistry};
use gridion_types::{
    BeliefsCollection, Resolution, Sensor, SensorSpec, SourceRecord, TransmissionZone,
    zone_asset_name,
};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS assets (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    country_code TEXT NOT NULL,
    asset_type TEXT NOT NULL DEFAULT 'transmission zone'
);
CREATE TABLE IF NOT EXISTS sensors (
    id INTEGER PRIMARY KEY,
    asset_id INTEGER NOT NULL REFERENCES assets(id),
    name TEXT NOT NULL,
    unit TEXT NOT NULL,
    resolution_minutes INTEGER NOT NULL,
    timezone TEXT NOT NULL,
    sourced_directly INTEGER NOT NULL,
    UNIQUE (asset_id, name, unit)
);
CREATE TABLE IF NOT EXISTS data_sources (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    UNIQUE (name, type)
);
CREATE TABLE IF NOT EXISTS beliefs (
    id INTEGER PRIMARY KEY,
    sensor_id INTEGER NOT NULL REFERENCES sensors(id),
    event_start INTEGER NOT NULL,
    belief_time INTEGER NOT NULL,
    source_id INTEGER NOT NULL REFERENCES data_sources(id),
    event_value REAL NOT NULL,
    UNIQUE (sensor_id, event_start, belief_time, source_id)
);
";

/// SQLite-backed registry and belief store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and ensure the schema.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let store = Self {
            db_path: db_path.as_ref().to_path_buf(),
        };
        let conn = store.connect()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open database at {}", self.db_path.display()))
    }
}

impl SensorRegistry for SqliteStore {
    fn ensure_zone(&self, country_code: &str) -> Result<TransmissionZone> {
        let name = zone_asset_name(country_code);
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let existing = tx
            .query_row(
                "SELECT id, name, country_code FROM assets WHERE name = ?1",
                params![name],
                |row| {
                    Ok(TransmissionZone {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        country_code: row.get(2)?,
                    })
                },
            )
            .optional()?;

        let zone = match existing {
            Some(zone) => zone,
            None => {
                info!("Adding {name} ...");
                tx.execute(
                    "INSERT OR IGNORE INTO assets (name, country_code) VALUES (?1, ?2)",
                    params![name, country_code],
                )?;
                tx.query_row(
                    "SELECT id, name, country_code FROM assets WHERE name = ?1",
                    params![name],
                    |row| {
                        Ok(TransmissionZone {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            country_code: row.get(2)?,
                        })
                    },
                )?
            }
        };
        tx.commit()?;
        Ok(zone)
    }

    fn ensure_sensor(
        &self,
        zone: &TransmissionZone,
        spec: &SensorSpec,
        timezone: &str,
    ) -> Result<Sensor> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let existing = tx
            .query_row(
                "SELECT id, resolution_minutes, timezone FROM sensors
                 WHERE asset_id = ?1 AND name = ?2 AND unit = ?3",
                params![zone.id, spec.name, spec.unit],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?)),
            )
            .optional()?;

        let sensor = match existing {
            Some((id, resolution_minutes, stored_timezone)) => {
                // Only the sourced_directly flag may change after creation.
                tx.execute(
                    "UPDATE sensors SET sourced_directly = ?1 WHERE id = ?2",
                    params![spec.sourced_directly, id],
                )?;
                Sensor {
                    id,
                    zone_id: zone.id,
                    name: spec.name.to_owned(),
                    unit: spec.unit.to_owned(),
                    resolution: Resolution::from_minutes(
                        u32::try_from(resolution_minutes).unwrap_or(spec.resolution.minutes()),
                    ),
                    timezone: stored_timezone,
                    sourced_directly: spec.sourced_directly,
                }
            }
            None => {
                info!("Adding sensor {} ...", spec.name);
                tx.execute(
                    "INSERT INTO sensors
                     (asset_id, name, unit, resolution_minutes, timezone, sourced_directly)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        zone.id,
                        spec.name,
                        spec.unit,
                        i64::from(spec.resolution.minutes()),
                        timezone,
                        spec.sourced_directly
                    ],
                )?;
                Sensor {
                    id: tx.last_insert_rowid(),
                    zone_id: zone.id,
                    name: spec.name.to_owned(),
                    unit: spec.unit.to_owned(),
                    resolution: spec.resolution,
                    timezone: timezone.to_owned(),
                    sourced_directly: spec.sourced_directly,
                }
            }
        };
        tx.commit()?;
        Ok(sensor)
    }

    fn find_sensor(&self, zone: &TransmissionZone, name: &str) -> Result<Option<Sensor>> {
        let conn = self.connect()?;
        let sensor = conn
            .query_row(
                "SELECT id, name, unit, resolution_minutes, timezone, sourced_directly
                 FROM sensors WHERE asset_id = ?1 AND name = ?2",
                params![zone.id, name],
                |row| {
                    Ok(Sensor {
                        id: row.get(0)?,
                        zone_id: zone.id,
                        name: row.get(1)?,
                        unit: row.get(2)?,
                        resolution: Resolution::from_minutes(
                            u32::try_from(row.get::<_, i64>(3)?).unwrap_or(60),
                        ),
                        timezone: row.get(4)?,
                        sourced_directly: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(sensor)
    }

    fn ensure_source(&self, name: &str, kind: &str) -> Result<SourceRecord> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO data_sources (name, type) VALUES (?1, ?2)",
            params![name, kind],
        )?;
        let source = tx.query_row(
            "SELECT id, name, type FROM data_sources WHERE name = ?1 AND type = ?2",
            params![name, kind],
            |row| {
                Ok(SourceRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    kind: row.get(2)?,
                })
            },
        )?;
        tx.commit()?;
        Ok(source)
    }
}

impl BeliefStore for SqliteStore {
    fn save(&self, collection: &BeliefsCollection) -> Result<SaveOutcome> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let mut created = 0usize;
        let mut skipped = 0usize;

        {
            let mut unchanged_stmt = tx.prepare(
                "SELECT EXISTS (
                     SELECT 1 FROM beliefs
                     WHERE sensor_id = ?1 AND event_start = ?2 AND source_id = ?3
                       AND event_value = ?4
                 )",
            )?;
            let mut insert_stmt = tx.prepare(
                "INSERT OR IGNORE INTO beliefs
                 (sensor_id, event_start, belief_time, source_id, event_value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for belief in &collection.beliefs {
                if !belief.event_value.is_finite() {
                    debug!(
                        "Skipping non-finite value for sensor {} at {}",
                        collection.sensor_id, belief.event_start
                    );
                    skipped += 1;
                    continue;
                }

                let unchanged: bool = unchanged_stmt.query_row(
                    params![
                        collection.sensor_id,
                        belief.event_start.timestamp(),
                        collection.source_id,
                        belief.event_value
                    ],
                    |row| row.get(0),
                )?;
                if unchanged {
                    skipped += 1;
                    continue;
                }

                let changed = insert_stmt.execute(params![
                    collection.sensor_id,
                    belief.event_start.timestamp(),
                    belief.belief_time.timestamp(),
                    collection.source_id,
                    belief.event_value
                ])?;
                if changed == 0 {
                    skipped += 1;
                } else {
                    created += 1;
                }
            }
        }
        tx.commit()?;

        Ok(match (created, skipped) {
            (0, _) => SaveOutcome::Unchanged,
            (_, 0) => SaveOutcome::Created(created),
            _ => SaveOutcome::PartiallyUnchanged { created, skipped },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gridion_types::{Belief, GENERATION_SENSORS};

    fn store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("gridion.db")).unwrap();
        (dir, store)
    }

    fn collection(sensor_id: i64, source_id: i64, values: &[f64]) -> BeliefsCollection {
        let event0 = Utc.with_ymd_and_hms(2025, 6, 14, 22, 0, 0).unwrap();
        let belief_time = Utc.with_ymd_and_hms(2025, 6, 14, 16, 0, 0).unwrap();
        BeliefsCollection {
            sensor_id,
            source_id,
            beliefs: values
                .iter()
                .enumerate()
                .map(|(i, &value)| Belief {
                    event_start: event0 + chrono::Duration::hours(i64::try_from(i).unwrap()),
                    belief_time,
                    event_value: value,
                })
                .collect(),
        }
    }

    #[test]
    fn test_ensure_zone_is_idempotent() {
        let (_dir, store) = store();
        let first = store.ensure_zone("NL").unwrap();
        let second = store.ensure_zone("NL").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name, "NL transmission zone");
    }

    #[test]
    fn test_ensure_sensor_creates_then_reuses() {
        let (_dir, store) = store();
        let zone = store.ensure_zone("NL").unwrap();
        let spec = &GENERATION_SENSORS[0];

        let first = store.ensure_sensor(&zone, spec, "Europe/Amsterdam").unwrap();
        let second = store.ensure_sensor(&zone, spec, "Europe/Amsterdam").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.resolution, spec.resolution);
        assert_eq!(second.timezone, "Europe/Amsterdam");
    }

    #[test]
    fn test_ensure_sensor_refreshes_sourced_directly_flag() {
        let (_dir, store) = store();
        let zone = store.ensure_zone("NL").unwrap();
        let spec = GENERATION_SENSORS[0];

        store.ensure_sensor(&zone, &spec, "Europe/Amsterdam").unwrap();
        let mut flipped = spec;
        flipped.sourced_directly = false;
        let sensor = store
            .ensure_sensor(&zone, &flipped, "Europe/Amsterdam")
            .unwrap();
        assert!(!sensor.sourced_directly);

        let found = store.find_sensor(&zone, spec.name).unwrap().unwrap();
        assert!(!found.sourced_directly);
    }

    #[test]
    fn test_find_sensor_missing_is_none() {
        let (_dir, store) = store();
        let zone = store.ensure_zone("NL").unwrap();
        assert!(store.find_sensor(&zone, "Imbalance prices").unwrap().is_none());
    }

    #[test]
    fn test_ensure_source_is_idempotent() {
        let (_dir, store) = store();
        let first = store.ensure_source("ENTSO-E", "forecasting script").unwrap();
        let second = store.ensure_source("ENTSO-E", "forecasting script").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_then_resave_is_unchanged() {
        let (_dir, store) = store();
        let zone = store.ensure_zone("NL").unwrap();
        let sensor = store
            .ensure_sensor(&zone, &GENERATION_SENSORS[0], "Europe/Amsterdam")
            .unwrap();
        let source = store.ensure_source("ENTSO-E", "forecasting script").unwrap();

        let batch = collection(sensor.id, source.id, &[1.0, 2.0, 3.0]);
        assert_eq!(store.save(&batch).unwrap(), SaveOutcome::Created(3));
        assert_eq!(store.save(&batch).unwrap(), SaveOutcome::Unchanged);
    }

    #[test]
    fn test_save_mixed_batch_is_partially_unchanged() {
        let (_dir, store) = store();
        let zone = store.ensure_zone("NL").unwrap();
        let sensor = store
            .ensure_sensor(&zone, &GENERATION_SENSORS[0], "Europe/Amsterdam")
            .unwrap();
        let source = store.ensure_source("ENTSO-E", "forecasting script").unwrap();

        store
            .save(&collection(sensor.id, source.id, &[1.0, 2.0]))
            .unwrap();
        let outcome = store
            .save(&collection(sensor.id, source.id, &[1.0, 2.0, 3.0]))
            .unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::PartiallyUnchanged {
                created: 1,
                skipped: 2
            }
        );
    }

    #[test]
    fn test_save_skips_non_finite_values() {
        let (_dir, store) = store();
        let zone = store.ensure_zone("NL").unwrap();
        let sensor = store
            .ensure_sensor(&zone, &GENERATION_SENSORS[4], "Europe/Amsterdam")
            .unwrap();
        let source = store
            .ensure_source("ENTSO-E Derived", "forecasting script")
            .unwrap();

        let outcome = store
            .save(&collection(sensor.id, source.id, &[1.0, f64::NAN]))
            .unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::PartiallyUnchanged {
                created: 1,
                skipped: 1
            }
        );
    }

    #[test]
    fn test_changed_value_at_later_belief_time_is_kept() {
        let (_dir, store) = store();
        let zone = store.ensure_zone("NL").unwrap();
        let sensor = store
            .ensure_sensor(&zone, &GENERATION_SENSORS[0], "Europe/Amsterdam")
            .unwrap();
        let source = store.ensure_source("ENTSO-E", "forecasting script").unwrap();

        store
            .save(&collection(sensor.id, source.id, &[1.0]))
            .unwrap();

        // A revised forecast for the same event arrives later.
        let mut revised = collection(sensor.id, source.id, &[4.0]);
        revised.beliefs[0].belief_time += chrono::Duration::hours(2);
        assert_eq!(store.save(&revised).unwrap(), SaveOutcome::Created(1));
    }
}
