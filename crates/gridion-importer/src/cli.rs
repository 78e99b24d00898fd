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

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gridion")]
#[command(about = "Import day-ahead grid data from the ENTSO-E transparency platform", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (default: gridion.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database (overrides the config file)
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import forecasted generation: scheduled generation, solar,
    /// offshore and onshore wind, and the estimated CO₂ intensity.
    ImportDayAheadGeneration(ImportOpts),

    /// Import forecasted day-ahead prices.
    ImportDayAheadPrices {
        #[command(flatten)]
        opts: ImportOpts,

        /// Sensor to store the data into. If not provided, the sensor
        /// `Day-ahead prices` is used.
        #[arg(long)]
        sensor: Option<String>,

        /// Source name to attribute the data to. If not provided, the
        /// source `ENTSO-E` is used.
        #[arg(long)]
        source: Option<String>,
    },
}

#[derive(Args)]
pub struct ImportOpts {
    /// Query data from this date onwards (YYYY-MM-DD). If not specified,
    /// defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub from_date: Option<NaiveDate>,

    /// Query data until this date, inclusive (YYYY-MM-DD). If not
    /// specified, defaults to tomorrow.
    #[arg(long, value_parser = parse_date)]
    pub to_date: Option<NaiveDate>,

    /// In dry run mode, run every stage but do not save to the database.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Country code (such as BE, DE, FR or NL).
    #[arg(long)]
    pub country: Option<String>,

    /// Timezone for the country (such as 'Europe/Amsterdam').
    #[arg(long)]
    pub timezone: Option<String>,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("invalid date {value:?} (expected YYYY-MM-DD): {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generation_command() {
        let cli = Cli::parse_from([
            "gridion",
            "import-day-ahead-generation",
            "--from-date",
            "2025-06-14",
            "--dry-run",
            "--country",
            "BE",
        ]);
        let Command::ImportDayAheadGeneration(opts) = cli.command else {
            panic!("expected generation command");
        };
        assert_eq!(
            opts.from_date,
            Some(NaiveDate::from_ymd_opt(2025, 6, 14).unwrap())
        );
        assert!(opts.to_date.is_none());
        assert!(opts.dry_run);
        assert_eq!(opts.country.as_deref(), Some("BE"));
    }

    #[test]
    fn test_parse_prices_command_with_overrides() {
        let cli = Cli::parse_from([
            "gridion",
            "import-day-ahead-prices",
            "--sensor",
            "Imbalance prices",
            "--source",
            "My broker",
        ]);
        let Command::ImportDayAheadPrices { sensor, source, .. } = cli.command else {
            panic!("expected prices command");
        };
        assert_eq!(sensor.as_deref(), Some("Imbalance prices"));
        assert_eq!(source.as_deref(), Some("My broker"));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let result = Cli::try_parse_from([
            "gridion",
            "import-day-ahead-generation",
            "--from-date",
            "14-06-2025",
        ]);
        assert!(result.is_err());
    }
}
