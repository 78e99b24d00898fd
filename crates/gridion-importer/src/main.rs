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

mod cli;
mod config;

use anyhow::Result;
use chrono::Utc;
use chrono_tz::Tz;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gridion_core::{
    ImportContext, ImportError, ImportPipeline, ImportReport, PriceImportOptions, QueryWindow,
    query_window,
};
use gridion_entsoe::EntsoeClient;
use gridion_store::SqliteStore;

use cli::{Cli, Command, ImportOpts};
use config::AppConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = config::load_config_with_fallback(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    match cli.command {
        Command::ImportDayAheadGeneration(opts) => {
            let report = run_generation_import(&config, &opts)?;
            log_report(&report, opts.dry_run);
        }
        Command::ImportDayAheadPrices {
            opts,
            sensor,
            source,
        } => {
            let options = PriceImportOptions {
                sensor_name: sensor,
                source_name: source,
            };
            let report = run_price_import(&config, &opts, &options)?;
            log_report(&report, opts.dry_run);
        }
    }
    Ok(())
}

fn run_generation_import(config: &AppConfig, opts: &ImportOpts) -> Result<ImportReport> {
    let (ctx, window) = resolve_run(config, opts)?;
    let token = config.resolve_auth_token()?;
    let client = EntsoeClient::new(config.endpoint(), token);
    let store = SqliteStore::open(&config.database_path)?;

    let pipeline = ImportPipeline {
        provider: &client,
        registry: &store,
        store: &store,
    };
    Ok(pipeline.import_day_ahead_generation(&ctx, &window, opts.dry_run)?)
}

fn run_price_import(
    config: &AppConfig,
    opts: &ImportOpts,
    options: &PriceImportOptions,
) -> Result<ImportReport> {
    let (ctx, window) = resolve_run(config, opts)?;
    let token = config.resolve_auth_token()?;
    let client = EntsoeClient::new(config.endpoint(), token);
    let store = SqliteStore::open(&config.database_path)?;

    let pipeline = ImportPipeline {
        provider: &client,
        registry: &store,
        store: &store,
    };
    Ok(pipeline.import_day_ahead_prices(&ctx, &window, opts.dry_run, options)?)
}

/// Resolve CLI overrides against the config into a run context and its
/// query window.
fn resolve_run(config: &AppConfig, opts: &ImportOpts) -> Result<(ImportContext, QueryWindow)> {
    let country_code = opts
        .country
        .clone()
        .unwrap_or_else(|| config.country_code.clone());
    let timezone_name = opts
        .timezone
        .clone()
        .unwrap_or_else(|| config.country_timezone.clone());
    let timezone: Tz = timezone_name
        .parse()
        .map_err(|_| ImportError::Config(format!("unknown timezone {timezone_name}")))?;

    let now = Utc::now();
    let ctx = ImportContext::new(
        country_code,
        timezone,
        config.derived_data_source_name.clone(),
        now,
    );
    let window = query_window(opts.from_date, opts.to_date, timezone, now);
    Ok((ctx, window))
}

fn log_report(report: &ImportReport, dry_run: bool) {
    for entry in &report.entries {
        match &entry.outcome {
            Some(outcome) => info!("{}: {}", entry.sensor_name, outcome),
            None => info!(
                "{}: {} beliefs computed, not saved",
                entry.sensor_name, entry.beliefs
            ),
        }
    }
    if dry_run {
        info!(
            "Dry run finished: {} beliefs across {} sensors, nothing saved",
            report.total_beliefs(),
            report.entries.len()
        );
    } else {
        info!(
            "Import finished: {} beliefs across {} sensors",
            report.total_beliefs(),
            report.entries.len()
        );
    }
}
