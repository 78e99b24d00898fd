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

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use gridion_core::ForecastProvider;
use gridion_types::{GenerationTable, TimePoint, TimeSeries};
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::areas::bidding_zone;
use crate::document::{DocumentSeries, MarketDocument, parse_market_document};

const PSR_SOLAR: &str = "B16";
const PSR_WIND_OFFSHORE: &str = "B18";
const PSR_WIND_ONSHORE: &str = "B19";

/// Which API server to talk to. An explicit constructor parameter, so
/// nothing global decides where requests go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Production,

    /// The platform's iop acceptance server, with its own tokens.
    TestServer,
}

impl Endpoint {
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Production => "https://web-api.tp.entsoe.eu/api",
            Self::TestServer => "https://iop-transparency.entsoe.eu/api",
        }
    }
}

/// Blocking client for the transparency platform.
#[derive(Debug)]
pub struct EntsoeClient {
    http: Client,
    base_url: String,
    auth_token: String,
}

impl EntsoeClient {
    pub fn new(endpoint: Endpoint, auth_token: impl Into<String>) -> Self {
        Self::with_base_url(endpoint.base_url(), auth_token)
    }

    /// Point the client at an arbitrary URL (tests use a local server).
    pub fn with_base_url(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            auth_token: auth_token.into(),
        }
    }

    /// Overall scheduled generation forecast (document A71).
    pub fn query_generation_forecast(
        &self,
        country_code: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<TimeSeries> {
        let domain = domain_for(country_code)?;
        let document = self.request(&[
            ("documentType", "A71"),
            ("processType", "A01"),
            ("in_Domain", domain),
            ("periodStart", &period_param(from)),
            ("periodEnd", &period_param(until)),
        ])?;
        match document {
            MarketDocument::Acknowledgement { .. } => Ok(TimeSeries::new()),
            MarketDocument::Series(series) => Ok(flatten(series, from, until)),
        }
    }

    /// Solar and wind generation forecasts (document A69), one series
    /// per production type.
    pub fn query_wind_and_solar_forecast(
        &self,
        country_code: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<GenerationTable> {
        let domain = domain_for(country_code)?;
        let document = self.request(&[
            ("documentType", "A69"),
            ("processType", "A01"),
            ("in_Domain", domain),
            ("periodStart", &period_param(from)),
            ("periodEnd", &period_param(until)),
        ])?;
        let series = match document {
            MarketDocument::Acknowledgement { .. } => return Ok(GenerationTable::default()),
            MarketDocument::Series(series) => series,
        };

        // Documents chunk multi-day answers into one TimeSeries per day
        // per production type; accumulate before building the columns.
        let mut solar = Vec::new();
        let mut wind_onshore = Vec::new();
        let mut wind_offshore = Vec::new();
        for entry in &series {
            let column = match entry.psr_type.as_deref() {
                Some(PSR_SOLAR) => &mut solar,
                Some(PSR_WIND_ONSHORE) => &mut wind_onshore,
                Some(PSR_WIND_OFFSHORE) => &mut wind_offshore,
                other => {
                    debug!("Skipping series with production type {other:?}");
                    continue;
                }
            };
            column.extend(entry.series.points().iter().copied());
        }
        Ok(GenerationTable {
            solar: clip(solar, from, until),
            wind_onshore: clip(wind_onshore, from, until),
            wind_offshore: clip(wind_offshore, from, until),
        })
    }

    /// Day-ahead market prices (document A44).
    pub fn query_day_ahead_prices(
        &self,
        country_code: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<TimeSeries> {
        let domain = domain_for(country_code)?;
        let document = self.request(&[
            ("documentType", "A44"),
            ("in_Domain", domain),
            ("out_Domain", domain),
            ("periodStart", &period_param(from)),
            ("periodEnd", &period_param(until)),
        ])?;
        match document {
            MarketDocument::Acknowledgement { .. } => Ok(TimeSeries::new()),
            MarketDocument::Series(series) => Ok(flatten(series, from, until)),
        }
    }

    fn request(&self, params: &[(&str, &str)]) -> Result<MarketDocument> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("securityToken", self.auth_token.as_str())])
            .query(params)
            .send()
            .context("Failed to send request to the transparency platform")?;

        let status = response.status();
        let body = response.text().context("Failed to read response body")?;

        if !status.is_success() {
            // "No matching data" comes back as HTTP 400 carrying an
            // acknowledgement document.
            if let Ok(MarketDocument::Acknowledgement { reason }) = parse_market_document(&body) {
                info!("Platform acknowledged without data: {reason}");
                return Ok(MarketDocument::Acknowledgement { reason });
            }
            bail!("Transparency platform request failed: HTTP {status}");
        }

        parse_market_document(&body)
    }
}

impl ForecastProvider for EntsoeClient {
    fn fetch_scheduled_generation(
        &self,
        country_code: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<TimeSeries> {
        self.query_generation_forecast(country_code, from, until)
    }

    fn fetch_renewable_generation(
        &self,
        country_code: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<GenerationTable> {
        self.query_wind_and_solar_forecast(country_code, from, until)
    }

    fn fetch_day_ahead_prices(
        &self,
        country_code: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<TimeSeries> {
        self.query_day_ahead_prices(country_code, from, until)
    }
}

fn domain_for(country_code: &str) -> Result<&'static str> {
    bidding_zone(country_code)
        .ok_or_else(|| anyhow!("No bidding zone known for country code {country_code}"))
}

/// Period parameters use compact UTC timestamps.
fn period_param(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%d%H%M").to_string()
}

/// Merge document series into one, clipped to the requested window.
fn flatten(series: Vec<DocumentSeries>, from: DateTime<Utc>, until: DateTime<Utc>) -> TimeSeries {
    let points = series
        .into_iter()
        .flat_map(|entry| entry.series.points().to_vec())
        .collect();
    clip(points, from, until)
}

/// Sort points and drop everything outside `[from, until)`.
fn clip(points: Vec<TimePoint>, from: DateTime<Utc>, until: DateTime<Utc>) -> TimeSeries {
    TimeSeries::from_points(
        points
            .into_iter()
            .filter(|p| p.start >= from && p.start < until)
            .collect(),
    )
}
