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

//! Error types for the import pipeline.
//!
//! Every variant aborts the whole invocation; there is no partial-success
//! persistence path. Save outcomes (created/unchanged) are not errors and
//! live in [`crate::traits::SaveOutcome`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// Bad or missing configuration (credentials, country code). Raised
    /// before any network call.
    #[error("configuration error: {0}")]
    Config(String),

    /// The platform returned no data. Expected while tomorrow's
    /// forecasts are not published yet; the next scheduled run retries.
    #[error("empty result for {0}: the platform probably does not provide these forecasts yet")]
    EmptyResult(String),

    /// A series reached the packager with no values in it.
    #[error("no values to package for sensor {0}")]
    EmptySeries(String),

    /// Series spacing has no uniform resolution to derive an event
    /// resolution from. Usually means the upstream format changed.
    #[error("cannot infer a uniform resolution: {0}")]
    Resolution(String),

    /// A configured sensor has no computed series feeding it.
    #[error("no series mapped to sensor {0}")]
    Mapping(String),

    #[error("forecast provider error: {0}")]
    Provider(#[source] anyhow::Error),

    #[error("storage error: {0}")]
    Store(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ImportError>;
