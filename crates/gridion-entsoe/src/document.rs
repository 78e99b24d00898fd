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

//! Parsing ENTSO-E market documents.
//!
//! Generation documents (GL_MarketDocument) and price documents
//! (Publication_MarketDocument) share the same skeleton: TimeSeries
//! holding Periods with a start, a resolution and positioned Points.
//! Acknowledgement documents signal "no matching data".

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use gridion_types::{TimePoint, TimeSeries};
use quick_xml::Reader;
use quick_xml::events::Event;

/// One TimeSeries element, expanded to absolute timestamps.
#[derive(Debug, Clone)]
pub struct DocumentSeries {
    /// Production type (B16 solar, B18 wind offshore, B19 wind onshore);
    /// absent on scheduled-generation and price series.
    pub psr_type: Option<String>,

    pub series: TimeSeries,
}

/// A parsed market document.
#[derive(Debug, Clone)]
pub enum MarketDocument {
    Series(Vec<DocumentSeries>),

    /// The platform has no data for the query. Expected while tomorrow's
    /// figures are not published yet.
    Acknowledgement { reason: String },
}

/// Parse a market document from its XML text.
pub fn parse_market_document(xml: &str) -> Result<MarketDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut is_acknowledgement = false;
    let mut ack_reason = String::new();

    let mut series_list: Vec<DocumentSeries> = Vec::new();
    let mut current_psr: Option<String> = None;
    let mut current_points: Vec<TimePoint> = Vec::new();

    let mut in_period = false;
    let mut period_start: Option<DateTime<Utc>> = None;
    let mut period_resolution: Option<Duration> = None;
    let mut point_position: Option<i32> = None;
    let mut point_value: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if stack.is_empty() && name == "Acknowledgement_MarketDocument" {
                    is_acknowledgement = true;
                }
                match name.as_str() {
                    "TimeSeries" => {
                        current_psr = None;
                        current_points = Vec::new();
                    }
                    "Period" => {
                        in_period = true;
                        period_start = None;
                        period_resolution = None;
                    }
                    "Point" => {
                        point_position = None;
                        point_value = None;
                    }
                    _ => {}
                }
                stack.push(name);
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                stack.pop();
                match name.as_str() {
                    "TimeSeries" => {
                        series_list.push(DocumentSeries {
                            psr_type: current_psr.take(),
                            series: TimeSeries::from_points(std::mem::take(&mut current_points)),
                        });
                    }
                    "Period" => {
                        in_period = false;
                    }
                    "Point" => {
                        let start = period_start
                            .context("Point outside a Period with a start time")?;
                        let resolution = period_resolution
                            .context("Point outside a Period with a resolution")?;
                        let position =
                            point_position.context("Point without a position")?;
                        let value = point_value.context("Point without a value")?;
                        current_points.push(TimePoint {
                            start: start + resolution * (position - 1),
                            value,
                        });
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().context("Invalid XML text")?.into_owned();
                match stack.last().map(String::as_str) {
                    Some("start") if in_period => {
                        period_start = Some(parse_interval_start(&text)?);
                    }
                    Some("resolution") if in_period => {
                        period_resolution = Some(parse_resolution(&text)?);
                    }
                    Some("position") => {
                        point_position =
                            Some(text.parse().context("Invalid point position")?);
                    }
                    Some("quantity") | Some("price.amount") => {
                        point_value = Some(text.parse().context("Invalid point value")?);
                    }
                    Some("psrType") => {
                        current_psr = Some(text);
                    }
                    Some("text") if is_acknowledgement => {
                        ack_reason = text;
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => bail!("Failed to parse market document: {err}"),
            Ok(_) => {}
        }
    }

    if is_acknowledgement {
        return Ok(MarketDocument::Acknowledgement { reason: ack_reason });
    }
    Ok(MarketDocument::Series(series_list))
}

/// Interval starts come as `2025-06-14T22:00Z` (no seconds); tolerate
/// full RFC 3339 too.
fn parse_interval_start(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%MZ") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid interval start: {text}"))
}

/// ISO 8601 durations as the platform uses them: PT15M, PT30M, PT60M,
/// PT1H, P1D.
fn parse_resolution(text: &str) -> Result<Duration> {
    let minutes = match text {
        "P1D" => 1440,
        "PT1H" => 60,
        _ => {
            let Some(number) = text
                .strip_prefix("PT")
                .and_then(|rest| rest.strip_suffix('M'))
            else {
                bail!("Unsupported resolution: {text}");
            };
            number
                .parse::<i64>()
                .with_context(|| format!("Unsupported resolution: {text}"))?
        }
    };
    Ok(Duration::minutes(minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const WIND_SOLAR_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GL_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-6:generationloaddocument:3:0">
    <mRID>b9f1a1c2e5a84b1f</mRID>
    <type>A69</type>
    <period.timeInterval>
        <start>2025-06-14T22:00Z</start>
        <end>2025-06-15T22:00Z</end>
    </period.timeInterval>
    <TimeSeries>
        <mRID>1</mRID>
        <MktPSRType>
            <psrType>B16</psrType>
        </MktPSRType>
        <Period>
            <timeInterval>
                <start>2025-06-14T22:00Z</start>
                <end>2025-06-15T00:00Z</end>
            </timeInterval>
            <resolution>PT60M</resolution>
            <Point><position>1</position><quantity>120.5</quantity></Point>
            <Point><position>2</position><quantity>0</quantity></Point>
        </Period>
    </TimeSeries>
    <TimeSeries>
        <mRID>2</mRID>
        <MktPSRType>
            <psrType>B19</psrType>
        </MktPSRType>
        <Period>
            <timeInterval>
                <start>2025-06-14T22:00Z</start>
                <end>2025-06-15T00:00Z</end>
            </timeInterval>
            <resolution>PT60M</resolution>
            <Point><position>1</position><quantity>40</quantity></Point>
            <Point><position>2</position><quantity>55</quantity></Point>
        </Period>
    </TimeSeries>
</GL_MarketDocument>"#;

    const PRICES_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Publication_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-3:publicationdocument:7:0">
    <mRID>5a3c</mRID>
    <type>A44</type>
    <TimeSeries>
        <mRID>1</mRID>
        <currency_Unit.name>EUR</currency_Unit.name>
        <price_Measure_Unit.name>MWH</price_Measure_Unit.name>
        <Period>
            <timeInterval>
                <start>2025-06-14T22:00Z</start>
                <end>2025-06-15T01:00Z</end>
            </timeInterval>
            <resolution>PT60M</resolution>
            <Point><position>1</position><price.amount>50.17</price.amount></Point>
            <Point><position>2</position><price.amount>47.30</price.amount></Point>
            <Point><position>3</position><price.amount>-5.00</price.amount></Point>
        </Period>
    </TimeSeries>
</Publication_MarketDocument>"#;

    const ACK_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Acknowledgement_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-1:acknowledgementdocument:7:0">
    <mRID>ack-1</mRID>
    <Reason>
        <code>999</code>
        <text>No matching data found for Data item Generation Forecast - Day ahead [14.1.C]</text>
    </Reason>
</Acknowledgement_MarketDocument>"#;

    #[test]
    fn test_parse_wind_and_solar_document() {
        let MarketDocument::Series(series) = parse_market_document(WIND_SOLAR_DOC).unwrap()
        else {
            panic!("expected series");
        };
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].psr_type.as_deref(), Some("B16"));
        assert_eq!(series[1].psr_type.as_deref(), Some("B19"));
        assert_eq!(series[0].series.values(), vec![120.5, 0.0]);
        assert_eq!(
            series[0].series.first().unwrap().start,
            Utc.with_ymd_and_hms(2025, 6, 14, 22, 0, 0).unwrap()
        );
        assert_eq!(
            series[0].series.last().unwrap().start,
            Utc.with_ymd_and_hms(2025, 6, 14, 23, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_price_document() {
        let MarketDocument::Series(series) = parse_market_document(PRICES_DOC).unwrap() else {
            panic!("expected series");
        };
        assert_eq!(series.len(), 1);
        assert!(series[0].psr_type.is_none());
        assert_eq!(series[0].series.values(), vec![50.17, 47.30, -5.00]);
    }

    #[test]
    fn test_parse_acknowledgement_document() {
        let MarketDocument::Acknowledgement { reason } =
            parse_market_document(ACK_DOC).unwrap()
        else {
            panic!("expected acknowledgement");
        };
        assert!(reason.contains("No matching data"));
    }

    #[test]
    fn test_unsupported_resolution_is_an_error() {
        let doc = WIND_SOLAR_DOC.replace("PT60M", "PT7S");
        assert!(parse_market_document(&doc).is_err());
    }
}
