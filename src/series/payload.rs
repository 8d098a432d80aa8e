//! Meter data payloads as returned by the metering API.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

use crate::error::{Error, Result};

/// One hourly meter reading.
///
/// `timestamp` is the end of the metered interval in the feed's local time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSample {
    #[serde(rename = "x")]
    pub timestamp: String,
    #[serde(rename = "y")]
    pub value: f64,
}

impl RawSample {
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }

    /// Parses the wall-clock time of the sample.
    ///
    /// An explicit UTC offset is accepted but not applied: the feed bakes its
    /// local offset into the value and the output is local time as well.
    pub fn local_time(&self) -> Result<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Ok(dt.naive_local());
        }
        self.timestamp
            .parse::<NaiveDateTime>()
            .or_else(|_| NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M"))
            .map_err(|_| Error::Timestamp(self.timestamp.clone()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Series {
    pub data: Vec<RawSample>,
}

/// A fetched payload: either a bare list of series or an object wrapping one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MeterPayload {
    List(Vec<Series>),
    Wrapped { timeseries: Vec<Series> },
}

impl MeterPayload {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_slice(&std::fs::read(path)?)
    }

    pub fn all_series(&self) -> &[Series] {
        match self {
            MeterPayload::List(series) | MeterPayload::Wrapped { timeseries: series } => series,
        }
    }

    /// Samples of the series at `index`; `what` names it in the error.
    pub fn samples(&self, index: usize, what: &str) -> Result<&[RawSample]> {
        self.all_series()
            .get(index)
            .map(|s| s.data.as_slice())
            .ok_or_else(|| Error::MissingSeries {
                index,
                what: what.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 20)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_local_time_naive() {
        assert_eq!(
            RawSample::new("2024-06-20T01:00:00", 0.0).local_time().unwrap(),
            at(1, 0)
        );
        assert_eq!(
            RawSample::new("2024-06-20T01:00:00.000", 0.0)
                .local_time()
                .unwrap(),
            at(1, 0)
        );
        assert_eq!(
            RawSample::new("2024-06-20T01:30", 0.0).local_time().unwrap(),
            at(1, 30)
        );
    }

    #[test]
    fn test_local_time_keeps_offset_wall_clock() {
        let sample = RawSample::new("2024-06-20T01:00:00+01:00", 0.0);
        assert_eq!(sample.local_time().unwrap(), at(1, 0));
    }

    #[test]
    fn test_local_time_invalid() {
        let sample = RawSample::new("yesterday", 0.0);
        assert!(matches!(sample.local_time(), Err(Error::Timestamp(_))));
    }

    #[test]
    fn test_payload_list_shape() {
        let payload = MeterPayload::from_slice(
            br#"[{"name": "prod", "data": [{"x": "2024-06-20T01:00:00", "y": 1.5}]},
                 {"data": []}]"#,
        )
        .unwrap();

        assert_eq!(payload.all_series().len(), 2);
        let samples = payload.samples(0, "production").unwrap();
        assert_eq!(samples, &[RawSample::new("2024-06-20T01:00:00", 1.5)]);
        assert!(payload.samples(1, "consumption").unwrap().is_empty());
    }

    #[test]
    fn test_payload_wrapped_shape() {
        let payload = MeterPayload::from_slice(
            br#"{"timeseries": [{"data": [{"x": "2024-06-20T01:00:00", "y": 2}]}]}"#,
        )
        .unwrap();

        assert_eq!(payload.samples(0, "water").unwrap()[0].value, 2.0);
    }

    #[test]
    fn test_payload_missing_series() {
        let payload = MeterPayload::from_slice(b"[]").unwrap();
        let err = payload.samples(1, "consumption").unwrap_err();
        assert!(matches!(err, Error::MissingSeries { index: 1, .. }));
    }
}
