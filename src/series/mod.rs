//! Conversion of raw meter samples into cumulative statistics rows.
//!
//! [`transform`] handles a single sample; [`extract`] drives it over a whole
//! series and yields [`OutputRow`]s lazily, carrying the running sum forward.

mod extract;
mod payload;
mod transform;

pub use extract::{SeriesRows, extract};
pub use payload::{MeterPayload, RawSample, Series};
pub use transform::{Transformed, transform};

use chrono::NaiveDateTime;

/// One line of a statistics file.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow<'a> {
    pub statistic_id: &'a str,
    pub unit: &'a str,
    /// Start of the metered hour, local time.
    pub start: NaiveDateTime,
    /// Cumulative value up to the end of that hour.
    pub sum: f64,
}

impl OutputRow<'_> {
    pub const HEADER: [&'static str; 4] = ["statistic_id", "unit", "start", "sum"];

    /// Fields in [`Self::HEADER`] order, formatted for the statistics importer.
    pub fn to_record(&self) -> [String; 4] {
        [
            self.statistic_id.to_string(),
            self.unit.to_string(),
            self.start.format("%d.%m.%Y %H:%M").to_string(),
            format!("{:.3}", self.sum),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(sum: f64) -> OutputRow<'static> {
        OutputRow {
            statistic_id: "sensor:test",
            unit: "kWh",
            start: NaiveDate::from_ymd_opt(2024, 6, 20)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
            sum,
        }
    }

    #[test]
    fn test_record_format() {
        assert_eq!(
            row(1.23456).to_record(),
            ["sensor:test", "kWh", "20.06.2024 09:05", "1.235"]
        );
    }

    #[test]
    fn test_sum_rounding() {
        assert_eq!(row(1.2344).to_record()[3], "1.234");
        assert_eq!(row(0.0).to_record()[3], "0.000");
        assert_eq!(row(2.0).to_record()[3], "2.000");
        assert_eq!(row(-1.23456).to_record()[3], "-1.235");
        assert_eq!(row(-0.5).to_record()[3], "-0.500");
        assert_eq!(row(1234.5678).to_record()[3], "1234.568");
    }
}
