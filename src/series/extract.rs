use std::slice;

use crate::error::Result;
use crate::series::{OutputRow, RawSample, transform};
use crate::tariff::TariffMode;

/// Lazily turns one metric's raw samples into cumulative output rows.
///
/// Single pass: once drained, [`SeriesRows::running_sum`] is the metric's
/// final sum. The first error ends the sequence.
#[derive(Debug)]
pub struct SeriesRows<'a> {
    samples: slice::Iter<'a, RawSample>,
    statistic_id: &'a str,
    unit: &'a str,
    mode: TariffMode,
    running_sum: f64,
    failed: bool,
}

/// Starts extraction of `samples` from `seed_sum`.
pub fn extract<'a>(
    samples: &'a [RawSample],
    statistic_id: &'a str,
    unit: &'a str,
    mode: TariffMode,
    seed_sum: f64,
) -> SeriesRows<'a> {
    SeriesRows {
        samples: samples.iter(),
        statistic_id,
        unit,
        mode,
        running_sum: seed_sum,
        failed: false,
    }
}

impl SeriesRows<'_> {
    /// Sum of the seed and every row produced so far.
    pub fn running_sum(&self) -> f64 {
        self.running_sum
    }

    /// Drains the remaining rows and returns the final sum.
    pub fn into_final_sum(mut self) -> Result<f64> {
        for row in self.by_ref() {
            row?;
        }
        Ok(self.running_sum)
    }
}

impl<'a> Iterator for SeriesRows<'a> {
    type Item = Result<OutputRow<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        for sample in self.samples.by_ref() {
            match transform(sample, self.mode, self.running_sum) {
                Ok(Some(kept)) => {
                    self.running_sum = kept.sum;
                    return Some(Ok(OutputRow {
                        statistic_id: self.statistic_id,
                        unit: self.unit,
                        start: kept.start,
                        sum: kept.sum,
                    }));
                }
                Ok(None) => {}
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
