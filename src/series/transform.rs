use chrono::{NaiveDateTime, TimeDelta};

use crate::error::{Error, Result};
use crate::series::RawSample;
use crate::tariff::{TariffMode, Valuation};

/// A kept sample: interval start and the running sum including it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformed {
    pub start: NaiveDateTime,
    pub sum: f64,
}

/// Applies `mode` to one sample.
///
/// Returns `None` when the sample falls outside the mode's tariff window, in
/// which case the running sum does not move.
pub fn transform(
    sample: &RawSample,
    mode: TariffMode,
    running_sum: f64,
) -> Result<Option<Transformed>> {
    let start = interval_start(sample)?;

    if mode.window().is_some_and(|window| !window.contains(start)) {
        return Ok(None);
    }

    let value = match mode.valuation() {
        Valuation::Quantity => sample.value,
        Valuation::Cost(Some(unit_price)) => sample.value * unit_price,
        Valuation::Cost(None) => {
            return Err(Error::Configuration(format!(
                "cost mode {mode:?} has no unit price"
            )));
        }
    };

    Ok(Some(Transformed {
        start,
        sum: running_sum + value,
    }))
}

// The feed stamps each reading with the end of its hour.
fn interval_start(sample: &RawSample) -> Result<NaiveDateTime> {
    let end = sample.local_time()?;
    end.checked_sub_signed(TimeDelta::hours(1))
        .ok_or_else(|| Error::InvariantViolation(format!("{end} has no preceding hour")))
}
