//! Tariff windows and the modes used to bucket samples into them.
//!
//! The provider bills electricity on a two-rate schedule. [`is_high_tariff`]
//! answers which window a local wall-clock instant falls into, and
//! [`TariffMode`] tells the sample transformer whether to filter by window
//! and whether to convert quantities into cost.

mod schedule;

pub use schedule::{PriceKey, PriceScale, TariffPeriod, TariffSchedule, UnitPrice};

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

/// Returns `true` when `at` (local wall clock) falls in the high-tariff window.
///
/// Monday through Friday the high tariff runs from 06:00 to 22:00. On
/// weekends it only applies from 10:00 to 13:00 and from 17:00 to 22:00.
/// Lower bounds are inclusive, upper bounds exclusive.
pub fn is_high_tariff(at: NaiveDateTime) -> bool {
    let hour = at.hour();
    match at.weekday() {
        Weekday::Sat | Weekday::Sun => (10..13).contains(&hour) || (17..22).contains(&hour),
        Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu | Weekday::Fri => {
            (6..22).contains(&hour)
        }
    }
}

/// Which tariff window a mode keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    High,
    Low,
}

impl Window {
    pub fn contains(self, at: NaiveDateTime) -> bool {
        match self {
            Window::High => is_high_tariff(at),
            Window::Low => !is_high_tariff(at),
        }
    }
}

/// How a raw sample is bucketed and valued.
///
/// Cost modes carry the unit price they multiply by. The price is optional so
/// that a metric wired to a missing schedule entry fails loudly on the first
/// kept sample instead of silently writing quantities as cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TariffMode {
    /// Quantity as measured, every sample kept.
    NoTariff,
    /// Quantity times a single rate, every sample kept.
    FlatCost { unit_price: Option<f64> },
    /// Quantity, high-tariff samples only.
    DataHigh,
    /// Quantity, low-tariff samples only.
    DataLow,
    /// Cost of high-tariff samples only.
    CostHigh { unit_price: Option<f64> },
    /// Cost of low-tariff samples only.
    CostLow { unit_price: Option<f64> },
}

/// What the transformer should do with a sample's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Valuation {
    Quantity,
    Cost(Option<f64>),
}

impl TariffMode {
    /// The window this mode restricts to, `None` when every sample is kept.
    pub fn window(self) -> Option<Window> {
        match self {
            TariffMode::NoTariff | TariffMode::FlatCost { .. } => None,
            TariffMode::DataHigh | TariffMode::CostHigh { .. } => Some(Window::High),
            TariffMode::DataLow | TariffMode::CostLow { .. } => Some(Window::Low),
        }
    }

    /// Sets the unit price of a cost mode; quantity modes are returned as is.
    pub fn with_unit_price(self, price: Option<f64>) -> Self {
        match self {
            TariffMode::NoTariff | TariffMode::DataHigh | TariffMode::DataLow => self,
            TariffMode::FlatCost { .. } => TariffMode::FlatCost { unit_price: price },
            TariffMode::CostHigh { .. } => TariffMode::CostHigh { unit_price: price },
            TariffMode::CostLow { .. } => TariffMode::CostLow { unit_price: price },
        }
    }

    pub fn valuation(self) -> Valuation {
        match self {
            TariffMode::NoTariff | TariffMode::DataHigh | TariffMode::DataLow => {
                Valuation::Quantity
            }
            TariffMode::FlatCost { unit_price }
            | TariffMode::CostHigh { unit_price }
            | TariffMode::CostLow { unit_price } => Valuation::Cost(unit_price),
        }
    }
}
