use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifies one entry of a tariff period's price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceKey {
    EnergyProductionHigh,
    EnergyProductionLow,
    EnergyConsumptionHigh,
    EnergyConsumptionLow,
    WaterConsumption,
}

/// Currency unit the price components are quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceScale {
    #[default]
    Francs,
    /// Rappen, 1/100 of a franc.
    Centimes,
}

impl PriceScale {
    fn divisor(self) -> f64 {
        match self {
            PriceScale::Francs => 1.0,
            PriceScale::Centimes => 100.0,
        }
    }
}

/// An itemized price: net components summed, then VAT applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPrice {
    pub components: Vec<f64>,
    pub vat_rate: f64,
    #[serde(default)]
    pub scale: PriceScale,
}

impl UnitPrice {
    /// Price of one unit in francs, VAT included.
    pub fn per_unit(&self) -> f64 {
        let net: f64 = self.components.iter().sum();
        net * (1.0 + self.vat_rate) / self.scale.divisor()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffPeriod {
    pub valid_from: NaiveDate,
    pub prices: BTreeMap<PriceKey, UnitPrice>,
}

impl TariffPeriod {
    pub fn unit_price(&self, key: PriceKey) -> Option<f64> {
        self.prices.get(&key).map(UnitPrice::per_unit)
    }
}

/// Tariff periods, each valid from its start date until the next one begins.
///
/// Stored on disk as a JSON array:
/// ```json
/// [
///   {
///     "valid_from": "2024-01-01",
///     "prices": {
///       "water_consumption": { "components": [2.95, 2.30], "vat_rate": 0.081 }
///     }
///   }
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TariffSchedule {
    periods: Vec<TariffPeriod>,
}

const VAT_RATE: f64 = 0.081;

// Itemized surcharges, the same in both consumption windows.
const CONSUMPTION_SURCHARGES: [f64; 8] = [0.75, 2.3, 0.6, 0.02, 0.7, 0.7, 0.6, 1.2];

impl TariffSchedule {
    pub fn new(periods: Vec<TariffPeriod>) -> Self {
        Self { periods }
    }

    /// Loads a schedule from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// The schedule compiled into the binary.
    pub fn builtin() -> Self {
        let centimes = |components: Vec<f64>| UnitPrice {
            components,
            vat_rate: VAT_RATE,
            scale: PriceScale::Centimes,
        };
        let consumption = |energy: f64, grid: f64| {
            let mut components = vec![energy, grid];
            components.extend(CONSUMPTION_SURCHARGES);
            centimes(components)
        };

        let prices = BTreeMap::from([
            (PriceKey::EnergyProductionHigh, centimes(vec![18.10])),
            (PriceKey::EnergyProductionLow, centimes(vec![18.10])),
            (PriceKey::EnergyConsumptionHigh, consumption(21.0, 13.11)),
            (PriceKey::EnergyConsumptionLow, consumption(18.75, 7.56)),
            (
                PriceKey::WaterConsumption,
                UnitPrice {
                    components: vec![2.95, 2.30],
                    vat_rate: VAT_RATE,
                    scale: PriceScale::Francs,
                },
            ),
        ]);

        Self::new(vec![TariffPeriod {
            valid_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            prices,
        }])
    }

    /// Returns the latest period starting on or before `date`.
    pub fn period_for(&self, date: NaiveDate) -> Result<&TariffPeriod> {
        self.periods
            .iter()
            .filter(|p| p.valid_from <= date)
            .max_by_key(|p| p.valid_from)
            .ok_or_else(|| Error::Configuration(format!("no tariff period covers {date}")))
    }
}
