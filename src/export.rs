//! Daily export of every statistic derived from the electricity and water
//! payloads.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, info_span, warn};

use crate::error::{Error, Result};
use crate::output::write_series;
use crate::series::{MeterPayload, extract};
use crate::store::{DATE_FORMAT, SumStore};
use crate::tariff::{PriceKey, TariffMode, TariffPeriod};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meter {
    Electricity,
    Water,
}

impl Meter {
    pub fn name(self) -> &'static str {
        match self {
            Meter::Electricity => "electricity",
            Meter::Water => "water",
        }
    }
}

/// One output statistic and how to derive it.
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    pub file_name: &'static str,
    pub statistic_id: &'static str,
    pub unit: &'static str,
    pub meter: Meter,
    /// Position of the source series inside the meter's payload.
    pub series_index: usize,
    pub series_name: &'static str,
    /// Cost modes get their unit price from `price` at export time.
    pub mode: TariffMode,
    pub price: Option<PriceKey>,
}

const PRODUCTION: usize = 0;
const CONSUMPTION: usize = 1;
const WATER: usize = 0;

const fn energy(
    file_name: &'static str,
    statistic_id: &'static str,
    unit: &'static str,
    series_index: usize,
    mode: TariffMode,
    price: Option<PriceKey>,
) -> Metric {
    Metric {
        file_name,
        statistic_id,
        unit,
        meter: Meter::Electricity,
        series_index,
        series_name: if series_index == PRODUCTION {
            "production"
        } else {
            "consumption"
        },
        mode,
        price,
    }
}

const fn water(
    file_name: &'static str,
    statistic_id: &'static str,
    unit: &'static str,
    mode: TariffMode,
    price: Option<PriceKey>,
) -> Metric {
    Metric {
        file_name,
        statistic_id,
        unit,
        meter: Meter::Water,
        series_index: WATER,
        series_name: "consumption",
        mode,
        price,
    }
}

pub const METRICS: [Metric; 10] = [
    energy(
        "energy-production-data-high-tariff.tsv",
        "sensor:sey_energy_production_high_tariff",
        "kWh",
        PRODUCTION,
        TariffMode::DataHigh,
        None,
    ),
    energy(
        "energy-production-data-low-tariff.tsv",
        "sensor:sey_energy_production_low_tariff",
        "kWh",
        PRODUCTION,
        TariffMode::DataLow,
        None,
    ),
    energy(
        "energy-production-cost-high-tariff.tsv",
        "sensor:sey_energy_production_cost_high_tariff",
        "CHF/kWh",
        PRODUCTION,
        TariffMode::CostHigh { unit_price: None },
        Some(PriceKey::EnergyProductionHigh),
    ),
    energy(
        "energy-production-cost-low-tariff.tsv",
        "sensor:sey_energy_production_cost_low_tariff",
        "CHF/kWh",
        PRODUCTION,
        TariffMode::CostLow { unit_price: None },
        Some(PriceKey::EnergyProductionLow),
    ),
    energy(
        "energy-consumption-data-high-tariff.tsv",
        "sensor:sey_energy_consumption_high_tariff",
        "kWh",
        CONSUMPTION,
        TariffMode::DataHigh,
        None,
    ),
    energy(
        "energy-consumption-data-low-tariff.tsv",
        "sensor:sey_energy_consumption_low_tariff",
        "kWh",
        CONSUMPTION,
        TariffMode::DataLow,
        None,
    ),
    energy(
        "energy-consumption-cost-high-tariff.tsv",
        "sensor:sey_energy_consumption_cost_high_tariff",
        "CHF/kWh",
        CONSUMPTION,
        TariffMode::CostHigh { unit_price: None },
        Some(PriceKey::EnergyConsumptionHigh),
    ),
    energy(
        "energy-consumption-cost-low-tariff.tsv",
        "sensor:sey_energy_consumption_cost_low_tariff",
        "CHF/kWh",
        CONSUMPTION,
        TariffMode::CostLow { unit_price: None },
        Some(PriceKey::EnergyConsumptionLow),
    ),
    water(
        "water-consumption-data.tsv",
        "sensor:sey_water_consumption",
        "m³",
        TariffMode::NoTariff,
        None,
    ),
    water(
        "water-consumption-cost.tsv",
        "sensor:sey_water_consumption_cost",
        "CHF/m³",
        TariffMode::FlatCost { unit_price: None },
        Some(PriceKey::WaterConsumption),
    ),
];

/// The two payloads fetched for one day.
#[derive(Debug, Clone)]
pub struct DayPayloads {
    pub electricity: MeterPayload,
    pub water: MeterPayload,
}

impl DayPayloads {
    pub fn get(&self, meter: Meter) -> &MeterPayload {
        match meter {
            Meter::Electricity => &self.electricity,
            Meter::Water => &self.water,
        }
    }

    /// Reads payloads previously saved by [`raw_payload_path`].
    pub fn load(folder: &Path, date: NaiveDate) -> Result<Self> {
        Ok(Self {
            electricity: MeterPayload::load(&raw_payload_path(folder, date, Meter::Electricity))?,
            water: MeterPayload::load(&raw_payload_path(folder, date, Meter::Water))?,
        })
    }
}

/// Where the raw API response for `meter` on `date` is kept.
pub fn raw_payload_path(folder: &Path, date: NaiveDate, meter: Meter) -> PathBuf {
    folder.join(format!("{}-{}-data.json", date.format(DATE_FORMAT), meter.name()))
}

pub fn output_path(folder: &Path, date: NaiveDate, metric: &Metric) -> PathBuf {
    folder.join(format!("{}-{}", date.format(DATE_FORMAT), metric.file_name))
}

#[derive(Debug, Default)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<&'static str>,
}

/// Writes every metric of `date` into `folder` and commits the new sums.
///
/// Metrics whose source series is absent are skipped and keep their previous
/// sum. Any other error aborts before the commit, leaving the stored sums as
/// they were so the whole day can be rerun.
#[tracing::instrument(skip_all, fields(date = %date, folder = %folder.display()))]
pub fn export_day(
    folder: &Path,
    date: NaiveDate,
    period: &TariffPeriod,
    store: &mut SumStore,
    payloads: &DayPayloads,
) -> Result<ExportSummary> {
    let mut summary = ExportSummary::default();

    for metric in &METRICS {
        let _span = info_span!("metric", statistic_id = metric.statistic_id).entered();

        let samples = match payloads
            .get(metric.meter)
            .samples(metric.series_index, metric.series_name)
        {
            Ok(samples) => samples,
            Err(e @ Error::MissingSeries { .. }) => {
                warn!(meter = metric.meter.name(), error = %e, "Skipping metric");
                summary.skipped.push(metric.statistic_id);
                continue;
            }
            Err(e) => return Err(e),
        };

        let unit_price = metric.price.and_then(|key| period.unit_price(key));
        let mode = metric.mode.with_unit_price(unit_price);

        let path = output_path(folder, date, metric);
        let mut rows = extract(
            samples,
            metric.statistic_id,
            metric.unit,
            mode,
            store.seed(metric.statistic_id),
        );
        write_series(&path, &mut rows)?;
        let final_sum = rows.into_final_sum()?;

        store.record(metric.statistic_id, final_sum);
        summary.written.push(path);
    }

    store.commit(date)?;

    info!(
        written = summary.written.len(),
        skipped = summary.skipped.len(),
        "Export finished"
    );
    Ok(summary)
}
