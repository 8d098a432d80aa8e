//! Run configuration, assembled once at startup and passed down.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Days, Local, NaiveDate};

use crate::session::{CapturedTraffic, SessionProvider, StaticToken};
use crate::store::DATE_FORMAT;
use crate::tariff::TariffSchedule;

/// Default age of the exported day; the portal lags behind by a day or two.
pub const DEFAULT_DAYS_BACK: u64 = 2;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the session token comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSource {
    Token(String),
    TrafficLog(PathBuf),
}

impl AuthSource {
    pub fn provider(&self) -> Box<dyn SessionProvider> {
        match self {
            AuthSource::Token(value) => Box::new(StaticToken::new(value.clone())),
            AuthSource::TrafficLog(path) => Box::new(CapturedTraffic::new(path.clone())),
        }
    }
}

/// Settings needed to download a day from the portal.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub auth: AuthSource,
    pub api_base_url: String,
    pub electrical_contract_id: String,
    pub water_contract_id: String,
    pub subject_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub date: NaiveDate,
    pub data_folder: PathBuf,
    pub tariffs: TariffSchedule,
    /// `None` exports payloads already saved in `data_folder`.
    pub portal: Option<PortalConfig>,
}

/// Parses a `YYYYMMDD` command line date.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| format!("expected YYYYMMDD: {e}"))
}

/// The day exported when none is given.
pub fn default_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(DEFAULT_DAYS_BACK))
        .unwrap_or(today)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
