//! CLI entry point for the SEY meter data exporter.
//!
//! Downloads one day of electricity and water readings from the portal and
//! writes cumulative statistics files for the Home Assistant importer.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Parser;
use sey_meter_export::config::{
    AuthSource, Config, PortalConfig, REQUEST_TIMEOUT, default_date, parse_date, today,
};
use sey_meter_export::export::{DayPayloads, Meter, export_day, raw_payload_path};
use sey_meter_export::fetch::{
    BasicClient, DEFAULT_BASE_URL, HttpClient, MeterDataApi, auth::SessionHeaders,
};
use sey_meter_export::series::MeterPayload;
use sey_meter_export::store::SumStore;
use sey_meter_export::tariff::TariffSchedule;
use tracing::level_filters::LevelFilter;
use tracing::{Instrument, error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "sey_meter_export")]
#[command(about = "Export SEY meter readings as Home Assistant statistics", long_about = None)]
struct Cli {
    /// Day to export (YYYYMMDD), two days ago by default
    #[arg(value_name = "DATE", value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Folder for raw payloads, statistics files and stored sums
    #[arg(long, env = "DATA_FOLDER")]
    data_folder: PathBuf,

    /// Export payloads already saved in the data folder instead of fetching
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Authorization header value for the metering API
    #[arg(long, env = "SEY_AUTHORIZATION", hide_env_values = true)]
    authorization: Option<String>,

    /// Captured browser network log to recover the authorization from
    #[arg(long, env = "SEY_TRAFFIC_LOG", conflicts_with = "authorization")]
    traffic_log: Option<PathBuf>,

    #[arg(long, env = "SEY_ELECTRICAL_CONTRACT_ID")]
    electrical_contract_id: Option<String>,

    #[arg(long, env = "SEY_WATER_CONTRACT_ID")]
    water_contract_id: Option<String>,

    #[arg(long, env = "SEY_SUBJECT_ID")]
    subject_id: Option<String>,

    #[arg(long, env = "SEY_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    api_base_url: String,

    /// JSON tariff schedule, the built-in one when omitted
    #[arg(long, env = "SEY_TARIFFS")]
    tariffs: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let tariffs = match &self.tariffs {
            Some(path) => TariffSchedule::load(path)
                .with_context(|| format!("loading tariffs from {}", path.display()))?,
            None => TariffSchedule::builtin(),
        };

        let portal = if self.offline {
            None
        } else {
            let auth = match (self.authorization, self.traffic_log) {
                (Some(value), _) => AuthSource::Token(value),
                (None, Some(path)) => AuthSource::TrafficLog(path),
                (None, None) => bail!("set SEY_AUTHORIZATION or SEY_TRAFFIC_LOG"),
            };
            Some(PortalConfig {
                auth,
                api_base_url: self.api_base_url,
                electrical_contract_id: self
                    .electrical_contract_id
                    .context("SEY_ELECTRICAL_CONTRACT_ID must be set")?,
                water_contract_id: self
                    .water_contract_id
                    .context("SEY_WATER_CONTRACT_ID must be set")?,
                subject_id: self.subject_id,
            })
        };

        Ok(Config {
            date: self.date.unwrap_or_else(|| default_date(today())),
            data_folder: self.data_folder,
            tariffs,
            portal,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/sey_meter_export.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("sey_meter_export.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let config = Cli::parse().into_config()?;

    let span = tracing::info_span!(
        "export",
        date = %config.date,
        subject_id = config
            .portal
            .as_ref()
            .and_then(|p| p.subject_id.as_deref())
            .unwrap_or("-"),
    );
    if let Err(e) = run(&config).instrument(span).await {
        error!(error = %format!("{e:#}"), "Export failed");
        return Err(e);
    }
    Ok(())
}

/// Loads the stored sums, obtains the day's payloads and exports them.
///
/// The store is loaded first so a repeated run for the same day stops before
/// anything is fetched or written.
async fn run(config: &Config) -> Result<()> {
    std::fs::create_dir_all(&config.data_folder)
        .with_context(|| format!("creating {}", config.data_folder.display()))?;

    let mut store = SumStore::load(&config.data_folder, config.date)?;
    let period = config.tariffs.period_for(config.date)?;

    let payloads = match &config.portal {
        Some(portal) => collect(portal, &config.data_folder, config.date).await?,
        None => {
            info!("Offline mode, reading saved payloads");
            DayPayloads::load(&config.data_folder, config.date)?
        }
    };

    let summary = export_day(
        &config.data_folder,
        config.date,
        period,
        &mut store,
        &payloads,
    )?;

    info!(
        files = summary.written.len(),
        skipped = ?summary.skipped,
        "Done"
    );
    Ok(())
}

/// Authorizes against the portal, fetches both meters and keeps the raw
/// responses next to the statistics files.
#[tracing::instrument(skip_all)]
async fn collect(portal: &PortalConfig, folder: &Path, date: NaiveDate) -> Result<DayPayloads> {
    let auth = portal
        .auth
        .provider()
        .authorize()
        .await
        .context("obtaining a portal session")?;

    let client = SessionHeaders::new(BasicClient::new(REQUEST_TIMEOUT)?, auth);
    let api = MeterDataApi::new(client, portal.api_base_url.as_str());

    let electricity = fetch_and_save(
        &api,
        Meter::Electricity,
        &portal.electrical_contract_id,
        folder,
        date,
    )
    .await?;
    let water = fetch_and_save(&api, Meter::Water, &portal.water_contract_id, folder, date).await?;

    Ok(DayPayloads { electricity, water })
}

async fn fetch_and_save<C: HttpClient>(
    api: &MeterDataApi<C>,
    meter: Meter,
    metering_point: &str,
    folder: &Path,
    date: NaiveDate,
) -> Result<MeterPayload> {
    let bytes = api.fetch_day(meter, metering_point, date).await?;

    let path = raw_payload_path(folder, date, meter);
    std::fs::write(&path, &bytes).with_context(|| format!("saving {}", path.display()))?;
    info!(path = %path.display(), "Raw payload saved");

    Ok(MeterPayload::from_slice(&bytes)?)
}
