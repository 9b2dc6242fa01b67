use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use trafficpull_core::accumulator;
use trafficpull_core::config::Config;
use trafficpull_core::fetch::Fetcher;
use trafficpull_core::property::{PropertySource, StaticPropertySource};
use trafficpull_core::retry::TokioSleeper;
use trafficpull_duckdb::DuckDbPropertySource;
use trafficpull_runner::client::{http_client, HttpReportingClient};
use trafficpull_runner::credentials::TokenProvider;
use trafficpull_runner::export::export_to_file;

fn property_source(cfg: &Config) -> Result<Box<dyn PropertySource>> {
    if let Some(raw) = &cfg.properties {
        let source = StaticPropertySource::parse(raw)?;
        info!("using inline property list");
        return Ok(Box::new(source));
    }
    if let Some(parent) = Path::new(&cfg.properties_db).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(Box::new(DuckDbPropertySource::open(&cfg.properties_db)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trafficpull=info".parse()?),
        )
        .json()
        .init();

    let started = Instant::now();
    let cfg = Config::from_env()?;
    let months = cfg.months();
    info!(
        start = %cfg.start_date,
        end = %cfg.end_date,
        months = months.len(),
        "configuration loaded"
    );

    let source = property_source(&cfg)?;

    let http = http_client()?;
    let tokens = Arc::new(TokenProvider::from_source(&cfg.credentials, http.clone())?);
    let client = HttpReportingClient::new(http, &cfg.api_base_url, tokens)?;
    let sleeper = TokioSleeper;
    let fetcher = Fetcher::new(&client, &sleeper, cfg.retry_policy());

    let results = accumulator::run(&fetcher, source.as_ref(), &months).await?;
    let path = export_to_file(&results, Path::new(&cfg.output_dir), Utc::now().date_naive())?;

    info!(
        path = %path.display(),
        rows = results.len(),
        elapsed_secs = format!("{:.2}", started.elapsed().as_secs_f64()),
        "trafficpull finished"
    );
    Ok(())
}
