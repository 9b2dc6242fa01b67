use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use trafficpull_core::fetch::ReportingClient;
use trafficpull_core::report::{BatchGetRequest, MetricReport, ReportRequest};

use crate::credentials::TokenProvider;

const BATCH_GET_PATH: &str = "./reports:batchGet";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Build the shared HTTP client used for both token exchange and reporting.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("trafficpull/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building http client")
}

/// Reporting API v4 over HTTPS.
pub struct HttpReportingClient {
    http: Client,
    endpoint: Url,
    tokens: Arc<TokenProvider>,
}

impl HttpReportingClient {
    /// `base_url` is the API root, e.g. `https://analyticsreporting.googleapis.com/v4/`.
    pub fn new(http: Client, base_url: &str, tokens: Arc<TokenProvider>) -> Result<Self> {
        let mut base = Url::parse(base_url).with_context(|| format!("invalid API base url {base_url}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(BATCH_GET_PATH)?;
        Ok(Self {
            http,
            endpoint,
            tokens,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ReportingClient for HttpReportingClient {
    async fn batch_get(&self, request: &ReportRequest) -> Result<MetricReport> {
        let token = self.tokens.access_token().await?;
        let resp = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(token)
            .json(&BatchGetRequest::single(request))
            .send()
            .await
            .context("batchGet request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("reporting API returned {status}: {body}"));
        }

        let report: MetricReport = resp.json().await.context("decoding batchGet response")?;
        debug!(
            view_id = %request.view_id,
            reports = report.reports.as_ref().map_or(0, Vec::len),
            "batchGet ok"
        );
        Ok(report)
    }
}
