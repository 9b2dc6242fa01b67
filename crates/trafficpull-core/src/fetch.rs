use async_trait::async_trait;
use tracing::{error, warn};

use crate::error::FetchError;
use crate::filter::Segment;
use crate::period::DateRange;
use crate::report::{MetricReport, ReportRequest};
use crate::retry::{RetryPolicy, Sleeper};

/// Authenticated access to the reporting API.
///
/// Implementations issue one read-only query per call and report transport
/// and API failures as errors; retrying is the caller's job.
#[async_trait]
pub trait ReportingClient: Send + Sync {
    async fn batch_get(&self, request: &ReportRequest) -> anyhow::Result<MetricReport>;
}

/// Report Fetcher: a client handle plus the retry policy applied to it.
pub struct Fetcher<'a> {
    client: &'a dyn ReportingClient,
    sleeper: &'a dyn Sleeper,
    policy: RetryPolicy,
}

impl<'a> Fetcher<'a> {
    pub fn new(client: &'a dyn ReportingClient, sleeper: &'a dyn Sleeper, policy: RetryPolicy) -> Self {
        Self {
            client,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch users and sessions for one view, range and segment.
    ///
    /// Each failed attempt is logged. Once the attempt budget is spent the
    /// result is [`FetchError::Exhausted`].
    pub async fn fetch(
        &self,
        view_id: &str,
        range: &DateRange,
        segment: Segment,
    ) -> Result<MetricReport, FetchError> {
        let filter = segment.filter();
        let request = ReportRequest::users_and_sessions(view_id, *range, filter.as_ref());
        let request = &request;
        let client = self.client;
        let max_attempts = self.policy.max_attempts;

        let outcome = self
            .policy
            .run(self.sleeper, |attempt| async move {
                client.batch_get(request).await.inspect_err(|err| {
                    warn!(
                        view_id = %view_id,
                        start = %range.start,
                        end = %range.end,
                        segment = %segment,
                        attempt,
                        max_attempts,
                        error = %format!("{err:#}"),
                        "report fetch failed"
                    );
                })
            })
            .await;

        outcome.map_err(|exhausted| {
            error!(
                view_id = %view_id,
                start = %range.start,
                segment = %segment,
                attempts = exhausted.attempts,
                "report fetch gave up"
            );
            FetchError::Exhausted {
                attempts: exhausted.attempts,
                last_error: format!("{:#}", exhausted.last_error),
            }
        })
    }
}
