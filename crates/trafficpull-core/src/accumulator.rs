use std::time::Instant;

use tracing::{error, info};

use crate::aggregate::aggregate;
use crate::fetch::Fetcher;
use crate::period::{DateRange, PeriodRow};
use crate::property::PropertySource;

/// Every period row produced by a run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    rows: Vec<PeriodRow>,
}

impl ResultSet {
    pub fn push(&mut self, row: PeriodRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[PeriodRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Walk every month (outer) and property (inner), aggregating each period.
///
/// The property list is read once up front; a failure there aborts the run.
/// Periods that are skipped or fail validation are logged and left out.
pub async fn run(
    fetcher: &Fetcher<'_>,
    source: &dyn PropertySource,
    months: &[DateRange],
) -> anyhow::Result<ResultSet> {
    let started = Instant::now();
    let properties = source.list_properties().await?;
    info!(
        properties = properties.len(),
        months = months.len(),
        max_attempts = fetcher.policy().max_attempts,
        "starting run"
    );

    let mut results = ResultSet::default();
    let mut skipped = 0usize;

    for range in months {
        for property in &properties {
            info!(month = %range.start, domain = %property.domain, "processing period");
            match aggregate(fetcher, property, range).await {
                Ok(Some(row)) => results.push(row),
                Ok(None) => skipped += 1,
                Err(err) => {
                    error!(
                        month = %range.start,
                        domain = %property.domain,
                        error = %err,
                        "period rejected"
                    );
                    skipped += 1;
                }
            }
        }
    }

    info!(
        rows = results.len(),
        skipped,
        elapsed_secs = format!("{:.2}", started.elapsed().as_secs_f64()),
        "run complete"
    );
    Ok(results)
}
