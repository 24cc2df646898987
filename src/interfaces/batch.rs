use super::csv::household_reader::HouseholdReader;
use super::csv::result_writer::ResultWriter;
use crate::application::service::SupplementService;
use crate::domain::household::CorrelationKey;
use crate::domain::slot::ResultSlot;
use crate::error::Result;
use std::io::{Read, Write};
use std::time::Duration;

/// Counts reported after a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub unreadable: usize,
    pub rejected: usize,
    pub complete: usize,
    pub failed: usize,
    pub pending: usize,
}

/// Submits every household in `source`, waits for each accepted one and
/// writes its final slot to `sink`.
///
/// Unreadable and rejected rows are logged and skipped; they never stop the
/// run.
pub async fn run<R: Read, W: Write>(
    service: &SupplementService,
    source: R,
    sink: W,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();
    let mut accepted: Vec<CorrelationKey> = Vec::new();

    for household in HouseholdReader::new(source).households()? {
        let raw = match household {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(%err, "error reading household");
                summary.unreadable += 1;
                continue;
            }
        };
        match service.submit(&raw).await {
            Ok(ack) => accepted.push(ack.id),
            Err(err) => {
                tracing::warn!(id = %raw.get("id").unwrap_or(&serde_json::Value::Null), %err, "rejected household");
                summary.rejected += 1;
            }
        }
    }

    let mut writer = ResultWriter::new(sink)?;
    for key in &accepted {
        let slot = service.wait_for(key.as_str(), poll_interval, timeout).await?;
        match slot {
            ResultSlot::Pending => {
                tracing::warn!(key = %key, "no result before timeout");
                summary.pending += 1;
            }
            ResultSlot::Complete(_) => summary.complete += 1,
            ResultSlot::Failed { .. } => summary.failed += 1,
        }
        writer.write_result(key.as_str(), &slot)?;
    }
    writer.flush()?;

    tracing::info!(?summary, "batch finished");
    Ok(summary)
}
