use crate::store::HarvestStore;
use crate::telemetry;

use super::classify::BatchPayload;
use super::planner::BatchPlan;

/// What the load coordinator did with a batch. Terminal either way: failed
/// loads are not retried within the run, the identifiers simply stay out of
/// the completed set and are picked up by the next run's snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Responses landed, recipients landed.
    Loaded,
    /// Nothing classified as loadable; no store call made.
    NothingToLoad,
    /// The store reported a non-success for the response payload, so the
    /// recipient load was deliberately withheld.
    ResponsesRejected,
    /// A store call errored; logged with the offending payload, swallowed.
    Failed,
}

/// Persist one classified batch. Responses go first; recipients are only
/// attempted after the store confirms the response load, which keeps a failed
/// batch from leaving recipient rows with no matching responses behind.
/// Store errors are logged and absorbed here so the run always moves on to
/// the next batch.
pub async fn load_batch<S: HarvestStore + ?Sized>(
    store: &S,
    payload: &BatchPayload,
    plan: &BatchPlan,
    interval: i64,
) -> LoadStatus {
    let log = telemetry::harvest();

    log.batch_summary(plan.attempt.len(), plan.skipped.len(), plan.start, plan.finish, interval, &payload.counts);

    if payload.responses.is_empty() {
        log.info("Nothing to load");
        return LoadStatus::NothingToLoad;
    }

    let go = match store.load_responses(&payload.responses).await {
        Ok(go) => go,
        Err(e) => {
            log.warn_kv(
                "⚠️ error while loading response payload",
                [
                    ("error", format!("{e:#}")),
                    ("payload", dump_rows(&payload.responses)),
                ],
            );
            return LoadStatus::Failed;
        }
    };

    if !go {
        log.warn("Loading recipient data cancelled due to error in response payload");
        return LoadStatus::ResponsesRejected;
    }

    match store.load_recipients(&payload.recipients).await {
        Ok(()) => LoadStatus::Loaded,
        Err(e) => {
            log.warn_kv(
                "⚠️ error while loading recipient payload",
                [
                    ("error", format!("{e:#}")),
                    ("payload", dump_rows(&payload.recipients)),
                ],
            );
            LoadStatus::Failed
        }
    }
}

fn dump_rows<T: serde::Serialize>(rows: &[T]) -> String {
    serde_json::to_string(rows).unwrap_or_else(|e| format!("<unserializable payload: {e}>"))
}
