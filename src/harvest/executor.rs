use anyhow::Result;
use futures::StreamExt;
use std::collections::HashSet;

use crate::fetcher::ProfileFetcher;
use crate::telemetry;

use super::types::FetchOutcome;

/// Fetch every identifier of a batch concurrently, at most `concurrency` in
/// flight. Results come back in scheduling order, so position N corresponds
/// to `attempt[N]`. A failed fetch becomes the `Err` arm for that identifier
/// and never takes the rest of the batch down with it.
pub async fn execute_batch<F: ProfileFetcher + ?Sized>(
    fetcher: &F,
    attempt: &[i64],
    completed_surveys: &HashSet<i64>,
    concurrency: usize,
) -> Vec<(i64, Result<FetchOutcome>)> {
    let log = telemetry::harvest();
    let concurrency = concurrency.max(1);

    let results: Vec<(i64, Result<FetchOutcome>)> = futures::stream::iter(attempt.iter().copied())
        .map(|rid| async move { (rid, fetcher.fetch(rid, completed_surveys).await) })
        .buffered(concurrency)
        .collect()
        .await;

    for (rid, res) in &results {
        match res {
            Ok(FetchOutcome::ParsingError) => {
                log.warn_kv("⚠️ parse failure", [("rid", rid.to_string())]);
            }
            Err(e) => {
                log.warn_kv(
                    "⚠️ fetch failure",
                    [("rid", rid.to_string()), ("error", format!("{e:#}"))],
                );
            }
            Ok(_) => {}
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::ProfileFetcher;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct SlowStub {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        fetched: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl ProfileFetcher for SlowStub {
        async fn fetch(&self, rid: i64, _surveys: &HashSet<i64>) -> Result<FetchOutcome> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.fetched.lock().unwrap().push(rid);
            if rid == 13 {
                bail!("boom at {rid}");
            }
            Ok(FetchOutcome::NoProfile)
        }
    }

    #[tokio::test]
    async fn results_keep_scheduling_order() {
        let stub = SlowStub {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fetched: Mutex::new(Vec::new()),
        };
        let rids = vec![5, 13, 21, 29];
        let results = execute_batch(&stub, &rids, &HashSet::new(), 4).await;
        let order: Vec<i64> = results.iter().map(|(rid, _)| *rid).collect();
        assert_eq!(order, rids);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let stub = SlowStub {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fetched: Mutex::new(Vec::new()),
        };
        let results = execute_batch(&stub, &[5, 13, 21], &HashSet::new(), 2).await;
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(results[2].1.is_ok());
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let stub = SlowStub {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fetched: Mutex::new(Vec::new()),
        };
        let rids: Vec<i64> = (0..20).map(|i| 100 + i).collect();
        execute_batch(&stub, &rids, &HashSet::new(), 3).await;
        assert!(stub.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(stub.fetched.lock().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn empty_attempt_list_resolves_immediately() {
        let stub = SlowStub {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fetched: Mutex::new(Vec::new()),
        };
        let results = execute_batch(&stub, &[], &HashSet::new(), 4).await;
        assert!(results.is_empty());
    }
}
