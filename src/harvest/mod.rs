use anyhow::Result;
use std::time::Instant;

use crate::config::RunConfig;
use crate::fetcher::ProfileFetcher;
use crate::store::HarvestStore;
use crate::telemetry::{self};
use crate::telemetry::ops::harvest::Phase as HarvestPhase;
use crate::telemetry::ops::maintain::Phase as MaintainPhase;
use crate::util::time::BatchTimes;

pub mod classify;
pub mod executor;
pub mod load;
pub mod planner;
pub mod types;

use classify::create_payloads;
use load::{LoadStatus, load_batch};
use planner::plan_batch;
use types::{CompletedSet, OutcomeCounts};

/// Aggregate over a whole run, mostly for the caller's final log line and
/// for end-to-end tests.
#[derive(Debug, Default)]
pub struct RunReport {
    pub batches: usize,
    pub skipped: usize,
    pub counts: OutcomeCounts,
    pub loads: Vec<LoadStatus>,
}

/// Drive one full run: snapshot the completed set, process every batch in
/// order, then run the maintenance steps. There is no checkpoint state; a
/// crashed run is resumed by running the orchestrator again, which takes a
/// fresh snapshot and therefore skips everything already persisted.
pub async fn run<F, S>(fetcher: &F, store: &S, cfg: &RunConfig) -> Result<RunReport>
where
    F: ProfileFetcher + ?Sized,
    S: HarvestStore + ?Sized,
{
    let log = telemetry::harvest();
    let _g = log
        .root_span_kv([
            ("start_rid", cfg.start_rid.to_string()),
            ("interval", cfg.interval.to_string()),
            ("number_batches", cfg.number_batches.to_string()),
            ("batch_size", cfg.batch_size.to_string()),
            ("concurrency", cfg.concurrency.to_string()),
        ])
        .entered();

    store.ensure_tables().await?;

    // one snapshot per run, read-only from here on
    let completed = {
        let _s = log.span(&HarvestPhase::Snapshot).entered();
        let rids = store.completed_rids().await?;
        log.info("List of complete profiles loaded");
        let surveys = store.completed_surveys().await?;
        log.info("List of complete surveys loaded");
        CompletedSet { rids, surveys }
    };

    let mut report = RunReport::default();
    let mut times = BatchTimes::new();
    let mut rid = cfg.start_rid;

    for batch_no in 0..cfg.number_batches {
        let t0 = Instant::now();
        log.info(format!("Starting to scrape batch {}", batch_no + 1));

        let plan = {
            let _s = log.span(&HarvestPhase::Plan).entered();
            plan_batch(rid, cfg.interval, cfg.batch_size, &completed.rids)
        };
        rid = plan.finish;
        for skipped_rid in &plan.skipped {
            log.info(format!("{skipped_rid} already completed"));
        }

        let results = {
            let _s = log
                .span_kv(&HarvestPhase::Fetch, [
                    ("attempted", plan.attempt.len().to_string()),
                    ("skipped", plan.skipped.len().to_string()),
                ])
                .entered();
            executor::execute_batch(fetcher, &plan.attempt, &completed.surveys, cfg.concurrency)
                .await
        };

        let payload = {
            let _s = log.span(&HarvestPhase::Classify).entered();
            create_payloads(results)
        };

        let status = {
            let _s = log.span(&HarvestPhase::Load).entered();
            load_batch(store, &payload, &plan, cfg.interval).await
        };

        report.batches += 1;
        report.skipped += plan.skipped.len();
        report.counts.add(&payload.counts);
        report.loads.push(status);

        times.record(t0.elapsed());
        log.info(format!(
            "⏱️ Batch took {:.2?} (running avg {:.2?}, ~{:.2?} per profile over batch_size {})",
            t0.elapsed(),
            times.running_avg(),
            times.per_item(cfg.batch_size),
            cfg.batch_size
        ));
    }

    log.totals(report.batches, report.skipped, &report.counts);

    run_maintenance(store).await?;

    Ok(report)
}

/// Post-run maintenance, always executed once per run no matter how the
/// batches went.
async fn run_maintenance<S: HarvestStore + ?Sized>(store: &S) -> Result<()> {
    let log = telemetry::maintain();
    let _g = log.root_span().entered();
    log.info("Starting post-run maintenance");

    let removed = {
        let _s = log.span(&MaintainPhase::DeleteStale).entered();
        store.delete_stale_participant_details().await?
    };
    log.info(format!("🧹 Removed {removed} stale participant detail rows"));

    {
        let _s = log.span(&MaintainPhase::GenderTable).entered();
        store.rebuild_gender_table().await?;
    }
    log.info("Gender table rebuilt");

    {
        let _s = log.span(&MaintainPhase::AggregateTable).entered();
        store.rebuild_aggregate_table().await?;
    }
    log.info("Aggregate table rebuilt");

    Ok(())
}
