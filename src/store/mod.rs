use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;

use crate::harvest::types::{RecipientRow, ResponseRow};

pub mod postgres;

#[cfg(test)]
pub mod mock;

pub use postgres::PgHarvestStore;

/// Persistence boundary of the pipeline. One implementation talks to
/// Postgres; tests substitute a recording double. All bulk loads are
/// all-or-nothing per call: `load_responses` either lands every row and
/// reports `true`, flags a rejected payload with `false`, or errors.
#[async_trait]
pub trait HarvestStore: Send + Sync {
    /// Create schema and tables if absent. Safe to call on every run.
    async fn ensure_tables(&self) -> Result<()>;

    /// Identifiers whose profiles are complete and need no further fetches.
    async fn completed_rids(&self) -> Result<HashSet<i64>>;

    /// Survey ids already persisted, used to filter re-fetched profiles.
    async fn completed_surveys(&self) -> Result<HashSet<i64>>;

    /// Bulk-load response rows. `false` means the store rejected the
    /// payload without erroring; callers must not load recipients then.
    async fn load_responses(&self, rows: &[ResponseRow]) -> Result<bool>;

    /// Bulk-load recipient rows. Only called after `load_responses`
    /// reported success for the same batch.
    async fn load_recipients(&self, rows: &[RecipientRow]) -> Result<()>;

    /// Drop superseded participant-detail rows, keeping the newest per
    /// recipient. Returns the number of rows removed.
    async fn delete_stale_participant_details(&self) -> Result<u64>;

    /// Rebuild the derived gender table from response text.
    async fn rebuild_gender_table(&self) -> Result<()>;

    /// Rebuild the per-recipient aggregate table.
    async fn rebuild_aggregate_table(&self) -> Result<()>;
}
