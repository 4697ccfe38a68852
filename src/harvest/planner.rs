use std::collections::HashSet;

/// One batch worth of candidate identifiers. `finish` is also the first
/// identifier of the next batch: the cursor advances by `interval` for every
/// slot, skipped or not, so batch boundaries depend only on
/// (start, interval, batch_size).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    pub start: i64,
    pub finish: i64,
    pub attempt: Vec<i64>,
    pub skipped: Vec<i64>,
}

pub fn plan_batch(
    start: i64,
    interval: i64,
    batch_size: usize,
    completed_rids: &HashSet<i64>,
) -> BatchPlan {
    let mut rid = start;
    let mut attempt = Vec::with_capacity(batch_size);
    let mut skipped = Vec::new();
    for _ in 0..batch_size {
        if completed_rids.contains(&rid) {
            skipped.push(rid);
        } else {
            attempt.push(rid);
        }
        rid += interval;
    }
    BatchPlan { start, finish: rid, attempt, skipped }
}
