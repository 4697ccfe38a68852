use std::time::Duration;

/// Accumulates per-batch durations so the run loop can report a running
/// average and a projected per-profile cost.
#[derive(Debug, Default)]
pub struct BatchTimes {
    total: Duration,
    batches: u32,
}

impl BatchTimes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.total += elapsed;
        self.batches += 1;
    }

    /// Mean batch duration so far; zero before the first batch.
    pub fn running_avg(&self) -> Duration {
        if self.batches == 0 {
            Duration::ZERO
        } else {
            self.total / self.batches
        }
    }

    /// Running average spread over the batch size, i.e. the projected cost
    /// of one profile slot.
    pub fn per_item(&self, batch_size: usize) -> Duration {
        if batch_size == 0 {
            Duration::ZERO
        } else {
            self.running_avg() / batch_size as u32
        }
    }
}
