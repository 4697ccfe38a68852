use anyhow::{Result, bail};

pub const DEFAULT_START_RID: i64 = 158000;
pub const DEFAULT_INTERVAL: i64 = 10;
pub const DEFAULT_NUMBER_BATCHES: usize = 62;
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Everything one run needs, resolved up front and passed into the
/// orchestrator. No module-level state anywhere in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub start_rid: i64,
    pub interval: i64,
    pub number_batches: usize,
    pub batch_size: usize,
    pub concurrency: usize,
}

impl RunConfig {
    /// Resolve positional CLI arguments: either none (defaults sample about
    /// 10% of the platform) or exactly four (start_rid, interval,
    /// number_batches, batch_size). Anything else is a configuration error
    /// and no work may start.
    pub fn from_args(args: &[i64], concurrency: Option<usize>) -> Result<Self> {
        let concurrency = concurrency
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4)
            })
            .max(1);

        match args {
            [] => Ok(Self {
                start_rid: DEFAULT_START_RID,
                interval: DEFAULT_INTERVAL,
                number_batches: DEFAULT_NUMBER_BATCHES,
                batch_size: DEFAULT_BATCH_SIZE,
                concurrency,
            }),
            [start_rid, interval, number_batches, batch_size] => {
                if *interval <= 0 {
                    bail!("interval must be positive, got {interval}");
                }
                if *number_batches < 0 || *batch_size < 0 {
                    bail!("number_batches and batch_size must not be negative");
                }
                Ok(Self {
                    start_rid: *start_rid,
                    interval: *interval,
                    number_batches: *number_batches as usize,
                    batch_size: *batch_size as usize,
                    concurrency,
                })
            }
            other => bail!(
                "Incorrect number of arguments passed ({}). Should be 4: start_rid interval number_batches batch_size",
                other.len()
            ),
        }
    }

    pub fn is_default(&self) -> bool {
        self.start_rid == DEFAULT_START_RID
            && self.interval == DEFAULT_INTERVAL
            && self.number_batches == DEFAULT_NUMBER_BATCHES
            && self.batch_size == DEFAULT_BATCH_SIZE
    }
}
