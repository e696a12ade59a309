use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::error::{ChainError, Result};
use crate::fetch::chain::ChainFetcher;
use crate::model::{FetchRequest, FetchUnit};

/// Runs many fetches concurrently, at most `max_concurrency` at a time.
pub struct Scheduler {
    fetcher: Arc<ChainFetcher>,
    max_concurrency: usize,
}

impl Scheduler {
    /// A `max_concurrency` of 0 is treated as 1, so fetches run one at a
    /// time rather than never.
    pub fn new(fetcher: Arc<ChainFetcher>, max_concurrency: usize) -> Self {
        Self {
            fetcher,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Uses the fetcher's configured concurrency.
    pub fn from_config(fetcher: Arc<ChainFetcher>) -> Self {
        let n = fetcher.config().max_concurrency;
        Self::new(fetcher, n)
    }

    /// Fetch every request and return the units in input order.
    ///
    /// Each request gets its own task, which holds one limiter permit for the
    /// duration of its fetch. Returns only after every task has finished; if
    /// any task reports [`ChainError::Interrupted`] the rest are aborted and
    /// the error is returned.
    pub async fn run(&self, requests: Vec<FetchRequest>) -> Result<Vec<FetchUnit>> {
        let limiter = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        let total = requests.len();
        debug!(total, max_concurrency = self.max_concurrency, "scheduling fetches");

        for (idx, request) in requests.into_iter().enumerate() {
            let limiter = limiter.clone();
            let fetcher = self.fetcher.clone();
            tasks.spawn(async move {
                // The permit drops with the task on every exit path.
                let _permit = limiter
                    .acquire_owned()
                    .await
                    .map_err(|_| ChainError::Interrupted)?;
                let unit = fetcher.fetch(request).await?;
                Ok::<_, ChainError>((idx, unit))
            });
        }

        let mut slots: Vec<Option<FetchUnit>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((idx, unit))) => slots[idx] = Some(unit),
                Ok(Err(e)) => {
                    error!("fetch run aborted: {e}");
                    tasks.shutdown().await;
                    return Err(e);
                }
                Err(join_err) if join_err.is_panic() => {
                    tasks.shutdown().await;
                    std::panic::resume_unwind(join_err.into_panic());
                }
                Err(_) => {
                    tasks.shutdown().await;
                    return Err(ChainError::Interrupted);
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }
}
