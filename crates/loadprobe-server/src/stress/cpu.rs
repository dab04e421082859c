//! CPU stress worker.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::obs::metrics::CounterVec;

/// One fixed-size unit of CPU-bound work.
pub type WorkUnit = Arc<dyn Fn() + Send + Sync>;

/// Generate and discard `batch_size` pseudo-random floats.
pub fn random_batch(batch_size: usize) -> WorkUnit {
    Arc::new(move || {
        let mut rng = rand::thread_rng();
        let batch: Vec<f64> = (0..batch_size).map(|_| rng.gen::<f64>()).collect();
        std::hint::black_box(batch);
    })
}

pub struct CpuWorker {
    work: WorkUnit,
    yield_interval: Duration,
    batches: Arc<CounterVec>,
}

impl CpuWorker {
    pub fn new(work: WorkUnit, yield_interval: Duration, batches: Arc<CounterVec>) -> Self {
        Self {
            work,
            yield_interval,
            batches,
        }
    }

    /// Run on the blocking pool until `token` is cancelled.
    ///
    /// The token is checked between units, so the worker exits within one
    /// unit plus one yield after cancellation.
    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || self.run(&token))
    }

    fn run(&self, token: &CancellationToken) {
        tracing::info!("cpu stress worker started");
        let mut completed: u64 = 0;
        while !token.is_cancelled() {
            (self.work)();
            self.batches.inc(&[]);
            completed += 1;
            std::thread::sleep(self.yield_interval);
        }
        tracing::info!(batches = completed, "cpu stress worker finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obs::metrics::MetricsRegistry;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test]
    async fn runs_units_until_cancelled() {
        let reg = MetricsRegistry::new();
        let batches = reg.counter("b_total", "batches", &[]).unwrap();
        let calls = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&calls);
        let work: WorkUnit = Arc::new(move || {
            c.fetch_add(1, Ordering::Relaxed);
        });

        let token = CancellationToken::new();
        let handle = CpuWorker::new(work, Duration::from_millis(1), Arc::clone(&batches))
            .spawn(token.clone());
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
        handle.await.unwrap();

        let n = calls.load(Ordering::Relaxed);
        assert!(n > 0);
        assert_eq!(batches.get(&[]), n);
    }

    #[test]
    fn random_batch_is_callable() {
        (random_batch(1000))();
    }
}
