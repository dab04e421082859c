//! Memory stress worker and its ballast.
//!
//! The ballast lives behind a mutex shared by the worker (append) and the
//! controller (clear on stop). The worker allocates a block outside the lock,
//! then appends it only if its token is still live while holding the lock.
//! A stop cancels first and clears under the same lock, so no block can be
//! appended after the clear.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::obs::metrics::GaugeVec;

/// Retained memory, one fixed-size block per unit.
#[derive(Debug, Default)]
pub struct Ballast {
    blocks: Vec<Box<[u8]>>,
    bytes: usize,
}

impl Ballast {
    /// Units currently held.
    pub fn units(&self) -> usize {
        self.blocks.len()
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    fn push(&mut self, block: Box<[u8]>) {
        self.bytes += block.len();
        self.blocks.push(block);
    }

    /// Drop every block and give the backing storage back.
    pub fn release(&mut self) {
        self.blocks.clear();
        self.blocks.shrink_to_fit();
        self.bytes = 0;
    }
}

pub type SharedBallast = Arc<Mutex<Ballast>>;

pub(crate) fn lock(ballast: &Mutex<Ballast>) -> MutexGuard<'_, Ballast> {
    ballast.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Non-zero fill so the pages are actually resident.
fn allocate_block(unit_bytes: usize) -> Box<[u8]> {
    vec![b' '; unit_bytes].into_boxed_slice()
}

pub struct MemoryWorker {
    ballast: SharedBallast,
    unit_bytes: usize,
    cap_units: usize,
    step_interval: Duration,
    allocated: Arc<GaugeVec>,
}

impl MemoryWorker {
    pub fn new(
        ballast: SharedBallast,
        unit_bytes: usize,
        cap_units: usize,
        step_interval: Duration,
        allocated: Arc<GaugeVec>,
    ) -> Self {
        Self {
            ballast,
            unit_bytes,
            cap_units,
            step_interval,
            allocated,
        }
    }

    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(token))
    }

    async fn run(self, token: CancellationToken) {
        tracing::info!(
            unit_mb = self.unit_bytes / (1024 * 1024),
            cap_units = self.cap_units,
            "memory stress worker started"
        );

        // Leftovers from a previous cycle.
        {
            let mut ballast = lock(&self.ballast);
            if token.is_cancelled() {
                return;
            }
            ballast.release();
            self.allocated.set(&[], 0.0);
        }

        loop {
            if token.is_cancelled() {
                break;
            }
            if lock(&self.ballast).units() >= self.cap_units {
                // Retired: the kind stays active until an explicit stop.
                tracing::info!(units = self.cap_units, "memory stress cap reached");
                break;
            }

            let block = allocate_block(self.unit_bytes);
            let bytes = {
                let mut ballast = lock(&self.ballast);
                if token.is_cancelled() {
                    break;
                }
                ballast.push(block);
                self.allocated.set(&[], ballast.bytes() as f64);
                ballast.bytes()
            };
            tracing::info!(allocated_mb = bytes / (1024 * 1024), "memory allocated");

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.step_interval) => {}
            }
        }

        tracing::info!("memory stress worker finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obs::metrics::MetricsRegistry;

    #[test]
    fn release_resets_units_and_bytes() {
        let mut b = Ballast::default();
        b.push(allocate_block(1024));
        b.push(allocate_block(1024));
        assert_eq!(b.units(), 2);
        assert_eq!(b.bytes(), 2048);
        b.release();
        assert_eq!(b.units(), 0);
        assert_eq!(b.bytes(), 0);
    }

    #[tokio::test]
    async fn stops_at_cap_without_cancellation() {
        let reg = MetricsRegistry::new();
        let gauge = reg.gauge("alloc_bytes", "allocated", &[]).unwrap();
        let ballast = SharedBallast::default();
        let token = CancellationToken::new();

        let handle = MemoryWorker::new(Arc::clone(&ballast), 4096, 3, Duration::from_millis(1), Arc::clone(&gauge))
            .spawn(token.clone());
        handle.await.unwrap();

        assert!(!token.is_cancelled());
        assert_eq!(lock(&ballast).units(), 3);
        assert_eq!(gauge.get(&[]), Some(3.0 * 4096.0));
    }

    #[tokio::test]
    async fn cancelled_worker_appends_nothing() {
        let reg = MetricsRegistry::new();
        let gauge = reg.gauge("alloc_bytes", "allocated", &[]).unwrap();
        let ballast = SharedBallast::default();
        let token = CancellationToken::new();
        token.cancel();

        MemoryWorker::new(Arc::clone(&ballast), 4096, 3, Duration::from_millis(1), gauge)
            .spawn(token)
            .await
            .unwrap();
        assert_eq!(lock(&ballast).units(), 0);
    }
}
