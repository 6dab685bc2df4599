// src/entanglement/tracker.rs

//! Background decay thread.

use super::registry::PairRegistry;
use crate::core::{QuantumError, QuantumResult};
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

const THREAD_NAME: &str = "qstate-decay";

/// Owns the decay thread. Dropping the tracker stops and joins it.
#[derive(Debug)]
pub(crate) struct DecayTracker {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DecayTracker {
    /// Spawns the loop. Every `interval` it measures the real elapsed time and
    /// runs one decay step under the registry's write lock.
    pub fn spawn(
        registry: Arc<RwLock<PairRegistry>>,
        interval: Duration,
        eviction_threshold: f64,
    ) -> QuantumResult<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                info!("Decay tracking started (interval {:?})", interval);
                let mut last_tick = Instant::now();
                while !stop_flag.load(Ordering::Acquire) {
                    thread::park_timeout(interval);
                    if stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f64();
                    last_tick = now;

                    let step = panic::catch_unwind(AssertUnwindSafe(|| {
                        registry.write().apply_decay(dt, eviction_threshold)
                    }));
                    match step {
                        Ok(report) if !report.evicted.is_empty() => {
                            debug!("Decay step evicted {} pair(s)", report.evicted.len());
                        }
                        Ok(_) => {}
                        Err(_) => error!("Decay step panicked; continuing with next interval"),
                    }
                }
                info!("Decay tracking stopped");
            })
            .map_err(|e| QuantumError::TaskSpawn { message: e.to_string() })?;

        Ok(Self { stop, handle: Some(handle) })
    }

    /// Signals the loop, wakes it and joins. Idempotent.
    pub fn stop(&mut self) -> QuantumResult<()> {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            handle.join().map_err(|_| QuantumError::ThreadSafetyViolation {
                message: "decay thread terminated abnormally".to_string(),
            })?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for DecayTracker {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_is_idempotent() -> QuantumResult<()> {
        let registry = Arc::new(RwLock::new(PairRegistry::new()));
        let mut tracker = DecayTracker::spawn(registry, Duration::from_millis(5), 0.5)?;
        assert!(tracker.is_running());
        tracker.stop()?;
        assert!(!tracker.is_running());
        tracker.stop()?;
        Ok(())
    }
}
