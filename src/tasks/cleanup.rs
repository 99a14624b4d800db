//! Periodic Cleanup Task
//!
//! Background task that periodically sweeps expired state out of caches and
//! rate limiters.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::limiter::SharedRateLimiter;

// == Sweep Trait ==
/// State that can drop its expired records in one synchronous pass.
pub trait Sweep {
    /// Removes expired records, returning how many were dropped.
    fn sweep(&mut self) -> usize;

    /// Short name used in log lines.
    const LABEL: &'static str;
}

// == Cleanup Handle ==
/// Owner of a running sweep task.
///
/// The task stops when [`CleanupHandle::dispose`] is called or when the
/// handle is dropped.
#[derive(Debug)]
pub struct CleanupHandle {
    handle: JoinHandle<()>,
    label: &'static str,
}

impl CleanupHandle {
    /// Cancels the sweep task. Calling it again is a no-op.
    pub fn dispose(&self) {
        if !self.handle.is_finished() {
            self.handle.abort();
            debug!(task = self.label, "cleanup task disposed");
        }
    }

    /// True once the task has stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Label of the state this task sweeps.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl Drop for CleanupHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns a background task that periodically sweeps `target`.
///
/// The task sleeps for `interval_ms`, takes the write lock and sweeps
/// without awaiting anything while the lock is held. A zero interval is
/// treated as 1 ms; configuration layers reject it before it gets here.
/// Must be called from within a tokio runtime.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(TtlCache::<String>::new(CacheConfig::default())?));
/// let cleanup = spawn_cleanup_task(cache.clone(), 60_000);
/// // Later, during shutdown:
/// cleanup.dispose();
/// ```
pub fn spawn_cleanup_task<S>(target: Arc<RwLock<S>>, interval_ms: u64) -> CleanupHandle
where
    S: Sweep + Send + Sync + 'static,
{
    spawn_sweeps(vec![target], interval_ms)
}

/// Spawns one task that sweeps every limiter in `limiters` on each tick.
pub fn spawn_limiter_cleanup(limiters: &[SharedRateLimiter], interval_ms: u64) -> CleanupHandle {
    let targets = limiters.iter().map(SharedRateLimiter::inner).collect();
    spawn_sweeps(targets, interval_ms)
}

fn spawn_sweeps<S>(targets: Vec<Arc<RwLock<S>>>, interval_ms: u64) -> CleanupHandle
where
    S: Sweep + Send + Sync + 'static,
{
    let label = S::LABEL;
    let interval = Duration::from_millis(interval_ms.max(1));

    let handle = tokio::spawn(async move {
        info!(
            task = label,
            targets = targets.len(),
            "Starting cleanup task with interval of {} ms",
            interval_ms
        );

        loop {
            tokio::time::sleep(interval).await;

            let mut removed = 0;
            for target in &targets {
                let mut guard = target.write().await;
                removed += guard.sweep();
            }

            if removed > 0 {
                info!(task = label, "cleanup: removed {} expired records", removed);
            } else {
                debug!(task = label, "cleanup: nothing expired");
            }
        }
    });

    CleanupHandle { handle, label }
}
