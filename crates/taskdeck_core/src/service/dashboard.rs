//! Periodic dashboard recomputation.
//!
//! # Responsibility
//! - Recompute stats on a fixed period for as long as a view holds the handle.
//!
//! # Invariants
//! - The first computation happens immediately on spawn.
//! - Dropping or cancelling the handle stops the loop and joins its thread;
//!   no callback runs after `cancel` returns.

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::repo::task_repo::TaskRepository;
use crate::service::session_service::IdentityProvider;
use crate::service::task_service::TaskService;
use crate::stats::aggregate::Stats;
use log::{debug, info, warn};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Anything that can produce a fresh stats snapshot.
pub trait StatsSource {
    fn stats(&self) -> Stats;
}

impl<R: TaskRepository, I: IdentityProvider, C: Clock> StatsSource for TaskService<R, I, C> {
    fn stats(&self) -> Stats {
        TaskService::stats(self)
    }
}

impl<F: Fn() -> Stats> StatsSource for F {
    fn stats(&self) -> Stats {
        self()
    }
}

/// Handle owning a running refresh loop.
pub struct DashboardRefresh {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl DashboardRefresh {
    /// Starts recomputing `source` every `interval`, feeding `on_stats`.
    pub fn spawn<S, F>(source: S, interval: Duration, mut on_stats: F) -> std::io::Result<Self>
    where
        S: StatsSource + Send + 'static,
        F: FnMut(Stats) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let worker = thread::Builder::new()
            .name("dashboard-refresh".to_string())
            .spawn(move || {
                let mut ticks: u64 = 0;
                loop {
                    on_stats(source.stats());
                    ticks += 1;
                    debug!("event=dashboard_refresh module=dashboard status=ok tick={ticks}");
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("event=dashboard_refresh module=dashboard status=stopped ticks={ticks}");
            })?;

        info!(
            "event=dashboard_refresh module=dashboard status=start interval_ms={}",
            interval.as_millis()
        );
        Ok(Self {
            stop: Some(stop_tx),
            worker: Some(worker),
        })
    }

    /// Same as [`DashboardRefresh::spawn`] with the configured interval.
    pub fn spawn_with_config<S, F>(
        source: S,
        config: &CoreConfig,
        on_stats: F,
    ) -> std::io::Result<Self>
    where
        S: StatsSource + Send + 'static,
        F: FnMut(Stats) + Send + 'static,
    {
        Self::spawn(source, config.refresh_interval(), on_stats)
    }

    /// Stops the loop and waits for the worker to exit. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("event=dashboard_refresh module=dashboard status=error error_code=worker_panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }
}

impl Drop for DashboardRefresh {
    fn drop(&mut self) {
        self.cancel();
    }
}
