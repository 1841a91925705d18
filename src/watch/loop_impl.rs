//! Watch loop: a monitor thread feeding a work queue drained by the
//! ingestor.

use super::config::WatchConfig;
use super::monitor::FileMonitor;
use super::WatchError;
use crate::ingest::{IngestReport, Ingestor};
use crate::store::StoreSession;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Granularity at which sleeping threads notice the stop flag.
const STOP_CHECK: Duration = Duration::from_millis(100);

/// Run the watch loop until Ctrl-C (or, with `once`, after one scan).
pub fn run_watch_loop<S: StoreSession>(
    config: &WatchConfig,
    ingestor: &Ingestor<S>,
) -> Result<IngestReport, WatchError> {
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop_flag = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            stop_flag.store(true, Ordering::Relaxed);
        })
        .ok(); // Non-fatal if handler cannot be installed
    }
    run_watch_loop_until(config, ingestor, &stop)
}

/// Run the watch loop until `stop` is raised.
///
/// Queued paths are ingested in arrival order; whatever is already queued
/// when `stop` is raised is still processed.
pub fn run_watch_loop_until<S: StoreSession>(
    config: &WatchConfig,
    ingestor: &Ingestor<S>,
    stop: &AtomicBool,
) -> Result<IngestReport, WatchError> {
    config.validate()?;
    let start = Instant::now();
    let (tx, rx) = mpsc::channel::<PathBuf>();
    let monitor = FileMonitor::new(config.watch_dirs.clone(), ingestor.options().filter.clone());

    tracing::info!(
        "Watching {} dir(s) (poll: {:?}, debounce: {:?})",
        config.watch_dirs.len(),
        config.poll_interval,
        config.debounce
    );

    let mut report = IngestReport::new();
    std::thread::scope(|scope| {
        std::thread::Builder::new()
            .name("threat-db-monitor".to_string())
            .spawn_scoped(scope, || produce(monitor, config, stop, tx))
            .map_err(|e| WatchError::Spawn(e.to_string()))?;

        loop {
            match rx.recv_timeout(STOP_CHECK) {
                Ok(path) => {
                    let (outcome, removed) = ingestor.process_file(&path);
                    if outcome.is_failure() {
                        tracing::warn!("{}: {}", path.display(), outcome);
                    } else {
                        tracing::info!("{}: {}", path.display(), outcome);
                    }
                    report.discovered += 1;
                    report.record(path, outcome, removed);
                }
                Err(RecvTimeoutError::Timeout) => {}
                // The producer hung up: stop requested or single scan done.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        Ok::<(), WatchError>(())
    })?;

    report.duration = start.elapsed();
    Ok(report)
}

/// Monitor thread body. Dropping `tx` on return closes the queue.
fn produce(mut monitor: FileMonitor, config: &WatchConfig, stop: &AtomicBool, tx: Sender<PathBuf>) {
    let mut first = true;
    loop {
        if !first && !sleep_unless_stopped(config.poll_interval, stop) {
            return;
        }

        let mut changes = monitor.poll();
        // Coalesce rapid writes; the initial scan takes files as they are.
        if !first && !changes.is_empty() && !config.debounce.is_zero() {
            if !sleep_unless_stopped(config.debounce, stop) {
                return;
            }
            for change in monitor.poll() {
                if !changes.contains(&change) {
                    changes.push(change);
                }
            }
        }
        first = false;

        let mut queued: Vec<&std::path::Path> = Vec::new();
        for path in changes.iter().filter_map(|c| c.ingestible()) {
            if queued.contains(&path) {
                continue;
            }
            queued.push(path);
            if tx.send(path.to_path_buf()).is_err() {
                return;
            }
        }
        if !queued.is_empty() {
            tracing::debug!(
                queued = queued.len(),
                tracked = monitor.tracked_count(),
                "queued manifest changes"
            );
        }

        if config.once || stop.load(Ordering::Relaxed) {
            return;
        }
    }
}

/// Sleep for `total`, waking early if `stop` is raised. Returns false when
/// stopped.
fn sleep_unless_stopped(total: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(STOP_CHECK.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_unless_stopped() {
        let stop = AtomicBool::new(true);
        assert!(!sleep_unless_stopped(Duration::from_secs(60), &stop));

        let stop = AtomicBool::new(false);
        assert!(sleep_unless_stopped(Duration::from_millis(1), &stop));
    }
}
