//! Directory watch mode.
//!
//! A polling [`FileMonitor`](monitor::FileMonitor) runs on its own thread and
//! pushes new or modified manifests onto a work queue. The calling thread
//! drains the queue through [`Ingestor::ingest_file`](crate::ingest::Ingestor::ingest_file),
//! so the orchestrator itself knows nothing about watching.

pub(crate) mod config;
pub(crate) mod loop_impl;
pub(crate) mod monitor;

pub use config::{parse_duration, WatchConfig};
pub use loop_impl::{run_watch_loop, run_watch_loop_until};

/// Errors specific to the watch subsystem.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WatchError {
    #[error("invalid interval '{0}': expected format like 30s, 5m, 1h")]
    InvalidInterval(String),

    #[error("watch directory does not exist: {}", .0.display())]
    DirNotFound(std::path::PathBuf),

    #[error("no directories to watch")]
    NoDirectories,

    #[error("failed to start monitor thread: {0}")]
    Spawn(String),
}
