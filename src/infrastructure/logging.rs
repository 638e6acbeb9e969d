use crate::infrastructure::error::TrackerError;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "tracker.jsonl";
pub const LOG_FILTER_ENV: &str = "WORKOUT_TRACKER_LOG";
const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber: one JSON object per line, appended to
/// `logs/tracker.jsonl`. Can only succeed once per process.
pub fn init_logging(logs_dir: &Path) -> Result<(), TrackerError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(logs_dir.join(LOG_FILE_NAME))?;
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|error| TrackerError::InvalidConfig(format!("failed to initialize logging: {error}")))
}
