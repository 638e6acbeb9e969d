use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Credential store error: {0}")]
    Credential(String),
    #[error("authorization expired")]
    AuthExpired,
    #[error("Remote store error: {0}")]
    Transport(String),
    #[error("no completed sets to save")]
    EmptySession,
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Corrupt pending state: {0}")]
    CorruptPendingState(String),
    #[error("a previous {0} is still waiting to be saved")]
    PendingWriteOutstanding(&'static str),
    #[error("set {set_index} does not exist for {key}")]
    UnknownSet { key: String, set_index: usize },
    #[error("Not found: {0}")]
    NotFound(String),
}
