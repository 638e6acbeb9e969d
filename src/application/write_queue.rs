use crate::application::oauth::TokenLifecycleManager;
use crate::application::status::StatusBoard;
use crate::domain::models::{LogEntry, PendingWriteRecord};
use crate::infrastructure::error::TrackerError;
use crate::infrastructure::local_storage::{load_json, save_json, LocalStorage, PENDING_WORKOUT_KEY};
use crate::infrastructure::sheets_gateway::{RemoteStoreGateway, WORKOUT_LOG_RANGE};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered { entry_count: usize },
    /// The record stays stored; it is replayed after the next sign-in.
    ReauthorizationRequested,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecoveryOutcome {
    NothingPending,
    Discarded { reason: String },
    Recovered { entry_count: usize },
    Deferred,
    Retained { reason: String },
}

/// Single-slot store for a finished workout that has not reached the remote
/// log yet. The record is written before any network attempt and removed only
/// after the append succeeds.
pub struct DurableWriteQueue {
    storage: Arc<dyn LocalStorage>,
    gateway: Arc<dyn RemoteStoreGateway>,
    tokens: Arc<TokenLifecycleManager>,
    status: Arc<StatusBoard>,
}

impl DurableWriteQueue {
    pub fn new(
        storage: Arc<dyn LocalStorage>,
        gateway: Arc<dyn RemoteStoreGateway>,
        tokens: Arc<TokenLifecycleManager>,
        status: Arc<StatusBoard>,
    ) -> Self {
        Self {
            storage,
            gateway,
            tokens,
            status,
        }
    }

    pub fn has_pending(&self) -> Result<bool, TrackerError> {
        Ok(self.storage.get(PENDING_WORKOUT_KEY)?.is_some())
    }

    pub fn pending(&self) -> Result<Option<PendingWriteRecord>, TrackerError> {
        load_json(self.storage.as_ref(), PENDING_WORKOUT_KEY)
    }

    pub fn persist(&self, record: &PendingWriteRecord) -> Result<(), TrackerError> {
        if self.has_pending()? {
            return Err(TrackerError::PendingWriteOutstanding("workout"));
        }
        save_json(self.storage.as_ref(), PENDING_WORKOUT_KEY, record)?;
        info!(
            routine = %record.routine_name,
            entries = record.entries.len(),
            "persisted pending workout"
        );
        Ok(())
    }

    pub async fn submit(
        &self,
        routine_name: &str,
        entries: Vec<LogEntry>,
    ) -> Result<DeliveryOutcome, TrackerError> {
        let record = PendingWriteRecord {
            routine_name: routine_name.to_string(),
            entries,
        };
        self.persist(&record)?;
        self.deliver(&record).await
    }

    /// Appends an already persisted record. Failures leave it stored.
    pub async fn deliver(&self, record: &PendingWriteRecord) -> Result<DeliveryOutcome, TrackerError> {
        let Some(access_token) = self.tokens.valid_access_token()? else {
            return Ok(DeliveryOutcome::ReauthorizationRequested);
        };
        let rows = record.entries.iter().map(LogEntry::to_row).collect::<Vec<_>>();

        match self.gateway.append(&access_token, WORKOUT_LOG_RANGE, rows).await {
            Ok(_) => {
                self.storage.remove(PENDING_WORKOUT_KEY)?;
                self.status.success("Workout saved successfully!");
                info!(entries = record.entries.len(), "delivered pending workout");
                Ok(DeliveryOutcome::Delivered {
                    entry_count: record.entries.len(),
                })
            }
            Err(TrackerError::AuthExpired) => {
                self.tokens
                    .handle_auth_expired("Session expired. Saving and reauthorizing...")?;
                Ok(DeliveryOutcome::ReauthorizationRequested)
            }
            Err(error) => {
                self.status.error(format!("Error saving workout: {error}"));
                Err(error)
            }
        }
    }

    /// Replays a stored record once. Safe to call repeatedly.
    pub async fn recover_on_startup(&self) -> Result<RecoveryOutcome, TrackerError> {
        let record = match self.pending() {
            Ok(None) => return Ok(RecoveryOutcome::NothingPending),
            Ok(Some(record)) if record.entries.is_empty() => {
                return self.discard("pending workout has no entries".to_string());
            }
            Ok(Some(record)) => record,
            Err(TrackerError::CorruptPendingState(reason)) => return self.discard(reason),
            Err(error) => return Err(error),
        };

        info!(
            routine = %record.routine_name,
            entries = record.entries.len(),
            "recovering pending workout"
        );
        match self.deliver(&record).await {
            Ok(DeliveryOutcome::Delivered { entry_count }) => {
                Ok(RecoveryOutcome::Recovered { entry_count })
            }
            Ok(DeliveryOutcome::ReauthorizationRequested) => Ok(RecoveryOutcome::Deferred),
            Err(error) => {
                self.status.error(format!(
                    "Could not save pending workout, will retry on next startup: {error}"
                ));
                Ok(RecoveryOutcome::Retained {
                    reason: error.to_string(),
                })
            }
        }
    }

    fn discard(&self, reason: String) -> Result<RecoveryOutcome, TrackerError> {
        warn!(%reason, "discarding corrupt pending workout");
        self.storage.remove(PENDING_WORKOUT_KEY)?;
        self.status.error("Discarded an unreadable pending workout");
        Ok(RecoveryOutcome::Discarded { reason })
    }
}
