use crate::domain::models::TokenInfo;
use crate::infrastructure::error::TrackerError;
use crate::infrastructure::local_storage::{load_json, save_json, LocalStorage, TOKEN_KEY};
use std::sync::Arc;

pub trait CredentialStore: Send + Sync {
    fn save_token(&self, token: &TokenInfo) -> Result<(), TrackerError>;
    fn load_token(&self) -> Result<Option<TokenInfo>, TrackerError>;
    fn delete_token(&self) -> Result<(), TrackerError>;
}

/// Keeps the token next to the other durable records.
#[derive(Clone)]
pub struct LocalStorageCredentialStore {
    storage: Arc<dyn LocalStorage>,
}

impl LocalStorageCredentialStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }
}

impl CredentialStore for LocalStorageCredentialStore {
    fn save_token(&self, token: &TokenInfo) -> Result<(), TrackerError> {
        save_json(self.storage.as_ref(), TOKEN_KEY, token)
    }

    fn load_token(&self) -> Result<Option<TokenInfo>, TrackerError> {
        match load_json::<TokenInfo>(self.storage.as_ref(), TOKEN_KEY) {
            Ok(token) => Ok(token),
            Err(TrackerError::CorruptPendingState(message)) => {
                tracing::warn!(%message, "discarding unreadable stored token");
                self.storage.remove(TOKEN_KEY)?;
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    fn delete_token(&self) -> Result<(), TrackerError> {
        self.storage.remove(TOKEN_KEY)
    }
}

pub const KEYRING_SERVICE: &str = "workout-tracker.oauth.google";
pub const KEYRING_ACCOUNT: &str = "default";

/// Keeps the token in the OS credential manager. Unreadable payloads are
/// dropped the same way as in local storage.
pub struct KeyringCredentialStore {
    entry: keyring::Entry,
}

impl KeyringCredentialStore {
    pub fn open(service_name: &str, account_name: &str) -> Result<Self, TrackerError> {
        let entry = keyring::Entry::new(service_name, account_name).map_err(keyring_error)?;
        Ok(Self { entry })
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn save_token(&self, token: &TokenInfo) -> Result<(), TrackerError> {
        let payload = serde_json::to_string(token)?;
        self.entry.set_password(&payload).map_err(keyring_error)
    }

    fn load_token(&self) -> Result<Option<TokenInfo>, TrackerError> {
        let payload = match self.entry.get_password() {
            Ok(payload) => payload,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(error) => return Err(keyring_error(error)),
        };
        match serde_json::from_str::<TokenInfo>(&payload) {
            Ok(token) => Ok(Some(token)),
            Err(error) => {
                tracing::warn!(%error, "discarding unreadable keyring token");
                self.delete_token()?;
                Ok(None)
            }
        }
    }

    fn delete_token(&self) -> Result<(), TrackerError> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(keyring_error(error)),
        }
    }
}

fn keyring_error(error: keyring::Error) -> TrackerError {
    TrackerError::Credential(error.to_string())
}
