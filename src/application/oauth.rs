use crate::application::status::StatusBoard;
use crate::application::NowProvider;
use crate::domain::models::TokenInfo;
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::TrackerError;
use crate::infrastructure::oauth_redirect::{build_authorization_url, parse_redirect_fragment};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Subtracted from `expires_in` so the token is refreshed before the provider
/// starts rejecting it.
pub const EXPIRY_BUFFER_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReauthorizationRequest {
    pub reason: String,
    pub authorization_url: String,
}

/// Hands control to the external authorization flow. The current process
/// instance is expected to end once this returns; nothing in memory survives.
pub trait Reauthorizer: Send + Sync {
    fn authorization_url(&self) -> Result<String, TrackerError>;
    fn reauthorize(&self, reason: &str) -> Result<(), TrackerError>;
}

/// Publishes the authorization URL to whoever owns the process lifecycle.
pub struct RedirectReauthorizer {
    client_id: String,
    redirect_uri: String,
    sender: mpsc::UnboundedSender<ReauthorizationRequest>,
}

impl RedirectReauthorizer {
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<ReauthorizationRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                client_id: client_id.into(),
                redirect_uri: redirect_uri.into(),
                sender,
            },
            receiver,
        )
    }
}

impl Reauthorizer for RedirectReauthorizer {
    fn authorization_url(&self) -> Result<String, TrackerError> {
        build_authorization_url(&self.client_id, &self.redirect_uri)
    }

    fn reauthorize(&self, reason: &str) -> Result<(), TrackerError> {
        let authorization_url = self.authorization_url()?;
        self.sender
            .send(ReauthorizationRequest {
                reason: reason.to_string(),
                authorization_url,
            })
            .map_err(|_| TrackerError::Credential("reauthorization listener is gone".to_string()))
    }
}

pub struct TokenLifecycleManager {
    credential_store: Arc<dyn CredentialStore>,
    reauthorizer: Arc<dyn Reauthorizer>,
    status: Arc<StatusBoard>,
    now_provider: NowProvider,
}

impl TokenLifecycleManager {
    pub fn new(
        credential_store: Arc<dyn CredentialStore>,
        reauthorizer: Arc<dyn Reauthorizer>,
        status: Arc<StatusBoard>,
    ) -> Self {
        Self {
            credential_store,
            reauthorizer,
            status,
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn is_expired(&self) -> Result<bool, TrackerError> {
        Ok(match self.credential_store.load_token()? {
            Some(token) => token.is_expired_at((self.now_provider)()),
            None => true,
        })
    }

    pub fn install(&self, access_token: &str, expires_in_seconds: i64) -> Result<TokenInfo, TrackerError> {
        if access_token.trim().is_empty() {
            return Err(TrackerError::Validation(
                "access token must not be empty".to_string(),
            ));
        }
        let expires_at = Duration::try_seconds(expires_in_seconds.max(0) - EXPIRY_BUFFER_SECONDS)
            .and_then(|lifetime| (self.now_provider)().checked_add_signed(lifetime))
            .ok_or_else(|| {
                TrackerError::Validation(format!(
                    "token lifetime of {expires_in_seconds} seconds is out of range"
                ))
            })?;
        let token = TokenInfo {
            access_token: access_token.trim().to_string(),
            expires_at_epoch_millis: expires_at.timestamp_millis(),
        };
        self.credential_store.save_token(&token)?;
        info!(expires_at = token.expires_at_epoch_millis, "installed access token");
        Ok(token)
    }

    /// Installs the token carried by an authorization redirect, if any.
    pub fn consume_redirect(&self, redirect: &str) -> Result<Option<TokenInfo>, TrackerError> {
        match parse_redirect_fragment(redirect)? {
            Some(token) => self.install(&token.access_token, token.expires_in).map(Some),
            None => Ok(None),
        }
    }

    pub fn clear(&self) -> Result<(), TrackerError> {
        self.credential_store.delete_token()
    }

    pub fn authorization_url(&self) -> Result<String, TrackerError> {
        self.reauthorizer.authorization_url()
    }

    pub fn sign_out(&self) -> Result<(), TrackerError> {
        self.clear()?;
        info!("signed out");
        Ok(())
    }

    /// Returns `false` after starting re-authorization when the token is
    /// missing or expired; callers must abort without touching the network.
    pub fn ensure_valid(&self) -> Result<bool, TrackerError> {
        if !self.is_expired()? {
            return Ok(true);
        }
        self.clear()?;
        self.request_reauthorization("Session expired. Please sign in again.");
        Ok(false)
    }

    /// The current access token, or `None` once re-authorization has started.
    pub fn valid_access_token(&self) -> Result<Option<String>, TrackerError> {
        if !self.ensure_valid()? {
            return Ok(None);
        }
        Ok(self
            .credential_store
            .load_token()?
            .map(|token| token.access_token))
    }

    /// Reacts to the gateway rejecting the token mid-operation.
    pub fn handle_auth_expired(&self, message: &str) -> Result<(), TrackerError> {
        self.clear()?;
        self.request_reauthorization(message);
        Ok(())
    }

    fn request_reauthorization(&self, message: &str) {
        self.status.error(message);
        if let Err(error) = self.reauthorizer.reauthorize(message) {
            warn!(%error, "failed to start reauthorization");
            self.status.error(format!("Could not start sign-in: {error}"));
        }
    }
}
