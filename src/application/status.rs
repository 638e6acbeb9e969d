use crate::application::NowProvider;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};

const AUTO_DISMISS_SECONDS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub message: String,
    pub posted_at: DateTime<Utc>,
}

/// Latest user-facing status line. Each message disappears on its own after
/// a few seconds and is mirrored into the structured log.
pub struct StatusBoard {
    current: Mutex<Option<StatusMessage>>,
    now_provider: NowProvider,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self {
            current: Mutex::new(None),
            now_provider: Arc::new(Utc::now),
        }
    }
}

impl StatusBoard {
    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn post(&self, kind: StatusKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            StatusKind::Error => tracing::warn!(status = %message, "status"),
            _ => tracing::info!(status = %message, "status"),
        }
        let Ok(mut current) = self.current.lock() else {
            return;
        };
        *current = Some(StatusMessage {
            kind,
            message,
            posted_at: (self.now_provider)(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.post(StatusKind::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.post(StatusKind::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.post(StatusKind::Error, message);
    }

    pub fn current(&self) -> Option<StatusMessage> {
        let now = (self.now_provider)();
        let current = self.current.lock().ok()?;
        current
            .as_ref()
            .filter(|status| now - status.posted_at < Duration::seconds(AUTO_DISMISS_SECONDS))
            .cloned()
    }
}
