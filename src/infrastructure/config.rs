use crate::infrastructure::error::TrackerError;
use crate::infrastructure::local_storage::{LocalStorage, CONFIG_KEY};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

const CONFIG_SCHEMA: u64 = 1;
pub const DEFAULT_REST_SECONDS: i64 = 90;
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialBackend {
    #[default]
    LocalStorage,
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub schema: u8,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: i64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub credential_backend: CredentialBackend,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
}

fn default_rest_seconds() -> i64 {
    DEFAULT_REST_SECONDS
}

fn default_redirect_uri() -> String {
    DEFAULT_REDIRECT_URI.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema: CONFIG_SCHEMA as u8,
            client_id: String::new(),
            spreadsheet_id: String::new(),
            default_rest_seconds: DEFAULT_REST_SECONDS,
            timezone: None,
            credential_backend: CredentialBackend::default(),
            redirect_uri: default_redirect_uri(),
        }
    }
}

impl AppConfig {
    pub fn is_complete(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.spreadsheet_id.trim().is_empty()
    }

    pub fn zone(&self) -> Result<LocalZone, TrackerError> {
        match self.timezone.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
            Some(name) => name
                .parse::<Tz>()
                .map(LocalZone::Named)
                .map_err(|error| TrackerError::InvalidConfig(format!("unknown timezone '{name}': {error}"))),
            None => Ok(LocalZone::System),
        }
    }
}

/// The zone used to decide which calendar day a timestamp belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalZone {
    System,
    Named(Tz),
}

impl LocalZone {
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::System => instant.with_timezone(&Local).date_naive(),
            Self::Named(tz) => instant.with_timezone(tz).date_naive(),
        }
    }

    /// Inclusive `[00:00:00.000, 23:59:59.999]` bounds of `date` in this zone.
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = date.and_time(NaiveTime::MIN);
        let end = start + Duration::milliseconds(86_399_999);
        match self {
            Self::System => (to_utc(&Local, start), to_utc(&Local, end)),
            Self::Named(tz) => (to_utc(tz, start), to_utc(tz, end)),
        }
    }
}

fn to_utc<Z: TimeZone>(zone: &Z, local: NaiveDateTime) -> DateTime<Utc> {
    zone.from_local_datetime(&local)
        .earliest()
        .map(|value| value.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

fn parse_config(raw: &str) -> Result<AppConfig, TrackerError> {
    let parsed: serde_json::Value = serde_json::from_str(raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| TrackerError::InvalidConfig("missing schema in stored config".to_string()))?;
    if schema != CONFIG_SCHEMA {
        return Err(TrackerError::InvalidConfig(format!(
            "unsupported schema {schema} in stored config"
        )));
    }
    Ok(serde_json::from_value(parsed)?)
}

pub fn load_config(storage: &dyn LocalStorage) -> Result<AppConfig, TrackerError> {
    match storage.get(CONFIG_KEY)? {
        Some(raw) => parse_config(&raw),
        None => Ok(AppConfig::default()),
    }
}

pub fn save_config(storage: &dyn LocalStorage, config: &AppConfig) -> Result<(), TrackerError> {
    if config.default_rest_seconds <= 0 {
        return Err(TrackerError::InvalidConfig(
            "defaultRestSeconds must be positive".to_string(),
        ));
    }
    config.zone()?;
    let formatted = serde_json::to_string_pretty(config)?;
    storage.set(CONFIG_KEY, &formatted)
}

pub fn clear_config(storage: &dyn LocalStorage) -> Result<(), TrackerError> {
    storage.remove(CONFIG_KEY)
}

/// Applies `WORKOUT_TRACKER_*` overrides on top of the stored config.
pub fn apply_overrides<F>(mut config: AppConfig, lookup: F) -> Result<AppConfig, TrackerError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(client_id) = optional_lookup_value(&lookup, &["WORKOUT_TRACKER_CLIENT_ID"]) {
        config.client_id = client_id;
    }
    if let Some(spreadsheet_id) =
        optional_lookup_value(&lookup, &["WORKOUT_TRACKER_SPREADSHEET_ID"])
    {
        config.spreadsheet_id = spreadsheet_id;
    }
    if let Some(raw) = optional_lookup_value(&lookup, &["WORKOUT_TRACKER_REST_SECONDS"]) {
        config.default_rest_seconds = raw
            .parse::<i64>()
            .ok()
            .filter(|seconds| *seconds > 0)
            .ok_or_else(|| {
                TrackerError::InvalidConfig(format!(
                    "WORKOUT_TRACKER_REST_SECONDS must be a positive integer, got '{raw}'"
                ))
            })?;
    }
    if let Some(timezone) = optional_lookup_value(&lookup, &["WORKOUT_TRACKER_TIMEZONE"]) {
        config.timezone = Some(timezone);
    }
    if let Some(redirect_uri) = optional_lookup_value(&lookup, &["WORKOUT_TRACKER_REDIRECT_URI"]) {
        config.redirect_uri = redirect_uri;
    }
    config.zone()?;
    Ok(config)
}

pub fn load_config_from_env(storage: &dyn LocalStorage) -> Result<AppConfig, TrackerError> {
    apply_overrides(load_config(storage)?, |key| std::env::var(key).ok())
}

fn optional_lookup_value<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    for key in keys {
        if let Some(value) = lookup(key) {
            let normalized = value.trim();
            if !normalized.is_empty() {
                return Some(normalized.to_string());
            }
        }
    }
    None
}
