use crate::application::oauth::TokenLifecycleManager;
use crate::application::status::StatusBoard;
use crate::application::NowProvider;
use crate::domain::models::{CalorieEntry, PendingCalorieEntry};
use crate::infrastructure::config::LocalZone;
use crate::infrastructure::error::TrackerError;
use crate::infrastructure::local_storage::{load_json, save_json, LocalStorage, PENDING_CALORIE_KEY};
use crate::infrastructure::sheets_gateway::{
    first_row_of_range, row_range, RemoteStoreGateway, CALORIE_LOG_RANGE,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartPeriod {
    Week,
    Month,
    ThreeMonths,
}

impl ChartPeriod {
    pub fn days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::ThreeMonths => 90,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Week => "Last 7 Days",
            Self::Month => "Last 30 Days",
            Self::ThreeMonths => "Last 3 Months",
        }
    }

    pub fn parse(value: &str) -> Result<Self, TrackerError> {
        match value.trim() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "3months" | "three_months" => Ok(Self::ThreeMonths),
            other => Err(TrackerError::Validation(format!("unknown chart period '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub calories: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AddOutcome {
    Added { entry: CalorieEntry },
    ReauthorizationRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RemoveOutcome {
    Removed,
    ReauthorizationRequested,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CalorieRecovery {
    NothingPending,
    Discarded { reason: String },
    Recovered { entry: CalorieEntry },
    Deferred,
    Retained { reason: String },
}

/// Parses `CalorieLog` rows. Row `N` of the sheet is `rows[N - 1]`; the header
/// occupies row 1. Cleared rows are skipped without shifting later indices.
pub fn parse_calorie_rows(rows: &[Vec<String>]) -> Vec<CalorieEntry> {
    rows.iter()
        .enumerate()
        .skip(1)
        .filter_map(|(position, row)| {
            let row_index = position as u32 + 1;
            if row.iter().all(|cell| cell.trim().is_empty()) {
                return None;
            }
            match parse_calorie_row(row, row_index) {
                Ok(entry) => Some(entry),
                Err(reason) => {
                    debug!(row = row_index, %reason, "skipping calorie row");
                    None
                }
            }
        })
        .collect()
}

fn parse_calorie_row(row: &[String], row_index: u32) -> Result<CalorieEntry, String> {
    let cell = |index: usize| row.get(index).map(|value| value.trim()).unwrap_or_default();
    let timestamp = DateTime::parse_from_rfc3339(cell(1))
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| format!("invalid timestamp '{}': {error}", cell(1)))?;
    let calories = cell(3)
        .parse::<f64>()
        .map_err(|_| format!("invalid calories '{}'", cell(3)))?
        .round() as i64;
    let id = match cell(0) {
        "" => format!("entry-{row_index}"),
        id => id.to_string(),
    };
    Ok(CalorieEntry {
        id,
        timestamp,
        description: cell(2).to_string(),
        calories,
        remote_row_index: Some(row_index),
    })
}

/// Meal log kept in memory and mirrored to the `CalorieLog` range.
pub struct CalorieLogAggregator {
    entries: Mutex<Vec<CalorieEntry>>,
    storage: Arc<dyn LocalStorage>,
    gateway: Arc<dyn RemoteStoreGateway>,
    tokens: Arc<TokenLifecycleManager>,
    status: Arc<StatusBoard>,
    zone: LocalZone,
    now_provider: NowProvider,
}

impl CalorieLogAggregator {
    pub fn new(
        storage: Arc<dyn LocalStorage>,
        gateway: Arc<dyn RemoteStoreGateway>,
        tokens: Arc<TokenLifecycleManager>,
        status: Arc<StatusBoard>,
        zone: LocalZone,
    ) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            storage,
            gateway,
            tokens,
            status,
            zone,
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn load(&self, rows: &[Vec<String>]) -> Result<usize, TrackerError> {
        let parsed = parse_calorie_rows(rows);
        let count = parsed.len();
        *self.lock_entries()? = parsed;
        info!(entries = count, "loaded calorie log");
        Ok(count)
    }

    pub fn entries(&self) -> Result<Vec<CalorieEntry>, TrackerError> {
        Ok(self.lock_entries()?.clone())
    }

    pub fn has_pending(&self) -> Result<bool, TrackerError> {
        Ok(self.storage.get(PENDING_CALORIE_KEY)?.is_some())
    }

    pub async fn add(&self, description: &str, calories: i64) -> Result<AddOutcome, TrackerError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TrackerError::Validation("description must not be empty".to_string()));
        }
        if calories <= 0 {
            return Err(TrackerError::Validation(format!(
                "calories must be positive, got {calories}"
            )));
        }
        if self.has_pending()? {
            return Err(TrackerError::PendingWriteOutstanding("calorie entry"));
        }

        let now = (self.now_provider)();
        let pending = PendingCalorieEntry {
            id: format!("entry-{}", now.timestamp_millis()),
            timestamp: now,
            description: description.to_string(),
            calories,
        };
        save_json(self.storage.as_ref(), PENDING_CALORIE_KEY, &pending)?;
        self.deliver(pending).await
    }

    async fn deliver(&self, pending: PendingCalorieEntry) -> Result<AddOutcome, TrackerError> {
        let Some(access_token) = self.tokens.valid_access_token()? else {
            return Ok(AddOutcome::ReauthorizationRequested);
        };
        let result = self
            .gateway
            .append(&access_token, CALORIE_LOG_RANGE, vec![pending.to_row()])
            .await;

        match result {
            Ok(appended) => {
                let row_index = appended.updated_range.as_deref().and_then(first_row_of_range);
                if row_index.is_none() {
                    warn!(
                        entry_id = %pending.id,
                        updated_range = ?appended.updated_range,
                        "could not read row of appended calorie entry; it will not be deletable"
                    );
                }
                self.storage.remove(PENDING_CALORIE_KEY)?;
                let entry = pending.into_entry(row_index);
                self.lock_entries()?.push(entry.clone());
                self.status.success("Entry added");
                info!(entry_id = %entry.id, calories = entry.calories, row = ?row_index, "added calorie entry");
                Ok(AddOutcome::Added { entry })
            }
            Err(TrackerError::AuthExpired) => {
                self.tokens
                    .handle_auth_expired("Session expired. Saving entry and reauthorizing...")?;
                Ok(AddOutcome::ReauthorizationRequested)
            }
            Err(error) => {
                self.status.error(format!("Error adding entry: {error}"));
                Err(error)
            }
        }
    }

    /// Clears the entry's sheet row, then drops it locally. Other entries keep
    /// their row indices.
    pub async fn remove(&self, entry_id: &str) -> Result<RemoveOutcome, TrackerError> {
        let row_index = {
            let entries = self.lock_entries()?;
            let entry = entries
                .iter()
                .find(|entry| entry.id == entry_id)
                .ok_or_else(|| TrackerError::NotFound(format!("calorie entry {entry_id}")))?;
            entry.remote_row_index.ok_or_else(|| {
                TrackerError::Validation(format!("calorie entry {entry_id} has no known row"))
            })?
        };
        let Some(access_token) = self.tokens.valid_access_token()? else {
            return Ok(RemoveOutcome::ReauthorizationRequested);
        };

        let range = row_range(CALORIE_LOG_RANGE, row_index, 'A', 'D');
        match self.gateway.clear(&access_token, &range).await {
            Ok(()) => {
                self.lock_entries()?.retain(|entry| entry.id != entry_id);
                self.status.success("Entry deleted");
                info!(entry_id, range = %range, "removed calorie entry");
                Ok(RemoveOutcome::Removed)
            }
            Err(TrackerError::AuthExpired) => {
                self.tokens
                    .handle_auth_expired("Session expired. Please sign in again.")?;
                Ok(RemoveOutcome::ReauthorizationRequested)
            }
            Err(error) => {
                self.status.error(format!("Error deleting entry: {error}"));
                Err(error)
            }
        }
    }

    /// Replays a calorie entry left behind by an interrupted add.
    pub async fn recover_pending(&self) -> Result<CalorieRecovery, TrackerError> {
        let pending = match load_json::<PendingCalorieEntry>(self.storage.as_ref(), PENDING_CALORIE_KEY) {
            Ok(None) => return Ok(CalorieRecovery::NothingPending),
            Ok(Some(pending)) => pending,
            Err(TrackerError::CorruptPendingState(reason)) => {
                warn!(%reason, "discarding corrupt pending calorie entry");
                self.storage.remove(PENDING_CALORIE_KEY)?;
                return Ok(CalorieRecovery::Discarded { reason });
            }
            Err(error) => return Err(error),
        };

        match self.deliver(pending).await {
            Ok(AddOutcome::Added { entry }) => Ok(CalorieRecovery::Recovered { entry }),
            Ok(AddOutcome::ReauthorizationRequested) => Ok(CalorieRecovery::Deferred),
            Err(error) => Ok(CalorieRecovery::Retained {
                reason: error.to_string(),
            }),
        }
    }

    /// One bucket per calendar day in `[today - window_days + 1, today]`,
    /// oldest first; days without entries are zero.
    pub fn daily_totals(&self, window_days: u32) -> Result<Vec<DailyTotal>, TrackerError> {
        let today = self.today();
        let mut buckets = BTreeMap::new();
        for offset in 0..i64::from(window_days) {
            buckets.insert(today - Duration::days(offset), 0_i64);
        }
        for entry in self.lock_entries()?.iter() {
            if let Some(total) = buckets.get_mut(&self.zone.date_of(entry.timestamp)) {
                *total += entry.calories;
            }
        }
        Ok(buckets
            .into_iter()
            .map(|(date, calories)| DailyTotal { date, calories })
            .collect())
    }

    pub fn today_total(&self) -> Result<i64, TrackerError> {
        Ok(self.today_entries()?.iter().map(|entry| entry.calories).sum())
    }

    /// Entries inside today's inclusive bounds, most recent first.
    pub fn today_entries(&self) -> Result<Vec<CalorieEntry>, TrackerError> {
        let (start, end) = self.zone.day_bounds(self.today());
        let mut today = self
            .lock_entries()?
            .iter()
            .filter(|entry| entry.timestamp >= start && entry.timestamp <= end)
            .cloned()
            .collect::<Vec<_>>();
        today.sort_by(|left, right| right.timestamp.cmp(&left.timestamp));
        Ok(today)
    }

    /// Mean daily intake over the days in `period` that have at least one entry.
    pub fn daily_average(&self, period: ChartPeriod) -> Result<i64, TrackerError> {
        let totals = self.daily_totals(period.days())?;
        let Some(first_day) = totals.first().map(|total| total.date) else {
            return Ok(0);
        };
        let days_with_data = self
            .lock_entries()?
            .iter()
            .map(|entry| self.zone.date_of(entry.timestamp))
            .filter(|date| *date >= first_day && *date <= self.today())
            .collect::<BTreeSet<_>>();
        if days_with_data.is_empty() {
            return Ok(0);
        }
        let sum: i64 = totals.iter().map(|total| total.calories).sum();
        Ok((sum as f64 / days_with_data.len() as f64).round() as i64)
    }

    fn today(&self) -> NaiveDate {
        self.zone.date_of((self.now_provider)())
    }

    fn lock_entries(&self) -> Result<MutexGuard<'_, Vec<CalorieEntry>>, TrackerError> {
        self.entries
            .lock()
            .map_err(|error| TrackerError::InvalidConfig(format!("calorie log lock poisoned: {error}")))
    }
}
