use crate::application::bootstrap::{bootstrap_workspace, BootstrapResult};
use crate::application::calories::{
    AddOutcome, CalorieLogAggregator, CalorieRecovery, ChartPeriod, DailyTotal, RemoveOutcome,
};
use crate::application::oauth::{
    ReauthorizationRequest, Reauthorizer, RedirectReauthorizer, TokenLifecycleManager,
};
use crate::application::previous_performance::PreviousPerformanceIndex;
use crate::application::rest_timer::{
    spawn_rest_timer, LogCompletionAlert, RestTimerHandle, TimerEvent,
};
use crate::application::session::{
    parse_routines, ExerciseView, SessionCommand, SessionEvent, WorkoutSessionEngine,
};
use crate::application::status::{StatusBoard, StatusMessage};
use crate::application::write_queue::{DeliveryOutcome, DurableWriteQueue, RecoveryOutcome};
use crate::application::NowProvider;
use crate::domain::models::{CalorieEntry, ExerciseKey, SetField};
use crate::infrastructure::config::{
    clear_config, load_config_from_env, save_config, AppConfig, CredentialBackend, LocalZone,
};
use crate::infrastructure::credential_store::{
    CredentialStore, KeyringCredentialStore, LocalStorageCredentialStore, KEYRING_ACCOUNT,
    KEYRING_SERVICE,
};
use crate::infrastructure::error::TrackerError;
use crate::infrastructure::local_storage::{LocalStorage, SqliteLocalStorage};
use crate::infrastructure::sheets_gateway::{
    RemoteStoreGateway, ReqwestSheetsGateway, CALORIE_LOG_RANGE, ROUTINES_RANGE, WORKOUT_LOG_RANGE,
};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Owns every component of a running tracker. Created once per process; the
/// only state that outlives it is what was written to local storage.
pub struct AppState {
    logs_dir: PathBuf,
    config: AppConfig,
    zone: LocalZone,
    storage: Arc<dyn LocalStorage>,
    gateway: Arc<dyn RemoteStoreGateway>,
    status: Arc<StatusBoard>,
    tokens: Arc<TokenLifecycleManager>,
    queue: DurableWriteQueue,
    calories: CalorieLogAggregator,
    session: Mutex<WorkoutSessionEngine>,
    previous: Mutex<PreviousPerformanceIndex>,
    timer: Mutex<Option<RestTimerHandle>>,
    timer_events: Mutex<Option<mpsc::UnboundedReceiver<TimerEvent>>>,
    reauthorization_requests: Mutex<Option<mpsc::UnboundedReceiver<ReauthorizationRequest>>>,
    now_provider: NowProvider,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, TrackerError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let storage: Arc<dyn LocalStorage> = Arc::new(SqliteLocalStorage::new(&bootstrap.database_path));
        let config = load_config_from_env(storage.as_ref())?;
        let gateway = Arc::new(ReqwestSheetsGateway::new(config.spreadsheet_id.clone()));
        let (reauthorizer, requests) =
            RedirectReauthorizer::new(config.client_id.clone(), config.redirect_uri.clone());

        Self::assemble(
            bootstrap,
            storage,
            config,
            gateway,
            Arc::new(reauthorizer),
            Some(requests),
        )
    }

    /// Builds the context around caller-supplied collaborators. Local storage
    /// is still the workspace database.
    pub fn with_components(
        workspace_root: PathBuf,
        config: AppConfig,
        gateway: Arc<dyn RemoteStoreGateway>,
        reauthorizer: Arc<dyn Reauthorizer>,
    ) -> Result<Self, TrackerError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let storage: Arc<dyn LocalStorage> = Arc::new(SqliteLocalStorage::new(&bootstrap.database_path));
        Self::assemble(bootstrap, storage, config, gateway, reauthorizer, None)
    }

    fn assemble(
        bootstrap: BootstrapResult,
        storage: Arc<dyn LocalStorage>,
        config: AppConfig,
        gateway: Arc<dyn RemoteStoreGateway>,
        reauthorizer: Arc<dyn Reauthorizer>,
        reauthorization_requests: Option<mpsc::UnboundedReceiver<ReauthorizationRequest>>,
    ) -> Result<Self, TrackerError> {
        let zone = config.zone()?;
        let credential_store: Arc<dyn CredentialStore> = match config.credential_backend {
            CredentialBackend::LocalStorage => {
                Arc::new(LocalStorageCredentialStore::new(Arc::clone(&storage)))
            }
            CredentialBackend::Keyring => {
                Arc::new(KeyringCredentialStore::open(KEYRING_SERVICE, KEYRING_ACCOUNT)?)
            }
        };
        let status = Arc::new(StatusBoard::default());
        let tokens = Arc::new(TokenLifecycleManager::new(
            credential_store,
            reauthorizer,
            Arc::clone(&status),
        ));
        let queue = DurableWriteQueue::new(
            Arc::clone(&storage),
            Arc::clone(&gateway),
            Arc::clone(&tokens),
            Arc::clone(&status),
        );
        let calories = CalorieLogAggregator::new(
            Arc::clone(&storage),
            Arc::clone(&gateway),
            Arc::clone(&tokens),
            Arc::clone(&status),
            zone,
        );

        Ok(Self {
            logs_dir: bootstrap.logs_dir,
            session: Mutex::new(WorkoutSessionEngine::new(Vec::new(), config.default_rest_seconds)),
            config,
            zone,
            storage,
            gateway,
            status,
            tokens,
            queue,
            calories,
            previous: Mutex::new(PreviousPerformanceIndex::default()),
            timer: Mutex::new(None),
            timer_events: Mutex::new(None),
            reauthorization_requests: Mutex::new(reauthorization_requests),
            now_provider: Arc::new(Utc::now),
        })
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenLifecycleManager {
        &self.tokens
    }

    /// Requests published by the redirect reauthorizer; `None` once taken or
    /// when the context was built with an injected reauthorizer.
    pub fn take_reauthorization_requests(
        &self,
    ) -> Option<mpsc::UnboundedReceiver<ReauthorizationRequest>> {
        self.reauthorization_requests
            .lock()
            .ok()
            .and_then(|mut requests| requests.take())
    }

    pub fn take_timer_events(&self) -> Option<mpsc::UnboundedReceiver<TimerEvent>> {
        self.timer_events.lock().ok().and_then(|mut events| events.take())
    }

    pub fn command_error(&self, command: &str, error: &TrackerError) -> String {
        error!(command, %error, "command failed");
        error.to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartupSummary {
    pub authorized: bool,
    pub signed_in_from_redirect: bool,
    pub routines: Vec<String>,
    pub history_entries: usize,
    pub calorie_entries: usize,
    pub today_calories: i64,
    pub workout_recovery: Option<RecoveryOutcome>,
    pub calorie_recovery: Option<CalorieRecovery>,
    pub status: Option<StatusMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinishWorkoutResponse {
    pub routine_name: String,
    pub entry_count: usize,
    pub delivery: DeliveryOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalorieSummaryResponse {
    pub period: ChartPeriod,
    pub label: String,
    pub today_total: i64,
    pub today_entries: Vec<CalorieEntry>,
    pub daily_totals: Vec<DailyTotal>,
    pub daily_average: i64,
}

/// Consumes a redirect fragment if one is given, gates on the token, replays
/// pending writes and loads the remote tables.
pub async fn startup_impl(
    state: &AppState,
    redirect: Option<String>,
) -> Result<StartupSummary, TrackerError> {
    let signed_in_from_redirect = match redirect.as_deref().map(str::trim) {
        Some(redirect) if !redirect.is_empty() => state.tokens.consume_redirect(redirect)?.is_some(),
        _ => false,
    };
    if !state.config.is_complete() {
        state.status.error("Configure a client id and spreadsheet id first");
        return Err(TrackerError::InvalidConfig(
            "clientId and spreadsheetId are required".to_string(),
        ));
    }

    let mut summary = StartupSummary {
        authorized: false,
        signed_in_from_redirect,
        routines: Vec::new(),
        history_entries: 0,
        calorie_entries: 0,
        today_calories: 0,
        workout_recovery: None,
        calorie_recovery: None,
        status: None,
    };
    if !state.tokens.ensure_valid()? {
        summary.status = state.status.current();
        return Ok(summary);
    }

    let workout_recovery = state.queue.recover_on_startup().await?;
    let deferred = workout_recovery == RecoveryOutcome::Deferred;
    summary.workout_recovery = Some(workout_recovery);
    if deferred {
        summary.status = state.status.current();
        return Ok(summary);
    }
    let calorie_recovery = state.calories.recover_pending().await?;
    let deferred = calorie_recovery == CalorieRecovery::Deferred;
    summary.calorie_recovery = Some(calorie_recovery);
    if deferred {
        summary.status = state.status.current();
        return Ok(summary);
    }

    let Some(routine_rows) = read_range(state, ROUTINES_RANGE).await? else {
        summary.status = state.status.current();
        return Ok(summary);
    };
    let routines = parse_routines(&routine_rows);
    {
        let mut engine = lock_session(state)?;
        engine.replace_routines(routines);
        summary.routines = engine.routine_names();
    }

    let Some(history_entries) = refresh_history(state).await? else {
        summary.status = state.status.current();
        return Ok(summary);
    };
    summary.history_entries = history_entries;

    let Some(calorie_rows) = read_range(state, CALORIE_LOG_RANGE).await? else {
        summary.status = state.status.current();
        return Ok(summary);
    };
    summary.calorie_entries = state.calories.load(&calorie_rows)?;
    summary.today_calories = state.calories.today_total()?;
    summary.authorized = true;
    summary.status = state.status.current();
    info!(
        routines = summary.routines.len(),
        history = summary.history_entries,
        calories = summary.calorie_entries,
        "startup complete"
    );
    Ok(summary)
}

pub fn authorization_url_impl(state: &AppState) -> Result<String, TrackerError> {
    state.tokens.authorization_url()
}

pub fn sign_out_impl(state: &AppState) -> Result<(), TrackerError> {
    state.tokens.sign_out()?;
    if let Some(timer) = lock_timer(state)?.as_ref() {
        timer.stop()?;
    }
    lock_session(state)?.reset();
    state.status.info("Signed out");
    Ok(())
}

pub fn save_config_impl(state: &AppState, config: AppConfig) -> Result<AppConfig, TrackerError> {
    save_config(state.storage.as_ref(), &config)?;
    state.status.success("Settings saved. Restart to apply them.");
    Ok(config)
}

/// Drops the stored settings; environment overrides still apply on the next start.
pub fn clear_config_impl(state: &AppState) -> Result<(), TrackerError> {
    clear_config(state.storage.as_ref())?;
    state.status.info("Settings cleared. Restart to apply them.");
    Ok(())
}

pub fn status_impl(state: &AppState) -> Option<StatusMessage> {
    state.status.current()
}

pub fn routine_names_impl(state: &AppState) -> Result<Vec<String>, TrackerError> {
    Ok(lock_session(state)?.routine_names())
}

pub fn exercise_views_impl(state: &AppState) -> Result<Vec<ExerciseView>, TrackerError> {
    let engine = lock_session(state)?;
    let previous = lock_previous(state)?;
    Ok(engine.exercise_views(&previous))
}

/// Single mutation entry point for the workout session. A rest request
/// restarts the countdown.
pub fn apply_session_command_impl(
    state: &AppState,
    command: SessionCommand,
) -> Result<Vec<SessionEvent>, TrackerError> {
    let events = lock_session(state)?.apply(command)?;
    for event in &events {
        if let SessionEvent::RestRequested { seconds } = event {
            rest_timer(state)?.start(*seconds)?;
        }
    }
    Ok(events)
}

pub fn select_routine_impl(state: &AppState, name: String) -> Result<Vec<ExerciseView>, TrackerError> {
    apply_session_command_impl(state, SessionCommand::SelectRoutine { name })?;
    exercise_views_impl(state)
}

pub fn set_field_impl(
    state: &AppState,
    key: String,
    set_index: usize,
    field: SetField,
    value: String,
) -> Result<Vec<SessionEvent>, TrackerError> {
    apply_session_command_impl(
        state,
        SessionCommand::SetField {
            key: parse_key(&key)?,
            set_index,
            field,
            value,
        },
    )
}

pub fn toggle_complete_impl(
    state: &AppState,
    key: String,
    set_index: usize,
) -> Result<Vec<SessionEvent>, TrackerError> {
    apply_session_command_impl(
        state,
        SessionCommand::ToggleComplete {
            key: parse_key(&key)?,
            set_index,
        },
    )
}

pub async fn finish_workout_impl(state: &AppState) -> Result<FinishWorkoutResponse, TrackerError> {
    let today = state.zone.date_of((state.now_provider)());
    let finished = {
        let mut engine = lock_session(state)?;
        engine.finish(today, |record| state.queue.persist(record))
    };
    let record = match finished {
        Ok(record) => record,
        Err(TrackerError::EmptySession) => {
            state.status.error("No completed sets to save");
            return Err(TrackerError::EmptySession);
        }
        Err(error @ TrackerError::PendingWriteOutstanding(_)) => {
            state
                .status
                .error("A previous workout is still being saved. Try again after it completes.");
            return Err(error);
        }
        Err(error) => return Err(error),
    };

    let delivery = state.queue.deliver(&record).await?;
    if matches!(delivery, DeliveryOutcome::Delivered { .. }) {
        if let Err(error) = refresh_history(state).await {
            warn!(%error, "could not refresh workout history after save");
        }
    }
    Ok(FinishWorkoutResponse {
        routine_name: record.routine_name,
        entry_count: record.entries.len(),
        delivery,
    })
}

pub fn start_rest_timer_impl(state: &AppState, seconds: Option<i64>) -> Result<i64, TrackerError> {
    let seconds = seconds.unwrap_or(state.config.default_rest_seconds);
    rest_timer(state)?.start(seconds)?;
    Ok(seconds)
}

pub fn add_rest_time_impl(state: &AppState, delta_seconds: i64) -> Result<(), TrackerError> {
    rest_timer(state)?.add_time(delta_seconds)
}

pub fn stop_rest_timer_impl(state: &AppState) -> Result<(), TrackerError> {
    rest_timer(state)?.stop()
}

pub async fn add_calorie_entry_impl(
    state: &AppState,
    description: String,
    calories: i64,
) -> Result<AddOutcome, TrackerError> {
    state.calories.add(&description, calories).await
}

pub async fn remove_calorie_entry_impl(
    state: &AppState,
    entry_id: String,
) -> Result<RemoveOutcome, TrackerError> {
    state.calories.remove(&entry_id).await
}

pub async fn retry_pending_calorie_impl(state: &AppState) -> Result<CalorieRecovery, TrackerError> {
    state.calories.recover_pending().await
}

pub fn calorie_summary_impl(
    state: &AppState,
    period: Option<String>,
) -> Result<CalorieSummaryResponse, TrackerError> {
    let period = match period {
        Some(raw) => ChartPeriod::parse(&raw)?,
        None => ChartPeriod::Week,
    };
    Ok(CalorieSummaryResponse {
        period,
        label: period.label().to_string(),
        today_total: state.calories.today_total()?,
        today_entries: state.calories.today_entries()?,
        daily_totals: state.calories.daily_totals(period.days())?,
        daily_average: state.calories.daily_average(period)?,
    })
}

fn parse_key(token: &str) -> Result<ExerciseKey, TrackerError> {
    ExerciseKey::parse(token).map_err(TrackerError::Validation)
}

/// Reads a range with a valid token. `None` means re-authorization started.
async fn read_range(state: &AppState, range: &str) -> Result<Option<Vec<Vec<String>>>, TrackerError> {
    let Some(access_token) = state.tokens.valid_access_token()? else {
        return Ok(None);
    };
    match state.gateway.read(&access_token, range).await {
        Ok(rows) => Ok(Some(rows)),
        Err(TrackerError::AuthExpired) => {
            state
                .tokens
                .handle_auth_expired("Session expired. Please sign in again.")?;
            Ok(None)
        }
        Err(error) => {
            state.status.error(format!("Error loading {range}: {error}"));
            Err(error)
        }
    }
}

async fn refresh_history(state: &AppState) -> Result<Option<usize>, TrackerError> {
    let Some(rows) = read_range(state, WORKOUT_LOG_RANGE).await? else {
        return Ok(None);
    };
    let index = PreviousPerformanceIndex::from_rows(&rows);
    let count = index.len();
    *lock_previous(state)? = index;
    Ok(Some(count))
}

fn rest_timer(state: &AppState) -> Result<RestTimerHandle, TrackerError> {
    let mut timer = lock_timer(state)?;
    if let Some(handle) = timer.as_ref() {
        return Ok(handle.clone());
    }
    if tokio::runtime::Handle::try_current().is_err() {
        return Err(TrackerError::InvalidConfig(
            "rest timer needs a running tokio runtime".to_string(),
        ));
    }
    let (handle, events) = spawn_rest_timer(Arc::new(LogCompletionAlert));
    *state
        .timer_events
        .lock()
        .map_err(|error| TrackerError::InvalidConfig(format!("timer events lock poisoned: {error}")))? =
        Some(events);
    *timer = Some(handle.clone());
    Ok(handle)
}

fn lock_session(state: &AppState) -> Result<MutexGuard<'_, WorkoutSessionEngine>, TrackerError> {
    state
        .session
        .lock()
        .map_err(|error| TrackerError::InvalidConfig(format!("session lock poisoned: {error}")))
}

fn lock_previous(state: &AppState) -> Result<MutexGuard<'_, PreviousPerformanceIndex>, TrackerError> {
    state
        .previous
        .lock()
        .map_err(|error| TrackerError::InvalidConfig(format!("history lock poisoned: {error}")))
}

fn lock_timer(state: &AppState) -> Result<MutexGuard<'_, Option<RestTimerHandle>>, TrackerError> {
    state
        .timer
        .lock()
        .map_err(|error| TrackerError::InvalidConfig(format!("timer lock poisoned: {error}")))
}
