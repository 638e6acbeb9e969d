pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::commands::{
    add_calorie_entry_impl, add_rest_time_impl, apply_session_command_impl,
    authorization_url_impl, calorie_summary_impl, clear_config_impl, exercise_views_impl, finish_workout_impl,
    remove_calorie_entry_impl, retry_pending_calorie_impl, routine_names_impl,
    save_config_impl, select_routine_impl, set_field_impl, sign_out_impl, start_rest_timer_impl,
    startup_impl, status_impl, stop_rest_timer_impl, toggle_complete_impl, AppState,
    CalorieSummaryResponse, FinishWorkoutResponse, StartupSummary,
};
pub use application::session::{SessionCommand, SessionEvent};
pub use infrastructure::error::TrackerError;
pub use infrastructure::logging::init_logging;
