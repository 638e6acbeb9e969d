pub mod bootstrap;
pub mod calories;
pub mod commands;
pub mod oauth;
pub mod previous_performance;
pub mod rest_timer;
pub mod session;
pub mod status;
pub mod write_queue;

use chrono::{DateTime, Utc};
use std::sync::Arc;

pub type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;
