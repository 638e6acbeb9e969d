use std::process::ExitCode;
use workout_tracker::{init_logging, startup_impl, AppState, TrackerError};

/// Tells the launcher to open the printed authorization URL and start over.
const REAUTHORIZATION_EXIT_CODE: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("workout-tracker: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode, TrackerError> {
    let state = AppState::new(std::env::current_dir()?)?;
    if let Err(error) = init_logging(state.logs_dir()) {
        eprintln!("workout-tracker: logging disabled: {error}");
    }
    let mut requests = state.take_reauthorization_requests();
    let redirect = std::env::args().nth(1);

    let summary = startup_impl(&state, redirect)
        .await
        .inspect_err(|error| {
            state.command_error("startup", error);
        })?;

    if let Some(request) = requests.as_mut().and_then(|requests| requests.try_recv().ok()) {
        eprintln!("{}", request.reason);
        println!("{}", request.authorization_url);
        return Ok(ExitCode::from(REAUTHORIZATION_EXIT_CODE));
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(ExitCode::SUCCESS)
}
