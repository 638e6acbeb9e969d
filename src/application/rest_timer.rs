use crate::infrastructure::error::TrackerError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start(i64),
    AddTime(i64),
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TimerEvent {
    Tick { remaining: i64 },
    Completed,
    Stopped,
}

/// Side effect fired when a countdown runs out. Failures are logged and
/// otherwise ignored.
pub trait CompletionAlert: Send + Sync {
    fn alert(&self) -> Result<(), TrackerError>;
}

#[derive(Debug, Default)]
pub struct LogCompletionAlert;

impl CompletionAlert for LogCompletionAlert {
    fn alert(&self) -> Result<(), TrackerError> {
        info!("rest complete");
        Ok(())
    }
}

/// Cheap handle to the single countdown task. Dropping every handle ends the
/// task.
#[derive(Debug, Clone)]
pub struct RestTimerHandle {
    commands: mpsc::UnboundedSender<TimerCommand>,
}

impl RestTimerHandle {
    pub fn start(&self, seconds: i64) -> Result<(), TrackerError> {
        self.send(TimerCommand::Start(seconds))
    }

    pub fn add_time(&self, delta_seconds: i64) -> Result<(), TrackerError> {
        self.send(TimerCommand::AddTime(delta_seconds))
    }

    pub fn stop(&self) -> Result<(), TrackerError> {
        self.send(TimerCommand::Stop)
    }

    fn send(&self, command: TimerCommand) -> Result<(), TrackerError> {
        self.commands
            .send(command)
            .map_err(|_| TrackerError::NotFound("rest timer task".to_string()))
    }
}

/// Spawns the countdown on the current runtime.
pub fn spawn_rest_timer(
    alert: Arc<dyn CompletionAlert>,
) -> (RestTimerHandle, mpsc::UnboundedReceiver<TimerEvent>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    tokio::spawn(RestTimer::new(event_tx, alert).run(command_rx));
    (RestTimerHandle { commands: command_tx }, event_rx)
}

struct RestTimer {
    remaining: Option<i64>,
    ticker: Option<Interval>,
    events: mpsc::UnboundedSender<TimerEvent>,
    alert: Arc<dyn CompletionAlert>,
}

impl RestTimer {
    fn new(events: mpsc::UnboundedSender<TimerEvent>, alert: Arc<dyn CompletionAlert>) -> Self {
        Self {
            remaining: None,
            ticker: None,
            events,
            alert,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<TimerCommand>) {
        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = next_tick(&mut self.ticker) => self.on_tick(),
            }
        }
        debug!("rest timer task finished");
    }

    fn handle(&mut self, command: TimerCommand) {
        match command {
            TimerCommand::Start(seconds) => {
                let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(ticker);
                self.remaining = Some(seconds);
                debug!(seconds, "rest timer started");
                self.publish(seconds);
            }
            TimerCommand::AddTime(delta) => {
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining = remaining.saturating_add(delta);
                    let remaining = *remaining;
                    self.publish(remaining);
                }
            }
            TimerCommand::Stop => {
                self.ticker = None;
                if self.remaining.take().is_some() {
                    self.emit(TimerEvent::Stopped);
                }
            }
        }
    }

    fn on_tick(&mut self) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
            let remaining = *remaining;
            self.publish(remaining);
        }
    }

    /// Emits the new remaining time and completes once it is non-positive.
    fn publish(&mut self, remaining: i64) {
        self.emit(TimerEvent::Tick { remaining });
        if remaining > 0 {
            return;
        }
        self.remaining = None;
        self.ticker = None;
        self.emit(TimerEvent::Completed);
        if let Err(error) = self.alert.alert() {
            debug!(%error, "completion alert failed");
        }
    }

    fn emit(&self, event: TimerEvent) {
        // A missing listener only means nobody is displaying the timer.
        let _ = self.events.send(event);
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// `m:ss`; non-positive values render as `0:00`.
pub fn format_remaining(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingAlert {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CompletionAlert for CountingAlert {
        fn alert(&self) -> Result<(), TrackerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TrackerError::NotFound("vibration motor".to_string()));
            }
            Ok(())
        }
    }

    async fn next_event(events: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Option<TimerEvent> {
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .ok()
            .flatten()
    }

    fn tick(remaining: i64) -> Option<TimerEvent> {
        Some(TimerEvent::Tick { remaining })
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_every_second_and_completes_once() {
        let alert = Arc::new(CountingAlert::default());
        let (timer, mut events) = spawn_rest_timer(Arc::clone(&alert) as Arc<dyn CompletionAlert>);
        timer.start(3).expect("start");

        for expected in [3, 2, 1, 0] {
            assert_eq!(next_event(&mut events).await, tick(expected));
        }
        assert_eq!(next_event(&mut events).await, Some(TimerEvent::Completed));
        assert_eq!(next_event(&mut events).await, None);
        assert_eq!(alert.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn negative_add_time_completes_exactly_once() {
        let alert = Arc::new(CountingAlert::default());
        let (timer, mut events) = spawn_rest_timer(Arc::clone(&alert) as Arc<dyn CompletionAlert>);
        timer.start(90).expect("start");
        timer.add_time(-100).expect("add time");

        assert_eq!(next_event(&mut events).await, tick(90));
        assert_eq!(next_event(&mut events).await, tick(-10));
        assert_eq!(next_event(&mut events).await, Some(TimerEvent::Completed));
        assert_eq!(next_event(&mut events).await, None);
        assert_eq!(alert.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn extreme_add_time_saturates_and_keeps_the_timer_alive() {
        let (timer, mut events) = spawn_rest_timer(Arc::new(LogCompletionAlert));
        timer.start(90).expect("start");
        timer.add_time(i64::MAX).expect("add time");
        timer.add_time(i64::MAX).expect("add time again");
        timer.stop().expect("stop");

        assert_eq!(next_event(&mut events).await, tick(90));
        assert_eq!(next_event(&mut events).await, tick(i64::MAX));
        assert_eq!(next_event(&mut events).await, tick(i64::MAX));
        assert_eq!(next_event(&mut events).await, Some(TimerEvent::Stopped));

        timer.start(5).expect("timer still accepts commands");
        assert_eq!(next_event(&mut events).await, tick(5));
    }

    #[tokio::test(start_paused = true)]
    async fn start_replaces_remaining_time() {
        let (timer, mut events) = spawn_rest_timer(Arc::new(LogCompletionAlert));
        timer.start(90).expect("start");
        timer.start(30).expect("restart");

        assert_eq!(next_event(&mut events).await, tick(90));
        assert_eq!(next_event(&mut events).await, tick(30));
        assert_eq!(next_event(&mut events).await, tick(29));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_goes_idle_without_completion() {
        let alert = Arc::new(CountingAlert::default());
        let (timer, mut events) = spawn_rest_timer(Arc::clone(&alert) as Arc<dyn CompletionAlert>);
        timer.start(10).expect("start");
        timer.stop().expect("stop");
        timer.add_time(30).expect("add time while idle");

        assert_eq!(next_event(&mut events).await, tick(10));
        assert_eq!(next_event(&mut events).await, Some(TimerEvent::Stopped));
        assert_eq!(next_event(&mut events).await, None);
        assert_eq!(alert.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_alert_does_not_stop_the_timer() {
        let alert = Arc::new(CountingAlert {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let (timer, mut events) = spawn_rest_timer(Arc::clone(&alert) as Arc<dyn CompletionAlert>);
        timer.start(1).expect("start");
        assert_eq!(next_event(&mut events).await, tick(1));
        assert_eq!(next_event(&mut events).await, tick(0));
        assert_eq!(next_event(&mut events).await, Some(TimerEvent::Completed));

        timer.start(2).expect("second start");
        assert_eq!(next_event(&mut events).await, tick(2));
    }

    #[test]
    fn remaining_is_formatted_as_minutes_and_seconds() {
        assert_eq!(format_remaining(90), "1:30");
        assert_eq!(format_remaining(5), "0:05");
        assert_eq!(format_remaining(600), "10:00");
        assert_eq!(format_remaining(-10), "0:00");
    }
}
