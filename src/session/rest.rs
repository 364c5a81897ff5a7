//! Rest countdown between sets
//!
//! A single ticker task per `RestTimer`. Starting a new countdown aborts the
//! previous ticker before spawning the next one, and dropping the timer
//! aborts whatever is still running.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestState {
    pub is_resting: bool,
    pub seconds_remaining: u32,
}

#[derive(Debug, Default)]
pub struct RestTimer {
    state: Arc<Mutex<RestState>>,
    ticker: Option<JoinHandle<()>>,
}

impl RestTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down from `seconds`, replacing any running countdown.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, seconds: u32) {
        self.stop_ticker();

        {
            let mut state = lock(&self.state);
            *state = RestState {
                is_resting: seconds > 0,
                seconds_remaining: seconds,
            };
        }
        if seconds == 0 {
            return;
        }

        debug!(seconds, "rest timer started");
        let state = self.state.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;

                let mut guard = lock(&state);
                if !guard.is_resting {
                    break;
                }
                guard.seconds_remaining = guard.seconds_remaining.saturating_sub(1);
                if guard.seconds_remaining == 0 {
                    guard.is_resting = false;
                    debug!("rest timer expired");
                    break;
                }
            }
        }));
    }

    /// End the countdown now, whatever is left on it
    pub fn skip(&mut self) {
        self.stop_ticker();
        *lock(&self.state) = RestState::default();
    }

    pub fn state(&self) -> RestState {
        *lock(&self.state)
    }

    pub fn is_resting(&self) -> bool {
        lock(&self.state).is_resting
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for RestTimer {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

fn lock(state: &Mutex<RestState>) -> MutexGuard<'_, RestState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_counts_down_once_per_second() {
        let mut timer = RestTimer::new();
        timer.start(30);
        assert_eq!(timer.state(), RestState { is_resting: true, seconds_remaining: 30 });

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(timer.state().seconds_remaining, 27);
        assert!(timer.is_resting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaching_zero_clears_resting() {
        let mut timer = RestTimer::new();
        timer.start(3);

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(timer.state(), RestState { is_resting: false, seconds_remaining: 0 });

        // Ticker is gone; nothing changes afterwards
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(timer.state(), RestState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_clears_immediately() {
        let mut timer = RestTimer::new();
        timer.start(90);
        time::sleep(Duration::from_millis(1500)).await;

        timer.skip();
        assert_eq!(timer.state(), RestState { is_resting: false, seconds_remaining: 0 });

        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(timer.state(), RestState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_previous_countdown() {
        let mut timer = RestTimer::new();
        timer.start(60);
        time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(timer.state().seconds_remaining, 50);

        timer.start(20);
        time::sleep(Duration::from_millis(5_500)).await;
        // A leftover ticker would have decremented twice per second
        assert_eq!(timer.state().seconds_remaining, 15);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_seconds_does_not_rest() {
        let mut timer = RestTimer::new();
        timer.start(0);
        assert!(!timer.is_resting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_ticker() {
        let mut timer = RestTimer::new();
        timer.start(10);
        let state = timer.state.clone();
        drop(timer);

        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(lock(&state).seconds_remaining, 10);
    }
}
