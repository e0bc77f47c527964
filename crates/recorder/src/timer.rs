//! Session timer: elapsed recording time in whole seconds.
//!
//! With a period and a Tokio runtime, a single interval task drives the
//! count. Starting or resuming replaces that task and pausing or stopping
//! aborts it, so two triggers never feed the same timer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chess_core::format_duration;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimerSnapshot {
    pub seconds: u64,
    pub running: bool,
    pub state: TimerState,
    pub formatted: String,
}

#[derive(Debug)]
pub struct SessionTimer {
    seconds: Arc<AtomicU64>,
    state: TimerState,
    period: Option<Duration>,
    task: Option<JoinHandle<()>>,
}

impl SessionTimer {
    /// `period: None` builds a timer that only moves on [`SessionTimer::tick`].
    pub fn new(period: Option<Duration>) -> Self {
        Self {
            seconds: Arc::new(AtomicU64::new(0)),
            state: TimerState::Idle,
            period,
            task: None,
        }
    }

    pub fn start(&mut self) {
        self.disarm();
        self.seconds.store(0, Ordering::SeqCst);
        self.state = TimerState::Running;
        self.arm();
    }

    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.disarm();
            self.state = TimerState::Paused;
        }
    }

    /// Only a paused timer resumes; a stopped one needs a new `start`.
    pub fn resume(&mut self) {
        if self.state == TimerState::Paused {
            self.state = TimerState::Running;
            self.arm();
        }
    }

    pub fn stop(&mut self) {
        self.disarm();
        if self.state != TimerState::Idle {
            self.state = TimerState::Stopped;
        }
    }

    /// Count one period. No-op unless running.
    pub fn tick(&self) -> u64 {
        if self.state == TimerState::Running {
            self.seconds.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.value()
        }
    }

    pub fn value(&self) -> u64 {
        self.seconds.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn formatted(&self) -> String {
        format_duration(self.value())
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            seconds: self.value(),
            running: self.is_running(),
            state: self.state,
            formatted: self.formatted(),
        }
    }

    fn arm(&mut self) {
        let Some(period) = self.period else {
            return;
        };
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime; session timer falls back to manual ticks");
                return;
            }
        };

        let seconds = Arc::clone(&self.seconds);
        self.task = Some(handle.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let value = seconds.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(seconds = value, "Session timer tick");
            }
        }));
    }

    fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
