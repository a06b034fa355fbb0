//! Periodic wrapper around the pipeline.
//!
//! The scheduler alternates between `Idle` and `Running`: it executes one full
//! pass, returns to `Idle`, and waits for the next tick. Ticks that fall due
//! while a pass is still running are skipped, never run concurrently.

use crate::cuaca::Cuaca;
use crate::error::CuacaError;
use log::{info, warn};
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};

/// Default period between passes.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

pub struct Scheduler {
    period: Duration,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Runs the pipeline immediately and then on every period tick, until the
    /// process exits or a pass fails fatally (store setup or index write).
    pub async fn run(&mut self, pipeline: &Cuaca) -> Result<(), CuacaError> {
        info!("Scheduling a pass every {:?}", self.period);
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.state = SchedulerState::Running;
            let started = Instant::now();
            pipeline.run_once().await?;
            let elapsed = started.elapsed();
            if elapsed >= self.period {
                warn!(
                    "Pass took {:?}, longer than the {:?} period; overlapping ticks were skipped",
                    elapsed, self.period
                );
            }
            self.state = SchedulerState::Idle;
        }
    }
}
