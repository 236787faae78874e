use crate::events::TimerEvent;
use crate::models::Phase;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Formats seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_remaining(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Tick-counted work/break state machine.
///
/// Elapsed time is the number of delivered ticks, never a wall-clock delta: a tick
/// delivered late is still one second, and missed ticks are not caught up. Under heavy
/// scheduling delay the countdown lags real time.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    phase: Phase,
    work_duration_s: u32,
    break_duration_s: u32,
    remaining_s: u32,
    running: bool,
}

impl TimerEngine {
    pub fn new(work_minutes: u32, break_minutes: u32) -> Result<Self, TimerError> {
        let work_duration_s = Self::minutes_to_seconds("work", work_minutes)?;
        let break_duration_s = Self::minutes_to_seconds("break", break_minutes)?;
        Ok(Self {
            phase: Phase::Work,
            work_duration_s,
            break_duration_s,
            remaining_s: work_duration_s,
            running: false,
        })
    }

    pub fn current_phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_s
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn work_duration_seconds(&self) -> u32 {
        self.work_duration_s
    }

    pub fn break_duration_seconds(&self) -> u32 {
        self.break_duration_s
    }

    pub fn work_minutes(&self) -> u32 {
        self.work_duration_s / 60
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_duration_s / 60
    }

    pub fn duration_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_duration_s,
            Phase::Break => self.break_duration_s,
        }
    }

    pub fn phase_duration(&self) -> u32 {
        self.duration_for(self.phase)
    }

    /// `1 - remaining / duration`, always within `[0.0, 1.0]`.
    pub fn progress(&self) -> f32 {
        let duration = self.phase_duration();
        if duration == 0 {
            return 0.0;
        }
        let remaining = self.remaining_s.min(duration);
        (1.0 - remaining as f64 / duration as f64).clamp(0.0, 1.0) as f32
    }

    pub fn remaining_display(&self) -> String {
        format_remaining(self.remaining_s)
    }

    /// Starts a fresh work phase. No-op while already running.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.phase = Phase::Work;
        self.remaining_s = self.work_duration_s;
        self.running = true;
        tracing::debug!(work_seconds = self.work_duration_s, "timer started");
    }

    /// Continues the current phase from where it was stopped.
    pub fn resume(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        tracing::debug!(phase = %self.phase, remaining = self.remaining_s, "timer resumed");
    }

    /// Observed on the next tick attempt; nothing in flight is cancelled.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        tracing::debug!(phase = %self.phase, remaining = self.remaining_s, "timer stopped");
    }

    /// Advances by exactly one second. Returns the events in emission order:
    /// `Tick`, then on a boundary `PhaseCompleted` followed by `PhaseChanged`.
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        if !self.running {
            return Vec::new();
        }

        self.remaining_s = self.remaining_s.saturating_sub(1);
        let mut events = vec![TimerEvent::Tick {
            remaining_display: self.remaining_display(),
            progress: self.progress(),
            phase: self.phase,
        }];

        if self.remaining_s == 0 {
            let ended_phase = self.phase;
            let new_phase = ended_phase.complement();
            self.phase = new_phase;
            self.remaining_s = self.duration_for(new_phase);
            tracing::info!(%ended_phase, %new_phase, remaining = self.remaining_s, "phase boundary");
            events.push(TimerEvent::PhaseCompleted { ended_phase });
            events.push(TimerEvent::PhaseChanged { new_phase });
        }

        events
    }

    /// Reconfigures both durations. The active phase's remaining time is clamped to the
    /// new duration and never extended; the other phase picks up its new length at its
    /// next start. Invalid input leaves the engine untouched.
    pub fn update_durations(
        &mut self,
        work_minutes: u32,
        break_minutes: u32,
    ) -> Result<(), TimerError> {
        let work_duration_s = Self::minutes_to_seconds("work", work_minutes)?;
        let break_duration_s = Self::minutes_to_seconds("break", break_minutes)?;

        self.work_duration_s = work_duration_s;
        self.break_duration_s = break_duration_s;
        let active_duration = self.phase_duration();
        if self.remaining_s > active_duration {
            tracing::debug!(
                phase = %self.phase,
                from = self.remaining_s,
                to = active_duration,
                "clamping remaining time to new duration"
            );
            self.remaining_s = active_duration;
        }
        tracing::info!(work_minutes, break_minutes, "durations updated");
        Ok(())
    }

    fn minutes_to_seconds(label: &str, minutes: u32) -> Result<u32, TimerError> {
        if minutes == 0 {
            return Err(TimerError::InvalidConfiguration(format!(
                "{label} duration must be at least 1 minute"
            )));
        }
        minutes.checked_mul(60).ok_or_else(|| {
            TimerError::InvalidConfiguration(format!("{label} duration is too large"))
        })
    }
}
