use crate::app_error::AppErrorPayload;
use crate::models::{Phase, VisualSettings};
use crate::work_log::PromptRequest;
use serde::Serialize;

pub const TIMER_TICK_EVENT: &str = "timer-tick";
pub const PHASE_COMPLETED_EVENT: &str = "phase-completed";
pub const PHASE_CHANGED_EVENT: &str = "phase-changed";

/// Events produced by the timer engine, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum TimerEvent {
    #[serde(rename = "timer-tick", rename_all = "camelCase")]
    Tick {
        remaining_display: String,
        progress: f32,
        /// Phase the tick was counted against.
        phase: Phase,
    },
    #[serde(rename_all = "camelCase")]
    PhaseCompleted { ended_phase: Phase },
    #[serde(rename_all = "camelCase")]
    PhaseChanged { new_phase: Phase },
}

impl TimerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TimerEvent::Tick { .. } => TIMER_TICK_EVENT,
            TimerEvent::PhaseCompleted { .. } => PHASE_COMPLETED_EVENT,
            TimerEvent::PhaseChanged { .. } => PHASE_CHANGED_EVENT,
        }
    }
}

/// Subscriber for timer events. Called on the tick path; must not block.
pub trait TimerListener: Send {
    fn on_timer_event(&mut self, event: &TimerEvent);
}

/// Display collaborator: floating window, tray title, terminal, etc.
pub trait DisplaySink: Send {
    fn show_remaining(&mut self, remaining_display: &str, progress: f32);

    fn show_phase(&mut self, phase: Phase);

    /// Visual fields are handed over verbatim along with the phase they should be
    /// rendered for.
    fn apply_visuals(&mut self, visuals: &VisualSettings, phase: Phase);

    /// Called whenever a different work-log prompt reaches the front of the queue.
    fn show_prompt(&mut self, prompt: &PromptRequest) {
        tracing::info!(kind = ?prompt.kind, "work log prompt pending");
    }

    fn show_error(&mut self, error: &AppErrorPayload) {
        tracing::warn!(kind = ?error.kind, message = %error.message, "unhandled app error");
    }
}

pub fn dispatch(listeners: &mut [Box<dyn TimerListener>], events: &[TimerEvent]) {
    for event in events {
        tracing::trace!(event = event.name(), "dispatching timer event");
        for listener in listeners.iter_mut() {
            listener.on_timer_event(event);
        }
    }
}
