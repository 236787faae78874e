//! Work-log prompts queued at the end of each work phase.
//!
//! A completed work phase asks the user to log what they did; accepting that prompt
//! chains a planning prompt for the next session. The display side pops prompts one at
//! a time, so they never overlap.

use crate::events::{TimerEvent, TimerListener};
use crate::models::Phase;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    Logging,
    Planning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    pub kind: PromptKind,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct WorkLogPrompts {
    enabled: bool,
    queue: VecDeque<PromptRequest>,
}

impl WorkLogPrompts {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            queue: VecDeque::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling stops new logging prompts; prompts already queued stay.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn current(&self) -> Option<&PromptRequest> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Completes the front prompt. A logging prompt queues its planning follow-up
    /// directly behind it.
    pub fn accept(&mut self) -> Option<PromptRequest> {
        let prompt = self.queue.pop_front()?;
        if prompt.kind == PromptKind::Logging {
            self.queue.push_front(PromptRequest {
                kind: PromptKind::Planning,
                requested_at: Utc::now(),
            });
        }
        Some(prompt)
    }

    pub fn dismiss(&mut self) -> Option<PromptRequest> {
        self.queue.pop_front()
    }

    fn request_logging(&mut self) {
        if !self.enabled {
            tracing::debug!("work log disabled, skipping prompt");
            return;
        }
        self.queue.push_back(PromptRequest {
            kind: PromptKind::Logging,
            requested_at: Utc::now(),
        });
        tracing::info!(queued = self.queue.len(), "work log prompt queued");
    }
}

impl TimerListener for WorkLogPrompts {
    fn on_timer_event(&mut self, event: &TimerEvent) {
        if let TimerEvent::PhaseCompleted {
            ended_phase: Phase::Work,
        } = event
        {
            self.request_logging();
        }
    }
}
