use crate::app_error::AppError;
use crate::audio_manager::{AudioManager, SoundPlayer};
use crate::clock::Tickable;
use crate::events::{DisplaySink, TimerEvent, TimerListener, dispatch};
use crate::models::{Phase, Settings};
use crate::reconcile::{self, LiveState, ReconcileCommand};
use crate::startup::StartupRegistry;
use crate::timer_engine::TimerEngine;
use crate::work_log::{PromptRequest, WorkLogPrompts};
use std::sync::{Arc, Mutex};

/// Ticks and reconfiguration both go through this one lock, so they never interleave.
pub type SharedRuntime = Arc<Mutex<TimerRuntime>>;

/// The engine together with everything that reacts to it: audio policy, work-log
/// prompts, the display and any extra listeners.
pub struct TimerRuntime {
    engine: TimerEngine,
    audio: AudioManager,
    prompts: WorkLogPrompts,
    display: Box<dyn DisplaySink>,
    startup: Box<dyn StartupRegistry>,
    listeners: Vec<Box<dyn TimerListener>>,
    settings: Settings,
    /// Target of the last registry write that failed and was already reported.
    startup_failure: Option<bool>,
}

impl TimerRuntime {
    pub fn new(
        settings: Settings,
        player: Box<dyn SoundPlayer>,
        display: Box<dyn DisplaySink>,
        startup: Box<dyn StartupRegistry>,
    ) -> Result<Self, AppError> {
        settings.validate()?;
        let engine = TimerEngine::new(settings.work_minutes, settings.break_minutes)?;
        let mut runtime = Self {
            engine,
            audio: AudioManager::new(player),
            prompts: WorkLogPrompts::new(settings.work_log_enabled),
            display,
            startup,
            listeners: Vec::new(),
            settings,
            startup_failure: None,
        };

        runtime
            .audio
            .set_volume(Phase::Work, runtime.settings.work_volume);
        runtime
            .audio
            .set_volume(Phase::Break, runtime.settings.break_volume);
        runtime.audio.toggle_mute(runtime.settings.is_muted);
        runtime
            .display
            .apply_visuals(&runtime.settings.visuals, runtime.engine.current_phase());
        runtime.register_startup_if_missing();
        Ok(runtime)
    }

    pub fn into_shared(self) -> SharedRuntime {
        Arc::new(Mutex::new(self))
    }

    pub fn add_listener(&mut self, listener: Box<dyn TimerListener>) {
        self.listeners.push(listener);
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn audio(&self) -> &AudioManager {
        &self.audio
    }

    pub fn prompts(&self) -> &WorkLogPrompts {
        &self.prompts
    }

    /// Completes the front work-log prompt and shows whatever follows it.
    pub fn accept_prompt(&mut self) -> Option<PromptRequest> {
        let accepted = self.prompts.accept()?;
        self.publish_prompt();
        Some(accepted)
    }

    pub fn dismiss_prompt(&mut self) -> Option<PromptRequest> {
        let dismissed = self.prompts.dismiss()?;
        self.publish_prompt();
        Some(dismissed)
    }

    /// The last snapshot that was applied in full.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn start(&mut self) {
        if self.engine.is_running() {
            return;
        }
        self.engine.start();
        self.publish_phase();
    }

    pub fn stop(&mut self) {
        self.engine.stop();
        self.audio.sync_loop(None);
    }

    pub fn resume(&mut self) {
        if self.engine.is_running() {
            return;
        }
        self.engine.resume();
        self.publish_phase();
    }

    pub fn tick(&mut self) -> Vec<TimerEvent> {
        let events = self.engine.tick();
        let front = self.prompts.current().cloned();
        for event in &events {
            self.audio.on_timer_event(event);
            self.prompts.on_timer_event(event);
            match event {
                TimerEvent::Tick {
                    remaining_display,
                    progress,
                    ..
                } => self.display.show_remaining(remaining_display, *progress),
                TimerEvent::PhaseChanged { new_phase } => {
                    self.display.show_phase(*new_phase);
                    self.display
                        .apply_visuals(&self.settings.visuals, *new_phase);
                }
                TimerEvent::PhaseCompleted { .. } => {}
            }
        }
        if self.prompts.current() != front.as_ref() {
            self.publish_prompt();
        }
        dispatch(&mut self.listeners, &events);
        self.report_audio_failure();
        events
    }

    /// Direct duration edit. The stored snapshot is left alone; the next
    /// reconciliation compares against the engine and sees the change.
    pub fn update_durations(
        &mut self,
        work_minutes: u32,
        break_minutes: u32,
    ) -> Result<(), AppError> {
        self.engine.update_durations(work_minutes, break_minutes)?;
        self.refresh_remaining();
        Ok(())
    }

    /// Reconciles `new` against the last applied snapshot and the live state. Either
    /// every planned command is applied or, on error, none is.
    pub fn apply_settings(&mut self, new: Settings) -> Result<Vec<ReconcileCommand>, AppError> {
        let live = self.live_state();
        let commands = reconcile::plan(&self.settings, &new, &live)?;
        for command in &commands {
            self.apply_command(command)?;
        }
        if !commands.is_empty() {
            tracing::info!(commands = commands.len(), "settings applied");
        }
        self.settings = new;
        Ok(commands)
    }

    pub fn live_state(&self) -> LiveState {
        let startup_registered = match self.startup.is_registered() {
            Ok(registered) => Some(registered),
            Err(err) => {
                tracing::warn!(error = %err, "could not read startup registration");
                None
            }
        };
        LiveState {
            work_minutes: self.engine.work_minutes(),
            break_minutes: self.engine.break_minutes(),
            work_volume: self.audio.volume(Phase::Work),
            break_volume: self.audio.volume(Phase::Break),
            muted: self.audio.is_muted(),
            startup_registered,
        }
    }

    fn apply_command(&mut self, command: &ReconcileCommand) -> Result<(), AppError> {
        match command {
            ReconcileCommand::UpdateDurations {
                work_minutes,
                break_minutes,
            } => self.update_durations(*work_minutes, *break_minutes)?,
            ReconcileCommand::SetVolume { phase, value } => self.audio.set_volume(*phase, *value),
            ReconcileCommand::SetMute(muted) => self.audio.toggle_mute(*muted),
            ReconcileCommand::ApplyVisuals(visuals) => self
                .display
                .apply_visuals(visuals, self.engine.current_phase()),
            ReconcileCommand::SetWorkLogEnabled(enabled) => self.prompts.set_enabled(*enabled),
            ReconcileCommand::SetRunAtStartup(enabled) => self.set_startup(*enabled),
        }
        Ok(())
    }

    fn publish_phase(&mut self) {
        let phase = self.engine.current_phase();
        self.display.show_phase(phase);
        self.display.apply_visuals(&self.settings.visuals, phase);
        self.refresh_remaining();
        self.audio.sync_loop(Some(phase));
        self.report_audio_failure();
    }

    fn publish_prompt(&mut self) {
        if let Some(prompt) = self.prompts.current() {
            self.display.show_prompt(prompt);
        }
    }

    fn refresh_remaining(&mut self) {
        self.display
            .show_remaining(&self.engine.remaining_display(), self.engine.progress());
    }

    fn register_startup_if_missing(&mut self) {
        if !self.settings.run_at_startup {
            return;
        }
        match self.startup.is_registered() {
            Ok(true) => {}
            Ok(false) => self.set_startup(true),
            Err(err) => tracing::warn!(error = %err, "could not read startup registration"),
        }
    }

    fn set_startup(&mut self, enabled: bool) {
        match self.startup.set_registered(enabled) {
            Ok(()) => self.startup_failure = None,
            Err(err) if self.startup_failure == Some(enabled) => {
                tracing::debug!(enabled, error = %err, "startup registration still failing");
            }
            Err(err) => {
                self.startup_failure = Some(enabled);
                self.report_error(AppError::from(err));
            }
        }
    }

    fn report_audio_failure(&mut self) {
        if let Some(err) = self.audio.take_failure_notice() {
            self.report_error(AppError::from(err));
        }
    }

    fn report_error(&mut self, error: AppError) {
        if let Some(detail) = error.detail() {
            tracing::warn!(kind = ?error.kind(), %detail, "{}", error.message());
        } else {
            tracing::warn!(kind = ?error.kind(), "{}", error.message());
        }
        self.display.show_error(&error.payload());
    }
}

impl Tickable for TimerRuntime {
    fn on_tick(&mut self) {
        self.tick();
    }
}
