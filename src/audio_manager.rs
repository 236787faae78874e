use crate::events::{TimerEvent, TimerListener};
use crate::models::Phase;
use std::collections::VecDeque;
use std::time::SystemTime;
use thiserror::Error;

const PLAYBACK_LOG_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipId {
    /// Discrete tick played once per second of work.
    Tick,
    /// Ambient loop for the whole break.
    BreakLoop,
}

impl ClipId {
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Work => ClipId::Tick,
            Phase::Break => ClipId::BreakLoop,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClipId::Tick => "tick",
            ClipId::BreakLoop => "break_loop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("failed to decode clip {clip}: {reason}")]
    Decode { clip: &'static str, reason: String },
    #[error("playback failed: {0}")]
    Playback(String),
}

/// Sound-playing capability. Implementations must return promptly; playback itself
/// runs off the tick path.
pub trait SoundPlayer: Send {
    fn play_once(&mut self, clip: ClipId) -> Result<(), AudioError>;
    fn start_loop(&mut self, clip: ClipId) -> Result<(), AudioError>;
    fn stop_loop(&mut self, clip: ClipId) -> Result<(), AudioError>;
    fn set_volume(&mut self, clip: ClipId, value: f32) -> Result<(), AudioError>;
    fn mute(&mut self, muted: bool) -> Result<(), AudioError>;
}

/// Player that accepts every command and produces no output.
#[derive(Debug, Default)]
pub struct SilentPlayer;

impl SoundPlayer for SilentPlayer {
    fn play_once(&mut self, clip: ClipId) -> Result<(), AudioError> {
        tracing::trace!(clip = clip.as_str(), "silent play");
        Ok(())
    }

    fn start_loop(&mut self, clip: ClipId) -> Result<(), AudioError> {
        tracing::trace!(clip = clip.as_str(), "silent loop start");
        Ok(())
    }

    fn stop_loop(&mut self, clip: ClipId) -> Result<(), AudioError> {
        tracing::trace!(clip = clip.as_str(), "silent loop stop");
        Ok(())
    }

    fn set_volume(&mut self, _clip: ClipId, _value: f32) -> Result<(), AudioError> {
        Ok(())
    }

    fn mute(&mut self, _muted: bool) -> Result<(), AudioError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundAction {
    PlayOnce,
    StartLoop,
    StopLoop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundPlaybackReason {
    Played,
    Muted,
    PlaybackFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundPlaybackRecord {
    pub clip: ClipId,
    pub action: SoundAction,
    pub played: bool,
    pub reason: SoundPlaybackReason,
    pub timestamp: SystemTime,
}

/// Audio trigger policy. Keyed strictly off timer events; player failures are logged
/// and swallowed here so they never reach the engine.
pub struct AudioManager {
    player: Box<dyn SoundPlayer>,
    muted: bool,
    work_volume: f32,
    break_volume: f32,
    active_loop: Option<Phase>,
    log: VecDeque<SoundPlaybackRecord>,
    failure_notified: bool,
    pending_failure: Option<AudioError>,
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("muted", &self.muted)
            .field("work_volume", &self.work_volume)
            .field("break_volume", &self.break_volume)
            .field("active_loop", &self.active_loop)
            .finish_non_exhaustive()
    }
}

impl AudioManager {
    pub fn new(player: Box<dyn SoundPlayer>) -> Self {
        Self {
            player,
            muted: false,
            work_volume: 1.0,
            break_volume: 1.0,
            active_loop: None,
            log: VecDeque::new(),
            failure_notified: false,
            pending_failure: None,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn active_loop(&self) -> Option<Phase> {
        self.active_loop
    }

    pub fn volume(&self, phase: Phase) -> f32 {
        match phase {
            Phase::Work => self.work_volume,
            Phase::Break => self.break_volume,
        }
    }

    pub fn logs(&self) -> impl Iterator<Item = &SoundPlaybackRecord> {
        self.log.iter()
    }

    /// Applies to the playing loop and to anything played later. Non-finite values are
    /// ignored; the rest are clamped into `[0.0, 1.0]`.
    pub fn set_volume(&mut self, phase: Phase, value: f32) {
        if !value.is_finite() {
            tracing::warn!(%phase, value, "ignoring non-finite volume");
            return;
        }
        let value = value.clamp(0.0, 1.0);
        match phase {
            Phase::Work => self.work_volume = value,
            Phase::Break => self.break_volume = value,
        }
        let clip = ClipId::for_phase(phase);
        if let Err(err) = self.player.set_volume(clip, value) {
            tracing::warn!(clip = clip.as_str(), error = %err, "failed to set volume");
        }
    }

    /// Silences output without touching the active loop.
    pub fn toggle_mute(&mut self, muted: bool) {
        self.muted = muted;
        if let Err(err) = self.player.mute(muted) {
            tracing::warn!(muted, error = %err, "failed to apply mute");
        }
    }

    /// Starts or stops the break loop so that it plays exactly when `phase` is `Break`.
    pub fn sync_loop(&mut self, phase: Option<Phase>) {
        let desired = phase.filter(|phase| *phase == Phase::Break);
        if desired == self.active_loop {
            return;
        }
        match desired {
            Some(phase) => {
                let clip = ClipId::for_phase(phase);
                self.perform(clip, SoundAction::StartLoop);
                self.active_loop = Some(phase);
            }
            None => {
                if let Some(phase) = self.active_loop.take() {
                    self.perform(ClipId::for_phase(phase), SoundAction::StopLoop);
                }
            }
        }
    }

    /// Fire-and-forget tick. Skipped while muted.
    pub fn play_tick(&mut self) {
        if self.muted {
            self.record(ClipId::Tick, SoundAction::PlayOnce, SoundPlaybackReason::Muted);
            return;
        }
        self.perform(ClipId::Tick, SoundAction::PlayOnce);
    }

    /// Returns a playback failure once; later failures stay quiet until a sound plays
    /// successfully again.
    pub fn take_failure_notice(&mut self) -> Option<AudioError> {
        self.pending_failure.take()
    }

    fn perform(&mut self, clip: ClipId, action: SoundAction) {
        let result = match action {
            SoundAction::PlayOnce => self.player.play_once(clip),
            SoundAction::StartLoop => self.player.start_loop(clip),
            SoundAction::StopLoop => self.player.stop_loop(clip),
        };
        match result {
            Ok(()) => {
                self.failure_notified = false;
                self.record(clip, action, SoundPlaybackReason::Played);
            }
            Err(err) => {
                tracing::warn!(clip = clip.as_str(), ?action, error = %err, "sound playback failed");
                if !self.failure_notified {
                    self.failure_notified = true;
                    self.pending_failure = Some(err);
                }
                self.record(clip, action, SoundPlaybackReason::PlaybackFailed);
            }
        }
    }

    fn record(&mut self, clip: ClipId, action: SoundAction, reason: SoundPlaybackReason) {
        if self.log.len() == PLAYBACK_LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(SoundPlaybackRecord {
            clip,
            action,
            played: reason == SoundPlaybackReason::Played,
            reason,
            timestamp: SystemTime::now(),
        });
    }
}

impl TimerListener for AudioManager {
    fn on_timer_event(&mut self, event: &TimerEvent) {
        match event {
            TimerEvent::Tick {
                phase: Phase::Work, ..
            } => self.play_tick(),
            TimerEvent::Tick { .. } | TimerEvent::PhaseCompleted { .. } => {}
            TimerEvent::PhaseChanged { new_phase } => self.sync_loop(Some(*new_phase)),
        }
    }
}
