use crate::audio_manager::AudioError;
use crate::settings_store::SettingsError;
use crate::startup::StartupError;
use crate::timer_engine::TimerError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppErrorKind {
    Timer,
    Settings,
    Audio,
    Startup,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppErrorPayload {
    pub kind: AppErrorKind,
    pub message: String,
    pub detail: Option<String>,
    pub recoverable: bool,
}

/// Error surfaced to the display collaborator and to callers of the runtime.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    kind: AppErrorKind,
    message: String,
    detail: Option<String>,
    recoverable: bool,
}

impl AppError {
    pub fn new(kind: AppErrorKind, message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
            recoverable,
        }
    }

    pub fn with_detail(
        kind: AppErrorKind,
        message: impl Into<String>,
        detail: impl Into<String>,
        recoverable: bool,
    ) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::new(kind, message, recoverable)
        }
    }

    pub fn kind(&self) -> AppErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    pub fn payload(&self) -> AppErrorPayload {
        AppErrorPayload {
            kind: self.kind,
            message: self.message.clone(),
            detail: self.detail.clone(),
            recoverable: self.recoverable,
        }
    }
}

impl From<TimerError> for AppError {
    fn from(error: TimerError) -> Self {
        let detail = error.to_string();
        let message = match error {
            TimerError::InvalidConfiguration(reason) => {
                format!("Timer durations are invalid: {reason}")
            }
        };
        Self::with_detail(AppErrorKind::Timer, message, detail, true)
    }
}

impl From<SettingsError> for AppError {
    fn from(error: SettingsError) -> Self {
        let detail = error.to_string();
        let message = match &error {
            SettingsError::Io(_) => "Failed to read or write settings".to_string(),
            SettingsError::Malformed(_) => "Settings file is malformed".to_string(),
            SettingsError::Invalid { key, .. } => format!("Setting `{key}` is out of range"),
        };
        Self::with_detail(AppErrorKind::Settings, message, detail, true)
    }
}

impl From<StartupError> for AppError {
    fn from(error: StartupError) -> Self {
        Self::with_detail(
            AppErrorKind::Startup,
            "Failed to update run-at-startup registration",
            error.to_string(),
            true,
        )
    }
}

impl From<AudioError> for AppError {
    fn from(error: AudioError) -> Self {
        Self::with_detail(
            AppErrorKind::Audio,
            "Sound could not be played; continuing with visual cues only",
            error.to_string(),
            false,
        )
    }
}
