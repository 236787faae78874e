pub mod app_error;
pub mod audio_manager;
pub mod clock;
pub mod events;
pub mod models;
pub mod reconcile;
pub mod runtime;
pub mod settings_store;
pub mod startup;
pub mod timer_engine;
pub mod work_log;

pub use app_error::{AppError, AppErrorKind, AppErrorPayload};
pub use audio_manager::{AudioError, AudioManager, ClipId, SilentPlayer, SoundPlayer};
pub use clock::{Clock, ClockHandle, Tickable};
pub use events::{DisplaySink, TimerEvent, TimerListener};
pub use models::{Phase, Settings, TimerStyle, VisualSettings};
pub use reconcile::{LiveState, ReconcileCommand};
pub use runtime::{SharedRuntime, TimerRuntime};
pub use settings_store::{JsonSettingsStore, SettingsError, SettingsStore};
pub use startup::{InMemoryStartup, StartupError, StartupRegistry};
pub use timer_engine::{TimerEngine, TimerError};
pub use work_log::{PromptKind, PromptRequest, WorkLogPrompts};
