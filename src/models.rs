use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn complement(self) -> Self {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::Break => "break",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStyle {
    #[default]
    Orange,
    Text,
}

/// Display-only fields. The core passes these through without interpreting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualSettings {
    pub work_color: String,
    pub break_color: String,
    pub bg_opacity: f32,
    pub text_opacity: f32,
    pub text_size: u32,
    pub timer_style: TimerStyle,
    pub orange_opacity: f32,
}

impl VisualSettings {
    pub fn color_for(&self, phase: Phase) -> &str {
        match phase {
            Phase::Work => &self.work_color,
            Phase::Break => &self.break_color,
        }
    }
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            work_color: "#ff8c00".to_string(),
            break_color: "#4caf50".to_string(),
            bg_opacity: 0.5,
            text_opacity: 1.0,
            text_size: 24,
            timer_style: TimerStyle::Orange,
            orange_opacity: 1.0,
        }
    }
}

/// Immutable settings snapshot. Replaced wholesale on every save; see
/// `settings_store` for the flat key/value conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub work_volume: f32,
    pub break_volume: f32,
    pub is_muted: bool,
    pub work_log_enabled: bool,
    pub run_at_startup: bool,
    #[serde(flatten)]
    pub visuals: VisualSettings,
}

impl Settings {
    pub fn volume_for(&self, phase: Phase) -> f32 {
        match phase {
            Phase::Work => self.work_volume,
            Phase::Break => self.break_volume,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
            work_volume: 0.5,
            break_volume: 0.5,
            is_muted: false,
            work_log_enabled: false,
            run_at_startup: true,
            visuals: VisualSettings::default(),
        }
    }
}
