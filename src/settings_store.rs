use crate::models::Settings;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "focus-timer";
const SETTINGS_FILE: &str = "settings.json";
pub const MAX_MINUTES: u32 = 24 * 60;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid setting `{key}`: {reason}")]
    Invalid { key: String, reason: String },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

pub type SettingsMap = Map<String, Value>;

/// Persistence capability. Snapshots travel as a flat key/value mapping.
pub trait SettingsStore: Send {
    fn load(&self) -> SettingsResult<SettingsMap>;
    fn save(&self, values: &SettingsMap) -> SettingsResult<()>;
}

impl Settings {
    /// Builds a snapshot from a flat mapping. Missing keys take their defaults; unknown
    /// keys are ignored.
    pub fn from_map(values: &SettingsMap) -> SettingsResult<Self> {
        let mut merged = Settings::default().to_map()?;
        for (key, value) in values {
            merged.insert(key.clone(), value.clone());
        }
        let settings: Settings = serde_json::from_value(Value::Object(merged))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_map(&self) -> SettingsResult<SettingsMap> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(SettingsError::Invalid {
                key: "settings".to_string(),
                reason: format!("expected an object, found {other}"),
            }),
        }
    }

    pub fn validate(&self) -> SettingsResult<()> {
        for (key, minutes) in [
            ("work_minutes", self.work_minutes),
            ("break_minutes", self.break_minutes),
        ] {
            if !(1..=MAX_MINUTES).contains(&minutes) {
                return Err(invalid(key, "must be between 1 and 1440"));
            }
        }
        let fractions = [
            ("work_volume", self.work_volume),
            ("break_volume", self.break_volume),
            ("bg_opacity", self.visuals.bg_opacity),
            ("text_opacity", self.visuals.text_opacity),
            ("orange_opacity", self.visuals.orange_opacity),
        ];
        for (key, value) in fractions {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(invalid(key, "must be within [0, 1]"));
            }
        }
        if self.visuals.text_size == 0 {
            return Err(invalid("text_size", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> SettingsError {
    SettingsError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

pub fn load_settings(store: &dyn SettingsStore) -> SettingsResult<Settings> {
    Settings::from_map(&store.load()?)
}

/// Saves a snapshot, keeping keys this crate does not know about.
pub fn save_settings(store: &dyn SettingsStore, settings: &Settings) -> SettingsResult<()> {
    settings.validate()?;
    let mut values = match store.load() {
        Ok(values) => values,
        Err(err) => {
            tracing::warn!(error = %err, "overwriting unreadable settings");
            SettingsMap::new()
        }
    };
    values.extend(settings.to_map()?);
    store.save(&values)
}

#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/focus-timer/settings.json`, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SETTINGS_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_json(&self, value: &SettingsMap) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = self.path.with_extension("tmp");
        let file = fs::File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        match fs::rename(&temp_path, &self.path) {
            Ok(()) => Ok(()),
            Err(_err) if self.path.exists() => {
                let _ = fs::remove_file(&self.path);
                fs::rename(&temp_path, &self.path).map_err(SettingsError::from)
            }
            Err(err) => Err(SettingsError::from(err)),
        }
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> SettingsResult<SettingsMap> {
        if !self.path.exists() {
            return Ok(SettingsMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(SettingsMap::new());
        }
        match serde_json::from_str(&contents)? {
            Value::Object(map) => Ok(map),
            _ => Err(invalid("settings", "top level must be an object")),
        }
    }

    fn save(&self, values: &SettingsMap) -> SettingsResult<()> {
        self.write_json(values)?;
        tracing::debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonSettingsStore, SettingsError, SettingsStore, load_settings, save_settings};
    use crate::models::{Settings, TimerStyle};
    use serde_json::json;
    use std::fs;

    fn store_in(dir: &tempfile::TempDir) -> JsonSettingsStore {
        JsonSettingsStore::new(dir.path().join("nested").join("settings.json"))
    }

    fn as_map(value: serde_json::Value) -> super::SettingsMap {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = store_in(&dir);
        let settings = load_settings(&store).expect("load");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_map_fills_defaults() {
        let settings = Settings::from_map(&as_map(json!({
            "work_minutes": 50,
            "is_muted": true,
            "timer_style": "text"
        })))
        .expect("parse");
        assert_eq!(settings.work_minutes, 50);
        assert_eq!(settings.break_minutes, 5);
        assert!(settings.is_muted);
        assert_eq!(settings.visuals.timer_style, TimerStyle::Text);
    }

    #[test]
    fn wrong_type_is_malformed() {
        let err = Settings::from_map(&as_map(json!({ "work_minutes": "ten" })))
            .expect_err("should fail");
        assert!(matches!(err, SettingsError::Malformed(_)));
    }

    #[test]
    fn negative_minutes_are_malformed() {
        let err = Settings::from_map(&as_map(json!({ "break_minutes": -5 })))
            .expect_err("should fail");
        assert!(matches!(err, SettingsError::Malformed(_)));
    }

    #[test]
    fn out_of_range_values_are_invalid() {
        let err = Settings::from_map(&as_map(json!({ "work_minutes": 0 })))
            .expect_err("should fail");
        assert!(matches!(err, SettingsError::Invalid { ref key, .. } if key == "work_minutes"));

        let err = Settings::from_map(&as_map(json!({ "break_volume": 1.5 })))
            .expect_err("should fail");
        assert!(matches!(err, SettingsError::Invalid { ref key, .. } if key == "break_volume"));
    }

    #[test]
    fn save_and_load_roundtrip_keeps_unknown_keys() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = store_in(&dir);
        store
            .save(&as_map(json!({ "window_x": 120, "work_minutes": 25 })))
            .expect("seed");

        let settings = Settings {
            work_minutes: 45,
            work_log_enabled: true,
            ..Settings::default()
        };
        save_settings(&store, &settings).expect("save");

        let raw = store.load().expect("raw load");
        assert_eq!(raw.get("window_x"), Some(&json!(120)));
        assert_eq!(load_settings(&store).expect("load"), settings);
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn non_object_file_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        fs::write(store.path(), "[1, 2, 3]").expect("write");
        let err = load_settings(&store).expect_err("should fail");
        assert!(matches!(err, SettingsError::Invalid { .. }));
    }

    #[test]
    fn empty_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        fs::write(store.path(), "  \n").expect("write");
        assert_eq!(load_settings(&store).expect("load"), Settings::default());
    }
}
