//! Settings reconciliation.
//!
//! Turns an old/new snapshot pair into the smallest batch of commands for the running
//! engine and its collaborators. Durations and audio are compared against what is live
//! right now, not against the old snapshot, so a snapshot that already matches the
//! running state produces nothing. Applying the same snapshot twice is a no-op the
//! second time.

use crate::models::{Phase, Settings, VisualSettings};
use crate::settings_store::SettingsResult;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileCommand {
    UpdateDurations {
        work_minutes: u32,
        break_minutes: u32,
    },
    SetVolume {
        phase: Phase,
        value: f32,
    },
    SetMute(bool),
    ApplyVisuals(VisualSettings),
    SetWorkLogEnabled(bool),
    SetRunAtStartup(bool),
}

/// Values observed on the running system at reconciliation time.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveState {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub work_volume: f32,
    pub break_volume: f32,
    pub muted: bool,
    /// `None` when the startup registration could not be observed; the flag is then
    /// left alone.
    pub startup_registered: Option<bool>,
}

/// Plans the commands for `new`. A malformed snapshot fails before any command is
/// produced. `UpdateDurations`, the only command the engine can refuse, always comes
/// first so a refusal happens before anything else is applied.
pub fn plan(
    old: &Settings,
    new: &Settings,
    live: &LiveState,
) -> SettingsResult<Vec<ReconcileCommand>> {
    new.validate()?;
    let mut commands = Vec::new();

    if new.work_minutes != live.work_minutes || new.break_minutes != live.break_minutes {
        commands.push(ReconcileCommand::UpdateDurations {
            work_minutes: new.work_minutes,
            break_minutes: new.break_minutes,
        });
    }

    for (phase, live_volume) in [
        (Phase::Work, live.work_volume),
        (Phase::Break, live.break_volume),
    ] {
        let value = new.volume_for(phase);
        if value != live_volume {
            commands.push(ReconcileCommand::SetVolume { phase, value });
        }
    }
    if new.is_muted != live.muted {
        commands.push(ReconcileCommand::SetMute(new.is_muted));
    }

    if new.visuals != old.visuals {
        commands.push(ReconcileCommand::ApplyVisuals(new.visuals.clone()));
    }
    if new.work_log_enabled != old.work_log_enabled {
        commands.push(ReconcileCommand::SetWorkLogEnabled(new.work_log_enabled));
    }

    match live.startup_registered {
        Some(registered) if registered != new.run_at_startup => {
            commands.push(ReconcileCommand::SetRunAtStartup(new.run_at_startup));
        }
        Some(_) => {}
        None => tracing::debug!("startup registration unknown, leaving it unchanged"),
    }

    tracing::debug!(commands = commands.len(), "settings reconciliation planned");
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::{LiveState, ReconcileCommand, plan};
    use crate::models::{Phase, Settings};
    use crate::settings_store::SettingsError;

    fn live_for(settings: &Settings) -> LiveState {
        LiveState {
            work_minutes: settings.work_minutes,
            break_minutes: settings.break_minutes,
            work_volume: settings.work_volume,
            break_volume: settings.break_volume,
            muted: settings.is_muted,
            startup_registered: Some(settings.run_at_startup),
        }
    }

    #[test]
    fn identical_state_plans_nothing() {
        let settings = Settings::default();
        let commands = plan(&settings, &settings, &live_for(&settings)).expect("plan");
        assert!(commands.is_empty());
    }

    #[test]
    fn duration_change_is_compared_to_live_engine() {
        let old = Settings::default();
        let new = Settings {
            work_minutes: 50,
            ..old.clone()
        };
        let live = live_for(&new);
        assert!(plan(&old, &new, &live).expect("plan").is_empty());

        let live = live_for(&old);
        assert_eq!(
            plan(&old, &new, &live).expect("plan"),
            vec![ReconcileCommand::UpdateDurations {
                work_minutes: 50,
                break_minutes: 5
            }]
        );
    }

    #[test]
    fn audio_and_visual_changes_are_forwarded() {
        let old = Settings::default();
        let mut new = old.clone();
        new.break_volume = 0.2;
        new.is_muted = true;
        new.visuals.break_color = "#123456".to_string();
        new.work_log_enabled = true;

        let commands = plan(&old, &new, &live_for(&old)).expect("plan");
        assert_eq!(
            commands,
            vec![
                ReconcileCommand::SetVolume {
                    phase: Phase::Break,
                    value: 0.2
                },
                ReconcileCommand::SetMute(true),
                ReconcileCommand::ApplyVisuals(new.visuals.clone()),
                ReconcileCommand::SetWorkLogEnabled(true),
            ]
        );
    }

    #[test]
    fn startup_follows_observed_state() {
        let old = Settings::default();
        let new = Settings {
            run_at_startup: false,
            ..old.clone()
        };
        let mut live = live_for(&old);
        live.startup_registered = Some(false);
        assert!(plan(&old, &new, &live).expect("plan").is_empty());

        live.startup_registered = Some(true);
        assert_eq!(
            plan(&old, &new, &live).expect("plan"),
            vec![ReconcileCommand::SetRunAtStartup(false)]
        );

        live.startup_registered = None;
        assert!(plan(&old, &new, &live).expect("plan").is_empty());
    }

    #[test]
    fn malformed_snapshot_fails_fast() {
        let old = Settings::default();
        let new = Settings {
            work_minutes: 0,
            work_volume: 0.1,
            ..old.clone()
        };
        let err = plan(&old, &new, &live_for(&old)).expect_err("should fail");
        assert!(matches!(err, SettingsError::Invalid { ref key, .. } if key == "work_minutes"));
    }

    #[test]
    fn durations_are_planned_first() {
        let old = Settings::default();
        let mut new = old.clone();
        new.work_volume = 0.9;
        new.break_minutes = 10;
        let commands = plan(&old, &new, &live_for(&old)).expect("plan");
        assert!(matches!(
            commands.first(),
            Some(ReconcileCommand::UpdateDurations { .. })
        ));
    }
}
