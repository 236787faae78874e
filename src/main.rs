use anyhow::{Context, Result};
use clap::Parser;
use focus_timer::settings_store::load_settings;
use focus_timer::audio_manager::SoundPlaybackReason;
use focus_timer::{
    AppErrorPayload, Clock, DisplaySink, InMemoryStartup, JsonSettingsStore, Phase, PromptKind,
    PromptRequest, Settings, SharedRuntime, SilentPlayer, TimerRuntime, VisualSettings,
};
use notify::{Event, RecursiveMode, Watcher};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::filter::EnvFilter;

const PROGRESS_WIDTH: usize = 20;
const DEFAULT_LOG_FILTER: &str = "focus_timer=info";

#[derive(Debug, Parser)]
#[command(name = "focus-timer", version, about = "Work/break interval timer for the terminal")]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Override the work duration for this run
    #[arg(long, value_name = "MINUTES")]
    work_minutes: Option<u32>,

    /// Override the break duration for this run
    #[arg(long, value_name = "MINUTES")]
    break_minutes: Option<u32>,

    /// Start muted
    #[arg(long)]
    muted: bool,

    /// Clock period in milliseconds
    #[arg(long, default_value_t = 1000, hide = true)]
    tick_millis: u64,
}

impl Cli {
    fn apply_overrides(&self, mut settings: Settings) -> Settings {
        if let Some(minutes) = self.work_minutes {
            settings.work_minutes = minutes;
        }
        if let Some(minutes) = self.break_minutes {
            settings.break_minutes = minutes;
        }
        if self.muted {
            settings.is_muted = true;
        }
        settings
    }
}

struct TerminalDisplay {
    phase: Phase,
}

impl DisplaySink for TerminalDisplay {
    fn show_remaining(&mut self, remaining_display: &str, progress: f32) {
        let filled = ((progress * PROGRESS_WIDTH as f32).round() as usize).min(PROGRESS_WIDTH);
        let bar = format!(
            "{}{}",
            "#".repeat(filled),
            "-".repeat(PROGRESS_WIDTH - filled)
        );
        let mut stdout = std::io::stdout().lock();
        let _ = write!(
            stdout,
            "\r{:<5} {remaining_display} [{bar}] {:>3.0}%",
            self.phase.as_str(),
            progress * 100.0
        );
        let _ = stdout.flush();
    }

    fn show_phase(&mut self, phase: Phase) {
        self.phase = phase;
        println!();
        println!("== {} ==", phase.as_str().to_uppercase());
    }

    fn apply_visuals(&mut self, visuals: &VisualSettings, phase: Phase) {
        tracing::debug!(
            color = visuals.color_for(phase),
            style = ?visuals.timer_style,
            "visuals updated"
        );
    }

    fn show_prompt(&mut self, prompt: &PromptRequest) {
        println!();
        match prompt.kind {
            PromptKind::Logging => println!("work session finished: what did you do? (a/d)"),
            PromptKind::Planning => println!("what is next? (a/d)"),
        }
    }

    fn show_error(&mut self, error: &AppErrorPayload) {
        println!();
        println!("! {}", error.message);
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Watches the settings file's directory; the file itself is replaced on save.
fn watch_settings(path: &Path) -> Result<(notify::RecommendedWatcher, mpsc::Receiver<()>)> {
    let (tx, rx) = mpsc::channel(1);
    let file_name = path.file_name().map(|name| name.to_os_string());
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let touches_settings = event
                .paths
                .iter()
                .any(|changed| changed.file_name() == file_name.as_deref());
            if touches_settings && (event.kind.is_modify() || event.kind.is_create()) {
                // A full channel already holds a pending reload.
                let _ = tx.try_send(());
            }
        }
        Err(err) => tracing::warn!(error = %err, "settings watcher error"),
    })?;
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating settings directory {}", dir.display()))?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok((watcher, rx))
}

fn reload_settings(cli: &Cli, store: &JsonSettingsStore, runtime: &SharedRuntime) {
    let settings = match load_settings(store) {
        Ok(settings) => cli.apply_overrides(settings),
        Err(err) => {
            tracing::warn!(error = %err, "ignoring unreadable settings");
            return;
        }
    };
    let Ok(mut runtime) = runtime.lock() else {
        tracing::error!("runtime lock poisoned");
        return;
    };
    match runtime.apply_settings(settings) {
        Ok(commands) if commands.is_empty() => {}
        Ok(commands) => tracing::info!(?commands, "settings reloaded"),
        Err(err) => tracing::warn!(error = %err, "settings rejected"),
    }
}

fn handle_command(line: &str, runtime: &SharedRuntime) -> bool {
    let Ok(mut runtime) = runtime.lock() else {
        tracing::error!("runtime lock poisoned");
        return false;
    };
    match line.trim() {
        "s" | "stop" => runtime.stop(),
        "r" | "resume" => runtime.resume(),
        "n" | "new" => {
            runtime.stop();
            runtime.start();
        }
        "a" | "accept" | "d" | "dismiss" if runtime.prompts().is_empty() => {
            println!("\nno pending prompt");
        }
        "a" | "accept" => {
            let _ = runtime.accept_prompt();
        }
        "d" | "dismiss" => {
            let _ = runtime.dismiss_prompt();
        }
        "q" | "quit" => return false,
        "" => {}
        other => println!("\nunknown command `{other}` (s, r, n, a, d, q)"),
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let path = cli
        .settings
        .clone()
        .unwrap_or_else(JsonSettingsStore::default_path);
    let store = JsonSettingsStore::new(&path);
    let settings = cli.apply_overrides(
        load_settings(&store).with_context(|| format!("loading {}", path.display()))?,
    );
    tracing::info!(path = %path.display(), "settings loaded");

    let mut runtime = TimerRuntime::new(
        settings,
        Box::new(SilentPlayer),
        Box::new(TerminalDisplay { phase: Phase::Work }),
        Box::new(InMemoryStartup::default()),
    )?;
    runtime.start();
    let runtime = runtime.into_shared();

    let clock = Clock::new(Duration::from_millis(cli.tick_millis.max(1)))
        .spawn(std::sync::Arc::clone(&runtime));
    let (_watcher, mut reloads) = watch_settings(&path)?;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            Some(()) = reloads.recv() => reload_settings(&cli, &store, &runtime),
            line = stdin.next_line(), if stdin_open => match line? {
                Some(line) if handle_command(&line, &runtime) => {}
                Some(_) => break,
                None => {
                    tracing::info!("stdin closed, running until ctrl-c");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let delivered = clock.stop().await;
    println!();
    if let Ok(runtime) = runtime.lock() {
        let failed = runtime
            .audio()
            .logs()
            .filter(|record| record.reason == SoundPlaybackReason::PlaybackFailed)
            .count();
        tracing::info!(delivered, failed_playbacks = failed, "shutting down");
    }
    Ok(())
}
