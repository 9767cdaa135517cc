//! WebMux interactive client.
//!
//! Wires the multiplexer core to a real terminal and a real HTTP backend:
//! raw-mode key events feed the engine, geometry changes feed the resize
//! subscription channel, and the display surface is mirrored to stdout.
//! Logs go to a file; the client owns the terminal.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::cursor::{MoveTo, MoveToColumn};
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{event, execute, queue};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

use mux::config::{default_config_path, Config};
use mux::editor;
use mux::resize::spawn_geometry_watcher;
use mux::{ControlAction, HttpBackend, Multiplexer, MuxEvent, SessionId, ViewportSize};

/// WebMux - terminal multiplexer over a remote execution backend.
#[derive(Parser, Debug)]
#[command(name = "webmux")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides the config file)
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands for the client.
#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Write the default configuration file and exit
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    // Apply environment variable and command-line overrides
    config.apply_env_overrides();
    if let Some(url) = cli.url {
        config.backend.base_url = url;
    }
    if cli.verbose {
        config.log.level = "debug".to_string();
    }

    config.validate()?;

    match cli.command {
        Some(Commands::InitConfig { force }) => init_config(force),
        None => run_client(config).await,
    }
}

/// Writes the default configuration to the default path.
fn init_config(force: bool) -> Result<()> {
    let path = default_config_path();
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    Config::default().save(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Initializes file-based logging and returns the flush guard.
fn init_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(&config.log.dir).with_context(|| {
        format!(
            "Failed to create log directory: {}",
            config.log.dir.display()
        )
    })?;

    let appender = tracing_appender::rolling::daily(&config.log.dir, "webmux.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log.level)?)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

/// Runs the interactive client until shutdown.
async fn run_client(config: Config) -> Result<()> {
    let _guard = init_logging(&config)?;
    tracing::info!(base_url = %config.backend.base_url, "WebMux client starting");

    let backend = Arc::new(HttpBackend::new(&config.backend.base_url));
    let viewport = terminal::size()
        .map(|(cols, rows)| ViewportSize::new(cols, rows))
        .unwrap_or_default();

    let mut mux = Multiplexer::new(
        backend,
        config.terminal.prompt_cwd.as_str(),
        viewport,
        config.terminal.scrollback,
    );
    let events = mux.sender();

    // One session exists from startup.
    let _ = events.send(MuxEvent::Control(ControlAction::CreateSession));

    // Geometry changes flow through a subscription channel into the
    // engine's resize coordination.
    let (size_tx, size_rx) = watch::channel(viewport);
    let _watcher = spawn_geometry_watcher(size_rx, events.clone());

    terminal::enable_raw_mode().context("Failed to enable raw terminal mode")?;
    let _input = spawn_input_reader(events, size_tx);

    let result = drive(&mut mux).await;

    terminal::disable_raw_mode().context("Failed to restore terminal mode")?;
    println!();
    result
}

/// Event loop: applies each event, then mirrors the display to stdout.
async fn drive(mux: &mut Multiplexer) -> Result<()> {
    let mut renderer = Renderer::default();
    while let Some(event) = mux.recv().await {
        let keep_going = mux.handle_event(event).await;
        renderer.sync(mux)?;
        if !keep_going {
            break;
        }
    }
    Ok(())
}

/// A key mapped to either an editor event or a session-control chord.
enum MappedKey {
    Editor(editor::KeyEvent),
    Control(ControlAction),
}

/// Maps a terminal key event onto the core's input vocabulary.
///
/// Control chords drive session management; any other modified key is
/// forwarded as a reserved-shortcut event, which the editor ignores.
fn map_key(key: event::KeyEvent) -> Option<MappedKey> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let meta = key.modifiers.contains(KeyModifiers::META)
        || key.modifiers.contains(KeyModifiers::SUPER);

    if ctrl {
        if let KeyCode::Char(c) = key.code {
            match c {
                'c' => return Some(MappedKey::Control(ControlAction::Shutdown)),
                't' => return Some(MappedKey::Control(ControlAction::CreateSession)),
                'w' => return Some(MappedKey::Control(ControlAction::CloseActive)),
                'o' => return Some(MappedKey::Control(ControlAction::CycleSession)),
                'r' => return Some(MappedKey::Control(ControlAction::Fit)),
                _ => {}
            }
        }
    }

    if ctrl || alt || meta {
        return Some(MappedKey::Editor(editor::KeyEvent::Modified));
    }

    match key.code {
        KeyCode::Char(c) => Some(MappedKey::Editor(editor::KeyEvent::Char(c))),
        KeyCode::Backspace => Some(MappedKey::Editor(editor::KeyEvent::Backspace)),
        KeyCode::Enter => Some(MappedKey::Editor(editor::KeyEvent::Submit)),
        KeyCode::Up => Some(MappedKey::Editor(editor::KeyEvent::HistoryPrev)),
        KeyCode::Down => Some(MappedKey::Editor(editor::KeyEvent::HistoryNext)),
        _ => None,
    }
}

/// Reads terminal events on a dedicated thread.
///
/// Keys become engine events; resizes feed the geometry watch channel.
fn spawn_input_reader(
    events: mpsc::UnboundedSender<MuxEvent>,
    sizes: watch::Sender<ViewportSize>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) => match map_key(key) {
                Some(MappedKey::Control(action)) => {
                    let shutdown = action == ControlAction::Shutdown;
                    if events.send(MuxEvent::Control(action)).is_err() || shutdown {
                        break;
                    }
                }
                Some(MappedKey::Editor(key)) => {
                    if events.send(MuxEvent::Key(key)).is_err() {
                        break;
                    }
                }
                None => {}
            },
            Ok(Event::Resize(cols, rows)) => {
                let _ = sizes.send(ViewportSize::new(cols, rows));
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!(error = %err, "Failed to read terminal input");
                break;
            }
        }
    })
}

/// Mirrors the active session's display state to stdout.
///
/// Sealed lines are printed once; the live prompt line is rewritten in
/// place after every event.
#[derive(Default)]
struct Renderer {
    session: Option<SessionId>,
    seen: u64,
    shown_empty: bool,
}

impl Renderer {
    fn sync(&mut self, mux: &Multiplexer) -> Result<()> {
        let mut out = io::stdout();

        let Some(active) = mux.registry().active().cloned() else {
            if !self.shown_empty {
                execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
                write!(out, "No open sessions. Ctrl+T creates one, Ctrl+C quits.\r\n")?;
                out.flush()?;
                self.session = None;
                self.seen = 0;
                self.shown_empty = true;
            }
            return Ok(());
        };
        self.shown_empty = false;

        let lines = mux.surface().render_lines(&active);
        let total = mux.surface().sealed_total(&active);

        let switched = self.session.as_ref() != Some(&active);
        let shrunk = total < self.seen;
        let fresh = if switched || shrunk {
            // New session on screen, or the transcript was cleared: start
            // from an empty screen and replay everything visible.
            queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
            self.session = Some(active.clone());
            lines.len()
        } else {
            (total - self.seen) as usize
        };
        self.seen = total;

        let start = lines.len().saturating_sub(fresh);
        for line in &lines[start..] {
            queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
            write!(out, "{line}\r\n")?;
        }

        let live = mux.surface().live_line(&active).unwrap_or_default();
        queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        write!(out, "{live}")?;
        out.flush()?;
        Ok(())
    }
}
