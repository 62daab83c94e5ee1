//! Progress reporting for long-running commands
//!
//! Three front ends share the [`Ui`] trait:
//! - [`LogUi`] writes through `tracing` (default)
//! - [`UiApp`] draws a ratatui dashboard (`--tui`)
//! - [`SilentUi`] discards everything (tests)

mod components;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use components::{LogLevel, LogPanel, ProgressPanel, StatusPanel};

/// Application phases shown in the status panel
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Preparing,
    Unpacking,
    LoadingDeployments,
    LoadingStatuses,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Preparing => write!(f, "Preparing store"),
            Phase::Unpacking => write!(f, "Unpacking dataset"),
            Phase::LoadingDeployments => write!(f, "Loading deployments"),
            Phase::LoadingStatuses => write!(f, "Loading statuses"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

/// Progress information for the current operation
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub label: String,
}

impl Progress {
    pub fn new(current: u64, total: u64, label: impl Into<String>) -> Self {
        Self {
            current,
            total,
            label: label.into(),
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Sink for phase, progress and log updates.
///
/// Generic rather than object-safe so callers can pass `&str`, `String` or
/// `format!` output without allocating twice.
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_info(&mut self, info: impl Into<String>);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn clear_progress(&mut self);
    fn log(&mut self, message: impl Into<String>);

    /// Data-quality notice that does not stop the run
    fn warn(&mut self, message: impl Into<String>) {
        self.log(message);
    }
}

/// Minimum gap between progress redraws
const REDRAW_INTERVAL: Duration = Duration::from_millis(50);

/// Full-screen ingest dashboard
pub struct UiApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    status: StatusPanel,
    progress: ProgressPanel,
    log: LogPanel,
    last_draw: Option<Instant>,
}

impl UiApp {
    /// Switch to the alternate screen in raw mode
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            status: StatusPanel::new(),
            progress: ProgressPanel::new(),
            log: LogPanel::new(),
            last_draw: None,
        })
    }

    fn draw(&mut self) -> Result<()> {
        let (status, progress, log) = (&self.status, &self.progress, &self.log);

        self.terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(5),
                    Constraint::Length(3),
                    Constraint::Min(5),
                ])
                .split(frame.area());

            status.render(frame, chunks[0]);
            progress.render(frame, chunks[1]);
            log.render(frame, chunks[2]);
        })?;

        self.last_draw = Some(Instant::now());
        Ok(())
    }

    /// Progress updates arrive in bursts; skip frames that would land too close together
    fn draw_throttled(&mut self) {
        let due = self
            .last_draw
            .map_or(true, |at| at.elapsed() >= REDRAW_INTERVAL);
        if due {
            self.draw().ok();
        }
    }

    /// Show the final summary, wait for a key, then restore the terminal
    pub fn finish(mut self, summary: &[String]) -> Result<()> {
        self.status.set_phase(Phase::Complete);
        self.progress.clear();
        for line in summary {
            self.log.add(LogLevel::Info, line.clone());
        }
        self.log.add(LogLevel::Info, "Press any key to exit...");
        self.draw()?;
        self.wait_for_key()?;
        self.restore()
    }

    /// Show a fatal error, wait for a key, then restore the terminal
    pub fn fail(mut self, error: &str) -> Result<()> {
        self.status.set_failed(true);
        self.log.add(LogLevel::Error, error);
        self.log.add(LogLevel::Info, "Press any key to exit...");
        self.draw()?;
        self.wait_for_key()?;
        self.restore()
    }

    fn wait_for_key(&mut self) -> Result<()> {
        loop {
            if event::poll(Duration::from_millis(100))? {
                if let CrosstermEvent::Key(KeyEvent {
                    kind: KeyEventKind::Press,
                    ..
                }) = event::read()?
                {
                    return Ok(());
                }
            }
        }
    }

    /// Restore the terminal without waiting
    pub fn restore(mut self) -> Result<()> {
        terminal::disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Ui for UiApp {
    fn set_phase(&mut self, phase: Phase) {
        self.status.set_phase(phase);
        self.draw().ok();
    }

    fn set_info(&mut self, info: impl Into<String>) {
        self.status.set_info(info);
        self.draw().ok();
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        self.progress
            .set_progress(Progress::new(current, total, label));
        self.draw_throttled();
    }

    fn clear_progress(&mut self) {
        self.progress.clear();
        self.draw().ok();
    }

    fn log(&mut self, message: impl Into<String>) {
        self.log.add(LogLevel::Info, message);
        self.draw().ok();
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.log.add(LogLevel::Warn, message);
        self.draw().ok();
    }
}

impl Drop for UiApp {
    fn drop(&mut self) {
        // Also runs after restore(); every call here is idempotent
        terminal::disable_raw_mode().ok();
        self.terminal
            .backend_mut()
            .execute(LeaveAlternateScreen)
            .ok();
        self.terminal.show_cursor().ok();
    }
}

/// Forwards progress and log lines to `tracing`
#[derive(Default)]
pub struct LogUi {
    last_percent: Option<u64>,
}

impl LogUi {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ui for LogUi {
    fn set_phase(&mut self, phase: Phase) {
        self.last_percent = None;
        info!("{}", phase);
    }

    fn set_info(&mut self, info: impl Into<String>) {
        info!("{}", info.into());
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        // One line per 10% step, not per update
        let percent = (Progress::new(current, total, "").ratio() * 10.0) as u64 * 10;
        if total > 0 && self.last_percent != Some(percent) {
            self.last_percent = Some(percent);
            debug!(current, total, "{}: {}%", label.into(), percent);
        }
    }

    fn clear_progress(&mut self) {
        self.last_percent = None;
    }

    fn log(&mut self, message: impl Into<String>) {
        info!("{}", message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        warn!("{}", message.into());
    }
}

/// Silent UI implementation for testing and non-interactive use
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_info(&mut self, _info: impl Into<String>) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, _message: impl Into<String>) {}
}
