//! Panels for the ingest dashboard

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};
use ratatui::Frame;

use super::{Phase, Progress};

/// Phase and store path
pub struct StatusPanel {
    phase: Phase,
    info: String,
    failed: bool,
}

impl StatusPanel {
    pub fn new() -> Self {
        Self {
            phase: Phase::Preparing,
            info: String::new(),
            failed: false,
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_info(&mut self, info: impl Into<String>) {
        self.info = info.into();
    }

    pub fn set_failed(&mut self, failed: bool) {
        self.failed = failed;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let color = if self.failed {
            Color::Red
        } else if self.phase == Phase::Complete {
            Color::Green
        } else {
            Color::Cyan
        };
        let phase_style = Style::default().fg(color).add_modifier(Modifier::BOLD);

        let indicator = match (&self.phase, self.failed) {
            (_, true) => "✗",
            (Phase::Preparing, _) => "◐",
            (Phase::Unpacking, _) => "⤷",
            (Phase::LoadingDeployments, _) | (Phase::LoadingStatuses, _) => "⚙",
            (Phase::Complete, _) => "✓",
        };
        let title = if self.failed {
            format!("{} (failed)", self.phase)
        } else {
            self.phase.to_string()
        };

        let lines = vec![
            Line::from(vec![
                Span::styled(format!(" {} ", indicator), phase_style),
                Span::styled(title, phase_style),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::raw("   "),
                Span::styled(&self.info, Style::default().fg(Color::Gray)),
            ]),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Polar Bear Telemetry ")
            .border_style(Style::default().fg(Color::Blue));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

/// Row counter for the table being loaded
pub struct ProgressPanel {
    progress: Option<Progress>,
}

impl ProgressPanel {
    pub fn new() -> Self {
        Self { progress: None }
    }

    pub fn set_progress(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }

    pub fn clear(&mut self) {
        self.progress = None;
    }

    fn label(progress: &Progress) -> String {
        if progress.total > 0 {
            format!(
                "{}: {}/{} rows ({:.0}%)",
                progress.label,
                progress.current,
                progress.total,
                progress.ratio() * 100.0
            )
        } else {
            format!("{}: {} rows", progress.label, progress.current)
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .border_style(Style::default().fg(Color::Blue));

        match &self.progress {
            Some(progress) => {
                let gauge = Gauge::default()
                    .block(block)
                    .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
                    .ratio(progress.ratio().clamp(0.0, 1.0))
                    .label(Self::label(progress));
                frame.render_widget(gauge, area);
            }
            None => frame.render_widget(Paragraph::new("").block(block), area),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Most recent activity, newest at the bottom
pub struct LogPanel {
    entries: Vec<(LogLevel, String)>,
    max_entries: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            max_entries: 200,
        }
    }

    pub fn add(&mut self, level: LogLevel, message: impl Into<String>) {
        self.entries.push((level, message.into()));
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Activity ")
            .border_style(Style::default().fg(Color::Blue));

        let visible = area.height.saturating_sub(2) as usize;
        let start = self.entries.len().saturating_sub(visible);

        let items: Vec<ListItem> = self.entries[start..]
            .iter()
            .map(|(level, entry)| {
                let (prefix, color) = match level {
                    LogLevel::Info => (" ", Color::Gray),
                    LogLevel::Warn => ("!", Color::Yellow),
                    LogLevel::Error => ("✗", Color::Red),
                };
                ListItem::new(Span::styled(
                    format!("{} {}", prefix, entry),
                    Style::default().fg(color),
                ))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}
