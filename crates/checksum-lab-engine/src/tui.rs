use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::lab::Lab;
use checksum_lab_abstract::TraceStep;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};
use tracing::warn;

const MAX_LOG_LINES: usize = 1000;

/// A tracing writer that keeps recent log lines for the log pane.
#[derive(Clone)]
pub struct MemoryLogBuffer {
    logs: Arc<Mutex<VecDeque<String>>>,
}

impl Default for MemoryLogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLogBuffer {
    pub fn new() -> Self {
        Self {
            logs: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn push(&self, msg: String) {
        let Ok(mut logs) = self.logs.lock() else {
            return;
        };
        if logs.len() == MAX_LOG_LINES {
            logs.pop_front();
        }
        logs.push_back(msg);
    }

    /// The newest `count` lines, oldest first.
    pub fn tail(&self, count: usize) -> Vec<String> {
        match self.logs.lock() {
            Ok(logs) => logs
                .iter()
                .skip(logs.len().saturating_sub(count))
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl io::Write for MemoryLogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        self.push(s.trim().to_string());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct TuiApp {
    lab: Lab,
    logs: Option<MemoryLogBuffer>,
    scroll: u16,
    status: String,
}

impl TuiApp {
    pub fn new(lab: Lab, logs: Option<MemoryLogBuffer>) -> Self {
        Self {
            lab,
            logs,
            scroll: 0,
            status: String::new(),
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        self.refresh();
        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    pub fn into_lab(self) -> Lab {
        self.lab
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        loop {
            terminal.draw(|f| self.ui(f))?;

            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('f') => {
                    if !self.lab.corrupt_random() {
                        self.status = "nothing on the wire to corrupt".to_string();
                    }
                    self.refresh();
                }
                KeyCode::Char('x') => {
                    self.lab.clear();
                    self.status = "wire cleared".to_string();
                }
                KeyCode::Char('r') => {
                    self.lab.resend()?;
                    self.refresh();
                }
                KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
                KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
                _ => {}
            }
        }
    }

    /// Re-run the receiver against whatever is now on the wire.
    fn refresh(&mut self) {
        match self.lab.receive() {
            Ok(Some(result)) => {
                self.status = if result.is_valid {
                    "VALID".to_string()
                } else {
                    format!("MISMATCH (sum 0x{:04X})", result.final_sum)
                };
            }
            Ok(None) => self.status = "no packet on wire".to_string(),
            Err(err) => {
                warn!("receiver failed: {err}");
                self.status = err.to_string();
            }
        }
    }

    fn ui(&self, f: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Control bar
                Constraint::Min(0),    // Sender + receiver traces
                Constraint::Length(8), // Wire events + logs
            ])
            .split(f.area());

        self.render_control(f, rows[0]);

        let mid = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        let sender = self.lab.last_sent().map(|o| o.trace.as_slice());
        let receiver = self.lab.last_verification().map(|v| v.trace.as_slice());
        self.render_trace(f, mid[0], "Sender", sender);
        self.render_trace(f, mid[1], "Receiver", receiver);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[2]);
        self.render_wire_events(f, bottom[0]);
        self.render_logs(f, bottom[1]);
    }

    fn render_control(&self, f: &mut Frame, area: Rect) {
        let packet = match self.lab.wire().current() {
            Some(p) => format!("'{}' checksum=0x{:04X}", p.data, p.checksum),
            None => "<empty>".to_string(),
        };
        let text = format!(
            "Wire: {} | Receiver: {} | (q)uit (f)lip bit (x) clear (r)esend, Up/Down scroll",
            packet, self.status
        );
        let block =
            Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Control"));
        f.render_widget(block, area);
    }

    fn render_trace(&self, f: &mut Frame, area: Rect, title: &str, steps: Option<&[TraceStep]>) {
        let Some(steps) = steps else {
            let block = Paragraph::new("No trace yet")
                .block(Block::default().borders(Borders::ALL).title(title.to_string()));
            f.render_widget(block, area);
            return;
        };

        let mut lines: Vec<Line> = Vec::new();
        for step in steps {
            lines.push(Line::from(Span::styled(
                step.title.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )));
            for line in &step.lines {
                let style = if line.contains("CARRY WRAP") || line.contains("Carry Wrapped") {
                    Style::default().fg(Color::Yellow)
                } else if line.contains("MISMATCH") {
                    Style::default().fg(Color::Red)
                } else if line.contains("VALID") || line.starts_with("CHECKSUM") {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                lines.push(Line::from(Span::styled(format!("  {line}"), style)));
            }
        }

        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .scroll((self.scroll, 0));
        f.render_widget(widget, area);
    }

    fn render_wire_events(&self, f: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let events = self.lab.wire().events();
        let items: Vec<ListItem> = events
            .iter()
            .skip(events.len().saturating_sub(visible))
            .map(|e| {
                let color = if e.description.starts_with("SEND") {
                    Color::Green
                } else if e.description.starts_with("CLEAR") {
                    Color::Gray
                } else {
                    Color::Red
                };
                ListItem::new(Line::from(Span::styled(
                    format!("#{:<3} {}", e.seq, e.description),
                    Style::default().fg(color),
                )))
            })
            .collect();
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Wire"));
        f.render_widget(list, area);
    }

    fn render_logs(&self, f: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let lines = self
            .logs
            .as_ref()
            .map(|buffer| buffer.tail(visible))
            .unwrap_or_default();
        let items: Vec<ListItem> = lines.into_iter().map(ListItem::new).collect();
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Log"));
        f.render_widget(list, area);
    }
}
