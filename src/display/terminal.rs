use std::{
    io::{self, Stdout, Write},
    sync::{Mutex, PoisonError},
    time::Duration,
};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, instrument, warn};

use super::{
    DisplayStatus, DisplayUpdate,
    render::{client_label, format_time, log_lines, progress_bar, truncate},
};
use crate::{MonitorError, config::DisplayConfig};

const TOP_ROW: u16 = 0;
const HEADER_ROW: u16 = 1;
const STATUS_ROW: u16 = 3;
const TITLE_ROW: u16 = 5;
const ARTIST_ROW: u16 = 6;
const ALBUM_ROW: u16 = 7;
const SEPARATOR_ROW: u16 = 8;
const PROGRESS_ROW: u16 = 9;
const BOTTOM_ROW: u16 = 10;

const LOG_WIDTH: usize = 80;

struct Span {
    color: Option<Color>,
    text: String,
}

impl Span {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            color: None,
            text: text.into(),
        }
    }

    fn colored(color: Color, text: impl Into<String>) -> Self {
        Self {
            color: Some(color),
            text: text.into(),
        }
    }
}

/// Fixed-size now-playing box drawn with cursor addressing.
///
/// Every update rewrites whole rows so the borders stay intact.
pub struct Screen<W: Write> {
    out: W,
    width: u16,
    show_logs: bool,
}

impl<W: Write> Screen<W> {
    /// Screen `width` columns wide writing to `out`.
    pub fn new(out: W, width: u16, show_logs: bool) -> Self {
        Self {
            out,
            width,
            show_logs,
        }
    }

    /// Writer the screen draws to.
    pub fn output(&self) -> &W {
        &self.out
    }

    fn inner_width(&self) -> usize {
        usize::from(self.width).saturating_sub(4)
    }

    /// Clear the terminal and draw the empty frame.
    ///
    /// # Errors
    /// Returns error if writing to the terminal fails.
    pub fn draw_frame(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), Hide)?;

        self.border(TOP_ROW, '┌', '┐')?;
        self.line(HEADER_ROW, Vec::new())?;
        self.border(HEADER_ROW + 1, '├', '┤')?;
        for row in STATUS_ROW..SEPARATOR_ROW {
            self.line(row, Vec::new())?;
        }
        self.border(SEPARATOR_ROW, '├', '┤')?;
        self.line(PROGRESS_ROW, Vec::new())?;
        self.border(BOTTOM_ROW, '└', '┘')?;

        self.out.flush()
    }

    /// Draw one update and flush.
    ///
    /// # Errors
    /// Returns error if writing to the terminal fails.
    pub fn apply(&mut self, update: &DisplayUpdate) -> io::Result<()> {
        match update {
            DisplayUpdate::Header {
                host,
                port,
                clients,
            } => self.header(host, *port, *clients)?,
            DisplayUpdate::Status { status, app_name } => self.status(*status, app_name)?,
            DisplayUpdate::Track {
                title,
                artist,
                album,
            } => self.track(title, artist, album)?,
            DisplayUpdate::Progress {
                position,
                duration,
                is_playing,
            } => self.progress(*position, *duration, *is_playing)?,
            DisplayUpdate::Log(message) => self.log(message)?,
        }

        self.out.flush()
    }

    /// Clear the screen and give the cursor back.
    ///
    /// # Errors
    /// Returns error if writing to the terminal fails.
    pub fn restore(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            MoveTo(0, 0),
            Show
        )?;
        self.out.flush()
    }

    fn header(&mut self, host: &str, port: u16, clients: usize) -> io::Result<()> {
        let left = vec![Span::colored(Color::Cyan, "♪ Media Monitor")];
        let right = vec![
            Span::plain(format!("WS: {host}:{port}  ")),
            Span::colored(Color::Green, client_label(clients)),
        ];
        let spans = self.spread(left, right);
        self.line(HEADER_ROW, spans)
    }

    fn status(&mut self, status: DisplayStatus, app_name: &str) -> io::Result<()> {
        let (color, marker) = match status {
            DisplayStatus::Playing => (Color::Green, "▶"),
            DisplayStatus::Paused => (Color::Yellow, "‖"),
            DisplayStatus::Stopped => (Color::Red, "■"),
            DisplayStatus::NoMedia => (Color::White, "○"),
        };

        let left = vec![Span::colored(color, format!("{marker} {status}"))];
        let right = if app_name.is_empty() {
            Vec::new()
        } else {
            vec![Span::colored(Color::Cyan, format!("[{app_name}]"))]
        };
        let spans = self.spread(left, right);
        self.line(STATUS_ROW, spans)
    }

    fn track(&mut self, title: &str, artist: &str, album: &str) -> io::Result<()> {
        let max = self.inner_width().saturating_sub(2);

        let rows = [
            (TITLE_ROW, Color::White, "♫", title),
            (ARTIST_ROW, Color::Cyan, "@", artist),
            (ALBUM_ROW, Color::Magenta, "◎", album),
        ];

        for (row, color, marker, text) in rows {
            let spans = if text.is_empty() {
                Vec::new()
            } else {
                vec![Span::colored(
                    color,
                    format!("{marker} {}", truncate(text, max)),
                )]
            };
            self.line(row, spans)?;
        }

        Ok(())
    }

    fn progress(&mut self, position: Duration, duration: Duration, playing: bool) -> io::Result<()> {
        let bar_width = usize::from(self.width).saturating_sub(20);
        let color = if playing { Color::Green } else { Color::Yellow };

        let spans = vec![
            Span::plain("["),
            Span::colored(color, progress_bar(position, duration, bar_width)),
            Span::plain("] "),
            Span::colored(
                Color::DarkGrey,
                format!("{} / {}", format_time(position), format_time(duration)),
            ),
        ];
        self.line(PROGRESS_ROW, spans)
    }

    fn log(&mut self, message: &str) -> io::Result<()> {
        if !self.show_logs {
            return Ok(());
        }

        let column = self.width + 1;
        for row in HEADER_ROW..=BOTTOM_ROW {
            queue!(self.out, MoveTo(column, row), Clear(ClearType::UntilNewLine))?;
        }

        let rows = usize::from(BOTTOM_ROW - HEADER_ROW + 1);
        for (row, text) in (HEADER_ROW..).zip(log_lines(message, LOG_WIDTH, rows)) {
            queue!(
                self.out,
                MoveTo(column, row),
                SetForegroundColor(Color::White),
                Print(text),
                ResetColor
            )?;
        }

        Ok(())
    }

    fn spread(&self, mut left: Vec<Span>, right: Vec<Span>) -> Vec<Span> {
        let used: usize = left
            .iter()
            .chain(right.iter())
            .map(|span| span.text.chars().count())
            .sum();
        let gap = self.inner_width().saturating_sub(used).max(1);

        left.push(Span::plain(" ".repeat(gap)));
        left.extend(right);
        left
    }

    fn border(&mut self, row: u16, left: char, right: char) -> io::Result<()> {
        let middle = "─".repeat(usize::from(self.width).saturating_sub(2));
        queue!(
            self.out,
            MoveTo(0, row),
            Print(format!("{left}{middle}{right}"))
        )
    }

    fn line(&mut self, row: u16, spans: Vec<Span>) -> io::Result<()> {
        let inner = self.inner_width();
        let mut used = 0;

        queue!(self.out, MoveTo(0, row), Print("│ "))?;

        for span in spans {
            let text = truncate(&span.text, inner - used);
            used += text.chars().count();

            if let Some(color) = span.color {
                queue!(self.out, SetForegroundColor(color))?;
            }
            queue!(self.out, Print(text), ResetColor)?;
        }

        queue!(
            self.out,
            Print(" ".repeat(inner - used)),
            Print(" │")
        )
    }
}

enum DisplayCommand {
    Render(DisplayUpdate),
    Shutdown,
}

/// Cheap, cloneable sender feeding the display.
///
/// Sending never blocks, so it is safe inside tracker listeners. Updates
/// sent after the display stopped are dropped.
#[derive(Clone)]
pub struct DisplayHandle {
    tx: UnboundedSender<DisplayCommand>,
}

impl DisplayHandle {
    /// A handle connected to nothing, for runs without a display.
    pub fn detached() -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self { tx }
    }

    /// Queue one update.
    pub fn send(&self, update: DisplayUpdate) {
        let _ = self.tx.send(DisplayCommand::Render(update));
    }
}

/// Terminal renderer running on a blocking thread.
pub struct TerminalDisplay {
    handle: DisplayHandle,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TerminalDisplay {
    /// Draw the frame on stdout and start consuming updates.
    ///
    /// # Errors
    /// Returns `MonitorError::Display` if the terminal cannot be drawn on.
    #[instrument(skip(config))]
    pub fn start(config: &DisplayConfig) -> Result<Self, MonitorError> {
        let mut screen = Screen::new(io::stdout(), config.width, config.show_logs);
        screen
            .draw_frame()
            .map_err(|e| MonitorError::Display(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::task::spawn_blocking(move || render_loop(screen, rx));

        debug!(width = config.width, "Terminal display started");
        Ok(Self {
            handle: DisplayHandle { tx },
            task: Mutex::new(Some(task)),
        })
    }

    /// Sender for updates.
    pub fn handle(&self) -> DisplayHandle {
        self.handle.clone()
    }

    /// Stop rendering, clear the screen and restore the cursor.
    pub async fn stop(&self) {
        let _ = self.handle.tx.send(DisplayCommand::Shutdown);

        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Display task failed: {e}");
            }
        }
    }
}

fn render_loop(mut screen: Screen<Stdout>, mut rx: UnboundedReceiver<DisplayCommand>) {
    while let Some(command) = rx.blocking_recv() {
        match command {
            DisplayCommand::Render(update) => {
                if let Err(e) = screen.apply(&update) {
                    warn!("Failed to draw display update: {e}");
                }
            }
            DisplayCommand::Shutdown => break,
        }
    }

    if let Err(e) = screen.restore() {
        warn!("Failed to restore terminal: {e}");
    }
}
