//! Terminal surface over crossterm
//!
//! Every character cell shows two vertically stacked pixels using the upper
//! half block glyph: the foreground color is the top pixel, the background
//! color the bottom one. A surface of `cols x rows` cells is therefore
//! `cols x 2*rows` pixels.

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{
        DisableMouseCapture, EnableMouseCapture, Event as TermEvent, EventStream, KeyCode as TermKey,
        KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use std::io::{self, stdout, Stdout, Write};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::{Surface, SurfaceEvent};
use crate::buffer::{Image, Rgba};
use crate::error::SurfaceError;
use crate::event::{Button, KeyCode, KeyEvent};

const HALF_BLOCK: char = '\u{2580}';
const EVENT_CAPACITY: usize = 16;

/// Current terminal size in pixels
pub fn pixel_size() -> io::Result<(u32, u32)> {
    let (cols, rows) = terminal::size()?;
    Ok((u32::from(cols), u32::from(rows) * 2))
}

/// Surface rendering to the controlling terminal
pub struct TerminalSurface {
    stdout: Stdout,
    screen: Image,
    /// Cells drawn by the previous flush, for diff rendering
    prev_cells: Option<Vec<(Rgba, Rgba)>>,
    events: Option<mpsc::Receiver<SurfaceEvent>>,
    reader: Option<JoinHandle<()>>,
    guard: Option<RawModeGuard>,
}

impl TerminalSurface {
    /// Open a surface of `width x height` pixels and start reading input
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(width: u32, height: u32) -> Result<Self, SurfaceError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(SurfaceError::Unavailable(
                "terminal input needs a tokio runtime".to_string(),
            ));
        }
        terminal::size().map_err(|e| SurfaceError::Unavailable(e.to_string()))?;

        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        let reader = tokio::spawn(read_events(tx));
        Ok(Self {
            stdout: stdout(),
            screen: Image::new(width, height),
            prev_cells: None,
            events: Some(rx),
            reader: Some(reader),
            guard: None,
        })
    }

    fn cells(&self) -> Vec<(Rgba, Rgba)> {
        let cols = i64::from(self.screen.width());
        let rows = i64::from(self.screen.height().div_ceil(2));
        let mut cells = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let at = |y| {
                    self.screen
                        .get(col, y)
                        .unwrap_or(Rgba::TRANSPARENT)
                        .over(Rgba::BLACK)
                };
                cells.push((at(row * 2), at(row * 2 + 1)));
            }
        }
        cells
    }

    fn draw_cell(&mut self, col: u16, row: u16, (top, bottom): (Rgba, Rgba)) -> io::Result<()> {
        queue!(
            self.stdout,
            MoveTo(col, row),
            SetForegroundColor(to_color(top)),
            SetBackgroundColor(to_color(bottom)),
            Print(HALF_BLOCK)
        )
    }
}

impl Surface for TerminalSurface {
    fn take_events(&mut self) -> Option<mpsc::Receiver<SurfaceEvent>> {
        self.events.take()
    }

    fn screen(&mut self) -> &mut Image {
        &mut self.screen
    }

    /// Draw cells that changed since the last flush
    fn flush(&mut self) -> Result<(), SurfaceError> {
        let cols = self.screen.width().max(1) as usize;
        let cells = self.cells();
        let prev = self.prev_cells.take();
        for (i, cell) in cells.iter().enumerate() {
            let unchanged = prev
                .as_ref()
                .and_then(|prev| prev.get(i))
                .is_some_and(|old| old == cell);
            if unchanged {
                continue;
            }
            let col = u16::try_from(i % cols).unwrap_or(u16::MAX);
            let row = u16::try_from(i / cols).unwrap_or(u16::MAX);
            self.draw_cell(col, row, *cell)?;
        }
        queue!(self.stdout, ResetColor)?;
        self.stdout.flush()?;
        self.prev_cells = Some(cells);
        Ok(())
    }

    fn show(&mut self) -> Result<(), SurfaceError> {
        if self.guard.is_none() {
            enable_raw_mode()?;
            execute!(self.stdout, EnterAlternateScreen, Hide, EnableMouseCapture)?;
            self.guard = Some(RawModeGuard::new());
            self.prev_cells = None;
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.screen = Image::new(width, height);
        self.prev_cells = None;
    }

    fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.guard = None;
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        self.close();
    }
}

fn to_color(p: Rgba) -> Color {
    Color::Rgb {
        r: p.r,
        g: p.g,
        b: p.b,
    }
}

/// Forward crossterm input as surface events until the stream or the
/// receiver goes away
async fn read_events(tx: mpsc::Sender<SurfaceEvent>) {
    let mut stream = EventStream::new();
    while let Some(event) = stream.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "terminal event stream failed");
                break;
            }
        };
        for event in translate(event) {
            if tx.send(event).await.is_err() {
                return;
            }
        }
    }
    trace!("terminal event reader stopped");
}

fn translate(event: TermEvent) -> Vec<SurfaceEvent> {
    match event {
        TermEvent::Key(key) if key.kind != KeyEventKind::Release => {
            let Some(code) = key_code(key.code) else {
                return Vec::new();
            };
            let key = if key.modifiers.contains(KeyModifiers::CONTROL) {
                KeyEvent::with_ctrl(code)
            } else {
                KeyEvent::new(code)
            };
            if key.is_quit() {
                vec![SurfaceEvent::Close]
            } else {
                vec![SurfaceEvent::Key(key)]
            }
        }
        TermEvent::Mouse(mouse) => {
            let x = i32::from(mouse.column);
            let y = i32::from(mouse.row) * 2;
            match mouse.kind {
                MouseEventKind::Down(b) => vec![SurfaceEvent::MouseDown { x, y, button: button(b) }],
                MouseEventKind::Up(b) => vec![SurfaceEvent::MouseUp { x, y, button: button(b) }],
                MouseEventKind::ScrollUp => wheel(x, y, Button::WheelUp),
                MouseEventKind::ScrollDown => wheel(x, y, Button::WheelDown),
                _ => Vec::new(),
            }
        }
        TermEvent::Resize(cols, rows) => vec![SurfaceEvent::Resize {
            width: u32::from(cols),
            height: u32::from(rows) * 2,
        }],
        _ => Vec::new(),
    }
}

/// Wheel notches arrive as a press immediately followed by a release
fn wheel(x: i32, y: i32, button: Button) -> Vec<SurfaceEvent> {
    vec![
        SurfaceEvent::MouseDown { x, y, button },
        SurfaceEvent::MouseUp { x, y, button },
    ]
}

fn button(b: MouseButton) -> Button {
    match b {
        MouseButton::Left => Button::Left,
        MouseButton::Middle => Button::Middle,
        MouseButton::Right => Button::Right,
    }
}

fn key_code(code: TermKey) -> Option<KeyCode> {
    Some(match code {
        TermKey::Char(c) => KeyCode::Char(c),
        TermKey::Enter => KeyCode::Enter,
        TermKey::Esc => KeyCode::Escape,
        TermKey::Tab => KeyCode::Tab,
        TermKey::Backspace => KeyCode::Backspace,
        TermKey::Left => KeyCode::Left,
        TermKey::Right => KeyCode::Right,
        TermKey::Up => KeyCode::Up,
        TermKey::Down => KeyCode::Down,
        _ => return None,
    })
}

/// RAII guard for raw terminal mode
///
/// When this guard is dropped, it will:
/// 1. Disable mouse capture and raw mode
/// 2. Leave alternate screen
/// 3. Show the cursor
struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    fn new() -> Self {
        Self { _private: () }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Best effort cleanup - ignore errors during drop
        let _ = cleanup_terminal();
    }
}

fn cleanup_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, Show)?;
    Ok(())
}
