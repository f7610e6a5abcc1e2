//! Putting frames on the terminal.

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};
use std::io::Write;

use super::{Frame, Style};
use crate::logger::Log;

/// Owns the terminal while the clock is on screen.
///
/// Entering switches to the alternate screen, hides the cursor and enables raw
/// mode so single key presses reach the event loop. Dropping the guard undoes
/// all of it, including when the loop exits with an error.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw terminal mode")?;
        if let Err(e) = execute!(std::io::stdout(), EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e).context("Failed to enter the alternate screen");
        }
        Log::set_screen_active(true);
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(std::io::stdout(), ResetColor, Show, LeaveAlternateScreen);
        Log::set_screen_active(false);
        if let Err(e) = disable_raw_mode() {
            log_critical!("Failed to restore the terminal: {e}");
            log_indented!("Run `reset` to recover");
        }
    }
}

/// Current terminal size as `(columns, rows)`.
pub fn size() -> Result<(u16, u16)> {
    crossterm::terminal::size().context("Failed to read the terminal size")
}

/// Writes frames to an output, clearing it first whenever the size changes.
pub struct Screen<W: Write> {
    out: W,
    last_size: Option<(u16, u16)>,
}

impl<W: Write> Screen<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_size: None,
        }
    }

    /// Draw a whole frame, queuing one print per run of equally styled cells.
    pub fn draw(&mut self, frame: &Frame) -> Result<()> {
        let size = (frame.width(), frame.height());
        if self.last_size != Some(size) {
            queue!(self.out, ResetColor, Clear(ClearType::All))?;
            self.last_size = Some(size);
        }

        for (y, row) in frame.rows().enumerate() {
            queue!(self.out, MoveTo(0, y as u16))?;

            let mut run = String::new();
            let mut run_style = None;
            for cell in row {
                if run_style != Some(cell.style) {
                    if let Some(style) = run_style {
                        write_run(&mut self.out, style, &run)?;
                    }
                    run.clear();
                    run_style = Some(cell.style);
                }
                run.push(cell.ch);
            }
            if let Some(style) = run_style {
                write_run(&mut self.out, style, &run)?;
            }
        }

        queue!(self.out, ResetColor)?;
        self.out.flush().context("Failed to flush the terminal")?;
        Ok(())
    }

    /// Forget the last size so the next draw clears the screen.
    pub fn invalidate(&mut self) {
        self.last_size = None;
    }
}

fn write_run<W: Write>(out: &mut W, style: Style, text: &str) -> Result<()> {
    queue!(out, ResetColor)?;
    if let Some(fg) = style.fg {
        queue!(out, SetForegroundColor(fg.to_color()))?;
    }
    if let Some(bg) = style.bg {
        queue!(out, SetBackgroundColor(bg.to_color()))?;
    }
    queue!(out, Print(text))?;
    Ok(())
}
