//! Full-screen `ratatui` renderer.

use std::io::{self, Stdout};

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use hosttop_runtime::report::{RenderError, Report, ReportSink};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::ui::table::draw_report;

/// Draws reports on the alternate screen until dropped.
pub struct Dashboard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Dashboard {
    /// Switches stdout to the alternate screen and hides the cursor.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the terminal cannot be set up.
    pub fn enter() -> io::Result<Self> {
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        let terminal = match Terminal::new(CrosstermBackend::new(io::stdout())) {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = restore_terminal();
                return Err(err);
            }
        };
        tracing::debug!("dashboard entered alternate screen");
        Ok(Self { terminal })
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard").finish_non_exhaustive()
    }
}

impl ReportSink for Dashboard {
    fn render(&mut self, report: &Report) -> Result<(), RenderError> {
        let _ = self.terminal.draw(|frame| draw_report(frame, report))?;
        Ok(())
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        if let Err(err) = restore_terminal() {
            tracing::warn!(error = %err, "failed to restore terminal");
        }
    }
}

/// Leaves the alternate screen and shows the cursor.
///
/// Safe to call when the dashboard was never entered; used by the
/// interrupt handler, which cannot reach the [`Dashboard`] itself.
///
/// # Errors
///
/// Returns an I/O error if stdout cannot be written.
pub fn restore_terminal() -> io::Result<()> {
    execute!(io::stdout(), Show, LeaveAlternateScreen)
}
