//! Line-oriented renderer.
//!
//! Clears the screen once, prints the `RPS | Hostname` header, then on
//! every refresh moves the cursor back below the header and rewrites the
//! rows. Rows at or above the threshold are printed bold red.

use std::io::Write;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use hosttop_runtime::report::{RenderError, Report, ReportSink};

use crate::ui::printable_host;

const HEADER: &str = "RPS\t|Hostname";
const RULE: &str = "--------------------------------";
/// Terminal row of the first report line, below header and rule.
const FIRST_ROW: u16 = 2;

/// Writes reports as plain text with ANSI cursor control.
#[derive(Debug)]
pub struct PlainRenderer<W: Write> {
    out: W,
    header_drawn: bool,
}

impl<W: Write> PlainRenderer<W> {
    /// Renders into `out`, usually `std::io::stdout()`.
    pub const fn new(out: W) -> Self {
        Self {
            out,
            header_drawn: false,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw_header(&mut self) -> std::io::Result<()> {
        queue!(
            self.out,
            Clear(ClearType::All),
            MoveTo(0, 0),
            Print(HEADER),
            Print("\r\n"),
            Print(RULE),
            Print("\r\n"),
        )
    }
}

impl<W: Write> ReportSink for PlainRenderer<W> {
    fn render(&mut self, report: &Report) -> Result<(), RenderError> {
        if !self.header_drawn {
            self.draw_header()?;
            self.header_drawn = true;
        }
        queue!(self.out, MoveTo(0, FIRST_ROW))?;

        for row in &report.rows {
            let line = format!("{}/s\t|{}", row.rps, printable_host(&row.host));
            if row.highlighted {
                queue!(
                    self.out,
                    SetForegroundColor(Color::Red),
                    SetAttribute(Attribute::Bold),
                    Print(line),
                    SetAttribute(Attribute::Reset),
                    ResetColor,
                )?;
            } else {
                queue!(self.out, Print(line))?;
            }
            queue!(self.out, Clear(ClearType::UntilNewLine), Print("\r\n"))?;
        }

        queue!(self.out, Clear(ClearType::FromCursorDown))?;
        self.out.flush()?;
        Ok(())
    }
}
