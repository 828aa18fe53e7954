//! The `RPS | Hostname` table widget.

use hosttop_common::constants::APP_NAME;
use hosttop_runtime::report::Report;
use ratatui::Frame;
use ratatui::layout::Constraint;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Cell, Row, Table};

use super::printable_host;

/// Style of rows at or above the threshold.
const HIGHLIGHT: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);

/// Renders `report` over the whole frame.
pub fn draw_report(frame: &mut Frame, report: &Report) {
    let title = format!(
        " {APP_NAME} | {}s | {} hosts | {} requests | highlight >= {} rps ",
        report.elapsed,
        report.rows.iter().filter(|row| !row.overflow).count(),
        report.total,
        report.threshold
    );

    let header = Row::new(vec!["RPS", "Hostname"])
        .style(Style::new().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

    let rows = report.rows.iter().map(|row| {
        let cells = vec![
            Cell::from(format!("{}/s", row.rps)),
            Cell::from(printable_host(&row.host).into_owned()),
        ];
        let style = if row.highlighted { HIGHLIGHT } else { Style::new() };
        if row.overflow {
            Row::new(cells).style(style.add_modifier(Modifier::ITALIC))
        } else {
            Row::new(cells).style(style)
        }
    });

    let table = Table::new(rows, [Constraint::Length(12), Constraint::Fill(1)])
        .header(header)
        .block(Block::bordered().title(title));

    frame.render_widget(table, frame.area());
}
