use crossterm::{
    cursor::Show,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::Constraint,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
};
use std::io;

use crate::lib::normalizer::RecommendationRow;

const COLUMN_WIDTHS: [u16; 9] = [12, 14, 10, 12, 10, 10, 10, 11, 11];

/// Browse the ranked recommendations in a full-screen table
pub fn display_recommendations_table(rows: &[RecommendationRow]) -> io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    with_restored_terminal(
        enable_raw_mode,
        || {
            let mut stdout = io::stdout();
            execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
            let backend = CrosstermBackend::new(stdout);
            let mut terminal = Terminal::new(backend)?;
            run_app(&mut terminal, rows)
        },
        restore_terminal,
    )
}

/// Run `body` once `setup` succeeds, then always run `restore`
///
/// An error from `body` wins over an error from `restore`.
fn with_restored_terminal<T>(
    setup: impl FnOnce() -> io::Result<()>,
    body: impl FnOnce() -> io::Result<T>,
    restore: impl FnOnce() -> io::Result<()>,
) -> io::Result<T> {
    setup()?;
    let result = body();
    let restored = restore();
    let value = result?;
    restored?;
    Ok(value)
}

fn restore_terminal() -> io::Result<()> {
    // every step runs even if an earlier one fails
    let raw = disable_raw_mode();
    let mut stdout = io::stdout();
    let screen = execute!(stdout, LeaveAlternateScreen, DisableMouseCapture, Show);
    raw.and(screen)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    rows: &[RecommendationRow],
) -> io::Result<()> {
    let mut state = TableState::default();
    state.select(Some(0));

    loop {
        terminal.draw(|f| {
            let area = f.area();

            let header_cells = RecommendationRow::HEADERS.iter().map(|h| {
                Cell::from(*h).style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            });
            let header = Row::new(header_cells)
                .style(Style::default().bg(Color::DarkGray))
                .height(1);

            let body = rows.iter().map(|row| {
                Row::new(row.cells().map(|value| Cell::from(value.to_string()))).height(1)
            });

            let table = Table::new(body, COLUMN_WIDTHS.map(Constraint::Percentage))
                .header(header)
                .block(Block::default().borders(Borders::ALL).title(
                    " Reserved Instance & Savings Plan Recommendations (Press 'q' to quit) ",
                ))
                .row_highlight_style(Style::default().bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, area, &mut state);
        })?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Down | KeyCode::Char('j') => {
                        state.select(Some(next_index(state.selected(), rows.len())));
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        state.select(Some(previous_index(state.selected(), rows.len())));
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Move the selection down, wrapping to the top
fn next_index(selected: Option<usize>, len: usize) -> usize {
    match selected {
        Some(i) if i + 1 < len => i + 1,
        _ => 0,
    }
}

/// Move the selection up, wrapping to the bottom
fn previous_index(selected: Option<usize>, len: usize) -> usize {
    match selected {
        Some(0) => len.saturating_sub(1),
        Some(i) => i - 1,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_next_index_wraps() {
        assert_eq!(next_index(Some(0), 3), 1);
        assert_eq!(next_index(Some(2), 3), 0);
        assert_eq!(next_index(None, 3), 0);
    }

    #[test]
    fn test_previous_index_wraps() {
        assert_eq!(previous_index(Some(2), 3), 1);
        assert_eq!(previous_index(Some(0), 3), 2);
        assert_eq!(previous_index(None, 3), 0);
    }

    #[test]
    fn test_restore_runs_when_setup_after_raw_mode_fails() {
        let restored = Cell::new(false);
        let result: io::Result<()> = with_restored_terminal(
            || Ok(()),
            || Err(io::Error::other("alternate screen unavailable")),
            || {
                restored.set(true);
                Ok(())
            },
        );

        assert_eq!(result.unwrap_err().to_string(), "alternate screen unavailable");
        assert!(restored.get());
    }

    #[test]
    fn test_restore_skipped_when_raw_mode_fails() {
        let restored = Cell::new(false);
        let body_ran = Cell::new(false);
        let result = with_restored_terminal(
            || Err(io::Error::other("not a terminal")),
            || {
                body_ran.set(true);
                Ok(())
            },
            || {
                restored.set(true);
                Ok(())
            },
        );

        assert!(result.is_err());
        assert!(!body_ran.get());
        assert!(!restored.get());
    }

    #[test]
    fn test_restore_error_reported_after_clean_exit() {
        let result = with_restored_terminal(
            || Ok(()),
            || Ok(7),
            || Err(io::Error::other("could not leave alternate screen")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_column_widths_cover_every_header() {
        assert_eq!(COLUMN_WIDTHS.len(), RecommendationRow::HEADERS.len());
        assert_eq!(COLUMN_WIDTHS.iter().sum::<u16>(), 100);
    }
}
