//! Drawing the selector and the processing view

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::state::{Mode, RowView, SelectionState};
use crate::app::processor::PipelineStep;

const BROWSE_HELP: &str =
    "↑/↓ j/k: move | PgUp/PgDn Home/End: jump | Enter: expand or start | Space: select | /: filter | q: quit";
const FILTER_HELP: &str = "Type to filter | ↑/↓: move | Space: select | Enter or /: back to tree | Esc: back";
const PROCESSING_HELP: &str = "q/Esc/Ctrl+C: cancel and quit";

/// Draw the whole screen for the current mode
pub fn draw(f: &mut Frame, state: &SelectionState) {
    let area = f.size();
    match state.mode() {
        Mode::Processing | Mode::Quitting if state.batch_size() > 0 => {
            draw_processing(f, state, area)
        }
        _ => draw_selector(f, state, area),
    }
}

fn draw_selector(f: &mut Frame, state: &SelectionState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Region list
            Constraint::Length(3), // Status
            Constraint::Length(3), // Help
        ])
        .split(area);

    let header = match state.mode() {
        Mode::Filtering => format!("Filter: {}_", state.query()),
        _ => "VNS Fetcher - select regions to process".to_string(),
    };
    let title = Paragraph::new(header)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let items: Vec<ListItem> = state.visible_rows().iter().map(row_item).collect();
    let list_title = if state.mode() == Mode::Filtering {
        "Matching regions"
    } else {
        "Regions"
    };
    let list = List::new(items).block(Block::default().title(list_title).borders(Borders::ALL));
    f.render_widget(list, chunks[1]);

    let status = Paragraph::new(state.status_line())
        .block(Block::default().title("Status").borders(Borders::ALL));
    f.render_widget(status, chunks[2]);

    let help_text = if state.mode() == Mode::Filtering {
        FILTER_HELP
    } else {
        BROWSE_HELP
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[3]);
}

fn row_item(row: &RowView) -> ListItem<'static> {
    let indent = "  ".repeat(row.level);
    let marker = match (row.selected, row.expanded) {
        (Some(true), _) => "[x] ",
        (Some(false), _) => "[ ] ",
        (None, Some(true)) => "▼ ",
        (None, _) => "▶ ",
    };
    let pointer = if row.is_cursor { "> " } else { "  " };

    let mut style = Style::default();
    if row.expanded.is_some() {
        style = style.add_modifier(Modifier::BOLD);
    }
    if row.selected == Some(true) {
        style = style.fg(Color::Green);
    }
    if row.is_cursor {
        style = style.fg(Color::Yellow).add_modifier(Modifier::REVERSED);
    }

    ListItem::new(Line::from(vec![
        Span::raw(pointer),
        Span::styled(format!("{}{}{}", indent, marker, row.label), style),
    ]))
}

fn draw_processing(f: &mut Frame, state: &SelectionState, area: Rect) {
    let progress = state.progress();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Batch gauge
            Constraint::Length(3), // Region gauge
            Constraint::Length(3), // Step gauge
            Constraint::Length(3), // Status
            Constraint::Min(0),    // Errors
            Constraint::Length(3), // Help
        ])
        .split(area);

    let title = Paragraph::new(format!(
        "VNS Fetcher - processing {} region(s)",
        state.batch_size()
    ))
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    f.render_widget(
        gauge("Overall", progress.overall(), Color::Green),
        chunks[1],
    );

    let region_title = match progress.current_region() {
        Some(region) => format!("Region: {}", region),
        None => "Region".to_string(),
    };
    f.render_widget(
        gauge(&region_title, progress.region_progress(), Color::Blue),
        chunks[2],
    );

    let (step_title, step_progress) = match progress.current_step() {
        Some(step) => (
            format!(
                "Step {}/{}: {}",
                step.step.index() + 1,
                PipelineStep::COUNT,
                step.description
            ),
            step.progress,
        ),
        None => ("Step".to_string(), 0.0),
    };
    f.render_widget(gauge(&step_title, step_progress, Color::Magenta), chunks[3]);

    let status = Paragraph::new(state.status_line())
        .block(Block::default().title("Status").borders(Borders::ALL));
    f.render_widget(status, chunks[4]);

    let errors: Vec<ListItem> = progress
        .errors()
        .iter()
        .map(|line| ListItem::new(line.as_str()).style(Style::default().fg(Color::Red)))
        .collect();
    let errors = List::new(errors).block(Block::default().title("Errors").borders(Borders::ALL));
    f.render_widget(errors, chunks[5]);

    let help = Paragraph::new(PROCESSING_HELP)
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[6]);
}

fn gauge(title: &str, percent: f64, color: Color) -> Gauge<'static> {
    let percent = percent.clamp(0.0, 100.0);
    Gauge::default()
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL),
        )
        .gauge_style(Style::default().fg(color))
        .ratio(percent / 100.0)
        .label(format!("{:.0}%", percent))
}
