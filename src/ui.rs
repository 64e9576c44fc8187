use std::collections::HashSet;
use std::rc::Rc;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table as RatatuiTable},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use fasttable::controller::CHECKED_CLASS;
use fasttable::drag::{DragState, Placement};
use fasttable::pager::PagerItem;
use fasttable::reconcile::VisualRow;
use fasttable::record::RecordId;
use fasttable::selection::HeaderCheck;

use crate::app::App;
use crate::mode::Mode;
use crate::tableview::CHECK_WIDTH;

/// Class the app puts on cells that hold a number
pub const NUMERIC_CLASS: &str = "numeric";

/// Table, pager, status bar and command line, top to bottom
pub fn layout(area: Rect) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

pub fn render(frame: &mut Frame, app: &App) {
    let [table, pager, status, command] = layout(frame.size());

    render_table(frame, app, table);
    render_pager(frame, app, pager);
    render_status_bar(frame, app, status);
    render_command_line(frame, app, command);
}

fn check_box(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

/// Display width of each column: the wider of header and visible cells
fn column_widths(headers: &[String], rows: &[&VisualRow]) -> Vec<u16> {
    headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let content = rows
                .iter()
                .filter_map(|row| row.cells.get(col))
                .map(|cell| cell.content.width())
                .max()
                .unwrap_or(0);
            content.max(header.width()).max(3) as u16
        })
        .collect()
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let header_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let headers = app.headers.borrow();
    let all_rows = app.controller.rows();
    let visible = app.view.visible_rows(all_rows.len());
    let rows: Vec<&VisualRow> = all_rows[visible.clone()].iter().collect();

    let (moving, target): (HashSet<&RecordId>, _) = match app.controller.drag_state() {
        DragState::Dragging(drag) => (drag.moving.iter().collect(), drag.target.as_ref()),
        _ => (HashSet::new(), None),
    };

    let mut widths = vec![Constraint::Length(CHECK_WIDTH - 1)];
    widths.extend(
        column_widths(&headers, &rows)
            .into_iter()
            .map(Constraint::Length),
    );

    let header_check = match app.controller.header_check() {
        HeaderCheck::Unchecked => "[ ]",
        HeaderCheck::Partial => "[-]",
        HeaderCheck::Checked => "[x]",
    };
    let mut header_cells = vec![Cell::from(header_check).style(header_style)];
    header_cells.extend(headers.iter().map(|h| Cell::from(h.as_str()).style(header_style)));
    let header_row = Row::new(header_cells);

    let dragging = app.controller.is_dragging();
    let body: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let checked = row.meta.has_class(CHECKED_CLASS);

            let mut cells = vec![Cell::from(check_box(checked))];
            for cell in &row.cells {
                let style = if cell.has_class(NUMERIC_CLASS) {
                    Style::default().fg(Color::LightBlue)
                } else {
                    Style::default()
                };
                cells.push(Cell::from(cell.content.as_str()).style(style));
            }

            let mut style = Style::default();
            if checked {
                style = style.fg(Color::Yellow);
            }
            if moving.contains(&row.meta.id) {
                style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            } else if let Some((_, placement)) = target.filter(|(id, _)| id == &row.meta.id) {
                // drop marker: reversed above the insertion point, underlined below
                style = match placement {
                    Placement::Before => style.add_modifier(Modifier::REVERSED),
                    Placement::After => style.add_modifier(Modifier::UNDERLINED),
                };
            } else if !dragging && visible.start + i == app.view.cursor_row {
                style = style.bg(Color::Blue).fg(Color::White);
            }
            Row::new(cells).style(style)
        })
        .collect();

    let title = format!(" {} ", app.file_io.file_name());
    let table = RatatuiTable::new(body, widths)
        .header(header_row)
        .block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(table, area);
}

fn pager_span_width(item: &PagerItem) -> u16 {
    item.label().width() as u16 + 2
}

/// Index of the pager entry drawn under `column`
pub fn pager_item_at(items: &[Rc<PagerItem>], area: Rect, column: u16) -> Option<usize> {
    let mut x = area.x;
    for (i, item) in items.iter().enumerate() {
        let width = pager_span_width(item);
        if column >= x && column < x + width {
            return Some(i);
        }
        x += width + 1;
    }
    None
}

fn render_pager(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();
    for item in app.controller.pager() {
        let style = if item.is_active() {
            Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD)
        } else if item.is_disabled() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        };
        spans.push(Span::styled(format!(" {} ", item.label()), style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode_style = match app.mode {
        Mode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        Mode::Filter => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mut left = vec![
        Span::styled(
            format!(" {} ", app.mode.display_name()),
            mode_style.add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];
    if app.controller.is_dragging() {
        left.push(Span::styled("DRAG ", Style::default().fg(Color::Magenta)));
    }
    if !app.controller.filter_text().is_empty() {
        left.push(Span::styled(
            format!("/{} ", app.controller.filter_text()),
            Style::default().fg(Color::Yellow),
        ));
    }
    let checked = app.controller.checked_count();
    if checked > 0 {
        left.push(Span::raw(format!("{} checked ", checked)));
    }

    let info = format!("{} ", app.controller.stats().info);
    let used: usize = left.iter().map(|s| s.content.width()).sum();
    let pad = (area.width as usize).saturating_sub(used + info.width());
    left.push(Span::raw(" ".repeat(pad)));
    left.push(Span::raw(info));

    let status_bar = Paragraph::new(Line::from(left)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

fn render_command_line(frame: &mut Frame, app: &App, area: Rect) {
    let content = match app.mode {
        Mode::Filter => format!("/{}", app.filter.buffer),
        Mode::Normal => app.message.clone().unwrap_or_default(),
    };

    if app.mode == Mode::Filter {
        let x = area.x + 1 + app.filter.buffer.width() as u16;
        frame.set_cursor(x.min(area.x + area.width.saturating_sub(1)), area.y);
    }

    frame.render_widget(Paragraph::new(content), area);
}
