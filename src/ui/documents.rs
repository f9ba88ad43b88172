//! Required documents checklist

use super::components::{render_button, BUTTON_HEIGHT};
use super::widgets::render_cursor_list;
use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Paragraph, Wrap},
    Frame,
};

pub fn draw(frame: &mut Frame, area: Rect, app: &App) {
    let tracker = &app.state.documents;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(2), // Selected document note
            Constraint::Length(BUTTON_HEIGHT),
        ])
        .split(area);

    let mut last_group = "";
    let mut items = Vec::new();
    let mut cursor_row = 0;
    for (index, descriptor) in tracker.descriptors().iter().enumerate() {
        if descriptor.group != last_group && !descriptor.group.is_empty() {
            items.push(ListItem::new(Line::from(Span::styled(
                descriptor.group.clone(),
                Style::default().fg(Color::Yellow),
            ))));
            last_group = &descriptor.group;
        }
        if index == app.state.document_cursor {
            cursor_row = items.len();
        }

        let slot = tracker.slot(&descriptor.id);
        let file = slot.and_then(|s| s.file.as_ref());
        let (mark, color) = if file.is_some() {
            ("✓", Color::Green)
        } else {
            ("✗", Color::Red)
        };

        let mut spans = vec![
            Span::styled(format!("  {mark} "), Style::default().fg(color)),
            Span::raw(descriptor.display_name()),
        ];
        if let Some(file) = file {
            spans.push(Span::styled(
                format!("  {} ({} KB)", file.name, file.size_bytes.div_ceil(1024)),
                Style::default().fg(Color::DarkGray),
            ));
        }
        if descriptor.year_selector {
            let year = slot.and_then(|s| s.year.as_deref()).unwrap_or("year?");
            spans.push(Span::styled(format!("  [{year}]"), Style::default().fg(Color::Blue)));
        }
        if descriptor.month_selector {
            let month = slot
                .and_then(|s| s.month_year.as_deref())
                .unwrap_or("month?");
            spans.push(Span::styled(format!("  [{month}]"), Style::default().fg(Color::Blue)));
        }
        items.push(ListItem::new(Line::from(spans)));
    }

    render_cursor_list(
        frame,
        chunks[0],
        items,
        Block::default()
            .title(format!(
                " Upload Documents ({} of {} done) ",
                tracker.descriptors().len() - tracker.remaining_count(),
                tracker.descriptors().len()
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
        cursor_row,
    );

    let note = app
        .state
        .selected_document_id()
        .and_then(|id| tracker.descriptor(&id))
        .and_then(|d| d.note.clone())
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(Span::styled(note, Style::default().fg(Color::Gray)))
            .wrap(Wrap { trim: true }),
        chunks[1],
    );

    render_button(
        frame,
        chunks[2],
        &tracker.proceed_label(),
        tracker.all_required_satisfied(),
    );
}
