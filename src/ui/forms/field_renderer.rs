//! Field rendering utilities for forms

use crate::state::{FieldValue, FormField};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Rows taken by one field: borders plus a content line
pub const FIELD_HEIGHT: u16 = 3;

/// Verification marker drawn in the top-right corner of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub text: &'static str,
    pub color: Color,
}

/// How a field should be drawn
pub struct FieldView<'a> {
    pub field: &'a FormField,
    pub is_active: bool,
    /// Verified fields are read-only until cleared
    pub is_locked: bool,
    pub badge: Option<Badge>,
}

fn value_spans(view: &FieldView) -> Vec<Span<'static>> {
    let field = view.field;
    let value_style = if view.is_locked {
        Style::default().fg(Color::Green)
    } else if view.is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    };

    match &field.value {
        FieldValue::Choice(selected) => {
            let style = if selected.is_some() {
                value_style
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let mut spans = vec![Span::styled(field.display_value(), style)];
            if view.is_active {
                spans.insert(0, Span::styled("◀ ", Style::default().fg(Color::Cyan)));
                spans.push(Span::styled(" ▶", Style::default().fg(Color::Cyan)));
            }
            spans
        }
        FieldValue::Flag(_) => vec![Span::styled(field.display_value(), value_style)],
        FieldValue::Text(text) => {
            let display = if text.is_empty() && !view.is_active {
                "(empty)".to_string()
            } else {
                field.display_value()
            };
            let mut spans = vec![Span::styled(display, value_style)];
            if view.is_active && !view.is_locked {
                spans.push(Span::styled("▌", Style::default().fg(Color::Cyan)));
            }
            if view.is_locked {
                spans.push(Span::styled(" 🔒", Style::default().fg(Color::DarkGray)));
            }
            spans
        }
    }
}

/// Draw a form field with its error underneath the value
pub fn draw_field(frame: &mut Frame, area: Rect, view: FieldView) {
    let field = view.field;
    let error = field
        .touched
        .then_some(field.error.as_ref())
        .flatten()
        .map(|e| e.message().to_string());

    let border_style = if error.is_some() {
        Style::default().fg(Color::Red)
    } else if view.is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut block = Block::default()
        .title(format!(" {} ", field.label))
        .borders(Borders::ALL)
        .border_style(border_style);

    if let Some(badge) = view.badge {
        block = block.title(
            Line::from(Span::styled(
                format!(" {} ", badge.text),
                Style::default()
                    .fg(badge.color)
                    .add_modifier(Modifier::BOLD),
            ))
            .right_aligned(),
        );
    }

    if let Some(message) = error {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {message} "),
            Style::default().fg(Color::Red),
        )));
    }

    let content = Paragraph::new(Line::from(value_spans(&view)));
    frame.render_widget(content.wrap(Wrap { trim: false }).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GENDERS;

    fn text(spans: &[Span]) -> String {
        spans.iter().map(|s| &*s.content).collect()
    }

    #[test]
    fn test_empty_inactive_text_shows_placeholder() {
        let field = FormField::text("city", "City", false);
        let view = FieldView {
            field: &field,
            is_active: false,
            is_locked: false,
            badge: None,
        };
        assert_eq!(text(&value_spans(&view)), "(empty)");
    }

    #[test]
    fn test_active_choice_shows_arrows() {
        let mut field = FormField::choice("gender", "Gender", GENDERS);
        field.cycle_choice(true);
        let view = FieldView {
            field: &field,
            is_active: true,
            is_locked: false,
            badge: None,
        };
        let rendered = text(&value_spans(&view));
        assert!(rendered.starts_with("◀ "));
        assert!(rendered.ends_with(" ▶"));
    }

    #[test]
    fn test_locked_text_has_no_cursor() {
        let mut field = FormField::text("email", "Email", false);
        field.set_text("a@b.in".to_string());
        let view = FieldView {
            field: &field,
            is_active: true,
            is_locked: true,
            badge: None,
        };
        assert_eq!(text(&value_spans(&view)), "a@b.in 🔒");
    }
}
