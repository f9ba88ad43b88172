//! Wizard step page

use super::forms::{draw_field, Badge, FieldView, FIELD_HEIGHT};
use crate::app::App;
use crate::state::{Form, VerificationStatus, Wizard};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Badge for an OTP-gated field
fn badge_for(wizard: &Wizard, name: &str) -> Option<Badge> {
    let status = wizard.verification_status(name)?;
    let badge = match status {
        VerificationStatus::Verified { .. } if wizard.is_locked(name) => Badge {
            text: "✓ Verified",
            color: Color::Green,
        },
        VerificationStatus::ChallengePending(_) => Badge {
            text: "OTP sent",
            color: Color::Yellow,
        },
        _ if wizard.is_eligible(name) => Badge {
            text: "^O Verify",
            color: Color::Cyan,
        },
        _ => Badge {
            text: "Verify",
            color: Color::DarkGray,
        },
    };
    Some(badge)
}

/// Step tabs: done steps in green, the current one highlighted
fn progress_line(wizard: &Wizard) -> Line<'static> {
    let mut spans = Vec::new();
    for (index, step) in wizard.steps().iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(" ─ ", Style::default().fg(Color::DarkGray)));
        }
        let style = if index < wizard.current_index() {
            Style::default().fg(Color::Green)
        } else if index == wizard.current_index() {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("{}. {}", index + 1, step.title()), style));
    }
    Line::from(spans)
}

pub fn draw(frame: &mut Frame, area: Rect, app: &App) {
    let Some(wizard) = &app.state.wizard else {
        return;
    };
    let step = wizard.current_step();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Progress
            Constraint::Min(0),    // Fields
            Constraint::Length(1), // Footer
        ])
        .split(area);

    frame.render_widget(Paragraph::new(progress_line(wizard)), chunks[0]);

    let block = Block::default()
        .title(format!(" {} ", step.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(chunks[1]);
    frame.render_widget(block, chunks[1]);

    let fields = wizard.step_fields(step.id).unwrap_or_default();
    let active = wizard.active_field();
    let visible = (inner.height / FIELD_HEIGHT).max(1) as usize;
    let first = active.saturating_sub(visible - 1);

    for (row, (index, field)) in fields
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .enumerate()
    {
        let field_area = Rect {
            x: inner.x,
            y: inner.y + row as u16 * FIELD_HEIGHT,
            width: inner.width,
            height: FIELD_HEIGHT,
        };
        draw_field(
            frame,
            field_area,
            FieldView {
                field,
                is_active: index == active,
                is_locked: wizard.is_locked(&field.name),
                badge: badge_for(wizard, &field.name),
            },
        );
    }

    let footer = if wizard.pending_commit().is_some() {
        Line::from(Span::styled(
            "Saving...",
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(error) = wizard.step_error() {
        Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red)))
    } else if wizard.can_advance(step.id) {
        Line::from(Span::styled(
            if wizard.is_last_step() {
                "Enter: finish and upload documents"
            } else {
                "Enter: continue"
            },
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::from(Span::styled(
            "Complete every field to continue",
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(Paragraph::new(footer), chunks[2]);
}
