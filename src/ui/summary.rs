//! Sanction and thank-you screens

use crate::app::App;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn centered_page(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>) {
    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );
    frame.render_widget(paragraph, area);
}

pub fn draw_sanction(frame: &mut Frame, area: Rect, app: &App) {
    let applicant = app.state.applicant_name().unwrap_or("Applicant");
    let loan = app
        .state
        .wizard
        .as_ref()
        .map(|w| w.selection().to_string())
        .unwrap_or_default();

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "🎉 Congratulations!",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Dear {applicant}, your {loan} application is ready for sanction.")),
        Line::from("All required documents have been received."),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to accept and submit",
            Style::default().fg(Color::Cyan),
        )),
    ];
    centered_page(frame, area, "Sanction", lines);
}

pub fn draw_thank_you(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Thank you!",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Your application has been submitted."),
        Line::from("We will contact you on your registered mobile number."),
    ];
    centered_page(frame, area, "Thank You", lines);
}
