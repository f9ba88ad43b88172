//! Error dialog component

use super::base::{key_span, render_dialog, DialogConfig};
use ratatui::{style::Color, text::Span, Frame};

/// Render the oldest queued error, noting how many are waiting behind it
pub fn render_error_dialog(frame: &mut Frame, error_message: &str, queued: usize) {
    let mut hint = vec![
        Span::raw("Press "),
        key_span("Enter"),
        Span::raw(" or "),
        key_span("Esc"),
        Span::raw(" to dismiss"),
    ];
    if queued > 1 {
        hint.push(Span::raw(format!(" ({} more)", queued - 1)));
    }

    render_dialog(
        frame,
        DialogConfig {
            title: "Something went wrong",
            title_color: Color::Red,
            border_color: Color::Red,
            message: error_message,
            hint: Some(hint),
            ..Default::default()
        },
    );
}
