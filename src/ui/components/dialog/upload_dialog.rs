//! File path prompt for document uploads

use super::base::{key_span, render_dialog, DialogConfig};
use ratatui::{style::Color, text::Span, Frame};

pub fn render_upload_dialog(frame: &mut Frame, document_name: &str, path_input: &str) {
    let message = format!("Path to the file for {document_name} (PDF, JPG or PNG)");
    let hint = vec![
        key_span("Enter"),
        Span::raw(" upload  "),
        key_span("Esc"),
        Span::raw(" cancel"),
    ];

    render_dialog(
        frame,
        DialogConfig {
            title: "Upload Document",
            title_color: Color::Green,
            border_color: Color::Green,
            message: &message,
            input: Some(path_input),
            hint: Some(hint),
            max_width: 72,
            ..Default::default()
        },
    );
}
