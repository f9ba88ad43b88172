//! OTP entry dialog

use super::base::{key_span, render_dialog, DialogConfig};
use crate::state::{NoticeKind, OtpDialog};
use ratatui::{
    style::{Color, Style},
    text::Span,
    Frame,
};

pub fn render_otp_dialog(frame: &mut Frame, dialog: &OtpDialog) {
    let message = format!(
        "Enter the OTP sent to {} to verify your {}.",
        dialog.masked_destination(),
        dialog.label
    );

    let feedback = if dialog.busy {
        Some(Span::styled("Please wait...", Style::default().fg(Color::Yellow)))
    } else {
        dialog.message.as_ref().map(|(kind, text)| {
            let color = match kind {
                NoticeKind::Error => Color::Red,
                NoticeKind::Success | NoticeKind::Info => Color::Green,
            };
            Span::styled(text.as_str(), Style::default().fg(color))
        })
    };

    let hint = vec![
        key_span("Enter"),
        Span::raw(" verify  "),
        key_span("^R"),
        Span::raw(" resend  "),
        key_span("Esc"),
        Span::raw(" cancel"),
    ];

    render_dialog(
        frame,
        DialogConfig {
            title: "Verify OTP",
            title_color: Color::Cyan,
            border_color: Color::Cyan,
            message: &message,
            input: Some(&dialog.input),
            feedback,
            hint: Some(hint),
            max_width: 56,
        },
    );
}
