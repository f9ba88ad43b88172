//! Layout components (header, status bar, loader)

use crate::app::App;
use crate::state::{NoticeKind, View};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Split the screen into header and content, reserving the bottom line
/// for the status bar
pub fn create_layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    (chunks[0], chunks[1])
}

/// Draw the header with the loan, step progress and applicant
pub fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        " Loan Wizard ",
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];

    if let Some(wizard) = &app.state.wizard {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            wizard.selection().to_string(),
            Style::default().fg(Color::White),
        ));
        if app.state.current_view == View::Wizard {
            spans.push(Span::raw(" │ "));
            spans.push(Span::styled(
                format!(
                    "Step {}/{}: {}",
                    wizard.current_index() + 1,
                    wizard.steps().len(),
                    wizard.current_step().title()
                ),
                Style::default().fg(Color::Yellow),
            ));
        }
    }

    if app.state.current_view != View::Wizard {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            app.state.current_view.title(),
            Style::default().fg(Color::Yellow),
        ));
    }

    if let Some(name) = app.state.applicant_name() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("👤 {name}"),
            Style::default().fg(Color::Blue),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Draw the status bar
pub fn draw_status_bar(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let status_area = Rect {
        x: 0,
        y: area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    let mut spans = vec![Span::raw(" ")];

    // A live notice replaces the key hints
    match app.state.notices.latest() {
        Some(notice) => {
            let color = match notice.kind {
                NoticeKind::Success => Color::Green,
                NoticeKind::Info => Color::White,
                NoticeKind::Error => Color::Red,
            };
            spans.push(Span::styled(
                notice.message.as_str(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
        }
        None => {
            spans.push(Span::styled(
                get_view_hints(app),
                Style::default().fg(Color::Gray),
            ));
        }
    }

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, status_area);

    let quit_hint = " ^C:quit ";
    let quit_area = Rect {
        x: area.width.saturating_sub(quit_hint.len() as u16),
        y: area.height.saturating_sub(1),
        width: quit_hint.len() as u16,
        height: 1,
    };
    let quit_widget =
        Paragraph::new(quit_hint).style(Style::default().bg(Color::DarkGray).fg(Color::Gray));
    frame.render_widget(quit_widget, quit_area);
}

/// Get keyboard hints for the current view
fn get_view_hints(app: &App) -> &'static str {
    if app.state.otp_dialog.is_some() {
        return "0-9:code  Enter:verify  ^R:resend  Esc:cancel";
    }
    if app.state.upload_prompt.is_some() {
        return "Type a file path  Enter:upload  Esc:cancel";
    }
    match app.state.current_view {
        View::LoanSelect if app.state.choosing_subtype => "j/k:nav  Enter:start  Esc:back",
        View::LoanSelect => "j/k:nav  Enter:select  q:quit",
        View::Wizard => "Tab:next  ←/→:choose  Space:toggle  ^O:verify  ^E:edit  Enter:continue  Esc:back",
        View::Documents => "j/k:nav  Enter:upload  d:remove  y:year  m:month  p:proceed  Esc:back",
        View::Sanction => "Enter:accept  Esc:back",
        View::ThankYou => "Enter:new application  q:quit",
    }
}

/// Draw the loader over the content area while a step mounts
pub fn draw_loader(frame: &mut Frame, area: Rect, app: &App) {
    let remaining = app
        .state
        .loading_until
        .map(|until| until.saturating_duration_since(app.now()))
        .unwrap_or_default();
    let frame_index = (remaining.as_millis() / 80) as usize % SPINNER.len();

    let width = 20u16.min(area.width);
    let height = 3u16.min(area.height);
    let loader_area = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, loader_area);
    let loader = Paragraph::new(Line::from(vec![
        Span::styled(SPINNER[frame_index], Style::default().fg(Color::Cyan)),
        Span::raw(" Loading..."),
    ]))
    .centered()
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(loader, loader_area);
}

