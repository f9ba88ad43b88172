//! Loan type picker

use super::widgets::render_cursor_list;
use crate::app::App;
use crate::data::{catalogue_item, LOAN_SUBTYPES};
use crate::state::{LoanType, VehicleSubtype};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Paragraph},
    Frame,
};

/// Draw the loan list, and the subtype list beside it while choosing one
pub fn draw(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let loans: Vec<ListItem> = LoanType::ALL
        .iter()
        .map(|loan| {
            let icon = loan.catalogue().map(|c| c.icon).unwrap_or(" ");
            let mut spans = vec![Span::raw(format!("{icon} {}", loan.label()))];
            if loan.has_subtypes() {
                spans.push(Span::styled(" ›", Style::default().fg(Color::DarkGray)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let loan_border = if app.state.choosing_subtype {
        Color::DarkGray
    } else {
        Color::Cyan
    };
    render_cursor_list(
        frame,
        chunks[0],
        loans,
        Block::default()
            .title(" What loan are you looking for? ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(loan_border)),
        app.state.loan_cursor,
    );

    if app.state.choosing_subtype {
        let subtypes: Vec<ListItem> = VehicleSubtype::ALL
            .iter()
            .map(|subtype| {
                let icon = catalogue_item(LOAN_SUBTYPES, subtype.value())
                    .map(|c| c.icon)
                    .unwrap_or(" ");
                ListItem::new(format!("{icon} {}", subtype.label()))
            })
            .collect();
        render_cursor_list(
            frame,
            chunks[1],
            subtypes,
            Block::default()
                .title(" Vehicle type ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
            app.state.subtype_cursor,
        );
    } else {
        let help = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                app.state.highlighted_loan().label(),
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from("Pick a loan to start your application. You can"),
            Line::from("switch loans later; details you entered are kept"),
            Line::from("where the new application asks for them."),
        ])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
        frame.render_widget(help, chunks[1]);
    }
}
