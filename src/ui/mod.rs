//! UI module for rendering the TUI

mod components;
mod documents;
mod forms;
mod layout;
mod loan_select;
mod summary;
mod widgets;
mod wizard;

use crate::app::App;
use crate::state::View;
use components::{render_error_dialog, render_otp_dialog, render_upload_dialog};
use ratatui::Frame;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let (header_area, main_area) = layout::create_layout(area);

    layout::draw_header(frame, header_area, app);

    match app.state.current_view {
        View::LoanSelect => loan_select::draw(frame, main_area, app),
        View::Wizard => wizard::draw(frame, main_area, app),
        View::Documents => documents::draw(frame, main_area, app),
        View::Sanction => summary::draw_sanction(frame, main_area, app),
        View::ThankYou => summary::draw_thank_you(frame, main_area),
    }

    layout::draw_status_bar(frame, app);

    if app.is_loading() {
        layout::draw_loader(frame, main_area, app);
        return;
    }

    if let Some(dialog) = &app.state.otp_dialog {
        render_otp_dialog(frame, dialog);
    }
    if let Some(prompt) = &app.state.upload_prompt {
        let name = app
            .state
            .documents
            .descriptor(&prompt.document_id)
            .map(|d| d.display_name())
            .unwrap_or_default();
        render_upload_dialog(frame, &name, &prompt.path_input);
    }

    // Errors draw on top of everything else
    if let Some(error) = app.state.current_error() {
        render_error_dialog(frame, error, app.state.error_queue.len());
    }
}
