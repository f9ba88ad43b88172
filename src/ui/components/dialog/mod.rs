//! Dialog components for TUI

mod base;
mod error_dialog;
mod otp_dialog;
mod upload_dialog;

pub use error_dialog::render_error_dialog;
pub use otp_dialog::render_otp_dialog;
pub use upload_dialog::render_upload_dialog;
