//! Application state module

mod app_state;
mod clock;
mod documents;
mod forms;
mod notifications;
mod session;

pub use app_state::*;
pub use clock::*;
pub use documents::*;
pub use forms::*;
pub use notifications::*;
pub use session::*;
