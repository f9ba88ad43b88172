//! Form domain layer
//!
//! Field validation, per-field OTP verification and the step
//! orchestration built on top of them.

mod field;
mod form_state;
mod steps;
mod validation;
mod verification;
mod wizard;

pub use field::{FieldValue, FormField};
pub use form_state::{Form, FormState};
pub use steps::*;
pub use validation::*;
pub use verification::*;
pub use wizard::*;
