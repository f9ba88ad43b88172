//! Backend module for submitting steps and OTP round-trips

mod client;
mod offline;
mod traits;

pub use client::HttpBackend;
pub use offline::OfflineBackend;
pub use traits::{LoanBackendTrait, OtpRequest, SubmitResponse};

#[cfg(test)]
pub use traits::MockLoanBackendTrait;

use crate::config::WizardConfig;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Build the backend selected by the configuration
pub fn connect(config: &WizardConfig) -> Result<Arc<dyn LoanBackendTrait>> {
    if config.is_offline() {
        info!("using offline backend");
        return Ok(Arc::new(OfflineBackend::new(config.offline_otp_code())));
    }
    let address = config.backend_address();
    info!("using backend at {address}");
    Ok(Arc::new(HttpBackend::new(&address, config.request_timeout())?))
}
