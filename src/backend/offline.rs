//! Backend stand-in for running without a server

use super::traits::{LoanBackendTrait, OtpRequest, SubmitResponse};
use crate::state::{ChallengeHandle, OtpVerdict, StepSubmission};
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Accepts every step and a single fixed OTP code
pub struct OfflineBackend {
    otp_code: String,
}

impl OfflineBackend {
    pub fn new(otp_code: impl Into<String>) -> Self {
        Self {
            otp_code: otp_code.into(),
        }
    }
}

#[async_trait]
impl LoanBackendTrait for OfflineBackend {
    async fn submit_step(&self, submission: &StepSubmission) -> Result<SubmitResponse> {
        info!(
            step = ?submission.step,
            fields = submission.values.len(),
            "offline backend accepted step"
        );
        Ok(SubmitResponse::accepted())
    }

    async fn request_otp(&self, request: &OtpRequest) -> Result<ChallengeHandle> {
        info!(
            field = %request.field,
            "offline OTP for {} is {}",
            request.destination,
            self.otp_code
        );
        Ok(ChallengeHandle(format!("offline-{}", request.challenge_id)))
    }

    async fn verify_otp(&self, _handle: &ChallengeHandle, code: &str) -> Result<OtpVerdict> {
        if code.trim() == self.otp_code {
            Ok(OtpVerdict::Verified)
        } else {
            Ok(OtpVerdict::Rejected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::OtpChannel;
    use uuid::Uuid;

    #[test]
    fn test_only_configured_code_verifies() {
        let backend = OfflineBackend::new("4321");
        let handle = ChallengeHandle("offline-x".into());
        let verify = |code| tokio_test::block_on(backend.verify_otp(&handle, code)).unwrap();
        assert_eq!(verify("4321"), OtpVerdict::Verified);
        assert_eq!(verify(" 4321 "), OtpVerdict::Verified);
        assert_eq!(verify("1234"), OtpVerdict::Rejected);
    }

    #[tokio::test]
    async fn test_handle_carries_challenge_id() {
        let backend = OfflineBackend::new("123456");
        let id = Uuid::new_v4();
        let request = OtpRequest {
            field: "kycNumber".to_string(),
            channel: OtpChannel::RegisteredMobile,
            destination: "9876543210".to_string(),
            challenge_id: id,
        };
        let handle = backend.request_otp(&request).await.unwrap();
        assert_eq!(handle.0, format!("offline-{id}"));
    }
}
