//! Trait abstraction for the loan backend to enable mocking in tests

use crate::state::{
    ChallengeHandle, ChallengeId, CommitOutcome, OtpChannel, OtpDispatch, OtpVerdict,
    StepSubmission,
};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Answer to a step submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    /// Field name to error message
    #[serde(default)]
    pub errors: HashMap<String, String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl SubmitResponse {
    pub fn accepted() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn into_outcome(self) -> CommitOutcome {
        if self.success && self.errors.is_empty() {
            CommitOutcome::Accepted
        } else {
            CommitOutcome::Rejected {
                field_errors: self.errors,
                message: self.message,
            }
        }
    }
}

/// Request to deliver an OTP
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequest {
    pub field: String,
    pub channel: OtpChannel,
    pub destination: String,
    pub challenge_id: ChallengeId,
}

impl From<&OtpDispatch> for OtpRequest {
    fn from(dispatch: &OtpDispatch) -> Self {
        Self {
            field: dispatch.field.to_string(),
            channel: dispatch.channel,
            destination: dispatch.destination.clone(),
            challenge_id: dispatch.challenge_id,
        }
    }
}

/// Trait for backend operations, enabling mocking in tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanBackendTrait: Send + Sync {
    /// Submit the values of a completed step
    async fn submit_step(&self, submission: &StepSubmission) -> Result<SubmitResponse>;

    /// Send an OTP and return the handle identifying it
    async fn request_otp(&self, request: &OtpRequest) -> Result<ChallengeHandle>;

    /// Check a code against a delivered OTP
    async fn verify_otp(&self, handle: &ChallengeHandle, code: &str) -> Result<OtpVerdict>;
}
