//! One-time-passcode verification gate for sensitive fields
//!
//! The gate owns a small state machine:
//!
//! ```text
//! Unverified --request--> ChallengePending --accepted--> Verified
//!      ^                       |  cancel / expired / exhausted   |
//!      +-----------------------+---------------------------------+
//!                                   edit to a different value
//! ```
//!
//! Backend round-trips are split in two halves (`submit_response` then
//! `response_resolved`) so results can arrive asynchronously. Every
//! result carries the challenge id it was issued for; results for any
//! id other than the live one are stale and never change state.

use super::validation::{validate, FieldCategory};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

pub type ChallengeId = Uuid;

/// Default number of wrong codes before a fresh challenge is required
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default lifetime of a challenge
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(5 * 60);

/// Retry and expiry bounds for challenges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    pub max_attempts: u32,
    pub challenge_ttl: Duration,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            challenge_ttl: DEFAULT_CHALLENGE_TTL,
        }
    }
}

/// Backend token identifying a delivered challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeHandle(pub String);

/// Backend answer to a submitted code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpVerdict {
    Verified,
    Rejected,
    Expired,
}

/// A challenge waiting for the user's code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChallenge {
    pub id: ChallengeId,
    /// Exact value the challenge was issued for
    pub value: String,
    pub issued_at: Instant,
    /// Set once delivery succeeded
    pub handle: Option<ChallengeHandle>,
    pub attempts: u32,
    /// A submitted code is waiting for its verdict
    pub awaiting_result: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VerificationStatus {
    #[default]
    Unverified,
    ChallengePending(PendingChallenge),
    Verified {
        value: String,
    },
}

impl VerificationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unverified => "Unverified",
            Self::ChallengePending(_) => "OTP sent",
            Self::Verified { .. } => "Verified",
        }
    }
}

/// Result of a challenge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeTicket {
    pub id: ChallengeId,
    pub value: String,
    /// False when an identical request was already pending
    pub is_new: bool,
}

/// Code to forward to the backend for a live challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpSubmission {
    pub challenge_id: ChallengeId,
    pub handle: ChallengeHandle,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("{0}")]
    NotEligible(String),
    #[error("Could not send OTP: {0}")]
    ChallengeDeliveryFailed(String),
    #[error("Incorrect OTP, {remaining} attempt(s) left")]
    ChallengeMismatch { remaining: u32 },
    #[error("Too many incorrect attempts, please request a new OTP")]
    AttemptsExhausted,
    #[error("OTP expired, please request a new one")]
    ChallengeExpired,
    #[error("Stale challenge response discarded")]
    StaleChallengeResponse,
    #[error("OTP verification already in progress")]
    AwaitingResult,
    #[error("OTP is still being sent")]
    NotDelivered,
    #[error("No OTP has been requested")]
    NoChallenge,
    #[error("Please enter the OTP")]
    EmptyCode,
    #[error("Already verified")]
    AlreadyVerified,
}

impl VerificationError {
    /// Stale results are dropped silently
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::StaleChallengeResponse)
    }
}

/// Verification state machine bound to one field
#[derive(Debug, Clone)]
pub struct VerificationGate {
    category: FieldCategory,
    policy: OtpPolicy,
    status: VerificationStatus,
}

impl VerificationGate {
    pub fn new(category: FieldCategory, policy: OtpPolicy) -> Self {
        Self {
            category,
            policy,
            status: VerificationStatus::Unverified,
        }
    }

    pub fn status(&self) -> &VerificationStatus {
        &self.status
    }

    pub fn category(&self) -> FieldCategory {
        self.category
    }

    /// Switch the category the value is checked against. Drops any trust.
    pub fn set_category(&mut self, category: FieldCategory) {
        if self.category != category {
            self.category = category;
            self.reset();
        }
    }

    #[cfg(test)]
    pub fn is_verified(&self) -> bool {
        matches!(self.status, VerificationStatus::Verified { .. })
    }

    /// Verification holds only for the exact value that was verified
    pub fn is_verified_for(&self, value: &str) -> bool {
        matches!(&self.status, VerificationStatus::Verified { value: v } if v == value)
    }

    /// Whether a challenge may be requested for this value
    pub fn is_eligible(&self, value: &str) -> bool {
        !value.trim().is_empty() && validate(value, self.category).is_empty()
    }

    pub fn pending(&self) -> Option<&PendingChallenge> {
        match &self.status {
            VerificationStatus::ChallengePending(p) => Some(p),
            _ => None,
        }
    }

    fn live_pending_mut(&mut self, id: ChallengeId) -> Result<&mut PendingChallenge, VerificationError> {
        match &mut self.status {
            VerificationStatus::ChallengePending(p) if p.id == id => Ok(p),
            _ => Err(VerificationError::StaleChallengeResponse),
        }
    }

    fn is_expired(&self, pending: &PendingChallenge, now: Instant) -> bool {
        now.saturating_duration_since(pending.issued_at) >= self.policy.challenge_ttl
    }

    /// Request a challenge for `value`.
    ///
    /// Repeating the request for the value already pending returns the
    /// live challenge instead of issuing another one.
    pub fn request_challenge(
        &mut self,
        value: &str,
        now: Instant,
    ) -> Result<ChallengeTicket, VerificationError> {
        if value.trim().is_empty() {
            return Err(VerificationError::NotEligible(
                "Enter a value before requesting an OTP".to_string(),
            ));
        }
        let message = validate(value, self.category);
        if !message.is_empty() {
            return Err(VerificationError::NotEligible(message));
        }
        match &self.status {
            VerificationStatus::Verified { value: v } if v == value => {
                return Err(VerificationError::AlreadyVerified);
            }
            VerificationStatus::ChallengePending(p) if p.value == value && !self.is_expired(p, now) => {
                return Ok(ChallengeTicket {
                    id: p.id,
                    value: p.value.clone(),
                    is_new: false,
                });
            }
            _ => {}
        }
        Ok(self.issue(value.to_string(), now))
    }

    fn issue(&mut self, value: String, now: Instant) -> ChallengeTicket {
        let id = Uuid::new_v4();
        self.status = VerificationStatus::ChallengePending(PendingChallenge {
            id,
            value: value.clone(),
            issued_at: now,
            handle: None,
            attempts: 0,
            awaiting_result: false,
        });
        ChallengeTicket {
            id,
            value,
            is_new: true,
        }
    }

    /// Replace the pending challenge with a fresh one
    pub fn resend_challenge(&mut self, now: Instant) -> Result<ChallengeTicket, VerificationError> {
        let value = self
            .pending()
            .map(|p| p.value.clone())
            .ok_or(VerificationError::NoChallenge)?;
        Ok(self.issue(value, now))
    }

    /// Apply the outcome of challenge delivery
    pub fn delivery_resolved(
        &mut self,
        id: ChallengeId,
        result: Result<ChallengeHandle, String>,
    ) -> Result<(), VerificationError> {
        let pending = self.live_pending_mut(id)?;
        match result {
            Ok(handle) => {
                pending.handle = Some(handle);
                Ok(())
            }
            Err(reason) => {
                self.status = VerificationStatus::Unverified;
                Err(VerificationError::ChallengeDeliveryFailed(reason))
            }
        }
    }

    /// Accept a code from the user for the live challenge
    pub fn submit_response(
        &mut self,
        id: ChallengeId,
        code: &str,
        now: Instant,
    ) -> Result<OtpSubmission, VerificationError> {
        let pending = match &self.status {
            VerificationStatus::ChallengePending(p) => p,
            _ => return Err(VerificationError::NoChallenge),
        };
        if pending.id != id {
            return Err(VerificationError::StaleChallengeResponse);
        }
        if self.is_expired(pending, now) {
            self.status = VerificationStatus::Unverified;
            return Err(VerificationError::ChallengeExpired);
        }
        let code = code.trim();
        if code.is_empty() {
            return Err(VerificationError::EmptyCode);
        }
        let pending = self.live_pending_mut(id)?;
        if pending.awaiting_result {
            return Err(VerificationError::AwaitingResult);
        }
        let handle = pending.handle.clone().ok_or(VerificationError::NotDelivered)?;
        pending.awaiting_result = true;
        Ok(OtpSubmission {
            challenge_id: id,
            handle,
            code: code.to_string(),
        })
    }

    /// Apply the backend verdict for a submitted code
    pub fn response_resolved(
        &mut self,
        id: ChallengeId,
        verdict: OtpVerdict,
    ) -> Result<(), VerificationError> {
        let max_attempts = self.policy.max_attempts;
        let pending = self.live_pending_mut(id)?;
        pending.awaiting_result = false;
        match verdict {
            OtpVerdict::Verified => {
                let value = pending.value.clone();
                self.status = VerificationStatus::Verified { value };
                Ok(())
            }
            OtpVerdict::Rejected => {
                pending.attempts += 1;
                if pending.attempts >= max_attempts {
                    self.status = VerificationStatus::Unverified;
                    Err(VerificationError::AttemptsExhausted)
                } else {
                    Err(VerificationError::ChallengeMismatch {
                        remaining: max_attempts - pending.attempts,
                    })
                }
            }
            OtpVerdict::Expired => {
                self.status = VerificationStatus::Unverified;
                Err(VerificationError::ChallengeExpired)
            }
        }
    }

    /// Release an in-flight code submission that never got a verdict
    pub fn response_failed(&mut self, id: ChallengeId) -> Result<(), VerificationError> {
        self.live_pending_mut(id)?.awaiting_result = false;
        Ok(())
    }

    /// Abandon the pending challenge. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        if self.pending().is_some() {
            self.status = VerificationStatus::Unverified;
            true
        } else {
            false
        }
    }

    /// Drop trust when the field moves away from the verified value.
    /// Returns true if the status changed.
    pub fn invalidate_on_edit(&mut self, new_value: &str) -> bool {
        let bound_value = match &self.status {
            VerificationStatus::Unverified => return false,
            VerificationStatus::ChallengePending(p) => &p.value,
            VerificationStatus::Verified { value } => value,
        };
        if bound_value == new_value {
            return false;
        }
        self.status = VerificationStatus::Unverified;
        true
    }

    pub fn reset(&mut self) {
        self.status = VerificationStatus::Unverified;
    }
}
