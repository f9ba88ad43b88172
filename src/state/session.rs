//! Cross-step session values

use std::collections::HashMap;

/// Keys readable across steps without going through the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Applicant name shown in headers once captured
    FullName,
    CustomerId,
    /// Registered mobile number that receives KYC OTPs
    MobileForOtp,
}

/// Ephemeral key/value store scoped to one application session
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    values: HashMap<SessionKey, String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: SessionKey, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }

    pub fn get(&self, key: SessionKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Store a value. Blank values remove the key.
    pub fn set(&mut self, key: SessionKey, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, value.trim().to_string());
        }
    }

    pub fn remove(&mut self, key: SessionKey) -> Option<String> {
        self.values.remove(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut session = SessionContext::new();
        session.set(SessionKey::FullName, " Asha Rao ");
        assert_eq!(session.get(SessionKey::FullName), Some("Asha Rao"));
        assert_eq!(session.get(SessionKey::CustomerId), None);
    }

    #[test]
    fn test_blank_value_removes_key() {
        let mut session = SessionContext::new().with(SessionKey::MobileForOtp, Some("9876543210".into()));
        session.set(SessionKey::MobileForOtp, "  ");
        assert_eq!(session.get(SessionKey::MobileForOtp), None);
    }

    #[test]
    fn test_with_skips_none() {
        let session = SessionContext::new().with(SessionKey::CustomerId, None);
        assert_eq!(session.get(SessionKey::CustomerId), None);
    }
}
