//! Configuration handling for the wizard

use crate::data::default_checklist;
use crate::state::{
    DocumentDescriptor, OtpPolicy, ValidationPolicy, WizardOptions, DEFAULT_CHALLENGE_TTL,
    DEFAULT_DEBOUNCE_WINDOW, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_MIN_AGE_YEARS,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default backend address
pub const DEFAULT_BACKEND_ADDRESS: &str = "http://localhost:5174";

/// Environment variable overriding the backend address
pub const BACKEND_ADDRESS_ENV: &str = "LOAN_WIZARD_BACKEND_ADDRESS";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LOADER_DELAY_MS: u64 = 1000;
const DEFAULT_OFFLINE_OTP: &str = "123456";

/// User configuration for the wizard. Every field is optional; the
/// accessors fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WizardConfig {
    /// Backend base address
    pub backend_address: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
    /// Run against the built-in offline backend
    pub offline: Option<bool>,
    /// Code accepted by the offline backend
    pub offline_otp_code: Option<String>,
    pub otp_max_attempts: Option<u32>,
    pub otp_expiry_secs: Option<u64>,
    /// Debounce window for KYC number checks
    pub debounce_ms: Option<u64>,
    /// How long the loader shows when a step opens
    pub loader_delay_ms: Option<u64>,
    pub min_applicant_age: Option<u32>,
    pub max_upload_bytes: Option<u64>,
    /// Customer identifier passed through the session
    pub customer_id: Option<String>,
    /// Registered mobile number used for KYC OTPs
    pub mobile_number: Option<String>,
    /// Replaces the built-in required document checklist
    pub document_checklist: Option<Vec<DocumentDescriptor>>,
}

impl WizardConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("in", "loanwizard", "loan-wizard")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`, defaulting when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: WizardConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Backend address, preferring the environment override
    pub fn backend_address(&self) -> String {
        std::env::var(BACKEND_ADDRESS_ENV)
            .ok()
            .filter(|a| !a.trim().is_empty())
            .or_else(|| self.backend_address.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_ADDRESS.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn is_offline(&self) -> bool {
        self.offline.unwrap_or(false)
    }

    pub fn offline_otp_code(&self) -> String {
        self.offline_otp_code
            .clone()
            .unwrap_or_else(|| DEFAULT_OFFLINE_OTP.to_string())
    }

    pub fn otp_policy(&self) -> OtpPolicy {
        OtpPolicy {
            max_attempts: self.otp_max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS).max(1),
            challenge_ttl: self
                .otp_expiry_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CHALLENGE_TTL),
        }
    }

    pub fn debounce_window(&self) -> Duration {
        self.debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DEBOUNCE_WINDOW)
    }

    pub fn loader_delay(&self) -> Duration {
        Duration::from_millis(self.loader_delay_ms.unwrap_or(DEFAULT_LOADER_DELAY_MS))
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy::current(Some(
            self.min_applicant_age.unwrap_or(DEFAULT_MIN_AGE_YEARS),
        ))
    }

    pub fn wizard_options(&self) -> WizardOptions {
        WizardOptions {
            validation: self.validation_policy(),
            otp: self.otp_policy(),
            debounce_window: self.debounce_window(),
        }
    }

    pub fn document_checklist(&self) -> Vec<DocumentDescriptor> {
        match &self.document_checklist {
            Some(list) if !list.is_empty() => list.clone(),
            _ => default_checklist(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = WizardConfig::default();
        assert!(config.backend_address.is_none());
        assert!(!config.is_offline());
        assert_eq!(config.offline_otp_code(), "123456");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.loader_delay(), Duration::from_millis(1000));
        assert_eq!(config.debounce_window(), Duration::from_millis(300));
        assert_eq!(config.max_upload_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.otp_policy(), OtpPolicy::default());
        assert_eq!(config.validation_policy().min_age_years, Some(18));
    }

    #[test]
    fn test_serialization() {
        let config = WizardConfig {
            backend_address: Some("http://loans.internal:8080".to_string()),
            offline: Some(true),
            otp_max_attempts: Some(5),
            otp_expiry_secs: Some(60),
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: WizardConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(
            parsed.backend_address,
            Some("http://loans.internal:8080".to_string())
        );
        assert!(parsed.is_offline());
        assert_eq!(
            parsed.otp_policy(),
            OtpPolicy {
                max_attempts: 5,
                challenge_ttl: Duration::from_secs(60)
            }
        );
    }

    #[test]
    fn test_deserialize_from_empty_json() {
        let parsed: WizardConfig = serde_json::from_str("{}").unwrap();
        assert!(parsed.customer_id.is_none());
        assert_eq!(parsed.document_checklist().len(), 8);
    }

    #[test]
    fn test_deserialize_with_extra_fields() {
        let json = r#"{"customer_id": "CUST-9", "unknown_field": "value"}"#;
        let parsed: WizardConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.customer_id, Some("CUST-9".to_string()));
    }

    #[test]
    fn test_zero_attempts_is_raised_to_one() {
        let config = WizardConfig {
            otp_max_attempts: Some(0),
            ..Default::default()
        };
        assert_eq!(config.otp_policy().max_attempts, 1);
    }

    #[test]
    fn test_custom_checklist() {
        let json = r#"{"document_checklist": [
            {"id": "itr2024", "name": "ITR", "year_selector": true, "period": "2024"}
        ]}"#;
        let parsed: WizardConfig = serde_json::from_str(json).unwrap();
        let checklist = parsed.document_checklist();
        assert_eq!(checklist.len(), 1);
        assert!(checklist[0].year_selector);
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let dir = TempDir::new().unwrap();
        let config = WizardConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.backend_address.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = WizardConfig {
            mobile_number: Some("9876543210".to_string()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        let loaded = WizardConfig::load_from(&path).unwrap();
        assert_eq!(loaded.mobile_number, Some("9876543210".to_string()));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        let err = WizardConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_config_path_returns_option() {
        let _path = WizardConfig::config_path();
    }
}
