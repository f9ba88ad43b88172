//! HTTP client for the loan application backend

use super::traits::{LoanBackendTrait, OtpRequest, SubmitResponse};
use crate::state::{ChallengeHandle, OtpVerdict, StepSubmission};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const STEPS_PATH: &str = "/applications/steps";
const OTP_REQUEST_PATH: &str = "/otp/request";
const OTP_VERIFY_PATH: &str = "/otp/verify";

#[derive(Debug, Deserialize)]
struct OtpRequestResponse {
    handle: ChallengeHandle,
}

#[derive(Debug, Serialize)]
struct OtpVerifyRequest<'a> {
    handle: &'a ChallengeHandle,
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct OtpVerifyResponse {
    status: Option<OtpVerdict>,
}

/// Backend reached over HTTP with JSON bodies
pub struct HttpBackend {
    http: Client,
    base: String,
}

impl HttpBackend {
    /// Create a client for `address` with a per-request timeout
    pub fn new(address: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("loan-wizard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            base: address.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {url}");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to reach backend at {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Backend error {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            ));
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse backend response from {url}"))
    }
}

#[async_trait]
impl LoanBackendTrait for HttpBackend {
    async fn submit_step(&self, submission: &StepSubmission) -> Result<SubmitResponse> {
        self.post(STEPS_PATH, submission).await
    }

    async fn request_otp(&self, request: &OtpRequest) -> Result<ChallengeHandle> {
        let response: OtpRequestResponse = self.post(OTP_REQUEST_PATH, request).await?;
        Ok(response.handle)
    }

    async fn verify_otp(&self, handle: &ChallengeHandle, code: &str) -> Result<OtpVerdict> {
        let response: OtpVerifyResponse = self
            .post(OTP_VERIFY_PATH, &OtpVerifyRequest { handle, code })
            .await?;
        response
            .status
            .ok_or_else(|| anyhow!("Backend did not return a verification status"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LoanSelection, LoanType, StepId};
    use std::collections::BTreeMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (address, handle)
    }

    fn backend(address: &str) -> HttpBackend {
        HttpBackend::new(address, Duration::from_secs(5)).unwrap()
    }

    fn submission() -> StepSubmission {
        StepSubmission {
            step: StepId::LoanProfile,
            loan: LoanSelection::new(LoanType::Home, None),
            customer_id: Some("CUST-1".to_string()),
            values: BTreeMap::from([("mobileNumber".to_string(), "9876543210".to_string())]),
        }
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let backend = backend("http://localhost:5174/");
        assert_eq!(backend.url(STEPS_PATH), "http://localhost:5174/applications/steps");
    }

    #[tokio::test]
    async fn test_submit_step_posts_json() {
        let (address, server) = serve_once("200 OK", r#"{"success": true}"#).await;
        let response = backend(&address).submit_step(&submission()).await.unwrap();
        assert!(response.success);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /applications/steps"));
        assert!(request.contains(r#""step":"loan_profile""#));
        assert!(request.contains(r#""customerId":"CUST-1""#));
    }

    #[tokio::test]
    async fn test_verify_otp_reads_status() {
        let (address, _server) = serve_once("200 OK", r#"{"status": "rejected"}"#).await;
        let verdict = backend(&address)
            .verify_otp(&ChallengeHandle("h-1".into()), "000000")
            .await
            .unwrap();
        assert_eq!(verdict, OtpVerdict::Rejected);
    }

    #[tokio::test]
    async fn test_verify_without_status_is_an_error() {
        let (address, _server) = serve_once("200 OK", "{}").await;
        let result = backend(&address)
            .verify_otp(&ChallengeHandle("h-1".into()), "000000")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_http_error_status_is_reported() {
        let (address, _server) = serve_once("503 Service Unavailable", r#"{"error":"down"}"#).await;
        let err = backend(&address).submit_step(&submission()).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_request_otp_returns_handle() {
        let (address, _server) = serve_once("200 OK", r#"{"handle": "otp-42"}"#).await;
        let request = OtpRequest {
            field: "email".to_string(),
            channel: crate::state::OtpChannel::Email,
            destination: "a@b.in".to_string(),
            challenge_id: uuid::Uuid::new_v4(),
        };
        let handle = backend(&address).request_otp(&request).await.unwrap();
        assert_eq!(handle, ChallengeHandle("otp-42".to_string()));
    }
}
