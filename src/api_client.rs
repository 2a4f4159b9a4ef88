//! Intent Service Client
//!
//! HTTP client for the backend abstraction service. Provides methods for
//! fetching balances, creating transaction intents, submitting signed
//! operations, and reading operation status.
//!
//! Every non-2xx response is surfaced as an [`ApiError`] carrying the backend's
//! code, message, and HTTP status. Failures where no response reached the
//! client carry status code `0`.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::{ApiError, Result, WalletError};
use crate::types::{
    BalancePayload, IntentResponse, OperationStatus, SignedOperation,
    SubmitSignedOperationsRequest, TransactionIntent,
};

/// HTTP client for the abstraction service.
///
/// Paths are relative to the versioned API root (e.g. "https://api.example.com/v1").
#[derive(Clone)]
pub struct IntentServiceClient {
    /// Versioned API root without trailing slash
    api_root: String,
    /// HTTP client instance
    client: Client,
    /// Session bearer token, if the caller has one
    auth_token: Option<String>,
}

impl IntentServiceClient {
    /// Create a new client with the default 30 second request timeout.
    ///
    /// # Arguments
    ///
    /// * `api_root` - Versioned API root, e.g. "http://127.0.0.1:3000/v1"
    pub fn new(api_root: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_root, std::time::Duration::from_secs(30))
    }

    /// Create a new client from service configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::with_timeout(config.api_root(), config.request_timeout())
    }

    fn with_timeout(api_root: impl Into<String>, timeout: std::time::Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy() // Avoid macOS system-configuration issues in tests
            .build()
            .map_err(|e| ApiError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_root: api_root.into().trim_end_matches('/').to_string(),
            client,
            auth_token: None,
        })
    }

    /// Attach a session bearer token to every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Fetch the raw per-chain balance payload of a profile.
    ///
    /// `GET /profiles/{id}/balance`
    pub async fn get_balance(&self, profile_id: &str) -> Result<BalancePayload> {
        let url = format!("{}/profiles/{}/balance", self.api_root, profile_id);
        let response = self.send(self.client.get(&url), "GET /profiles/:id/balance").await?;
        parse_json(response, "GET /profiles/:id/balance").await
    }

    /// Submit an intent and receive the planned unsigned operation bundle.
    ///
    /// `POST /profiles/{id}/intent`
    ///
    /// The returned `operation_set_id` must be used verbatim for submission and polling.
    pub async fn create_transaction_intent(
        &self,
        profile_id: &str,
        intent: &TransactionIntent,
    ) -> Result<IntentResponse> {
        let url = format!("{}/profiles/{}/intent", self.api_root, profile_id);
        let response = self
            .send(self.client.post(&url).json(intent), "POST /profiles/:id/intent")
            .await?;
        let intent_response: IntentResponse =
            parse_json(response, "POST /profiles/:id/intent").await?;

        debug!(
            "Intent {} planned as operation set {} ({} operation(s))",
            intent_response.intent_id,
            intent_response.operation_set_id,
            intent_response.unsigned_operations.operations.len()
        );
        Ok(intent_response)
    }

    /// Hand a complete signed bundle to the backend.
    ///
    /// `POST /operations/{operationSetId}/submit`
    pub async fn submit_signed_operations(
        &self,
        operation_set_id: &str,
        signed_operations: &[SignedOperation],
    ) -> Result<()> {
        let url = format!("{}/operations/{}/submit", self.api_root, operation_set_id);
        let body = SubmitSignedOperationsRequest {
            signed_operations: signed_operations.to_vec(),
        };
        self.send(self.client.post(&url).json(&body), "POST /operations/:id/submit")
            .await?;
        Ok(())
    }

    /// Fetch the current status of an operation set once.
    ///
    /// `GET /operations/{operationSetId}/status`
    pub async fn get_operation_status(&self, operation_set_id: &str) -> Result<OperationStatus> {
        let url = format!("{}/operations/{}/status", self.api_root, operation_set_id);
        let response = self
            .send(self.client.get(&url), "GET /operations/:id/status")
            .await?;
        parse_json(response, "GET /operations/:id/status").await
    }

    /// Send a request, mapping transport failures and non-2xx responses to [`ApiError`].
    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Response> {
        let request = match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            warn!("{} failed before reaching the server: {}", endpoint, e);
            ApiError::transport(format!("{} request failed: {}", endpoint, e))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let api_error = api_error_from_body(status, &body);
        warn!("{} rejected: {}", endpoint, api_error);
        Err(WalletError::Api(api_error))
    }
}

/// Decode a 2xx JSON body.
async fn parse_json<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T> {
    let body = response.text().await.map_err(|e| {
        WalletError::InvalidResponse(format!("Failed to read {} response: {}", endpoint, e))
    })?;
    serde_json::from_str(&body).map_err(|e| {
        WalletError::InvalidResponse(format!("Failed to parse {} response: {}", endpoint, e))
    })
}

/// Build an [`ApiError`] from an error response body.
///
/// Bodies that follow the shared error shape are kept verbatim (with the
/// HTTP status filled in if the body omitted it); anything else is wrapped.
pub fn api_error_from_body(status: StatusCode, body: &str) -> ApiError {
    match serde_json::from_str::<ApiError>(body) {
        Ok(mut parsed) => {
            if parsed.status_code == 0 {
                parsed.status_code = status.as_u16();
            }
            parsed
        }
        Err(_) => ApiError {
            code: format!("HTTP_{}", status.as_u16()),
            message: if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                body.trim().to_string()
            },
            status_code: status.as_u16(),
            details: None,
        },
    }
}
