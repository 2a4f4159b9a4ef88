//! Error types for the transaction pipeline
//!
//! Every failure mode the pipeline can produce is a distinct variant so callers
//! can pick differentiated messaging (retry prompt, rejection notice, timeout
//! notice) without string matching.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status code reserved for failures where no response reached the client.
pub const TRANSPORT_STATUS_CODE: u16 = 0;

/// Error body shared by every backend endpoint.
///
/// ```json
/// { "code": "INSUFFICIENT_FUNDS", "message": "...", "statusCode": 400, "details": {...} }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable description
    pub message: String,
    /// HTTP status; `0` when the request never reached the server
    #[serde(default)]
    pub status_code: u16,
    /// Additional error context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Builds a transport-level error (no response reached the client).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: "NETWORK_ERROR".to_string(),
            message: message.into(),
            status_code: TRANSPORT_STATUS_CODE,
            details: None,
        }
    }

    /// True when no response reached the client.
    pub fn is_transport(&self) -> bool {
        self.status_code == TRANSPORT_STATUS_CODE
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status_code, self.message)
    }
}

/// Errors produced by the wallet core.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Backend rejected the request, or the request never reached it.
    #[error("API error {0}")]
    Api(ApiError),

    /// The unsigned operation bundle passed its expiry.
    #[error("Intent {intent_id} expired at {expires_at}")]
    IntentExpired { intent_id: String, expires_at: u64 },

    /// The user declined a pending signing request.
    #[error("User rejected signing request {request_id}")]
    UserRejected { request_id: u64 },

    /// Polling ran out of attempts before the operation set reached a terminal state.
    #[error("Status of operation set {operation_set_id} still unknown after {attempts} attempts")]
    StatusTimeout {
        operation_set_id: String,
        attempts: u32,
    },

    /// The caller abandoned the attempt.
    #[error("Operation cancelled")]
    Cancelled,

    /// The signing capability failed to produce a signature.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// A human-entered amount could not be converted to atomic units.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A user action cannot be turned into an intent.
    #[error("Invalid intent: {0}")]
    InvalidIntent(String),

    /// The unsigned operation bundle is malformed.
    #[error("Invalid operation bundle: {0}")]
    InvalidBundle(String),

    /// A 2xx response carried a payload the client could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl WalletError {
    /// Returns the API error if this is an API failure.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            WalletError::Api(e) => Some(e),
            _ => None,
        }
    }

    /// True for transport failures where no response reached the server.
    pub fn is_transport(&self) -> bool {
        self.api_error().map(ApiError::is_transport).unwrap_or(false)
    }

    /// Only transport failures are safe for the caller to retry blindly.
    pub fn is_retryable(&self) -> bool {
        self.is_transport()
    }

    /// True when the user declined a signing request.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, WalletError::UserRejected { .. })
    }

    /// True when polling gave up; the operation set's outcome is unknown, not failed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, WalletError::StatusTimeout { .. })
    }
}

impl From<ApiError> for WalletError {
    fn from(e: ApiError) -> Self {
        WalletError::Api(e)
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;
