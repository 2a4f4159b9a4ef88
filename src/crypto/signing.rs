//! Local session key signing

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};

use crate::error::{Result, WalletError};
use crate::signing::KeyManager;

/// Session key held in process memory.
///
/// Stands in for the MPC key share of the session wallet: the signing
/// pipeline only sees it through [`KeyManager`].
pub struct LocalKeySigner {
    signing_key: SigningKey,
}

impl LocalKeySigner {
    pub fn from_bytes(private_key: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(private_key),
        }
    }

    /// Parse a hex-encoded 32-byte private key (optional `0x` prefix).
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let trimmed = private_key.trim();
        let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(stripped)
            .map_err(|e| WalletError::Signing(format!("Failed to decode private key from hex: {}", e)))?;

        if bytes.len() != 32 {
            return Err(WalletError::Signing(format!(
                "Invalid private key length: expected 32 bytes, got {}",
                bytes.len()
            )));
        }

        let mut key_array = [0u8; 32];
        key_array.copy_from_slice(&bytes);
        Ok(Self::from_bytes(&key_array))
    }

    /// Read the private key from an environment variable.
    pub fn from_env(var: &str) -> Result<Self> {
        let value = std::env::var(var).map_err(|_| {
            WalletError::Signing(format!("Environment variable {} is not set", var))
        })?;
        Self::from_hex(&value)
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }
}

#[async_trait]
impl KeyManager for LocalKeySigner {
    fn address(&self) -> String {
        format!("0x{}", hex::encode(self.public_key_bytes()))
    }

    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(self.signing_key.sign(message).to_bytes().to_vec())
    }
}
