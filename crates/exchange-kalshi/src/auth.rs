//! RSA-PSS authentication for the Kalshi API.
//!
//! Kalshi authenticates each request with an RSA-PSS (SHA-256) signature
//! over `timestamp + method + path`. The request body is NOT part of the
//! signed message, and the query string is stripped from the path before
//! signing. The timestamp (milliseconds since epoch) is taken at call time
//! so it stays inside the exchange's clock-skew window.
//!
//! PSS is a randomized padding scheme: signing the same message twice
//! produces two different signatures, both of which verify.
//!
//! # Security
//!
//! - Private keys are loaded from environment variables and never logged
//! - The API key is zeroized on drop
//!
//! # Example
//!
//! ```ignore
//! use edgebet_kalshi::auth::{KalshiAuth, KalshiAuthConfig};
//!
//! let auth = KalshiAuth::from_env(KalshiAuthConfig::default())?;
//! let headers = auth.sign_request("GET", "/trade-api/v2/markets?limit=100")?;
//! ```

use crate::error::{KalshiError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::pss::BlindedSigningKey;
use rsa::sha2::Sha256;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::RsaPrivateKey;
use secrecy::{ExposeSecret, SecretString};
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::Zeroize;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for Kalshi authentication.
#[derive(Debug, Clone)]
pub struct KalshiAuthConfig {
    /// Environment variable name for the API key ID.
    pub api_key_env: String,

    /// Environment variable name for the private key (PEM format).
    pub private_key_env: String,
}

impl Default for KalshiAuthConfig {
    fn default() -> Self {
        Self {
            api_key_env: "KALSHI_API_KEY".to_string(),
            private_key_env: "KALSHI_PRIVATE_KEY".to_string(),
        }
    }
}

impl KalshiAuthConfig {
    /// Sets custom environment variable names.
    #[must_use]
    pub fn with_env_vars(
        mut self,
        api_key_env: impl Into<String>,
        private_key_env: impl Into<String>,
    ) -> Self {
        self.api_key_env = api_key_env.into();
        self.private_key_env = private_key_env.into();
        self
    }
}

// =============================================================================
// Signed Headers
// =============================================================================

/// Headers required for authenticated Kalshi API requests.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    /// KALSHI-ACCESS-KEY header.
    pub access_key: String,

    /// KALSHI-ACCESS-SIGNATURE header (base64 encoded).
    pub signature: String,

    /// KALSHI-ACCESS-TIMESTAMP header (Unix timestamp in milliseconds).
    pub timestamp: String,
}

impl SignedHeaders {
    /// Returns headers as tuples for reqwest.
    #[must_use]
    pub fn as_tuples(&self) -> [(&'static str, &str); 3] {
        [
            ("KALSHI-ACCESS-KEY", &self.access_key),
            ("KALSHI-ACCESS-SIGNATURE", &self.signature),
            ("KALSHI-ACCESS-TIMESTAMP", &self.timestamp),
        ]
    }
}

// =============================================================================
// KalshiAuth
// =============================================================================

/// RSA-PSS authenticator for the Kalshi API.
///
/// Holds the parsed private key for the lifetime of the process. Signing
/// takes `&self` and touches no shared state, so one authenticator can
/// sign concurrent requests.
pub struct KalshiAuth {
    /// API key ID.
    api_key: String,

    /// RSA private key for signing.
    private_key: RsaPrivateKey,
}

impl std::fmt::Debug for KalshiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KalshiAuth")
            .field("api_key", &self.api_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl Drop for KalshiAuth {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

/// Builds the canonical message to sign: `timestamp + method + path`.
///
/// The body is excluded from the signature in Kalshi's scheme, and the
/// query string is not part of the signed path.
fn canonical_message(timestamp: &str, method: &str, path: &str) -> String {
    let path = match path.find('?') {
        Some(idx) => &path[..idx],
        None => path,
    };
    format!("{timestamp}{method}{path}")
}

impl KalshiAuth {
    /// Creates a new authenticator from an API key and PEM-encoded private key.
    ///
    /// Accepts both PKCS#8 (`BEGIN PRIVATE KEY`) and PKCS#1
    /// (`BEGIN RSA PRIVATE KEY`) encodings — Kalshi issues the latter.
    ///
    /// # Errors
    /// Returns [`KalshiError::Signing`] if the private key cannot be parsed.
    pub fn new(api_key: impl Into<String>, private_key_pem: &str) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_key_pem))
            .map_err(|e| KalshiError::Signing(format!("failed to parse private key: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            private_key,
        })
    }

    /// Creates a new authenticator from environment variables.
    ///
    /// # Errors
    /// Returns [`KalshiError::Configuration`] if environment variables are
    /// missing, or [`KalshiError::Signing`] if the key is invalid. Either
    /// way the process must not proceed to any authenticated call.
    pub fn from_env(config: KalshiAuthConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            KalshiError::Configuration(format!(
                "missing environment variable: {}",
                config.api_key_env
            ))
        })?;

        let private_key_pem = std::env::var(&config.private_key_env)
            .map(SecretString::from)
            .map_err(|_| {
                KalshiError::Configuration(format!(
                    "missing environment variable: {}",
                    config.private_key_env
                ))
            })?;

        Self::with_secret_key(api_key, &private_key_pem)
    }

    /// Creates a new authenticator from a `SecretString` private key.
    ///
    /// Handles `\n` escape sequences, common when PEM material is passed
    /// through single-line environment variables.
    ///
    /// # Errors
    /// Returns error if the private key cannot be parsed.
    pub fn with_secret_key(api_key: impl Into<String>, private_key_pem: &SecretString) -> Result<Self> {
        let pem = private_key_pem.expose_secret().replace("\\n", "\n");
        Self::new(api_key, &pem)
    }

    /// Returns the API key ID.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Signs a request and returns the required headers.
    ///
    /// The timestamp is taken here, at call time — pre-computing it would
    /// risk drifting outside the exchange's accepted clock-skew window.
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, DELETE)
    /// * `path` - API path, query string allowed (it is stripped before signing)
    ///
    /// # Errors
    /// Returns error if the system clock is unavailable.
    pub fn sign_request(&self, method: &str, path: &str) -> Result<SignedHeaders> {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| KalshiError::Signing(format!("failed to get timestamp: {e}")))?
            .as_millis();

        Ok(self.sign_request_with_timestamp(method, path, timestamp_ms as u64))
    }

    /// Signs a request with a specific timestamp (useful for testing).
    #[must_use]
    pub fn sign_request_with_timestamp(
        &self,
        method: &str,
        path: &str,
        timestamp_ms: u64,
    ) -> SignedHeaders {
        let timestamp_str = timestamp_ms.to_string();
        let message = canonical_message(&timestamp_str, method, path);

        let signing_key = BlindedSigningKey::<Sha256>::new(self.private_key.clone());
        let mut rng = rand::thread_rng();
        let signature = signing_key.sign_with_rng(&mut rng, message.as_bytes());

        SignedHeaders {
            access_key: self.api_key.clone(),
            signature: BASE64.encode(signature.to_bytes()),
            timestamp: timestamp_str,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::EncodePrivateKey;
    use rsa::pss::{Signature, VerifyingKey};
    use rsa::signature::Verifier;
    use std::sync::OnceLock;

    // Key generation is expensive; every test shares one key.
    fn test_key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| {
            let mut rng = rand::thread_rng();
            RsaPrivateKey::new(&mut rng, 2048).expect("keygen")
        })
    }

    fn test_auth() -> KalshiAuth {
        let pem = test_key()
            .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
            .expect("pem");
        KalshiAuth::new("test-api-key", &pem).expect("auth")
    }

    // ==================== Config Tests ====================

    #[test]
    fn test_auth_config_default() {
        let config = KalshiAuthConfig::default();
        assert_eq!(config.api_key_env, "KALSHI_API_KEY");
        assert_eq!(config.private_key_env, "KALSHI_PRIVATE_KEY");
    }

    #[test]
    fn test_auth_config_custom_env() {
        let config = KalshiAuthConfig::default().with_env_vars("CUSTOM_KEY", "CUSTOM_PK");
        assert_eq!(config.api_key_env, "CUSTOM_KEY");
        assert_eq!(config.private_key_env, "CUSTOM_PK");
    }

    // ==================== SignedHeaders Tests ====================

    #[test]
    fn test_signed_headers_as_tuples() {
        let headers = SignedHeaders {
            access_key: "test-key".to_string(),
            signature: "dGVzdC1zaWduYXR1cmU=".to_string(),
            timestamp: "1234567890000".to_string(),
        };

        let tuples = headers.as_tuples();
        assert_eq!(tuples[0], ("KALSHI-ACCESS-KEY", "test-key"));
        assert_eq!(
            tuples[1],
            ("KALSHI-ACCESS-SIGNATURE", "dGVzdC1zaWduYXR1cmU=")
        );
        assert_eq!(tuples[2], ("KALSHI-ACCESS-TIMESTAMP", "1234567890000"));
    }

    // ==================== Canonical Message Tests ====================

    #[test]
    fn test_canonical_message_format() {
        // timestamp + method + path, nothing else
        let msg = canonical_message("1706817600000", "GET", "/trade-api/v2/markets");
        assert_eq!(msg, "1706817600000GET/trade-api/v2/markets");
    }

    #[test]
    fn test_canonical_message_strips_query() {
        let msg = canonical_message(
            "1706817600000",
            "GET",
            "/trade-api/v2/markets?limit=100&cursor=abc",
        );
        assert_eq!(msg, "1706817600000GET/trade-api/v2/markets");
    }

    #[test]
    fn test_canonical_message_excludes_body() {
        // POSTs sign the same message as a body-less request on the same path.
        let get = canonical_message("1", "POST", "/trade-api/v2/portfolio/orders");
        assert_eq!(get, "1POST/trade-api/v2/portfolio/orders");
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_auth_invalid_private_key() {
        let result = KalshiAuth::new("test-api-key", "invalid-pem-data");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("parse private key"));
    }

    #[test]
    fn test_auth_from_env_missing_api_key() {
        std::env::remove_var("TEST_MISSING_API_KEY");

        let config =
            KalshiAuthConfig::default().with_env_vars("TEST_MISSING_API_KEY", "TEST_MISSING_PK");

        let result = KalshiAuth::from_env(config);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("missing environment variable"));
    }

    #[test]
    fn test_auth_accepts_pkcs1_pem() {
        use rsa::pkcs1::EncodeRsaPrivateKey;

        let pem = test_key()
            .to_pkcs1_pem(rsa::pkcs8::LineEnding::LF)
            .expect("pem");
        assert!(KalshiAuth::new("test-api-key", &pem).is_ok());
    }

    #[test]
    fn test_auth_debug_redacts_key() {
        let auth = test_auth();
        let debug_output = format!("{auth:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("PRIVATE KEY"));
    }

    // ==================== Signature Tests ====================

    #[test]
    fn test_signatures_differ_across_timestamps_and_both_verify() {
        let key = test_key();
        let pem = key.to_pkcs8_pem(rsa::pkcs8::LineEnding::LF).expect("pem");
        let auth = KalshiAuth::new("test-api-key", &pem).expect("auth");

        let path = "/trade-api/v2/markets";
        let h1 = auth.sign_request_with_timestamp("GET", path, 1_706_817_600_000);
        let h2 = auth.sign_request_with_timestamp("GET", path, 1_706_817_600_500);

        assert_ne!(h1.signature, h2.signature);

        // Both verify against their own canonical message, server-side style.
        let verifying_key = VerifyingKey::<Sha256>::new(key.to_public_key());
        for headers in [&h1, &h2] {
            let message = canonical_message(&headers.timestamp, "GET", path);
            let sig_bytes = BASE64.decode(&headers.signature).expect("base64");
            let signature = Signature::try_from(sig_bytes.as_slice()).expect("sig");
            verifying_key
                .verify(message.as_bytes(), &signature)
                .expect("signature must verify");
        }
    }

    #[test]
    fn test_pss_signatures_are_randomized() {
        // Same message, same timestamp: PSS still produces distinct
        // signatures, and both must verify.
        let key = test_key();
        let pem = key.to_pkcs8_pem(rsa::pkcs8::LineEnding::LF).expect("pem");
        let auth = KalshiAuth::new("test-api-key", &pem).expect("auth");

        let path = "/trade-api/v2/markets";
        let ts = 1_706_817_600_000;
        let h1 = auth.sign_request_with_timestamp("GET", path, ts);
        let h2 = auth.sign_request_with_timestamp("GET", path, ts);

        assert_ne!(h1.signature, h2.signature);

        let verifying_key = VerifyingKey::<Sha256>::new(key.to_public_key());
        let message = canonical_message(&ts.to_string(), "GET", path);
        for headers in [&h1, &h2] {
            let sig_bytes = BASE64.decode(&headers.signature).expect("base64");
            let signature = Signature::try_from(sig_bytes.as_slice()).expect("sig");
            verifying_key
                .verify(message.as_bytes(), &signature)
                .expect("signature must verify");
        }
    }

    #[test]
    fn test_timestamp_is_milliseconds() {
        let auth = test_auth();
        let headers = auth.sign_request("GET", "/trade-api/v2/markets").unwrap();
        // Milliseconds since epoch is 13 digits in this era.
        assert!(headers.timestamp.len() >= 13);
        assert!(headers.timestamp.chars().all(|c| c.is_ascii_digit()));
    }

    // ==================== Secret Handling Tests ====================

    #[test]
    fn test_secret_string_not_leaked() {
        let secret = SecretString::from("super-secret-key");
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("super-secret-key"));
    }
}
