//! Activation code parsing and RSA signature verification.
//!
//! Activation codes use the format: `base64(envelope_json)`
//!
//! The envelope is a JSON object containing:
//! - `Token`: the signed token, itself a JSON string `{"Expiry": "<RFC 3339>"}`
//! - `Signature`: base64 RSA PKCS#1 v1.5 signature
//!
//! The signature covers the SHA-256 digest of the raw `Token` string exactly
//! as it appears in the envelope, not a re-serialization of the parsed token.

use crate::error::{LicenseError, LicenseResult};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Embedded RSA public key of the licensing authority (SPKI PEM).
pub const ACTIVATION_PUBLIC_KEY: &str = "-----BEGIN PUBLIC KEY-----
MIICIjANBgkqhkiG9w0BAQEFAAOCAg8AMIICCgKCAgEAoaPoEfv5RcVUbCuWNnOB
WtLHzcyQSe4SbtGGQom/X27iq/7s8dcebSsCd2cwYoyKihEQ5OlaghrhcxTTV5AN
39O6S0YnWjt/+4PWQQP3NpcEhqWj8RLPJtYq+JNrqlyjxBlca7vDcFSTa6iCqXay
iVD2OyTbWrD6KZ/YTSmSY8mY2qdYvHyp3Ue5ueH3rSkKRUjo4Jyjf59PntZD884P
yb9kC+weh/1KlbDQ4aV0U9p6DSBkW7dinOQj7a1/ikDoA9Nebnrkb1FF9Hr2+utO
We4e4yOViDzAP9hhQiBhOVR0F6wJF5i+NfuLit4tk5ViboogEZqIyuakTD6abSFg
UPqBTDDG0UsVqjnU5ysJ1DKQqALnOrxEKZoVXtH80/m7kgmeY3VDHCFt+WCSdaSq
1w8SoIpJAZPJpKlDjMxe+NqsX2qUODQ2KNkqfEqFtyUNZzfS9o9pEg/KJzDuDclM
oMQr1BG8vc3msX4UiGQPkohznwlCSGWf62IkSS6P8hQRCBKGRS5yGjmT3J+/chZw
Je46y8zNLV7t2pOL6UemdmDjTaMCt0YBc1FmG2eUipAWcHJWEHgQm2Yz6QjtBgvt
jFqnYeiDwdxU7CQD3oF9H+uVHqz8Jmmf9BxY9PhlMSUGPUsTpZ717ysL0UrBhQhW
xYp8vpeQ3by9WxPBE/WrxN8CAwEAAQ==
-----END PUBLIC KEY-----
";

/// The outer activation code envelope (matches issuer JSON structure).
///
/// Missing fields decode to empty strings, so a code without a signature
/// is rejected at verification rather than at parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationEnvelope {
    /// The signed token, verbatim.
    #[serde(rename = "Token", alias = "token", default)]
    pub token: String,
    /// Base64-encoded signature over `token`.
    #[serde(rename = "Signature", alias = "signature", default)]
    pub signature: String,
}

impl ActivationEnvelope {
    /// Decodes an activation code string into its envelope.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEncoding` if the code is not base64 and
    /// `MalformedCode` if the decoded bytes are not an envelope object.
    pub fn decode(code: &str) -> LicenseResult<Self> {
        let raw = STANDARD.decode(code.trim()).map_err(|e| {
            LicenseError::InvalidEncoding(format!("activation code is not base64 encoded: {e}"))
        })?;

        serde_json::from_slice(&raw).map_err(|e| {
            LicenseError::MalformedCode(format!("activation code is not valid JSON: {e}"))
        })
    }

    /// Encodes the envelope back into an activation code string.
    #[must_use]
    pub fn encode(&self) -> String {
        let json = serde_json::json!({
            "Token": self.token,
            "Signature": self.signature,
        });
        STANDARD.encode(json.to_string())
    }
}

/// The signed token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseToken {
    /// Expiry as an RFC 3339 string.
    #[serde(rename = "Expiry", alias = "expiry", default)]
    pub expiry: String,
}

impl LicenseToken {
    /// Builds a token for the given expiry.
    #[must_use]
    pub fn new(expiry: DateTime<Utc>) -> Self {
        Self {
            expiry: expiry.to_rfc3339(),
        }
    }

    /// Parses the expiry timestamp.
    ///
    /// # Errors
    ///
    /// Returns `MalformedExpiry` if the string is not RFC 3339.
    pub fn parse_expiry(&self) -> LicenseResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.expiry)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                LicenseError::MalformedExpiry(format!(
                    "expiry {:?} is not a valid RFC 3339 timestamp: {e}",
                    self.expiry
                ))
            })
    }
}

/// Validates activation codes against one RSA public key.
///
/// Holds no mutable state; share it freely across tasks.
#[derive(Debug, Clone)]
pub struct ActivationVerifier {
    public_key: RsaPublicKey,
}

impl ActivationVerifier {
    /// Builds a verifier from the embedded licensing authority key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPublicKey` if the embedded PEM is malformed. Callers
    /// should treat this as a fatal configuration error.
    pub fn embedded() -> LicenseResult<Self> {
        Self::from_public_key_pem(ACTIVATION_PUBLIC_KEY)
    }

    /// Builds a verifier from an SPKI PEM encoded RSA public key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPublicKey` if the PEM cannot be parsed as an RSA key.
    pub fn from_public_key_pem(pem: &str) -> LicenseResult<Self> {
        let public_key = RsaPublicKey::from_public_key_pem(pem.trim())
            .map_err(|e| LicenseError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { public_key })
    }

    /// Validates an activation code against the current time.
    ///
    /// # Errors
    ///
    /// See [`validate_at`](Self::validate_at).
    pub fn validate(&self, code: &str) -> LicenseResult<DateTime<Utc>> {
        self.validate_at(code, Utc::now())
    }

    /// Validates an activation code as of `now` and returns its expiry.
    ///
    /// # Errors
    ///
    /// Returns the first failing step: `InvalidEncoding`, `MalformedCode`,
    /// `InvalidSignature`, `MalformedToken`, `MalformedExpiry` or
    /// `AlreadyExpired`.
    pub fn validate_at(&self, code: &str, now: DateTime<Utc>) -> LicenseResult<DateTime<Utc>> {
        let envelope = ActivationEnvelope::decode(code)?;

        let signature = STANDARD.decode(envelope.signature.as_bytes()).map_err(|e| {
            LicenseError::InvalidEncoding(format!("signature is not base64 encoded: {e}"))
        })?;

        // Verify over the token bytes as received
        self.verify(envelope.token.as_bytes(), &signature)?;

        let token: LicenseToken = serde_json::from_str(&envelope.token).map_err(|e| {
            LicenseError::MalformedToken(format!("token is not valid JSON: {e}"))
        })?;

        let expiry = token.parse_expiry()?;
        if now > expiry {
            return Err(LicenseError::AlreadyExpired(expiry));
        }

        Ok(expiry)
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> LicenseResult<()> {
        let digest = Sha256::digest(message);
        self.public_key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
            .map_err(|_| LicenseError::InvalidSignature)
    }
}
