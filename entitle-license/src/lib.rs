//! Offline activation code verification.
//!
//! This crate handles:
//! - Decoding the base64 activation code envelope
//! - RSA (PKCS#1 v1.5, SHA-256) signature verification against a fixed key
//! - Parsing and checking the signed expiry
//!
//! Validation is a pure function of the code and the current time. It does
//! no I/O and keeps no mutable state beyond the parsed public key.
//!
//! # Activation Code Format
//!
//! Codes are formatted as: `base64({"Token": "<json>", "Signature": "<base64>"})`
//! where the token JSON is `{"Expiry": "<RFC 3339>"}`.

mod code;
mod error;

pub use code::{ACTIVATION_PUBLIC_KEY, ActivationEnvelope, ActivationVerifier, LicenseToken};
pub use error::{LicenseError, LicenseResult};
