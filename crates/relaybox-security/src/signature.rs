//! HMAC-SHA256 request and webhook signatures
//!
//! Outbound requests carry `sign(body, secret_key)` in the
//! `X-Ds-Req-Signature` header. Inbound webhook deliveries are checked by
//! canonicalizing the delivered data, signing it with the webhook signing key,
//! and comparing the digests as strings.
//!
//! Callers embed timestamps in the message before signing; the signer itself
//! adds nothing, so identical inputs always produce identical digests.

use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;

use crate::canonical;
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Compute the lowercase hex HMAC-SHA256 digest of `message` under `key`.
///
/// # Errors
///
/// - `ValidationError` if `message` or `key` is empty
/// - `SignatureError` if the MAC cannot be initialised
///
/// # Example
///
/// ```rust
/// use relaybox_security::signature::sign;
///
/// let digest = sign(r#"{"testing":true}"#, "12345").unwrap();
/// assert_eq!(digest.len(), 64);
/// assert_eq!(digest, sign(r#"{"testing":true}"#, "12345").unwrap());
/// ```
pub fn sign(message: &str, key: &str) -> Result<String> {
    if message.is_empty() || key.is_empty() {
        return Err(Error::validation(
            "Please provide string to sign and signing key",
        ));
    }

    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| Error::signature(format!("Failed to generate signature, {e}")))?;
    mac.update(message.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Recompute the signature of `message` and compare it with `signature`.
///
/// The comparison is plain string equality; a mismatch of any kind, including
/// length, yields `Ok(false)`.
///
/// # Errors
///
/// Propagates the errors of [`sign`].
pub fn verify(signature: &str, message: &str, key: &str) -> Result<bool> {
    let expected = sign(message, key)?;
    Ok(expected == signature)
}

/// Sign arbitrary JSON data in canonical form.
///
/// # Errors
///
/// Propagates the errors of [`canonical::serialize`] and [`sign`].
pub fn sign_data(data: &Value, key: &str) -> Result<String> {
    let serialized = canonical::serialize(data)?;
    sign(&serialized, key)
}

/// Verify a webhook-style signature over canonicalized data.
///
/// # Errors
///
/// Propagates the errors of [`canonical::serialize_value`] and [`sign`].
pub fn verify_data<T: Serialize + ?Sized>(data: &T, signature: &str, key: &str) -> Result<bool> {
    let serialized = canonical::serialize_value(data)?;
    verify(signature, &serialized, key)
}
