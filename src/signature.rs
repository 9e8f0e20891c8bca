//! Signature computation and verification for both protocol generations.
//!
//! The modern scheme signs the base64 parameter blob with HMAC-SHA256 under a
//! per-transaction derived key. The superseded legacy scheme hashes a fixed
//! concatenation of plaintext fields and the undecoded shared secret with
//! SHA-1. Which scheme applies to a notification is decided by the presence
//! of the `Ds_SignatureVersion` field, not by its value.

use hmac::{digest::KeyInit, Hmac, Mac};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use thiserror::Error;

use crate::codec::{self, DecodeError};
use crate::key::{KeyError, MerchantKey};
use crate::params::{ParameterSet, ParamsError};

/// Value of `Ds_SignatureVersion` identifying the HMAC scheme.
pub const SIGNATURE_VERSION: &str = "HMAC_SHA256_V1";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("parameter error: {0}")]
    Params(#[from] ParamsError),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("HMAC rejected the derived key")]
    Mac,
    #[error("signature mismatch, notification is not authentic")]
    Mismatch,
}

/// The two signing generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// HMAC-SHA256 over the base64 parameter blob, derived key.
    Modern,
    /// SHA-1 over a plaintext field concatenation, raw shared secret.
    Legacy,
}

impl SignatureScheme {
    /// Select the scheme for a notification from its signature-version field.
    pub fn of(signature_version: Option<&str>) -> Self {
        match signature_version {
            Some(_) => Self::Modern,
            None => Self::Legacy,
        }
    }
}

/// The two transmitted values produced by modern signing.
#[derive(Debug, Clone)]
pub struct SignedPayload {
    /// Base64 of the compact JSON parameter object.
    pub merchant_parameters: String,
    /// Base64 of the HMAC-SHA256 digest.
    pub signature: String,
}

/// Sign an outbound parameter set with the modern scheme.
///
/// Serializes the set in insertion order, base64-encodes it, derives the
/// transaction key from the `DS_MERCHANT_ORDER` field (historical spelling
/// accepted), and MACs the UTF-8 bytes of the encoded blob.
pub fn sign(params: &ParameterSet, key: &MerchantKey) -> Result<SignedPayload, SignatureError> {
    let blob = codec::encode(params.to_json()?.as_bytes());
    let derived = key.derive(params.merchant_order())?;
    let digest = hmac_sha256(derived.as_bytes(), blob.as_bytes())?;
    Ok(SignedPayload {
        merchant_parameters: blob,
        signature: codec::encode(&digest),
    })
}

/// Verify an inbound notification blob against its claimed signature.
///
/// The blob is decoded only to recover the order id for key derivation; the
/// MAC is recomputed over the blob text exactly as received, then re-encoded
/// in the url form and compared by exact string equality. On success the
/// decoded parameters are released to the caller; any failure means the
/// notification must not be trusted.
pub fn verify(
    merchant_parameters: &str,
    signature: &str,
    key: &MerchantKey,
) -> Result<ParameterSet, SignatureError> {
    let text = codec::decode_url_text(merchant_parameters)?;
    let params = ParameterSet::from_json(&text)?;
    let derived = key.derive(params.notified_order())?;
    let digest = hmac_sha256(derived.as_bytes(), merchant_parameters.as_bytes())?;
    let expected = codec::to_url(&codec::encode(&digest));
    if expected != signature {
        return Err(SignatureError::Mismatch);
    }
    Ok(params)
}

/// Plaintext fields covered by the legacy notification digest, in digest order.
#[derive(Debug, Clone, Copy)]
pub struct LegacyNotification<'a> {
    pub amount: &'a str,
    pub order: &'a str,
    pub merchant_code: &'a str,
    pub currency: &'a str,
    pub response: &'a str,
}

/// Plaintext fields covered by the legacy request digest, in digest order.
#[derive(Debug, Clone, Copy)]
pub struct LegacyRequest<'a> {
    pub amount: &'a str,
    pub order: &'a str,
    pub merchant_code: &'a str,
    pub currency: &'a str,
    pub transaction_type: &'a str,
    pub merchant_url: &'a str,
}

/// Legacy notification signature: SHA-1 over the concatenated fields with the
/// secret (as configured, not base64-decoded) appended, uppercase hex.
pub fn legacy_notification_signature(n: &LegacyNotification<'_>, key: &MerchantKey) -> String {
    let input = format!(
        "{}{}{}{}{}{}",
        n.amount,
        n.order,
        n.merchant_code,
        n.currency,
        n.response,
        key.secret_text()
    );
    sha1_upper_hex(input.as_bytes())
}

/// Verify a legacy notification signature. Case-sensitive exact comparison,
/// as produced.
pub fn verify_legacy(
    n: &LegacyNotification<'_>,
    signature: &str,
    key: &MerchantKey,
) -> Result<(), SignatureError> {
    if legacy_notification_signature(n, key) != signature {
        return Err(SignatureError::Mismatch);
    }
    Ok(())
}

/// Legacy request signature, for integrations predating the HMAC scheme.
pub fn legacy_request_signature(r: &LegacyRequest<'_>, key: &MerchantKey) -> String {
    let input = format!(
        "{}{}{}{}{}{}{}",
        r.amount,
        r.order,
        r.merchant_code,
        r.currency,
        r.transaction_type,
        r.merchant_url,
        key.secret_text()
    );
    sha1_upper_hex(input.as_bytes())
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let mut mac =
        <HmacSha256 as KeyInit>::new_from_slice(key).map_err(|_| SignatureError::Mac)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha1_upper_hex(data: &[u8]) -> String {
    Sha1::digest(data)
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect()
}
