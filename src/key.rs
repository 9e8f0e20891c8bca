//! Merchant secret handling and per-transaction key derivation.
//!
//! The gateway issues each merchant a 192-bit secret, configured as base64
//! text. The modern signing scheme never uses that secret directly: for every
//! transaction a derived key is computed by encrypting the order identifier
//! with 3DES in CBC mode (zero IV, zero-fill padding), and the derived key
//! becomes the HMAC key. The derived key lives only for the duration of one
//! signing or verification call.

use cbc::cipher::{block_padding::ZeroPadding, BlockEncryptMut, KeyIvInit};
use des::TdesEde3;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::codec::{self, DecodeError};

/// Required decoded length of the merchant secret: 24 bytes (192 bits),
/// triple-length 3DES keying.
pub const KEY_LEN: usize = 24;

const BLOCK_LEN: usize = 8;
const ZERO_IV: [u8; BLOCK_LEN] = [0u8; BLOCK_LEN];

type TdesCbcEnc = cbc::Encryptor<TdesEde3>;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("merchant key must decode to {KEY_LEN} bytes, got {actual}")]
    InvalidLength { actual: usize },
    #[error("merchant key is not valid base64: {0}")]
    Decode(#[from] DecodeError),
    #[error("order identifier is empty")]
    EmptyOrderId,
}

/// The merchant's shared secret as configured out-of-band.
///
/// Holds both the raw 24-byte key (for derivation) and the base64 text it was
/// configured as (the legacy scheme concatenates the undecoded text). Both
/// forms are zeroized on drop and never printed; `Debug` is redacted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MerchantKey {
    encoded: String,
    raw: Vec<u8>,
}

impl MerchantKey {
    /// Build a key from its configured base64 form.
    ///
    /// Fails if the text is not valid base64 or does not decode to exactly
    /// [`KEY_LEN`] bytes.
    pub fn from_base64(text: &str) -> Result<Self, KeyError> {
        let raw = codec::decode(text)?;
        if raw.len() != KEY_LEN {
            return Err(KeyError::InvalidLength { actual: raw.len() });
        }
        Ok(Self {
            encoded: text.to_owned(),
            raw,
        })
    }

    /// Derive the per-transaction HMAC key for the given order identifier.
    ///
    /// The order id's UTF-8 bytes are zero-padded to the 8-byte block
    /// boundary (inputs already on the boundary gain no extra block) and
    /// encrypted with 3DES-CBC under a zero IV. Deterministic: the same
    /// order and key always produce the same bytes.
    ///
    /// An empty order identifier is rejected. Callers that fell back to the
    /// empty string because the order field was absent surface that condition
    /// here rather than signing an empty input.
    pub fn derive(&self, order: &str) -> Result<DerivedKey, KeyError> {
        if order.is_empty() {
            return Err(KeyError::EmptyOrderId);
        }
        let cipher = TdesCbcEnc::new_from_slices(&self.raw, &ZERO_IV)
            .map_err(|_| KeyError::InvalidLength {
                actual: self.raw.len(),
            })?;
        let bytes = cipher.encrypt_padded_vec_mut::<ZeroPadding>(order.as_bytes());
        Ok(DerivedKey(bytes))
    }

    /// The secret exactly as configured, for the legacy digest input.
    pub(crate) fn secret_text(&self) -> &str {
        &self.encoded
    }
}

impl std::fmt::Debug for MerchantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MerchantKey(..)")
    }
}

/// Request-scoped key produced by [`MerchantKey::derive`]. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey(Vec<u8>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}
