//! Unified error type for the public API.
//!
//! Each module keeps its domain-specific error for precise handling; this
//! type consolidates them for callers that funnel every failure into one
//! "treat the payment as not paid and log" path.

use thiserror::Error;

use crate::codec::DecodeError;
use crate::key::KeyError;
use crate::params::ParamsError;
use crate::protocol::ProtocolError;
use crate::signature::SignatureError;

/// Any failure raised by this crate.
///
/// All variants are local, recoverable conditions: a failed verification is a
/// definite "untrusted" verdict, not a crash, and a failed outbound signing
/// aborts that attempt before anything is transmitted. No error path ever
/// upgrades into an accepted payment.
#[derive(Debug, Error)]
pub enum RedsysError {
    /// Malformed base64 or non-UTF-8 payload
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Merchant key construction or derivation error
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// Parameter set construction or parsing error
    #[error("parameter error: {0}")]
    Params(#[from] ParamsError),

    /// Signature computation or comparison error
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    /// Orchestration error (missing fields, wrapped verification failures)
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl RedsysError {
    /// True when a recomputed signature did not match the claimed one, on
    /// either scheme. The notification must be treated as forged.
    pub fn is_authentication_failure(&self) -> bool {
        match self {
            Self::Signature(SignatureError::Mismatch) => true,
            Self::Protocol(e) => e.is_authentication_failure(),
            _ => false,
        }
    }

    /// True when the input could not even be decoded or parsed.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::Decode(_)
                | Self::Params(_)
                | Self::Signature(SignatureError::Decode(_))
                | Self::Signature(SignatureError::Params(_))
                | Self::Protocol(ProtocolError::Signature(SignatureError::Decode(_)))
                | Self::Protocol(ProtocolError::Signature(SignatureError::Params(_)))
        )
    }

    /// True when the merchant configuration itself is unusable (bad key).
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Key(KeyError::InvalidLength { .. } | KeyError::Decode(_))
        )
    }
}
