//! Base64 transforms used on the wire.
//!
//! The gateway transmits the parameter blob and signature as standard base64
//! on the outbound leg and as a url-substituted form (`+` -> `-`, `/` -> `_`)
//! on the notification leg. The substitution is applied after encoding and
//! reversed before decoding; padding behaves as in standard base64.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded bytes are not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Encode bytes as standard base64.
pub fn encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decode standard base64 text.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(BASE64.decode(text)?)
}

/// Encode bytes as base64 with the gateway's url character substitution.
pub fn encode_url(data: &[u8]) -> String {
    to_url(&BASE64.encode(data))
}

/// Decode base64 text carrying the gateway's url character substitution.
pub fn decode_url(text: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(BASE64.decode(from_url(text))?)
}

/// Decode url-substituted base64 into UTF-8 text.
pub fn decode_url_text(text: &str) -> Result<String, DecodeError> {
    Ok(String::from_utf8(decode_url(text)?)?)
}

/// Apply the url substitution to already-encoded base64 text.
pub fn to_url(encoded: &str) -> String {
    encoded.replace('+', "-").replace('/', "_")
}

fn from_url(encoded: &str) -> String {
    encoded.replace('-', "+").replace('_', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_round_trip() {
        let data = b"redsys parameter blob";
        assert_eq!(decode(&encode(data)).unwrap(), data);
    }

    #[test]
    fn test_url_round_trip_random() {
        let mut rng = rand::thread_rng();
        for len in [0usize, 1, 2, 3, 8, 31, 32, 257] {
            let mut data = vec![0u8; len];
            rng.fill_bytes(&mut data);
            assert_eq!(decode_url(&encode_url(&data)).unwrap(), data);
            assert_eq!(decode(&encode(&data)).unwrap(), data);
        }
    }

    #[test]
    fn test_url_substitution() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet
        let data = [0xfb, 0xff];
        assert_eq!(encode(&data), "+/8=");
        assert_eq!(encode_url(&data), "-_8=");
        assert_eq!(decode_url("-_8=").unwrap(), data);
    }

    #[test]
    fn test_invalid_characters_rejected() {
        assert!(matches!(decode("not base64!"), Err(DecodeError::Base64(_))));
        assert!(matches!(
            decode_url("%%invalid%%"),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(decode("abcde").is_err());
    }

    #[test]
    fn test_text_decoding() {
        let encoded = encode_url("{\"Ds_Order\":\"0001\"}".as_bytes());
        assert_eq!(decode_url_text(&encoded).unwrap(), "{\"Ds_Order\":\"0001\"}");
    }

    #[test]
    fn test_non_utf8_rejected() {
        let encoded = encode_url(&[0xff, 0xfe, 0xfd]);
        assert!(matches!(
            decode_url_text(&encoded),
            Err(DecodeError::Utf8(_))
        ));
    }
}
