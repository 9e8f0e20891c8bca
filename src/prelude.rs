//! Convenience re-exports.
//!
//! # Example
//!
//! ```no_run
//! use redsys::prelude::*;
//!
//! # fn example() -> Result<(), RedsysError> {
//! let config = MerchantConfig {
//!     merchant_code: "999008881".to_string(),
//!     terminal: "001".to_string(),
//!     currency: "978".to_string(),
//!     key: MerchantKey::from_base64("sq7HjrUOBfKmC576ILgskD5srU870gJ7")?,
//!     environment: Environment::Test,
//!     notification_url: "https://shop.example.com/redsys/notify".to_string(),
//!     success_url: "https://shop.example.com/checkout/completed".to_string(),
//!     failure_url: "https://shop.example.com/redsys/error".to_string(),
//!     merchant_name: None,
//! };
//! let signed = build_payment(&config, &PaymentRequest::new("123", 1000))?;
//! # Ok(())
//! # }
//! ```

pub use crate::codec::DecodeError;
pub use crate::error::RedsysError;
pub use crate::key::{DerivedKey, KeyError, MerchantKey};
pub use crate::params::{fields, ParameterSet, ParamsError};
pub use crate::protocol::{
    build_payment, verify_notification, Environment, MerchantConfig, NotificationFields,
    PaymentRequest, ProtocolError, SignedRequest, VerifiedNotification,
};
pub use crate::signature::{SignatureError, SignatureScheme, SignedPayload, SIGNATURE_VERSION};
