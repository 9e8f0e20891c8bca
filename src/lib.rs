//! Signing and verification for the Redsys (Sermepa) redirect payment
//! protocol: outbound requests carry an HMAC-SHA256 over an ordered parameter
//! blob under a per-transaction derived key, and inbound asynchronous
//! notifications are authenticated against the same shared secret before any
//! payment claim is trusted. Pure and synchronous; HTTP, persistence, and the
//! browser redirect belong to the caller.

pub mod codec;
mod error;
pub mod key;
pub mod params;
pub mod prelude;
pub mod protocol;
pub mod signature;

pub use error::RedsysError;
pub use key::{DerivedKey, KeyError, MerchantKey};
pub use params::{ParameterSet, ParamsError};
pub use protocol::{
    build_payment, verify_notification, Environment, MerchantConfig, NotificationFields,
    PaymentRequest, ProtocolError, SignedRequest, VerifiedNotification,
};
pub use signature::{SignatureError, SignatureScheme, SignedPayload, SIGNATURE_VERSION};
