//! Outbound request assembly and inbound notification verification.
//!
//! This is the seam between the signing machinery and the surrounding
//! commerce system: callers hand in merchant configuration and order data and
//! get back either the three fields to POST to the gateway, or a definite
//! verified/rejected verdict for a received notification. Order-state
//! decisions stay with the caller; this module only authenticates and
//! reports.

use serde::Deserialize;
use thiserror::Error;

use crate::key::MerchantKey;
use crate::params::{fields, ParameterSet, ParamsError};
use crate::signature::{
    self, LegacyNotification, SignatureError, SignatureScheme, SIGNATURE_VERSION,
};

/// Transaction type for an authorization request. The only type this
/// integration supports; capture, refund and void are not offered.
pub const TRANSACTION_AUTHORIZATION: &str = "0";

/// The gateway requires order ids of at least four characters; shorter
/// numeric ids are zero-padded on the left.
const ORDER_MIN_LEN: usize = 4;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("missing notification field {field}")]
    MissingField { field: &'static str },
    #[error("parameter error: {0}")]
    Params(#[from] ParamsError),
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),
}

impl ProtocolError {
    /// True when verification failed because the recomputed signature did not
    /// match the claimed one.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::Signature(SignatureError::Mismatch))
    }
}

/// Gateway mode. Test and live use distinct endpoints and secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Test,
    Live,
}

impl Environment {
    /// The payment endpoint the signed form is POSTed to.
    pub fn payment_url(self) -> &'static str {
        match self {
            Self::Test => "https://sis-t.redsys.es:25443/sis/realizarPago",
            Self::Live => "https://sis.redsys.es/sis/realizarPago",
        }
    }
}

/// Merchant-level configuration, supplied per call by the surrounding system.
///
/// Read-only from this crate's perspective; nothing here is cached across
/// calls, so multi-store deployments can pass a different configuration for
/// every transaction.
#[derive(Debug, Clone)]
pub struct MerchantConfig {
    /// Merchant code (FUC) assigned by the gateway.
    pub merchant_code: String,
    /// Terminal number, zero-padded as configured at the gateway.
    pub terminal: String,
    /// ISO 4217 numeric currency code, e.g. `"978"` for EUR.
    pub currency: String,
    pub key: MerchantKey,
    pub environment: Environment,
    /// Where the gateway delivers the asynchronous notification.
    pub notification_url: String,
    /// Browser return URL after an accepted payment.
    pub success_url: String,
    /// Browser return URL after a failed or cancelled payment.
    pub failure_url: String,
    /// Shop name shown on the gateway's payment page.
    pub merchant_name: Option<String>,
}

/// Order data for one payment attempt.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Numeric order identifier. Zero-padded to the gateway minimum during
    /// assembly; otherwise treated as an opaque string.
    pub order: String,
    /// Amount in minor currency units (cents for EUR).
    pub amount: u64,
    /// Cardholder name shown on the payment page.
    pub cardholder: Option<String>,
    /// Product description shown on the payment page.
    pub description: Option<String>,
}

impl PaymentRequest {
    pub fn new(order: impl Into<String>, amount: u64) -> Self {
        Self {
            order: order.into(),
            amount,
            cardholder: None,
            description: None,
        }
    }
}

/// The signed field set handed to the redirect mechanism.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// Gateway endpoint for the selected environment.
    pub endpoint: &'static str,
    pub signature_version: &'static str,
    pub merchant_parameters: String,
    pub signature: String,
}

impl SignedRequest {
    /// The three transmitted fields, named as the gateway expects them.
    pub fn form_fields(&self) -> [(&'static str, &str); 3] {
        [
            (fields::SIGNATURE_VERSION, self.signature_version),
            (fields::MERCHANT_PARAMETERS, &self.merchant_parameters),
            (fields::SIGNATURE, &self.signature),
        ]
    }
}

/// Raw notification fields as delivered by the gateway (form or query data).
///
/// The transport decoding is the HTTP collaborator's job; this struct is the
/// already-decoded field set. Modern notifications carry the first three
/// fields; legacy ones carry the plain fields plus the signature.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFields {
    #[serde(rename = "Ds_SignatureVersion")]
    pub signature_version: Option<String>,
    #[serde(rename = "Ds_MerchantParameters")]
    pub merchant_parameters: Option<String>,
    #[serde(rename = "Ds_Signature")]
    pub signature: Option<String>,
    #[serde(rename = "Ds_Amount")]
    pub amount: Option<String>,
    #[serde(rename = "Ds_Order")]
    pub order: Option<String>,
    #[serde(rename = "Ds_MerchantCode")]
    pub merchant_code: Option<String>,
    #[serde(rename = "Ds_Currency")]
    pub currency: Option<String>,
    #[serde(rename = "Ds_Response")]
    pub response: Option<String>,
}

/// An authenticated notification. Existence of this value means the
/// signature checked out; whether the payment was authorized is a separate
/// question answered by [`VerifiedNotification::is_authorized`].
#[derive(Debug, Clone)]
pub struct VerifiedNotification {
    params: ParameterSet,
}

impl VerifiedNotification {
    /// The gateway's order id for this notification.
    pub fn order(&self) -> &str {
        self.params.notified_order()
    }

    /// Numeric response code. The gateway zero-pads codes (`"0000"`);
    /// leading zeros are accepted. `None` if the field is absent or not
    /// numeric.
    pub fn response_code(&self) -> Option<i32> {
        self.params.get(fields::RESPONSE)?.parse().ok()
    }

    /// True when the response code signals an authorized payment: codes in
    /// `[0, 100)`. Every other code, and a missing or malformed code, is a
    /// refusal.
    pub fn is_authorized(&self) -> bool {
        matches!(self.response_code(), Some(code) if (0..100).contains(&code))
    }

    /// An echoed parameter by exact field name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    /// All decoded parameters.
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }
}

/// Assemble and sign an outbound payment request.
///
/// Populates the parameter set in the gateway's field order, signs it with
/// the modern scheme, and returns the transmitted field set together with the
/// endpoint for the configured environment. Any failure aborts the attempt;
/// no partially signed request is ever produced.
pub fn build_payment(
    config: &MerchantConfig,
    request: &PaymentRequest,
) -> Result<SignedRequest, ProtocolError> {
    let mut params = ParameterSet::new();
    params.set(fields::MERCHANT_AMOUNT, request.amount.to_string())?;
    params.set(fields::MERCHANT_ORDER, padded_order(&request.order))?;
    params.set(fields::MERCHANT_CODE, config.merchant_code.clone())?;
    params.set(fields::MERCHANT_CURRENCY, config.currency.clone())?;
    params.set(fields::MERCHANT_TRANSACTION_TYPE, TRANSACTION_AUTHORIZATION)?;
    params.set(fields::MERCHANT_TERMINAL, config.terminal.clone())?;
    params.set(fields::MERCHANT_URL, config.notification_url.clone())?;
    params.set(fields::MERCHANT_URL_OK, config.success_url.clone())?;
    params.set(fields::MERCHANT_URL_KO, config.failure_url.clone())?;
    if let Some(name) = &config.merchant_name {
        params.set(fields::MERCHANT_NAME, name.clone())?;
    }
    if let Some(holder) = &request.cardholder {
        params.set(fields::MERCHANT_TITULAR, holder.clone())?;
    }
    if let Some(description) = &request.description {
        params.set(fields::MERCHANT_PRODUCT_DESCRIPTION, description.clone())?;
    }

    let payload = signature::sign(&params, &config.key)?;
    Ok(SignedRequest {
        endpoint: config.environment.payment_url(),
        signature_version: SIGNATURE_VERSION,
        merchant_parameters: payload.merchant_parameters,
        signature: payload.signature,
    })
}

/// Verify a received notification and release its parameters.
///
/// The scheme is selected by the presence of `Ds_SignatureVersion`. Missing
/// required fields, undecodable blobs, malformed parameter JSON, and
/// signature mismatches all reject the notification; a verified result is
/// only returned when the recomputed signature matches exactly.
pub fn verify_notification(
    config: &MerchantConfig,
    notification: &NotificationFields,
) -> Result<VerifiedNotification, ProtocolError> {
    match SignatureScheme::of(notification.signature_version.as_deref()) {
        SignatureScheme::Modern => {
            let blob = require(&notification.merchant_parameters, fields::MERCHANT_PARAMETERS)?;
            let claimed = require(&notification.signature, fields::SIGNATURE)?;
            let params = signature::verify(blob, claimed, &config.key)?;
            Ok(VerifiedNotification { params })
        }
        SignatureScheme::Legacy => {
            let amount = require(&notification.amount, fields::AMOUNT)?;
            let order = require(&notification.order, fields::ORDER)?;
            let merchant_code =
                require(&notification.merchant_code, fields::NOTIFIED_MERCHANT_CODE)?;
            let currency = require(&notification.currency, fields::CURRENCY)?;
            let response = require(&notification.response, fields::RESPONSE)?;
            let claimed = require(&notification.signature, fields::SIGNATURE)?;
            let legacy = LegacyNotification {
                amount,
                order,
                merchant_code,
                currency,
                response,
            };
            signature::verify_legacy(&legacy, claimed, &config.key)?;

            let mut params = ParameterSet::new();
            params.set(fields::AMOUNT, amount)?;
            params.set(fields::ORDER, order)?;
            params.set(fields::NOTIFIED_MERCHANT_CODE, merchant_code)?;
            params.set(fields::CURRENCY, currency)?;
            params.set(fields::RESPONSE, response)?;
            Ok(VerifiedNotification { params })
        }
    }
}

fn require<'a>(
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str, ProtocolError> {
    value
        .as_deref()
        .ok_or(ProtocolError::MissingField { field })
}

fn padded_order(order: &str) -> String {
    format!("{:0>width$}", order, width = ORDER_MIN_LEN)
}
