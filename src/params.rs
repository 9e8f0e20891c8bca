//! Ordered gateway parameter sets.
//!
//! The modern scheme signs the byte-for-byte JSON serialization of the
//! parameter set, so insertion order is part of the protocol: the same
//! key/value pairs inserted in a different order produce a different blob and
//! therefore a different signature. The set is backed by an insertion-ordered
//! vector rather than a map, and duplicate keys are rejected instead of
//! silently overwritten.

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Gateway field names.
///
/// The order-id field exists in two historical spellings on each leg; the
/// canonical accessors on [`ParameterSet`] resolve them in one place.
pub mod fields {
    // Outbound merchant parameters, in the order they are transmitted.
    pub const MERCHANT_AMOUNT: &str = "DS_MERCHANT_AMOUNT";
    pub const MERCHANT_ORDER: &str = "DS_MERCHANT_ORDER";
    pub const MERCHANT_CODE: &str = "DS_MERCHANT_MERCHANTCODE";
    pub const MERCHANT_CURRENCY: &str = "DS_MERCHANT_CURRENCY";
    pub const MERCHANT_TRANSACTION_TYPE: &str = "DS_MERCHANT_TRANSACTIONTYPE";
    pub const MERCHANT_TERMINAL: &str = "DS_MERCHANT_TERMINAL";
    pub const MERCHANT_URL: &str = "DS_MERCHANT_MERCHANTURL";
    pub const MERCHANT_URL_OK: &str = "DS_MERCHANT_URLOK";
    pub const MERCHANT_URL_KO: &str = "DS_MERCHANT_URLKO";
    pub const MERCHANT_NAME: &str = "DS_MERCHANT_MERCHANTNAME";
    pub const MERCHANT_TITULAR: &str = "DS_MERCHANT_TITULAR";
    pub const MERCHANT_PRODUCT_DESCRIPTION: &str = "DS_MERCHANT_PRODUCTDESCRIPTION";

    // Decoded notification parameters.
    pub const ORDER: &str = "Ds_Order";
    pub const RESPONSE: &str = "Ds_Response";
    pub const AMOUNT: &str = "Ds_Amount";
    pub const CURRENCY: &str = "Ds_Currency";
    pub const NOTIFIED_MERCHANT_CODE: &str = "Ds_MerchantCode";

    // Transmitted wrapper fields, both legs.
    pub const SIGNATURE_VERSION: &str = "Ds_SignatureVersion";
    pub const MERCHANT_PARAMETERS: &str = "Ds_MerchantParameters";
    pub const SIGNATURE: &str = "Ds_Signature";
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("duplicate parameter {key:?}")]
    DuplicateKey { key: String },
    #[error("malformed parameter JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An insertion-ordered mapping of gateway field names to string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: Vec<(String, String)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Inserting a key that is already present is an error,
    /// not an overwrite.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ParamsError> {
        let key = key.into();
        if self.get(&key).is_some() {
            return Err(ParamsError::DuplicateKey { key });
        }
        self.entries.push((key, value.into()));
        Ok(())
    }

    /// Look up a field by exact name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn get_ignore_case(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// The order id of an outbound request: `DS_MERCHANT_ORDER`, falling back
    /// case-insensitively to the historical `Ds_Merchant_Order` spelling, and
    /// to the empty string when neither is present. The empty fallback is
    /// deliberate legacy behavior; key derivation rejects it explicitly.
    pub fn merchant_order(&self) -> &str {
        self.get(fields::MERCHANT_ORDER)
            .or_else(|| self.get_ignore_case(fields::MERCHANT_ORDER))
            .unwrap_or("")
    }

    /// The order id of a decoded notification: `Ds_Order`, falling back
    /// case-insensitively to `DS_ORDER`, then to the empty string.
    pub fn notified_order(&self) -> &str {
        self.get(fields::ORDER)
            .or_else(|| self.get_ignore_case(fields::ORDER))
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize to the compact JSON object that is signed. Field order is
    /// insertion order.
    pub fn to_json(&self) -> Result<String, ParamsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a decoded parameter blob. Malformed JSON, non-object documents,
    /// non-string values, and duplicate keys are all rejected.
    pub fn from_json(text: &str) -> Result<Self, ParamsError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Serialize for ParameterSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParameterSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ParameterSetVisitor;

        impl<'de> Visitor<'de> for ParameterSetVisitor {
            type Value = ParameterSet;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an object of string-valued gateway fields")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut set = ParameterSet::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    set.set(key, value).map_err(de::Error::custom)?;
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(ParameterSetVisitor)
    }
}
