//! End-to-end notification verification: authorized, refused, forged, and
//! malformed notifications, on both signing schemes.

use redsys::prelude::*;

const TEST_KEY: &str = "sq7HjrUOBfKmC576ILgskD5srU870gJ7";

// {"Ds_Date":"06/08/2026","Ds_Hour":"10:15","Ds_Amount":"1000","Ds_Currency":"978",
//  "Ds_Order":"0000123","Ds_MerchantCode":"999008881","Ds_Terminal":"001",
//  "Ds_Response":"0000","Ds_AuthorisationCode":"123456","Ds_TransactionType":"0",
//  "Ds_SecurePayment":"1"}
const AUTHORIZED_BLOB: &str = "eyJEc19EYXRlIjoiMDYvMDgvMjAyNiIsIkRzX0hvdXIiOiIxMDoxNSIsIkRzX0Ftb3VudCI6IjEwMDAiLCJEc19DdXJyZW5jeSI6Ijk3OCIsIkRzX09yZGVyIjoiMDAwMDEyMyIsIkRzX01lcmNoYW50Q29kZSI6Ijk5OTAwODg4MSIsIkRzX1Rlcm1pbmFsIjoiMDAxIiwiRHNfUmVzcG9uc2UiOiIwMDAwIiwiRHNfQXV0aG9yaXNhdGlvbkNvZGUiOiIxMjM0NTYiLCJEc19UcmFuc2FjdGlvblR5cGUiOiIwIiwiRHNfU2VjdXJlUGF5bWVudCI6IjEifQ==";
const AUTHORIZED_SIGNATURE: &str = "Bc6dXv1rqqJol1lyP04mT5kyPsFmoTdyHECuzDenRn4=";

// same notification with Ds_Response "0101"
const REFUSED_BLOB: &str = "eyJEc19EYXRlIjoiMDYvMDgvMjAyNiIsIkRzX0hvdXIiOiIxMDoxNSIsIkRzX0Ftb3VudCI6IjEwMDAiLCJEc19DdXJyZW5jeSI6Ijk3OCIsIkRzX09yZGVyIjoiMDAwMDEyMyIsIkRzX01lcmNoYW50Q29kZSI6Ijk5OTAwODg4MSIsIkRzX1Rlcm1pbmFsIjoiMDAxIiwiRHNfUmVzcG9uc2UiOiIwMTAxIiwiRHNfQXV0aG9yaXNhdGlvbkNvZGUiOiIxMjM0NTYiLCJEc19UcmFuc2FjdGlvblR5cGUiOiIwIiwiRHNfU2VjdXJlUGF5bWVudCI6IjEifQ==";
const REFUSED_SIGNATURE: &str = "ocj7qn8evUqaV6lJgSDA1V4vNqrITcRZEXhbOel8T-4=";

fn test_config() -> MerchantConfig {
    MerchantConfig {
        merchant_code: "999008881".to_string(),
        terminal: "001".to_string(),
        currency: "978".to_string(),
        key: MerchantKey::from_base64(TEST_KEY).unwrap(),
        environment: Environment::Test,
        notification_url: "https://shop.example.com/redsys/notify".to_string(),
        success_url: "https://shop.example.com/checkout/completed".to_string(),
        failure_url: "https://shop.example.com/redsys/error".to_string(),
        merchant_name: None,
    }
}

fn modern(blob: &str, signature: &str) -> NotificationFields {
    NotificationFields {
        signature_version: Some(SIGNATURE_VERSION.to_string()),
        merchant_parameters: Some(blob.to_string()),
        signature: Some(signature.to_string()),
        ..Default::default()
    }
}

#[test]
fn test_authorized_notification() -> Result<(), Box<dyn std::error::Error>> {
    let verified = verify_notification(&test_config(), &modern(AUTHORIZED_BLOB, AUTHORIZED_SIGNATURE))?;

    assert_eq!(verified.order(), "0000123");
    assert_eq!(verified.response_code(), Some(0));
    assert!(verified.is_authorized());
    assert_eq!(verified.get("Ds_Amount"), Some("1000"));
    assert_eq!(verified.get("Ds_Currency"), Some("978"));
    assert_eq!(verified.get("Ds_AuthorisationCode"), Some("123456"));
    Ok(())
}

#[test]
fn test_refused_notification_verifies_but_is_not_authorized(
) -> Result<(), Box<dyn std::error::Error>> {
    // valid signature, response 101: authentic refusal, not an authorization
    let verified = verify_notification(&test_config(), &modern(REFUSED_BLOB, REFUSED_SIGNATURE))?;

    assert_eq!(verified.response_code(), Some(101));
    assert!(!verified.is_authorized());
    Ok(())
}

#[test]
fn test_corrupted_signature_is_rejected() {
    let mut corrupted = AUTHORIZED_SIGNATURE.to_string();
    corrupted.replace_range(0..1, "A");
    let err = verify_notification(&test_config(), &modern(AUTHORIZED_BLOB, &corrupted)).unwrap_err();
    assert!(err.is_authentication_failure());
}

#[test]
fn test_signature_for_other_payload_is_rejected() {
    // a signature that is valid for a different blob must not transfer
    let err =
        verify_notification(&test_config(), &modern(AUTHORIZED_BLOB, REFUSED_SIGNATURE)).unwrap_err();
    assert!(err.is_authentication_failure());
}

#[test]
fn test_blob_bit_flips_are_rejected() {
    // flipping any sampled character of the blob must reject; depending on
    // where it lands it is an authentication failure, a decode error, or a
    // parse error, never a verified result
    let config = test_config();
    for position in [0, 7, 40, 100, AUTHORIZED_BLOB.len() - 3] {
        let mut tampered = AUTHORIZED_BLOB.to_string();
        let original = tampered.as_bytes()[position];
        let replacement = if original == b'A' { "B" } else { "A" };
        tampered.replace_range(position..position + 1, replacement);
        assert!(
            verify_notification(&config, &modern(&tampered, AUTHORIZED_SIGNATURE)).is_err(),
            "tampered byte at {position} was accepted"
        );
    }
}

#[test]
fn test_wrong_merchant_key_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = test_config();
    config.key = MerchantKey::from_base64(&redsys::codec::encode(&[0x42; 24]))?;
    let err =
        verify_notification(&config, &modern(AUTHORIZED_BLOB, AUTHORIZED_SIGNATURE)).unwrap_err();
    assert!(err.is_authentication_failure());
    Ok(())
}

#[test]
fn test_undecodable_blob_is_a_decode_error_not_an_empty_set() {
    let err = verify_notification(
        &test_config(),
        &modern("%%%not-base64url%%%", AUTHORIZED_SIGNATURE),
    )
    .unwrap_err();
    assert!(!err.is_authentication_failure());
    assert!(matches!(
        err,
        ProtocolError::Signature(SignatureError::Decode(_))
    ));
}

#[test]
fn test_missing_wrapper_fields_are_rejected_by_name() {
    let config = test_config();

    let mut missing_blob = modern(AUTHORIZED_BLOB, AUTHORIZED_SIGNATURE);
    missing_blob.merchant_parameters = None;
    let err = verify_notification(&config, &missing_blob).unwrap_err();
    assert!(
        matches!(err, ProtocolError::MissingField { field } if field == "Ds_MerchantParameters")
    );

    let mut missing_signature = modern(AUTHORIZED_BLOB, AUTHORIZED_SIGNATURE);
    missing_signature.signature = None;
    let err = verify_notification(&config, &missing_signature).unwrap_err();
    assert!(matches!(err, ProtocolError::MissingField { field } if field == "Ds_Signature"));
}

#[test]
fn test_notification_without_order_is_rejected_not_signed_empty() {
    // a blob with no order field falls back to the empty order id, which
    // derivation refuses; the notification is rejected rather than verified
    // against an empty-string key
    let blob = redsys::codec::encode_url(br#"{"Ds_Response":"0000"}"#);
    let err = verify_notification(&test_config(), &modern(&blob, "sig")).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::Signature(SignatureError::Key(KeyError::EmptyOrderId))
    ));
}

#[test]
fn test_legacy_notification_round() -> Result<(), Box<dyn std::error::Error>> {
    let fields = NotificationFields {
        amount: Some("1000".to_string()),
        order: Some("0000123".to_string()),
        merchant_code: Some("999008881".to_string()),
        currency: Some("978".to_string()),
        response: Some("0000".to_string()),
        signature: Some("90FC7CA4C72F616682713770FCAC8EFEBF40ECC8".to_string()),
        ..Default::default()
    };
    let verified = verify_notification(&test_config(), &fields)?;
    assert!(verified.is_authorized());
    assert_eq!(verified.order(), "0000123");

    // any field change invalidates the digest
    let mut inflated = fields.clone();
    inflated.amount = Some("999999".to_string());
    let err = verify_notification(&test_config(), &inflated).unwrap_err();
    assert!(err.is_authentication_failure());
    Ok(())
}

#[test]
fn test_parallel_verifications_share_nothing() {
    let config = test_config();
    std::thread::scope(|scope| {
        for _ in 0..8 {
            let config = &config;
            scope.spawn(move || {
                let verified =
                    verify_notification(config, &modern(AUTHORIZED_BLOB, AUTHORIZED_SIGNATURE))
                        .unwrap();
                assert!(verified.is_authorized());

                let forged = verify_notification(
                    config,
                    &modern(REFUSED_BLOB, AUTHORIZED_SIGNATURE),
                );
                assert!(forged.unwrap_err().is_authentication_failure());
            });
        }
    });
}
