//! Token and signature lifecycle integration tests
//!
//! Exercises the public API the way the client facade uses it:
//! - Issuing tokens from a parsed API key and verifying them
//! - Expiry boundaries without clock skew
//! - Tampering with claims or signatures
//! - Webhook signature verification over canonical payloads

mod common;

use chrono::{Duration, Utc};
use common::{current_timestamp, test_key, webhook_delivery};
use pretty_assertions::assert_eq;
use relaybox_security::{
    ErrorKind, Permission, Permissions, TOKEN_ISSUER, TokenPayload, TokenType, signature, token,
    validate_permissions,
};
use serde_json::json;

#[test]
fn test_issue_verify_with_api_key() {
    let key = test_key();
    let payload = TokenPayload::now(key.public_key()).with_client_id("client-1");

    let jwt = token::issue(&payload, key.secret_key(), 900).unwrap();
    let claims = token::verify(&jwt, key.secret_key()).unwrap();

    assert_eq!(claims.iss, TOKEN_ISSUER);
    assert_eq!(claims.payload.public_key, "appPid.keyId");
    assert_eq!(claims.payload.token_type, TokenType::IdToken);

    let now = current_timestamp();
    assert!(claims.iat <= now && claims.iat >= now - 5);
    assert_eq!(claims.exp, claims.iat + 900);
}

#[test]
fn test_room_token_carries_permissions() {
    let key = test_key();
    let raw = json!({ "chat": ["subscribe", "presence"], "news": ["*"] });
    assert!(validate_permissions(&raw).unwrap());

    let permissions = Permissions::from_value(&raw).unwrap().unwrap();
    let payload = TokenPayload::now(key.public_key())
        .with_token_type(TokenType::BasicAccess)
        .with_room_id("chat")
        .with_permissions(permissions);

    let jwt = token::issue(&payload, key.secret_key(), 60).unwrap();
    let granted = token::verify(&jwt, key.secret_key())
        .unwrap()
        .payload
        .permissions
        .unwrap();

    assert!(granted.allows("chat", Permission::Subscribe));
    assert!(!granted.allows("chat", Permission::Publish));
    assert!(granted.allows("news", Permission::History));
    assert!(!granted.allows("other", Permission::Subscribe));
}

#[test]
fn test_expired_token_rejected() {
    let key = test_key();
    let payload = TokenPayload::now(key.public_key());
    let issued_at = Utc::now() - Duration::seconds(120);

    let jwt = token::issue_at(&payload, key.secret_key(), 60, issued_at).unwrap();
    let err = token::verify(&jwt, key.secret_key()).unwrap_err();

    assert_eq!(err.kind, ErrorKind::Token);
    assert!(!err.is_retryable());
}

#[test]
fn test_tampered_claims_rejected() {
    let key = test_key();
    let jwt = token::issue(&TokenPayload::now(key.public_key()), key.secret_key(), 300).unwrap();

    // Swap in claims signed by a different key but keep the original signature
    let forged = token::issue(
        &TokenPayload::now("attacker.key").with_permissions(Permissions::Global),
        "other-secret",
        300,
    )
    .unwrap();

    let original: Vec<&str> = jwt.split('.').collect();
    let forged_parts: Vec<&str> = forged.split('.').collect();
    let spliced = format!("{}.{}.{}", original[0], forged_parts[1], original[2]);

    let err = token::verify(&spliced, key.secret_key()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Token);
}

#[test]
fn test_unsigned_token_rejected() {
    let key = test_key();
    let jwt = token::issue(&TokenPayload::now(key.public_key()), key.secret_key(), 300).unwrap();
    let (unsigned, _) = jwt.rsplit_once('.').unwrap();

    let err = token::verify(&format!("{unsigned}."), key.secret_key()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Token);
}

#[test]
fn test_webhook_signature_round_trip() {
    let signing_key = "whsec_abcde";
    let delivery = webhook_delivery();

    let signed = signature::sign_data(&delivery, signing_key).unwrap();
    assert!(signature::verify_data(&delivery, &signed, signing_key).unwrap());

    // Same content, different key order
    let reordered = json!({
        "timestamp": delivery["timestamp"],
        "session": delivery["session"],
        "event": delivery["event"],
        "data": delivery["data"],
        "id": delivery["id"]
    });
    assert!(signature::verify_data(&reordered, &signed, signing_key).unwrap());

    let mut altered = delivery.clone();
    altered["event"] = json!("room:leave");
    assert!(!signature::verify_data(&altered, &signed, signing_key).unwrap());
}
