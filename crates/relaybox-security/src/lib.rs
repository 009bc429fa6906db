//! # RelayBox Security - Tokens, Signatures and Permissions
//!
//! The I/O-free core of the RelayBox SDK. Everything here is a pure function
//! of its inputs plus the system clock, which makes it safe to share across
//! threads and easy to test.
//!
//! ## Architecture
//!
//! - [`error`] - Unified [`Error`] type with a closed [`ErrorKind`] taxonomy
//! - [`api_key`] - Splitting `appPid.keyId:secretKey` into its halves
//! - [`canonical`] - Key-order-independent serialization for signing
//! - [`signature`] - HMAC-SHA256 request and webhook signatures
//! - [`token`] - HS256 signed tokens with issuer and expiry
//! - [`permissions`] - Room permission grammar and validation
//!
//! ## Quick Start
//!
//! ```rust
//! use relaybox_security::{ApiKeyParts, TokenPayload, signature, token};
//!
//! let key = ApiKeyParts::parse("appPid.keyId:secret").unwrap();
//!
//! // Room-scoped bearer token
//! let payload = TokenPayload::now(key.public_key()).with_room_id("chat");
//! let jwt = token::issue(&payload, key.secret_key(), 900).unwrap();
//! assert_eq!(token::verify(&jwt, key.secret_key()).unwrap().payload, payload);
//!
//! // Request signature
//! let digest = signature::sign(r#"{"event":"message"}"#, key.secret_key()).unwrap();
//! assert!(signature::verify(&digest, r#"{"event":"message"}"#, key.secret_key()).unwrap());
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api_key;
pub mod canonical;
pub mod error;
pub mod permissions;
pub mod signature;
pub mod token;

pub use api_key::ApiKeyParts;
pub use error::{Error, ErrorKind, Result};
pub use permissions::{Permission, Permissions, validate_permissions};
pub use token::{ClientId, TOKEN_ISSUER, TokenClaims, TokenPayload, TokenType};
