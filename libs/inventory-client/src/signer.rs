//! Request signing
//!
//! The signature is HMAC-SHA256, keyed with the shared secret, over
//! `key_id "\n" public_key "\n" body` where `body` is the exact serialized
//! command tuple that goes on the wire. Output is lower-case hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

use crate::command::Command;
use crate::error::{InventoryError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the key identifier
pub const KEY_ID_HEADER: &str = "x-api-key-id";
/// Header carrying the public key
pub const PUBLIC_KEY_HEADER: &str = "x-api-public-key";
/// Header carrying the computed signature
pub const SIGNATURE_HEADER: &str = "x-api-signature";

/// API credentials; only derived signatures ever leave the process
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key_id: String,
    secret: String,
    public_key: String,
}

impl Credentials {
    pub fn new(
        key_id: impl Into<String>,
        secret: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            secret: secret.into(),
            public_key: public_key.into(),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| InventoryError::configuration(format!("Invalid API secret: {}", e)))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("secret", &"<redacted>")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// A serialized command with its signature and identifying headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub key_id: String,
    pub public_key: String,
    pub signature: String,
    pub body: Vec<u8>,
}

impl SignedRequest {
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("content-type".to_string(), "application/json".to_string()),
            (KEY_ID_HEADER.to_string(), self.key_id.clone()),
            (PUBLIC_KEY_HEADER.to_string(), self.public_key.clone()),
            (SIGNATURE_HEADER.to_string(), self.signature.clone()),
        ]
    }
}

/// Sign raw body bytes
pub fn sign_bytes(credentials: &Credentials, body: &[u8]) -> Result<String> {
    let mut mac = credentials.mac()?;
    mac.update(credentials.key_id.as_bytes());
    mac.update(b"\n");
    mac.update(credentials.public_key.as_bytes());
    mac.update(b"\n");
    mac.update(body);
    Ok(const_hex::encode(mac.finalize().into_bytes()))
}

/// Sign a command over its serialized form
pub fn sign(credentials: &Credentials, command: &Command) -> Result<String> {
    sign_bytes(credentials, &command.to_body()?)
}

/// Serialize once, sign those exact bytes, and keep them for sending
pub fn sign_command(credentials: &Credentials, command: &Command) -> Result<SignedRequest> {
    let body = command.to_body()?;
    let signature = sign_bytes(credentials, &body)?;
    Ok(SignedRequest {
        key_id: credentials.key_id.clone(),
        public_key: credentials.public_key.clone(),
        signature,
        body,
    })
}

/// Constant-time check of `signature` against `body`
pub fn verify(credentials: &Credentials, body: &[u8], signature: &str) -> bool {
    match sign_bytes(credentials, body) {
        Ok(expected) => expected.as_bytes().ct_eq(signature.as_bytes()).into(),
        Err(_) => false,
    }
}
