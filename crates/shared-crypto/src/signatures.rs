//! # HMAC-SHA256 Object Signatures
//!
//! Message authentication over canonically hashed objects. The MAC runs over
//! the object's canonical hash rather than its raw encoding, so any two
//! representations of the same logical object verify against the same
//! signature.
//!
//! ## Reference key scheme
//!
//! Identity strings double as key material: [`Keypair::public_key`] returns
//! the secret itself. Verification therefore recomputes the MAC with the
//! claimed identity as the key. Swapping in a real asymmetric scheme means
//! reimplementing [`sign_object`] / [`verify_object_signature`]; call sites
//! already pass distinct secret and identity arguments.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

use crate::hashing::object_hash;

type HmacSha256 = Hmac<Sha256>;

/// Sign an object with a secret key. Output is lowercase hex.
pub fn sign_object(secret: &str, object: &Value) -> String {
    let hash = object_hash(object);

    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(hash.as_bytes());

    hex::encode(mac.finalize().into_bytes())
}

/// Verify a signature against an object and the signer's identity.
pub fn verify_object_signature(identity: &str, signature: &str, object: &Value) -> bool {
    let actual = sign_object(identity, object);

    !actual.is_empty() && actual == signature
}

/// A signing identity.
///
/// In the reference scheme the public key is the secret string itself; the
/// type exists so call sites distinguish "what I sign with" from "what others
/// verify against".
#[derive(Debug, Clone)]
pub struct Keypair {
    secret: String,
}

impl Keypair {
    /// Build a keypair from a secret string.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// The identity other nodes verify signatures against.
    pub fn public_key(&self) -> String {
        self.secret.clone()
    }

    /// Sign an object with this keypair's secret.
    pub fn sign(&self, object: &Value) -> String {
        sign_object(&self.secret, object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sign_verify_round_trip() {
        let payload = json!({"from": "alice", "to": "bob", "amount": "40"});
        let sig = sign_object("alice-key", &payload);

        assert!(verify_object_signature("alice-key", &sig, &payload));
    }

    #[test]
    fn test_wrong_key_fails() {
        let payload = json!({"from": "alice", "to": "bob", "amount": "40"});
        let sig = sign_object("alice-key", &payload);

        assert!(!verify_object_signature("bob-key", &sig, &payload));
    }

    #[test]
    fn test_mutated_payload_fails() {
        let payload = json!({"from": "alice", "to": "bob", "amount": "40"});
        let sig = sign_object("alice-key", &payload);
        let mutated = json!({"from": "alice", "to": "bob", "amount": "41"});

        assert!(!verify_object_signature("alice-key", &sig, &mutated));
    }

    #[test]
    fn test_field_order_irrelevant() {
        let sig = sign_object("k", &json!({"a": 1, "b": 2}));

        assert!(verify_object_signature("k", &sig, &json!({"b": 2, "a": 1})));
    }

    #[test]
    fn test_keypair_public_key_is_identity() {
        let keypair = Keypair::new("node_7");
        let payload = json!({"hash": "abc"});
        let sig = keypair.sign(&payload);

        assert!(verify_object_signature(&keypair.public_key(), &sig, &payload));
    }

    #[test]
    fn test_signature_is_hex() {
        let sig = sign_object("k", &json!({}));
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
