//! Ed25519 key material and signing.
//!
//! Signatures are computed over the raw canonical blob; there is no
//! hashing step beyond what Ed25519 does internally.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};

use crate::blockchain::types::{ClientError, ClientResult};

/// Length of an Ed25519 secret key (seed) in bytes.
pub const SECRET_KEY_LENGTH: usize = ed25519_dalek::SECRET_KEY_LENGTH;

/// A wallet's signing keypair.
pub struct KeyMaterial {
    signing_key: SigningKey,
}

impl KeyMaterial {
    /// Build from a raw 32-byte secret.
    pub fn from_bytes(bytes: &[u8]) -> ClientResult<Self> {
        let seed: [u8; SECRET_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            ClientError::InvalidKeyMaterial(format!(
                "expected {} bytes, got {}",
                SECRET_KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Build from a base64-encoded 32-byte secret.
    pub fn from_base64(encoded: &str) -> ClientResult<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| ClientError::InvalidKeyMaterial(format!("invalid base64: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        public_key_bytes(&self.signing_key)
    }

    /// Public key as carried in a submission payload.
    pub fn public_key_base64(&self) -> String {
        BASE64.encode(self.public_key_bytes())
    }

    pub fn sign(&self, blob: &[u8]) -> Signature {
        sign(&self.signing_key, blob)
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("public_key", &self.public_key_base64())
            .finish_non_exhaustive()
    }
}

/// Sign `blob` with `key`. Deterministic for a given key and blob.
pub fn sign(key: &SigningKey, blob: &[u8]) -> Signature {
    key.sign(blob)
}

pub fn public_key_bytes(key: &SigningKey) -> [u8; 32] {
    key.verifying_key().to_bytes()
}

pub fn signature_base64(signature: &Signature) -> String {
    BASE64.encode(signature.to_bytes())
}

/// Verify `signature` over `blob` as the remote verifier would.
///
/// Returns `false` for malformed keys or signatures.
pub fn verify(public_key: &[u8], blob: &[u8], signature: &[u8]) -> bool {
    let Ok(public_key) = <[u8; 32]>::try_from(public_key) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify(blob, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> KeyMaterial {
        KeyMaterial::from_bytes(&[7u8; 32]).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let keys = keys();
        let blob = br#"{"from":"addrX","to_":"contractY","amount":"0","nonce":6,"ou":"1","timestamp":1700000000.123456}"#;
        let signature = keys.sign(blob);
        assert!(verify(&keys.public_key_bytes(), blob, &signature.to_bytes()));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let keys = keys();
        assert_eq!(keys.sign(b"claim").to_bytes(), keys.sign(b"claim").to_bytes());
    }

    #[test]
    fn test_any_blob_byte_mutation_fails() {
        let keys = keys();
        let blob = b"{\"nonce\":6}".to_vec();
        let signature = keys.sign(&blob).to_bytes();

        for i in 0..blob.len() {
            let mut mutated = blob.clone();
            mutated[i] ^= 0x01;
            assert!(!verify(&keys.public_key_bytes(), &mutated, &signature), "byte {}", i);
        }
    }

    #[test]
    fn test_any_signature_byte_mutation_fails() {
        let keys = keys();
        let blob = b"claim";
        let signature = keys.sign(blob).to_bytes();

        for i in 0..signature.len() {
            let mut mutated = signature;
            mutated[i] ^= 0x01;
            assert!(!verify(&keys.public_key_bytes(), blob, &mutated), "byte {}", i);
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let other = KeyMaterial::from_bytes(&[8u8; 32]).unwrap();
        let signature = keys().sign(b"claim");
        assert!(!verify(&other.public_key_bytes(), b"claim", &signature.to_bytes()));
    }

    #[test]
    fn test_rejects_wrong_key_length() {
        let err = KeyMaterial::from_bytes(&[1u8; 31]).unwrap_err();
        assert!(matches!(err, ClientError::InvalidKeyMaterial(_)));
        assert!(err.to_string().contains("expected 32 bytes, got 31"));

        assert!(KeyMaterial::from_bytes(&[1u8; 64]).is_err());
    }

    #[test]
    fn test_from_base64() {
        let encoded = BASE64.encode([7u8; 32]);
        let keys = KeyMaterial::from_base64(&format!("  {}\n", encoded)).unwrap();
        assert_eq!(keys.public_key_bytes(), self::keys().public_key_bytes());

        assert!(matches!(
            KeyMaterial::from_base64("not base64!"),
            Err(ClientError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn test_public_key_base64_round_trips() {
        let keys = keys();
        let decoded = BASE64.decode(keys.public_key_base64()).unwrap();
        assert_eq!(decoded, keys.public_key_bytes());
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", keys());
        assert!(rendered.contains("public_key"));
        assert!(!rendered.contains("signing_key"));
    }
}
