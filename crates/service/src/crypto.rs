//! Credit card encryption at rest.
//!
//! AES-256-GCM keyed by SHA-256 of the configured secret. Ciphertexts are
//! stored as base64 of `nonce || ciphertext || tag`.

use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit, Nonce};
use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::errors::ServiceError;

const NONCE_LEN: usize = 12;
const MASK: &str = "************";

#[derive(Clone)]
pub struct CardCipher {
    key: [u8; 32],
}

impl CardCipher {
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    fn cipher(&self) -> Result<Aes256Gcm, ServiceError> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|e| ServiceError::Crypto(e.to_string()))
    }

    pub fn encrypt(&self, plain: &str) -> Result<String, ServiceError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ct = self
            .cipher()?
            .encrypt(nonce, plain.as_bytes())
            .map_err(|e| ServiceError::Crypto(e.to_string()))?;
        let mut out = Vec::with_capacity(NONCE_LEN + ct.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ct);
        Ok(general_purpose::STANDARD.encode(out))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, ServiceError> {
        let raw = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| ServiceError::Crypto(e.to_string()))?;
        if raw.len() <= NONCE_LEN {
            return Err(ServiceError::Crypto("ciphertext too short".into()));
        }
        let (nonce_bytes, ct) = raw.split_at(NONCE_LEN);
        let plain = self
            .cipher()?
            .decrypt(Nonce::from_slice(nonce_bytes), ct)
            .map_err(|e| ServiceError::Crypto(e.to_string()))?;
        String::from_utf8(plain).map_err(|e| ServiceError::Crypto(e.to_string()))
    }
}

/// Keep digits only and show the last four behind a fixed mask.
pub fn mask_card(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return MASK.to_string();
    }
    format!("{MASK}{}", &digits[digits.len() - 4..])
}

/// Masked form used to match accounts against a stored card's last four digits.
pub fn masked_last4(last4: &str) -> String { format!("{MASK}{last4}") }

/// Random URL-safe secret, used as a throwaway mailbox password.
pub fn random_secret() -> String {
    let mut buf = [0u8; 18];
    OsRng.fill_bytes(&mut buf);
    general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// Eight random digits, used as the public reference of a stored card.
pub fn random_card_ref() -> String {
    let n = OsRng.next_u32() % 100_000_000;
    format!("{n:08}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt() {
        let c = CardCipher::new("s3cret");
        let enc = c.encrypt("4111 1111 1111 1234").unwrap();
        assert_ne!(enc, "4111 1111 1111 1234");
        assert_eq!(c.decrypt(&enc).unwrap(), "4111 1111 1111 1234");
    }

    #[test]
    fn nonce_makes_ciphertexts_differ() {
        let c = CardCipher::new("k");
        assert_ne!(c.encrypt("1234").unwrap(), c.encrypt("1234").unwrap());
    }

    #[test]
    fn wrong_key_fails() {
        let enc = CardCipher::new("a").encrypt("4111").unwrap();
        assert!(CardCipher::new("b").decrypt(&enc).is_err());
        assert!(CardCipher::new("a").decrypt("AAAA").is_err());
    }

    #[test]
    fn masks() {
        assert_eq!(mask_card("4111-1111-1111-9876"), "************9876");
        assert_eq!(mask_card("12a"), "************");
        assert_eq!(masked_last4("0001"), "************0001");
    }

    #[test]
    fn random_values_shape() {
        assert_eq!(random_secret().len(), 24);
        let r = random_card_ref();
        assert_eq!(r.len(), 8);
        assert!(r.chars().all(|c| c.is_ascii_digit()));
    }
}
