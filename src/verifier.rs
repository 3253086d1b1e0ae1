//! License payload decryption.
//!
//! The license file holds base64 ciphertext produced by encrypting the
//! record JSON with the vendor's RSA *private* key, one PKCS#1 v1.5 type-01
//! block per key-size chunk. Recovering it with the paired public key is
//! therefore signature-style authentication: a wrong key or a tampered
//! block fails padding validation instead of yielding plaintext.

use crate::error::{LicenseError, LicenseResult};
use crate::record::RawLicense;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rsa::hazmat::rsa_encrypt;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};

/// Decrypts and parses license payloads with the product public key.
pub struct LicenseVerifier {
    key: RsaPublicKey,
}

impl LicenseVerifier {
    /// Builds a verifier from PEM public-key content, accepting both SPKI
    /// (`BEGIN PUBLIC KEY`) and PKCS#1 (`BEGIN RSA PUBLIC KEY`) encodings.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidKey`] if the PEM parses as neither.
    pub fn from_pem(pem: &str) -> LicenseResult<Self> {
        let key = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| LicenseError::InvalidKey(e.to_string()))?;
        Ok(Self { key })
    }

    /// Recovers the plaintext from an encrypted license payload.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Decryption`] for bad base64, a ciphertext
    /// that is not a whole number of key-size blocks, a block that fails
    /// padding validation, or non-UTF-8 plaintext.
    pub fn decrypt(&self, payload: &str) -> LicenseResult<String> {
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let cipher = BASE64
            .decode(compact.as_bytes())
            .map_err(|e| LicenseError::Decryption(format!("invalid base64: {e}")))?;

        let block_size = self.key.size();
        if cipher.is_empty() || !cipher.len().is_multiple_of(block_size) {
            return Err(LicenseError::Decryption(format!(
                "ciphertext length {} is not a multiple of the key size {block_size}",
                cipher.len()
            )));
        }

        let mut plain = Vec::new();
        for block in cipher.chunks(block_size) {
            let c = BigUint::from_bytes_be(block);
            let m = rsa_encrypt(&self.key, &c)
                .map_err(|e| LicenseError::Decryption(e.to_string()))?;
            let em = left_pad(&m.to_bytes_be(), block_size);
            plain.extend_from_slice(strip_type1_padding(&em)?);
        }

        String::from_utf8(plain)
            .map_err(|_| LicenseError::Decryption("plaintext is not valid UTF-8".to_string()))
    }

    /// Decrypts the payload and parses it as a license record.
    ///
    /// # Errors
    ///
    /// Propagates decryption failures; returns
    /// [`LicenseError::InvalidPayload`] when the plaintext is not a
    /// well-formed record.
    pub fn parse(&self, payload: &str) -> LicenseResult<RawLicense> {
        let text = self.decrypt(payload)?;
        serde_json::from_str(&text).map_err(|e| LicenseError::InvalidPayload(e.to_string()))
    }
}

/// Left-pads big-endian bytes with zeros up to `len`. `BigUint` drops
/// leading zero octets, which are significant in an encryption block.
fn left_pad(bytes: &[u8], len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len.saturating_sub(bytes.len())];
    out.extend_from_slice(bytes);
    out
}

/// Validates and strips PKCS#1 v1.5 block type 01 padding:
/// `0x00 0x01 FF..FF 0x00 <data>` with at least eight padding octets.
fn strip_type1_padding(block: &[u8]) -> LicenseResult<&[u8]> {
    let malformed = || LicenseError::Decryption("invalid block padding".to_string());

    if block.len() < 11 || block[0] != 0x00 || block[1] != 0x01 {
        return Err(malformed());
    }
    let sep = block[2..]
        .iter()
        .position(|&b| b == 0x00)
        .ok_or_else(malformed)?;
    if sep < 8 || block[2..2 + sep].iter().any(|&b| b != 0xff) {
        return Err(malformed());
    }
    Ok(&block[2 + sep + 1..])
}
