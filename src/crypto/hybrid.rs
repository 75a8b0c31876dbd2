// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hybrid field encryption for the simple-auth provider protocol.
//!
//! Every outbound provider call generates a fresh AES-128 key, encrypts each
//! PII field with AES-CBC/PKCS#7 and sends the key wrapped with the provider's
//! RSA public key (PKCS#1 v1.5) in the `ENC-KEY` header.
//!
//! ## Known weakness
//!
//! The provider mandates a fixed all-zero IV. Identical plaintexts under the
//! same key therefore produce identical ciphertexts. This is tolerated only
//! because each key encrypts a single request. Do not reuse [`PROTOCOL_IV`]
//! for anything other than this provider's wire format.

use aes::Aes128;
use base64ct::{Base64, Encoding};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use rsa::{pkcs8::DecodePublicKey, Pkcs1v15Encrypt, RsaPublicKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::providers::error::{ProviderError, ProviderResult};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// AES key length mandated by the provider (AES-128).
pub const KEY_LEN: usize = 16;

/// Fixed initialization vector required by the provider protocol.
pub const PROTOCOL_IV: [u8; 16] = [0u8; 16];

/// Single-use symmetric key. Wiped from memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; KEY_LEN]);

impl SessionKey {
    /// Generate a key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Key material for exactly one provider request.
///
/// Not `Clone`: a context is created, used for one request body, and dropped.
pub struct EncryptionContext {
    key: SessionKey,
    wrapped_key: String,
}

impl EncryptionContext {
    /// Generate a fresh key and wrap it with the provider's current public key.
    pub fn new(public_key: &str) -> ProviderResult<Self> {
        let key = SessionKey::generate();
        let wrapped_key = wrap_key(public_key, key.as_bytes())?;
        Ok(Self { key, wrapped_key })
    }

    /// Value for the `ENC-KEY` header.
    pub fn wrapped_key(&self) -> &str {
        &self.wrapped_key
    }

    /// Encrypt one field under this context's key and the protocol IV.
    pub fn encrypt(&self, plaintext: &str) -> ProviderResult<String> {
        encrypt_field(self.key.as_bytes(), &PROTOCOL_IV, plaintext)
    }
}

/// AES-CBC encrypt `plaintext` and return Base64.
///
/// Empty input returns an empty string.
pub fn encrypt_field(key: &[u8], iv: &[u8], plaintext: &str) -> ProviderResult<String> {
    if plaintext.is_empty() {
        return Ok(String::new());
    }

    let cipher = Aes128CbcEnc::new_from_slices(key, iv)
        .map_err(|e| ProviderError::Encryption(format!("invalid AES key or IV: {e}")))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    Ok(Base64::encode_string(&ciphertext))
}

/// Inverse of [`encrypt_field`].
pub fn decrypt_field(key: &[u8], iv: &[u8], ciphertext: &str) -> ProviderResult<String> {
    if ciphertext.is_empty() {
        return Ok(String::new());
    }

    let bytes = Base64::decode_vec(ciphertext)
        .map_err(|e| ProviderError::Encryption(format!("ciphertext is not Base64: {e}")))?;
    let cipher = Aes128CbcDec::new_from_slices(key, iv)
        .map_err(|e| ProviderError::Encryption(format!("invalid AES key or IV: {e}")))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
        .map_err(|_| ProviderError::Encryption("invalid PKCS#7 padding".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|e| ProviderError::Encryption(format!("plaintext is not UTF-8: {e}")))
}

/// Encrypt raw AES key bytes with the provider's RSA public key, Base64 output.
///
/// `public_key` is Base64 DER (X.509 SubjectPublicKeyInfo) as served by the
/// provider; a PEM-armored key is accepted too.
pub fn wrap_key(public_key: &str, aes_key: &[u8]) -> ProviderResult<String> {
    let der = decode_public_key(public_key)?;
    let key = RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| ProviderError::Encryption(format!("invalid RSA public key: {e}")))?;

    let wrapped = key
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, aes_key)
        .map_err(|e| ProviderError::Encryption(format!("RSA key wrap failed: {e}")))?;

    Ok(Base64::encode_string(&wrapped))
}

fn decode_public_key(public_key: &str) -> ProviderResult<Vec<u8>> {
    let trimmed = public_key.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::Encryption("public key is empty".to_string()));
    }

    if trimmed.starts_with("-----BEGIN") {
        let parsed = pem::parse(trimmed)
            .map_err(|e| ProviderError::Encryption(format!("invalid PEM public key: {e}")))?;
        if parsed.tag() != "PUBLIC KEY" {
            return Err(ProviderError::Encryption(format!(
                "unexpected PEM block: {}",
                parsed.tag()
            )));
        }
        return Ok(parsed.into_contents());
    }

    let compact: String = trimmed.split_whitespace().collect();
    Base64::decode_vec(&compact)
        .map_err(|e| ProviderError::Encryption(format!("public key is not Base64: {e}")))
}
