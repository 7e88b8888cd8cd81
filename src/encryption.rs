//! AES-256-CBC encryption collaborator that consumes a [`crate::protocol::Trace`]'s
//! final key.
//!
//! Key derivation mirrors the bit-packing scheme of the reference implementation: bits
//! are packed most-significant-bit-first into bytes, right-padded with zeros to at
//! least 32 bytes, then SHA-256 hashed and truncated to a 256-bit AES key.

use crate::{QkdError, Result};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const MIN_KEY_BITS: usize = 16;

/// A successfully encrypted message, ready to be transmitted alongside its IV.
#[derive(Debug, Clone)]
pub struct EncryptedMessage {
    pub ciphertext_b64: String,
    pub iv_b64: String,
}

/// A human-readable summary of the key an encryption call would derive.
#[derive(Debug, Clone)]
pub struct EncryptionInfo {
    pub algorithm: &'static str,
    pub key_size_bits: usize,
    pub block_size_bits: usize,
    pub key_hex: String,
    pub bits_consumed: usize,
}

/// Pack `bits` MSB-first into bytes, right-pad to at least [`KEY_LEN`] bytes with
/// zeros, then SHA-256 the first `KEY_LEN` bytes and return the 32-byte digest.
pub fn derive_key(bits: &[u8]) -> Result<[u8; KEY_LEN]> {
    if bits.len() < MIN_KEY_BITS {
        return Err(QkdError::InsufficientKey {
            needed: MIN_KEY_BITS,
            got: bits.len(),
        });
    }

    let mut bytes = Vec::with_capacity((bits.len() + 7) / 8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit & 1) << (7 - i);
        }
        bytes.push(byte);
    }
    while bytes.len() < KEY_LEN {
        bytes.push(0);
    }

    let mut hasher = Sha256::new();
    hasher.update(&bytes[..KEY_LEN]);
    let digest = hasher.finalize();

    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&digest[..KEY_LEN]);
    Ok(key)
}

/// Encrypt `message` with a key derived from `key_bits`, using a random IV.
pub fn encrypt(message: &str, key_bits: &[u8]) -> Result<EncryptedMessage> {
    let key = derive_key(key_bits)?;
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(&key.into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(message.as_bytes());

    Ok(EncryptedMessage {
        ciphertext_b64: BASE64.encode(ciphertext),
        iv_b64: BASE64.encode(iv),
    })
}

/// Decrypt a message produced by [`encrypt`] using the same key bits.
pub fn decrypt(ciphertext_b64: &str, iv_b64: &str, key_bits: &[u8]) -> Result<String> {
    let key = derive_key(key_bits)?;
    let ciphertext = BASE64
        .decode(ciphertext_b64)
        .map_err(|e| QkdError::Encryption(format!("invalid base64 ciphertext: {e}")))?;
    let iv = BASE64
        .decode(iv_b64)
        .map_err(|e| QkdError::Encryption(format!("invalid base64 iv: {e}")))?;
    if iv.len() != IV_LEN {
        return Err(QkdError::Encryption(format!(
            "iv must be {IV_LEN} bytes, got {}",
            iv.len()
        )));
    }
    let mut iv_arr = [0u8; IV_LEN];
    iv_arr.copy_from_slice(&iv);

    let plaintext = Aes256CbcDec::new(&key.into(), &iv_arr.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|e| QkdError::Encryption(format!("padding error during decrypt: {e}")))?;

    String::from_utf8(plaintext).map_err(|e| QkdError::Encryption(format!("invalid utf8: {e}")))
}

/// Summarize the key `key_bits` would derive, without performing any encryption.
pub fn encryption_info(key_bits: &[u8]) -> Result<EncryptionInfo> {
    let key = derive_key(key_bits)?;
    Ok(EncryptionInfo {
        algorithm: "AES-256-CBC",
        key_size_bits: KEY_LEN * 8,
        block_size_bits: 128,
        key_hex: key.iter().map(|b| format!("{b:02x}")).collect(),
        bits_consumed: key_bits.len(),
    })
}
