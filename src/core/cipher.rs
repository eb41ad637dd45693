//! Cryptographic engine.
//!
//! A thin contract over the age v1 scheme: encrypt a plaintext to N x25519
//! recipients, decrypt with one identity. Ciphertexts are carried as base64
//! of the binary age encoding (no ASCII armor); the document layer handles
//! line wrapping. Plaintext buffers are zeroized on every exit path.

use std::io::{Read, Write};

use age::x25519;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::trace;
use zeroize::{Zeroize, Zeroizing};

use crate::core::types::Ciphertext;
use crate::error::{CryptoError, Result};

/// Parse a public key string into an age recipient.
pub fn parse_recipient(key: &str) -> Result<x25519::Recipient> {
    key.parse::<x25519::Recipient>()
        .map_err(|_| CryptoError::InvalidPublicKey(key.to_string()).into())
}

/// Encrypt a plaintext to a set of recipients.
///
/// Every call samples a fresh file key, so re-encrypting the same plaintext
/// never reproduces an old ciphertext. The caller is responsible for
/// checking that `recipients` is non-empty and reporting which environment
/// lacked recipients.
pub fn encrypt(plaintext: &[u8], recipients: &[x25519::Recipient]) -> Result<Ciphertext> {
    trace!(
        recipients = recipients.len(),
        plaintext_len = plaintext.len(),
        "encrypting"
    );

    let encryptor =
        age::Encryptor::with_recipients(recipients.iter().map(|r| r as &dyn age::Recipient))
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut encrypted = Vec::new();
    let mut writer = encryptor
        .wrap_output(&mut encrypted)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    writer
        .write_all(plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    trace!(ciphertext_len = encrypted.len(), "encrypted");

    Ok(STANDARD.encode(encrypted))
}

/// Decrypt a base64 age ciphertext with one identity.
///
/// Returns `NotARecipient` when the identity is absent from the recipient
/// stanzas and `Corrupt` for malformed frames or AEAD failures. The
/// plaintext is returned in a zeroize-on-drop buffer.
pub fn decrypt(ciphertext: &str, identity: &x25519::Identity) -> Result<Zeroizing<Vec<u8>>> {
    let binary = STANDARD
        .decode(ciphertext)
        .map_err(|e| CryptoError::Corrupt(format!("invalid base64: {e}")))?;

    trace!(ciphertext_len = binary.len(), "decrypting");

    let decryptor = age::Decryptor::new(&binary[..]).map_err(map_decrypt_error)?;

    let mut plaintext = Zeroizing::new(Vec::new());
    let mut reader = decryptor
        .decrypt(std::iter::once(identity as &dyn age::Identity))
        .map_err(map_decrypt_error)?;
    reader
        .read_to_end(&mut plaintext)
        .map_err(|e| CryptoError::Corrupt(format!("truncated payload: {e}")))?;

    trace!(plaintext_len = plaintext.len(), "decrypted");

    Ok(plaintext)
}

fn map_decrypt_error(err: age::DecryptError) -> crate::error::Error {
    match err {
        age::DecryptError::NoMatchingKeys => CryptoError::NotARecipient.into(),
        other => CryptoError::Corrupt(other.to_string()).into(),
    }
}

/// Count the X25519 recipient stanzas in a ciphertext header.
///
/// The age binary header is ASCII up to the `---` MAC line; each recipient
/// contributes one `-> X25519` stanza. Stanza membership cannot be checked
/// without the matching identity, so the count is the strongest at-rest
/// signal available to `verify`.
pub fn recipient_stanza_count(ciphertext: &str) -> Result<usize> {
    let binary = STANDARD
        .decode(ciphertext)
        .map_err(|e| CryptoError::Corrupt(format!("invalid base64: {e}")))?;

    let header_end = find_subsequence(&binary, b"\n---")
        .ok_or_else(|| CryptoError::Corrupt("missing header MAC line".to_string()))?;
    let header = std::str::from_utf8(&binary[..header_end])
        .map_err(|_| CryptoError::Corrupt("header is not ASCII".to_string()))?;

    Ok(header
        .lines()
        .filter(|line| line.starts_with("-> X25519"))
        .count())
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Alphabet for generated secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    Base64,
    Hex,
    Alnum,
}

impl Alphabet {
    fn chars(self) -> &'static [u8] {
        match self {
            Alphabet::Base64 => {
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/"
            }
            Alphabet::Hex => b"0123456789abcdef",
            Alphabet::Alnum => b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789",
        }
    }
}

/// Generate a random secret of `len` characters from `alphabet`.
///
/// Bytes come from the OS CSPRNG; rejection sampling keeps the distribution
/// uniform when the alphabet size does not divide 256.
pub fn generate_secret(len: usize, alphabet: Alphabet) -> Zeroizing<String> {
    let chars = alphabet.chars();
    let limit = 256 - (256 % chars.len());

    let mut out = Zeroizing::new(String::with_capacity(len));
    let mut buf = [0u8; 64];
    while out.len() < len {
        OsRng.fill_bytes(&mut buf);
        for &b in &buf {
            if (b as usize) < limit {
                out.push(chars[b as usize % chars.len()] as char);
                if out.len() == len {
                    break;
                }
            }
        }
    }
    buf.zeroize();

    out
}
