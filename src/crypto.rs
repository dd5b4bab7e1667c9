use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use zeroize::Zeroizing;

/// File header. Stored in the clear and authenticated as associated data.
const MAGIC: &[u8; 4] = b"CWV1";
const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + SALT_LEN + NONCE_LEN;

// Argon2id cost: 64 MiB, 3 passes, single lane.
const ARGON2_MEMORY_KIB: u32 = 65536;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_LANES: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key derivation failed")]
    KeyDerivation,
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed: wrong passphrase or corrupted vault")]
    Decryption,
    #[error("not a vault file")]
    InvalidFormat,
}

/// Borrowed view of a sealed vault: `magic || salt || nonce || ciphertext`.
struct Envelope<'a> {
    salt: &'a [u8],
    nonce: &'a [u8],
    ciphertext: &'a [u8],
}

impl<'a> Envelope<'a> {
    fn parse(bytes: &'a [u8]) -> Result<Self, CryptoError> {
        if bytes.len() <= HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
            return Err(CryptoError::InvalidFormat);
        }
        let (salt, rest) = bytes[MAGIC.len()..].split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
        Ok(Self {
            salt,
            nonce,
            ciphertext,
        })
    }
}

/// Derive a 256-bit key from a passphrase and salt using Argon2id.
fn derive_key(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_LANES,
        Some(KEY_LEN),
    )
    .map_err(|_| CryptoError::KeyDerivation)?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key[..])
        .map_err(|_| CryptoError::KeyDerivation)?;
    Ok(key)
}

/// A derived vault key together with the salt it was derived with.
///
/// Deriving is the expensive step, so an unlocked vault keeps one of these
/// and only draws a fresh nonce for each save.
pub struct SealingKey {
    salt: [u8; SALT_LEN],
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl SealingKey {
    /// Derive a key under a fresh random salt.
    pub fn generate(passphrase: &str) -> Result<Self, CryptoError> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let key = derive_key(passphrase, &salt)?;
        Ok(Self { salt, key })
    }

    fn derive(passphrase: &str, salt: &[u8]) -> Result<Self, CryptoError> {
        let key = derive_key(passphrase, salt)?;
        let mut fixed = [0u8; SALT_LEN];
        fixed.copy_from_slice(salt);
        Ok(Self { salt: fixed, key })
    }

    fn cipher(&self) -> Result<Aes256Gcm, CryptoError> {
        Aes256Gcm::new_from_slice(&self.key[..]).map_err(|_| CryptoError::KeyDerivation)
    }

    /// Seal `plaintext` under this key with a fresh nonce.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher()?
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: MAGIC,
                },
            )
            .map_err(|_| CryptoError::Encryption)?;

        let mut output = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        output.extend_from_slice(MAGIC);
        output.extend_from_slice(&self.salt);
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }
}

/// Open a sealed vault. Returns the key it was sealed with, for later saves,
/// and the plaintext, which is zeroized on drop.
pub fn open(
    passphrase: &str,
    sealed: &[u8],
) -> Result<(SealingKey, Zeroizing<Vec<u8>>), CryptoError> {
    let envelope = Envelope::parse(sealed)?;

    let key = SealingKey::derive(passphrase, envelope.salt)?;
    let plaintext = key
        .cipher()?
        .decrypt(
            Nonce::from_slice(envelope.nonce),
            Payload {
                msg: envelope.ciphertext,
                aad: MAGIC,
            },
        )
        .map_err(|_| CryptoError::Decryption)?;

    Ok((key, Zeroizing::new(plaintext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seal(passphrase: &str, plaintext: &[u8]) -> Vec<u8> {
        SealingKey::generate(passphrase).unwrap().seal(plaintext).unwrap()
    }

    #[test]
    fn seal_then_open() {
        let sealed = seal("correct horse", b"{\"cycles\":[]}");
        assert_eq!(&sealed[..4], b"CWV1");

        let (_, opened) = open("correct horse", &sealed).unwrap();
        assert_eq!(opened.as_slice(), b"{\"cycles\":[]}");
    }

    #[test]
    fn reopened_key_seals_compatible_vaults() {
        let sealed = seal("pass", b"first");
        let (key, _) = open("pass", &sealed).unwrap();

        let resealed = key.seal(b"second").unwrap();
        // Same salt, fresh nonce.
        assert_eq!(resealed[..HEADER_LEN - NONCE_LEN], sealed[..HEADER_LEN - NONCE_LEN]);
        assert_ne!(resealed[HEADER_LEN - NONCE_LEN..HEADER_LEN], sealed[HEADER_LEN - NONCE_LEN..HEADER_LEN]);

        let (_, opened) = open("pass", &resealed).unwrap();
        assert_eq!(opened.as_slice(), b"second");
    }

    #[test]
    fn wrong_passphrase_fails() {
        let sealed = seal("correct", b"cycle history");
        assert!(matches!(open("wrong", &sealed), Err(CryptoError::Decryption)));
    }

    #[test]
    fn tampered_header_fails() {
        let mut sealed = seal("pass", b"data");
        sealed[0] = b'X';
        assert!(matches!(open("pass", &sealed), Err(CryptoError::InvalidFormat)));
    }

    #[test]
    fn truncated_input_fails() {
        assert!(matches!(open("any", &[0u8; 10]), Err(CryptoError::InvalidFormat)));
        assert!(matches!(open("any", b"CWV1"), Err(CryptoError::InvalidFormat)));
    }
}
