//! Session-key derivation and the per-connection cipher.

use crate::error::{NetError, NetResult};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Aes256Gcm, Nonce,
};
use graphsync_protocol::{CIPHER_ALGORITHM, MAX_KEY_LEN};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Context string bound into key derivation.
const KDF_INFO: &[u8] = b"graphsync-session-key-v1";

/// Clamps a requested key length to one this build supports.
///
/// The request is capped at [`MAX_KEY_LEN`] and rounded down to a
/// width AES-GCM accepts; requests below the minimum come out at the
/// 128-bit floor.
pub fn clamp_key_length(requested: u32) -> usize {
    if requested as usize >= MAX_KEY_LEN {
        32
    } else {
        16
    }
}

/// A derived session key, zeroized on drop.
///
/// Never serialized: this is not part of the wire schema. Both ends
/// compute it locally from values they already possess.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    bytes: Vec<u8>,
}

impl SessionKey {
    /// Returns the key length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the key is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the raw key material.
    ///
    /// # Security
    ///
    /// Do not log or serialize the result.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey")
            .field("bytes", &"[REDACTED]")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Derives the shared session key from a credential and an optional
/// salt.
///
/// HKDF-SHA256 with the salt as the HKDF salt and the credential as
/// input key material; the salted and unsalted paths are the two
/// derivation modes of the handshake. Given the same inputs, client
/// and server produce byte-identical keys.
pub fn derive_session_key(
    secret: &[u8],
    salt: Option<&[u8]>,
    key_length: usize,
) -> NetResult<SessionKey> {
    if key_length != 16 && key_length != 32 {
        return Err(NetError::UnsupportedKeyLength(key_length));
    }

    let hk = Hkdf::<Sha256>::new(salt, secret);
    let mut bytes = vec![0u8; key_length];
    hk.expand(KDF_INFO, &mut bytes)
        .map_err(|_| NetError::crypto("HKDF expand failed"))?;

    Ok(SessionKey { bytes })
}

enum CipherKind {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

/// The negotiated cipher state of one connection.
///
/// Installed on both ends after a successful handshake; every frame
/// from then on is sealed as `nonce || ciphertext || tag`.
pub struct CipherState {
    kind: CipherKind,
    key_length: usize,
}

impl CipherState {
    /// Installs a cipher for the given session key.
    ///
    /// Fails on key lengths AES-GCM does not accept; the caller must
    /// treat that as fatal to the connection.
    pub fn install(key: &SessionKey) -> NetResult<Self> {
        let kind = match key.len() {
            16 => CipherKind::Aes128(Box::new(
                Aes128Gcm::new_from_slice(key.as_bytes())
                    .map_err(|_| NetError::crypto("AES-128-GCM init failed"))?,
            )),
            32 => CipherKind::Aes256(Box::new(
                Aes256Gcm::new_from_slice(key.as_bytes())
                    .map_err(|_| NetError::crypto("AES-256-GCM init failed"))?,
            )),
            len => return Err(NetError::UnsupportedKeyLength(len)),
        };
        Ok(Self {
            kind,
            key_length: key.len(),
        })
    }

    /// Returns the agreed cipher algorithm identifier.
    pub fn algorithm(&self) -> &'static str {
        CIPHER_ALGORITHM
    }

    /// Returns the installed key length in bytes.
    pub fn key_length(&self) -> usize {
        self.key_length
    }

    /// Seals one message payload: `nonce || ciphertext || tag`.
    pub fn seal(&self, plaintext: &[u8]) -> NetResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = match &self.kind {
            CipherKind::Aes128(cipher) => cipher.encrypt(Nonce::from_slice(&nonce_bytes), plaintext),
            CipherKind::Aes256(cipher) => cipher.encrypt(Nonce::from_slice(&nonce_bytes), plaintext),
        }
        .map_err(|_| NetError::crypto("seal failed"))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend(ciphertext);
        Ok(sealed)
    }

    /// Opens one sealed payload.
    pub fn open(&self, sealed: &[u8]) -> NetResult<Vec<u8>> {
        if sealed.len() < NONCE_SIZE + TAG_SIZE {
            return Err(NetError::crypto("sealed payload too short"));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);

        match &self.kind {
            CipherKind::Aes128(cipher) => cipher.decrypt(Nonce::from_slice(nonce_bytes), ciphertext),
            CipherKind::Aes256(cipher) => cipher.decrypt(Nonce::from_slice(nonce_bytes), ciphertext),
        }
        .map_err(|_| NetError::crypto("open failed: bad key or corrupted frame"))
    }
}

impl std::fmt::Debug for CipherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherState")
            .field("algorithm", &self.algorithm())
            .field("key_length", &self.key_length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_length_clamping() {
        assert_eq!(clamp_key_length(64), 32);
        assert_eq!(clamp_key_length(32), 32);
        assert_eq!(clamp_key_length(24), 16);
        assert_eq!(clamp_key_length(16), 16);
        assert_eq!(clamp_key_length(0), 16);
    }

    #[test]
    fn derivation_is_symmetric() {
        let client = derive_session_key(b"secret", Some(b"abc123"), 32).unwrap();
        let server = derive_session_key(b"secret", Some(b"abc123"), 32).unwrap();
        assert_eq!(client.as_bytes(), server.as_bytes());
    }

    #[test]
    fn derivation_depends_on_salt() {
        let with_salt = derive_session_key(b"secret", Some(b"abc123"), 32).unwrap();
        let other_salt = derive_session_key(b"secret", Some(b"zzz"), 32).unwrap();
        let no_salt = derive_session_key(b"secret", None, 32).unwrap();

        assert_ne!(with_salt.as_bytes(), other_salt.as_bytes());
        assert_ne!(with_salt.as_bytes(), no_salt.as_bytes());
    }

    #[test]
    fn unsalted_derivation_is_deterministic() {
        let a = derive_session_key(b"secret", None, 16).unwrap();
        let b = derive_session_key(b"secret", None, 16).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn odd_key_lengths_are_rejected() {
        assert!(matches!(
            derive_session_key(b"s", None, 24),
            Err(NetError::UnsupportedKeyLength(24))
        ));
    }

    #[test]
    fn seal_open_roundtrip_both_widths() {
        for len in [16usize, 32] {
            let key = derive_session_key(b"pw", Some(b"salt"), len).unwrap();
            let cipher = CipherState::install(&key).unwrap();

            let sealed = cipher.seal(b"payload").unwrap();
            assert_ne!(&sealed[NONCE_SIZE..], b"payload");
            assert_eq!(cipher.open(&sealed).unwrap(), b"payload");
        }
    }

    #[test]
    fn wrong_key_fails_to_open() {
        let k1 = derive_session_key(b"pw", Some(b"salt"), 32).unwrap();
        let k2 = derive_session_key(b"pw2", Some(b"salt"), 32).unwrap();
        let sealed = CipherState::install(&k1).unwrap().seal(b"data").unwrap();

        assert!(CipherState::install(&k2).unwrap().open(&sealed).is_err());
    }

    #[test]
    fn tampered_frame_fails_to_open() {
        let key = derive_session_key(b"pw", None, 32).unwrap();
        let cipher = CipherState::install(&key).unwrap();
        let mut sealed = cipher.seal(b"data").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;

        assert!(cipher.open(&sealed).is_err());
    }

    #[test]
    fn short_sealed_payload_is_rejected() {
        let key = derive_session_key(b"pw", None, 16).unwrap();
        let cipher = CipherState::install(&key).unwrap();
        assert!(cipher.open(&[0u8; 8]).is_err());
    }
}
