//! Passphrase key derivation.
//!
//! scrypt stretches a human passphrase plus a random salt into a 32-byte
//! symmetric key. Derivation is deterministic for a given (passphrase, salt,
//! params) triple, which is what lets restore recompute the backup key. The
//! cost parameters are deliberately expensive and block the calling thread
//! for the full derivation; cancel before calling, not during.
//!
//! # Security Guidelines
//!
//! When handling passphrases and derived keys:
//! - Keep passphrases in `SecretString` from the `secrecy` crate
//! - Derived keys are returned in a `Zeroizing` buffer; zeroing on drop is
//!   best-effort defense-in-depth, not a guaranteed erasure
//! - Salts must be cryptographically random and unique per backup

use crate::types::{EncDirError, KdfParams};
use scrypt::Params;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

/// Derived key length in bytes.
pub const KEY_LEN: usize = 32;

/// Minimum log2(N). Below this the derivation is too cheap to resist
/// offline guessing.
const MIN_LOG_N: u8 = 10;

/// Maximum log2(N) accepted by scrypt.
const MAX_LOG_N: u8 = 63;

/// Minimum block size factor.
const MIN_R: u32 = 1;

/// Derive a 32-byte key from a passphrase using scrypt with parameter
/// validation.
///
/// # Errors
///
/// Returns `EncDirError::Invalid` if the salt is shorter than 8 bytes or a
/// cost parameter is out of range, and `EncDirError::Kdf` if the underlying
/// derivation fails (e.g. it cannot allocate its working memory).
pub fn derive_key(
    passphrase: &SecretString,
    params: KdfParams,
    salt: &[u8],
) -> Result<Zeroizing<[u8; KEY_LEN]>, EncDirError> {
    if salt.len() < 8 {
        return Err(EncDirError::Invalid("kdf: salt must be at least 8 bytes"));
    }
    if params.log_n < MIN_LOG_N || params.log_n > MAX_LOG_N {
        return Err(EncDirError::Invalid(
            "kdf: log_n must be between 10 and 63",
        ));
    }
    if params.r < MIN_R {
        return Err(EncDirError::Invalid("kdf: r must be at least 1"));
    }
    if params.p == 0 {
        return Err(EncDirError::Invalid("kdf: p must be at least 1"));
    }

    let scrypt_params = Params::new(params.log_n, params.r, params.p, KEY_LEN)
        .map_err(|_| EncDirError::Invalid("kdf: invalid scrypt params"))?;

    let mut out = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(
        passphrase.expose_secret().as_bytes(),
        salt,
        &scrypt_params,
        out.as_mut(),
    )
    .map_err(|_| EncDirError::Kdf)?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> KdfParams {
        KdfParams {
            log_n: 10,
            r: 8,
            p: 1,
        }
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let pw = SecretString::new("correct horse".into());
        let salt = [7u8; 16];
        let a = derive_key(&pw, cheap(), &salt).unwrap();
        let b = derive_key(&pw, cheap(), &salt).unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn different_salt_different_key() {
        let pw = SecretString::new("correct horse".into());
        let a = derive_key(&pw, cheap(), &[1u8; 16]).unwrap();
        let b = derive_key(&pw, cheap(), &[2u8; 16]).unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn rejects_short_salt() {
        let pw = SecretString::new("pw".into());
        assert!(matches!(
            derive_key(&pw, cheap(), &[0u8; 4]),
            Err(EncDirError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_weak_params() {
        let pw = SecretString::new("pw".into());
        let weak = KdfParams {
            log_n: 4,
            r: 8,
            p: 1,
        };
        assert!(matches!(
            derive_key(&pw, weak, &[0u8; 16]),
            Err(EncDirError::Invalid(_))
        ));
        let zero_p = KdfParams {
            log_n: 10,
            r: 8,
            p: 0,
        };
        assert!(matches!(
            derive_key(&pw, zero_p, &[0u8; 16]),
            Err(EncDirError::Invalid(_))
        ));
    }
}
