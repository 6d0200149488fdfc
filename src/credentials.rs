//! Password hashing and verification for stored `salt:hash` credentials.

use crate::error::AuthError;
use rand::RngExt;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                         abcdefghijklmnopqrstuvwxyz\
                         0123456789";

/// Turns passwords into stored credentials and checks them later.
pub trait CredentialVerifier: Send + Sync {
    /// Produces a new stored credential for `password`.
    fn hash(&self, password: &str) -> String;

    /// Checks `password` against a stored credential.
    fn verify(&self, password: &str, stored: &str) -> Result<bool, AuthError>;
}

/// `salt:hex(sha256(salt || password))` with a random alphanumeric salt.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaltedSha256;

impl SaltedSha256 {
    pub fn new() -> Self {
        Self
    }

    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Builds a credential from an explicit salt.
    pub fn hash_with_salt(&self, salt: &str, password: &str) -> String {
        format!("{}:{}", salt, Self::digest(salt, password))
    }
}

impl CredentialVerifier for SaltedSha256 {
    fn hash(&self, password: &str) -> String {
        self.hash_with_salt(&random_string(SALT_LEN), password)
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool, AuthError> {
        let (salt, expected) = stored.split_once(':').ok_or(AuthError::MalformedCredential)?;
        if salt.is_empty() || expected.is_empty() {
            return Err(AuthError::MalformedCredential);
        }
        Ok(Self::digest(salt, password) == expected)
    }
}

/// Random alphanumeric string, used for salts and recovery passwords.
pub fn random_string(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// Generates a temporary password for account recovery.
pub fn generate_password(length: usize) -> String {
    random_string(length.max(8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let verifier = SaltedSha256::new();
        let stored = verifier.hash("hunter2");

        let (salt, digest) = stored.split_once(':').unwrap();
        assert_eq!(salt.len(), SALT_LEN);
        assert_eq!(digest.len(), 64);

        assert_eq!(verifier.verify("hunter2", &stored), Ok(true));
        assert_eq!(verifier.verify("hunter3", &stored), Ok(false));
    }

    #[test]
    fn test_salts_differ() {
        let verifier = SaltedSha256::new();
        assert_ne!(verifier.hash("same"), verifier.hash("same"));
    }

    #[test]
    fn test_known_digest() {
        // sha256("abc")
        assert_eq!(
            SaltedSha256::new().hash_with_salt("a", "bc"),
            "a:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_malformed_credential() {
        let verifier = SaltedSha256::new();
        assert_eq!(verifier.verify("x", "nocolon"), Err(AuthError::MalformedCredential));
        assert_eq!(verifier.verify("x", ":abc"), Err(AuthError::MalformedCredential));
        assert_eq!(verifier.verify("x", "salt:"), Err(AuthError::MalformedCredential));
    }

    #[test]
    fn test_generate_password() {
        let password = generate_password(12);
        assert_eq!(password.len(), 12);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(generate_password(2).len(), 8);
    }
}
