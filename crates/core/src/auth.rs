use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Utc};
use log::{info, warn};
use subtle::ConstantTimeEq;

use crate::errors::CoreError;

/// Argon2id parameters for hashing the shared password.
#[derive(Debug, Clone, Copy)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    pub memory_cost: u32,
    /// Number of iterations (default: 2)
    pub time_cost: u32,
    /// Degree of parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_cost: 19_456,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

/// Derive a 256-bit digest from a password using Argon2id.
pub fn derive_key(password: &str, salt: &[u8; 16], params: &KdfParams) -> Result<[u8; 32], CoreError> {
    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(32), // output length = 256 bits
    )
    .map_err(|e| CoreError::KeyDerivation(format!("Invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| CoreError::KeyDerivation(format!("Argon2 key derivation failed: {e}")))?;

    Ok(key)
}

/// Generate cryptographically secure random bytes for a salt.
pub fn generate_salt() -> Result<[u8; 16], CoreError> {
    let mut salt = [0u8; 16];
    getrandom::getrandom(&mut salt)
        .map_err(|e| CoreError::KeyDerivation(format!("Failed to generate random salt: {e}")))?;
    Ok(salt)
}

/// Proof that the caller passed the password gate for one request.
///
/// Only `PasswordGate::authenticate` can build one, so any function taking
/// `&AuthContext` is reachable only after a successful login.
#[derive(Debug, Clone)]
pub struct AuthContext {
    authenticated_at: DateTime<Utc>,
}

impl AuthContext {
    pub fn authenticated_at(&self) -> DateTime<Utc> {
        self.authenticated_at
    }
}

/// Single shared-secret gate.
///
/// Keeps only a salted Argon2id digest of the secret; the plain password
/// can be dropped right after construction.
pub struct PasswordGate {
    salt: [u8; 16],
    digest: [u8; 32],
    params: KdfParams,
}

impl std::fmt::Debug for PasswordGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordGate")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl PasswordGate {
    pub fn new(secret: &str) -> Result<Self, CoreError> {
        Self::with_params(secret, KdfParams::default())
    }

    pub fn with_params(secret: &str, params: KdfParams) -> Result<Self, CoreError> {
        if secret.is_empty() {
            return Err(CoreError::InvalidConfig("password must not be empty".into()));
        }
        let salt = generate_salt()?;
        let digest = derive_key(secret, &salt, &params)?;
        Ok(Self {
            salt,
            digest,
            params,
        })
    }

    /// Check `candidate` against the shared secret.
    ///
    /// No lockout: the caller decides whether to re-prompt.
    pub fn authenticate(&self, candidate: &str) -> Result<AuthContext, CoreError> {
        let derived = derive_key(candidate, &self.salt, &self.params)?;
        if bool::from(self.digest[..].ct_eq(&derived[..])) {
            info!("Password accepted");
            Ok(AuthContext {
                authenticated_at: Utc::now(),
            })
        } else {
            warn!("Password rejected");
            Err(CoreError::AuthenticationFailed)
        }
    }
}
