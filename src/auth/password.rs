use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use subtle::ConstantTimeEq;

use crate::config::AdminCredential;

/// Hash a password using Argon2id (19MB memory, 2 iterations, parallelism 1).
pub fn hash(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params::new(19 * 1024, 2, 1, None).map_err(|e| format!("Invalid params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| format!("Hashing failed: {e}"))
}

/// Check submitted admin input against the configured credential. Surrounding
/// whitespace in the input is ignored.
pub fn verify(input: &str, credential: &AdminCredential) -> Result<bool, String> {
    let input = input.trim();
    match credential {
        AdminCredential::Plain(expected) => {
            Ok(input.as_bytes().ct_eq(expected.as_bytes()).into())
        }
        AdminCredential::Hash(hash) => {
            let parsed = PasswordHash::new(hash).map_err(|e| format!("Invalid hash: {e}"))?;
            Ok(Argon2::default()
                .verify_password(input.as_bytes(), &parsed)
                .is_ok())
        }
    }
}
