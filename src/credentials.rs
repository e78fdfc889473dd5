use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use sha2::Sha256;

use crate::error::AppError;

pub const SALT_LEN: usize = 16;
pub const HASH_LEN: usize = 32;

/// Characters accepted as the "special character" of the password policy.
const SPECIAL_CHARS: &str = "!@#?";

pub fn generate_salt() -> [u8; SALT_LEN] {
    rand::thread_rng().gen()
}

/// PBKDF2-HMAC-SHA256 over the password with a per-account salt.
pub fn hash_password(password: &str, salt: &[u8], iterations: u32) -> Vec<u8> {
    let mut key = vec![0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

pub fn verify_password(password: &str, salt: &[u8], expected: &[u8], iterations: u32) -> bool {
    hash_password(password, salt, iterations) == expected
}

/// Account-creation password policy: at least 8 characters, with at least one
/// uppercase letter, one lowercase letter, one digit, and one of `!@#?`.
pub fn check_password_strength(password: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::Validation(
            "password must contain at least one uppercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::Validation(
            "password must contain at least one lowercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "password must contain at least one number".into(),
        ));
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Err(AppError::Validation(
            "password must contain at least one of !@#?".into(),
        ));
    }
    Ok(())
}
