/// Stored credential row for either role. The hash is
/// PBKDF2-HMAC-SHA256(password, salt); the raw password is never stored.
#[derive(Debug, sqlx::FromRow)]
pub struct Credential {
    pub username: String,
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
}
