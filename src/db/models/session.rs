//! Session row model.

use sqlx::FromRow;

/// One authenticated login. `secret_hash` is the SHA-256 digest of the
/// session secret; the secret itself is never persisted.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub secret_hash: Vec<u8>,
    pub created_at: String,
    pub expires_at: String,
}

/// A freshly created session together with the client-facing bearer token.
/// The token exists only in this return value and the Set-Cookie header.
#[derive(Debug, Clone)]
pub struct SessionWithToken {
    pub session: Session,
    pub token: String,
}
