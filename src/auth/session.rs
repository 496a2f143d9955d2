//! Session creation, validation, and per-request authorization.
//!
//! A session row stores the public id, a SHA-256 digest of the secret, the
//! owning user, and creation/expiry timestamps. The raw secret only ever
//! leaves this module inside the token returned from [`create_session`].

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::auth::token::{
    constant_time_eq, format_token, generate_identifier, hash_secret, parse_token,
};
use crate::db::{DbPool, Session, SessionWithToken};

/// Attempts at inserting a freshly generated session id before giving up.
///
/// With 24 random bytes behind each id a collision is astronomically
/// unlikely, so a duplicate almost certainly means something else is wrong
/// with the store.
const CREATE_RETRIES: u32 = 3;

/// Outcome of checking a token against a claimed user.
///
/// Three variants so callers can distinguish "who are you?" (401) from
/// "you may not do this" (403) at the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// No token, malformed token, or no matching live session.
    Unauthenticated,
    /// Valid session, but it belongs to a different user.
    Forbidden,
    /// Valid session owned by the claimed user.
    Authorized,
}

/// Create a new session for a user and return it with the client token.
///
/// Persists one row; the token is `"<id>.<secret>"` and the secret is never
/// stored or logged. A duplicate-id insert is retried with a fresh id a
/// bounded number of times before the store error surfaces.
pub async fn create_session(
    pool: &DbPool,
    user_id: &str,
    ttl: Duration,
) -> Result<SessionWithToken, sqlx::Error> {
    let mut attempt = 0;

    loop {
        let id = generate_identifier();
        let secret = generate_identifier();
        let secret_hash = hash_secret(&secret);

        let created_at = Utc::now();
        let expires_at = created_at + ttl;

        let result = sqlx::query(
            "INSERT INTO sessions (id, user_id, secret_hash, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(secret_hash.as_slice())
        .bind(created_at.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(pool)
        .await;

        match result {
            Ok(_) => {
                info!(session_id = %id, user_id = %user_id, "Session created");
                return Ok(SessionWithToken {
                    session: Session {
                        id: id.clone(),
                        user_id: user_id.to_string(),
                        secret_hash: secret_hash.to_vec(),
                        created_at: created_at.to_rfc3339(),
                        expires_at: expires_at.to_rfc3339(),
                    },
                    token: format_token(&id, &secret),
                });
            }
            Err(e) if is_unique_violation(&e) && attempt + 1 < CREATE_RETRIES => {
                attempt += 1;
                debug!(attempt, "Session id collision, regenerating");
            }
            Err(e) => return Err(e),
        }
    }
}

/// Resolve a bearer token to its live session, or None.
///
/// Malformed tokens are rejected without touching the store; unknown ids,
/// wrong secrets, and expired sessions all read identically as None. Pure
/// read, invoked on every authenticated request.
pub async fn validate_session_token(
    pool: &DbPool,
    token: &str,
) -> Result<Option<Session>, sqlx::Error> {
    let Some((id, secret)) = parse_token(token) else {
        return Ok(None);
    };

    let session: Option<Session> = sqlx::query_as("SELECT * FROM sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(session) = session else {
        return Ok(None);
    };

    let presented_hash = hash_secret(secret);
    if !constant_time_eq(&presented_hash, &session.secret_hash) {
        return Ok(None);
    }

    if is_expired(&session.expires_at) {
        return Ok(None);
    }

    Ok(Some(session))
}

/// Delete a session row. Deleting an absent id is not an error.
pub async fn delete_session(pool: &DbPool, session_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Check a token against a claimed user id.
///
/// Store failures propagate; they must never read as "invalid credentials".
pub async fn authorize_user_action(
    pool: &DbPool,
    token: Option<&str>,
    claimed_user_id: &str,
) -> Result<Authorization, sqlx::Error> {
    let Some(token) = token else {
        return Ok(Authorization::Unauthenticated);
    };

    match validate_session_token(pool, token).await? {
        None => Ok(Authorization::Unauthenticated),
        Some(session) if session.user_id == claimed_user_id => Ok(Authorization::Authorized),
        Some(_) => Ok(Authorization::Forbidden),
    }
}

/// Remove sessions past their expiry. Run opportunistically at startup.
pub async fn purge_expired(pool: &DbPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    let purged = result.rows_affected();
    if purged > 0 {
        info!(purged, "Purged expired sessions");
    }
    Ok(purged)
}

fn is_expired(expires_at: &str) -> bool {
    match DateTime::parse_from_rfc3339(expires_at) {
        Ok(t) => t <= Utc::now(),
        // An unparsable timestamp can't be trusted as live.
        Err(_) => true,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE constraint failed")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn test_pool() -> DbPool {
        let pool = db::init_memory().await.expect("in-memory db");
        sqlx::query("INSERT INTO users (id, username, password_hash, name, created_at) VALUES ('u1', 'alice', 'x', 'Alice', '2024-01-01T00:00:00+00:00')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO users (id, username, password_hash, name, created_at) VALUES ('u2', 'bob', 'x', 'Bob', '2024-01-01T00:00:00+00:00')")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_then_validate() {
        let pool = test_pool().await;

        let created = create_session(&pool, "u1", Duration::days(30)).await.unwrap();
        assert_eq!(created.session.user_id, "u1");
        // 24 + 1 + 24
        assert_eq!(created.token.len(), 49);

        let session = validate_session_token(&pool, &created.token)
            .await
            .unwrap()
            .expect("session should validate");
        assert_eq!(session.id, created.session.id);
        assert_eq!(session.user_id, "u1");
    }

    #[tokio::test]
    async fn test_validate_rejects_garbage() {
        let pool = test_pool().await;
        create_session(&pool, "u1", Duration::days(30)).await.unwrap();

        for token in ["", "no-separator", "unknownid.unknownsecret"] {
            assert!(validate_session_token(&pool, token).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_validate_rejects_wrong_secret() {
        let pool = test_pool().await;
        let created = create_session(&pool, "u1", Duration::days(30)).await.unwrap();

        // Flip the last character of the secret portion.
        let mut tampered = created.token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'a' { 'b' } else { 'a' });

        assert!(validate_session_token(&pool, &tampered).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let pool = test_pool().await;
        let created = create_session(&pool, "u1", Duration::days(30)).await.unwrap();

        delete_session(&pool, &created.session.id).await.unwrap();
        assert!(validate_session_token(&pool, &created.token).await.unwrap().is_none());

        // Second delete of the same id is fine.
        delete_session(&pool, &created.session.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_is_invalid() {
        let pool = test_pool().await;
        let created = create_session(&pool, "u1", Duration::seconds(-1)).await.unwrap();

        assert!(validate_session_token(&pool, &created.token).await.unwrap().is_none());

        let purged = purge_expired(&pool).await.unwrap();
        assert_eq!(purged, 1);
    }

    #[tokio::test]
    async fn test_unique_violation_classification() {
        let pool = test_pool().await;

        let insert = |id: &'static str, user: &'static str| {
            sqlx::query(
                "INSERT INTO sessions (id, user_id, secret_hash, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(user)
            .bind(vec![0u8; 32])
            .bind("2024-01-01T00:00:00+00:00")
            .bind("2099-01-01T00:00:00+00:00")
            .execute(&pool)
        };

        insert("dup", "u1").await.unwrap();

        // Same id again trips the primary key and must read as a collision.
        let err = insert("dup", "u1").await.unwrap_err();
        assert!(is_unique_violation(&err));

        // Other constraint failures must not be mistaken for collisions.
        let err = insert("fresh", "no-such-user").await.unwrap_err();
        assert!(!is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_authorize_three_way() {
        let pool = test_pool().await;
        let created = create_session(&pool, "u1", Duration::days(30)).await.unwrap();

        assert_eq!(
            authorize_user_action(&pool, None, "u1").await.unwrap(),
            Authorization::Unauthenticated
        );
        assert_eq!(
            authorize_user_action(&pool, Some("bad.token"), "u1").await.unwrap(),
            Authorization::Unauthenticated
        );
        assert_eq!(
            authorize_user_action(&pool, Some(&created.token), "u2").await.unwrap(),
            Authorization::Forbidden
        );
        assert_eq!(
            authorize_user_action(&pool, Some(&created.token), "u1").await.unwrap(),
            Authorization::Authorized
        );
    }

    #[test]
    fn test_full_lifecycle() {
        tokio_test::block_on(async {
            let pool = test_pool().await;

            let created = create_session(&pool, "u1", Duration::days(30)).await.unwrap();
            let session = validate_session_token(&pool, &created.token)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(session.user_id, "u1");

            delete_session(&pool, &session.id).await.unwrap();
            assert!(validate_session_token(&pool, &created.token)
                .await
                .unwrap()
                .is_none());
        });
    }
}
