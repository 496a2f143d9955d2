//! Session authentication: token codec, session lifecycle, passwords.

pub mod password;
pub mod session;
pub mod token;

pub use password::{hash_password, verify_password};
pub use session::{
    authorize_user_action, create_session, delete_session, purge_expired, validate_session_token,
    Authorization,
};
