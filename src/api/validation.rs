//! Input validation for API requests.
//!
//! Validators for registration fields and stock symbols. For collecting
//! multiple errors into one response, use `ValidationErrorBuilder` from the
//! `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Usernames: alphanumeric, 3-20 characters
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9]{3,20}$").unwrap();

    /// Ticker symbols: 1-10 characters, letters/digits with optional . or -
    /// (class shares like BRK.B, some foreign listings use dashes)
    static ref SYMBOL_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.-]{0,9}$").unwrap();
}

/// Validate a username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username cannot be shorter than 3 characters".to_string());
    }

    if username.len() > 20 {
        return Err("Username cannot be longer than 20 characters".to_string());
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err("Username can only contain numbers and letters".to_string());
    }

    Ok(())
}

/// Validate a password (length bounds only; strength is the user's business)
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 64 {
        return Err("Password cannot be longer than 64 characters".to_string());
    }

    Ok(())
}

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    if name.len() > 50 {
        return Err("Name cannot be longer than 50 characters".to_string());
    }

    Ok(())
}

/// Validate a stock symbol from a path parameter
pub fn validate_symbol(symbol: &str) -> Result<(), String> {
    if symbol.is_empty() {
        return Err("Stock symbol is required".to_string());
    }

    if !SYMBOL_REGEX.is_match(symbol) {
        return Err("Invalid stock symbol format".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("Bob42").is_ok());
        assert!(validate_username("abc").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("ab").is_err()); // too short
        assert!(validate_username("a".repeat(21).as_str()).is_err());
        assert!(validate_username("with space").is_err());
        assert!(validate_username("under_score").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password(&"x".repeat(64)).is_ok());

        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("A").is_ok());
        assert!(validate_name("Damon Lewis").is_ok());

        assert!(validate_name("").is_err());
        assert!(validate_name(&"n".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_symbol() {
        assert!(validate_symbol("AAPL").is_ok());
        assert!(validate_symbol("BRK.B").is_ok());
        assert!(validate_symbol("aapl").is_ok()); // handlers uppercase later

        assert!(validate_symbol("").is_err());
        assert!(validate_symbol(".LEADING").is_err());
        assert!(validate_symbol("WAY-TOO-LONG-SYMBOL").is_err());
        assert!(validate_symbol("BAD$CHAR").is_err());
    }
}
