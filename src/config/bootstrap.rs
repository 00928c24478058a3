//! Bootstrap admin account read from environment variables.
//!
//! On a fresh database nobody can log in to the back office. When `ADMIN_EMAIL`
//! and `ADMIN_PASSWORD` are set, the server creates that account with the
//! `admin` role on start-up, unless an admin with that email already exists.

/// Credentials for the first admin account
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    /// Display name, `ADMIN_NAME` or "Administrator"
    pub name: String,
    /// Login email
    pub email: String,
    /// Plaintext password, hashed before storage
    pub password: String,
}

/// Reads `ADMIN_EMAIL`, `ADMIN_PASSWORD` and optional `ADMIN_NAME`.
///
/// Returns `None` unless both the email and password are configured.
#[must_use]
pub fn bootstrap_admin_from_env() -> Option<BootstrapAdmin> {
    let (Ok(email), Ok(password)) = (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD"))
    else {
        return None;
    };

    Some(BootstrapAdmin {
        name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
        email,
        password,
    })
}
