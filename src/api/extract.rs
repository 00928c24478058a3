//! Bearer-token extractors.
//!
//! `AuthUser` accepts customer tokens only and `AuthAdmin` admin tokens only.
//! Both reload the account so deactivation takes effect immediately.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    api::state::AppState,
    core::{
        admin::{PermissionSet, permissions_of},
        auth::{Claims, TokenKind},
    },
    entities::{AdminUserModel, UserModel},
    errors::{Error, Result},
};

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| Error::Unauthorized {
            message: "missing bearer token".to_string(),
        })?;
    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Unauthorized {
            message: "malformed authorization header".to_string(),
        })?;
    state.tokens().verify(token)
}

/// A token whose account has since been deleted is unauthorized; any other
/// lookup failure is passed through unchanged.
fn missing_account(message: &'static str) -> impl FnOnce(Error) -> Error {
    move |err| match err {
        Error::NotFound { .. } => Error::Unauthorized {
            message: message.to_string(),
        },
        other => other,
    }
}

/// Extractor that requires a logged-in, active customer.
pub struct AuthUser(pub UserModel);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let claims = bearer_claims(parts, state)?;
        if claims.kind != TokenKind::User {
            return Err(Error::Forbidden {
                message: "customer token required".to_string(),
            });
        }
        let account = crate::core::user::get_user(state.db(), claims.sub)
            .await
            .map_err(missing_account("account no longer exists"))?;
        if !account.is_active {
            return Err(Error::Forbidden {
                message: "account is inactive".to_string(),
            });
        }
        Ok(Self(account))
    }
}

/// Extractor that requires a logged-in, active admin.
pub struct AuthAdmin(pub AdminUserModel);

impl AuthAdmin {
    /// Fails with `Forbidden` unless the admin holds every flag in `needed`.
    pub fn require(&self, needed: PermissionSet) -> Result<()> {
        if permissions_of(&self.0).contains(needed) {
            Ok(())
        } else {
            Err(Error::Forbidden {
                message: format!("missing permission {needed:?}"),
            })
        }
    }

    /// Fails with `Forbidden` unless the admin holds at least one of `options`.
    pub fn require_any(&self, options: &[PermissionSet]) -> Result<()> {
        let held = permissions_of(&self.0);
        if options.iter().any(|&p| held.contains(p)) {
            Ok(())
        } else {
            Err(Error::Forbidden {
                message: format!("missing any of {options:?}"),
            })
        }
    }
}

impl FromRequestParts<AppState> for AuthAdmin {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let claims = bearer_claims(parts, state)?;
        if claims.kind != TokenKind::Admin {
            return Err(Error::Forbidden {
                message: "admin token required".to_string(),
            });
        }
        let admin = crate::core::admin::get_admin(state.db(), claims.sub)
            .await
            .map_err(missing_account("admin account no longer exists"))?;
        if !admin.is_active {
            return Err(Error::Forbidden {
                message: "admin account is inactive".to_string(),
            });
        }
        Ok(Self(admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_only_missing_account_is_unauthorized() {
        let gone = missing_account("gone")(Error::not_found("User", 3));
        assert!(matches!(gone, Error::Unauthorized { .. }));

        let broken = missing_account("gone")(Error::Database(DbErr::Custom("locked".to_string())));
        assert!(matches!(broken, Error::Database(_)));
    }
}
