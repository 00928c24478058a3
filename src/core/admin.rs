//! Back-office accounts and their permissions.
//!
//! Permissions are a pure function of the role, applied explicitly whenever an
//! account is created or its role changes.

use std::fmt;

use crate::{
    config::bootstrap::BootstrapAdmin,
    core::auth::{hash_password, validate_password, verify_password},
    entities::{AdminUser, admin_user, admin_user::AdminRole},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{info, warn};

/// Bitset of back-office capabilities.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct PermissionSet(i64);

impl PermissionSet {
    /// Create, edit and publish categories and products
    pub const MANAGE_CATALOG: Self = Self(1);
    /// View orders and change their status or payment state
    pub const MANAGE_ORDERS: Self = Self(1 << 1);
    /// View, deactivate and delete customers
    pub const MANAGE_USERS: Self = Self(1 << 2);
    /// Edit commissions and delete referral rows
    pub const MANAGE_REFERRALS: Self = Self(1 << 3);
    /// Read and write service settings
    pub const MANAGE_SETTINGS: Self = Self(1 << 4);
    /// Broadcast push notifications
    pub const SEND_NOTIFICATIONS: Self = Self(1 << 5);
    /// See dashboard figures
    pub const VIEW_DASHBOARD: Self = Self(1 << 6);
    /// Move orders through shipping and delivery
    pub const UPDATE_DELIVERY: Self = Self(1 << 7);
    /// Create and edit other admin accounts
    pub const MANAGE_ADMINS: Self = Self(1 << 8);

    /// No permissions.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every permission.
    #[must_use]
    pub const fn all() -> Self {
        Self((1 << 9) - 1)
    }

    /// Raw bits as stored in the database.
    #[must_use]
    pub const fn bits(self) -> i64 {
        self.0
    }

    /// Rebuilds a set from stored bits, dropping unknown ones.
    #[must_use]
    pub const fn from_bits_truncate(bits: i64) -> Self {
        Self(bits & Self::all().0)
    }

    /// Whether every permission in `other` is present.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for PermissionSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Debug for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionSet({:#b})", self.0)
    }
}

/// Permissions granted to each role.
#[must_use]
pub const fn permissions_for(role: AdminRole) -> PermissionSet {
    match role {
        AdminRole::Admin => PermissionSet::all(),
        AdminRole::Vendor => PermissionSet::MANAGE_CATALOG
            .union(PermissionSet::MANAGE_ORDERS)
            .union(PermissionSet::VIEW_DASHBOARD),
        AdminRole::Editor => PermissionSet::MANAGE_CATALOG,
        AdminRole::Delivery => PermissionSet::UPDATE_DELIVERY,
    }
}

/// Permissions currently stored on an admin account.
#[must_use]
pub const fn permissions_of(admin: &admin_user::Model) -> PermissionSet {
    PermissionSet::from_bits_truncate(admin.permissions)
}

/// Creates a back-office account with the role's permissions.
pub async fn create_admin_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: AdminRole,
) -> Result<admin_user::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("name is required"));
    }
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(Error::validation("a valid email is required"));
    }
    validate_password(password)?;

    let now = Utc::now();
    let created = admin_user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email),
        password_hash: Set(hash_password(password)?),
        role: Set(role),
        permissions: Set(permissions_for(role).bits()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(admin_id = created.id, ?role, "Admin user created");
    Ok(created)
}

/// Changes an admin's role and resets permissions to match it.
pub async fn change_role(
    db: &DatabaseConnection,
    admin_id: i64,
    role: AdminRole,
) -> Result<admin_user::Model> {
    let admin = get_admin(db, admin_id).await?;
    let mut active: admin_user::ActiveModel = admin.into();
    active.role = Set(role);
    active.permissions = Set(permissions_for(role).bits());
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;
    info!(admin_id, ?role, "Admin role changed");
    Ok(updated)
}

/// Activates or deactivates an admin account.
pub async fn set_admin_active(
    db: &DatabaseConnection,
    admin_id: i64,
    is_active: bool,
) -> Result<admin_user::Model> {
    let admin = get_admin(db, admin_id).await?;
    let mut active: admin_user::ActiveModel = admin.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Finds an admin by id.
pub async fn get_admin(db: &DatabaseConnection, admin_id: i64) -> Result<admin_user::Model> {
    AdminUser::find_by_id(admin_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("AdminUser", admin_id))
}

/// Lists admin accounts alphabetically.
pub async fn list_admins(db: &DatabaseConnection) -> Result<Vec<admin_user::Model>> {
    AdminUser::find()
        .order_by_asc(admin_user::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Checks back-office credentials.
pub async fn admin_login(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<admin_user::Model> {
    let bad_credentials = || Error::Unauthorized {
        message: "invalid email or password".to_string(),
    };

    let admin = AdminUser::find()
        .filter(admin_user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?
        .ok_or_else(bad_credentials)?;

    if !verify_password(password, &admin.password_hash)? {
        warn!(admin_id = admin.id, "Failed admin login");
        return Err(bad_credentials());
    }
    if !admin.is_active {
        return Err(Error::Forbidden {
            message: "admin account is inactive".to_string(),
        });
    }
    Ok(admin)
}

/// Creates the bootstrap admin unless an account with that email exists.
///
/// Returns true when a new account was created.
pub async fn ensure_bootstrap_admin(db: &DatabaseConnection, admin: &BootstrapAdmin) -> Result<bool> {
    let exists = AdminUser::find()
        .filter(admin_user::Column::Email.eq(admin.email.trim().to_lowercase()))
        .count(db)
        .await?
        > 0;
    if exists {
        return Ok(false);
    }
    create_admin_user(db, &admin.name, &admin.email, &admin.password, AdminRole::Admin).await?;
    Ok(true)
}
