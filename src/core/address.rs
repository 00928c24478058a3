//! Address book business logic.
//!
//! Invariant: a user with any addresses has exactly one flagged `is_default`, and
//! `users.default_address_id` points at it.

use crate::{
    entities::{Address, User, address, address::AddressType, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Deserialize;
use tracing::info;

/// Fields of an address as submitted by the customer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    /// Kind of address
    pub address_type: AddressType,
    /// Recipient name
    pub full_name: String,
    /// Recipient phone
    pub phone: String,
    /// Street line
    pub line1: String,
    /// Optional second street line
    #[serde(default)]
    pub line2: Option<String>,
    /// City
    pub city: String,
    /// State or province
    pub state: String,
    /// Postal code
    pub postal_code: String,
    /// Country, defaults to India
    #[serde(default = "default_country")]
    pub country: String,
    /// Make this the default address
    #[serde(default)]
    pub is_default: bool,
}

fn default_country() -> String {
    "India".to_string()
}

impl AddressInput {
    fn validate(&self) -> Result<()> {
        let required = [
            ("fullName", &self.full_name),
            ("phone", &self.phone),
            ("line1", &self.line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("{field} is required")));
            }
        }
        Ok(())
    }
}

/// Clears `is_default` on every other address of the user and mirrors the id onto the user.
async fn make_default<C>(db: &C, user_id: i64, address_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    Address::update_many()
        .col_expr(address::Column::IsDefault, Expr::value(false))
        .filter(address::Column::UserId.eq(user_id))
        .filter(address::Column::Id.ne(address_id))
        .exec(db)
        .await?;
    Address::update_many()
        .col_expr(address::Column::IsDefault, Expr::value(true))
        .col_expr(address::Column::UpdatedAt, Expr::value(now))
        .filter(address::Column::Id.eq(address_id))
        .exec(db)
        .await?;
    User::update_many()
        .col_expr(user::Column::DefaultAddressId, Expr::value(Some(address_id)))
        .col_expr(user::Column::UpdatedAt, Expr::value(now))
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}

async fn find_owned<C>(db: &C, user_id: i64, address_id: i64) -> Result<address::Model>
where
    C: ConnectionTrait,
{
    let found = Address::find_by_id(address_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Address", address_id))?;
    if found.user_id != user_id {
        return Err(Error::Forbidden {
            message: "address belongs to another user".to_string(),
        });
    }
    Ok(found)
}

/// Adds an address. The user's first address always becomes the default.
pub async fn create_address(
    db: &DatabaseConnection,
    user_id: i64,
    input: AddressInput,
) -> Result<address::Model> {
    input.validate()?;
    let txn = db.begin().await?;

    User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    let existing = Address::find()
        .filter(address::Column::UserId.eq(user_id))
        .count(&txn)
        .await?;
    let becomes_default = input.is_default || existing == 0;

    let now = Utc::now();
    let created = address::ActiveModel {
        user_id: Set(user_id),
        address_type: Set(input.address_type),
        full_name: Set(input.full_name.trim().to_string()),
        phone: Set(input.phone.trim().to_string()),
        line1: Set(input.line1.trim().to_string()),
        line2: Set(input.line2),
        city: Set(input.city.trim().to_string()),
        state: Set(input.state.trim().to_string()),
        postal_code: Set(input.postal_code.trim().to_string()),
        country: Set(input.country),
        is_default: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if becomes_default {
        make_default(&txn, user_id, created.id).await?;
    }
    let created = find_owned(&txn, user_id, created.id).await?;
    txn.commit().await?;
    Ok(created)
}

/// Replaces an address's fields. Setting `is_default` moves the default here;
/// clearing it on the current default is ignored.
pub async fn update_address(
    db: &DatabaseConnection,
    user_id: i64,
    address_id: i64,
    input: AddressInput,
) -> Result<address::Model> {
    input.validate()?;
    let txn = db.begin().await?;

    let current = find_owned(&txn, user_id, address_id).await?;
    let mut active: address::ActiveModel = current.into();
    active.address_type = Set(input.address_type);
    active.full_name = Set(input.full_name.trim().to_string());
    active.phone = Set(input.phone.trim().to_string());
    active.line1 = Set(input.line1.trim().to_string());
    active.line2 = Set(input.line2);
    active.city = Set(input.city.trim().to_string());
    active.state = Set(input.state.trim().to_string());
    active.postal_code = Set(input.postal_code.trim().to_string());
    active.country = Set(input.country);
    active.updated_at = Set(Utc::now());
    active.update(&txn).await?;

    if input.is_default {
        make_default(&txn, user_id, address_id).await?;
    }
    let updated = find_owned(&txn, user_id, address_id).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Makes `address_id` the user's only default address.
pub async fn set_default_address(
    db: &DatabaseConnection,
    user_id: i64,
    address_id: i64,
) -> Result<address::Model> {
    let txn = db.begin().await?;
    find_owned(&txn, user_id, address_id).await?;
    make_default(&txn, user_id, address_id).await?;
    let updated = find_owned(&txn, user_id, address_id).await?;
    txn.commit().await?;
    info!(user_id, address_id, "Default address changed");
    Ok(updated)
}

/// Deletes an address. If it was the default, the newest remaining address takes over.
pub async fn delete_address(db: &DatabaseConnection, user_id: i64, address_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let doomed = find_owned(&txn, user_id, address_id).await?;
    let was_default = doomed.is_default;
    doomed.delete(&txn).await?;

    if was_default {
        let successor = Address::find()
            .filter(address::Column::UserId.eq(user_id))
            .order_by_desc(address::Column::CreatedAt)
            .one(&txn)
            .await?;
        match successor {
            Some(next) => make_default(&txn, user_id, next.id).await?,
            None => {
                User::update_many()
                    .col_expr(user::Column::DefaultAddressId, Expr::value(Option::<i64>::None))
                    .filter(user::Column::Id.eq(user_id))
                    .exec(&txn)
                    .await?;
            }
        }
    }

    txn.commit().await?;
    Ok(())
}

/// Lists a user's addresses, default first.
pub async fn list_addresses(db: &DatabaseConnection, user_id: i64) -> Result<Vec<address::Model>> {
    Address::find()
        .filter(address::Column::UserId.eq(user_id))
        .order_by_desc(address::Column::IsDefault)
        .order_by_desc(address::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds one of the user's addresses; Forbidden if it belongs to someone else.
pub async fn get_address<C>(db: &C, user_id: i64, address_id: i64) -> Result<address::Model>
where
    C: ConnectionTrait,
{
    find_owned(db, user_id, address_id).await
}
