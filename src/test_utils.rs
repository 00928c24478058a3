//! Shared test utilities for `DavaDukaan`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::app::OrderConfig,
    core::{
        address::{self, AddressInput},
        category::{self, CategoryInput},
        order::{self, NewOrder, OrderLine},
        product::{self, ProductInput},
        user::{self, NewUser},
    },
    entities::{
        self, address::AddressType, order::PaymentMethod, product::PublishStatus,
        user::CustomerType,
    },
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Password every test account is registered with.
pub const TEST_PASSWORD: &str = "s3cret-pass";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers an unlicensed customer with [`TEST_PASSWORD`] and no referrer.
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
) -> Result<entities::user::Model> {
    user::register(
        db,
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            phone: None,
            customer_type: CustomerType::Unlicensed,
            referral_code: None,
        },
    )
    .await
}

/// Registers an unlicensed customer who signed up with `code`.
pub async fn create_referred_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    code: &str,
) -> Result<entities::user::Model> {
    user::register(
        db,
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            phone: None,
            customer_type: CustomerType::Unlicensed,
            referral_code: Some(code.to_string()),
        },
    )
    .await
}

/// Creates a top-level category appended after its siblings.
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::category::Model> {
    category::create_category(
        db,
        CategoryInput {
            name: name.to_string(),
            ..Default::default()
        },
    )
    .await
}

/// Creates a published product with no sale price in a fresh category.
///
/// # Defaults
/// * category: "<name> Category"
/// * `publish_status`: published
/// * featured: false
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    licensed_price: f64,
    unlicensed_price: f64,
    stock: i32,
) -> Result<entities::product::Model> {
    let category = create_test_category(db, &format!("{name} Category")).await?;
    product::create_product(
        db,
        ProductInput {
            name: name.to_string(),
            description: None,
            primary_category_id: category.id,
            category_ids: Vec::new(),
            licensed_price,
            unlicensed_price,
            sale_licensed_price: None,
            sale_unlicensed_price: None,
            stock,
            publish_status: PublishStatus::Published,
            featured: false,
            image: None,
            additional_info: std::collections::BTreeMap::new(),
        },
    )
    .await
}

/// A complete home address in Pune.
#[must_use]
pub fn test_address_input(is_default: bool) -> AddressInput {
    AddressInput {
        address_type: AddressType::Home,
        full_name: "Test Recipient".to_string(),
        phone: "9800000000".to_string(),
        line1: "12 MG Road".to_string(),
        line2: None,
        city: "Pune".to_string(),
        state: "Maharashtra".to_string(),
        postal_code: "411001".to_string(),
        country: "India".to_string(),
        is_default,
    }
}

/// Places a cash-on-delivery order for `quantity` units of one product.
///
/// Adds a fresh address for the buyer and uses the default order config.
pub async fn place_test_order(
    db: &DatabaseConnection,
    buyer: &entities::user::Model,
    product_id: i64,
    quantity: i32,
) -> Result<entities::order::Model> {
    let shipping = address::create_address(db, buyer.id, test_address_input(false)).await?;
    order::create_order(
        db,
        &OrderConfig::default(),
        buyer.id,
        NewOrder {
            items: vec![OrderLine {
                product_id,
                quantity,
            }],
            shipping_address_id: shipping.id,
            payment_method: PaymentMethod::Cod,
            notes: None,
            shipping_price: None,
            tax_price: 0.0,
            discount: 0.0,
        },
    )
    .await
}
