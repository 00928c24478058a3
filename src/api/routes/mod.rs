//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /api/health
//!
//! # Auth
//! POST   /api/auth/register | /login | /forgot-password | /reset-password
//! POST   /api/auth/admin/login
//! GET    /api/auth/me              PUT /api/auth/me
//!
//! # Catalog (public read, admin write)
//! GET    /api/categories           POST /api/categories
//! GET    /api/categories/{id}      PUT | DELETE
//! GET    /api/products             POST /api/products
//! GET    /api/products/{id}        PUT | DELETE
//! GET    /api/products/slug/{slug}
//! PUT    /api/products/{id}/publish
//! POST   /api/products/{id}/stock
//!
//! # Customer
//! GET    /api/user/addresses       POST
//! PUT    /api/user/addresses/{id}  DELETE
//! PUT    /api/user/addresses/{id}/default
//! GET    /api/user/orders          POST
//! GET    /api/user/orders/{id}     PUT (cancel)
//! GET    /api/user/referral
//! POST   /api/notifications/register-token
//! GET    /api/notifications        GET /api/notifications/tokens
//! DELETE /api/notifications/tokens/{token}
//!
//! # Referrals
//! GET    /api/referrals/validate?code=
//! POST   /api/referrals/verify
//!
//! # Admin
//! GET    /api/admin/dashboard
//! GET    /api/admin/products
//! GET    /api/admin/orders         GET /api/admin/orders/{id}
//! GET    /api/admin/orders/{id}/history
//! PUT    /api/admin/orders/{id}/status | /payment
//! GET    /api/admin/users          GET | DELETE /api/admin/users/{id}
//! PUT    /api/admin/users/{id}/active | /type
//! GET    /api/admin/admins         POST
//! PUT    /api/admin/admins/{id}/role | /active
//! GET    /api/admin/referrals      DELETE /api/admin/referrals/{id}
//! GET    /api/admin/referrals/users/{user_id}
//! PUT    /api/admin/referrals/users/{user_id}/commission
//! POST   /api/admin/notifications/broadcast | /test | /prune | /register-token
//! POST   /api/admin/notifications/users/{user_id}
//! GET    /api/admin/notifications/tokens
//! DELETE /api/admin/notifications/tokens/{token}
//! GET    /api/admin/settings       GET | PUT | DELETE /api/admin/settings/{name}
//! ```

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod catalog;
pub mod notifications;
pub mod orders;
pub mod referrals;
pub mod settings;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::api::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/admin/login", post(auth::admin_login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/me", get(auth::me).put(auth::update_me))
}

/// Create the public catalog router (writes are permission-checked per handler).
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/categories/{id}",
            get(catalog::get_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
        .route(
            "/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/products/{id}",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route("/products/slug/{slug}", get(catalog::get_product_by_slug))
        .route("/products/{id}/publish", put(catalog::set_publish_status))
        .route("/products/{id}/stock", post(catalog::adjust_stock))
}

/// Create the customer routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/addresses", get(addresses::list).post(addresses::create))
        .route(
            "/addresses/{id}",
            put(addresses::update).delete(addresses::delete),
        )
        .route("/addresses/{id}/default", put(addresses::set_default))
        .route("/orders", get(orders::list_mine).post(orders::create))
        .route(
            "/orders/{id}",
            get(orders::get_mine).put(orders::cancel_mine),
        )
        .route("/referral", get(referrals::mine))
}

/// Create the referral code routes router.
pub fn referral_routes() -> Router<AppState> {
    Router::new()
        .route("/validate", get(referrals::validate))
        .route("/verify", post(referrals::verify))
}

/// Create the customer notification routes router.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::list_mine))
        .route("/register-token", post(notifications::register_token))
        .route("/tokens", get(notifications::list_tokens))
        .route("/tokens/{token}", delete(notifications::delete_token))
}

/// Create the back-office router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/products", get(catalog::admin_list_products))
        // Orders
        .route("/orders", get(orders::admin_list))
        .route("/orders/{id}", get(orders::admin_get))
        .route("/orders/{id}/history", get(orders::admin_history))
        .route("/orders/{id}/status", put(orders::admin_update_status))
        .route("/orders/{id}/payment", put(orders::admin_update_payment))
        // Accounts
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            get(admin::get_user).delete(admin::delete_user),
        )
        .route("/users/{id}/active", put(admin::set_user_active))
        .route("/users/{id}/type", put(admin::set_user_type))
        .route("/admins", get(admin::list_admins).post(admin::create_admin))
        .route("/admins/{id}/role", put(admin::change_role))
        .route("/admins/{id}/active", put(admin::set_admin_active))
        // Referrals
        .route("/referrals", get(referrals::admin_list))
        .route(
            "/referrals/{id}",
            delete(referrals::admin_delete),
        )
        .route("/referrals/users/{user_id}", get(referrals::admin_details))
        .route(
            "/referrals/users/{user_id}/commission",
            put(referrals::admin_set_commission),
        )
        // Notifications
        .route(
            "/notifications/register-token",
            post(notifications::admin_register_token),
        )
        .route("/notifications/tokens", get(notifications::admin_list_tokens))
        .route(
            "/notifications/tokens/{token}",
            delete(notifications::admin_delete_token),
        )
        .route("/notifications/broadcast", post(notifications::broadcast))
        .route(
            "/notifications/users/{user_id}",
            post(notifications::send_to_user),
        )
        .route("/notifications/test", post(notifications::test_admins))
        .route("/notifications/prune", post(notifications::prune))
        // Settings
        .route("/settings", get(settings::list))
        .route(
            "/settings/{name}",
            get(settings::get).put(settings::set).delete(settings::delete),
        )
}
