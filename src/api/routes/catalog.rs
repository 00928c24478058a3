//! Catalog routes. Reads are public; writes need `MANAGE_CATALOG`.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{
    api::{
        extract::AuthAdmin,
        response::{Ack, ApiResult, ack, ok},
        state::AppState,
    },
    core::{
        admin::PermissionSet,
        category::{self, CategoryInput},
        product::{self, ProductFilter, ProductInput},
    },
    entities::{CategoryModel, ProductModel, product::PublishStatus},
};

/// Query string of the category listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    /// Children of this category
    #[serde(default)]
    pub parent_id: Option<i64>,
    /// Only categories without a parent (ignored when `parentId` is set)
    #[serde(default)]
    pub top_level: bool,
    /// Only featured categories
    #[serde(default)]
    pub featured: bool,
}

/// GET /api/categories
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Vec<CategoryModel>> {
    let parent = match (query.parent_id, query.top_level) {
        (Some(id), _) => Some(Some(id)),
        (None, true) => Some(None),
        (None, false) => None,
    };
    ok(category::list_categories(state.db(), parent, query.featured).await?)
}

/// GET /api/categories/{id}
pub async fn get_category(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<CategoryModel> {
    ok(category::get_category(state.db(), id).await?)
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Json(body): Json<CategoryInput>,
) -> ApiResult<CategoryModel> {
    admin.require(PermissionSet::MANAGE_CATALOG)?;
    ok(category::create_category(state.db(), body).await?)
}

/// PUT /api/categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    Json(body): Json<CategoryInput>,
) -> ApiResult<CategoryModel> {
    admin.require(PermissionSet::MANAGE_CATALOG)?;
    ok(category::update_category(state.db(), id, body).await?)
}

/// DELETE /api/categories/{id}
pub async fn delete_category(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
) -> ApiResult<Ack> {
    admin.require(PermissionSet::MANAGE_CATALOG)?;
    category::delete_category(state.db(), id).await?;
    ack("Category deleted")
}

/// GET /api/products
///
/// Storefront listing: drafts are never shown here.
pub async fn list_products(
    State(state): State<AppState>,
    Query(mut filter): Query<ProductFilter>,
) -> ApiResult<Vec<ProductModel>> {
    filter.published_only = true;
    ok(product::list_products(state.db(), &filter).await?)
}

/// GET /api/admin/products
pub async fn admin_list_products(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Query(filter): Query<ProductFilter>,
) -> ApiResult<Vec<ProductModel>> {
    admin.require(PermissionSet::MANAGE_CATALOG)?;
    ok(product::list_products(state.db(), &filter).await?)
}

/// GET /api/products/{id}
pub async fn get_product(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<ProductModel> {
    ok(product::get_product(state.db(), id).await?)
}

/// GET /api/products/slug/{slug}
pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<ProductModel> {
    ok(product::get_product_by_slug(state.db(), &slug).await?)
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Json(body): Json<ProductInput>,
) -> ApiResult<ProductModel> {
    admin.require(PermissionSet::MANAGE_CATALOG)?;
    ok(product::create_product(state.db(), body).await?)
}

/// PUT /api/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    Json(body): Json<ProductInput>,
) -> ApiResult<ProductModel> {
    admin.require(PermissionSet::MANAGE_CATALOG)?;
    ok(product::update_product(state.db(), id, body).await?)
}

/// DELETE /api/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
) -> ApiResult<Ack> {
    admin.require(PermissionSet::MANAGE_CATALOG)?;
    product::delete_product(state.db(), id).await?;
    ack("Product deleted")
}

/// Body of the publish toggle.
#[derive(Debug, Deserialize)]
pub struct PublishBody {
    /// Target state
    pub status: PublishStatus,
}

/// PUT /api/products/{id}/publish
pub async fn set_publish_status(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    Json(body): Json<PublishBody>,
) -> ApiResult<ProductModel> {
    admin.require(PermissionSet::MANAGE_CATALOG)?;
    ok(product::set_publish_status(state.db(), id, body.status).await?)
}

/// Body of a stock adjustment.
#[derive(Debug, Deserialize)]
pub struct StockBody {
    /// Units to add, negative to remove
    pub delta: i32,
}

/// POST /api/products/{id}/stock
pub async fn adjust_stock(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    Json(body): Json<StockBody>,
) -> ApiResult<ProductModel> {
    admin.require(PermissionSet::MANAGE_CATALOG)?;
    ok(product::adjust_stock(state.db(), id, body.delta).await?)
}
