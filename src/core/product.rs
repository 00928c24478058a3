//! Product business logic - the catalog side of the storefront.
//!
//! Products carry two price tiers. Discount percentages, `on_sale` and
//! `stock_status` are never accepted from callers; every write recomputes them
//! through [`crate::core::pricing`].

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    core::{
        category::slug_for,
        pricing::{TierPrices, stock_status_for},
    },
    entities::{
        Category, Product, ProductCategory, product,
        product::{AdditionalInfo, PublishStatus},
        product_category,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Product fields as submitted by an admin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    /// Display name; the slug is derived from it
    pub name: String,
    /// Long description
    #[serde(default)]
    pub description: Option<String>,
    /// Category the product is listed under first
    pub primary_category_id: i64,
    /// Extra categories, the primary one is always linked too
    #[serde(default)]
    pub category_ids: Vec<i64>,
    /// List price for licensees
    pub licensed_price: f64,
    /// List price for unlicensed customers
    pub unlicensed_price: f64,
    /// Optional sale price for licensees
    #[serde(default)]
    pub sale_licensed_price: Option<f64>,
    /// Optional sale price for unlicensed customers
    #[serde(default)]
    pub sale_unlicensed_price: Option<f64>,
    /// Units on hand
    #[serde(default)]
    pub stock: i32,
    /// Draft or published
    #[serde(default = "default_publish_status")]
    pub publish_status: PublishStatus,
    /// Show in featured listings
    #[serde(default)]
    pub featured: bool,
    /// Primary image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Free-form attributes
    #[serde(default)]
    pub additional_info: BTreeMap<String, String>,
}

const fn default_publish_status() -> PublishStatus {
    PublishStatus::Draft
}

impl ProductInput {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("product name is required"));
        }
        let prices = [
            ("licensedPrice", Some(self.licensed_price)),
            ("unlicensedPrice", Some(self.unlicensed_price)),
            ("salePrice.licensedPrice", self.sale_licensed_price),
            ("salePrice.unlicensedPrice", self.sale_unlicensed_price),
        ];
        for (field, price) in prices {
            if price.is_some_and(|p| !p.is_finite() || p < 0.0) {
                return Err(Error::validation(format!(
                    "{field} must be a non-negative number"
                )));
            }
        }
        if self.stock < 0 {
            return Err(Error::validation("stock cannot be negative"));
        }
        Ok(())
    }

    const fn prices(&self) -> TierPrices {
        TierPrices {
            licensed: self.licensed_price,
            unlicensed: self.unlicensed_price,
            sale_licensed: self.sale_licensed_price,
            sale_unlicensed: self.sale_unlicensed_price,
        }
    }

    fn linked_categories(&self) -> BTreeSet<i64> {
        let mut ids: BTreeSet<i64> = self.category_ids.iter().copied().collect();
        ids.insert(self.primary_category_id);
        ids
    }
}

/// Listing order for [`list_products`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    /// Most recently created first
    #[default]
    Newest,
    /// Cheapest first (unlicensed list price)
    PriceAsc,
    /// Most expensive first (unlicensed list price)
    PriceDesc,
    /// Alphabetical
    Name,
}

/// Filters for [`list_products`]. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// Only featured (or only non-featured) products
    #[serde(default)]
    pub featured: Option<bool>,
    /// Products listed in this category, primary or secondary
    #[serde(default)]
    pub category: Option<i64>,
    /// Case-insensitive substring of name or description
    #[serde(default)]
    pub keyword: Option<String>,
    /// Listing order
    #[serde(default)]
    pub sort: ProductSort,
    /// Hide drafts
    #[serde(default)]
    pub published_only: bool,
}

async fn ensure_categories<C>(db: &C, ids: &BTreeSet<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    for &id in ids {
        if Category::find_by_id(id).one(db).await?.is_none() {
            return Err(Error::not_found("Category", id));
        }
    }
    Ok(())
}

async fn replace_links<C>(db: &C, product_id: i64, ids: &BTreeSet<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    ProductCategory::delete_many()
        .filter(product_category::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;
    if ids.is_empty() {
        return Ok(());
    }
    let links = ids.iter().map(|&category_id| product_category::ActiveModel {
        product_id: Set(product_id),
        category_id: Set(category_id),
    });
    ProductCategory::insert_many(links).exec_without_returning(db).await?;
    Ok(())
}

/// Creates a product with its derived pricing and stock fields.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_product(db: &DatabaseConnection, input: ProductInput) -> Result<product::Model> {
    input.validate()?;
    let categories = input.linked_categories();
    let derived = input.prices().derive();

    let txn = db.begin().await?;
    ensure_categories(&txn, &categories).await?;

    let now = Utc::now();
    let publish_date = (input.publish_status == PublishStatus::Published).then_some(now);
    let name = input.name.trim().to_string();
    let created = product::ActiveModel {
        slug: Set(slug_for("product", &name)),
        name: Set(name),
        description: Set(input.description),
        primary_category_id: Set(input.primary_category_id),
        licensed_price: Set(input.licensed_price),
        unlicensed_price: Set(input.unlicensed_price),
        sale_licensed_price: Set(input.sale_licensed_price),
        sale_unlicensed_price: Set(input.sale_unlicensed_price),
        licensed_discount: Set(derived.licensed_discount),
        unlicensed_discount: Set(derived.unlicensed_discount),
        on_sale: Set(derived.on_sale),
        stock: Set(input.stock),
        stock_status: Set(stock_status_for(input.stock)),
        publish_status: Set(input.publish_status),
        publish_date: Set(publish_date),
        featured: Set(input.featured),
        image: Set(input.image),
        additional_info: Set(AdditionalInfo(input.additional_info)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_links(&txn, created.id, &categories).await?;
    txn.commit().await?;

    info!(product_id = created.id, "Product created");
    Ok(created)
}

/// Replaces every editable field of a product and recomputes the derived ones.
///
/// `publish_date` is kept once set; it is only filled on the first publish.
#[instrument(skip(db, input))]
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    input: ProductInput,
) -> Result<product::Model> {
    input.validate()?;
    let categories = input.linked_categories();
    let derived = input.prices().derive();

    let txn = db.begin().await?;
    let current = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))?;
    ensure_categories(&txn, &categories).await?;

    let now = Utc::now();
    let publish_date = match (current.publish_date, input.publish_status) {
        (Some(date), _) => Some(date),
        (None, PublishStatus::Published) => Some(now),
        (None, PublishStatus::Draft) => None,
    };

    let name = input.name.trim().to_string();
    let renamed = current.name != name;
    let mut active: product::ActiveModel = current.into();
    if renamed {
        active.slug = Set(slug_for("product", &name));
    }
    active.name = Set(name);
    active.description = Set(input.description);
    active.primary_category_id = Set(input.primary_category_id);
    active.licensed_price = Set(input.licensed_price);
    active.unlicensed_price = Set(input.unlicensed_price);
    active.sale_licensed_price = Set(input.sale_licensed_price);
    active.sale_unlicensed_price = Set(input.sale_unlicensed_price);
    active.licensed_discount = Set(derived.licensed_discount);
    active.unlicensed_discount = Set(derived.unlicensed_discount);
    active.on_sale = Set(derived.on_sale);
    active.stock = Set(input.stock);
    active.stock_status = Set(stock_status_for(input.stock));
    active.publish_status = Set(input.publish_status);
    active.publish_date = Set(publish_date);
    active.featured = Set(input.featured);
    active.image = Set(input.image);
    active.additional_info = Set(AdditionalInfo(input.additional_info));
    active.updated_at = Set(now);
    let updated = active.update(&txn).await?;

    replace_links(&txn, product_id, &categories).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Deletes a product and its category links. Past order items keep their snapshot.
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let doomed = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))?;
    ProductCategory::delete_many()
        .filter(product_category::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    doomed.delete(&txn).await?;
    txn.commit().await?;
    info!(product_id, "Product deleted");
    Ok(())
}

/// Finds a product by id.
pub async fn get_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))
}

/// Finds a product by slug.
pub async fn get_product_by_slug(db: &DatabaseConnection, slug: &str) -> Result<product::Model> {
    Product::find()
        .filter(product::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Product", slug))
}

/// Ids of every category a product is linked to.
pub async fn product_categories(db: &DatabaseConnection, product_id: i64) -> Result<Vec<i64>> {
    let links = ProductCategory::find()
        .filter(product_category::Column::ProductId.eq(product_id))
        .all(db)
        .await?;
    Ok(links.into_iter().map(|link| link.category_id).collect())
}

/// Lists products matching `filter`.
pub async fn list_products(db: &DatabaseConnection, filter: &ProductFilter) -> Result<Vec<product::Model>> {
    let mut query = Product::find();

    if let Some(featured) = filter.featured {
        query = query.filter(product::Column::Featured.eq(featured));
    }
    if filter.published_only {
        query = query.filter(product::Column::PublishStatus.eq(PublishStatus::Published));
    }
    if let Some(category_id) = filter.category {
        let linked: Vec<i64> = ProductCategory::find()
            .filter(product_category::Column::CategoryId.eq(category_id))
            .all(db)
            .await?
            .into_iter()
            .map(|link| link.product_id)
            .collect();
        query = query.filter(
            Condition::any()
                .add(product::Column::PrimaryCategoryId.eq(category_id))
                .add(product::Column::Id.is_in(linked)),
        );
    }
    if let Some(keyword) = filter.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        // SQLite LIKE is case-insensitive for ASCII.
        query = query.filter(
            Condition::any()
                .add(product::Column::Name.contains(keyword))
                .add(product::Column::Description.contains(keyword)),
        );
    }

    query = match filter.sort {
        ProductSort::Newest => query
            .order_by_desc(product::Column::CreatedAt)
            .order_by_desc(product::Column::Id),
        ProductSort::PriceAsc => query.order_by_asc(product::Column::UnlicensedPrice),
        ProductSort::PriceDesc => query.order_by_desc(product::Column::UnlicensedPrice),
        ProductSort::Name => query.order_by_asc(product::Column::Name),
    };

    query.all(db).await.map_err(Into::into)
}

/// Publishes or unpublishes a product. The first publish stamps `publish_date`.
pub async fn set_publish_status(
    db: &DatabaseConnection,
    product_id: i64,
    status: PublishStatus,
) -> Result<product::Model> {
    let current = get_product(db, product_id).await?;
    let now = Utc::now();
    let first_publish = status == PublishStatus::Published && current.publish_date.is_none();

    let mut active: product::ActiveModel = current.into();
    active.publish_status = Set(status);
    if first_publish {
        active.publish_date = Set(Some(now));
    }
    active.updated_at = Set(now);
    let updated = active.update(db).await?;
    info!(product_id, ?status, "Publish status changed");
    Ok(updated)
}

/// Writes a new stock level and its derived bucket.
pub(crate) async fn write_stock<C>(db: &C, current: product::Model, stock: i32) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let mut active: product::ActiveModel = current.into();
    active.stock = Set(stock);
    active.stock_status = Set(stock_status_for(stock));
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Adds `delta` units (negative to remove). Stock never drops below zero.
#[instrument(skip(db))]
pub async fn adjust_stock(db: &DatabaseConnection, product_id: i64, delta: i32) -> Result<product::Model> {
    let current = get_product(db, product_id).await?;
    let stock = current
        .stock
        .checked_add(delta)
        .filter(|s| *s >= 0)
        .ok_or_else(|| Error::InvalidInput {
            message: format!(
                "cannot adjust stock of product {product_id} from {} by {delta}",
                current.stock
            ),
        })?;
    write_stock(db, current, stock).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]
    use super::*;
    use crate::{entities::product::StockStatus, test_utils::*};

    fn input(name: &str, category_id: i64) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: None,
            primary_category_id: category_id,
            category_ids: Vec::new(),
            licensed_price: 90.0,
            unlicensed_price: 100.0,
            sale_licensed_price: None,
            sale_unlicensed_price: None,
            stock: 25,
            publish_status: PublishStatus::Published,
            featured: false,
            image: None,
            additional_info: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_sale_price_derives_discount() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Pain Relief").await?;

        let mut new = input("Paracetamol 500", category.id);
        new.sale_unlicensed_price = Some(80.0);
        let product = create_product(&db, new).await?;

        assert_eq!(product.unlicensed_discount, 20);
        assert_eq!(product.licensed_discount, 0);
        assert!(product.on_sale);
        assert_eq!(product.slug, "paracetamol-500");
        assert_eq!(product.stock_status, StockStatus::InStock);
        assert!(product.publish_date.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_recomputes_derived_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Vitamins").await?;
        let mut new = input("Vitamin C", category.id);
        new.sale_unlicensed_price = Some(80.0);
        let product = create_product(&db, new).await?;

        let mut changed = input("Vitamin C", category.id);
        changed.stock = 3;
        let updated = update_product(&db, product.id, changed).await?;

        assert!(!updated.on_sale);
        assert_eq!(updated.unlicensed_discount, 0);
        assert_eq!(updated.stock_status, StockStatus::LowStock);
        assert_eq!(updated.publish_date, product.publish_date);
        Ok(())
    }

    #[tokio::test]
    async fn test_negative_price_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Misc").await?;
        let mut new = input("Broken", category.id);
        new.licensed_price = -1.0;
        assert!(matches!(
            create_product(&db, new).await,
            Err(Error::Validation { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_product(&db, input("Orphan", 999)).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Category", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_publish_date_set_once() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Skin").await?;
        let mut new = input("Moisturiser", category.id);
        new.publish_status = PublishStatus::Draft;
        let product = create_product(&db, new).await?;
        assert!(product.publish_date.is_none());

        let published = set_publish_status(&db, product.id, PublishStatus::Published).await?;
        let first = published.publish_date;
        assert!(first.is_some());

        set_publish_status(&db, product.id, PublishStatus::Draft).await?;
        let again = set_publish_status(&db, product.id, PublishStatus::Published).await?;
        assert_eq!(again.publish_date, first);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let pain = create_test_category(&db, "Pain").await?;
        let cold = create_test_category(&db, "Cold").await?;

        let mut aspirin = input("Aspirin", pain.id);
        aspirin.featured = true;
        aspirin.unlicensed_price = 30.0;
        create_product(&db, aspirin).await?;

        let mut syrup = input("Cough Syrup", cold.id);
        syrup.category_ids = vec![pain.id];
        syrup.description = Some("Soothes throat PAIN".to_string());
        syrup.unlicensed_price = 70.0;
        create_product(&db, syrup).await?;

        let mut draft = input("Nasal Spray", cold.id);
        draft.publish_status = PublishStatus::Draft;
        create_product(&db, draft).await?;

        let in_pain = list_products(
            &db,
            &ProductFilter {
                category: Some(pain.id),
                sort: ProductSort::PriceAsc,
                ..Default::default()
            },
        )
        .await?;
        let names: Vec<_> = in_pain.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Aspirin", "Cough Syrup"]);

        let featured = list_products(
            &db,
            &ProductFilter {
                featured: Some(true),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(featured.len(), 1);

        let keyword = list_products(
            &db,
            &ProductFilter {
                keyword: Some("pain".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(keyword.len(), 1);
        assert_eq!(keyword[0].name, "Cough Syrup");

        let public = list_products(
            &db,
            &ProductFilter {
                published_only: true,
                sort: ProductSort::Name,
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(public.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Bandage", 10.0, 12.0, 12).await?;

        let lowered = adjust_stock(&db, product.id, -5).await?;
        assert_eq!(lowered.stock, 7);
        assert_eq!(lowered.stock_status, StockStatus::LowStock);

        let result = adjust_stock(&db, product.id, -8).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let emptied = adjust_stock(&db, product.id, -7).await?;
        assert_eq!(emptied.stock_status, StockStatus::OutOfStock);
        Ok(())
    }

    #[tokio::test]
    async fn test_devanagari_products_get_distinct_slugs() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Ayurveda").await?;
        let first = create_product(&db, input("अश्वगंधा", category.id)).await?;
        let second = create_product(&db, input("त्रिफला चूर्ण", category.id)).await?;

        assert_eq!(first.slug, "अश्वगंधा");
        assert_eq!(second.slug, "त्रिफला-चूर्ण");
        assert_eq!(get_product_by_slug(&db, "अश्वगंधा").await?.id, first.id);

        let renamed = update_product(&db, first.id, input("Ashwagandha", category.id)).await?;
        assert_eq!(renamed.slug, "ashwagandha");
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_removes_links() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "First Aid").await?;
        let product = create_product(&db, input("Gauze", category.id)).await?;
        assert_eq!(product_categories(&db, product.id).await?, vec![category.id]);

        delete_product(&db, product.id).await?;
        assert!(product_categories(&db, product.id).await?.is_empty());
        assert!(matches!(
            get_product(&db, product.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }
}
