//! Category business logic.
//!
//! Sibling categories (same `parent_id`) are ordered by `sort_order`, which must
//! stay unique among them. Inserting at an occupied position shifts every
//! sibling at or after it by [`ORDER_INCREMENT`] instead of renumbering.
//! Repeated insertions at the same spot shrink the gaps over time; there is no
//! compaction pass.

use crate::{
    entities::{Category, Product, ProductCategory, category, product, product_category},
    errors::{Error, Result},
};
use chrono::Utc;
use rand::Rng;
use sea_orm::{
    Condition, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Deserialize;
use tracing::{debug, info};

/// Gap left between consecutive sort keys and the shift applied on collision.
pub const ORDER_INCREMENT: i32 = 10;

/// Fields of a category as submitted by an admin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    /// Display name
    pub name: String,
    /// Optional blurb
    #[serde(default)]
    pub description: Option<String>,
    /// Optional image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Parent category
    #[serde(default)]
    pub parent_id: Option<i64>,
    /// Requested sort key; appended after the last sibling when absent
    #[serde(default)]
    pub order: Option<i32>,
    /// Show on the home page
    #[serde(default)]
    pub featured: bool,
}

/// Turns a display name into a lowercase, hyphen-separated slug.
///
/// ASCII punctuation and whitespace separate words. Other scripts are kept as
/// written, including combining marks such as Devanagari vowel signs.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if keeps_in_slug(c) {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn keeps_in_slug(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_alphanumeric();
    }
    // General punctuation block and the Devanagari danda separate words too
    !c.is_whitespace() && !matches!(c, '\u{2000}'..='\u{206F}' | '\u{0964}' | '\u{0965}')
}

/// Slug for a stored record; names with nothing sluggable get `<kind>-<random hex>`.
#[must_use]
pub fn slug_for(kind: &str, name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        format!("{kind}-{:08x}", rand::rng().random::<u32>())
    } else {
        slug
    }
}

fn siblings_of(parent_id: Option<i64>) -> Condition {
    match parent_id {
        Some(parent) => Condition::all().add(category::Column::ParentId.eq(parent)),
        None => Condition::all().add(category::Column::ParentId.is_null()),
    }
}

/// Next free sort key after the last sibling.
async fn next_order<C>(db: &C, parent_id: Option<i64>) -> Result<i32>
where
    C: ConnectionTrait,
{
    let max: Option<Option<i32>> = Category::find()
        .select_only()
        .column_as(category::Column::SortOrder.max(), "max_order")
        .filter(siblings_of(parent_id))
        .into_tuple()
        .one(db)
        .await?;
    Ok(max.flatten().map_or(0, |m| m + ORDER_INCREMENT))
}

/// Makes room for `order` among the siblings under `parent_id`.
///
/// If another sibling (not `exclude_id`) already holds `order`, every sibling
/// with a key `>= order` moves up by [`ORDER_INCREMENT`]. Returns the rows shifted.
pub async fn make_room<C>(
    db: &C,
    parent_id: Option<i64>,
    order: i32,
    exclude_id: Option<i64>,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let mut collision = siblings_of(parent_id).add(category::Column::SortOrder.eq(order));
    let mut shifted = siblings_of(parent_id).add(category::Column::SortOrder.gte(order));
    if let Some(id) = exclude_id {
        collision = collision.add(category::Column::Id.ne(id));
        shifted = shifted.add(category::Column::Id.ne(id));
    }

    if Category::find().filter(collision).count(db).await? == 0 {
        return Ok(0);
    }

    let result = Category::update_many()
        .col_expr(
            category::Column::SortOrder,
            Expr::col(category::Column::SortOrder).add(ORDER_INCREMENT),
        )
        .filter(shifted)
        .exec(db)
        .await?;
    debug!(?parent_id, order, rows = result.rows_affected, "Shifted sibling categories");
    Ok(result.rows_affected)
}

async fn ensure_parent<C>(db: &C, parent_id: Option<i64>, self_id: Option<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    let Some(parent_id) = parent_id else {
        return Ok(());
    };
    if Some(parent_id) == self_id {
        return Err(Error::validation("a category cannot be its own parent"));
    }

    // Walk up from the proposed parent; meeting ourselves would close a cycle.
    let mut cursor = Some(parent_id);
    while let Some(id) = cursor {
        let node = Category::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("Category", id))?;
        if Some(node.id) == self_id {
            return Err(Error::validation("category parent would create a cycle"));
        }
        cursor = node.parent_id;
    }
    Ok(())
}

/// Creates a category, shifting siblings when the requested order is taken.
pub async fn create_category(db: &DatabaseConnection, input: CategoryInput) -> Result<category::Model> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("category name is required"));
    }
    let slug = slug_for("category", &name);

    let txn = db.begin().await?;
    ensure_parent(&txn, input.parent_id, None).await?;

    let sort_order = match input.order {
        Some(order) => {
            make_room(&txn, input.parent_id, order, None).await?;
            order
        }
        None => next_order(&txn, input.parent_id).await?,
    };

    let now = Utc::now();
    let created = category::ActiveModel {
        name: Set(name),
        slug: Set(slug),
        description: Set(input.description),
        image: Set(input.image),
        parent_id: Set(input.parent_id),
        sort_order: Set(sort_order),
        featured: Set(input.featured),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(category_id = created.id, sort_order, "Category created");
    Ok(created)
}

/// Updates a category. Moving it or giving it an explicit order re-runs the collision shift.
pub async fn update_category(
    db: &DatabaseConnection,
    category_id: i64,
    input: CategoryInput,
) -> Result<category::Model> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("category name is required"));
    }

    let txn = db.begin().await?;
    let current = Category::find_by_id(category_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Category", category_id))?;
    ensure_parent(&txn, input.parent_id, Some(category_id)).await?;

    let moved = current.parent_id != input.parent_id;
    let sort_order = match input.order {
        Some(order) => {
            make_room(&txn, input.parent_id, order, Some(category_id)).await?;
            order
        }
        None if moved => next_order(&txn, input.parent_id).await?,
        None => current.sort_order,
    };

    let renamed = current.name != name;
    let mut active: category::ActiveModel = current.into();
    if renamed {
        active.slug = Set(slug_for("category", &name));
    }
    active.name = Set(name);
    active.description = Set(input.description);
    active.image = Set(input.image);
    active.parent_id = Set(input.parent_id);
    active.sort_order = Set(sort_order);
    active.featured = Set(input.featured);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

/// Deletes a category that has no children and is nobody's primary category.
/// Secondary product links to it are dropped.
pub async fn delete_category(db: &DatabaseConnection, category_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let doomed = Category::find_by_id(category_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Category", category_id))?;

    let children = Category::find()
        .filter(category::Column::ParentId.eq(category_id))
        .count(&txn)
        .await?;
    if children > 0 {
        return Err(Error::Conflict {
            message: format!("category {category_id} still has {children} subcategories"),
        });
    }
    let primaries = Product::find()
        .filter(product::Column::PrimaryCategoryId.eq(category_id))
        .count(&txn)
        .await?;
    if primaries > 0 {
        return Err(Error::Conflict {
            message: format!("category {category_id} is the primary category of {primaries} products"),
        });
    }

    ProductCategory::delete_many()
        .filter(product_category::Column::CategoryId.eq(category_id))
        .exec(&txn)
        .await?;
    doomed.delete(&txn).await?;
    txn.commit().await?;
    info!(category_id, "Category deleted");
    Ok(())
}

/// Finds a category by id.
pub async fn get_category(db: &DatabaseConnection, category_id: i64) -> Result<category::Model> {
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Category", category_id))
}

/// Lists categories in sort order, optionally only the children of one parent
/// (`Some(None)` means top-level) or only featured ones.
pub async fn list_categories(
    db: &DatabaseConnection,
    parent: Option<Option<i64>>,
    featured_only: bool,
) -> Result<Vec<category::Model>> {
    let mut query = Category::find();
    if let Some(parent_id) = parent {
        query = query.filter(siblings_of(parent_id));
    }
    if featured_only {
        query = query.filter(category::Column::Featured.eq(true));
    }
    query
        .order_by_asc(category::Column::SortOrder)
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use std::collections::HashSet;

    fn input(name: &str, parent_id: Option<i64>, order: Option<i32>) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
            parent_id,
            order,
            ..Default::default()
        }
    }

    fn orders(categories: &[category::Model]) -> Vec<(String, i32)> {
        categories
            .iter()
            .map(|c| (c.name.clone(), c.sort_order))
            .collect()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Pain Relief"), "pain-relief");
        assert_eq!(slugify("  Vitamins & Supplements!! "), "vitamins-supplements");
        assert_eq!(slugify("Baby--Care"), "baby-care");
        assert_eq!(slugify("Ayurveda \u{2013} Herbal"), "ayurveda-herbal");
    }

    #[test]
    fn test_slugify_keeps_devanagari() {
        assert_eq!(slugify("दवाइयाँ"), "दवाइयाँ");
        assert_eq!(slugify("आयुर्वेद"), "आयुर्वेद");
        assert_eq!(slugify("Pain Relief / दर्द निवारक"), "pain-relief-दर्द-निवारक");
    }

    #[test]
    fn test_slug_for_never_empty() {
        let slug = slug_for("category", "!!!");
        assert!(slug.starts_with("category-"));
        assert_eq!(slug.len(), "category-".len() + 8);
        assert_eq!(slug_for("category", "Pain Relief"), "pain-relief");
    }

    #[tokio::test]
    async fn test_non_latin_names_get_distinct_slugs() -> Result<()> {
        let db = setup_test_db().await?;
        let medicines = create_category(&db, input("दवाइयाँ", None, None)).await?;
        let ayurveda = create_category(&db, input("आयुर्वेद", None, None)).await?;
        let symbols = create_category(&db, input("***", None, None)).await?;
        let more_symbols = create_category(&db, input("???", None, None)).await?;

        let slugs: HashSet<String> = [&medicines, &ayurveda, &symbols, &more_symbols]
            .iter()
            .map(|c| c.slug.clone())
            .collect();
        assert_eq!(slugs.len(), 4);
        assert!(slugs.iter().all(|s| !s.is_empty()));

        let renamed = update_category(&db, symbols.id, input("***", None, None)).await?;
        assert_eq!(renamed.slug, symbols.slug);
        Ok(())
    }

    #[tokio::test]
    async fn test_default_order_appends() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_category(&db, input("A", None, None)).await?;
        let b = create_category(&db, input("B", None, None)).await?;
        assert_eq!(a.sort_order, 0);
        assert_eq!(b.sort_order, ORDER_INCREMENT);
        Ok(())
    }

    #[tokio::test]
    async fn test_collision_shifts_siblings() -> Result<()> {
        let db = setup_test_db().await?;
        create_category(&db, input("A", None, Some(10))).await?;
        create_category(&db, input("B", None, Some(20))).await?;
        create_category(&db, input("C", None, Some(30))).await?;
        create_category(&db, input("Z", None, Some(5))).await?;

        create_category(&db, input("New", None, Some(20))).await?;

        let listed = list_categories(&db, Some(None), false).await?;
        assert_eq!(
            orders(&listed),
            vec![
                ("Z".to_string(), 5),
                ("A".to_string(), 10),
                ("New".to_string(), 20),
                ("B".to_string(), 30),
                ("C".to_string(), 40),
            ]
        );
        let unique: HashSet<i32> = listed.iter().map(|c| c.sort_order).collect();
        assert_eq!(unique.len(), listed.len());
        Ok(())
    }

    #[tokio::test]
    async fn test_no_shift_without_collision() -> Result<()> {
        let db = setup_test_db().await?;
        create_category(&db, input("A", None, Some(10))).await?;
        create_category(&db, input("B", None, Some(30))).await?;
        create_category(&db, input("Mid", None, Some(20))).await?;

        let listed = list_categories(&db, Some(None), false).await?;
        assert_eq!(
            orders(&listed),
            vec![
                ("A".to_string(), 10),
                ("Mid".to_string(), 20),
                ("B".to_string(), 30),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_shift_only_touches_siblings() -> Result<()> {
        let db = setup_test_db().await?;
        let parent = create_category(&db, input("Parent", None, Some(10))).await?;
        let child = create_category(&db, input("Child", Some(parent.id), Some(10))).await?;
        create_category(&db, input("Other", None, Some(10))).await?;

        let child = get_category(&db, child.id).await?;
        assert_eq!(child.sort_order, 10);
        let parent = get_category(&db, parent.id).await?;
        assert_eq!(parent.sort_order, 20);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_to_taken_order_shifts_others() -> Result<()> {
        let db = setup_test_db().await?;
        create_category(&db, input("A", None, Some(10))).await?;
        let b = create_category(&db, input("B", None, Some(20))).await?;

        update_category(&db, b.id, input("B", None, Some(10))).await?;
        let listed = list_categories(&db, Some(None), false).await?;
        assert_eq!(
            orders(&listed),
            vec![("B".to_string(), 10), ("A".to_string(), 20)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_parent_cycle_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let top = create_category(&db, input("Top", None, None)).await?;
        let mid = create_category(&db, input("Mid", Some(top.id), None)).await?;

        let result = update_category(&db, top.id, input("Top", Some(mid.id), None)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() -> Result<()> {
        let db = setup_test_db().await?;
        create_category(&db, input("Skin Care", None, None)).await?;
        let result = create_category(&db, input("skin care", None, None)).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_guards() -> Result<()> {
        let db = setup_test_db().await?;
        let parent = create_category(&db, input("Parent", None, None)).await?;
        let child = create_category(&db, input("Child", Some(parent.id), None)).await?;

        let result = delete_category(&db, parent.id).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        delete_category(&db, child.id).await?;
        delete_category(&db, parent.id).await?;
        assert!(list_categories(&db, None, false).await?.is_empty());
        Ok(())
    }
}
