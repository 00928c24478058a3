//! Referral ledger business logic.
//!
//! Each user owns one ledger row holding their code and who referred them.
//! Registering with a code appends a referee entry to the referrer's row.
//! Commission earnings are never stored: they are recomputed from the referees'
//! delivered orders on every read.

use crate::{
    core::cascade::CascadePlan,
    entities::{
        Order, Referral, ReferralReferee, User, order, referral, referral_referee,
        referral_referee::RefereeStatus, user,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Outcome of checking a referral code. Never an error for a bad code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeValidation {
    /// Whether the code can be used at registration
    pub valid: bool,
    /// Owner of the code when valid
    pub referrer_id: Option<i64>,
    /// Owner's display name when valid
    pub referrer_name: Option<String>,
}

impl CodeValidation {
    const fn invalid() -> Self {
        Self {
            valid: false,
            referrer_id: None,
            referrer_name: None,
        }
    }
}

/// Checks whether `code` belongs to an existing, active user.
///
/// Returns `valid = false` when the code is unknown, its owner no longer exists,
/// or its owner is inactive. Only database failures are errors.
pub async fn validate_code<C>(db: &C, code: &str) -> Result<CodeValidation>
where
    C: ConnectionTrait,
{
    let code = code.trim();
    if code.is_empty() {
        return Ok(CodeValidation::invalid());
    }

    let Some(ledger) = Referral::find()
        .filter(referral::Column::ReferralCode.eq(code))
        .one(db)
        .await?
    else {
        return Ok(CodeValidation::invalid());
    };

    match User::find_by_id(ledger.user_id).one(db).await? {
        Some(owner) if owner.is_active => Ok(CodeValidation {
            valid: true,
            referrer_id: Some(owner.id),
            referrer_name: Some(owner.name),
        }),
        _ => Ok(CodeValidation::invalid()),
    }
}

/// Creates the ledger row for a newly registered user.
pub async fn create_ledger<C>(
    db: &C,
    user_id: i64,
    referral_code: &str,
    referred_by: Option<i64>,
) -> Result<referral::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let ledger = referral::ActiveModel {
        user_id: Set(user_id),
        referral_code: Set(referral_code.to_string()),
        referred_by: Set(referred_by),
        total_referrals: Set(0),
        successful_referrals: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    ledger.insert(db).await.map_err(Into::into)
}

/// Appends a pending referee entry to `referrer_id`'s ledger row and bumps its total.
pub async fn attach_referee<C>(db: &C, referrer_id: i64, referee_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let ledger = find_by_user(db, referrer_id)
        .await?
        .ok_or_else(|| Error::not_found("Referral", format!("user {referrer_id}")))?;

    let now = Utc::now();
    referral_referee::ActiveModel {
        referral_id: Set(ledger.id),
        user_id: Set(referee_id),
        registered_at: Set(now),
        status: Set(RefereeStatus::Pending),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Referral::update_many()
        .col_expr(
            referral::Column::TotalReferrals,
            Expr::col(referral::Column::TotalReferrals).add(1),
        )
        .col_expr(referral::Column::UpdatedAt, Expr::value(now))
        .filter(referral::Column::Id.eq(ledger.id))
        .exec(db)
        .await?;

    info!(referrer_id, referee_id, "Referee attached");
    Ok(())
}

/// Marks `referee_id`'s entry completed the first time one of their orders is delivered.
///
/// Does nothing when the user was not referred or the entry already moved on.
pub async fn mark_referee_completed<C>(db: &C, referee_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let Some(entry) = ReferralReferee::find()
        .filter(referral_referee::Column::UserId.eq(referee_id))
        .filter(referral_referee::Column::Status.eq(RefereeStatus::Pending))
        .one(db)
        .await?
    else {
        return Ok(());
    };

    let referral_id = entry.referral_id;
    let mut active: referral_referee::ActiveModel = entry.into();
    active.status = Set(RefereeStatus::Completed);
    active.update(db).await?;

    Referral::update_many()
        .col_expr(
            referral::Column::SuccessfulReferrals,
            Expr::col(referral::Column::SuccessfulReferrals).add(1),
        )
        .col_expr(referral::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(referral::Column::Id.eq(referral_id))
        .exec(db)
        .await?;

    info!(referee_id, referral_id, "Referee completed");
    Ok(())
}

/// Finds a user's ledger row.
pub async fn find_by_user<C>(db: &C, user_id: i64) -> Result<Option<referral::Model>>
where
    C: ConnectionTrait,
{
    Referral::find()
        .filter(referral::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Sets the share of referee revenue credited to `user_id`.
///
/// Touches the ledger row's `updated_at` when one exists; never creates one.
#[instrument(skip(db))]
pub async fn set_commission(db: &DatabaseConnection, user_id: i64, percentage: f64) -> Result<()> {
    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err(Error::InvalidInput {
            message: format!("commission percentage must be between 0 and 100, got {percentage}"),
        });
    }

    let txn = db.begin().await?;

    let owner = User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;

    let now = Utc::now();
    let mut active: user::ActiveModel = owner.into();
    active.referral_commission_percentage = Set(percentage);
    active.updated_at = Set(now);
    active.update(&txn).await?;

    Referral::update_many()
        .col_expr(referral::Column::UpdatedAt, Expr::value(now))
        .filter(referral::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    info!(user_id, percentage, "Commission updated");
    Ok(())
}

/// Deletes a ledger row and unlinks it everywhere, all or nothing.
///
/// The row itself and its referee entries go; any ledger that names the owner as
/// `referred_by` is cleared; the owner is pulled out of every other referee list.
#[instrument(skip(db))]
pub async fn delete_referral(db: &DatabaseConnection, referral_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let ledger = Referral::find_by_id(referral_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Referral", referral_id))?;

    let report = CascadePlan::for_referral(&ledger).apply(&txn).await?;
    txn.commit().await?;

    info!(referral_id, rows = report.total_rows(), "Referral deleted");
    Ok(())
}

/// Commission on `revenue` at `rate` percent, rounded to cents.
#[must_use]
pub fn commission_earned(revenue: f64, rate: f64) -> f64 {
    crate::core::pricing::round_currency(revenue * (rate / 100.0))
}

/// Sum of `total_price` over a user's delivered orders.
pub async fn delivered_revenue<C>(db: &C, user_id: i64) -> Result<f64>
where
    C: ConnectionTrait,
{
    let total: Option<Option<f64>> = Order::find()
        .select_only()
        .column_as(order::Column::TotalPrice.sum(), "revenue")
        .filter(order::Column::UserId.eq(user_id))
        .filter(order::Column::Status.eq(order::OrderStatus::Delivered))
        .into_tuple()
        .one(db)
        .await?;
    Ok(total.flatten().unwrap_or(0.0))
}

/// One referee as shown in referral details.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefereeSummary {
    /// Referred user
    pub user_id: i64,
    /// Their name, None if the account is gone
    pub name: Option<String>,
    /// When they registered
    pub registered_at: DateTime<Utc>,
    /// Progress
    pub status: RefereeStatus,
    /// Revenue from their delivered orders
    pub revenue: f64,
}

/// A user's referral position with earnings computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralDetails {
    /// Ledger row id
    pub referral_id: i64,
    /// Owner
    pub user_id: i64,
    /// Owner's code
    pub referral_code: String,
    /// Who referred the owner
    pub referred_by: Option<i64>,
    /// Owner's commission rate, percent
    pub commission_rate: f64,
    /// Everyone registered with this code
    pub referees: Vec<RefereeSummary>,
    /// Revenue from all referees' delivered orders
    pub total_referee_revenue: f64,
    /// `total_referee_revenue * commission_rate / 100`
    pub commission_earned: f64,
}

/// Builds the referral details for `user_id`.
///
/// Recomputes revenue from every referee's order history on each call.
pub async fn get_referral_details(db: &DatabaseConnection, user_id: i64) -> Result<ReferralDetails> {
    let owner = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    let ledger = find_by_user(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("Referral", format!("user {user_id}")))?;

    let entries = ReferralReferee::find()
        .filter(referral_referee::Column::ReferralId.eq(ledger.id))
        .order_by_asc(referral_referee::Column::RegisteredAt)
        .all(db)
        .await?;

    let mut referees = Vec::with_capacity(entries.len());
    let mut total_revenue = 0.0;
    for entry in entries {
        let name = User::find_by_id(entry.user_id).one(db).await?.map(|u| u.name);
        let revenue = delivered_revenue(db, entry.user_id).await?;
        total_revenue += revenue;
        referees.push(RefereeSummary {
            user_id: entry.user_id,
            name,
            registered_at: entry.registered_at,
            status: entry.status,
            revenue,
        });
    }

    let total_referee_revenue = crate::core::pricing::round_currency(total_revenue);
    Ok(ReferralDetails {
        referral_id: ledger.id,
        user_id,
        referral_code: ledger.referral_code,
        referred_by: ledger.referred_by,
        commission_rate: owner.referral_commission_percentage,
        referees,
        total_referee_revenue,
        commission_earned: commission_earned(
            total_referee_revenue,
            owner.referral_commission_percentage,
        ),
    })
}

/// Lists every ledger row, newest first.
pub async fn list_referrals(db: &DatabaseConnection) -> Result<Vec<referral::Model>> {
    Referral::find()
        .order_by_desc(referral::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Resolves an optional referral code at registration.
///
/// An unusable code is logged and ignored rather than failing the signup.
pub(crate) async fn resolve_referrer<C>(db: &C, code: Option<&str>) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    let Some(code) = code.filter(|c| !c.trim().is_empty()) else {
        return Ok(None);
    };
    let validation = validate_code(db, code).await?;
    if !validation.valid {
        warn!(code, "Ignoring unusable referral code at registration");
    }
    Ok(validation.referrer_id)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::order::OrderStatus;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_validate_code_unknown_is_invalid() -> Result<()> {
        let db = setup_test_db().await?;
        let result = validate_code(&db, "NOPE1234").await?;
        assert!(!result.valid);
        assert_eq!(result.referrer_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_validate_code_active_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Asha", "asha@example.com").await?;

        let result = validate_code(&db, &owner.referral_code).await?;
        assert!(result.valid);
        assert_eq!(result.referrer_id, Some(owner.id));
        assert_eq!(result.referrer_name.as_deref(), Some("Asha"));
        Ok(())
    }

    #[tokio::test]
    async fn test_validate_code_inactive_owner_is_invalid() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Ravi", "ravi@example.com").await?;
        crate::core::user::set_active(&db, owner.id, false).await?;

        let result = validate_code(&db, &owner.referral_code).await?;
        assert!(!result.valid);
        Ok(())
    }

    #[tokio::test]
    async fn test_validate_code_missing_owner_is_invalid() -> Result<()> {
        let now = Utc::now();
        let ledger = referral::Model {
            id: 1,
            user_id: 77,
            referral_code: "GHOST1234".to_string(),
            referred_by: None,
            total_referrals: 0,
            successful_referrals: 0,
            created_at: now,
            updated_at: now,
        };
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![ledger]])
            .append_query_results([Vec::<crate::entities::user::Model>::new()])
            .into_connection();

        let result = validate_code(&db, "GHOST1234").await?;
        assert!(!result.valid);
        assert_eq!(result.referrer_id, None);
        assert_eq!(db.into_transaction_log().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_commission_out_of_range() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        for bad in [-1.0, 100.5, f64::NAN] {
            let result = set_commission(&db, 1, bad).await;
            assert!(matches!(result, Err(Error::InvalidInput { .. })));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_set_commission_updates_user_and_touches_ledger() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Meera", "meera@example.com").await?;
        let before = find_by_user(&db, owner.id).await?.unwrap();

        set_commission(&db, owner.id, 12.5).await?;

        let updated = User::find_by_id(owner.id).one(&db).await?.unwrap();
        assert_eq!(updated.referral_commission_percentage, 12.5);
        let after = find_by_user(&db, owner.id).await?.unwrap();
        assert!(after.updated_at >= before.updated_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_commission_unknown_user() -> Result<()> {
        let db = setup_test_db().await?;
        let result = set_commission(&db, 404, 10.0).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_registration_with_code_links_ledgers() -> Result<()> {
        let db = setup_test_db().await?;
        let referrer = create_test_user(&db, "Kiran", "kiran@example.com").await?;
        let referee =
            create_referred_user(&db, "Dev", "dev@example.com", &referrer.referral_code).await?;

        let referee_ledger = find_by_user(&db, referee.id).await?.unwrap();
        assert_eq!(referee_ledger.referred_by, Some(referrer.id));

        let referrer_ledger = find_by_user(&db, referrer.id).await?.unwrap();
        assert_eq!(referrer_ledger.total_referrals, 1);

        let details = get_referral_details(&db, referrer.id).await?;
        assert_eq!(details.referees.len(), 1);
        assert_eq!(details.referees[0].user_id, referee.id);
        assert_eq!(details.referees[0].status, RefereeStatus::Pending);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_referral_cascades() -> Result<()> {
        let db = setup_test_db().await?;
        let top = create_test_user(&db, "Top", "top@example.com").await?;
        let middle = create_referred_user(&db, "Mid", "mid@example.com", &top.referral_code).await?;
        let bottom =
            create_referred_user(&db, "Bot", "bot@example.com", &middle.referral_code).await?;

        let middle_ledger = find_by_user(&db, middle.id).await?.unwrap();
        delete_referral(&db, middle_ledger.id).await?;

        // The row and its referee entries are gone
        assert!(Referral::find_by_id(middle_ledger.id).one(&db).await?.is_none());
        let orphaned = ReferralReferee::find()
            .filter(referral_referee::Column::ReferralId.eq(middle_ledger.id))
            .count(&db)
            .await?;
        assert_eq!(orphaned, 0);

        // Bottom no longer points at middle
        let bottom_ledger = find_by_user(&db, bottom.id).await?.unwrap();
        assert_eq!(bottom_ledger.referred_by, None);

        // Middle was pulled out of top's referees
        let details = get_referral_details(&db, top.id).await?;
        assert!(details.referees.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_referral_failure_keeps_every_link() -> Result<()> {
        let db = setup_test_db().await?;
        let top = create_test_user(&db, "Isha", "isha@example.com").await?;
        let middle = create_referred_user(&db, "Jai", "jai@example.com", &top.referral_code).await?;
        let bottom =
            create_referred_user(&db, "Kavya", "kavya@example.com", &middle.referral_code).await?;
        let middle_ledger = find_by_user(&db, middle.id).await?.unwrap();

        // Clearing referred_by is the second step; make it fail after the first ran
        db.execute_unprepared(
            "CREATE TRIGGER freeze_referred_by BEFORE UPDATE OF referred_by ON referrals \
             BEGIN SELECT RAISE(ABORT, 'referrals are frozen'); END;",
        )
        .await?;

        let result = delete_referral(&db, middle_ledger.id).await;
        assert!(matches!(result, Err(Error::Database(_))));

        assert!(Referral::find_by_id(middle_ledger.id).one(&db).await?.is_some());
        let entries = ReferralReferee::find()
            .filter(referral_referee::Column::ReferralId.eq(middle_ledger.id))
            .count(&db)
            .await?;
        assert_eq!(entries, 1);
        let bottom_ledger = find_by_user(&db, bottom.id).await?.unwrap();
        assert_eq!(bottom_ledger.referred_by, Some(middle.id));
        let details = get_referral_details(&db, top.id).await?;
        assert_eq!(details.referees.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_referral_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete_referral(&db, 99).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_commission_earned_from_delivered_orders() -> Result<()> {
        let db = setup_test_db().await?;
        let referrer = create_test_user(&db, "Neha", "neha@example.com").await?;
        set_commission(&db, referrer.id, 10.0).await?;
        let referee =
            create_referred_user(&db, "Om", "om@example.com", &referrer.referral_code).await?;

        let product = create_test_product(&db, "Paracetamol", 50.0, 60.0, 100).await?;
        let delivered = place_test_order(&db, &referee, product.id, 2).await?;
        crate::core::order::update_status(&db, delivered.id, OrderStatus::Delivered, None, "admin:1")
            .await?;
        // A second, undelivered order does not count
        place_test_order(&db, &referee, product.id, 1).await?;

        let details = get_referral_details(&db, referrer.id).await?;
        let expected_revenue = delivered.total_price;
        assert_eq!(details.total_referee_revenue, expected_revenue);
        assert_eq!(details.commission_earned, commission_earned(expected_revenue, 10.0));
        assert_eq!(details.referees[0].status, RefereeStatus::Completed);

        let ledger = find_by_user(&db, referrer.id).await?.unwrap();
        assert_eq!(ledger.successful_referrals, 1);
        Ok(())
    }

    #[test]
    fn test_commission_earned_math() {
        assert_eq!(commission_earned(1000.0, 5.0), 50.0);
        assert_eq!(commission_earned(0.0, 50.0), 0.0);
        assert_eq!(commission_earned(333.33, 10.0), 33.33);
    }
}
