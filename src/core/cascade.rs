//! Cascading deletes as an explicit unit of work.
//!
//! A [`CascadePlan`] lists every table a deletion touches and what happens to
//! it, in foreign-key-safe order. Callers open a transaction, apply the plan to
//! it, and commit; the first failing step aborts the whole plan because the
//! uncommitted transaction is rolled back when dropped.

use std::fmt;

use crate::{
    entities::{
        Address, FcmToken, Notification, Order, OrderItem, OrderStatusHistory, Referral,
        ReferralReferee, User, address, fcm_token, notification, order, order_item,
        order_status_history, referral, referral_referee,
    },
    errors::Result,
};
use chrono::Utc;
use sea_orm::{QuerySelect, prelude::*, sea_query::Expr};
use tracing::debug;

/// One cleanup action against one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStep {
    /// Delete the user's orders together with their line items and status logs
    DeleteOrders {
        /// Buyer
        user_id: i64,
    },
    /// Delete every address the user owns
    DeleteAddresses {
        /// Owner
        user_id: i64,
    },
    /// Delete the user's device push tokens
    DeletePushTokens {
        /// Owner
        user_id: i64,
    },
    /// Delete notifications addressed to the user
    DeleteNotifications {
        /// Recipient
        user_id: i64,
    },
    /// Remove the user from every referrer's referee list
    PullFromReferees {
        /// Referee to remove
        user_id: i64,
    },
    /// Clear `referred_by` on every ledger row naming the user as referrer
    ClearReferredBy {
        /// Referrer to forget
        user_id: i64,
    },
    /// Delete a ledger row and the referee entries it holds
    DeleteReferral {
        /// Ledger row id
        referral_id: i64,
    },
    /// Delete the ledger row owned by the user, if any
    DeleteOwnReferral {
        /// Owner
        user_id: i64,
    },
    /// Delete the user record itself
    DeleteUser {
        /// User to delete
        user_id: i64,
    },
}

impl fmt::Display for CleanupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteOrders { user_id } => write!(f, "delete orders of user {user_id}"),
            Self::DeleteAddresses { user_id } => write!(f, "delete addresses of user {user_id}"),
            Self::DeletePushTokens { user_id } => write!(f, "delete push tokens of user {user_id}"),
            Self::DeleteNotifications { user_id } => {
                write!(f, "delete notifications of user {user_id}")
            }
            Self::PullFromReferees { user_id } => write!(f, "pull user {user_id} from referees"),
            Self::ClearReferredBy { user_id } => write!(f, "clear referred_by = {user_id}"),
            Self::DeleteReferral { referral_id } => write!(f, "delete referral {referral_id}"),
            Self::DeleteOwnReferral { user_id } => write!(f, "delete referral of user {user_id}"),
            Self::DeleteUser { user_id } => write!(f, "delete user {user_id}"),
        }
    }
}

/// Rows touched by one applied step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// The step
    pub step: CleanupStep,
    /// Rows deleted or updated
    pub rows_affected: u64,
}

/// What an applied plan did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// One entry per step, in execution order
    pub outcomes: Vec<StepOutcome>,
}

impl CascadeReport {
    /// Total rows touched across all steps.
    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.outcomes.iter().map(|o| o.rows_affected).sum()
    }

    /// Rows touched by the first step matching `pred`.
    #[must_use]
    pub fn rows_for(&self, pred: impl Fn(&CleanupStep) -> bool) -> u64 {
        self.outcomes
            .iter()
            .find(|o| pred(&o.step))
            .map_or(0, |o| o.rows_affected)
    }
}

/// Ordered list of cleanup steps for one deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePlan {
    steps: Vec<CleanupStep>,
}

impl CascadePlan {
    /// Everything removed when a customer account is deleted.
    #[must_use]
    pub fn for_user(user_id: i64) -> Self {
        Self {
            steps: vec![
                CleanupStep::DeleteOrders { user_id },
                CleanupStep::DeleteAddresses { user_id },
                CleanupStep::DeletePushTokens { user_id },
                CleanupStep::DeleteNotifications { user_id },
                CleanupStep::PullFromReferees { user_id },
                CleanupStep::ClearReferredBy { user_id },
                CleanupStep::DeleteOwnReferral { user_id },
                CleanupStep::DeleteUser { user_id },
            ],
        }
    }

    /// Everything touched when a single ledger row is deleted.
    #[must_use]
    pub fn for_referral(ledger: &referral::Model) -> Self {
        Self {
            steps: vec![
                CleanupStep::DeleteReferral {
                    referral_id: ledger.id,
                },
                CleanupStep::ClearReferredBy {
                    user_id: ledger.user_id,
                },
                CleanupStep::PullFromReferees {
                    user_id: ledger.user_id,
                },
            ],
        }
    }

    /// The steps, in execution order.
    #[must_use]
    pub fn steps(&self) -> &[CleanupStep] {
        &self.steps
    }

    /// Runs every step against `txn`, stopping at the first error.
    ///
    /// `txn` should be an open transaction; committing is the caller's job.
    pub async fn apply<C>(&self, txn: &C) -> Result<CascadeReport>
    where
        C: ConnectionTrait,
    {
        let mut report = CascadeReport::default();
        for step in &self.steps {
            let rows_affected = run_step(txn, *step).await?;
            debug!(%step, rows_affected, "Cascade step applied");
            report.outcomes.push(StepOutcome {
                step: *step,
                rows_affected,
            });
        }
        Ok(report)
    }
}

async fn run_step<C>(txn: &C, step: CleanupStep) -> Result<u64>
where
    C: ConnectionTrait,
{
    let rows = match step {
        CleanupStep::DeleteOrders { user_id } => {
            let order_ids: Vec<i64> = Order::find()
                .select_only()
                .column(order::Column::Id)
                .filter(order::Column::UserId.eq(user_id))
                .into_tuple()
                .all(txn)
                .await?;
            if order_ids.is_empty() {
                0
            } else {
                OrderItem::delete_many()
                    .filter(order_item::Column::OrderId.is_in(order_ids.clone()))
                    .exec(txn)
                    .await?;
                OrderStatusHistory::delete_many()
                    .filter(order_status_history::Column::OrderId.is_in(order_ids))
                    .exec(txn)
                    .await?;
                Order::delete_many()
                    .filter(order::Column::UserId.eq(user_id))
                    .exec(txn)
                    .await?
                    .rows_affected
            }
        }
        CleanupStep::DeleteAddresses { user_id } => {
            Address::delete_many()
                .filter(address::Column::UserId.eq(user_id))
                .exec(txn)
                .await?
                .rows_affected
        }
        CleanupStep::DeletePushTokens { user_id } => {
            FcmToken::delete_many()
                .filter(fcm_token::Column::UserId.eq(user_id))
                .exec(txn)
                .await?
                .rows_affected
        }
        CleanupStep::DeleteNotifications { user_id } => {
            Notification::delete_many()
                .filter(notification::Column::UserId.eq(user_id))
                .exec(txn)
                .await?
                .rows_affected
        }
        CleanupStep::PullFromReferees { user_id } => {
            ReferralReferee::delete_many()
                .filter(referral_referee::Column::UserId.eq(user_id))
                .exec(txn)
                .await?
                .rows_affected
        }
        CleanupStep::ClearReferredBy { user_id } => {
            Referral::update_many()
                .col_expr(
                    referral::Column::ReferredBy,
                    Expr::value(Option::<i64>::None),
                )
                .col_expr(referral::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(referral::Column::ReferredBy.eq(user_id))
                .exec(txn)
                .await?
                .rows_affected
        }
        CleanupStep::DeleteReferral { referral_id } => delete_ledger(txn, referral_id).await?,
        CleanupStep::DeleteOwnReferral { user_id } => {
            match Referral::find()
                .filter(referral::Column::UserId.eq(user_id))
                .one(txn)
                .await?
            {
                Some(ledger) => delete_ledger(txn, ledger.id).await?,
                None => 0,
            }
        }
        CleanupStep::DeleteUser { user_id } => {
            User::delete_by_id(user_id).exec(txn).await?.rows_affected
        }
    };
    Ok(rows)
}

async fn delete_ledger<C>(txn: &C, referral_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    ReferralReferee::delete_many()
        .filter(referral_referee::Column::ReferralId.eq(referral_id))
        .exec(txn)
        .await?;
    Ok(Referral::delete_by_id(referral_id)
        .exec(txn)
        .await?
        .rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[test]
    fn test_user_plan_deletes_children_before_user() {
        let plan = CascadePlan::for_user(5);
        let steps = plan.steps();
        assert_eq!(steps.first(), Some(&CleanupStep::DeleteOrders { user_id: 5 }));
        assert_eq!(steps.last(), Some(&CleanupStep::DeleteUser { user_id: 5 }));

        let position = |target: CleanupStep| steps.iter().position(|s| *s == target);
        assert!(
            position(CleanupStep::DeleteOrders { user_id: 5 })
                < position(CleanupStep::DeleteAddresses { user_id: 5 })
        );
        assert!(
            position(CleanupStep::ClearReferredBy { user_id: 5 })
                < position(CleanupStep::DeleteOwnReferral { user_id: 5 })
        );
    }

    #[test]
    fn test_referral_plan_has_three_steps() {
        let now = Utc::now();
        let ledger = referral::Model {
            id: 3,
            user_id: 9,
            referral_code: "ABCD1234".to_string(),
            referred_by: None,
            total_referrals: 0,
            successful_referrals: 0,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            CascadePlan::for_referral(&ledger).steps(),
            &[
                CleanupStep::DeleteReferral { referral_id: 3 },
                CleanupStep::ClearReferredBy { user_id: 9 },
                CleanupStep::PullFromReferees { user_id: 9 },
            ]
        );
    }

    #[test]
    fn test_report_totals() {
        let report = CascadeReport {
            outcomes: vec![
                StepOutcome {
                    step: CleanupStep::DeleteAddresses { user_id: 1 },
                    rows_affected: 2,
                },
                StepOutcome {
                    step: CleanupStep::DeleteUser { user_id: 1 },
                    rows_affected: 1,
                },
            ],
        };
        assert_eq!(report.total_rows(), 3);
        assert_eq!(
            report.rows_for(|s| matches!(s, CleanupStep::DeleteAddresses { .. })),
            2
        );
    }

    #[tokio::test]
    async fn test_apply_stops_at_first_failed_step() {
        let now = Utc::now();
        let ledger = referral::Model {
            id: 4,
            user_id: 11,
            referral_code: "STOP1234".to_string(),
            referred_by: None,
            total_referrals: 0,
            successful_referrals: 0,
            created_at: now,
            updated_at: now,
        };
        let deleted = || MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        };
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([deleted(), deleted()])
            .append_exec_errors([DbErr::Custom("disk I/O error".to_string())])
            .into_connection();

        let result = CascadePlan::for_referral(&ledger).apply(&db).await;
        assert!(matches!(result, Err(crate::errors::Error::Database(_))));

        // Two deletes for the ledger row, then the failing update; the last step never ran
        assert_eq!(db.into_transaction_log().len(), 3);
    }
}
