use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::subscription::{SubscriptionStatus, UserSubscription};

/// Fields the reconciler derives from a Stripe subscription object. The
/// same set is written on insert and on update so both paths stay in sync.
#[derive(Debug, Clone)]
pub struct SubscriptionWrite {
    pub status: SubscriptionStatus,
    pub current_period_start: OffsetDateTime,
    pub current_period_end: OffsetDateTime,
    pub trial_end: Option<OffsetDateTime>,
    pub cancel_at_period_end: bool,
}

#[derive(Debug, Clone)]
pub struct NewUserSubscription {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub stripe_subscription_id: String,
    pub write: SubscriptionWrite,
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn find_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<UserSubscription>, sqlx::Error>;

    /// Most recently created row for the user, regardless of status.
    async fn find_latest_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserSubscription>, sqlx::Error>;

    async fn insert_subscription(
        &self,
        new: &NewUserSubscription,
    ) -> Result<UserSubscription, sqlx::Error>;

    /// Updates the derived fields in place; row identity and `created_at`
    /// are untouched.
    async fn update_subscription(
        &self,
        id: Uuid,
        write: &SubscriptionWrite,
    ) -> Result<UserSubscription, sqlx::Error>;
}
