use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::subscription_repository::{
    NewUserSubscription, SubscriptionRepository, SubscriptionWrite,
};
use crate::models::subscription::UserSubscription;

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan_id, stripe_subscription_id, status, \
     current_period_start, current_period_end, trial_end, cancel_at_period_end, \
     created_at, updated_at";

pub struct PostgresSubscriptionRepository {
    pub pool: PgPool,
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM user_subscriptions WHERE stripe_subscription_id = $1"
        ))
        .bind(stripe_subscription_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_latest_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM user_subscriptions \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert_subscription(
        &self,
        new: &NewUserSubscription,
    ) -> Result<UserSubscription, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(&format!(
            r#"
            INSERT INTO user_subscriptions
                (user_id, plan_id, stripe_subscription_id, status,
                 current_period_start, current_period_end, trial_end, cancel_at_period_end)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.plan_id)
        .bind(&new.stripe_subscription_id)
        .bind(new.write.status)
        .bind(new.write.current_period_start)
        .bind(new.write.current_period_end)
        .bind(new.write.trial_end)
        .bind(new.write.cancel_at_period_end)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_subscription(
        &self,
        id: Uuid,
        write: &SubscriptionWrite,
    ) -> Result<UserSubscription, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(&format!(
            r#"
            UPDATE user_subscriptions
            SET status = $2,
                current_period_start = $3,
                current_period_end = $4,
                trial_end = $5,
                cancel_at_period_end = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(write.status)
        .bind(write.current_period_start)
        .bind(write.current_period_end)
        .bind(write.trial_end)
        .bind(write.cancel_at_period_end)
        .fetch_one(&self.pool)
        .await
    }
}
