use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::plan_repository::PlanRepository;
use crate::models::plan::SubscriptionPlan;

const PLAN_COLUMNS: &str =
    "id, name, price_cents, features, is_active, stripe_price_id, created_at";

pub struct PostgresPlanRepository {
    pub pool: PgPool,
}

#[async_trait]
impl PlanRepository for PostgresPlanRepository {
    async fn list_active_plans(&self) -> Result<Vec<SubscriptionPlan>, sqlx::Error> {
        sqlx::query_as::<_, SubscriptionPlan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE is_active ORDER BY price_cents"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn find_plan_by_id(
        &self,
        plan_id: Uuid,
    ) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
        sqlx::query_as::<_, SubscriptionPlan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE id = $1"
        ))
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
    }
}
