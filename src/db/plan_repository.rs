use async_trait::async_trait;
use uuid::Uuid;

use crate::models::plan::SubscriptionPlan;

#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn list_active_plans(&self) -> Result<Vec<SubscriptionPlan>, sqlx::Error>;

    async fn find_plan_by_id(&self, plan_id: Uuid)
        -> Result<Option<SubscriptionPlan>, sqlx::Error>;
}
