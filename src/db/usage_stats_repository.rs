use async_trait::async_trait;
use uuid::Uuid;

use crate::models::usage::UsageStat;

#[async_trait]
pub trait UsageStatsRepository: Send + Sync {
    async fn list_recent_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<UsageStat>, sqlx::Error>;
}
