use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::usage_stats_repository::UsageStatsRepository;
use crate::models::usage::UsageStat;

pub struct PostgresUsageStatsRepository {
    pub pool: PgPool,
}

#[async_trait]
impl UsageStatsRepository for PostgresUsageStatsRepository {
    async fn list_recent_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<UsageStat>, sqlx::Error> {
        sqlx::query_as::<_, UsageStat>(
            r#"
            SELECT id, user_id, recorded_on, session_duration_minutes,
                   blink_count, posture_alerts, focus_sessions
            FROM usage_stats
            WHERE user_id = $1
            ORDER BY recorded_on DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
