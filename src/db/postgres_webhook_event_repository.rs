use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::webhook_event_repository::{EventInsert, WebhookEventRepository};

pub struct PostgresWebhookEventRepository {
    pub pool: PgPool,
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn insert_event(
        &self,
        event_id: &str,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<EventInsert, sqlx::Error> {
        // ON CONFLICT DO NOTHING makes the dedup check and the insert one
        // atomic statement; rows_affected distinguishes the two outcomes.
        let result = sqlx::query(
            r#"
            INSERT INTO stripe_webhook_events (stripe_event_id, event_type, payload)
            VALUES ($1, $2, $3)
            ON CONFLICT (stripe_event_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .bind(payload)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(EventInsert::Duplicate)
        } else {
            Ok(EventInsert::Recorded)
        }
    }

    async fn mark_event_processed(&self, event_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE stripe_webhook_events SET processed = TRUE WHERE stripe_event_id = $1",
        )
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
