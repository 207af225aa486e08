use async_trait::async_trait;

/// Outcome of recording a webhook delivery in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventInsert {
    Recorded,
    /// The event id was already in the ledger; the delivery must be
    /// acknowledged without reprocessing.
    Duplicate,
}

#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Append-only insert keyed by the Stripe event id. The uniqueness
    /// constraint on that id is the idempotency gate.
    async fn insert_event(
        &self,
        event_id: &str,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<EventInsert, sqlx::Error>;

    async fn mark_event_processed(&self, event_id: &str) -> Result<(), sqlx::Error>;
}
