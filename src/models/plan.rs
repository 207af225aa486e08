use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Catalog entry. Seeded and maintained by an operator tool; read-only to
/// this service.
#[derive(Debug, FromRow, Serialize, Deserialize, Clone)]
pub struct SubscriptionPlan {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i32,
    pub features: Json<Vec<String>>,
    pub is_active: bool,
    pub stripe_price_id: Option<String>,
    pub created_at: time::OffsetDateTime,
}
