use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The slice of the auth service's user record this service reads.
/// `stripe_customer_id` is the one column it writes, lazily, the first
/// time a checkout session is requested.
#[derive(Debug, FromRow, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: uuid::Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub stripe_customer_id: Option<String>,
    pub created_at: time::OffsetDateTime,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
