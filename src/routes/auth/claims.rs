use serde::{Deserialize, Serialize};

/// Access-token claims issued by the auth service. Only the fields this
/// service consumes are modeled.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Claims {
    pub id: String, // user UUID
    pub email: String,
    pub exp: usize, // expiration (as UNIX timestamp)
}
