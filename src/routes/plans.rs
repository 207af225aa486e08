use axum::{extract::State, response::IntoResponse, response::Response};
use serde_json::json;
use tracing::error;

use crate::responses::JsonResponse;
use crate::state::AppState;

// GET /api/subscription-plans
pub async fn list_subscription_plans(State(app_state): State<AppState>) -> Response {
    match app_state.plan_repo.list_active_plans().await {
        Ok(plans) => {
            let data: Vec<serde_json::Value> = plans
                .iter()
                .map(|plan| {
                    json!({
                        "id": plan.id,
                        "name": plan.name,
                        "price": plan.price_cents,
                        "features": plan.features.0,
                        "isActive": plan.is_active,
                    })
                })
                .collect();
            JsonResponse::ok("Subscription plans fetched successfully", json!(data))
                .into_response()
        }
        Err(err) => {
            error!(?err, "failed to load subscription plans");
            JsonResponse::server_error("Failed to load subscription plans").into_response()
        }
    }
}
