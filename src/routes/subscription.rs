use axum::{extract::State, response::IntoResponse, response::Response};
use serde_json::json;
use tracing::error;

use crate::models::subscription::UserSubscription;
use crate::responses::JsonResponse;
use crate::routes::auth::session::AuthSession;
use crate::routes::billing::{billing_error_response, claims_user_id};
use crate::routes::rfc3339;
use crate::services::billing::BillingService;
use crate::state::AppState;

fn subscription_json(sub: &UserSubscription) -> serde_json::Value {
    json!({
        "id": sub.id,
        "status": sub.status,
        "currentPeriodStart": rfc3339(sub.current_period_start),
        "currentPeriodEnd": rfc3339(sub.current_period_end),
        "trialEnd": sub.trial_end.and_then(rfc3339),
        "cancelAtPeriodEnd": sub.cancel_at_period_end,
        "isOnTrial": sub.is_on_trial(),
        "isActive": sub.is_active(),
    })
}

// GET /api/subscription
pub async fn get_subscription(
    State(app_state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Response {
    let user_id = match claims_user_id(&claims) {
        Some(id) => id,
        None => return JsonResponse::unauthorized("Invalid user ID").into_response(),
    };

    match app_state
        .subscription_repo
        .find_latest_for_user(user_id)
        .await
    {
        Ok(None) => JsonResponse::ok("No subscription found", json!({ "hasSubscription": false }))
            .into_response(),
        Ok(Some(sub)) => JsonResponse::ok(
            "Subscription fetched successfully",
            json!({
                "hasSubscription": true,
                "subscription": subscription_json(&sub),
            }),
        )
        .into_response(),
        Err(err) => {
            error!(?err, %user_id, "failed to load subscription");
            JsonResponse::server_error("Failed to load subscription").into_response()
        }
    }
}

// POST /api/subscription/cancel
pub async fn cancel_subscription(
    State(app_state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Response {
    let user_id = match claims_user_id(&claims) {
        Some(id) => id,
        None => return JsonResponse::unauthorized("Invalid user ID").into_response(),
    };

    let billing = BillingService::from_state(&app_state);
    match billing.cancel_subscription(user_id).await {
        Ok(sub) => JsonResponse::ok(
            "Subscription will cancel at period end",
            json!({ "cancelAtPeriodEnd": sub.cancel_at_period_end }),
        )
        .into_response(),
        Err(err) => billing_error_response(err),
    }
}

// POST /api/subscription/reactivate
pub async fn reactivate_subscription(
    State(app_state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Response {
    let user_id = match claims_user_id(&claims) {
        Some(id) => id,
        None => return JsonResponse::unauthorized("Invalid user ID").into_response(),
    };

    let billing = BillingService::from_state(&app_state);
    match billing.reactivate_subscription(user_id).await {
        Ok(sub) => JsonResponse::ok(
            "Subscription reactivated",
            json!({ "cancelAtPeriodEnd": sub.cancel_at_period_end }),
        )
        .into_response(),
        Err(err) => billing_error_response(err),
    }
}
