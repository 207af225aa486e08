use axum::{extract::State, response::IntoResponse, response::Response, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::responses::JsonResponse;
use crate::routes::auth::session::AuthSession;
use crate::services::billing::{BillingError, BillingService};
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutPayload {
    #[serde(default)]
    pub plan_id: Option<Uuid>,
}

pub(crate) fn billing_error_response(err: BillingError) -> Response {
    match &err {
        BillingError::UserNotFound(_) => JsonResponse::not_found("User not found").into_response(),
        BillingError::PlanNotFound(_) | BillingError::PlanNotProvisioned(_) => {
            JsonResponse::not_found("Plan not found or not configured with Stripe").into_response()
        }
        BillingError::NoStripeCustomer(_) => {
            JsonResponse::not_found("No billing account on record").into_response()
        }
        BillingError::SubscriptionNotFound(_) => {
            JsonResponse::not_found("No subscription on record").into_response()
        }
        BillingError::Stripe(_) => {
            error!(?err, "stripe call failed");
            JsonResponse::bad_gateway("Payment provider request failed").into_response()
        }
        _ => {
            error!(?err, "billing operation failed");
            JsonResponse::server_error("Billing operation failed").into_response()
        }
    }
}

pub(crate) fn claims_user_id(claims: &crate::routes::auth::claims::Claims) -> Option<Uuid> {
    Uuid::parse_str(&claims.id).ok()
}

// POST /api/billing/checkout
pub async fn create_checkout_session(
    State(app_state): State<AppState>,
    AuthSession(claims): AuthSession,
    Json(payload): Json<CreateCheckoutPayload>,
) -> Response {
    let user_id = match claims_user_id(&claims) {
        Some(id) => id,
        None => return JsonResponse::unauthorized("Invalid user ID").into_response(),
    };
    let plan_id = match payload.plan_id {
        Some(id) => id,
        None => return JsonResponse::bad_request("Plan ID is required").into_response(),
    };

    let base = app_state.config.frontend_origin.trim_end_matches('/');
    let success_url = format!("{base}/dashboard?success=true");
    let cancel_url = format!("{base}/pricing?canceled=true");

    let billing = BillingService::from_state(&app_state);
    match billing
        .create_checkout_session(user_id, plan_id, &success_url, &cancel_url)
        .await
    {
        Ok(session) => JsonResponse::ok(
            "Checkout session created successfully",
            json!({ "sessionId": session.id, "url": session.url }),
        )
        .into_response(),
        Err(err) => billing_error_response(err),
    }
}

// POST /api/billing/portal
pub async fn create_portal_session(
    State(app_state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Response {
    let user_id = match claims_user_id(&claims) {
        Some(id) => id,
        None => return JsonResponse::unauthorized("Invalid user ID").into_response(),
    };

    let base = app_state.config.frontend_origin.trim_end_matches('/');
    let return_url = format!("{base}/dashboard");

    let billing = BillingService::from_state(&app_state);
    match billing.create_portal_session(user_id, &return_url).await {
        Ok(url) => JsonResponse::ok("Portal session created successfully", json!({ "url": url }))
            .into_response(),
        Err(err) => billing_error_response(err),
    }
}
