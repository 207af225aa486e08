use axum::{extract::State, http::HeaderMap, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::json;
use tracing::{error, info, warn};

use crate::db::webhook_event_repository::EventInsert;
use crate::responses::JsonResponse;
use crate::services::billing::{BillingService, WebhookEvent};
use crate::state::AppState;

// POST /api/webhooks/stripe
//
// Signature gate, then the ledger insert (the idempotency gate), then the
// reconciler. A non-2xx response leaves the ledger row unprocessed and
// lets Stripe redeliver on its own schedule; there is no local retry.
pub async fn stripe_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let sig = match headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
    {
        Some(s) => s,
        None => return JsonResponse::bad_request("Missing Stripe-Signature").into_response(),
    };

    let evt = match app_state.stripe.verify_webhook(&body, sig) {
        Ok(e) => e,
        Err(err) => {
            warn!(?err, "stripe webhook verification failed");
            return (StatusCode::BAD_REQUEST, "invalid webhook").into_response();
        }
    };

    match app_state
        .webhook_event_repo
        .insert_event(&evt.id, &evt.r#type, &evt.payload)
        .await
    {
        Ok(EventInsert::Recorded) => {}
        Ok(EventInsert::Duplicate) => {
            info!(
                event_id = %evt.id,
                event_type = %evt.r#type,
                "duplicate stripe event acknowledged without reprocessing"
            );
            return JsonResponse::ok("Webhook processed successfully", json!({ "received": true }))
                .into_response();
        }
        Err(err) => {
            error!(?err, event_id = %evt.id, "failed to record stripe event");
            return JsonResponse::server_error("Failed to record webhook event").into_response();
        }
    }

    let event = match WebhookEvent::classify(&evt) {
        Ok(event) => event,
        Err(err) => {
            error!(?err, event_id = %evt.id, event_type = %evt.r#type, "unparseable stripe event left unprocessed");
            return JsonResponse::server_error("Failed to process webhook event").into_response();
        }
    };

    let billing = BillingService::from_state(&app_state);
    if let Err(err) = billing.apply_event(event).await {
        error!(?err, event_id = %evt.id, event_type = %evt.r#type, "stripe event left unprocessed");
        return JsonResponse::server_error("Failed to process webhook event").into_response();
    }

    if let Err(err) = app_state
        .webhook_event_repo
        .mark_event_processed(&evt.id)
        .await
    {
        // The mutation already landed; failing the delivery would only
        // trigger a redelivery that the duplicate gate ignores. Flag the
        // stuck row for operators instead.
        error!(
            ?err,
            event_id = %evt.id,
            "event applied but ledger row could not be marked processed"
        );
    }

    JsonResponse::ok("Webhook processed successfully", json!({ "received": true })).into_response()
}
