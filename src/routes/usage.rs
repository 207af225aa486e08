use axum::{extract::State, response::IntoResponse, response::Response};
use serde_json::json;
use tracing::error;

use crate::responses::JsonResponse;
use crate::routes::auth::session::AuthSession;
use crate::routes::billing::claims_user_id;
use crate::routes::rfc3339;
use crate::state::AppState;

const DEFAULT_USAGE_WINDOW: i64 = 30;

// GET /api/usage-stats
pub async fn usage_stats(
    State(app_state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Response {
    let user_id = match claims_user_id(&claims) {
        Some(id) => id,
        None => return JsonResponse::unauthorized("Invalid user ID").into_response(),
    };

    match app_state
        .usage_repo
        .list_recent_for_user(user_id, DEFAULT_USAGE_WINDOW)
        .await
    {
        Ok(stats) => {
            let data: Vec<serde_json::Value> = stats
                .iter()
                .map(|s| {
                    json!({
                        "id": s.id,
                        "recordedOn": rfc3339(s.recorded_on),
                        "sessionDurationMinutes": s.session_duration_minutes,
                        "blinkCount": s.blink_count,
                        "postureAlerts": s.posture_alerts,
                        "focusSessions": s.focus_sessions,
                    })
                })
                .collect();
            JsonResponse::ok("Usage statistics fetched successfully", json!(data)).into_response()
        }
        Err(err) => {
            error!(?err, %user_id, "failed to load usage stats");
            JsonResponse::server_error("Failed to load usage statistics").into_response()
        }
    }
}
