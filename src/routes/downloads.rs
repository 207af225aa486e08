use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    response::IntoResponse,
    response::Response,
    Json,
};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::models::download::{NewDownload, DOWNLOAD_PLATFORMS};
use crate::responses::JsonResponse;
use crate::routes::auth::session::MaybeAuthSession;
use crate::routes::rfc3339;
use crate::state::AppState;

// POST /api/downloads
pub async fn track_download(
    State(app_state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    MaybeAuthSession(claims): MaybeAuthSession,
    Json(payload): Json<NewDownload>,
) -> Response {
    if !DOWNLOAD_PLATFORMS.contains(&payload.platform.as_str()) {
        return JsonResponse::bad_request("Unknown platform").into_response();
    }
    if payload.version.trim().is_empty() {
        return JsonResponse::bad_request("Version is required").into_response();
    }

    let user_id = claims.and_then(|c| Uuid::parse_str(&c.id).ok());
    let ip = addr.ip().to_string();

    match app_state
        .download_repo
        .insert_download(user_id, &payload.platform, &payload.version, Some(&ip))
        .await
    {
        Ok(download) => JsonResponse::ok(
            "Download tracked successfully",
            json!({
                "id": download.id,
                "platform": download.platform,
                "version": download.version,
                "downloadedAt": rfc3339(download.downloaded_at),
            }),
        )
        .into_response(),
        Err(err) => {
            error!(?err, "failed to track download");
            JsonResponse::server_error("Failed to track download").into_response()
        }
    }
}

// GET /api/downloads/stats
pub async fn download_stats(State(app_state): State<AppState>) -> Response {
    match app_state.download_repo.download_counts_by_platform().await {
        Ok(counts) => {
            let data: Vec<serde_json::Value> = counts
                .iter()
                .map(|c| json!({ "platform": c.platform, "count": c.count }))
                .collect();
            JsonResponse::ok("Download statistics fetched successfully", json!(data))
                .into_response()
        }
        Err(err) => {
            error!(?err, "failed to load download stats");
            JsonResponse::server_error("Failed to load download statistics").into_response()
        }
    }
}
