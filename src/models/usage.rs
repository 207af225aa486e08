use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One day of desktop-app telemetry, written by the app's sync endpoint
/// (owned elsewhere) and read back for the dashboard.
#[derive(Debug, FromRow, Serialize, Clone)]
pub struct UsageStat {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recorded_on: time::OffsetDateTime,
    pub session_duration_minutes: Option<i32>,
    pub blink_count: Option<i32>,
    pub posture_alerts: Option<i32>,
    pub focus_sessions: Option<i32>,
}
