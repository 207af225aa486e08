use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DOWNLOAD_PLATFORMS: &[&str] = &["mac", "windows", "linux"];

#[derive(Debug, FromRow, Serialize, Clone)]
pub struct Download {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub platform: String,
    pub version: String,
    pub ip_address: Option<String>,
    pub downloaded_at: time::OffsetDateTime,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewDownload {
    pub platform: String,
    pub version: String,
}

#[derive(Debug, FromRow, Serialize, Clone)]
pub struct PlatformDownloadCount {
    pub platform: String,
    pub count: i64,
}
