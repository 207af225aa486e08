use async_trait::async_trait;
use uuid::Uuid;

use crate::models::download::{Download, PlatformDownloadCount};

#[async_trait]
pub trait DownloadRepository: Send + Sync {
    async fn insert_download(
        &self,
        user_id: Option<Uuid>,
        platform: &str,
        version: &str,
        ip_address: Option<&str>,
    ) -> Result<Download, sqlx::Error>;

    async fn download_counts_by_platform(
        &self,
    ) -> Result<Vec<PlatformDownloadCount>, sqlx::Error>;
}
