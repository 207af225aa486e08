use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::download_repository::DownloadRepository;
use crate::models::download::{Download, PlatformDownloadCount};

pub struct PostgresDownloadRepository {
    pub pool: PgPool,
}

#[async_trait]
impl DownloadRepository for PostgresDownloadRepository {
    async fn insert_download(
        &self,
        user_id: Option<Uuid>,
        platform: &str,
        version: &str,
        ip_address: Option<&str>,
    ) -> Result<Download, sqlx::Error> {
        sqlx::query_as::<_, Download>(
            r#"
            INSERT INTO downloads (user_id, platform, version, ip_address)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, platform, version, ip_address, downloaded_at
            "#,
        )
        .bind(user_id)
        .bind(platform)
        .bind(version)
        .bind(ip_address)
        .fetch_one(&self.pool)
        .await
    }

    async fn download_counts_by_platform(
        &self,
    ) -> Result<Vec<PlatformDownloadCount>, sqlx::Error> {
        sqlx::query_as::<_, PlatformDownloadCount>(
            r#"
            SELECT platform, COUNT(*) AS count
            FROM downloads
            GROUP BY platform
            ORDER BY count DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
