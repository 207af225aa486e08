pub mod download_repository;
pub mod mock_db;
pub mod plan_repository;
pub mod postgres_download_repository;
pub mod postgres_plan_repository;
pub mod postgres_subscription_repository;
pub mod postgres_usage_stats_repository;
pub mod postgres_user_repository;
pub mod postgres_webhook_event_repository;
pub mod subscription_repository;
pub mod usage_stats_repository;
pub mod user_repository;
pub mod webhook_event_repository;
