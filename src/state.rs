use std::sync::Arc;

use crate::config::Config;
use crate::db::download_repository::DownloadRepository;
use crate::db::plan_repository::PlanRepository;
use crate::db::subscription_repository::SubscriptionRepository;
use crate::db::usage_stats_repository::UsageStatsRepository;
use crate::db::user_repository::UserRepository;
use crate::db::webhook_event_repository::WebhookEventRepository;
use crate::services::stripe::StripeService;
use crate::utils::jwt::JwtKeys;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn UserRepository>,
    pub plan_repo: Arc<dyn PlanRepository>,
    pub subscription_repo: Arc<dyn SubscriptionRepository>,
    pub webhook_event_repo: Arc<dyn WebhookEventRepository>,
    pub download_repo: Arc<dyn DownloadRepository>,
    pub usage_repo: Arc<dyn UsageStatsRepository>,
    pub stripe: Arc<dyn StripeService>,
    pub config: Arc<Config>,
    pub jwt_keys: Arc<JwtKeys>,
}
