use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::download_repository::DownloadRepository;
use crate::db::plan_repository::PlanRepository;
use crate::db::subscription_repository::{
    NewUserSubscription, SubscriptionRepository, SubscriptionWrite,
};
use crate::db::usage_stats_repository::UsageStatsRepository;
use crate::db::user_repository::UserRepository;
use crate::db::webhook_event_repository::{EventInsert, WebhookEventRepository};
use crate::models::download::{Download, PlatformDownloadCount};
use crate::models::plan::SubscriptionPlan;
use crate::models::subscription::UserSubscription;
use crate::models::usage::UsageStat;
use crate::models::user::User;

/// In-memory user repository for tests. Seed `find_user_result`; the
/// stripe customer id lives in its own slot so the lazy-create flow can
/// be observed.
#[derive(Default)]
pub struct MockDb {
    pub find_user_result: Option<User>,
    pub should_fail: bool,
    pub stripe_customer_id: Mutex<Option<String>>,
    pub set_customer_calls: Mutex<usize>,
}

#[async_trait]
impl UserRepository for MockDb {
    async fn find_user_by_id(&self, _: Uuid) -> Result<Option<User>, sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::Protocol("Mock DB failure".into()));
        }
        Ok(self.find_user_result.clone().map(|mut user| {
            if let Some(customer_id) = self.stripe_customer_id.lock().unwrap().clone() {
                user.stripe_customer_id = Some(customer_id);
            }
            user
        }))
    }

    async fn set_user_stripe_customer_id(
        &self,
        _: Uuid,
        customer_id: &str,
    ) -> Result<(), sqlx::Error> {
        *self.set_customer_calls.lock().unwrap() += 1;
        *self.stripe_customer_id.lock().unwrap() = Some(customer_id.to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockPlanRepository {
    pub plans: Arc<Mutex<Vec<SubscriptionPlan>>>,
}

#[async_trait]
impl PlanRepository for MockPlanRepository {
    async fn list_active_plans(&self) -> Result<Vec<SubscriptionPlan>, sqlx::Error> {
        Ok(self
            .plans
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    async fn find_plan_by_id(
        &self,
        plan_id: Uuid,
    ) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
        Ok(self
            .plans
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == plan_id)
            .cloned())
    }
}

#[derive(Clone, Default)]
pub struct MockSubscriptionRepository {
    pub rows: Arc<Mutex<Vec<UserSubscription>>>,
    pub inserts: Arc<Mutex<usize>>,
    pub updates: Arc<Mutex<usize>>,
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.stripe_subscription_id.as_deref() == Some(stripe_subscription_id))
            .cloned())
    }

    async fn find_latest_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.user_id == user_id)
            .max_by_key(|row| row.created_at)
            .cloned())
    }

    async fn insert_subscription(
        &self,
        new: &NewUserSubscription,
    ) -> Result<UserSubscription, sqlx::Error> {
        let now = OffsetDateTime::now_utc();
        let row = UserSubscription {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            plan_id: new.plan_id,
            stripe_subscription_id: Some(new.stripe_subscription_id.clone()),
            status: new.write.status,
            current_period_start: new.write.current_period_start,
            current_period_end: new.write.current_period_end,
            trial_end: new.write.trial_end,
            cancel_at_period_end: new.write.cancel_at_period_end,
            created_at: now,
            updated_at: now,
        };
        *self.inserts.lock().unwrap() += 1;
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update_subscription(
        &self,
        id: Uuid,
        write: &SubscriptionWrite,
    ) -> Result<UserSubscription, sqlx::Error> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(sqlx::Error::RowNotFound)?;
        row.status = write.status;
        row.current_period_start = write.current_period_start;
        row.current_period_end = write.current_period_end;
        row.trial_end = write.trial_end;
        row.cancel_at_period_end = write.cancel_at_period_end;
        row.updated_at = OffsetDateTime::now_utc();
        *self.updates.lock().unwrap() += 1;
        Ok(row.clone())
    }
}

#[derive(Clone, Default)]
pub struct MockWebhookEventRepository {
    events: Arc<Mutex<HashSet<String>>>,
    pub inserts: Arc<Mutex<usize>>,
    pub processed: Arc<Mutex<Vec<String>>>,
}

impl MockWebhookEventRepository {
    pub fn seed_event(&self, event_id: &str) {
        self.events.lock().unwrap().insert(event_id.to_string());
    }

    pub fn recorded_events(&self) -> Vec<String> {
        self.events.lock().unwrap().iter().cloned().collect()
    }
}

#[async_trait]
impl WebhookEventRepository for MockWebhookEventRepository {
    async fn insert_event(
        &self,
        event_id: &str,
        _event_type: &str,
        _payload: &serde_json::Value,
    ) -> Result<EventInsert, sqlx::Error> {
        *self.inserts.lock().unwrap() += 1;
        if self.events.lock().unwrap().insert(event_id.to_string()) {
            Ok(EventInsert::Recorded)
        } else {
            Ok(EventInsert::Duplicate)
        }
    }

    async fn mark_event_processed(&self, event_id: &str) -> Result<(), sqlx::Error> {
        self.processed.lock().unwrap().push(event_id.to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockDownloadRepository {
    pub downloads: Arc<Mutex<Vec<Download>>>,
}

#[async_trait]
impl DownloadRepository for MockDownloadRepository {
    async fn insert_download(
        &self,
        user_id: Option<Uuid>,
        platform: &str,
        version: &str,
        ip_address: Option<&str>,
    ) -> Result<Download, sqlx::Error> {
        let download = Download {
            id: Uuid::new_v4(),
            user_id,
            platform: platform.to_string(),
            version: version.to_string(),
            ip_address: ip_address.map(|s| s.to_string()),
            downloaded_at: OffsetDateTime::now_utc(),
        };
        self.downloads.lock().unwrap().push(download.clone());
        Ok(download)
    }

    async fn download_counts_by_platform(
        &self,
    ) -> Result<Vec<PlatformDownloadCount>, sqlx::Error> {
        let downloads = self.downloads.lock().unwrap();
        let mut counts: Vec<PlatformDownloadCount> = Vec::new();
        for download in downloads.iter() {
            match counts.iter_mut().find(|c| c.platform == download.platform) {
                Some(entry) => entry.count += 1,
                None => counts.push(PlatformDownloadCount {
                    platform: download.platform.clone(),
                    count: 1,
                }),
            }
        }
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(counts)
    }
}

#[derive(Clone, Default)]
pub struct MockUsageStatsRepository {
    pub stats: Arc<Mutex<Vec<UsageStat>>>,
}

#[async_trait]
impl UsageStatsRepository for MockUsageStatsRepository {
    async fn list_recent_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<UsageStat>, sqlx::Error> {
        let mut rows: Vec<UsageStat> = self
            .stats
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| std::cmp::Reverse(s.recorded_on));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}
