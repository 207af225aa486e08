//! Subscription reconciliation against Stripe.
//!
//! Webhook events and checkout/portal actions flow through here. The local
//! `user_subscriptions` table is a mirror of Stripe's subscription objects;
//! every mutation is derived from a provider subscription object so there is
//! a single source of truth, and the invoice events re-fetch that object
//! rather than reconciling invoice payloads separately.

use std::collections::BTreeMap;
use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::plan_repository::PlanRepository;
use crate::db::subscription_repository::{
    NewUserSubscription, SubscriptionRepository, SubscriptionWrite,
};
use crate::db::user_repository::UserRepository;
use crate::models::subscription::{SubscriptionStatus, UserSubscription};
use crate::models::user::User;
use crate::services::stripe::{
    CheckoutLineItem, CheckoutMode, CheckoutSession, CreateCheckoutSessionRequest, StripeEvent,
    StripeService, StripeServiceError, SubscriptionObject,
};
use crate::state::AppState;

/// Trial length granted on every checkout session.
pub const CHECKOUT_TRIAL_DAYS: u32 = 14;

const METADATA_USER_ID: &str = "user_id";
const METADATA_PLAN_ID: &str = "plan_id";

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("user {0} not found")]
    UserNotFound(Uuid),
    #[error("plan {0} not found")]
    PlanNotFound(Uuid),
    #[error("plan {0} has no Stripe price configured")]
    PlanNotProvisioned(Uuid),
    #[error("user {0} has no Stripe customer")]
    NoStripeCustomer(Uuid),
    #[error("no subscription on record for user {0}")]
    SubscriptionNotFound(Uuid),
    #[error("subscription {subscription_id} metadata is missing {field}")]
    MissingMetadata {
        subscription_id: String,
        field: &'static str,
    },
    #[error("subscription {subscription_id} metadata field {field} is not a UUID")]
    MalformedMetadata {
        subscription_id: String,
        field: &'static str,
    },
    #[error("subscription {subscription_id} carries unhandled status {status:?}")]
    InvalidStatus {
        subscription_id: String,
        status: String,
    },
    #[error("malformed {event_type} payload: {message}")]
    Payload {
        event_type: String,
        message: String,
    },
    #[error("stripe: {0}")]
    Stripe(#[from] StripeServiceError),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

/// The webhook event types the reconciler acts on, plus an explicit
/// `Ignored` variant so dispatch stays exhaustively matched.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    SubscriptionCreated(SubscriptionObject),
    SubscriptionUpdated(SubscriptionObject),
    SubscriptionDeleted(SubscriptionObject),
    InvoicePaymentSucceeded { subscription_id: Option<String> },
    InvoicePaymentFailed { subscription_id: Option<String> },
    Ignored(String),
}

impl WebhookEvent {
    pub fn classify(event: &StripeEvent) -> Result<Self, BillingError> {
        let object = event
            .payload
            .get("data")
            .and_then(|data| data.get("object"))
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        match event.r#type.as_str() {
            "customer.subscription.created" => Ok(WebhookEvent::SubscriptionCreated(
                parse_subscription(&event.r#type, object)?,
            )),
            "customer.subscription.updated" => Ok(WebhookEvent::SubscriptionUpdated(
                parse_subscription(&event.r#type, object)?,
            )),
            "customer.subscription.deleted" => Ok(WebhookEvent::SubscriptionDeleted(
                parse_subscription(&event.r#type, object)?,
            )),
            "invoice.payment_succeeded" => Ok(WebhookEvent::InvoicePaymentSucceeded {
                subscription_id: invoice_subscription_id(&object),
            }),
            "invoice.payment_failed" => Ok(WebhookEvent::InvoicePaymentFailed {
                subscription_id: invoice_subscription_id(&object),
            }),
            _ => Ok(WebhookEvent::Ignored(event.r#type.clone())),
        }
    }
}

fn parse_subscription(
    event_type: &str,
    object: serde_json::Value,
) -> Result<SubscriptionObject, BillingError> {
    serde_json::from_value(object).map_err(|e| BillingError::Payload {
        event_type: event_type.to_string(),
        message: e.to_string(),
    })
}

/// `invoice.subscription` arrives as either a plain id or an expanded
/// object; an invoice without one references nothing to reconcile.
fn invoice_subscription_id(object: &serde_json::Value) -> Option<String> {
    match object.get("subscription") {
        Some(serde_json::Value::String(id)) => Some(id.clone()),
        Some(serde_json::Value::Object(map)) => map
            .get("id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        _ => None,
    }
}

/// Unix-seconds to `OffsetDateTime`. Absent values pass through quietly;
/// a value that is present but unconvertible is logged so upstream data
/// problems stay visible instead of disappearing into the fallback.
fn convert_timestamp(
    subscription_id: &str,
    field: &'static str,
    value: Option<i64>,
) -> Option<OffsetDateTime> {
    let value = value?;
    if value <= 0 {
        warn!(
            subscription_id,
            field, value, "malformed Stripe timestamp, falling back"
        );
        return None;
    }
    match OffsetDateTime::from_unix_timestamp(value) {
        Ok(dt) => Some(dt),
        Err(_) => {
            warn!(
                subscription_id,
                field, value, "malformed Stripe timestamp, falling back"
            );
            None
        }
    }
}

fn metadata_uuid(sub: &SubscriptionObject, field: &'static str) -> Result<Uuid, BillingError> {
    let raw = sub
        .metadata
        .get(field)
        .ok_or(BillingError::MissingMetadata {
            subscription_id: sub.id.clone(),
            field,
        })?;
    Uuid::parse_str(raw).map_err(|_| BillingError::MalformedMetadata {
        subscription_id: sub.id.clone(),
        field,
    })
}

pub struct BillingService {
    db: Arc<dyn UserRepository>,
    plan_repo: Arc<dyn PlanRepository>,
    subscription_repo: Arc<dyn SubscriptionRepository>,
    stripe: Arc<dyn StripeService>,
}

impl BillingService {
    pub fn new(
        db: Arc<dyn UserRepository>,
        plan_repo: Arc<dyn PlanRepository>,
        subscription_repo: Arc<dyn SubscriptionRepository>,
        stripe: Arc<dyn StripeService>,
    ) -> Self {
        Self {
            db,
            plan_repo,
            subscription_repo,
            stripe,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.db.clone(),
            state.plan_repo.clone(),
            state.subscription_repo.clone(),
            state.stripe.clone(),
        )
    }

    /// Apply one classified webhook event. Errors propagate to the webhook
    /// route, which leaves the ledger row unprocessed so Stripe redelivers.
    pub async fn apply_event(&self, event: WebhookEvent) -> Result<(), BillingError> {
        match event {
            WebhookEvent::SubscriptionCreated(sub)
            | WebhookEvent::SubscriptionUpdated(sub)
            | WebhookEvent::SubscriptionDeleted(sub) => {
                self.upsert_subscription(&sub).await?;
            }
            WebhookEvent::InvoicePaymentSucceeded { subscription_id }
            | WebhookEvent::InvoicePaymentFailed { subscription_id } => {
                match subscription_id {
                    Some(id) => {
                        let sub = self.stripe.get_subscription(&id).await?;
                        self.upsert_subscription(&sub).await?;
                    }
                    None => {
                        info!("invoice event without subscription reference; nothing to reconcile");
                    }
                }
            }
            WebhookEvent::Ignored(event_type) => {
                info!(event_type, "unhandled stripe event acknowledged");
            }
        }
        Ok(())
    }

    /// Create-or-update the local mirror row for a provider subscription
    /// object. Exactly one row per stripe subscription id.
    pub async fn upsert_subscription(
        &self,
        sub: &SubscriptionObject,
    ) -> Result<UserSubscription, BillingError> {
        let user_id = metadata_uuid(sub, METADATA_USER_ID)?;
        let plan_id = metadata_uuid(sub, METADATA_PLAN_ID)?;
        let status =
            SubscriptionStatus::parse(&sub.status).ok_or_else(|| BillingError::InvalidStatus {
                subscription_id: sub.id.clone(),
                status: sub.status.clone(),
            })?;

        let now = OffsetDateTime::now_utc();
        let trial_end = convert_timestamp(&sub.id, "trial_end", sub.trial_end);
        let period_start =
            convert_timestamp(&sub.id, "current_period_start", sub.current_period_start)
                .unwrap_or(now);
        // Trials often carry no period end yet; the trial end is the best
        // stand-in, and "now" keeps the window well-defined as a last resort.
        let period_end = convert_timestamp(&sub.id, "current_period_end", sub.current_period_end)
            .or(if status == SubscriptionStatus::Trialing {
                trial_end
            } else {
                None
            })
            .unwrap_or(now);

        let write = SubscriptionWrite {
            status,
            current_period_start: period_start,
            current_period_end: period_end,
            trial_end,
            cancel_at_period_end: sub.cancel_at_period_end,
        };

        let stored = match self
            .subscription_repo
            .find_by_stripe_subscription_id(&sub.id)
            .await?
        {
            Some(existing) => {
                info!(
                    subscription_id = %sub.id,
                    row_id = %existing.id,
                    status = %status,
                    "updating existing subscription"
                );
                self.subscription_repo
                    .update_subscription(existing.id, &write)
                    .await?
            }
            None => {
                info!(
                    subscription_id = %sub.id,
                    %user_id,
                    %plan_id,
                    status = %status,
                    "creating subscription"
                );
                self.subscription_repo
                    .insert_subscription(&NewUserSubscription {
                        user_id,
                        plan_id,
                        stripe_subscription_id: sub.id.clone(),
                        write,
                    })
                    .await?
            }
        };

        Ok(stored)
    }

    pub async fn create_checkout_session(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, BillingError> {
        let user = self
            .db
            .find_user_by_id(user_id)
            .await?
            .ok_or(BillingError::UserNotFound(user_id))?;
        let plan = self
            .plan_repo
            .find_plan_by_id(plan_id)
            .await?
            .ok_or(BillingError::PlanNotFound(plan_id))?;
        let price_id = plan
            .stripe_price_id
            .clone()
            .ok_or(BillingError::PlanNotProvisioned(plan_id))?;

        let customer_id = self.get_or_create_customer(&user).await?;

        let metadata: BTreeMap<String, String> = [
            (METADATA_USER_ID.to_string(), user_id.to_string()),
            (METADATA_PLAN_ID.to_string(), plan_id.to_string()),
        ]
        .into_iter()
        .collect();

        let session = self
            .stripe
            .create_checkout_session(CreateCheckoutSessionRequest {
                success_url: success_url.to_string(),
                cancel_url: cancel_url.to_string(),
                mode: CheckoutMode::Subscription,
                line_items: vec![CheckoutLineItem {
                    price: price_id,
                    quantity: 1,
                }],
                client_reference_id: Some(user_id.to_string()),
                customer: Some(customer_id),
                metadata: Some(metadata.clone()),
                trial_period_days: Some(CHECKOUT_TRIAL_DAYS),
                subscription_metadata: Some(metadata),
            })
            .await?;

        info!(%user_id, %plan_id, session_id = %session.id, "created checkout session");
        Ok(session)
    }

    pub async fn create_portal_session(
        &self,
        user_id: Uuid,
        return_url: &str,
    ) -> Result<String, BillingError> {
        let user = self
            .db
            .find_user_by_id(user_id)
            .await?
            .ok_or(BillingError::UserNotFound(user_id))?;
        let customer_id = user
            .stripe_customer_id
            .ok_or(BillingError::NoStripeCustomer(user_id))?;

        let url = self
            .stripe
            .create_portal_session(&customer_id, return_url)
            .await?;
        Ok(url)
    }

    /// Flag the user's subscription to end at period close. The local row
    /// is not touched; the resulting `customer.subscription.updated`
    /// webhook is what mutates the mirror.
    pub async fn cancel_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<SubscriptionObject, BillingError> {
        let subscription_id = self.current_stripe_subscription_id(user_id).await?;
        let sub = self
            .stripe
            .set_subscription_cancel_at_period_end(&subscription_id, true)
            .await?;
        info!(%user_id, subscription_id, "subscription flagged to cancel at period end");
        Ok(sub)
    }

    pub async fn reactivate_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<SubscriptionObject, BillingError> {
        let subscription_id = self.current_stripe_subscription_id(user_id).await?;
        let sub = self
            .stripe
            .set_subscription_cancel_at_period_end(&subscription_id, false)
            .await?;
        info!(%user_id, subscription_id, "subscription reactivated");
        Ok(sub)
    }

    async fn current_stripe_subscription_id(&self, user_id: Uuid) -> Result<String, BillingError> {
        self.subscription_repo
            .find_latest_for_user(user_id)
            .await?
            .and_then(|row| row.stripe_subscription_id)
            .ok_or(BillingError::SubscriptionNotFound(user_id))
    }

    async fn get_or_create_customer(&self, user: &User) -> Result<String, BillingError> {
        if let Some(customer_id) = &user.stripe_customer_id {
            return Ok(customer_id.clone());
        }
        let customer_id = self
            .stripe
            .create_customer(&user.email, Some(&user.full_name()))
            .await?;
        self.db
            .set_user_stripe_customer_id(user.id, &customer_id)
            .await?;
        info!(user_id = %user.id, customer_id, "created stripe customer");
        Ok(customer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock_db::{MockDb, MockPlanRepository, MockSubscriptionRepository};
    use crate::services::stripe::MockStripeService;
    use sqlx::types::Json;
    use time::Duration;

    fn service(
        db: Arc<MockDb>,
        plans: MockPlanRepository,
        subs: MockSubscriptionRepository,
        stripe: Arc<MockStripeService>,
    ) -> BillingService {
        BillingService::new(db, Arc::new(plans), Arc::new(subs), stripe)
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "owner@example.com".into(),
            first_name: "Robin".into(),
            last_name: "Hale".into(),
            stripe_customer_id: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn test_plan(stripe_price_id: Option<&str>) -> crate::models::plan::SubscriptionPlan {
        crate::models::plan::SubscriptionPlan {
            id: Uuid::new_v4(),
            name: "Pro".into(),
            price_cents: 499,
            features: Json(vec!["Unlimited history".into(), "Posture alerts".into()]),
            is_active: true,
            stripe_price_id: stripe_price_id.map(|s| s.to_string()),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn subscription_object(
        id: &str,
        status: &str,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> SubscriptionObject {
        SubscriptionObject {
            id: id.into(),
            status: status.into(),
            current_period_start: Some(OffsetDateTime::now_utc().unix_timestamp()),
            current_period_end: Some((OffsetDateTime::now_utc() + Duration::days(30)).unix_timestamp()),
            trial_end: None,
            cancel_at_period_end: false,
            metadata: [
                ("user_id".to_string(), user_id.to_string()),
                ("plan_id".to_string(), plan_id.to_string()),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[tokio::test]
    async fn upsert_creates_row_with_converted_fields() {
        let subs = MockSubscriptionRepository::default();
        let billing = service(
            Arc::new(MockDb::default()),
            MockPlanRepository::default(),
            subs.clone(),
            Arc::new(MockStripeService::new()),
        );

        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let mut sub = subscription_object("sub_new", "trialing", user_id, plan_id);
        let trial_end = (OffsetDateTime::now_utc() + Duration::days(14)).unix_timestamp();
        sub.trial_end = Some(trial_end);

        let stored = billing.upsert_subscription(&sub).await.unwrap();
        assert_eq!(stored.user_id, user_id);
        assert_eq!(stored.plan_id, plan_id);
        assert_eq!(stored.status, SubscriptionStatus::Trialing);
        assert_eq!(stored.trial_end.unwrap().unix_timestamp(), trial_end);
        assert_eq!(*subs.inserts.lock().unwrap(), 1);
        assert!(stored.is_on_trial());
    }

    #[tokio::test]
    async fn upsert_updates_existing_row_in_place() {
        let subs = MockSubscriptionRepository::default();
        let billing = service(
            Arc::new(MockDb::default()),
            MockPlanRepository::default(),
            subs.clone(),
            Arc::new(MockStripeService::new()),
        );

        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let mut sub = subscription_object("sub_conv", "trialing", user_id, plan_id);
        sub.current_period_end = None;
        sub.trial_end = Some((OffsetDateTime::now_utc() + Duration::days(14)).unix_timestamp());
        let first = billing.upsert_subscription(&sub).await.unwrap();

        let updated = subscription_object("sub_conv", "active", user_id, plan_id);
        let second = billing.upsert_subscription(&updated).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.status, SubscriptionStatus::Active);
        assert!(!second.is_on_trial());
        assert_eq!(*subs.inserts.lock().unwrap(), 1);
        assert_eq!(*subs.updates.lock().unwrap(), 1);
        assert_eq!(subs.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upsert_rejects_missing_metadata_without_writing() {
        let subs = MockSubscriptionRepository::default();
        let billing = service(
            Arc::new(MockDb::default()),
            MockPlanRepository::default(),
            subs.clone(),
            Arc::new(MockStripeService::new()),
        );

        let mut sub = subscription_object("sub_nometa", "active", Uuid::new_v4(), Uuid::new_v4());
        sub.metadata.remove("user_id");

        let err = billing.upsert_subscription(&sub).await.unwrap_err();
        assert!(matches!(err, BillingError::MissingMetadata { field: "user_id", .. }));
        assert!(subs.rows.lock().unwrap().is_empty());
        assert_eq!(*subs.inserts.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn upsert_rejects_unknown_status() {
        let billing = service(
            Arc::new(MockDb::default()),
            MockPlanRepository::default(),
            MockSubscriptionRepository::default(),
            Arc::new(MockStripeService::new()),
        );

        let sub = subscription_object("sub_inc", "incomplete", Uuid::new_v4(), Uuid::new_v4());
        let err = billing.upsert_subscription(&sub).await.unwrap_err();
        assert!(matches!(err, BillingError::InvalidStatus { .. }));
    }

    #[tokio::test]
    async fn trialing_without_period_end_falls_back_to_trial_end() {
        let billing = service(
            Arc::new(MockDb::default()),
            MockPlanRepository::default(),
            MockSubscriptionRepository::default(),
            Arc::new(MockStripeService::new()),
        );

        let mut sub =
            subscription_object("sub_trial", "trialing", Uuid::new_v4(), Uuid::new_v4());
        let trial_end = (OffsetDateTime::now_utc() + Duration::days(14)).unix_timestamp();
        sub.current_period_end = None;
        sub.trial_end = Some(trial_end);

        let stored = billing.upsert_subscription(&sub).await.unwrap();
        assert_eq!(stored.current_period_end.unix_timestamp(), trial_end);
    }

    #[tokio::test]
    async fn invoice_payment_failed_refetches_and_applies_provider_state() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let subs = MockSubscriptionRepository::default();
        let stripe = Arc::new(MockStripeService::new().with_subscription(subscription_object(
            "sub_pd",
            "past_due",
            user_id,
            plan_id,
        )));
        let billing = service(
            Arc::new(MockDb::default()),
            MockPlanRepository::default(),
            subs.clone(),
            stripe.clone(),
        );

        // Existing active row that the provider now reports past_due.
        billing
            .upsert_subscription(&subscription_object("sub_pd", "active", user_id, plan_id))
            .await
            .unwrap();

        billing
            .apply_event(WebhookEvent::InvoicePaymentFailed {
                subscription_id: Some("sub_pd".into()),
            })
            .await
            .unwrap();

        let rows = subs.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, SubscriptionStatus::PastDue);
        assert_eq!(
            stripe.retrieved_subscriptions.lock().unwrap().as_slice(),
            ["sub_pd"]
        );
    }

    #[tokio::test]
    async fn invoice_event_without_subscription_is_a_no_op() {
        let subs = MockSubscriptionRepository::default();
        let billing = service(
            Arc::new(MockDb::default()),
            MockPlanRepository::default(),
            subs.clone(),
            Arc::new(MockStripeService::new()),
        );

        billing
            .apply_event(WebhookEvent::InvoicePaymentSucceeded {
                subscription_id: None,
            })
            .await
            .unwrap();
        assert!(subs.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn checkout_lazily_creates_customer_and_sets_metadata() {
        let db = Arc::new(MockDb {
            find_user_result: Some(test_user()),
            ..Default::default()
        });
        let plan = test_plan(Some("price_pro_monthly"));
        let plan_id = plan.id;
        let plans = MockPlanRepository::default();
        plans.plans.lock().unwrap().push(plan);
        let stripe = Arc::new(MockStripeService::new());
        let user_id = db.find_user_result.as_ref().unwrap().id;
        let billing = service(
            db.clone(),
            plans,
            MockSubscriptionRepository::default(),
            stripe.clone(),
        );

        let session = billing
            .create_checkout_session(
                user_id,
                plan_id,
                "https://example.test/dashboard?success=true",
                "https://example.test/pricing?canceled=true",
            )
            .await
            .unwrap();

        assert!(session.id.starts_with("cs_test_"));
        assert_eq!(*db.set_customer_calls.lock().unwrap(), 1);

        let requests = stripe.last_create_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.mode, CheckoutMode::Subscription);
        assert_eq!(req.trial_period_days, Some(CHECKOUT_TRIAL_DAYS));
        assert_eq!(req.line_items[0].price, "price_pro_monthly");
        let metadata = req.subscription_metadata.as_ref().unwrap();
        assert_eq!(metadata.get("user_id").unwrap(), &user_id.to_string());
        assert_eq!(metadata.get("plan_id").unwrap(), &plan_id.to_string());

        // Second checkout reuses the stored customer.
        billing
            .create_checkout_session(
                user_id,
                plan_id,
                "https://example.test/dashboard?success=true",
                "https://example.test/pricing?canceled=true",
            )
            .await
            .unwrap();
        assert_eq!(*db.set_customer_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn checkout_rejects_unprovisioned_plan() {
        let db = Arc::new(MockDb {
            find_user_result: Some(test_user()),
            ..Default::default()
        });
        let plan = test_plan(None);
        let plan_id = plan.id;
        let plans = MockPlanRepository::default();
        plans.plans.lock().unwrap().push(plan);
        let user_id = db.find_user_result.as_ref().unwrap().id;
        let billing = service(
            db,
            plans,
            MockSubscriptionRepository::default(),
            Arc::new(MockStripeService::new()),
        );

        let err = billing
            .create_checkout_session(user_id, plan_id, "https://s", "https://c")
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::PlanNotProvisioned(id) if id == plan_id));
    }

    #[tokio::test]
    async fn portal_requires_existing_customer() {
        let db = Arc::new(MockDb {
            find_user_result: Some(test_user()),
            ..Default::default()
        });
        let user_id = db.find_user_result.as_ref().unwrap().id;
        let billing = service(
            db,
            MockPlanRepository::default(),
            MockSubscriptionRepository::default(),
            Arc::new(MockStripeService::new()),
        );

        let err = billing
            .create_portal_session(user_id, "https://example.test/dashboard")
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::NoStripeCustomer(id) if id == user_id));
    }

    #[test]
    fn classify_maps_handled_and_ignored_types() {
        let sub_event = StripeEvent {
            id: "evt_1".into(),
            r#type: "customer.subscription.created".into(),
            payload: serde_json::json!({
                "id": "evt_1",
                "type": "customer.subscription.created",
                "data": { "object": { "id": "sub_1", "status": "trialing" } }
            }),
        };
        assert!(matches!(
            WebhookEvent::classify(&sub_event).unwrap(),
            WebhookEvent::SubscriptionCreated(sub) if sub.id == "sub_1"
        ));

        let invoice_event = StripeEvent {
            id: "evt_2".into(),
            r#type: "invoice.payment_failed".into(),
            payload: serde_json::json!({
                "data": { "object": { "id": "in_1", "subscription": "sub_9" } }
            }),
        };
        assert!(matches!(
            WebhookEvent::classify(&invoice_event).unwrap(),
            WebhookEvent::InvoicePaymentFailed { subscription_id: Some(id) } if id == "sub_9"
        ));

        let other = StripeEvent {
            id: "evt_3".into(),
            r#type: "charge.refunded".into(),
            payload: serde_json::json!({ "data": { "object": {} } }),
        };
        assert!(matches!(
            WebhookEvent::classify(&other).unwrap(),
            WebhookEvent::Ignored(t) if t == "charge.refunded"
        ));
    }

    #[test]
    fn invoice_subscription_id_handles_expanded_objects() {
        let expanded = serde_json::json!({ "subscription": { "id": "sub_exp" } });
        assert_eq!(
            invoice_subscription_id(&expanded),
            Some("sub_exp".to_string())
        );
        let absent = serde_json::json!({ "id": "in_2" });
        assert_eq!(invoice_subscription_id(&absent), None);
    }

    #[test]
    fn malformed_timestamps_fall_back_to_none() {
        assert!(convert_timestamp("sub_x", "current_period_end", Some(-5)).is_none());
        assert!(convert_timestamp("sub_x", "current_period_end", None).is_none());
        let now = OffsetDateTime::now_utc().unix_timestamp();
        assert_eq!(
            convert_timestamp("sub_x", "current_period_end", Some(now))
                .unwrap()
                .unix_timestamp(),
            now
        );
    }
}
