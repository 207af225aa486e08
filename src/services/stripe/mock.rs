#![allow(dead_code)]
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use super::{
    CheckoutSession, CreateCheckoutSessionRequest, StripeEvent, StripeService, StripeServiceError,
    SubscriptionObject,
};

#[derive(Clone, Default)]
pub struct MockStripeService {
    pub created_sessions: Arc<Mutex<Vec<CheckoutSession>>>,
    pub last_create_requests: Arc<Mutex<Vec<CreateCheckoutSessionRequest>>>,
    pub events: Arc<Mutex<Vec<StripeEvent>>>,
    pub subscriptions: Arc<Mutex<HashMap<String, SubscriptionObject>>>,
    pub portal_requests: Arc<Mutex<Vec<(String, String)>>>,
    pub retrieved_subscriptions: Arc<Mutex<Vec<String>>>,
}

impl MockStripeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a subscription object so `get_subscription` (the invoice
    /// re-fetch path) and cancel/reactivate have something to return.
    pub fn with_subscription(self, sub: SubscriptionObject) -> Self {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(sub.id.clone(), sub);
        self
    }
}

fn make_id(prefix: &str) -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("{}_{}", prefix, ts)
}

#[async_trait]
impl StripeService for MockStripeService {
    async fn create_checkout_session(
        &self,
        req: CreateCheckoutSessionRequest,
    ) -> Result<CheckoutSession, StripeServiceError> {
        self.last_create_requests.lock().unwrap().push(req.clone());

        let session = CheckoutSession {
            id: make_id("cs_test"),
            url: Some("https://example.test/checkout".into()),
        };
        self.created_sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }

    async fn create_customer(
        &self,
        email: &str,
        _name: Option<&str>,
    ) -> Result<String, StripeServiceError> {
        let id = make_id("cus_test");
        let evt = StripeEvent {
            id: id.clone(),
            r#type: "customer.created".into(),
            payload: serde_json::json!({ "email": email, "id": id.clone() }),
        };
        self.events.lock().unwrap().push(evt);
        Ok(id)
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, StripeServiceError> {
        self.portal_requests
            .lock()
            .unwrap()
            .push((customer_id.to_string(), return_url.to_string()));
        Ok("https://example.test/portal".into())
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        _signature_header: &str,
    ) -> Result<StripeEvent, StripeServiceError> {
        let val: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| StripeServiceError::Serde(e.to_string()))?;
        let id = match val.get("id").and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => make_id("evt"),
        };
        let ty = val
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let evt = StripeEvent {
            id,
            r#type: ty,
            payload: val,
        };
        self.events.lock().unwrap().push(evt.clone());
        Ok(evt)
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionObject, StripeServiceError> {
        self.retrieved_subscriptions
            .lock()
            .unwrap()
            .push(subscription_id.to_string());
        self.subscriptions
            .lock()
            .unwrap()
            .get(subscription_id)
            .cloned()
            .ok_or_else(|| {
                StripeServiceError::NotFound(format!("subscription {} not found", subscription_id))
            })
    }

    async fn set_subscription_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel_at_period_end: bool,
    ) -> Result<SubscriptionObject, StripeServiceError> {
        let mut subs = self.subscriptions.lock().unwrap();
        let sub = subs.get_mut(subscription_id).ok_or_else(|| {
            StripeServiceError::NotFound(format!("subscription {} not found", subscription_id))
        })?;
        sub.cancel_at_period_end = cancel_at_period_end;
        Ok(sub.clone())
    }
}
