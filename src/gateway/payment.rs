//! Payment gateway seam. The service only ever creates hosted checkout sessions and
//! asks whether one was paid; card data never passes through it.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::gateway::{GatewayError, GatewayResult};

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// Minor units (cents)
    pub amount: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page the client is redirected to
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfirmation {
    pub session_id: String,
    pub paid: bool,
    pub course_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentGateway: std::fmt::Debug + Send + Sync {
    async fn create_checkout_session(&self, req: CheckoutRequest)
    -> GatewayResult<CheckoutSession>;

    async fn confirm(&self, session_id: &str) -> GatewayResult<PaymentConfirmation>;
}

/// Stripe Checkout Sessions over plain HTTPS.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    payment_status: Option<String>,
    amount_total: Option<i64>,
    currency: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl StripeSession {
    fn into_confirmation(self) -> PaymentConfirmation {
        let parse = |key: &str| self.metadata.get(key).and_then(|v| v.parse::<Uuid>().ok());

        PaymentConfirmation {
            course_id: parse("course_id"),
            user_id: parse("user_id"),
            paid: matches!(self.payment_status.as_deref(), Some("paid")),
            amount: self.amount_total.unwrap_or_default(),
            currency: self.currency.clone().unwrap_or_default(),
            session_id: self.id,
        }
    }
}

impl StripeGateway {
    pub fn new(client: reqwest::Client, api_base: &str, secret_key: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        }
    }

    fn checkout_form(req: &CheckoutRequest) -> Vec<(&'static str, String)> {
        vec![
            ("mode", String::from("payment")),
            ("payment_method_types[0]", String::from("card")),
            ("line_items[0][quantity]", String::from("1")),
            ("line_items[0][price_data][currency]", req.currency.clone()),
            ("line_items[0][price_data][unit_amount]", req.amount.to_string()),
            ("line_items[0][price_data][product_data][name]", req.title.clone()),
            ("success_url", req.success_url.clone()),
            ("cancel_url", req.cancel_url.clone()),
            ("client_reference_id", req.user_id.to_string()),
            ("metadata[course_id]", req.course_id.to_string()),
            ("metadata[user_id]", req.user_id.to_string()),
        ]
    }

    /// Session ids come back from the client, so only plain provider ids are let into
    /// the request path.
    fn session_url(&self, session_id: &str) -> GatewayResult<reqwest::Url> {
        let well_formed = !session_id.is_empty()
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !well_formed {
            return Err(GatewayError::InvalidSessionId {
                session_id: session_id.to_string(),
            });
        }

        let mut url = reqwest::Url::parse(&self.api_base)
            .map_err(|e| GatewayError::InvalidEndpoint(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidEndpoint(self.api_base.clone()))?
            .pop_if_empty()
            .extend(["checkout", "sessions", session_id]);
        Ok(url)
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[tracing::instrument(skip(self), fields(course_id = %req.course_id))]
    async fn create_checkout_session(
        &self,
        req: CheckoutRequest,
    ) -> GatewayResult<CheckoutSession> {
        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&Self::checkout_form(&req))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::from_response(response).await);
        }

        let session: StripeSession = response.json().await?;
        let url = session.url.ok_or_else(|| {
            GatewayError::MalformedResponse(String::from("checkout session without url"))
        })?;

        tracing::debug!(session_id = %session.id, "checkout session created");
        Ok(CheckoutSession { id: session.id, url })
    }

    #[tracing::instrument(skip(self))]
    async fn confirm(&self, session_id: &str) -> GatewayResult<PaymentConfirmation> {
        let response = self
            .client
            .get(self.session_url(session_id)?)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::from_response(response).await);
        }

        let session: StripeSession = response.json().await?;
        Ok(session.into_confirmation())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stripe_session_paid_test() {
        let course_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let raw = serde_json::json!({
            "id": "cs_test_123",
            "object": "checkout.session",
            "url": null,
            "payment_status": "paid",
            "amount_total": 4900,
            "currency": "usd",
            "metadata": {
                "course_id": course_id.to_string(),
                "user_id": user_id.to_string(),
            }
        });

        let session: StripeSession = serde_json::from_value(raw).unwrap();
        let confirmation = session.into_confirmation();

        assert!(confirmation.paid);
        assert_eq!(confirmation.session_id, "cs_test_123");
        assert_eq!(confirmation.course_id, Some(course_id));
        assert_eq!(confirmation.user_id, Some(user_id));
        assert_eq!(confirmation.amount, 4900);
        assert_eq!(confirmation.currency, "usd");
    }

    #[test]
    fn stripe_session_unpaid_test() {
        let raw = serde_json::json!({
            "id": "cs_test_456",
            "payment_status": "unpaid",
            "metadata": { "course_id": "not-a-uuid" }
        });

        let session: StripeSession = serde_json::from_value(raw).unwrap();
        let confirmation = session.into_confirmation();

        assert!(!confirmation.paid);
        assert_eq!(confirmation.course_id, None);
        assert_eq!(confirmation.user_id, None);
    }

    #[test]
    fn session_url_test() {
        let gateway = StripeGateway::new(reqwest::Client::new(), "https://api.stripe.com/v1/", "sk_test");

        let url = gateway.session_url("cs_test_a1B2").unwrap();
        assert_eq!(url.as_str(), "https://api.stripe.com/v1/checkout/sessions/cs_test_a1B2");

        for hostile in ["", "..", "cs_1/../../customers", "cs_1?expand[]=customer", "cs_1#x", "cs 1"] {
            assert!(
                matches!(
                    gateway.session_url(hostile),
                    Err(GatewayError::InvalidSessionId { .. })
                ),
                "{hostile:?} must be rejected"
            );
        }
    }

    #[test]
    fn checkout_form_test() {
        let req = CheckoutRequest {
            course_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: String::from("Async Rust"),
            amount: 1999,
            currency: String::from("eur"),
            success_url: String::from("https://example.com/ok"),
            cancel_url: String::from("https://example.com/cancel"),
        };

        let form = StripeGateway::checkout_form(&req);
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };

        assert_eq!(get("mode"), "payment");
        assert_eq!(get("line_items[0][price_data][unit_amount]"), "1999");
        assert_eq!(get("line_items[0][price_data][currency]"), "eur");
        assert_eq!(get("metadata[course_id]"), req.course_id.to_string());
    }
}
