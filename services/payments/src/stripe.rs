use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sha2::Sha256;
use std::collections::HashMap;
use uuid::Uuid;

use coursehub_common::error::AppError;

use crate::config::StripeConfig;
use crate::models::CheckoutSession;

type HmacSha256 = Hmac<Sha256>;

/// Zero-decimal currencies are charged in whole units rather than cents.
const ZERO_DECIMAL_CURRENCIES: &[&str] = &["jpy", "krw", "vnd", "clp"];

/// Converts a decimal amount to the provider's minor units (cents for most
/// currencies).
pub fn to_minor_units(amount: Decimal, currency: &str) -> Result<i64, AppError> {
    let scaled = if ZERO_DECIMAL_CURRENCIES.contains(&currency.to_lowercase().as_str()) {
        amount
    } else {
        amount * Decimal::from(100)
    };
    scaled
        .round()
        .to_i64()
        .ok_or_else(|| AppError::Payment("Amount out of range for payment provider".to_string()))
}

pub fn from_minor_units(amount: i64, currency: &str) -> Decimal {
    if ZERO_DECIMAL_CURRENCIES.contains(&currency.to_lowercase().as_str()) {
        Decimal::from(amount)
    } else {
        Decimal::from(amount) / Decimal::from(100)
    }
}

/// The provider reports a completed checkout as "paid"; older API versions
/// used "succeeded".
pub fn is_paid(payment_status: &str) -> bool {
    matches!(payment_status, "paid" | "succeeded")
}

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Creates a hosted checkout session for a single course purchase. The
    /// course and buyer ids travel in session metadata so the confirmation
    /// path can recover them without server-side session storage.
    pub async fn create_checkout_session(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        course_title: &str,
        amount: Decimal,
    ) -> Result<CheckoutSession, AppError> {
        let unit_amount = to_minor_units(amount, &self.config.currency)?;

        let mut params: HashMap<String, String> = HashMap::new();
        params.insert("mode".to_string(), "payment".to_string());
        params.insert("success_url".to_string(), self.config.success_url.clone());
        params.insert("cancel_url".to_string(), self.config.cancel_url.clone());
        params.insert(
            "line_items[0][price_data][currency]".to_string(),
            self.config.currency.clone(),
        );
        params.insert(
            "line_items[0][price_data][unit_amount]".to_string(),
            unit_amount.to_string(),
        );
        params.insert(
            "line_items[0][price_data][product_data][name]".to_string(),
            course_title.to_string(),
        );
        params.insert("line_items[0][quantity]".to_string(), "1".to_string());
        params.insert("metadata[user_id]".to_string(), user_id.to_string());
        params.insert("metadata[course_id]".to_string(), course_id.to_string());

        let response = self
            .http
            .post(format!("{}/checkout/sessions", self.config.api_base))
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Payment provider error: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "checkout session creation rejected");
            return Err(AppError::Payment(
                "Failed to create checkout session".to_string(),
            ));
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid provider response: {e}")))
    }

    pub async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, AppError> {
        let response = self
            .http
            .get(format!(
                "{}/checkout/sessions/{session_id}",
                self.config.api_base
            ))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Payment provider error: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("Checkout session not found".to_string()));
        }
        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Payment provider returned {}",
                response.status()
            )));
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid provider response: {e}")))
    }

    /// Verifies the `Stripe-Signature` header. The header carries a
    /// timestamp and one or more `v1` signatures; each signature is an
    /// HMAC-SHA256 of `"{timestamp}.{payload}"` keyed by the webhook secret.
    pub fn verify_webhook_signature(&self, payload: &str, signature_header: &str) -> bool {
        verify_signature(&self.config.webhook_secret, payload, signature_header)
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }
}

fn verify_signature(secret: &str, payload: &str, signature_header: &str) -> bool {
    let mut timestamp: Option<&str> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let (Some(timestamp), false) = (timestamp, candidates.is_empty()) else {
        return false;
    };

    let signed_payload = format!("{timestamp}.{payload}");
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(signed_payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    candidates.iter().any(|candidate| *candidate == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: &str, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn converts_decimal_currencies_to_cents() {
        assert_eq!(to_minor_units(Decimal::new(4999, 2), "usd").unwrap(), 4999);
        assert_eq!(to_minor_units(Decimal::from(12), "eur").unwrap(), 1200);
    }

    #[test]
    fn zero_decimal_currencies_keep_whole_units() {
        assert_eq!(to_minor_units(Decimal::from(500), "jpy").unwrap(), 500);
        assert_eq!(from_minor_units(500, "JPY"), Decimal::from(500));
    }

    #[test]
    fn minor_units_round_trip() {
        assert_eq!(from_minor_units(4999, "usd"), Decimal::new(4999, 2));
    }

    #[test]
    fn paid_statuses() {
        assert!(is_paid("paid"));
        assert!(is_paid("succeeded"));
        assert!(!is_paid("unpaid"));
        assert!(!is_paid("no_payment_required"));
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = r#"{"type":"checkout.session.completed"}"#;
        let sig = sign("whsec_test", "1700000000", payload);
        let header = format!("t=1700000000,v1={sig}");
        assert!(verify_signature("whsec_test", payload, &header));
    }

    #[test]
    fn rejects_wrong_secret_and_tampered_payload() {
        let payload = r#"{"type":"checkout.session.completed"}"#;
        let sig = sign("whsec_test", "1700000000", payload);
        let header = format!("t=1700000000,v1={sig}");
        assert!(!verify_signature("whsec_other", payload, &header));
        assert!(!verify_signature("whsec_test", "{}", &header));
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(!verify_signature("whsec_test", "{}", ""));
        assert!(!verify_signature("whsec_test", "{}", "v1=deadbeef"));
        assert!(!verify_signature("whsec_test", "{}", "t=1700000000"));
    }
}
