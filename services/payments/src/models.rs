use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub checkout_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCheckoutRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmationResponse {
    pub course_id: Uuid,
    pub enrolled: bool,
    pub already_recorded: bool,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentCheckResponse {
    pub course_id: Uuid,
    pub enrolled: bool,
}

/// Checkout session shape shared by the create and retrieve provider calls.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub payment_status: String,
    pub amount_total: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct PaymentHistoryEntry {
    pub payment_id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub amount: rust_decimal::Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
