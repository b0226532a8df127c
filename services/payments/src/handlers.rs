use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use uuid::Uuid;

use coursehub_auth::{Claims, OptionalClaims};
use coursehub_common::error::AppError;
use coursehub_common::types::ApiResponse;
use coursehub_database::models::Enrollment;

use crate::enrollment::ConfirmOutcome;
use crate::models::{
    CheckoutSession, CheckoutSessionResponse, ConfirmationResponse, EnrollmentCheckResponse,
    PaymentHistoryEntry, VerifyCheckoutRequest, WebhookEvent,
};
use crate::stripe;
use crate::AppState;

pub async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success("Payments service is healthy".to_string()))
}

/// Starts a hosted checkout for a course. Business rules are checked before
/// the provider is contacted.
pub async fn create_checkout(
    State(state): State<AppState>,
    claims: Claims,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CheckoutSessionResponse>>, AppError> {
    let user_id = claims.user_id();
    let course = state
        .enrollment_service
        .prepare_checkout(user_id, course_id)
        .await?;

    let session = state
        .stripe_client
        .create_checkout_session(user_id, course_id, &course.title, course.price)
        .await?;

    tracing::info!(%user_id, %course_id, session_id = %session.id, "checkout session created");

    Ok(Json(ApiResponse::success(CheckoutSessionResponse {
        session_id: session.id,
        checkout_url: session.url,
    })))
}

/// Client-driven confirmation: the success redirect hands the session id
/// back and we verify it against the provider before recording anything.
/// Safe to call more than once for the same session.
pub async fn verify_checkout(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<VerifyCheckoutRequest>,
) -> Result<Json<ApiResponse<ConfirmationResponse>>, AppError> {
    if payload.session_id.trim().is_empty() {
        return Err(AppError::Validation("Session id is required".to_string()));
    }

    let session = state
        .stripe_client
        .retrieve_session(&payload.session_id)
        .await?;

    if !stripe::is_paid(&session.payment_status) {
        return Err(AppError::Payment("Payment has not completed".to_string()));
    }

    let (session_user_id, course_id) = session_parties(&session)?;
    if session_user_id != claims.user_id() {
        return Err(AppError::Authorization(
            "Checkout session belongs to another user".to_string(),
        ));
    }

    let amount = stripe::from_minor_units(session.amount_total, &session.currency);
    let outcome = state
        .enrollment_service
        .record_confirmed_payment(claims.user_id(), course_id, amount, &session.id)
        .await?;

    Ok(Json(ApiResponse::success(ConfirmationResponse {
        course_id,
        enrolled: true,
        already_recorded: outcome == ConfirmOutcome::AlreadyRecorded,
    })))
}

/// Provider webhook endpoint. Authenticated by signature, not by JWT.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ApiResponse<String>>, AppError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Missing webhook signature".to_string()))?;

    if !state.stripe_client.verify_webhook_signature(&body, signature) {
        return Err(AppError::Authentication(
            "Invalid webhook signature".to_string(),
        ));
    }

    let event: WebhookEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::Validation(format!("Malformed webhook payload: {e}")))?;

    if event.event_type != "checkout.session.completed" {
        tracing::debug!(event_type = event.event_type, "ignoring webhook event");
        return Ok(Json(ApiResponse::success("ignored".to_string())));
    }

    let session: CheckoutSession = serde_json::from_value(event.data.object)
        .map_err(|e| AppError::Validation(format!("Malformed session object: {e}")))?;

    if !stripe::is_paid(&session.payment_status) {
        tracing::warn!(session_id = %session.id, status = session.payment_status,
            "completed event without paid status, skipping");
        return Ok(Json(ApiResponse::success("ignored".to_string())));
    }

    let (user_id, course_id) = session_parties(&session)?;
    let amount = stripe::from_minor_units(session.amount_total, &session.currency);
    state
        .enrollment_service
        .record_confirmed_payment(user_id, course_id, amount, &session.id)
        .await?;

    Ok(Json(ApiResponse::success("processed".to_string())))
}

/// Enrollment check used by clients to gate course content. Anonymous
/// callers are simply not enrolled.
pub async fn check_enrollment(
    State(state): State<AppState>,
    OptionalClaims(claims): OptionalClaims,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<EnrollmentCheckResponse>>, AppError> {
    let enrolled = match claims {
        Some(claims) => {
            state
                .enrollment_service
                .is_enrolled(claims.user_id(), course_id)
                .await?
        }
        None => false,
    };

    Ok(Json(ApiResponse::success(EnrollmentCheckResponse {
        course_id,
        enrolled,
    })))
}

pub async fn list_my_enrollments(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<ApiResponse<Vec<Enrollment>>>, AppError> {
    let enrollments = state
        .enrollment_service
        .list_enrollments(claims.user_id())
        .await?;
    Ok(Json(ApiResponse::success(enrollments)))
}

pub async fn list_my_payments(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<ApiResponse<Vec<PaymentHistoryEntry>>>, AppError> {
    let payments = state
        .enrollment_service
        .list_payments(claims.user_id())
        .await?;
    Ok(Json(ApiResponse::success(payments)))
}

fn session_parties(session: &CheckoutSession) -> Result<(Uuid, Uuid), AppError> {
    let user_id = session
        .metadata
        .get("user_id")
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| {
            AppError::ExternalService("Session metadata missing user_id".to_string())
        })?;
    let course_id = session
        .metadata
        .get("course_id")
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| {
            AppError::ExternalService("Session metadata missing course_id".to_string())
        })?;
    Ok((user_id, course_id))
}
