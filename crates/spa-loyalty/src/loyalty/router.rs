use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AppointmentSnapshot, CustomerId, CustomerProfile, Wallet};
use super::repository::{LoyaltyRepository, NotificationPublisher, RepositoryError};
use super::service::{
    LoyaltyService, LoyaltyServiceError, NewCustomer, PaymentEvent, RedemptionError,
    RedemptionRequest,
};

/// Router builder exposing the loyalty and promotion endpoints.
pub fn loyalty_router<R, N>(service: Arc<LoyaltyService<R, N>>) -> Router
where
    R: LoyaltyRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/loyalty/customers", post(register_handler::<R, N>))
        .route(
            "/api/v1/loyalty/customers/:customer_id",
            get(tier_status_handler::<R, N>),
        )
        .route(
            "/api/v1/loyalty/customers/:customer_id/appointments",
            post(appointment_handler::<R, N>),
        )
        .route(
            "/api/v1/loyalty/customers/:customer_id/promotions",
            get(eligible_promotions_handler::<R, N>),
        )
        .route("/api/v1/loyalty/payments", post(settle_payment_handler::<R, N>))
        .route("/api/v1/loyalty/preview", post(preview_handler::<R, N>))
        .route("/api/v1/promotions", get(public_promotions_handler::<R, N>))
        .route(
            "/api/v1/promotions/:code/redemptions",
            post(redeem_handler::<R, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SettlementRequest {
    #[serde(flatten)]
    pub(crate) event: PaymentEvent,
    /// Override the evaluation date, mainly for replays and tests.
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewRequest {
    pub(crate) profile: CustomerProfile,
    pub(crate) wallet: Wallet,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

fn today_or_now(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (status, axum::Json(json!({ "error": error.to_string() }))).into_response()
}

fn service_error_response(error: LoyaltyServiceError) -> Response {
    match &error {
        LoyaltyServiceError::Repository(RepositoryError::NotFound) => {
            error_response(StatusCode::NOT_FOUND, error)
        }
        LoyaltyServiceError::Repository(RepositoryError::Conflict) => {
            error_response(StatusCode::CONFLICT, error)
        }
        LoyaltyServiceError::Redemption(RedemptionError::UnknownPromotion(_)) => {
            error_response(StatusCode::NOT_FOUND, error)
        }
        LoyaltyServiceError::Redemption(_) | LoyaltyServiceError::Settlement(_) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, error)
        }
        _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, error),
    }
}

pub(crate) async fn register_handler<R, N>(
    State(service): State<Arc<LoyaltyService<R, N>>>,
    axum::Json(new_customer): axum::Json<NewCustomer>,
) -> Response
where
    R: LoyaltyRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.register(new_customer) {
        Ok(record) => {
            let view = record.status_view(None);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn tier_status_handler<R, N>(
    State(service): State<Arc<LoyaltyService<R, N>>>,
    Path(customer_id): Path<String>,
) -> Response
where
    R: LoyaltyRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.tier_status(&CustomerId(customer_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn appointment_handler<R, N>(
    State(service): State<Arc<LoyaltyService<R, N>>>,
    Path(customer_id): Path<String>,
    axum::Json(appointment): axum::Json<AppointmentSnapshot>,
) -> Response
where
    R: LoyaltyRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.record_appointment(&CustomerId(customer_id), appointment) {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn settle_payment_handler<R, N>(
    State(service): State<Arc<LoyaltyService<R, N>>>,
    axum::Json(request): axum::Json<SettlementRequest>,
) -> Response
where
    R: LoyaltyRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let today = today_or_now(request.today);
    let customer_id = request.event.customer_id.clone();
    match service.settle_payment(request.event, today) {
        Ok(evaluation) => {
            let payload = json!({
                "customer_id": customer_id.0,
                "upgraded": evaluation.is_some(),
                "evaluation": evaluation,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn preview_handler<R, N>(
    State(service): State<Arc<LoyaltyService<R, N>>>,
    axum::Json(request): axum::Json<PreviewRequest>,
) -> Response
where
    R: LoyaltyRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let today = today_or_now(request.today);
    let evaluation = service.preview(&request.profile, &request.wallet, today);
    let payload = json!({
        "upgraded": evaluation.is_some(),
        "evaluation": evaluation,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn eligible_promotions_handler<R, N>(
    State(service): State<Arc<LoyaltyService<R, N>>>,
    Path(customer_id): Path<String>,
) -> Response
where
    R: LoyaltyRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let today = Local::now().date_naive();
    match service.eligible_promotions(&CustomerId(customer_id), today) {
        Ok(promotions) => (StatusCode::OK, axum::Json(promotions)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn public_promotions_handler<R, N>(
    State(service): State<Arc<LoyaltyService<R, N>>>,
) -> Response
where
    R: LoyaltyRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let today = Local::now().date_naive();
    match service.public_promotions(today) {
        Ok(promotions) => (StatusCode::OK, axum::Json(promotions)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn redeem_handler<R, N>(
    State(service): State<Arc<LoyaltyService<R, N>>>,
    Path(code): Path<String>,
    axum::Json(request): axum::Json<RedemptionRequest>,
) -> Response
where
    R: LoyaltyRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.redeem(&code, request, Local::now().date_naive()) {
        Ok(usage) => (StatusCode::CREATED, axum::Json(usage)).into_response(),
        Err(error) => service_error_response(error),
    }
}
