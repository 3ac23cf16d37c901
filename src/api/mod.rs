use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};

use crate::models::{Order, ORDER_TOP_LEVEL_FIELDS};
use crate::read::OrderReader;
use crate::validator::{ValidationError, Validator};

// ============================================================================
// HTTP API - thin wrapper over the validator and the read path
// ============================================================================
//
// GET  /healthz          -> 200 empty body
// POST /api/validate     -> validate one order document (1 MB cap, unknown
//                           top-level fields rejected); 200 echoes the
//                           document with date_created filled
// GET  /api/orders/{id}  -> 200 with the order, 404 if absent from both
//                           cache and store
//
// Handler faults map to status codes through ApiError; an error response
// never takes the process down.
//
// ============================================================================

/// Request bodies above this size are rejected before decoding.
pub const MAX_BODY_BYTES: usize = 1 << 20;

pub struct AppState {
    pub validator: Validator,
    pub reader: OrderReader,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
        .route("/healthz", web::get().to(healthz))
        .route("/api/validate", web::post().to(validate_order))
        .route("/api/orders/{id}", web::get().to(get_order));
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad json")]
    BadRequest,

    #[error(transparent)]
    Unprocessable(#[from] ValidationError),

    #[error("not found")]
    NotFound,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Unprocessable(err) => {
                HttpResponse::UnprocessableEntity().json(serde_json::json!({
                    "error": "validation failed",
                    "violations": err.violations,
                }))
            }
            other => HttpResponse::build(other.status_code()).body(other.to_string()),
        }
    }
}

async fn healthz() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn validate_order(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let mut order = decode_strict(&body).map_err(|e| {
        tracing::debug!(error = %e, "validate request rejected");
        ApiError::BadRequest
    })?;

    order.ensure_date_created();
    state.validator.validate(&order)?;

    Ok(HttpResponse::Ok().json(order))
}

async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if id.is_empty() {
        return Err(ApiError::NotFound);
    }

    match state.reader.get(&id).await {
        Some(order) => Ok(HttpResponse::Ok().json(order)),
        None => Err(ApiError::NotFound),
    }
}

#[derive(Debug, thiserror::Error)]
enum DecodeError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document is not a json object")]
    NotAnObject,

    #[error("unknown top-level field: {0}")]
    UnknownField(String),
}

/// Decode an order document, rejecting unknown top-level fields. Nested
/// records stay permissive, matching what ingestion accepts.
fn decode_strict(payload: &[u8]) -> Result<Order, DecodeError> {
    let value: serde_json::Value = serde_json::from_slice(payload)?;

    let object = value.as_object().ok_or(DecodeError::NotAnObject)?;
    for key in object.keys() {
        if !ORDER_TOP_LEVEL_FIELDS.contains(&key.as_str()) {
            return Err(DecodeError::UnknownField(key.clone()));
        }
    }

    Ok(serde_json::from_value(value)?)
}

// ============================================================================
// Unit Tests
// ============================================================================
