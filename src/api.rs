// VivaaTown - HTTP API
// Read-only REST endpoints with Axum. Every response uses the same
// `ApiResponse` envelope, errors included.

use crate::config::EconomyConfig;
use crate::entities::{Classroom, Student};
use crate::error::EconomyError;
use crate::storage::Storage;
use crate::stores::{ClassroomStore, Holding, SavingsStore, StockStore, StudentStore};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    storage: Arc<Mutex<Storage>>,
    config: EconomyConfig,
}

impl AppState {
    pub fn new(storage: Storage, config: EconomyConfig) -> Self {
        AppState {
            storage: Arc::new(Mutex::new(storage)),
            config,
        }
    }

    fn storage(&self) -> Result<MutexGuard<'_, Storage>, ApiError> {
        self.storage.lock().map_err(|_| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "storage lock poisoned".to_string(),
        })
    }
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error half of a handler result, rendered in the envelope
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<EconomyError> for ApiError {
    fn from(err: EconomyError) -> Self {
        let status = match &err {
            EconomyError::NotFound { .. } => StatusCode::NOT_FOUND,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %err, "request failed");
        }
        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::err(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Student row with its live portfolio and savings value
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    pub student: Student,
    pub holdings: Vec<Holding>,
    pub stock_value: f64,
    pub savings_value: f64,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::ok(json!({ "status": "ok" })))
}

/// GET /api/test - Static smoke-test payload
async fn test_endpoint() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::ok(json!({ "message": "VivaaTown API is working" })))
}

/// GET /api/classrooms
async fn list_classrooms(State(state): State<AppState>) -> ApiResult<Vec<Classroom>> {
    let storage = state.storage()?;
    let classrooms = ClassroomStore::load(&storage)?;
    Ok(Json(ApiResponse::ok(classrooms.list().to_vec())))
}

/// GET /api/classrooms/:id/students
async fn classroom_students(
    State(state): State<AppState>,
    Path(classroom_id): Path<String>,
) -> ApiResult<Vec<Student>> {
    let storage = state.storage()?;
    ClassroomStore::load(&storage)?.require(&classroom_id)?;
    let students = StudentStore::load(&storage)?;
    Ok(Json(ApiResponse::ok(students.list_for_classroom(&classroom_id))))
}

/// GET /api/students/:id/portfolio
async fn student_portfolio(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> ApiResult<PortfolioResponse> {
    let storage = state.storage()?;
    let student = StudentStore::load(&storage)?.require(&student_id)?.clone();
    let stocks = StockStore::load(&storage)?;
    let savings = SavingsStore::load(&storage)?;

    let holdings = stocks.holdings(&student_id);
    let stock_value = holdings.iter().map(|h| h.market_value).sum();
    let savings_value = savings.balance_for_student(&student_id, Utc::now().date_naive());

    Ok(Json(ApiResponse::ok(PortfolioResponse {
        student,
        holdings,
        stock_value,
        savings_value,
    })))
}

/// GET /api/config - Economy settings in effect
async fn economy_config(State(state): State<AppState>) -> Json<ApiResponse<EconomyConfig>> {
    Json(ApiResponse::ok(state.config.clone()))
}

async fn not_found() -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        message: "route not found".to_string(),
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/test", get(test_endpoint))
        .route("/config", get(economy_config))
        .route("/classrooms", get(list_classrooms))
        .route("/classrooms/:id/students", get(classroom_students))
        .route("/students/:id/portfolio", get(student_portfolio))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .fallback(not_found)
        .layer(CorsLayer::permissive())
}
