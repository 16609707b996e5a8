use super::AppState;
use crate::model::User;
use crate::service::Outcome;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";
pub const REQUEST_CANCELLED: &str = "Request Cancelled";
pub const ALREADY_EXISTS: &str = "Id already exists";

/// Map a service outcome to a status code and JSON body.
pub fn respond<T: Serialize>(outcome: Outcome<T>) -> Response {
    match outcome {
        Outcome::Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Outcome::Created(value) => (StatusCode::CREATED, Json(value)).into_response(),
        Outcome::NotFound => (StatusCode::NOT_FOUND, Json(serde_json::Value::Null)).into_response(),
        Outcome::Conflict => (StatusCode::CONFLICT, ALREADY_EXISTS).into_response(),
        Outcome::Invalid(errors) => (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response(),
        Outcome::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
        Outcome::Cancelled => (StatusCode::REQUEST_TIMEOUT, REQUEST_CANCELLED).into_response(),
        Outcome::Internal => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR).into_response()
        }
    }
}

fn bad_body(rejection: JsonRejection) -> Response {
    (StatusCode::BAD_REQUEST, rejection.body_text()).into_response()
}

pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let ctx = state.request_context();
    let report = state.health.check(&ctx).await;
    let status = if report.is_up() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(report)).into_response()
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> Response {
    let ctx = state.request_context();
    respond(state.service.all(&ctx).await)
}

pub async fn load_user(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let ctx = state.request_context();
    respond(state.service.load(&ctx, &id).await)
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    body: Result<Json<User>, JsonRejection>,
) -> Response {
    let Json(user) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    let ctx = state.request_context();
    respond(state.service.create(&ctx, user).await)
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<User>, JsonRejection>,
) -> Response {
    let Json(user) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    let ctx = state.request_context();
    respond(state.service.update(&ctx, &id, user).await)
}

pub async fn delete_user(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let ctx = state.request_context();
    respond(state.service.delete(&ctx, &id).await)
}
