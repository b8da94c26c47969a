//! Route handlers.
//!
//! Each handler validates its input, calls the upstream API and renders a
//! page. Upstream failures never fail the request: list and form pages
//! degrade, the health check answers 503.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Query, Request, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::error::AppError;
use crate::http::server::AppState;
use crate::http::views::{ApiStatus, CreateUserView, IndexView};
use crate::observability::metrics;
use crate::upstream::{ApiClient, ApiError};
use crate::users::{CreateUserForm, User};

/// Where a successful create lands.
pub const CREATED_REDIRECT: &str = "/?success=User+created+successfully";

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub success: Option<String>,
}

async fn fetch_users(api: &dyn ApiClient) -> Result<Vec<User>, ApiError> {
    let data = api.get("/users").await?;
    serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
}

/// `GET /`: the user list, or an empty list when the API is unavailable.
pub async fn index(
    State(state): State<AppState>,
    query: Result<Query<IndexQuery>, axum::extract::rejection::QueryRejection>,
) -> Html<String> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let success = query.success.as_deref();

    match fetch_users(state.api.as_ref()).await {
        Ok(users) => Html(
            IndexView {
                users: &users,
                api_status: ApiStatus::Connected,
                error: None,
                success,
            }
            .render(),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to fetch users from API");
            metrics::record_upstream_failure("list_users");
            let message = err.to_string();
            Html(
                IndexView {
                    users: &[],
                    api_status: ApiStatus::Disconnected,
                    error: Some(&message),
                    success,
                }
                .render(),
            )
        }
    }
}

/// `GET /create`: the empty form.
pub async fn create_form() -> Html<String> {
    render_form(None, &CreateUserForm::default())
}

fn render_form(error: Option<&str>, form: &CreateUserForm) -> Html<String> {
    Html(CreateUserView { error, form }.render())
}

/// Create-user input, accepted form-encoded or as JSON.
///
/// Any other body is read as an empty form, so it fails validation and the
/// form is shown again.
pub struct UserInput(pub CreateUserForm);

fn content_type_is(request: &Request, expected: &str) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().starts_with(expected))
        .unwrap_or(false)
}

impl<S> FromRequest<S> for UserInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if content_type_is(&request, "application/json") {
            let Json(form) = Json::<CreateUserForm>::from_request(request, state).await?;
            Ok(UserInput(form))
        } else if content_type_is(&request, "application/x-www-form-urlencoded") {
            let Form(form) = Form::<CreateUserForm>::from_request(request, state).await?;
            Ok(UserInput(form))
        } else {
            Ok(UserInput(CreateUserForm::default()))
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::with_status(status, rejection.body_text())
        }
    }
}

/// `POST /users`: validate, create upstream, redirect to the list.
///
/// Validation and upstream failures re-render the form with the first
/// message and the values exactly as submitted.
pub async fn create_user(
    State(state): State<AppState>,
    UserInput(form): UserInput,
) -> Result<Response, AppError> {
    let new_user = match form.validate() {
        Ok(user) => user,
        Err(rule) => {
            tracing::debug!(rule = %rule, "Create user form rejected");
            return Ok(render_form(Some(&rule.to_string()), &form).into_response());
        }
    };

    let body = serde_json::to_value(&new_user).map_err(|e| AppError::Internal(e.into()))?;

    match state.api.post("/users", &body).await {
        Ok(_) => {
            tracing::info!(
                username = %new_user.username,
                email = %new_user.email,
                "User created successfully"
            );
            Ok(Redirect::to(CREATED_REDIRECT).into_response())
        }
        Err(err) => {
            tracing::warn!(error = %err, form = ?form, "Failed to create user");
            metrics::record_upstream_failure("create_user");
            Ok(render_form(Some(&err.to_string()), &form).into_response())
        }
    }
}

/// `GET /health`: local liveness plus upstream liveness.
pub async fn health(State(state): State<AppState>) -> Response {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    match state.api.get("/health").await {
        Ok(api) => Json(json!({
            "frontend": "healthy",
            "api": api,
            "timestamp": timestamp,
        }))
        .into_response(),
        Err(err) => {
            metrics::record_upstream_failure("health");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "frontend": "healthy",
                    "api": Value::from("unreachable"),
                    "error": err.to_string(),
                    "timestamp": timestamp,
                })),
            )
                .into_response()
        }
    }
}
