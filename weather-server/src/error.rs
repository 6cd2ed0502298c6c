//! Translation of lookup failures into `{"detail": ...}` HTTP responses.

use std::any::Any;

use axum::{
    Json,
    extract::rejection::{PathRejection, QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use weather_core::WeatherError;

pub const NOT_FOUND_DETAIL: &str = "Endpoint не найден";
pub const METHOD_NOT_ALLOWED_DETAIL: &str = "Метод не поддерживается";
pub const INTERNAL_DETAIL: &str = "Внутренняя ошибка сервера";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: NOT_FOUND_DETAIL.to_string(),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            detail: METHOD_NOT_ALLOWED_DETAIL.to_string(),
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: INTERNAL_DETAIL.to_string(),
        }
    }

    fn rejected(status: StatusCode, reason: String) -> Self {
        tracing::debug!(%status, reason = %reason, "request rejected by extractor");
        Self {
            status,
            detail: format!("Некорректный запрос: {reason}"),
        }
    }
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        let status = match &err {
            WeatherError::CityNotFound(_) => StatusCode::NOT_FOUND,
            WeatherError::InvalidCredential | WeatherError::Mapping(_) => StatusCode::BAD_REQUEST,
            WeatherError::Provider { status, .. } => Some(*status)
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            WeatherError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            WeatherError::Transport(_) => StatusCode::BAD_GATEWAY,
        };

        match &err {
            WeatherError::CityNotFound(_) | WeatherError::InvalidCredential => {
                tracing::warn!(kind = err.kind(), error = %err, "weather lookup rejected");
            }
            _ => {
                tracing::error!(kind = err.kind(), error = %err, "weather lookup failed");
            }
        }

        Self {
            status,
            detail: format!("Ошибка получения данных: {err}"),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "detail": self.detail,
        }));
        (self.status, body).into_response()
    }
}

/// Replaces the empty body of a 405 with the `{"detail": ...}` envelope, keeping `Allow`.
pub async fn envelope_method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let mut enveloped = ApiError::method_not_allowed().into_response();
    if let Some(allow) = response.headers().get(header::ALLOW) {
        enveloped.headers_mut().insert(header::ALLOW, allow.clone());
    }
    enveloped
}

/// Response for a handler that panicked; the panic payload is logged, never returned.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = message, "request handler panicked");

    ApiError::internal().into_response()
}
