//! HTTP routes: single-city, batch and health endpoints over a [`WeatherProvider`].

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State},
    middleware,
    routing::get,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use weather_core::{WeatherError, WeatherProvider, WeatherRecord};

use crate::error::{ApiError, envelope_method_not_allowed, handle_panic};

const SUPPORTED_UNITS: &str = "metric";

/// [`Path`] whose rejection is rendered as [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
struct ApiPath<T>(T);

/// [`Query`] whose rejection is rendered as [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
struct ApiQuery<T>(T);

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn WeatherProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }
}

/// Build the API router using the provided application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/weather/", get(legacy_weather))
        .nest(
            "/api/v1",
            Router::new()
                .route("/health", get(health))
                .route("/weather/", get(weather_batch))
                .route("/weather/:city", get(weather)),
        )
        .fallback(not_found)
        .layer(middleware::map_response(envelope_method_not_allowed))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// Liveness only; the provider is not contacted.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "Weather API",
    })
}

async fn index() -> Json<[&'static str; 1]> {
    Json(["/weather/?city=Город на англ"])
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

#[derive(Debug, Deserialize)]
struct UnitsParams {
    units: Option<String>,
}

async fn weather(
    State(state): State<AppState>,
    ApiPath(city): ApiPath<String>,
    ApiQuery(params): ApiQuery<UnitsParams>,
) -> Result<Json<WeatherRecord>, ApiError> {
    if let Some(units) = params.units.as_deref().filter(|u| *u != SUPPORTED_UNITS) {
        return Err(ApiError::bad_request(format!(
            "Неподдерживаемые единицы '{units}', доступны только '{SUPPORTED_UNITS}'"
        )));
    }

    let record = state.provider.lookup(&city).await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct BatchParams {
    cities: Option<String>,
}

async fn weather_batch(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<BatchParams>,
) -> Result<Json<Vec<WeatherRecord>>, ApiError> {
    let cities = params
        .cities
        .ok_or_else(|| ApiError::bad_request("Параметр 'cities' обязателен"))?;

    Ok(Json(lookup_batch(state.provider.as_ref(), &cities).await))
}

#[derive(Debug, Deserialize)]
struct CityParams {
    city: Option<String>,
}

async fn legacy_weather(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CityParams>,
) -> Result<Json<WeatherRecord>, ApiError> {
    let city = params
        .city
        .ok_or_else(|| ApiError::bad_request("Параметр 'city' обязателен"))?;

    let record = state.provider.lookup(&city).await?;
    Ok(Json(record))
}

/// Look up every comma-separated city and keep only the successes, in input order.
///
/// Failed cities are dropped without being reported to the caller.
pub async fn lookup_batch(provider: &dyn WeatherProvider, cities: &str) -> Vec<WeatherRecord> {
    let lookups = cities.split(',').map(str::trim).map(|city| async move {
        match provider.lookup(city).await {
            Ok(record) => Some(record),
            Err(err @ WeatherError::CityNotFound(_)) => {
                tracing::debug!(city, kind = err.kind(), "dropping city from batch");
                None
            }
            Err(err) => {
                tracing::warn!(city, kind = err.kind(), error = %err, "dropping city from batch");
                None
            }
        }
    });

    join_all(lookups).await.into_iter().flatten().collect()
}
