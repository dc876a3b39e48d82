use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{BrowserGeolocation, GeolocationResult, LocationVerificationResult};
use crate::network::get_ip_from_request;
use crate::verification::LocationVerifier;

pub struct AppState {
    pub verifier: Arc<LocationVerifier>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Deserialize)]
pub struct GeolocateQuery {
    pub ip: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyIpRequest {
    pub registered_country: String,
    pub ip: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyBrowserRequest {
    pub registered_country: String,
    pub location: BrowserGeolocation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyHybridRequest {
    pub registered_country: String,
    pub ip: Option<String>,
    pub location: Option<BrowserGeolocation>,
}

#[derive(Debug, Serialize)]
pub struct SupportedResponse {
    pub country: String,
    pub supported: bool,
}

fn require_country(code: &str) -> Result<(), ApiError> {
    if code.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "registeredCountry cannot be empty".to_string(),
            }),
        ));
    }
    Ok(())
}

/// Body IP wins; otherwise fall back to proxy headers
fn client_ip(explicit: Option<String>, headers: &HeaderMap) -> Option<String> {
    explicit
        .filter(|ip| !ip.trim().is_empty())
        .or_else(|| get_ip_from_request(headers))
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn geolocate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GeolocateQuery>,
    headers: HeaderMap,
) -> Json<GeolocationResult> {
    let ip = client_ip(query.ip, &headers);
    Json(state.verifier.get_country_from_ip(ip.as_deref()).await)
}

pub async fn verify_ip(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<VerifyIpRequest>,
) -> Result<Json<LocationVerificationResult>, ApiError> {
    require_country(&payload.registered_country)?;

    let ip = client_ip(payload.ip, &headers);
    let result = state
        .verifier
        .verify_ip_location(ip.as_deref(), &payload.registered_country)
        .await;

    Ok(Json(result))
}

pub async fn verify_browser(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyBrowserRequest>,
) -> Result<Json<LocationVerificationResult>, ApiError> {
    require_country(&payload.registered_country)?;

    let result = state
        .verifier
        .verify_browser_location(&payload.location, &payload.registered_country);

    Ok(Json(result))
}

pub async fn verify_hybrid(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<VerifyHybridRequest>,
) -> Result<Json<LocationVerificationResult>, ApiError> {
    require_country(&payload.registered_country)?;

    let ip = client_ip(payload.ip, &headers);
    let result = state
        .verifier
        .verify_hybrid_location(
            ip.as_deref(),
            payload.location.as_ref(),
            &payload.registered_country,
        )
        .await;

    Ok(Json(result))
}

pub async fn country_supported(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Json<SupportedResponse> {
    let supported = state.verifier.is_detected_country_supported(&code);
    Json(SupportedResponse {
        country: code.trim().to_ascii_uppercase(),
        supported,
    })
}
