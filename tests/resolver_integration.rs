//! HTTP provider tests against local stand-ins for the real services
//!
//! Each fake provider is a small axum app bound to an ephemeral port.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use geoverify::geoip::{
    build_http_client, CachedResolver, FallbackResolver, GeoProvider, GeoResolver,
    IpApiComProvider, IpapiCoProvider, ProviderError,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn ipapi_co_lookup(
    State(hits): State<Arc<AtomicUsize>>,
    Path(ip): Path<String>,
) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    match ip.as_str() {
        "41.90.64.1" => (
            StatusCode::OK,
            Json(json!({ "ip": ip, "country_code": "KE", "country_name": "Kenya" })),
        ),
        "8.8.4.4" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": true })),
        ),
        "197.210.1.1" => (StatusCode::OK, Json(json!({ "ip": ip, "country_name": "Nigeria" }))),
        _ => (
            StatusCode::OK,
            Json(json!({ "ip": ip, "error": true, "reason": "RateLimited" })),
        ),
    }
}

async fn ipapi_co_self() -> Json<serde_json::Value> {
    Json(json!({ "ip": "196.25.1.1", "country_code": "ZA", "country_name": "South Africa" }))
}

async fn ip_api_com_lookup(Path(ip): Path<String>) -> Json<serde_json::Value> {
    match ip.as_str() {
        "102.89.1.1" | "8.8.4.4" => Json(json!({
            "status": "success",
            "countryCode": "NG",
            "country": "Nigeria",
            "query": ip,
        })),
        _ => Json(json!({ "status": "fail", "message": "invalid query", "query": ip })),
    }
}

/// Fake ipapi.co plus a counter of per-address lookups it served
async fn ipapi_co_server() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = spawn(
        Router::new()
            .route("/{ip}/json/", get(ipapi_co_lookup))
            .route("/json/", get(ipapi_co_self))
            .with_state(Arc::clone(&hits)),
    )
    .await;
    (base, hits)
}

async fn ipapi_co_base() -> String {
    ipapi_co_server().await.0
}

async fn ip_api_com_base() -> String {
    spawn(Router::new().route("/json/{ip}", get(ip_api_com_lookup))).await
}

fn client() -> reqwest::Client {
    build_http_client(Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_ipapi_co_success() {
    let provider = IpapiCoProvider::with_base_url(client(), ipapi_co_base().await);

    let hit = provider.lookup(Some("41.90.64.1".parse().unwrap())).await.unwrap();

    assert_eq!(hit.country_code, "KE");
    assert_eq!(hit.country_name.as_deref(), Some("Kenya"));
    assert_eq!(hit.ip.as_deref(), Some("41.90.64.1"));
}

#[tokio::test]
async fn test_ipapi_co_self_lookup() {
    let provider = IpapiCoProvider::with_base_url(client(), ipapi_co_base().await);

    let hit = provider.lookup(None).await.unwrap();

    assert_eq!(hit.country_code, "ZA");
    assert_eq!(hit.ip.as_deref(), Some("196.25.1.1"));
}

#[tokio::test]
async fn test_ipapi_co_error_field_is_failure() {
    let provider = IpapiCoProvider::with_base_url(client(), ipapi_co_base().await);

    let err = provider
        .lookup(Some("102.89.1.1".parse().unwrap()))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Rejected(ref reason) if reason == "RateLimited"));
}

#[tokio::test]
async fn test_ipapi_co_http_error_is_failure() {
    let provider = IpapiCoProvider::with_base_url(client(), ipapi_co_base().await);

    let err = provider.lookup(Some("8.8.4.4".parse().unwrap())).await.unwrap_err();

    assert!(matches!(err, ProviderError::Status(500)));
}

#[tokio::test]
async fn test_ipapi_co_missing_country_is_failure() {
    let provider = IpapiCoProvider::with_base_url(client(), ipapi_co_base().await);

    let err = provider
        .lookup(Some("197.210.1.1".parse().unwrap()))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::MissingCountry));
}

#[tokio::test]
async fn test_ip_api_com_status_field() {
    let provider = IpApiComProvider::with_base_url(client(), ip_api_com_base().await);

    let hit = provider.lookup(Some("102.89.1.1".parse().unwrap())).await.unwrap();
    assert_eq!(hit.country_code, "NG");

    let err = provider
        .lookup(Some("41.90.64.1".parse().unwrap()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Rejected(ref m) if m == "invalid query"));
}

#[tokio::test]
async fn test_unreachable_provider_is_transport_failure() {
    // Nothing listens on the discard port
    let provider = IpapiCoProvider::with_base_url(client(), "http://127.0.0.1:9");

    let err = provider.lookup(Some("41.90.64.1".parse().unwrap())).await.unwrap_err();

    assert!(matches!(err, ProviderError::Transport(_)));
}

#[tokio::test]
async fn test_chain_falls_back_to_secondary() {
    let primary: Arc<dyn GeoProvider> =
        Arc::new(IpapiCoProvider::with_base_url(client(), ipapi_co_base().await));
    let secondary: Arc<dyn GeoProvider> =
        Arc::new(IpApiComProvider::with_base_url(client(), ip_api_com_base().await));
    let resolver = FallbackResolver::new(
        vec![primary, secondary],
        Duration::from_secs(2),
        Duration::from_secs(5),
    );

    // Primary answers directly
    let kenya = resolver.get_country_from_ip(Some("41.90.64.1")).await;
    assert!(kenya.success);
    assert_eq!(kenya.country_code.as_deref(), Some("KE"));

    // Primary returns 500, secondary answers
    let nigeria = resolver.get_country_from_ip(Some("8.8.4.4")).await;
    assert!(nigeria.success);
    assert_eq!(nigeria.country_code.as_deref(), Some("NG"));
    assert_eq!(nigeria.country_name.as_deref(), Some("Nigeria"));

    // Both reject
    let unknown = resolver.get_country_from_ip(Some("203.0.113.50")).await;
    assert!(!unknown.success);
    assert!(unknown.error.unwrap().contains("phone number"));
}

#[tokio::test]
async fn test_cache_avoids_repeat_provider_calls() {
    let (base, hits) = ipapi_co_server().await;
    let primary: Arc<dyn GeoProvider> = Arc::new(IpapiCoProvider::with_base_url(client(), base));
    let fallback = FallbackResolver::new(vec![primary], Duration::from_secs(2), Duration::from_secs(5));
    let resolver = CachedResolver::new(Arc::new(fallback), 100, Duration::from_secs(60));

    let first = resolver.get_country_from_ip(Some("41.90.64.1")).await;
    let second = resolver.get_country_from_ip(Some("41.90.64.1")).await;
    assert_eq!(first, second);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // Rejections are retried on the next call
    resolver.get_country_from_ip(Some("102.89.1.1")).await;
    resolver.get_country_from_ip(Some("102.89.1.1")).await;
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}
