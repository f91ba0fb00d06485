//! Middleware stack for the API server
//!
//! Provides request ID scoping, logging, timeouts, CORS, and rate limiting.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{self, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware::{self as axum_middleware, Next},
    response::Response,
    Router,
};
use governor::middleware::NoOpMiddleware;
use tower_governor::{
    governor::{GovernorConfig, GovernorConfigBuilder},
    key_extractor::GlobalKeyExtractor,
    GovernorLayer,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;
use yishan_common::{with_request_id, ApiResponse, AppConfig, AppError, BusinessCode, CorsConfig, RateLimitConfig};

use crate::state::AppState;

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Requests running longer than this are answered with 503
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Apply the API middleware stack: rate limiting, tracing, timeout and CORS
///
/// # Errors
/// Returns `AppError::Config` if the rate limit settings are unusable
pub fn apply_middleware(router: Router<AppState>, config: &AppConfig) -> Result<Router<AppState>, AppError> {
    let governor_conf = Arc::new(governor_config(&config.rate_limit)?);

    // Layers wrap in reverse order of the calls below, so a request passes:
    // envelope -> rate limit -> trace -> timeout -> CORS -> handler
    Ok(router
        .layer(create_cors_layer_from_config(&config.cors, config.app.env.is_production()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::SERVICE_UNAVAILABLE,
            REQUEST_TIMEOUT,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .layer(axum_middleware::map_response(envelope_bare_errors)))
}

/// Assign, scope and echo `x-request-id`. Wraps every route, health included.
pub fn apply_request_id(router: Router) -> Router {
    router
        .layer(axum_middleware::from_fn(scope_request_id))
        .layer(PropagateRequestIdLayer::new(header::HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestIdLayer::new(
            header::HeaderName::from_static(REQUEST_ID_HEADER),
            MakeRequestUuid,
        ))
}

/// Global token bucket refilling `requests_per_second` times a second
fn governor_config(config: &RateLimitConfig) -> Result<GovernorConfig<GlobalKeyExtractor, NoOpMiddleware>, AppError> {
    let replenish_ms = (1000 / u64::from(config.requests_per_second.max(1))).max(1);

    GovernorConfigBuilder::default()
        .per_millisecond(replenish_ms)
        .burst_size(config.burst)
        .key_extractor(GlobalKeyExtractor)
        .finish()
        .ok_or_else(|| AppError::Config("invalid rate limit configuration".to_string()))
}

/// Run the rest of the request with its `x-request-id` as the current request id
pub async fn scope_request_id(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

    with_request_id(request_id, next.run(request)).await
}

/// Replace the plain bodies of rate limit and timeout rejections with an envelope
pub async fn envelope_bare_errors(response: Response) -> Response {
    let code = match response.status() {
        StatusCode::TOO_MANY_REQUESTS => BusinessCode::RateLimited,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::REQUEST_TIMEOUT => BusinessCode::ServiceUnavailable,
        _ => return response,
    };

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    let body = match serde_json::to_vec(&ApiResponse::from_code(code)) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize envelope");
            return Response::from_parts(parts, Body::empty());
        }
    };

    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body))
}

/// Create CORS layer from configuration
fn create_cors_layer_from_config(config: &CorsConfig, is_production: bool) -> CorsLayer {
    let base_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([
            header::HeaderName::from_static(REQUEST_ID_HEADER),
            header::HeaderName::from_static("x-ratelimit-after"),
            header::RETRY_AFTER,
        ]);

    // In production, only allow configured origins
    // In development, allow any origin if no origins are configured
    if is_production || !config.allowed_origins.is_empty() {
        if config.allowed_origins.is_empty() {
            tracing::warn!(
                "CORS: No allowed origins configured in production mode. \
                 Requests from browsers will be blocked."
            );
            base_layer.allow_origin(AllowOrigin::list(Vec::<HeaderValue>::new()))
        } else {
            let origins: Vec<HeaderValue> = config
                .allowed_origins
                .iter()
                .filter_map(|origin| {
                    origin.parse::<HeaderValue>().ok().or_else(|| {
                        tracing::warn!("Invalid CORS origin: {}", origin);
                        None
                    })
                })
                .collect();

            tracing::info!("CORS: Allowing {} configured origins", origins.len());
            base_layer.allow_origin(AllowOrigin::list(origins))
        }
    } else {
        tracing::warn!(
            "CORS: Allowing any origin (development mode). \
             Configure CORS_ALLOWED_ORIGINS for production."
        );
        base_layer.allow_origin(Any)
    }
}
