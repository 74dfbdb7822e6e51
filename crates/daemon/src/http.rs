use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::api;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let drive = Router::new()
        .route("/login", get(api::login))
        .route("/login/callback", get(api::login_callback))
        .route("/upload", post(api::upload))
        .route("/download/{file_id}", get(api::download));

    let app = Router::new().route("/", get(api::health));
    let prefix = state.config.normalized_prefix();
    let app = if prefix.is_empty() {
        app.merge(drive)
    } else {
        app.nest(&prefix, drive)
    };

    let body_limit = usize::try_from(state.settings.multipart_body_limit()).unwrap_or(usize::MAX);

    app.layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(state.clone(), https_redirect))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_headers(Any).allow_methods(Any);
    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

/// Redirects requests that reached a TLS-terminating proxy over plain HTTP.
async fn https_redirect(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(port) = state.config.https_port else {
        return next.run(request).await;
    };
    let plain_http = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("http"));
    if !plain_http {
        return next.run(request).await;
    }
    let Some(host) = request_host(request.headers(), request.uri()) else {
        warn!(uri = %request.uri(), "no host to redirect plain-HTTP request to");
        return next.run(request).await;
    };

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let location = https_location(host, port, path_and_query);
    (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response()
}

/// Host name of the request without its port.
///
/// HTTP/2 requests carry `:authority` in the URI instead of a Host header.
pub fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> Option<&'a str> {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .map(host_without_port)
        .filter(|h| !h.is_empty())
}

pub fn https_location(host: &str, port: u16, path_and_query: &str) -> String {
    if port == 443 {
        format!("https://{host}{path_and_query}")
    } else {
        format!("https://{host}:{port}{path_and_query}")
    }
}

fn host_without_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal, e.g. [::1]:5000
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}
