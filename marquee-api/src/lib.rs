use axum::{
    extract::{ConnectInfo, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod signature;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/", get(root))
        .merge(routes::shows::routes(state.clone()))
        .merge(routes::bookings::routes(state.clone()))
        .merge(routes::users::routes(state.clone()))
        .merge(routes::admin::routes(state.clone()))
        .merge(routes::catalog::routes(state.clone()))
        .merge(routes::webhooks::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn root() -> &'static str {
    "Server is live"
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    // Peer address is only present when served with connect-info; without it
    // (e.g. in-process tests) the limiter is skipped.
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    if let Some(ip) = ip {
        let key = format!("ratelimit:{ip}");
        match state
            .rate_limiter
            .check(&key, state.rules.rate_limit_per_minute, 60)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                return (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response()
            }
            Err(_) => {} // Fail open
        }
    }

    next.run(req).await
}
