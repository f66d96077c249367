//! HTTP routes for the administration API
//!
//! - `/api/repo/reindex/` - rebuild and requeue every repository
//! - `/api/repo/index/` - queue one repository by URL
//! - `/api/repo/list/` - list registered repositories
//! - `/api/repo/delete/` - queue a repository for deletion
//! - `/api/repo/add/` - register a repository
//! - `/health` - liveness check
//!
//! Operation responses are always `200 OK` with an [`ApiResponse`] body;
//! failures are reported in the body.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{FromRequest, FromRequestParts, Query, Request, State},
    http::{Method, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tracing::info;

use super::params::RequestParams;
use super::response::ApiResponse;
use super::service::RepositoryAdminService;

type SharedService = Arc<RepositoryAdminService>;

/// Request parameters from the query string, with a POST form body merged
/// over them
struct Params(RequestParams);

impl<S: Send + Sync> FromRequest<S> for Params {
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let Query(mut params) = Query::<RequestParams>::from_request_parts(&mut parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let is_form = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));

        if parts.method == Method::POST && is_form {
            let req = Request::from_parts(parts, body);
            let Form(form) = Form::<RequestParams>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            params.merge(form);
        }

        Ok(Params(params))
    }
}

/// Create the router for the administration API.
pub fn create_router(service: SharedService) -> Router {
    Router::new()
        .route("/api/repo/reindex/", get(reindex_handler).post(reindex_handler))
        .route("/api/repo/index/", get(index_handler).post(index_handler))
        .route("/api/repo/list/", get(list_handler))
        .route("/api/repo/delete/", get(delete_handler).post(delete_handler))
        .route("/api/repo/add/", get(add_handler).post(add_handler))
        .route("/health", get(health_handler))
        .with_state(service)
}

async fn reindex_handler(
    State(service): State<SharedService>,
    Params(params): Params,
) -> Json<ApiResponse> {
    Json(service.reindex_all(&params).await)
}

async fn index_handler(
    State(service): State<SharedService>,
    Params(params): Params,
) -> Json<ApiResponse> {
    Json(service.index_one(&params).await)
}

async fn list_handler(
    State(service): State<SharedService>,
    Params(params): Params,
) -> Json<ApiResponse> {
    Json(service.list(&params).await)
}

async fn delete_handler(
    State(service): State<SharedService>,
    Params(params): Params,
) -> Json<ApiResponse> {
    Json(service.delete(&params).await)
}

async fn add_handler(
    State(service): State<SharedService>,
    Params(params): Params,
) -> Json<ApiResponse> {
    Json(service.add(&params).await)
}

/// Handler for `/health`.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Serve the administration API on `addr` until `shutdown` resolves.
pub async fn start_server(
    addr: SocketAddr,
    service: SharedService,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let router = create_router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Serving repository API on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
