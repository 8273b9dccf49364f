//! HTTP ingress: owns the listening socket and wraps module routers with the
//! shared middleware stack (request id, tracing, timeout, body limit, CORS).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{middleware::from_fn, routing::get, Extension, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

/// Owns the HTTP server and the OpenAPI document published by mounted modules.
pub struct ApiIngress {
    config: ApiIngressConfig,
    openapi: Option<utoipa::openapi::OpenApi>,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config,
            openapi: None,
        }
    }

    /// Merge a module's OpenAPI document into the one served at `/openapi.json`.
    pub fn with_openapi(mut self, doc: utoipa::openapi::OpenApi) -> Self {
        self.openapi = Some(match self.openapi.take() {
            Some(mut current) => {
                current.merge(doc);
                current
            }
            None => doc,
        });
        self
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Wrap module routes with ingress endpoints and middleware.
    ///
    /// Layers are applied innermost first; on the request path the order is
    /// SetRequestId -> PropagateRequestId -> Trace -> push_req_id -> Timeout -> BodyLimit.
    pub fn build_router(&self, routes: Router) -> Router {
        let mut router = routes
            .route("/health", get(web::health_check))
            .fallback(web::not_found);

        if self.config.enable_docs {
            if let Some(doc) = &self.openapi {
                router = router.route(
                    "/openapi.json",
                    get(web::openapi_json).layer(Extension(Arc::new(doc.clone()))),
                );
            }
        }

        let x_request_id = request_id::header();
        router = router
            .layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.request_timeout_sec,
            )))
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(request_id::create_trace_layer())
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.config
            .bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.config.bind_addr))
    }

    /// Bind the configured address and serve until `cancel` fires.
    pub async fn serve(&self, router: Router, cancel: CancellationToken) -> Result<()> {
        let addr = self.bind_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        serve_on(listener, router, cancel).await
    }
}

/// Serve on an already bound listener; used directly by tests binding port 0.
pub async fn serve_on(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> Result<()> {
    tracing::info!("HTTP server bound on {}", listener.local_addr()?);

    let shutdown = async move {
        cancel.cancelled().await;
        tracing::info!("HTTP server shutting down gracefully (cancellation)");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_is_validated() {
        let ingress = ApiIngress::new(ApiIngressConfig {
            bind_addr: "not-an-addr".into(),
            ..Default::default()
        });
        assert!(ingress.bind_addr().is_err());

        let ingress = ApiIngress::new(ApiIngressConfig::default());
        assert_eq!(ingress.bind_addr().unwrap().port(), 8087);
    }

    #[test]
    fn openapi_documents_are_merged() {
        use utoipa::openapi::{
            path::{OperationBuilder, PathItem},
            HttpMethod, OpenApiBuilder, PathsBuilder,
        };

        let doc = |path: &str| {
            OpenApiBuilder::new()
                .paths(
                    PathsBuilder::new()
                        .path(path, PathItem::new(HttpMethod::Get, OperationBuilder::new())),
                )
                .build()
        };

        let ingress = ApiIngress::new(ApiIngressConfig::default())
            .with_openapi(doc("/a"))
            .with_openapi(doc("/b"));

        let merged = ingress.openapi.unwrap();
        assert!(merged.paths.paths.contains_key("/a"));
        assert!(merged.paths.paths.contains_key("/b"));
    }
}
