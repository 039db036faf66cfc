//! HTTP server setup and the bridge into the dispatch pipeline.
//!
//! # Responsibilities
//! - Create the Axum Router with one route per mounted path template
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Buffer the request body and build a `RequestContext`
//! - Hand the context to the controller's `Dispatcher` and return what it
//!   delivered to the oneshot sink
//! - Serve until the shutdown signal fires

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::controller::Controller;
use crate::dispatch::Dispatcher;
use crate::http::request::{RequestContext, RequestIdLayer};
use crate::routing::PathParams;

/// HTTP front end for one or more controllers.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a server with no controllers mounted.
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            router: Router::new(),
            config,
        }
    }

    /// Route every method on `template` (axum syntax, e.g. `/items/{id}`)
    /// to `dispatcher`. Captured segments become the request's path
    /// parameters; a template without captures yields none.
    pub fn mount<C: Controller>(mut self, template: &str, dispatcher: Arc<Dispatcher<C>>) -> Self {
        let limit = self.config.limits.max_body_size;
        tracing::info!(
            template = template,
            controller = dispatcher.name(),
            routes = dispatcher.registry().len(),
            "Controller mounted"
        );

        let handler = if template.contains('{') {
            any(
                move |Path(params): Path<HashMap<String, String>>, request: Request| {
                    let dispatcher = Arc::clone(&dispatcher);
                    async move { bridge(dispatcher, Some(params), request, limit).await }
                },
            )
        } else {
            any(move |request: Request| {
                let dispatcher = Arc::clone(&dispatcher);
                async move { bridge(dispatcher, None, request, limit).await }
            })
        };

        self.router = self.router.route(template, handler);
        self
    }

    /// The fully layered router, for embedding or in-process testing.
    #[allow(deprecated)]
    pub fn into_router(self) -> Router {
        self.router
            .layer(RequestBodyLimitLayer::new(self.config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server on `listener` until `shutdown` fires, then let
    /// in-flight requests finish.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

async fn bridge<C: Controller>(
    dispatcher: Arc<Dispatcher<C>>,
    params: Option<PathParams>,
    request: Request,
    limit: usize,
) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, limit = limit, "Failed to buffer request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large\n").into_response();
        }
    };

    let (tx, rx) = oneshot::channel();
    let ctx = RequestContext::from_parts(parts, body, params, Box::new(tx));
    dispatcher.process(ctx).await;

    match rx.await {
        Ok(response) => response.map(Body::from),
        Err(_) => {
            tracing::error!(controller = dispatcher.name(), "Pipeline finished without a response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
