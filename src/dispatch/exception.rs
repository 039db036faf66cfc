//! Failure translation.
//!
//! # Responsibilities
//! - Write `PipelineError`s as status + extra headers + message line
//! - Hold the replaceable handler for everything else
//! - Provide the default handler: log path, error and trace, answer 500
//!
//! # Design Decisions
//! - The process-wide default is set at most once, at startup
//! - Error details from unhandled failures never reach the client

use std::sync::{Arc, OnceLock};

use axum::http::StatusCode;
use futures_util::future::BoxFuture;

use super::error::{PipelineError, Unhandled};
use crate::http::RequestContext;

/// Handles failures that are not [`PipelineError`]s. It owns the response
/// for the rest of the request and is expected to close it.
pub type ExceptionHandler =
    Arc<dyn for<'a> Fn(&'a mut RequestContext, Unhandled) -> BoxFuture<'a, ()> + Send + Sync>;

static DEFAULT_HANDLER: OnceLock<ExceptionHandler> = OnceLock::new();

/// Install the process-wide default exception handler.
///
/// Only the first call takes effect; later calls get their handler back.
/// Controller configs created before installation keep the built-in one.
pub fn install_default_exception_handler(handler: ExceptionHandler) -> Result<(), ExceptionHandler> {
    DEFAULT_HANDLER.set(handler)
}

/// The installed default, or [`log_and_fail`].
pub fn default_handler() -> ExceptionHandler {
    match DEFAULT_HANDLER.get() {
        Some(handler) => Arc::clone(handler),
        None => Arc::new(log_and_fail),
    }
}

/// Built-in handler: log, answer 500 with no body, close.
pub fn log_and_fail(ctx: &mut RequestContext, error: Unhandled) -> BoxFuture<'_, ()> {
    Box::pin(async move {
        tracing::error!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            stage = %error.stage(),
            error = %error.cause(),
            trace = %error.trace(),
            "Unhandled error while dispatching request"
        );
        let response = ctx.response_mut();
        response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        if let Err(e) = response.close().await {
            tracing::debug!(error = %e, "Failed to deliver error response");
        }
    })
}

/// Write a pipeline error to the response and close it.
pub async fn write_pipeline_error(ctx: &mut RequestContext, error: &PipelineError) {
    tracing::debug!(
        request_id = %ctx.request_id(),
        status = error.status().as_u16(),
        error = %error,
        "Request rejected by pipeline"
    );

    let response = ctx.response_mut();
    response.set_status(error.status());
    response.append_headers(error.headers());
    if let Some(message) = error.message() {
        response.write_line(&message);
    }
    if let Err(e) = response.close().await {
        tracing::debug!(error = %e, "Failed to deliver error response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MediaType;
    use crate::dispatch::Stage;
    use axum::http::{Method, Response};
    use axum::body::Bytes;
    use tokio::sync::oneshot;

    fn context() -> (RequestContext, oneshot::Receiver<Response<Bytes>>) {
        let (tx, rx) = oneshot::channel();
        let ctx = RequestContext::builder(Method::POST, "/items").build(Box::new(tx));
        (ctx, rx)
    }

    #[tokio::test]
    async fn default_handler_answers_500_without_detail() {
        let (mut ctx, rx) = context();
        log_and_fail(&mut ctx, Unhandled::new(Stage::Invoke, "secret detail")).await;

        assert!(ctx.response().is_closed());
        let response = rx.await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn pipeline_error_writes_status_headers_message() {
        let (mut ctx, rx) = context();
        let error = PipelineError::UnsupportedMediaType {
            method: Method::POST,
            content_type: Some("text/plain".into()),
            accepted: vec![MediaType::json()],
        };
        write_pipeline_error(&mut ctx, &error).await;

        let response = rx.await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(response.headers()["accept-post"], "application/json");
        assert_eq!(
            response.body(),
            &Bytes::from("unsupported media type text/plain; expected one of: application/json\n")
        );
    }
}
