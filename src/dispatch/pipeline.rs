//! The request pipeline for one controller.
//!
//! ```text
//! lookup → body admission → decode → bind → invoke → encode → write
//! └──── PipelineError ────────────┘  └──── Unhandled ──────┘
//! ```
//!
//! Every call to [`Dispatcher::process`] ends with exactly one response
//! delivered to the context's sink.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::http::header::CONTENT_TYPE;
use futures_util::FutureExt;
use tracing::Instrument;

use super::error::{HandlerPanic, PipelineError, Stage, Unhandled};
use super::exception;
use crate::controller::{BindError, Call, Controller, ControllerConfig};
use crate::http::{RequestContext, Response};
use crate::observability::metrics;
use crate::routing::{HandlerBinding, HandlerRegistry};

/// How a request left the pipeline early.
enum Failure {
    Pipeline(PipelineError),
    Unhandled(Unhandled),
}

impl From<PipelineError> for Failure {
    fn from(err: PipelineError) -> Self {
        Failure::Pipeline(err)
    }
}

impl From<Unhandled> for Failure {
    fn from(err: Unhandled) -> Self {
        Failure::Unhandled(err)
    }
}

/// Routes requests to handlers on one controller instance.
pub struct Dispatcher<C> {
    name: &'static str,
    controller: Arc<C>,
    registry: Arc<HandlerRegistry<C>>,
    config: ControllerConfig,
}

impl<C: Controller> Dispatcher<C> {
    /// Build a dispatcher, registering `C`'s handlers.
    pub fn new(controller: C) -> Self {
        Self::with_registry(Arc::new(controller), Arc::new(C::routes()))
    }

    /// Build a dispatcher around an existing handler table, so several
    /// instances of the same controller type can share it.
    pub fn with_registry(controller: Arc<C>, registry: Arc<HandlerRegistry<C>>) -> Self {
        let config = controller.config();
        let name = std::any::type_name::<C>()
            .rsplit("::")
            .next()
            .unwrap_or("controller");
        tracing::debug!(controller = name, routes = ?registry, "Dispatcher built");
        Self {
            name,
            controller,
            registry,
            config,
        }
    }

    /// Replace the controller's own config.
    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry<C>> {
        &self.registry
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Process one request to completion. Never fails: every outcome is
    /// written to the context's response sink.
    pub async fn process(&self, mut ctx: RequestContext) {
        let start_time = Instant::now();
        let span = tracing::info_span!(
            "dispatch",
            controller = self.name,
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
        );

        async {
            match self.run(&mut ctx).await {
                Ok(()) => {}
                Err(Failure::Pipeline(err)) => {
                    exception::write_pipeline_error(&mut ctx, &err).await;
                }
                Err(Failure::Unhandled(err)) => {
                    metrics::record_unhandled(self.name, err.stage());
                    let handler = Arc::clone(self.config.exception_handler());
                    handler(&mut ctx, err).await;
                    if !ctx.response().is_closed() {
                        tracing::warn!("Exception handler left the response open; closing it");
                        if let Err(e) = ctx.response_mut().close().await {
                            tracing::debug!(error = %e, "Failed to deliver response");
                        }
                    }
                }
            }

            let status = ctx.response().status();
            metrics::record_request(self.name, ctx.method().as_str(), status.as_u16(), start_time);
            tracing::debug!(
                status = status.as_u16(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Request dispatched"
            );
        }
        .instrument(span)
        .await
    }

    async fn run(&self, ctx: &mut RequestContext) -> Result<(), Failure> {
        // 1. Lookup
        let binding = self
            .registry
            .find(ctx.method().as_str(), ctx.path_params())?;
        tracing::debug!(route = %binding.route(), "Handler matched");

        // 2. Body admission, 3. decode
        self.decode_body(ctx)?;

        // 4. Bind
        let args = bind_arguments(binding, ctx).map_err(|e| Unhandled::new(Stage::Bind, e))?;
        let body = ctx.take_body();
        let call = Call::new(ctx.request_id(), args, body, ctx.headers().clone());

        // 5. Invoke
        let response = AssertUnwindSafe(binding.invoke(Arc::clone(&self.controller), call))
            .catch_unwind()
            .await
            .map_err(|payload| Unhandled::new(Stage::Invoke, HandlerPanic::from_payload(payload)))?
            .map_err(|e| Unhandled::new(Stage::Invoke, e))?;

        // 6. Encode, 7. write
        self.write_response(ctx, response).await
    }

    fn decode_body(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        if !ctx.has_body() {
            return Ok(());
        }

        let unsupported = || PipelineError::UnsupportedMediaType {
            method: ctx.method().clone(),
            content_type: ctx.content_type_raw(),
            accepted: self.config.accepted().to_vec(),
        };
        let media_type = match ctx.content_type() {
            Some(media_type) if self.config.accepts(media_type) => media_type,
            _ => return Err(unsupported()),
        };
        let decoder = match self.config.decoders().get(media_type) {
            Some(decoder) => decoder,
            None => {
                tracing::warn!(media_type = %media_type, "Accepted media type has no decoder");
                return Err(unsupported());
            }
        };

        let value = decoder(&ctx.raw_body()[..]).map_err(PipelineError::BadRequest)?;
        ctx.set_body(value);
        Ok(())
    }

    async fn write_response(&self, ctx: &mut RequestContext, response: Response) -> Result<(), Failure> {
        let (status, headers, body) = response.into_parts();
        let bytes = match body {
            Some(value) => Some((self.config.encoder())(&value).map_err(|e| Unhandled::new(Stage::Encode, e))?),
            None => None,
        };

        let writer = ctx.response_mut();
        writer.set_status(status);
        writer.append_headers(headers);
        writer
            .headers_mut()
            .insert(CONTENT_TYPE, self.config.response_content_type().clone());
        if let Some(bytes) = bytes {
            writer.write(&bytes);
        }
        if let Err(e) = writer.close().await {
            tracing::warn!(error = %e, "Failed to deliver response");
        }
        Ok(())
    }
}

/// Looks up each declared parameter, in order, in the path parameters.
fn bind_arguments<C>(binding: &HandlerBinding<C>, ctx: &RequestContext) -> Result<Vec<String>, BindError> {
    binding
        .params()
        .iter()
        .map(|name| {
            ctx.path_param(name)
                .map(str::to_string)
                .ok_or_else(|| BindError::MissingParameter(name.clone()))
        })
        .collect()
}
