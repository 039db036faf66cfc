//! Handler registration and lookup.
//!
//! # Responsibilities
//! - Store a controller type's handlers in declaration order
//! - Look up the handler for a request's method + path parameters
//! - Return the matched binding or an explicit NotFound
//!
//! # Design Decisions
//! - Immutable after construction (shared via `Arc` without locks)
//! - O(n) scan in declaration order; first match wins
//! - A descriptor registered twice is kept but flagged: the later binding
//!   can never be selected

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::descriptor::{PathParams, RouteDescriptor};
use crate::codec::BoxError;
use crate::controller::Call;
use crate::dispatch::PipelineError;
use crate::http::Response;

/// Future returned by a handler invocation.
pub type HandlerFuture = BoxFuture<'static, Result<Response, BoxError>>;

type Invoke<C> = Arc<dyn Fn(Arc<C>, Call) -> HandlerFuture + Send + Sync>;

/// One registered handler: its route and how to call it.
pub struct HandlerBinding<C> {
    route: RouteDescriptor,
    params: Vec<String>,
    invoke: Invoke<C>,
}

impl<C> HandlerBinding<C> {
    pub fn route(&self) -> &RouteDescriptor {
        &self.route
    }

    /// Formal parameter names in declared order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Call the handler on `controller`.
    pub fn invoke(&self, controller: Arc<C>, call: Call) -> HandlerFuture {
        (self.invoke)(controller, call)
    }
}

impl<C> fmt::Debug for HandlerBinding<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("route", &self.route)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Ordered handler table for controller type `C`.
pub struct HandlerRegistry<C> {
    bindings: Vec<HandlerBinding<C>>,
}

impl<C: Send + Sync + 'static> HandlerRegistry<C> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Register a handler for `method` requiring exactly the path
    /// parameters in `params`. Arguments are bound in the order given.
    pub fn route<F, Fut>(mut self, method: &str, params: &[&str], handler: F) -> Self
    where
        F: Fn(Arc<C>, Call) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
    {
        let route = RouteDescriptor::new(method, params.iter().copied());
        if let Some(earlier) = self.bindings.iter().position(|b| b.route == route) {
            tracing::warn!(
                route = %route,
                shadowed_by = earlier,
                "Handler registered twice; later registration is unreachable"
            );
        }

        let invoke: Invoke<C> = Arc::new(move |controller: Arc<C>, call: Call| -> HandlerFuture {
            Box::pin(handler(controller, call))
        });
        self.bindings.push(HandlerBinding {
            route,
            params: params.iter().map(|p| p.to_string()).collect(),
            invoke,
        });
        self
    }
}

impl<C> HandlerRegistry<C> {
    /// Find the first binding matching the request.
    pub fn find(
        &self,
        method: &str,
        params: Option<&PathParams>,
    ) -> Result<&HandlerBinding<C>, PipelineError> {
        self.bindings
            .iter()
            .find(|binding| binding.route.matches(method, params))
            .ok_or_else(|| {
                let mut names: Vec<String> = params
                    .map(|p| p.keys().cloned().collect())
                    .unwrap_or_default();
                names.sort();
                PipelineError::NotFound {
                    method: method.to_string(),
                    params: names,
                }
            })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &HandlerBinding<C>> {
        self.bindings.iter()
    }
}

impl<C: Send + Sync + 'static> Default for HandlerRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for HandlerRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.bindings.iter().map(|b| &b.route))
            .finish()
    }
}
