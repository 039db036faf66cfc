//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::http::Response;
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;

use controller_dispatch::config::ServiceConfig;
use controller_dispatch::http::{ResponseSink, SinkError};
use controller_dispatch::{HttpServer, Shutdown};

/// Sink that records every delivery, for asserting exactly-once writes.
#[derive(Clone, Default)]
pub struct RecordingSink {
    deliveries: Arc<Mutex<Vec<Response<Bytes>>>>,
}

impl RecordingSink {
    pub fn boxed(&self) -> Box<dyn ResponseSink> {
        Box::new(self.clone())
    }

    pub fn count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    /// The single delivered response. Panics unless exactly one arrived.
    pub fn only(&self) -> Response<Bytes> {
        let mut deliveries = self.deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 1, "expected exactly one delivery");
        deliveries.pop().unwrap()
    }
}

impl ResponseSink for RecordingSink {
    fn deliver(self: Box<Self>, response: Response<Bytes>) -> BoxFuture<'static, Result<(), SinkError>> {
        self.deliveries.lock().unwrap().push(response);
        Box::pin(async { Ok(()) })
    }
}

/// Bind `addr` and serve until the returned coordinator fires.
pub async fn start_server(addr: SocketAddr, build: impl FnOnce(HttpServer) -> HttpServer) -> Shutdown {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = addr.to_string();
    config.limits.max_body_size = 1024;

    let server = build(HttpServer::new(config));
    let listener = TcpListener::bind(addr).await.unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
