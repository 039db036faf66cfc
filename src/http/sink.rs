//! Response sinks.
//!
//! A sink is where a finished response goes. The server bridge uses a
//! oneshot channel back to the axum handler; tests plug in their own.

use axum::body::Bytes;
use axum::http::Response;
use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::sync::oneshot;

/// Error delivering a response.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The other end went away (client disconnected, task dropped).
    #[error("response receiver disconnected")]
    Disconnected,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for exactly one finished response.
pub trait ResponseSink: Send + 'static {
    /// Hand the response over and finalize the exchange.
    fn deliver(self: Box<Self>, response: Response<Bytes>) -> BoxFuture<'static, Result<(), SinkError>>;
}

impl ResponseSink for oneshot::Sender<Response<Bytes>> {
    fn deliver(self: Box<Self>, response: Response<Bytes>) -> BoxFuture<'static, Result<(), SinkError>> {
        let result = (*self).send(response).map_err(|_| SinkError::Disconnected);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oneshot_sink_delivers() {
        let (tx, rx) = oneshot::channel();
        let sink: Box<dyn ResponseSink> = Box::new(tx);
        sink.deliver(Response::new(Bytes::from_static(b"hi")))
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap().body(), &Bytes::from_static(b"hi"));
    }

    #[tokio::test]
    async fn oneshot_sink_reports_disconnect() {
        let (tx, rx) = oneshot::channel::<Response<Bytes>>();
        drop(rx);
        let sink: Box<dyn ResponseSink> = Box::new(tx);
        let err = sink.deliver(Response::new(Bytes::new())).await.unwrap_err();
        assert!(matches!(err, SinkError::Disconnected));
    }
}
