//! Bound arguments handed to a handler.

use std::str::FromStr;

use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Errors extracting typed data from a [`Call`].
#[derive(Debug, Error)]
pub enum BindError {
    /// A declared parameter has no value in the request's path parameters.
    #[error("missing path parameter {0:?}")]
    MissingParameter(String),

    #[error("no argument at position {0}")]
    NoSuchArgument(usize),

    #[error("argument {index} ({value:?}) is invalid: {reason}")]
    InvalidArgument {
        index: usize,
        value: String,
        reason: String,
    },

    #[error("request has no body")]
    MissingBody,

    #[error("request body has the wrong shape: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

/// Positional string arguments plus the decoded body for one invocation.
#[derive(Debug, Clone, Default)]
pub struct Call {
    request_id: String,
    args: Vec<String>,
    body: Option<Value>,
    headers: HeaderMap,
}

impl Call {
    pub fn new(
        request_id: impl Into<String>,
        args: Vec<String>,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            args,
            body,
            headers,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Arguments in the handler's declared parameter order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Parses the argument at `index`.
    pub fn parse_arg<T>(&self, index: usize) -> Result<T, BindError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.arg(index).ok_or(BindError::NoSuchArgument(index))?;
        value.parse().map_err(|e: T::Err| BindError::InvalidArgument {
            index,
            value: value.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Deserializes the decoded body into `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        let body = self.body.as_ref().ok_or(BindError::MissingBody)?;
        Ok(T::deserialize(body)?)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        name: String,
    }

    #[test]
    fn parse_arguments() {
        let call = Call::new("r", vec!["42".into(), "abc".into()], None, HeaderMap::new());
        assert_eq!(call.parse_arg::<u64>(0).unwrap(), 42);
        assert!(matches!(
            call.parse_arg::<u64>(1),
            Err(BindError::InvalidArgument { index: 1, .. })
        ));
        assert!(matches!(call.parse_arg::<u64>(2), Err(BindError::NoSuchArgument(2))));
    }

    #[test]
    fn body_extraction() {
        let call = Call::new("r", vec![], Some(json!({"name": "widget"})), HeaderMap::new());
        assert_eq!(call.body_as::<Item>().unwrap(), Item { name: "widget".into() });

        let wrong = Call::new("r", vec![], Some(json!([1, 2])), HeaderMap::new());
        assert!(matches!(wrong.body_as::<Item>(), Err(BindError::InvalidBody(_))));

        let empty = Call::default();
        assert!(matches!(empty.body_as::<Item>(), Err(BindError::MissingBody)));
    }
}
