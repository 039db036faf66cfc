//! Media type parsing and comparison.
//!
//! # Responsibilities
//! - Parse `Content-Type` values into type/subtype
//! - Compare media types for body admission
//!
//! # Design Decisions
//! - Type and subtype are lowercased on parse (RFC 9110 case-insensitivity)
//! - Parameters (`charset=...`) are ignored for matching
//! - No wildcard support: admission is an exact type + subtype match

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned for a malformed media type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid media type: {0:?}")]
pub struct MediaTypeError(pub String);

/// A parsed `type/subtype` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    primary: String,
    sub: String,
}

impl MediaType {
    /// Create a media type from its two halves.
    pub fn new(primary: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            primary: primary.into().to_ascii_lowercase(),
            sub: sub.into().to_ascii_lowercase(),
        }
    }

    /// `application/json`.
    pub fn json() -> Self {
        Self::new("application", "json")
    }

    /// `text/plain`.
    pub fn text() -> Self {
        Self::new("text", "plain")
    }

    /// `application/x-www-form-urlencoded`.
    pub fn form() -> Self {
        Self::new("application", "x-www-form-urlencoded")
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn sub(&self) -> &str {
        &self.sub
    }

    /// Returns true if both type and subtype are equal.
    pub fn matches(&self, other: &MediaType) -> bool {
        self.primary == other.primary && self.sub == other.sub
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or_default().trim();
        let (primary, sub) = essence
            .split_once('/')
            .ok_or_else(|| MediaTypeError(s.to_string()))?;
        let (primary, sub) = (primary.trim(), sub.trim());

        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+*".contains(&b))
        };
        if !valid(primary) || !valid(sub) {
            return Err(MediaTypeError(s.to_string()));
        }

        Ok(Self::new(primary, sub))
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.primary, self.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_parameters() {
        let mt: MediaType = "Application/JSON; charset=utf-8".parse().unwrap();
        assert_eq!(mt, MediaType::json());
        assert_eq!(mt.to_string(), "application/json");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("json".parse::<MediaType>().is_err());
        assert!("/json".parse::<MediaType>().is_err());
        assert!("text/".parse::<MediaType>().is_err());
        assert!("te xt/plain".parse::<MediaType>().is_err());
    }

    #[test]
    fn matching_is_exact() {
        assert!(MediaType::json().matches(&"application/json".parse().unwrap()));
        assert!(!MediaType::json().matches(&MediaType::text()));
        assert!(!MediaType::json().matches(&"application/*".parse().unwrap()));
    }
}
