//! Route descriptor matching.
//!
//! # Responsibilities
//! - Describe one handler's HTTP method and required path parameters
//! - Decide whether a request's method + parameter set selects it
//!
//! # Design Decisions
//! - Method matching is case-insensitive
//! - Required names are a set: equal cardinality plus presence of every
//!   required name is exact set equality
//! - Absent and empty parameter maps are treated alike

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Named path parameters extracted upstream from the request URI.
pub type PathParams = HashMap<String, String>;

/// Matching rule for a single handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteDescriptor {
    method: String,
    required: BTreeSet<String>,
}

impl RouteDescriptor {
    /// Create a descriptor. The method is normalized to uppercase and
    /// duplicate parameter names collapse into one.
    pub fn new<I, S>(method: &str, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method: method.to_ascii_uppercase(),
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }

    pub fn param_count(&self) -> usize {
        self.required.len()
    }

    /// Returns true if a request with this method and these path
    /// parameters selects the handler.
    pub fn matches(&self, method: &str, params: Option<&PathParams>) -> bool {
        if !self.method.eq_ignore_ascii_case(method) {
            return false;
        }
        match params {
            None => self.required.is_empty(),
            Some(params) if params.is_empty() => self.required.is_empty(),
            Some(params) => {
                params.len() == self.required.len()
                    && self.required.iter().all(|name| params.contains_key(name))
            }
        }
    }
}

impl fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.method)?;
        for (i, name) in self.required.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", name)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> PathParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_no_params() {
        let list = RouteDescriptor::new("GET", Vec::<String>::new());
        let by_id = RouteDescriptor::new("GET", ["id"]);

        assert!(list.matches("GET", None));
        assert!(list.matches("GET", Some(&PathParams::new())));
        assert!(!by_id.matches("GET", None));
        assert!(!by_id.matches("GET", Some(&PathParams::new())));
    }

    #[test]
    fn test_method_case_insensitive() {
        let route = RouteDescriptor::new("get", ["id"]);
        assert_eq!(route.method(), "GET");
        assert!(route.matches("GET", Some(&params(&[("id", "5")]))));
        assert!(route.matches("Get", Some(&params(&[("id", "5")]))));
        assert!(!route.matches("POST", Some(&params(&[("id", "5")]))));
    }

    #[test]
    fn test_param_presence() {
        let route = RouteDescriptor::new("GET", ["id"]);
        assert!(route.matches("GET", Some(&params(&[("id", "5")]))));
        assert!(!route.matches("GET", Some(&params(&[("name", "5")]))));
        assert!(!route.matches("GET", Some(&params(&[("id", "5"), ("name", "x")]))));
    }

    #[test]
    fn test_duplicate_names_collapse() {
        // ["id", "id"] used to need two parameters while only ever checking
        // for one name; as a set it requires exactly {id}.
        let route = RouteDescriptor::new("GET", ["id", "id"]);
        assert_eq!(route.param_count(), 1);
        assert!(route.matches("GET", Some(&params(&[("id", "5")]))));
        assert!(!route.matches("GET", Some(&params(&[("id", "5"), ("other", "6")]))));
    }

    #[test]
    fn test_distinct_descriptors() {
        assert_eq!(
            RouteDescriptor::new("get", ["a", "b"]),
            RouteDescriptor::new("GET", ["b", "a"])
        );
        assert_ne!(
            RouteDescriptor::new("GET", ["a"]),
            RouteDescriptor::new("PUT", ["a"])
        );
        assert_eq!(RouteDescriptor::new("get", ["b", "a"]).to_string(), "GET {a, b}");
    }
}
