//! Query identities for cache entries
//!
//! A key names one server query: a collection plus optional parameters,
//! rendered as `collection` or `collection:k=v,k2=v2` (e.g. `product-list:page=2`).
//! Parameters are kept sorted so equal queries always produce equal keys.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::identity::CollectionKind;

const PAGE_PARAM: &str = "page";

/// Logical identity of one cached query
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey {
    collection: String,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    /// Key for a whole collection with no parameters
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            params: BTreeMap::new(),
        }
    }

    /// Key for the unparameterized list of a collection
    pub fn of(kind: CollectionKind) -> Self {
        Self::new(kind.as_str())
    }

    /// Key for one page of a collection (pages are 1-based)
    pub fn page(kind: CollectionKind, page: u32) -> Self {
        Self::of(kind).with(PAGE_PARAM, page.to_string())
    }

    /// Add or replace a parameter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Collection name
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Parameter value
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Page number, if this key is paged
    pub fn page_number(&self) -> Option<u32> {
        self.param(PAGE_PARAM).and_then(|p| p.parse().ok())
    }

    /// The same query at another page
    pub fn at_page(&self, page: u32) -> Self {
        self.clone().with(PAGE_PARAM, page.to_string())
    }

    /// True if both keys query the same collection
    pub fn same_collection(&self, other: &QueryKey) -> bool {
        self.collection == other.collection
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.collection)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, ":{}", params.join(","))?;
        }
        Ok(())
    }
}

impl FromStr for QueryKey {
    type Err = QueryKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (collection, params) = match s.split_once(':') {
            Some((c, p)) => (c, Some(p)),
            None => (s, None),
        };
        if collection.is_empty() {
            return Err(QueryKeyError::MissingCollection(s.to_string()));
        }

        let mut key = QueryKey::new(collection);
        if let Some(params) = params {
            for pair in params.split(',').filter(|p| !p.is_empty()) {
                let (k, v) = pair
                    .split_once('=')
                    .ok_or_else(|| QueryKeyError::MalformedParam(pair.to_string()))?;
                key = key.with(k, v);
            }
        }
        Ok(key)
    }
}

/// Errors that can occur when parsing query keys
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryKeyError {
    #[error("query key '{0}' has no collection")]
    MissingCollection(String),

    #[error("malformed query parameter '{0}' (expected name=value)")]
    MalformedParam(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_paged_key() {
        let key = QueryKey::page(CollectionKind::Product, 2);
        assert_eq!(key.to_string(), "product-list:page=2");
        assert_eq!(key.page_number(), Some(2));
    }

    #[test]
    fn test_params_are_order_independent() {
        let a = QueryKey::new("product-list").with("page", "1").with("status", "active");
        let b = QueryKey::new("product-list").with("status", "active").with("page", "1");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "product-list:page=1,status=active");
    }

    #[test]
    fn test_parse_roundtrip() {
        let key: QueryKey = "product-list:page=3".parse().unwrap();
        assert_eq!(key.collection(), "product-list");
        assert_eq!(key.page_number(), Some(3));

        let plain: QueryKey = "categories".parse().unwrap();
        assert_eq!(plain, QueryKey::of(CollectionKind::Category));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ":page=1".parse::<QueryKey>(),
            Err(QueryKeyError::MissingCollection(_))
        ));
        assert!(matches!(
            "product-list:page".parse::<QueryKey>(),
            Err(QueryKeyError::MalformedParam(_))
        ));
    }

    #[test]
    fn test_at_page_keeps_other_params() {
        let key = QueryKey::new("product-list").with("status", "active").with("page", "1");
        let next = key.at_page(2);
        assert_eq!(next.param("status"), Some("active"));
        assert_eq!(next.page_number(), Some(2));
        assert!(key.same_collection(&next));
    }
}
