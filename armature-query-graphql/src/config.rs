// Relatable options

use armature_query_core::{QueryError, Result};
use serde::Deserialize;
use std::env;

pub const ENABLE_TOTAL_COUNT_ENV: &str = "ARMATURE_QUERY_ENABLE_TOTAL_COUNT";
pub const ENABLE_AGGREGATE_ENV: &str = "ARMATURE_QUERY_ENABLE_AGGREGATE";

/// Options applied to every relation of a resolver composed with
/// [`Relatable`](crate::Relatable)
///
/// A relation can still opt in on its own through its descriptor; these
/// switches only widen what is enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RelatableOpts {
    /// Expose `totalCount` on many-relation connections
    pub enable_total_count: bool,

    /// Expose `{relation}Aggregate` fields for many relations
    pub enable_aggregate: bool,
}

impl RelatableOpts {
    /// Create options with everything disabled
    ///
    /// # Example
    ///
    /// ```
    /// use armature_query_graphql::RelatableOpts;
    ///
    /// let opts = RelatableOpts::new().with_total_count(true);
    /// assert!(opts.enable_total_count);
    /// assert!(!opts.enable_aggregate);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_total_count(mut self, enable: bool) -> Self {
        self.enable_total_count = enable;
        self
    }

    pub fn with_aggregate(mut self, enable: bool) -> Self {
        self.enable_aggregate = enable;
        self
    }

    /// Read options from `ARMATURE_QUERY_ENABLE_*` variables
    ///
    /// Unset variables keep the default. Accepts `1`/`0`/`true`/`false`.
    pub fn from_env() -> Result<Self> {
        let mut opts = Self::default();
        if let Some(enabled) = env_flag(ENABLE_TOTAL_COUNT_ENV)? {
            opts.enable_total_count = enabled;
        }
        if let Some(enabled) = env_flag(ENABLE_AGGREGATE_ENV)? {
            opts.enable_aggregate = enabled;
        }
        Ok(opts)
    }

    /// Parse options from a TOML document
    ///
    /// # Example
    ///
    /// ```
    /// use armature_query_graphql::RelatableOpts;
    ///
    /// let opts = RelatableOpts::from_toml_str("enable_aggregate = true").unwrap();
    /// assert!(opts.enable_aggregate);
    /// assert!(!opts.enable_total_count);
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| QueryError::Config(e.to_string()))
    }
}

fn env_flag(name: &str) -> Result<Option<bool>> {
    match env::var(name) {
        Ok(value) => parse_flag(&value)
            .map(Some)
            .ok_or_else(|| QueryError::Config(format!("{} must be a boolean, got {:?}", name, value))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(QueryError::Config(format!("{}: {}", name, e))),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
