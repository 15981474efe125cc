// Query model shared by resolvers and query services

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Opaque filter passed through to the query service
///
/// Filter syntax belongs to the service implementation; resolvers only
/// forward what the client sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(pub Value);

impl Filter {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// A filter with no conditions
    pub fn empty() -> Self {
        Self(Value::Object(Default::default()))
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Offset based paging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

impl Paging {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    pub fn offset_or_zero(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortNulls {
    NullsFirst,
    NullsLast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
    #[serde(default)]
    pub nulls: Option<SortNulls>,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
            nulls: None,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
            nulls: None,
        }
    }
}

/// Filter, paging and sorting for a list query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub paging: Paging,
    #[serde(default)]
    pub sorting: Vec<SortField>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_paging(mut self, paging: Paging) -> Self {
        self.paging = paging;
        self
    }

    pub fn with_sorting(mut self, sorting: Vec<SortField>) -> Self {
        self.sorting = sorting;
        self
    }
}

/// Fields requested per aggregate function
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateQuery {
    #[serde(default)]
    pub count: Vec<String>,
    #[serde(default)]
    pub sum: Vec<String>,
    #[serde(default)]
    pub avg: Vec<String>,
    #[serde(default)]
    pub min: Vec<String>,
    #[serde(default)]
    pub max: Vec<String>,
}

impl AggregateQuery {
    pub fn is_empty(&self) -> bool {
        self.count.is_empty()
            && self.sum.is_empty()
            && self.avg.is_empty()
            && self.min.is_empty()
            && self.max.is_empty()
    }

    /// Record `field` under the aggregate function named `function`
    ///
    /// Returns `false` for an unknown function name.
    pub fn push(&mut self, function: &str, field: impl Into<String>) -> bool {
        let target = match function {
            "count" => &mut self.count,
            "sum" => &mut self.sum,
            "avg" => &mut self.avg,
            "min" => &mut self.min,
            "max" => &mut self.max,
            _ => return false,
        };
        target.push(field.into());
        true
    }
}

/// Aggregate results keyed by field name per function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResponse {
    #[serde(default)]
    pub count: BTreeMap<String, Value>,
    #[serde(default)]
    pub sum: BTreeMap<String, Value>,
    #[serde(default)]
    pub avg: BTreeMap<String, Value>,
    #[serde(default)]
    pub min: BTreeMap<String, Value>,
    #[serde(default)]
    pub max: BTreeMap<String, Value>,
}

impl AggregateResponse {
    /// Results for the aggregate function named `function`
    pub fn group(&self, function: &str) -> Option<&BTreeMap<String, Value>> {
        match function {
            "count" => Some(&self.count),
            "sum" => Some(&self.sum),
            "avg" => Some(&self.avg),
            "min" => Some(&self.min),
            "max" => Some(&self.max),
            _ => None,
        }
    }
}
