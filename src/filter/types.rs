use serde_json::Value;

use super::filter::Filter;
use crate::types::ResourceType;

/// A single predicate of a conjunctive filter
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field = value` (`IS NULL` for null)
    Eq { field: String, value: Value },
    /// `field IN (values...)`; an empty list matches nothing
    OneOf { field: String, values: Vec<Value> },
    /// Case-insensitive substring match
    Contains { field: String, needle: String },
    Gte { field: String, value: Value },
    Lte { field: String, value: Value },
    /// `field IN (SELECT column FROM source WHERE filter)`
    Within {
        field: String,
        source: ResourceType,
        column: String,
        filter: Filter,
    },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Eq { field, .. }
            | Condition::OneOf { field, .. }
            | Condition::Contains { field, .. }
            | Condition::Gte { field, .. }
            | Condition::Lte { field, .. }
            | Condition::Within { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
