use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{Condition, FilterOrderInfo, SqlResult};
use crate::types::ResourceType;

/// Conjunction of conditions. Combining two filters never widens either one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq { field: field.into(), value: value.into() });
        self
    }

    pub fn one_of(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::OneOf { field: field.into(), values });
        self
    }

    pub fn contains(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.conditions.push(Condition::Contains { field: field.into(), needle: needle.into() });
        self
    }

    pub fn gte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Gte { field: field.into(), value: value.into() });
        self
    }

    pub fn lte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Lte { field: field.into(), value: value.into() });
        self
    }

    pub fn within(
        mut self,
        field: impl Into<String>,
        source: ResourceType,
        column: impl Into<String>,
        filter: Filter,
    ) -> Self {
        self.conditions.push(Condition::Within {
            field: field.into(),
            source,
            column: column.into(),
            filter,
        });
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Conjunction of `self` and `other`
    pub fn and(mut self, other: Filter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Validate every column name, recursing into sub-selects
    pub fn validate(&self) -> Result<(), FilterError> {
        for condition in &self.conditions {
            validate_identifier(condition.field())
                .map_err(|_| FilterError::InvalidColumn(condition.field().to_string()))?;
            if let Condition::Within { column, filter, .. } = condition {
                validate_identifier(column).map_err(|_| FilterError::InvalidColumn(column.clone()))?;
                filter.validate()?;
            }
        }
        Ok(())
    }

    /// `SELECT row_to_json(t) ...` with order and window
    pub fn to_select_sql(
        &self,
        table: &str,
        order: &[FilterOrderInfo],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<SqlResult, FilterError> {
        validate_table_name(table)?;
        let (where_clause, params) = FilterWhere::generate(self, 0)?;
        let order_clause = FilterOrder::generate(order)?;
        let limit_clause = match (limit, offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        };

        let query = [
            "SELECT row_to_json(t) AS row".to_string(),
            format!("FROM \"{}\" t", table),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    /// WHERE body only; placeholders start after `start_index`
    pub fn to_where_sql(&self, start_index: usize) -> Result<SqlResult, FilterError> {
        let (query, params) = FilterWhere::generate(self, start_index)?;
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self, table: &str) -> Result<SqlResult, FilterError> {
        validate_table_name(table)?;
        let where_result = self.to_where_sql(0)?;
        let query = if where_result.query.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\"", table)
        } else {
            format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", table, where_result.query)
        };
        Ok(SqlResult { query, params: where_result.params })
    }

    /// `total` is 0 when no row matches or every value is null
    pub fn to_sum_sql(&self, table: &str, column: &str) -> Result<SqlResult, FilterError> {
        validate_table_name(table)?;
        validate_identifier(column)?;
        let where_result = self.to_where_sql(0)?;
        let select = format!("SELECT COALESCE(SUM(\"{}\"), 0)::DOUBLE PRECISION AS total FROM \"{}\"", column, table);
        let query = if where_result.query.is_empty() {
            select
        } else {
            format!("{} WHERE {}", select, where_result.query)
        };
        Ok(SqlResult { query, params: where_result.params })
    }
}

fn validate_table_name(name: &str) -> Result<(), FilterError> {
    validate_identifier(name).map_err(|_| FilterError::InvalidTableName(name.to_string()))
}

/// Identifiers are `[A-Za-z_][A-Za-z0-9_]*`
pub fn validate_identifier(name: &str) -> Result<(), FilterError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(FilterError::InvalidColumn(name.to_string()))
    }
}
