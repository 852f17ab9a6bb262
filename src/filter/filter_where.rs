use serde_json::Value;

use super::error::FilterError;
use super::filter::Filter;
use super::types::Condition;

/// Renders a [`Filter`] into a parameterised SQL boolean expression
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Returns an empty string for an empty filter
    pub fn generate(filter: &Filter, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        filter.validate()?;
        let mut filter_where = Self::new(starting_param_index);
        let sql = filter_where.build(filter);
        Ok((sql, filter_where.param_values))
    }

    fn build(&mut self, filter: &Filter) -> String {
        filter
            .conditions()
            .iter()
            .map(|condition| self.build_sql_condition(condition))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn build_sql_condition(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Eq { field, value } => {
                if value.is_null() {
                    format!("\"{}\" IS NULL", field)
                } else {
                    format!("\"{}\" = {}", field, self.param(value.clone()))
                }
            }
            Condition::OneOf { field, values } => {
                if values.is_empty() {
                    return "1=0".to_string();
                }
                let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                format!("\"{}\" IN ({})", field, params.join(", "))
            }
            Condition::Contains { field, needle } => {
                let pattern = format!("%{}%", escape_like(needle));
                format!("\"{}\" ILIKE {}", field, self.param(Value::String(pattern)))
            }
            Condition::Gte { field, value } => format!("\"{}\" >= {}", field, self.param(value.clone())),
            Condition::Lte { field, value } => format!("\"{}\" <= {}", field, self.param(value.clone())),
            Condition::Within { field, source, column, filter } => {
                let inner = self.build(filter);
                if inner.is_empty() {
                    format!("\"{}\" IN (SELECT \"{}\" FROM \"{}\")", field, column, source.table())
                } else {
                    format!(
                        "\"{}\" IN (SELECT \"{}\" FROM \"{}\" WHERE {})",
                        field,
                        column,
                        source.table(),
                        inner
                    )
                }
            }
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceType;
    use serde_json::json;

    #[test]
    fn nested_subselects_share_one_parameter_sequence() {
        let managed = Filter::new().eq("managerId", "m-1");
        let leases = Filter::new().within("propertyId", ResourceType::Property, "id", managed);
        let filter = Filter::new()
            .eq("status", "PENDING")
            .within("leaseId", ResourceType::Lease, "id", leases);

        let (sql, params) = FilterWhere::generate(&filter, 0).unwrap();
        assert_eq!(
            sql,
            "\"status\" = $1 AND \"leaseId\" IN (SELECT \"id\" FROM \"leases\" WHERE \"propertyId\" IN (SELECT \"id\" FROM \"properties\" WHERE \"managerId\" = $2))"
        );
        assert_eq!(params, vec![json!("PENDING"), json!("m-1")]);
    }

    #[test]
    fn starting_index_offsets_placeholders() {
        let filter = Filter::new().eq("id", "abc").gte("rent", 100);
        let (sql, _) = FilterWhere::generate(&filter, 1).unwrap();
        assert_eq!(sql, "\"id\" = $2 AND \"rent\" >= $3");
    }

    #[test]
    fn contains_escapes_wildcards() {
        let filter = Filter::new().contains("city", "50%_off");
        let (sql, params) = FilterWhere::generate(&filter, 0).unwrap();
        assert_eq!(sql, "\"city\" ILIKE $1");
        assert_eq!(params, vec![json!("%50\\%\\_off%")]);
    }

    #[test]
    fn empty_one_of_matches_nothing() {
        let filter = Filter::new().one_of("status", vec![]);
        let (sql, params) = FilterWhere::generate(&filter, 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn null_equality_uses_is_null() {
        let filter = Filter::new().eq("assignedTo", Value::Null);
        let (sql, params) = FilterWhere::generate(&filter, 0).unwrap();
        assert_eq!(sql, "\"assignedTo\" IS NULL");
        assert!(params.is_empty());
    }
}
