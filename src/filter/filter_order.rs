use super::error::FilterError;
use super::filter::validate_identifier;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Default listing order: newest first, id as tie-breaker so pages are stable
    pub fn newest_first() -> Vec<FilterOrderInfo> {
        vec![
            FilterOrderInfo { column: "createdAt".to_string(), sort: SortDirection::Desc },
            FilterOrderInfo { column: "id".to_string(), sort: SortDirection::Desc },
        ]
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if infos.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(infos.len());
        for info in infos {
            validate_identifier(&info.column).map_err(|_| FilterError::InvalidColumn(info.column.clone()))?;
            parts.push(format!("\"{}\" {}", info.column, info.sort.to_sql()));
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}
