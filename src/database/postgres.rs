use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::{PgPool, Postgres, Row};

use super::store::{Listing, Record, Store, StoreError, Window};
use crate::filter::{validate_identifier, Filter, FilterOrder, SqlResult};
use crate::types::ResourceType;

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// PostgreSQL store; rows travel as JSON in both directions
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_rows(&self, sql: &SqlResult) -> Result<Vec<Value>, StoreError> {
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<Value, _>("row").map_err(StoreError::from))
            .collect()
    }
}

fn bind_param<'q>(q: PgQuery<'q>, v: &Value) -> PgQuery<'q> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.clone()),
        // Arrays and objects go in as JSONB
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}

/// `INSERT` one JSON object, columns missing from it become NULL
pub fn insert_sql(table: &str) -> Result<String, StoreError> {
    validate_identifier(table)?;
    Ok(format!(
        "WITH ins AS (INSERT INTO \"{t}\" SELECT * FROM jsonb_populate_record(NULL::\"{t}\", $1) RETURNING *) \
         SELECT row_to_json(ins) AS row FROM ins",
        t = table
    ))
}

/// `UPDATE` only the keys present in `$1`; the filter's placeholders start at `$2`
pub fn update_sql(table: &str, columns: &[&str], filter: &Filter) -> Result<SqlResult, StoreError> {
    validate_identifier(table)?;
    if columns.is_empty() {
        return Err(StoreError::Query("update without columns".to_string()));
    }
    for column in columns {
        validate_identifier(column)?;
    }
    let where_result = filter.to_where_sql(1)?;
    if where_result.query.is_empty() {
        return Err(StoreError::Query("refusing unscoped update".to_string()));
    }

    let targets = columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ");
    let sources = columns.iter().map(|c| format!("r.\"{}\"", c)).collect::<Vec<_>>().join(", ");

    Ok(SqlResult {
        query: format!(
            "WITH upd AS (UPDATE \"{t}\" SET ({targets}) = (SELECT {sources} FROM jsonb_populate_record(NULL::\"{t}\", $1) r) \
             WHERE {w} RETURNING *) SELECT row_to_json(upd) AS row FROM upd",
            t = table,
            targets = targets,
            sources = sources,
            w = where_result.query
        ),
        params: where_result.params,
    })
}

pub fn delete_sql(table: &str, filter: &Filter) -> Result<SqlResult, StoreError> {
    validate_identifier(table)?;
    let where_result = filter.to_where_sql(0)?;
    if where_result.query.is_empty() {
        return Err(StoreError::Query("refusing unscoped delete".to_string()));
    }
    Ok(SqlResult {
        query: format!("DELETE FROM \"{}\" WHERE {}", table, where_result.query),
        params: where_result.params,
    })
}

#[async_trait]
impl Store for PgStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self, resource: ResourceType, filter: &Filter, window: Window) -> Result<Listing, StoreError> {
        let select = filter.to_select_sql(
            resource.table(),
            &FilterOrder::newest_first(),
            Some(window.limit),
            Some(window.offset),
        )?;
        let items = self.fetch_rows(&select).await?;
        let total = self.count(resource, filter).await?;
        Ok(Listing { items, total })
    }

    async fn find_one(&self, resource: ResourceType, filter: &Filter) -> Result<Option<Value>, StoreError> {
        let select = filter.to_select_sql(resource.table(), &FilterOrder::newest_first(), Some(1), None)?;
        Ok(self.fetch_rows(&select).await?.into_iter().next())
    }

    async fn count(&self, resource: ResourceType, filter: &Filter) -> Result<u64, StoreError> {
        let sql = filter.to_count_sql(resource.table())?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn sum(&self, resource: ResourceType, filter: &Filter, column: &str) -> Result<f64, StoreError> {
        let sql = filter.to_sum_sql(resource.table(), column)?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        Ok(row.try_get("total")?)
    }

    async fn insert(&self, resource: ResourceType, record: Record) -> Result<Value, StoreError> {
        let sql = insert_sql(resource.table())?;
        let row = sqlx::query(&sql)
            .bind(Value::Object(record))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<Value, _>("row")?)
    }

    async fn update(&self, resource: ResourceType, filter: &Filter, changes: Record) -> Result<Option<Value>, StoreError> {
        let columns: Vec<&str> = changes.keys().map(String::as_str).collect();
        let sql = update_sql(resource.table(), &columns, filter)?;

        let mut q = sqlx::query(&sql.query).bind(Value::Object(changes.clone()));
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let row = q.fetch_optional(&self.pool).await?;
        row.map(|r| r.try_get::<Value, _>("row").map_err(StoreError::from)).transpose()
    }

    async fn delete(&self, resource: ResourceType, filter: &Filter) -> Result<bool, StoreError> {
        let sql = delete_sql(resource.table(), filter)?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_goes_through_jsonb_populate_record() {
        let sql = insert_sql("leases").unwrap();
        assert!(sql.contains("jsonb_populate_record(NULL::\"leases\", $1)"));
        assert!(sql.ends_with("SELECT row_to_json(ins) AS row FROM ins"));
    }

    #[test]
    fn update_scopes_where_after_payload_param() {
        let filter = Filter::new().eq("id", "l-1").within(
            "propertyId",
            ResourceType::Property,
            "id",
            Filter::new().eq("ownerId", "o-1"),
        );
        let sql = update_sql("leases", &["status", "updatedAt"], &filter).unwrap();
        assert_eq!(
            sql.query,
            "WITH upd AS (UPDATE \"leases\" SET (\"status\", \"updatedAt\") = (SELECT r.\"status\", r.\"updatedAt\" FROM jsonb_populate_record(NULL::\"leases\", $1) r) \
             WHERE \"id\" = $2 AND \"propertyId\" IN (SELECT \"id\" FROM \"properties\" WHERE \"ownerId\" = $3) RETURNING *) SELECT row_to_json(upd) AS row FROM upd"
        );
        assert_eq!(sql.params, vec![json!("l-1"), json!("o-1")]);
    }

    #[test]
    fn unscoped_writes_are_refused() {
        assert!(update_sql("leases", &["status"], &Filter::new()).is_err());
        assert!(delete_sql("leases", &Filter::new()).is_err());
        assert!(update_sql("leases", &[], &Filter::new().eq("id", "x")).is_err());
    }

    #[test]
    fn column_names_are_validated() {
        let filter = Filter::new().eq("id", "x");
        assert!(matches!(
            update_sql("leases", &["status\" = 'x'; --"], &filter),
            Err(StoreError::Filter(_))
        ));
    }

    #[test]
    fn delete_binds_every_value() {
        let sql = delete_sql("properties", &Filter::new().eq("id", "p-1").eq("managerId", "m-1")).unwrap();
        assert_eq!(sql.query, "DELETE FROM \"properties\" WHERE \"id\" = $1 AND \"managerId\" = $2");
        assert_eq!(sql.params.len(), 2);
    }
}
