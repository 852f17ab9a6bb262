use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use super::store::{Listing, Record, Store, StoreError, Window};
use crate::filter::{validate_identifier, Condition, Filter};
use crate::types::ResourceType;

type Tables = HashMap<ResourceType, Vec<Record>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnDelete {
    Restrict,
    Cascade,
}

struct ForeignKey {
    table: ResourceType,
    column: &'static str,
    references: ResourceType,
    on_delete: OnDelete,
}

impl ForeignKey {
    /// Postgres' default constraint name
    fn constraint(&self) -> String {
        format!("{}_{}_fkey", self.table.table(), self.column)
    }
}

/// The REFERENCES clauses of `migrations/0001_init.sql`
const FOREIGN_KEYS: &[ForeignKey] = &[
    fk(ResourceType::Property, "ownerId", ResourceType::User, OnDelete::Restrict),
    fk(ResourceType::Property, "managerId", ResourceType::User, OnDelete::Restrict),
    fk(ResourceType::Lease, "propertyId", ResourceType::Property, OnDelete::Cascade),
    fk(ResourceType::Lease, "tenantId", ResourceType::User, OnDelete::Restrict),
    fk(ResourceType::MaintenanceRequest, "propertyId", ResourceType::Property, OnDelete::Cascade),
    fk(ResourceType::MaintenanceRequest, "tenantId", ResourceType::User, OnDelete::Restrict),
    fk(ResourceType::MaintenanceRequest, "assignedTo", ResourceType::User, OnDelete::Restrict),
    fk(ResourceType::Payment, "leaseId", ResourceType::Lease, OnDelete::Cascade),
    fk(ResourceType::Payment, "tenantId", ResourceType::User, OnDelete::Restrict),
];

const fn fk(table: ResourceType, column: &'static str, references: ResourceType, on_delete: OnDelete) -> ForeignKey {
    ForeignKey { table, column, references, on_delete }
}

/// In-process store for tests and local development
///
/// Evaluates the same [`Filter`] conditions the SQL renderer emits, including
/// sub-selects against other tables under the same lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn rows(tables: &Tables, resource: ResourceType) -> &[Record] {
    tables.get(&resource).map(Vec::as_slice).unwrap_or(&[])
}

pub fn matches(tables: &Tables, record: &Record, filter: &Filter) -> bool {
    filter
        .conditions()
        .iter()
        .all(|condition| matches_condition(tables, record, condition))
}

fn matches_condition(tables: &Tables, record: &Record, condition: &Condition) -> bool {
    let actual = record.get(condition.field()).filter(|v| !v.is_null());
    match condition {
        Condition::Eq { value, .. } => match actual {
            None => value.is_null(),
            Some(actual) => values_equal(actual, value),
        },
        Condition::OneOf { values, .. } => actual.map_or(false, |a| values.iter().any(|v| values_equal(a, v))),
        Condition::Contains { needle, .. } => actual
            .and_then(Value::as_str)
            .map_or(false, |s| s.to_lowercase().contains(&needle.to_lowercase())),
        Condition::Gte { value, .. } => {
            actual.and_then(|a| compare(a, value)).map_or(false, |o| o != Ordering::Less)
        }
        Condition::Lte { value, .. } => {
            actual.and_then(|a| compare(a, value)).map_or(false, |o| o != Ordering::Greater)
        }
        Condition::Within { source, column, filter, .. } => match actual {
            None => false,
            Some(actual) => rows(tables, *source).iter().any(|parent| {
                parent.get(column).map_or(false, |c| values_equal(c, actual)) && matches(tables, parent, filter)
            }),
        },
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn newest_first(a: &Record, b: &Record) -> Ordering {
    let key = |r: &Record, field: &str| r.get(field).and_then(Value::as_str).unwrap_or("").to_string();
    key(b, "createdAt")
        .cmp(&key(a, "createdAt"))
        .then_with(|| key(b, "id").cmp(&key(a, "id")))
}

fn record_id(record: &Record) -> Option<String> {
    record.get("id").and_then(Value::as_str).map(str::to_string)
}

fn points_into(record: &Record, column: &str, ids: &HashSet<String>) -> bool {
    record.get(column).and_then(Value::as_str).map_or(false, |id| ids.contains(id))
}

/// Ids removed by deleting `ids` from `resource`, following cascading keys.
/// A restricting key that still points at a removed row fails the whole delete.
fn delete_closure(
    tables: &Tables,
    resource: ResourceType,
    ids: HashSet<String>,
) -> Result<HashMap<ResourceType, HashSet<String>>, StoreError> {
    let mut doomed: HashMap<ResourceType, HashSet<String>> = HashMap::new();
    doomed.insert(resource, ids.clone());
    let mut queue = vec![(resource, ids)];

    while let Some((parent, ids)) = queue.pop() {
        for key in FOREIGN_KEYS
            .iter()
            .filter(|key| key.references == parent && key.on_delete == OnDelete::Cascade)
        {
            let already = doomed.get(&key.table);
            let children: HashSet<String> = rows(tables, key.table)
                .iter()
                .filter(|r| points_into(r, key.column, &ids))
                .filter_map(record_id)
                .filter(|id| already.map_or(true, |set| !set.contains(id)))
                .collect();
            if !children.is_empty() {
                doomed.entry(key.table).or_default().extend(children.iter().cloned());
                queue.push((key.table, children));
            }
        }
    }

    for key in FOREIGN_KEYS.iter().filter(|key| key.on_delete == OnDelete::Restrict) {
        let Some(parents) = doomed.get(&key.references) else {
            continue;
        };
        let removed = doomed.get(&key.table);
        let blocked = rows(tables, key.table).iter().any(|r| {
            let going = record_id(r).map_or(false, |id| removed.map_or(false, |set| set.contains(&id)));
            !going && points_into(r, key.column, parents)
        });
        if blocked {
            return Err(StoreError::Referenced(key.constraint()));
        }
    }

    Ok(doomed)
}

fn unique_email_taken(tables: &Tables, resource: ResourceType, record: &Record, skip_id: Option<&Value>) -> bool {
    if resource != ResourceType::User {
        return false;
    }
    let Some(email) = record.get("email").and_then(Value::as_str) else {
        return false;
    };
    rows(tables, ResourceType::User).iter().any(|existing| {
        existing.get("id") != skip_id
            && existing
                .get("email")
                .and_then(Value::as_str)
                .map_or(false, |e| e.eq_ignore_ascii_case(email))
    })
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, resource: ResourceType, filter: &Filter, window: Window) -> Result<Listing, StoreError> {
        filter.validate()?;
        let tables = self.tables.read().await;
        let mut matched: Vec<&Record> = rows(&tables, resource)
            .iter()
            .filter(|r| matches(&tables, r, filter))
            .collect();
        matched.sort_by(|a, b| newest_first(a, b));

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .map(|r| Value::Object(r.clone()))
            .collect();
        Ok(Listing { items, total })
    }

    async fn find_one(&self, resource: ResourceType, filter: &Filter) -> Result<Option<Value>, StoreError> {
        Ok(self.list(resource, filter, Window::first(1)).await?.items.into_iter().next())
    }

    async fn count(&self, resource: ResourceType, filter: &Filter) -> Result<u64, StoreError> {
        filter.validate()?;
        let tables = self.tables.read().await;
        Ok(rows(&tables, resource).iter().filter(|r| matches(&tables, r, filter)).count() as u64)
    }

    async fn sum(&self, resource: ResourceType, filter: &Filter, column: &str) -> Result<f64, StoreError> {
        filter.validate()?;
        validate_identifier(column)?;
        let tables = self.tables.read().await;
        Ok(rows(&tables, resource)
            .iter()
            .filter(|r| matches(&tables, r, filter))
            .filter_map(|r| r.get(column).and_then(Value::as_f64))
            .sum())
    }

    async fn insert(&self, resource: ResourceType, record: Record) -> Result<Value, StoreError> {
        let mut tables = self.tables.write().await;
        if unique_email_taken(&tables, resource, &record, None) {
            return Err(StoreError::Duplicate("users_email_key".to_string()));
        }
        if let Some(id) = record.get("id") {
            if rows(&tables, resource).iter().any(|r| r.get("id") == Some(id)) {
                return Err(StoreError::Duplicate(format!("{}_pkey", resource.table())));
            }
        }
        tables.entry(resource).or_default().push(record.clone());
        Ok(Value::Object(record))
    }

    async fn update(&self, resource: ResourceType, filter: &Filter, changes: Record) -> Result<Option<Value>, StoreError> {
        filter.validate()?;
        let mut tables = self.tables.write().await;

        // Decide under the same guard that performs the write
        let position = rows(&tables, resource).iter().position(|r| matches(&tables, r, filter));
        let Some(position) = position else {
            return Ok(None);
        };

        let current_id = rows(&tables, resource)[position].get("id").cloned();
        if unique_email_taken(&tables, resource, &changes, current_id.as_ref()) {
            return Err(StoreError::Duplicate("users_email_key".to_string()));
        }

        let table = tables.entry(resource).or_default();
        let record = &mut table[position];
        for (key, value) in changes {
            record.insert(key, value);
        }
        Ok(Some(Value::Object(record.clone())))
    }

    async fn delete(&self, resource: ResourceType, filter: &Filter) -> Result<bool, StoreError> {
        filter.validate()?;
        if filter.is_empty() {
            return Err(StoreError::Query("refusing unscoped delete".to_string()));
        }
        let mut tables = self.tables.write().await;
        let matched: HashSet<String> = rows(&tables, resource)
            .iter()
            .filter(|r| matches(&tables, r, filter))
            .filter_map(record_id)
            .collect();
        if matched.is_empty() {
            return Ok(false);
        }

        let doomed = delete_closure(&tables, resource, matched)?;
        for (table, ids) in &doomed {
            if let Some(records) = tables.get_mut(table) {
                records.retain(|r| record_id(r).map_or(true, |id| !ids.contains(&id)));
            }
        }
        Ok(true)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    async fn store_with_fixture() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert(ResourceType::Property, record(json!({ "id": "p-1", "managerId": "m-1", "city": "San Francisco", "rent": 2500, "createdAt": "2024-01-01T00:00:00.000Z" })))
            .await
            .unwrap();
        store
            .insert(ResourceType::Property, record(json!({ "id": "p-2", "managerId": "m-2", "city": "Oakland", "rent": 1800.0, "createdAt": "2024-01-02T00:00:00.000Z" })))
            .await
            .unwrap();
        store
            .insert(ResourceType::Lease, record(json!({ "id": "l-1", "propertyId": "p-1", "status": "ACTIVE", "createdAt": "2024-01-03T00:00:00.000Z" })))
            .await
            .unwrap();
        store
            .insert(ResourceType::Lease, record(json!({ "id": "l-2", "propertyId": "p-2", "status": "ACTIVE", "createdAt": "2024-01-04T00:00:00.000Z" })))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn sums_mixed_numbers_inside_the_filter() {
        let store = store_with_fixture().await;
        let all = store.sum(ResourceType::Property, &Filter::new(), "rent").await.unwrap();
        assert_eq!(all, 4300.0);
        let oakland = Filter::new().eq("city", "Oakland");
        assert_eq!(store.sum(ResourceType::Property, &oakland, "rent").await.unwrap(), 1800.0);
        assert_eq!(store.sum(ResourceType::Lease, &Filter::new(), "rent").await.unwrap(), 0.0);
        assert!(store.sum(ResourceType::Property, &Filter::new(), "rent;").await.is_err());
    }

    #[tokio::test]
    async fn lists_newest_first_with_total() {
        let store = store_with_fixture().await;
        let listing = store.list(ResourceType::Property, &Filter::new(), Window::first(1)).await.unwrap();
        assert_eq!(listing.total, 2);
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0]["id"], "p-2");
    }

    #[tokio::test]
    async fn within_consults_parent_table() {
        let store = store_with_fixture().await;
        let scoped = Filter::new().within("propertyId", ResourceType::Property, "id", Filter::new().eq("managerId", "m-1"));
        let listing = store.list(ResourceType::Lease, &scoped, Window::first(10)).await.unwrap();
        assert_eq!(listing.total, 1);
        assert_eq!(listing.items[0]["id"], "l-1");
    }

    #[tokio::test]
    async fn numeric_and_text_conditions() {
        let store = store_with_fixture().await;
        let cheap = Filter::new().lte("rent", 2000);
        assert_eq!(store.count(ResourceType::Property, &cheap).await.unwrap(), 1);

        let sf = Filter::new().contains("city", "francisco");
        assert_eq!(store.count(ResourceType::Property, &sf).await.unwrap(), 1);

        let exact = Filter::new().eq("rent", 1800);
        assert_eq!(store.count(ResourceType::Property, &exact).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn scoped_update_misses_out_of_scope_rows() {
        let store = store_with_fixture().await;
        let filter = Filter::new().eq("id", "p-2").eq("managerId", "m-1");
        let updated = store
            .update(ResourceType::Property, &filter, record(json!({ "rent": 1 })))
            .await
            .unwrap();
        assert!(updated.is_none());

        let filter = Filter::new().eq("id", "p-1").eq("managerId", "m-1");
        let updated = store
            .update(ResourceType::Property, &filter, record(json!({ "rent": 1 })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["rent"], 1);
        assert_eq!(updated["city"], "San Francisco");
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_matched() {
        let store = store_with_fixture().await;
        assert!(!store.delete(ResourceType::Lease, &Filter::new().eq("id", "nope")).await.unwrap());
        assert!(store.delete(ResourceType::Lease, &Filter::new().eq("id", "l-1")).await.unwrap());
        assert_eq!(store.count(ResourceType::Lease, &Filter::new()).await.unwrap(), 1);
        assert!(store.delete(ResourceType::Lease, &Filter::new()).await.is_err());
    }

    #[tokio::test]
    async fn property_delete_cascades_to_leases_payments_and_requests() {
        let store = store_with_fixture().await;
        store
            .insert(ResourceType::Payment, record(json!({ "id": "pay-1", "leaseId": "l-1" })))
            .await
            .unwrap();
        store
            .insert(ResourceType::Payment, record(json!({ "id": "pay-2", "leaseId": "l-2" })))
            .await
            .unwrap();
        store
            .insert(ResourceType::MaintenanceRequest, record(json!({ "id": "m-1", "propertyId": "p-1" })))
            .await
            .unwrap();

        assert!(store.delete(ResourceType::Property, &Filter::new().eq("id", "p-1")).await.unwrap());

        let all = Filter::new();
        assert_eq!(store.count(ResourceType::Lease, &all).await.unwrap(), 1);
        assert!(store.exists(ResourceType::Lease, &all.clone().eq("id", "l-2")).await.unwrap());
        assert_eq!(store.count(ResourceType::Payment, &all).await.unwrap(), 1);
        assert!(store.exists(ResourceType::Payment, &all.clone().eq("id", "pay-2")).await.unwrap());
        assert_eq!(store.count(ResourceType::MaintenanceRequest, &all).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn referenced_user_cannot_be_deleted() {
        let store = MemoryStore::new();
        store
            .insert(ResourceType::User, record(json!({ "id": "u-1", "email": "owner@example.com" })))
            .await
            .unwrap();
        store
            .insert(ResourceType::User, record(json!({ "id": "u-2", "email": "loner@example.com" })))
            .await
            .unwrap();
        store
            .insert(ResourceType::Property, record(json!({ "id": "p-1", "ownerId": "u-1" })))
            .await
            .unwrap();

        let err = store
            .delete(ResourceType::User, &Filter::new().eq("id", "u-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Referenced(ref name) if name == "properties_ownerId_fkey"));
        assert_eq!(store.count(ResourceType::User, &Filter::new()).await.unwrap(), 2);
        assert_eq!(store.count(ResourceType::Property, &Filter::new()).await.unwrap(), 1);

        assert!(store.delete(ResourceType::User, &Filter::new().eq("id", "u-2")).await.unwrap());
    }

    #[tokio::test]
    async fn user_email_is_unique() {
        let store = MemoryStore::new();
        store
            .insert(ResourceType::User, record(json!({ "id": "u-1", "email": "a@example.com" })))
            .await
            .unwrap();
        let err = store
            .insert(ResourceType::User, record(json!({ "id": "u-2", "email": "A@example.com" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn null_equality() {
        let store = MemoryStore::new();
        store
            .insert(ResourceType::MaintenanceRequest, record(json!({ "id": "m-1", "assignedTo": null })))
            .await
            .unwrap();
        store
            .insert(ResourceType::MaintenanceRequest, record(json!({ "id": "m-2", "assignedTo": "u-1" })))
            .await
            .unwrap();
        let unassigned = Filter::new().eq("assignedTo", Value::Null);
        assert_eq!(store.count(ResourceType::MaintenanceRequest, &unassigned).await.unwrap(), 1);
    }
}
