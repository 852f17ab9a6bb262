use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{now_timestamp, strip_hidden, ServiceError};
use crate::auth::{PasswordHasher, Principal};
use crate::database::{Record, Store, StoreError, Window};
use crate::filter::Filter;
use crate::policy::{self, PolicyError};
use crate::types::{Operation, ResourceType};
use crate::validation::schemas::{self, PageQuery};
use crate::validation::ValidationErrors;

/// One page of a scoped listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

impl Page {
    pub fn pages(&self) -> u64 {
        if self.limit == 0 {
            0
        } else {
            self.total.div_ceil(self.limit)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub page: Page,
    /// Normalised search parameters, echoed back to the caller
    pub filters: Map<String, Value>,
}

/// Validate, authorize, run the scoped store call, shape the record
#[derive(Clone)]
pub struct ResourceService {
    store: Arc<dyn Store>,
    passwords: PasswordHasher,
}

impl ResourceService {
    pub fn new(store: Arc<dyn Store>, passwords: PasswordHasher) -> Self {
        Self { store, passwords }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub async fn list(&self, principal: &Principal, resource: ResourceType, query: &Value) -> Result<Page, ServiceError> {
        require(principal, resource, Operation::List)?;
        let mut params = schemas::for_resource(resource).list.validate(query)?;
        let page = take_page(&mut params);
        let requested = params
            .into_iter()
            .fold(Filter::new(), |filter, (field, value)| filter.eq(field, value));
        self.list_scoped(principal, resource, requested, page).await
    }

    pub async fn search_properties(&self, principal: &Principal, query: &Value) -> Result<SearchResult, ServiceError> {
        require(principal, ResourceType::Property, Operation::List)?;
        let mut params = schemas::SEARCH_PROPERTIES.validate(query)?;
        let filters = params.clone();
        let page = take_page(&mut params);

        let mut requested = Filter::new();
        for (field, value) in params {
            requested = match (field.as_str(), value) {
                ("city" | "state", Value::String(needle)) => requested.contains(field.as_str(), needle),
                ("minRent", value) => requested.gte("rent", value),
                ("maxRent", value) => requested.lte("rent", value),
                ("bathrooms", value) => requested.gte("bathrooms", value),
                (_, value) => requested.eq(field.as_str(), value),
            };
        }

        let page = self.list_scoped(principal, ResourceType::Property, requested, page).await?;
        Ok(SearchResult { page, filters })
    }

    async fn list_scoped(
        &self,
        principal: &Principal,
        resource: ResourceType,
        requested: Filter,
        page: PageQuery,
    ) -> Result<Page, ServiceError> {
        let effective = policy::authorize(principal, resource, Operation::List, requested)?;
        let window = Window { offset: page.offset(), limit: page.limit };
        let listing = self.store.list(resource, &effective, window).await?;

        Ok(Page {
            items: listing.items.into_iter().map(|item| strip_hidden(resource, item)).collect(),
            page: page.page,
            limit: page.limit,
            total: listing.total,
        })
    }

    pub async fn get(&self, principal: &Principal, resource: ResourceType, id: &str) -> Result<Value, ServiceError> {
        let effective = policy::authorize(principal, resource, Operation::Read, by_id(id))?;
        self.store
            .find_one(resource, &effective)
            .await?
            .map(|record| strip_hidden(resource, record))
            .ok_or_else(|| not_found(resource, Operation::Read))
    }

    pub async fn create(&self, principal: &Principal, resource: ResourceType, body: &Value) -> Result<Value, ServiceError> {
        require(principal, resource, Operation::Create)?;
        let input = schemas::for_resource(resource).create.validate(body)?;
        let grant = policy::authorize_create(principal, resource, input)?;

        for requirement in &grant.requirements {
            if !self.store.exists(requirement.source, &requirement.filter).await? {
                return Err(not_found(requirement.subject, Operation::Create));
            }
        }

        let mut record = grant.record;
        self.check_references(resource, &record, Operation::Create).await?;
        self.check_consistency(resource, &record).await?;

        if resource == ResourceType::User {
            if let Some(password) = record.get("password").and_then(Value::as_str).map(str::to_string) {
                let digest = self.passwords.hash(&password).await?;
                record.insert("password".to_string(), Value::String(digest));
            }
        }

        apply_defaults(resource, &mut record);
        let id = stamp_new(&mut record);

        let created = match self.store.insert(resource, record).await {
            Ok(created) => created,
            Err(StoreError::Duplicate(_)) if resource == ResourceType::User => {
                return Err(ServiceError::Conflict("User already exists with this email".to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        info!("{} {} created {} {}", principal.role, principal.id, resource, id);
        Ok(strip_hidden(resource, created))
    }

    pub async fn update(
        &self,
        principal: &Principal,
        resource: ResourceType,
        id: &str,
        body: &Value,
    ) -> Result<Value, ServiceError> {
        require(principal, resource, Operation::Update)?;
        let changes = schemas::for_resource(resource).update.validate(body)?;
        let effective = policy::authorize_update(principal, resource, Operation::Update, by_id(id), &changes)?;
        self.check_references(resource, &changes, Operation::Update).await?;

        if matches!(resource, ResourceType::Lease | ResourceType::Payment) {
            let mut merged = match self.store.find_one(resource, &effective).await? {
                Some(Value::Object(current)) => current,
                _ => return Err(not_found(resource, Operation::Update)),
            };
            merged.extend(changes.clone());
            self.check_consistency(resource, &merged).await?;
        }

        self.apply(principal, resource, Operation::Update, effective, changes).await
    }

    pub async fn delete(&self, principal: &Principal, resource: ResourceType, id: &str) -> Result<(), ServiceError> {
        let effective = policy::authorize(principal, resource, Operation::Delete, by_id(id))?;
        if !self.store.exists(resource, &effective).await? {
            return Err(not_found(resource, Operation::Delete));
        }

        if resource == ResourceType::Property {
            let active = Filter::new().eq("propertyId", id).eq("status", "ACTIVE");
            if self.store.exists(ResourceType::Lease, &active).await? {
                return Err(ServiceError::Rejected("Cannot delete property with active leases".to_string()));
            }
        }

        if !self.store.delete(resource, &effective).await? {
            return Err(not_found(resource, Operation::Delete));
        }

        info!("{} {} deleted {} {}", principal.role, principal.id, resource, id);
        Ok(())
    }

    pub async fn transition_status(
        &self,
        principal: &Principal,
        resource: ResourceType,
        id: &str,
        body: &Value,
    ) -> Result<Value, ServiceError> {
        require(principal, resource, Operation::StatusTransition)?;
        let schema = schemas::for_resource(resource).status.ok_or(PolicyError::Forbidden)?;
        let mut changes = schema.validate(body)?;
        let effective =
            policy::authorize_update(principal, resource, Operation::StatusTransition, by_id(id), &changes)?;

        let status = changes.get("status").and_then(Value::as_str).map(str::to_string);
        match (resource, status.as_deref()) {
            (ResourceType::MaintenanceRequest, Some("COMPLETED")) => {
                changes.insert("completedAt".to_string(), json!(now_timestamp()));
            }
            (ResourceType::Payment, Some("PAID")) => {
                changes.insert("paidDate".to_string(), json!(now_timestamp()));
            }
            _ => {}
        }

        self.apply(principal, resource, Operation::StatusTransition, effective, changes).await
    }

    pub async fn assign(&self, principal: &Principal, id: &str, body: &Value) -> Result<Value, ServiceError> {
        let resource = ResourceType::MaintenanceRequest;
        require(principal, resource, Operation::Assign)?;
        let changes = schemas::ASSIGN_MAINTENANCE.validate(body)?;
        let effective = policy::authorize_update(principal, resource, Operation::Assign, by_id(id), &changes)?;
        self.check_references(resource, &changes, Operation::Assign).await?;
        self.apply(principal, resource, Operation::Assign, effective, changes).await
    }

    pub async fn process_payment(&self, principal: &Principal, id: &str, body: &Value) -> Result<Value, ServiceError> {
        let resource = ResourceType::Payment;
        require(principal, resource, Operation::Process)?;
        let mut changes = schemas::PROCESS_PAYMENT.validate(body)?;
        let effective = policy::authorize(principal, resource, Operation::Process, by_id(id))?;

        let current = self
            .store
            .find_one(resource, &effective)
            .await?
            .ok_or_else(|| not_found(resource, Operation::Process))?;
        let status = current.get("status").cloned().unwrap_or(Value::Null);
        if status == "PAID" {
            return Err(already_processed());
        }

        changes.insert("status".to_string(), json!("PAID"));
        changes.insert("paidDate".to_string(), json!(now_timestamp()));

        // Only settles if nobody changed the status since it was read
        let guarded = effective.eq("status", status);
        match self.apply(principal, resource, Operation::Process, guarded, changes).await {
            Err(ServiceError::Policy(PolicyError::NotFoundOrForbidden { .. })) => Err(already_processed()),
            other => other,
        }
    }

    async fn apply(
        &self,
        principal: &Principal,
        resource: ResourceType,
        operation: Operation,
        effective: Filter,
        mut changes: Record,
    ) -> Result<Value, ServiceError> {
        changes.insert("updatedAt".to_string(), json!(now_timestamp()));
        let updated = self
            .store
            .update(resource, &effective, changes)
            .await?
            .ok_or_else(|| not_found(resource, operation))?;

        let id = updated.get("id").and_then(Value::as_str).unwrap_or_default();
        info!("{} {} applied {:?} to {} {}", principal.role, principal.id, operation, resource, id);
        Ok(strip_hidden(resource, updated))
    }

    /// Every referenced id present in `record` must exist
    async fn check_references(
        &self,
        resource: ResourceType,
        record: &Record,
        operation: Operation,
    ) -> Result<(), ServiceError> {
        for (field, parent) in references(resource) {
            let Some(id) = record.get(*field).filter(|v| !v.is_null()) else {
                continue;
            };
            if !self.store.exists(*parent, &by_id(id.clone())).await? {
                return Err(not_found(*parent, operation));
            }
        }
        Ok(())
    }

    async fn check_consistency(&self, resource: ResourceType, record: &Record) -> Result<(), ServiceError> {
        match resource {
            ResourceType::Lease => {
                let start = record.get("startDate").and_then(Value::as_str);
                let end = record.get("endDate").and_then(Value::as_str);
                if let (Some(start), Some(end)) = (start, end) {
                    // Normalised timestamps compare correctly as text
                    if end <= start {
                        return Err(ValidationErrors::single("endDate", "End date must be after start date").into());
                    }
                }
                // Only stored leases have payments
                if let (Some(id), Some(tenant)) = (record.get("id"), record.get("tenantId")) {
                    let payments = Filter::new().eq("leaseId", id.clone());
                    let total = self.store.count(ResourceType::Payment, &payments).await?;
                    let same_tenant = self
                        .store
                        .count(ResourceType::Payment, &payments.eq("tenantId", tenant.clone()))
                        .await?;
                    if total != same_tenant {
                        return Err(ServiceError::Rejected(
                            "Lease has payments recorded for another tenant".to_string(),
                        ));
                    }
                }
            }
            ResourceType::Payment => {
                if let (Some(lease), Some(tenant)) = (record.get("leaseId"), record.get("tenantId")) {
                    let same_tenant = by_id(lease.clone()).eq("tenantId", tenant.clone());
                    if !self.store.exists(ResourceType::Lease, &same_tenant).await? {
                        return Err(ServiceError::Rejected("Tenant does not match the lease".to_string()));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn require(principal: &Principal, resource: ResourceType, operation: Operation) -> Result<(), PolicyError> {
    if policy::can(principal, resource, operation) {
        Ok(())
    } else {
        Err(PolicyError::Forbidden)
    }
}

fn not_found(resource: ResourceType, operation: Operation) -> ServiceError {
    PolicyError::NotFoundOrForbidden { resource, operation }.into()
}

fn already_processed() -> ServiceError {
    ServiceError::Conflict("Payment has already been processed".to_string())
}

fn by_id(id: impl Into<Value>) -> Filter {
    Filter::new().eq("id", id)
}

fn take_page(params: &mut Map<String, Value>) -> PageQuery {
    let page = params.remove("page").and_then(|v| v.as_u64()).unwrap_or(1);
    let limit = params.remove("limit").and_then(|v| v.as_u64()).unwrap_or(10);
    PageQuery { page, limit }
}

fn references(resource: ResourceType) -> &'static [(&'static str, ResourceType)] {
    use ResourceType::*;
    match resource {
        User => &[],
        Property => &[("ownerId", User), ("managerId", User)],
        Lease => &[("propertyId", Property), ("tenantId", User)],
        MaintenanceRequest => &[("propertyId", Property), ("tenantId", User), ("assignedTo", User)],
        Payment => &[("leaseId", Lease), ("tenantId", User)],
    }
}

/// Columns the stores would otherwise leave NULL
fn apply_defaults(resource: ResourceType, record: &mut Record) {
    let defaults = match resource {
        ResourceType::User => vec![("isActive", json!(true)), ("role", json!("TENANT"))],
        ResourceType::Property => vec![("status", json!("AVAILABLE")), ("country", json!("US"))],
        ResourceType::Lease | ResourceType::MaintenanceRequest | ResourceType::Payment => {
            vec![("status", json!("PENDING"))]
        }
    };
    for (field, value) in defaults {
        record.entry(field).or_insert(value);
    }
}

/// Assigns a fresh id and creation timestamps; returns the id
fn stamp_new(record: &mut Record) -> String {
    let id = Uuid::new_v4().to_string();
    let now = now_timestamp();
    record.insert("id".to_string(), json!(id));
    record.insert("createdAt".to_string(), json!(now));
    record.insert("updatedAt".to_string(), json!(now));
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{seed, MemoryStore};

    async fn service() -> ResourceService {
        let hasher = PasswordHasher::new(4);
        let store = MemoryStore::new();
        seed::seed(&store, &hasher).await.unwrap();
        ResourceService::new(Arc::new(store), hasher)
    }

    async fn principal(service: &ResourceService, email: &str) -> Principal {
        let user = service
            .store()
            .find_one(ResourceType::User, &Filter::new().eq("email", email))
            .await
            .unwrap()
            .unwrap();
        Principal {
            id: Uuid::parse_str(user["id"].as_str().unwrap()).unwrap(),
            email: email.to_string(),
            role: user["role"].as_str().unwrap().parse().unwrap(),
        }
    }

    async fn first(service: &ResourceService, who: &Principal, resource: ResourceType, query: Value) -> Value {
        let page = service.list(who, resource, &query).await.unwrap();
        page.items.into_iter().next().unwrap()
    }

    fn id_of(record: &Value) -> String {
        record["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn tenant_sees_only_available_properties() {
        let service = service().await;
        let tenant = principal(&service, "tenant1@example.com").await;

        let page = service.list(&tenant, ResourceType::Property, &json!({})).await.unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items.iter().all(|p| p["status"] == "AVAILABLE"));

        let occupied = service
            .list(&tenant, ResourceType::Property, &json!({ "status": "OCCUPIED" }))
            .await
            .unwrap();
        assert_eq!(occupied.total, 0);
    }

    #[tokio::test]
    async fn landlord_cannot_delete_another_landlords_property() {
        let service = service().await;
        let admin = principal(&service, "admin@example.com").await;
        service
            .create(
                &admin,
                ResourceType::User,
                &json!({
                    "email": "other@example.com",
                    "password": "otherpass1",
                    "firstName": "Other",
                    "lastName": "Owner",
                    "role": "LANDLORD"
                }),
            )
            .await
            .unwrap();
        let outsider = principal(&service, "other@example.com").await;
        let property = first(&service, &admin, ResourceType::Property, json!({ "status": "AVAILABLE" })).await;

        let err = service
            .delete(&outsider, ResourceType::Property, &id_of(&property))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Property not found or access denied");
        assert!(service.get(&admin, ResourceType::Property, &id_of(&property)).await.is_ok());
    }

    #[tokio::test]
    async fn property_with_active_lease_cannot_be_deleted() {
        let service = service().await;
        let landlord = principal(&service, "landlord@example.com").await;

        let leased = first(&service, &landlord, ResourceType::Property, json!({ "status": "OCCUPIED" })).await;
        let err = service
            .delete(&landlord, ResourceType::Property, &id_of(&leased))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(ref msg) if msg == "Cannot delete property with active leases"));

        let vacant = first(&service, &landlord, ResourceType::Property, json!({ "status": "AVAILABLE" })).await;
        service.delete(&landlord, ResourceType::Property, &id_of(&vacant)).await.unwrap();
        assert_eq!(
            service.list(&landlord, ResourceType::Property, &json!({})).await.unwrap().total,
            2
        );
    }

    #[tokio::test]
    async fn users_never_expose_password() {
        let service = service().await;
        let admin = principal(&service, "admin@example.com").await;

        let page = service.list(&admin, ResourceType::User, &json!({})).await.unwrap();
        assert_eq!(page.total, 5);
        assert!(page.items.iter().all(|u| u.get("password").is_none()));

        let created = service
            .create(
                &admin,
                ResourceType::User,
                &json!({ "email": "new@example.com", "password": "newpass123", "firstName": "N", "lastName": "U" }),
            )
            .await
            .unwrap();
        assert!(created.get("password").is_none());
        assert_eq!(created["role"], "TENANT");
        assert_eq!(created["isActive"], true);
    }

    #[tokio::test]
    async fn duplicate_user_email_conflicts() {
        let service = service().await;
        let admin = principal(&service, "admin@example.com").await;
        let err = service
            .create(
                &admin,
                ResourceType::User,
                &json!({ "email": "Tenant1@Example.com", "password": "whatever1", "firstName": "T", "lastName": "D" }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref msg) if msg == "User already exists with this email"));
    }

    #[tokio::test]
    async fn limit_is_clamped() {
        let service = service().await;
        let admin = principal(&service, "admin@example.com").await;
        let page = service
            .list(&admin, ResourceType::Payment, &json!({ "page": "1", "limit": "500" }))
            .await
            .unwrap();
        assert_eq!(page.limit, 100);
        assert_eq!(page.total, 4);
        assert_eq!(page.pages(), 1);
    }

    #[tokio::test]
    async fn listing_twice_returns_the_same_page() {
        let service = service().await;
        let manager = principal(&service, "manager@example.com").await;
        let query = json!({ "page": 1, "limit": 2 });
        let a = service.list(&manager, ResourceType::Payment, &query).await.unwrap();
        let b = service.list(&manager, ResourceType::Payment, &query).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.pages(), 2);
    }

    #[tokio::test]
    async fn filtered_listing_is_repeatable() {
        let service = service().await;
        let landlord = principal(&service, "landlord@example.com").await;
        let query = json!({ "status": "PAID", "page": "2", "limit": "2" });

        let a = service.list(&landlord, ResourceType::Payment, &query).await.unwrap();
        let b = service.list(&landlord, ResourceType::Payment, &query).await.unwrap();
        assert_eq!(a.items, b.items);
        assert_eq!((a.page, a.limit, a.total, a.pages()), (b.page, b.limit, b.total, b.pages()));
        assert_eq!(a.total, 3);
        assert_eq!(a.items.len(), 1);

        let search = json!({ "city": "san", "minRent": "2000" });
        let first = service.search_properties(&landlord, &search).await.unwrap();
        let again = service.search_properties(&landlord, &search).await.unwrap();
        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn huge_page_number_is_a_validation_error() {
        let service = service().await;
        let admin = principal(&service, "admin@example.com").await;
        let err = service
            .list(&admin, ResourceType::Property, &json!({ "page": "9223372036854775807" }))
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(e) => assert_eq!(e.errors[0].field, "page"),
            other => panic!("expected validation error, got {:?}", other),
        }

        let far = service
            .list(&admin, ResourceType::Property, &json!({ "page": "1000000", "limit": "100" }))
            .await
            .unwrap();
        assert!(far.items.is_empty());
        assert_eq!(far.total, 3);
    }

    #[tokio::test]
    async fn lease_update_keeps_end_after_start() {
        let service = service().await;
        let manager = principal(&service, "manager@example.com").await;
        let tenant2 = principal(&service, "tenant2@example.com").await;
        let lease = first(&service, &manager, ResourceType::Lease, json!({ "tenantId": tenant2.id.to_string() })).await;

        let err = service
            .update(&manager, ResourceType::Lease, &id_of(&lease), &json!({ "endDate": "1990-01-01" }))
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(e) => {
                assert_eq!(e.errors[0].field, "endDate");
                assert_eq!(e.errors[0].message, "End date must be after start date");
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let updated = service
            .update(&manager, ResourceType::Lease, &id_of(&lease), &json!({ "endDate": "2025-06-30" }))
            .await
            .unwrap();
        assert_eq!(updated["endDate"], "2025-06-30T00:00:00.000Z");
    }

    #[tokio::test]
    async fn lease_tenant_cannot_drift_from_its_payments() {
        let service = service().await;
        let manager = principal(&service, "manager@example.com").await;
        let tenant1 = principal(&service, "tenant1@example.com").await;
        let tenant2 = principal(&service, "tenant2@example.com").await;
        let lease = first(&service, &manager, ResourceType::Lease, json!({ "tenantId": tenant2.id.to_string() })).await;

        let err = service
            .update(
                &manager,
                ResourceType::Lease,
                &id_of(&lease),
                &json!({ "tenantId": tenant1.id.to_string() }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(ref msg) if msg == "Lease has payments recorded for another tenant"));
    }

    #[tokio::test]
    async fn referenced_user_delete_conflicts() {
        let service = service().await;
        let admin = principal(&service, "admin@example.com").await;
        let landlord = principal(&service, "landlord@example.com").await;

        let err = service
            .delete(&admin, ResourceType::User, &landlord.id.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Referenced(_))));
        let owned = Filter::new().eq("ownerId", landlord.id.to_string());
        assert_eq!(service.store().count(ResourceType::Property, &owned).await.unwrap(), 3);
        assert!(service.get(&admin, ResourceType::User, &landlord.id.to_string()).await.is_ok());

        let loner = service
            .create(
                &admin,
                ResourceType::User,
                &json!({ "email": "loner@example.com", "password": "lonerpass1", "firstName": "L", "lastName": "N" }),
            )
            .await
            .unwrap();
        service.delete(&admin, ResourceType::User, &id_of(&loner)).await.unwrap();
    }

    #[tokio::test]
    async fn tenant_files_maintenance_only_on_leased_property() {
        let service = service().await;
        let tenant = principal(&service, "tenant1@example.com").await;
        let lease = first(&service, &tenant, ResourceType::Lease, json!({})).await;

        let created = service
            .create(
                &tenant,
                ResourceType::MaintenanceRequest,
                &json!({
                    "propertyId": lease["propertyId"],
                    "title": "Broken window",
                    "description": "Cracked pane in the bedroom",
                    "tenantId": Uuid::new_v4().to_string()
                }),
            )
            .await
            .unwrap();
        assert_eq!(created["tenantId"], json!(tenant.id.to_string()));
        assert_eq!(created["status"], "PENDING");
        assert_eq!(created["priority"], "MEDIUM");

        let admin = principal(&service, "admin@example.com").await;
        let vacant = first(&service, &admin, ResourceType::Property, json!({ "status": "AVAILABLE" })).await;
        let err = service
            .create(
                &tenant,
                ResourceType::MaintenanceRequest,
                &json!({ "propertyId": vacant["id"], "title": "Noise", "description": "Loud neighbours" }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Property not found or access denied");
    }

    #[tokio::test]
    async fn tenant_edits_only_descriptive_fields() {
        let service = service().await;
        let tenant = principal(&service, "tenant1@example.com").await;
        let request = first(&service, &tenant, ResourceType::MaintenanceRequest, json!({})).await;

        let err = service
            .update(&tenant, ResourceType::MaintenanceRequest, &id_of(&request), &json!({ "cost": 10 }))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Policy(PolicyError::Forbidden)));

        let updated = service
            .update(&tenant, ResourceType::MaintenanceRequest, &id_of(&request), &json!({ "title": "Still leaking" }))
            .await
            .unwrap();
        assert_eq!(updated["title"], "Still leaking");
    }

    #[tokio::test]
    async fn manager_cannot_hand_property_to_another_manager() {
        let service = service().await;
        let manager = principal(&service, "manager@example.com").await;
        let property = first(&service, &manager, ResourceType::Property, json!({})).await;
        let err = service
            .update(
                &manager,
                ResourceType::Property,
                &id_of(&property),
                &json!({ "managerId": Uuid::new_v4().to_string() }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Policy(PolicyError::Forbidden)));
    }

    #[tokio::test]
    async fn payment_is_processed_once() {
        let service = service().await;
        let tenant = principal(&service, "tenant1@example.com").await;
        let pending = first(&service, &tenant, ResourceType::Payment, json!({ "status": "PENDING" })).await;

        let paid = service
            .process_payment(&tenant, &id_of(&pending), &json!({ "method": "ONLINE" }))
            .await
            .unwrap();
        assert_eq!(paid["status"], "PAID");
        assert_eq!(paid["method"], "ONLINE");
        assert!(paid["paidDate"].is_string());

        let err = service
            .process_payment(&tenant, &id_of(&pending), &json!({ "method": "ONLINE" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref msg) if msg == "Payment has already been processed"));
    }

    #[tokio::test]
    async fn completing_maintenance_stamps_completion() {
        let service = service().await;
        let landlord = principal(&service, "landlord@example.com").await;
        let request = first(&service, &landlord, ResourceType::MaintenanceRequest, json!({ "status": "PENDING" })).await;

        let done = service
            .transition_status(
                &landlord,
                ResourceType::MaintenanceRequest,
                &id_of(&request),
                &json!({ "status": "COMPLETED" }),
            )
            .await
            .unwrap();
        assert_eq!(done["status"], "COMPLETED");
        assert!(done["completedAt"].is_string());

        let err = service
            .transition_status(
                &landlord,
                ResourceType::MaintenanceRequest,
                &id_of(&request),
                &json!({ "status": "DONE" }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn search_combines_text_and_range_filters() {
        let service = service().await;
        let landlord = principal(&service, "landlord@example.com").await;
        let result = service
            .search_properties(&landlord, &json!({ "city": "francisco", "minRent": "2000" }))
            .await
            .unwrap();
        assert_eq!(result.page.total, 2);
        assert!(result.page.items.iter().all(|p| p["rent"].as_f64().unwrap() >= 2000.0));
        assert_eq!(result.filters["minRent"], json!(2000));
        assert_eq!(result.filters["page"], json!(1));
    }

    #[tokio::test]
    async fn manager_sees_tenants_of_managed_properties() {
        let service = service().await;
        let manager = principal(&service, "manager@example.com").await;
        let page = service.list(&manager, ResourceType::User, &json!({})).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|u| u["role"] == "TENANT"));
    }

    #[tokio::test]
    async fn assignment_requires_existing_user() {
        let service = service().await;
        let manager = principal(&service, "manager@example.com").await;
        let request = first(&service, &manager, ResourceType::MaintenanceRequest, json!({ "status": "PENDING" })).await;

        let err = service
            .assign(&manager, &id_of(&request), &json!({ "assignedTo": Uuid::new_v4().to_string() }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User not found or access denied");

        let assigned = service
            .assign(&manager, &id_of(&request), &json!({ "assignedTo": manager.id.to_string() }))
            .await
            .unwrap();
        assert_eq!(assigned["assignedTo"], json!(manager.id.to_string()));
    }

    #[tokio::test]
    async fn payment_tenant_must_match_lease() {
        let service = service().await;
        let manager = principal(&service, "manager@example.com").await;
        let tenant2 = principal(&service, "tenant2@example.com").await;
        let lease = first(&service, &manager, ResourceType::Lease, json!({ "tenantId": tenant2.id.to_string() })).await;
        let tenant1 = principal(&service, "tenant1@example.com").await;

        let err = service
            .create(
                &manager,
                ResourceType::Payment,
                &json!({
                    "leaseId": lease["id"],
                    "tenantId": tenant1.id.to_string(),
                    "amount": 100,
                    "dueDate": "2024-04-01"
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(_)));
    }
}
