use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::ServiceError;
use crate::auth::Principal;
use crate::database::Store;
use crate::filter::Filter;
use crate::policy;
use crate::types::{Operation, ResourceType};
use crate::validation::schemas::{
    MAINTENANCE_CATEGORIES, MAINTENANCE_PRIORITIES, MAINTENANCE_STATUSES, PAYMENT_STATUSES, PROPERTY_STATUSES,
};

const OPEN_MAINTENANCE: &[&str] = &["PENDING", "IN_PROGRESS"];
const OUTSTANDING_PAYMENTS: &[&str] = &["PENDING", "OVERDUE"];

/// Headline counts, each inside the caller's List scope
#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn Store>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Resources the caller cannot list are left out
    pub async fn overview(&self, principal: &Principal) -> Result<Value, ServiceError> {
        let mut overview = Map::new();

        if policy::can(principal, ResourceType::Property, Operation::List) {
            let section = self.by_status(principal, ResourceType::Property, PROPERTY_STATUSES).await?;
            overview.insert("properties".to_string(), section);
        }

        if policy::can(principal, ResourceType::Lease, Operation::List) {
            let total = self.count(principal, ResourceType::Lease, Filter::new()).await?;
            let active = self
                .count(principal, ResourceType::Lease, Filter::new().eq("status", "ACTIVE"))
                .await?;
            overview.insert("leases".to_string(), json!({ "total": total, "active": active }));
        }

        if policy::can(principal, ResourceType::MaintenanceRequest, Operation::List) {
            let mut section = self
                .by_status(principal, ResourceType::MaintenanceRequest, MAINTENANCE_STATUSES)
                .await?;
            let open = any_of("status", OPEN_MAINTENANCE);
            section["open"] = json!(self.count(principal, ResourceType::MaintenanceRequest, open).await?);
            overview.insert("maintenance".to_string(), section);
        }

        if policy::can(principal, ResourceType::Payment, Operation::List) {
            let section = self.by_status(principal, ResourceType::Payment, PAYMENT_STATUSES).await?;
            overview.insert("payments".to_string(), section);
        }

        if policy::can(principal, ResourceType::User, Operation::List) {
            let total = self.count(principal, ResourceType::User, Filter::new()).await?;
            overview.insert("users".to_string(), json!({ "total": total }));
        }

        Ok(Value::Object(overview))
    }

    /// Money collected and still owed, from payments the caller can list
    pub async fn revenue(&self, principal: &Principal) -> Result<Value, ServiceError> {
        let paid = Filter::new().eq("status", "PAID");
        let collected = self.sum(principal, ResourceType::Payment, paid.clone(), "amount").await?;
        let payments = self.count(principal, ResourceType::Payment, paid).await?;
        let outstanding = self
            .sum(principal, ResourceType::Payment, any_of("status", OUTSTANDING_PAYMENTS), "amount")
            .await?;
        Ok(json!({ "collected": collected, "outstanding": outstanding, "payments": payments }))
    }

    /// Maintenance spend, from requests the caller can list
    pub async fn expenses(&self, principal: &Principal) -> Result<Value, ServiceError> {
        let resource = ResourceType::MaintenanceRequest;
        let total = self.sum(principal, resource, Filter::new(), "cost").await?;
        let completed = self
            .sum(principal, resource, Filter::new().eq("status", "COMPLETED"), "cost")
            .await?;
        let requests = self.count(principal, resource, Filter::new()).await?;
        Ok(json!({ "total": total, "completed": completed, "requests": requests }))
    }

    pub async fn occupancy_report(&self, principal: &Principal) -> Result<Value, ServiceError> {
        let mut report = self.by_status(principal, ResourceType::Property, PROPERTY_STATUSES).await?;
        let total = report["total"].as_u64().unwrap_or(0);
        let occupied = report["byStatus"]["OCCUPIED"].as_u64().unwrap_or(0);
        report["occupied"] = json!(occupied);
        report["occupancyRate"] = json!(percent(occupied, total));
        Ok(report)
    }

    pub async fn maintenance_report(&self, principal: &Principal) -> Result<Value, ServiceError> {
        let resource = ResourceType::MaintenanceRequest;
        let mut report = self.by_status(principal, resource, MAINTENANCE_STATUSES).await?;
        report["byPriority"] = self.breakdown(principal, resource, "priority", MAINTENANCE_PRIORITIES).await?;
        report["byCategory"] = self.breakdown(principal, resource, "category", MAINTENANCE_CATEGORIES).await?;
        report["open"] = json!(self.count(principal, resource, any_of("status", OPEN_MAINTENANCE)).await?);
        report["totalCost"] = json!(self.sum(principal, resource, Filter::new(), "cost").await?);
        Ok(report)
    }

    pub async fn payment_report(&self, principal: &Principal) -> Result<Value, ServiceError> {
        let resource = ResourceType::Payment;
        let mut report = self.by_status(principal, resource, PAYMENT_STATUSES).await?;
        let mut amounts = Map::new();
        for status in PAYMENT_STATUSES {
            let amount = self
                .sum(principal, resource, Filter::new().eq("status", *status), "amount")
                .await?;
            amounts.insert(status.to_string(), json!(amount));
        }
        report["amountByStatus"] = Value::Object(amounts);
        report["totalAmount"] = json!(self.sum(principal, resource, Filter::new(), "amount").await?);
        Ok(report)
    }

    async fn by_status(
        &self,
        principal: &Principal,
        resource: ResourceType,
        statuses: &[&str],
    ) -> Result<Value, ServiceError> {
        let total = self.count(principal, resource, Filter::new()).await?;
        let counts = self.breakdown(principal, resource, "status", statuses).await?;
        Ok(json!({ "total": total, "byStatus": counts }))
    }

    async fn breakdown(
        &self,
        principal: &Principal,
        resource: ResourceType,
        column: &str,
        values: &[&str],
    ) -> Result<Value, ServiceError> {
        let mut counts = Map::new();
        for value in values {
            let n = self.count(principal, resource, Filter::new().eq(column, *value)).await?;
            counts.insert(value.to_string(), json!(n));
        }
        Ok(Value::Object(counts))
    }

    async fn count(&self, principal: &Principal, resource: ResourceType, requested: Filter) -> Result<u64, ServiceError> {
        let effective = policy::authorize(principal, resource, Operation::List, requested)?;
        Ok(self.store.count(resource, &effective).await?)
    }

    async fn sum(
        &self,
        principal: &Principal,
        resource: ResourceType,
        requested: Filter,
        column: &str,
    ) -> Result<f64, ServiceError> {
        let effective = policy::authorize(principal, resource, Operation::List, requested)?;
        Ok(self.store.sum(resource, &effective, column).await?)
    }
}

fn any_of(column: &str, values: &[&str]) -> Filter {
    Filter::new().one_of(column, values.iter().map(|v| json!(v)).collect())
}

/// Percentage with two decimals; 0 for an empty set
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 * 10_000.0 / whole as f64).round() / 100.0
    }
}
