use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::fmt;
use uuid::Uuid;

use super::store::{Record, Store};
use crate::auth::PasswordHasher;
use crate::types::ResourceType;
use crate::validation::normalize_date;

/// Row counts written by [`seed`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub properties: usize,
    pub leases: usize,
    pub maintenance_requests: usize,
    pub payments: usize,
}

impl fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} users, {} properties, {} leases, {} maintenance requests, {} payments",
            self.users, self.properties, self.leases, self.maintenance_requests, self.payments
        )
    }
}

/// Sample accounts as (email, password, role)
pub const SAMPLE_ACCOUNTS: &[(&str, &str, &str)] = &[
    ("admin@example.com", "admin123", "ADMIN"),
    ("manager@example.com", "manager123", "PROPERTY_MANAGER"),
    ("landlord@example.com", "landlord123", "LANDLORD"),
    ("tenant1@example.com", "tenant123", "TENANT"),
    ("tenant2@example.com", "tenant123", "TENANT"),
];

struct Stamper {
    base: chrono::DateTime<Utc>,
    tick: i64,
}

impl Stamper {
    /// id plus strictly increasing timestamps so listing order is stable
    fn stamp(&mut self, value: Value) -> (String, Record) {
        let mut record = match value {
            Value::Object(map) => map,
            _ => Record::new(),
        };
        self.tick += 1;
        let at = (self.base + Duration::milliseconds(self.tick))
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let id = Uuid::new_v4().to_string();
        record.insert("id".into(), json!(id));
        record.insert("createdAt".into(), json!(at));
        record.insert("updatedAt".into(), json!(at));
        (id, record)
    }
}

fn date(raw: &str) -> Value {
    normalize_date(raw).map(Value::String).unwrap_or(Value::Null)
}

/// Insert the sample data set
pub async fn seed(store: &dyn Store, hasher: &PasswordHasher) -> anyhow::Result<SeedSummary> {
    let mut stamper = Stamper { base: Utc::now(), tick: 0 };
    let mut summary = SeedSummary::default();

    let profiles = [
        ("System", "Administrator", "+1-555-0001"),
        ("John", "Manager", "+1-555-0002"),
        ("Sarah", "Landlord", "+1-555-0003"),
        ("Mike", "Tenant", "+1-555-0004"),
        ("Lisa", "Smith", "+1-555-0005"),
    ];

    let mut user_ids = Vec::with_capacity(SAMPLE_ACCOUNTS.len());
    for ((email, password, role), (first, last, phone)) in SAMPLE_ACCOUNTS.iter().zip(profiles) {
        let digest = hasher.hash(password).await?;
        let (id, record) = stamper.stamp(json!({
            "email": email,
            "password": digest,
            "firstName": first,
            "lastName": last,
            "phone": phone,
            "role": role,
            "isActive": true,
        }));
        store.insert(ResourceType::User, record).await?;
        user_ids.push(id);
        summary.users += 1;
    }
    let (manager, landlord, tenant1, tenant2) = (&user_ids[1], &user_ids[2], &user_ids[3], &user_ids[4]);

    let properties = [
        json!({
            "name": "Sunset Apartments Unit 101",
            "address": "123 Main Street, Unit 101",
            "city": "San Francisco",
            "state": "CA",
            "zipCode": "94102",
            "country": "US",
            "type": "APARTMENT",
            "status": "OCCUPIED",
            "bedrooms": 2,
            "bathrooms": 1.5,
            "sqft": 850,
            "rent": 2500,
            "deposit": 2500,
            "description": "Beautiful 2-bedroom apartment in the heart of the city with modern amenities.",
            "amenities": ["Air Conditioning", "Dishwasher", "Balcony", "Parking"],
            "petPolicy": "Small pets allowed with deposit",
            "smokingPolicy": "No smoking",
            "ownerId": landlord,
            "managerId": manager,
        }),
        json!({
            "name": "Garden View Townhouse",
            "address": "456 Oak Avenue",
            "city": "San Francisco",
            "state": "CA",
            "zipCode": "94103",
            "country": "US",
            "type": "TOWNHOUSE",
            "status": "AVAILABLE",
            "bedrooms": 3,
            "bathrooms": 2.5,
            "sqft": 1200,
            "rent": 3200,
            "deposit": 3200,
            "description": "Spacious 3-bedroom townhouse with private garden and garage.",
            "amenities": ["Garage", "Garden", "Fireplace", "In-unit Laundry"],
            "petPolicy": "Pets allowed",
            "smokingPolicy": "No smoking",
            "ownerId": landlord,
            "managerId": manager,
        }),
        json!({
            "name": "Downtown Studio",
            "address": "789 Pine Street, Unit 5B",
            "city": "San Francisco",
            "state": "CA",
            "zipCode": "94104",
            "country": "US",
            "type": "STUDIO",
            "status": "OCCUPIED",
            "bedrooms": 0,
            "bathrooms": 1,
            "sqft": 450,
            "rent": 1800,
            "deposit": 1800,
            "description": "Cozy studio apartment perfect for urban living.",
            "amenities": ["Gym Access", "Rooftop Deck", "Concierge"],
            "petPolicy": "No pets",
            "smokingPolicy": "No smoking",
            "ownerId": landlord,
            "managerId": manager,
        }),
    ];

    let mut property_ids = Vec::with_capacity(properties.len());
    for property in properties {
        let (id, record) = stamper.stamp(property);
        store.insert(ResourceType::Property, record).await?;
        property_ids.push(id);
        summary.properties += 1;
    }

    let leases = [
        json!({
            "propertyId": property_ids[0],
            "tenantId": tenant1,
            "startDate": date("2024-01-01"),
            "endDate": date("2024-12-31"),
            "monthlyRent": 2500,
            "deposit": 2500,
            "status": "ACTIVE",
            "terms": "Standard one-year lease agreement with option to renew.",
        }),
        json!({
            "propertyId": property_ids[2],
            "tenantId": tenant2,
            "startDate": date("2024-02-01"),
            "endDate": date("2025-01-31"),
            "monthlyRent": 1800,
            "deposit": 1800,
            "status": "ACTIVE",
            "terms": "One-year lease for studio apartment.",
        }),
    ];

    let mut lease_ids = Vec::with_capacity(leases.len());
    for lease in leases {
        let (id, record) = stamper.stamp(lease);
        store.insert(ResourceType::Lease, record).await?;
        lease_ids.push(id);
        summary.leases += 1;
    }

    let completed_at = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let requests = [
        json!({
            "title": "Leaky Faucet in Kitchen",
            "description": "The kitchen faucet has been dripping continuously for the past week.",
            "priority": "HIGH",
            "category": "PLUMBING",
            "status": "PENDING",
            "propertyId": property_ids[0],
            "tenantId": tenant1,
        }),
        json!({
            "title": "Air Conditioning Not Working",
            "description": "The AC unit is not cooling properly. Room temperature stays high.",
            "priority": "URGENT",
            "category": "HVAC",
            "status": "IN_PROGRESS",
            "propertyId": property_ids[2],
            "tenantId": tenant2,
            "assignedTo": manager,
        }),
        json!({
            "title": "Light Fixture Replacement",
            "description": "Living room light fixture needs to be replaced.",
            "priority": "LOW",
            "category": "ELECTRICAL",
            "status": "COMPLETED",
            "propertyId": property_ids[0],
            "tenantId": tenant1,
            "assignedTo": manager,
            "cost": 150,
            "completedAt": completed_at,
        }),
    ];

    for request in requests {
        let (_, record) = stamper.stamp(request);
        store.insert(ResourceType::MaintenanceRequest, record).await?;
        summary.maintenance_requests += 1;
    }

    let payments = [
        json!({
            "amount": 2500,
            "type": "RENT",
            "status": "PAID",
            "dueDate": date("2024-01-01"),
            "paidDate": date("2024-01-01"),
            "method": "BANK_TRANSFER",
            "description": "January 2024 rent payment",
            "leaseId": lease_ids[0],
            "tenantId": tenant1,
        }),
        json!({
            "amount": 2500,
            "type": "RENT",
            "status": "PAID",
            "dueDate": date("2024-02-01"),
            "paidDate": date("2024-02-01"),
            "method": "CREDIT_CARD",
            "description": "February 2024 rent payment",
            "leaseId": lease_ids[0],
            "tenantId": tenant1,
        }),
        json!({
            "amount": 1800,
            "type": "RENT",
            "status": "PAID",
            "dueDate": date("2024-02-01"),
            "paidDate": date("2024-02-01"),
            "method": "ONLINE",
            "description": "February 2024 rent payment",
            "leaseId": lease_ids[1],
            "tenantId": tenant2,
        }),
        json!({
            "amount": 2500,
            "type": "RENT",
            "status": "PENDING",
            "dueDate": date("2024-03-01"),
            "description": "March 2024 rent payment",
            "leaseId": lease_ids[0],
            "tenantId": tenant1,
        }),
    ];

    for payment in payments {
        let (_, record) = stamper.stamp(payment);
        store.insert(ResourceType::Payment, record).await?;
        summary.payments += 1;
    }

    Ok(summary)
}
