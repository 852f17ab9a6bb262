use once_cell::sync::Lazy;
use serde::Deserialize;

use super::{FieldRule, Schema};
use crate::auth::{Role, MAX_PASSWORD_BYTES};
use crate::types::ResourceType;

pub const ROLES: &[&str] = &["ADMIN", "PROPERTY_MANAGER", "LANDLORD", "TENANT"];
pub const SELF_REGISTER_ROLES: &[&str] = &["PROPERTY_MANAGER", "LANDLORD", "TENANT"];
pub const PROPERTY_TYPES: &[&str] = &["APARTMENT", "HOUSE", "CONDO", "STUDIO", "TOWNHOUSE"];
pub const PROPERTY_STATUSES: &[&str] = &["AVAILABLE", "OCCUPIED", "MAINTENANCE", "UNAVAILABLE"];
pub const LEASE_STATUSES: &[&str] = &["PENDING", "ACTIVE", "EXPIRED", "TERMINATED"];
pub const MAINTENANCE_STATUSES: &[&str] = &["PENDING", "IN_PROGRESS", "COMPLETED", "CANCELLED"];
pub const MAINTENANCE_PRIORITIES: &[&str] = &["LOW", "MEDIUM", "HIGH", "URGENT"];
pub const MAINTENANCE_CATEGORIES: &[&str] = &[
    "PLUMBING",
    "ELECTRICAL",
    "HVAC",
    "APPLIANCE",
    "STRUCTURAL",
    "PEST_CONTROL",
    "CLEANING",
    "OTHER",
];
pub const PAYMENT_TYPES: &[&str] = &["RENT", "DEPOSIT", "LATE_FEE", "UTILITY", "MAINTENANCE", "OTHER"];
pub const PAYMENT_STATUSES: &[&str] = &["PENDING", "PAID", "OVERDUE", "FAILED", "REFUNDED"];
pub const PAYMENT_METHODS: &[&str] = &["CASH", "CHECK", "BANK_TRANSFER", "CREDIT_CARD", "ONLINE"];

pub const MAX_PAGE_SIZE: f64 = 100.0;
pub const MAX_PAGE: f64 = 1_000_000.0;

fn pagination_fields() -> Vec<FieldRule> {
    vec![
        FieldRule::integer("page").min(1.0).max(MAX_PAGE).default(1),
        FieldRule::integer("limit").clamp(1.0, MAX_PAGE_SIZE).default(10),
    ]
}

pub fn pagination() -> Schema {
    Schema::new("pagination", pagination_fields())
}

fn list_schema(name: &'static str, filters: Vec<FieldRule>) -> Schema {
    Schema::new(name, filters).extend(pagination_fields())
}

fn status_schema(name: &'static str, values: &'static [&'static str]) -> Schema {
    Schema::new(name, vec![FieldRule::one_of("status", values).message("Invalid status")])
}

fn password_rule(name: &'static str, message: &'static str) -> FieldRule {
    FieldRule::string(name).len(8, 72).max_bytes(MAX_PASSWORD_BYTES).message(message)
}

// Auth

pub static REGISTER: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "register",
        vec![
            FieldRule::email("email"),
            password_rule("password", "Password must be at least 8 characters"),
            FieldRule::string("firstName").min(1.0).message("First name is required"),
            FieldRule::string("lastName").min(1.0).message("Last name is required"),
            FieldRule::string("phone").optional(),
            FieldRule::one_of("role", SELF_REGISTER_ROLES).optional(),
        ],
    )
});

pub static LOGIN: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "login",
        vec![
            FieldRule::email("email"),
            FieldRule::string("password").min(1.0).message("Password is required"),
        ],
    )
});

pub static UPDATE_PROFILE: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "updateProfile",
        vec![
            FieldRule::string("firstName").min(1.0).message("First name is required").optional(),
            FieldRule::string("lastName").min(1.0).message("Last name is required").optional(),
            FieldRule::string("phone").optional(),
        ],
    )
});

pub static CHANGE_PASSWORD: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "changePassword",
        vec![
            FieldRule::string("currentPassword").min(1.0).message("Current password is required"),
            password_rule("newPassword", "New password must be at least 8 characters"),
        ],
    )
});

pub static FORGOT_PASSWORD: Lazy<Schema> =
    Lazy::new(|| Schema::new("forgotPassword", vec![FieldRule::email("email")]));

// Users

pub static CREATE_USER: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "createUser",
        vec![
            FieldRule::email("email"),
            password_rule("password", "Password must be at least 8 characters"),
            FieldRule::string("firstName").min(1.0).message("First name is required"),
            FieldRule::string("lastName").min(1.0).message("Last name is required"),
            FieldRule::string("phone").optional(),
            FieldRule::one_of("role", ROLES).default("TENANT"),
        ],
    )
});

pub static UPDATE_USER: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "updateUser",
        vec![
            FieldRule::string("firstName").min(1.0).message("First name is required").optional(),
            FieldRule::string("lastName").min(1.0).message("Last name is required").optional(),
            FieldRule::string("phone").optional(),
            FieldRule::one_of("role", ROLES).optional(),
        ],
    )
});

pub static USER_STATUS: Lazy<Schema> =
    Lazy::new(|| Schema::new("userStatus", vec![FieldRule::boolean("isActive")]));

pub static LIST_USERS: Lazy<Schema> = Lazy::new(|| {
    list_schema(
        "listUsers",
        vec![FieldRule::one_of("role", ROLES).optional(), FieldRule::boolean("isActive").optional()],
    )
});

// Properties

pub static CREATE_PROPERTY: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "createProperty",
        vec![
            FieldRule::string("name").min(1.0).message("Property name is required"),
            FieldRule::string("address").min(1.0).message("Address is required"),
            FieldRule::string("city").min(1.0).message("City is required"),
            FieldRule::string("state").min(1.0).message("State is required"),
            FieldRule::string("zipCode").min(1.0).message("ZIP code is required"),
            FieldRule::string("country").default("US"),
            FieldRule::one_of("type", PROPERTY_TYPES),
            FieldRule::integer("bedrooms").min(0.0).message("Bedrooms must be 0 or more"),
            FieldRule::number("bathrooms").min(0.0).message("Bathrooms must be 0 or more"),
            FieldRule::integer("sqft").min(1.0).message("Square footage must be positive").optional(),
            FieldRule::number("rent").min(0.0).message("Rent must be 0 or more"),
            FieldRule::number("deposit").min(0.0).message("Deposit must be 0 or more"),
            FieldRule::string("description").optional(),
            FieldRule::string_array("amenities").optional(),
            FieldRule::string("petPolicy").optional(),
            FieldRule::string("smokingPolicy").optional(),
            FieldRule::uuid("ownerId").optional(),
            FieldRule::uuid("managerId").optional(),
        ],
    )
});

pub static UPDATE_PROPERTY: Lazy<Schema> = Lazy::new(|| CREATE_PROPERTY.partial("updateProperty"));

pub static PROPERTY_STATUS: Lazy<Schema> = Lazy::new(|| status_schema("propertyStatus", PROPERTY_STATUSES));

pub static LIST_PROPERTIES: Lazy<Schema> = Lazy::new(|| {
    list_schema("listProperties", vec![FieldRule::one_of("status", PROPERTY_STATUSES).optional()])
});

pub static SEARCH_PROPERTIES: Lazy<Schema> = Lazy::new(|| {
    list_schema(
        "searchProperties",
        vec![
            FieldRule::string("city").optional(),
            FieldRule::string("state").optional(),
            FieldRule::one_of("type", PROPERTY_TYPES).optional(),
            FieldRule::number("minRent").min(0.0).optional(),
            FieldRule::number("maxRent").min(0.0).optional(),
            FieldRule::integer("bedrooms").min(0.0).optional(),
            FieldRule::number("bathrooms").min(0.0).optional(),
            FieldRule::one_of("status", PROPERTY_STATUSES).optional(),
        ],
    )
    .with_headline("Invalid search parameters")
});

// Leases

pub static CREATE_LEASE: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "createLease",
        vec![
            FieldRule::uuid("propertyId").message("Property ID is required"),
            FieldRule::uuid("tenantId").message("Tenant ID is required"),
            FieldRule::date("startDate"),
            FieldRule::date("endDate"),
            FieldRule::number("monthlyRent").min(0.0).message("Monthly rent must be 0 or more"),
            FieldRule::number("deposit").min(0.0).message("Deposit must be 0 or more"),
            FieldRule::string("terms").optional(),
            FieldRule::one_of("status", LEASE_STATUSES).default("PENDING"),
        ],
    )
});

pub static UPDATE_LEASE: Lazy<Schema> =
    Lazy::new(|| CREATE_LEASE.partial("updateLease").without(&["propertyId"]));

pub static LEASE_STATUS: Lazy<Schema> = Lazy::new(|| status_schema("leaseStatus", LEASE_STATUSES));

pub static LIST_LEASES: Lazy<Schema> = Lazy::new(|| {
    list_schema(
        "listLeases",
        vec![
            FieldRule::one_of("status", LEASE_STATUSES).optional(),
            FieldRule::uuid("propertyId").optional(),
            FieldRule::uuid("tenantId").optional(),
        ],
    )
});

// Maintenance

pub static CREATE_MAINTENANCE: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "createMaintenance",
        vec![
            FieldRule::uuid("propertyId").message("Property ID is required"),
            FieldRule::string("title").min(1.0).message("Title is required"),
            FieldRule::string("description").min(1.0).message("Description is required"),
            FieldRule::one_of("priority", MAINTENANCE_PRIORITIES).default("MEDIUM"),
            FieldRule::one_of("category", MAINTENANCE_CATEGORIES).default("OTHER"),
        ],
    )
});

pub static UPDATE_MAINTENANCE: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "updateMaintenance",
        vec![
            FieldRule::string("title").min(1.0).message("Title is required").optional(),
            FieldRule::string("description").min(1.0).message("Description is required").optional(),
            FieldRule::one_of("priority", MAINTENANCE_PRIORITIES).optional(),
            FieldRule::one_of("category", MAINTENANCE_CATEGORIES).optional(),
            FieldRule::number("cost").min(0.0).message("Cost must be 0 or more").optional(),
            FieldRule::uuid("assignedTo").optional(),
        ],
    )
});

pub static MAINTENANCE_STATUS: Lazy<Schema> =
    Lazy::new(|| status_schema("maintenanceStatus", MAINTENANCE_STATUSES));

pub static ASSIGN_MAINTENANCE: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "assignMaintenance",
        vec![FieldRule::uuid("assignedTo").message("Assignee ID is required")],
    )
});

pub static LIST_MAINTENANCE: Lazy<Schema> = Lazy::new(|| {
    list_schema(
        "listMaintenance",
        vec![
            FieldRule::one_of("status", MAINTENANCE_STATUSES).optional(),
            FieldRule::one_of("priority", MAINTENANCE_PRIORITIES).optional(),
            FieldRule::one_of("category", MAINTENANCE_CATEGORIES).optional(),
            FieldRule::uuid("propertyId").optional(),
        ],
    )
});

// Payments

pub static CREATE_PAYMENT: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "createPayment",
        vec![
            FieldRule::uuid("leaseId").message("Lease ID is required"),
            FieldRule::uuid("tenantId").message("Tenant ID is required"),
            FieldRule::number("amount").positive().message("Amount must be positive"),
            FieldRule::one_of("type", PAYMENT_TYPES).default("RENT"),
            FieldRule::date("dueDate"),
            FieldRule::one_of("method", PAYMENT_METHODS).optional(),
            FieldRule::string("description").optional(),
        ],
    )
});

pub static UPDATE_PAYMENT: Lazy<Schema> = Lazy::new(|| {
    CREATE_PAYMENT
        .partial("updatePayment")
        .without(&["leaseId", "tenantId"])
});

pub static PAYMENT_STATUS: Lazy<Schema> = Lazy::new(|| status_schema("paymentStatus", PAYMENT_STATUSES));

pub static PROCESS_PAYMENT: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "processPayment",
        vec![FieldRule::one_of("method", PAYMENT_METHODS).message("Invalid payment method")],
    )
});

pub static LIST_PAYMENTS: Lazy<Schema> = Lazy::new(|| {
    list_schema(
        "listPayments",
        vec![
            FieldRule::one_of("status", PAYMENT_STATUSES).optional(),
            FieldRule::one_of("type", PAYMENT_TYPES).optional(),
            FieldRule::uuid("leaseId").optional(),
            FieldRule::uuid("tenantId").optional(),
        ],
    )
});

/// Schemas the generic resource endpoints validate against
pub struct ResourceSchemas {
    pub create: &'static Lazy<Schema>,
    pub update: &'static Lazy<Schema>,
    pub status: Option<&'static Lazy<Schema>>,
    pub list: &'static Lazy<Schema>,
}

static USER_SCHEMAS: ResourceSchemas = ResourceSchemas {
    create: &CREATE_USER,
    update: &UPDATE_USER,
    status: Some(&USER_STATUS),
    list: &LIST_USERS,
};

static PROPERTY_SCHEMAS: ResourceSchemas = ResourceSchemas {
    create: &CREATE_PROPERTY,
    update: &UPDATE_PROPERTY,
    status: Some(&PROPERTY_STATUS),
    list: &LIST_PROPERTIES,
};

static LEASE_SCHEMAS: ResourceSchemas = ResourceSchemas {
    create: &CREATE_LEASE,
    update: &UPDATE_LEASE,
    status: Some(&LEASE_STATUS),
    list: &LIST_LEASES,
};

static MAINTENANCE_SCHEMAS: ResourceSchemas = ResourceSchemas {
    create: &CREATE_MAINTENANCE,
    update: &UPDATE_MAINTENANCE,
    status: Some(&MAINTENANCE_STATUS),
    list: &LIST_MAINTENANCE,
};

static PAYMENT_SCHEMAS: ResourceSchemas = ResourceSchemas {
    create: &CREATE_PAYMENT,
    update: &UPDATE_PAYMENT,
    status: Some(&PAYMENT_STATUS),
    list: &LIST_PAYMENTS,
};

pub fn for_resource(resource: ResourceType) -> &'static ResourceSchemas {
    match resource {
        ResourceType::User => &USER_SCHEMAS,
        ResourceType::Property => &PROPERTY_SCHEMAS,
        ResourceType::Lease => &LEASE_SCHEMAS,
        ResourceType::MaintenanceRequest => &MAINTENANCE_SCHEMAS,
        ResourceType::Payment => &PAYMENT_SCHEMAS,
    }
}

// Typed inputs

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordInput {
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageQuery {
    pub page: u64,
    pub limit: u64,
}

impl PageQuery {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}
