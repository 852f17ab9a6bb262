/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Entity kinds served by the API
/// Used by the policy table, the filters and both stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    User,
    Property,
    Lease,
    MaintenanceRequest,
    Payment,
}

impl ResourceType {
    pub const ALL: [ResourceType; 5] = [
        ResourceType::User,
        ResourceType::Property,
        ResourceType::Lease,
        ResourceType::MaintenanceRequest,
        ResourceType::Payment,
    ];

    /// Table name in the relational store
    pub fn table(self) -> &'static str {
        match self {
            ResourceType::User => "users",
            ResourceType::Property => "properties",
            ResourceType::Lease => "leases",
            ResourceType::MaintenanceRequest => "maintenance_requests",
            ResourceType::Payment => "payments",
        }
    }

    /// Human label used in error messages
    pub fn label(self) -> &'static str {
        match self {
            ResourceType::User => "User",
            ResourceType::Property => "Property",
            ResourceType::Lease => "Lease",
            ResourceType::MaintenanceRequest => "Maintenance request",
            ResourceType::Payment => "Payment",
        }
    }

    /// JSON key for a single record in responses
    pub fn singular_key(self) -> &'static str {
        match self {
            ResourceType::User => "user",
            ResourceType::Property => "property",
            ResourceType::Lease => "lease",
            ResourceType::MaintenanceRequest => "request",
            ResourceType::Payment => "payment",
        }
    }

    /// Columns that must never leave the service layer
    pub fn hidden_fields(self) -> &'static [&'static str] {
        match self {
            ResourceType::User => &["password"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Operations a principal can attempt on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    List,
    Read,
    Create,
    Update,
    Delete,
    StatusTransition,
    Assign,  // Maintenance: set assignee
    Process, // Payments: settle a pending payment
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::List,
        Operation::Read,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
        Operation::StatusTransition,
        Operation::Assign,
        Operation::Process,
    ];

    /// Reads report plain "not found"; everything else reports "not found or access denied"
    pub fn is_read(self) -> bool {
        matches!(self, Operation::List | Operation::Read)
    }
}
