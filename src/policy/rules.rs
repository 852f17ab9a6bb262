use super::{AccessRule, FieldPolicy, Scope, Stamp};
use crate::auth::Role;
use crate::types::{Operation, ResourceType};

use Operation::*;
use ResourceType::{Lease, MaintenanceRequest, Payment, Property, User};

// Property managers

const MANAGED: Scope = Scope::Principal("managerId");
const ON_MANAGED_PROPERTY: Scope = Scope::Via {
    field: "propertyId",
    parent: Property,
    column: "id",
    scope: &MANAGED,
};
const ON_MANAGED_LEASE: Scope = Scope::Via {
    field: "leaseId",
    parent: Lease,
    column: "id",
    scope: &ON_MANAGED_PROPERTY,
};
const TENANT_OF_MANAGED: Scope = Scope::Via {
    field: "id",
    parent: Lease,
    column: "tenantId",
    scope: &ON_MANAGED_PROPERTY,
};

// Landlords

const OWNED: Scope = Scope::Principal("ownerId");
const ON_OWNED_PROPERTY: Scope = Scope::Via {
    field: "propertyId",
    parent: Property,
    column: "id",
    scope: &OWNED,
};
const ON_OWNED_LEASE: Scope = Scope::Via {
    field: "leaseId",
    parent: Lease,
    column: "id",
    scope: &ON_OWNED_PROPERTY,
};
const TENANT_OF_OWNED: Scope = Scope::Via {
    field: "id",
    parent: Lease,
    column: "tenantId",
    scope: &ON_OWNED_PROPERTY,
};

// Tenants

const OWN: Scope = Scope::Principal("tenantId");
const AVAILABLE: Scope = Scope::Equals("status", "AVAILABLE");
const ACTIVE_LEASE_HOLDER: Scope = Scope::All(&[Scope::Principal("tenantId"), Scope::Equals("status", "ACTIVE")]);
const ON_LEASED_PROPERTY: Scope = Scope::All(&[
    Scope::Principal("tenantId"),
    Scope::Via {
        field: "propertyId",
        parent: Lease,
        column: "propertyId",
        scope: &ACTIVE_LEASE_HOLDER,
    },
]);

const TENANT_EDITABLE: &[&str] = &["title", "description", "priority", "category"];

const fn rule(role: Role, resource: ResourceType, operation: Operation, scope: Scope) -> AccessRule {
    AccessRule {
        role,
        resource,
        operation,
        scope,
        stamps: &[],
        fields: FieldPolicy::All,
    }
}

const fn create(role: Role, resource: ResourceType, scope: Scope, stamps: &'static [Stamp]) -> AccessRule {
    AccessRule {
        role,
        resource,
        operation: Create,
        scope,
        stamps,
        fields: FieldPolicy::All,
    }
}

const fn update(role: Role, resource: ResourceType, scope: Scope, fields: FieldPolicy) -> AccessRule {
    AccessRule {
        role,
        resource,
        operation: Update,
        scope,
        stamps: &[],
        fields,
    }
}

pub static RULES: &[AccessRule] = &[
    // Admin
    rule(Role::Admin, User, List, Scope::Unrestricted),
    rule(Role::Admin, User, Read, Scope::Unrestricted),
    create(Role::Admin, User, Scope::Unrestricted, &[]),
    update(Role::Admin, User, Scope::Unrestricted, FieldPolicy::All),
    rule(Role::Admin, User, Delete, Scope::Unrestricted),
    rule(Role::Admin, User, StatusTransition, Scope::Unrestricted),
    rule(Role::Admin, Property, List, Scope::Unrestricted),
    rule(Role::Admin, Property, Read, Scope::Unrestricted),
    create(Role::Admin, Property, Scope::Unrestricted, &[Stamp::DefaultToSelf("ownerId")]),
    update(Role::Admin, Property, Scope::Unrestricted, FieldPolicy::All),
    rule(Role::Admin, Property, Delete, Scope::Unrestricted),
    rule(Role::Admin, Property, StatusTransition, Scope::Unrestricted),
    rule(Role::Admin, Lease, List, Scope::Unrestricted),
    rule(Role::Admin, Lease, Read, Scope::Unrestricted),
    create(Role::Admin, Lease, Scope::Unrestricted, &[]),
    update(Role::Admin, Lease, Scope::Unrestricted, FieldPolicy::All),
    rule(Role::Admin, Lease, Delete, Scope::Unrestricted),
    rule(Role::Admin, Lease, StatusTransition, Scope::Unrestricted),
    rule(Role::Admin, MaintenanceRequest, List, Scope::Unrestricted),
    rule(Role::Admin, MaintenanceRequest, Read, Scope::Unrestricted),
    create(Role::Admin, MaintenanceRequest, Scope::Unrestricted, &[]),
    update(Role::Admin, MaintenanceRequest, Scope::Unrestricted, FieldPolicy::All),
    rule(Role::Admin, MaintenanceRequest, StatusTransition, Scope::Unrestricted),
    rule(Role::Admin, MaintenanceRequest, Assign, Scope::Unrestricted),
    rule(Role::Admin, Payment, List, Scope::Unrestricted),
    rule(Role::Admin, Payment, Read, Scope::Unrestricted),
    create(Role::Admin, Payment, Scope::Unrestricted, &[]),
    update(Role::Admin, Payment, Scope::Unrestricted, FieldPolicy::All),
    rule(Role::Admin, Payment, StatusTransition, Scope::Unrestricted),
    rule(Role::Admin, Payment, Process, Scope::Unrestricted),
    // Property manager
    rule(Role::PropertyManager, User, List, TENANT_OF_MANAGED),
    rule(Role::PropertyManager, User, Read, TENANT_OF_MANAGED),
    rule(Role::PropertyManager, Property, List, MANAGED),
    rule(Role::PropertyManager, Property, Read, MANAGED),
    create(
        Role::PropertyManager,
        Property,
        MANAGED,
        &[Stamp::Force("managerId"), Stamp::DefaultToSelf("ownerId")],
    ),
    update(Role::PropertyManager, Property, MANAGED, FieldPolicy::Except(&["managerId"])),
    rule(Role::PropertyManager, Property, Delete, MANAGED),
    rule(Role::PropertyManager, Property, StatusTransition, MANAGED),
    rule(Role::PropertyManager, Lease, List, ON_MANAGED_PROPERTY),
    rule(Role::PropertyManager, Lease, Read, ON_MANAGED_PROPERTY),
    create(Role::PropertyManager, Lease, ON_MANAGED_PROPERTY, &[]),
    update(Role::PropertyManager, Lease, ON_MANAGED_PROPERTY, FieldPolicy::Except(&["propertyId"])),
    rule(Role::PropertyManager, Lease, Delete, ON_MANAGED_PROPERTY),
    rule(Role::PropertyManager, Lease, StatusTransition, ON_MANAGED_PROPERTY),
    rule(Role::PropertyManager, MaintenanceRequest, List, ON_MANAGED_PROPERTY),
    rule(Role::PropertyManager, MaintenanceRequest, Read, ON_MANAGED_PROPERTY),
    create(Role::PropertyManager, MaintenanceRequest, ON_MANAGED_PROPERTY, &[]),
    update(Role::PropertyManager, MaintenanceRequest, ON_MANAGED_PROPERTY, FieldPolicy::All),
    rule(Role::PropertyManager, MaintenanceRequest, StatusTransition, ON_MANAGED_PROPERTY),
    rule(Role::PropertyManager, MaintenanceRequest, Assign, ON_MANAGED_PROPERTY),
    rule(Role::PropertyManager, Payment, List, ON_MANAGED_LEASE),
    rule(Role::PropertyManager, Payment, Read, ON_MANAGED_LEASE),
    create(Role::PropertyManager, Payment, ON_MANAGED_LEASE, &[]),
    update(Role::PropertyManager, Payment, ON_MANAGED_LEASE, FieldPolicy::All),
    rule(Role::PropertyManager, Payment, StatusTransition, ON_MANAGED_LEASE),
    rule(Role::PropertyManager, Payment, Process, ON_MANAGED_LEASE),
    // Landlord
    rule(Role::Landlord, User, List, TENANT_OF_OWNED),
    rule(Role::Landlord, User, Read, TENANT_OF_OWNED),
    rule(Role::Landlord, Property, List, OWNED),
    rule(Role::Landlord, Property, Read, OWNED),
    create(Role::Landlord, Property, OWNED, &[Stamp::Force("ownerId")]),
    update(Role::Landlord, Property, OWNED, FieldPolicy::Except(&["ownerId"])),
    rule(Role::Landlord, Property, Delete, OWNED),
    rule(Role::Landlord, Property, StatusTransition, OWNED),
    rule(Role::Landlord, Lease, List, ON_OWNED_PROPERTY),
    rule(Role::Landlord, Lease, Read, ON_OWNED_PROPERTY),
    create(Role::Landlord, Lease, ON_OWNED_PROPERTY, &[]),
    update(Role::Landlord, Lease, ON_OWNED_PROPERTY, FieldPolicy::Except(&["propertyId"])),
    rule(Role::Landlord, Lease, Delete, ON_OWNED_PROPERTY),
    rule(Role::Landlord, Lease, StatusTransition, ON_OWNED_PROPERTY),
    rule(Role::Landlord, MaintenanceRequest, List, ON_OWNED_PROPERTY),
    rule(Role::Landlord, MaintenanceRequest, Read, ON_OWNED_PROPERTY),
    create(Role::Landlord, MaintenanceRequest, ON_OWNED_PROPERTY, &[]),
    update(Role::Landlord, MaintenanceRequest, ON_OWNED_PROPERTY, FieldPolicy::All),
    rule(Role::Landlord, MaintenanceRequest, StatusTransition, ON_OWNED_PROPERTY),
    rule(Role::Landlord, MaintenanceRequest, Assign, ON_OWNED_PROPERTY),
    rule(Role::Landlord, Payment, List, ON_OWNED_LEASE),
    rule(Role::Landlord, Payment, Read, ON_OWNED_LEASE),
    create(Role::Landlord, Payment, ON_OWNED_LEASE, &[]),
    update(Role::Landlord, Payment, ON_OWNED_LEASE, FieldPolicy::All),
    rule(Role::Landlord, Payment, StatusTransition, ON_OWNED_LEASE),
    rule(Role::Landlord, Payment, Process, ON_OWNED_LEASE),
    // Tenant
    rule(Role::Tenant, Property, List, AVAILABLE),
    rule(Role::Tenant, Property, Read, AVAILABLE),
    rule(Role::Tenant, Lease, List, OWN),
    rule(Role::Tenant, Lease, Read, OWN),
    rule(Role::Tenant, MaintenanceRequest, List, OWN),
    rule(Role::Tenant, MaintenanceRequest, Read, OWN),
    create(Role::Tenant, MaintenanceRequest, ON_LEASED_PROPERTY, &[Stamp::Force("tenantId")]),
    update(Role::Tenant, MaintenanceRequest, OWN, FieldPolicy::Only(TENANT_EDITABLE)),
    rule(Role::Tenant, Payment, List, OWN),
    rule(Role::Tenant, Payment, Read, OWN),
    rule(Role::Tenant, Payment, Process, OWN),
];
