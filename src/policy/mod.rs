//! Role-scoped access policy
//!
//! Every (role, resource, operation) triple that is allowed has exactly one entry in
//! [`RULES`]. A missing entry is a denial. An allowed operation narrows the caller's
//! requested filter with the rule's scope, so the effective filter is always the
//! conjunction of both.

mod rules;

use serde_json::{Map, Value};
use std::fmt;

use crate::auth::{Principal, Role};
use crate::filter::{Condition, Filter};
use crate::types::{Operation, ResourceType};

pub use rules::RULES;

/// Rows a rule grants, expressed against the principal that asks
#[derive(Debug)]
pub enum Scope {
    Unrestricted,
    /// `field = principal.id`
    Principal(&'static str),
    /// `field = value`
    Equals(&'static str, &'static str),
    /// `field IN (SELECT column FROM parent WHERE scope)`
    Via {
        field: &'static str,
        parent: ResourceType,
        column: &'static str,
        scope: &'static Scope,
    },
    All(&'static [Scope]),
}

impl Scope {
    pub fn to_filter(&self, principal: &Principal) -> Filter {
        let mut filter = Filter::new();
        self.push_conditions(principal, &mut filter);
        filter
    }

    fn push_conditions(&self, principal: &Principal, filter: &mut Filter) {
        match self {
            Scope::Unrestricted => {}
            Scope::Principal(field) => filter.push(Condition::Eq {
                field: field.to_string(),
                value: Value::String(principal.id.to_string()),
            }),
            Scope::Equals(field, value) => filter.push(Condition::Eq {
                field: field.to_string(),
                value: Value::String(value.to_string()),
            }),
            Scope::Via { field, parent, column, scope } => filter.push(Condition::Within {
                field: field.to_string(),
                source: *parent,
                column: column.to_string(),
                filter: scope.to_filter(principal),
            }),
            Scope::All(scopes) => {
                for scope in scopes.iter() {
                    scope.push_conditions(principal, filter);
                }
            }
        }
    }
}

/// Fields written from the principal on create
#[derive(Debug, Clone, Copy)]
pub enum Stamp {
    /// Always overwritten with the principal id
    Force(&'static str),
    /// Set to the principal id when the caller left it out
    DefaultToSelf(&'static str),
}

/// Fields an update may touch
#[derive(Debug, Clone, Copy)]
pub enum FieldPolicy {
    All,
    Except(&'static [&'static str]),
    Only(&'static [&'static str]),
}

impl FieldPolicy {
    pub fn permits(&self, field: &str) -> bool {
        match self {
            FieldPolicy::All => true,
            FieldPolicy::Except(locked) => !locked.contains(&field),
            FieldPolicy::Only(allowed) => allowed.contains(&field),
        }
    }
}

#[derive(Debug)]
pub struct AccessRule {
    pub role: Role,
    pub resource: ResourceType,
    pub operation: Operation,
    pub scope: Scope,
    pub stamps: &'static [Stamp],
    pub fields: FieldPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    /// No rule for this role
    Forbidden,
    /// The record is absent or outside the caller's scope; the two are indistinguishable
    NotFoundOrForbidden {
        resource: ResourceType,
        operation: Operation,
    },
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::Forbidden => f.write_str("Insufficient permissions"),
            PolicyError::NotFoundOrForbidden { resource, operation } if operation.is_read() => {
                write!(f, "{} not found", resource.label())
            }
            PolicyError::NotFoundOrForbidden { resource, .. } => {
                write!(f, "{} not found or access denied", resource.label())
            }
        }
    }
}

impl std::error::Error for PolicyError {}

pub fn rule_for(role: Role, resource: ResourceType, operation: Operation) -> Option<&'static AccessRule> {
    RULES
        .iter()
        .find(|rule| rule.role == role && rule.resource == resource && rule.operation == operation)
}

pub fn can(principal: &Principal, resource: ResourceType, operation: Operation) -> bool {
    rule_for(principal.role, resource, operation).is_some()
}

/// Effective filter = requested AND scope
pub fn authorize(
    principal: &Principal,
    resource: ResourceType,
    operation: Operation,
    requested: Filter,
) -> Result<Filter, PolicyError> {
    let rule = rule_for(principal.role, resource, operation).ok_or(PolicyError::Forbidden)?;
    Ok(requested.and(rule.scope.to_filter(principal)))
}

/// Like [`authorize`], and rejects changes to fields the rule does not release
pub fn authorize_update(
    principal: &Principal,
    resource: ResourceType,
    operation: Operation,
    requested: Filter,
    changes: &Map<String, Value>,
) -> Result<Filter, PolicyError> {
    let rule = rule_for(principal.role, resource, operation).ok_or(PolicyError::Forbidden)?;
    if let Some(field) = changes.keys().find(|field| !rule.fields.permits(field)) {
        tracing::warn!(
            "{} {} attempted to change locked field '{}' on {}",
            principal.role,
            principal.id,
            field,
            resource
        );
        return Err(PolicyError::Forbidden);
    }
    Ok(requested.and(rule.scope.to_filter(principal)))
}

/// A parent lookup that must find at least one row before a create goes ahead
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    /// Reported in the error when the lookup comes back empty
    pub subject: ResourceType,
    pub source: ResourceType,
    pub filter: Filter,
}

#[derive(Debug)]
pub struct CreateGrant {
    pub record: Map<String, Value>,
    pub requirements: Vec<Requirement>,
}

/// Stamp the candidate, then check the rule's scope against it
///
/// Direct conditions are checked here. Sub-select conditions become [`Requirement`]s
/// that the caller resolves against the store.
pub fn authorize_create(
    principal: &Principal,
    resource: ResourceType,
    mut record: Map<String, Value>,
) -> Result<CreateGrant, PolicyError> {
    let rule = rule_for(principal.role, resource, Operation::Create).ok_or(PolicyError::Forbidden)?;
    let me = Value::String(principal.id.to_string());

    for stamp in rule.stamps {
        match stamp {
            Stamp::Force(field) => {
                record.insert(field.to_string(), me.clone());
            }
            Stamp::DefaultToSelf(field) => {
                if record.get(*field).map_or(true, Value::is_null) {
                    record.insert(field.to_string(), me.clone());
                }
            }
        }
    }

    let mut requirements = Vec::new();
    for condition in rule.scope.to_filter(principal).conditions() {
        match condition {
            Condition::Eq { field, value } => {
                if record.get(field) != Some(value) {
                    return Err(PolicyError::Forbidden);
                }
            }
            Condition::Within { field, source, column, filter } => {
                let Some(candidate) = record.get(field).filter(|v| !v.is_null()) else {
                    return Err(PolicyError::Forbidden);
                };
                requirements.push(Requirement {
                    subject: referenced_resource(field).unwrap_or(*source),
                    source: *source,
                    filter: Filter::new().eq(column.clone(), candidate.clone()).and(filter.clone()),
                });
            }
            other => {
                tracing::error!("Unsupported create scope condition: {:?}", other);
                return Err(PolicyError::Forbidden);
            }
        }
    }

    Ok(CreateGrant { record, requirements })
}

fn referenced_resource(field: &str) -> Option<ResourceType> {
    match field {
        "propertyId" => Some(ResourceType::Property),
        "leaseId" => Some(ResourceType::Lease),
        "tenantId" | "ownerId" | "managerId" | "assignedTo" => Some(ResourceType::User),
        _ => None,
    }
}
