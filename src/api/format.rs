use serde_json::{json, Map, Value};

use crate::services::{Page, SearchResult};
use crate::types::{Operation, ResourceType};

/// `{ items, pagination: { page, limit, total, pages } }`
pub fn page_body(page: Page) -> Value {
    let pagination = json!({
        "page": page.page,
        "limit": page.limit,
        "total": page.total,
        "pages": page.pages(),
    });
    json!({ "items": page.items, "pagination": pagination })
}

/// Page envelope plus the normalised search parameters under `filters`
pub fn search_body(result: SearchResult) -> Value {
    let mut body = page_body(result.page);
    body["filters"] = Value::Object(result.filters);
    body
}

/// `{ "<resource>": record }`
pub fn record_body(resource: ResourceType, record: Value) -> Value {
    let mut body = Map::new();
    body.insert(resource.singular_key().to_string(), record);
    Value::Object(body)
}

/// Record body with a `message` describing the change
pub fn mutation_body(resource: ResourceType, operation: Operation, record: Value) -> Value {
    let mut body = record_body(resource, record);
    body["message"] = json!(mutation_message(resource, operation));
    body
}

pub fn message_body(message: impl Into<String>) -> Value {
    json!({ "message": message.into() })
}

pub fn mutation_message(resource: ResourceType, operation: Operation) -> String {
    let verb = match operation {
        Operation::Create => "created",
        Operation::Update => "updated",
        Operation::Delete => "deleted",
        Operation::StatusTransition => "status updated",
        Operation::Assign => "assigned",
        Operation::Process => "processed",
        Operation::List | Operation::Read => "retrieved",
    };
    format!("{} {} successfully", resource.label(), verb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_envelope_counts_pages() {
        let page = Page {
            items: vec![json!({ "id": "a" })],
            page: 2,
            limit: 10,
            total: 21,
        };
        let body = page_body(page);
        assert_eq!(body["pagination"], json!({ "page": 2, "limit": 10, "total": 21, "pages": 3 }));
        assert_eq!(body["items"][0]["id"], "a");
    }

    #[test]
    fn empty_page_has_zero_pages() {
        let page = Page { items: vec![], page: 1, limit: 10, total: 0 };
        assert_eq!(page_body(page)["pagination"]["pages"], 0);
    }

    #[test]
    fn mutation_messages_name_the_resource() {
        let body = mutation_body(ResourceType::Property, Operation::StatusTransition, json!({ "id": "p" }));
        assert_eq!(body["message"], "Property status updated successfully");
        assert_eq!(body["property"]["id"], "p");

        assert_eq!(
            mutation_message(ResourceType::MaintenanceRequest, Operation::Assign),
            "Maintenance request assigned successfully"
        );
    }
}
