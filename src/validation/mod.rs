//! Declarative request validation
//!
//! A [`Schema`] is an ordered list of [`FieldRule`]s. Validation walks every rule,
//! collects every violation, and only applies defaults when the whole input passes.

pub mod schemas;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct ValidationErrors {
    pub message: String,
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self { message: message.into(), errors }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DEFAULT_HEADLINE, vec![FieldError::new(field, message)])
    }
}

pub const DEFAULT_HEADLINE: &str = "Validation failed";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Email,
    Integer,
    Number,
    Boolean,
    Enum(&'static [&'static str]),
    StringArray,
    Uuid,
    Date,
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
    /// Length for strings, value for numbers
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub exclusive_min: bool,
    /// Encoded length cap for strings, checked after the character bounds
    pub max_bytes: Option<usize>,
    /// Out-of-range numbers are pulled into range instead of rejected
    pub clamp: Option<(f64, f64)>,
    pub message: Option<&'static str>,
}

impl FieldRule {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
            min: None,
            max: None,
            exclusive_min: false,
            max_bytes: None,
            clamp: None,
            message: None,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn email(name: &'static str) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn one_of(name: &'static str, values: &'static [&'static str]) -> Self {
        Self::new(name, FieldKind::Enum(values))
    }

    pub fn string_array(name: &'static str) -> Self {
        Self::new(name, FieldKind::StringArray)
    }

    pub fn uuid(name: &'static str) -> Self {
        Self::new(name, FieldKind::Uuid)
    }

    pub fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn len(self, min: usize, max: usize) -> Self {
        self.min(min as f64).max(max as f64)
    }

    pub fn max_bytes(mut self, max: usize) -> Self {
        self.max_bytes = Some(max);
        self
    }

    pub fn positive(mut self) -> Self {
        self.min = Some(0.0);
        self.exclusive_min = true;
        self
    }

    pub fn clamp(mut self, low: f64, high: f64) -> Self {
        self.clamp = Some((low, high));
        self
    }

    pub fn message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    fn required_message(&self) -> String {
        self.message
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} is required", self.name))
    }

    /// Check one present value; returns the normalised value or pushes errors
    fn check(&self, value: &Value, errors: &mut Vec<FieldError>) -> Option<Value> {
        let name = self.name;
        match &self.kind {
            FieldKind::String => {
                let Some(s) = value.as_str() else {
                    errors.push(FieldError::new(name, format!("{} must be a string", name)));
                    return None;
                };
                self.check_length(s, errors).then(|| Value::String(s.to_string()))
            }
            FieldKind::Email => match value.as_str() {
                Some(s) if is_email(s) => Some(Value::String(s.trim().to_lowercase())),
                _ => {
                    errors.push(FieldError::new(name, self.message.unwrap_or("Invalid email format")));
                    None
                }
            },
            FieldKind::Integer => {
                let Some(n) = coerce_integer(value) else {
                    errors.push(FieldError::new(name, format!("{} must be an integer", name)));
                    return None;
                };
                let n = match self.clamp {
                    Some((low, high)) => (n as f64).clamp(low, high) as i64,
                    None => n,
                };
                self.check_range(n as f64, errors).then(|| Value::from(n))
            }
            FieldKind::Number => {
                let Some(n) = coerce_number(value) else {
                    errors.push(FieldError::new(name, format!("{} must be a number", name)));
                    return None;
                };
                let n = match self.clamp {
                    Some((low, high)) => n.clamp(low, high),
                    None => n,
                };
                if !self.check_range(n, errors) {
                    return None;
                }
                match value {
                    Value::Number(original) if self.clamp.is_none() => Some(Value::Number(original.clone())),
                    _ => number_value(n),
                }
            }
            FieldKind::Boolean => match value {
                Value::Bool(b) => Some(Value::Bool(*b)),
                Value::String(s) if s == "true" => Some(Value::Bool(true)),
                Value::String(s) if s == "false" => Some(Value::Bool(false)),
                _ => {
                    errors.push(FieldError::new(name, format!("{} must be a boolean", name)));
                    None
                }
            },
            FieldKind::Enum(values) => match value.as_str() {
                Some(s) if values.contains(&s) => Some(Value::String(s.to_string())),
                _ => {
                    let message = self
                        .message
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{} must be one of: {}", name, values.join(", ")));
                    errors.push(FieldError::new(name, message));
                    None
                }
            },
            FieldKind::StringArray => {
                let Some(items) = value.as_array() else {
                    errors.push(FieldError::new(name, format!("{} must be an array of strings", name)));
                    return None;
                };
                let before = errors.len();
                for (i, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        let path = format!("{}.{}", name, i);
                        errors.push(FieldError::new(path.clone(), format!("{} must be a string", path)));
                    }
                }
                (errors.len() == before).then(|| value.clone())
            }
            FieldKind::Uuid => match value.as_str().and_then(|s| Uuid::parse_str(s).ok()) {
                Some(id) => Some(Value::String(id.to_string())),
                None => {
                    errors.push(FieldError::new(
                        name,
                        self.message
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("{} must be a valid UUID", name)),
                    ));
                    None
                }
            },
            FieldKind::Date => match value.as_str().and_then(normalize_date) {
                Some(date) => Some(Value::String(date)),
                None => {
                    errors.push(FieldError::new(name, format!("{} must be a valid date", name)));
                    None
                }
            },
        }
    }

    fn check_length(&self, s: &str, errors: &mut Vec<FieldError>) -> bool {
        let len = s.chars().count() as f64;
        if let Some(min) = self.min {
            if len < min {
                errors.push(FieldError::new(
                    self.name,
                    self.message
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{} must be at least {} characters", self.name, min)),
                ));
                return false;
            }
        }
        if let Some(max) = self.max {
            if len > max {
                errors.push(FieldError::new(
                    self.name,
                    format!("{} must be at most {} characters", self.name, max),
                ));
                return false;
            }
        }
        if let Some(max) = self.max_bytes {
            if s.len() > max {
                errors.push(FieldError::new(self.name, format!("{} must be at most {} bytes", self.name, max)));
                return false;
            }
        }
        true
    }

    fn check_range(&self, n: f64, errors: &mut Vec<FieldError>) -> bool {
        if let Some(min) = self.min {
            let below = if self.exclusive_min { n <= min } else { n < min };
            if below {
                let fallback = if self.exclusive_min {
                    format!("{} must be greater than {}", self.name, min)
                } else {
                    format!("{} must be at least {}", self.name, min)
                };
                errors.push(FieldError::new(
                    self.name,
                    self.message.map(str::to_string).unwrap_or(fallback),
                ));
                return false;
            }
        }
        if let Some(max) = self.max {
            if n > max {
                errors.push(FieldError::new(
                    self.name,
                    self.message
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{} must be at most {}", self.name, max)),
                ));
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub name: &'static str,
    pub headline: &'static str,
    pub fields: Vec<FieldRule>,
}

impl Schema {
    pub fn new(name: &'static str, fields: Vec<FieldRule>) -> Self {
        Self { name, headline: DEFAULT_HEADLINE, fields }
    }

    pub fn with_headline(mut self, headline: &'static str) -> Self {
        self.headline = headline;
        self
    }

    /// Update variant: every field optional, no defaults
    pub fn partial(&self, name: &'static str) -> Self {
        let fields = self
            .fields
            .iter()
            .cloned()
            .map(|mut rule| {
                rule.required = false;
                rule.default = None;
                rule
            })
            .collect();
        Self { name, headline: self.headline, fields }
    }

    pub fn without(mut self, names: &[&str]) -> Self {
        self.fields.retain(|rule| !names.contains(&rule.name));
        self
    }

    pub fn extend(mut self, fields: Vec<FieldRule>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == name)
    }

    /// Validate `input` and return only the declared fields, normalised
    pub fn validate(&self, input: &Value) -> Result<Map<String, Value>, ValidationErrors> {
        let empty = Map::new();
        let object = match input {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(ValidationErrors::new(
                    self.headline,
                    vec![FieldError::new("body", "Expected a JSON object")],
                ))
            }
        };

        let mut errors = Vec::new();
        let mut output = Map::new();

        for rule in &self.fields {
            match object.get(rule.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    if let Some(normalised) = rule.check(value, &mut errors) {
                        output.insert(rule.name.to_string(), normalised);
                    }
                }
                None => {
                    if let Some(default) = &rule.default {
                        output.insert(rule.name.to_string(), default.clone());
                    } else if rule.required {
                        errors.push(FieldError::new(rule.name, rule.required_message()));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(ValidationErrors::new(self.headline, errors))
        }
    }

    /// Validate, then deserialize the normalised object into `T`
    pub fn validate_into<T: DeserializeOwned>(&self, input: &Value) -> Result<T, ValidationErrors> {
        let output = self.validate(input)?;
        serde_json::from_value(Value::Object(output))
            .map_err(|e| ValidationErrors::new(self.headline, vec![FieldError::new("body", e.to_string())]))
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Whole numbers stay integers so query-string coercion matches JSON input
fn number_value(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n.abs() < (i64::MAX as f64) {
        Some(Value::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number)
    }
}

fn is_email(raw: &str) -> bool {
    let s = raw.trim();
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}

/// Calendar dates and RFC 3339 timestamps, rendered as UTC with millisecond precision
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let dt = date.and_hms_opt(0, 0, 0)?.and_utc();
    Some(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn register() -> Schema {
        Schema::new(
            "register",
            vec![
                FieldRule::email("email"),
                FieldRule::string("password").len(8, 72).message("Password must be at least 8 characters"),
                FieldRule::string("firstName").min(1.0).message("First name is required"),
                FieldRule::string("phone").optional(),
            ],
        )
    }

    #[test]
    fn collects_every_violation_in_schema_order() {
        let err = register()
            .validate(&json!({ "email": "nope", "password": "short" }))
            .unwrap_err();
        assert_eq!(err.message, "Validation failed");
        assert_eq!(
            err.errors,
            vec![
                FieldError::new("email", "Invalid email format"),
                FieldError::new("password", "Password must be at least 8 characters"),
                FieldError::new("firstName", "First name is required"),
            ]
        );
    }

    #[test]
    fn unknown_fields_are_dropped_and_null_is_absent() {
        let out = register()
            .validate(&json!({
                "email": "A@Example.com",
                "password": "longenough",
                "firstName": "Ana",
                "phone": null,
                "isAdmin": true
            }))
            .unwrap();
        assert_eq!(out.get("email"), Some(&json!("a@example.com")));
        assert!(out.get("phone").is_none());
        assert!(out.get("isAdmin").is_none());
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        let schema = schemas::pagination();
        let out = schema.validate(&json!({})).unwrap();
        assert_eq!(out.get("page"), Some(&json!(1)));
        assert_eq!(out.get("limit"), Some(&json!(10)));

        let out = schema.validate(&json!({ "page": "3", "limit": "500" })).unwrap();
        assert_eq!(out.get("page"), Some(&json!(3)));
        assert_eq!(out.get("limit"), Some(&json!(100)));

        let out = schema.validate(&json!({ "limit": 0 })).unwrap();
        assert_eq!(out.get("limit"), Some(&json!(1)));

        let err = schema.validate(&json!({ "page": 0 })).unwrap_err();
        assert_eq!(err.errors[0].field, "page");
    }

    #[test]
    fn defaults_only_on_success() {
        let schema = Schema::new(
            "property",
            vec![FieldRule::string("name").min(1.0), FieldRule::string("country").default("US")],
        );
        assert!(schema.validate(&json!({})).is_err());
        let out = schema.validate(&json!({ "name": "Loft" })).unwrap();
        assert_eq!(out.get("country"), Some(&json!("US")));
    }

    #[test]
    fn array_element_errors_use_index_paths() {
        let schema = Schema::new("amenities", vec![FieldRule::string_array("amenities")]);
        let err = schema.validate(&json!({ "amenities": ["pool", 3, "gym", false] })).unwrap_err();
        let fields: Vec<_> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["amenities.1", "amenities.3"]);
    }

    #[test]
    fn numbers_coerce_from_strings() {
        let schema = Schema::new(
            "numbers",
            vec![
                FieldRule::integer("bedrooms").min(0.0),
                FieldRule::number("rent").min(0.0),
                FieldRule::boolean("isActive"),
            ],
        );
        let out = schema
            .validate(&json!({ "bedrooms": "2", "rent": "1250.5", "isActive": "false" }))
            .unwrap();
        assert_eq!(out.get("bedrooms"), Some(&json!(2)));
        assert_eq!(out.get("rent"), Some(&json!(1250.5)));
        assert_eq!(out.get("isActive"), Some(&json!(false)));

        let err = schema
            .validate(&json!({ "bedrooms": 1.5, "rent": -1, "isActive": "yes" }))
            .unwrap_err();
        assert_eq!(err.errors.len(), 3);
    }

    #[test]
    fn positive_is_exclusive() {
        let schema = Schema::new("payment", vec![FieldRule::number("amount").positive()]);
        let err = schema.validate(&json!({ "amount": 0 })).unwrap_err();
        assert_eq!(err.errors[0].message, "amount must be greater than 0");
        assert!(schema.validate(&json!({ "amount": 0.01 })).is_ok());
    }

    #[test]
    fn partial_drops_requirements_and_defaults() {
        let schema = Schema::new(
            "property",
            vec![FieldRule::string("name").min(1.0), FieldRule::string("country").default("US")],
        )
        .partial("updateProperty");
        let out = schema.validate(&json!({})).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn enums_uuids_and_dates() {
        let schema = Schema::new(
            "lease",
            vec![
                FieldRule::one_of("status", &["ACTIVE", "PENDING"]),
                FieldRule::uuid("tenantId"),
                FieldRule::date("startDate"),
            ],
        );
        let out = schema
            .validate(&json!({
                "status": "ACTIVE",
                "tenantId": "6F9619FF-8B86-D011-B42D-00CF4FC964FF",
                "startDate": "2024-01-01"
            }))
            .unwrap();
        assert_eq!(out.get("tenantId"), Some(&json!("6f9619ff-8b86-d011-b42d-00cf4fc964ff")));
        assert_eq!(out.get("startDate"), Some(&json!("2024-01-01T00:00:00.000Z")));

        let err = schema
            .validate(&json!({ "status": "active", "tenantId": "abc", "startDate": "01/01/2024" }))
            .unwrap_err();
        assert_eq!(err.errors[0].message, "status must be one of: ACTIVE, PENDING");
        assert_eq!(err.errors.len(), 3);
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = register().validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err.errors[0].field, "body");
    }

    #[test]
    fn email_shapes() {
        assert!(is_email("tenant1@example.com"));
        assert!(!is_email("tenant1example.com"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("a@b"));
        assert!(!is_email("a b@example.com"));
        assert!(!is_email("a@@example.com"));
    }
}
