//! Validating parse of backend payloads into equipment records
//!
//! Parsing walks the JSON object field by field and keeps going after the
//! first problem, so a rejected payload reports every violation at once:
//! missing fields, wrong JSON types, unknown category/status labels and
//! range/format constraints.

use chrono::DateTime;
use serde_json::{Map, Value};
use validator::Validate;

use super::enums::{EquipmentCategory, EquipmentStatus};
use super::equipment::{validate_purchase_date, EquipmentRecord};
use crate::error::{SchemaValidationError, SchemaViolation};

/// Wire field order, used to sort violations
const FIELD_ORDER: [&str; 11] = [
    "id",
    "name",
    "category",
    "status",
    "quantity",
    "storageLocation",
    "purchaseDate",
    "borrower",
    "createdAt",
    "updatedAt",
    "notes",
];

/// Typed field values extracted from the payload, before constraints
#[derive(Debug, Default, Validate)]
struct RecordFields {
    id: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    name: Option<String>,
    category: Option<EquipmentCategory>,
    status: Option<EquipmentStatus>,
    #[validate(range(min = 0, max = 9999, message = "must be between 0 and 9999"))]
    quantity: Option<i64>,
    #[validate(length(min = 1, message = "must not be empty"))]
    storage_location: Option<String>,
    #[validate(custom(function = "validate_purchase_date"))]
    purchase_date: Option<String>,
    borrower: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    notes: Option<String>,
}

/// Collects type-level violations while reading fields out of an object
struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    violations: Vec<SchemaViolation>,
}

impl<'a> FieldReader<'a> {
    fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            violations: Vec::new(),
        }
    }

    fn fail(&mut self, key: &str, message: String) {
        self.violations.push(SchemaViolation::new(key, message));
    }

    fn required(&mut self, key: &str) -> Option<&'a Value> {
        match self.object.get(key) {
            None | Some(Value::Null) => {
                self.fail(key, "is required".to_string());
                None
            }
            Some(value) => Some(value),
        }
    }

    fn string(&mut self, key: &str) -> Option<String> {
        let value = self.required(key)?;
        self.expect_string(key, value)
    }

    /// Absent and `null` both mean "not set"
    fn optional_string(&mut self, key: &str) -> Option<String> {
        match self.object.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => self.expect_string(key, value),
        }
    }

    fn expect_string(&mut self, key: &str, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                self.fail(key, format!("expected string, got {}", json_type_name(other)));
                None
            }
        }
    }

    fn integer(&mut self, key: &str) -> Option<i64> {
        let value = self.required(key)?;
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(i),
                None => {
                    self.fail(key, format!("expected integer, got {}", n));
                    None
                }
            },
            other => {
                self.fail(key, format!("expected integer, got {}", json_type_name(other)));
                None
            }
        }
    }

    fn label<T>(&mut self, key: &str, lookup: fn(&str) -> Option<T>) -> Option<T> {
        let label = self.string(key)?;
        let parsed = lookup(&label);
        if parsed.is_none() {
            self.fail(key, format!("unknown value '{}'", label));
        }
        parsed
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Map validator's Rust field names back to wire names
fn wire_field(rust_name: &str) -> &str {
    match rust_name {
        "storage_location" => "storageLocation",
        "purchase_date" => "purchaseDate",
        "created_at" => "createdAt",
        "updated_at" => "updatedAt",
        other => other,
    }
}

fn field_rank(field: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|f| *f == field)
        .unwrap_or(FIELD_ORDER.len())
}

/// Flatten validator errors into schema violations
pub(crate) fn constraint_violations(errors: &validator::ValidationErrors) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        let field = field.to_string();
        for error in field_errors.iter() {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.code.to_string());
            violations.push(SchemaViolation::new(wire_field(&field), message));
        }
    }
    violations.sort_by_key(|v| field_rank(&v.field));
    violations
}

/// Parse one record, reporting every violation.
pub fn parse_record(value: &Value) -> Result<EquipmentRecord, SchemaValidationError> {
    let object = value.as_object().ok_or_else(|| {
        SchemaValidationError::new(vec![SchemaViolation::new(
            "$root",
            format!("expected object, got {}", json_type_name(value)),
        )])
    })?;

    let mut reader = FieldReader::new(object);
    let fields = RecordFields {
        id: reader.string("id"),
        name: reader.string("name"),
        category: reader.label("category", EquipmentCategory::from_label),
        status: reader.label("status", EquipmentStatus::from_label),
        quantity: reader.integer("quantity"),
        storage_location: reader.string("storageLocation"),
        purchase_date: reader.string("purchaseDate"),
        borrower: reader.optional_string("borrower"),
        created_at: reader.string("createdAt"),
        updated_at: reader.string("updatedAt"),
        notes: reader.optional_string("notes"),
    };

    let mut violations = reader.violations;
    if let Err(errors) = fields.validate() {
        violations.extend(constraint_violations(&errors));
    }
    if let (Some(created), Some(updated)) = (&fields.created_at, &fields.updated_at) {
        if let (Ok(created), Ok(updated)) = (
            DateTime::parse_from_rfc3339(created),
            DateTime::parse_from_rfc3339(updated),
        ) {
            if updated < created {
                violations.push(SchemaViolation::new("updatedAt", "must not precede createdAt"));
            }
        }
    }
    violations.sort_by_key(|v| field_rank(&v.field));

    let RecordFields {
        id: Some(id),
        name: Some(name),
        category: Some(category),
        status: Some(status),
        quantity: Some(quantity),
        storage_location: Some(storage_location),
        purchase_date: Some(purchase_date),
        borrower,
        created_at: Some(created_at),
        updated_at: Some(updated_at),
        notes,
    } = fields
    else {
        return Err(SchemaValidationError::new(violations));
    };
    if !violations.is_empty() {
        return Err(SchemaValidationError::new(violations));
    }
    let quantity = u32::try_from(quantity).map_err(|_| {
        SchemaValidationError::new(vec![SchemaViolation::new("quantity", "must be between 0 and 9999")])
    })?;

    Ok(EquipmentRecord {
        id,
        name,
        category,
        status,
        quantity,
        storage_location,
        purchase_date,
        borrower,
        created_at,
        updated_at,
        notes,
    })
}

/// Parse a list of records. Violations are prefixed with the item index
/// (`[2].status`); one bad item rejects the whole list.
pub fn parse_records(value: &Value) -> Result<Vec<EquipmentRecord>, SchemaValidationError> {
    let items = value.as_array().ok_or_else(|| {
        SchemaValidationError::new(vec![SchemaViolation::new(
            "$root",
            format!("expected array, got {}", json_type_name(value)),
        )])
    })?;

    let mut records = Vec::with_capacity(items.len());
    let mut violations = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match parse_record(item) {
            Ok(record) => records.push(record),
            Err(err) => violations.extend(err.violations.into_iter().map(|v| {
                SchemaViolation::new(format!("[{}].{}", index, v.field), v.message)
            })),
        }
    }

    if violations.is_empty() {
        Ok(records)
    } else {
        Err(SchemaValidationError::new(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "id": "E001",
            "name": "MacBook",
            "category": "電子機器",
            "status": "使用中",
            "quantity": 2,
            "storageLocation": "個人デスク",
            "purchaseDate": "2022-01-15",
            "createdAt": "2022-01-15T00:00:00.000Z",
            "updatedAt": "2022-02-15T00:00:00.000Z",
            "notes": "AさんとBさんが使用中"
        })
    }

    #[test]
    fn test_parse_valid_record() {
        let record = parse_record(&valid()).unwrap();
        assert_eq!(record.id, "E001");
        assert_eq!(record.category, EquipmentCategory::Electronics);
        assert_eq!(record.status, EquipmentStatus::InUse);
        assert_eq!(record.quantity, 2);
        assert_eq!(record.borrower, None);
        assert_eq!(record.notes.as_deref(), Some("AさんとBさんが使用中"));
    }

    #[test]
    fn test_null_optional_fields_are_absent() {
        let mut value = valid();
        value["borrower"] = Value::Null;
        value["notes"] = Value::Null;
        let record = parse_record(&value).unwrap();
        assert_eq!(record.borrower, None);
        assert_eq!(record.notes, None);
    }

    #[test]
    fn test_reports_every_violation() {
        let value = json!({
            "id": "E002",
            "name": "",
            "category": "OA機器",
            "status": "lost",
            "quantity": 10000,
            "storageLocation": 3,
            "purchaseDate": "2022/01/15",
            "borrower": false,
            "updatedAt": "2022-02-15T00:00:00Z"
        });
        let err = parse_record(&value).unwrap_err();
        let fields: Vec<&str> = err.violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "name",
                "category",
                "status",
                "quantity",
                "storageLocation",
                "purchaseDate",
                "borrower",
                "createdAt",
            ]
        );
    }

    #[test]
    fn test_calendar_invalid_date_passes_pattern() {
        let mut value = valid();
        value["purchaseDate"] = json!("2024-02-31");
        assert!(parse_record(&value).is_ok());

        value["purchaseDate"] = json!("15 Jan 2022");
        let err = parse_record(&value).unwrap_err();
        assert!(err.has_field("purchaseDate"));
    }

    #[test]
    fn test_negative_and_fractional_quantity() {
        let mut value = valid();
        value["quantity"] = json!(-1);
        assert!(parse_record(&value).unwrap_err().has_field("quantity"));

        value["quantity"] = json!(1.5);
        assert!(parse_record(&value).unwrap_err().has_field("quantity"));

        value["quantity"] = json!(0);
        assert_eq!(parse_record(&value).unwrap().quantity, 0);
    }

    #[test]
    fn test_updated_before_created_is_rejected() {
        let mut value = valid();
        value["updatedAt"] = json!("2021-01-01T00:00:00Z");
        let err = parse_record(&value).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].field, "updatedAt");
    }

    #[test]
    fn test_non_object_root() {
        let err = parse_record(&json!([1, 2])).unwrap_err();
        assert_eq!(err.violations[0].field, "$root");
    }

    #[test]
    fn test_parse_records_prefixes_index() {
        let mut bad = valid();
        bad["status"] = json!("壊れた");
        let err = parse_records(&json!([valid(), bad])).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].field, "[1].status");

        let records = parse_records(&json!([valid(), valid()])).unwrap();
        assert_eq!(records.len(), 2);
    }
}
