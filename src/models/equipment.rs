//! Equipment model

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::enums::{EquipmentCategory, EquipmentStatus};

/// Maximum length of an equipment name, in characters
pub const NAME_MAX_CHARS: usize = 100;
/// Upper bound for the unit count
pub const QUANTITY_MAX: u32 = 9999;

static PURCHASE_DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("purchase date pattern"));

/// True if `value` has the exact `YYYY-MM-DD` shape.
///
/// This is a pattern check only; `2024-02-31` passes.
pub fn is_iso_date(value: &str) -> bool {
    PURCHASE_DATE_PATTERN.is_match(value)
}

pub(crate) fn validate_purchase_date(value: &str) -> Result<(), ValidationError> {
    if is_iso_date(value) {
        return Ok(());
    }
    let mut err = ValidationError::new("purchase_date_format");
    err.message = Some(Cow::from("Purchase date must use the YYYY-MM-DD format"));
    Err(err)
}

/// Equipment record as stored by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentRecord {
    pub id: String,
    pub name: String,
    pub category: EquipmentCategory,
    pub status: EquipmentStatus,
    pub quantity: u32,
    pub storage_location: String,
    /// `YYYY-MM-DD`
    pub purchase_date: String,
    /// Person holding the item; expected when the status is on-loan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrower: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Create equipment request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEquipment {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    pub category: EquipmentCategory,
    pub status: EquipmentStatus,
    #[validate(range(min = 1, max = 9999, message = "Quantity must be between 1 and 9999"))]
    pub quantity: u32,
    #[validate(length(min = 1, message = "Storage location is required"))]
    pub storage_location: String,
    #[validate(custom(function = "validate_purchase_date"))]
    pub purchase_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrower: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update request.
///
/// `None` leaves a field untouched. For the optional `borrower` and `notes`
/// fields, `Some(None)` clears the value (sent as `null`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEquipment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<EquipmentCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EquipmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(max = 9999, message = "Quantity must not exceed 9999"))]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Storage location is required"))]
    pub storage_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_purchase_date"))]
    pub purchase_date: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub borrower: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub notes: Option<Option<String>>,
}

impl UpdateEquipment {
    /// True when the update would not change anything
    pub fn is_empty(&self) -> bool {
        self == &UpdateEquipment::default()
    }

    /// Fields this update sets or clears
    pub fn fields(&self) -> Vec<EquipmentField> {
        [
            (EquipmentField::Name, self.name.is_some()),
            (EquipmentField::Category, self.category.is_some()),
            (EquipmentField::Status, self.status.is_some()),
            (EquipmentField::Quantity, self.quantity.is_some()),
            (EquipmentField::StorageLocation, self.storage_location.is_some()),
            (EquipmentField::PurchaseDate, self.purchase_date.is_some()),
            (EquipmentField::Borrower, self.borrower.is_some()),
            (EquipmentField::Notes, self.notes.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, set)| set.then_some(field))
        .collect()
    }

    /// The fields of `current` that differ from `original`
    pub fn between(original: &NewEquipment, current: &NewEquipment) -> Self {
        fn changed<T: PartialEq + Clone>(before: &T, after: &T) -> Option<T> {
            (before != after).then(|| after.clone())
        }
        Self {
            name: changed(&original.name, &current.name),
            category: changed(&original.category, &current.category),
            status: changed(&original.status, &current.status),
            quantity: changed(&original.quantity, &current.quantity),
            storage_location: changed(&original.storage_location, &current.storage_location),
            purchase_date: changed(&original.purchase_date, &current.purchase_date),
            borrower: changed(&original.borrower, &current.borrower),
            notes: changed(&original.notes, &current.notes),
        }
    }
}

/// Editable equipment fields, in form order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquipmentField {
    Name,
    Category,
    Status,
    Quantity,
    StorageLocation,
    PurchaseDate,
    Borrower,
    Notes,
}

impl EquipmentField {
    pub const ALL: [EquipmentField; 8] = [
        EquipmentField::Name,
        EquipmentField::Category,
        EquipmentField::Status,
        EquipmentField::Quantity,
        EquipmentField::StorageLocation,
        EquipmentField::PurchaseDate,
        EquipmentField::Borrower,
        EquipmentField::Notes,
    ];

    /// Fields that must be filled in before a record can be created
    pub const REQUIRED: [EquipmentField; 6] = [
        EquipmentField::Name,
        EquipmentField::Category,
        EquipmentField::Status,
        EquipmentField::Quantity,
        EquipmentField::StorageLocation,
        EquipmentField::PurchaseDate,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            EquipmentField::Name => "name",
            EquipmentField::Category => "category",
            EquipmentField::Status => "status",
            EquipmentField::Quantity => "quantity",
            EquipmentField::StorageLocation => "storageLocation",
            EquipmentField::PurchaseDate => "purchaseDate",
            EquipmentField::Borrower => "borrower",
            EquipmentField::Notes => "notes",
        }
    }
}

impl std::fmt::Display for EquipmentField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Partially filled equipment form.
///
/// Quantity is kept signed so that out-of-range input can be reported by
/// validation rather than lost at conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentDraft {
    pub name: Option<String>,
    pub category: Option<EquipmentCategory>,
    pub status: Option<EquipmentStatus>,
    pub quantity: Option<i64>,
    pub storage_location: Option<String>,
    pub purchase_date: Option<String>,
    pub borrower: Option<String>,
    pub notes: Option<String>,
}

impl EquipmentDraft {
    /// True if the field holds a value (blank text counts as empty)
    pub fn is_filled(&self, field: EquipmentField) -> bool {
        fn text(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.trim().is_empty())
        }
        match field {
            EquipmentField::Name => text(&self.name),
            EquipmentField::Category => self.category.is_some(),
            EquipmentField::Status => self.status.is_some(),
            EquipmentField::Quantity => self.quantity.is_some(),
            EquipmentField::StorageLocation => text(&self.storage_location),
            EquipmentField::PurchaseDate => text(&self.purchase_date),
            EquipmentField::Borrower => text(&self.borrower),
            EquipmentField::Notes => text(&self.notes),
        }
    }
}

impl EquipmentDraft {
    /// True if anything was entered at all; whitespace counts as entered
    pub fn is_entered(&self, field: EquipmentField) -> bool {
        fn text(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.is_empty())
        }
        match field {
            EquipmentField::Name => text(&self.name),
            EquipmentField::StorageLocation => text(&self.storage_location),
            EquipmentField::PurchaseDate => text(&self.purchase_date),
            EquipmentField::Borrower => text(&self.borrower),
            EquipmentField::Notes => text(&self.notes),
            other => self.is_filled(other),
        }
    }
}

/// Edit forms start from the stored record; absent optional text shows as empty.
impl From<&EquipmentRecord> for EquipmentDraft {
    fn from(record: &EquipmentRecord) -> Self {
        Self {
            name: Some(record.name.clone()),
            category: Some(record.category),
            status: Some(record.status),
            quantity: Some(i64::from(record.quantity)),
            storage_location: Some(record.storage_location.clone()),
            purchase_date: Some(record.purchase_date.clone()),
            borrower: Some(record.borrower.clone().unwrap_or_default()),
            notes: Some(record.notes.clone().unwrap_or_default()),
        }
    }
}

impl From<&EquipmentRecord> for NewEquipment {
    fn from(record: &EquipmentRecord) -> Self {
        Self {
            name: record.name.clone(),
            category: record.category,
            status: record.status,
            quantity: record.quantity,
            storage_location: record.storage_location.clone(),
            purchase_date: record.purchase_date.clone(),
            borrower: record.borrower.clone(),
            notes: record.notes.clone(),
        }
    }
}

impl From<NewEquipment> for EquipmentDraft {
    fn from(input: NewEquipment) -> Self {
        Self {
            name: Some(input.name),
            category: Some(input.category),
            status: Some(input.status),
            quantity: Some(i64::from(input.quantity)),
            storage_location: Some(input.storage_location),
            purchase_date: Some(input.purchase_date),
            borrower: input.borrower,
            notes: input.notes,
        }
    }
}

impl TryFrom<&EquipmentDraft> for NewEquipment {
    /// Required fields that are missing or unusable
    type Error = Vec<EquipmentField>;

    fn try_from(draft: &EquipmentDraft) -> Result<Self, Self::Error> {
        let quantity = draft.quantity.and_then(|q| u32::try_from(q).ok());
        match (
            draft.name.clone(),
            draft.category,
            draft.status,
            quantity,
            draft.storage_location.clone(),
            draft.purchase_date.clone(),
        ) {
            (
                Some(name),
                Some(category),
                Some(status),
                Some(quantity),
                Some(storage_location),
                Some(purchase_date),
            ) => Ok(NewEquipment {
                name,
                category,
                status,
                quantity,
                storage_location,
                purchase_date,
                borrower: draft.borrower.clone(),
                notes: draft.notes.clone(),
            }),
            _ => {
                let mut missing: Vec<EquipmentField> = EquipmentField::REQUIRED
                    .into_iter()
                    .filter(|f| !draft.is_filled(*f))
                    .collect();
                if draft.quantity.is_some() && quantity.is_none() {
                    missing.push(EquipmentField::Quantity);
                }
                missing.sort();
                Err(missing)
            }
        }
    }
}
