//! Equipment business rules
//!
//! The predicates are plain functions over a record so they can be used on
//! borrowed data anywhere; [`EquipmentEntity`] is a thin wrapper offering the
//! same rules as methods. The form helpers operate on partial input
//! ([`EquipmentDraft`]) and always return every violation they find.
//!
//! Date-dependent helpers come in pairs: `foo` uses the local calendar date,
//! `foo_on` takes "today" explicitly.

use chrono::{DateTime, Datelike, Local, NaiveDate};
use serde_json::Value;
use thiserror::Error;

use crate::{
    error::SchemaValidationError,
    models::{
        equipment::{is_iso_date, NAME_MAX_CHARS, QUANTITY_MAX},
        parse_record, EquipmentCategory, EquipmentDraft, EquipmentField, EquipmentRecord,
        EquipmentStatus, NewEquipment, UpdateEquipment,
    },
};

/// Current local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// True if a borrower value is present and not blank
pub fn has_borrower(borrower: Option<&str>) -> bool {
    borrower.is_some_and(|b| !b.trim().is_empty())
}

/// On-loan equipment cannot be deleted. Disposed equipment can.
pub fn can_be_deleted(record: &EquipmentRecord) -> bool {
    record.status != EquipmentStatus::OnLoan
}

/// Disposed equipment is read-only
pub fn can_be_edited(record: &EquipmentRecord) -> bool {
    record.status != EquipmentStatus::Disposed
}

pub fn can_be_borrowed(record: &EquipmentRecord) -> bool {
    record.status == EquipmentStatus::Available && record.quantity > 0
}

pub fn can_be_returned(record: &EquipmentRecord) -> bool {
    record.status == EquipmentStatus::OnLoan
}

/// Agreement between status and borrower.
///
/// Only on-loan records are constrained: they need a non-blank borrower. A
/// borrower on an available or disposed record is reported as a warning by
/// the form rules, not as inconsistent data.
pub fn has_consistent_data(record: &EquipmentRecord) -> bool {
    match record.status {
        EquipmentStatus::OnLoan => has_borrower(record.borrower.as_deref()),
        EquipmentStatus::InUse | EquipmentStatus::Available | EquipmentStatus::Disposed => true,
    }
}

/// A record together with its business predicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentEntity {
    record: EquipmentRecord,
}

impl EquipmentEntity {
    pub fn from_record(record: EquipmentRecord) -> Self {
        Self { record }
    }

    /// Schema-validate an untyped payload and wrap it
    pub fn from_value(value: &Value) -> Result<Self, SchemaValidationError> {
        parse_record(value).map(Self::from_record)
    }

    pub fn can_be_deleted(&self) -> bool {
        can_be_deleted(&self.record)
    }

    pub fn can_be_edited(&self) -> bool {
        can_be_edited(&self.record)
    }

    pub fn can_be_borrowed(&self) -> bool {
        can_be_borrowed(&self.record)
    }

    pub fn can_be_returned(&self) -> bool {
        can_be_returned(&self.record)
    }

    pub fn has_consistent_data(&self) -> bool {
        has_consistent_data(&self.record)
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn status(&self) -> EquipmentStatus {
        self.record.status
    }

    pub fn borrower(&self) -> Option<&str> {
        self.record.borrower.as_deref()
    }

    pub fn quantity(&self) -> u32 {
        self.record.quantity
    }

    pub fn record(&self) -> &EquipmentRecord {
        &self.record
    }

    /// Owned snapshot of the wrapped record, for serialization
    pub fn to_record(&self) -> EquipmentRecord {
        self.record.clone()
    }
}

impl From<EquipmentRecord> for EquipmentEntity {
    fn from(record: EquipmentRecord) -> Self {
        Self::from_record(record)
    }
}

/// A form-level rule violation. `Display` is the user-facing message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormViolation {
    #[error("備品名は必須です")]
    NameRequired,
    #[error("備品名は100文字以内で入力してください")]
    NameTooLong,
    #[error("カテゴリを選択してください")]
    CategoryRequired,
    #[error("ステータスを選択してください")]
    StatusRequired,
    #[error("数量は1以上である必要があります")]
    QuantityTooSmall,
    #[error("数量は9999以下で入力してください")]
    QuantityTooLarge,
    #[error("保管場所は必須です")]
    StorageLocationRequired,
    #[error("購入日は必須です")]
    PurchaseDateRequired,
    #[error("購入日はYYYY-MM-DD形式で入力してください")]
    PurchaseDateInvalid,
    #[error("購入日は未来の日付にできません")]
    PurchaseDateInFuture,
    #[error("ステータスが「貸出中」の場合、使用者の入力は必須です")]
    BorrowerRequired,
    #[error("ステータスが「{0}」の場合、使用者は通常設定しません")]
    BorrowerNotExpected(EquipmentStatus),
}

impl FormViolation {
    /// The form field this violation is shown on
    pub fn field(&self) -> EquipmentField {
        match self {
            FormViolation::NameRequired | FormViolation::NameTooLong => EquipmentField::Name,
            FormViolation::CategoryRequired => EquipmentField::Category,
            FormViolation::StatusRequired => EquipmentField::Status,
            FormViolation::QuantityTooSmall | FormViolation::QuantityTooLarge => {
                EquipmentField::Quantity
            }
            FormViolation::StorageLocationRequired => EquipmentField::StorageLocation,
            FormViolation::PurchaseDateRequired
            | FormViolation::PurchaseDateInvalid
            | FormViolation::PurchaseDateInFuture => EquipmentField::PurchaseDate,
            FormViolation::BorrowerRequired | FormViolation::BorrowerNotExpected(_) => {
                EquipmentField::Borrower
            }
        }
    }

    /// Soft anomalies that the user may knowingly keep
    pub fn is_warning(&self) -> bool {
        matches!(self, FormViolation::BorrowerNotExpected(_))
    }
}

/// Outcome of whole-form validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FormViolation>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<FormViolation>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Rules for one field. `with_presence` adds the required-field checks on
/// top of the business rules.
fn check_field(
    field: EquipmentField,
    draft: &EquipmentDraft,
    today: NaiveDate,
    with_presence: bool,
) -> Vec<FormViolation> {
    let mut errors = Vec::new();
    match field {
        EquipmentField::Name => {
            let name = draft.name.as_deref();
            if with_presence && is_blank(name) {
                errors.push(FormViolation::NameRequired);
            } else if name.is_some_and(|n| n.chars().count() > NAME_MAX_CHARS) {
                errors.push(FormViolation::NameTooLong);
            }
        }
        EquipmentField::Category => {
            if with_presence && draft.category.is_none() {
                errors.push(FormViolation::CategoryRequired);
            }
        }
        EquipmentField::Status => {
            if with_presence && draft.status.is_none() {
                errors.push(FormViolation::StatusRequired);
            }
        }
        EquipmentField::Quantity => match draft.quantity {
            Some(q) if q > i64::from(QUANTITY_MAX) => errors.push(FormViolation::QuantityTooLarge),
            Some(q) if with_presence && q < 1 => errors.push(FormViolation::QuantityTooSmall),
            None if with_presence => errors.push(FormViolation::QuantityTooSmall),
            _ => {}
        },
        EquipmentField::StorageLocation => {
            if with_presence && is_blank(draft.storage_location.as_deref()) {
                errors.push(FormViolation::StorageLocationRequired);
            }
        }
        EquipmentField::PurchaseDate => match draft.purchase_date.as_deref() {
            Some(date) if !date.trim().is_empty() => {
                if !is_iso_date(date) {
                    errors.push(FormViolation::PurchaseDateInvalid);
                } else if date > today.format("%Y-%m-%d").to_string().as_str() {
                    // ISO dates compare chronologically as strings
                    errors.push(FormViolation::PurchaseDateInFuture);
                }
            }
            _ if with_presence => errors.push(FormViolation::PurchaseDateRequired),
            _ => {}
        },
        EquipmentField::Borrower => {
            let borrower_set = has_borrower(draft.borrower.as_deref());
            match draft.status {
                Some(EquipmentStatus::OnLoan) if !borrower_set => {
                    errors.push(FormViolation::BorrowerRequired)
                }
                Some(status @ (EquipmentStatus::Available | EquipmentStatus::Disposed))
                    if borrower_set =>
                {
                    errors.push(FormViolation::BorrowerNotExpected(status))
                }
                _ => {}
            }
        }
        EquipmentField::Notes => {}
    }
    errors
}

/// Validate a whole form: required fields plus business rules
pub fn validate_form_data(draft: &EquipmentDraft) -> ValidationResult {
    validate_form_data_on(draft, today())
}

pub fn validate_form_data_on(draft: &EquipmentDraft, today: NaiveDate) -> ValidationResult {
    let errors = EquipmentField::ALL
        .into_iter()
        .flat_map(|field| check_field(field, draft, today, true))
        .collect();
    ValidationResult::from_errors(errors)
}

/// Cross-field and range rules only; absent fields are not reported
pub fn validate_business_rules_for_form(draft: &EquipmentDraft) -> Vec<FormViolation> {
    validate_business_rules_for_form_on(draft, today())
}

pub fn validate_business_rules_for_form_on(
    draft: &EquipmentDraft,
    today: NaiveDate,
) -> Vec<FormViolation> {
    EquipmentField::ALL
        .into_iter()
        .flat_map(|field| check_field(field, draft, today, false))
        .collect()
}

/// Validate a single field for on-blur feedback. The value is read from
/// `values`; the borrower rules also look at `values.status`.
pub fn validate_field(field: EquipmentField, values: &EquipmentDraft) -> Vec<FormViolation> {
    validate_field_on(field, values, today())
}

pub fn validate_field_on(
    field: EquipmentField,
    values: &EquipmentDraft,
    today: NaiveDate,
) -> Vec<FormViolation> {
    check_field(field, values, today, true)
}

/// Initial values for the create form
pub fn form_defaults() -> EquipmentDraft {
    form_defaults_on(today())
}

pub fn form_defaults_on(today: NaiveDate) -> EquipmentDraft {
    EquipmentDraft {
        name: None,
        category: Some(EquipmentCategory::AudioVisual),
        status: Some(EquipmentStatus::Available),
        quantity: Some(1),
        storage_location: None,
        purchase_date: Some(today.format("%Y-%m-%d").to_string()),
        borrower: Some(String::new()),
        notes: Some(String::new()),
    }
}

fn trimmed_or_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim text fields; blank optional fields become absent
pub fn prepare_for_submission(input: NewEquipment) -> NewEquipment {
    NewEquipment {
        name: input.name.trim().to_string(),
        storage_location: input.storage_location.trim().to_string(),
        purchase_date: input.purchase_date.trim().to_string(),
        borrower: trimmed_or_none(input.borrower),
        notes: trimmed_or_none(input.notes),
        ..input
    }
}

/// Same preparation for a partial update: text is trimmed and a blank
/// optional field becomes an explicit clear.
pub fn prepare_update_for_submission(changes: UpdateEquipment) -> UpdateEquipment {
    let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
    let clearable = |value: Option<Option<String>>| value.map(trimmed_or_none);
    UpdateEquipment {
        name: trim(changes.name),
        storage_location: trim(changes.storage_location),
        purchase_date: trim(changes.purchase_date),
        borrower: clearable(changes.borrower),
        notes: clearable(changes.notes),
        ..changes
    }
}

/// Format an ISO date or RFC 3339 timestamp as a Japanese long date
/// (`2023年5月15日`). Returns `None` for unparseable input.
pub fn format_date_ja(value: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))?;
    Some(format!("{}年{}月{}日", date.year(), date.month(), date.day()))
}
