//! Interactive create/edit form validation
//!
//! Each field moves between three states: untouched after a value change,
//! then valid or invalid once it is validated on blur or on submit. Input is
//! parsed before it reaches the draft, so a quantity that is not a number or a
//! date that is not on the calendar never becomes a form value.

use chrono::NaiveDate;
use indexmap::IndexMap;
use thiserror::Error;

use super::entity::{
    form_defaults_on, prepare_for_submission, today, validate_field_on, validate_form_data_on,
    EquipmentEntity, FormViolation, ValidationResult,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::is_iso_date, EquipmentCategory, EquipmentDraft, EquipmentField,
        EquipmentStatus, NewEquipment, UpdateEquipment,
    },
};

/// Validation state of one field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldState {
    #[default]
    Untouched,
    Valid,
    Invalid(Vec<FormViolation>),
}

impl FieldState {
    fn from_violations(violations: Vec<FormViolation>) -> Self {
        if violations.is_empty() {
            FieldState::Valid
        } else {
            FieldState::Invalid(violations)
        }
    }

    pub fn violations(&self) -> &[FormViolation] {
        match self {
            FieldState::Invalid(v) => v,
            _ => &[],
        }
    }
}

/// Per-field error lists, in form order
pub type FieldErrors = IndexMap<EquipmentField, Vec<FormViolation>>;

/// Raw input refused by the input layer; the form value is left unchanged
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputRejected {
    #[error("数値を入力してください: {0}")]
    NotANumber(String),
    #[error("有効な日付を入力してください: {0}")]
    InvalidDate(String),
    #[error("有効なカテゴリを選択してください: {0}")]
    UnknownCategory(String),
    #[error("有効なステータスを選択してください: {0}")]
    UnknownStatus(String),
}

/// Why a submit did not produce a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("入力内容にエラーがあります")]
    Invalid(FieldErrors),
    #[error("変更が検出されませんでした。")]
    Unchanged,
}

/// What to send to the backend after a successful submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create(NewEquipment),
    Update { id: String, changes: UpdateEquipment },
}

#[derive(Debug, Clone)]
enum FormMode {
    Create,
    Edit { id: String, original: NewEquipment },
}

/// Form state for creating or editing one equipment record
#[derive(Debug, Clone)]
pub struct EquipmentForm {
    mode: FormMode,
    initial: EquipmentDraft,
    values: EquipmentDraft,
    fields: IndexMap<EquipmentField, FieldState>,
    today: NaiveDate,
}

impl EquipmentForm {
    fn with_values(mode: FormMode, initial: EquipmentDraft, today: NaiveDate) -> Self {
        Self {
            mode,
            values: initial.clone(),
            initial,
            fields: EquipmentField::ALL
                .into_iter()
                .map(|f| (f, FieldState::Untouched))
                .collect(),
            today,
        }
    }

    /// Empty create form, prefilled with the defaults
    pub fn create() -> Self {
        Self::create_on(today())
    }

    pub fn create_on(today: NaiveDate) -> Self {
        Self::with_values(FormMode::Create, form_defaults_on(today), today)
    }

    /// Edit form for an existing record. Disposed equipment cannot be edited.
    pub fn edit(entity: &EquipmentEntity) -> AppResult<Self> {
        Self::edit_on(entity, today())
    }

    pub fn edit_on(entity: &EquipmentEntity, today: NaiveDate) -> AppResult<Self> {
        if !entity.can_be_edited() {
            return Err(AppError::BusinessRule(format!(
                "Equipment {} is {} and cannot be edited",
                entity.id(),
                entity.status()
            )));
        }
        let record = entity.record();
        let mode = FormMode::Edit {
            id: record.id.clone(),
            original: prepare_for_submission(NewEquipment::from(record)),
        };
        Ok(Self::with_values(mode, EquipmentDraft::from(record), today))
    }

    pub fn values(&self) -> &EquipmentDraft {
        &self.values
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    /// Apply raw user input to a field. The field returns to untouched.
    pub fn input(&mut self, field: EquipmentField, raw: &str) -> Result<(), InputRejected> {
        let trimmed = raw.trim();
        match field {
            EquipmentField::Name => self.values.name = Some(raw.to_string()),
            EquipmentField::StorageLocation => self.values.storage_location = Some(raw.to_string()),
            EquipmentField::Borrower => self.values.borrower = Some(raw.to_string()),
            EquipmentField::Notes => self.values.notes = Some(raw.to_string()),
            EquipmentField::Category => {
                self.values.category = if trimmed.is_empty() {
                    None
                } else {
                    Some(
                        trimmed
                            .parse::<EquipmentCategory>()
                            .map_err(|_| InputRejected::UnknownCategory(raw.to_string()))?,
                    )
                }
            }
            EquipmentField::Status => {
                self.values.status = if trimmed.is_empty() {
                    None
                } else {
                    Some(
                        trimmed
                            .parse::<EquipmentStatus>()
                            .map_err(|_| InputRejected::UnknownStatus(raw.to_string()))?,
                    )
                }
            }
            EquipmentField::Quantity => {
                self.values.quantity = if trimmed.is_empty() {
                    None
                } else {
                    Some(
                        trimmed
                            .parse::<i64>()
                            .map_err(|_| InputRejected::NotANumber(raw.to_string()))?,
                    )
                }
            }
            EquipmentField::PurchaseDate => {
                self.values.purchase_date = if trimmed.is_empty() {
                    None
                } else {
                    let valid = is_iso_date(trimmed)
                        && NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok();
                    if !valid {
                        return Err(InputRejected::InvalidDate(raw.to_string()));
                    }
                    Some(trimmed.to_string())
                }
            }
        }
        self.fields.insert(field, FieldState::Untouched);
        Ok(())
    }

    /// Validate one field when it loses focus
    pub fn blur(&mut self, field: EquipmentField) -> &[FormViolation] {
        let violations = validate_field_on(field, &self.values, self.today);
        self.fields.insert(field, FieldState::from_violations(violations));
        self.state(field).violations()
    }

    pub fn state(&self, field: EquipmentField) -> &FieldState {
        self.fields.get(&field).unwrap_or(&FieldState::Untouched)
    }

    /// Validate every field, attaching each violation to the field it concerns
    pub fn validate(&mut self) -> ValidationResult {
        let result = validate_form_data_on(&self.values, self.today);
        let mut grouped: FieldErrors = EquipmentField::ALL
            .into_iter()
            .map(|f| (f, Vec::new()))
            .collect();
        for violation in &result.errors {
            if let Some(list) = grouped.get_mut(&violation.field()) {
                list.push(*violation);
            }
        }
        for (field, violations) in grouped {
            self.fields.insert(field, FieldState::from_violations(violations));
        }
        result
    }

    /// Current error lists of the fields that are invalid
    pub fn field_errors(&self) -> FieldErrors {
        self.fields
            .iter()
            .filter(|(_, state)| matches!(state, FieldState::Invalid(_)))
            .map(|(field, state)| (*field, state.violations().to_vec()))
            .collect()
    }

    pub fn clear_errors(&mut self, field: Option<EquipmentField>) {
        match field {
            Some(field) => {
                self.fields.insert(field, FieldState::Untouched);
            }
            None => self.fields.values_mut().for_each(|s| *s = FieldState::Untouched),
        }
    }

    /// Restore the initial values and forget all validation results
    pub fn reset(&mut self) {
        self.values = self.initial.clone();
        self.clear_errors(None);
    }

    /// True if any value differs from the one the form was opened with
    pub fn is_dirty(&self) -> bool {
        self.values != self.initial
    }

    pub fn has_warnings(&self) -> bool {
        self.fields
            .values()
            .any(|s| s.violations().iter().any(FormViolation::is_warning))
    }

    /// Share of the required fields with any input, in percent. Blank text
    /// counts as input here; validation still rejects it.
    pub fn completion_rate(&self) -> u8 {
        let filled = EquipmentField::REQUIRED
            .iter()
            .filter(|f| self.values.is_entered(**f))
            .count();
        let total = EquipmentField::REQUIRED.len();
        ((filled * 100 + total / 2) / total) as u8
    }

    /// Validate the whole form and build the request to send.
    ///
    /// Edits that leave every value as it was are rejected as a no-op.
    pub fn submit(&mut self) -> Result<Submission, SubmitRejected> {
        let result = self.validate();
        if !result.is_valid {
            tracing::debug!("Form submit rejected with {} violation(s)", result.errors.len());
            return Err(SubmitRejected::Invalid(self.field_errors()));
        }

        let input = NewEquipment::try_from(&self.values).map_err(|missing| {
            SubmitRejected::Invalid(
                missing
                    .into_iter()
                    .map(|f| (f, self.state(f).violations().to_vec()))
                    .collect(),
            )
        })?;
        let prepared = prepare_for_submission(input);

        match &self.mode {
            FormMode::Create => Ok(Submission::Create(prepared)),
            FormMode::Edit { id, original } => {
                let changes = UpdateEquipment::between(original, &prepared);
                if changes.is_empty() {
                    tracing::debug!("Edit of equipment {} has no changes", id);
                    return Err(SubmitRejected::Unchanged);
                }
                Ok(Submission::Update {
                    id: id.clone(),
                    changes,
                })
            }
        }
    }
}
