//! Equipment service
//!
//! Wraps a transport with schema validation of every payload and the
//! lifecycle rules of [`EquipmentEntity`].

use validator::Validate;

use crate::{
    domain::entity::{
        prepare_for_submission, prepare_update_for_submission, validate_business_rules_for_form,
        validate_form_data, EquipmentEntity, FormViolation,
    },
    error::{AppError, AppResult, SchemaValidationError},
    models::{
        parse_record, parse_records, schema::constraint_violations, EquipmentDraft,
        EquipmentField, EquipmentStatus, NewEquipment, UpdateEquipment,
    },
    transport::EquipmentTransport,
};

pub struct EquipmentService<T> {
    transport: T,
}

fn rule_error(violations: &[FormViolation]) -> AppError {
    AppError::Validation(
        violations
            .iter()
            .map(|v| format!("{}: {}", v.field(), v))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

fn constraint_error(errors: &validator::ValidationErrors) -> AppError {
    AppError::Validation(SchemaValidationError::new(constraint_violations(errors)).to_string())
}

/// The values `changes` would leave behind when applied to `base`
fn apply(mut base: NewEquipment, changes: &UpdateEquipment) -> NewEquipment {
    if let Some(name) = &changes.name {
        base.name = name.clone();
    }
    if let Some(category) = changes.category {
        base.category = category;
    }
    if let Some(status) = changes.status {
        base.status = status;
    }
    if let Some(quantity) = changes.quantity {
        base.quantity = quantity;
    }
    if let Some(location) = &changes.storage_location {
        base.storage_location = location.clone();
    }
    if let Some(date) = &changes.purchase_date {
        base.purchase_date = date.clone();
    }
    if let Some(borrower) = &changes.borrower {
        base.borrower = borrower.clone();
    }
    if let Some(notes) = &changes.notes {
        base.notes = notes.clone();
    }
    base
}

impl<T: EquipmentTransport> EquipmentService<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// All equipment. One invalid item fails the whole call.
    pub async fn list(&self) -> AppResult<Vec<EquipmentEntity>> {
        let payload = self.transport.fetch_all().await?;
        let records = parse_records(&payload).map_err(|err| {
            tracing::warn!(violations = err.violations.len(), "rejected equipment list: {}", err);
            err
        })?;
        tracing::debug!(count = records.len(), "loaded equipment");
        Ok(records.into_iter().map(EquipmentEntity::from_record).collect())
    }

    pub async fn get(&self, id: &str) -> AppResult<EquipmentEntity> {
        let payload = self.transport.fetch_by_id(id).await?;
        Ok(EquipmentEntity::from_record(parse_record(&payload)?))
    }

    pub async fn create(&self, data: NewEquipment) -> AppResult<EquipmentEntity> {
        let data = prepare_for_submission(data);
        data.validate().map_err(|e| constraint_error(&e))?;
        let violations = validate_business_rules_for_form(&EquipmentDraft::from(data.clone()));
        if !violations.is_empty() {
            return Err(rule_error(&violations));
        }

        let created = EquipmentEntity::from_record(parse_record(&self.transport.create(&data).await?)?);
        tracing::info!(id = %created.id(), name = %created.name(), "created equipment");
        Ok(created)
    }

    /// Apply a partial update. Text is trimmed first and the merged values
    /// must pass the form rules for every field the update touches (the
    /// borrower rule also applies when the status changes). Warning-level
    /// rules do not block it, so records with a stale borrower stay editable.
    pub async fn update(
        &self,
        entity: &EquipmentEntity,
        changes: UpdateEquipment,
    ) -> AppResult<EquipmentEntity> {
        if !entity.can_be_edited() {
            return Err(AppError::BusinessRule(format!(
                "Equipment {} is disposed and cannot be edited",
                entity.id()
            )));
        }
        let changes = prepare_update_for_submission(changes);
        if changes.is_empty() {
            return Err(AppError::Validation("No changes to apply".to_string()));
        }

        let mut touched = changes.fields();
        if changes.status.is_some() {
            touched.push(EquipmentField::Borrower);
        }
        let result = apply(NewEquipment::from(entity.record()), &changes);
        let violations: Vec<FormViolation> = validate_form_data(&EquipmentDraft::from(result))
            .errors
            .into_iter()
            .filter(|v| !v.is_warning() && touched.contains(&v.field()))
            .collect();
        if !violations.is_empty() {
            return Err(rule_error(&violations));
        }
        changes.validate().map_err(|e| constraint_error(&e))?;

        self.send_update(entity.id(), &changes).await
    }

    pub async fn delete(&self, entity: &EquipmentEntity) -> AppResult<()> {
        if !entity.can_be_deleted() {
            return Err(AppError::BusinessRule(format!(
                "Equipment {} is on loan and cannot be deleted",
                entity.id()
            )));
        }
        self.transport.delete(entity.id()).await?;
        tracing::info!(id = %entity.id(), "deleted equipment");
        Ok(())
    }

    /// Mark available equipment as on loan to `borrower`
    pub async fn lend(&self, entity: &EquipmentEntity, borrower: &str) -> AppResult<EquipmentEntity> {
        if !entity.can_be_borrowed() {
            return Err(AppError::BusinessRule(format!(
                "Equipment {} cannot be borrowed while {}",
                entity.id(),
                entity.status()
            )));
        }
        let borrower = borrower.trim();
        if borrower.is_empty() {
            return Err(AppError::Validation(FormViolation::BorrowerRequired.to_string()));
        }
        let changes = UpdateEquipment {
            status: Some(EquipmentStatus::OnLoan),
            borrower: Some(Some(borrower.to_string())),
            ..Default::default()
        };
        self.send_update(entity.id(), &changes).await
    }

    /// Bring on-loan equipment back and clear the borrower
    pub async fn return_item(&self, entity: &EquipmentEntity) -> AppResult<EquipmentEntity> {
        if !entity.can_be_returned() {
            return Err(AppError::BusinessRule(format!(
                "Equipment {} is not on loan",
                entity.id()
            )));
        }
        let changes = UpdateEquipment {
            status: Some(EquipmentStatus::Available),
            borrower: Some(None),
            ..Default::default()
        };
        self.send_update(entity.id(), &changes).await
    }

    async fn send_update(&self, id: &str, changes: &UpdateEquipment) -> AppResult<EquipmentEntity> {
        let updated = EquipmentEntity::from_record(parse_record(&self.transport.update(id, changes).await?)?);
        tracing::info!(id = %id, status = %updated.status(), "updated equipment");
        Ok(updated)
    }
}
