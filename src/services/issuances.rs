//! Issuance and acknowledgement recorder

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use sqlx::PgConnection;

use super::{
    activity_log::ActivityLogService, collaborators::HardwareAssignments, components::ComponentsService,
    issuance_number::IssuanceNumberGenerator, retry_on_contention,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        activity_log::{ActionType, LoggableRef, NewActivityLog},
        enums::{AcknowledgementStatus, IssuanceType},
        hardware::AssignmentUpdate,
        issuance::{
            resolve_issued_to, validate_batch, AcknowledgementOutcome, Issuance, IssuanceDetails,
            IssuanceResult, IssuanceSummary, OperationRequest, WholeUnitIssuanceRequest,
        },
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct IssuancesService {
    repository: Repository,
    components: ComponentsService,
    numbers: IssuanceNumberGenerator,
    activity: ActivityLogService,
    assignments: Arc<dyn HardwareAssignments>,
}

impl IssuancesService {
    pub fn new(
        repository: Repository,
        components: ComponentsService,
        numbers: IssuanceNumberGenerator,
        activity: ActivityLogService,
        assignments: Arc<dyn HardwareAssignments>,
    ) -> Self {
        Self {
            repository,
            components,
            numbers,
            activity,
            assignments,
        }
    }

    /// Get an issuance with its component details and acknowledgement
    pub async fn get_issuance(&self, id: i32) -> AppResult<IssuanceDetails> {
        self.repository.issuances.get_details(id).await
    }

    /// Issuances waiting for the employee's acknowledgement
    pub async fn pending_for_employee(&self, employee_id: i32) -> AppResult<Vec<Issuance>> {
        self.repository.issuances.pending_for(employee_id).await
    }

    /// Apply a batch of component operations to one unit and record them as
    /// a single maintenance issuance. Any failure leaves nothing behind.
    pub async fn process_component_maintenance(
        &self,
        operations: &[OperationRequest],
        actor_id: i32,
    ) -> IssuanceResult {
        let result = retry_on_contention("Component maintenance", move || {
            self.record_component_maintenance(operations, actor_id)
        })
        .await
        .map(|issued| vec![issued]);
        if let Err(ref e) = result {
            tracing::warn!("Component maintenance by employee #{} failed: {}", actor_id, e);
        }
        result.into()
    }

    pub async fn record_component_maintenance(
        &self,
        operations: &[OperationRequest],
        actor_id: i32,
    ) -> AppResult<IssuanceSummary> {
        let (hardware_id, changes) = validate_batch(operations)?;

        let mut tx = self.repository.pool.begin().await?;
        let hardware = self.repository.hardware.lock(&mut tx, hardware_id).await?;
        let issued_to = resolve_issued_to(operations, hardware.issued_to, actor_id);

        let mut outcomes = Vec::with_capacity(changes.len());
        for change in &changes {
            outcomes.push(self.components.apply(&mut tx, &hardware, change, actor_id).await?);
        }

        let remarks = format!("{} component operation(s) on {}", changes.len(), hardware.hostname);
        let issuance = self
            .create_issuance(
                &mut tx,
                IssuanceType::ComponentMaintenance,
                hardware.id,
                issued_to,
                actor_id,
                Some(remarks.as_str()),
            )
            .await?;

        for ((request, change), outcome) in operations.iter().zip(&changes).zip(&outcomes) {
            self.repository
                .issuances
                .insert_component_detail(
                    &mut tx,
                    issuance.id,
                    change.operation_type().as_str(),
                    change.component_type().as_str(),
                    outcome.old.as_ref(),
                    outcome.new.as_ref(),
                    request.reason.as_deref(),
                    request.remarks.as_deref(),
                )
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Issuance {} recorded {} operation(s) on {}",
            issuance.issuance_number,
            changes.len(),
            hardware.hostname
        );
        Ok(IssuanceSummary {
            id: issuance.id,
            issuance_number: issuance.issuance_number,
            hardware_id: issuance.hardware_id,
        })
    }

    /// Issue whole units to an employee, one issuance per unit, all or nothing
    pub async fn create_whole_unit_issuance(
        &self,
        request: &WholeUnitIssuanceRequest,
        actor_id: i32,
    ) -> IssuanceResult {
        let result = retry_on_contention("Whole unit issuance", move || {
            self.record_whole_unit_issuance(request, actor_id)
        })
        .await;
        if let Err(ref e) = result {
            tracing::warn!("Whole unit issuance by employee #{} failed: {}", actor_id, e);
        }
        result.into()
    }

    pub async fn record_whole_unit_issuance(
        &self,
        request: &WholeUnitIssuanceRequest,
        actor_id: i32,
    ) -> AppResult<Vec<IssuanceSummary>> {
        if request.hostnames.is_empty() {
            return Err(AppError::InvalidRequest("At least one hostname is required".to_string()));
        }

        let mut tx = self.repository.pool.begin().await?;
        let issued_at = Utc::now();
        let mut issued = Vec::with_capacity(request.hostnames.len());

        for hostname in &request.hostnames {
            let hardware = self.repository.hardware.lock_by_hostname(&mut tx, hostname).await?;

            let issuance = self
                .create_issuance(
                    &mut tx,
                    IssuanceType::WholeUnit,
                    hardware.id,
                    request.issued_to,
                    actor_id,
                    request.remarks.as_deref(),
                )
                .await?;

            let update = AssignmentUpdate {
                issued_to: request.issued_to,
                location: request.location.clone(),
                date_issued: issued_at,
            };
            self.assignments
                .update_assignment(&mut tx, hardware.id, &update, actor_id)
                .await?;

            issued.push(IssuanceSummary {
                id: issuance.id,
                issuance_number: issuance.issuance_number,
                hardware_id: hardware.id,
            });
        }

        tx.commit().await?;

        tracing::info!(
            "Issued {} unit(s) to employee #{}",
            issued.len(),
            request.issued_to
        );
        Ok(issued)
    }

    /// Confirm receipt of an issuance. Only the receiving employee may do it, once.
    pub async fn acknowledge(&self, issuance_id: i32, actor_id: i32) -> AppResult<AcknowledgementOutcome> {
        let mut tx = self.repository.pool.begin().await?;
        let acknowledgement = self
            .repository
            .issuances
            .lock_acknowledgement(&mut tx, issuance_id)
            .await?;

        if acknowledgement.status() == AcknowledgementStatus::Acknowledged {
            return Ok(AcknowledgementOutcome::rejected("Issuance already acknowledged"));
        }
        if acknowledgement.acknowledged_by != actor_id {
            return Ok(AcknowledgementOutcome::rejected(
                "Only the receiving employee can acknowledge this issuance",
            ));
        }

        let updated = self
            .repository
            .issuances
            .mark_acknowledged(&mut tx, acknowledgement.id)
            .await?;

        let entry = NewActivityLog::new(
            LoggableRef::Issuance(issuance_id),
            ActionType::IssuanceAcknowledged,
            actor_id,
        )
        .old_values(json!({ "status": acknowledgement.status }))
        .new_values(json!({ "status": updated.status, "acknowledged_at": updated.acknowledged_at }));
        self.activity.record(&mut tx, &entry).await?;

        tx.commit().await?;

        tracing::info!("Issuance #{} acknowledged by employee #{}", issuance_id, actor_id);
        Ok(AcknowledgementOutcome {
            success: true,
            message: "Issuance acknowledged".to_string(),
            acknowledgement: Some(updated),
        })
    }

    /// Header, pending acknowledgement and audit entry of a new issuance
    async fn create_issuance(
        &self,
        conn: &mut PgConnection,
        issuance_type: IssuanceType,
        hardware_id: i32,
        issued_to: i32,
        actor_id: i32,
        remarks: Option<&str>,
    ) -> AppResult<Issuance> {
        let number = self.numbers.next_issuance_number(conn).await?;
        let issuance = self
            .repository
            .issuances
            .insert_issuance(conn, &number, issuance_type, hardware_id, issued_to, actor_id, remarks)
            .await?;

        self.repository
            .issuances
            .insert_acknowledgement(conn, issuance.id, issued_to)
            .await?;

        let entry = NewActivityLog::new(
            LoggableRef::Issuance(issuance.id),
            ActionType::IssuanceCreated,
            actor_id,
        )
        .new_values(json!({
            "issuance_number": issuance.issuance_number,
            "issuance_type": issuance_type.to_string(),
            "hardware_id": hardware_id,
            "issued_to": issued_to,
        }))
        .remarks(format!("{} issuance {}", issuance_type, issuance.issuance_number));
        self.activity.record(conn, &entry).await?;

        Ok(issuance)
    }
}
