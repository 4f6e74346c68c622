// src/services/lifecycle_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TraceStore,
    models::{
        admin::{AdminAction, AdminActionType, NewAdminAction},
        organization::User,
        production::{BatchStatus, FinishedGoodComposition, NewComposition, RawMaterialBatch},
        quality::{Certificate, LabResults, LabTest, NewCertificate, NewLabTest},
    },
};

/// Operações que dependem do estado atual de outra linha.
/// Toda checagem roda aqui, antes de qualquer escrita.
#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn TraceStore>,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn TraceStore>) -> Self {
        Self { store }
    }

    pub async fn advance_batch(&self, batch_id: Uuid, next: BatchStatus) -> Result<RawMaterialBatch, AppError> {
        let batch = self
            .store
            .find_raw_material_batch(batch_id)
            .await?
            .ok_or(AppError::NotFound { entity: "RawMaterialBatch", id: batch_id })?;

        let status = batch.status.transition_to(next)?;
        let updated = self.store.update_batch_status(batch_id, status).await?;
        info!("Lote {} ({}) agora está {:?}", updated.id, updated.herb_name, updated.status);
        Ok(updated)
    }

    /// Leva o lote até `target` passando por cada etapa intermediária.
    pub async fn advance_batch_to(&self, batch: &RawMaterialBatch, target: BatchStatus) -> Result<RawMaterialBatch, AppError> {
        let mut current = batch.clone();
        for next in [BatchStatus::InProcessing, BatchStatus::Processed] {
            if next > target {
                break;
            }
            if current.status.can_transition_to(next) {
                current = self.advance_batch(current.id, next).await?;
            }
        }
        Ok(current)
    }

    pub async fn add_composition(&self, new: &NewComposition) -> Result<FinishedGoodComposition, AppError> {
        let existing = self.store.list_compositions(Some(new.finished_good_id)).await?;
        new.check_against(&existing)?;
        self.store.create_composition(new).await
    }

    pub async fn register_lab_test(&self, new: &NewLabTest) -> Result<LabTest, AppError> {
        new.check()?;
        self.store.create_lab_test(new).await
    }

    /// Conclui um teste já existente: status e data na mesma escrita.
    pub async fn complete_lab_test(
        &self,
        test_id: Uuid,
        technician_id: Uuid,
        completed_at: DateTime<Utc>,
        results: LabResults,
    ) -> Result<LabTest, AppError> {
        let test = self
            .store
            .find_lab_test(test_id)
            .await?
            .ok_or(AppError::NotFound { entity: "LabTest", id: test_id })?;

        if test.is_completed() {
            return Err(AppError::validation(format!("Teste {} já está concluído", test_id)));
        }
        self.store.complete_lab_test(test_id, technician_id, completed_at, &results).await
    }

    /// Certificado só sai de teste COMPLETED, conferido no estado atual do banco.
    pub async fn issue_certificate(
        &self,
        test_id: Uuid,
        certificate_number: String,
        issuer_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Certificate, AppError> {
        let test = self
            .store
            .find_lab_test(test_id)
            .await?
            .ok_or(AppError::NotFound { entity: "LabTest", id: test_id })?;

        let new = NewCertificate::issue_for(&test, certificate_number, issuer_id, organization_id)?;
        self.store.create_certificate(&new).await
    }

    pub async fn record_admin_action(
        &self,
        admin: &User,
        action_type: AdminActionType,
        description: &str,
        metadata: Option<Value>,
    ) -> Result<AdminAction, AppError> {
        let new = NewAdminAction::by(admin, action_type, description, metadata)?;
        self.store.create_admin_action(&new).await
    }
}
