// src/services/linker.rs

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TraceStore,
    models::{
        botanical::CollectionEvent,
        production::RawMaterialBatch,
        traceability::{EntityRef, LinkedTable, PolymorphicColumns},
    },
    services::pairing::pair_by_creation_order,
};

/// Por que um vínculo não foi gravado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    // A política pediu um alvo que a execução não produziu
    NoTarget,
    TargetNotFound,
    LabTestNotCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked(EntityRef),
    Skipped(SkipReason),
}

impl LinkOutcome {
    pub fn is_linked(&self) -> bool {
        matches!(self, LinkOutcome::Linked(_))
    }
}

/// Grava referências polimórficas sem nunca deixar uma solta.
///
/// O alvo é conferido no banco antes da escrita; se ele não existe, o
/// vínculo é pulado. A escrita em si é um `apply_link` com o conjunto
/// completo de colunas, então tag e FK específica mudam juntas.
#[derive(Clone)]
pub struct PolymorphicLinker {
    store: Arc<dyn TraceStore>,
}

impl PolymorphicLinker {
    pub fn new(store: Arc<dyn TraceStore>) -> Self {
        Self { store }
    }

    pub async fn link(
        &self,
        table: LinkedTable,
        row_id: Uuid,
        target: Option<EntityRef>,
    ) -> Result<LinkOutcome, AppError> {
        let Some(target) = target else {
            warn!("⚠️ {} {}: sem alvo disponível, vínculo pulado", table.table(), row_id);
            return Ok(LinkOutcome::Skipped(SkipReason::NoTarget));
        };

        if !table.accepts(target.kind()) {
            return Err(AppError::validation(format!(
                "{} não aceita referência para {:?}",
                table.table(),
                target.kind()
            )));
        }

        if let Some(reason) = self.check_target(table, target).await? {
            warn!("⚠️ {} {} -> {}: vínculo pulado ({:?})", table.table(), row_id, target, reason);
            return Ok(LinkOutcome::Skipped(reason));
        }

        self.store
            .apply_link(table, row_id, &PolymorphicColumns::for_target(target))
            .await?;
        Ok(LinkOutcome::Linked(target))
    }

    /// Limpa o vínculo de uma linha cuja referência é opcional.
    pub async fn unlink(&self, table: LinkedTable, row_id: Uuid) -> Result<(), AppError> {
        match table {
            LinkedTable::QrCodes | LinkedTable::Documents | LinkedTable::SystemAlerts => {
                self.store.apply_link(table, row_id, &PolymorphicColumns::default()).await
            }
            LinkedTable::SupplyChainEvents | LinkedTable::DistributorInventory => {
                Err(AppError::validation(format!("{} exige um alvo", table.table())))
            }
        }
    }

    /// `None` quando o alvo pode receber o vínculo; senão, o motivo.
    ///
    /// QR codes só apontam para teste de laboratório já concluído: o
    /// código é público e mostra o resultado.
    pub async fn check_target(
        &self,
        table: LinkedTable,
        target: EntityRef,
    ) -> Result<Option<SkipReason>, AppError> {
        if let EntityRef::LabTest(id) = target {
            let Some(test) = self.store.find_lab_test(id).await? else {
                return Ok(Some(SkipReason::TargetNotFound));
            };
            if table == LinkedTable::QrCodes && !test.is_completed() {
                return Ok(Some(SkipReason::LabTestNotCompleted));
            }
            return Ok(None);
        }

        if self.store.exists(target.table(), target.id()).await? {
            Ok(None)
        } else {
            Ok(Some(SkipReason::TargetNotFound))
        }
    }

    /// Passada de vinculação coleta -> lote.
    ///
    /// Pareia por ordem de criação e preenche `batch_id` em `min(N, M)`
    /// eventos. Eventos já vinculados ficam como estão.
    pub async fn link_collection_events(
        &self,
        events: &[CollectionEvent],
        batches: &[RawMaterialBatch],
    ) -> Result<Vec<CollectionEvent>, AppError> {
        let mut linked = Vec::new();
        for (event, batch) in pair_by_creation_order(events, batches) {
            if event.batch_id.is_some() {
                continue;
            }
            let updated = self.store.set_collection_event_batch(event.id, batch.id).await?;
            linked.push(updated);
        }
        Ok(linked)
    }
}
