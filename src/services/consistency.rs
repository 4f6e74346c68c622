// src/services/consistency.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{store::id_set, TraceStore},
    models::{
        admin::SystemAlert, distribution::line_total, quality::LabTest, table::Table,
        traceability::EntityRef,
    },
};

pub const MIN_ORGANIZATIONS: i64 = 5;
pub const MIN_HERB_SPECIES: i64 = 3;
pub const MIN_SYSTEM_ALERTS: i64 = 1;

/// Referência para um id que não existe na tabela que a tag indica.
/// Só informativo: o relatório nunca conserta nada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingReference {
    pub table: Table,
    pub row_id: Uuid,
    pub column: &'static str,
    pub target_table: Table,
    pub target_id: Uuid,
}

/// Linha que quebra uma regra entre colunas ou entre entidades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvariantViolation {
    pub table: Table,
    pub row_id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    pub counts: BTreeMap<Table, i64>,
    pub dangling_references: Vec<DanglingReference>,
    pub violations: Vec<InvariantViolation>,
}

impl ConsistencyReport {
    pub fn count(&self, table: Table) -> i64 {
        self.counts.get(&table).copied().unwrap_or(0)
    }

    /// Motivos pelos quais o sistema ainda não está pronto. Vazio = pronto.
    pub fn readiness_failures(&self) -> Vec<String> {
        let mut failures = Vec::new();
        let minimums = [
            (Table::Organizations, MIN_ORGANIZATIONS),
            (Table::HerbSpecies, MIN_HERB_SPECIES),
            (Table::SystemAlerts, MIN_SYSTEM_ALERTS),
        ];
        for (table, minimum) in minimums {
            let found = self.count(table);
            if found < minimum {
                failures.push(format!("{}: {} de no mínimo {}", table, found, minimum));
            }
        }
        if !self.dangling_references.is_empty() {
            failures.push(format!("{} referências soltas", self.dangling_references.len()));
        }
        if !self.violations.is_empty() {
            failures.push(format!("{} invariantes violadas", self.violations.len()));
        }
        failures
    }

    pub fn is_ready(&self) -> bool {
        self.readiness_failures().is_empty()
    }
}

// Acumula achados enquanto percorre as tabelas.
struct Findings {
    ids: HashMap<Table, HashSet<Uuid>>,
    dangling: Vec<DanglingReference>,
    violations: Vec<InvariantViolation>,
}

impl Findings {
    fn reference(&mut self, table: Table, row_id: Uuid, column: &'static str, target_table: Table, target_id: Option<Uuid>) {
        let Some(target_id) = target_id else { return };
        let exists = self.ids.get(&target_table).is_some_and(|ids| ids.contains(&target_id));
        if !exists {
            warn!("⚠️ Referência solta: {}.{} ({}) -> {} {}", table, column, row_id, target_table, target_id);
            self.dangling.push(DanglingReference { table, row_id, column, target_table, target_id });
        }
    }

    fn target(&mut self, table: Table, row_id: Uuid, target: EntityRef) {
        self.reference(table, row_id, "entity_id", target.table(), Some(target.id()));
    }

    // Os dois stores derivam isResolved de resolvedAt; aqui só se confere.
    fn alert(&mut self, alert: &SystemAlert) {
        if alert.is_resolved != alert.resolved_at.is_some() {
            self.violation(Table::SystemAlerts, alert.id, "isResolved não acompanha resolvedAt");
        }
        match (alert.entity_type, alert.entity_id) {
            (Some(kind), Some(id)) => self.target(Table::SystemAlerts, alert.id, EntityRef::new(kind, id)),
            (None, None) => {}
            _ => self.violation(Table::SystemAlerts, alert.id, "entityType e entityId devem vir juntos"),
        }
    }

    fn violation(&mut self, table: Table, row_id: Uuid, message: impl Into<String>) {
        let message = message.into();
        warn!("⚠️ Invariante violada em {} {}: {}", table, row_id, message);
        self.violations.push(InvariantViolation { table, row_id, message });
    }
}

/// Passada só de leitura depois do seed.
#[derive(Clone)]
pub struct ConsistencyReporter {
    store: Arc<dyn TraceStore>,
}

impl ConsistencyReporter {
    pub fn new(store: Arc<dyn TraceStore>) -> Self {
        Self { store }
    }

    pub async fn report(&self) -> Result<ConsistencyReport, AppError> {
        let store = self.store.as_ref();

        let mut counts = BTreeMap::new();
        let mut ids = HashMap::new();
        for table in Table::DEPENDENCY_ORDER {
            counts.insert(table, store.count(table).await?);
            ids.insert(table, id_set(store, table).await?);
        }
        let mut findings = Findings { ids, dangling: Vec::new(), violations: Vec::new() };

        self.check_people(&mut findings).await?;
        self.check_production(&mut findings).await?;
        self.check_quality(&mut findings).await?;
        self.check_traceability(&mut findings).await?;
        self.check_distribution(&mut findings).await?;
        self.check_admin(&mut findings).await?;

        let report = ConsistencyReport {
            counts,
            dangling_references: findings.dangling,
            violations: findings.violations,
        };
        info!(
            "Relatório de consistência: {} referências soltas, {} violações, pronto = {}",
            report.dangling_references.len(),
            report.violations.len(),
            report.is_ready()
        );
        Ok(report)
    }

    async fn check_people(&self, f: &mut Findings) -> Result<(), AppError> {
        let organizations: HashMap<Uuid, _> = self
            .store
            .list_organizations()
            .await?
            .into_iter()
            .map(|org| (org.id, org.org_type))
            .collect();

        for user in self.store.list_users().await? {
            match organizations.get(&user.organization_id) {
                Some(org_type) if *org_type != user.org_type => f.violation(
                    Table::Users,
                    user.id,
                    format!("orgType {} difere da organização ({})", user.org_type, org_type),
                ),
                Some(_) => {}
                None => f.reference(Table::Users, user.id, "organization_id", Table::Organizations, Some(user.organization_id)),
            }
        }
        Ok(())
    }

    async fn check_production(&self, f: &mut Findings) -> Result<(), AppError> {
        for event in self.store.list_collection_events().await? {
            f.reference(Table::CollectionEvents, event.id, "collector_id", Table::Users, Some(event.collector_id));
            f.reference(Table::CollectionEvents, event.id, "farmer_id", Table::Users, Some(event.farmer_id));
            f.reference(Table::CollectionEvents, event.id, "herb_species_id", Table::HerbSpecies, Some(event.herb_species_id));
            f.reference(Table::CollectionEvents, event.id, "batch_id", Table::RawMaterialBatches, event.batch_id);
        }

        for batch in self.store.list_raw_material_batches().await? {
            f.reference(Table::RawMaterialBatches, batch.id, "current_owner_id", Table::Users, Some(batch.current_owner_id));
        }

        for good in self.store.list_finished_goods().await? {
            f.reference(Table::FinishedGoods, good.id, "manufacturer_id", Table::Users, Some(good.manufacturer_id));
        }

        let mut totals: BTreeMap<Uuid, Decimal> = BTreeMap::new();
        for composition in self.store.list_compositions(None).await? {
            f.reference(
                Table::FinishedGoodCompositions,
                composition.id,
                "finished_good_id",
                Table::FinishedGoods,
                Some(composition.finished_good_id),
            );
            f.reference(
                Table::FinishedGoodCompositions,
                composition.id,
                "raw_material_batch_id",
                Table::RawMaterialBatches,
                Some(composition.raw_material_batch_id),
            );
            *totals.entry(composition.finished_good_id).or_default() += composition.percentage;
        }
        for (good_id, total) in totals {
            if total > Decimal::ONE_HUNDRED {
                f.violation(Table::FinishedGoods, good_id, format!("composição soma {}%", total));
            }
        }
        Ok(())
    }

    async fn check_quality(&self, f: &mut Findings) -> Result<(), AppError> {
        let tests: HashMap<Uuid, LabTest> = self
            .store
            .list_lab_tests()
            .await?
            .into_iter()
            .map(|test| (test.id, test))
            .collect();

        for test in tests.values() {
            if let Err(e) = test.subject() {
                f.violation(Table::LabTests, test.id, e.to_string());
            }
            if test.is_completed() != test.completion_date.is_some() {
                f.violation(Table::LabTests, test.id, "completionDate não acompanha o status");
            }
            f.reference(Table::LabTests, test.id, "requester_id", Table::Users, Some(test.requester_id));
            f.reference(Table::LabTests, test.id, "lab_technician_id", Table::Users, test.lab_technician_id);
            f.reference(Table::LabTests, test.id, "batch_id", Table::RawMaterialBatches, test.batch_id);
            f.reference(Table::LabTests, test.id, "finished_good_id", Table::FinishedGoods, test.finished_good_id);
        }

        for certificate in self.store.list_certificates().await? {
            match tests.get(&certificate.test_id) {
                Some(test) if !test.is_completed() => f.violation(
                    Table::Certificates,
                    certificate.id,
                    format!("teste {} está {:?}", test.id, test.status),
                ),
                Some(_) => {}
                None => f.reference(Table::Certificates, certificate.id, "test_id", Table::LabTests, Some(certificate.test_id)),
            }
            f.reference(Table::Certificates, certificate.id, "issuer_id", Table::Users, Some(certificate.issuer_id));
            f.reference(
                Table::Certificates,
                certificate.id,
                "organization_id",
                Table::Organizations,
                Some(certificate.organization_id),
            );
        }
        Ok(())
    }

    async fn check_traceability(&self, f: &mut Findings) -> Result<(), AppError> {
        for qr in self.store.list_qr_codes().await? {
            match qr.columns().target() {
                Ok(Some(target)) => f.target(Table::QrCodes, qr.id, target),
                Ok(None) => {}
                Err(e) => f.violation(Table::QrCodes, qr.id, e.to_string()),
            }
        }

        for document in self.store.list_documents().await? {
            if document.raw_material_batch_id.is_some() && document.finished_good_id.is_some() {
                f.violation(Table::Documents, document.id, "aponta para lote e produto ao mesmo tempo");
            }
            f.reference(Table::Documents, document.id, "uploaded_by", Table::Users, Some(document.uploaded_by));
            f.reference(Table::Documents, document.id, "raw_material_batch_id", Table::RawMaterialBatches, document.raw_material_batch_id);
            f.reference(Table::Documents, document.id, "finished_good_id", Table::FinishedGoods, document.finished_good_id);
        }

        for event in self.store.list_supply_chain_events().await? {
            if event.raw_material_batch_id.is_none() && event.finished_good_id.is_none() {
                f.violation(Table::SupplyChainEvents, event.id, "evento sem lote nem produto");
            }
            f.reference(Table::SupplyChainEvents, event.id, "handler_id", Table::Users, Some(event.handler_id));
            f.reference(Table::SupplyChainEvents, event.id, "from_location_id", Table::Organizations, event.from_location_id);
            f.reference(Table::SupplyChainEvents, event.id, "to_location_id", Table::Organizations, event.to_location_id);
            f.reference(
                Table::SupplyChainEvents,
                event.id,
                "raw_material_batch_id",
                Table::RawMaterialBatches,
                event.raw_material_batch_id,
            );
            f.reference(Table::SupplyChainEvents, event.id, "finished_good_id", Table::FinishedGoods, event.finished_good_id);
        }
        Ok(())
    }

    async fn check_distribution(&self, f: &mut Findings) -> Result<(), AppError> {
        for item in self.store.list_inventory_items().await? {
            f.target(Table::DistributorInventory, item.id, item.target());
            f.reference(Table::DistributorInventory, item.id, "distributor_id", Table::Users, Some(item.distributor_id));
        }

        for shipment in self.store.list_shipments().await? {
            f.reference(Table::DistributorShipments, shipment.id, "distributor_id", Table::Users, Some(shipment.distributor_id));
        }

        for item in self.store.list_shipment_items().await? {
            f.reference(Table::ShipmentItems, item.id, "shipment_id", Table::DistributorShipments, Some(item.shipment_id));
            f.target(Table::ShipmentItems, item.id, item.product_type.entity_ref(item.entity_id));
            if item.total_price != line_total(item.quantity, item.unit_price) {
                f.violation(
                    Table::ShipmentItems,
                    item.id,
                    format!("total {} != {} x {}", item.total_price, item.quantity, item.unit_price),
                );
            }
        }
        Ok(())
    }

    async fn check_admin(&self, f: &mut Findings) -> Result<(), AppError> {
        let users: HashMap<Uuid, _> = self
            .store
            .list_users()
            .await?
            .into_iter()
            .map(|user| (user.id, user.role))
            .collect();

        for action in self.store.list_admin_actions().await? {
            match users.get(&action.admin_user_id) {
                Some(role) if !role.is_elevated() => f.violation(
                    Table::AdminActions,
                    action.id,
                    format!("assinada por papel {:?}", role),
                ),
                Some(_) => {}
                None => f.reference(Table::AdminActions, action.id, "admin_user_id", Table::Users, Some(action.admin_user_id)),
            }
        }

        for alert in self.store.list_system_alerts().await? {
            f.alert(&alert);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::admin::{AlertSeverity, AlertType};

    fn report(orgs: i64, species: i64, alerts: i64) -> ConsistencyReport {
        let mut counts = BTreeMap::new();
        counts.insert(Table::Organizations, orgs);
        counts.insert(Table::HerbSpecies, species);
        counts.insert(Table::SystemAlerts, alerts);
        ConsistencyReport { counts, dangling_references: Vec::new(), violations: Vec::new() }
    }

    #[test]
    fn readiness_thresholds() {
        assert!(report(5, 3, 1).is_ready());
        assert!(!report(4, 3, 1).is_ready());
        assert!(!report(5, 2, 1).is_ready());
        assert!(!report(5, 3, 0).is_ready());
    }

    #[test]
    fn dangling_reference_blocks_readiness() {
        let mut ready = report(5, 4, 2);
        ready.dangling_references.push(DanglingReference {
            table: Table::QrCodes,
            row_id: Uuid::new_v4(),
            column: "entity_id",
            target_table: Table::LabTests,
            target_id: Uuid::new_v4(),
        });
        assert_eq!(ready.readiness_failures(), vec!["1 referências soltas".to_string()]);
    }

    fn alert(is_resolved: bool, resolved: bool) -> SystemAlert {
        SystemAlert {
            id: Uuid::new_v4(),
            title: "Estoque baixo".into(),
            alert_type: AlertType::LowStock,
            severity: AlertSeverity::Medium,
            message: "Tulsi abaixo do mínimo".into(),
            entity_type: None,
            entity_id: None,
            is_resolved,
            resolved_at: resolved.then(Utc::now),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn resolution_flag_must_follow_resolved_at() {
        let mut f = Findings { ids: HashMap::new(), dangling: Vec::new(), violations: Vec::new() };
        f.alert(&alert(true, true));
        f.alert(&alert(false, false));
        assert!(f.violations.is_empty());

        let flagged_only = alert(true, false);
        let dated_only = alert(false, true);
        f.alert(&flagged_only);
        f.alert(&dated_only);
        let rows: Vec<Uuid> = f.violations.iter().map(|v| v.row_id).collect();
        assert_eq!(rows, vec![flagged_only.id, dated_only.id]);
        assert!(f.violations.iter().all(|v| v.table == Table::SystemAlerts));
    }

    #[test]
    fn half_set_alert_pointer_is_a_violation() {
        let mut f = Findings { ids: HashMap::new(), dangling: Vec::new(), violations: Vec::new() };
        let mut half = alert(false, false);
        half.entity_id = Some(Uuid::new_v4());
        f.alert(&half);
        assert_eq!(f.violations.len(), 1);
        assert!(f.dangling.is_empty());
    }
}
