// src/db/memory_store.rs

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::TraceStore,
    models::{
        admin::{AdminAction, AlertKey, NewAdminAction, NewSystemAlert, SystemAlert},
        botanical::{CollectionEvent, HerbSpecies, NewCollectionEvent, NewHerbSpecies},
        distribution::{
            DistributorInventory, DistributorShipment, NewInventoryItem, NewShipment,
            NewShipmentItem, ShipmentItem,
        },
        organization::{NewOrganization, NewUser, OrgType, Organization, User},
        production::{
            BatchStatus, FinishedGood, FinishedGoodComposition, NewComposition, NewFinishedGood,
            NewRawMaterialBatch, RawMaterialBatch,
        },
        quality::{Certificate, LabResults, LabTest, LabTestStatus, NewCertificate, NewLabTest},
        table::Table,
        traceability::{
            Document, LinkedTable, NewDocument, NewQrCode, NewSupplyChainEvent,
            PolymorphicColumns, QrCode, SupplyChainEvent,
        },
    },
};

#[derive(Default)]
struct Tables {
    // Último created_at entregue; garante ordem estrita de criação.
    clock: Option<DateTime<Utc>>,

    organizations: Vec<Organization>,
    users: Vec<User>,
    herb_species: Vec<HerbSpecies>,
    collection_events: Vec<CollectionEvent>,
    raw_material_batches: Vec<RawMaterialBatch>,
    finished_goods: Vec<FinishedGood>,
    compositions: Vec<FinishedGoodComposition>,
    lab_tests: Vec<LabTest>,
    certificates: Vec<Certificate>,
    supply_chain_events: Vec<SupplyChainEvent>,
    qr_codes: Vec<QrCode>,
    documents: Vec<Document>,
    inventory: Vec<DistributorInventory>,
    shipments: Vec<DistributorShipment>,
    shipment_items: Vec<ShipmentItem>,
    admin_actions: Vec<AdminAction>,
    system_alerts: Vec<SystemAlert>,
}

impl Tables {
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.clock {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }

    fn ids(&self, table: Table) -> Vec<Uuid> {
        match table {
            Table::Organizations => self.organizations.iter().map(|r| r.id).collect(),
            Table::Users => self.users.iter().map(|r| r.id).collect(),
            Table::HerbSpecies => self.herb_species.iter().map(|r| r.id).collect(),
            Table::RawMaterialBatches => self.raw_material_batches.iter().map(|r| r.id).collect(),
            Table::CollectionEvents => self.collection_events.iter().map(|r| r.id).collect(),
            Table::FinishedGoods => self.finished_goods.iter().map(|r| r.id).collect(),
            Table::FinishedGoodCompositions => self.compositions.iter().map(|r| r.id).collect(),
            Table::LabTests => self.lab_tests.iter().map(|r| r.id).collect(),
            Table::Certificates => self.certificates.iter().map(|r| r.id).collect(),
            Table::SupplyChainEvents => self.supply_chain_events.iter().map(|r| r.id).collect(),
            Table::QrCodes => self.qr_codes.iter().map(|r| r.id).collect(),
            Table::Documents => self.documents.iter().map(|r| r.id).collect(),
            Table::DistributorInventory => self.inventory.iter().map(|r| r.id).collect(),
            Table::DistributorShipments => self.shipments.iter().map(|r| r.id).collect(),
            Table::ShipmentItems => self.shipment_items.iter().map(|r| r.id).collect(),
            Table::AdminActions => self.admin_actions.iter().map(|r| r.id).collect(),
            Table::SystemAlerts => self.system_alerts.iter().map(|r| r.id).collect(),
        }
    }

    fn clear(&mut self, table: Table) -> u64 {
        fn drain<T>(rows: &mut Vec<T>) -> u64 {
            let removed = rows.len() as u64;
            rows.clear();
            removed
        }
        match table {
            Table::Organizations => drain(&mut self.organizations),
            Table::Users => drain(&mut self.users),
            Table::HerbSpecies => drain(&mut self.herb_species),
            Table::RawMaterialBatches => drain(&mut self.raw_material_batches),
            Table::CollectionEvents => drain(&mut self.collection_events),
            Table::FinishedGoods => drain(&mut self.finished_goods),
            Table::FinishedGoodCompositions => drain(&mut self.compositions),
            Table::LabTests => drain(&mut self.lab_tests),
            Table::Certificates => drain(&mut self.certificates),
            Table::SupplyChainEvents => drain(&mut self.supply_chain_events),
            Table::QrCodes => drain(&mut self.qr_codes),
            Table::Documents => drain(&mut self.documents),
            Table::DistributorInventory => drain(&mut self.inventory),
            Table::DistributorShipments => drain(&mut self.shipments),
            Table::ShipmentItems => drain(&mut self.shipment_items),
            Table::AdminActions => drain(&mut self.admin_actions),
            Table::SystemAlerts => drain(&mut self.system_alerts),
        }
    }
}

/// Implementação em memória do `TraceStore`.
///
/// Aplica as mesmas restrições de unicidade do schema Postgres, mas não
/// checa chaves estrangeiras: referências soltas podem ser provocadas
/// de propósito nos testes.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// Mesma regra do índice lower(email) no Postgres.
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn duplicate(entity: &'static str, key: &str) -> AppError {
    AppError::DuplicateKey { entity, key: key.to_string() }
}

#[async_trait]
impl TraceStore for MemoryStore {
    // --- Organizações e usuários ---

    async fn find_organization_by_type(&self, org_type: OrgType) -> Result<Option<Organization>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables.organizations.iter().find(|o| o.org_type == org_type).cloned())
    }

    async fn create_organization(&self, new: &NewOrganization) -> Result<Organization, AppError> {
        let mut tables = self.inner.write().await;
        if tables.organizations.iter().any(|o| o.org_type == new.org_type) {
            return Err(duplicate("Organization", &format!("{:?}", new.org_type)));
        }
        let now = tables.tick();
        let org = Organization {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            org_type: new.org_type,
            description: new.description.clone(),
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        tables.organizations.push(org.clone());
        Ok(org)
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, AppError> {
        Ok(self.inner.read().await.organizations.clone())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables.users.iter().find(|u| same_email(&u.email, email)).cloned())
    }

    async fn create_user(&self, new: &NewUser) -> Result<User, AppError> {
        let mut tables = self.inner.write().await;
        if tables.users.iter().any(|u| same_email(&u.email, &new.email)) {
            return Err(duplicate("User", &new.email));
        }
        let now = tables.tick();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email.clone(),
            name: new.name.clone(),
            password_hash: new.password_hash.clone(),
            role: new.role,
            org_type: new.org_type,
            organization_id: new.organization_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.inner.read().await.users.clone())
    }

    // --- Botânica ---

    async fn find_herb_species(&self, scientific_name: &str) -> Result<Option<HerbSpecies>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables.herb_species.iter().find(|s| s.scientific_name == scientific_name).cloned())
    }

    async fn upsert_herb_species(&self, new: &NewHerbSpecies) -> Result<(HerbSpecies, bool), AppError> {
        let mut tables = self.inner.write().await;
        if let Some(existing) = tables.herb_species.iter().find(|s| s.scientific_name == new.scientific_name) {
            return Ok((existing.clone(), false));
        }
        let now = tables.tick();
        let species = HerbSpecies {
            id: Uuid::new_v4(),
            common_name: new.common_name.clone(),
            scientific_name: new.scientific_name.clone(),
            family: new.family.clone(),
            description: new.description.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.herb_species.push(species.clone());
        Ok((species, true))
    }

    async fn list_herb_species(&self) -> Result<Vec<HerbSpecies>, AppError> {
        Ok(self.inner.read().await.herb_species.clone())
    }

    async fn create_collection_event(&self, new: &NewCollectionEvent) -> Result<CollectionEvent, AppError> {
        let mut tables = self.inner.write().await;
        let now = tables.tick();
        let event = CollectionEvent {
            id: Uuid::new_v4(),
            collector_id: new.collector_id,
            farmer_id: new.farmer_id,
            herb_species_id: new.herb_species_id,
            quantity: new.quantity,
            unit: new.unit.clone(),
            location: new.location.clone(),
            harvest_date: new.harvest_date,
            batch_id: None,
            custom_data: new.custom_data.clone(),
            created_at: now,
        };
        tables.collection_events.push(event.clone());
        Ok(event)
    }

    async fn list_collection_events(&self) -> Result<Vec<CollectionEvent>, AppError> {
        Ok(self.inner.read().await.collection_events.clone())
    }

    async fn set_collection_event_batch(&self, event_id: Uuid, batch_id: Uuid) -> Result<CollectionEvent, AppError> {
        let mut tables = self.inner.write().await;
        let event = tables
            .collection_events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or(AppError::NotFound { entity: "CollectionEvent", id: event_id })?;
        event.batch_id = Some(batch_id);
        Ok(event.clone())
    }

    // --- Produção ---

    async fn create_raw_material_batch(&self, new: &NewRawMaterialBatch) -> Result<RawMaterialBatch, AppError> {
        let mut tables = self.inner.write().await;
        let now = tables.tick();
        let batch = RawMaterialBatch {
            id: Uuid::new_v4(),
            herb_name: new.herb_name.clone(),
            quantity: new.quantity,
            unit: new.unit.clone(),
            status: BatchStatus::Created,
            current_owner_id: new.current_owner_id,
            supplier_info: new.supplier_info.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.raw_material_batches.push(batch.clone());
        Ok(batch)
    }

    async fn find_raw_material_batch(&self, id: Uuid) -> Result<Option<RawMaterialBatch>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables.raw_material_batches.iter().find(|b| b.id == id).cloned())
    }

    async fn list_raw_material_batches(&self) -> Result<Vec<RawMaterialBatch>, AppError> {
        Ok(self.inner.read().await.raw_material_batches.clone())
    }

    async fn update_batch_status(&self, id: Uuid, status: BatchStatus) -> Result<RawMaterialBatch, AppError> {
        let mut tables = self.inner.write().await;
        let batch = tables
            .raw_material_batches
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(AppError::NotFound { entity: "RawMaterialBatch", id })?;
        batch.status = status;
        batch.updated_at = Utc::now();
        Ok(batch.clone())
    }

    async fn create_finished_good(&self, new: &NewFinishedGood) -> Result<FinishedGood, AppError> {
        let mut tables = self.inner.write().await;
        let taken = tables
            .finished_goods
            .iter()
            .any(|g| g.manufacturer_id == new.manufacturer_id && g.batch_number == new.batch_number);
        if taken {
            return Err(duplicate("FinishedGood", &new.batch_number));
        }
        let now = tables.tick();
        let good = FinishedGood {
            id: Uuid::new_v4(),
            product_name: new.product_name.clone(),
            product_type: new.product_type.clone(),
            manufacturer_id: new.manufacturer_id,
            batch_number: new.batch_number.clone(),
            quantity: new.quantity,
            unit: new.unit.clone(),
            manufacture_date: new.manufacture_date,
            expiry_date: new.expiry_date,
            created_at: now,
            updated_at: now,
        };
        tables.finished_goods.push(good.clone());
        Ok(good)
    }

    async fn list_finished_goods(&self) -> Result<Vec<FinishedGood>, AppError> {
        Ok(self.inner.read().await.finished_goods.clone())
    }

    async fn create_composition(&self, new: &NewComposition) -> Result<FinishedGoodComposition, AppError> {
        let mut tables = self.inner.write().await;
        let now = tables.tick();
        let composition = FinishedGoodComposition {
            id: Uuid::new_v4(),
            finished_good_id: new.finished_good_id,
            raw_material_batch_id: new.raw_material_batch_id,
            percentage: new.percentage,
            quantity_used: new.quantity_used,
            created_at: now,
        };
        tables.compositions.push(composition.clone());
        Ok(composition)
    }

    async fn list_compositions(&self, finished_good_id: Option<Uuid>) -> Result<Vec<FinishedGoodComposition>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables
            .compositions
            .iter()
            .filter(|c| finished_good_id.is_none_or(|id| c.finished_good_id == id))
            .cloned()
            .collect())
    }

    // --- Qualidade ---

    async fn create_lab_test(&self, new: &NewLabTest) -> Result<LabTest, AppError> {
        let mut tables = self.inner.write().await;
        let (batch_id, finished_good_id) = new.subject.columns();
        let now = tables.tick();
        let test = LabTest {
            id: Uuid::new_v4(),
            test_type: new.test_type.clone(),
            status: new.status,
            requester_id: new.requester_id,
            lab_technician_id: new.lab_technician_id,
            batch_id,
            finished_good_id,
            results: new.results.clone().map(Json),
            notes: new.notes.clone(),
            completion_date: new.completion_date,
            created_at: now,
            updated_at: now,
        };
        tables.lab_tests.push(test.clone());
        Ok(test)
    }

    async fn find_lab_test(&self, id: Uuid) -> Result<Option<LabTest>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables.lab_tests.iter().find(|t| t.id == id).cloned())
    }

    async fn list_lab_tests(&self) -> Result<Vec<LabTest>, AppError> {
        Ok(self.inner.read().await.lab_tests.clone())
    }

    async fn complete_lab_test(
        &self,
        id: Uuid,
        technician_id: Uuid,
        completed_at: DateTime<Utc>,
        results: &LabResults,
    ) -> Result<LabTest, AppError> {
        let mut tables = self.inner.write().await;
        let test = tables
            .lab_tests
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(AppError::NotFound { entity: "LabTest", id })?;
        test.status = LabTestStatus::Completed;
        test.lab_technician_id = Some(technician_id);
        test.completion_date = Some(completed_at);
        test.results = Some(Json(results.clone()));
        test.updated_at = Utc::now();
        Ok(test.clone())
    }

    async fn create_certificate(&self, new: &NewCertificate) -> Result<Certificate, AppError> {
        let mut tables = self.inner.write().await;
        if tables.certificates.iter().any(|c| c.certificate_number == new.certificate_number) {
            return Err(duplicate("Certificate", &new.certificate_number));
        }
        let now = tables.tick();
        let certificate = Certificate {
            id: Uuid::new_v4(),
            certificate_number: new.certificate_number.clone(),
            test_id: new.test_id,
            issuer_id: new.issuer_id,
            organization_id: new.organization_id,
            is_valid: true,
            issued_at: new.issued_at,
            expires_at: new.expires_at,
            created_at: now,
        };
        tables.certificates.push(certificate.clone());
        Ok(certificate)
    }

    async fn list_certificates(&self) -> Result<Vec<Certificate>, AppError> {
        Ok(self.inner.read().await.certificates.clone())
    }

    // --- Rastreabilidade ---

    async fn create_supply_chain_event(&self, new: &NewSupplyChainEvent) -> Result<SupplyChainEvent, AppError> {
        let mut tables = self.inner.write().await;
        let (raw_material_batch_id, finished_good_id) = new.subject.columns();
        let now = tables.tick();
        let event = SupplyChainEvent {
            id: Uuid::new_v4(),
            event_type: new.event_type,
            handler_id: new.handler_id,
            from_location_id: new.from_location_id,
            to_location_id: new.to_location_id,
            raw_material_batch_id,
            finished_good_id,
            notes: new.notes.clone(),
            metadata: new.metadata.clone(),
            created_at: now,
        };
        tables.supply_chain_events.push(event.clone());
        Ok(event)
    }

    async fn list_supply_chain_events(&self) -> Result<Vec<SupplyChainEvent>, AppError> {
        Ok(self.inner.read().await.supply_chain_events.clone())
    }

    async fn create_qr_code(&self, new: &NewQrCode) -> Result<QrCode, AppError> {
        let mut tables = self.inner.write().await;
        if tables.qr_codes.iter().any(|q| q.code == new.code) {
            return Err(duplicate("QrCode", &new.code));
        }
        let now = tables.tick();
        let qr = QrCode {
            id: Uuid::new_v4(),
            code: new.code.clone(),
            entity_type: None,
            entity_id: None,
            raw_material_batch_id: None,
            finished_good_id: None,
            lab_test_id: None,
            label: new.label.clone(),
            svg_data: new.svg_data.clone(),
            custom_data: new.custom_data.clone(),
            scan_count: 0,
            created_at: now,
            updated_at: now,
        };
        tables.qr_codes.push(qr.clone());
        Ok(qr)
    }

    async fn list_qr_codes(&self) -> Result<Vec<QrCode>, AppError> {
        Ok(self.inner.read().await.qr_codes.clone())
    }

    async fn create_document(&self, new: &NewDocument) -> Result<Document, AppError> {
        let mut tables = self.inner.write().await;
        let now = tables.tick();
        let document = Document {
            id: Uuid::new_v4(),
            title: new.title.clone(),
            document_type: new.document_type,
            file_url: new.file_url.clone(),
            uploaded_by: new.uploaded_by,
            raw_material_batch_id: None,
            finished_good_id: None,
            metadata: new.metadata.clone(),
            created_at: now,
        };
        tables.documents.push(document.clone());
        Ok(document)
    }

    async fn list_documents(&self) -> Result<Vec<Document>, AppError> {
        Ok(self.inner.read().await.documents.clone())
    }

    async fn apply_link(&self, table: LinkedTable, row_id: Uuid, columns: &PolymorphicColumns) -> Result<(), AppError> {
        // O lock de escrita cobre a atualização inteira da linha.
        let mut tables = self.inner.write().await;
        let not_found = AppError::NotFound { entity: table.table().label(), id: row_id };

        match table {
            LinkedTable::QrCodes => {
                let qr = tables.qr_codes.iter_mut().find(|q| q.id == row_id).ok_or(not_found)?;
                qr.entity_type = columns.entity_type;
                qr.entity_id = columns.entity_id;
                qr.raw_material_batch_id = columns.raw_material_batch_id;
                qr.finished_good_id = columns.finished_good_id;
                qr.lab_test_id = columns.lab_test_id;
                qr.updated_at = Utc::now();
            }
            LinkedTable::Documents => {
                let (batch_id, good_id) = columns.batch_or_good()?;
                let doc = tables.documents.iter_mut().find(|d| d.id == row_id).ok_or(not_found)?;
                doc.raw_material_batch_id = batch_id;
                doc.finished_good_id = good_id;
            }
            LinkedTable::SupplyChainEvents => {
                let (batch_id, good_id) = columns.batch_or_good()?;
                let event = tables
                    .supply_chain_events
                    .iter_mut()
                    .find(|e| e.id == row_id)
                    .ok_or(not_found)?;
                event.raw_material_batch_id = batch_id;
                event.finished_good_id = good_id;
            }
            LinkedTable::DistributorInventory => {
                let (product_type, entity_id) = columns.product_pointer()?;
                let item = tables.inventory.iter_mut().find(|i| i.id == row_id).ok_or(not_found)?;
                item.product_type = product_type;
                item.entity_id = entity_id;
                item.updated_at = Utc::now();
            }
            LinkedTable::SystemAlerts => {
                let alert = tables.system_alerts.iter_mut().find(|a| a.id == row_id).ok_or(not_found)?;
                alert.entity_type = columns.entity_type;
                alert.entity_id = columns.entity_id;
            }
        }
        Ok(())
    }

    // --- Distribuição ---

    async fn create_inventory_item(&self, new: &NewInventoryItem) -> Result<DistributorInventory, AppError> {
        let mut tables = self.inner.write().await;
        let now = tables.tick();
        let item = DistributorInventory {
            id: Uuid::new_v4(),
            distributor_id: new.distributor_id,
            product_type: new.product_type,
            entity_id: new.entity_id,
            quantity: new.quantity,
            unit_price: new.unit_price,
            warehouse_location: new.warehouse_location.clone(),
            supplier_info: new.supplier_info.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.inventory.push(item.clone());
        Ok(item)
    }

    async fn list_inventory_items(&self) -> Result<Vec<DistributorInventory>, AppError> {
        Ok(self.inner.read().await.inventory.clone())
    }

    async fn create_shipment(&self, new: &NewShipment) -> Result<DistributorShipment, AppError> {
        let mut tables = self.inner.write().await;
        if tables.shipments.iter().any(|s| s.shipment_number == new.shipment_number) {
            return Err(duplicate("DistributorShipment", &new.shipment_number));
        }
        let now = tables.tick();
        let shipment = DistributorShipment {
            id: Uuid::new_v4(),
            distributor_id: new.distributor_id,
            shipment_number: new.shipment_number.clone(),
            status: new.status,
            destination: new.destination.clone(),
            shipped_at: new.shipped_at,
            created_at: now,
            updated_at: now,
        };
        tables.shipments.push(shipment.clone());
        Ok(shipment)
    }

    async fn list_shipments(&self) -> Result<Vec<DistributorShipment>, AppError> {
        Ok(self.inner.read().await.shipments.clone())
    }

    async fn create_shipment_item(&self, new: &NewShipmentItem) -> Result<ShipmentItem, AppError> {
        let mut tables = self.inner.write().await;
        let now = tables.tick();
        let item = ShipmentItem {
            id: Uuid::new_v4(),
            shipment_id: new.shipment_id,
            product_type: new.product_type,
            entity_id: new.entity_id,
            quantity: new.quantity,
            unit_price: new.unit_price,
            total_price: new.total_price,
            created_at: now,
        };
        tables.shipment_items.push(item.clone());
        Ok(item)
    }

    async fn list_shipment_items(&self) -> Result<Vec<ShipmentItem>, AppError> {
        Ok(self.inner.read().await.shipment_items.clone())
    }

    // --- Administração ---

    async fn create_admin_action(&self, new: &NewAdminAction) -> Result<AdminAction, AppError> {
        let mut tables = self.inner.write().await;
        let now = tables.tick();
        let action = AdminAction {
            id: Uuid::new_v4(),
            action_type: new.action_type,
            admin_user_id: new.admin_user_id,
            description: new.description.clone(),
            metadata: new.metadata.clone(),
            created_at: now,
        };
        tables.admin_actions.push(action.clone());
        Ok(action)
    }

    async fn list_admin_actions(&self) -> Result<Vec<AdminAction>, AppError> {
        Ok(self.inner.read().await.admin_actions.clone())
    }

    async fn find_system_alert(&self, key: &AlertKey) -> Result<Option<SystemAlert>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables
            .system_alerts
            .iter()
            .find(|a| a.title == key.title && a.alert_type == key.alert_type)
            .cloned())
    }

    async fn create_system_alert(&self, new: &NewSystemAlert) -> Result<SystemAlert, AppError> {
        let mut tables = self.inner.write().await;
        if tables.system_alerts.iter().any(|a| a.title == new.title && a.alert_type == new.alert_type) {
            return Err(duplicate("SystemAlert", &new.key().to_string()));
        }
        let now = tables.tick();
        let alert = SystemAlert {
            id: Uuid::new_v4(),
            title: new.title.clone(),
            alert_type: new.alert_type,
            severity: new.severity,
            message: new.message.clone(),
            entity_type: new.target.map(|t| t.kind()),
            entity_id: new.target.map(|t| t.id()),
            is_resolved: new.is_resolved(),
            resolved_at: new.resolved_at,
            created_at: now,
        };
        tables.system_alerts.push(alert.clone());
        Ok(alert)
    }

    async fn list_system_alerts(&self) -> Result<Vec<SystemAlert>, AppError> {
        Ok(self.inner.read().await.system_alerts.clone())
    }

    // --- Genéricos ---

    async fn count(&self, table: Table) -> Result<i64, AppError> {
        Ok(self.inner.read().await.ids(table).len() as i64)
    }

    async fn exists(&self, table: Table, id: Uuid) -> Result<bool, AppError> {
        Ok(self.inner.read().await.ids(table).contains(&id))
    }

    async fn list_ids(&self, table: Table) -> Result<Vec<Uuid>, AppError> {
        Ok(self.inner.read().await.ids(table))
    }

    async fn delete_all(&self, table: Table) -> Result<u64, AppError> {
        Ok(self.inner.write().await.clear(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_at_is_strictly_increasing() {
        let store = MemoryStore::new();
        let mut last = None;
        for i in 0..20 {
            let (species, _) = store
                .upsert_herb_species(&NewHerbSpecies {
                    common_name: format!("Erva {i}"),
                    scientific_name: format!("Herba {i}"),
                    family: None,
                    description: None,
                })
                .await
                .unwrap();
            if let Some(prev) = last {
                assert!(species.created_at > prev);
            }
            last = Some(species.created_at);
        }
    }

    #[tokio::test]
    async fn second_organization_of_a_type_is_rejected() {
        let store = MemoryStore::new();
        store.create_organization(&NewOrganization::default_for(OrgType::Farmer)).await.unwrap();
        let err = store
            .create_organization(&NewOrganization::default_for(OrgType::Farmer))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateKey { entity: "Organization", .. }), "{err}");
    }

    #[tokio::test]
    async fn delete_all_reports_removed_rows() {
        let store = MemoryStore::new();
        store.create_organization(&NewOrganization::default_for(OrgType::Labs)).await.unwrap();
        store.create_organization(&NewOrganization::default_for(OrgType::Admin)).await.unwrap();
        assert_eq!(store.delete_all(Table::Organizations).await.unwrap(), 2);
        assert_eq!(store.count(Table::Organizations).await.unwrap(), 0);
    }
}
