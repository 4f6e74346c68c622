// src/db/store.rs

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
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
        quality::{Certificate, LabResults, LabTest, NewCertificate, NewLabTest},
        table::Table,
        traceability::{
            Document, LinkedTable, NewDocument, NewQrCode, NewSupplyChainEvent,
            PolymorphicColumns, QrCode, SupplyChainEvent,
        },
    },
};

/// Fronteira de persistência do grafo de rastreabilidade.
///
/// Toda listagem volta em ordem de criação (`created_at`, depois `id`).
/// Violações de unicidade de chave natural voltam como
/// `AppError::DuplicateKey`. Os componentes recebem um
/// `Arc<dyn TraceStore>` no construtor, nunca um cliente global.
#[async_trait]
pub trait TraceStore: Send + Sync {
    // --- Organizações e usuários ---
    async fn find_organization_by_type(&self, org_type: OrgType) -> Result<Option<Organization>, AppError>;
    async fn create_organization(&self, new: &NewOrganization) -> Result<Organization, AppError>;
    async fn list_organizations(&self) -> Result<Vec<Organization>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn create_user(&self, new: &NewUser) -> Result<User, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    // --- Botânica ---
    async fn find_herb_species(&self, scientific_name: &str) -> Result<Option<HerbSpecies>, AppError>;
    /// Cria ou devolve a espécie existente sem alterá-la. O `bool` diz se
    /// esta chamada inseriu a linha.
    async fn upsert_herb_species(&self, new: &NewHerbSpecies) -> Result<(HerbSpecies, bool), AppError>;
    async fn list_herb_species(&self) -> Result<Vec<HerbSpecies>, AppError>;

    async fn create_collection_event(&self, new: &NewCollectionEvent) -> Result<CollectionEvent, AppError>;
    async fn list_collection_events(&self) -> Result<Vec<CollectionEvent>, AppError>;
    async fn set_collection_event_batch(&self, event_id: Uuid, batch_id: Uuid) -> Result<CollectionEvent, AppError>;

    // --- Produção ---
    async fn create_raw_material_batch(&self, new: &NewRawMaterialBatch) -> Result<RawMaterialBatch, AppError>;
    async fn find_raw_material_batch(&self, id: Uuid) -> Result<Option<RawMaterialBatch>, AppError>;
    async fn list_raw_material_batches(&self) -> Result<Vec<RawMaterialBatch>, AppError>;
    async fn update_batch_status(&self, id: Uuid, status: BatchStatus) -> Result<RawMaterialBatch, AppError>;

    async fn create_finished_good(&self, new: &NewFinishedGood) -> Result<FinishedGood, AppError>;
    async fn list_finished_goods(&self) -> Result<Vec<FinishedGood>, AppError>;

    async fn create_composition(&self, new: &NewComposition) -> Result<FinishedGoodComposition, AppError>;
    async fn list_compositions(&self, finished_good_id: Option<Uuid>) -> Result<Vec<FinishedGoodComposition>, AppError>;

    // --- Qualidade ---
    async fn create_lab_test(&self, new: &NewLabTest) -> Result<LabTest, AppError>;
    async fn find_lab_test(&self, id: Uuid) -> Result<Option<LabTest>, AppError>;
    async fn list_lab_tests(&self) -> Result<Vec<LabTest>, AppError>;
    /// Grava status COMPLETED e completionDate na mesma escrita.
    async fn complete_lab_test(
        &self,
        id: Uuid,
        technician_id: Uuid,
        completed_at: DateTime<Utc>,
        results: &LabResults,
    ) -> Result<LabTest, AppError>;

    async fn create_certificate(&self, new: &NewCertificate) -> Result<Certificate, AppError>;
    async fn list_certificates(&self) -> Result<Vec<Certificate>, AppError>;

    // --- Rastreabilidade ---
    async fn create_supply_chain_event(&self, new: &NewSupplyChainEvent) -> Result<SupplyChainEvent, AppError>;
    async fn list_supply_chain_events(&self) -> Result<Vec<SupplyChainEvent>, AppError>;

    async fn create_qr_code(&self, new: &NewQrCode) -> Result<QrCode, AppError>;
    async fn list_qr_codes(&self) -> Result<Vec<QrCode>, AppError>;

    async fn create_document(&self, new: &NewDocument) -> Result<Document, AppError>;
    async fn list_documents(&self) -> Result<Vec<Document>, AppError>;

    /// Escreve o conjunto polimórfico inteiro numa única operação.
    /// Cada tabela grava só as colunas que possui.
    async fn apply_link(&self, table: LinkedTable, row_id: Uuid, columns: &PolymorphicColumns) -> Result<(), AppError>;

    // --- Distribuição ---
    async fn create_inventory_item(&self, new: &NewInventoryItem) -> Result<DistributorInventory, AppError>;
    async fn list_inventory_items(&self) -> Result<Vec<DistributorInventory>, AppError>;

    async fn create_shipment(&self, new: &NewShipment) -> Result<DistributorShipment, AppError>;
    async fn list_shipments(&self) -> Result<Vec<DistributorShipment>, AppError>;

    async fn create_shipment_item(&self, new: &NewShipmentItem) -> Result<ShipmentItem, AppError>;
    async fn list_shipment_items(&self) -> Result<Vec<ShipmentItem>, AppError>;

    // --- Administração ---
    async fn create_admin_action(&self, new: &NewAdminAction) -> Result<AdminAction, AppError>;
    async fn list_admin_actions(&self) -> Result<Vec<AdminAction>, AppError>;

    async fn find_system_alert(&self, key: &AlertKey) -> Result<Option<SystemAlert>, AppError>;
    async fn create_system_alert(&self, new: &NewSystemAlert) -> Result<SystemAlert, AppError>;
    async fn list_system_alerts(&self) -> Result<Vec<SystemAlert>, AppError>;

    // --- Genéricos por tabela ---
    async fn count(&self, table: Table) -> Result<i64, AppError>;
    async fn exists(&self, table: Table, id: Uuid) -> Result<bool, AppError>;
    async fn list_ids(&self, table: Table) -> Result<Vec<Uuid>, AppError>;
    async fn delete_all(&self, table: Table) -> Result<u64, AppError>;
}

/// Conjunto de ids de uma tabela, para checagens de existência em lote.
pub async fn id_set(store: &dyn TraceStore, table: Table) -> Result<HashSet<Uuid>, AppError> {
    Ok(store.list_ids(table).await?.into_iter().collect())
}
