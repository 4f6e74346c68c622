// src/models/traceability.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::distribution::ProductType;
use crate::models::table::Table;

// =========================================================================
//  REFERÊNCIA POLIMÓRFICA
// =========================================================================

// Mapeia o CREATE TYPE entity_kind do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entity_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    RawMaterialBatch,
    FinishedGood,
    LabTest,
}

impl EntityKind {
    /// Tabela onde um id com esta tag precisa existir.
    pub fn table(&self) -> Table {
        match self {
            EntityKind::RawMaterialBatch => Table::RawMaterialBatches,
            EntityKind::FinishedGood => Table::FinishedGoods,
            EntityKind::LabTest => Table::LabTests,
        }
    }
}

/// União fechada usada na fronteira da aplicação. Só vira colunas
/// paralelas (tag + id + FK específica) na fronteira de persistência.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityRef {
    RawMaterialBatch(Uuid),
    FinishedGood(Uuid),
    LabTest(Uuid),
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        match kind {
            EntityKind::RawMaterialBatch => EntityRef::RawMaterialBatch(id),
            EntityKind::FinishedGood => EntityRef::FinishedGood(id),
            EntityKind::LabTest => EntityRef::LabTest(id),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::RawMaterialBatch(_) => EntityKind::RawMaterialBatch,
            EntityRef::FinishedGood(_) => EntityKind::FinishedGood,
            EntityRef::LabTest(_) => EntityKind::LabTest,
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            EntityRef::RawMaterialBatch(id) | EntityRef::FinishedGood(id) | EntityRef::LabTest(id) => id,
        }
    }

    pub fn table(&self) -> Table {
        self.kind().table()
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}:{}", self.kind(), self.id())
    }
}

/// O conjunto completo de colunas polimórficas de uma linha.
/// Sempre escrito de uma vez: nenhuma leitura vê a tag dizendo uma coisa
/// e a FK específica dizendo outra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolymorphicColumns {
    pub entity_type: Option<EntityKind>,
    pub entity_id: Option<Uuid>,
    pub raw_material_batch_id: Option<Uuid>,
    pub finished_good_id: Option<Uuid>,
    pub lab_test_id: Option<Uuid>,
}

impl PolymorphicColumns {
    /// Tag, id e exatamente uma FK específica. As outras FKs saem nulas,
    /// apagando qualquer valor velho de uma vinculação anterior.
    pub fn for_target(target: EntityRef) -> Self {
        let mut columns = Self {
            entity_type: Some(target.kind()),
            entity_id: Some(target.id()),
            ..Self::default()
        };
        match target {
            EntityRef::RawMaterialBatch(id) => columns.raw_material_batch_id = Some(id),
            EntityRef::FinishedGood(id) => columns.finished_good_id = Some(id),
            EntityRef::LabTest(id) => columns.lab_test_id = Some(id),
        }
        columns
    }

    /// Forma (productType, entityId) usada pelo estoque do distribuidor.
    pub fn product_pointer(&self) -> Result<(ProductType, Uuid), AppError> {
        let kind = self.entity_type.and_then(ProductType::from_kind);
        match (kind, self.entity_id) {
            (Some(product_type), Some(id)) => Ok((product_type, id)),
            _ => Err(AppError::validation(format!(
                "Estoque só aponta para lote ou produto, recebido {:?}",
                self.entity_type
            ))),
        }
    }

    /// Forma (raw_material_batch_id, finished_good_id) usada por documentos
    /// e eventos da cadeia.
    pub fn batch_or_good(&self) -> Result<(Option<Uuid>, Option<Uuid>), AppError> {
        if self.lab_test_id.is_some() {
            return Err(AppError::validation("Esta tabela não aponta para testes de laboratório"));
        }
        Ok((self.raw_material_batch_id, self.finished_good_id))
    }

    /// Caminho inverso: relê as colunas e devolve a referência tipada.
    /// `Ok(None)` quando a linha ainda não foi vinculada.
    pub fn target(&self) -> Result<Option<EntityRef>, AppError> {
        let specific = [
            self.raw_material_batch_id.map(EntityRef::RawMaterialBatch),
            self.finished_good_id.map(EntityRef::FinishedGood),
            self.lab_test_id.map(EntityRef::LabTest),
        ];
        let mut set = specific.into_iter().flatten();
        let first = set.next();
        if set.next().is_some() {
            return Err(AppError::validation("Mais de uma FK específica preenchida"));
        }

        match (self.entity_type, self.entity_id, first) {
            (None, None, None) => Ok(None),
            (Some(kind), Some(id), Some(fk)) if fk == EntityRef::new(kind, id) => Ok(Some(fk)),
            _ => Err(AppError::validation(format!(
                "Colunas polimórficas inconsistentes: tag {:?}, id {:?}, FK {:?}",
                self.entity_type, self.entity_id, first
            ))),
        }
    }
}

/// Tabelas que o vinculador sabe escrever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkedTable {
    QrCodes,
    Documents,
    SupplyChainEvents,
    DistributorInventory,
    SystemAlerts,
}

impl LinkedTable {
    pub fn table(&self) -> Table {
        match self {
            LinkedTable::QrCodes => Table::QrCodes,
            LinkedTable::Documents => Table::Documents,
            LinkedTable::SupplyChainEvents => Table::SupplyChainEvents,
            LinkedTable::DistributorInventory => Table::DistributorInventory,
            LinkedTable::SystemAlerts => Table::SystemAlerts,
        }
    }

    /// Documentos, eventos e estoque só apontam para lote ou produto.
    pub fn accepts(&self, kind: EntityKind) -> bool {
        match self {
            LinkedTable::QrCodes | LinkedTable::SystemAlerts => true,
            LinkedTable::Documents | LinkedTable::SupplyChainEvents => {
                kind != EntityKind::LabTest
            }
            LinkedTable::DistributorInventory => ProductType::from_kind(kind).is_some(),
        }
    }
}

// =========================================================================
//  EVENTOS DA CADEIA
// =========================================================================

/// Pelo menos um dos dois precisa estar presente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustodySubject {
    RawMaterialBatch { id: Uuid },
    FinishedGood { id: Uuid },
    #[serde(rename_all = "camelCase")]
    Both { raw_material_batch_id: Uuid, finished_good_id: Uuid },
}

impl CustodySubject {
    pub fn columns(&self) -> (Option<Uuid>, Option<Uuid>) {
        match *self {
            CustodySubject::RawMaterialBatch { id } => (Some(id), None),
            CustodySubject::FinishedGood { id } => (None, Some(id)),
            CustodySubject::Both { raw_material_batch_id, finished_good_id } => {
                (Some(raw_material_batch_id), Some(finished_good_id))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "supply_chain_event_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplyChainEventType {
    Collection,
    Processing,
    QualityTest,
    Transfer,
    Distribution,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SupplyChainEvent {
    pub id: Uuid,
    pub event_type: SupplyChainEventType,
    pub handler_id: Uuid,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub raw_material_batch_id: Option<Uuid>,
    pub finished_good_id: Option<Uuid>,
    pub notes: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSupplyChainEvent {
    pub event_type: SupplyChainEventType,
    pub handler_id: Uuid,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub subject: CustodySubject,
    pub notes: Option<String>,
    pub metadata: Option<Value>,
}

// =========================================================================
//  QR CODES E DOCUMENTOS
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    pub id: Uuid,
    pub code: String,
    pub entity_type: Option<EntityKind>,
    pub entity_id: Option<Uuid>,
    pub raw_material_batch_id: Option<Uuid>,
    pub finished_good_id: Option<Uuid>,
    pub lab_test_id: Option<Uuid>,
    pub label: Option<String>,

    // SVG gerado a partir de `code`
    pub svg_data: Option<String>,
    pub custom_data: Option<Value>,
    pub scan_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QrCode {
    pub fn columns(&self) -> PolymorphicColumns {
        PolymorphicColumns {
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            raw_material_batch_id: self.raw_material_batch_id,
            finished_good_id: self.finished_good_id,
            lab_test_id: self.lab_test_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewQrCode {
    pub code: String,
    pub label: Option<String>,
    pub svg_data: Option<String>,
    pub custom_data: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    HarvestCertificate,
    LabReport,
    ProcessingRecord,
    ShippingManifest,
    Invoice,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub document_type: DocumentType,
    pub file_url: String,
    pub uploaded_by: Uuid,

    // No máximo uma das duas
    pub raw_material_batch_id: Option<Uuid>,
    pub finished_good_id: Option<Uuid>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub document_type: DocumentType,
    pub file_url: String,
    pub uploaded_by: Uuid,
    pub metadata: Option<Value>,
}
