// src/models/distribution.rs

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::traceability::{EntityKind, EntityRef};

// Mapeia o CREATE TYPE product_type do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    RawMaterial,
    FinishedGood,
}

impl ProductType {
    pub fn from_kind(kind: EntityKind) -> Option<Self> {
        match kind {
            EntityKind::RawMaterialBatch => Some(ProductType::RawMaterial),
            EntityKind::FinishedGood => Some(ProductType::FinishedGood),
            EntityKind::LabTest => None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            ProductType::RawMaterial => EntityKind::RawMaterialBatch,
            ProductType::FinishedGood => EntityKind::FinishedGood,
        }
    }

    pub fn entity_ref(&self, entity_id: Uuid) -> EntityRef {
        EntityRef::new(self.kind(), entity_id)
    }
}

// --- 1. Estoque do Distribuidor (ponteiro por productType + entityId) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DistributorInventory {
    pub id: Uuid,
    pub distributor_id: Uuid,
    pub product_type: ProductType,
    pub entity_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub warehouse_location: Option<String>,
    pub supplier_info: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DistributorInventory {
    pub fn target(&self) -> EntityRef {
        self.product_type.entity_ref(self.entity_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub distributor_id: Uuid,
    pub product_type: ProductType,
    pub entity_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub warehouse_location: Option<String>,
    pub supplier_info: Option<Value>,
}

// --- 2. Remessas ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "shipment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Preparing,
    InTransit,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DistributorShipment {
    pub id: Uuid,
    pub distributor_id: Uuid,

    // Único globalmente
    pub shipment_number: String,
    pub status: ShipmentStatus,
    pub destination: String,
    pub shipped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewShipment {
    pub distributor_id: Uuid,
    pub shipment_number: String,
    pub status: ShipmentStatus,
    pub destination: String,
    pub shipped_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentItem {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub product_type: ProductType,
    pub entity_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewShipmentItem {
    pub shipment_id: Uuid,
    pub product_type: ProductType,
    pub entity_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Total de uma linha de remessa: quantidade × preço unitário, em centavos.
/// Arredonda meio centavo para longe do zero, como a coluna NUMERIC(16, 2).
pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Decimal {
    (quantity * unit_price).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl NewShipmentItem {
    /// O total é sempre calculado aqui, via `line_total`.
    pub fn new(
        shipment_id: Uuid,
        product_type: ProductType,
        entity_id: Uuid,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        Self {
            shipment_id,
            product_type,
            entity_id,
            quantity,
            unit_price,
            total_price: line_total(quantity, unit_price),
        }
    }
}
