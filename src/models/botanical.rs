// src/models/botanical.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

// --- 1. Espécie de Erva (chave natural: nome científico) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HerbSpecies {
    pub id: Uuid,
    pub common_name: String,
    pub scientific_name: String,
    pub family: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewHerbSpecies {
    #[validate(length(min = 2, message = "O nome popular é obrigatório."))]
    pub common_name: String,
    #[validate(length(min = 3, message = "O nome científico é obrigatório."))]
    pub scientific_name: String,
    pub family: Option<String>,
    pub description: Option<String>,
}

// --- 2. Evento de Coleta (campo -> lote) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEvent {
    pub id: Uuid,
    pub collector_id: Uuid,
    pub farmer_id: Uuid,
    pub herb_species_id: Uuid,
    pub quantity: Decimal,
    pub unit: String,
    pub location: Option<String>,
    pub harvest_date: DateTime<Utc>,

    // Preenchido só pela passada de vinculação. Quando existe,
    // precisa apontar para um RawMaterialBatch existente.
    pub batch_id: Option<Uuid>,

    // Blob opaco: gravado exatamente como veio.
    pub custom_data: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCollectionEvent {
    pub collector_id: Uuid,
    pub farmer_id: Uuid,
    pub herb_species_id: Uuid,
    pub quantity: Decimal,
    pub unit: String,
    pub location: Option<String>,
    pub harvest_date: DateTime<Utc>,
    pub custom_data: Option<Value>,
}
