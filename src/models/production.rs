// src/models/production.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "batch_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Created,
    InProcessing,
    Processed,
}

impl BatchStatus {
    /// O status só anda para frente: CREATED -> IN_PROCESSING -> PROCESSED.
    /// Pular etapa é permitido, voltar ou repetir não.
    pub fn can_transition_to(self, next: BatchStatus) -> bool {
        next > self
    }

    pub fn transition_to(self, next: BatchStatus) -> Result<BatchStatus, AppError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::validation(format!(
                "Transição de status inválida: {:?} -> {:?}",
                self, next
            )))
        }
    }
}

// --- 1. Lote de Matéria-Prima ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RawMaterialBatch {
    pub id: Uuid,
    pub herb_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub status: BatchStatus,
    pub current_owner_id: Uuid,
    pub supplier_info: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRawMaterialBatch {
    pub herb_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub current_owner_id: Uuid,
    pub supplier_info: Option<Value>,
}

// --- 2. Produto Acabado ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FinishedGood {
    pub id: Uuid,
    pub product_name: String,
    pub product_type: String,
    pub manufacturer_id: Uuid,

    // Único por fabricante
    pub batch_number: String,
    pub quantity: Decimal,
    pub unit: String,
    pub manufacture_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFinishedGood {
    pub product_name: String,
    pub product_type: String,
    pub manufacturer_id: Uuid,
    pub batch_number: String,
    pub quantity: Decimal,
    pub unit: String,
    pub manufacture_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
}

// --- 3. Composição (Ponte Produto-Lote) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FinishedGoodComposition {
    pub id: Uuid,
    pub finished_good_id: Uuid,
    pub raw_material_batch_id: Uuid,
    pub percentage: Decimal,
    pub quantity_used: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComposition {
    pub finished_good_id: Uuid,
    pub raw_material_batch_id: Uuid,
    pub percentage: Decimal,
    pub quantity_used: Decimal,
}

impl NewComposition {
    /// A soma das porcentagens de um produto nunca passa de 100.
    pub fn check_against(&self, existing: &[FinishedGoodComposition]) -> Result<(), AppError> {
        if self.percentage <= Decimal::ZERO || self.percentage > Decimal::ONE_HUNDRED {
            return Err(AppError::validation(format!(
                "Porcentagem fora do intervalo (0, 100]: {}",
                self.percentage
            )));
        }

        let current: Decimal = existing
            .iter()
            .filter(|c| c.finished_good_id == self.finished_good_id)
            .map(|c| c.percentage)
            .sum();

        if current + self.percentage > Decimal::ONE_HUNDRED {
            return Err(AppError::validation(format!(
                "Composição do produto {} passaria de 100% ({} + {})",
                self.finished_good_id, current, self.percentage
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing(good: Uuid, pct: i64) -> FinishedGoodComposition {
        FinishedGoodComposition {
            id: Uuid::new_v4(),
            finished_good_id: good,
            raw_material_batch_id: Uuid::new_v4(),
            percentage: Decimal::from(pct),
            quantity_used: Decimal::ONE,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_moves_forward_only() {
        assert!(BatchStatus::Created.can_transition_to(BatchStatus::InProcessing));
        assert!(BatchStatus::Created.can_transition_to(BatchStatus::Processed));
        assert!(!BatchStatus::Processed.can_transition_to(BatchStatus::InProcessing));
        assert!(!BatchStatus::InProcessing.can_transition_to(BatchStatus::InProcessing));
        assert!(BatchStatus::Processed.transition_to(BatchStatus::Created).is_err());
    }

    #[test]
    fn composition_total_is_bounded() {
        let good = Uuid::new_v4();
        let rows = vec![existing(good, 60), existing(Uuid::new_v4(), 90)];

        let ok = NewComposition {
            finished_good_id: good,
            raw_material_batch_id: Uuid::new_v4(),
            percentage: Decimal::from(40),
            quantity_used: Decimal::ONE,
        };
        assert!(ok.check_against(&rows).is_ok());

        let too_much = NewComposition { percentage: Decimal::from(41), ..ok };
        assert!(matches!(too_much.check_against(&rows), Err(AppError::Validation(_))));
    }
}
