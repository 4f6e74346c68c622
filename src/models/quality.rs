// src/models/quality.rs

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lab_test_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LabTestStatus {
    Pending,
    InProgress,
    Completed,
}

/// O que está sendo testado. Um teste nunca aponta para lote e produto
/// ao mesmo tempo; uma amostra pendente ainda não aponta para nada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LabTestSubject {
    RawMaterialBatch(Uuid),
    FinishedGood(Uuid),
    PendingSample,
}

impl LabTestSubject {
    /// (batch_id, finished_good_id) como gravados no banco.
    pub fn columns(&self) -> (Option<Uuid>, Option<Uuid>) {
        match *self {
            LabTestSubject::RawMaterialBatch(id) => (Some(id), None),
            LabTestSubject::FinishedGood(id) => (None, Some(id)),
            LabTestSubject::PendingSample => (None, None),
        }
    }
}

/// Resultados de laboratório. O formato é previsível por tipo de ensaio,
/// então fica tipado em vez de JSON solto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LabResults {
    #[serde(rename_all = "camelCase")]
    Purity {
        purity_percent: Decimal,
        contaminants: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Microbial {
        total_plate_count: u64,
        pathogens_detected: bool,
    },
    #[serde(rename_all = "camelCase")]
    HeavyMetals {
        lead_ppm: Decimal,
        cadmium_ppm: Decimal,
        within_limits: bool,
    },
}

// --- 1. Teste de Laboratório ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LabTest {
    pub id: Uuid,
    pub test_type: String,
    pub status: LabTestStatus,
    pub requester_id: Uuid,
    pub lab_technician_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub finished_good_id: Option<Uuid>,
    pub results: Option<Json<LabResults>>,
    pub notes: Option<String>,
    pub completion_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LabTest {
    pub fn subject(&self) -> Result<LabTestSubject, AppError> {
        match (self.batch_id, self.finished_good_id) {
            (Some(id), None) => Ok(LabTestSubject::RawMaterialBatch(id)),
            (None, Some(id)) => Ok(LabTestSubject::FinishedGood(id)),
            (None, None) => Ok(LabTestSubject::PendingSample),
            (Some(_), Some(_)) => Err(AppError::validation(format!(
                "Teste {} aponta para lote e produto ao mesmo tempo",
                self.id
            ))),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == LabTestStatus::Completed
    }
}

#[derive(Debug, Clone)]
pub struct NewLabTest {
    pub test_type: String,
    pub subject: LabTestSubject,
    pub status: LabTestStatus,
    pub requester_id: Uuid,
    pub lab_technician_id: Option<Uuid>,
    pub results: Option<LabResults>,
    pub notes: Option<String>,
    pub completion_date: Option<DateTime<Utc>>,
}

impl NewLabTest {
    pub fn pending(test_type: &str, subject: LabTestSubject, requester_id: Uuid) -> Self {
        Self {
            test_type: test_type.to_string(),
            subject,
            status: LabTestStatus::Pending,
            requester_id,
            lab_technician_id: None,
            results: None,
            notes: None,
            completion_date: None,
        }
    }

    pub fn in_progress(mut self, technician_id: Uuid) -> Self {
        self.status = LabTestStatus::InProgress;
        self.lab_technician_id = Some(technician_id);
        self
    }

    /// Concluir sempre grava status e data juntos.
    pub fn completed(mut self, technician_id: Uuid, at: DateTime<Utc>, results: LabResults) -> Self {
        self.status = LabTestStatus::Completed;
        self.lab_technician_id = Some(technician_id);
        self.completion_date = Some(at);
        self.results = Some(results);
        self
    }

    /// completionDate existe se, e somente se, o status é COMPLETED.
    pub fn check(&self) -> Result<(), AppError> {
        let completed = self.status == LabTestStatus::Completed;
        if completed != self.completion_date.is_some() {
            return Err(AppError::validation(format!(
                "Teste '{}' com status {:?} e completionDate {:?}",
                self.test_type, self.status, self.completion_date
            )));
        }
        Ok(())
    }
}

// --- 2. Certificado ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    pub certificate_number: String,
    pub test_id: Uuid,
    pub issuer_id: Uuid,
    pub organization_id: Uuid,
    pub is_valid: bool,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub certificate_number: String,
    pub test_id: Uuid,
    pub issuer_id: Uuid,
    pub organization_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewCertificate {
    /// Só um teste COMPLETED pode gerar certificado.
    pub fn issue_for(
        test: &LabTest,
        certificate_number: String,
        issuer_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Self, AppError> {
        if !test.is_completed() {
            return Err(AppError::validation(format!(
                "Não é possível certificar o teste {} com status {:?}",
                test.id, test.status
            )));
        }
        let issued_at = test.completion_date.unwrap_or_else(Utc::now);
        Ok(Self {
            certificate_number,
            test_id: test.id,
            issuer_id,
            organization_id,
            issued_at,
            expires_at: Some(issued_at + Duration::days(365)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: LabTestStatus) -> LabTest {
        LabTest {
            id: Uuid::new_v4(),
            test_type: "Pureza".into(),
            status,
            requester_id: Uuid::new_v4(),
            lab_technician_id: None,
            batch_id: Some(Uuid::new_v4()),
            finished_good_id: None,
            results: None,
            notes: None,
            completion_date: (status == LabTestStatus::Completed).then(Utc::now),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn certificate_requires_completed_test() {
        let pending = row(LabTestStatus::InProgress);
        let err = NewCertificate::issue_for(&pending, "C-1".into(), Uuid::new_v4(), Uuid::new_v4());
        assert!(matches!(err, Err(AppError::Validation(_))));

        let done = row(LabTestStatus::Completed);
        let cert = NewCertificate::issue_for(&done, "C-2".into(), Uuid::new_v4(), Uuid::new_v4()).unwrap();
        assert_eq!(cert.test_id, done.id);
    }

    #[test]
    fn completion_date_follows_status() {
        let requester = Uuid::new_v4();
        let pending = NewLabTest::pending("Pureza", LabTestSubject::PendingSample, requester);
        assert!(pending.check().is_ok());

        let mut broken = pending.clone();
        broken.completion_date = Some(Utc::now());
        assert!(broken.check().is_err());

        let results = LabResults::Microbial { total_plate_count: 120, pathogens_detected: false };
        let done = pending.completed(Uuid::new_v4(), Utc::now(), results);
        assert!(done.check().is_ok());
    }

    #[test]
    fn both_subjects_is_reported() {
        let mut test = row(LabTestStatus::Pending);
        test.finished_good_id = Some(Uuid::new_v4());
        assert!(test.subject().is_err());
    }
}
