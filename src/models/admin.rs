// src/models/admin.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::organization::User;
use crate::models::traceability::{EntityKind, EntityRef};

// --- 1. Ações de Admin (log de auditoria) ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "admin_action_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminActionType {
    UserApproved,
    OrganizationVerified,
    CertificateRevoked,
    SystemConfigUpdated,
    DataSeeded,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminAction {
    pub id: Uuid,
    pub action_type: AdminActionType,
    pub admin_user_id: Uuid,
    pub description: String,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAdminAction {
    pub action_type: AdminActionType,
    pub admin_user_id: Uuid,
    pub description: String,
    pub metadata: Option<Value>,
}

impl NewAdminAction {
    /// Só um usuário com papel elevado assina a ação.
    pub fn by(
        admin: &User,
        action_type: AdminActionType,
        description: &str,
        metadata: Option<Value>,
    ) -> Result<Self, AppError> {
        if !admin.role.is_elevated() {
            return Err(AppError::validation(format!(
                "Usuário {} ({:?}) não pode registrar ações de admin",
                admin.email, admin.role
            )));
        }
        Ok(Self {
            action_type,
            admin_user_id: admin.id,
            description: description.to_string(),
            metadata,
        })
    }
}

// --- 2. Alertas do Sistema (chave natural: título + tipo) ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "alert_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    LowStock,
    QualityIssue,
    ExpiryWarning,
    ComplianceViolation,
    SystemError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "alert_severity", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SystemAlert {
    pub id: Uuid,
    pub title: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub entity_type: Option<EntityKind>,
    pub entity_id: Option<Uuid>,
    pub is_resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    pub title: String,
    pub alert_type: AlertType,
}

impl std::fmt::Display for AlertKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}/{}", self.alert_type, self.title)
    }
}

#[derive(Debug, Clone)]
pub struct NewSystemAlert {
    pub title: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub target: Option<EntityRef>,

    // isResolved é derivado daqui: resolvido se, e somente se, há data.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl NewSystemAlert {
    pub fn open(title: &str, alert_type: AlertType, severity: AlertSeverity, message: &str) -> Self {
        Self {
            title: title.to_string(),
            alert_type,
            severity,
            message: message.to_string(),
            target: None,
            resolved_at: None,
        }
    }

    pub fn about(mut self, target: EntityRef) -> Self {
        self.target = Some(target);
        self
    }

    pub fn resolved(mut self, at: DateTime<Utc>) -> Self {
        self.resolved_at = Some(at);
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    pub fn key(&self) -> AlertKey {
        AlertKey { title: self.title.clone(), alert_type: self.alert_type }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::organization::{OrgType, UserRole};

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "x@y.com".into(),
            name: "X".into(),
            password_hash: "h".into(),
            role,
            org_type: OrgType::Admin,
            organization_id: Uuid::new_v4(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_actions_require_elevated_role() {
        let farmer = user(UserRole::Farmer);
        assert!(NewAdminAction::by(&farmer, AdminActionType::DataSeeded, "seed", None).is_err());

        let admin = user(UserRole::Admin);
        let action = NewAdminAction::by(&admin, AdminActionType::DataSeeded, "seed", None).unwrap();
        assert_eq!(action.admin_user_id, admin.id);
    }

    #[test]
    fn resolution_flag_follows_date() {
        let alert = NewSystemAlert::open("Estoque baixo", AlertType::LowStock, AlertSeverity::Medium, "m");
        assert!(!alert.is_resolved());
        assert!(alert.resolved(Utc::now()).is_resolved());
    }
}
