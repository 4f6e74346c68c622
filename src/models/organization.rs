// src/models/organization.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// --- ENUMS ---

// Mapeia o CREATE TYPE org_type do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "org_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgType {
    Farmer,
    Manufacturer,
    Labs,
    Distributor,
    Admin,
}

impl OrgType {
    /// Os cinco participantes da cadeia, na ordem em que o seed os cria.
    pub const ALL: [OrgType; 5] = [
        OrgType::Farmer,
        OrgType::Manufacturer,
        OrgType::Labs,
        OrgType::Distributor,
        OrgType::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrgType::Farmer => "FARMER",
            OrgType::Manufacturer => "MANUFACTURER",
            OrgType::Labs => "LABS",
            OrgType::Distributor => "DISTRIBUTOR",
            OrgType::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for OrgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Farmer,
    Collector,
    Manufacturer,
    LabTechnician,
    Distributor,
}

impl UserRole {
    /// Só administradores podem assinar ações de auditoria.
    pub fn is_elevated(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

// ---
// 1. Organization (O participante da cadeia)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub org_type: OrgType,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrganization {
    #[validate(length(min = 2, message = "O nome da organização é obrigatório."))]
    pub name: String,
    pub org_type: OrgType,
    pub description: Option<String>,
    pub is_active: bool,
}

impl NewOrganization {
    /// Organização "padrão" de um tipo, usada como alvo singleton do seed.
    pub fn default_for(org_type: OrgType) -> Self {
        let name = match org_type {
            OrgType::Farmer => "Cooperativa de Produtores",
            OrgType::Manufacturer => "Indústria de Fitoterápicos",
            OrgType::Labs => "Laboratório de Controle de Qualidade",
            OrgType::Distributor => "Distribuidora Central",
            OrgType::Admin => "Administração da Plataforma",
        };
        Self {
            name: name.to_string(),
            org_type,
            description: Some(format!("Organização padrão do tipo {}", org_type)),
            is_active: true,
        }
    }
}

// ---
// 2. User (Pertence a uma Organization)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub role: UserRole,
    pub org_type: OrgType,
    pub organization_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 2, message = "O nome é obrigatório."))]
    pub name: String,
    pub password_hash: String,
    pub role: UserRole,
    pub org_type: OrgType,
    pub organization_id: Uuid,
}

impl NewUser {
    /// Monta o payload herdando o tipo da organização, para que
    /// `org_type` nunca divirja da organização referenciada.
    pub fn for_organization(
        organization: &Organization,
        email: &str,
        name: &str,
        role: UserRole,
        password_hash: String,
    ) -> Self {
        Self {
            email: email.to_lowercase(),
            name: name.to_string(),
            password_hash,
            role,
            org_type: organization.org_type,
            organization_id: organization.id,
        }
    }

    pub fn check_organization(&self, organization: &Organization) -> Result<(), AppError> {
        if organization.id != self.organization_id {
            return Err(AppError::validation(format!(
                "Usuário {} aponta para outra organização",
                self.email
            )));
        }
        if organization.org_type != self.org_type {
            return Err(AppError::validation(format!(
                "Usuário {} declara orgType {} mas a organização é {}",
                self.email, self.org_type, organization.org_type
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(org_type: OrgType) -> Organization {
        Organization {
            id: Uuid::new_v4(),
            name: "Org".into(),
            org_type,
            description: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn new_user_inherits_org_type() {
        let farmer = org(OrgType::Farmer);
        let user = NewUser::for_organization(&farmer, "Ana@Fazenda.com", "Ana", UserRole::Farmer, "h".into());
        assert_eq!(user.org_type, OrgType::Farmer);
        assert_eq!(user.email, "ana@fazenda.com");
        assert!(user.check_organization(&farmer).is_ok());
    }

    #[test]
    fn mismatched_org_type_is_rejected() {
        let farmer = org(OrgType::Farmer);
        let mut user = NewUser::for_organization(&farmer, "a@b.com", "A", UserRole::Farmer, "h".into());
        user.org_type = OrgType::Labs;
        assert!(matches!(user.check_organization(&farmer), Err(AppError::Validation(_))));
    }
}
