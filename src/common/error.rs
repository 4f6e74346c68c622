use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    // Invariante entre entidades violada antes de qualquer escrita.
    // Nunca chega ao banco.
    #[error("Erro de validação: {0}")]
    Validation(String),

    #[error("Payload inválido")]
    InvalidPayload(#[from] validator::ValidationErrors),

    // O banco recusou a criação por causa de uma chave natural repetida
    // que a guarda não pegou (corrida ou guarda ignorada).
    #[error("Chave duplicada em {entity}: {key}")]
    DuplicateKey { entity: &'static str, key: String },

    // Uma etapa precisa de algo que um grupo anterior não registrou.
    #[error("Dependência ausente: {0}")]
    DependencyMissing(String),

    #[error("{entity} não encontrado: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn missing(what: impl Into<String>) -> Self {
        AppError::DependencyMissing(what.into())
    }
}

/// Traduz uma violação de unicidade do Postgres em `DuplicateKey`.
/// Qualquer outro erro segue como `DatabaseError`.
pub fn map_unique_violation(e: sqlx::Error, entity: &'static str, key: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::DuplicateKey { entity, key: key.to_string() };
        }
    }
    e.into()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidPayload(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::Validation(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::DuplicateKey { .. } => (StatusCode::CONFLICT, self.to_string()),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),

            // Todos os outros erros viram 500.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_message_names_entity_and_key() {
        let err = AppError::DuplicateKey { entity: "User", key: "a@b.com".into() };
        assert_eq!(err.to_string(), "Chave duplicada em User: a@b.com");
    }

    #[test]
    fn non_database_errors_pass_through_unique_mapping() {
        let err = map_unique_violation(sqlx::Error::RowNotFound, "User", "x");
        assert!(matches!(err, AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }
}
