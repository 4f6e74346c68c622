// src/services/auth.rs

use bcrypt::{hash, verify};

use crate::common::error::AppError;

/// Hash de senha dos usuários semeados. O bcrypt é pesado para o runtime
/// async, então roda sempre em `spawn_blocking`.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    pub async fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AppError> {
        let password_clone = password.to_owned();
        let hash_clone = password_hash.to_owned();
        let matches = tokio::task::spawn_blocking(move || verify(&password_clone, &hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação: {}", e))??;
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_verifies_against_original_password() {
        let hasher = PasswordHasher::new(4);
        let hashed = hasher.hash("senha-demo").await.unwrap();
        assert_ne!(hashed, "senha-demo");
        assert!(hasher.verify("senha-demo", &hashed).await.unwrap());
        assert!(!hasher.verify("outra", &hashed).await.unwrap());
    }
}
