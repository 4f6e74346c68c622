// src/services/idempotency.rs

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::TraceStore,
    models::{
        admin::{AlertKey, NewSystemAlert, SystemAlert},
        botanical::{HerbSpecies, NewHerbSpecies},
        organization::{NewOrganization, NewUser, OrgType, Organization, User},
    },
};

/// Entidade com chave natural: pode ser procurada antes de ser criada.
#[async_trait]
pub trait NaturallyKeyed: Sized + Send + Sync {
    type Key: Display + Send + Sync;
    type Payload: Send + Sync;

    const ENTITY: &'static str;

    async fn find_by_key(store: &dyn TraceStore, key: &Self::Key) -> Result<Option<Self>, AppError>;

    /// Persiste o payload. A chave do payload precisa ser a mesma da busca.
    /// Um upsert que encontrou a linha já lá devolve `Existing`.
    async fn persist(store: &dyn TraceStore, payload: &Self::Payload) -> Result<Ensured<Self>, AppError>;

    fn key_of(payload: &Self::Payload) -> Self::Key;

    fn same_key(a: &Self::Key, b: &Self::Key) -> bool {
        a.to_string() == b.to_string()
    }
}

#[async_trait]
impl NaturallyKeyed for Organization {
    type Key = OrgType;
    type Payload = NewOrganization;

    const ENTITY: &'static str = "Organization";

    async fn find_by_key(store: &dyn TraceStore, key: &OrgType) -> Result<Option<Self>, AppError> {
        store.find_organization_by_type(*key).await
    }

    async fn persist(store: &dyn TraceStore, payload: &NewOrganization) -> Result<Ensured<Self>, AppError> {
        payload.validate()?;
        store.create_organization(payload).await.map(Ensured::Created)
    }

    fn key_of(payload: &NewOrganization) -> OrgType {
        payload.org_type
    }
}

#[async_trait]
impl NaturallyKeyed for User {
    type Key = String;
    type Payload = NewUser;

    const ENTITY: &'static str = "User";

    async fn find_by_key(store: &dyn TraceStore, key: &String) -> Result<Option<Self>, AppError> {
        store.find_user_by_email(&key.to_lowercase()).await
    }

    async fn persist(store: &dyn TraceStore, payload: &NewUser) -> Result<Ensured<Self>, AppError> {
        payload.validate()?;
        store.create_user(payload).await.map(Ensured::Created)
    }

    fn key_of(payload: &NewUser) -> String {
        payload.email.to_lowercase()
    }

    // E-mail não diferencia maiúsculas
    fn same_key(a: &String, b: &String) -> bool {
        a.eq_ignore_ascii_case(b)
    }
}

#[async_trait]
impl NaturallyKeyed for HerbSpecies {
    type Key = String;
    type Payload = NewHerbSpecies;

    const ENTITY: &'static str = "HerbSpecies";

    async fn find_by_key(store: &dyn TraceStore, key: &String) -> Result<Option<Self>, AppError> {
        store.find_herb_species(key).await
    }

    // Upsert atômico no banco: sem janela entre a busca e a criação.
    async fn persist(store: &dyn TraceStore, payload: &NewHerbSpecies) -> Result<Ensured<Self>, AppError> {
        payload.validate()?;
        match store.upsert_herb_species(payload).await? {
            (species, true) => Ok(Ensured::Created(species)),
            (species, false) => Ok(Ensured::Existing(species)),
        }
    }

    fn key_of(payload: &NewHerbSpecies) -> String {
        payload.scientific_name.clone()
    }
}

#[async_trait]
impl NaturallyKeyed for SystemAlert {
    type Key = AlertKey;
    type Payload = NewSystemAlert;

    const ENTITY: &'static str = "SystemAlert";

    async fn find_by_key(store: &dyn TraceStore, key: &AlertKey) -> Result<Option<Self>, AppError> {
        store.find_system_alert(key).await
    }

    async fn persist(store: &dyn TraceStore, payload: &NewSystemAlert) -> Result<Ensured<Self>, AppError> {
        store.create_system_alert(payload).await.map(Ensured::Created)
    }

    fn key_of(payload: &NewSystemAlert) -> AlertKey {
        payload.key()
    }
}

/// Resultado de um `ensure`: a linha, e se ela nasceu agora.
#[derive(Debug, Clone)]
pub enum Ensured<T> {
    Created(T),
    Existing(T),
}

impl<T> Ensured<T> {
    pub fn was_created(&self) -> bool {
        matches!(self, Ensured::Created(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Ensured::Created(row) | Ensured::Existing(row) => row,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Ensured::Created(row) | Ensured::Existing(row) => row,
        }
    }
}

/// Envolve cada criação numa checagem por chave natural.
///
/// Se a linha já existe, volta intacta e o construtor nem é chamado
/// (o hash de senha, por exemplo, só roda quando precisa). Se não existe,
/// o construtor monta o payload e a linha é persistida. Uma violação de
/// unicidade que escape da checagem (corrida entre processos) sobe como
/// `DuplicateKey`, sem nova tentativa.
#[derive(Clone)]
pub struct IdempotencyGuard {
    store: Arc<dyn TraceStore>,
}

impl IdempotencyGuard {
    pub fn new(store: Arc<dyn TraceStore>) -> Self {
        Self { store }
    }

    pub async fn ensure<T, F, Fut>(&self, key: &T::Key, constructor: F) -> Result<Ensured<T>, AppError>
    where
        T: NaturallyKeyed,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T::Payload, AppError>>,
    {
        if let Some(existing) = T::find_by_key(self.store.as_ref(), key).await? {
            debug!("{} '{}' já existe, reaproveitando", T::ENTITY, key);
            return Ok(Ensured::Existing(existing));
        }

        let payload = constructor().await?;
        let built_key = T::key_of(&payload);
        if !T::same_key(&built_key, key) {
            return Err(AppError::validation(format!(
                "{}: construtor montou a chave '{}' mas a busca foi por '{}'",
                T::ENTITY, built_key, key
            )));
        }

        T::persist(self.store.as_ref(), &payload).await
    }
}
