// src/services/registry.rs

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        admin::{AdminAction, SystemAlert},
        botanical::{CollectionEvent, HerbSpecies},
        distribution::{DistributorInventory, DistributorShipment, ShipmentItem},
        organization::{OrgType, Organization, User, UserRole},
        production::{FinishedGood, FinishedGoodComposition, RawMaterialBatch},
        quality::{Certificate, LabTest},
        table::Table,
        traceability::{Document, QrCode, SupplyChainEvent},
    },
};

/// Chave lógica estável: rótulo da tabela + posição ou nome.
/// Ex: `organization:FARMER`, `rawMaterialBatch:0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    table: Table,
    slot: String,
}

impl RegistryKey {
    pub fn named(table: Table, name: impl fmt::Display) -> Self {
        Self { table, slot: name.to_string() }
    }

    pub fn indexed(table: Table, index: usize) -> Self {
        Self { table, slot: index.to_string() }
    }

    pub fn organization(org_type: OrgType) -> Self {
        Self::named(Table::Organizations, org_type)
    }

    pub fn user(email: &str) -> Self {
        Self::named(Table::Users, email.to_lowercase())
    }

    fn index(&self) -> Option<usize> {
        self.slot.parse().ok()
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table.label(), self.slot)
    }
}

/// Foto da linha persistida, guardada pelo tempo de uma execução.
#[derive(Debug, Clone)]
pub enum Snapshot {
    Organization(Organization),
    User(User),
    HerbSpecies(HerbSpecies),
    CollectionEvent(CollectionEvent),
    RawMaterialBatch(RawMaterialBatch),
    FinishedGood(FinishedGood),
    FinishedGoodComposition(FinishedGoodComposition),
    LabTest(LabTest),
    Certificate(Certificate),
    SupplyChainEvent(SupplyChainEvent),
    QrCode(QrCode),
    Document(Document),
    DistributorInventory(DistributorInventory),
    DistributorShipment(DistributorShipment),
    ShipmentItem(ShipmentItem),
    AdminAction(AdminAction),
    SystemAlert(SystemAlert),
}

/// Linhas que podem entrar no registro.
pub trait Registrable: Clone + Send + Sync + 'static {
    const TABLE: Table;

    fn into_snapshot(self) -> Snapshot;
    fn from_snapshot(snapshot: &Snapshot) -> Option<&Self>;
}

macro_rules! registrable {
    ($($row:ident => $table:ident),* $(,)?) => {
        $(
            impl Registrable for $row {
                const TABLE: Table = Table::$table;

                fn into_snapshot(self) -> Snapshot {
                    Snapshot::$row(self)
                }

                fn from_snapshot(snapshot: &Snapshot) -> Option<&Self> {
                    match snapshot {
                        Snapshot::$row(row) => Some(row),
                        _ => None,
                    }
                }
            }
        )*
    };
}

registrable!(
    Organization => Organizations,
    User => Users,
    HerbSpecies => HerbSpecies,
    CollectionEvent => CollectionEvents,
    RawMaterialBatch => RawMaterialBatches,
    FinishedGood => FinishedGoods,
    FinishedGoodComposition => FinishedGoodCompositions,
    LabTest => LabTests,
    Certificate => Certificates,
    SupplyChainEvent => SupplyChainEvents,
    QrCode => QrCodes,
    Document => Documents,
    DistributorInventory => DistributorInventory,
    DistributorShipment => DistributorShipments,
    ShipmentItem => ShipmentItems,
    AdminAction => AdminActions,
    SystemAlert => SystemAlerts,
);

/// Mapa da execução corrente: chave lógica -> linha persistida.
///
/// Cada grupo do seed registra o que criou (ou reaproveitou) antes do
/// próximo começar. Procurar uma chave que não existe é erro de ordem
/// e aborta a execução com `DependencyMissing`.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entries: HashMap<RegistryKey, Snapshot>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra (ou substitui) a foto de uma linha.
    pub fn insert<T: Registrable>(&mut self, key: RegistryKey, row: T) {
        debug_assert_eq!(key.table, T::TABLE);
        self.entries.insert(key, row.into_snapshot());
    }

    /// Registra na próxima posição livre da tabela e devolve a chave usada.
    pub fn push<T: Registrable>(&mut self, row: T) -> RegistryKey {
        let key = RegistryKey::indexed(T::TABLE, self.indexed::<T>().len());
        self.insert(key.clone(), row);
        key
    }

    pub fn get<T: Registrable>(&self, key: &RegistryKey) -> Result<&T, AppError> {
        self.entries
            .get(key)
            .and_then(T::from_snapshot)
            .ok_or_else(|| AppError::missing(format!("registro não contém '{}'", key)))
    }

    pub fn id(&self, key: &RegistryKey) -> Result<Uuid, AppError> {
        match self.entries.get(key) {
            Some(snapshot) => Ok(snapshot_id(snapshot)),
            None => Err(AppError::missing(format!("registro não contém '{}'", key))),
        }
    }

    /// Entradas posicionais de uma tabela, em ordem de posição.
    pub fn indexed<T: Registrable>(&self) -> Vec<&T> {
        let mut rows: Vec<(usize, &T)> = self
            .entries
            .iter()
            .filter(|(key, _)| key.table == T::TABLE)
            .filter_map(|(key, snapshot)| Some((key.index()?, T::from_snapshot(snapshot)?)))
            .collect();
        rows.sort_by_key(|(index, _)| *index);
        rows.into_iter().map(|(_, row)| row).collect()
    }

    /// Como `indexed`, mas falha se a tabela não tiver nenhuma entrada.
    pub fn require_indexed<T: Registrable>(&self) -> Result<Vec<&T>, AppError> {
        let rows = self.indexed::<T>();
        if rows.is_empty() {
            return Err(AppError::missing(format!(
                "nenhum '{}' registrado por um grupo anterior",
                T::TABLE.label()
            )));
        }
        Ok(rows)
    }

    pub fn organization(&self, org_type: OrgType) -> Result<&Organization, AppError> {
        self.get(&RegistryKey::organization(org_type))
    }

    /// Primeiro usuário registrado com o papel pedido.
    pub fn user_with_role(&self, role: UserRole) -> Result<&User, AppError> {
        let mut users: Vec<&User> = self
            .entries
            .values()
            .filter_map(User::from_snapshot)
            .filter(|user| user.role == role)
            .collect();
        users.sort_by_key(|user| (user.created_at, user.id));
        users
            .into_iter()
            .next()
            .ok_or_else(|| AppError::missing(format!("nenhum usuário com papel {:?}", role)))
    }
}

fn snapshot_id(snapshot: &Snapshot) -> Uuid {
    match snapshot {
        Snapshot::Organization(row) => row.id,
        Snapshot::User(row) => row.id,
        Snapshot::HerbSpecies(row) => row.id,
        Snapshot::CollectionEvent(row) => row.id,
        Snapshot::RawMaterialBatch(row) => row.id,
        Snapshot::FinishedGood(row) => row.id,
        Snapshot::FinishedGoodComposition(row) => row.id,
        Snapshot::LabTest(row) => row.id,
        Snapshot::Certificate(row) => row.id,
        Snapshot::SupplyChainEvent(row) => row.id,
        Snapshot::QrCode(row) => row.id,
        Snapshot::Document(row) => row.id,
        Snapshot::DistributorInventory(row) => row.id,
        Snapshot::DistributorShipment(row) => row.id,
        Snapshot::ShipmentItem(row) => row.id,
        Snapshot::AdminAction(row) => row.id,
        Snapshot::SystemAlert(row) => row.id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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
    fn keys_render_as_label_and_slot() {
        assert_eq!(RegistryKey::organization(OrgType::Farmer).to_string(), "organization:FARMER");
        assert_eq!(
            RegistryKey::indexed(Table::RawMaterialBatches, 0).to_string(),
            "rawMaterialBatch:0"
        );
    }

    #[test]
    fn unknown_key_is_dependency_missing() {
        let registry = EntityRegistry::new();
        let err = registry.organization(OrgType::Labs).unwrap_err();
        assert!(matches!(err, AppError::DependencyMissing(_)));
        assert!(err.to_string().contains("organization:LABS"));
    }

    #[test]
    fn typed_lookup_rejects_other_tables() {
        let mut registry = EntityRegistry::new();
        let farmer = org(OrgType::Farmer);
        registry.insert(RegistryKey::organization(OrgType::Farmer), farmer.clone());

        assert_eq!(registry.organization(OrgType::Farmer).unwrap().id, farmer.id);
        assert_eq!(registry.id(&RegistryKey::organization(OrgType::Farmer)).unwrap(), farmer.id);
        assert!(registry.get::<User>(&RegistryKey::organization(OrgType::Farmer)).is_err());
    }

    #[test]
    fn push_assigns_consecutive_positions() {
        let mut registry = EntityRegistry::new();
        let first = registry.push(org(OrgType::Farmer));
        let second = registry.push(org(OrgType::Labs));
        assert_eq!(first.to_string(), "organization:0");
        assert_eq!(second.to_string(), "organization:1");

        let rows = registry.indexed::<Organization>();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].org_type, OrgType::Labs);
        assert!(registry.require_indexed::<RawMaterialBatch>().is_err());
    }
}
