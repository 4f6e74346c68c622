// src/models/table.rs

use serde::Serialize;

/// Lista fechada das tabelas do grafo de rastreabilidade.
/// A ordem das variantes é a ordem de dependência das chaves estrangeiras
/// (pais antes de filhos). `collection_events.batch_id` aponta para o lote,
/// por isso os lotes vêm antes dos eventos de coleta aqui, mesmo que o seed
/// crie os eventos primeiro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Table {
    Organizations,
    Users,
    HerbSpecies,
    RawMaterialBatches,
    CollectionEvents,
    FinishedGoods,
    FinishedGoodCompositions,
    LabTests,
    Certificates,
    SupplyChainEvents,
    QrCodes,
    Documents,
    DistributorInventory,
    DistributorShipments,
    ShipmentItems,
    AdminActions,
    SystemAlerts,
}

impl Table {
    pub const DEPENDENCY_ORDER: [Table; 17] = [
        Table::Organizations,
        Table::Users,
        Table::HerbSpecies,
        Table::RawMaterialBatches,
        Table::CollectionEvents,
        Table::FinishedGoods,
        Table::FinishedGoodCompositions,
        Table::LabTests,
        Table::Certificates,
        Table::SupplyChainEvents,
        Table::QrCodes,
        Table::Documents,
        Table::DistributorInventory,
        Table::DistributorShipments,
        Table::ShipmentItems,
        Table::AdminActions,
        Table::SystemAlerts,
    ];

    /// Ordem usada pelo reset completo: filhos antes dos pais.
    pub fn reverse_dependency_order() -> impl Iterator<Item = Table> {
        Self::DEPENDENCY_ORDER.into_iter().rev()
    }

    /// Nome físico da tabela no Postgres.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Organizations => "organizations",
            Table::Users => "users",
            Table::HerbSpecies => "herb_species",
            Table::CollectionEvents => "collection_events",
            Table::RawMaterialBatches => "raw_material_batches",
            Table::FinishedGoods => "finished_goods",
            Table::FinishedGoodCompositions => "finished_good_compositions",
            Table::LabTests => "lab_tests",
            Table::Certificates => "certificates",
            Table::SupplyChainEvents => "supply_chain_events",
            Table::QrCodes => "qr_codes",
            Table::Documents => "documents",
            Table::DistributorInventory => "distributor_inventory",
            Table::DistributorShipments => "distributor_shipments",
            Table::ShipmentItems => "shipment_items",
            Table::AdminActions => "admin_actions",
            Table::SystemAlerts => "system_alerts",
        }
    }

    /// Rótulo lógico usado nas chaves do registro (ex: "rawMaterialBatch:0").
    pub fn label(&self) -> &'static str {
        match self {
            Table::Organizations => "organization",
            Table::Users => "user",
            Table::HerbSpecies => "herbSpecies",
            Table::CollectionEvents => "collectionEvent",
            Table::RawMaterialBatches => "rawMaterialBatch",
            Table::FinishedGoods => "finishedGood",
            Table::FinishedGoodCompositions => "finishedGoodComposition",
            Table::LabTests => "labTest",
            Table::Certificates => "certificate",
            Table::SupplyChainEvents => "supplyChainEvent",
            Table::QrCodes => "qrCode",
            Table::Documents => "document",
            Table::DistributorInventory => "distributorInventory",
            Table::DistributorShipments => "distributorShipment",
            Table::ShipmentItems => "shipmentItem",
            Table::AdminActions => "adminAction",
            Table::SystemAlerts => "systemAlert",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_order_deletes_children_first() {
        let order: Vec<Table> = Table::reverse_dependency_order().collect();
        assert_eq!(order.first(), Some(&Table::SystemAlerts));
        assert_eq!(order.last(), Some(&Table::Organizations));
        let pos = |t| order.iter().position(|x| *x == t).unwrap();
        assert!(pos(Table::ShipmentItems) < pos(Table::DistributorShipments));
        assert!(pos(Table::Certificates) < pos(Table::LabTests));
        assert!(pos(Table::FinishedGoodCompositions) < pos(Table::RawMaterialBatches));
        assert!(pos(Table::CollectionEvents) < pos(Table::RawMaterialBatches));
    }
}
