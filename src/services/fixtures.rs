// src/services/fixtures.rs

use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::models::{
    admin::{AdminActionType, AlertSeverity, AlertType},
    botanical::NewHerbSpecies,
    distribution::ShipmentStatus,
    organization::{OrgType, UserRole},
    production::BatchStatus,
    quality::LabResults,
    traceability::{DocumentType, SupplyChainEventType},
};

// =========================================================================
//  POLÍTICA DE VINCULAÇÃO
// =========================================================================

/// Alvo lógico de um vínculo, resolvido contra o registro da execução.
/// Uma posição que não existe resolve para "sem alvo" e o vínculo é pulado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSlot {
    RawMaterialBatch(usize),
    FinishedGood(usize),
    /// Enésimo teste já concluído, na ordem de criação.
    CompletedLabTest(usize),
    /// Enésimo teste, qualquer status.
    LabTest(usize),
}

/// Para cada tabela polimórfica, a lista de alvos. A linha `i` (em ordem
/// de criação) recebe o alvo `i`; linhas além do tamanho da lista ficam
/// sem vínculo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkingPolicy {
    pub qr_codes: Vec<TargetSlot>,
    pub documents: Vec<TargetSlot>,
    /// Re-vínculo opcional dos eventos da cadeia depois de criados.
    pub supply_chain_events: Vec<TargetSlot>,
}

impl Default for LinkingPolicy {
    fn default() -> Self {
        Self {
            qr_codes: vec![
                TargetSlot::RawMaterialBatch(0),
                TargetSlot::FinishedGood(0),
                TargetSlot::CompletedLabTest(0),
            ],
            documents: vec![
                TargetSlot::RawMaterialBatch(0),
                TargetSlot::RawMaterialBatch(1),
                TargetSlot::FinishedGood(0),
                TargetSlot::FinishedGood(1),
            ],
            supply_chain_events: Vec::new(),
        }
    }
}

// =========================================================================
//  FIXTURES
// =========================================================================

#[derive(Debug, Clone)]
pub struct UserFixture {
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub org_type: OrgType,
}

#[derive(Debug, Clone)]
pub struct CollectionFixture {
    // Posição da espécie em `SeedFixtures::species`
    pub species: usize,
    pub quantity: Decimal,
    pub unit: String,
    pub location: String,
    pub custom_data: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct BatchFixture {
    pub herb_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub supplier_info: Option<Value>,
    pub final_status: BatchStatus,
}

#[derive(Debug, Clone)]
pub struct CompositionFixture {
    pub batch: usize,
    pub percentage: Decimal,
    pub quantity_used: Decimal,
}

#[derive(Debug, Clone)]
pub struct GoodFixture {
    pub product_name: String,
    pub product_type: String,
    pub quantity: Decimal,
    pub unit: String,
    pub shelf_life_days: i64,
    pub composition: Vec<CompositionFixture>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestSubjectSlot {
    RawMaterialBatch(usize),
    FinishedGood(usize),
    PendingSample,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    Pending,
    InProgress,
    Completed(LabResults),
}

#[derive(Debug, Clone)]
pub struct LabTestFixture {
    pub test_type: String,
    pub subject: TestSubjectSlot,
    pub outcome: TestOutcome,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EventFixture {
    pub event_type: SupplyChainEventType,
    pub subject: TargetSlot,
    pub from: Option<OrgType>,
    pub to: Option<OrgType>,
    pub handler: UserRole,
    pub notes: String,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct QrFixture {
    pub label: String,
    pub custom_data: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct DocumentFixture {
    pub title: String,
    pub document_type: DocumentType,
    pub file_url: String,
    pub uploaded_by: UserRole,
}

#[derive(Debug, Clone)]
pub struct InventoryFixture {
    pub target: TargetSlot,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub warehouse_location: String,
}

#[derive(Debug, Clone)]
pub struct ShipmentLineFixture {
    // Posição do item de estoque criado nesta execução
    pub inventory: usize,
    pub quantity: Decimal,
}

#[derive(Debug, Clone)]
pub struct ShipmentFixture {
    pub destination: String,
    pub status: ShipmentStatus,
    pub lines: Vec<ShipmentLineFixture>,
}

#[derive(Debug, Clone)]
pub struct AdminActionFixture {
    pub action_type: AdminActionType,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct AlertFixture {
    pub title: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub target: Option<TargetSlot>,
    pub resolved: bool,
}

/// Tudo o que uma execução do seed cria, em dados.
#[derive(Debug, Clone)]
pub struct SeedFixtures {
    pub organizations: Vec<OrgType>,
    pub users: Vec<UserFixture>,
    pub species: Vec<NewHerbSpecies>,
    pub collections: Vec<CollectionFixture>,
    pub batches: Vec<BatchFixture>,
    pub goods: Vec<GoodFixture>,
    pub lab_tests: Vec<LabTestFixture>,
    pub events: Vec<EventFixture>,
    pub qr_codes: Vec<QrFixture>,
    pub documents: Vec<DocumentFixture>,
    pub inventory: Vec<InventoryFixture>,
    pub shipments: Vec<ShipmentFixture>,
    pub admin_actions: Vec<AdminActionFixture>,
    pub alerts: Vec<AlertFixture>,
    pub linking: LinkingPolicy,
}

fn user(email: &str, name: &str, role: UserRole, org_type: OrgType) -> UserFixture {
    UserFixture { email: email.to_string(), name: name.to_string(), role, org_type }
}

fn species(common: &str, scientific: &str, family: &str, description: &str) -> NewHerbSpecies {
    NewHerbSpecies {
        common_name: common.to_string(),
        scientific_name: scientific.to_string(),
        family: Some(family.to_string()),
        description: Some(description.to_string()),
    }
}

impl Default for SeedFixtures {
    fn default() -> Self {
        Self {
            organizations: OrgType::ALL.to_vec(),
            users: vec![
                user("admin@herbtrace.local", "Administração", UserRole::Admin, OrgType::Admin),
                user("farmer@herbtrace.local", "Joana Produtora", UserRole::Farmer, OrgType::Farmer),
                user("collector@herbtrace.local", "Carlos Coletor", UserRole::Collector, OrgType::Farmer),
                user("manufacturer@herbtrace.local", "Marta Fabricante", UserRole::Manufacturer, OrgType::Manufacturer),
                user("lab@herbtrace.local", "Lucas Analista", UserRole::LabTechnician, OrgType::Labs),
                user("distributor@herbtrace.local", "Diana Distribuidora", UserRole::Distributor, OrgType::Distributor),
            ],
            species: vec![
                species("Ashwagandha", "Withania somnifera", "Solanaceae", "Raiz adaptógena"),
                species("Tulsi", "Ocimum tenuiflorum", "Lamiaceae", "Manjericão sagrado"),
                species("Cúrcuma", "Curcuma longa", "Zingiberaceae", "Rizoma anti-inflamatório"),
                species("Brahmi", "Bacopa monnieri", "Plantaginaceae", "Erva de memória"),
            ],
            collections: vec![
                CollectionFixture {
                    species: 0,
                    quantity: Decimal::new(500, 0),
                    unit: "kg".into(),
                    location: "Talhão Norte".into(),
                    custom_data: Some(json!({ "moisture": 11.5, "weather": "seco" })),
                },
                CollectionFixture {
                    species: 1,
                    quantity: Decimal::new(200, 0),
                    unit: "kg".into(),
                    location: "Estufa 2".into(),
                    custom_data: None,
                },
                CollectionFixture {
                    species: 2,
                    quantity: Decimal::new(350, 0),
                    unit: "kg".into(),
                    location: "Talhão Sul".into(),
                    custom_data: Some(json!({ "organic": true })),
                },
            ],
            batches: vec![
                BatchFixture {
                    herb_name: "Ashwagandha (raiz)".into(),
                    quantity: Decimal::new(480, 0),
                    unit: "kg".into(),
                    supplier_info: Some(json!({ "cooperative": "Cooperativa de Produtores", "lot": "A-01" })),
                    final_status: BatchStatus::Processed,
                },
                BatchFixture {
                    herb_name: "Tulsi (folha)".into(),
                    quantity: Decimal::new(190, 0),
                    unit: "kg".into(),
                    supplier_info: None,
                    final_status: BatchStatus::InProcessing,
                },
            ],
            goods: vec![
                GoodFixture {
                    product_name: "Cápsulas de Ashwagandha".into(),
                    product_type: "CAPSULE".into(),
                    quantity: Decimal::new(1000, 0),
                    unit: "frasco".into(),
                    shelf_life_days: 730,
                    composition: vec![
                        CompositionFixture { batch: 0, percentage: Decimal::new(80, 0), quantity_used: Decimal::new(40, 0) },
                        CompositionFixture { batch: 1, percentage: Decimal::new(20, 0), quantity_used: Decimal::new(10, 0) },
                    ],
                },
                GoodFixture {
                    product_name: "Chá de Tulsi".into(),
                    product_type: "TEA".into(),
                    quantity: Decimal::new(500, 0),
                    unit: "caixa".into(),
                    shelf_life_days: 365,
                    composition: vec![CompositionFixture {
                        batch: 1,
                        percentage: Decimal::ONE_HUNDRED,
                        quantity_used: Decimal::new(25, 0),
                    }],
                },
            ],
            lab_tests: vec![
                LabTestFixture {
                    test_type: "Pureza".into(),
                    subject: TestSubjectSlot::RawMaterialBatch(0),
                    outcome: TestOutcome::Completed(LabResults::Purity {
                        purity_percent: Decimal::new(985, 1),
                        contaminants: Vec::new(),
                    }),
                    notes: Some("Amostra do lote inteiro".into()),
                },
                LabTestFixture {
                    test_type: "Microbiológico".into(),
                    subject: TestSubjectSlot::FinishedGood(0),
                    outcome: TestOutcome::Completed(LabResults::Microbial {
                        total_plate_count: 120,
                        pathogens_detected: false,
                    }),
                    notes: None,
                },
                LabTestFixture {
                    test_type: "Metais pesados".into(),
                    subject: TestSubjectSlot::PendingSample,
                    outcome: TestOutcome::Pending,
                    notes: Some("Aguardando amostra".into()),
                },
                LabTestFixture {
                    test_type: "Pureza".into(),
                    subject: TestSubjectSlot::FinishedGood(1),
                    outcome: TestOutcome::InProgress,
                    notes: None,
                },
            ],
            events: vec![
                EventFixture {
                    event_type: SupplyChainEventType::Collection,
                    subject: TargetSlot::RawMaterialBatch(0),
                    from: None,
                    to: Some(OrgType::Farmer),
                    handler: UserRole::Collector,
                    notes: "Coleta registrada no campo".into(),
                    metadata: Some(json!({ "gps": [-22.9, -47.06] })),
                },
                EventFixture {
                    event_type: SupplyChainEventType::Transfer,
                    subject: TargetSlot::RawMaterialBatch(0),
                    from: Some(OrgType::Farmer),
                    to: Some(OrgType::Manufacturer),
                    handler: UserRole::Farmer,
                    notes: "Entrega na fábrica".into(),
                    metadata: None,
                },
                EventFixture {
                    event_type: SupplyChainEventType::Processing,
                    subject: TargetSlot::RawMaterialBatch(1),
                    from: Some(OrgType::Manufacturer),
                    to: Some(OrgType::Manufacturer),
                    handler: UserRole::Manufacturer,
                    notes: "Secagem e moagem".into(),
                    metadata: None,
                },
                EventFixture {
                    event_type: SupplyChainEventType::Distribution,
                    subject: TargetSlot::FinishedGood(0),
                    from: Some(OrgType::Manufacturer),
                    to: Some(OrgType::Distributor),
                    handler: UserRole::Distributor,
                    notes: "Envio para o centro de distribuição".into(),
                    metadata: None,
                },
            ],
            qr_codes: vec![
                QrFixture { label: "lote".into(), custom_data: Some(json!({ "campaign": "rastreio-lote" })) },
                QrFixture { label: "produto".into(), custom_data: None },
                QrFixture { label: "laudo".into(), custom_data: None },
            ],
            documents: vec![
                DocumentFixture {
                    title: "Certificado de colheita".into(),
                    document_type: DocumentType::HarvestCertificate,
                    file_url: "https://files.herbtrace.local/harvest-a01.pdf".into(),
                    uploaded_by: UserRole::Farmer,
                },
                DocumentFixture {
                    title: "Registro de processamento".into(),
                    document_type: DocumentType::ProcessingRecord,
                    file_url: "https://files.herbtrace.local/processing-b02.pdf".into(),
                    uploaded_by: UserRole::Manufacturer,
                },
                DocumentFixture {
                    title: "Laudo de qualidade".into(),
                    document_type: DocumentType::LabReport,
                    file_url: "https://files.herbtrace.local/lab-fg01.pdf".into(),
                    uploaded_by: UserRole::LabTechnician,
                },
                DocumentFixture {
                    title: "Manifesto de envio".into(),
                    document_type: DocumentType::ShippingManifest,
                    file_url: "https://files.herbtrace.local/manifest-fg02.pdf".into(),
                    uploaded_by: UserRole::Distributor,
                },
            ],
            inventory: vec![
                InventoryFixture {
                    target: TargetSlot::FinishedGood(0),
                    quantity: Decimal::new(300, 0),
                    unit_price: Decimal::new(4990, 2),
                    warehouse_location: "CD Campinas - A1".into(),
                },
                InventoryFixture {
                    target: TargetSlot::FinishedGood(1),
                    quantity: Decimal::new(12, 0),
                    unit_price: Decimal::new(1890, 2),
                    warehouse_location: "CD Campinas - B3".into(),
                },
                InventoryFixture {
                    target: TargetSlot::RawMaterialBatch(1),
                    quantity: Decimal::new(20, 0),
                    unit_price: Decimal::new(375, 2),
                    warehouse_location: "CD Campinas - Granel".into(),
                },
            ],
            shipments: vec![ShipmentFixture {
                destination: "Farmácia Central - São Paulo".into(),
                status: ShipmentStatus::InTransit,
                lines: vec![
                    ShipmentLineFixture { inventory: 0, quantity: Decimal::new(20, 0) },
                    ShipmentLineFixture { inventory: 1, quantity: Decimal::new(10, 0) },
                ],
            }],
            admin_actions: vec![
                AdminActionFixture {
                    action_type: AdminActionType::OrganizationVerified,
                    description: "Organizações padrão verificadas".into(),
                },
                AdminActionFixture {
                    action_type: AdminActionType::DataSeeded,
                    description: "Dados de demonstração carregados".into(),
                },
            ],
            alerts: vec![
                AlertFixture {
                    title: "Estoque baixo de Chá de Tulsi".into(),
                    alert_type: AlertType::LowStock,
                    severity: AlertSeverity::Medium,
                    message: "Restam menos de 15 caixas no CD Campinas".into(),
                    target: Some(TargetSlot::FinishedGood(1)),
                    resolved: false,
                },
                AlertFixture {
                    title: "Umidade acima do limite no lote de Ashwagandha".into(),
                    alert_type: AlertType::QualityIssue,
                    severity: AlertSeverity::High,
                    message: "Lote reprocessado na secagem".into(),
                    target: Some(TargetSlot::RawMaterialBatch(0)),
                    resolved: true,
                },
            ],
            linking: LinkingPolicy::default(),
        }
    }
}

impl SeedFixtures {
    /// Só as organizações, sem mais nada.
    pub fn organizations_only(organizations: &[OrgType]) -> Self {
        Self {
            organizations: organizations.to_vec(),
            users: Vec::new(),
            species: Vec::new(),
            collections: Vec::new(),
            batches: Vec::new(),
            goods: Vec::new(),
            lab_tests: Vec::new(),
            events: Vec::new(),
            qr_codes: Vec::new(),
            documents: Vec::new(),
            inventory: Vec::new(),
            shipments: Vec::new(),
            admin_actions: Vec::new(),
            alerts: Vec::new(),
            linking: LinkingPolicy {
                qr_codes: Vec::new(),
                documents: Vec::new(),
                supply_chain_events: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_compositions_stay_within_one_hundred() {
        for good in SeedFixtures::default().goods {
            let total: Decimal = good.composition.iter().map(|c| c.percentage).sum();
            assert!(total <= Decimal::ONE_HUNDRED, "{} soma {}", good.product_name, total);
        }
    }

    #[test]
    fn default_users_have_unique_emails() {
        let fixtures = SeedFixtures::default();
        let mut emails: Vec<&str> = fixtures.users.iter().map(|u| u.email.as_str()).collect();
        emails.sort();
        emails.dedup();
        assert_eq!(emails.len(), fixtures.users.len());
    }
}
