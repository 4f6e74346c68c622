// src/services/seed_planner.rs

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TraceStore,
    models::{
        admin::{AlertKey, NewSystemAlert, SystemAlert},
        botanical::{CollectionEvent, HerbSpecies, NewCollectionEvent},
        distribution::{
            DistributorInventory, DistributorShipment, NewInventoryItem, NewShipment,
            NewShipmentItem, ProductType, ShipmentStatus,
        },
        organization::{NewOrganization, NewUser, OrgType, Organization, User, UserRole},
        production::{FinishedGood, NewComposition, NewFinishedGood, NewRawMaterialBatch, RawMaterialBatch},
        quality::{LabTest, LabTestSubject, NewLabTest},
        table::Table,
        traceability::{
            CustodySubject, Document, EntityRef, LinkedTable, NewDocument, NewQrCode,
            NewSupplyChainEvent, QrCode, SupplyChainEvent,
        },
    },
    services::{
        auth::PasswordHasher,
        consistency::{ConsistencyReport, ConsistencyReporter},
        fixtures::{SeedFixtures, TargetSlot, TestOutcome, TestSubjectSlot},
        idempotency::{Ensured, IdempotencyGuard},
        lifecycle_service::LifecycleService,
        linker::{LinkOutcome, PolymorphicLinker},
        pairing::pair_with_plan,
        qr_service::QrRenderer,
        registry::{EntityRegistry, RegistryKey},
    },
};

/// Grupos do seed, na ordem de dependência. Um grupo só começa depois que
/// todas as escritas do anterior foram confirmadas pelo banco.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeedStep {
    Organizations,
    UsersAndSpecies,
    CollectionEvents,
    RawMaterialBatches,
    FinishedGoods,
    Compositions,
    LabTests,
    Certificates,
    SupplyChainEvents,
    QrCodesAndDocuments,
    Inventory,
    Shipments,
    ShipmentItems,
    AdminActionsAndAlerts,
}

impl SeedStep {
    pub const ORDER: [SeedStep; 14] = [
        SeedStep::Organizations,
        SeedStep::UsersAndSpecies,
        SeedStep::CollectionEvents,
        SeedStep::RawMaterialBatches,
        SeedStep::FinishedGoods,
        SeedStep::Compositions,
        SeedStep::LabTests,
        SeedStep::Certificates,
        SeedStep::SupplyChainEvents,
        SeedStep::QrCodesAndDocuments,
        SeedStep::Inventory,
        SeedStep::Shipments,
        SeedStep::ShipmentItems,
        SeedStep::AdminActionsAndAlerts,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SeedStep::Organizations => "organizações",
            SeedStep::UsersAndSpecies => "usuários e espécies",
            SeedStep::CollectionEvents => "eventos de coleta",
            SeedStep::RawMaterialBatches => "lotes de matéria-prima",
            SeedStep::FinishedGoods => "produtos acabados",
            SeedStep::Compositions => "composições",
            SeedStep::LabTests => "testes de laboratório",
            SeedStep::Certificates => "certificados",
            SeedStep::SupplyChainEvents => "eventos da cadeia",
            SeedStep::QrCodesAndDocuments => "QR codes e documentos",
            SeedStep::Inventory => "estoque do distribuidor",
            SeedStep::Shipments => "remessas",
            SeedStep::ShipmentItems => "itens de remessa",
            SeedStep::AdminActionsAndAlerts => "ações de admin e alertas",
        }
    }
}

impl fmt::Display for SeedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub step: SeedStep,
    pub created: usize,
    pub reused: usize,
    pub linked: usize,
    pub skipped: usize,
}

impl StepReport {
    pub fn new(step: SeedStep) -> Self {
        Self { step, created: 0, reused: 0, linked: 0, skipped: 0 }
    }

    fn ensured<T>(&mut self, ensured: &Ensured<T>) {
        if ensured.was_created() {
            self.created += 1;
        } else {
            self.reused += 1;
        }
    }

    fn link(&mut self, outcome: LinkOutcome) {
        if outcome.is_linked() {
            self.linked += 1;
        } else {
            self.skipped += 1;
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub run_tag: String,
    pub steps: Vec<StepReport>,
    pub report: ConsistencyReport,
}

impl SeedSummary {
    pub fn step(&self, step: SeedStep) -> Option<&StepReport> {
        self.steps.iter().find(|report| report.step == step)
    }
}

/// Executa os grupos do seed em ordem e devolve o resumo da execução.
///
/// Grupos com chave natural (organizações, usuários, espécies, alertas)
/// passam pela guarda de idempotência. Os demais são fixtures só de
/// inserção: uma segunda execução cria outra leva, com a etiqueta da
/// execução nas colunas únicas.
pub struct SeedPlanner {
    store: Arc<dyn TraceStore>,
    guard: IdempotencyGuard,
    linker: PolymorphicLinker,
    lifecycle: LifecycleService,
    reporter: ConsistencyReporter,
    hasher: PasswordHasher,
    qr: QrRenderer,
    fixtures: SeedFixtures,
    default_password: String,
    run_tag: String,
}

impl SeedPlanner {
    pub fn new(
        store: Arc<dyn TraceStore>,
        hasher: PasswordHasher,
        default_password: String,
        fixtures: SeedFixtures,
    ) -> Self {
        let run_tag = Uuid::new_v4().simple().to_string()[..8].to_string();
        Self {
            guard: IdempotencyGuard::new(store.clone()),
            linker: PolymorphicLinker::new(store.clone()),
            lifecycle: LifecycleService::new(store.clone()),
            reporter: ConsistencyReporter::new(store.clone()),
            store,
            hasher,
            qr: QrRenderer::new(),
            fixtures,
            default_password,
            run_tag,
        }
    }

    pub fn with_run_tag(mut self, run_tag: impl Into<String>) -> Self {
        self.run_tag = run_tag.into();
        self
    }

    // =========================================================================
    //  PONTOS DE ENTRADA
    // =========================================================================

    pub async fn run(&self) -> Result<SeedSummary, AppError> {
        info!("🌱 Iniciando seed (execução {})", self.run_tag);
        let mut registry = EntityRegistry::new();
        let mut steps = Vec::with_capacity(SeedStep::ORDER.len());

        for step in SeedStep::ORDER {
            match self.execute(step, &mut registry).await {
                Ok(report) => {
                    info!(
                        "✅ {}: {} criados, {} reaproveitados, {} vinculados, {} pulados",
                        step, report.created, report.reused, report.linked, report.skipped
                    );
                    steps.push(report);
                }
                Err(e) => {
                    error!("🔥 Falha na etapa {}: {}", step, e);
                    return Err(e);
                }
            }
        }

        let report = self.reporter.report().await?;
        if report.is_ready() {
            info!("✅ Seed concluído, sistema pronto");
        } else {
            warn!("⚠️ Seed concluído, mas o sistema não está pronto: {:?}", report.readiness_failures());
        }
        Ok(SeedSummary { run_tag: self.run_tag.clone(), steps, report })
    }

    /// Garante uma organização por tipo pedido, sem tocar nas que já existem.
    pub async fn ensure_default_organizations(&self, required: &[OrgType]) -> Result<StepReport, AppError> {
        let mut registry = EntityRegistry::new();
        let report = self
            .seed_organizations(required, &mut registry)
            .await
            .inspect_err(|e| error!("🔥 Falha na etapa {}: {}", SeedStep::Organizations, e))?;
        info!(
            "✅ Organizações padrão: {} criadas, {} já existiam",
            report.created, report.reused
        );
        Ok(report)
    }

    /// Apaga tudo, filhos antes dos pais.
    pub async fn reset(&self) -> Result<u64, AppError> {
        let mut total = 0;
        for table in Table::reverse_dependency_order() {
            let removed = self.store.delete_all(table).await?;
            if removed > 0 {
                info!("🧹 {} linhas removidas de {}", removed, table);
            }
            total += removed;
        }
        info!("🧹 Reset completo: {} linhas removidas", total);
        Ok(total)
    }

    pub async fn reset_and_run(&self) -> Result<SeedSummary, AppError> {
        self.reset()
            .await
            .inspect_err(|e| error!("🔥 Falha no reset: {}", e))?;
        self.run().await
    }

    async fn execute(&self, step: SeedStep, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        match step {
            SeedStep::Organizations => self.seed_organizations(&self.fixtures.organizations, registry).await,
            SeedStep::UsersAndSpecies => self.seed_users_and_species(registry).await,
            SeedStep::CollectionEvents => self.seed_collection_events(registry).await,
            SeedStep::RawMaterialBatches => self.seed_raw_material_batches(registry).await,
            SeedStep::FinishedGoods => self.seed_finished_goods(registry).await,
            SeedStep::Compositions => self.seed_compositions(registry).await,
            SeedStep::LabTests => self.seed_lab_tests(registry).await,
            SeedStep::Certificates => self.seed_certificates(registry).await,
            SeedStep::SupplyChainEvents => self.seed_supply_chain_events(registry).await,
            SeedStep::QrCodesAndDocuments => self.seed_qr_codes_and_documents(registry).await,
            SeedStep::Inventory => self.seed_inventory(registry).await,
            SeedStep::Shipments => self.seed_shipments(registry).await,
            SeedStep::ShipmentItems => self.seed_shipment_items(registry).await,
            SeedStep::AdminActionsAndAlerts => self.seed_admin_actions_and_alerts(registry).await,
        }
    }

    // =========================================================================
    //  GRUPOS IDEMPOTENTES
    // =========================================================================

    async fn seed_organizations(
        &self,
        required: &[OrgType],
        registry: &mut EntityRegistry,
    ) -> Result<StepReport, AppError> {
        let mut org_types: Vec<OrgType> = Vec::new();
        for org_type in required {
            if !org_types.contains(org_type) {
                org_types.push(*org_type);
            }
        }

        // Tipos diferentes não compartilham chave: podem ir em paralelo.
        let results = try_join_all(org_types.iter().map(|org_type| {
            self.guard.ensure::<Organization, _, _>(org_type, move || async move {
                Ok::<_, AppError>(NewOrganization::default_for(*org_type))
            })
        }))
        .await?;

        let mut report = StepReport::new(SeedStep::Organizations);
        for ensured in results {
            report.ensured(&ensured);
            let organization = ensured.into_inner();
            registry.insert(RegistryKey::organization(organization.org_type), organization);
        }
        Ok(report)
    }

    async fn seed_users_and_species(&self, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        let (users, species) = tokio::try_join!(self.seed_users(registry), self.seed_species())?;

        let mut report = StepReport::new(SeedStep::UsersAndSpecies);
        for ensured in users {
            report.ensured(&ensured);
            let user = ensured.into_inner();
            registry.insert(RegistryKey::user(&user.email), user);
        }
        for ensured in species {
            report.ensured(&ensured);
            registry.push(ensured.into_inner());
        }
        Ok(report)
    }

    async fn seed_users(&self, registry: &EntityRegistry) -> Result<Vec<Ensured<User>>, AppError> {
        try_join_all(self.fixtures.users.iter().map(|fixture| async move {
            let organization = registry.organization(fixture.org_type)?;
            let email = fixture.email.to_lowercase();

            // O hash só roda quando o usuário ainda não existe.
            self.guard
                .ensure::<User, _, _>(&email, || async move {
                    let password_hash = self.hasher.hash(&self.default_password).await?;
                    let new = NewUser::for_organization(
                        organization,
                        &fixture.email,
                        &fixture.name,
                        fixture.role,
                        password_hash,
                    );
                    new.check_organization(organization)?;
                    Ok::<_, AppError>(new)
                })
                .await
        }))
        .await
    }

    async fn seed_species(&self) -> Result<Vec<Ensured<HerbSpecies>>, AppError> {
        try_join_all(self.fixtures.species.iter().map(|new| {
            self.guard.ensure::<HerbSpecies, _, _>(&new.scientific_name, move || async move {
                Ok::<_, AppError>(new.clone())
            })
        }))
        .await
    }

    // =========================================================================
    //  COLETA, LOTES E PRODUÇÃO
    // =========================================================================

    // Sequencial: a ordem de criação alimenta o pareamento com os lotes.
    async fn seed_collection_events(&self, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        let mut report = StepReport::new(SeedStep::CollectionEvents);
        if self.fixtures.collections.is_empty() {
            return Ok(report);
        }
        let species: Vec<Uuid> = registry
            .require_indexed::<HerbSpecies>()?
            .into_iter()
            .map(|species| species.id)
            .collect();

        for (i, fixture) in self.fixtures.collections.iter().enumerate() {
            let species_id = *species
                .get(fixture.species)
                .ok_or_else(|| AppError::missing(format!("herbSpecies:{}", fixture.species)))?;
            let collector_id = registry.user_with_role(UserRole::Collector)?.id;
            let farmer_id = registry.user_with_role(UserRole::Farmer)?.id;

            let event = self
                .store
                .create_collection_event(&NewCollectionEvent {
                    collector_id,
                    farmer_id,
                    herb_species_id: species_id,
                    quantity: fixture.quantity,
                    unit: fixture.unit.clone(),
                    location: Some(fixture.location.clone()),
                    harvest_date: Utc::now() - Duration::days(30 - i as i64),
                    custom_data: fixture.custom_data.clone(),
                })
                .await?;
            registry.push(event);
            report.created += 1;
        }
        Ok(report)
    }

    async fn seed_raw_material_batches(&self, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        let mut report = StepReport::new(SeedStep::RawMaterialBatches);

        for fixture in &self.fixtures.batches {
            let owner_id = registry.user_with_role(UserRole::Farmer)?.id;
            let batch = self
                .store
                .create_raw_material_batch(&NewRawMaterialBatch {
                    herb_name: fixture.herb_name.clone(),
                    quantity: fixture.quantity,
                    unit: fixture.unit.clone(),
                    current_owner_id: owner_id,
                    supplier_info: fixture.supplier_info.clone(),
                })
                .await?;
            registry.push(batch);
            report.created += 1;
        }

        // Passada de vinculação coleta -> lote.
        let events: Vec<CollectionEvent> = registry.indexed::<CollectionEvent>().into_iter().cloned().collect();
        let batches: Vec<RawMaterialBatch> = registry.indexed::<RawMaterialBatch>().into_iter().cloned().collect();
        let linked = self.linker.link_collection_events(&events, &batches).await?;
        report.linked = linked.len();
        report.skipped = events.len() - linked.len();
        for updated in linked {
            if let Some(pos) = events.iter().position(|event| event.id == updated.id) {
                registry.insert(RegistryKey::indexed(Table::CollectionEvents, pos), updated);
            }
        }

        // Status andam para frente até o estado final de cada fixture.
        for (i, (batch, fixture)) in batches.iter().zip(&self.fixtures.batches).enumerate() {
            let advanced = self.lifecycle.advance_batch_to(batch, fixture.final_status).await?;
            registry.insert(RegistryKey::indexed(Table::RawMaterialBatches, i), advanced);
        }
        Ok(report)
    }

    async fn seed_finished_goods(&self, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        let mut report = StepReport::new(SeedStep::FinishedGoods);
        if self.fixtures.goods.is_empty() {
            return Ok(report);
        }
        let manufacturer_id = registry.user_with_role(UserRole::Manufacturer)?.id;
        let now = Utc::now();

        let payloads: Vec<NewFinishedGood> = self
            .fixtures
            .goods
            .iter()
            .enumerate()
            .map(|(i, fixture)| NewFinishedGood {
                product_name: fixture.product_name.clone(),
                product_type: fixture.product_type.clone(),
                manufacturer_id,
                batch_number: format!("FG-{}-{:03}", self.run_tag, i + 1),
                quantity: fixture.quantity,
                unit: fixture.unit.clone(),
                manufacture_date: now,
                expiry_date: Some(now + Duration::days(fixture.shelf_life_days)),
            })
            .collect();

        let goods = try_join_all(payloads.iter().map(|new| self.store.create_finished_good(new))).await?;
        for good in goods {
            registry.push(good);
            report.created += 1;
        }
        Ok(report)
    }

    async fn seed_compositions(&self, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        let mut report = StepReport::new(SeedStep::Compositions);

        for (i, fixture) in self.fixtures.goods.iter().enumerate() {
            let good_id = registry.get::<FinishedGood>(&RegistryKey::indexed(Table::FinishedGoods, i))?.id;
            for part in &fixture.composition {
                let batch_id = registry
                    .get::<RawMaterialBatch>(&RegistryKey::indexed(Table::RawMaterialBatches, part.batch))?
                    .id;
                let composition = self
                    .lifecycle
                    .add_composition(&NewComposition {
                        finished_good_id: good_id,
                        raw_material_batch_id: batch_id,
                        percentage: part.percentage,
                        quantity_used: part.quantity_used,
                    })
                    .await?;
                registry.push(composition);
                report.created += 1;
            }
        }
        Ok(report)
    }

    // =========================================================================
    //  QUALIDADE
    // =========================================================================

    async fn seed_lab_tests(&self, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        let mut report = StepReport::new(SeedStep::LabTests);

        for fixture in &self.fixtures.lab_tests {
            let requester_id = registry.user_with_role(UserRole::Manufacturer)?.id;
            let technician_id = registry.user_with_role(UserRole::LabTechnician)?.id;
            let subject = match fixture.subject {
                TestSubjectSlot::RawMaterialBatch(i) => LabTestSubject::RawMaterialBatch(
                    registry.id(&RegistryKey::indexed(Table::RawMaterialBatches, i))?,
                ),
                TestSubjectSlot::FinishedGood(i) => {
                    LabTestSubject::FinishedGood(registry.id(&RegistryKey::indexed(Table::FinishedGoods, i))?)
                }
                TestSubjectSlot::PendingSample => LabTestSubject::PendingSample,
            };

            let mut new = NewLabTest::pending(&fixture.test_type, subject, requester_id);
            new.notes = fixture.notes.clone();
            if fixture.outcome != TestOutcome::Pending {
                new = new.in_progress(technician_id);
            }
            let mut test = self.lifecycle.register_lab_test(&new).await?;

            // Concluídos passam pelo fluxo real: em andamento, depois concluído.
            if let TestOutcome::Completed(results) = &fixture.outcome {
                test = self
                    .lifecycle
                    .complete_lab_test(test.id, technician_id, Utc::now(), results.clone())
                    .await?;
            }
            registry.push(test);
            report.created += 1;
        }
        Ok(report)
    }

    async fn seed_certificates(&self, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        let mut report = StepReport::new(SeedStep::Certificates);
        let completed: Vec<Uuid> = registry
            .indexed::<LabTest>()
            .into_iter()
            .filter(|test| test.is_completed())
            .map(|test| test.id)
            .collect();
        if completed.is_empty() {
            return Ok(report);
        }

        let issuer_id = registry.user_with_role(UserRole::LabTechnician)?.id;
        let lab_id = registry.organization(OrgType::Labs)?.id;

        let certificates = try_join_all(completed.iter().enumerate().map(|(i, test_id)| {
            self.lifecycle.issue_certificate(
                *test_id,
                format!("CERT-{}-{:03}", self.run_tag, i + 1),
                issuer_id,
                lab_id,
            )
        }))
        .await?;
        for certificate in certificates {
            registry.push(certificate);
            report.created += 1;
        }
        Ok(report)
    }

    // =========================================================================
    //  RASTREABILIDADE
    // =========================================================================

    async fn seed_supply_chain_events(&self, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        let mut report = StepReport::new(SeedStep::SupplyChainEvents);

        for fixture in &self.fixtures.events {
            let subject = match resolve_target(registry, fixture.subject) {
                Some(EntityRef::RawMaterialBatch(id)) => CustodySubject::RawMaterialBatch { id },
                Some(EntityRef::FinishedGood(id)) => CustodySubject::FinishedGood { id },
                Some(EntityRef::LabTest(_)) => {
                    return Err(AppError::validation("Evento da cadeia não aponta para teste de laboratório"));
                }
                None => {
                    warn!("⚠️ Evento {:?} sem alvo para {:?}, pulado", fixture.event_type, fixture.subject);
                    report.skipped += 1;
                    continue;
                }
            };
            let handler_id = registry.user_with_role(fixture.handler)?.id;
            let from_location_id = match fixture.from {
                Some(org_type) => Some(registry.organization(org_type)?.id),
                None => None,
            };
            let to_location_id = match fixture.to {
                Some(org_type) => Some(registry.organization(org_type)?.id),
                None => None,
            };

            let event = self
                .store
                .create_supply_chain_event(&NewSupplyChainEvent {
                    event_type: fixture.event_type,
                    handler_id,
                    from_location_id,
                    to_location_id,
                    subject,
                    notes: Some(fixture.notes.clone()),
                    metadata: fixture.metadata.clone(),
                })
                .await?;
            registry.push(event);
            report.created += 1;
        }

        // Re-vínculo opcional pela política.
        let events: Vec<SupplyChainEvent> = registry.indexed::<SupplyChainEvent>().into_iter().cloned().collect();
        for (event, slot) in pair_with_plan(&events, &self.fixtures.linking.supply_chain_events) {
            let target = resolve_target(registry, *slot);
            let outcome = self.linker.link(LinkedTable::SupplyChainEvents, event.id, target).await?;
            report.link(outcome);
        }
        Ok(report)
    }

    async fn seed_qr_codes_and_documents(&self, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        let mut report = StepReport::new(SeedStep::QrCodesAndDocuments);

        // QR codes nascem sem vínculo; o vinculador aponta depois.
        for (i, fixture) in self.fixtures.qr_codes.iter().enumerate() {
            let code = format!("QR-{}-{:03}", self.run_tag, i + 1);
            let svg_data = self.qr.render_svg(&code)?;
            let qr = self
                .store
                .create_qr_code(&NewQrCode {
                    code,
                    label: Some(fixture.label.clone()),
                    svg_data: Some(svg_data),
                    custom_data: fixture.custom_data.clone(),
                })
                .await?;
            registry.push(qr);
            report.created += 1;
        }

        for fixture in &self.fixtures.documents {
            let uploaded_by = registry.user_with_role(fixture.uploaded_by)?.id;
            let document = self
                .store
                .create_document(&NewDocument {
                    title: fixture.title.clone(),
                    document_type: fixture.document_type,
                    file_url: fixture.file_url.clone(),
                    uploaded_by,
                    metadata: Some(json!({ "runTag": self.run_tag })),
                })
                .await?;
            registry.push(document);
            report.created += 1;
        }

        let qr_codes: Vec<QrCode> = registry.indexed::<QrCode>().into_iter().cloned().collect();
        for (qr, slot) in pair_with_plan(&qr_codes, &self.fixtures.linking.qr_codes) {
            let target = resolve_target(registry, *slot);
            let outcome = self.linker.link(LinkedTable::QrCodes, qr.id, target).await?;
            report.link(outcome);
        }

        let documents: Vec<Document> = registry.indexed::<Document>().into_iter().cloned().collect();
        for (document, slot) in pair_with_plan(&documents, &self.fixtures.linking.documents) {
            let target = resolve_target(registry, *slot);
            let outcome = self.linker.link(LinkedTable::Documents, document.id, target).await?;
            report.link(outcome);
        }

        // Atualiza as fotos do registro com as colunas recém-gravadas.
        let fresh_qr = self.store.list_qr_codes().await?;
        for (pos, qr) in qr_codes.iter().enumerate() {
            if let Some(row) = fresh_qr.iter().find(|row| row.id == qr.id) {
                registry.insert(RegistryKey::indexed(Table::QrCodes, pos), row.clone());
            }
        }
        let fresh_documents = self.store.list_documents().await?;
        for (pos, document) in documents.iter().enumerate() {
            if let Some(row) = fresh_documents.iter().find(|row| row.id == document.id) {
                registry.insert(RegistryKey::indexed(Table::Documents, pos), row.clone());
            }
        }
        Ok(report)
    }

    // =========================================================================
    //  DISTRIBUIÇÃO
    // =========================================================================

    async fn seed_inventory(&self, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        let mut report = StepReport::new(SeedStep::Inventory);

        for (i, fixture) in self.fixtures.inventory.iter().enumerate() {
            let Some(target) = resolve_target(registry, fixture.target) else {
                warn!("⚠️ Estoque #{} sem alvo para {:?}, pulado", i, fixture.target);
                report.skipped += 1;
                continue;
            };
            if let Some(reason) = self.linker.check_target(LinkedTable::DistributorInventory, target).await? {
                warn!("⚠️ Estoque #{} -> {}: pulado ({:?})", i, target, reason);
                report.skipped += 1;
                continue;
            }
            let product_type = ProductType::from_kind(target.kind())
                .ok_or_else(|| AppError::validation(format!("Estoque não aponta para {:?}", target.kind())))?;
            let distributor_id = registry.user_with_role(UserRole::Distributor)?.id;

            let item = self
                .store
                .create_inventory_item(&NewInventoryItem {
                    distributor_id,
                    product_type,
                    entity_id: target.id(),
                    quantity: fixture.quantity,
                    unit_price: fixture.unit_price,
                    warehouse_location: Some(fixture.warehouse_location.clone()),
                    supplier_info: None,
                })
                .await?;
            // Posição da fixture, não da criação: itens de remessa apontam por ela.
            registry.insert::<DistributorInventory>(RegistryKey::indexed(Table::DistributorInventory, i), item);
            report.created += 1;
            report.linked += 1;
        }
        Ok(report)
    }

    async fn seed_shipments(&self, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        let mut report = StepReport::new(SeedStep::Shipments);

        for (i, fixture) in self.fixtures.shipments.iter().enumerate() {
            let distributor_id = registry.user_with_role(UserRole::Distributor)?.id;
            let shipped_at = match fixture.status {
                ShipmentStatus::InTransit | ShipmentStatus::Delivered => Some(Utc::now()),
                ShipmentStatus::Preparing | ShipmentStatus::Cancelled => None,
            };
            let shipment = self
                .store
                .create_shipment(&NewShipment {
                    distributor_id,
                    shipment_number: format!("SHP-{}-{:03}", self.run_tag, i + 1),
                    status: fixture.status,
                    destination: fixture.destination.clone(),
                    shipped_at,
                })
                .await?;
            registry.insert::<DistributorShipment>(RegistryKey::indexed(Table::DistributorShipments, i), shipment);
            report.created += 1;
        }
        Ok(report)
    }

    async fn seed_shipment_items(&self, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        let mut report = StepReport::new(SeedStep::ShipmentItems);

        for (i, fixture) in self.fixtures.shipments.iter().enumerate() {
            let shipment_id = registry.id(&RegistryKey::indexed(Table::DistributorShipments, i))?;
            for line in &fixture.lines {
                let stock = registry
                    .get::<DistributorInventory>(&RegistryKey::indexed(Table::DistributorInventory, line.inventory))?;
                let new = NewShipmentItem::new(
                    shipment_id,
                    stock.product_type,
                    stock.entity_id,
                    line.quantity,
                    stock.unit_price,
                );
                let item = self.store.create_shipment_item(&new).await?;
                registry.push(item);
                report.created += 1;
            }
        }
        Ok(report)
    }

    // =========================================================================
    //  ADMINISTRAÇÃO
    // =========================================================================

    async fn seed_admin_actions_and_alerts(&self, registry: &mut EntityRegistry) -> Result<StepReport, AppError> {
        let mut report = StepReport::new(SeedStep::AdminActionsAndAlerts);

        for fixture in &self.fixtures.admin_actions {
            let admin = registry.user_with_role(UserRole::Admin)?.clone();
            let action = self
                .lifecycle
                .record_admin_action(
                    &admin,
                    fixture.action_type,
                    &fixture.description,
                    Some(json!({ "runTag": self.run_tag })),
                )
                .await?;
            registry.push(action);
            report.created += 1;
        }

        for fixture in &self.fixtures.alerts {
            let key = AlertKey { title: fixture.title.clone(), alert_type: fixture.alert_type };

            let mut target = fixture.target.and_then(|slot| resolve_target(registry, slot));
            if let Some(candidate) = target {
                if let Some(reason) = self.linker.check_target(LinkedTable::SystemAlerts, candidate).await? {
                    warn!("⚠️ Alerta '{}' -> {}: sem vínculo ({:?})", fixture.title, candidate, reason);
                    target = None;
                }
            }

            let ensured = self
                .guard
                .ensure::<SystemAlert, _, _>(&key, || async move {
                    let mut new = NewSystemAlert::open(
                        &fixture.title,
                        fixture.alert_type,
                        fixture.severity,
                        &fixture.message,
                    );
                    if let Some(target) = target {
                        new = new.about(target);
                    }
                    if fixture.resolved {
                        new = new.resolved(Utc::now());
                    }
                    Ok::<_, AppError>(new)
                })
                .await?;
            report.ensured(&ensured);
            if ensured.was_created() && target.is_some() {
                report.linked += 1;
            }
            registry.push(ensured.into_inner());
        }
        Ok(report)
    }
}

/// Resolve um alvo lógico contra o que esta execução registrou.
/// `None` quando a posição não existe.
pub fn resolve_target(registry: &EntityRegistry, slot: TargetSlot) -> Option<EntityRef> {
    match slot {
        TargetSlot::RawMaterialBatch(i) => registry
            .indexed::<RawMaterialBatch>()
            .get(i)
            .map(|batch| EntityRef::RawMaterialBatch(batch.id)),
        TargetSlot::FinishedGood(i) => registry
            .indexed::<FinishedGood>()
            .get(i)
            .map(|good| EntityRef::FinishedGood(good.id)),
        TargetSlot::CompletedLabTest(i) => registry
            .indexed::<LabTest>()
            .into_iter()
            .filter(|test| test.is_completed())
            .nth(i)
            .map(|test| EntityRef::LabTest(test.id)),
        TargetSlot::LabTest(i) => registry
            .indexed::<LabTest>()
            .get(i)
            .map(|test| EntityRef::LabTest(test.id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_order_follows_dependency_graph() {
        let pos = |step| SeedStep::ORDER.iter().position(|s| *s == step).unwrap();
        assert!(pos(SeedStep::Organizations) < pos(SeedStep::UsersAndSpecies));
        assert!(pos(SeedStep::CollectionEvents) < pos(SeedStep::RawMaterialBatches));
        assert!(pos(SeedStep::LabTests) < pos(SeedStep::Certificates));
        assert!(pos(SeedStep::Inventory) < pos(SeedStep::ShipmentItems));
        assert_eq!(SeedStep::ORDER.last(), Some(&SeedStep::AdminActionsAndAlerts));
    }

    #[test]
    fn unresolved_slot_has_no_target() {
        let registry = EntityRegistry::new();
        assert_eq!(resolve_target(&registry, TargetSlot::FinishedGood(0)), None);
        assert_eq!(resolve_target(&registry, TargetSlot::CompletedLabTest(0)), None);
    }
}
