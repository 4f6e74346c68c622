// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rstest::fixture;
use rust_decimal::Decimal;

use herbtrace::{
    config::{AppConfig, AppState},
    db::{MemoryStore, TraceStore},
    models::{
        botanical::{CollectionEvent, HerbSpecies, NewCollectionEvent, NewHerbSpecies},
        organization::{NewOrganization, NewUser, OrgType, Organization, User, UserRole},
        production::{FinishedGood, NewFinishedGood, NewRawMaterialBatch, RawMaterialBatch},
        quality::{LabResults, LabTest, LabTestSubject, NewLabTest},
        traceability::{NewQrCode, QrCode},
    },
};

// =============================================================================
// Fixtures
// =============================================================================

#[fixture]
pub fn state() -> AppState {
    AppState::with_store(AppConfig::for_tests(), Arc::new(MemoryStore::new()))
}

// =============================================================================
// Construtores diretos no store (sem passar pelo seed)
// =============================================================================

pub async fn organization(store: &dyn TraceStore, org_type: OrgType) -> Organization {
    store.create_organization(&NewOrganization::default_for(org_type)).await.unwrap()
}

pub async fn user(store: &dyn TraceStore, org: &Organization, email: &str, role: UserRole) -> User {
    let new = NewUser::for_organization(org, email, "Pessoa de Teste", role, "hash".into());
    store.create_user(&new).await.unwrap()
}

pub async fn species(store: &dyn TraceStore, scientific_name: &str) -> HerbSpecies {
    store
        .upsert_herb_species(&NewHerbSpecies {
            common_name: "Erva".into(),
            scientific_name: scientific_name.into(),
            family: None,
            description: None,
        })
        .await
        .unwrap()
        .0
}

pub async fn collection_event(store: &dyn TraceStore, collector: &User, species: &HerbSpecies) -> CollectionEvent {
    store
        .create_collection_event(&NewCollectionEvent {
            collector_id: collector.id,
            farmer_id: collector.id,
            herb_species_id: species.id,
            quantity: Decimal::new(10, 0),
            unit: "kg".into(),
            location: None,
            harvest_date: Utc::now(),
            custom_data: None,
        })
        .await
        .unwrap()
}

pub async fn batch(store: &dyn TraceStore, owner: &User, herb_name: &str) -> RawMaterialBatch {
    store
        .create_raw_material_batch(&NewRawMaterialBatch {
            herb_name: herb_name.into(),
            quantity: Decimal::new(100, 0),
            unit: "kg".into(),
            current_owner_id: owner.id,
            supplier_info: None,
        })
        .await
        .unwrap()
}

pub async fn good(store: &dyn TraceStore, manufacturer: &User, batch_number: &str) -> FinishedGood {
    store
        .create_finished_good(&NewFinishedGood {
            product_name: "Produto".into(),
            product_type: "CAPSULE".into(),
            manufacturer_id: manufacturer.id,
            batch_number: batch_number.into(),
            quantity: Decimal::new(50, 0),
            unit: "frasco".into(),
            manufacture_date: Utc::now(),
            expiry_date: None,
        })
        .await
        .unwrap()
}

pub async fn lab_test(store: &dyn TraceStore, requester: &User, subject: LabTestSubject, completed: bool) -> LabTest {
    let mut new = NewLabTest::pending("Pureza", subject, requester.id);
    if completed {
        let results = LabResults::Purity { purity_percent: Decimal::new(99, 0), contaminants: Vec::new() };
        new = new.completed(requester.id, Utc::now(), results);
    }
    store.create_lab_test(&new).await.unwrap()
}

pub async fn qr_code(store: &dyn TraceStore, code: &str) -> QrCode {
    store
        .create_qr_code(&NewQrCode { code: code.into(), label: None, svg_data: None, custom_data: None })
        .await
        .unwrap()
}

/// Organização FARMER com um usuário produtor.
pub async fn farmer(store: &dyn TraceStore) -> User {
    let org = organization(store, OrgType::Farmer).await;
    user(store, &org, "produtor@teste.com", UserRole::Farmer).await
}
