// tests/seed_run.rs
//
// Execuções completas do seed contra o store em memória.

mod common;

use std::collections::HashSet;

use common::state;
use herbtrace::{
    common::error::AppError,
    config::AppState,
    models::{
        organization::{OrgType, UserRole},
        Table,
    },
    services::{
        fixtures::{SeedFixtures, UserFixture},
        seed_planner::SeedStep,
    },
};
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test]
async fn first_run_leaves_system_ready(state: AppState) {
    let summary = state.seed_planner(SeedFixtures::default()).run().await.unwrap();

    assert!(summary.report.is_ready(), "{:?}", summary.report.readiness_failures());
    assert_eq!(summary.report.count(Table::Organizations), 5);
    assert_eq!(summary.report.count(Table::HerbSpecies), 4);
    assert_eq!(summary.report.count(Table::Users), 6);
    assert_eq!(summary.report.count(Table::SystemAlerts), 2);
    assert_eq!(summary.steps.len(), SeedStep::ORDER.len());
}

#[rstest]
#[tokio::test]
async fn second_run_reuses_naturally_keyed_rows(state: AppState) {
    let first = state.seed_planner(SeedFixtures::default()).run().await.unwrap();
    let admin_before = state.store.find_user_by_email("admin@herbtrace.local").await.unwrap().unwrap();

    let second = state.seed_planner(SeedFixtures::default()).run().await.unwrap();

    for table in [Table::Organizations, Table::HerbSpecies, Table::Users, Table::SystemAlerts] {
        assert_eq!(first.report.count(table), second.report.count(table), "{}", table);
    }

    let organizations = second.step(SeedStep::Organizations).unwrap();
    assert_eq!((organizations.created, organizations.reused), (0, 5));
    let people = second.step(SeedStep::UsersAndSpecies).unwrap();
    assert_eq!((people.created, people.reused), (0, 10));

    let admin_after = state.store.find_user_by_email("admin@herbtrace.local").await.unwrap().unwrap();
    assert_eq!(admin_before.id, admin_after.id);
    assert_eq!(admin_before.password_hash, admin_after.password_hash);

    let users = state.store.list_users().await.unwrap();
    let emails: HashSet<&str> = users.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(emails.len(), users.len());

    // Fixtures só de inserção dobram, sem colidir nas colunas únicas.
    assert_eq!(second.report.count(Table::FinishedGoods), 2 * first.report.count(Table::FinishedGoods));
    assert!(second.report.is_ready(), "{:?}", second.report.readiness_failures());
}

#[rstest]
#[tokio::test]
async fn default_organizations_only_fill_missing_types(state: AppState) {
    let store = state.store.as_ref();
    let farmer = common::organization(store, OrgType::Farmer).await;
    let distributor = common::organization(store, OrgType::Distributor).await;

    let planner = state.seed_planner(SeedFixtures::organizations_only(&OrgType::ALL));
    let report = planner.ensure_default_organizations(&OrgType::ALL).await.unwrap();

    assert_eq!(report.created, 3);
    assert_eq!(report.reused, 2);
    assert_eq!(store.list_organizations().await.unwrap().len(), 5);

    let farmer_after = store.find_organization_by_type(OrgType::Farmer).await.unwrap().unwrap();
    let distributor_after = store.find_organization_by_type(OrgType::Distributor).await.unwrap().unwrap();
    assert_eq!(farmer_after.id, farmer.id);
    assert_eq!(farmer_after.updated_at, farmer.updated_at);
    assert_eq!(distributor_after.id, distributor.id);
}

#[rstest]
#[tokio::test]
async fn reset_then_reseed_matches_fresh_seed() {
    let fresh = common::state();
    let fresh_summary = fresh.seed_planner(SeedFixtures::default()).run().await.unwrap();

    let reused = common::state();
    reused.seed_planner(SeedFixtures::default()).run().await.unwrap();
    reused.seed_planner(SeedFixtures::default()).run().await.unwrap();
    let reset_summary = reused.seed_planner(SeedFixtures::default()).reset_and_run().await.unwrap();

    assert_eq!(fresh_summary.report.counts, reset_summary.report.counts);
}

#[rstest]
#[tokio::test]
async fn reset_removes_every_row(state: AppState) {
    let planner = state.seed_planner(SeedFixtures::default());
    planner.run().await.unwrap();

    let removed = planner.reset().await.unwrap();
    assert!(removed > 0);
    for table in Table::DEPENDENCY_ORDER {
        assert_eq!(state.store.count(table).await.unwrap(), 0, "{}", table);
    }
}

#[rstest]
#[tokio::test]
async fn missing_dependency_aborts_the_run(state: AppState) {
    // Usuário de um tipo de organização que o seed não cria.
    let mut fixtures = SeedFixtures::default();
    fixtures.organizations = vec![OrgType::Farmer];
    fixtures.users = vec![UserFixture {
        email: "lab@herbtrace.local".into(),
        name: "Lab".into(),
        role: UserRole::LabTechnician,
        org_type: OrgType::Labs,
    }];

    let err = state.seed_planner(fixtures).run().await.unwrap_err();
    assert!(matches!(err, AppError::DependencyMissing(_)), "{err}");

    // Grupos anteriores ficam no banco; nada depois da falha foi criado.
    assert_eq!(state.store.count(Table::Organizations).await.unwrap(), 1);
    assert_eq!(state.store.count(Table::CollectionEvents).await.unwrap(), 0);
}

#[rstest]
#[tokio::test]
async fn blobs_round_trip_unchanged(state: AppState) {
    let fixtures = SeedFixtures::default();
    let expected = fixtures.collections[0].custom_data.clone();
    state.seed_planner(fixtures).run().await.unwrap();

    let events = state.store.list_collection_events().await.unwrap();
    assert_eq!(events[0].custom_data, expected);
}

#[rstest]
#[tokio::test]
async fn qr_blob_is_stored_as_given(state: AppState) {
    let mut fixtures = SeedFixtures::default();
    let blob = json!({ "label": "cliente", "campaign": "x" });
    fixtures.qr_codes[0].custom_data = Some(blob.clone());
    fixtures.qr_codes[0].label = "lote".into();
    fixtures.qr_codes[1].custom_data = None;
    state.seed_planner(fixtures).run().await.unwrap();

    let qr_codes = state.store.list_qr_codes().await.unwrap();
    assert_eq!(qr_codes[0].custom_data, Some(blob));
    assert_eq!(qr_codes[0].label.as_deref(), Some("lote"));
    assert_eq!(qr_codes[1].custom_data, None);
}

#[rstest]
#[tokio::test]
async fn run_tag_marks_unique_append_only_columns(state: AppState) {
    let summary = state
        .seed_planner(SeedFixtures::default())
        .with_run_tag("t0001")
        .run()
        .await
        .unwrap();
    assert_eq!(summary.run_tag, "t0001");

    let goods = state.store.list_finished_goods().await.unwrap();
    assert!(goods.iter().any(|good| good.batch_number == "FG-t0001-001"));
    let qr_codes = state.store.list_qr_codes().await.unwrap();
    assert!(qr_codes.iter().all(|qr| qr.code.starts_with("QR-t0001-")));
    assert!(qr_codes.iter().all(|qr| qr.svg_data.as_deref().is_some_and(|svg| svg.contains("<svg"))));
}
