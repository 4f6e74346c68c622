// tests/linker.rs

mod common;

use common::state;
use herbtrace::{
    common::error::AppError,
    config::AppState,
    models::{
        organization::{OrgType, UserRole},
        quality::LabTestSubject,
        traceability::{DocumentType, EntityKind, EntityRef, LinkedTable, NewDocument},
    },
    services::{
        fixtures::{SeedFixtures, TestOutcome},
        linker::{LinkOutcome, SkipReason},
        seed_planner::SeedStep,
        PolymorphicLinker,
    },
};
use rstest::rstest;
use uuid::Uuid;

fn linker(state: &AppState) -> PolymorphicLinker {
    PolymorphicLinker::new(state.store.clone())
}

// -----------------------------------------------------------------------------
// Coleta -> lote
// -----------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn extra_collection_event_stays_unlinked(state: AppState) {
    let store = state.store.as_ref();
    let farmer = common::farmer(store).await;
    let herb = common::species(store, "Withania somnifera").await;

    let mut events = Vec::new();
    for _ in 0..3 {
        events.push(common::collection_event(store, &farmer, &herb).await);
    }
    let batches = vec![
        common::batch(store, &farmer, "Ashwagandha").await,
        common::batch(store, &farmer, "Tulsi").await,
    ];

    let linked = linker(&state).link_collection_events(&events, &batches).await.unwrap();
    assert_eq!(linked.len(), 2);

    let stored = store.list_collection_events().await.unwrap();
    assert_eq!(stored[0].batch_id, Some(batches[0].id));
    assert_eq!(stored[1].batch_id, Some(batches[1].id));
    assert_eq!(stored[2].batch_id, None);
}

#[rstest]
#[tokio::test]
async fn collection_pass_keeps_existing_links(state: AppState) {
    let store = state.store.as_ref();
    let farmer = common::farmer(store).await;
    let herb = common::species(store, "Curcuma longa").await;
    let event = common::collection_event(store, &farmer, &herb).await;
    let first = common::batch(store, &farmer, "Cúrcuma").await;
    let second = common::batch(store, &farmer, "Cúrcuma B").await;

    let already = store.set_collection_event_batch(event.id, second.id).await.unwrap();
    let linked = linker(&state).link_collection_events(&[already], &[first]).await.unwrap();

    assert!(linked.is_empty());
    let stored = store.list_collection_events().await.unwrap();
    assert_eq!(stored[0].batch_id, Some(second.id));
}

#[rstest]
#[tokio::test]
async fn seed_links_min_of_events_and_batches(state: AppState) {
    let summary = state.seed_planner(SeedFixtures::default()).run().await.unwrap();
    let step = summary.step(SeedStep::RawMaterialBatches).unwrap();
    assert_eq!((step.linked, step.skipped), (2, 1));

    let events = state.store.list_collection_events().await.unwrap();
    assert_eq!(events.iter().filter(|e| e.batch_id.is_some()).count(), 2);
    assert!(events[2].batch_id.is_none());
}

// -----------------------------------------------------------------------------
// QR codes
// -----------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn qr_code_points_at_each_kind(state: AppState) {
    let store = state.store.as_ref();
    let farmer = common::farmer(store).await;
    let batch = common::batch(store, &farmer, "Bacopa").await;
    let good = common::good(store, &farmer, "FG-T-001").await;
    let test = common::lab_test(store, &farmer, LabTestSubject::FinishedGood(good.id), true).await;

    let targets = [EntityRef::RawMaterialBatch(batch.id), EntityRef::FinishedGood(good.id), EntityRef::LabTest(test.id)];
    for (i, target) in targets.iter().enumerate() {
        let qr = common::qr_code(store, &format!("QR-T-{i}")).await;
        let outcome = linker(&state).link(LinkedTable::QrCodes, qr.id, Some(*target)).await.unwrap();
        assert_eq!(outcome, LinkOutcome::Linked(*target));
    }

    let qr_codes = store.list_qr_codes().await.unwrap();
    for (qr, target) in qr_codes.iter().zip(targets) {
        assert_eq!(qr.columns().target().unwrap(), Some(target));
        assert_eq!(qr.entity_id, Some(target.id()));
    }
    assert_eq!(qr_codes[2].entity_type, Some(EntityKind::LabTest));
    assert_eq!(qr_codes[2].raw_material_batch_id, None);
    assert_eq!(qr_codes[2].finished_good_id, None);
}

#[rstest]
#[tokio::test]
async fn qr_code_skips_lab_test_that_is_not_completed(state: AppState) {
    let store = state.store.as_ref();
    let farmer = common::farmer(store).await;
    let test = common::lab_test(store, &farmer, LabTestSubject::PendingSample, false).await;
    let qr = common::qr_code(store, "QR-T-PENDING").await;

    let outcome = linker(&state)
        .link(LinkedTable::QrCodes, qr.id, Some(EntityRef::LabTest(test.id)))
        .await
        .unwrap();

    assert_eq!(outcome, LinkOutcome::Skipped(SkipReason::LabTestNotCompleted));
    let stored = &store.list_qr_codes().await.unwrap()[0];
    assert_eq!(stored.columns().target().unwrap(), None);
}

#[rstest]
#[tokio::test]
async fn seed_without_completed_test_leaves_third_qr_unlinked(state: AppState) {
    let mut fixtures = SeedFixtures::default();
    for test in &mut fixtures.lab_tests {
        test.outcome = TestOutcome::Pending;
    }
    state.seed_planner(fixtures).run().await.unwrap();

    let qr_codes = state.store.list_qr_codes().await.unwrap();
    assert_eq!(qr_codes.len(), 3);
    assert!(qr_codes[0].raw_material_batch_id.is_some());
    assert!(qr_codes[1].finished_good_id.is_some());

    let third = &qr_codes[2];
    assert_eq!(third.entity_type, None);
    assert_eq!(third.entity_id, None);
    assert_eq!(third.lab_test_id, None);
}

#[rstest]
#[tokio::test]
async fn seed_links_third_qr_to_completed_test(state: AppState) {
    state.seed_planner(SeedFixtures::default()).run().await.unwrap();

    let qr_codes = state.store.list_qr_codes().await.unwrap();
    let third = &qr_codes[2];
    let test_id = third.lab_test_id.expect("QR ligado ao teste");
    let test = state.store.find_lab_test(test_id).await.unwrap().unwrap();
    assert!(test.is_completed());
    assert_eq!(third.entity_type, Some(EntityKind::LabTest));
}

#[rstest]
#[tokio::test]
async fn relinking_replaces_every_column(state: AppState) {
    let store = state.store.as_ref();
    let farmer = common::farmer(store).await;
    let batch = common::batch(store, &farmer, "Tulsi").await;
    let good = common::good(store, &farmer, "FG-T-002").await;
    let qr = common::qr_code(store, "QR-T-RELINK").await;

    let linker = linker(&state);
    linker.link(LinkedTable::QrCodes, qr.id, Some(EntityRef::RawMaterialBatch(batch.id))).await.unwrap();
    linker.link(LinkedTable::QrCodes, qr.id, Some(EntityRef::FinishedGood(good.id))).await.unwrap();

    let stored = &store.list_qr_codes().await.unwrap()[0];
    assert_eq!(stored.raw_material_batch_id, None);
    assert_eq!(stored.finished_good_id, Some(good.id));
    assert_eq!(stored.columns().target().unwrap(), Some(EntityRef::FinishedGood(good.id)));

    linker.unlink(LinkedTable::QrCodes, qr.id).await.unwrap();
    let cleared = &store.list_qr_codes().await.unwrap()[0];
    assert_eq!(cleared.columns().target().unwrap(), None);
}

// -----------------------------------------------------------------------------
// Alvos inválidos
// -----------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn missing_target_is_skipped(state: AppState) {
    let qr = common::qr_code(state.store.as_ref(), "QR-T-GHOST").await;
    let ghost = EntityRef::FinishedGood(Uuid::new_v4());

    let outcome = linker(&state).link(LinkedTable::QrCodes, qr.id, Some(ghost)).await.unwrap();
    assert_eq!(outcome, LinkOutcome::Skipped(SkipReason::TargetNotFound));

    let missing_test = EntityRef::LabTest(Uuid::new_v4());
    let outcome = linker(&state).link(LinkedTable::QrCodes, qr.id, Some(missing_test)).await.unwrap();
    assert_eq!(outcome, LinkOutcome::Skipped(SkipReason::TargetNotFound));
}

#[rstest]
#[tokio::test]
async fn no_target_is_skipped(state: AppState) {
    let qr = common::qr_code(state.store.as_ref(), "QR-T-NONE").await;
    let outcome = linker(&state).link(LinkedTable::QrCodes, qr.id, None).await.unwrap();
    assert_eq!(outcome, LinkOutcome::Skipped(SkipReason::NoTarget));
}

#[rstest]
#[tokio::test]
async fn document_rejects_lab_test_target(state: AppState) {
    let store = state.store.as_ref();
    let org = common::organization(store, OrgType::Labs).await;
    let tech = common::user(store, &org, "lab@teste.com", UserRole::LabTechnician).await;
    let test = common::lab_test(store, &tech, LabTestSubject::PendingSample, true).await;
    let document = store
        .create_document(&NewDocument {
            title: "Laudo".into(),
            document_type: DocumentType::LabReport,
            file_url: "https://files.herbtrace.local/laudo.pdf".into(),
            uploaded_by: tech.id,
            metadata: None,
        })
        .await
        .unwrap();

    let err = linker(&state)
        .link(LinkedTable::Documents, document.id, Some(EntityRef::LabTest(test.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "{err}");

    let stored = &store.list_documents().await.unwrap()[0];
    assert_eq!((stored.raw_material_batch_id, stored.finished_good_id), (None, None));
}

#[rstest]
#[tokio::test]
async fn required_links_cannot_be_cleared(state: AppState) {
    let err = linker(&state)
        .unlink(LinkedTable::SupplyChainEvents, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
