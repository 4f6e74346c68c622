// tests/idempotency.rs

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::state;
use herbtrace::{
    common::error::AppError,
    config::AppState,
    models::{
        admin::{AlertKey, AlertSeverity, AlertType, NewSystemAlert, SystemAlert},
        botanical::{HerbSpecies, NewHerbSpecies},
        organization::{NewOrganization, NewUser, OrgType, Organization, User, UserRole},
        Table,
    },
    services::IdempotencyGuard,
};
use rstest::rstest;

fn guard(state: &AppState) -> IdempotencyGuard {
    IdempotencyGuard::new(state.store.clone())
}

fn tulsi() -> NewHerbSpecies {
    NewHerbSpecies {
        common_name: "Tulsi".into(),
        scientific_name: "Ocimum tenuiflorum".into(),
        family: Some("Lamiaceae".into()),
        description: None,
    }
}

#[rstest]
#[tokio::test]
async fn existing_row_skips_the_constructor(state: AppState) {
    let existing = common::organization(state.store.as_ref(), OrgType::Labs).await;
    let calls = AtomicUsize::new(0);

    let ensured = guard(&state)
        .ensure::<Organization, _, _>(&OrgType::Labs, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>(NewOrganization::default_for(OrgType::Labs))
        })
        .await
        .unwrap();

    assert!(!ensured.was_created());
    assert_eq!(ensured.get().id, existing.id);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(state.store.count(Table::Organizations).await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn second_ensure_returns_the_same_row(state: AppState) {
    let guard = guard(&state);
    let build = || async { Ok::<_, AppError>(NewOrganization::default_for(OrgType::Manufacturer)) };

    let first = guard.ensure::<Organization, _, _>(&OrgType::Manufacturer, build).await.unwrap();
    let second = guard.ensure::<Organization, _, _>(&OrgType::Manufacturer, build).await.unwrap();

    assert!(first.was_created());
    assert!(!second.was_created());
    assert_eq!(first.into_inner().id, second.into_inner().id);
}

#[rstest]
#[tokio::test]
async fn constructor_must_build_the_searched_key(state: AppState) {
    let err = guard(&state)
        .ensure::<Organization, _, _>(&OrgType::Farmer, || async {
            Ok::<_, AppError>(NewOrganization::default_for(OrgType::Admin))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)), "{err}");
    assert_eq!(state.store.count(Table::Organizations).await.unwrap(), 0);
}

#[rstest]
#[tokio::test]
async fn email_lookup_ignores_case(state: AppState) {
    let store = state.store.as_ref();
    let org = common::organization(store, OrgType::Admin).await;
    let existing = common::user(store, &org, "admin@herbtrace.local", UserRole::Admin).await;

    let key = "Admin@HerbTrace.local".to_string();
    let ensured = guard(&state)
        .ensure::<User, _, _>(&key, || async {
            Ok::<_, AppError>(NewUser::for_organization(&org, &key, "Admin", UserRole::Admin, "hash".into()))
        })
        .await
        .unwrap();

    assert!(!ensured.was_created());
    assert_eq!(ensured.get().id, existing.id);
}

#[rstest]
#[tokio::test]
async fn direct_duplicate_user_is_rejected(state: AppState) {
    let store = state.store.as_ref();
    let org = common::organization(store, OrgType::Farmer).await;
    common::user(store, &org, "produtor@teste.com", UserRole::Farmer).await;

    let again = NewUser::for_organization(&org, "produtor@teste.com", "Outro", UserRole::Farmer, "hash".into());
    let err = store.create_user(&again).await.unwrap_err();

    assert!(matches!(err, AppError::DuplicateKey { entity: "User", .. }), "{err}");
    assert_eq!(store.count(Table::Users).await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn direct_duplicate_alert_is_rejected(state: AppState) {
    let store = state.store.as_ref();
    let new = NewSystemAlert::open("Estoque baixo", AlertType::LowStock, AlertSeverity::Medium, "Reabastecer");
    store.create_system_alert(&new).await.unwrap();

    let err = store.create_system_alert(&new).await.unwrap_err();

    assert!(matches!(err, AppError::DuplicateKey { entity: "SystemAlert", .. }), "{err}");
    assert_eq!(store.count(Table::SystemAlerts).await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn email_uniqueness_ignores_case_in_the_store(state: AppState) {
    let store = state.store.as_ref();
    let org = common::organization(store, OrgType::Farmer).await;
    let existing = common::user(store, &org, "produtor@teste.com", UserRole::Farmer).await;

    let mut shouted = NewUser::for_organization(&org, "outro@teste.com", "Outro", UserRole::Farmer, "hash".into());
    shouted.email = "PRODUTOR@Teste.com".into();
    let err = store.create_user(&shouted).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateKey { entity: "User", .. }), "{err}");

    let found = store.find_user_by_email("Produtor@TESTE.com").await.unwrap().unwrap();
    assert_eq!(found.id, existing.id);
}

#[rstest]
#[tokio::test]
async fn species_upsert_reports_whether_it_inserted(state: AppState) {
    let store = state.store.as_ref();
    let (first, inserted) = store.upsert_herb_species(&tulsi()).await.unwrap();
    assert!(inserted);

    let (again, inserted_again) = store.upsert_herb_species(&tulsi()).await.unwrap();
    assert!(!inserted_again);
    assert_eq!(first.id, again.id);
}

#[rstest]
#[tokio::test]
async fn invalid_payload_is_not_persisted(state: AppState) {
    let store = state.store.as_ref();
    let org = common::organization(store, OrgType::Farmer).await;

    let key = "sem-arroba".to_string();
    let err = guard(&state)
        .ensure::<User, _, _>(&key, || async {
            Ok::<_, AppError>(NewUser::for_organization(&org, &key, "Sem E-mail", UserRole::Farmer, "hash".into()))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidPayload(_)), "{err}");
    assert_eq!(store.count(Table::Users).await.unwrap(), 0);
}

#[rstest]
#[tokio::test]
async fn concurrent_species_ensures_share_one_row(state: AppState) {
    let guard = guard(&state);
    let key = tulsi().scientific_name;
    let build = || async { Ok::<_, AppError>(tulsi()) };

    let (a, b) = tokio::try_join!(
        guard.ensure::<HerbSpecies, _, _>(&key, build),
        guard.ensure::<HerbSpecies, _, _>(&key, build),
    )
    .unwrap();

    assert_eq!(a.get().id, b.get().id);
    assert_eq!([&a, &b].iter().filter(|e| e.was_created()).count(), 1);
    assert_eq!(state.store.count(Table::HerbSpecies).await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn alerts_are_keyed_by_title_and_type(state: AppState) {
    let guard = guard(&state);
    let open = |alert_type| NewSystemAlert::open("Estoque baixo", alert_type, AlertSeverity::Medium, "Reabastecer");

    let key = AlertKey { title: "Estoque baixo".into(), alert_type: AlertType::LowStock };
    let first = guard
        .ensure::<SystemAlert, _, _>(&key, || async { Ok::<_, AppError>(open(AlertType::LowStock)) })
        .await
        .unwrap();
    let again = guard
        .ensure::<SystemAlert, _, _>(&key, || async { Ok::<_, AppError>(open(AlertType::LowStock)) })
        .await
        .unwrap();

    let other_key = AlertKey { title: "Estoque baixo".into(), alert_type: AlertType::ExpiryWarning };
    let other = guard
        .ensure::<SystemAlert, _, _>(&other_key, || async { Ok::<_, AppError>(open(AlertType::ExpiryWarning)) })
        .await
        .unwrap();

    assert!(first.was_created());
    assert!(!again.was_created());
    assert!(other.was_created());
    assert_eq!(state.store.count(Table::SystemAlerts).await.unwrap(), 2);
}
