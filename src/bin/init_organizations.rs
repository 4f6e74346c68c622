// src/bin/init_organizations.rs

use std::process::ExitCode;

use herbtrace::{config::AppState, models::organization::OrgType, services::fixtures::SeedFixtures};

#[tokio::main]
async fn main() -> ExitCode {
    herbtrace::init_tracing();

    let app_state = match AppState::new().await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("🔥 Falha ao inicializar o estado da aplicação: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let planner = app_state.seed_planner(SeedFixtures::organizations_only(&OrgType::ALL));
    match planner.ensure_default_organizations(&OrgType::ALL).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
