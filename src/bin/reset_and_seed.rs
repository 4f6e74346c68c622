// src/bin/reset_and_seed.rs

use std::process::ExitCode;

use herbtrace::{config::AppState, services::fixtures::SeedFixtures};

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

    tracing::warn!("⚠️ Reset completo: todas as tabelas serão esvaziadas");
    match app_state.seed_planner(SeedFixtures::default()).reset_and_run().await {
        Ok(summary) => {
            let organizations = summary.report.count(herbtrace::models::Table::Organizations);
            tracing::info!("✅ Banco recriado ({} organizações, execução {})", organizations, summary.run_tag);
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}
