// src/bin/seed.rs

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

    match app_state.seed_planner(SeedFixtures::default()).run().await {
        Ok(summary) => {
            for step in &summary.steps {
                tracing::info!(
                    "   {:<28} criados {:>3} | reaproveitados {:>3} | vinculados {:>3} | pulados {:>3}",
                    step.step.label(),
                    step.created,
                    step.reused,
                    step.linked,
                    step.skipped
                );
            }
            ExitCode::SUCCESS
        }
        // A etapa que falhou já foi logada pelo planner.
        Err(_) => ExitCode::FAILURE,
    }
}
