//src/main.rs

use herbtrace::{config::AppState, handlers};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    herbtrace::init_tracing();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new().await.inspect_err(|e| {
        tracing::error!("🔥 Falha ao inicializar o estado da aplicação: {:#}", e);
    })?;

    let addr = app_state.config.health_addr.clone();
    let app = handlers::health::router(app_state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Health check ouvindo em {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
