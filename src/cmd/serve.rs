use std::net::SocketAddr;
use std::sync::Arc;

use crate::api;
use crate::config::{AppConfig, validate_environment};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::llm::language_model_for;
use crate::infra::sqlite::SqliteTicketStore;

#[derive(Debug, Clone)]
pub struct ServeCommandArgs {
    pub bind: SocketAddr,
}

pub async fn run(args: ServeCommandArgs) -> AppResult<()> {
    let report = validate_environment();
    report.print();
    report.into_result()?;

    let config = AppConfig::from_env()?;
    let store = SqliteTicketStore::connect(&config.database_url).await?;
    let language_model = language_model_for(&config);
    if language_model.is_none() {
        tracing::warn!("no usable LLM provider configured; classification will return defaults");
    }

    let context = AppContext::new(config, Arc::new(store), language_model);
    let app = api::router(context);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!("listening on http://{}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
