use fibcalc_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fibcalc_observability::init();

    let config = AppConfig::from_env()?;
    let app = fibcalc_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        persistent = config.use_persistent_stores,
        max_index = config.max_index.max(),
        "listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}
