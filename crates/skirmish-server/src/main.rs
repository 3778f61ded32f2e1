//! Skirmish arena server.

use skirmish::SkirmishServerBuilder;
use skirmish_arena::Arena;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("skirmish server v{}", env!("CARGO_PKG_VERSION"));

    let path = std::env::var("SKIRMISH_CONFIG")
        .unwrap_or_else(|_| config::DEFAULT_CONFIG_PATH.to_string());
    let config = config::Config::load(&path)?;
    info!(
        bind = %config.server.bind,
        max_clients = config.arena.max_clients,
        colors = config.arena.colors_length,
        field_size = config.arena.field_size,
        "configuration ready"
    );

    let server = SkirmishServerBuilder::new()
        .settings(config.server)
        .build::<Arena>(config.arena)
        .await?;
    info!(addr = %server.local_addr()?, "listening");

    server.run().await?;
    Ok(())
}
