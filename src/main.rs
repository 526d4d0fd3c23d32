use anyhow::Context;
use clap::Parser;
use taskgate::{
    build_app, cli::Cli, utils::toml_config::LogFormat, AppState, TaskgateConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = TaskgateConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let level = if cli.verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    init_tracing(level, config.server.log_format);

    let secret = config.jwt_secret()?;
    let stores = config.database_provider().create_stores().await?;
    let addr = config.bind_address();

    let app = build_app(AppState::new(config, &secret, stores));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("taskgate listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
