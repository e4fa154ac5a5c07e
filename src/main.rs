use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use formflow::api::{build_router, AppState};
use formflow::config::AppConfig;
use formflow::database::Database;
use formflow::mail::mailer_from_config;
use formflow::templates::seed_preset_templates;

#[derive(Parser)]
#[command(name = "formflow")]
#[command(about = "FormFlow survey builder server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (defaults to ./formflow.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
    /// Insert the preset template catalogue if it is missing, then exit
    SeedTemplates,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formflow=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server_host = host;
    }
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    info!("Configuration loaded");

    let database = Database::new(&config.database_url).await?;
    database.run_migrations().await?;
    info!("Database migrations completed");

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Migrate => Ok(()),
        Commands::SeedTemplates => {
            let inserted = seed_preset_templates(&database).await?;
            info!("{} preset templates inserted", inserted);
            Ok(())
        }
        Commands::Serve => serve(config, database).await,
    }
}

async fn serve(config: AppConfig, database: Database) -> anyhow::Result<()> {
    if config.seed_templates {
        seed_preset_templates(&database).await?;
    }

    let mailer = mailer_from_config(&config.mail)?;
    let addr = config.bind_address();
    let app = build_router(AppState::new(config, database, mailer));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("FormFlow listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
