mod cli;
mod seed;

use anyhow::Result;
use clap::Parser;
use inbox_api::auth::generate_token;
use inbox_api::run as run_api;
use inbox_core::db::{create_pool, run_migrations};
use inbox_core::{Config, InboxContext, StoreBackend};
use tracing;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => {
            if config.store != StoreBackend::Postgres {
                tracing::info!("In-memory store has no schema to migrate");
                return Ok(());
            }
            // Waits out a database that is still starting before migrating.
            create_pool(&config.database).await?;
            run_migrations(&config.database.url).await
        }
        Command::Seed(args) => seed::run(&config, &args.recipient).await,
        Command::Token(args) => {
            let days = args.days.unwrap_or(config.server.token_ttl_days);
            let token = generate_token(&args.user_id, &args.email, &config.server.jwt_secret, days)?;
            println!("{}", token);
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    tracing::info!("Starting Flepz inbox");

    let ctx = InboxContext::new(config).await?;
    tracing::info!("Inbox context initialized");

    tokio::select! {
        result = run_api(ctx) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
