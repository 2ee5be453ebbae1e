use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "inbox-runner", about = "Flepz notification inbox", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply migrations and serve the HTTP API (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Insert sample order, invoice and shipping notifications
    Seed(SeedArgs),
    /// Mint a bearer token for local testing
    Token(TokenArgs),
}

#[derive(Args)]
pub struct SeedArgs {
    #[arg(long, env = "SEED_RECIPIENT", default_value = "test@example.com")]
    pub recipient: String,
}

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long)]
    pub user_id: String,
    #[arg(long)]
    pub email: String,
    /// Overrides TOKEN_TTL_DAYS
    #[arg(long)]
    pub days: Option<u64>,
}
