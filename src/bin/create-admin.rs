//! Bootstrap an admin account.

use std::process::ExitCode;

use clap::Parser;
use sitedesk::db::{self, DbConfig, PgStore};
use sitedesk::logging::{self, LogConfig};
use sitedesk::maintenance::bootstrap_admin;

#[derive(Parser)]
#[command(author, version, about = "Create an admin account")]
struct Cli {
    username: String,
    /// Falls back to ADMIN_PASSWORD.
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
    #[arg(long, default_value_t = bcrypt::DEFAULT_COST)]
    cost: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guards = logging::init(&LogConfig::from_env());
    let cli = Cli::parse();

    let pool = match db::init_pool(&DbConfig::from_env(cli.database_url)).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Database connection failed: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = db::run_migrations(&pool).await {
        eprintln!("Migrations failed: {e}");
        return ExitCode::FAILURE;
    }

    let store = PgStore::new(pool);
    match bootstrap_admin(&store, &cli.username, &cli.password, cli.cost).await {
        Ok(admin) => {
            println!("Created admin `{}` ({})", admin.username, admin.id);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Could not create admin: {e}");
            ExitCode::FAILURE
        }
    }
}
