//! Assign slugs to blog posts and case studies stored without one.

use std::process::ExitCode;

use clap::Parser;
use sitedesk::db::{self, DbConfig, PgStore};
use sitedesk::logging::{self, LogConfig};
use sitedesk::maintenance::backfill_slugs;

#[derive(Parser)]
#[command(author, version, about = "Backfill missing slugs")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
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

    match backfill_slugs(&PgStore::new(pool)).await {
        Ok(count) => {
            println!("Backfilled {count} slug(s)");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Backfill failed: {e}");
            ExitCode::FAILURE
        }
    }
}
