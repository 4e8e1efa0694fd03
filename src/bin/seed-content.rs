//! Populate a running server with sample content or an archived snapshot.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sitedesk::logging::{self, LogConfig};
use sitedesk::seed::{load_snapshot, sample_plan, SeedClient, SeedError};

#[derive(Parser)]
#[command(author, version, about = "Seed site content through the API")]
struct Cli {
    #[arg(long, env = "SEED_BASE_URL", default_value = "http://127.0.0.1:3001")]
    base_url: String,
    /// JSON snapshot of an archived site; fixed samples are used without it.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    #[arg(long, env = "ADMIN_USERNAME")]
    username: String,
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
}

async fn seed(cli: Cli) -> Result<(), SeedError> {
    let plan = match &cli.snapshot {
        Some(path) => load_snapshot(path)?,
        None => sample_plan(),
    };
    let mut client = SeedClient::new(&cli.base_url);
    client.login(&cli.username, &cli.password).await?;
    let report = client.seed(&plan).await?;
    println!(
        "Seeded {} document(s) and {} singleton(s)",
        report.created, report.singletons
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guards = logging::init(&LogConfig::from_env());

    match seed(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Seeding failed: {e}");
            ExitCode::FAILURE
        }
    }
}
