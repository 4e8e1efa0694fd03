//! Sitedesk - binary entry point
//! Delegates to the library for all app logic.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match sitedesk::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sitedesk: {e}");
            ExitCode::FAILURE
        }
    }
}
