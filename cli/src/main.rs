//! convoy - idempotent single-host deploys

use clap::Parser;

use convoy_cli::cli::Cli;
use convoy_cli::domain::error::DeployError;
use convoy_cli::output::json;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = cli.run().await {
        let code = e
            .downcast_ref::<DeployError>()
            .map_or("internal", DeployError::code);
        match json::format_error(&format!("{e:#}"), code) {
            Ok(text) if json_mode => println!("{text}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}
