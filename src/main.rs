//! llm-batch-gateway - batch prompt gateway
//!
//! Runs the HTTP surface, the job consumer, or both.

#![allow(missing_docs)]

use clap::Parser;
use llm_batch_gateway::server;
use llm_batch_gateway::utils::logging;
use llm_batch_gateway::Role;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "gateway", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, env = "GATEWAY_CONFIG", default_value = "config/gateway.yaml")]
    config: PathBuf,

    /// Components to run in this process
    #[arg(long, value_enum, env = "GATEWAY_ROLE", default_value_t = Role::All)]
    role: Role,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init_tracing();

    match server::builder::run_server(&args.config, args.role).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Print error using Display (not Debug) to preserve newlines
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
