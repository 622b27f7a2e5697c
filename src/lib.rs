pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod panel;
pub mod server;

use cli::Args;
use log::info;
use server::{ api::AppState, Server };
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr());
    info!("Public Directory: {}", args.public_dir);
    info!("Completion Model: {}", args.openai_model);
    info!("Completion Base URL: {}", args.openai_base_url.as_deref().unwrap_or("default"));
    info!("API Key Configured: {}", args.api_key().is_some());
    info!("Max Context Characters: {}", args.max_context_chars);
    info!("HTTPS Requested: {}", args.use_https);
    if args.use_https {
        info!("TLS Certificate Path: {}", args.tls_cert_path);
        info!("TLS Key Path: {}", args.tls_key_path);
    }
    info!("-------------------------");

    let state = AppState::from_args(&args)?;
    let server = Server::new(args, state);
    server.run().await?;

    Ok(())
}
