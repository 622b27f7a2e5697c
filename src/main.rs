use clap::Parser;
use dotenv::dotenv;
use mail_draft_relay::{ cli::Args, run };
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    run(args).await
}
