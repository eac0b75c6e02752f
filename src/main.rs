use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use skinlog::cli::{self, Cli, Command};
use skinlog::config::Config;

async fn serve(app: axum::Router, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args = Cli::parse();
    let config = Config::from_env()?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let pool = skinlog::db::init_pool(&config.database_url).await?;
            let app = skinlog::build_app(pool, config.secure_cookies).await?;
            serve(app, config.bind_addr).await?;
        }
        Command::Memory { bind } => {
            tracing::info!("running in-memory tips list, nothing will be saved");
            serve(skinlog::build_memory_app(), bind.unwrap_or(config.bind_addr)).await?;
        }
        Command::CreateUser { username, password } => {
            let pool = skinlog::db::init_pool(&config.database_url).await?;
            let user = cli::create_user(&pool, &username, &password).await?;
            println!("Created user:");
            println!("  ID: {}", user.id);
            println!("  Username: {}", user.username);
        }
        Command::Import { file, username } => {
            let pool = skinlog::db::init_pool(&config.database_url).await?;
            let summary = cli::import_data(&pool, &file, &username).await?;
            println!(
                "Imported {} tips and {} plans, skipped {} invalid entries",
                summary.tips, summary.plans, summary.skipped
            );
        }
    }

    Ok(())
}
