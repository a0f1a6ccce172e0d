//! docsearch server binary: semantic search and vector CRUD over HTTP.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let config = ServerConfig::load()?;
    server::start_server(config).await?;

    Ok(())
}
