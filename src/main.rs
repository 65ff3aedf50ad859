use std::error::Error;

use tracing::{Level, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file when present.
    // A malformed .env is still an error.
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(err) if err.not_found() => {}
        Err(err) => return Err(err.into()),
    }

    ai_llm_service::telemetry::init("info", Level::INFO)?;
    info!("starting vittcott backend");

    api::start().await?;

    Ok(())
}
