use std::error::Error;

use tracing::{Level, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; variables may come from the environment.
    let dotenv = dotenvy::dotenv();

    scm_gitlab::telemetry::init("info", Level::INFO)?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "failed to read .env"),
    }

    api::start().await?;

    Ok(())
}
