use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_stub::StubState;

/// Main entry point for the Folio development API
///
/// Serves the in-memory portfolio API that the editor and the `folio` CLI talk to.
///
/// # Environment Variables
/// - `FOLIO_STUB_ADDR`: Server address (default: "0.0.0.0:5000")
/// - `FOLIO_STUB_TOKEN`: Bearer token accepted on `/portfolio/**` (default: "dev-token")
/// - `FOLIO_UPLOAD_DIR`: Directory uploaded images are written to (default: "uploads")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the upload directory cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("folio=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("FOLIO_STUB_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".into());
    let token = std::env::var("FOLIO_STUB_TOKEN").unwrap_or_else(|_| "dev-token".into());
    let upload_dir = std::env::var("FOLIO_UPLOAD_DIR").unwrap_or_else(|_| "uploads".into());

    let state = StubState::open(token, &upload_dir)?;
    tracing::info!("++ Storing uploads in {}", state.images().root().display());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("++ Starting Folio stub API on {}", listener.local_addr()?);
    folio_stub::serve(listener, state).await?;

    Ok(())
}
