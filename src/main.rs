use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use apply_core::constants::{DEFAULT_REST_ADDR, REST_ADDR_ENV, TEMPLATE_DIR_ENV};
use apply_core::{CoreConfig, resolve_template_dir};

/// Main entry point for the apply REST runner
///
/// Serves `ActivityDefinition/{id}/$apply` over HTTP with templates read from a directory.
///
/// # Environment Variables
/// - `APPLY_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `APPLY_TEMPLATE_DIR`: template directory (default: `activity-definitions/`, searched from
///   the working directory upwards)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the template directory cannot be resolved,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("apply_run=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var(REST_ADDR_ENV).unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let template_override = std::env::var(TEMPLATE_DIR_ENV).ok().map(PathBuf::from);
    let cfg = Arc::new(CoreConfig::new(resolve_template_dir(template_override)?)?);

    tracing::info!("++ Serving templates from {}", cfg.template_dir().display());
    tracing::info!("++ Starting apply REST on {}", rest_addr);

    let app = api_rest::router(AppState::from_config(&cfg));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
