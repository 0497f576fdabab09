use anyhow::Result;
use bayond_site::config::Config;
use bayond_site::i18n::BundleValidator;
use bayond_site::server::{self, AppState};
use bayond_site::store;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bayond_site=info".parse()?),
        )
        .init();

    info!("Starting Bayond site server");

    let config = Config::from_env()?;
    info!(
        default_locale = %config.default_locale,
        locale_detection = config.locale_detection,
        "Configuration loaded"
    );

    let store = store::connect_store(&config).await?;
    let state = AppState::new(config, store)?;

    let report = BundleValidator::validate(&state.messages, &state.registry);
    for warning in &report.warnings {
        warn!("Translation bundle: {}", warning);
    }
    if report.has_errors() {
        for error in &report.errors {
            error!("Translation bundle error: {}", error);
        }
    } else {
        info!("Translation bundles validated");
    }

    server::serve(state).await
}
