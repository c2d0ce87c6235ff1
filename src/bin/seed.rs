use std::process::ExitCode;

use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use storefront::config::AppConfig;
use storefront::{db, seed};

fn main() -> ExitCode {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("storefront=info")),
        )
        .init();

    let settings = match AppConfig::load() {
        Ok(settings) => settings,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let result = db::open_storage(&settings)
        .map_err(seed::SeedError::from)
        .and_then(|storage| seed::seed(storage.as_ref(), &settings.seed));

    match result {
        Ok(summary) => {
            tracing::info!(
                admin_created = summary.admin_created,
                categories = summary.categories_created,
                products = summary.products_created,
                "database seeded"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "seed failed");
            ExitCode::FAILURE
        }
    }
}
