use clap::Parser;
use rate_engine::adapters::catalog_source;
use rate_engine::utils::error::ErrorSeverity;
use rate_engine::utils::{logger, validation::Validate};
use rate_engine::{BatchQuotePipeline, CatalogHandle, CliConfig, LocalStorage, QuoteEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting rate-engine batch run");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let catalog = CatalogHandle::default();
    let loaded = match catalog_source(
        config.catalog_endpoint.as_deref(),
        &config.catalog_dir,
        config.http_settings(),
    ) {
        Ok(source) => catalog.refresh(source.as_ref()).await,
        Err(e) => Err(e),
    };
    if let Err(e) = loaded {
        tracing::error!("❌ Catalog could not be loaded: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    for problem in catalog.current().invalid_band_sets() {
        tracing::warn!("⚠️  {}", problem);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(".");
    let pipeline = BatchQuotePipeline::new(storage, config, catalog);
    let engine = QuoteEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Batch completed");
            println!("✅ Quotes written to {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Batch failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
