use clap::Parser;
use rate_engine::adapters::catalog_source;
use rate_engine::config::toml_config::{CatalogSourceKind, LogFormat, TomlConfig};
use rate_engine::core::ConfigProvider;
use rate_engine::utils::error::ErrorSeverity;
use rate_engine::utils::{logger, validation::Validate};
use rate_engine::{BatchQuotePipeline, CatalogHandle, CatalogSnapshot, LocalStorage, QuoteEngine};

#[derive(Parser)]
#[command(name = "toml-batch")]
#[command(about = "Batch quoting driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "rate-engine.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Load and check the catalog without pricing any requests
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    match config.log_format() {
        LogFormat::Json => logger::init_json_logger(args.verbose),
        LogFormat::Compact => logger::init_cli_logger(args.verbose),
    }

    tracing::info!("🚀 Starting TOML-based batch quoting");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    let catalog = CatalogHandle::default();
    let source = catalog_source(
        config.catalog_endpoint(),
        config.catalog_dir(),
        config.http_settings(),
    )?;
    if let Err(e) = catalog.refresh(source.as_ref()).await {
        tracing::error!("❌ Catalog could not be loaded: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No quotes will be written");
        perform_dry_run(&catalog.current());
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
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

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    match config.catalog.source {
        CatalogSourceKind::Http => {
            println!("  Catalog: {}", config.catalog_endpoint().unwrap_or("-"))
        }
        CatalogSourceKind::Csv => println!("  Catalog: {}", config.catalog_dir()),
    }
    println!("  Requests: {}", config.requests_file());
    println!("  Output: {}/{}", config.output_path(), config.archive_name());

    let policy = config.pricing_policy();
    println!("  Currency scale: {}", policy.currency_scale);
    println!(
        "  Margin classes: high >= {}, medium >= {}",
        policy.margin_thresholds.high, policy.margin_thresholds.medium
    );
    println!("  Strict price floor: {}", policy.strict_price_floor);

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(snapshot: &CatalogSnapshot) {
    println!("🔍 Dry Run Analysis:");
    println!("  Carriers: {}", snapshot.carrier_count());
    println!("  Services: {}", snapshot.service_count());

    let invalid = snapshot.invalid_band_sets();
    if invalid.is_empty() {
        println!("  ✅ Every service has a contiguous band set");
    } else {
        println!("  ⚠️ {} service(s) cannot be quoted:", invalid.len());
        for error in invalid {
            println!("    - {}", error);
        }
    }

    println!();
    println!("✅ Dry run analysis complete.");
}
