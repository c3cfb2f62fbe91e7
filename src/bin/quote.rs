use clap::Parser;
use rate_engine::adapters::catalog_source;
use rate_engine::adapters::http_catalog::HttpSettings;
use rate_engine::utils::logger;
use rate_engine::{CatalogHandle, PricingPolicy, RateResolver, ResolutionRequest};
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "quote")]
#[command(about = "Price a single shipment against a carrier rate catalog")]
struct Args {
    /// Directory holding carriers.csv, services.csv and rates.csv
    #[arg(long, default_value = "./catalog")]
    catalog_dir: String,

    /// Backend base URL; overrides --catalog-dir when set
    #[arg(long)]
    catalog_endpoint: Option<String>,

    #[arg(long)]
    service: String,

    #[arg(long, value_parser = parse_decimal)]
    weight: Decimal,

    /// Shipment quantity used for the volume discount
    #[arg(long, value_parser = parse_decimal)]
    volume: Option<Decimal>,

    #[arg(long, value_parser = parse_decimal)]
    volumetric_weight: Option<Decimal>,

    /// Promotional discount percentage; overrides the service promotion
    #[arg(long, value_parser = parse_decimal)]
    promo: Option<Decimal>,

    #[arg(long)]
    strict_price_floor: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|e| format!("'{}' is not a decimal number: {}", raw, e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let source = catalog_source(
        args.catalog_endpoint.as_deref(),
        &args.catalog_dir,
        HttpSettings::default(),
    )?;

    let catalog = CatalogHandle::default();
    if let Err(e) = catalog.refresh(source.as_ref()).await {
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let mut request = ResolutionRequest::new(args.service, args.weight);
    request.volume = args.volume;
    request.volumetric_weight = args.volumetric_weight;
    request.promotional_discount_pct = args.promo;

    let policy = PricingPolicy {
        strict_price_floor: args.strict_price_floor,
        ..PricingPolicy::default()
    };
    let resolver = RateResolver::new(catalog.current(), policy);

    match resolver.resolve(&request) {
        Ok(quote) => {
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        Err(failure) => {
            tracing::warn!("Quote for '{}' failed at {}", request.service_id, failure.step);
            println!("{}", serde_json::to_string_pretty(&failure)?);
            let exit_code = if failure.error.is_recoverable() { 2 } else { 1 };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
