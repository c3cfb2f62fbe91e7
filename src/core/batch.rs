use crate::core::adjustments::round_money;
use crate::core::catalog::CatalogHandle;
use crate::core::resolver::RateResolver;
use crate::core::{BatchResult, BatchSummary, ConfigProvider, Pipeline, QuoteLine, QuoteOutcome, Storage};
use crate::domain::quote::ResolutionRequest;
use crate::utils::error::{EngineError, Result};
use crate::utils::validation::{parse_decimal_field, parse_optional_decimal_field};
use serde::Deserialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

const QUOTE_HEADER: [&str; 17] = [
    "reference",
    "service_id",
    "carrier_id",
    "effective_weight",
    "weight_basis",
    "band_min",
    "band_max",
    "base_price",
    "fuel_surcharge",
    "volume_discount",
    "promotional_discount",
    "final_price",
    "purchase_price",
    "margin",
    "margin_pct",
    "margin_class",
    "clamped",
];

const FAILURE_HEADER: [&str; 5] = ["reference", "service_id", "step_failed", "error_kind", "message"];

#[derive(Debug, Deserialize)]
struct RequestRow {
    reference: Option<String>,
    service_id: String,
    weight: String,
    volume: Option<String>,
    volumetric_weight: Option<String>,
    promotional_discount_pct: Option<String>,
}

/// Prices a CSV of shipment requests against the current catalog snapshot
/// and writes the results as a zip archive.
pub struct BatchQuotePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    catalog: CatalogHandle,
}

impl<S: Storage, C: ConfigProvider> BatchQuotePipeline<S, C> {
    pub fn new(storage: S, config: C, catalog: CatalogHandle) -> Self {
        Self {
            storage,
            config,
            catalog,
        }
    }

    fn parse_requests(&self, data: &[u8]) -> Result<Vec<QuoteLine>> {
        let file = self.config.requests_file();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data);

        let mut lines = Vec::new();
        for (idx, row) in reader.deserialize::<RequestRow>().enumerate() {
            let row = row?;
            // header is line 1
            let line_no = idx + 2;
            let field = |name: &str| format!("{}:{} {}", file, line_no, name);

            let request = ResolutionRequest {
                service_id: row.service_id,
                weight: parse_decimal_field(&field("weight"), &row.weight)?,
                volume: parse_optional_decimal_field(&field("volume"), row.volume.as_deref())?,
                volumetric_weight: parse_optional_decimal_field(
                    &field("volumetric_weight"),
                    row.volumetric_weight.as_deref(),
                )?,
                promotional_discount_pct: parse_optional_decimal_field(
                    &field("promotional_discount_pct"),
                    row.promotional_discount_pct.as_deref(),
                )?,
            };

            let reference = row
                .reference
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| format!("line-{}", line_no));
            lines.push(QuoteLine { reference, request });
        }

        Ok(lines)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for BatchQuotePipeline<S, C> {
    async fn extract(&self) -> Result<Vec<QuoteLine>> {
        tracing::debug!("Reading quote requests from {}", self.config.requests_file());
        let data = self.storage.read_file(self.config.requests_file()).await?;
        let lines = self.parse_requests(&data)?;

        if lines.is_empty() {
            tracing::warn!("Request file {} has no rows", self.config.requests_file());
        }
        Ok(lines)
    }

    async fn transform(&self, lines: Vec<QuoteLine>) -> Result<BatchResult> {
        let policy = self.config.pricing_policy();
        let scale = policy.currency_scale;
        let resolver = RateResolver::new(self.catalog.current(), policy);

        let outcomes: Vec<QuoteOutcome> = lines
            .into_iter()
            .map(|line| {
                let result = resolver.resolve(&line.request);
                if let Err(failure) = &result {
                    tracing::debug!(reference = %line.reference, "{}", failure);
                }
                QuoteOutcome {
                    reference: line.reference,
                    service_id: line.request.service_id,
                    result,
                }
            })
            .collect();

        let mut quotes = csv::Writer::from_writer(Vec::new());
        let mut failures = csv::Writer::from_writer(Vec::new());
        quotes.write_record(QUOTE_HEADER)?;
        failures.write_record(FAILURE_HEADER)?;

        for outcome in &outcomes {
            match &outcome.result {
                Ok(quote) => {
                    quotes.write_record([
                        outcome.reference.clone(),
                        quote.service_id.clone(),
                        quote.carrier_id.clone(),
                        quote.effective_weight.to_string(),
                        quote.weight_basis.as_str().to_string(),
                        quote.band.weight_min.to_string(),
                        quote.band.weight_max.to_string(),
                        money(quote.pricing.base_price, scale),
                        money(quote.pricing.fuel_surcharge_applied, scale),
                        money(quote.pricing.volume_discount_applied, scale),
                        money(quote.pricing.promotional_discount_applied, scale),
                        money(quote.pricing.final_price, scale),
                        money(quote.purchase_price(), scale),
                        money(quote.margin.margin, scale),
                        quote.margin.percentage.to_string(),
                        quote.margin.class.as_str().to_string(),
                        quote.was_clamped().to_string(),
                    ])?;
                }
                Err(failure) => {
                    let report = failure.report();
                    failures.write_record([
                        outcome.reference.as_str(),
                        outcome.service_id.as_str(),
                        report.step_failed.as_str(),
                        report.error_kind.as_str(),
                        report.message.as_str(),
                    ])?;
                }
            }
        }

        let summary = BatchSummary::from_outcomes(&outcomes, chrono::Utc::now());
        tracing::info!(
            "Priced {} of {} requests ({} failed, {} clamped)",
            summary.quoted,
            summary.requested,
            summary.failed,
            summary.clamped
        );

        Ok(BatchResult {
            outcomes,
            quotes_csv: into_string(quotes)?,
            failures_csv: into_string(failures)?,
            summary,
        })
    }

    async fn load(&self, result: BatchResult) -> Result<String> {
        let archive_path = format!("{}/{}", self.config.output_path(), self.config.archive_name());

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>("quotes.csv", FileOptions::default())?;
            zip.write_all(result.quotes_csv.as_bytes())?;

            if result.summary.failed > 0 {
                zip.start_file::<_, ()>("failures.csv", FileOptions::default())?;
                zip.write_all(result.failures_csv.as_bytes())?;
            }

            zip.start_file::<_, ()>("summary.json", FileOptions::default())?;
            let summary = serde_json::to_string_pretty(&result.summary)?;
            zip.write_all(summary.as_bytes())?;

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing archive ({} bytes) to {}", zip_data.len(), archive_path);
        self.storage.write_file(&archive_path, &zip_data).await?;

        Ok(archive_path)
    }
}

/// Renders at the currency scale with the rounding the resolver prices with.
fn money(amount: rust_decimal::Decimal, scale: u32) -> String {
    format!("{:.*}", scale as usize, round_money(amount, scale))
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| EngineError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| EngineError::ProcessingError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::CatalogSnapshot;
    use crate::domain::catalog::Catalog;
    use crate::domain::quote::PricingPolicy;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, data: &str) -> Self {
            let mut files = HashMap::new();
            files.insert(path.to_string(), data.as_bytes().to_vec());
            Self {
                files: Arc::new(Mutex::new(files)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EngineError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        policy: PricingPolicy,
    }

    impl ConfigProvider for MockConfig {
        fn requests_file(&self) -> &str {
            "requests.csv"
        }

        fn output_path(&self) -> &str {
            "out"
        }

        fn archive_name(&self) -> &str {
            "quotes.zip"
        }

        fn pricing_policy(&self) -> PricingPolicy {
            self.policy
        }
    }

    fn handle() -> CatalogHandle {
        let catalog: Catalog = serde_json::from_value(serde_json::json!({
            "carriers": [{"id": "gls", "name": "GLS", "fuel_surcharge_pct": "10"}],
            "services": [{"id": "std", "carrier_id": "gls", "code": "STD", "name": "Standard"}],
            "rates": [
                {"service_id": "std", "weight_min": 0, "weight_max": 2, "purchase_price": "5.60", "retail_price": "7.00"},
                {"service_id": "std", "weight_min": 2, "weight_max": 10, "purchase_price": "8.00", "retail_price": "12.00"}
            ]
        }))
        .unwrap();
        CatalogHandle::new(CatalogSnapshot::build(catalog))
    }

    fn pipeline(requests: &str) -> (BatchQuotePipeline<MockStorage, MockConfig>, MockStorage) {
        let storage = MockStorage::with_file("requests.csv", requests);
        let config = MockConfig {
            policy: PricingPolicy::default(),
        };
        (
            BatchQuotePipeline::new(storage.clone(), config, handle()),
            storage,
        )
    }

    #[tokio::test]
    async fn test_extract_parses_optional_columns() {
        let (pipeline, _) = pipeline(
            "reference,service_id,weight,volume,volumetric_weight,promotional_discount_pct\n\
             A-1,std,1.5,,,\n\
             ,std, 3 ,12,4.2,10\n",
        );

        let lines = pipeline.extract().await.unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].reference, "A-1");
        assert_eq!(lines[0].request.weight, rust_decimal::Decimal::new(15, 1));
        assert_eq!(lines[0].request.volume, None);
        assert_eq!(lines[1].reference, "line-3");
        assert_eq!(lines[1].request.volumetric_weight, Some(rust_decimal::Decimal::new(42, 1)));
        assert_eq!(lines[1].request.promotional_discount_pct, Some(rust_decimal::Decimal::TEN));
    }

    #[tokio::test]
    async fn test_extract_reports_bad_cell_with_line_number() {
        let (pipeline, _) = pipeline("reference,service_id,weight\nA-1,std,heavy\n");

        let err = pipeline.extract().await.unwrap_err();
        assert!(err.to_string().contains("requests.csv:2 weight"));
    }

    #[tokio::test]
    async fn test_transform_splits_quotes_and_failures() {
        let (pipeline, _) = pipeline("reference,service_id,weight\nA-1,std,1\nA-2,std,15\nA-3,nope,1\n");

        let lines = pipeline.extract().await.unwrap();
        let result = pipeline.transform(lines).await.unwrap();

        assert_eq!(result.summary.requested, 3);
        assert_eq!(result.summary.quoted, 1);
        assert_eq!(result.summary.failed, 2);
        assert_eq!(result.summary.failures_by_kind.get("no_band_for_weight"), Some(&1));
        assert_eq!(result.summary.total_revenue, rust_decimal::Decimal::new(770, 2));

        let quote_lines: Vec<&str> = result.quotes_csv.lines().collect();
        assert_eq!(quote_lines.len(), 2);
        assert!(quote_lines[0].starts_with("reference,service_id,carrier_id"));
        assert_eq!(
            quote_lines[1],
            "A-1,std,gls,1,actual,0,2,7.00,0.70,0.00,0.00,7.70,5.60,2.10,27.27,low,false"
        );

        let failure_lines: Vec<&str> = result.failures_csv.lines().collect();
        assert_eq!(failure_lines.len(), 3);
        assert!(failure_lines[1].starts_with("A-2,std,band_lookup,no_band_for_weight,"));
        assert!(failure_lines[2].starts_with("A-3,nope,service_lookup,unknown_service,"));
    }

    #[tokio::test]
    async fn test_money_columns_use_currency_rounding() {
        let catalog: Catalog = serde_json::from_value(serde_json::json!({
            "carriers": [{"id": "gls", "name": "GLS"}],
            "services": [{"id": "std", "carrier_id": "gls"}],
            "rates": [
                {"service_id": "std", "weight_min": 0, "weight_max": 2, "purchase_price": "5.595", "retail_price": "7.005"}
            ]
        }))
        .unwrap();
        let pipeline = BatchQuotePipeline::new(
            MockStorage::with_file("requests.csv", "reference,service_id,weight\nA-1,std,1\n"),
            MockConfig {
                policy: PricingPolicy::default(),
            },
            CatalogHandle::new(CatalogSnapshot::build(catalog)),
        );

        let lines = pipeline.extract().await.unwrap();
        let result = pipeline.transform(lines).await.unwrap();

        let row = result.quotes_csv.lines().nth(1).unwrap();
        assert_eq!(row, "A-1,std,gls,1,actual,0,2,7.01,0.00,0.00,0.00,7.01,5.60,1.42,20.26,low,false");
    }

    #[test]
    fn test_money_follows_configured_scale() {
        let amount = rust_decimal::Decimal::new(12345, 3);
        assert_eq!(money(amount, 2), "12.35");
        assert_eq!(money(amount, 0), "12");
        assert_eq!(money(rust_decimal::Decimal::new(-5, 3), 2), "-0.01");
        assert_eq!(money(rust_decimal::Decimal::new(7, 0), 3), "7.000");
    }

    #[tokio::test]
    async fn test_load_writes_archive_without_failures_file() {
        let (pipeline, storage) = pipeline("reference,service_id,weight\nA-1,std,1\n");

        let lines = pipeline.extract().await.unwrap();
        let result = pipeline.transform(lines).await.unwrap();
        let path = pipeline.load(result).await.unwrap();

        assert_eq!(path, "out/quotes.zip");
        let zip_bytes = storage.get_file("out/quotes.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();

        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["quotes.csv", "summary.json"]);

        let summary: BatchSummary = {
            let file = archive.by_name("summary.json").unwrap();
            serde_json::from_reader(file).unwrap()
        };
        assert_eq!(summary.quoted, 1);
    }

    #[tokio::test]
    async fn test_load_includes_failures_when_present() {
        let (pipeline, storage) = pipeline("reference,service_id,weight\nA-1,std,99\n");

        let lines = pipeline.extract().await.unwrap();
        let result = pipeline.transform(lines).await.unwrap();
        pipeline.load(result).await.unwrap();

        let zip_bytes = storage.get_file("out/quotes.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        assert_eq!(archive.len(), 3);

        let mut content = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("failures.csv").unwrap(), &mut content)
            .unwrap();
        assert!(content.contains("no_band_for_weight"));
    }
}
