use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct QuoteEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> QuoteEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting batch quote run");

        tracing::info!("Reading requests...");
        let lines = self.pipeline.extract().await?;
        tracing::info!("Read {} requests", lines.len());
        self.monitor.log_stats("extract");

        tracing::info!("Resolving quotes...");
        let result = self.pipeline.transform(lines).await?;
        let quoted = result.summary.quoted;
        self.monitor.log_stats("transform");

        tracing::info!("Writing archive...");
        let output_path = self.pipeline.load(result).await?;
        self.monitor.log_stats("load");
        self.monitor.log_final_stats(quoted);

        tracing::info!("Output saved to: {}", output_path);
        Ok(output_path)
    }
}
