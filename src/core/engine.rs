use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives a pipeline through its three phases and reports progress.
pub struct ScrapeEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ScrapeEngine<P> {
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
        tracing::info!("🚀 Starting Moodle scrape...");
        self.monitor.log_stats("Startup");

        let courses = self.pipeline.extract().await?;
        tracing::info!("📚 Dashboard listed {} courses", courses.len());
        self.monitor.log_stats("Extract");

        let result = self.pipeline.transform(courses).await?;
        tracing::info!(
            "✅ Scraped {} courses ({} failed), downloaded {} files",
            result.dump.courses.len(),
            result.courses_failed,
            result.files_downloaded
        );
        self.monitor.log_stats("Scrape");

        let output_path = self.pipeline.load(result).await?;
        tracing::info!("💾 Dump written to: {}", output_path);
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
