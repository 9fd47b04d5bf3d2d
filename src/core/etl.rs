use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives a pipeline through extract, transform, and load. Runs by `&mut`
/// borrow: the extract stage owns a stateful calendar session.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&mut self) -> Result<String> {
        tracing::info!("Scanning award calendars...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("Scanned {} airports", raw_data.len());
        self.monitor.log_stats("extract");

        let table = self.pipeline.transform(raw_data).await?;
        tracing::info!("Built {} table rows", table.rows.len());
        self.monitor.log_stats("transform");

        let output_path = self.pipeline.load(table).await?;
        self.monitor.log_stats("load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
