// Watermark pipeline Prometheus metrics
//
// - Run counters by outcome (success, failure, timeout)
// - Per-stage latency histograms
// - Logo cache lookups by result (hit, miss, missing, invalid)

use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, Histogram, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Instant;

use crate::error::Stage;

/// Global metrics registry for the watermark pipeline
pub struct PipelineMetrics {
    /// Pipeline runs by outcome
    pub runs: IntCounterVec,

    /// Stage duration histogram (in seconds)
    pub stage_duration: HistogramVec,

    /// Logo cache lookups by result
    pub logo_cache: IntCounterVec,
}

/// Global singleton instance of metrics
static METRICS: OnceLock<PipelineMetrics> = OnceLock::new();

impl PipelineMetrics {
    /// Initialize and return the global metrics instance
    ///
    /// Registers with the default Prometheus registry on first call.
    /// Subsequent calls return the same instance.
    pub fn global() -> &'static Self {
        METRICS.get_or_init(|| {
            let runs = register_int_counter_vec!(
                "photomark_pipeline_runs_total",
                "Total number of watermark pipeline runs by outcome",
                &["outcome"] // success, failure, timeout
            )
            .expect("Failed to register pipeline_runs_total metric");

            let stage_duration = register_histogram_vec!(
                "photomark_stage_duration_seconds",
                "Duration of watermark pipeline stages in seconds",
                &["stage"],
                vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0] // 0.5ms to 5s
            )
            .expect("Failed to register stage_duration_seconds metric");

            let logo_cache = register_int_counter_vec!(
                "photomark_logo_cache_total",
                "Logo cache lookups by result",
                &["result"] // hit, miss, missing, invalid
            )
            .expect("Failed to register logo_cache_total metric");

            PipelineMetrics {
                runs,
                stage_duration,
                logo_cache,
            }
        })
    }

    pub fn record_run(&self, outcome: &str) {
        self.runs.with_label_values(&[outcome]).inc();
    }

    pub fn record_logo_cache(&self, result: &str) {
        self.logo_cache.with_label_values(&[result]).inc();
    }

    /// Start timing the work that leads up to `stage`
    ///
    /// # Example
    /// ```ignore
    /// let timer = metrics.start_stage_timer(Stage::PlateBuilt);
    /// let plate = plate::build(&plan.plate_box, &style);
    /// timer.observe_duration();
    /// ```
    pub fn start_stage_timer(&self, stage: Stage) -> StageTimer {
        StageTimer {
            histogram: Some(self.stage_duration.with_label_values(&[stage.as_str()])),
            start: Instant::now(),
        }
    }

    /// Everything in the default registry, in Prometheus text format
    pub fn render() -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// RAII timer for a pipeline stage
///
/// Records the elapsed time once, either explicitly or when dropped.
pub struct StageTimer {
    histogram: Option<Histogram>,
    start: Instant,
}

impl StageTimer {
    /// Manually observe and consume the timer
    pub fn observe_duration(mut self) {
        self.observe();
    }

    fn observe(&mut self) {
        if let Some(histogram) = self.histogram.take() {
            histogram.observe(self.start.elapsed().as_secs_f64());
        }
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        self.observe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_singleton() {
        let metrics1 = PipelineMetrics::global();
        let metrics2 = PipelineMetrics::global();

        assert_eq!(
            metrics1 as *const PipelineMetrics,
            metrics2 as *const PipelineMetrics
        );
    }

    #[test]
    fn test_can_increment_counters() {
        let metrics = PipelineMetrics::global();

        let before = metrics.runs.with_label_values(&["success"]).get();
        metrics.record_run("success");
        assert!(metrics.runs.with_label_values(&["success"]).get() > before);

        let before = metrics.logo_cache.with_label_values(&["hit"]).get();
        metrics.record_logo_cache("hit");
        assert!(metrics.logo_cache.with_label_values(&["hit"]).get() > before);
    }

    #[test]
    fn test_timer_observes_once() {
        let metrics = PipelineMetrics::global();
        let histogram = metrics
            .stage_duration
            .with_label_values(&[Stage::Planned.as_str()]);

        let before = histogram.get_sample_count();
        let timer = metrics.start_stage_timer(Stage::Planned);
        timer.observe_duration();
        assert!(histogram.get_sample_count() > before);

        let before = histogram.get_sample_count();
        {
            let _timer = metrics.start_stage_timer(Stage::Planned);
        }
        assert!(histogram.get_sample_count() > before);
    }

    #[test]
    fn test_render_contains_metric_names() {
        PipelineMetrics::global().record_run("failure");
        let output = PipelineMetrics::render();
        assert!(output.contains("photomark_pipeline_runs_total"));
    }
}
