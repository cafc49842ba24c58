//! Observability infrastructure for the prediction service
//!
//! Provides:
//! - Prometheus metrics (assembly and prediction latency, row outcomes,
//!   loaded model version)
//! - Structured event logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, GaugeVec, Histogram,
    IntCounter,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    assembly_latency_seconds: Histogram,
    prediction_latency_seconds: Histogram,
    molecules_processed: IntCounter,
    predictions_generated: IntCounter,
    parse_failures: IntCounter,
    descriptor_failures: IntCounter,
    prediction_errors: IntCounter,
    model_version_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            assembly_latency_seconds: register_histogram!(
                "solubility_feature_assembly_latency_seconds",
                "Time spent parsing SMILES and computing descriptors per batch",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register feature_assembly_latency_seconds"),

            prediction_latency_seconds: register_histogram!(
                "solubility_prediction_latency_seconds",
                "Time spent running model inference per batch",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            molecules_processed: register_int_counter!(
                "solubility_molecules_processed_total",
                "Total number of SMILES rows received"
            )
            .expect("Failed to register molecules_processed"),

            predictions_generated: register_int_counter!(
                "solubility_predictions_generated_total",
                "Total number of LogS predictions produced"
            )
            .expect("Failed to register predictions_generated"),

            parse_failures: register_int_counter!(
                "solubility_parse_failures_total",
                "Total number of rows rejected by the SMILES parser"
            )
            .expect("Failed to register parse_failures"),

            descriptor_failures: register_int_counter!(
                "solubility_descriptor_failures_total",
                "Total number of rows without a valid descriptor vector"
            )
            .expect("Failed to register descriptor_failures"),

            prediction_errors: register_int_counter!(
                "solubility_prediction_errors_total",
                "Total number of failed prediction calls"
            )
            .expect("Failed to register prediction_errors"),

            model_version_info: register_gauge_vec!(
                "solubility_model_version_info",
                "Information about the currently loaded model",
                &["name", "version", "kind"]
            )
            .expect("Failed to register model_version_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ServiceMetrics")
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_assembly_latency(&self, duration_secs: f64) {
        self.inner().assembly_latency_seconds.observe(duration_secs);
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    /// Record the row outcomes of one batch
    pub fn record_batch(
        &self,
        molecules: usize,
        predictions: usize,
        parse_failures: usize,
        descriptor_failures: usize,
    ) {
        let inner = self.inner();
        inner.molecules_processed.inc_by(molecules as u64);
        inner.predictions_generated.inc_by(predictions as u64);
        inner.parse_failures.inc_by(parse_failures as u64);
        inner.descriptor_failures.inc_by(descriptor_failures as u64);
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    /// Replace the loaded model info series
    pub fn set_model_version(&self, name: &str, version: &str, kind: &str) {
        self.inner().model_version_info.reset();
        self.inner()
            .model_version_info
            .with_label_values(&[name, version, kind])
            .set(1.0);
    }

    pub fn clear_model_version(&self) {
        self.inner().model_version_info.reset();
    }
}

/// Structured logger for service events
///
/// Emits consistently shaped events so JSON log consumers can filter on
/// the `event` field.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn log_startup(&self, version: &str, listen_addr: &str) {
        info!(
            event = "service_started",
            instance = %self.instance,
            service_version = %version,
            listen_addr = %listen_addr,
            "Solubility service started"
        );
    }

    pub fn log_model_loaded(&self, name: &str, version: &str, kind: &str, source: &str) {
        info!(
            event = "model_loaded",
            instance = %self.instance,
            model_name = %name,
            model_version = %version,
            model_kind = %kind,
            source = %source,
            "Model loaded"
        );
    }

    pub fn log_model_load_failed(&self, source: &str, error: &str) {
        warn!(
            event = "model_load_failed",
            instance = %self.instance,
            source = %source,
            error = %error,
            "Model load failed, predictions unavailable"
        );
    }

    pub fn log_batch(&self, total: usize, predicted: usize, failed: usize, model_version: &str) {
        info!(
            event = "batch_predicted",
            instance = %self.instance,
            total = total,
            predicted = predicted,
            failed = failed,
            model_version = %model_version,
            "Batch predicted"
        );
    }

    pub fn log_row_failure(&self, index: usize, smiles: &str, kind: &str, error: &str) {
        warn!(
            event = "row_failed",
            instance = %self.instance,
            index = index,
            smiles = %smiles,
            kind = %kind,
            error = %error,
            "Row excluded from prediction"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Solubility service shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_metrics_handles_share_registry() {
        let metrics = ServiceMetrics::new();
        let other = ServiceMetrics::new();

        metrics.observe_assembly_latency(0.001);
        metrics.observe_prediction_latency(0.002);
        metrics.record_batch(3, 2, 1, 0);
        other.inc_prediction_errors();
        metrics.set_model_version("esol-linear", "1.0.0", "linear");

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "solubility_molecules_processed_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance(), "test-instance");
        logger.log_batch(2, 1, 1, "1.0.0");
    }
}
