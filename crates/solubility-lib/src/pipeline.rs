//! End-to-end batch pipeline: SMILES in, prediction report out

use crate::chem::{MoleculeParser, SmilesParser};
use crate::error::{BatchRejected, ModelLoadError, PredictError, RowError, RowFailure};
use crate::models::{DescriptorVector, PredictionReport};
use crate::observability::ServiceMetrics;
use crate::predictor::{
    AssemblerConfig, FeatureAssembler, FeatureBatch, LoadOptions, ModelHandle, ModelSource,
    OutputFormatter, SolubilityPredictor,
};
use std::time::Instant;
use tracing::debug;

/// Descriptors for a batch, without prediction
#[derive(Debug, Clone, serde::Serialize)]
pub struct DescriptorReport {
    pub total: usize,
    pub rows: Vec<DescribedRow>,
    pub failures: Vec<RowFailure>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DescribedRow {
    pub index: usize,
    pub smiles: String,
    pub descriptors: DescriptorVector,
}

pub struct SolubilityPipeline<P = SmilesParser> {
    assembler: FeatureAssembler<P>,
    predictor: SolubilityPredictor,
    formatter: OutputFormatter,
    metrics: Option<ServiceMetrics>,
}

impl SolubilityPipeline<SmilesParser> {
    /// Pipeline over the built-in SMILES parser, no model loaded
    pub fn new() -> Self {
        Self::with_parser(SmilesParser, AssemblerConfig::default())
    }
}

impl Default for SolubilityPipeline<SmilesParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: MoleculeParser> SolubilityPipeline<P> {
    pub fn with_parser(parser: P, config: AssemblerConfig) -> Self {
        Self {
            assembler: FeatureAssembler::with_config(parser, config),
            predictor: SolubilityPredictor::new(),
            formatter: OutputFormatter::new(),
            metrics: None,
        }
    }

    pub fn with_formatter(mut self, formatter: OutputFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Report batch timings and row outcomes to Prometheus
    pub fn with_metrics(mut self, metrics: ServiceMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn load_model(
        &mut self,
        source: ModelSource,
        options: &LoadOptions,
    ) -> Result<ModelHandle, ModelLoadError> {
        let result = self.predictor.load(source, options);
        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(handle) => {
                    let info = handle.info();
                    metrics.set_model_version(&info.name, &info.version, &info.kind);
                }
                Err(_) => metrics.clear_model_version(),
            }
        }
        result
    }

    pub fn set_model(&mut self, handle: ModelHandle) {
        if let Some(metrics) = &self.metrics {
            let info = handle.info();
            metrics.set_model_version(&info.name, &info.version, &info.kind);
        }
        self.predictor.set_model(handle);
    }

    pub fn model(&self) -> Option<&ModelHandle> {
        self.predictor.handle()
    }

    pub fn predictor(&self) -> &SolubilityPredictor {
        &self.predictor
    }

    pub fn assembler(&self) -> &FeatureAssembler<P> {
        &self.assembler
    }

    /// Predict every parseable row; failed rows are reported, not fatal
    pub fn run<S>(&self, smiles: &[S]) -> Result<PredictionReport, PredictError>
    where
        S: AsRef<str> + Sync,
    {
        let handle = self.predictor.handle().ok_or(PredictError::ModelNotLoaded)?;
        let batch = self.assemble(smiles)?;
        self.predict_batch(smiles, batch, handle.version())
    }

    /// Predict only if every row parses and describes cleanly
    pub fn run_strict<S>(&self, smiles: &[S]) -> Result<PredictionReport, PredictError>
    where
        S: AsRef<str> + Sync,
    {
        let handle = self.predictor.handle().ok_or(PredictError::ModelNotLoaded)?;
        let batch = self.assemble(smiles)?;
        if !batch.is_complete() {
            self.record(&batch, 0);
            return Err(BatchRejected {
                total: batch.total,
                failures: batch.failures,
            }
            .into());
        }
        self.predict_batch(smiles, batch, handle.version())
    }

    /// Descriptors only; works without a model
    pub fn describe<S>(&self, smiles: &[S]) -> Result<DescriptorReport, PredictError>
    where
        S: AsRef<str> + Sync,
    {
        let batch = self.assemble(smiles)?;
        let rows = batch
            .row_index
            .iter()
            .enumerate()
            .filter_map(|(row, &index)| {
                batch.descriptors(row).map(|descriptors| DescribedRow {
                    index,
                    smiles: smiles[index].as_ref().to_string(),
                    descriptors,
                })
            })
            .collect();
        Ok(DescriptorReport {
            total: batch.total,
            rows,
            failures: batch.failures,
        })
    }

    fn assemble<S>(&self, smiles: &[S]) -> Result<FeatureBatch, PredictError>
    where
        S: AsRef<str> + Sync,
    {
        let start = Instant::now();
        let batch = self.assembler.assemble(smiles)?;
        if let Some(metrics) = &self.metrics {
            metrics.observe_assembly_latency(start.elapsed().as_secs_f64());
        }
        Ok(batch)
    }

    fn predict_batch<S: AsRef<str>>(
        &self,
        smiles: &[S],
        batch: FeatureBatch,
        model_version: &str,
    ) -> Result<PredictionReport, PredictError> {
        let start = Instant::now();
        let log_s = match self.predictor.predict(&batch.matrix) {
            Ok(values) => values,
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.inc_prediction_errors();
                }
                return Err(e);
            }
        };
        if let Some(metrics) = &self.metrics {
            metrics.observe_prediction_latency(start.elapsed().as_secs_f64());
        }

        let predictions: Vec<_> = batch
            .row_index
            .iter()
            .zip(&log_s)
            .enumerate()
            .filter_map(|(row, (&index, &value))| {
                let descriptors = batch.descriptors(row)?;
                Some(
                    self.formatter
                        .format(index, smiles[index].as_ref(), descriptors, value),
                )
            })
            .collect();

        self.record(&batch, predictions.len());
        debug!(
            total = batch.total,
            predicted = predictions.len(),
            failed = batch.failures.len(),
            "Batch predicted"
        );

        Ok(PredictionReport {
            model_version: model_version.to_string(),
            generated_at: chrono::Utc::now().timestamp(),
            total: batch.total,
            predictions,
            failures: batch.failures,
        })
    }

    fn record(&self, batch: &FeatureBatch, predicted: usize) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        let parse_failures = batch
            .failures
            .iter()
            .filter(|f| matches!(f.error, RowError::Parse(_)))
            .count();
        metrics.record_batch(
            batch.total,
            predicted,
            parse_failures,
            batch.failures.len() - parse_failures,
        );
    }
}
