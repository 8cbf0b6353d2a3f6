//! Pipeline metrics recorded through the `metrics` facade.
//!
//! Names follow Prometheus conventions. Without an installed recorder every
//! call is a no-op, so library callers pay nothing unless they opt in.

use std::fmt;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

use crate::error::{PipelineError, Result};

/// Every metric name the pipeline emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingestion
    RowsIngested,

    // Cleaning
    CleanRowsAccepted,
    CleanRowsRejected,

    // Joins
    JoinRows,
    JoinUnmatched,

    // Aggregation
    FilterRowsSelected,

    // Whole run
    PipelineRuns,
    PipelineDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RowsIngested => "di_ingest_rows_total",
            MetricName::CleanRowsAccepted => "di_clean_rows_accepted_total",
            MetricName::CleanRowsRejected => "di_clean_rows_rejected_total",
            MetricName::JoinRows => "di_join_rows_total",
            MetricName::JoinUnmatched => "di_join_unmatched_total",
            MetricName::FilterRowsSelected => "di_filter_rows_selected",
            MetricName::PipelineRuns => "di_pipeline_runs_total",
            MetricName::PipelineDuration => "di_pipeline_duration_seconds",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            RowsIngested,
            CleanRowsAccepted,
            CleanRowsRejected,
            JoinRows,
            JoinUnmatched,
            FilterRowsSelected,
            PipelineRuns,
            PipelineDuration,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Safe to call more than once.
pub fn init() -> Result<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| PipelineError::Config(format!("Failed to install Prometheus recorder: {}", e)))?;
    let _ = METRICS_HANDLE.set(handle);
    info!("Metrics recorder installed");
    Ok(())
}

/// Current metrics in Prometheus text format, if `init` ran
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

// ============================================================================
// Ingestion
// ============================================================================

pub mod ingest {
    use super::MetricName;
    use crate::types::TableKind;

    pub fn rows_ingested(table: TableKind, rows: usize) {
        ::metrics::counter!(MetricName::RowsIngested.as_str(), "table" => table.as_str())
            .increment(rows as u64);
    }
}

// ============================================================================
// Cleaning
// ============================================================================

pub mod clean {
    use super::MetricName;
    use crate::pipeline::processing::quality_gate::CleaningReport;

    /// Record accepted and per-reason rejected counts for one table
    pub fn report_recorded(report: &CleaningReport) {
        let table = report.table.as_str();
        ::metrics::counter!(MetricName::CleanRowsAccepted.as_str(), "table" => table)
            .increment(report.accepted_rows as u64);
        for (reason, count) in &report.rejections {
            ::metrics::counter!(
                MetricName::CleanRowsRejected.as_str(),
                "table" => table,
                "reason" => reason.as_str()
            )
            .increment(*count as u64);
        }
    }
}

// ============================================================================
// Joins
// ============================================================================

pub mod join {
    use super::MetricName;
    use crate::pipeline::processing::join::JoinReport;

    pub fn report_recorded(report: &JoinReport) {
        for stage in &report.stages {
            let name = stage.stage.as_str();
            ::metrics::counter!(MetricName::JoinRows.as_str(), "stage" => name)
                .increment(stage.output_rows as u64);
            ::metrics::counter!(MetricName::JoinUnmatched.as_str(), "stage" => name)
                .increment(stage.unmatched_left as u64);
        }
    }
}

// ============================================================================
// Aggregation
// ============================================================================

pub mod aggregate {
    use super::MetricName;

    pub fn rows_selected(rows: usize) {
        ::metrics::gauge!(MetricName::FilterRowsSelected.as_str()).set(rows as f64);
    }
}

// ============================================================================
// Pipeline
// ============================================================================

pub mod pipeline {
    use super::MetricName;

    pub fn run_completed(duration_secs: f64) {
        ::metrics::counter!(MetricName::PipelineRuns.as_str()).increment(1);
        ::metrics::histogram!(MetricName::PipelineDuration.as_str()).record(duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique_and_prefixed() {
        let names: Vec<&str> = MetricName::all_metrics().map(|m| m.as_str()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
        assert!(names.iter().all(|n| n.starts_with("di_")));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        ingest::rows_ingested(crate::types::TableKind::Orders, 3);
        aggregate::rows_selected(2);
        pipeline::run_completed(0.5);
    }
}
