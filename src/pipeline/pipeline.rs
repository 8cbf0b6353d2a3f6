use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::app::ports::TableSource;
use crate::config::Config;
use crate::error::Result;
use crate::observability;
use crate::pipeline::ingestion::{load_inputs, RawInputs};
use crate::pipeline::processing::enrich::{DefaultEnricher, Enricher};
use crate::pipeline::processing::join::{AnalyticalView, JoinOrchestrator, JoinReport};
use crate::pipeline::processing::normalize::FieldNormalizer;
use crate::pipeline::processing::quality_gate::{
    Cleaner, CleaningReport, ItemCleaner, OrderCleaner, PaymentCleaner, ReviewCleaner,
};
use crate::types::TableKind;

/// What happened to the rows on the way to the analytical view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub cleaning: Vec<CleaningReport>,
    pub join: JoinReport,
    pub analytical_rows: usize,
    pub duration_secs: f64,
}

impl PipelineReport {
    pub fn cleaning_for(&self, table: TableKind) -> Option<&CleaningReport> {
        self.cleaning.iter().find(|r| r.table == table)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub view: AnalyticalView,
    pub report: PipelineReport,
}

/// Load, clean, enrich and join the four input tables
pub struct Pipeline {
    orders: OrderCleaner,
    reviews: ReviewCleaner,
    payments: PaymentCleaner,
    items: ItemCleaner,
    enricher: Box<dyn Enricher>,
    joiner: JoinOrchestrator,
}

impl Pipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            orders: OrderCleaner::new(FieldNormalizer::with_timestamp_format(
                &config.cleaning.timestamp_format,
            )),
            reviews: ReviewCleaner::new(&config.cleaning.missing_comment),
            payments: PaymentCleaner,
            items: ItemCleaner,
            enricher: Box::new(DefaultEnricher::new()),
            joiner: JoinOrchestrator::new(),
        }
    }

    pub fn with_enricher(mut self, enricher: Box<dyn Enricher>) -> Self {
        self.enricher = enricher;
        self
    }

    /// Run every stage against `source`. A missing input aborts before any
    /// cleaning; row-level problems never do.
    #[instrument(skip_all)]
    pub fn run(&self, source: &dyn TableSource) -> Result<PipelineOutput> {
        let t_pipeline = Instant::now();
        info!("Starting pipeline run");

        let inputs = load_inputs(source)?;
        for table in [&inputs.orders, &inputs.payments, &inputs.items, &inputs.reviews] {
            observability::ingest::rows_ingested(table.kind, table.len());
        }

        let output = self.process(&inputs, t_pipeline)?;

        observability::pipeline::run_completed(output.report.duration_secs);
        info!(
            rows = output.view.len(),
            duration_secs = output.report.duration_secs,
            "Pipeline run complete"
        );
        Ok(output)
    }

    fn process(&self, inputs: &RawInputs, started: Instant) -> Result<PipelineOutput> {
        let orders = self.orders.clean(&inputs.orders)?;
        let reviews = self.reviews.clean(&inputs.reviews)?;
        let payments = self.payments.clean(&inputs.payments)?;
        let items = self.items.clean(&inputs.items)?;

        let cleaning = vec![
            orders.report,
            payments.report,
            items.report,
            reviews.report,
        ];
        for report in &cleaning {
            observability::clean::report_recorded(report);
            if report.input_rows > 0 && report.accepted_rows == 0 {
                warn!(table = %report.table, "Every row was rejected");
            }
        }

        let delivered = self.enricher.enrich_orders(orders.records);
        let tiered = self.enricher.enrich_payments(payments.records);

        let (view, join) = self
            .joiner
            .join(&delivered, &reviews.records, &items.records, &tiered);
        observability::join::report_recorded(&join);

        let report = PipelineReport {
            cleaning,
            join,
            analytical_rows: view.len(),
            duration_secs: started.elapsed().as_secs_f64(),
        };
        Ok(PipelineOutput { view, report })
    }
}
