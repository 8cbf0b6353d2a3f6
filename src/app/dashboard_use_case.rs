use chrono::NaiveDate;
use once_cell::unsync::OnceCell;
use tracing::{info, warn};

use crate::app::ports::TableSource;
use crate::config::Config;
use crate::error::Result;
use crate::observability;
use crate::pipeline::processing::aggregate::{Aggregator, DashboardSummary, DateRange};
use crate::pipeline::processing::join::AnalyticalView;
use crate::pipeline::{Pipeline, PipelineOutput, PipelineReport};

/// Serves repeated date-range queries over one analytical view. The view is
/// built on first use; later queries only filter and aggregate.
pub struct DashboardSession {
    source: Box<dyn TableSource>,
    pipeline: Pipeline,
    aggregator: Aggregator,
    output: OnceCell<PipelineOutput>,
}

impl DashboardSession {
    pub fn new(source: Box<dyn TableSource>, config: &Config) -> Self {
        Self {
            source,
            pipeline: Pipeline::new(config),
            aggregator: Aggregator::new(config.aggregation.delivery_days_bins.clone()),
            output: OnceCell::new(),
        }
    }

    fn output(&self) -> Result<&PipelineOutput> {
        self.output.get_or_try_init(|| self.pipeline.run(self.source.as_ref()))
    }

    pub fn view(&self) -> Result<&AnalyticalView> {
        Ok(&self.output()?.view)
    }

    pub fn report(&self) -> Result<&PipelineReport> {
        Ok(&self.output()?.report)
    }

    /// Earliest and latest delivery date in the view
    pub fn bounds(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        Ok(self.view()?.date_bounds())
    }

    /// Summarize `range`, defaulting to the full bounds of the view. A range
    /// outside the bounds is answered, with a warning, as an empty selection.
    pub fn summarize(&self, range: Option<DateRange>, include_rows: bool) -> Result<DashboardSummary> {
        let view = self.view()?;
        let bounds = view.date_bounds();

        let range = match (range, bounds) {
            (Some(range), Some(bounds)) => {
                if !range.is_within(bounds) {
                    warn!(
                        start = %range.start,
                        end = %range.end,
                        min = %bounds.0,
                        max = %bounds.1,
                        "Requested range falls outside the data"
                    );
                }
                Some(range)
            }
            (Some(range), None) => {
                warn!(start = %range.start, end = %range.end, "Analytical view is empty");
                Some(range)
            }
            (None, bounds) => bounds.map(DateRange::from_bounds),
        };

        let summary = self.aggregator.summarize(view, range, include_rows);
        observability::aggregate::rows_selected(summary.filtered_rows);
        info!(
            selected = summary.filtered_rows,
            total = summary.total_rows,
            "Summarized analytical view"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::types::{RawTable, TableKind};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts loads so tests can see whether the pipeline re-ran
    struct CountingSource {
        loads: Rc<Cell<usize>>,
    }

    impl TableSource for CountingSource {
        fn check(&self, _kind: TableKind) -> Result<()> {
            Ok(())
        }

        fn load(&self, kind: TableKind) -> Result<RawTable> {
            self.loads.set(self.loads.get() + 1);
            Ok(match kind {
                TableKind::Orders => RawTable::from_rows(
                    kind,
                    &["order_id", "customer_id", "order_status", "purchase", "approved", "carrier", "delivered", "estimated"],
                    &[
                        &["o1", "c1", "delivered", "", "01/01/2018 08:00", "", "03/01/2018 08:00", "10/01/2018 00:00"],
                        &["o2", "c2", "delivered", "", "01/02/2018 08:00", "", "20/02/2018 08:00", "10/02/2018 00:00"],
                    ],
                ),
                TableKind::Reviews => RawTable::from_rows(
                    kind,
                    &["review_id", "order_id", "review_score", "review_comment_message"],
                    &[&["r1", "o1", "4", "ok"], &["r2", "o2", "1", ""]],
                ),
                TableKind::Items => RawTable::from_rows(
                    kind,
                    &["order_id", "order_item_id", "product_id", "seller_id", "limit", "price", "freight_value"],
                    &[],
                ),
                TableKind::Payments => RawTable::from_rows(
                    kind,
                    &["order_id", "payment_sequential", "payment_type", "payment_installments", "payment_value"],
                    &[],
                ),
            })
        }
    }

    fn session() -> (DashboardSession, Rc<Cell<usize>>) {
        let loads = Rc::new(Cell::new(0));
        let source = CountingSource { loads: Rc::clone(&loads) };
        (DashboardSession::new(Box::new(source), &Config::default()), loads)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_view_is_built_once_across_queries() {
        let (session, loads) = session();

        let january = session
            .summarize(Some(DateRange::new(date(2018, 1, 1), date(2018, 1, 31))), false)
            .unwrap();
        let february = session
            .summarize(Some(DateRange::new(date(2018, 2, 1), date(2018, 2, 28))), false)
            .unwrap();

        assert_eq!(january.filtered_rows, 1);
        assert_eq!(february.filtered_rows, 1);
        assert_eq!(loads.get(), 4);
    }

    #[test]
    fn test_default_range_is_full_bounds() {
        let (session, _) = session();
        assert_eq!(session.bounds().unwrap(), Some((date(2018, 1, 3), date(2018, 2, 20))));

        let summary = session.summarize(None, true).unwrap();
        assert_eq!(summary.range, Some(DateRange::new(date(2018, 1, 3), date(2018, 2, 20))));
        assert_eq!(summary.filtered_rows, 2);
        assert_eq!(summary.rows.map(|rows| rows.len()), Some(2));
    }

    #[test]
    fn test_out_of_bounds_range_is_empty() {
        let (session, _) = session();
        let summary = session
            .summarize(Some(DateRange::new(date(2019, 1, 1), date(2019, 12, 31))), false)
            .unwrap();
        assert_eq!(summary.filtered_rows, 0);
        assert!(summary.status_counts.is_empty());
    }

    #[test]
    fn test_failed_build_is_reported() {
        struct Absent;
        impl TableSource for Absent {
            fn check(&self, kind: TableKind) -> Result<()> {
                Err(PipelineError::MissingInput { table: kind, path: "absent".to_string() })
            }
            fn load(&self, kind: TableKind) -> Result<RawTable> {
                self.check(kind).map(|_| RawTable::new(kind, vec![]))
            }
        }

        let session = DashboardSession::new(Box::new(Absent), &Config::default());
        assert!(matches!(session.view(), Err(PipelineError::MissingInput { .. })));
    }
}
