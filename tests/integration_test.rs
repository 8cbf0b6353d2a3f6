use std::fs;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use tempfile::tempdir;

use delivery_insights::app::DashboardSession;
use delivery_insights::config::Config;
use delivery_insights::domain::{CustomerTier, DeliveryStatus};
use delivery_insights::error::PipelineError;
use delivery_insights::infra::CsvTableSource;
use delivery_insights::pipeline::processing::aggregate::DateRange;
use delivery_insights::pipeline::processing::join::JoinStage;
use delivery_insights::pipeline::processing::quality_gate::RejectReason;
use delivery_insights::pipeline::Pipeline;
use delivery_insights::types::TableKind;

const ORDERS: &str = "\
order_id;customer_id;order_status;order_purchase_timestamp;order_approved_at;order_delivered_carrier_date;order_delivered_customer_date;order_estimated_delivery_date
o1;c1;delivered;01/01/2018 07:00;01/01/2018 08:00;02/01/2018 08:00;03/01/2018 08:00;05/01/2018 00:00
o2;c2;delivered;01/02/2018 07:00;01/02/2018 08:00;;20/02/2018 08:00;10/02/2018 00:00
o3;c3;shipped;01/03/2018 07:00;01/03/2018 08:00;;;20/03/2018 00:00
o4;c4;delivered;01/03/2018 07:00;01/03/2018 08:00;;05/03/2018 08:00;20/03/2018 00:00
";

const REVIEWS: &str = "\
review_id;order_id;review_score;review_comment_message
r1;o1;5;
r2;o2;score: 4!;late but fine
r2;o2;score: 4!;late but fine
r4;o4;n/a;unreadable
";

const ITEMS: &str = "\
order_id;order_item_id;product_id;seller_id;shipping_limit_date;price;freight_value
o1;1;p1;s1;02/01/2018 08:00;10,5;2,0
o2;1;p2;s2;;20.0;3.0
";

const PAYMENTS: &str = "\
order_id;payment_sequential;payment_type;payment_installments;payment_value
o1;1;credit_card;1;5.0
o1;2;voucher;1;1.0
o1;5;voucher;1;1.0
o1;6;voucher;1;1.0
o1;8;voucher;1;1.0
";

fn write_inputs(dir: &Path) -> Result<Config> {
    fs::write(dir.join("orders.csv"), ORDERS)?;
    fs::write(dir.join("reviews.csv"), REVIEWS)?;
    fs::write(dir.join("items.csv"), ITEMS)?;
    fs::write(dir.join("payments.csv"), PAYMENTS)?;

    let config_path = dir.join("config.toml");
    fs::write(
        &config_path,
        format!(
            "[inputs]\norders = \"{}\"\npayments = \"{}\"\nitems = \"{}\"\nreviews = \"{}\"\n",
            dir.join("orders.csv").display(),
            dir.join("payments.csv").display(),
            dir.join("items.csv").display(),
            dir.join("reviews.csv").display(),
        ),
    )?;
    Ok(Config::load_from(&config_path)?.validated()?)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_pipeline_over_csv_inputs() -> Result<()> {
    let dir = tempdir()?;
    let config = write_inputs(dir.path())?;
    let source = CsvTableSource::from_config(&config.inputs)?;

    let output = Pipeline::new(&config).run(&source)?;
    let rows = output.view.rows();

    // o1 fans out over its five payments, o2 keeps an empty line
    assert_eq!(rows.len(), 6);
    assert!(rows[..5].iter().all(|r| r.order_id() == "o1"));
    assert_eq!(rows[5].order_id(), "o2");
    assert!(rows[5].line.is_none());

    let o1 = &rows[0];
    assert_eq!(o1.order.delivery_days, 2);
    assert_eq!(o1.delivery_status(), DeliveryStatus::OnTime);
    assert_eq!(o1.status_flag, 0);
    assert_eq!(o1.review.comment, "No Comment");
    let price = o1.line.as_ref().and_then(|l| l.item.price);
    assert_eq!(price, Some(10.5));

    let o2 = &rows[5];
    assert_eq!(o2.order.delivery_days, 19);
    assert_eq!(o2.delivery_status(), DeliveryStatus::Late);
    assert_eq!(o2.status_flag, 1);
    assert_eq!(o2.review_score().value(), 4);

    let tiers: Vec<CustomerTier> = rows[..5]
        .iter()
        .filter_map(|r| r.line.as_ref().and_then(|l| l.payment.customer_tier))
        .collect();
    assert_eq!(
        tiers,
        vec![
            CustomerTier::Normal,
            CustomerTier::Fixed,
            CustomerTier::Fixed,
            CustomerTier::Loyal,
            CustomerTier::Loyal,
        ]
    );
    Ok(())
}

#[test]
fn test_report_tallies_rejections_and_join_losses() -> Result<()> {
    let dir = tempdir()?;
    let config = write_inputs(dir.path())?;
    let source = CsvTableSource::from_config(&config.inputs)?;
    let report = Pipeline::new(&config).run(&source)?.report;

    let orders = report.cleaning_for(TableKind::Orders).unwrap();
    assert_eq!((orders.input_rows, orders.accepted_rows), (4, 3));
    assert_eq!(orders.rejected(RejectReason::MissingTimestamp), 1);

    let reviews = report.cleaning_for(TableKind::Reviews).unwrap();
    assert_eq!((reviews.input_rows, reviews.accepted_rows), (4, 2));
    assert_eq!(reviews.rejected(RejectReason::InvalidScore), 1);
    assert_eq!(reviews.rejected(RejectReason::DuplicateRow), 1);

    let first = report.join.stage(JoinStage::OrdersReviews).unwrap();
    assert_eq!((first.unmatched_left, first.eliminated, first.output_rows), (1, 1, 2));
    let second = report.join.stage(JoinStage::ItemsPayments).unwrap();
    assert_eq!((second.unmatched_left, second.eliminated, second.output_rows), (1, 1, 5));
    let third = report.join.stage(JoinStage::OrdersLines).unwrap();
    assert_eq!((third.unmatched_left, third.eliminated, third.output_rows), (1, 0, 6));
    Ok(())
}

#[test]
fn test_repeated_runs_build_the_same_view() -> Result<()> {
    let dir = tempdir()?;
    let config = write_inputs(dir.path())?;
    let source = CsvTableSource::from_config(&config.inputs)?;
    let pipeline = Pipeline::new(&config);

    let first = pipeline.run(&source)?.view;
    let second = pipeline.run(&source)?.view;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_full_range_round_trip_and_monthly_groups() -> Result<()> {
    let dir = tempdir()?;
    let config = write_inputs(dir.path())?;
    let session = DashboardSession::new(Box::new(CsvTableSource::from_config(&config.inputs)?), &config);

    let bounds = session.bounds()?.unwrap();
    assert_eq!(bounds, (date(2018, 1, 3), date(2018, 2, 20)));

    let full = session.summarize(Some(DateRange::from_bounds(bounds)), true)?;
    assert_eq!(full.filtered_rows, session.view()?.len());
    assert_eq!(full.rows.as_deref(), Some(session.view()?.rows()));

    let json = serde_json::to_value(&full)?;
    assert_eq!(json["status_by_month"][0]["month"], "2018-01");
    assert_eq!(json["status_by_month"][0]["category"], "Delivered on time");
    assert_eq!(json["status_by_month"][0]["count"], 5);
    assert_eq!(json["status_by_month"][1]["category"], "Delivered Late");

    let payment_types: Vec<(String, usize)> = full
        .payment_type_counts
        .iter()
        .map(|c| (c.category.clone(), c.count))
        .collect();
    assert_eq!(payment_types, vec![("credit_card".to_string(), 1), ("voucher".to_string(), 4)]);

    let january = session.summarize(Some(DateRange::new(date(2018, 1, 1), date(2018, 1, 31))), false)?;
    assert_eq!(january.filtered_rows, 5);
    assert!(january.rows.is_none());
    Ok(())
}

#[test]
fn test_missing_input_file_is_fatal() -> Result<()> {
    let dir = tempdir()?;
    let config = write_inputs(dir.path())?;
    fs::remove_file(dir.path().join("items.csv"))?;

    let source = CsvTableSource::from_config(&config.inputs)?;
    let err = Pipeline::new(&config).run(&source).unwrap_err();
    assert!(matches!(err, PipelineError::MissingInput { table: TableKind::Items, .. }));
    Ok(())
}
