// Pipeline ingestion: gather the four raw input tables from a source

use tracing::info;

use crate::app::ports::TableSource;
use crate::error::Result;
use crate::types::{RawTable, TableKind};

/// The raw tables for one pipeline run
#[derive(Debug, Clone)]
pub struct RawInputs {
    pub orders: RawTable,
    pub payments: RawTable,
    pub items: RawTable,
    pub reviews: RawTable,
}

/// Load all inputs. Every table is checked first so an absent input aborts
/// the run before anything is read.
pub fn load_inputs(source: &dyn TableSource) -> Result<RawInputs> {
    for kind in TableKind::ALL {
        source.check(kind)?;
    }

    let inputs = RawInputs {
        orders: source.load(TableKind::Orders)?,
        payments: source.load(TableKind::Payments)?,
        items: source.load(TableKind::Items)?,
        reviews: source.load(TableKind::Reviews)?,
    };
    info!(
        orders = inputs.orders.len(),
        payments = inputs.payments.len(),
        items = inputs.items.len(),
        reviews = inputs.reviews.len(),
        "Ingested raw tables"
    );
    Ok(inputs)
}
