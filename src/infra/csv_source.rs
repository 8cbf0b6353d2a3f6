use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::app::ports::TableSource;
use crate::config::InputConfig;
use crate::error::{PipelineError, Result};
use crate::types::{raw_cell, RawTable, TableKind};

/// Reads the four input tables from delimited files with a header row
#[derive(Debug, Clone)]
pub struct CsvTableSource {
    orders: PathBuf,
    payments: PathBuf,
    items: PathBuf,
    reviews: PathBuf,
    delimiter: u8,
}

impl CsvTableSource {
    pub fn from_config(inputs: &InputConfig) -> Result<Self> {
        Ok(Self {
            orders: inputs.orders.clone(),
            payments: inputs.payments.clone(),
            items: inputs.items.clone(),
            reviews: inputs.reviews.clone(),
            delimiter: inputs.delimiter_byte()?,
        })
    }

    pub fn path(&self, kind: TableKind) -> &Path {
        match kind {
            TableKind::Orders => &self.orders,
            TableKind::Payments => &self.payments,
            TableKind::Items => &self.items,
            TableKind::Reviews => &self.reviews,
        }
    }
}

impl TableSource for CsvTableSource {
    fn check(&self, kind: TableKind) -> Result<()> {
        let path = self.path(kind);
        if path.is_file() {
            Ok(())
        } else {
            Err(PipelineError::MissingInput {
                table: kind,
                path: path.display().to_string(),
            })
        }
    }

    fn load(&self, kind: TableKind) -> Result<RawTable> {
        self.check(kind)?;
        let path = self.path(kind);
        debug!(table = %kind, path = %path.display(), "Reading input table");

        // Ragged rows are tolerated; cleaners treat absent cells as missing
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_path(path)?;

        let headers = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();
        let mut table = RawTable::new(kind, headers);

        for record in reader.byte_records() {
            let record = record?;
            table.push_row(
                record
                    .iter()
                    .map(|field| raw_cell(&String::from_utf8_lossy(field)))
                    .collect(),
            );
        }

        info!(table = %kind, rows = table.len(), columns = table.headers.len(), "Loaded input table");
        Ok(table)
    }
}
