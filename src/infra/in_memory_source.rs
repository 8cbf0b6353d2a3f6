use std::collections::HashMap;

use crate::app::ports::TableSource;
use crate::error::{PipelineError, Result};
use crate::types::{RawTable, TableKind};

/// In-memory table source for embedding callers and tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableSource {
    tables: HashMap<TableKind, RawTable>,
}

impl InMemoryTableSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: RawTable) -> Self {
        self.tables.insert(table.kind, table);
        self
    }
}

impl TableSource for InMemoryTableSource {
    fn check(&self, kind: TableKind) -> Result<()> {
        if self.tables.contains_key(&kind) {
            Ok(())
        } else {
            Err(PipelineError::MissingInput {
                table: kind,
                path: "<memory>".to_string(),
            })
        }
    }

    fn load(&self, kind: TableKind) -> Result<RawTable> {
        self.check(kind)?;
        Ok(self.tables[&kind].clone())
    }
}
