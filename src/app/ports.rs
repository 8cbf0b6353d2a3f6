use crate::error::Result;
use crate::types::{RawTable, TableKind};

/// Supplier of the raw input tables
pub trait TableSource {
    /// Confirm that `kind` can be loaded without reading it. Used to fail
    /// before any stage runs when an input is absent.
    fn check(&self, kind: TableKind) -> Result<()>;

    fn load(&self, kind: TableKind) -> Result<RawTable>;
}
