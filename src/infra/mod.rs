// Adapters behind the application ports

pub mod csv_source;
pub mod in_memory_source;

pub use csv_source::CsvTableSource;
pub use in_memory_source::InMemoryTableSource;
