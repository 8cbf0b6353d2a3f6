// Pipeline processing: field parsing, cleaning, derivation, joins and aggregation

pub mod normalize;
pub mod quality_gate;
pub mod enrich;
pub mod join;
pub mod aggregate;
