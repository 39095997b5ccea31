// Analyzer module: summary statistics over an assembled catalog.

pub mod summary;

pub use summary::CatalogSummary;
