use crate::analyzer::CatalogSummary;
use crate::model::{ExportError, ProductRecord};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

pub fn write_json(path: &Path, records: &[ProductRecord]) -> Result<(), ExportError> {
    write_pretty(path, records)?;
    info!("JSON export completed: {} records -> {}", records.len(), path.display());
    Ok(())
}

pub fn write_summary(path: &Path, summary: &CatalogSummary) -> Result<(), ExportError> {
    write_pretty(path, summary)?;
    info!("Summary written to {}", path.display());
    Ok(())
}

fn write_pretty<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ExportError> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, value)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
