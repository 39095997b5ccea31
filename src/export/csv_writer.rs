use crate::model::{ExportError, ProductRecord};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub const CSV_HEADER: [&str; 13] = [
    "sku",
    "name",
    "brand",
    "category",
    "subcategory",
    "price_ghs",
    "price_usd",
    "description",
    "features",
    "condition",
    "stock_status",
    "image_path",
    "date_added",
];

const FEATURE_SEPARATOR: &str = "; ";

pub fn write_csv(path: &Path, records: &[ProductRecord]) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_csv_to(file, records)?;
    info!("CSV export completed: {} records -> {}", records.len(), path.display());
    Ok(())
}

/// Header row first, even for an empty catalog.
pub fn write_csv_to<W: Write>(out: W, records: &[ProductRecord]) -> Result<(), ExportError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(CSV_HEADER)?;

    for record in records {
        writer.write_record([
            record.sku.clone(),
            record.name.clone(),
            record.brand.clone(),
            record.category.clone(),
            record.subcategory.clone(),
            record.price_ghs.to_string(),
            format!("{:.2}", record.price_usd),
            record.description.clone(),
            record.features.join(FEATURE_SEPARATOR),
            record.condition.clone(),
            record.stock_status.clone(),
            record.image_path.clone().unwrap_or_default(),
            record.date_added.format("%Y-%m-%d").to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
