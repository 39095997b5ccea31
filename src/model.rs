// Core structs: ProductCandidate, Classification, ProductRecord, ScrapedListing
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONDITION: &str = "New";
pub const DEFAULT_STOCK_STATUS: &str = "In Stock";
pub const UNKNOWN_BRAND: &str = "Unknown";

/// One raw identifier waiting to be classified: a filename or a scraped title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCandidate {
    pub raw: String,
    pub image_path: Option<String>,
}

impl ProductCandidate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            image_path: None,
        }
    }

    pub fn with_image(raw: impl Into<String>, image_path: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            image_path: Some(image_path.into()),
        }
    }
}

/// Everything the classifier derives from a raw identifier.
///
/// SKU, image path and date are assigned by the catalog assembler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Lowercased tokens joined by single spaces; the price hash input.
    pub key: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub features: Vec<String>,
    pub price_ghs: u32,
    pub price_usd: f64,
    /// Index of the matched category rule, `None` for the fallback.
    pub category_rule: Option<usize>,
    pub category_code: String,
    pub brand_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub features: Vec<String>,
    pub price_ghs: u32,
    pub price_usd: f64,
    pub condition: String,
    pub stock_status: String,
    pub image_path: Option<String>,
    pub date_added: NaiveDate,
}

impl ProductRecord {
    pub fn from_classification(
        classification: Classification,
        sku: String,
        image_path: Option<String>,
        date_added: NaiveDate,
    ) -> Self {
        Self {
            sku,
            name: classification.name,
            brand: classification.brand,
            category: classification.category,
            subcategory: classification.subcategory,
            description: classification.description,
            features: classification.features,
            price_ghs: classification.price_ghs,
            price_usd: classification.price_usd,
            condition: DEFAULT_CONDITION.to_string(),
            stock_status: DEFAULT_STOCK_STATUS.to_string(),
            image_path,
            date_added,
        }
    }
}

/// A product tile parsed from a shop category page.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedListing {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub product_url: String,
}

impl ScrapedListing {
    /// Turns the listing into a classifier candidate; listings without a name yield nothing.
    pub fn into_candidate(self) -> Option<ProductCandidate> {
        let name = self.name?;
        Some(ProductCandidate {
            raw: name,
            image_path: self.image_url,
        })
    }
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("invalid input {raw:?}: identifier has no alphanumeric content")]
    InvalidInput { raw: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid rule table: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    InvalidResponse { url: String, status: u16 },
    #[error("invalid url {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("html parse error: {0}")]
    HtmlParseError(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
