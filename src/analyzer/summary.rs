use crate::catalog::AssemblyStats;
use crate::model::ProductRecord;
use serde::Serialize;
use std::collections::HashMap;

const TOP_N: usize = 5;

/// Basic price statistics in whole cedis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStats {
    pub total: f64,
    pub average: f64,
    pub median: f64,
    pub min: u32,
    pub max: u32,
    pub std_dev: f64,
}

impl PriceStats {
    /// Returns `None` for an empty slice.
    pub fn from_prices(prices: &[u32]) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }
        let mut sorted = prices.to_vec();
        sorted.sort_unstable();

        let count = sorted.len() as f64;
        let total: f64 = sorted.iter().map(|&p| f64::from(p)).sum();
        let average = total / count;
        let std_dev = (sorted
            .iter()
            .map(|&p| (f64::from(p) - average).powi(2))
            .sum::<f64>()
            / count)
            .sqrt();

        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (f64::from(sorted[mid - 1]) + f64::from(sorted[mid])) / 2.0
        } else {
            f64::from(sorted[mid])
        };

        Some(Self {
            total,
            average,
            median,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            std_dev,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub total_products: usize,
    pub category_count: usize,
    pub brand_count: usize,
    pub prices: Option<PriceStats>,
    /// Most common categories, highest count first.
    pub top_categories: Vec<(String, usize)>,
    pub top_brands: Vec<(String, usize)>,
    pub assembly: AssemblyStats,
}

impl CatalogSummary {
    pub fn from_records(records: &[ProductRecord], assembly: AssemblyStats) -> Self {
        let categories = count_by(records, |r| &r.category);
        let brands = count_by(records, |r| &r.brand);
        let prices: Vec<u32> = records.iter().map(|r| r.price_ghs).collect();

        Self {
            total_products: records.len(),
            category_count: categories.len(),
            brand_count: brands.len(),
            prices: PriceStats::from_prices(&prices),
            top_categories: top(categories),
            top_brands: top(brands),
            assembly,
        }
    }
}

fn count_by<'a, F>(records: &'a [ProductRecord], field: F) -> HashMap<&'a str, usize>
where
    F: Fn(&'a ProductRecord) -> &'a String,
{
    let mut counts = HashMap::new();
    for record in records {
        *counts.entry(field(record).as_str()).or_insert(0) += 1;
    }
    counts
}

/// Highest counts first; ties broken by name so the order is stable.
fn top(counts: HashMap<&str, usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(TOP_N);
    entries
}
