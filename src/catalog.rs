// Catalog assembly: classify candidates in order, drop duplicates, assign SKUs.
use crate::classifier::Classifier;
use crate::model::{ClassifyError, ProductCandidate, ProductRecord};
use crate::normalizer::tokenize_lower;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyStats {
    pub accepted: usize,
    pub duplicates_dropped: usize,
    pub skipped_invalid: usize,
    /// Candidates left without a SKU once the sequence reached `u32::MAX`.
    pub sequence_exhausted: usize,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub records: Vec<ProductRecord>,
    pub stats: AssemblyStats,
}

/// Ordered reduction over classified candidates.
///
/// Owns the SKU sequence and the dedup set; both advance strictly in push
/// order, so the first of two duplicates always survives.
pub struct CatalogAssembler<'a> {
    classifier: &'a Classifier,
    /// `None` once the last sequence number has been handed out.
    next_seq: Option<u32>,
    date_added: NaiveDate,
    seen: HashSet<(String, u32)>,
    skus: HashSet<String>,
    records: Vec<ProductRecord>,
    stats: AssemblyStats,
}

impl<'a> CatalogAssembler<'a> {
    pub fn new(classifier: &'a Classifier, start_seq: u32, date_added: NaiveDate) -> Self {
        Self {
            classifier,
            next_seq: Some(start_seq),
            date_added,
            seen: HashSet::new(),
            skus: HashSet::new(),
            records: Vec::new(),
            stats: AssemblyStats::default(),
        }
    }

    /// Marks SKUs as taken, e.g. the ones already stored from an earlier batch.
    pub fn reserve_skus<I>(&mut self, skus: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.skus.extend(skus);
    }

    /// Classifies and appends one candidate. Returns the new record, or `None`
    /// when the candidate was invalid or a duplicate.
    pub fn push(&mut self, candidate: ProductCandidate) -> Option<&ProductRecord> {
        let classification = match self.classifier.classify(&candidate.raw) {
            Ok(c) => c,
            Err(ClassifyError::InvalidInput { raw }) => {
                warn!("Skipping invalid candidate {:?}", raw);
                self.stats.skipped_invalid += 1;
                return None;
            }
        };

        let dedup_key = (name_key(&classification.name), classification.price_ghs);
        if self.seen.contains(&dedup_key) {
            debug!("Duplicate dropped: {} ({} GHS)", classification.name, classification.price_ghs);
            self.stats.duplicates_dropped += 1;
            return None;
        }

        let Some(seq) = self.next_seq else {
            warn!("SKU sequence exhausted, skipping {}", classification.name);
            self.stats.sequence_exhausted += 1;
            return None;
        };
        self.next_seq = seq.checked_add(1);
        self.seen.insert(dedup_key);

        let base = format!(
            "{}-{}-{:04}",
            classification.category_code, classification.brand_code, seq
        );
        let sku = self.unique_sku(base);

        let record = ProductRecord::from_classification(
            classification,
            sku,
            candidate.image_path,
            self.date_added,
        );
        debug!("Accepted {} -> {}", record.sku, record.name);
        self.stats.accepted += 1;
        self.records.push(record);
        self.records.last()
    }

    pub fn finish(self) -> Catalog {
        Catalog {
            records: self.records,
            stats: self.stats,
        }
    }

    fn unique_sku(&mut self, base: String) -> String {
        let mut sku = base.clone();
        let mut n = 2;
        while self.skus.contains(&sku) {
            sku = format!("{base}-{n}");
            n += 1;
        }
        self.skus.insert(sku.clone());
        sku
    }
}

/// Runs a whole batch through a fresh assembler.
pub fn assemble<I>(
    classifier: &Classifier,
    candidates: I,
    start_seq: u32,
    date_added: NaiveDate,
) -> Catalog
where
    I: IntoIterator<Item = ProductCandidate>,
{
    let mut assembler = CatalogAssembler::new(classifier, start_seq, date_added);
    for candidate in candidates {
        assembler.push(candidate);
    }
    assembler.finish()
}

fn name_key(name: &str) -> String {
    tokenize_lower(name).join(" ")
}
