// Classifier module: maps one raw identifier to category, brand, price and content.

pub mod content;
pub mod pricing;

use crate::config::{MatchMode, RuleTables};
use crate::model::{Classification, ClassifyError, ConfigError, UNKNOWN_BRAND};
use crate::normalizer::{first_match, Keyword, NormalizedText};
use sha2::{Digest, Sha256};

/// Rule-table driven product classifier.
///
/// Holds the tables it was built from plus their keywords compiled for
/// matching. `classify` has no side effects and no hidden state, so the same
/// input against the same tables always yields the same classification.
pub struct Classifier {
    tables: RuleTables,
    category_keywords: Vec<Vec<Keyword>>,
    brand_keywords: Vec<Vec<Keyword>>,
    /// Each brand's own name as a keyword, used to restore its spelling in display names.
    brand_names: Vec<Option<Keyword>>,
}

impl Classifier {
    pub fn new(tables: RuleTables) -> Result<Self, ConfigError> {
        tables.validate()?;

        let category_keywords = tables
            .categories
            .iter()
            .map(|rule| compile(std::slice::from_ref(&rule.keyword), rule.mode))
            .collect::<Result<Vec<_>, _>>()?;
        let brand_keywords = tables
            .brands
            .iter()
            .map(|rule| compile(&rule.keywords, rule.mode))
            .collect::<Result<Vec<_>, _>>()?;
        let brand_names = tables
            .brands
            .iter()
            .map(|rule| Keyword::new(&rule.name, MatchMode::Token))
            .collect();

        Ok(Self {
            tables,
            category_keywords,
            brand_keywords,
            brand_names,
        })
    }

    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    pub fn classify(&self, raw: &str) -> Result<Classification, ClassifyError> {
        let text = NormalizedText::new(raw).ok_or_else(|| ClassifyError::InvalidInput {
            raw: raw.to_string(),
        })?;

        let category_rule = first_match(&text, self.category_keywords.iter().map(Vec::as_slice));
        let (category, subcategory, min, max) = match category_rule {
            Some(idx) => {
                let rule = &self.tables.categories[idx];
                (&rule.category, &rule.subcategory, rule.price_min, rule.price_max)
            }
            None => {
                let fallback = &self.tables.pricing.fallback;
                (
                    &fallback.category,
                    &fallback.subcategory,
                    fallback.price_min,
                    fallback.price_max,
                )
            }
        };

        let brand_rule = first_match(&text, self.brand_keywords.iter().map(Vec::as_slice));
        let brand = brand_rule.map(|idx| {
            (
                self.tables.brands[idx].name.as_str(),
                self.brand_names[idx].as_slice(),
            )
        });
        let brand_name = brand.map_or(UNKNOWN_BRAND, |(name, _)| name);

        let price = pricing::estimate_price(&text, min, max, &self.tables.pricing);

        let name = content::display_name(&text, brand, subcategory, key_hash(&text.key));
        let templates = &self.tables.content;
        let description = content::description(templates, &name, brand_name, category, subcategory);
        let features = content::features(templates, &name, brand_name, category, subcategory);

        Ok(Classification {
            name,
            brand: brand_name.to_string(),
            category: category.clone(),
            subcategory: subcategory.clone(),
            description,
            features,
            price_ghs: price.ghs,
            price_usd: price.usd,
            category_rule,
            category_code: content::category_code(category),
            brand_code: content::brand_code(brand_name),
            key: text.key,
        })
    }
}

fn compile(keywords: &[String], mode: MatchMode) -> Result<Vec<Keyword>, ConfigError> {
    keywords
        .iter()
        .map(|k| {
            Keyword::new(k, mode).ok_or_else(|| ConfigError::Invalid(format!("unusable keyword {k:?}")))
        })
        .collect()
}

fn key_hash(key: &str) -> u64 {
    let hash = Sha256::digest(key.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[8..16]);
    u64::from_be_bytes(bytes)
}
