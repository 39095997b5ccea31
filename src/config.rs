use crate::model::ConfigError;
use crate::normalizer::{contains_run, tokenize_lower};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

const BUILTIN_RULES: &str = include_str!("../rules/default_rules.json");

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub delay_ms: u64,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub item_selector: String,
    pub price_selector: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://shopdydy.com".to_string(),
            delay_ms: 1000,
            timeout_seconds: 15,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            item_selector: ".item".to_string(),
            price_selector: ".price, .cost, .amount, [data-price]".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rules_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub csv_file: String,
    pub json_file: String,
    pub summary_file: String,
    pub database_file: String,
    pub image_extensions: Vec<String>,
    pub sku_start: u32,
    pub scrape: ScrapeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rules_path: None,
            output_dir: PathBuf::from("output"),
            csv_file: "products.csv".to_string(),
            json_file: "products.json".to_string(),
            summary_file: "catalog_summary.json".to_string(),
            database_file: "products.db".to_string(),
            image_extensions: ["png", "jpg", "jpeg", "webp"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            sku_start: 1,
            scrape: ScrapeConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = read(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// How a rule keyword is compared against a normalized identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The keyword's tokens appear as a contiguous run of the input's tokens.
    #[default]
    Token,
    /// The normalized keyword appears anywhere in the normalized input.
    Substring,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRule {
    pub keyword: String,
    pub category: String,
    pub subcategory: String,
    pub price_min: u32,
    pub price_max: u32,
    #[serde(default, rename = "match")]
    pub mode: MatchMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandRule {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default, rename = "match")]
    pub mode: MatchMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackRange {
    pub category: String,
    pub subcategory: String,
    pub price_min: u32,
    pub price_max: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CapacityTier {
    pub token: String,
    pub min_fraction: f64,
}

/// Price jitter policy. The position inside a category's range is a pure
/// function of the normalized identifier and these token lists.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PricingPolicy {
    pub premium_tokens: Vec<String>,
    pub budget_tokens: Vec<String>,
    pub capacity_tiers: Vec<CapacityTier>,
    pub usd_rate: f64,
    pub fallback: FallbackRange,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            premium_tokens: strings(&["pro", "premium", "professional", "gaming", "wireless", "smart"]),
            budget_tokens: strings(&["basic", "lite", "mini", "compact"]),
            capacity_tiers: Vec::new(),
            usd_rate: 0.08,
            fallback: FallbackRange {
                category: "Accessories".to_string(),
                subcategory: "General".to_string(),
                price_min: 50,
                price_max: 1000,
            },
        }
    }
}

/// Description and feature templates keyed by category.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentTemplates {
    pub descriptions: BTreeMap<String, String>,
    pub default_description: String,
    pub features: BTreeMap<String, Vec<String>>,
    pub default_features: Vec<String>,
}

impl Default for ContentTemplates {
    fn default() -> Self {
        Self {
            descriptions: BTreeMap::new(),
            default_description: "The {name} from {brand} offers premium quality and reliable performance for all your technology needs.".to_string(),
            features: BTreeMap::new(),
            default_features: vec![
                "Premium build quality".to_string(),
                "Reliable performance".to_string(),
                "Modern design".to_string(),
                "User-friendly operation".to_string(),
            ],
        }
    }
}

/// The static lookup tables driving classification. Loaded once, never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleTables {
    /// Reject category keywords that are contained in another rule's keyword.
    #[serde(default)]
    pub strict_disjoint: bool,
    pub categories: Vec<CategoryRule>,
    #[serde(default)]
    pub brands: Vec<BrandRule>,
    #[serde(default)]
    pub pricing: PricingPolicy,
    #[serde(default)]
    pub content: ContentTemplates,
}

impl RuleTables {
    /// The rule tables compiled into the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_RULES)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json(&read(path)?)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let tables: RuleTables = serde_json::from_str(content)?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.categories.is_empty() {
            return Err(invalid("no category rules declared"));
        }

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut compiled = Vec::with_capacity(self.categories.len());
        for (idx, rule) in self.categories.iter().enumerate() {
            let tokens = tokenize_lower(&rule.keyword);
            if tokens.is_empty() {
                return Err(invalid(format!(
                    "category rule #{idx} keyword {:?} has no alphanumeric characters",
                    rule.keyword
                )));
            }
            check_label(&rule.category, "category", idx)?;
            check_label(&rule.subcategory, "subcategory", idx)?;
            check_range(rule.price_min, rule.price_max, &format!("category rule #{idx}"))?;

            let key = tokens.join(" ");
            if let Some(first) = seen.insert(key.clone(), idx) {
                return Err(invalid(format!(
                    "keyword {key:?} declared by rules #{first} and #{idx}"
                )));
            }
            compiled.push((tokens, rule.mode));
        }

        if self.strict_disjoint {
            for (i, (needle, mode)) in compiled.iter().enumerate() {
                for (j, (haystack, _)) in compiled.iter().enumerate() {
                    if i == j {
                        continue;
                    }
                    let overlaps = match mode {
                        MatchMode::Token => contains_run(haystack, needle),
                        MatchMode::Substring => haystack.join(" ").contains(&needle.join(" ")),
                    };
                    if overlaps {
                        return Err(invalid(format!(
                            "keyword {:?} (rule #{i}) overlaps keyword {:?} (rule #{j})",
                            self.categories[i].keyword, self.categories[j].keyword
                        )));
                    }
                }
            }
        }

        for (idx, brand) in self.brands.iter().enumerate() {
            if brand.name.trim().is_empty() {
                return Err(invalid(format!("brand rule #{idx} has an empty name")));
            }
            if brand.keywords.is_empty() {
                return Err(invalid(format!("brand {:?} declares no keywords", brand.name)));
            }
            if let Some(bad) = brand.keywords.iter().find(|k| tokenize_lower(k).is_empty()) {
                return Err(invalid(format!(
                    "brand {:?} keyword {bad:?} has no alphanumeric characters",
                    brand.name
                )));
            }
        }

        let pricing = &self.pricing;
        if !pricing.usd_rate.is_finite() || pricing.usd_rate <= 0.0 {
            return Err(invalid(format!("usd_rate must be positive, got {}", pricing.usd_rate)));
        }
        for tier in &pricing.capacity_tiers {
            if !(0.0..1.0).contains(&tier.min_fraction) {
                return Err(invalid(format!(
                    "capacity tier {:?} min_fraction {} outside [0, 1)",
                    tier.token, tier.min_fraction
                )));
            }
        }
        let fallback = &pricing.fallback;
        if fallback.category.trim().is_empty() || fallback.subcategory.trim().is_empty() {
            return Err(invalid("fallback category and subcategory must be set"));
        }
        check_range(fallback.price_min, fallback.price_max, "fallback range")?;

        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(reason.into())
}

fn check_label(value: &str, field: &str, idx: usize) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(format!("category rule #{idx} has an empty {field}")));
    }
    Ok(())
}

fn check_range(min: u32, max: u32, what: &str) -> Result<(), ConfigError> {
    if min > max {
        return Err(invalid(format!("{what}: price_min {min} exceeds price_max {max}")));
    }
    Ok(())
}
