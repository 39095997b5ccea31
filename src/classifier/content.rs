// classifier/content.rs

use crate::config::ContentTemplates;
use crate::model::UNKNOWN_BRAND;
use crate::normalizer::{is_hash_like, is_numeric, Keyword, NormalizedText};
use crate::utils::{short_code, title_case};

const REF_LEN: usize = 8;
const GENERIC_BRAND_CODE: &str = "GEN";

/// Builds the display name for a classified identifier.
///
/// Tokens are title-cased and brand keywords are replaced by the canonical
/// brand name. Identifiers made only of numbers, hashes or placeholder words
/// get a name assembled from brand and subcategory instead.
pub fn display_name(
    text: &NormalizedText,
    brand: Option<(&str, &[Keyword])>,
    subcategory: &str,
    key_hash: u64,
) -> String {
    if text.is_uninformative() {
        return generic_name(text, brand.map(|(name, _)| name), subcategory, key_hash);
    }

    let mut words = Vec::with_capacity(text.original.len());
    let mut i = 0;
    while i < text.tokens.len() {
        let hit = brand.and_then(|(name, keywords)| {
            keywords
                .iter()
                .find(|k| text.tokens[i..].starts_with(&k.tokens))
                .map(|k| (name, k.tokens.len()))
        });
        match hit {
            Some((name, len)) => {
                words.push(name.to_string());
                i += len;
            }
            None => {
                words.push(title_case(&text.original[i]));
                i += 1;
            }
        }
    }
    words.join(" ")
}

fn generic_name(
    text: &NormalizedText,
    brand: Option<&str>,
    subcategory: &str,
    key_hash: u64,
) -> String {
    let reference = text
        .tokens
        .iter()
        .find(|t| is_numeric(t) || is_hash_like(t))
        .map(|t| t.chars().take(REF_LEN).collect::<String>().to_uppercase())
        .unwrap_or_else(|| format!("{:06X}", key_hash & 0xFF_FFFF));

    match brand {
        Some(brand) => format!("{brand} {subcategory} Item {reference}"),
        None => format!("{subcategory} Item {reference}"),
    }
}

fn fill(template: &str, name: &str, brand: &str, category: &str, subcategory: &str) -> String {
    template
        .replace("{name}", name)
        .replace("{brand}", brand)
        .replace("{category}", category)
        .replace("{subcategory}", subcategory)
}

pub fn description(
    templates: &ContentTemplates,
    name: &str,
    brand: &str,
    category: &str,
    subcategory: &str,
) -> String {
    let template = templates
        .descriptions
        .get(category)
        .unwrap_or(&templates.default_description);
    fill(template, name, brand, category, subcategory)
}

pub fn features(
    templates: &ContentTemplates,
    name: &str,
    brand: &str,
    category: &str,
    subcategory: &str,
) -> Vec<String> {
    templates
        .features
        .get(category)
        .unwrap_or(&templates.default_features)
        .iter()
        .map(|f| fill(f, name, brand, category, subcategory))
        .collect()
}

pub fn category_code(category: &str) -> String {
    short_code(category, 3)
}

pub fn brand_code(brand: &str) -> String {
    let code = short_code(brand, 3);
    if brand == UNKNOWN_BRAND || code.is_empty() {
        GENERIC_BRAND_CODE.to_string()
    } else {
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchMode;

    fn text(raw: &str) -> NormalizedText {
        NormalizedText::new(raw).unwrap()
    }

    fn keywords(raw: &[&str]) -> Vec<Keyword> {
        raw.iter().filter_map(|k| Keyword::new(k, MatchMode::Token)).collect()
    }

    #[test]
    fn substitutes_canonical_brand_name() {
        let kws = keywords(&["hp"]);
        let name = display_name(&text("hp_laserjet_pro_printer"), Some(("HP", &kws)), "Printers", 0);
        assert_eq!(name, "HP Laserjet Pro Printer");
    }

    #[test]
    fn multi_token_brand_keyword_collapses() {
        let kws = keywords(&["tp-link", "tplink"]);
        let name = display_name(&text("tp-link archer c6"), Some(("TP-Link", &kws)), "Routers", 0);
        assert_eq!(name, "TP-Link Archer C6");
    }

    #[test]
    fn keeps_original_capitals_without_brand() {
        let name = display_name(&text("HP_LaserJet_Pro_Printer.png"), None, "Printers", 0);
        assert_eq!(name, "HP LaserJet Pro Printer");
    }

    #[test]
    fn uninformative_identifier_gets_generic_name() {
        let name = display_name(&text("img_00234.jpg"), None, "General", 0);
        assert_eq!(name, "General Item 00234");

        let kws = keywords(&["hp"]);
        let name = display_name(&text("DSC_0042"), Some(("HP", &kws)), "Laptops", 0);
        assert_eq!(name, "HP Laptops Item 0042");
    }

    #[test]
    fn placeholder_only_name_uses_hash_reference() {
        let name = display_name(&text("screenshot copy"), None, "General", 0xABCDEF12);
        assert_eq!(name, "General Item CDEF12");
    }

    #[test]
    fn templates_fall_back_to_defaults() {
        let mut templates = ContentTemplates::default();
        templates
            .descriptions
            .insert("Office".to_string(), "Boost productivity with the {name} ({subcategory}).".to_string());

        let d = description(&templates, "HP LaserJet", "HP", "Office", "Printers");
        assert_eq!(d, "Boost productivity with the HP LaserJet (Printers).");

        let d = description(&templates, "Thing", "Acme", "Garden", "Tools");
        assert!(d.starts_with("The Thing from Acme"));

        let f = features(&templates, "Thing", "Acme", "Garden", "Tools");
        assert_eq!(f, templates.default_features);
    }

    #[test]
    fn sku_codes() {
        assert_eq!(category_code("Audio/Video"), "AUD");
        assert_eq!(brand_code("HP"), "HP");
        assert_eq!(brand_code(UNKNOWN_BRAND), "GEN");
        assert_eq!(brand_code("D-Link"), "DLI");
    }
}
