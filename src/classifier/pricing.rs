use crate::config::PricingPolicy;
use crate::normalizer::NormalizedText;
use sha2::{Digest, Sha256};

const TOP_QUARTILE: f64 = 0.75;
const QUARTILE: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceEstimate {
    pub ghs: u32,
    pub usd: f64,
}

/// Stable fraction in `[0, 1)` derived from SHA-256 of `key`.
///
/// Uses the top 53 bits of the digest's first 8 bytes so the conversion to
/// `f64` is exact and can never reach 1.0.
pub fn stable_fraction(key: &str) -> f64 {
    let hash = Sha256::digest(key.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[..8]);
    let bits = u64::from_be_bytes(bytes) >> 11;
    bits as f64 / (1u64 << 53) as f64
}

/// Position inside the price range after the token modifiers are applied.
pub fn range_position(text: &NormalizedText, policy: &PricingPolicy) -> f64 {
    let mut frac = stable_fraction(&text.key);

    if policy.premium_tokens.iter().any(|t| text.has_token(t)) {
        frac = TOP_QUARTILE + QUARTILE * frac;
    } else if policy.budget_tokens.iter().any(|t| text.has_token(t)) {
        frac *= QUARTILE;
    }

    policy
        .capacity_tiers
        .iter()
        .filter(|tier| text.has_token(&tier.token))
        .fold(frac, |acc, tier| acc.max(tier.min_fraction))
}

/// Whole-cedi price inside `[min, max]`, plus its USD conversion.
pub fn estimate_price(
    text: &NormalizedText,
    min: u32,
    max: u32,
    policy: &PricingPolicy,
) -> PriceEstimate {
    let frac = range_position(text, policy);
    let raw = f64::from(min) + frac * f64::from(max - min);
    let ghs = (raw.round() as u32).clamp(min, max);
    PriceEstimate {
        ghs,
        usd: to_usd(ghs, policy.usd_rate),
    }
}

pub fn to_usd(ghs: u32, usd_rate: f64) -> f64 {
    (f64::from(ghs) * usd_rate * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CapacityTier;

    fn text(raw: &str) -> NormalizedText {
        NormalizedText::new(raw).unwrap()
    }

    #[test]
    fn fraction_is_stable_and_bounded() {
        for key in ["canon camera v1", "img 00234", "", "hp laserjet pro printer"] {
            let a = stable_fraction(key);
            assert_eq!(a, stable_fraction(key));
            assert!((0.0..1.0).contains(&a), "{key}: {a}");
        }
        assert_ne!(stable_fraction("router a"), stable_fraction("router b"));
    }

    #[test]
    fn price_stays_inside_range() {
        let policy = PricingPolicy::default();
        for raw in ["router one", "router two pro", "router mini", "x", "ssd 4tb"] {
            let price = estimate_price(&text(raw), 800, 2000, &policy);
            assert!((800..=2000).contains(&price.ghs), "{raw}: {}", price.ghs);
        }
    }

    #[test]
    fn degenerate_range_yields_its_bound() {
        let policy = PricingPolicy::default();
        let price = estimate_price(&text("anything"), 500, 500, &policy);
        assert_eq!(price.ghs, 500);
        assert_eq!(price.usd, 40.0);
    }

    #[test]
    fn premium_token_lands_in_top_quartile() {
        let policy = PricingPolicy::default();
        for raw in ["LaserJet Pro", "Smart TV 43", "Gaming Headset X"] {
            let price = estimate_price(&text(raw), 1000, 2000, &policy);
            assert!(price.ghs >= 1750, "{raw}: {}", price.ghs);
        }
    }

    #[test]
    fn budget_token_lands_in_bottom_quartile() {
        let policy = PricingPolicy::default();
        let price = estimate_price(&text("Speaker Mini"), 1000, 2000, &policy);
        assert!(price.ghs <= 1250, "{}", price.ghs);
    }

    #[test]
    fn premium_detection_uses_whole_tokens() {
        let policy = PricingPolicy::default();
        let projector = text("Projector HD");
        let base = stable_fraction(&projector.key);
        assert_eq!(range_position(&projector, &policy), base);
    }

    #[test]
    fn capacity_tier_raises_floor() {
        let mut policy = PricingPolicy::default();
        policy.capacity_tiers.push(CapacityTier {
            token: "4tb".to_string(),
            min_fraction: 0.9,
        });
        let price = estimate_price(&text("Seagate Expansion 4TB"), 400, 1200, &policy);
        assert!(price.ghs >= 1120, "{}", price.ghs);
    }

    #[test]
    fn usd_conversion_rounds_to_cents() {
        assert_eq!(to_usd(1234, 0.08), 98.72);
        assert_eq!(to_usd(333, 0.0833), 27.74);
    }
}
