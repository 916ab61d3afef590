//! Display-figure derivation from raw listing details.
//!
//! Fee math uses exact decimal rounding so `.5` always rounds up, matching
//! what the marketplace shows sellers.

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde_json::Value;

/// Marketplace fee on every sale.
const FEE_RATE: Decimal = dec!(0.30);
/// Share of the total the buyer's payment covers after tax.
const COVERED_RATE: Decimal = dec!(0.70);

/// Round a non-negative value to the nearest integer, halves away from zero.
pub fn round_half_up(n: f64) -> i64 {
    Decimal::from_f64(n)
        .unwrap_or_default()
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

fn round_half_up_dec(d: Decimal) -> i64 {
    d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// Seller proceeds after the 30% marketplace fee.
pub fn payout(price: Option<i64>) -> Option<i64> {
    let price = price?;
    let fee = round_half_up_dec(Decimal::from(price) * FEE_RATE);
    Some((price - fee).max(0))
}

/// Covered-tax display figure: 70% of the total, rounded half-up.
pub fn covered_tax(total_price: i64) -> i64 {
    if total_price == 0 {
        return 0;
    }
    round_half_up_dec(Decimal::from(total_price) * COVERED_RATE)
}

/// Owner display string. User-type creators get an `@` prefix; group names
/// are shown unchanged.
pub fn owner(details: Option<&Value>) -> Option<String> {
    let creator = details?.get("creator")?;
    let name = creator.get("name").and_then(Value::as_str)?;
    if name.is_empty() {
        return None;
    }
    let creator_type = creator
        .get("type")
        .or_else(|| creator.get("creatorType"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    if creator_type == "user" && !name.starts_with('@') {
        Some(format!("@{name}"))
    } else {
        Some(name.to_string())
    }
}

/// Tri-state regional-pricing status: `None` without details, otherwise
/// whether the listing appears to be in regional pricing.
///
/// Heuristic: the upstream API exposes no direct flag, so any enabled
/// feature mentioning "regional" or "price" counts, in addition to the
/// active price-optimization experiment marker. Similarly named unrelated
/// features will overmatch.
pub fn regional_pricing(details: Option<&Value>) -> Option<bool> {
    let details = details?;
    let price_info = details.get("priceInformation");
    let in_experiment = price_info
        .and_then(|pi| pi.get("isInActivePriceOptimizationExperiment"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if in_experiment {
        return Some(true);
    }
    let features = price_info
        .and_then(|pi| pi.get("enabledFeatures"))
        .and_then(Value::as_array);
    if let Some(features) = features {
        for feature in features {
            let text = match feature.as_str() {
                Some(s) => s.to_lowercase(),
                None => feature.to_string().to_lowercase(),
            };
            if text.contains("regional") || text.contains("price") {
                return Some(true);
            }
        }
    }
    Some(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn half_up_rounds_midpoint_upward() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(2.4), 2);
        assert_eq!(round_half_up(0.0), 0);
        assert_eq!(round_half_up(100.0 * 0.30), 30);
    }

    #[test]
    fn payout_subtracts_fee() {
        assert_eq!(payout(Some(100)), Some(70));
        assert_eq!(payout(Some(1000)), Some(700));
        // fee on 5 is round_half_up(1.5) = 2
        assert_eq!(payout(Some(5)), Some(3));
        assert_eq!(payout(Some(0)), Some(0));
        assert_eq!(payout(None), None);
    }

    #[test]
    fn covered_tax_is_seventy_percent_half_up() {
        assert_eq!(covered_tax(0), 0);
        assert_eq!(covered_tax(100), 70);
        // 5 * 0.70 = 3.5 -> 4
        assert_eq!(covered_tax(5), 4);
    }

    #[test]
    fn owner_prefixes_users_only() {
        let user = json!({"creator": {"name": "builderman", "type": "User"}});
        assert_eq!(owner(Some(&user)).as_deref(), Some("@builderman"));

        let already = json!({"creator": {"name": "@builderman", "type": "User"}});
        assert_eq!(owner(Some(&already)).as_deref(), Some("@builderman"));

        let group = json!({"creator": {"name": "Acme", "type": "Group"}});
        assert_eq!(owner(Some(&group)).as_deref(), Some("Acme"));

        let alt_key = json!({"creator": {"name": "builderman", "creatorType": "user"}});
        assert_eq!(owner(Some(&alt_key)).as_deref(), Some("@builderman"));
    }

    #[test]
    fn owner_missing_name() {
        assert_eq!(owner(None), None);
        assert_eq!(owner(Some(&json!({}))), None);
        assert_eq!(owner(Some(&json!({"creator": {"name": ""}}))), None);
    }

    #[test]
    fn regional_tristate() {
        assert_eq!(regional_pricing(None), None);
        assert_eq!(regional_pricing(Some(&json!({}))), Some(false));

        let experiment = json!({"priceInformation": {"isInActivePriceOptimizationExperiment": true}});
        assert_eq!(regional_pricing(Some(&experiment)), Some(true));

        let regional = json!({"priceInformation": {"enabledFeatures": ["RegionalPriceVariance"]}});
        assert_eq!(regional_pricing(Some(&regional)), Some(true));

        let priced = json!({"priceInformation": {"enabledFeatures": ["DynamicPriceTier"]}});
        assert_eq!(regional_pricing(Some(&priced)), Some(true));

        let unrelated = json!({"priceInformation": {"enabledFeatures": ["SomethingElse"]}});
        assert_eq!(regional_pricing(Some(&unrelated)), Some(false));
    }
}
