//! Waste-adjusted ingredient costing for one recipe.
//!
//! Each usage row is normalized onto its cost unit's family (gram,
//! milliliter, piece), corrected by the domain policies below, then priced
//! against the ingredient's unit cost inflated by its waste index.
//!
//! Two corrections are deliberate quirks of the source data and must stay:
//!
//! - countable ingredients whose name marks them as eggs are recorded as a
//!   fixed fractional weight, so the converted quantity is divided by 30
//!   ([`CountWeightRule`]);
//! - volume costs are priced per liter while quantities normalize to
//!   milliliters, so volume quantities are rebased by 1000.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    units::{Unit, UnitCategory, convert},
};

const MILLILITERS_PER_LITER: f64 = 1000.0;

/// One ingredient row of a recipe, joined with the ingredient's current
/// price. This is the shape the gateway hands the calculator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IngredientUsage {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub quantity_used: f64,
    pub usage_unit: Unit,
    pub waste_pct: f64,
    pub cost_unit: Unit,
    pub unit_cost: f64,
}

/// Count-based weight correction.
///
/// Some countable ingredients are priced by weight but used by count: "one
/// egg" in a recipe stands for a fixed fractional weight unit, so the
/// converted quantity is divided by [`divisor`](Self::divisor). The rule
/// fires when the ingredient name contains one of the configured tokens and
/// the usage unit is countable. Override it through
/// [`Engine::builder`](crate::Engine::builder) when the catalog needs other
/// tokens or another divisor.
#[derive(Clone, Debug)]
pub struct CountWeightRule {
    tokens: Vec<String>,
    divisor: f64,
}

impl CountWeightRule {
    pub fn new(tokens: impl IntoIterator<Item = String>, divisor: f64) -> Self {
        Self {
            tokens: tokens.into_iter().map(|t| normalize_name(&t)).collect(),
            divisor,
        }
    }

    #[must_use]
    pub fn divisor(&self) -> f64 {
        self.divisor
    }

    /// Whether the correction applies to this usage row.
    #[must_use]
    pub fn applies(&self, ingredient_name: &str, usage_unit: Unit) -> bool {
        if usage_unit.category() != UnitCategory::Count {
            return false;
        }
        let name = normalize_name(ingredient_name);
        self.tokens.iter().any(|token| name.contains(token))
    }
}

impl Default for CountWeightRule {
    fn default() -> Self {
        Self::new(["egg".to_string(), "ovo".to_string()], 30.0)
    }
}

/// NFKC-fold and lowercase a name so token matching survives composed
/// accents and width variants.
fn normalize_name(name: &str) -> String {
    name.nfkc().collect::<String>().to_lowercase()
}

/// Total waste-adjusted ingredient cost of a recipe.
///
/// A recipe cannot be priced without ingredients; an empty usage list is a
/// computation error, not zero.
pub(crate) fn recipe_cost(
    usages: &[IngredientUsage],
    rule: &CountWeightRule,
) -> ResultEngine<f64> {
    if usages.is_empty() {
        return Err(EngineError::Computation(
            "no ingredients for recipe".to_string(),
        ));
    }

    let mut total = 0.0;
    for usage in usages {
        let line = line_cost(usage, rule);
        tracing::debug!(
            "ingredient {}: {} {} at {} per {} -> line cost {line:.3}",
            usage.ingredient_name,
            usage.quantity_used,
            usage.usage_unit,
            usage.unit_cost,
            usage.cost_unit,
        );
        total += line;
    }
    Ok(total)
}

/// Cost of a single usage row.
pub(crate) fn line_cost(usage: &IngredientUsage, rule: &CountWeightRule) -> f64 {
    let category = usage.cost_unit.category();

    // Unknown cost units skip normalization: the usage unit is kept as the
    // target and every factor degenerates to 1.
    let quantity_target = category.base_unit().unwrap_or(usage.usage_unit);
    let pricing_target = category.pricing_unit().unwrap_or(usage.usage_unit);

    let mut quantity = convert(usage.quantity_used, usage.usage_unit, quantity_target);
    if rule.applies(&usage.ingredient_name, usage.usage_unit) {
        quantity /= rule.divisor();
    }
    if category == UnitCategory::Volume {
        quantity /= MILLILITERS_PER_LITER;
    }

    let unit_cost = convert_unit_cost(usage.unit_cost, usage.cost_unit, pricing_target);
    let waste_factor = 1.0 + usage.waste_pct / 100.0;
    unit_cost * quantity * waste_factor
}

/// Converts a price per `from` into a price per `to`.
///
/// The kilogram/gram and liter/milliliter arms restate what the factor ratio
/// below them already computes; they are kept as named branches of the two
/// rescalings the cost tables depend on.
fn convert_unit_cost(cost: f64, from: Unit, to: Unit) -> f64 {
    match (from, to) {
        (from, to) if from == to => cost,
        (Unit::Kilogram, Unit::Gram) => cost / 1000.0,
        (Unit::Gram, Unit::Kilogram) => cost * 1000.0,
        (Unit::Liter, Unit::Milliliter) => cost / 1000.0,
        (Unit::Milliliter, Unit::Liter) => cost * 1000.0,
        (from, to) => cost * to.factor_to_base() / from.factor_to_base(),
    }
}
