//! Measurement units and quantity conversion.
//!
//! Three disjoint unit families are recognized: mass (base gram), volume
//! (base milliliter) and countable (base piece). Unit strings coming from the
//! store are folded into the closed [`Unit`] enum at the ingestion boundary;
//! anything unrecognized maps to [`Unit::Unknown`], which converts with a
//! factor of 1 so that costing degrades silently instead of failing on a
//! misspelled unit.

use serde::{Deserialize, Serialize};

/// Measurement family a unit belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    Mass,
    Volume,
    Count,
    Unknown,
}

impl UnitCategory {
    /// The unit quantities of this family are normalized to before any cost
    /// arithmetic.
    #[must_use]
    pub const fn base_unit(self) -> Option<Unit> {
        match self {
            UnitCategory::Mass => Some(Unit::Gram),
            UnitCategory::Volume => Some(Unit::Milliliter),
            UnitCategory::Count => Some(Unit::Piece),
            UnitCategory::Unknown => None,
        }
    }

    /// The unit this family's costs are expressed in. Mass is priced per
    /// gram and countable goods per piece, but volume is priced per liter
    /// even though quantities normalize to milliliters.
    #[must_use]
    pub const fn pricing_unit(self) -> Option<Unit> {
        match self {
            UnitCategory::Mass => Some(Unit::Gram),
            UnitCategory::Volume => Some(Unit::Liter),
            UnitCategory::Count => Some(Unit::Piece),
            UnitCategory::Unknown => None,
        }
    }
}

/// A supported measurement unit.
///
/// # Examples
///
/// ```rust
/// use engine::{Unit, UnitCategory};
///
/// assert_eq!(Unit::parse(" KG "), Unit::Kilogram);
/// assert_eq!(Unit::parse("unidades"), Unit::Piece);
/// assert_eq!(Unit::parse("cup"), Unit::Unknown);
/// assert_eq!(Unit::Liter.category(), UnitCategory::Volume);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    // Mass, factors to gram.
    Milligram,
    Centigram,
    Decigram,
    Gram,
    Decagram,
    Hectogram,
    Kilogram,
    // Volume, factors to milliliter.
    Milliliter,
    Centiliter,
    Deciliter,
    Liter,
    Decaliter,
    Hectoliter,
    Kiloliter,
    // Countable.
    Piece,
    // Anything the tables do not know. Converts with factor 1.
    Unknown,
}

impl Unit {
    /// Folds a raw unit string into a `Unit`, lower-casing and trimming the
    /// input. Unrecognized strings become [`Unit::Unknown`]; this is a
    /// fallback, not an error.
    #[must_use]
    pub fn parse(value: &str) -> Unit {
        match value.trim().to_lowercase().as_str() {
            "mg" => Unit::Milligram,
            "cg" => Unit::Centigram,
            "dg" => Unit::Decigram,
            "g" => Unit::Gram,
            "dag" => Unit::Decagram,
            "hg" => Unit::Hectogram,
            "kg" => Unit::Kilogram,
            "ml" => Unit::Milliliter,
            "cl" => Unit::Centiliter,
            "dl" => Unit::Deciliter,
            "l" => Unit::Liter,
            "dal" => Unit::Decaliter,
            "hl" => Unit::Hectoliter,
            "kl" => Unit::Kiloliter,
            "un" | "unit" | "units" | "unidade" | "unidades" => Unit::Piece,
            _ => Unit::Unknown,
        }
    }

    /// Canonical symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Unit::Milligram => "mg",
            Unit::Centigram => "cg",
            Unit::Decigram => "dg",
            Unit::Gram => "g",
            Unit::Decagram => "dag",
            Unit::Hectogram => "hg",
            Unit::Kilogram => "kg",
            Unit::Milliliter => "ml",
            Unit::Centiliter => "cl",
            Unit::Deciliter => "dl",
            Unit::Liter => "l",
            Unit::Decaliter => "dal",
            Unit::Hectoliter => "hl",
            Unit::Kiloliter => "kl",
            Unit::Piece => "un",
            Unit::Unknown => "?",
        }
    }

    /// The family owning this unit.
    #[must_use]
    pub const fn category(self) -> UnitCategory {
        match self {
            Unit::Milligram
            | Unit::Centigram
            | Unit::Decigram
            | Unit::Gram
            | Unit::Decagram
            | Unit::Hectogram
            | Unit::Kilogram => UnitCategory::Mass,
            Unit::Milliliter
            | Unit::Centiliter
            | Unit::Deciliter
            | Unit::Liter
            | Unit::Decaliter
            | Unit::Hectoliter
            | Unit::Kiloliter => UnitCategory::Volume,
            Unit::Piece => UnitCategory::Count,
            Unit::Unknown => UnitCategory::Unknown,
        }
    }

    /// Multiplicative factor from this unit to its family's base unit.
    /// Unknown units fall back to 1, making their conversions a no-op.
    #[must_use]
    pub const fn factor_to_base(self) -> f64 {
        match self {
            Unit::Milligram => 0.001,
            Unit::Centigram => 0.01,
            Unit::Decigram => 0.1,
            Unit::Gram => 1.0,
            Unit::Decagram => 10.0,
            Unit::Hectogram => 100.0,
            Unit::Kilogram => 1000.0,
            Unit::Milliliter => 1.0,
            Unit::Centiliter => 10.0,
            Unit::Deciliter => 100.0,
            Unit::Liter => 1000.0,
            Unit::Decaliter => 10_000.0,
            Unit::Hectoliter => 100_000.0,
            Unit::Kiloliter => 1_000_000.0,
            Unit::Piece => 1.0,
            Unit::Unknown => 1.0,
        }
    }
}

impl core::fmt::Display for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Converts a quantity between two units.
///
/// Non-finite quantities (the store's NULL column read as NaN, bad imports)
/// convert to 0. Converting between two unknown units is the identity, and
/// conversions within one family are exact factor ratios.
///
/// ```rust
/// use engine::{Unit, convert};
///
/// assert_eq!(convert(2.0, Unit::Kilogram, Unit::Gram), 2000.0);
/// assert_eq!(convert(5.0, Unit::Unknown, Unit::Unknown), 5.0);
/// ```
#[must_use]
pub fn convert(quantity: f64, from: Unit, to: Unit) -> f64 {
    if !quantity.is_finite() {
        return 0.0;
    }
    quantity * from.factor_to_base() / to.factor_to_base()
}
