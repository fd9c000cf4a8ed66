//! Reaction records.

use std::collections::BTreeMap;

use kf_rates::RateExpression;

use crate::error::{KineticsError, KineticsResult};

/// Third-body collision partner specification.
///
/// A generic collider "M" sums all species concentrations weighted by their
/// efficiencies; an explicit collider restricts the reaction to a single
/// named partner.
#[derive(Debug, Clone, PartialEq)]
pub struct ThirdBody {
    /// Per-species efficiency overrides (species name → efficiency)
    pub efficiencies: BTreeMap<String, f64>,
    /// Efficiency of every species not listed in `efficiencies`
    pub default_efficiency: f64,
    /// Explicit collider species, if the reaction names one instead of "M"
    pub explicit_collider: Option<String>,
}

impl Default for ThirdBody {
    fn default() -> Self {
        Self {
            efficiencies: BTreeMap::new(),
            default_efficiency: 1.0,
            explicit_collider: None,
        }
    }
}

impl ThirdBody {
    /// Generic collider with default efficiency 1 for every species.
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit collider restricted to one species.
    pub fn explicit(species: impl Into<String>) -> Self {
        Self {
            explicit_collider: Some(species.into()),
            ..Self::default()
        }
    }

    /// Override the efficiency of one species.
    pub fn with_efficiency(mut self, species: impl Into<String>, efficiency: f64) -> Self {
        self.efficiencies.insert(species.into(), efficiency);
        self
    }

    /// Efficiency of the named species under this specification.
    pub fn efficiency(&self, species: &str) -> f64 {
        if let Some(x) = &self.explicit_collider {
            return if x == species { 1.0 } else { 0.0 };
        }
        self.efficiencies
            .get(species)
            .copied()
            .unwrap_or(self.default_efficiency)
    }
}

/// A single reaction: stoichiometry, rate expression and flags.
///
/// Immutable once added to a kinetics manager; parameter changes go through
/// `modify_reaction`, which re-validates that everything but the rate
/// parameters is unchanged.
pub struct Reaction {
    /// Reactant stoichiometric coefficients (may be fractional)
    pub reactants: BTreeMap<String, f64>,
    /// Product stoichiometric coefficients (may be fractional)
    pub products: BTreeMap<String, f64>,
    /// Forward rate-constant expression
    pub rate: Box<dyn RateExpression>,
    /// Whether the reverse direction proceeds (via detailed balance)
    pub reversible: bool,
    /// Whether this reaction is an intentional duplicate of another
    pub duplicate: bool,
    /// Third-body collision partner, if any
    pub third_body: Option<ThirdBody>,
}

impl Reaction {
    /// Create a reversible reaction. Coefficients for a species repeated in
    /// the input are summed.
    pub fn new(
        reactants: &[(&str, f64)],
        products: &[(&str, f64)],
        rate: Box<dyn RateExpression>,
    ) -> KineticsResult<Self> {
        let reactants = collect_coeffs(reactants)?;
        let products = collect_coeffs(products)?;
        if reactants.is_empty() && products.is_empty() {
            return Err(KineticsError::InvalidReaction {
                what: "reaction has neither reactants nor products",
            });
        }
        rate.validate()?;
        Ok(Self {
            reactants,
            products,
            rate,
            reversible: true,
            duplicate: false,
            third_body: None,
        })
    }

    pub fn irreversible(mut self) -> Self {
        self.reversible = false;
        self
    }

    pub fn with_third_body(mut self, third_body: ThirdBody) -> Self {
        self.third_body = Some(third_body);
        self
    }

    pub fn mark_duplicate(mut self) -> Self {
        self.duplicate = true;
        self
    }

    /// Every species name this reaction references (both sides).
    pub fn species(&self) -> impl Iterator<Item = &str> {
        self.reactants.keys().chain(self.products.keys()).map(|s| s.as_str())
    }

    /// Human-readable equation, e.g. "2 H2 + O2 <=> 2 H2O".
    pub fn equation(&self) -> String {
        let collider = match &self.third_body {
            Some(tb) => match &tb.explicit_collider {
                Some(x) => format!(" + {x}"),
                None => " + M".to_string(),
            },
            None => String::new(),
        };
        let arrow = if self.reversible { "<=>" } else { "=>" };
        format!(
            "{}{} {} {}{}",
            render_side(&self.reactants),
            collider,
            arrow,
            render_side(&self.products),
            collider,
        )
    }

    /// Whether `other` differs only in its rate parameters.
    pub fn same_structure(&self, other: &Reaction) -> bool {
        self.reactants == other.reactants
            && self.products == other.products
            && self.reversible == other.reversible
            && self.third_body == other.third_body
            && self.rate.rate_type() == other.rate.rate_type()
    }
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaction")
            .field("equation", &self.equation())
            .field("rate_type", &self.rate.rate_type())
            .field("duplicate", &self.duplicate)
            .finish()
    }
}

fn collect_coeffs(side: &[(&str, f64)]) -> KineticsResult<BTreeMap<String, f64>> {
    let mut map = BTreeMap::new();
    for (name, nu) in side {
        if !nu.is_finite() || *nu <= 0.0 {
            return Err(KineticsError::InvalidReaction {
                what: "stoichiometric coefficients must be positive and finite",
            });
        }
        *map.entry((*name).to_string()).or_insert(0.0) += nu;
    }
    Ok(map)
}

fn render_side(side: &BTreeMap<String, f64>) -> String {
    side.iter()
        .map(|(name, nu)| {
            if (*nu - 1.0).abs() < f64::EPSILON {
                name.clone()
            } else {
                format!("{nu} {name}")
            }
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kf_rates::ConstantRate;

    fn rate() -> Box<dyn RateExpression> {
        Box::new(ConstantRate::new(1.0))
    }

    #[test]
    fn equation_rendering() {
        let r = Reaction::new(&[("H2", 2.0), ("O2", 1.0)], &[("H2O", 2.0)], rate()).unwrap();
        assert_eq!(r.equation(), "2 H2 + O2 <=> 2 H2O");

        let r = Reaction::new(&[("A", 1.0)], &[("B", 1.0)], rate())
            .unwrap()
            .irreversible();
        assert_eq!(r.equation(), "A => B");

        let r = Reaction::new(&[("A", 1.0)], &[("B", 1.0)], rate())
            .unwrap()
            .with_third_body(ThirdBody::new());
        assert_eq!(r.equation(), "A + M <=> B + M");

        let r = Reaction::new(&[("A", 1.0)], &[("B", 1.0)], rate())
            .unwrap()
            .with_third_body(ThirdBody::explicit("H2O"));
        assert_eq!(r.equation(), "A + H2O <=> B + H2O");
    }

    #[test]
    fn repeated_species_coefficients_sum() {
        let r = Reaction::new(&[("H", 1.0), ("H", 1.0)], &[("H2", 1.0)], rate()).unwrap();
        assert_eq!(r.reactants["H"], 2.0);
    }

    #[test]
    fn fractional_coefficients_survive() {
        let r = Reaction::new(&[("A", 0.5)], &[("B", 1.5)], rate()).unwrap();
        assert_eq!(r.reactants["A"], 0.5);
        assert_eq!(r.products["B"], 1.5);
    }

    #[test]
    fn rejects_nonpositive_coefficients() {
        assert!(Reaction::new(&[("A", 0.0)], &[("B", 1.0)], rate()).is_err());
        assert!(Reaction::new(&[("A", -1.0)], &[("B", 1.0)], rate()).is_err());
        assert!(Reaction::new(&[("A", f64::NAN)], &[("B", 1.0)], rate()).is_err());
    }

    #[test]
    fn third_body_efficiency_lookup() {
        let tb = ThirdBody::new().with_efficiency("H2O", 6.0);
        assert_eq!(tb.efficiency("H2O"), 6.0);
        assert_eq!(tb.efficiency("N2"), 1.0);

        let tb = ThirdBody::explicit("H2O");
        assert_eq!(tb.efficiency("H2O"), 1.0);
        assert_eq!(tb.efficiency("N2"), 0.0);
    }

    #[test]
    fn same_structure_ignores_rate_parameters() {
        let a = Reaction::new(&[("A", 1.0)], &[("B", 1.0)], Box::new(ConstantRate::new(1.0)))
            .unwrap();
        let b = Reaction::new(&[("A", 1.0)], &[("B", 1.0)], Box::new(ConstantRate::new(9.0)))
            .unwrap();
        assert!(a.same_structure(&b));

        let c = Reaction::new(&[("A", 1.0)], &[("C", 1.0)], Box::new(ConstantRate::new(1.0)))
            .unwrap();
        assert!(!a.same_structure(&c));
    }
}
