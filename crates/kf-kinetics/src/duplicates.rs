//! Duplicate-reaction detection and handling.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::error::{KineticsError, KineticsResult};
use crate::kinetics::BulkKinetics;

/// How to handle duplicate reaction pairs where one reaction carries an
/// explicit third-body collider and the other a generic collider with a
/// non-zero efficiency for it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThirdBodyDuplicateHandling {
    /// Log and continue (default)
    #[default]
    Warn,
    /// Fail immediately
    Error,
    /// Flip both reactions' duplicate flags
    MarkDuplicate,
    /// Zero the generic collider's efficiency for the explicit species
    ModifyEfficiency,
}

impl ThirdBodyDuplicateHandling {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Error => "error",
            Self::MarkDuplicate => "mark-duplicate",
            Self::ModifyEfficiency => "modify-efficiency",
        }
    }
}

impl std::str::FromStr for ThirdBodyDuplicateHandling {
    type Err = KineticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "mark-duplicate" => Ok(Self::MarkDuplicate),
            "modify-efficiency" => Ok(Self::ModifyEfficiency),
            _ => Err(KineticsError::InvalidOperation {
                what: "unknown third-body duplicate handling flag",
            }),
        }
    }
}

/// Compare two signed-key participation maps.
///
/// Returns the scalar ratio when one stoichiometry is a multiple of the
/// other — negative when the reactions are written in opposite directions —
/// and 0.0 otherwise. Swapping the arguments returns the reciprocal.
pub fn check_duplicate_stoich(r1: &BTreeMap<i64, f64>, r2: &BTreeMap<i64, f64>) -> f64 {
    let keys: BTreeSet<i64> = r1.keys().chain(r2.keys()).copied().collect();
    let Some((&k1, &v1)) = r1.iter().next() else {
        return 0.0;
    };
    let get = |m: &BTreeMap<i64, f64>, k: i64| m.get(&k).copied().unwrap_or(0.0);

    // same direction
    if get(r2, k1) != 0.0 {
        let ratio = get(r2, k1) / v1;
        let mut different = false;
        for &k in &keys {
            let a = get(r1, k);
            let b = get(r2, k);
            if (a != 0.0) != (b != 0.0) || (a != 0.0 && (b / a - ratio).abs() > 1e-8) {
                different = true;
                break;
            }
        }
        if !different {
            return ratio;
        }
    }

    // opposite direction
    if get(r2, -k1) == 0.0 {
        return 0.0;
    }
    let ratio = get(r2, -k1) / v1;
    for &k in &keys {
        let a = get(r1, k);
        let b = get(r2, -k);
        if (a != 0.0) != (b != 0.0) || (a != 0.0 && (b / a - ratio).abs() > 1e-8) {
            return 0.0;
        }
    }
    ratio
}

enum TbRelation {
    /// Colliders (or their absence) agree; the pair is an ordinary duplicate
    Plain,
    /// One reaction names an explicit collider the other covers generically
    ExplicitVsGeneric {
        generic: usize,
        explicit_species: usize,
    },
    /// Collider structure differs; the reactions describe distinct processes
    Incompatible,
}

impl BulkKinetics {
    fn third_body_relation(&self, i: usize, j: usize) -> TbRelation {
        match (&self.third_bodies[i], &self.third_bodies[j]) {
            (None, None) => TbRelation::Plain,
            (Some(a), Some(b)) => match (a.explicit, b.explicit) {
                (None, None) => TbRelation::Plain,
                (Some(x), Some(y)) if x == y => TbRelation::Plain,
                (Some(_), Some(_)) => TbRelation::Incompatible,
                (Some(x), None) => {
                    if b.efficiency_of(x) != 0.0 {
                        TbRelation::ExplicitVsGeneric {
                            generic: j,
                            explicit_species: x,
                        }
                    } else {
                        TbRelation::Incompatible
                    }
                }
                (None, Some(y)) => {
                    if a.efficiency_of(y) != 0.0 {
                        TbRelation::ExplicitVsGeneric {
                            generic: i,
                            explicit_species: y,
                        }
                    } else {
                        TbRelation::Incompatible
                    }
                }
            },
            _ => TbRelation::Incompatible,
        }
    }

    /// Scan all reaction pairs for unmarked duplicates and unmatched
    /// duplicate markings.
    ///
    /// With `throw_err`, the first conflict raises. With `fix` (and
    /// `throw_err` false), duplicate flags are corrected in place. With
    /// neither, the indices of the first offending pair are returned — an
    /// unmatched marking reports its own index as both elements — or `None`
    /// when the mechanism is clean.
    pub fn check_duplicates(
        &mut self,
        throw_err: bool,
        fix: bool,
    ) -> KineticsResult<Option<(usize, usize)>> {
        let n = self.reactions.len();
        let maps: Vec<BTreeMap<i64, f64>> =
            (0..n).map(|i| self.stoich.participation_map(i)).collect();
        let mut matched = vec![false; n];
        let mut offense: Option<(usize, usize)> = None;
        let mut mutated = false;

        for i in 0..n {
            for j in 0..i {
                let ratio = check_duplicate_stoich(&maps[i], &maps[j]);
                if ratio == 0.0 {
                    continue;
                }
                if ratio < 0.0
                    && !self.reactions[i].reversible
                    && !self.reactions[j].reversible
                {
                    // irreversible reactions in opposite directions
                    continue;
                }
                match self.third_body_relation(i, j) {
                    TbRelation::Incompatible => continue,
                    TbRelation::ExplicitVsGeneric {
                        generic,
                        explicit_species,
                    } => match self.third_body_duplicate_handling {
                        ThirdBodyDuplicateHandling::Warn => {
                            warn!(
                                "duplicate third-body reactions: '{}' and '{}'",
                                self.reactions[j].equation(),
                                self.reactions[i].equation(),
                            );
                        }
                        ThirdBodyDuplicateHandling::Error => {
                            return Err(KineticsError::DuplicateConflict {
                                what: "third-body reaction duplicates an explicit-collider reaction",
                                first: j,
                                second: i,
                            });
                        }
                        ThirdBodyDuplicateHandling::MarkDuplicate => {
                            self.reactions[i].duplicate = true;
                            self.reactions[j].duplicate = true;
                            matched[i] = true;
                            matched[j] = true;
                            mutated = true;
                        }
                        ThirdBodyDuplicateHandling::ModifyEfficiency => {
                            let name = self.kinetics_species_name(explicit_species);
                            if let Some(tb) = self.third_bodies[generic].as_mut() {
                                tb.set_efficiency(explicit_species, 0.0);
                            }
                            if let Some(tb) = self.reactions[generic].third_body.as_mut() {
                                tb.efficiencies.insert(name, 0.0);
                            }
                            mutated = true;
                        }
                    },
                    TbRelation::Plain => {
                        matched[i] = true;
                        matched[j] = true;
                        if self.reactions[i].duplicate && self.reactions[j].duplicate {
                            continue;
                        }
                        if self.reactions[i].rate.rate_type()
                            != self.reactions[j].rate.rate_type()
                        {
                            // distinct parameterizations of one step are
                            // tolerated without explicit markings
                            continue;
                        }
                        if throw_err {
                            return Err(KineticsError::DuplicateConflict {
                                what: "unmarked duplicate reactions",
                                first: j,
                                second: i,
                            });
                        } else if fix {
                            self.reactions[i].duplicate = true;
                            self.reactions[j].duplicate = true;
                            mutated = true;
                        } else if offense.is_none() {
                            offense = Some((j, i));
                        }
                    }
                }
            }
        }

        for i in 0..n {
            if self.reactions[i].duplicate && !matched[i] {
                if throw_err {
                    return Err(KineticsError::UnmatchedDuplicate {
                        index: i,
                        equation: self.reactions[i].equation(),
                    });
                } else if fix {
                    self.reactions[i].duplicate = false;
                    mutated = true;
                } else if offense.is_none() {
                    offense = Some((i, i));
                }
            }
        }

        if mutated {
            self.cache.invalidate();
        }
        Ok(offense)
    }
}
