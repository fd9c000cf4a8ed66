//! Derivative engine: evaluation settings and Jacobian assembly.
//!
//! Vector derivatives scale the memoized rates of progress; matrix
//! derivatives assemble per-reaction sparse contributions and push them
//! through the stoichiometry matrices via the chain rule (species production
//! is linear in the rates of progress). All partials hold every other
//! variable fixed; no mole-fraction renormalization or equation-of-state
//! coupling is applied.

use nalgebra_sparse::{CooMatrix, CscMatrix};
use serde::{Deserialize, Serialize};

use kf_core::units::constants::GAS_CONSTANT;

use crate::error::KineticsResult;
use crate::kinetics::{BulkKinetics, DerivVariable, Kinetics, RopDirection, SpeciesRate};
use crate::stoich::StoichSide;

/// Named options controlling derivative evaluation.
///
/// Serialized with the keys `skip-third-bodies`, `skip-falloff` and
/// `rtol-delta`; the settings document is queried and replaced as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct DerivativeSettings {
    /// Leave third-body concentration terms out of Jacobians
    pub skip_third_bodies: bool,
    /// Leave third-body effects on rate constants out of derivatives
    pub skip_falloff: bool,
    /// Relative perturbation for numeric rate-constant derivatives
    pub rtol_delta: f64,
}

impl Default for DerivativeSettings {
    fn default() -> Self {
        Self {
            skip_third_bodies: false,
            skip_falloff: false,
            rtol_delta: 1e-8,
        }
    }
}

impl DerivativeSettings {
    pub fn to_value(&self) -> KineticsResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: &serde_json::Value) -> KineticsResult<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }
}

impl BulkKinetics {
    /// d(fwd ROP)/dT and d(rev ROP)/dT per reaction.
    ///
    /// Forward terms scale the rate of progress by d(ln kf)/dT; reverse terms
    /// additionally carry the equilibrium-constant dependence via van 't
    /// Hoff, d(ln Kc)/dT = ΔH°/(RT²) − Δν/T, from the collaborator's
    /// standard-state enthalpies.
    pub(crate) fn rop_ddt_components(&mut self) -> KineticsResult<(Vec<f64>, Vec<f64>)> {
        self.update_rop()?;
        let nr = self.reactions.len();

        let mut kf_ddt = vec![0.0; nr];
        Kinetics::fwd_rate_constants_ddt(self, &mut kf_ddt)?;

        let kf = self.cached("kf")?.to_vec();
        let ropf = self.cached("ropf")?.to_vec();
        let ropr = self.cached("ropr")?.to_vec();

        let t = self.rate_context()?.temperature;
        let rt = GAS_CONSTANT * t;
        let h0 = self.gather_species(|p, buf| p.standard_enthalpies(buf))?;
        let mut delta_h0 = vec![0.0; nr];
        self.stoich.reaction_delta(&h0, &mut delta_h0)?;

        let mut fwd = vec![0.0; nr];
        let mut rev = vec![0.0; nr];
        for i in 0..nr {
            let dln_kf = if kf[i] != 0.0 { kf_ddt[i] / kf[i] } else { 0.0 };
            fwd[i] = ropf[i] * dln_kf;
            if ropr[i] != 0.0 {
                let dln_kc = delta_h0[i] / (rt * t) - self.net_sums[i] / t;
                rev[i] = ropr[i] * (dln_kf - dln_kc);
            }
        }
        Ok((fwd, rev))
    }

    /// d(fwd ROP)/dP and d(rev ROP)/dP per reaction. The concentration-unit
    /// equilibrium constant carries no pressure dependence, so both
    /// directions scale by d(ln kf)/dP.
    pub(crate) fn rop_ddp_components(&mut self) -> KineticsResult<(Vec<f64>, Vec<f64>)> {
        self.update_rop()?;
        let nr = self.reactions.len();

        let mut kf_ddp = vec![0.0; nr];
        Kinetics::fwd_rate_constants_ddp(self, &mut kf_ddp)?;

        let kf = self.cached("kf")?.to_vec();
        let ropf = self.cached("ropf")?.to_vec();
        let ropr = self.cached("ropr")?.to_vec();

        let mut fwd = vec![0.0; nr];
        let mut rev = vec![0.0; nr];
        for i in 0..nr {
            let dln_kf = if kf[i] != 0.0 { kf_ddp[i] / kf[i] } else { 0.0 };
            fwd[i] = ropf[i] * dln_kf;
            rev[i] = ropr[i] * dln_kf;
        }
        Ok((fwd, rev))
    }

    /// d(fwd ROP)/dC and d(rev ROP)/dC per reaction, at constant T, P and X.
    ///
    /// With every C_k = X_k·C, a rate of progress scales as C^(order + m)
    /// where `order` is the side's coefficient sum and m is 1 for third-body
    /// reactions.
    pub(crate) fn rop_ddc_components(&mut self) -> KineticsResult<(Vec<f64>, Vec<f64>)> {
        self.update_rop()?;
        let nr = self.reactions.len();
        let ctot = self.cached("ctot")?[0];
        let ropf = self.cached("ropf")?.to_vec();
        let ropr = self.cached("ropr")?.to_vec();

        let mut fwd = vec![0.0; nr];
        let mut rev = vec![0.0; nr];
        for i in 0..nr {
            let tb = if self.third_bodies[i].is_some() && !self.settings.skip_third_bodies {
                1.0
            } else {
                0.0
            };
            fwd[i] = ropf[i] * (self.fwd_orders[i] + tb) / ctot;
            rev[i] = ropr[i] * (self.rev_orders[i] + tb) / ctot;
        }
        Ok((fwd, rev))
    }

    /// Combine per-reaction derivative vectors into a per-species one:
    /// out[k] = Σ_i fwd_side(k,i)·fwd_i + Σ_i rev_side(k,i)·rev_i.
    pub(crate) fn species_derivative(
        &mut self,
        fwd_side: StoichSide,
        fwd: &[f64],
        rev_side: StoichSide,
        rev: &[f64],
        out: &mut [f64],
    ) -> KineticsResult<()> {
        self.check_species_array(out.len())?;
        out[..self.n_total_species()].fill(0.0);
        self.stoich.species_multiply_acc(fwd_side, fwd, out)?;
        self.stoich.species_multiply_acc(rev_side, rev, out)?;
        Ok(())
    }

    /// Sparse d(ROP)/dX or d(ROP)/dCi for one direction,
    /// shape nReactions × nTotalSpecies.
    ///
    /// Entries combine the concentration-product partials from the
    /// stoichiometry matrices with, unless `skip-third-bodies`, the
    /// efficiency-weighted collider terms. Mole-fraction derivatives differ
    /// from concentration derivatives by the factor dC_j/dX_j = C.
    pub(crate) fn rop_jacobian(
        &mut self,
        dir: RopDirection,
        var: DerivVariable,
    ) -> KineticsResult<CscMatrix<f64>> {
        self.update_rop()?;
        let nr = self.reactions.len();
        let kk = self.n_total_species();

        let conc = self.cached("conc")?.to_vec();
        let ctot = self.cached("ctot")?[0];
        let kf = self.cached("kf")?.to_vec();
        let rkcn = self.cached("rkcn")?.to_vec();
        let tbf = self.cached("tbf")?.to_vec();

        let scale = match var {
            DerivVariable::MoleFraction => ctot,
            DerivVariable::Concentration => 1.0,
        };
        let side = match dir {
            RopDirection::Forward => StoichSide::Reactant,
            RopDirection::Reverse => StoichSide::RevProduct,
        };

        let mut coo = CooMatrix::new(nr, kk);
        for (k, i, term) in self.stoich.derivative_terms(side, &conc)? {
            let base = match dir {
                RopDirection::Forward => self.multipliers[i] * kf[i] * tbf[i],
                RopDirection::Reverse => self.multipliers[i] * kf[i] * rkcn[i] * tbf[i],
            };
            let v = base * term * scale;
            if v != 0.0 {
                coo.push(i, k, v);
            }
        }

        if !self.settings.skip_third_bodies {
            let cprod = self
                .cached(match dir {
                    RopDirection::Forward => "cf",
                    RopDirection::Reverse => "cr",
                })?
                .to_vec();
            for (i, tb) in self.third_bodies.iter().enumerate() {
                let Some(tb) = tb else { continue };
                let base = match dir {
                    RopDirection::Forward => self.multipliers[i] * kf[i] * cprod[i],
                    RopDirection::Reverse => {
                        self.multipliers[i] * kf[i] * rkcn[i] * cprod[i]
                    }
                };
                if base == 0.0 {
                    continue;
                }
                for j in 0..kk {
                    let eff = tb.efficiency_of(j);
                    if eff != 0.0 {
                        coo.push(i, j, base * eff * scale);
                    }
                }
            }
        }
        Ok(CscMatrix::from(&coo))
    }

    /// Species-level Jacobian via the chain rule:
    /// d(wdot)/d(x) = ν · d(ROP)/d(x).
    pub(crate) fn species_jacobian(
        &mut self,
        which: SpeciesRate,
        var: DerivVariable,
    ) -> KineticsResult<CscMatrix<f64>> {
        let fwd = self.rop_jacobian(RopDirection::Forward, var)?;
        let rev = self.rop_jacobian(RopDirection::Reverse, var)?;
        match which {
            SpeciesRate::Creation => {
                let product = self.stoich.matrix(StoichSide::Product)?;
                let reactant = self.stoich.matrix(StoichSide::Reactant)?;
                Ok(sp_add(&sp_mul(product, &fwd), &sp_mul(reactant, &rev)))
            }
            SpeciesRate::Destruction => {
                let product = self.stoich.matrix(StoichSide::Product)?;
                let reactant = self.stoich.matrix(StoichSide::Reactant)?;
                Ok(sp_add(&sp_mul(reactant, &fwd), &sp_mul(product, &rev)))
            }
            SpeciesRate::NetProduction => {
                let net = self.stoich.matrix(StoichSide::Net)?;
                Ok(sp_mul(net, &sp_sub(&fwd, &rev)))
            }
        }
    }
}

/// Sparse product a·b (CSC × CSC), accumulating duplicate entries.
pub(crate) fn sp_mul(a: &CscMatrix<f64>, b: &CscMatrix<f64>) -> CscMatrix<f64> {
    let mut coo = CooMatrix::new(a.nrows(), b.ncols());
    for (k, j, bv) in b.triplet_iter() {
        let col = a.col(k);
        for (i, av) in col.row_indices().iter().zip(col.values()) {
            coo.push(*i, j, av * bv);
        }
    }
    CscMatrix::from(&coo)
}

/// Sparse sum a + b of equal-shape matrices.
pub(crate) fn sp_add(a: &CscMatrix<f64>, b: &CscMatrix<f64>) -> CscMatrix<f64> {
    let mut coo = CooMatrix::new(a.nrows(), a.ncols());
    for (i, j, v) in a.triplet_iter() {
        coo.push(i, j, *v);
    }
    for (i, j, v) in b.triplet_iter() {
        coo.push(i, j, *v);
    }
    CscMatrix::from(&coo)
}

/// Sparse difference a − b of equal-shape matrices.
pub(crate) fn sp_sub(a: &CscMatrix<f64>, b: &CscMatrix<f64>) -> CscMatrix<f64> {
    let mut coo = CooMatrix::new(a.nrows(), a.ncols());
    for (i, j, v) in a.triplet_iter() {
        coo.push(i, j, *v);
    }
    for (i, j, v) in b.triplet_iter() {
        coo.push(i, j, -*v);
    }
    CscMatrix::from(&coo)
}
