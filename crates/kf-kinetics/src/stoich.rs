//! Sparse stoichiometry matrices.
//!
//! Three species×reaction matrices (reactant, product, reversible-product)
//! turn rate-of-progress vectors into species production rates and species
//! properties into per-reaction deltas. The net matrix is always derived as
//! product − reactant; it is never stored in a way that can drift from that
//! identity.

use nalgebra_sparse::{CooMatrix, CscMatrix};

use kf_core::error::check_array_size;
use kf_core::{KfError, KfResult};

/// Which stored matrix an operation applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoichSide {
    Reactant,
    Product,
    RevProduct,
    Net,
}

/// Triplet-assembled, CSC-evaluated stoichiometry for one mechanism.
///
/// Coefficients are entered reaction by reaction; matrices are (re)built by
/// `rebuild`, which the manager invokes from its resize pass. Duplicate
/// entries for the same (species, reaction) pair sum, and fractional
/// coefficients pass through unrounded.
#[derive(Debug, Default)]
pub struct StoichCoeffs {
    n_species: usize,
    n_reactions: usize,
    reactant: Vec<(usize, usize, f64)>,
    product: Vec<(usize, usize, f64)>,
    rev_product: Vec<(usize, usize, f64)>,
    reversible: Vec<bool>,
    built: Option<Built>,
}

#[derive(Debug)]
struct Built {
    reactant: CscMatrix<f64>,
    product: CscMatrix<f64>,
    rev_product: CscMatrix<f64>,
    net: CscMatrix<f64>,
}

impl StoichCoeffs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_species(&self) -> usize {
        self.n_species
    }

    pub fn n_reactions(&self) -> usize {
        self.n_reactions
    }

    /// Update the species dimension (phases added). Invalidates built matrices.
    pub fn resize_species(&mut self, n_species: usize) {
        self.n_species = n_species;
        self.built = None;
    }

    /// Append one reaction's coefficients. `i` must be the next reaction index.
    pub fn add_reaction(
        &mut self,
        i: usize,
        reactants: &[(usize, f64)],
        products: &[(usize, f64)],
        reversible: bool,
    ) -> KfResult<()> {
        if i != self.n_reactions {
            return Err(KfError::Invariant {
                what: "reactions must be added in index order",
            });
        }
        for (k, _) in reactants.iter().chain(products) {
            if *k >= self.n_species {
                return Err(KfError::IndexOob {
                    what: "species (stoichiometry)",
                    index: *k,
                    len: self.n_species,
                });
            }
        }
        for (k, nu) in reactants {
            self.reactant.push((*k, i, *nu));
        }
        for (k, nu) in products {
            self.product.push((*k, i, *nu));
            if reversible {
                self.rev_product.push((*k, i, *nu));
            }
        }
        self.reversible.push(reversible);
        self.n_reactions += 1;
        self.built = None;
        Ok(())
    }

    /// (Re)build the CSC matrices at the current dimensions. Safe to call
    /// repeatedly.
    pub fn rebuild(&mut self) {
        self.built = Some(Built {
            reactant: self.to_csc(&self.reactant, None),
            product: self.to_csc(&self.product, None),
            rev_product: self.to_csc(&self.rev_product, None),
            net: self.to_csc(&self.product, Some(&self.reactant)),
        });
    }

    fn to_csc(
        &self,
        plus: &[(usize, usize, f64)],
        minus: Option<&[(usize, usize, f64)]>,
    ) -> CscMatrix<f64> {
        let mut coo = CooMatrix::new(self.n_species, self.n_reactions);
        for (k, i, nu) in plus {
            coo.push(*k, *i, *nu);
        }
        if let Some(minus) = minus {
            for (k, i, nu) in minus {
                coo.push(*k, *i, -nu);
            }
        }
        CscMatrix::from(&coo)
    }

    fn built(&self) -> KfResult<&Built> {
        self.built.as_ref().ok_or(KfError::Invariant {
            what: "stoichiometry matrices not finalized (resize pending)",
        })
    }

    fn matrix_of(built: &Built, side: StoichSide) -> &CscMatrix<f64> {
        match side {
            StoichSide::Reactant => &built.reactant,
            StoichSide::Product => &built.product,
            StoichSide::RevProduct => &built.rev_product,
            StoichSide::Net => &built.net,
        }
    }

    /// The finalized sparse matrix for one side.
    pub fn matrix(&self, side: StoichSide) -> KfResult<&CscMatrix<f64>> {
        Ok(Self::matrix_of(self.built()?, side))
    }

    /// Coefficient of species k as a reactant in reaction i.
    pub fn reactant_coeff(&self, k: usize, i: usize) -> f64 {
        sum_entries(&self.reactant, k, i)
    }

    /// Coefficient of species k as a product in reaction i.
    pub fn product_coeff(&self, k: usize, i: usize) -> f64 {
        sum_entries(&self.product, k, i)
    }

    /// Net coefficient (product − reactant) of species k in reaction i.
    pub fn net_coeff(&self, k: usize, i: usize) -> f64 {
        self.product_coeff(k, i) - self.reactant_coeff(k, i)
    }

    /// Per-reaction delta of a species property: Δz_i = Σ_k ν_{k,i}·z_k over
    /// the net matrix.
    pub fn reaction_delta(&self, property: &[f64], delta: &mut [f64]) -> KfResult<()> {
        check_array_size("property", property.len(), self.n_species)?;
        check_array_size("delta", delta.len(), self.n_reactions)?;
        let net = &self.built()?.net;
        for (i, col) in net.col_iter().enumerate() {
            let mut acc = 0.0;
            for (k, nu) in col.row_indices().iter().zip(col.values()) {
                acc += nu * property[*k];
            }
            delta[i] = acc;
        }
        Ok(())
    }

    /// Like `reaction_delta`, but only for reversible reactions; entries of
    /// `delta` for irreversible reactions are left untouched.
    pub fn rev_reaction_delta(&self, property: &[f64], delta: &mut [f64]) -> KfResult<()> {
        check_array_size("property", property.len(), self.n_species)?;
        check_array_size("delta", delta.len(), self.n_reactions)?;
        let built = self.built()?;
        for i in 0..self.n_reactions {
            if !self.reversible[i] {
                continue;
            }
            let mut acc = 0.0;
            let col = built.rev_product.col(i);
            for (k, nu) in col.row_indices().iter().zip(col.values()) {
                acc += nu * property[*k];
            }
            let col = built.reactant.col(i);
            for (k, nu) in col.row_indices().iter().zip(col.values()) {
                acc -= nu * property[*k];
            }
            delta[i] = acc;
        }
        Ok(())
    }

    /// Per-reaction concentration product Π_k C_k^ν over one side's column.
    /// Columns with no entries yield 1.
    pub fn concentration_products(
        &self,
        side: StoichSide,
        conc: &[f64],
        out: &mut [f64],
    ) -> KfResult<()> {
        check_array_size("concentrations", conc.len(), self.n_species)?;
        check_array_size("products", out.len(), self.n_reactions)?;
        let m = Self::matrix_of(self.built()?, side);
        for (i, col) in m.col_iter().enumerate() {
            let mut acc = 1.0;
            for (k, nu) in col.row_indices().iter().zip(col.values()) {
                acc *= pow_coeff(conc[*k], *nu);
            }
            out[i] = acc;
        }
        Ok(())
    }

    /// Column sums Σ_k ν_{k,i} per reaction (the nominal reaction order for
    /// the reactant side).
    pub fn order_sums(&self, side: StoichSide) -> KfResult<Vec<f64>> {
        let m = Self::matrix_of(self.built()?, side);
        let mut out = vec![0.0; self.n_reactions];
        for (i, col) in m.col_iter().enumerate() {
            out[i] = col.values().iter().sum();
        }
        Ok(out)
    }

    /// Accumulate species contributions: out[k] += Σ_i ν_{k,i}·v_i.
    pub fn species_multiply_acc(
        &self,
        side: StoichSide,
        per_reaction: &[f64],
        out: &mut [f64],
    ) -> KfResult<()> {
        check_array_size("per-reaction values", per_reaction.len(), self.n_reactions)?;
        check_array_size("per-species output", out.len(), self.n_species)?;
        let m = Self::matrix_of(self.built()?, side);
        for (i, col) in m.col_iter().enumerate() {
            let v = per_reaction[i];
            if v == 0.0 {
                continue;
            }
            for (k, nu) in col.row_indices().iter().zip(col.values()) {
                out[*k] += nu * v;
            }
        }
        Ok(())
    }

    /// Signed-species-key participation map of reaction i for duplicate
    /// detection: reactants contribute −ν at key 1+k, products +ν at key
    /// −1−k.
    pub fn participation_map(&self, i: usize) -> std::collections::BTreeMap<i64, f64> {
        let mut map = std::collections::BTreeMap::new();
        for (k, ri, nu) in &self.reactant {
            if *ri == i {
                *map.entry(1 + *k as i64).or_insert(0.0) -= nu;
            }
        }
        for (k, ri, nu) in &self.product {
            if *ri == i {
                *map.entry(-1 - *k as i64).or_insert(0.0) += nu;
            }
        }
        map
    }

    /// Partial derivatives of the per-reaction concentration product with
    /// respect to each participating species' concentration:
    /// for entry (k, i) with coefficient ν,
    /// ∂/∂C_k Π_m C_m^ν_m = ν·C_k^(ν−1)·Π_{m≠k} C_m^ν_m.
    ///
    /// Returned as (species, reaction, value) triplets. 0⁰ is taken as 1 so
    /// first-order entries stay finite at zero concentration.
    pub fn derivative_terms(
        &self,
        side: StoichSide,
        conc: &[f64],
    ) -> KfResult<Vec<(usize, usize, f64)>> {
        check_array_size("concentrations", conc.len(), self.n_species)?;
        let m = Self::matrix_of(self.built()?, side);
        let mut terms = Vec::new();
        for (i, col) in m.col_iter().enumerate() {
            let rows = col.row_indices();
            let vals = col.values();
            for (a, (&k, &nu)) in rows.iter().zip(vals).enumerate() {
                let mut term = nu * pow_coeff(conc[k], nu - 1.0);
                for (b, (&m_k, &m_nu)) in rows.iter().zip(vals).enumerate() {
                    if a != b {
                        term *= pow_coeff(conc[m_k], m_nu);
                    }
                }
                terms.push((k, i, term));
            }
        }
        Ok(terms)
    }
}

fn sum_entries(entries: &[(usize, usize, f64)], k: usize, i: usize) -> f64 {
    entries
        .iter()
        .filter(|(ek, ei, _)| *ek == k && *ei == i)
        .map(|(_, _, nu)| nu)
        .sum()
}

fn pow_coeff(c: f64, nu: f64) -> f64 {
    if nu == 0.0 {
        1.0
    } else if nu == 1.0 {
        c
    } else if nu == 2.0 {
        c * c
    } else {
        c.powf(nu)
    }
}
