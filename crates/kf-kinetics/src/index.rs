//! Flat species indexing across phases.
//!
//! Per-species results are reported in flat arrays ordered by phase in the
//! order phases were added, and within a phase in species order. `start[n]`
//! is the offset of phase n's first species in that flat layout.

use std::collections::HashMap;
use std::sync::Arc;

use kf_core::error::{check_array_size, check_index};
use kf_thermo::ThermoPhase;

use crate::error::{KineticsError, KineticsResult};

/// Ordered collection of phases with contiguous global species indices.
#[derive(Default)]
pub struct PhaseIndex {
    phases: Vec<Arc<dyn ThermoPhase>>,
    start: Vec<usize>,
    by_name: HashMap<String, usize>,
    kk: usize,
}

impl PhaseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_phases(&self) -> usize {
        self.phases.len()
    }

    /// Total species count over all phases.
    pub fn n_total_species(&self) -> usize {
        self.kk
    }

    /// Append a phase; its species occupy the next contiguous index range.
    pub fn add_phase(&mut self, phase: Arc<dyn ThermoPhase>) -> KineticsResult<usize> {
        if self.by_name.contains_key(phase.name()) {
            return Err(KineticsError::InvalidOperation {
                what: "phase with this name already added",
            });
        }
        let n = self.phases.len();
        self.by_name.insert(phase.name().to_string(), n);
        self.start.push(self.kk);
        self.kk += phase.n_species();
        self.phases.push(phase);
        Ok(n)
    }

    pub fn phase(&self, n: usize) -> KineticsResult<&Arc<dyn ThermoPhase>> {
        self.check_phase_index(n)?;
        Ok(&self.phases[n])
    }

    pub fn phases(&self) -> &[Arc<dyn ThermoPhase>] {
        &self.phases
    }

    /// Index of the named phase, if registered.
    pub fn phase_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Offset of phase n's species in the flat layout.
    pub fn start(&self, n: usize) -> KineticsResult<usize> {
        self.check_phase_index(n)?;
        Ok(self.start[n])
    }

    /// Global index of species k of phase n.
    pub fn kinetics_species_index(&self, k: usize, n: usize) -> KineticsResult<usize> {
        self.check_phase_index(n)?;
        check_index("species (in phase)", k, self.phases[n].n_species())?;
        Ok(self.start[n] + k)
    }

    /// Global index of a species by name, searching phases in add order.
    pub fn species_index(&self, name: &str) -> Option<usize> {
        for (phase, start) in self.phases.iter().zip(&self.start) {
            if let Some(k) = phase.species_index(name) {
                return Some(start + k);
            }
        }
        None
    }

    /// Name of the species at global index k, or "<unknown>" out of range.
    pub fn kinetics_species_name(&self, k: usize) -> String {
        match self.species_phase_index(k) {
            Ok(n) => self.phases[n].species_names()[k - self.start[n]].clone(),
            Err(_) => "<unknown>".to_string(),
        }
    }

    /// Index of the phase owning the species at global index k.
    pub fn species_phase_index(&self, k: usize) -> KineticsResult<usize> {
        self.check_species_index(k)?;
        for (m, phase) in self.phases.iter().enumerate() {
            if k >= self.start[m] && k < self.start[m] + phase.n_species() {
                return Ok(m);
            }
        }
        Err(KineticsError::InvalidOperation {
            what: "species index not covered by any phase",
        })
    }

    pub fn check_phase_index(&self, n: usize) -> KineticsResult<()> {
        check_index("phase", n, self.phases.len())?;
        Ok(())
    }

    pub fn check_species_index(&self, k: usize) -> KineticsResult<()> {
        check_index("species", k, self.kk)?;
        Ok(())
    }

    /// Check a per-species bulk array argument.
    pub fn check_species_array(&self, len: usize) -> KineticsResult<()> {
        check_array_size("per-species array", len, self.kk)?;
        Ok(())
    }
}
