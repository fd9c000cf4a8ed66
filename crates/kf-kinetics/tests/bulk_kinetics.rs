//! Integration tests for the bulk kinetics manager.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use kf_core::units::constants::{GAS_CONSTANT, ONE_ATM};
use kf_kinetics::{
    BulkKinetics, Kinetics, KineticsError, Reaction, RootAggregate, ThirdBody,
    ThirdBodyDuplicateHandling,
};
use kf_rates::{ArrheniusRate, ConstantRate};
use kf_thermo::{IdealGasPhase, SpeciesDef, ThermoPhase};

fn gas() -> Arc<IdealGasPhase> {
    Arc::new(
        IdealGasPhase::new(
            "gas",
            vec![
                SpeciesDef::new("H2", 2.016)
                    .unwrap()
                    .with_thermo(3.5 * GAS_CONSTANT, 0.0, 1.3e5)
                    .unwrap(),
                SpeciesDef::new("O2", 31.999)
                    .unwrap()
                    .with_thermo(3.5 * GAS_CONSTANT, 0.0, 2.05e5)
                    .unwrap(),
                SpeciesDef::new("H2O", 18.015)
                    .unwrap()
                    .with_thermo(4.0 * GAS_CONSTANT, -2.4e8, 1.9e5)
                    .unwrap(),
                SpeciesDef::new("N2", 28.014)
                    .unwrap()
                    .with_thermo(3.5 * GAS_CONSTANT, 0.0, 1.9e5)
                    .unwrap(),
            ],
        )
        .unwrap(),
    )
}

/// Manager over the 4-species gas phase with one reversible and one
/// irreversible third-body reaction.
fn manager() -> (BulkKinetics, Arc<IdealGasPhase>) {
    let phase = gas();
    phase
        .set_state_tpx(1100.0, 2.0 * ONE_ATM, &[0.3, 0.2, 0.4, 0.1])
        .unwrap();

    let mut kin = BulkKinetics::new();
    kin.add_phase(phase.clone()).unwrap();
    kin.add_reaction(
        Reaction::new(
            &[("H2", 2.0), ("O2", 1.0)],
            &[("H2O", 2.0)],
            Box::new(ArrheniusRate::new(2.0e8, 0.6, 5.0e7)),
        )
        .unwrap(),
        true,
    )
    .unwrap();
    kin.add_reaction(
        Reaction::new(
            &[("H2", 1.0), ("O2", 1.0)],
            &[("H2O", 1.0)],
            Box::new(ConstantRate::new(4.0e3)),
        )
        .unwrap()
        .irreversible()
        .with_third_body(ThirdBody::new().with_efficiency("H2O", 6.0)),
        true,
    )
    .unwrap();
    (kin, phase)
}

#[test]
fn mechanism_geometry() {
    let (kin, _phase) = manager();
    assert_eq!(kin.kinetics_type(), "bulk");
    assert_eq!(kin.n_phases(), 1);
    assert_eq!(kin.n_reactions(), 2);
    assert_eq!(kin.n_total_species(), 4);
    assert_eq!(kin.species_index("H2O"), Some(2));
    assert_eq!(kin.kinetics_species_name(3), "N2");
    assert_eq!(kin.kinetics_species_name(4), "<unknown>");
    assert!(kin.is_reversible(0).unwrap());
    assert!(!kin.is_reversible(1).unwrap());
    assert_eq!(
        kin.reaction(0).unwrap().equation(),
        "2 H2 + O2 <=> 2 H2O"
    );
}

#[test]
fn net_rop_is_forward_minus_reverse() {
    let (mut kin, _phase) = manager();
    let nr = kin.n_reactions();
    let mut fwd = vec![0.0; nr];
    let mut rev = vec![0.0; nr];
    let mut net = vec![0.0; nr];
    kin.fwd_rates_of_progress(&mut fwd).unwrap();
    kin.rev_rates_of_progress(&mut rev).unwrap();
    kin.net_rates_of_progress(&mut net).unwrap();
    for i in 0..nr {
        assert_eq!(net[i], fwd[i] - rev[i]);
    }
    // irreversible reaction has exactly zero reverse rate
    assert_eq!(rev[1], 0.0);
    assert!(fwd[0] > 0.0);
}

#[test]
fn production_rate_decomposition_is_exact() {
    let (mut kin, _phase) = manager();
    let kk = kin.n_total_species();
    let mut cdot = vec![0.0; kk];
    let mut ddot = vec![0.0; kk];
    let mut wdot = vec![0.0; kk];
    kin.creation_rates(&mut cdot).unwrap();
    kin.destruction_rates(&mut ddot).unwrap();
    kin.net_production_rates(&mut wdot).unwrap();
    for k in 0..kk {
        assert_eq!(wdot[k], cdot[k] - ddot[k]);
    }
    // inert species has zero rates
    assert_eq!(wdot[3], 0.0);
    assert_eq!(cdot[3], 0.0);
}

#[test]
fn stoichiometry_identity_and_accessors() {
    let (kin, _phase) = manager();
    for k in 0..kin.n_total_species() {
        for i in 0..kin.n_reactions() {
            assert_eq!(
                kin.net_stoich_coeff(k, i).unwrap(),
                kin.product_stoich_coeff(k, i).unwrap() - kin.reactant_stoich_coeff(k, i).unwrap()
            );
        }
    }
    assert_eq!(kin.reactant_stoich_coeff(0, 0).unwrap(), 2.0);
    assert_eq!(kin.product_stoich_coeff(2, 0).unwrap(), 2.0);
    assert_eq!(kin.reactant_order(0, 0).unwrap(), 2.0);

    let reactants = kin.reactant_stoich_coeffs().unwrap();
    assert_eq!(reactants.nrows(), 4);
    assert_eq!(reactants.ncols(), 2);
}

#[test]
fn reaction_delta_matches_dense_reference() {
    let (kin, _phase) = manager();
    let prop = [1.5, -2.0, 0.25, 7.0];
    let mut delta = [0.0; 2];
    kin.reaction_delta(&prop, &mut delta).unwrap();
    for i in 0..2 {
        let mut acc = 0.0;
        for (k, p) in prop.iter().enumerate() {
            acc += kin.net_stoich_coeff(k, i).unwrap() * p;
        }
        assert!((delta[i] - acc).abs() < 1e-12);
    }

    // reversible-only delta leaves the irreversible entry untouched
    let mut rev_delta = [123.0, 456.0];
    kin.rev_reaction_delta(&prop, &mut rev_delta).unwrap();
    assert_eq!(rev_delta[1], 456.0);
    assert!((rev_delta[0] - delta[0]).abs() < 1e-12);
}

#[test]
fn multiplier_disables_and_restores_bit_for_bit() {
    let (mut kin, _phase) = manager();
    let nr = kin.n_reactions();
    let kk = kin.n_total_species();

    let mut rop0 = vec![0.0; nr];
    kin.net_rates_of_progress(&mut rop0).unwrap();
    let mut wdot0 = vec![0.0; kk];
    kin.net_production_rates(&mut wdot0).unwrap();

    kin.set_multiplier(0, 0.0).unwrap();
    assert_eq!(kin.multiplier(0).unwrap(), 0.0);
    let mut rop = vec![0.0; nr];
    kin.net_rates_of_progress(&mut rop).unwrap();
    assert_eq!(rop[0], 0.0);
    assert_eq!(rop[1], rop0[1]);

    let mut wdot = vec![0.0; kk];
    kin.net_production_rates(&mut wdot).unwrap();
    // only reaction 1 contributes now
    assert_eq!(wdot[3], 0.0);

    kin.set_multiplier(0, 1.0).unwrap();
    kin.net_rates_of_progress(&mut rop).unwrap();
    assert_eq!(rop, rop0);
    kin.net_production_rates(&mut wdot).unwrap();
    assert_eq!(wdot, wdot0);
}

#[test]
fn cache_invalidation_semantics() {
    let (mut kin, phase) = manager();
    let nr = kin.n_reactions();

    let mut first = vec![0.0; nr];
    kin.net_rates_of_progress(&mut first).unwrap();
    let mut second = vec![0.0; nr];
    kin.net_rates_of_progress(&mut second).unwrap();
    assert_eq!(first, second);

    // external state change invalidates
    phase
        .set_state_tpx(1300.0, 2.0 * ONE_ATM, &[0.3, 0.2, 0.4, 0.1])
        .unwrap();
    let mut hot = vec![0.0; nr];
    kin.net_rates_of_progress(&mut hot).unwrap();
    assert_ne!(hot, first);

    // returning to the identical state reproduces the original values
    phase
        .set_state_tpx(1100.0, 2.0 * ONE_ATM, &[0.3, 0.2, 0.4, 0.1])
        .unwrap();
    let mut back = vec![0.0; nr];
    kin.net_rates_of_progress(&mut back).unwrap();
    assert_eq!(back, first);

    // manager mutation invalidates even with unchanged thermo state
    kin.set_multiplier(1, 0.5).unwrap();
    let mut scaled = vec![0.0; nr];
    kin.net_rates_of_progress(&mut scaled).unwrap();
    assert_ne!(scaled, first);
    assert_eq!(scaled[1], 0.5 * first[1]);
}

#[test]
fn equilibrium_and_reverse_rate_constants() {
    let (mut kin, phase) = manager();
    let nr = kin.n_reactions();

    let mut kc = vec![0.0; nr];
    kin.equilibrium_constants(&mut kc).unwrap();

    // Kc from the collaborator's standard-state Gibbs energies
    let mut delta_g0 = vec![0.0; nr];
    kin.delta_ss_gibbs(&mut delta_g0).unwrap();
    let t = phase.temperature().value;
    let c0 = phase.standard_concentration();
    // Δν for r0: 2 − 3 = −1
    let expected = (-delta_g0[0] / (GAS_CONSTANT * t)).exp() * c0.powf(-1.0);
    assert!((kc[0] - expected).abs() < 1e-9 * expected.abs());

    let mut kf = vec![0.0; nr];
    kin.fwd_rate_constants(&mut kf).unwrap();
    let mut krev = vec![0.0; nr];
    kin.rev_rate_constants(&mut krev, false).unwrap();
    assert!((krev[0] - kf[0] / kc[0]).abs() < 1e-9 * krev[0].abs());
    assert_eq!(krev[1], 0.0);

    kin.rev_rate_constants(&mut krev, true).unwrap();
    assert!(krev[1] != 0.0);
}

#[test]
fn third_body_concentrations_report_nan_for_plain_reactions() {
    let (mut kin, phase) = manager();
    let mut concm = vec![0.0; 2];
    kin.third_body_concentrations(&mut concm).unwrap();
    assert!(concm[0].is_nan());

    // generic collider: sum of concentrations with H2O weighted by 6
    let mut conc = vec![0.0; 4];
    phase.activity_concentrations(&mut conc).unwrap();
    let expected = conc[0] + conc[1] + 6.0 * conc[2] + conc[3];
    assert!((concm[1] - expected).abs() < 1e-9 * expected);
}

#[test]
fn undeclared_species_policy() {
    let (mut kin, _phase) = manager();
    let stray = || {
        Reaction::new(
            &[("AR", 1.0)],
            &[("H2", 1.0)],
            Box::new(ConstantRate::new(1.0)),
        )
        .unwrap()
    };

    let err = kin.add_reaction(stray(), true).unwrap_err();
    match err {
        KineticsError::UndeclaredSpecies { species, .. } => assert_eq!(species, "AR"),
        other => panic!("unexpected error: {other}"),
    }

    kin.set_skip_undeclared_species(true);
    assert!(!kin.add_reaction(stray(), true).unwrap());
    assert_eq!(kin.n_reactions(), 2);
}

#[test]
fn undeclared_third_body_policy() {
    let (mut kin, _phase) = manager();
    let with_stray_efficiency = || {
        Reaction::new(
            &[("H2", 1.0)],
            &[("H2", 1.0)],
            Box::new(ConstantRate::new(1.0)),
        )
        .unwrap()
        .with_third_body(ThirdBody::new().with_efficiency("AR", 2.0))
    };

    assert!(matches!(
        kin.add_reaction(with_stray_efficiency(), true),
        Err(KineticsError::UndeclaredThirdBody { .. })
    ));

    kin.set_skip_undeclared_third_bodies(true);
    assert!(kin.add_reaction(with_stray_efficiency(), true).unwrap());
    assert!(kin.has_undeclared_third_bodies());
}

#[test]
fn modify_reaction_updates_rate_parameters_only() {
    let (mut kin, _phase) = manager();
    let mut kf_before = vec![0.0; 2];
    kin.fwd_rate_constants(&mut kf_before).unwrap();

    // same structure, different A-factor
    kin.modify_reaction(
        0,
        Reaction::new(
            &[("H2", 2.0), ("O2", 1.0)],
            &[("H2O", 2.0)],
            Box::new(ArrheniusRate::new(4.0e8, 0.6, 5.0e7)),
        )
        .unwrap(),
    )
    .unwrap();

    let mut kf_after = vec![0.0; 2];
    kin.fwd_rate_constants(&mut kf_after).unwrap();
    assert!((kf_after[0] - 2.0 * kf_before[0]).abs() < 1e-9 * kf_after[0]);
    assert_eq!(kf_after[1], kf_before[1]);

    // changed stoichiometry is rejected
    assert!(
        kin.modify_reaction(
            0,
            Reaction::new(
                &[("H2", 1.0), ("O2", 1.0)],
                &[("H2O", 2.0)],
                Box::new(ArrheniusRate::new(4.0e8, 0.6, 5.0e7)),
            )
            .unwrap(),
        )
        .is_err()
    );

    // changed rate type is rejected
    assert!(
        kin.modify_reaction(
            0,
            Reaction::new(
                &[("H2", 2.0), ("O2", 1.0)],
                &[("H2O", 2.0)],
                Box::new(ConstantRate::new(1.0)),
            )
            .unwrap(),
        )
        .is_err()
    );
}

#[test]
fn reaction_added_callbacks() {
    let (mut kin, _phase) = manager();
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let id = kin.register_reaction_added_callback(Box::new(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    }));

    let reaction = || {
        Reaction::new(
            &[("H2", 1.0)],
            &[("H2", 1.0)],
            Box::new(ConstantRate::new(1.0)),
        )
        .unwrap()
    };
    kin.add_reaction(reaction(), true).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    kin.remove_reaction_added_callback(id);
    kin.add_reaction(reaction(), true).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // removing again (or never-registered) is safe
    kin.remove_reaction_added_callback(id);
}

#[test]
fn bounds_checks_fail_one_past_the_end() {
    let (mut kin, _phase) = manager();
    let nr = kin.n_reactions();
    let kk = kin.n_total_species();

    assert!(kin.multiplier(nr).is_err());
    assert!(kin.set_multiplier(nr, 2.0).is_err());
    assert!(kin.reaction(nr).is_err());
    assert!(kin.reactant_stoich_coeff(kk, 0).is_err());
    assert!(kin.reactant_stoich_coeff(0, nr).is_err());
    assert!(kin.kinetics_species_index(kk, 0).is_err());
    assert!(kin.check_phase_index(1).is_err());

    let mut short = vec![0.0; nr - 1];
    assert!(kin.fwd_rates_of_progress(&mut short).is_err());
    let mut exact = vec![0.0; nr];
    assert!(kin.fwd_rates_of_progress(&mut exact).is_ok());
    let mut short_species = vec![0.0; kk - 1];
    assert!(kin.net_production_rates(&mut short_species).is_err());
}

#[test]
fn phase_layout_freezes_once_reactions_exist() {
    let (mut kin, _phase) = manager();
    let extra = Arc::new(
        IdealGasPhase::new("extra", vec![SpeciesDef::new("AR", 39.948).unwrap()]).unwrap(),
    );
    assert!(kin.add_phase(extra).is_err());

    // and reactions require at least one phase
    let mut empty = BulkKinetics::new();
    assert!(
        empty
            .add_reaction(
                Reaction::new(&[("A", 1.0)], &[("B", 1.0)], Box::new(ConstantRate::new(1.0)))
                    .unwrap(),
                true,
            )
            .is_err()
    );
}

#[test]
fn multi_phase_species_layout() {
    let bulk = gas();
    bulk.set_state_tpx(900.0, ONE_ATM, &[0.25, 0.25, 0.25, 0.25])
        .unwrap();
    let tracer = Arc::new(
        IdealGasPhase::new(
            "tracer",
            vec![
                SpeciesDef::new("X", 10.0).unwrap(),
                SpeciesDef::new("Y", 20.0).unwrap(),
            ],
        )
        .unwrap(),
    );
    tracer.set_state_tpx(900.0, ONE_ATM, &[0.5, 0.5]).unwrap();

    let mut kin = BulkKinetics::new();
    kin.add_phase(bulk).unwrap();
    kin.add_phase(tracer).unwrap();
    assert_eq!(kin.n_total_species(), 6);
    assert_eq!(kin.kinetics_species_index(0, 1).unwrap(), 4);
    assert_eq!(kin.species_index("Y"), Some(5));
    assert_eq!(kin.species_phase_index(5).unwrap(), 1);
    assert_eq!(kin.phase_index("tracer"), Some(1));

    // a reaction spanning both phases lands in the right slots
    kin.add_reaction(
        Reaction::new(
            &[("H2", 1.0), ("X", 1.0)],
            &[("Y", 1.0)],
            Box::new(ConstantRate::new(2.0e2)),
        )
        .unwrap()
        .irreversible(),
        true,
    )
    .unwrap();

    let mut wdot = vec![0.0; 6];
    kin.net_production_rates(&mut wdot).unwrap();
    assert!(wdot[0] < 0.0); // H2 consumed
    assert!(wdot[4] < 0.0); // X consumed
    assert!(wdot[5] > 0.0); // Y produced
    assert_eq!(wdot[2], 0.0);
}

#[test]
fn parameters_describe_linkage() {
    let (kin, _phase) = manager();
    let params = kin.parameters();
    assert_eq!(params["kinetics"], "bulk");
    assert_eq!(params["phases"][0], "gas");
    assert_eq!(params["explicit-third-body-duplicates"], "warn");
}

#[test]
fn unsupported_operations_name_themselves() {
    let (mut kin, _phase) = manager();
    let mut buf = vec![0.0; 2];
    let err = kin.delta_electrochem_potentials(&mut buf).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("delta_electrochem_potentials"));
    assert!(msg.contains("bulk"));
}

struct TestRoot;

impl RootAggregate for TestRoot {
    fn name(&self) -> &str {
        "network"
    }
}

#[test]
fn root_link_expires_with_owner() {
    let (mut kin, _phase) = manager();
    assert!(kin.root().is_none());

    let root: Arc<dyn RootAggregate> = Arc::new(TestRoot);
    kin.set_root(&root);
    assert_eq!(kin.root().unwrap().name(), "network");

    drop(root);
    assert!(kin.root().is_none());
}

// -- Duplicate detection ----------------------------------------------------

fn simple_manager() -> BulkKinetics {
    let phase = gas();
    let mut kin = BulkKinetics::new();
    kin.add_phase(phase).unwrap();
    kin
}

fn h2_oxidation(rate: f64) -> Reaction {
    Reaction::new(
        &[("H2", 1.0), ("O2", 0.5)],
        &[("H2O", 1.0)],
        Box::new(ConstantRate::new(rate)),
    )
    .unwrap()
}

#[test]
fn unmarked_duplicates_are_detected() {
    let mut kin = simple_manager();
    kin.add_reaction(h2_oxidation(1.0), true).unwrap();
    kin.add_reaction(h2_oxidation(2.0), true).unwrap();

    assert_eq!(kin.check_duplicates(false, false).unwrap(), Some((0, 1)));
    assert!(matches!(
        kin.check_duplicates(true, false),
        Err(KineticsError::DuplicateConflict { first: 0, second: 1, .. })
    ));

    // fixing marks both
    assert_eq!(kin.check_duplicates(false, true).unwrap(), None);
    assert!(kin.reaction(0).unwrap().duplicate);
    assert!(kin.reaction(1).unwrap().duplicate);
    assert_eq!(kin.check_duplicates(true, false).unwrap(), None);
}

#[test]
fn scaled_and_reversed_duplicates_are_detected() {
    let mut kin = simple_manager();
    // 2x scaling
    kin.add_reaction(h2_oxidation(1.0), true).unwrap();
    kin.add_reaction(
        Reaction::new(
            &[("H2", 2.0), ("O2", 1.0)],
            &[("H2O", 2.0)],
            Box::new(ConstantRate::new(1.0)),
        )
        .unwrap(),
        true,
    )
    .unwrap();
    assert_eq!(kin.check_duplicates(false, false).unwrap(), Some((0, 1)));

    // reversed direction, both reversible
    let mut kin = simple_manager();
    kin.add_reaction(h2_oxidation(1.0), true).unwrap();
    kin.add_reaction(
        Reaction::new(
            &[("H2O", 1.0)],
            &[("H2", 1.0), ("O2", 0.5)],
            Box::new(ConstantRate::new(1.0)),
        )
        .unwrap(),
        true,
    )
    .unwrap();
    assert_eq!(kin.check_duplicates(false, false).unwrap(), Some((0, 1)));

    // reversed direction, both irreversible: distinct processes
    let mut kin = simple_manager();
    kin.add_reaction(h2_oxidation(1.0).irreversible(), true).unwrap();
    kin.add_reaction(
        Reaction::new(
            &[("H2O", 1.0)],
            &[("H2", 1.0), ("O2", 0.5)],
            Box::new(ConstantRate::new(1.0)),
        )
        .unwrap()
        .irreversible(),
        true,
    )
    .unwrap();
    assert_eq!(kin.check_duplicates(false, false).unwrap(), None);
}

#[test]
fn distinct_reactions_are_not_duplicates() {
    let mut kin = simple_manager();
    kin.add_reaction(h2_oxidation(1.0), true).unwrap();
    kin.add_reaction(
        Reaction::new(
            &[("H2", 1.0), ("O2", 1.0)],
            &[("H2O", 1.0)],
            Box::new(ConstantRate::new(1.0)),
        )
        .unwrap(),
        true,
    )
    .unwrap();
    assert_eq!(kin.check_duplicates(false, false).unwrap(), None);
}

#[test]
fn marked_duplicates_pass_and_unmatched_marks_are_reported() {
    let mut kin = simple_manager();
    kin.add_reaction(h2_oxidation(1.0).mark_duplicate(), true).unwrap();
    kin.add_reaction(h2_oxidation(2.0).mark_duplicate(), true).unwrap();
    assert_eq!(kin.check_duplicates(true, false).unwrap(), None);

    let mut kin = simple_manager();
    kin.add_reaction(h2_oxidation(1.0).mark_duplicate(), true).unwrap();
    assert_eq!(kin.check_duplicates(false, false).unwrap(), Some((0, 0)));
    assert!(matches!(
        kin.check_duplicates(true, false),
        Err(KineticsError::UnmatchedDuplicate { index: 0, .. })
    ));

    // fix clears the stray flag
    assert_eq!(kin.check_duplicates(false, true).unwrap(), None);
    assert!(!kin.reaction(0).unwrap().duplicate);
}

#[test]
fn third_body_reactions_with_different_colliders_are_distinct() {
    let mut kin = simple_manager();
    kin.add_reaction(
        h2_oxidation(1.0).with_third_body(ThirdBody::explicit("N2")),
        true,
    )
    .unwrap();
    kin.add_reaction(
        h2_oxidation(2.0).with_third_body(ThirdBody::explicit("H2O")),
        true,
    )
    .unwrap();
    // and one without any collider
    kin.add_reaction(h2_oxidation(3.0), true).unwrap();
    assert_eq!(kin.check_duplicates(false, false).unwrap(), None);
}

fn explicit_vs_generic_manager() -> BulkKinetics {
    let mut kin = simple_manager();
    kin.add_reaction(
        h2_oxidation(1.0).with_third_body(ThirdBody::explicit("N2")),
        true,
    )
    .unwrap();
    kin.add_reaction(
        h2_oxidation(2.0).with_third_body(ThirdBody::new().with_efficiency("N2", 0.5)),
        true,
    )
    .unwrap();
    kin
}

#[test]
fn explicit_third_body_duplicate_policies() {
    // warn (default): reported to the log only
    let mut kin = explicit_vs_generic_manager();
    assert_eq!(kin.check_duplicates(true, false).unwrap(), None);

    // error
    let mut kin = explicit_vs_generic_manager();
    kin.set_third_body_duplicate_handling(ThirdBodyDuplicateHandling::Error);
    assert!(matches!(
        kin.check_duplicates(false, false),
        Err(KineticsError::DuplicateConflict { .. })
    ));

    // mark-duplicate
    let mut kin = explicit_vs_generic_manager();
    kin.set_third_body_duplicate_handling(ThirdBodyDuplicateHandling::MarkDuplicate);
    assert_eq!(kin.check_duplicates(false, false).unwrap(), None);
    assert!(kin.reaction(0).unwrap().duplicate);
    assert!(kin.reaction(1).unwrap().duplicate);

    // modify-efficiency zeroes the generic collider's N2 entry
    let mut kin = explicit_vs_generic_manager();
    kin.set_third_body_duplicate_handling(ThirdBodyDuplicateHandling::ModifyEfficiency);

    let mut concm_before = vec![0.0; 2];
    kin.third_body_concentrations(&mut concm_before).unwrap();

    assert_eq!(kin.check_duplicates(false, false).unwrap(), None);
    let tb = kin.reaction(1).unwrap().third_body.clone().unwrap();
    assert_eq!(tb.efficiencies["N2"], 0.0);

    // the fix invalidates cached third-body terms
    let mut concm_after = vec![0.0; 2];
    kin.third_body_concentrations(&mut concm_after).unwrap();
    assert!(concm_after[1] < concm_before[1]);
}

#[test]
fn generic_third_body_pair_is_a_plain_duplicate() {
    let mut kin = simple_manager();
    kin.add_reaction(
        h2_oxidation(1.0).with_third_body(ThirdBody::new()),
        true,
    )
    .unwrap();
    kin.add_reaction(
        h2_oxidation(2.0).with_third_body(ThirdBody::new().with_efficiency("H2O", 12.0)),
        true,
    )
    .unwrap();
    assert_eq!(kin.check_duplicates(false, false).unwrap(), Some((0, 1)));
}
