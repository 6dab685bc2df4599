// tests/collapse_tests.rs

use num_complex::Complex64;
use qstate::{
    CollapseConfig, CollapseMechanism, CollapseRequest, CollapseTrigger, MeasurementBasis, QuantumError,
    QuantumState, StateCollapseHandler,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

const TOLERANCE: f64 = 1e-9;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn handler(seed: u64) -> StateCollapseHandler {
    StateCollapseHandler::new(CollapseConfig::default().with_seed(seed)).expect("valid configuration")
}

fn uniform_two_qubit() -> Result<QuantumState, QuantumError> {
    QuantumState::from_amplitudes(vec![c(0.5, 0.0); 4])
}

#[test]
fn test_von_neumann_is_idempotent() -> Result<(), QuantumError> {
    let handler = handler(7);
    let state = QuantumState::from_amplitudes(vec![c(0.6, 0.0), c(0.0, 0.0), c(0.0, 0.8), c(0.0, 0.0)])?;
    let request = CollapseRequest::default();

    let first = handler.trigger_collapse(&state, &request)?;
    let idx = first.outcome_index.expect("projective collapse selects an outcome");
    assert!(idx == 0 || idx == 2);
    assert!((first.state_after.probabilities()[idx] - 1.0).abs() < TOLERANCE);
    assert!(first.coherence_after.abs() < TOLERANCE);
    assert_eq!(first.measurement_result.as_deref(), state.label(idx));

    let second = handler.trigger_collapse(&first.state_after, &request)?;
    assert_eq!(second.outcome_index, Some(idx));
    assert!((second.collapse_probability - 1.0).abs() < TOLERANCE);
    assert!((second.state_after.fidelity_with(&first.state_after)? - 1.0).abs() < TOLERANCE);
    Ok(())
}

#[test]
fn test_projection_keeps_phase_of_winner() -> Result<(), QuantumError> {
    let state = QuantumState::from_amplitudes(vec![c(0.0, 0.0), c(0.0, 1.0)])?;
    let event = handler(1).trigger_collapse(&state, &CollapseRequest::default())?;
    assert_eq!(event.outcome_index, Some(1));
    assert!((event.state_after.amplitudes()[1] - c(0.0, 1.0)).norm() < TOLERANCE);
    Ok(())
}

#[test]
fn test_every_mechanism_returns_normalized_state() -> Result<(), QuantumError> {
    let handler = handler(21);
    let state = QuantumState::from_amplitudes(vec![c(0.3, 0.1), c(0.5, -0.2), c(0.1, 0.6), c(0.4, 0.25)])?;
    for mechanism in CollapseMechanism::ALL {
        for strength in [0.0, 0.1, 0.5, 1.0] {
            let request = CollapseRequest::new(CollapseTrigger::Interaction, mechanism)
                .with_strength(strength)
                .with_bias(0.5);
            let event = handler.trigger_collapse(&state, &request)?;
            assert!(event.success, "{} at {} not normalized", mechanism, strength);
            assert!((event.state_after.norm_sqr() - 1.0).abs() < 1e-6);
            assert!((0.0..=1.0).contains(&event.coherence_after));
            assert!((0.0..=1.0).contains(&event.coherence_loss));
            assert!(event.information_loss >= 0.0);
        }
    }
    Ok(())
}

#[test]
fn test_caller_state_untouched() -> Result<(), QuantumError> {
    let state = uniform_two_qubit()?;
    let snapshot = state.clone();
    let event = handler(3).trigger_collapse(
        &state,
        &CollapseRequest::new(CollapseTrigger::Observation, CollapseMechanism::Environmental).with_strength(0.7),
    )?;
    assert_eq!(state, snapshot);
    assert_eq!(event.state_before, snapshot);
    assert_eq!(event.probabilities_before, snapshot.probabilities());
    Ok(())
}

#[test]
fn test_weak_measurement_records_fields() -> Result<(), QuantumError> {
    let state = uniform_two_qubit()?;
    let event = handler(5).trigger_collapse(
        &state,
        &CollapseRequest::new(CollapseTrigger::Measurement, CollapseMechanism::WeakMeasurement)
            .with_strength(0.2)
            .with_observer("lab-7"),
    )?;
    assert_eq!(event.applied_mechanism, CollapseMechanism::WeakMeasurement);
    assert!(!event.fallback_applied);
    assert_eq!(event.outcome_index, None);
    assert_eq!(event.measurement_result, None);
    assert_eq!(event.observer_id.as_deref(), Some("lab-7"));
    assert!((event.coherence_after - event.coherence_before * 0.9).abs() < TOLERANCE);
    for p in &event.probabilities_after {
        assert!((p - 0.25).abs() < 1e-9);
    }
    Ok(())
}

#[test]
fn test_biased_collapse_with_full_bias() -> Result<(), QuantumError> {
    let state = uniform_two_qubit()?;
    let handler = handler(8);
    for _ in 0..5 {
        let event = handler.trigger_collapse(
            &state,
            &CollapseRequest::new(CollapseTrigger::Measurement, CollapseMechanism::Biased)
                .with_bias(1.0)
                .with_favored_outcome(3),
        )?;
        assert_eq!(event.applied_mechanism, CollapseMechanism::Biased);
        assert_eq!(event.outcome_index, Some(3));
        assert_eq!(event.measurement_result.as_deref(), Some("|11>"));
        assert!((event.collapse_probability - 1.0).abs() < TOLERANCE);
    }

    let out_of_range = handler.trigger_collapse(
        &state,
        &CollapseRequest::new(CollapseTrigger::Measurement, CollapseMechanism::Biased)
            .with_bias(0.5)
            .with_favored_outcome(4),
    );
    assert!(matches!(out_of_range, Err(QuantumError::InvalidParameter { .. })));
    Ok(())
}

#[test]
fn test_biased_without_bias_falls_back() -> Result<(), QuantumError> {
    let state = uniform_two_qubit()?;
    let event = handler(2).trigger_collapse(
        &state,
        &CollapseRequest::new(CollapseTrigger::Measurement, CollapseMechanism::Biased),
    )?;
    assert_eq!(event.requested_mechanism, CollapseMechanism::Biased);
    assert_eq!(event.applied_mechanism, CollapseMechanism::VonNeumann);
    assert!(event.fallback_applied);
    Ok(())
}

#[test]
fn test_zeno_pulls_toward_dominant_outcome() -> Result<(), QuantumError> {
    let state = QuantumState::from_amplitudes(vec![c(0.8, 0.0), c(0.6, 0.0)])?;
    let event = handler(4).trigger_collapse(
        &state,
        &CollapseRequest::new(CollapseTrigger::Observation, CollapseMechanism::QuantumZeno).with_strength(0.3),
    )?;
    assert!(event.zeno_effect);
    assert_eq!(event.outcome_index, Some(0));
    assert!(event.probabilities_after[0] > event.probabilities_before[0]);
    Ok(())
}

#[test]
fn test_hadamard_basis_measurement() -> Result<(), QuantumError> {
    let handler = handler(12);
    let minus = QuantumState::from_amplitudes(vec![c(1.0, 0.0), c(-1.0, 0.0)])?;
    let event = handler.trigger_collapse(&minus, &CollapseRequest::default().with_basis(MeasurementBasis::Hadamard))?;
    assert_eq!(event.measurement_result.as_deref(), Some("|->"));
    assert_eq!(event.measurement_basis, MeasurementBasis::Hadamard);
    assert!((event.state_after.fidelity_with(&minus)? - 1.0).abs() < 1e-6);
    // |-> is a basis state of the Hadamard frame: nothing to lose.
    assert!(event.coherence_before.abs() < TOLERANCE);
    assert!(event.coherence_loss.abs() < TOLERANCE);

    let zero = QuantumState::basis_state(1, 0)?;
    let mut rng = StdRng::seed_from_u64(99);
    let mut seen = [false; 2];
    for _ in 0..40 {
        let event = handler.trigger_collapse_with_rng(
            &zero,
            &CollapseRequest::default().with_basis(MeasurementBasis::Hadamard),
            &mut rng,
        )?;
        let idx = event.outcome_index.expect("outcome selected");
        seen[idx] = true;
        assert!((event.collapse_probability - 0.5).abs() < 1e-6);
        assert!((event.coherence_loss - 1.0).abs() < 1e-6);
    }
    assert!(seen[0] && seen[1]);
    Ok(())
}

#[test]
fn test_rejects_unnormalized_input() -> Result<(), QuantumError> {
    let raw = QuantumState::from_raw_parts(vec![c(1.0, 0.0), c(1.0, 0.0)], qstate::core::computational_labels(1))?;
    assert!(matches!(
        handler(0).trigger_collapse(&raw, &CollapseRequest::default()),
        Err(QuantumError::InvalidState { .. })
    ));
    Ok(())
}

#[test]
fn test_unknown_mechanism_name() {
    assert!(matches!(
        "many_worlds".parse::<CollapseMechanism>(),
        Err(QuantumError::UnsupportedMechanism { .. })
    ));
    assert_eq!("weak".parse::<CollapseMechanism>().ok(), Some(CollapseMechanism::WeakMeasurement));
}

#[test]
fn test_event_serializes() -> Result<(), QuantumError> {
    let event = handler(6).trigger_collapse(&uniform_two_qubit()?, &CollapseRequest::default())?;
    let json = serde_json::to_value(&event).expect("event serializes");
    assert_eq!(json["requested_mechanism"], "von_neumann");
    assert_eq!(json["trigger"], "measurement");
    assert!(json["state_after"]["amplitudes"].is_array());
    Ok(())
}
