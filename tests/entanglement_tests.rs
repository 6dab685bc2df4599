// tests/entanglement_tests.rs

use qstate::{EntanglementConfig, EntanglementManager, EntanglementType, QuantumError};
use std::collections::HashSet;
use std::f64::consts::FRAC_1_SQRT_2;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

const TOLERANCE: f64 = 1e-9;

fn manager_with(config: EntanglementConfig) -> EntanglementManager {
    EntanglementManager::new(config).expect("valid configuration")
}

#[test]
fn test_phi_plus_creation() -> Result<(), QuantumError> {
    let manager = manager_with(EntanglementConfig::default());
    let pair = manager.create_entangled_pair(
        EntanglementType::BellPhiPlus,
        Some("alice".into()),
        Some("bob".into()),
        None,
    )?;

    let amps = pair.joint_state.amplitudes();
    assert!((amps[0].re - FRAC_1_SQRT_2).abs() < TOLERANCE);
    assert!(amps[1].norm() < TOLERANCE);
    assert!(amps[2].norm() < TOLERANCE);
    assert!((amps[3].re - FRAC_1_SQRT_2).abs() < TOLERANCE);
    assert_eq!(pair.joint_state.basis_labels(), &["|00>", "|01>", "|10>", "|11>"]);

    assert_eq!(pair.fidelity(), 1.0);
    assert!((pair.concurrence() - 1.0).abs() < TOLERANCE);
    assert!((pair.entanglement_entropy() - 1.0).abs() < TOLERANCE);
    assert!((pair.reduced_a.populations()[0] - 0.5).abs() < TOLERANCE);
    assert!((pair.reduced_b.purity() - 0.5).abs() < TOLERANCE);
    Ok(())
}

#[test]
fn test_ten_second_decay() -> Result<(), QuantumError> {
    let manager = manager_with(EntanglementConfig::default());
    let pair = manager.create_entangled_pair(EntanglementType::BellPhiPlus, None, None, None)?;

    let mut previous = pair.fidelity();
    for _ in 0..10 {
        let report = manager.advance_decay(Duration::from_secs(1));
        assert_eq!(report.updated, 1);
        assert!(report.evicted.is_empty());
        let current = manager.get_pair(&pair.pair_id).expect("pair is still active").fidelity();
        assert!(current <= previous, "fidelity must not increase between measurements");
        previous = current;
    }
    assert!((previous - (-0.1f64).exp()).abs() < 1e-3);
    assert!((previous - 0.905).abs() < 1e-3);
    Ok(())
}

#[test]
fn test_metrics_stay_consistent() -> Result<(), QuantumError> {
    let manager = manager_with(EntanglementConfig::default().with_decoherence_rate(0.05));
    let pair = manager.create_entangled_pair(EntanglementType::BellPsiMinus, None, None, None)?;

    let mut previous_entropy = pair.entanglement_entropy();
    for _ in 0..12 {
        manager.advance_decay(Duration::from_millis(750));
        let Some(current) = manager.get_pair(&pair.pair_id) else { break };
        let f = current.fidelity();
        assert!((current.concurrence() - (2.0 * f - 1.0).max(0.0)).abs() < TOLERANCE);
        assert!((current.negativity() - (f - 0.5).max(0.0)).abs() < TOLERANCE);
        assert!(current.entanglement_entropy() <= previous_entropy + TOLERANCE);
        previous_entropy = current.entanglement_entropy();
    }
    Ok(())
}

#[test]
fn test_eviction_below_threshold() -> Result<(), QuantumError> {
    let manager = manager_with(EntanglementConfig::default().with_decoherence_rate(0.5));
    let pair = manager.create_entangled_pair(
        EntanglementType::BellPhiPlus,
        Some("p1".into()),
        Some("p2".into()),
        None,
    )?;

    // exp(-0.5 * 1.5) ≈ 0.47 < 0.5
    let report = manager.advance_decay(Duration::from_millis(1500));
    assert_eq!(report.evicted, vec![pair.pair_id]);
    assert!(manager.get_pair(&pair.pair_id).is_none());
    assert!(manager.get_pair_by_particle("p1").is_none());
    assert!(manager.get_pair_by_particle("p2").is_none());

    let status = manager.status();
    assert_eq!(status.active_pairs, 0);
    assert_eq!(status.total_evicted, 1);

    // Both particles are free again.
    manager.create_entangled_pair(EntanglementType::BellPhiPlus, Some("p1".into()), Some("p2".into()), None)?;
    Ok(())
}

#[test]
fn test_coherence_time_bounds_lifetime() -> Result<(), QuantumError> {
    let mut config = EntanglementConfig::default();
    config.coherence_time_secs = Some(2.0);
    let manager = manager_with(config);
    let pair = manager.create_entangled_pair(EntanglementType::Ghz, None, None, None)?;

    assert!(manager.advance_decay(Duration::from_secs(2)).evicted.is_empty());
    manager.measure_pair(&pair.pair_id)?;
    assert!(manager.advance_decay(Duration::from_millis(1500)).evicted.is_empty());
    assert_eq!(manager.advance_decay(Duration::from_secs(1)).evicted, vec![pair.pair_id]);
    Ok(())
}

#[test]
fn test_duplicate_particle_rejected() -> Result<(), QuantumError> {
    let manager = manager_with(EntanglementConfig::default());
    let first = manager.create_entangled_pair(
        EntanglementType::BellPhiPlus,
        Some("shared".into()),
        Some("other".into()),
        None,
    )?;

    let duplicate = manager.create_entangled_pair(
        EntanglementType::BellPsiPlus,
        Some("fresh".into()),
        Some("shared".into()),
        None,
    );
    match duplicate {
        Err(QuantumError::DuplicateEntanglement { particle_id, pair_id }) => {
            assert_eq!(particle_id, "shared");
            assert_eq!(pair_id, first.pair_id);
        }
        other => panic!("expected DuplicateEntanglement, got {:?}", other),
    }

    let status = manager.status();
    assert_eq!(status.total_attempts, 2);
    assert_eq!(status.total_created, 1);
    assert!((status.success_rate - 0.5).abs() < TOLERANCE);
    Ok(())
}

#[test]
fn test_biased_custom_pair() -> Result<(), QuantumError> {
    let manager = manager_with(EntanglementConfig::default());
    let pair = manager.create_entangled_pair(EntanglementType::BiasedCustom, None, None, Some(0.6))?;
    let probs = pair.joint_state.probabilities();
    assert!((probs[0] - 0.8).abs() < TOLERANCE);
    assert!((probs[3] - 0.2).abs() < TOLERANCE);
    assert!(pair.fidelity() < 1.0);
    assert_eq!(pair.bias_factor, Some(0.6));

    // A fully biased state is a product state at fidelity 0.49, under the default threshold.
    let created_before = manager.status().total_created;
    assert!(matches!(
        manager.create_entangled_pair(EntanglementType::BiasedCustom, None, None, Some(3.0)),
        Err(QuantumError::InvalidParameter { .. })
    ));
    assert!(matches!(
        manager.create_entangled_pair(EntanglementType::BiasedCustom, None, None, Some(f64::NAN)),
        Err(QuantumError::InvalidParameter { .. })
    ));
    assert_eq!(manager.status().total_created, created_before);
    assert_eq!(manager.pair_count(), 1);

    // With a lower threshold the out-of-range bias is clamped and accepted.
    let lenient = manager_with(EntanglementConfig::default().with_eviction_threshold(0.4));
    let clamped = lenient.create_entangled_pair(EntanglementType::BiasedCustom, None, None, Some(3.0))?;
    assert_eq!(clamped.bias_factor, Some(1.0));
    assert!((clamped.fidelity() - 0.49).abs() < TOLERANCE);
    Ok(())
}

#[test]
fn test_status_quality_distribution_and_serialization() -> Result<(), QuantumError> {
    let manager = manager_with(EntanglementConfig::default());
    for kind in [EntanglementType::BellPhiPlus, EntanglementType::W, EntanglementType::BiasedCustom] {
        manager.create_entangled_pair(kind, None, None, Some(0.9))?;
    }
    let status = manager.status();
    assert_eq!(status.active_pairs, 3);
    assert_eq!(
        status.quality_distribution.excellent
            + status.quality_distribution.good
            + status.quality_distribution.fair
            + status.quality_distribution.poor,
        3
    );
    assert!(status.average_fidelity > 0.0 && status.average_fidelity <= 1.0);

    let json = serde_json::to_value(&status).expect("status serializes");
    assert_eq!(json["active_pairs"], 3);
    assert!(json["quality_distribution"]["excellent"].is_number());
    Ok(())
}

#[test]
fn test_background_tracking_decays_pairs() -> Result<(), QuantumError> {
    let manager = manager_with(
        EntanglementConfig::default()
            .with_tracking_interval_ms(10)
            .with_decoherence_rate(1.0),
    );
    let pair = manager.create_entangled_pair(EntanglementType::BellPhiPlus, None, None, None)?;
    assert!(manager.start_tracking()?);
    thread::sleep(Duration::from_millis(120));
    assert!(manager.stop_tracking()?);

    let fidelity = manager.get_pair(&pair.pair_id).map(|p| p.fidelity()).unwrap_or(0.0);
    assert!(fidelity < 1.0, "background thread should have decayed the pair");
    Ok(())
}

#[test]
fn test_type_names_parse() {
    assert_eq!("psi-minus".parse::<EntanglementType>().ok(), Some(EntanglementType::BellPsiMinus));
    assert!(matches!(
        "bell-chi".parse::<EntanglementType>(),
        Err(QuantumError::InvalidConfiguration { .. })
    ));
}

#[test]
fn test_concurrent_creation_and_queries_under_tracking() -> Result<(), QuantumError> {
    const WORKERS: usize = 8;
    const ROUNDS: usize = 50;
    const PARTICLES: usize = 12;

    // Fast decay so the tracker evicts while workers are creating.
    let manager = manager_with(
        EntanglementConfig::default()
            .with_tracking_interval_ms(5)
            .with_decoherence_rate(2.0)
            .with_seed(21),
    );
    assert!(manager.start_tracking()?);

    let attempts = AtomicU64::new(0);
    let created = AtomicU64::new(0);
    let rejected = AtomicU64::new(0);

    thread::scope(|s| -> Result<(), QuantumError> {
        let handles: Vec<_> = (0..WORKERS)
            .map(|worker| {
                let (manager, attempts, created, rejected) = (&manager, &attempts, &created, &rejected);
                s.spawn(move || -> Result<(), QuantumError> {
                    for round in 0..ROUNDS {
                        let a = format!("q{}", (worker + round) % PARTICLES);
                        let b = format!("q{}", (worker + round + 1) % PARTICLES);
                        attempts.fetch_add(1, Ordering::SeqCst);
                        match manager.create_entangled_pair(
                            EntanglementType::BellPhiPlus,
                            Some(a.as_str().into()),
                            Some(b.as_str().into()),
                            None,
                        ) {
                            Ok(pair) => {
                                created.fetch_add(1, Ordering::SeqCst);
                                if let Some(stored) = manager.get_pair(&pair.pair_id) {
                                    assert_eq!(stored.particle_a_id, pair.particle_a_id);
                                }
                                match manager.measure_pair(&pair.pair_id) {
                                    Ok(m) => assert_eq!(m.outcome_a, m.outcome_b),
                                    Err(QuantumError::PairNotFound { .. }) => {}
                                    Err(e) => return Err(e),
                                }
                            }
                            Err(QuantumError::DuplicateEntanglement { .. }) => {
                                rejected.fetch_add(1, Ordering::SeqCst);
                            }
                            Err(e) => return Err(e),
                        }
                        if let Some(owner) = manager.get_pair_by_particle(&a) {
                            assert!(owner.particle_a_id.as_str() == a || owner.particle_b_id.as_str() == a);
                        }
                        let _ = manager.status();
                    }
                    Ok(())
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker thread panicked")?;
        }
        Ok(())
    })?;

    assert!(manager.stop_tracking()?);
    assert!(!manager.is_tracking());

    let active = manager.active_pairs();
    let mut particles = HashSet::new();
    for pair in &active {
        assert!(particles.insert(pair.particle_a_id.clone()), "particle shared by two pairs");
        assert!(particles.insert(pair.particle_b_id.clone()), "particle shared by two pairs");
    }

    let status = manager.status();
    let total = attempts.load(Ordering::SeqCst);
    assert_eq!(total, (WORKERS * ROUNDS) as u64);
    assert_eq!(status.total_attempts, total);
    assert_eq!(status.total_created, created.load(Ordering::SeqCst));
    assert_eq!(status.total_created + rejected.load(Ordering::SeqCst), total);
    assert_eq!(active.len() as u64 + status.total_evicted, status.total_created);
    assert_eq!(status.active_pairs, active.len());
    Ok(())
}
