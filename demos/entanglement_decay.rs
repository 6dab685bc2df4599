//! Example tracking a Bell pair and a biased pair as their fidelity decays.
//! Run with `RUST_LOG=qstate=debug` to see registry events.

use qstate::{EntanglementConfig, EntanglementManager, EntanglementType, QuantumError};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), QuantumError> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    println!("--- qstate Example: Entanglement Decay ---");

    let manager = EntanglementManager::new(EntanglementConfig::default().with_decoherence_rate(0.05).with_seed(7))?;
    let bell = manager.create_entangled_pair(
        EntanglementType::BellPhiPlus,
        Some("alice".into()),
        Some("bob".into()),
        None,
    )?;
    let biased = manager.create_entangled_pair(EntanglementType::BiasedCustom, None, None, Some(0.4))?;

    println!("\nCreated:\n  {}\n  {}", bell, biased);
    println!("\n{:>5}  {:>22}  {:>22}", "t(s)", "Φ+ fidelity/concurrence", "biased fidelity/concurrence");

    // Manual stepping; `start_tracking` does the same on a background thread.
    for second in 1..=15 {
        let report = manager.advance_decay(Duration::from_secs(1));
        let describe = |id| {
            manager
                .get_pair(id)
                .map(|p| format!("{:.4} / {:.4}", p.fidelity(), p.concurrence()))
                .unwrap_or_else(|| "evicted".to_string())
        };
        println!("{:>5}  {:>22}  {:>22}", second, describe(&bell.pair_id), describe(&biased.pair_id));
        for evicted in &report.evicted {
            println!("       pair {} fell below the eviction threshold", evicted);
        }
    }

    if manager.get_pair(&bell.pair_id).is_some() {
        let m = manager.measure_pair(&bell.pair_id)?;
        println!(
            "\nMeasured {}: {} (p = {:.3}), A = {}, B = {}",
            m.pair_id, m.outcome, m.probability, m.outcome_a, m.outcome_b
        );
    }

    let status = manager.status();
    println!("\nStatus:");
    println!("  active pairs:     {}", status.active_pairs);
    println!("  created/attempts: {}/{}", status.total_created, status.total_attempts);
    println!("  evicted:          {}", status.total_evicted);
    println!("  average fidelity: {:.4}", status.average_fidelity);
    println!("  quality:          {:?}", status.quality_distribution);

    Ok(())
}
