//! Example encoding a logical qubit in each stabilizer code, injecting
//! errors and correcting them through `QuantumCore`.

use num_complex::Complex64;
use qstate::{CodeType, CoreConfig, ErrorTag, QuantumCore, QuantumError, QuantumState};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), QuantumError> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    println!("--- qstate Example: Stabilizer Error Correction ---");

    let mut config = CoreConfig::default();
    config.correction = config.correction.with_seed(11);
    let core = QuantumCore::new(config)?;
    let engine = core.correction();

    let logical = QuantumState::from_amplitudes(vec![Complex64::new(0.6, 0.0), Complex64::new(0.8, 0.0)])?;
    println!("\nLogical state: {}", logical);

    let scenarios: [(CodeType, Vec<ErrorTag>); 5] = [
        (CodeType::Shor9, vec![ErrorTag::bit_flip(0)]),
        (CodeType::Shor9, vec![ErrorTag::bit_flip(2), ErrorTag::phase_flip(7)]),
        (CodeType::Steane7, vec![ErrorTag::depolarizing(4)]),
        (CodeType::Surface, vec![ErrorTag::bit_phase_flip(6)]),
        // The repetition code cannot see phase flips; the logical state keeps the Z.
        (CodeType::Repetition, vec![ErrorTag::bit_flip(1), ErrorTag::phase_flip(0)]),
    ];

    for (code_type, tags) in scenarios {
        let mut encoded = engine.encode(code_type, &logical)?;
        for tag in &tags {
            let applied = engine.inject_error(&mut encoded, tag)?;
            println!("\n[{}] injected {} as {}", code_type, tag, applied.display(encoded.num_qubits()));
        }

        let result = core.correct_errors(&mut encoded, &tags, code_type)?;
        let decoded = engine.decode(code_type, &encoded)?;
        println!(
            "  corrected {}/{} (syndrome {:#b}), fidelity {:.3} -> {:.3}, successful: {}",
            result.corrected_errors.len(),
            result.detected_errors.len(),
            result.syndrome,
            result.fidelity_before,
            result.fidelity_after,
            result.correction_successful
        );
        println!("  decoded: {}  overlap with input: {:.6}", decoded, decoded.fidelity_with(&logical)?);
    }

    let stats = core.get_status().correction;
    println!(
        "\nRuns: {}, success rate {:.2}, uncorrectable errors {}",
        stats.total_runs,
        stats.success_rate(),
        stats.uncorrectable_errors
    );

    Ok(())
}
