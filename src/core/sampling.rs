// src/core/sampling.rs

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Seeded generator when a seed is configured, OS-seeded otherwise.
pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Draws an index from an unnormalized distribution by walking the CDF.
/// Returns `None` when the total weight is negligible.
pub(crate) fn sample_index(weights: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if total < 1e-12 {
        return None;
    }
    let p_sample = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    // Rounding can leave p_sample just past the last bucket.
    let mut chosen = weights.iter().rposition(|w| *w > 0.0)?;
    for (index, weight) in weights.iter().enumerate() {
        if !(weight.is_finite() && *weight > 0.0) {
            continue;
        }
        cumulative += weight;
        if p_sample < cumulative {
            chosen = index;
            break;
        }
    }
    Some(chosen)
}

/// Index of the largest weight; the first one wins ties.
pub(crate) fn argmax(weights: &[f64]) -> Option<usize> {
    weights
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, w)| match best {
            Some((_, bw)) if *w <= bw => best,
            _ => Some((i, *w)),
        })
        .map(|(i, _)| i)
}
