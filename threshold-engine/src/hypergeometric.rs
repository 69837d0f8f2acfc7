//! Exact hypergeometric tail probabilities.
//!
//! Binomial coefficients are accumulated in log space so populations of a
//! few hundred sites never overflow.

use crate::numbers::{clamp_probability, count_to_f64, u32_to_usize};

/// `ln C(n, k)`, or negative infinity when `k > n`.
#[must_use]
pub fn log_n_choose_k(n: usize, k: usize) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    if k == 0 || k == n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut sum = 0.0;
    for j in 0..k {
        sum += count_to_f64(n - j).ln() - count_to_f64(j + 1).ln();
    }
    sum
}

/// Probability that `draws` items taken without replacement from a
/// population of `population`, `successes` of which are hits, contain at
/// least `required` hits.
///
/// `required == 0` is trivially satisfied; fewer hits or draws than
/// `required` is impossible. The result is clamped to `[0, 1]`.
#[must_use]
pub fn hypergeometric_at_least(
    population: usize,
    successes: usize,
    draws: usize,
    required: u32,
) -> f64 {
    if required == 0 {
        return 1.0;
    }
    let required = u32_to_usize(required);
    let successes = successes.min(population);
    if successes < required || draws < required {
        return 0.0;
    }
    let draws = draws.min(population);
    let failures = population - successes;
    let log_total = log_n_choose_k(population, draws);
    let upper = successes.min(draws);

    let mut probability = 0.0;
    for hits in required..=upper {
        if draws - hits > failures {
            continue;
        }
        probability +=
            (log_n_choose_k(successes, hits) + log_n_choose_k(failures, draws - hits) - log_total)
                .exp();
    }
    clamp_probability(probability)
}
