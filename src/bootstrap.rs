//! Bootstrap estimation of the effective residence time
//!
//! Each bootstrap iteration draws `sample_size` replicas without replacement
//! from the dissociation-time set and records the median of the draw, i.e.
//! the time by which half of the drawn replicas have dissociated. The set is
//! replenished between iterations.
//!
//! Randomness is always supplied by the caller, so a fixed seed reproduces
//! a bit-identical [`BootstrapResult`].

use crate::error::{Result, TramdError};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::Serialize;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default number of bootstrap iterations
///
/// Mean and standard deviation of the bootstrap distribution only settle
/// after tens of thousands of draws.
pub const DEFAULT_N_SAMPLES: usize = 50_000;

/// Default draw size as a fraction of the replica count
pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.8;

/// Iterations per parallel work unit, also the cancellation polling interval
const CHUNK_SIZE: usize = 1024;

/// Effective residence times, one per bootstrap iteration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BootstrapResult(Vec<f64>);

impl BootstrapResult {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Deref for BootstrapResult {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

/// Cooperative cancellation flag shared between the caller and a running bootstrap
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Deterministic RNG for bootstrap runs
pub fn seeded_rng(seed: u64) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

/// Per-chunk seed derived from a base seed (SplitMix64)
///
/// Gives every parallel work unit an independent, reproducible stream.
#[inline]
pub fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// `floor(0.8 * n)`
pub fn default_sample_size(n: usize) -> usize {
    (DEFAULT_SAMPLE_FRACTION * n as f64).floor() as usize
}

/// Resolve and validate the draw size for `n` replicas
///
/// The default is validated like an explicit value, so a single replica
/// (default size 0) is rejected rather than bumped to 1.
pub fn resolve_sample_size(n: usize, sample_size: Option<usize>) -> Result<usize> {
    if n == 0 {
        return Err(TramdError::invalid(
            "cannot bootstrap an empty set of dissociation times",
        ));
    }
    let size = sample_size.unwrap_or_else(|| default_sample_size(n));
    if size == 0 || size > n {
        return Err(TramdError::invalid(format!(
            "sample_size must be between 1 and {} (number of times), got {}",
            n, size
        )));
    }
    Ok(size)
}

/// Median of an unsorted slice, reordering it in place
///
/// Mean of the two central values for even lengths, the central value for
/// odd lengths. Uses selection instead of a full sort.
pub fn median_in_place(values: &mut [f64]) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *upper;
    if n % 2 == 1 {
        return Some(upper);
    }
    let below = lower.iter().copied().max_by(f64::total_cmp)?;
    Some((below + upper) / 2.0)
}

/// Median of a slice without modifying it
pub fn median(values: &[f64]) -> Option<f64> {
    median_in_place(&mut values.to_vec())
}

/// Working copy of the time set for repeated draws
///
/// The pool only ever holds a permutation of the input, so every partial
/// shuffle still selects a uniform subset.
struct Resampler {
    pool: Vec<f64>,
    sample_size: usize,
}

impl Resampler {
    fn new(times: &[f64], sample_size: usize) -> Self {
        Self {
            pool: times.to_vec(),
            sample_size,
        }
    }

    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        let (chosen, _) = self.pool.partial_shuffle(rng, self.sample_size);
        // sample_size >= 1 is checked before any Resampler exists
        median_in_place(chosen).unwrap_or(f64::NAN)
    }
}

fn validate(times: &[f64], n_samples: usize, sample_size: Option<usize>) -> Result<usize> {
    if n_samples == 0 {
        return Err(TramdError::invalid("n_samples must be at least 1"));
    }
    if let Some(bad) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
        return Err(TramdError::invalid(format!(
            "dissociation times must be finite and non-negative, got {}",
            bad
        )));
    }
    resolve_sample_size(times.len(), sample_size)
}

/// Bootstrapped effective residence times
///
/// Runs `n_samples` iterations, each drawing `sample_size` times (default
/// `floor(0.8 * n)`) without replacement and recording their median. The
/// input is never mutated.
///
/// # Errors
///
/// `InvalidArgument` for an empty `times`, a negative or non-finite time,
/// `n_samples == 0`, or a `sample_size` outside `1..=times.len()`.
///
/// # Example
///
/// ```
/// use tramd::bootstrap::{bootstrap_residence_times, seeded_rng};
///
/// let times = [1.7, 2.5, 3.3, 3.7, 4.4];
/// let result = bootstrap_residence_times(&times, 100, None, &mut seeded_rng(7)).unwrap();
/// assert_eq!(result.len(), 100);
/// ```
pub fn bootstrap_residence_times<R: Rng + ?Sized>(
    times: &[f64],
    n_samples: usize,
    sample_size: Option<usize>,
    rng: &mut R,
) -> Result<BootstrapResult> {
    run_sequential(times, n_samples, sample_size, rng, None)
}

/// [`bootstrap_residence_times`] that stops early with `Cancelled` once
/// `cancel` is set
pub fn bootstrap_residence_times_cancellable<R: Rng + ?Sized>(
    times: &[f64],
    n_samples: usize,
    sample_size: Option<usize>,
    rng: &mut R,
    cancel: &CancellationToken,
) -> Result<BootstrapResult> {
    run_sequential(times, n_samples, sample_size, rng, Some(cancel))
}

fn run_sequential<R: Rng + ?Sized>(
    times: &[f64],
    n_samples: usize,
    sample_size: Option<usize>,
    rng: &mut R,
    cancel: Option<&CancellationToken>,
) -> Result<BootstrapResult> {
    let sample_size = validate(times, n_samples, sample_size)?;
    tracing::debug!(n_samples, sample_size, n = times.len(), "bootstrap start");

    let mut resampler = Resampler::new(times, sample_size);
    let mut result = Vec::with_capacity(n_samples);

    for i in 0..n_samples {
        if i % CHUNK_SIZE == 0 && cancel.is_some_and(CancellationToken::is_cancelled) {
            tracing::warn!(completed = i, n_samples, "bootstrap cancelled");
            return Err(TramdError::Cancelled);
        }
        result.push(resampler.draw(rng));
    }

    Ok(BootstrapResult(result))
}

/// Parallel bootstrap on the current rayon pool
///
/// Iterations are split into fixed-size chunks, each with its own RNG seeded
/// from `(seed, chunk index)`. The result therefore depends only on `seed`
/// and the arguments, not on the number of threads. It differs from the
/// sequential result for the same seed.
pub fn bootstrap_residence_times_parallel(
    times: &[f64],
    n_samples: usize,
    sample_size: Option<usize>,
    seed: u64,
    cancel: &CancellationToken,
) -> Result<BootstrapResult> {
    let sample_size = validate(times, n_samples, sample_size)?;
    let n_chunks = n_samples.div_ceil(CHUNK_SIZE);
    tracing::debug!(
        n_samples,
        sample_size,
        n_chunks,
        threads = rayon::current_num_threads(),
        "parallel bootstrap start"
    );

    let chunks = (0..n_chunks)
        .into_par_iter()
        .map(|chunk| {
            if cancel.is_cancelled() {
                return Err(TramdError::Cancelled);
            }
            let start = chunk * CHUNK_SIZE;
            let len = CHUNK_SIZE.min(n_samples - start);
            let mut rng = seeded_rng(counter_rng_seed(seed, chunk as u64));
            let mut resampler = Resampler::new(times, sample_size);
            Ok((0..len).map(|_| resampler.draw(&mut rng)).collect::<Vec<_>>())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BootstrapResult(chunks.into_iter().flatten().collect()))
}
