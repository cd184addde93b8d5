//! Deterministic random number generation.
//!
//! Implements PCG (Permuted Congruential Generator) with partitioned seeds
//! so every sampling chain gets its own reproducible stream.
//!
//! # Reproducibility Guarantee
//!
//! Given the same master seed, all random number sequences will be
//! bitwise-identical across runs and platforms.

use rand::prelude::*;
use rand_pcg::Pcg64;

/// Golden-ratio increment used to derive partition seeds.
const STREAM_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic, reproducible random number generator.
///
/// Provides the uniform, normal, gamma and beta variates needed by the
/// risk sampler on top of a seeded PCG stream.
#[derive(Debug, Clone)]
pub struct SeededRng {
    /// Master seed for reproducibility.
    master_seed: u64,
    /// Current stream index for partitioning.
    stream: u64,
    /// Internal PCG state.
    rng: Pcg64,
}

impl SeededRng {
    /// Create a new RNG with the given master seed.
    #[must_use]
    pub fn new(master_seed: u64) -> Self {
        Self {
            master_seed,
            stream: 0,
            rng: Pcg64::seed_from_u64(master_seed),
        }
    }

    /// Get the master seed.
    #[must_use]
    pub const fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Get current stream index.
    #[must_use]
    pub const fn stream(&self) -> u64 {
        self.stream
    }

    /// Create partitioned RNGs, one per sampling chain.
    ///
    /// Each partition gets an independent stream derived from the master seed,
    /// so chain `k` draws the same values no matter how many chains run.
    ///
    /// # Example
    ///
    /// ```rust
    /// use isst::engine::rng::SeededRng;
    ///
    /// let mut rng = SeededRng::new(42);
    /// let chains = rng.partition(4);
    /// assert_eq!(chains.len(), 4);
    /// ```
    #[must_use]
    pub fn partition(&mut self, n: usize) -> Vec<Self> {
        let partitions: Vec<Self> = (0..n)
            .map(|i| {
                let stream = self.stream + i as u64;
                let seed = self
                    .master_seed
                    .wrapping_add(stream.wrapping_mul(STREAM_STRIDE));
                Self {
                    master_seed: self.master_seed,
                    stream,
                    rng: Pcg64::seed_from_u64(seed),
                }
            })
            .collect();

        self.stream += n as u64;
        partitions
    }

    /// Generate a random f64 in [0, 1).
    pub fn gen_f64(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Generate a standard normal sample using Box-Muller transform.
    pub fn gen_standard_normal(&mut self) -> f64 {
        let u1 = self.gen_f64();
        let u2 = self.gen_f64();

        // Avoid log(0)
        let u1 = if u1 < f64::EPSILON { f64::EPSILON } else { u1 };

        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Generate a Gamma(shape, 1) sample (Marsaglia-Tsang squeeze).
    ///
    /// Shapes below one are boosted with `Gamma(a + 1) · U^(1/a)`.
    /// Returns NaN for a non-positive or non-finite shape so callers can
    /// catch it with a jidoka guard.
    pub fn gen_gamma(&mut self, shape: f64) -> f64 {
        if !(shape.is_finite() && shape > 0.0) {
            return f64::NAN;
        }
        if shape < 1.0 {
            let boost = self.gen_f64().powf(1.0 / shape);
            return self.gen_gamma(shape + 1.0) * boost;
        }

        let d = shape - 1.0 / 3.0;
        let c = 1.0 / (9.0 * d).sqrt();
        loop {
            let x = self.gen_standard_normal();
            let v = 1.0 + c * x;
            if v <= 0.0 {
                continue;
            }
            let v = v * v * v;
            let u = self.gen_f64();
            let x2 = x * x;
            if u < 1.0 - 0.0331 * x2 * x2 {
                return d * v;
            }
            if u.ln() < 0.5 * x2 + d * (1.0 - v + v.ln()) {
                return d * v;
            }
        }
    }

    /// Generate a Beta(alpha, beta) sample in [0, 1].
    pub fn gen_beta(&mut self, alpha: f64, beta: f64) -> f64 {
        let x = self.gen_gamma(alpha);
        let y = self.gen_gamma(beta);
        let total = x + y;
        if total > 0.0 {
            x / total
        } else {
            // Both gammas underflowed; fall back to the Beta mean.
            alpha / (alpha + beta)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moments(samples: &[f64]) -> (f64, f64) {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        (mean, variance)
    }

    /// Property: Same seed produces same sequence.
    #[test]
    fn test_reproducibility() {
        let mut rng1 = SeededRng::new(42);
        let mut rng2 = SeededRng::new(42);

        let seq1: Vec<f64> = (0..100).map(|_| rng1.gen_beta(2.0, 5.0)).collect();
        let seq2: Vec<f64> = (0..100).map(|_| rng2.gen_beta(2.0, 5.0)).collect();

        assert_eq!(seq1, seq2, "Same seed must produce identical sequences");
    }

    #[test]
    fn test_different_seeds() {
        let mut rng1 = SeededRng::new(42);
        let mut rng2 = SeededRng::new(43);

        let seq1: Vec<f64> = (0..100).map(|_| rng1.gen_f64()).collect();
        let seq2: Vec<f64> = (0..100).map(|_| rng2.gen_f64()).collect();

        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_partition_independence() {
        let mut rng = SeededRng::new(42);
        let mut partitions = rng.partition(4);

        let seqs: Vec<Vec<f64>> = partitions
            .iter_mut()
            .map(|p| (0..10).map(|_| p.gen_f64()).collect())
            .collect();

        for i in 0..seqs.len() {
            for j in (i + 1)..seqs.len() {
                assert_ne!(seqs[i], seqs[j], "Partitions must be independent");
            }
        }
    }

    #[test]
    fn test_partition_prefix_stable() {
        // Chain 0 of a 2-way split equals chain 0 of a 4-way split.
        let mut a = SeededRng::new(7).partition(2);
        let mut b = SeededRng::new(7).partition(4);
        let seq_a: Vec<f64> = (0..10).map(|_| a[0].gen_f64()).collect();
        let seq_b: Vec<f64> = (0..10).map(|_| b[0].gen_f64()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_partition_stream_increment() {
        let mut rng = SeededRng::new(42);
        let _ = rng.partition(4);
        assert_eq!(rng.stream(), 4);
        let _ = rng.partition(3);
        assert_eq!(rng.stream(), 7);
        assert_eq!(rng.master_seed(), 42);
    }

    #[test]
    fn test_normal_distribution() {
        let mut rng = SeededRng::new(42);
        let samples: Vec<f64> = (0..10_000).map(|_| rng.gen_standard_normal()).collect();
        let (mean, variance) = moments(&samples);
        assert!(mean.abs() < 0.1, "Mean {mean} too far from 0");
        assert!((variance - 1.0).abs() < 0.1, "Variance {variance} too far from 1");
    }

    #[test]
    fn test_gamma_moments() {
        let mut rng = SeededRng::new(11);
        for shape in [0.5, 1.0, 3.0, 10.0] {
            let samples: Vec<f64> = (0..20_000).map(|_| rng.gen_gamma(shape)).collect();
            let (mean, variance) = moments(&samples);
            assert!(
                (mean - shape).abs() < 0.05 * shape.max(1.0),
                "Gamma({shape}) mean {mean}"
            );
            assert!(
                (variance - shape).abs() < 0.15 * shape.max(1.0),
                "Gamma({shape}) variance {variance}"
            );
        }
    }

    #[test]
    fn test_gamma_invalid_shape_is_nan() {
        let mut rng = SeededRng::new(1);
        assert!(rng.gen_gamma(0.0).is_nan());
        assert!(rng.gen_gamma(-2.0).is_nan());
        assert!(rng.gen_gamma(f64::NAN).is_nan());
    }

    #[test]
    fn test_beta_moments() {
        let mut rng = SeededRng::new(8927);
        let (alpha, beta) = (2.0, 6.0);
        let samples: Vec<f64> = (0..20_000).map(|_| rng.gen_beta(alpha, beta)).collect();
        let (mean, variance) = moments(&samples);
        let expected_mean = alpha / (alpha + beta);
        let expected_var =
            alpha * beta / ((alpha + beta).powi(2) * (alpha + beta + 1.0));
        assert!((mean - expected_mean).abs() < 0.01, "Beta mean {mean}");
        assert!((variance - expected_var).abs() < 0.003, "Beta variance {variance}");
    }

    #[test]
    fn test_beta_bounds() {
        let mut rng = SeededRng::new(3);
        for _ in 0..5000 {
            let v = rng.gen_beta(0.3, 0.4);
            assert!((0.0..=1.0).contains(&v), "Beta sample {v} outside [0, 1]");
        }
    }

    #[test]
    fn test_seeded_rng_debug() {
        let rng = SeededRng::new(42);
        let debug = format!("{rng:?}");
        assert!(debug.contains("SeededRng"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Falsification test: reproducibility holds for any seed.
        #[test]
        fn prop_reproducibility(seed in 0u64..u64::MAX) {
            let mut rng1 = SeededRng::new(seed);
            let mut rng2 = SeededRng::new(seed);

            let seq1: Vec<f64> = (0..50).map(|_| rng1.gen_f64()).collect();
            let seq2: Vec<f64> = (0..50).map(|_| rng2.gen_f64()).collect();

            prop_assert_eq!(seq1, seq2);
        }

        /// Falsification test: beta draws stay in the unit interval.
        #[test]
        fn prop_beta_unit_interval(
            seed in 0u64..u64::MAX,
            alpha in 0.05f64..50.0,
            beta in 0.05f64..50.0,
        ) {
            let mut rng = SeededRng::new(seed);
            for _ in 0..50 {
                let v = rng.gen_beta(alpha, beta);
                prop_assert!((0.0..=1.0).contains(&v), "Value {} not in [0, 1]", v);
            }
        }
    }
}
