//! Test-support utilities
//!
//! Two things live here:
//!
//! - Float-comparison assertion macros — [`assert_close!`](crate::assert_close)
//!   and [`assert_all_close!`](crate::assert_all_close) — the `assert_eq!`
//!   equivalents for values that pick up rounding error on the way through
//!   synthesis and analysis.
//! - [`OracleEngine`], a [`FitEngine`](crate::fit::FitEngine) double that
//!   answers with seeded, jittered ground truth. It lets the whole
//!   simulate → fit → extract → compare pipeline run in tests without the
//!   external fitting library, with error magnitudes that are known by
//!   construction.

use nalgebra::{DMatrix, DVector};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};
use crate::fit::{FitEngine, FitGroup, FitModel, FitSettings};
use crate::sample::GroundTruth;

/// Asserts that two floating-point values are approximately equal.
///
/// Uses a tolerance of `1e-12` unless a third argument overrides it.
///
/// # Example
/// ```rust
/// specsim::assert_close!(0.1 + 0.2, 0.3, 1e-9);
/// ```
#[macro_export]
macro_rules! assert_close {
    ($left:expr, $right:expr) => {
        $crate::assert_close!($left, $right, 1e-12)
    };
    ($left:expr, $right:expr, $eps:expr) => {{
        let (left, right): (f64, f64) = ($left, $right);
        let eps: f64 = $eps;
        if !((left - right).abs() <= eps) {
            panic!(
                "assertion failed: `{left}` and `{right}` differ by more than {eps} \
                 (delta: {})",
                (left - right).abs()
            );
        }
    }};
}

/// Asserts that two slices of floating-point values are approximately equal
/// elementwise. Element-wise [`assert_close!`](crate::assert_close), plus a
/// length check.
#[macro_export]
macro_rules! assert_all_close {
    ($left:expr, $right:expr) => {
        $crate::assert_all_close!($left, $right, 1e-12)
    };
    ($left:expr, $right:expr, $eps:expr) => {{
        let (left, right) = (&$left, &$right);
        assert_eq!(left.len(), right.len(), "slices differ in length");
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            let (l, r): (f64, f64) = (*l, *r);
            if !((l - r).abs() <= $eps) {
                panic!(
                    "assertion failed at index {i}: `{l}` and `{r}` differ by more than {}",
                    $eps
                );
            }
        }
    }};
}

/// A fit-engine double that reports jittered ground truth.
///
/// Construct it with the ground-truth records of the batch it will be asked
/// to fit. Each "fitted" model is the truth plus Gaussian jitter of the
/// configured level, so recovered-vs-truth errors are on the order of the
/// jitter — which makes pipeline-level assertions cheap to write.
pub struct OracleEngine {
    truths: Vec<GroundTruth>,
    jitter: f64,
    rng: SmallRng,
}

impl OracleEngine {
    /// Creates an oracle for one batch.
    ///
    /// # Panics
    /// Panics if `jitter` is negative or not finite.
    #[must_use]
    pub fn new(truths: Vec<GroundTruth>, jitter: f64, seed: Option<u64>) -> Self {
        assert!(jitter >= 0.0 && jitter.is_finite(), "jitter must be finite and non-negative");
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        Self {
            truths,
            jitter,
            rng,
        }
    }

    fn jittered(&mut self, value: f64) -> f64 {
        if self.jitter == 0.0 {
            return value;
        }
        let normal = Normal::new(0.0, self.jitter).expect("jitter validated in new");
        value + normal.sample(&mut self.rng)
    }
}

impl FitEngine for OracleEngine {
    fn fit_group(
        &mut self,
        _freqs: &DVector<f64>,
        spectra: &DMatrix<f64>,
        settings: &FitSettings,
    ) -> Result<FitGroup> {
        if spectra.nrows() != self.truths.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} spectra", self.truths.len()),
                found: format!("{}", spectra.nrows()),
            });
        }

        let truths = self.truths.clone();
        let mut models = Vec::with_capacity(truths.len());
        for truth in &truths {
            let aperiodic_params: Vec<f64> =
                truth.aperiodic.iter().map(|&v| self.jittered(v)).collect();

            // Report at most max_n_peaks, as [cf, height, width] rows; the
            // skew value of asymmetric truths is not part of the fitter's
            // output contract.
            let stride = truth.peak_kind.stride();
            let n_peaks = truth.n_peaks().min(settings.max_n_peaks);
            let mut rows = Vec::with_capacity(n_peaks * 3);
            for peak in truth.periodic.chunks_exact(stride).take(n_peaks) {
                rows.extend([
                    self.jittered(peak[0]),
                    self.jittered(peak[1]),
                    self.jittered(peak[2]),
                ]);
            }
            let peak_params = DMatrix::from_row_iterator(n_peaks, 3, rows);

            let error = self.jittered(0.0).abs();
            models.push(FitModel {
                aperiodic_params,
                peak_params,
                error,
                r_squared: (1.0 - error).clamp(0.0, 1.0),
            });
        }
        Ok(FitGroup(models))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimOptions;
    use crate::sample::{ApMode, PeakKind, Sampler};
    use crate::synth::simulate_group;

    #[test]
    fn zero_jitter_oracle_echoes_ground_truth() {
        let mut sampler = Sampler::new(SimOptions::default(), Some(8)).unwrap();
        let data = simulate_group(&mut sampler, 3, ApMode::NoKnee, PeakKind::Symmetric, Some(1))
            .unwrap();

        let mut oracle = OracleEngine::new(data.params.clone(), 0.0, Some(0));
        let group = oracle
            .fit_group(&data.freqs, &data.powers, &FitSettings::default())
            .unwrap();

        assert_eq!(group.len(), 3);
        for (model, truth) in group.iter().zip(&data.params) {
            assert_all_close!(model.aperiodic_params, truth.aperiodic);
            assert_eq!(model.n_peaks(), truth.n_peaks());
            assert_close!(model.peak_params[(0, 0)], truth.periodic[0]);
        }
    }

    #[test]
    fn oracle_rejects_wrong_batch_size() {
        let mut oracle = OracleEngine::new(vec![], 0.0, Some(0));
        let freqs = DVector::from_vec(vec![1.0, 2.0]);
        let spectra = DMatrix::zeros(2, 2);
        assert!(oracle
            .fit_group(&freqs, &spectra, &FitSettings::default())
            .is_err());
    }

    #[test]
    fn oracle_respects_max_peak_cap() {
        let truth = GroundTruth {
            aperiodic: vec![0.0, 1.0],
            periodic: vec![10.0, 0.2, 1.5, 20.0, 0.3, 1.0, 30.0, 0.4, 2.0],
            peak_kind: PeakKind::Symmetric,
        };
        let mut oracle = OracleEngine::new(vec![truth], 0.0, Some(0));
        let freqs = DVector::from_vec(vec![1.0]);
        let spectra = DMatrix::zeros(1, 1);

        let settings = FitSettings {
            max_n_peaks: 2,
            ..FitSettings::default()
        };
        let group = oracle.fit_group(&freqs, &spectra, &settings).unwrap();
        assert_eq!(group.0[0].n_peaks(), 2);
    }
}
