//! Ground-truth parameter sampling for simulated power spectra
//!
//! A [`Sampler`] draws random, constrained parameter sets from the discrete
//! distributions configured in a [`SimOptions`]: an aperiodic background
//! definition (with or without a knee) and zero or more peak definitions.
//!
//! Two constraints shape the draws:
//!
//! - No two peak centers in the same spectrum may lie within the configured
//!   separation window of each other. Colliding candidates are redrawn, with
//!   a bounded retry budget — a distribution too narrow for the window fails
//!   with [`Error::SamplingExhausted`] instead of spinning forever.
//! - Every draw goes through an explicitly seeded generator, so a simulation
//!   run is reproducible from its seed alone.
//!
//! Peak parameters are returned *flattened* — `[cf, height, width, cf,
//! height, width, ...]` — and the synthesizer and ground-truth extractor
//! match on that layout. [`PeakKind`] records the per-peak stride.
//!
//! # Example
//! ```rust
//! use specsim::config::SimOptions;
//! use specsim::sample::{ApMode, Sampler};
//!
//! let mut sampler = Sampler::new(SimOptions::default(), Some(42))?;
//!
//! let aperiodic = sampler.sample_aperiodic(ApMode::NoKnee);
//! assert_eq!(aperiodic.len(), 2); // [offset, exponent]
//!
//! let peaks = sampler.sample_peaks(Some(2))?;
//! assert_eq!(peaks.len(), 6); // two flattened [cf, height, width] triples
//! # Ok::<(), specsim::error::Error>(())
//! ```

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::SimOptions;
use crate::error::{Error, Result};

/// Selects the shape of the sampled aperiodic parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ApMode {
    /// Two parameters: `[offset, exponent]`
    NoKnee,
    /// Three parameters with the knee pinned to the given value:
    /// `[offset, knee, exponent]`
    FixedKnee(f64),
    /// Three parameters with the knee drawn from its configured distribution
    FreeKnee,
}

/// Per-peak parameter layout of a flattened peak vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeakKind {
    /// Symmetric Gaussian peaks: `[cf, height, width]`
    Symmetric,
    /// Skew-normal peaks: `[cf, height, scale, skew]`
    Skewed,
}

impl PeakKind {
    /// Number of values per peak in a flattened peak vector.
    #[must_use]
    pub fn stride(self) -> usize {
        match self {
            Self::Symmetric => 3,
            Self::Skewed => 4,
        }
    }
}

/// The parameters used to generate one spectrum, retained for comparison
/// against fit results.
///
/// Created at generation time and immutable afterwards; the analysis stage
/// only reads from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    /// Aperiodic parameters, `[offset, exponent]` or `[offset, knee, exponent]`
    pub aperiodic: Vec<f64>,
    /// Flattened peak parameters; see [`PeakKind`] for the stride
    pub periodic: Vec<f64>,
    /// Layout of `periodic`
    pub peak_kind: PeakKind,
}

impl GroundTruth {
    /// Number of peaks in this record.
    #[must_use]
    pub fn n_peaks(&self) -> usize {
        self.periodic.len() / self.peak_kind.stride()
    }

    /// Center frequency of each peak.
    #[must_use]
    pub fn peak_centers(&self) -> Vec<f64> {
        self.periodic
            .chunks_exact(self.peak_kind.stride())
            .map(|peak| peak[0])
            .collect()
    }
}

/// Checks whether a candidate peak center falls inside the separation window
/// of any already-accepted center. The window is inclusive on both sides.
#[must_use]
pub fn is_too_close(candidate: f64, accepted: &[f64], window: f64) -> bool {
    accepted
        .iter()
        .any(|center| candidate >= center - window && candidate <= center + window)
}

/// Draws constrained parameter sets for simulated spectra.
///
/// Owns its random generator; construct with an explicit seed for
/// reproducible runs, or `None` to seed from the system generator. Each call
/// produces a fresh independent sample — no state is retained between calls
/// beyond the generator position.
pub struct Sampler {
    opts: SimOptions,
    rng: SmallRng,
}

impl Sampler {
    /// Creates a sampler over validated options.
    ///
    /// # Errors
    /// Fails with a configuration error if any distribution in `opts` is
    /// malformed.
    pub fn new(opts: SimOptions, seed: Option<u64>) -> Result<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            rng: seeded_rng(seed),
        })
    }

    /// The options this sampler draws from.
    #[must_use]
    pub fn options(&self) -> &SimOptions {
        &self.opts
    }

    /// Draws one aperiodic parameter vector.
    ///
    /// The arity follows the mode: 2 for [`ApMode::NoKnee`], 3 for the knee
    /// modes. Every free slot is drawn independently from its configured
    /// distribution.
    pub fn sample_aperiodic(&mut self, mode: ApMode) -> Vec<f64> {
        let offset = self.opts.offset.sample(&mut self.rng);
        match mode {
            ApMode::NoKnee => vec![offset, self.opts.exponent.sample(&mut self.rng)],
            ApMode::FixedKnee(knee) => {
                vec![offset, knee, self.opts.exponent.sample(&mut self.rng)]
            }
            ApMode::FreeKnee => vec![
                offset,
                self.opts.knee.sample(&mut self.rng),
                self.opts.exponent.sample(&mut self.rng),
            ],
        }
    }

    /// Draws one flattened set of symmetric peak definitions.
    ///
    /// If `count` is `None` the peak count is drawn from its configured
    /// distribution first. A count of zero yields an empty vector.
    ///
    /// # Errors
    /// Fails with [`Error::SamplingExhausted`] if a center cannot be placed
    /// within the retry budget.
    pub fn sample_peaks(&mut self, count: Option<usize>) -> Result<Vec<f64>> {
        let n = self.peak_count(count);
        let centers = self.place_centers(n)?;

        let mut peaks = Vec::with_capacity(n * PeakKind::Symmetric.stride());
        for cf in centers {
            let height = self.opts.height.sample(&mut self.rng);
            let width = self.opts.width.sample(&mut self.rng);
            peaks.extend([cf, height, width]);
        }
        Ok(peaks)
    }

    /// Draws one flattened set of skewed peak definitions,
    /// `[cf, height, scale, skew]` per peak.
    ///
    /// # Errors
    /// Fails with [`Error::SamplingExhausted`] if a center cannot be placed
    /// within the retry budget.
    pub fn sample_skew_peaks(&mut self, count: Option<usize>) -> Result<Vec<f64>> {
        let n = self.peak_count(count);
        let centers = self.place_centers(n)?;

        let mut peaks = Vec::with_capacity(n * PeakKind::Skewed.stride());
        for cf in centers {
            let height = self.opts.height.sample(&mut self.rng);
            let scale = self.opts.width.sample(&mut self.rng);
            let skew = self.opts.skew.sample(&mut self.rng);
            peaks.extend([cf, height, scale, skew]);
        }
        Ok(peaks)
    }

    /// Draws ground-truth records for a whole batch of spectra.
    ///
    /// # Errors
    /// Fails if any individual draw exhausts its retry budget.
    pub fn sample_params(
        &mut self,
        n_spectra: usize,
        mode: ApMode,
        kind: PeakKind,
        count: Option<usize>,
    ) -> Result<Vec<GroundTruth>> {
        let mut records = Vec::with_capacity(n_spectra);
        for _ in 0..n_spectra {
            let aperiodic = self.sample_aperiodic(mode);
            let periodic = match kind {
                PeakKind::Symmetric => self.sample_peaks(count)?,
                PeakKind::Skewed => self.sample_skew_peaks(count)?,
            };
            records.push(GroundTruth {
                aperiodic,
                periodic,
                peak_kind: kind,
            });
        }
        log::debug!("sampled ground truth for {n_spectra} spectra");
        Ok(records)
    }

    /// The sampler's generator, shared with the synthesizer so one seed
    /// drives a whole simulation batch.
    pub(crate) fn rng_mut(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    fn peak_count(&mut self, count: Option<usize>) -> usize {
        match count {
            Some(n) => n,
            None => self.opts.n_peaks.sample(&mut self.rng).round() as usize,
        }
    }

    /// Places `n` peak centers, redrawing collisions within the retry budget.
    fn place_centers(&mut self, n: usize) -> Result<Vec<f64>> {
        let mut centers: Vec<f64> = Vec::with_capacity(n);
        for peak in 0..n {
            let mut draws = 0;
            let center = loop {
                let candidate = self.opts.center_freq.sample(&mut self.rng);
                if !is_too_close(candidate, &centers, self.opts.window) {
                    break candidate;
                }
                draws += 1;
                if draws >= self.opts.max_draws {
                    return Err(Error::SamplingExhausted {
                        peak,
                        draws,
                        window: self.opts.window,
                    });
                }
            };
            centers.push(center);
        }
        Ok(centers)
    }
}

/// Builds the generator behind every sampler: explicitly seeded when a seed
/// is given, seeded from the system generator otherwise.
fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => SmallRng::from_rng(&mut rand::rng()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Condition, DiscreteDist};

    fn sampler(seed: u64) -> Sampler {
        Sampler::new(SimOptions::default(), Some(seed)).unwrap()
    }

    #[test]
    fn aperiodic_arity_matches_mode() {
        let mut s = sampler(1);
        assert_eq!(s.sample_aperiodic(ApMode::NoKnee).len(), 2);
        assert_eq!(s.sample_aperiodic(ApMode::FixedKnee(25.0)).len(), 3);
        assert_eq!(s.sample_aperiodic(ApMode::FreeKnee).len(), 3);
    }

    #[test]
    fn fixed_knee_value_is_pinned() {
        let mut s = sampler(2);
        for _ in 0..20 {
            let params = s.sample_aperiodic(ApMode::FixedKnee(150.0));
            assert!((params[1] - 150.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn peak_centers_respect_separation_window() {
        let mut s = sampler(3);
        let window = s.options().window;
        for _ in 0..200 {
            let peaks = s.sample_peaks(None).unwrap();
            let centers: Vec<f64> = peaks.chunks_exact(3).map(|p| p[0]).collect();
            for (i, a) in centers.iter().enumerate() {
                for b in &centers[i + 1..] {
                    assert!(
                        (a - b).abs() > window,
                        "centers {a} and {b} violate the {window} Hz window"
                    );
                }
            }
        }
    }

    #[test]
    fn zero_count_yields_empty_vector() {
        let mut s = sampler(4);
        assert!(s.sample_peaks(Some(0)).unwrap().is_empty());

        // A peak-count distribution pinned to zero behaves the same
        let opts = SimOptions::default().with_condition(&Condition::PeakCount(0));
        let mut s = Sampler::new(opts, Some(4)).unwrap();
        assert!(s.sample_peaks(None).unwrap().is_empty());
    }

    #[test]
    fn singleton_height_always_sampled() {
        let mut opts = SimOptions::default();
        opts.height = DiscreteDist::singleton("height", 0.2);
        let mut s = Sampler::new(opts, Some(5)).unwrap();
        for _ in 0..50 {
            let peaks = s.sample_peaks(Some(1)).unwrap();
            assert!((peaks[1] - 0.2).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn degenerate_center_distribution_exhausts_retries() {
        let mut opts = SimOptions::default();
        opts.center_freq = DiscreteDist::singleton("center_freq", 10.0);
        let mut s = Sampler::new(opts, Some(6)).unwrap();

        // First peak lands at 10 Hz; the second can only ever redraw 10 Hz,
        // which always collides with itself under a 2 Hz window.
        let err = s.sample_peaks(Some(2)).unwrap_err();
        assert!(matches!(
            err,
            Error::SamplingExhausted { peak: 1, draws: 100, .. }
        ));
    }

    #[test]
    fn skewed_peaks_have_stride_four() {
        let mut s = sampler(7);
        let peaks = s.sample_skew_peaks(Some(2)).unwrap();
        assert_eq!(peaks.len(), 8);
    }

    #[test]
    fn same_seed_reproduces_same_draws() {
        let mut a = sampler(99);
        let mut b = sampler(99);
        for _ in 0..10 {
            assert_eq!(
                a.sample_params(3, ApMode::FreeKnee, PeakKind::Symmetric, None)
                    .unwrap(),
                b.sample_params(3, ApMode::FreeKnee, PeakKind::Symmetric, None)
                    .unwrap()
            );
        }

        let mut c = sampler(100);
        let from_a = a.sample_peaks(Some(2)).unwrap();
        let from_c = c.sample_peaks(Some(2)).unwrap();
        assert_ne!(from_a, from_c);
    }

    #[test]
    fn window_check_is_inclusive() {
        assert!(is_too_close(10.0, &[12.0], 2.0));
        assert!(is_too_close(10.0, &[8.0], 2.0));
        assert!(!is_too_close(10.0, &[12.1], 2.0));
        assert!(!is_too_close(10.0, &[], 2.0));
    }

    #[test]
    fn ground_truth_accessors() {
        let truth = GroundTruth {
            aperiodic: vec![0.0, 1.0],
            periodic: vec![10.0, 0.2, 1.5, 20.0, 0.4, 2.0],
            peak_kind: PeakKind::Symmetric,
        };
        assert_eq!(truth.n_peaks(), 2);
        assert_eq!(truth.peak_centers(), vec![10.0, 20.0]);
    }
}
