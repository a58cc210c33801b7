//! Synthetic power-spectrum generation
//!
//! A spectrum is built from three components, each defined over a shared
//! frequency axis and expressed in log10 power units:
//!
//! - an aperiodic background — `offset - exponent·log10(f)`, or
//!   `offset - log10(knee + f^exponent)` when a knee is present;
//! - a periodic component — a sum of Gaussian peaks, or skew-normal peaks
//!   for asymmetric simulations;
//! - a noise component — white Gaussian noise of configured level.
//!
//! The components are additive in log-power space; the final spectrum is
//! `10^(aperiodic + periodic + noise)` elementwise, i.e. linear power.
//!
//! [`gen_power_vals`] is generic over the three component generators, so any
//! of them can be swapped for a custom strategy; the free functions in this
//! module are the defaults. [`simulate_group`] drives a whole batch: sample
//! ground truth, synthesize every spectrum, and return the bundled
//! [`SimData`] artifact.
//!
//! # Example
//! ```rust
//! use specsim::synth::{freq_axis, gen_aperiodic, gen_periodic};
//!
//! let freqs = freq_axis((2.0, 40.0), 0.25)?;
//!
//! // A 1/f background with a 10 Hz peak on top
//! let background = gen_aperiodic(&freqs, &[0.0, 1.0])?;
//! let peak = gen_periodic(&freqs, &[10.0, 0.4, 1.5])?;
//! assert_eq!(background.len(), peak.len());
//! # Ok::<(), specsim::error::Error>(())
//! ```

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};
use crate::io::SimData;
use crate::sample::{ApMode, PeakKind, Sampler};

/// Builds an evenly spaced, inclusive frequency axis.
///
/// The axis is shared across all spectra in a simulation batch.
///
/// # Errors
/// Returns [`Error::EmptyFreqAxis`] if the range is inverted or the
/// resolution is not a positive finite value.
pub fn freq_axis(range: (f64, f64), res: f64) -> Result<DVector<f64>> {
    let (lo, hi) = range;
    if lo >= hi || res <= 0.0 || !res.is_finite() {
        return Err(Error::EmptyFreqAxis(lo, hi, res));
    }
    let n = ((hi - lo) / res).floor() as usize + 1;
    Ok(DVector::from_iterator(
        n,
        (0..n).map(|i| lo + i as f64 * res),
    ))
}

/// Computes the aperiodic component over the frequency axis, in log10 power.
///
/// Two parameterizations exist, selected by arity:
/// - `[offset, exponent]` — a single power law;
/// - `[offset, knee, exponent]` — two power-law regimes joined at the knee.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] for any other arity.
pub fn gen_aperiodic(freqs: &DVector<f64>, params: &[f64]) -> Result<DVector<f64>> {
    match *params {
        [offset, exponent] => Ok(freqs.map(|f| offset - exponent * f.log10())),
        [offset, knee, exponent] => Ok(freqs.map(|f| offset - (knee + f.powf(exponent)).log10())),
        _ => Err(Error::ShapeMismatch {
            expected: "2 or 3 aperiodic parameters".into(),
            found: format!("{}", params.len()),
        }),
    }
}

/// Computes the periodic component as a sum of symmetric Gaussian peaks.
///
/// `params` is a flattened sequence of `[cf, height, width]` triples; an
/// empty sequence yields a flat zero component. Peaks superpose linearly in
/// log-power space, with no interaction between them.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] if the parameter count is not a multiple
/// of three.
pub fn gen_periodic(freqs: &DVector<f64>, params: &[f64]) -> Result<DVector<f64>> {
    if params.len() % 3 != 0 {
        return Err(Error::ShapeMismatch {
            expected: "flattened [cf, height, width] triples".into(),
            found: format!("{} values", params.len()),
        });
    }
    let mut ys = DVector::zeros(freqs.len());
    for peak in params.chunks_exact(3) {
        let (cf, height, width) = (peak[0], peak[1], peak[2]);
        ys += freqs.map(|f| height * (-(f - cf) * (f - cf) / (2.0 * width * width)).exp());
    }
    Ok(ys)
}

/// Computes one skew-normal peak over the frequency axis.
///
/// The skew-normal density parameterized by `(skew, cen, scale)` is evaluated
/// over the axis, then rescaled so its largest magnitude equals `height`.
/// At `skew == 0` this reduces to a symmetric peak of the same center and
/// height (the scale corresponds to the Gaussian width parameter).
///
/// Parameters are ordered `[cen, height, scale, skew]` to match the layout
/// of symmetric peak parameters, with the skew appended.
#[must_use]
pub fn gen_skew_peak(freqs: &DVector<f64>, cen: f64, height: f64, scale: f64, skew: f64) -> DVector<f64> {
    let ys = freqs.map(|f| skewnorm_pdf(f, skew, cen, scale));

    // A peak far off-axis can underflow to all zeros; leave it flat rather
    // than dividing by zero.
    let max = ys.amax();
    if max > 0.0 {
        ys.map(|y| y / max * height)
    } else {
        ys
    }
}

/// Computes the periodic component as a sum of skew-normal peaks.
///
/// `params` is a flattened sequence of `[cen, height, scale, skew]`
/// quadruples. Each peak is computed independently and summed — linear
/// superposition in log-power space, as for symmetric peaks.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] if the parameter count is not a multiple
/// of four.
pub fn gen_skew_peaks(freqs: &DVector<f64>, params: &[f64]) -> Result<DVector<f64>> {
    if params.len() % 4 != 0 {
        return Err(Error::ShapeMismatch {
            expected: "flattened [cen, height, scale, skew] quadruples".into(),
            found: format!("{} values", params.len()),
        });
    }
    let mut ys = DVector::zeros(freqs.len());
    for peak in params.chunks_exact(4) {
        ys += gen_skew_peak(freqs, peak[0], peak[1], peak[2], peak[3]);
    }
    Ok(ys)
}

/// Draws a white Gaussian noise component of level `nlv` over the axis.
///
/// A level of zero yields an exactly flat component.
#[must_use]
pub fn gen_noise<R: Rng>(freqs: &DVector<f64>, nlv: f64, rng: &mut R) -> DVector<f64> {
    if nlv == 0.0 {
        return DVector::zeros(freqs.len());
    }
    let normal = Normal::new(0.0, nlv).expect("noise level validated as finite non-negative");
    DVector::from_iterator(freqs.len(), (0..freqs.len()).map(|_| normal.sample(rng)))
}

/// Combines the three components into a power spectrum.
///
/// Each generator receives the frequency axis and must return a vector of
/// matching length in log10 power units; the result is
/// `10^(aperiodic + periodic + noise)` elementwise. Pass the defaults from
/// this module, or any custom strategy with the same contract.
///
/// # Errors
/// Propagates generator failures, and returns [`Error::ShapeMismatch`] if a
/// component's length disagrees with the axis.
pub fn gen_power_vals<A, P, N>(
    freqs: &DVector<f64>,
    ap_func: A,
    pe_func: P,
    noise_func: N,
) -> Result<DVector<f64>>
where
    A: FnOnce(&DVector<f64>) -> Result<DVector<f64>>,
    P: FnOnce(&DVector<f64>) -> Result<DVector<f64>>,
    N: FnOnce(&DVector<f64>) -> Result<DVector<f64>>,
{
    let aperiodic = checked(freqs, ap_func(freqs)?, "aperiodic")?;
    let periodic = checked(freqs, pe_func(freqs)?, "periodic")?;
    let noise = checked(freqs, noise_func(freqs)?, "noise")?;

    Ok((aperiodic + periodic + noise).map(|v| 10f64.powf(v)))
}

/// Synthesizes one spectrum from a ground-truth record with the default
/// component generators.
///
/// # Errors
/// Fails if the record's parameter layout is inconsistent with its peak kind.
pub fn gen_power_spectrum<R: Rng>(
    freqs: &DVector<f64>,
    truth: &crate::sample::GroundTruth,
    nlv: f64,
    rng: &mut R,
) -> Result<DVector<f64>> {
    gen_power_vals(
        freqs,
        |fs| gen_aperiodic(fs, &truth.aperiodic),
        |fs| match truth.peak_kind {
            PeakKind::Symmetric => gen_periodic(fs, &truth.periodic),
            PeakKind::Skewed => gen_skew_peaks(fs, &truth.periodic),
        },
        |fs| Ok(gen_noise(fs, nlv, rng)),
    )
}

/// Samples and synthesizes a whole condition: `n_spectra` ground-truth
/// records plus the matrix of spectra generated from them.
///
/// The returned [`SimData`] pairs the axis, the spectra (one row per
/// spectrum), and the per-spectrum ground truth, ready to persist or to hand
/// to a fitting engine.
///
/// # Errors
/// Fails on sampling exhaustion or a malformed axis definition.
pub fn simulate_group(
    sampler: &mut Sampler,
    n_spectra: usize,
    mode: ApMode,
    kind: PeakKind,
    count: Option<usize>,
) -> Result<SimData> {
    let opts = sampler.options().clone();
    let freqs = freq_axis(opts.freq_range, opts.freq_res)?;
    let params = sampler.sample_params(n_spectra, mode, kind, count)?;

    let mut values = Vec::with_capacity(n_spectra * freqs.len());
    for truth in &params {
        let spectrum = gen_power_spectrum(&freqs, truth, opts.nlv, sampler.rng_mut())?;
        values.extend(spectrum.iter().copied());
    }
    let powers = DMatrix::from_row_iterator(n_spectra, freqs.len(), values);

    log::debug!(
        "simulated {n_spectra} spectra over {} bins at nlv {}",
        freqs.len(),
        opts.nlv
    );
    Ok(SimData {
        freqs,
        powers,
        params,
    })
}

/// Skew-normal probability density with shape `skew`, location `loc`, and
/// scale `scale`.
fn skewnorm_pdf(x: f64, skew: f64, loc: f64, scale: f64) -> f64 {
    let z = (x - loc) / scale;
    let norm_pdf = (-z * z / 2.0).exp() / (2.0 * std::f64::consts::PI).sqrt();
    let norm_cdf = 0.5 * (1.0 + libm::erf(skew * z / std::f64::consts::SQRT_2));
    2.0 / scale * norm_pdf * norm_cdf
}

fn checked(freqs: &DVector<f64>, component: DVector<f64>, what: &str) -> Result<DVector<f64>> {
    if component.len() == freqs.len() {
        Ok(component)
    } else {
        Err(Error::ShapeMismatch {
            expected: format!("{what} component of length {}", freqs.len()),
            found: format!("length {}", component.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_close;
    use crate::sample::GroundTruth;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn axis() -> DVector<f64> {
        freq_axis((2.0, 40.0), 0.25).unwrap()
    }

    #[test]
    fn axis_is_inclusive_and_evenly_spaced() {
        let freqs = axis();
        assert_eq!(freqs.len(), 153);
        assert_close!(freqs[0], 2.0);
        assert_close!(freqs[152], 40.0);
        assert_close!(freqs[1] - freqs[0], 0.25);
    }

    #[test]
    fn axis_rejects_bad_definitions() {
        assert!(freq_axis((40.0, 2.0), 0.25).is_err());
        assert!(freq_axis((2.0, 40.0), 0.0).is_err());
    }

    #[test]
    fn aperiodic_follows_power_law() {
        let freqs = axis();
        let ap = gen_aperiodic(&freqs, &[0.0, 1.0]).unwrap();
        // offset 0, exponent 1: value at 10 Hz is -log10(10) = -1
        let i = freqs.iter().position(|&f| (f - 10.0).abs() < 1e-9).unwrap();
        assert_close!(ap[i], -1.0);
    }

    #[test]
    fn aperiodic_knee_form() {
        let freqs = axis();
        let ap = gen_aperiodic(&freqs, &[1.0, 100.0, 2.0]).unwrap();
        let i = freqs.iter().position(|&f| (f - 10.0).abs() < 1e-9).unwrap();
        assert_close!(ap[i], 1.0 - (100.0 + 100.0f64).log10());
    }

    #[test]
    fn aperiodic_rejects_wrong_arity() {
        let err = gen_aperiodic(&axis(), &[1.0]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn gaussian_peak_tops_out_at_height() {
        let freqs = axis();
        let pe = gen_periodic(&freqs, &[10.0, 0.4, 1.5]).unwrap();
        let i = freqs.iter().position(|&f| (f - 10.0).abs() < 1e-9).unwrap();
        assert_close!(pe[i], 0.4);
        assert_close!(pe.amax(), 0.4);
    }

    #[test]
    fn empty_peak_params_yield_flat_component() {
        let pe = gen_periodic(&axis(), &[]).unwrap();
        assert_close!(pe.amax(), 0.0);
    }

    #[test]
    fn zero_skew_reduces_to_symmetric_peak() {
        let freqs = axis();
        let skewed = gen_skew_peak(&freqs, 10.0, 0.4, 1.5, 0.0);

        assert_close!(skewed.amax(), 0.4);
        let peak_bin = skewed.iter().position(|&y| (y - 0.4).abs() < 1e-12).unwrap();
        assert_close!(freqs[peak_bin], 10.0);

        // And it matches the Gaussian generator bin for bin
        let symmetric = gen_periodic(&freqs, &[10.0, 0.4, 1.5]).unwrap();
        for i in 0..freqs.len() {
            assert_close!(skewed[i], symmetric[i], 1e-9);
        }
    }

    #[test]
    fn skewed_peak_leans_away_from_center() {
        let freqs = axis();
        let ys = gen_skew_peak(&freqs, 10.0, 0.4, 2.0, 5.0);
        assert_close!(ys.amax(), 0.4);

        // Positive skew pushes mass above the location parameter
        let peak_bin = ys.iter().position(|&y| (y - ys.amax()).abs() < 1e-12).unwrap();
        assert!(freqs[peak_bin] > 10.0);
    }

    #[test]
    fn skew_peaks_superpose_independently() {
        let freqs = axis();
        let both = gen_skew_peaks(&freqs, &[10.0, 0.3, 1.5, 2.0, 30.0, 0.2, 1.0, -2.0]).unwrap();
        let first = gen_skew_peak(&freqs, 10.0, 0.3, 1.5, 2.0);
        let second = gen_skew_peak(&freqs, 30.0, 0.2, 1.0, -2.0);
        for i in 0..freqs.len() {
            assert_close!(both[i], first[i] + second[i], 1e-12);
        }
    }

    #[test]
    fn skew_peaks_reject_wrong_arity() {
        let err = gen_skew_peaks(&axis(), &[10.0, 0.3, 1.5]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn power_vals_exponentiate_component_sum() {
        let freqs = axis();
        let powers = gen_power_vals(
            &freqs,
            |fs| gen_aperiodic(fs, &[1.0, 1.0]),
            |fs| gen_periodic(fs, &[10.0, 0.4, 1.5]),
            |fs| Ok(DVector::zeros(fs.len())),
        )
        .unwrap();

        let i = freqs.iter().position(|&f| (f - 10.0).abs() < 1e-9).unwrap();
        let expected = 10f64.powf(1.0 - 1.0 + 0.4);
        assert_close!(powers[i], expected, 1e-9);
    }

    #[test]
    fn power_vals_reject_mismatched_noise() {
        let freqs = axis();
        let err = gen_power_vals(
            &freqs,
            |fs| gen_aperiodic(fs, &[0.0, 1.0]),
            |fs| gen_periodic(fs, &[]),
            |_| Ok(DVector::zeros(3)),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn zero_noise_level_is_exactly_flat() {
        let mut rng = SmallRng::seed_from_u64(1);
        let noise = gen_noise(&axis(), 0.0, &mut rng);
        assert_close!(noise.amax(), 0.0);
    }

    #[test]
    fn seeded_noise_is_reproducible() {
        let freqs = axis();
        let mut a = SmallRng::seed_from_u64(11);
        let mut b = SmallRng::seed_from_u64(11);
        assert_eq!(gen_noise(&freqs, 0.025, &mut a), gen_noise(&freqs, 0.025, &mut b));
    }

    #[test]
    fn spectrum_from_ground_truth_is_positive() {
        let freqs = axis();
        let truth = GroundTruth {
            aperiodic: vec![0.0, 1.0],
            periodic: vec![10.0, 0.4, 1.5],
            peak_kind: PeakKind::Symmetric,
        };
        let mut rng = SmallRng::seed_from_u64(3);
        let powers = gen_power_spectrum(&freqs, &truth, 0.01, &mut rng).unwrap();
        assert!(powers.iter().all(|&p| p > 0.0));
    }

    #[test]
    fn simulate_group_shapes_line_up() {
        use crate::config::SimOptions;

        let mut sampler = Sampler::new(SimOptions::default(), Some(21)).unwrap();
        let data = simulate_group(&mut sampler, 5, ApMode::NoKnee, PeakKind::Symmetric, None).unwrap();

        assert_eq!(data.powers.nrows(), 5);
        assert_eq!(data.powers.ncols(), data.freqs.len());
        assert_eq!(data.params.len(), 5);
        for truth in &data.params {
            assert_eq!(truth.aperiodic.len(), 2);
        }
    }
}
