//! Extraction and comparison of fit results against ground truth
//!
//! Given the fit-result groups produced for each experimental condition, this
//! module pulls out matched arrays of recovered parameters and compares them
//! to the ground truth the spectra were simulated from:
//!
//! - [`get_band_peak`] / [`get_band_peak_group`] — band-restricted peak
//!   extraction, with an all-NaN sentinel when no peak falls in the band;
//! - [`FitData::extract`] — parallel arrays indexed `[condition][spectrum]`
//!   of peak fits, aperiodic fits, error, goodness-of-fit, and peak counts;
//! - [`get_ground_truth`] — the matching truth arrays;
//! - [`calc_errors`] — elementwise absolute or squared error;
//! - [`count_peak_conditions`] — a histogram of recovered peak counts per
//!   condition;
//! - [`harmonic_mapping`] — peak-center ratios relative to each model's
//!   lowest-indexed peak.
//!
//! No NaN handling happens here: NaNs flow through `calc_errors` untouched,
//! and the peak-count arrays are the authoritative record of how many peaks
//! stand behind each extracted slot.

use std::collections::HashMap;
use std::str::FromStr;

use nalgebra::DMatrix;

use crate::error::{Error, Result};
use crate::fit::{FitGroup, FitModel};
use crate::sample::GroundTruth;

/// Sentinel row returned when no recovered peak falls inside the target band.
///
/// Downstream analyses must mask on this (or on the peak-count arrays) before
/// averaging; the sentinel is deliberate, documented behavior rather than an
/// error.
pub const NO_PEAK: [f64; 3] = [f64::NAN; 3];

/// Extracts the single highest recovered peak within a frequency band.
///
/// Among the model's peaks whose center lies in `[band.0, band.1]`
/// (inclusive), returns the row with maximum height — or [`NO_PEAK`] if none
/// qualifies.
#[must_use]
pub fn get_band_peak(model: &FitModel, band: (f64, f64)) -> [f64; 3] {
    let mut best = NO_PEAK;
    for row in model.peak_params.row_iter() {
        let (cf, height) = (row[0], row[1]);
        if cf >= band.0 && cf <= band.1 && (best[1].is_nan() || height > best[1]) {
            best = [row[0], row[1], row[2]];
        }
    }
    best
}

/// Extracts every recovered peak within a frequency band, in fitter order.
#[must_use]
pub fn get_band_peaks(model: &FitModel, band: (f64, f64)) -> Vec<[f64; 3]> {
    model
        .peak_params
        .row_iter()
        .filter(|row| row[0] >= band.0 && row[0] <= band.1)
        .map(|row| [row[0], row[1], row[2]])
        .collect()
}

/// Stacks the highest in-band peak of every model in a group, one row per
/// spectrum. Rows are [`NO_PEAK`] where a model had nothing in the band.
#[must_use]
pub fn get_band_peak_group(group: &FitGroup, band: (f64, f64)) -> DMatrix<f64> {
    DMatrix::from_row_iterator(
        group.len(),
        3,
        group.iter().flat_map(|model| get_band_peak(model, band)),
    )
}

/// Parallel arrays of fit results, indexed `[condition][spectrum]`.
///
/// All five fields line up: row `c` of the matrices (or entry `c` of the
/// vectors) describes condition `c`, in the order the groups were given.
/// `n_peaks` is the authoritative count of recovered peaks behind each slot;
/// analyses use it to mask or bucket the other arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct FitData {
    /// Per condition: the highest in-band peak of each spectrum (rows of
    /// `[cf, height, width]`, NaN rows where nothing was in the band)
    pub peak_fits: Vec<DMatrix<f64>>,
    /// Per condition: recovered aperiodic parameters, one row per spectrum
    pub ap_fits: Vec<DMatrix<f64>>,
    /// Fit error, `[condition][spectrum]`
    pub err_fits: DMatrix<f64>,
    /// Goodness-of-fit, `[condition][spectrum]`
    pub r2_fits: DMatrix<f64>,
    /// Recovered peak count, `[condition][spectrum]`
    pub n_peaks: DMatrix<u32>,
}

impl FitData {
    /// Extracts aligned result arrays from one fit group per condition.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the groups differ in length (the
    /// conditions were fit over different numbers of spectra) or a group's
    /// models disagree on aperiodic arity.
    pub fn extract(groups: &[FitGroup], band: (f64, f64)) -> Result<Self> {
        let n_spectra = groups.first().map_or(0, FitGroup::len);
        if let Some(bad) = groups.iter().find(|g| g.len() != n_spectra) {
            return Err(Error::ShapeMismatch {
                expected: format!("{n_spectra} models per group"),
                found: format!("{}", bad.len()),
            });
        }

        let peak_fits = groups
            .iter()
            .map(|g| get_band_peak_group(g, band))
            .collect();
        let ap_fits = groups
            .iter()
            .map(FitGroup::aperiodic_params)
            .collect::<Result<Vec<_>>>()?;

        let err_fits = DMatrix::from_fn(groups.len(), n_spectra, |c, s| groups[c].0[s].error);
        let r2_fits = DMatrix::from_fn(groups.len(), n_spectra, |c, s| groups[c].0[s].r_squared);
        let n_peaks = DMatrix::from_fn(groups.len(), n_spectra, |c, s| {
            groups[c].0[s].n_peaks() as u32
        });

        Ok(Self {
            peak_fits,
            ap_fits,
            err_fits,
            r2_fits,
            n_peaks,
        })
    }
}

/// Stacks the ground-truth records of each condition into comparison arrays.
///
/// Returns `(peak_truths, ap_truths)`: per condition, one matrix of flattened
/// peak parameters and one of aperiodic parameters, one row per spectrum —
/// the truth-side counterpart of [`FitData`].
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] if records within a condition disagree on
/// parameter arity; rows of a comparison matrix must line up.
pub fn get_ground_truth(
    param_groups: &[Vec<GroundTruth>],
) -> Result<(Vec<DMatrix<f64>>, Vec<DMatrix<f64>>)> {
    let mut peak_truths = Vec::with_capacity(param_groups.len());
    let mut ap_truths = Vec::with_capacity(param_groups.len());

    for group in param_groups {
        let peak_len = group.first().map_or(0, |t| t.periodic.len());
        let ap_len = group.first().map_or(0, |t| t.aperiodic.len());
        for truth in group {
            if truth.periodic.len() != peak_len || truth.aperiodic.len() != ap_len {
                return Err(Error::ShapeMismatch {
                    expected: format!("{peak_len} peak and {ap_len} aperiodic values per record"),
                    found: format!(
                        "{} and {}",
                        truth.periodic.len(),
                        truth.aperiodic.len()
                    ),
                });
            }
        }
        peak_truths.push(DMatrix::from_row_iterator(
            group.len(),
            peak_len,
            group.iter().flat_map(|t| t.periodic.iter().copied()),
        ));
        ap_truths.push(DMatrix::from_row_iterator(
            group.len(),
            ap_len,
            group.iter().flat_map(|t| t.aperiodic.iter().copied()),
        ));
    }
    Ok((peak_truths, ap_truths))
}

/// Elementwise error metric between ground truth and model reconstructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorApproach {
    /// Absolute error, `|truth - model|`
    Abs,
    /// Squared error, `(truth - model)^2`
    Squared,
}

impl FromStr for ErrorApproach {
    type Err = Error;

    /// Parses a metric name. Anything but `abs`, `sqrd`, or `squared` fails —
    /// unsupported names never fall back to a default.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "abs" => Ok(Self::Abs),
            "sqrd" | "squared" => Ok(Self::Squared),
            other => Err(Error::UnknownMetric(other.to_string())),
        }
    }
}

/// Calculates the elementwise error of model reconstructions against ground
/// truth.
///
/// NaNs in either input propagate to the output untouched.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] if the two matrices disagree in shape.
pub fn calc_errors(
    truths: &DMatrix<f64>,
    models: &DMatrix<f64>,
    approach: ErrorApproach,
) -> Result<DMatrix<f64>> {
    if truths.shape() != models.shape() {
        return Err(Error::ShapeMismatch {
            expected: format!("{}x{}", truths.nrows(), truths.ncols()),
            found: format!("{}x{}", models.nrows(), models.ncols()),
        });
    }
    Ok(match approach {
        ErrorApproach::Abs => truths.zip_map(models, |t, m| (t - m).abs()),
        ErrorApproach::Squared => truths.zip_map(models, |t, m| (t - m) * (t - m)),
    })
}

/// Histograms recovered peak counts across conditions.
///
/// Flattens the `[condition][spectrum]` count matrix into a multiset mapping
/// `(condition label, recovered count)` to its number of occurrences — the
/// aggregation behind the peak-count comparison plots.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] if the label count differs from the
/// matrix's condition dimension.
pub fn count_peak_conditions(
    n_peaks: &DMatrix<u32>,
    conditions: &[&str],
) -> Result<HashMap<(String, u32), usize>> {
    if conditions.len() != n_peaks.nrows() {
        return Err(Error::ShapeMismatch {
            expected: format!("{} condition labels", n_peaks.nrows()),
            found: format!("{}", conditions.len()),
        });
    }
    let mut counter = HashMap::new();
    for (row, label) in n_peaks.row_iter().zip(conditions) {
        for &count in &row {
            *counter.entry(((*label).to_string(), count)).or_insert(0) += 1;
        }
    }
    Ok(counter)
}

/// Computes harmonic mappings over a group's recovered peak centers.
///
/// For each model with at least one peak, returns the ratio of every peak
/// center to the first (lowest-indexed) peak's center. Models with zero peaks
/// contribute no entry — no placeholder is emitted.
#[must_use]
pub fn harmonic_mapping(group: &FitGroup) -> Vec<Vec<f64>> {
    group
        .iter()
        .filter_map(|model| {
            let centers = model.peak_centers();
            let first = *centers.first()?;
            Some(centers.iter().map(|cf| cf / first).collect())
        })
        .collect()
}
