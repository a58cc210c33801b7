//! Typed interface to the external fitting library
//!
//! The model-fitting optimizer is an external collaborator and is never
//! reimplemented here. This module defines the contract this crate consumes:
//! the configuration handed to the fitter ([`FitSettings`]), the typed result
//! for one spectrum ([`FitModel`]) and one condition ([`FitGroup`]), and the
//! [`FitEngine`] trait any backend plugs in through.
//!
//! Fit results are read-only from this crate's point of view: the analysis
//! stage extracts arrays out of them and never mutates them.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Aperiodic fitting mode requested from the fitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApFitMode {
    /// Fit `[offset, exponent]`
    Fixed,
    /// Fit `[offset, knee, exponent]`
    Knee,
}

/// Configuration passed to the external fitter for a whole group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSettings {
    /// Bounds on fitted peak widths, `(low, high)`
    pub peak_width_limits: (f64, f64),
    /// Maximum number of peaks the fitter may report per spectrum
    pub max_n_peaks: usize,
    /// Minimum absolute height for a peak to be kept
    pub min_peak_height: f64,
    /// Relative detection threshold, in units of the flattened spectrum's
    /// standard deviation
    pub peak_threshold: f64,
    /// Aperiodic parameterization to fit
    pub aperiodic_mode: ApFitMode,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            peak_width_limits: (1.0, 8.0),
            max_n_peaks: 6,
            min_peak_height: 0.1,
            peak_threshold: 2.0,
            aperiodic_mode: ApFitMode::Fixed,
        }
    }
}

/// The fitted model for one spectrum, as reported by the external fitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitModel {
    /// Recovered aperiodic parameters; arity follows [`ApFitMode`]
    pub aperiodic_params: Vec<f64>,
    /// Recovered peak parameters, one `[cf, height, width]` row per peak
    pub peak_params: DMatrix<f64>,
    /// The fitter's error metric for this spectrum
    pub error: f64,
    /// The fitter's goodness-of-fit for this spectrum (higher is better)
    pub r_squared: f64,
}

impl FitModel {
    /// Number of peaks the fitter recovered.
    #[must_use]
    pub fn n_peaks(&self) -> usize {
        self.peak_params.nrows()
    }

    /// Center frequency of each recovered peak.
    #[must_use]
    pub fn peak_centers(&self) -> Vec<f64> {
        self.peak_params.column(0).iter().copied().collect()
    }
}

/// An ordered collection of fitted models, one per spectrum of a condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitGroup(pub Vec<FitModel>);

impl FitGroup {
    /// Number of fitted spectra in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the group holds no models.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the fitted models in spectrum order.
    pub fn iter(&self) -> std::slice::Iter<'_, FitModel> {
        self.0.iter()
    }

    /// Stacks the recovered aperiodic parameters, one row per spectrum.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the models disagree on arity —
    /// a group is fit with one aperiodic mode, so mixed arities mean the
    /// collection is misaligned.
    pub fn aperiodic_params(&self) -> Result<DMatrix<f64>> {
        let arity = self.0.first().map_or(0, |m| m.aperiodic_params.len());
        for model in &self.0 {
            if model.aperiodic_params.len() != arity {
                return Err(Error::ShapeMismatch {
                    expected: format!("{arity} aperiodic parameters per model"),
                    found: format!("{}", model.aperiodic_params.len()),
                });
            }
        }
        Ok(DMatrix::from_row_iterator(
            self.len(),
            arity,
            self.iter().flat_map(|m| m.aperiodic_params.iter().copied()),
        ))
    }

    /// The error metric of each model, in spectrum order.
    #[must_use]
    pub fn errors(&self) -> DVector<f64> {
        DVector::from_iterator(self.len(), self.iter().map(|m| m.error))
    }

    /// The goodness-of-fit of each model, in spectrum order.
    #[must_use]
    pub fn r_squareds(&self) -> DVector<f64> {
        DVector::from_iterator(self.len(), self.iter().map(|m| m.r_squared))
    }

    /// The recovered peak count of each model, in spectrum order.
    #[must_use]
    pub fn n_peaks(&self) -> Vec<usize> {
        self.iter().map(FitModel::n_peaks).collect()
    }
}

impl<'a> IntoIterator for &'a FitGroup {
    type Item = &'a FitModel;
    type IntoIter = std::slice::Iter<'a, FitModel>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The black-box contract of the external fitting library.
///
/// An engine takes a frequency axis, a matrix of power spectra (one row per
/// spectrum), and the fit configuration, and reports one [`FitModel`] per
/// spectrum. Implementations wrap whichever optimizer backs the validation
/// run; [`crate::test::OracleEngine`] is a test double that answers with
/// jittered ground truth.
pub trait FitEngine {
    /// Fits every spectrum in the matrix.
    ///
    /// # Errors
    /// Implementations fail fast on malformed input; they must not return a
    /// group whose length differs from the number of spectra.
    fn fit_group(
        &mut self,
        freqs: &DVector<f64>,
        spectra: &DMatrix<f64>,
        settings: &FitSettings,
    ) -> Result<FitGroup>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(ap: Vec<f64>, peaks: &[[f64; 3]]) -> FitModel {
        FitModel {
            aperiodic_params: ap,
            peak_params: DMatrix::from_fn(peaks.len(), 3, |r, c| peaks[r][c]),
            error: 0.05,
            r_squared: 0.98,
        }
    }

    #[test]
    fn group_accessors_line_up() {
        let group = FitGroup(vec![
            model(vec![0.0, 1.0], &[[10.0, 0.4, 1.5]]),
            model(vec![0.1, 1.2], &[]),
        ]);

        assert_eq!(group.len(), 2);
        assert_eq!(group.n_peaks(), vec![1, 0]);
        assert_eq!(group.errors().len(), 2);
        assert_eq!(group.r_squareds()[1], 0.98);

        let ap = group.aperiodic_params().unwrap();
        assert_eq!(ap.nrows(), 2);
        assert_eq!(ap[(1, 1)], 1.2);
    }

    #[test]
    fn mixed_aperiodic_arity_is_a_shape_mismatch() {
        let group = FitGroup(vec![
            model(vec![0.0, 1.0], &[]),
            model(vec![0.0, 10.0, 1.0], &[]),
        ]);
        assert!(group.aperiodic_params().is_err());
    }

    #[test]
    fn peak_centers_read_first_column() {
        let m = model(vec![0.0, 1.0], &[[10.0, 0.4, 1.5], [22.0, 0.2, 2.0]]);
        assert_eq!(m.peak_centers(), vec![10.0, 22.0]);
        assert_eq!(m.n_peaks(), 2);
    }
}
