//! Descriptive statistics for fit-error distributions
//!
//! Small, NaN-aware helpers backing the analysis and plotting stages. The
//! band-restricted peak extractor emits NaN sentinel rows for spectra with no
//! peak in the target band, so every central-tendency measure here comes in a
//! NaN-masking flavor: NaN entries are dropped, not propagated.
//!
//! # Functions
//! - [`mean`]: arithmetic mean of a dataset.
//! - [`nan_mean`]: arithmetic mean, ignoring NaN entries.
//! - [`nan_median`]: median, ignoring NaN entries.
//! - [`nan_stddev`]: sample standard deviation, ignoring NaN entries.
//! - [`nan_sem`]: standard error of the mean, ignoring NaN entries.
//!
//! # Example
//!
//! ```rust
//! use specsim::statistics::{mean, nan_mean};
//!
//! let clean = [1.0, 2.0, 3.0];
//! assert_eq!(mean(clean.iter().copied()), 2.0);
//!
//! let with_gaps = [1.0, f64::NAN, 3.0];
//! assert_eq!(nan_mean(with_gaps.iter().copied()), 2.0);
//! ```

/// Computes the arithmetic mean of a sequence of values.
///
/// NaN entries propagate; use [`nan_mean`] to mask them instead.
///
/// # Returns
/// The mean, or NaN if the iterator yields no elements.
#[must_use]
pub fn mean(data: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in data {
        sum += value;
        count += 1;
    }
    sum / count as f64
}

/// Computes the arithmetic mean of a sequence, ignoring NaN entries.
///
/// # Returns
/// The mean of the non-NaN entries, or NaN if there are none.
#[must_use]
pub fn nan_mean(data: impl Iterator<Item = f64>) -> f64 {
    mean(data.filter(|v| !v.is_nan()))
}

/// Computes the median of a sequence, ignoring NaN entries.
///
/// Even-length inputs take the midpoint of the two central values.
///
/// # Returns
/// The median of the non-NaN entries, or NaN if there are none.
#[must_use]
pub fn nan_median(data: impl Iterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = data.filter(|v| !v.is_nan()).collect();
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.partial_cmp(b).expect("NaNs filtered above"));

    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

/// Computes the sample standard deviation (`N - 1` denominator), ignoring
/// NaN entries.
///
/// # Returns
/// The standard deviation of the non-NaN entries, or NaN with fewer than two
/// of them.
#[must_use]
pub fn nan_stddev(data: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = data.filter(|v| !v.is_nan()).collect();
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values.iter().copied());
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Computes the standard error of the mean, ignoring NaN entries.
///
/// This is the sample standard deviation divided by `sqrt(N)`, the error-bar
/// half-width used by the error plots.
///
/// # Returns
/// The standard error of the non-NaN entries, or NaN with fewer than two of
/// them.
#[must_use]
pub fn nan_sem(data: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = data.filter(|v| !v.is_nan()).collect();
    let n = values.len();
    nan_stddev(values.into_iter()) / (n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_close;

    #[test]
    fn mean_of_simple_sequence() {
        assert_close!(mean([1.0, 2.0, 3.0].into_iter()), 2.0);
        assert!(mean(std::iter::empty()).is_nan());
    }

    #[test]
    fn nan_mean_masks_nans() {
        assert_close!(nan_mean([1.0, f64::NAN, 3.0].into_iter()), 2.0);
        assert!(nan_mean([f64::NAN].into_iter()).is_nan());
    }

    #[test]
    fn nan_median_handles_both_parities() {
        assert_close!(nan_median([3.0, 1.0, 2.0].into_iter()), 2.0);
        assert_close!(nan_median([4.0, 1.0, 2.0, 3.0].into_iter()), 2.5);
        assert_close!(nan_median([1.0, f64::NAN, 3.0].into_iter()), 2.0);
        assert!(nan_median(std::iter::empty()).is_nan());
    }

    #[test]
    fn stddev_and_sem_relate_by_sqrt_n() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = nan_stddev(data.into_iter());
        let sem = nan_sem(data.into_iter());
        assert_close!(sem, sd / (8.0f64).sqrt(), 1e-12);
    }

    #[test]
    fn spread_free_sequences_have_zero_stddev() {
        assert_close!(nan_stddev([5.0, 5.0, 5.0].into_iter()), 0.0);
        assert!(nan_stddev([5.0].into_iter()).is_nan());
    }
}
