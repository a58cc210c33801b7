//! # Specsim
//! ## Ground truth you can argue with
//!
//! Spectral parameterization models promise to tell you what's in a power
//! spectrum — a power-law background, a knee, a handful of peaks. The only
//! way to know how much to trust those answers is to fit spectra where the
//! right answer is known in advance, and measure how far off the fits land.
//!
//! This crate is that harness. It simulates power spectra with known
//! periodic and aperiodic components plus noise, hands them to an external
//! fitting library, and compares what comes back against the simulation
//! ground truth:
//!
//! - [`config`] — discrete parameter distributions and per-condition
//!   simulation options, one versioned schema for a whole campaign
//! - [`sample`] — seeded, constraint-respecting parameter sampling
//! - [`synth`] — spectrum synthesis: power-law backgrounds, Gaussian and
//!   skew-normal peaks, white noise, all additive in log-power space
//! - [`fit`] — the typed contract of the external fitting library (the
//!   optimizer itself is never implemented here)
//! - [`analysis`] — band-restricted peak extraction, parallel result
//!   arrays, error metrics, peak-count histograms, harmonic mappings
//! - [`io`] — save a simulated batch, reload it bit-for-bit later
//! - [`plot`] — PNG rendering of the comparison arrays (`plotting` feature)
//! - [`test`] — float assertions and an oracle fit engine for pipelines
//!   that need a fitter but not an optimizer
//!
//! # The short version
//!
//! ```rust
//! use specsim::analysis::{calc_errors, get_ground_truth, ErrorApproach, FitData};
//! use specsim::config::SimOptions;
//! use specsim::fit::{FitEngine, FitSettings};
//! use specsim::sample::{ApMode, PeakKind, Sampler};
//! use specsim::synth::simulate_group;
//! use specsim::test::OracleEngine;
//!
//! // Simulate 10 spectra with one peak each, from a fixed seed
//! let mut sampler = Sampler::new(SimOptions::default(), Some(42))?;
//! let data = simulate_group(&mut sampler, 10, ApMode::NoKnee, PeakKind::Symmetric, Some(1))?;
//!
//! // "Fit" them — swap in a wrapper around a real fitting library here
//! let mut engine = OracleEngine::new(data.params.clone(), 0.01, Some(0));
//! let group = engine.fit_group(&data.freqs, &data.powers, &FitSettings::default())?;
//!
//! // Compare recovered aperiodic parameters to ground truth
//! let fits = FitData::extract(std::slice::from_ref(&group), (3.0, 35.0))?;
//! let (_, ap_truths) = get_ground_truth(std::slice::from_ref(&data.params))?;
//! let errors = calc_errors(&ap_truths[0], &fits.ap_fits[0], ErrorApproach::Abs)?;
//! assert!(errors.amax() < 0.1);
//! # Ok::<(), specsim::error::Error>(())
//! ```
//!
//! # Reproducibility
//!
//! Every random draw in this crate goes through an explicitly seeded
//! generator — there is no process-global random state anywhere. Run the
//! same campaign with the same seed and you get the same spectra, the same
//! ground truth, and the same artifacts on disk.
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)] // Counts and indices become f64 plot coordinates
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)] //       Peak counts are small non-negative draws
#![allow(clippy::missing_panics_doc)] //   Panics only on invariants validated at construction

pub mod test;

#[cfg(feature = "plotting")]
pub mod plot;

pub mod analysis;
pub mod config;
pub mod error;
pub mod fit;
pub mod io;
pub mod sample;
pub mod statistics;
pub mod synth;

pub use nalgebra;
