//! Configuration surface for spectrum simulations
//!
//! Every sampled quantity in a simulation — peak count, center frequency,
//! peak height and width, aperiodic offset, knee, and exponent — is drawn from
//! a [`DiscreteDist`]: a paired list of options and probabilities.
//!
//! A [`SimOptions`] bundles one distribution per quantity together with the
//! frequency axis definition and the peak-separation window. Experimental
//! conditions that vary a single setting (a noise level, a knee value, a skew)
//! are expressed as [`Condition`] values applied on top of a base
//! [`SimOptions`], so one schema covers a whole simulation campaign.
//!
//! # Example
//!
//! ```rust
//! use specsim::config::{Condition, SimOptions};
//!
//! let base = SimOptions::default();
//! let conditions = [0.0, 0.005, 0.01, 0.025, 0.05];
//! let per_condition: Vec<SimOptions> = conditions
//!     .iter()
//!     .map(|&nlv| base.with_condition(&Condition::NoiseLevel(nlv)))
//!     .collect();
//! # assert_eq!(per_condition.len(), 5);
//! ```

use std::fmt;
use std::str::FromStr;

use rand::distr::{weighted::WeightedIndex, Distribution};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Version tag for serialized [`SimOptions`] documents.
pub const SCHEMA_VERSION: u32 = 1;

/// How close two probabilities-sums may be to 1 and still validate.
const PROB_SUM_TOLERANCE: f64 = 1e-6;

/// A discrete probability distribution over a list of numeric options.
///
/// Each slot of a simulated parameter set is drawn independently from one of
/// these. Construction validates the definition: the option and probability
/// lists must be non-empty and equal in length, and the probabilities must be
/// non-negative and sum to 1.
///
/// # Example
/// ```rust
/// use specsim::config::DiscreteDist;
///
/// let heights = DiscreteDist::new(
///     "height",
///     vec![0.15, 0.20, 0.25, 0.4],
///     vec![0.25, 0.25, 0.25, 0.25],
/// )?;
/// println!("{heights}");
/// # Ok::<(), specsim::error::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteDist {
    name: String,
    options: Vec<f64>,
    probs: Vec<f64>,
}

impl DiscreteDist {
    /// Creates a distribution from explicit options and probabilities.
    ///
    /// # Errors
    /// Returns [`Error::BadDistribution`] if the definition is malformed.
    pub fn new(name: impl Into<String>, options: Vec<f64>, probs: Vec<f64>) -> Result<Self> {
        let dist = Self {
            name: name.into(),
            options,
            probs,
        };
        dist.validate()?;
        Ok(dist)
    }

    /// Creates a distribution with equal probability for every option.
    ///
    /// # Errors
    /// Returns [`Error::BadDistribution`] if `options` is empty.
    pub fn uniform(name: impl Into<String>, options: Vec<f64>) -> Result<Self> {
        let n = options.len();
        let probs = vec![1.0 / n.max(1) as f64; n];
        Self::new(name, options, probs)
    }

    /// Creates a degenerate distribution that always yields `value`.
    #[must_use]
    pub fn singleton(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            options: vec![value],
            probs: vec![1.0],
        }
    }

    /// Name of the parameter this distribution belongs to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The values this distribution can yield.
    #[must_use]
    pub fn options(&self) -> &[f64] {
        &self.options
    }

    /// The probability paired with each option.
    #[must_use]
    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    /// Checks the distribution definition.
    ///
    /// Deserialized definitions bypass [`DiscreteDist::new`], so anything that
    /// accepts external configuration should call this before sampling.
    ///
    /// # Errors
    /// Returns [`Error::BadDistribution`] naming the parameter and the problem.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| Error::BadDistribution {
            name: self.name.clone(),
            reason,
        };

        if self.options.is_empty() {
            return Err(fail("option list is empty".into()));
        }
        if self.options.len() != self.probs.len() {
            return Err(fail(format!(
                "{} options but {} probabilities",
                self.options.len(),
                self.probs.len()
            )));
        }
        if let Some(p) = self.probs.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(fail(format!("probability {p} is not a finite non-negative value")));
        }
        let total: f64 = self.probs.iter().sum();
        if (total - 1.0).abs() > PROB_SUM_TOLERANCE {
            return Err(fail(format!("probabilities sum to {total}, not 1")));
        }
        Ok(())
    }

    /// Draws one option according to the configured probabilities.
    ///
    /// # Panics
    /// Panics if the distribution is invalid; validation at construction (or
    /// via [`DiscreteDist::validate`] for deserialized values) rules this out.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let index = WeightedIndex::new(&self.probs)
            .expect("distribution validated at construction")
            .sample(rng);
        self.options[index]
    }
}

impl fmt::Display for DiscreteDist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parameter definition for {}", self.name)?;
        writeln!(f, "\tValue \t Probability")?;
        for (opt, prob) in self.options.iter().zip(&self.probs) {
            writeln!(f, "\t{opt} \t {:2.1}%", prob * 100.0)?;
        }
        Ok(())
    }
}

/// The named axes a simulation campaign can vary across conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionAxis {
    /// Standard deviation of the log-power noise component
    NoiseLevel,
    /// Number of peaks per spectrum
    PeakCount,
    /// Aperiodic knee parameter
    KneeValue,
    /// Signed skew applied to every peak
    Skew,
    /// Two-sided skew magnitude (peaks lean either way with equal probability)
    Asymmetry,
}

impl ConditionAxis {
    /// Human-readable axis label, used by the plotting sink.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NoiseLevel => "Noise Levels",
            Self::PeakCount => "Number of Peaks",
            Self::KneeValue => "Knee Values",
            Self::Skew => "Skew Values",
            Self::Asymmetry => "Peak Asymmetry",
        }
    }
}

impl FromStr for ConditionAxis {
    type Err = Error;

    /// Parses an axis selector. Unsupported names fail rather than default.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nlvs" | "noise_level" => Ok(Self::NoiseLevel),
            "n_peaks" | "peak_count" => Ok(Self::PeakCount),
            "knees" | "knee_value" => Ok(Self::KneeValue),
            "skews" | "skew" => Ok(Self::Skew),
            "asymmetry" => Ok(Self::Asymmetry),
            other => Err(Error::UnknownAxis(other.to_string())),
        }
    }
}

/// One experimental condition: a single varied setting on top of a base
/// [`SimOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Set the noise level to this value
    NoiseLevel(f64),
    /// Pin the peak count to this value
    PeakCount(usize),
    /// Pin the knee option to this value
    KneeValue(f64),
    /// Pin every peak's skew to this signed value
    Skew(f64),
    /// Draw each peak's skew as `±value` with equal probability
    Asymmetry(f64),
}

impl Condition {
    /// The axis this condition varies.
    #[must_use]
    pub fn axis(&self) -> ConditionAxis {
        match self {
            Self::NoiseLevel(_) => ConditionAxis::NoiseLevel,
            Self::PeakCount(_) => ConditionAxis::PeakCount,
            Self::KneeValue(_) => ConditionAxis::KneeValue,
            Self::Skew(_) => ConditionAxis::Skew,
            Self::Asymmetry(_) => ConditionAxis::Asymmetry,
        }
    }

    /// Short label for this condition, e.g. `nlv=0.01`, used to tag result
    /// groups in counters and plots.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::NoiseLevel(v) => format!("nlv={v}"),
            Self::PeakCount(v) => format!("n_peaks={v}"),
            Self::KneeValue(v) => format!("knee={v}"),
            Self::Skew(v) => format!("skew={v}"),
            Self::Asymmetry(v) => format!("asym={v}"),
        }
    }
}

/// Full definition of how one batch of spectra is simulated.
///
/// Covers the frequency axis, the noise level, the peak-separation window,
/// the retry budget for peak placement, and one [`DiscreteDist`] per sampled
/// quantity. The defaults reproduce a plausible EEG-like setup: a 2–40 Hz
/// axis at 0.25 Hz resolution, up to two peaks per spectrum, and a flat
/// aperiodic offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimOptions {
    /// Schema version of this document; see [`SCHEMA_VERSION`]
    pub schema_version: u32,
    /// Frequency range of the axis, `[low, high]` inclusive
    pub freq_range: (f64, f64),
    /// Frequency resolution of the axis
    pub freq_res: f64,
    /// Standard deviation of the white noise component, in log10 power units
    pub nlv: f64,
    /// Window around an accepted peak center within which new centers are rejected
    pub window: f64,
    /// Candidate draws allowed per peak before sampling fails
    pub max_draws: usize,
    /// Distribution of peak counts per spectrum
    pub n_peaks: DiscreteDist,
    /// Distribution of peak center frequencies
    pub center_freq: DiscreteDist,
    /// Distribution of peak heights
    pub height: DiscreteDist,
    /// Distribution of peak widths (or scales, for skewed peaks)
    pub width: DiscreteDist,
    /// Distribution of aperiodic offsets
    pub offset: DiscreteDist,
    /// Distribution of aperiodic knee values
    pub knee: DiscreteDist,
    /// Distribution of aperiodic exponents
    pub exponent: DiscreteDist,
    /// Distribution of peak skew values, for asymmetric conditions
    pub skew: DiscreteDist,
}

impl Default for SimOptions {
    fn default() -> Self {
        let third = 1.0 / 3.0;
        let centers = (4..=32).map(f64::from).collect::<Vec<_>>();
        Self {
            schema_version: SCHEMA_VERSION,
            freq_range: (2.0, 40.0),
            freq_res: 0.25,
            nlv: 0.005,
            window: 2.0,
            max_draws: 100,
            n_peaks: DiscreteDist {
                name: "n_peaks".into(),
                options: vec![0.0, 1.0, 2.0],
                probs: vec![third, third, third],
            },
            center_freq: DiscreteDist {
                name: "center_freq".into(),
                probs: vec![1.0 / centers.len() as f64; centers.len()],
                options: centers,
            },
            height: DiscreteDist {
                name: "height".into(),
                options: vec![0.15, 0.20, 0.25, 0.4],
                probs: vec![0.25; 4],
            },
            width: DiscreteDist {
                name: "width".into(),
                options: vec![1.0, 2.0, 3.0],
                probs: vec![third, third, third],
            },
            offset: DiscreteDist::singleton("offset", 0.0),
            knee: DiscreteDist {
                name: "knee".into(),
                options: vec![10.0, 25.0, 150.0],
                probs: vec![third, third, third],
            },
            exponent: DiscreteDist {
                name: "exponent".into(),
                options: vec![0.5, 1.0, 1.5, 2.0],
                probs: vec![0.25; 4],
            },
            skew: DiscreteDist {
                name: "skew".into(),
                options: vec![0.0, 2.0, 5.0, 10.0],
                probs: vec![0.25; 4],
            },
        }
    }
}

impl SimOptions {
    /// Derives the options for one experimental condition.
    ///
    /// The varied setting is replaced; everything else is carried over
    /// unchanged, so conditions differ in exactly one axis.
    #[must_use]
    pub fn with_condition(&self, condition: &Condition) -> Self {
        let mut opts = self.clone();
        match *condition {
            Condition::NoiseLevel(nlv) => opts.nlv = nlv,
            Condition::PeakCount(n) => {
                opts.n_peaks = DiscreteDist::singleton("n_peaks", n as f64);
            }
            Condition::KneeValue(knee) => {
                opts.knee = DiscreteDist::singleton("knee", knee);
            }
            Condition::Skew(skew) => {
                opts.skew = DiscreteDist::singleton("skew", skew);
            }
            Condition::Asymmetry(magnitude) => {
                opts.skew = DiscreteDist {
                    name: "skew".into(),
                    options: vec![-magnitude, magnitude],
                    probs: vec![0.5, 0.5],
                };
            }
        }
        opts
    }

    /// Checks the whole options document, including every distribution.
    ///
    /// # Errors
    /// Returns the first configuration problem found.
    pub fn validate(&self) -> Result<()> {
        if self.freq_range.0 >= self.freq_range.1 || self.freq_res <= 0.0 {
            return Err(Error::EmptyFreqAxis(
                self.freq_range.0,
                self.freq_range.1,
                self.freq_res,
            ));
        }
        if !self.nlv.is_finite() || self.nlv < 0.0 {
            return Err(Error::BadDistribution {
                name: "nlv".into(),
                reason: format!("noise level {} is not a finite non-negative value", self.nlv),
            });
        }
        if self.max_draws == 0 {
            return Err(Error::BadDistribution {
                name: "max_draws".into(),
                reason: "retry budget must be at least 1".into(),
            });
        }
        for dist in [
            &self.n_peaks,
            &self.center_freq,
            &self.height,
            &self.width,
            &self.offset,
            &self.knee,
            &self.exponent,
            &self.skew,
        ] {
            dist.validate()?;
        }
        Ok(())
    }
}
