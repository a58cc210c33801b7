//! Error types for spectrum simulation and fit validation
//!
//! This module defines the common errors encountered when sampling simulation
//! parameters, synthesizing spectra, or extracting fit results, along with a
//! convenient `Result` alias.
//!
//! This is offline analysis code, not a service: every error is surfaced
//! immediately to the caller, and nothing is silently swallowed or defaulted.

/// Errors that can occur while simulating spectra or comparing fits to ground truth.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A discrete distribution definition is malformed.
    ///
    /// Option and probability lists must be non-empty, equal in length, and
    /// the probabilities must be non-negative and sum to 1.
    #[error("Malformed distribution for `{name}`: {reason}")]
    BadDistribution {
        /// Name of the parameter the distribution belongs to
        name: String,
        /// What the validation found
        reason: String,
    },

    /// An error-metric name was not recognised.
    ///
    /// Supported metrics are `abs` and `sqrd` (also spelled `squared`).
    #[error("Unknown error metric `{0}`; expected `abs` or `sqrd`")]
    UnknownMetric(String),

    /// A condition-axis selector was not recognised.
    #[error("Unknown condition axis `{0}`")]
    UnknownAxis(String),

    /// The retry budget was exhausted while placing a peak.
    ///
    /// Peak center frequencies are redrawn until they clear the minimum
    /// separation window; a distribution too narrow for the window can make
    /// that impossible.
    #[error(
        "Gave up placing peak {peak} after {draws} draws; \
         the center-frequency distribution may be too narrow for a {window} Hz separation window"
    )]
    SamplingExhausted {
        /// Index of the peak that could not be placed
        peak: usize,
        /// Number of candidate draws attempted
        draws: usize,
        /// Minimum separation window, in frequency units
        window: f64,
    },

    /// Arrays that must be aligned do not agree in shape.
    ///
    /// Raised by the synthesizer when component vectors disagree with the
    /// frequency axis, and by the extractor when fit-result groups are ragged.
    #[error("Shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch {
        /// The shape the operation requires
        expected: String,
        /// The shape it was given
        found: String,
    },

    /// A frequency axis definition produces no bins.
    #[error("Frequency range [{0}, {1}] at resolution {2} produces an empty axis")]
    EmptyFreqAxis(f64, f64, f64),

    /// An underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A simulation artifact could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for spectrum simulation and fit validation
pub type Result<T> = std::result::Result<T, Error>;
