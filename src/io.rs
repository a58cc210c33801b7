//! Persistence for simulation artifacts
//!
//! A simulation batch is saved as one JSON document pairing the frequency
//! axis, the matrix of synthesized power spectra, and the per-spectrum
//! ground-truth records. Loading returns the same three structures, so a
//! batch can be simulated once and refit or reanalyzed any number of times.
//!
//! The format is a serialization contract, not an engineering one: any
//! structured format holding numeric arrays and nested parameter records
//! would do, and JSON keeps the artifacts diffable.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sample::GroundTruth;

/// One simulated batch: the axis, the spectra, and how they were made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimData {
    /// Frequency axis shared by every spectrum in the batch
    pub freqs: DVector<f64>,
    /// Synthesized power spectra, one row per spectrum
    pub powers: DMatrix<f64>,
    /// Ground-truth parameters, one record per spectrum
    pub params: Vec<GroundTruth>,
}

impl SimData {
    /// Number of spectra in the batch.
    #[must_use]
    pub fn n_spectra(&self) -> usize {
        self.powers.nrows()
    }
}

/// Writes a simulation batch to a JSON file.
///
/// # Errors
/// Fails on I/O problems or if the artifact cannot be encoded.
pub fn save_sim_data(path: impl AsRef<Path>, data: &SimData) -> Result<()> {
    let path = path.as_ref();
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer(file, data)?;
    log::debug!(
        "saved {} spectra over {} bins to {}",
        data.n_spectra(),
        data.freqs.len(),
        path.display()
    );
    Ok(())
}

/// Reads a simulation batch back from a JSON file.
///
/// Round-trips with [`save_sim_data`]: the loaded axis, spectra, and records
/// compare equal to what was saved, within floating-point representation.
///
/// # Errors
/// Fails on I/O problems or if the file does not decode as a [`SimData`].
pub fn load_sim_data(path: impl AsRef<Path>) -> Result<SimData> {
    let path = path.as_ref();
    let file = BufReader::new(File::open(path)?);
    let data: SimData = serde_json::from_reader(file)?;
    log::debug!("loaded {} spectra from {}", data.n_spectra(), path.display());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimOptions;
    use crate::sample::{ApMode, PeakKind, Sampler};
    use crate::synth::simulate_group;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("specsim-{name}-{}", std::process::id()));
        path
    }

    #[test]
    fn sim_data_round_trips_through_disk() {
        let mut sampler = Sampler::new(SimOptions::default(), Some(13)).unwrap();
        let data = simulate_group(&mut sampler, 4, ApMode::NoKnee, PeakKind::Symmetric, None).unwrap();

        let path = scratch_path("roundtrip.json");
        save_sim_data(&path, &data).unwrap();
        let loaded = load_sim_data(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.freqs.len(), data.freqs.len());
        assert_eq!(loaded.params, data.params);
        for (a, b) in loaded.powers.iter().zip(data.powers.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn loading_a_missing_file_fails() {
        assert!(load_sim_data(scratch_path("does-not-exist.json")).is_err());
    }

    #[test]
    fn loading_garbage_fails_to_decode() {
        let path = scratch_path("garbage.json");
        std::fs::write(&path, b"not json at all").unwrap();
        let result = load_sim_data(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
