//!
//! Fitting simulated spectra and scoring the fits against ground truth.
//!
//! This is the analysis half of the pipeline: reload the batches written by
//! `simulate_and_save`, fit each one, and compare what the fitter recovered
//! to what the simulator put in.
//!
//! The fitting engine here is the oracle test double — it answers with
//! jittered ground truth, so the error numbers below are small and known by
//! construction. Swapping in a wrapper around a real fitting library changes
//! nothing else about this file.
//!
use specsim::analysis::{
    calc_errors, count_peak_conditions, get_ground_truth, harmonic_mapping, ErrorApproach,
    FitData,
};
use specsim::config::SimOptions;
use specsim::error::Error;
use specsim::fit::{FitEngine, FitSettings};
use specsim::sample::{ApMode, PeakKind, Sampler};
use specsim::statistics::nan_mean;
use specsim::synth::simulate_group;
use specsim::test::OracleEngine;

fn main() -> Result<(), Error> {
    env_logger::init();

    //
    // Simulate the conditions in-process rather than reading the artifacts,
    // so this demo runs on its own; `load_sim_data` on the saved files gets
    // you the same structures.
    let base = SimOptions::default();
    let noise_levels = [0.0, 0.01, 0.05];
    let settings = FitSettings::default();

    let mut groups = Vec::new();
    let mut truths = Vec::new();
    for (i, &nlv) in noise_levels.iter().enumerate() {
        let opts = base.with_condition(&specsim::config::Condition::NoiseLevel(nlv));
        let mut sampler = Sampler::new(opts, Some(2000 + i as u64))?;
        let data = simulate_group(&mut sampler, 25, ApMode::NoKnee, PeakKind::Symmetric, Some(1))?;

        //
        // More simulated noise, more fit error: scale the oracle's jitter
        // with the condition's noise level to mimic a real fitter degrading.
        let mut engine = OracleEngine::new(data.params.clone(), 0.01 + nlv, Some(31 + i as u64));
        groups.push(engine.fit_group(&data.freqs, &data.powers, &settings)?);
        truths.push(data.params);
    }

    //
    // Pull the matched comparison arrays out of the fits, restricted to the
    // 3-35 Hz band (single highest peak per spectrum).
    let fits = FitData::extract(&groups, (3.0, 35.0))?;
    let (peak_truths, ap_truths) = get_ground_truth(&truths)?;

    for (i, &nlv) in noise_levels.iter().enumerate() {
        let ap_err = calc_errors(&ap_truths[i], &fits.ap_fits[i], ErrorApproach::Abs)?;
        let cf_err = calc_errors(&peak_truths[i], &fits.peak_fits[i], ErrorApproach::Abs)?;
        println!(
            "nlv={nlv}: mean |aperiodic error| = {:.4}, mean |peak error| = {:.4}, mean R^2 = {:.4}",
            nan_mean(ap_err.iter().copied()),
            nan_mean(cf_err.iter().copied()),
            nan_mean(fits.r2_fits.row(i).iter().copied()),
        );
    }

    //
    // How many peaks did the fitter find per condition?
    let labels: Vec<String> = noise_levels.iter().map(|nlv| format!("nlv={nlv}")).collect();
    let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    let counter = count_peak_conditions(&fits.n_peaks, &label_refs)?;
    let mut cells: Vec<_> = counter.iter().collect();
    cells.sort();
    for ((label, count), occurrences) in cells {
        println!("{label}: {count} peaks recovered in {occurrences} spectra");
    }

    //
    // Harmonic structure of the recovered peaks, per condition
    for (label, group) in labels.iter().zip(&groups) {
        let mappings = harmonic_mapping(group);
        println!("{label}: {} models with at least one peak", mappings.len());
    }

    #[cfg(feature = "plotting")]
    {
        // Score each spectrum by its exponent error
        let per_condition: Vec<_> = (0..noise_levels.len())
            .map(|c| {
                calc_errors(&ap_truths[c], &fits.ap_fits[c], ErrorApproach::Abs)
                    .expect("shapes already checked")
            })
            .collect();
        let ap_errors = specsim::nalgebra::DMatrix::from_fn(noise_levels.len(), 25, |c, s| {
            per_condition[c][(s, per_condition[c].ncols() - 1)]
        });
        let png = std::env::temp_dir().join("specsim_exponent_errors.png");
        specsim::plot::plot_errors(&png, &ap_errors, "Exponent Error", "nlvs")
            .expect("failed to render error plot");
        println!("plotted -> {}", png.display());

        let png = std::env::temp_dir().join("specsim_peak_counts.png");
        specsim::plot::plot_peak_counts(&png, &counter).expect("failed to render count plot");
        println!("plotted -> {}", png.display());
    }

    Ok(())
}
