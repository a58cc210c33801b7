//!
//! Simulating a batch of power spectra with known ground truth.
//!
//! Here I build a small simulation campaign: one condition per noise level,
//! each with its own seeded sampler, and every batch saved to disk so the
//! fitting side can pick it up later (see `validate_fits`).
//!
use specsim::config::{Condition, SimOptions};
use specsim::error::Error;
use specsim::io::save_sim_data;
use specsim::sample::{ApMode, PeakKind, Sampler};
use specsim::synth::simulate_group;

fn main() -> Result<(), Error> {
    env_logger::init();

    //
    // Start from the default options: a 2-40 Hz axis, up to two peaks per
    // spectrum, a flat offset, and plausible exponents.
    // Printing a distribution shows its value/probability table.
    let base = SimOptions::default();
    println!("{}", base.height);

    //
    // One condition per noise level. Each condition varies exactly one
    // setting; everything else stays pinned so the comparison is clean.
    let noise_levels = [0.0, 0.005, 0.01, 0.025, 0.05];

    for (i, &nlv) in noise_levels.iter().enumerate() {
        let opts = base.with_condition(&Condition::NoiseLevel(nlv));

        //
        // A fixed seed per condition makes the whole campaign reproducible:
        // rerunning this demo regenerates identical spectra.
        let mut sampler = Sampler::new(opts, Some(1000 + i as u64))?;
        let data = simulate_group(&mut sampler, 50, ApMode::NoKnee, PeakKind::Symmetric, None)?;

        let path = std::env::temp_dir().join(format!("specsim_nlv_{i}.json"));
        save_sim_data(&path, &data)?;
        println!(
            "nlv={nlv}: {} spectra over {} bins -> {}",
            data.n_spectra(),
            data.freqs.len(),
            path.display()
        );

        //
        // With the `plotting` feature on, have a look at the first spectrum.
        #[cfg(feature = "plotting")]
        {
            let spectrum = data.powers.row(0).transpose();
            let png = std::env::temp_dir().join(format!("specsim_nlv_{i}.png"));
            specsim::plot::plot_spectrum(&png, &data.freqs, &spectrum, true)
                .expect("failed to render spectrum");
            println!("  plotted -> {}", png.display());
        }
    }

    Ok(())
}
