//! TOML-driven review tool for AR calcium models.
//!
//! Simulates fluorescence for a set of units, fits AR(1) units with OASIS,
//! and writes the normalized review traces and pulse responses to CSV and PNG.
//!
//! Run with:
//!   cargo run --features cli                           # Uses calcitrace.toml
//!   cargo run --features cli -- --recipe gcamp6        # Uses embedded recipe
//!   cargo run --features cli -- --config my.toml       # Uses custom file
//!
//! Set `RUST_LOG=debug` to see per-call solver logs.

use calcitrace::{
    oasis_ar1, pulse_train, review_units, ArModel, ReviewConfig, UnitReview, UnitTraces,
};
use clap::Parser;
use plotters::prelude::*;
use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::io::Write;

// ============================================================================
// Recipe Constants
// ============================================================================

const RECIPE_GCAMP6: &str = r#"
[signal]
frames = 600
sample_rate = 30.0
spike_period = 90
noise_amplitude = 0.1
noise_seed = 42

[[units]]
id = 1
model = { type = "decay", tau = 0.1 }

[[units]]
id = 2
model = { type = "decay", tau = 0.55 }

[output]
plot_path = "output/review_gcamp6.png"
csv_path = "output/review_gcamp6.csv"
"#;

const RECIPE_RISE: &str = r#"
[signal]
frames = 600
sample_rate = 30.0
spike_period = 120
noise_amplitude = 0.05
noise_seed = 7

[review]
pulse_length = 120

[[units]]
id = 1
model = { type = "rise_decay", tau_rise = 0.05, tau_decay = 0.4 }

[[units]]
id = 2
model = { type = "coefficients", g = [1.5, -0.56] }

[output]
plot_path = "output/review_rise.png"
csv_path = "output/review_rise.csv"
"#;

const RECIPE_ADVERSARIAL: &str = r#"
[signal]
frames = 300
sample_rate = 30.0
spike_period = 60
noise_amplitude = 0.1
noise_seed = 42

[review]
pulse_length = 100
solver = "inverse"
degenerate = "midpoint"

[[units]]
id = 1
model = { type = "coefficients", g = [0.9] }

[[units]]
id = 2
model = { type = "coefficients", g = [nan] }

[[units]]
id = 3
model = { type = "coefficients", g = [inf, 0.2] }

[output]
plot_path = "output/review_adversarial.png"
csv_path = "output/review_adversarial.csv"
"#;

// ============================================================================
// Configuration Structures
// ============================================================================

#[derive(Deserialize)]
struct ToolConfig {
    signal: SignalConfig,
    #[serde(default)]
    review: ReviewConfig,
    units: Vec<UnitConfig>,
    output: OutputConfig,
}

#[derive(Deserialize)]
struct SignalConfig {
    frames: usize,
    sample_rate: f64,
    spike_period: usize,
    noise_amplitude: f64,
    noise_seed: u64,
    /// OASIS sparsity penalty for AR(1) units
    #[serde(default)]
    lambda: f64,
}

#[derive(Deserialize)]
struct UnitConfig {
    id: u32,
    model: ModelConfig,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ModelConfig {
    Coefficients { g: ArModel },
    Decay { tau: f64 },
    RiseDecay { tau_rise: f64, tau_decay: f64 },
}

#[derive(Deserialize)]
struct OutputConfig {
    plot_path: String,
    csv_path: String,
}

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Recipe name (gcamp6, rise, adversarial)
    #[arg(short, long)]
    recipe: Option<String>,

    /// Custom config file path
    #[arg(short, long)]
    config: Option<String>,
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Priority: --config > --recipe > calcitrace.toml
    let config_str = if let Some(path) = args.config {
        log::info!("Loading config: {}", path);
        fs::read_to_string(path)?
    } else if let Some(recipe_name) = args.recipe {
        log::info!("Using recipe: {}", recipe_name);
        load_recipe(&recipe_name)?.to_string()
    } else {
        match fs::read_to_string("calcitrace.toml") {
            Ok(content) => {
                log::info!("Using calcitrace.toml");
                content
            }
            Err(_) => {
                log::info!("No calcitrace.toml found, using gcamp6 recipe");
                RECIPE_GCAMP6.to_string()
            }
        }
    };

    let config: ToolConfig =
        toml::from_str(&config_str).map_err(|e| format!("Failed to parse TOML config: {}", e))?;
    validate(&config)?;

    log::info!(
        "{} units, {} frames at {:.1} Hz, {:?} solver",
        config.units.len(),
        config.signal.frames,
        config.signal.sample_rate,
        config.review.solver
    );

    let traces = config
        .units
        .iter()
        .map(|unit| simulate_unit(unit, &config.signal))
        .collect::<Result<Vec<_>, _>>()?;
    let reviews = review_units(&traces, &config.review)?;

    for review in &reviews {
        let peak = review.pulse.peak().map(|(i, _)| i);
        let half = review.pulse.decay_index(0.5);
        if review.passthrough() {
            log::warn!("unit {}: pulse response fell back to the stimulus", review.unit_id);
        } else {
            log::info!(
                "unit {}: pulse peak at {:?}, half decay at {:?}",
                review.unit_id,
                peak,
                half
            );
        }
    }

    for path in [&config.output.plot_path, &config.output.csv_path] {
        if let Some(parent) = std::path::Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
    }

    write_csv(&reviews, &config)?;
    generate_plot(&reviews, &config)?;

    println!("Done!");
    println!("  Plot: {}", config.output.plot_path);
    println!("  CSV: {}", config.output.csv_path);

    Ok(())
}

// ============================================================================
// Config Loading
// ============================================================================

fn load_recipe(name: &str) -> Result<&'static str, Box<dyn Error>> {
    match name {
        "gcamp6" => Ok(RECIPE_GCAMP6),
        "rise" => Ok(RECIPE_RISE),
        "adversarial" => Ok(RECIPE_ADVERSARIAL),
        _ => Err(format!(
            "Unknown recipe '{}'. Available recipes: gcamp6, rise, adversarial",
            name
        )
        .into()),
    }
}

fn validate(config: &ToolConfig) -> Result<(), Box<dyn Error>> {
    if config.units.is_empty() {
        return Err("config lists no units".into());
    }
    if config.signal.spike_period == 0 {
        return Err("spike_period must be at least 1".into());
    }
    if !(config.signal.lambda >= 0.0) {
        return Err(format!("lambda must be non-negative, got {}", config.signal.lambda).into());
    }
    Ok(())
}

fn build_model(model: &ModelConfig, sample_rate: f64) -> Result<ArModel, Box<dyn Error>> {
    Ok(match model {
        ModelConfig::Coefficients { g } => g.clone(),
        ModelConfig::Decay { tau } => ArModel::from_tau(sample_rate, *tau)?,
        ModelConfig::RiseDecay {
            tau_rise,
            tau_decay,
        } => ArModel::from_rise_decay(sample_rate, *tau_rise, *tau_decay)?,
    })
}

// ============================================================================
// Signal Generation
// ============================================================================

/// White noise in [-amplitude, amplitude] from a seeded LCG.
fn white_noise(samples: usize, amplitude: f64, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..samples)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let normalized = (state as f64 / u64::MAX as f64) * 2.0 - 1.0;
            amplitude * normalized
        })
        .collect()
}

/// Simulates one unit and fits it.
///
/// Stable AR(1) units are fitted with OASIS on the noisy trace. Other units
/// keep the ground truth as their fit.
fn simulate_unit(unit: &UnitConfig, signal: &SignalConfig) -> Result<UnitTraces, Box<dyn Error>> {
    let model = build_model(&unit.model, signal.sample_rate)?;
    let truth = pulse_train(model.coefficients(), signal.frames, signal.spike_period)?;
    if truth.is_passthrough() {
        log::warn!("unit {}: model is numerically unusable", unit.id);
    }

    let noise = white_noise(
        signal.frames,
        signal.noise_amplitude,
        signal.noise_seed.wrapping_add(u64::from(unit.id)),
    );
    let raw: Vec<f64> = truth.calcium.iter().zip(&noise).map(|(c, n)| c + n).collect();

    let (calcium, spikes) = match model.coefficients() {
        [gamma] if model.is_stable() && *gamma > 0.0 => {
            let fit = oasis_ar1(&raw, *gamma, signal.lambda)?;
            log::debug!("unit {}: OASIS kept {} pools", unit.id, fit.pools);
            (fit.calcium, fit.spikes)
        }
        _ => (truth.calcium.clone(), truth.spikes.clone()),
    };

    // Fitted signal: calcium plus the noise floor's mean offset
    let baseline = noise.iter().sum::<f64>() / noise.len().max(1) as f64;
    let fitted = calcium.iter().map(|c| c + baseline).collect();

    Ok(UnitTraces {
        unit_id: unit.id,
        raw,
        calcium,
        spikes,
        fitted,
        g: model.into(),
    })
}

// ============================================================================
// CSV Export
// ============================================================================

fn write_csv(reviews: &[UnitReview], config: &ToolConfig) -> Result<(), Box<dyn Error>> {
    let mut file = fs::File::create(&config.output.csv_path)?;
    let dt = 1.0 / config.signal.sample_rate;

    for review in reviews {
        writeln!(file, "# Unit {}", review.unit_id)?;
        writeln!(file, "frame,time_s,raw,calcium,spikes,fitted")?;
        for i in 0..review.raw.len() {
            writeln!(
                file,
                "{},{:.4},{:.6},{:.6},{:.6},{:.6}",
                i,
                i as f64 * dt,
                review.raw[i],
                review.calcium[i],
                review.spikes[i],
                review.fitted[i]
            )?;
        }
        writeln!(file)?;

        writeln!(
            file,
            "# Unit {} pulse response ({})",
            review.unit_id,
            if review.passthrough() {
                "passthrough"
            } else {
                "solved"
            }
        )?;
        writeln!(file, "sample,spikes,calcium")?;
        for (i, (s, c)) in review
            .pulse
            .spikes
            .iter()
            .zip(&review.pulse.calcium)
            .enumerate()
        {
            writeln!(file, "{},{:.6},{:.6}", i, s, c)?;
        }
        writeln!(file)?;
    }

    Ok(())
}

// ============================================================================
// Plotting
// ============================================================================

type Panel<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

fn generate_plot(reviews: &[UnitReview], config: &ToolConfig) -> Result<(), Box<dyn Error>> {
    let height = 300 * reviews.len() as u32;
    let root = BitMapBackend::new(&config.output.plot_path, (1400, height)).into_drawing_area();
    root.fill(&WHITE)?;

    // One row per unit: traces on the left, pulse response on the right
    let rows = root.split_evenly((reviews.len(), 1));
    let dt = 1.0 / config.signal.sample_rate;

    for (row, review) in rows.iter().zip(reviews) {
        let (left, right) = row.split_horizontally(1000);

        let time: Vec<f64> = (0..review.raw.len()).map(|i| i as f64 * dt).collect();
        plot_panel(
            &left,
            &format!("Unit {}", review.unit_id),
            "Time (s)",
            &time,
            &[
                ("raw", &review.raw, BLACK.mix(0.4)),
                ("fitted", &review.fitted, GREEN.mix(1.0)),
                ("calcium", &review.calcium, BLUE.mix(1.0)),
                ("spikes", &review.spikes, RED.mix(1.0)),
            ],
        )?;

        let samples: Vec<f64> = (0..review.pulse.len()).map(|i| i as f64).collect();
        let caption = if review.passthrough() {
            "Pulse response (passthrough)"
        } else {
            "Pulse response"
        };
        plot_panel(
            &right,
            caption,
            "Sample",
            &samples,
            &[
                ("pulse", &review.pulse.spikes, RED.mix(1.0)),
                ("response", &review.pulse.calcium, BLUE.mix(1.0)),
            ],
        )?;
    }

    root.present()?;
    Ok(())
}

fn plot_panel(
    panel: &Panel,
    caption: &str,
    x_desc: &str,
    x: &[f64],
    series: &[(&str, &Vec<f64>, RGBAColor)],
) -> Result<(), Box<dyn Error>> {
    let x_max = x.last().copied().unwrap_or(0.0).max(1e-9);

    // Missing samples are skipped when computing the range and when drawing
    let (mut y_min, mut y_max) = series
        .iter()
        .flat_map(|(_, values, _)| values.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !y_min.is_finite() || !y_max.is_finite() {
        (y_min, y_max) = (0.0, 1.0);
    }
    let margin = ((y_max - y_min) * 0.1).max(1e-3);
    y_min -= margin;
    y_max += margin;

    let mut chart = ChartBuilder::on(panel)
        .caption(caption, ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Amplitude")
        .draw()?;

    for &(name, values, color) in series {
        chart
            .draw_series(LineSeries::new(
                x.iter()
                    .zip(values.iter())
                    .filter(|(_, v)| v.is_finite())
                    .map(|(&t, &v)| (t, v)),
                color.stroke_width(1),
            ))?
            .label(name)
            .legend(move |(lx, ly)| PathElement::new(vec![(lx, ly), (lx + 15, ly)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}
