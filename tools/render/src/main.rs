//! Renders diamond-square and plasma fields to 8-bit grayscale PNGs.
//!
//! Generation parameters come from flags or from a JSON config file:
//!
//! ```json
//! { "seed": 7,
//!   "diamond": { "size": 256, "initial_roughness": 1.0, "persistence": 0.5 },
//!   "plasma":  { "size": 256, "initial_roughness": 2.0, "persistence": 0.5 } }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fractal_core::{
    compute_stats, FieldStats, GeneratorParams, MidpointGenerator, Noisy, ScalarField, Seed,
    Smooth, SquareStep,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Mixed into the seed of the plasma field so both variants get independent streams.
const PLASMA_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Variant {
    Diamond,
    Plasma,
    Both,
}

#[derive(Parser, Debug)]
#[command(name = "render", about = "Render midpoint-displacement fields as grayscale PNGs")]
struct Args {
    /// Requested field side length.
    #[arg(short, long, default_value_t = 256)]
    size: usize,

    /// Initial roughness of the diamond-square field.
    #[arg(short, long, default_value_t = 1.0)]
    roughness: f32,

    /// Initial roughness of the plasma field.
    #[arg(long, default_value_t = 2.0)]
    plasma_roughness: f32,

    /// Roughness multiplier per recursion level.
    #[arg(short, long, default_value_t = 0.5)]
    persistence: f32,

    #[arg(long, value_enum, default_value_t = Variant::Both)]
    variant: Variant,

    /// Fixed seed for reproducible output. Omit for OS entropy.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with generation parameters. Replaces the size, roughness
    /// and persistence flags; `--seed` still overrides its seed.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Resample to this many pixels per side instead of one pixel per cell.
    #[arg(long)]
    pixels: Option<u32>,

    /// Print field statistics as JSON on stdout.
    #[arg(long)]
    stats: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawRenderConfig")]
struct RenderConfig {
    seed: Option<u64>,
    diamond: GeneratorParams,
    plasma: GeneratorParams,
}

/// Config file as written: every field optional, merged over the
/// per-variant defaults of [`RenderConfig::default`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRenderConfig {
    seed: Option<u64>,
    diamond: ParamsOverride,
    plasma: ParamsOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ParamsOverride {
    size: Option<usize>,
    initial_roughness: Option<f32>,
    persistence: Option<f32>,
}

impl ParamsOverride {
    fn over(self, base: GeneratorParams) -> GeneratorParams {
        GeneratorParams {
            size: self.size.unwrap_or(base.size),
            initial_roughness: self.initial_roughness.unwrap_or(base.initial_roughness),
            persistence: self.persistence.unwrap_or(base.persistence),
        }
    }
}

impl From<RawRenderConfig> for RenderConfig {
    fn from(raw: RawRenderConfig) -> Self {
        let defaults = RenderConfig::default();
        Self {
            seed: raw.seed,
            diamond: raw.diamond.over(defaults.diamond),
            plasma: raw.plasma.over(defaults.plasma),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            seed: None,
            diamond: GeneratorParams::new(256, 1.0, 0.5),
            plasma: GeneratorParams::new(256, 2.0, 0.5),
        }
    }
}

impl RenderConfig {
    fn from_args(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("cannot read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => RenderConfig {
                seed: None,
                diamond: GeneratorParams::new(args.size, args.roughness, args.persistence),
                plasma: GeneratorParams::new(args.size, args.plasma_roughness, args.persistence),
            },
        };
        if args.seed.is_some() {
            config.seed = args.seed;
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct StatsReport<'a> {
    variant: &'a str,
    requested_size: usize,
    array_size: usize,
    #[serde(flatten)]
    stats: FieldStats,
}

/// `[0, 1]` → `0..=255`, truncating.
fn gray(v: f32) -> u8 {
    (255.0 * v) as u8
}

/// One pixel per cell over the requested area, or a bilinear resample.
fn to_image(field: &ScalarField, pixels: Option<u32>) -> Result<image::GrayImage> {
    match pixels {
        None => {
            let n = u32::try_from(field.requested_size()).with_context(|| {
                format!("field size {} exceeds image limits", field.requested_size())
            })?;
            let mut img = image::GrayImage::new(n, n);
            for x in 0..n {
                for y in 0..n {
                    let v = field.get(x as usize, y as usize);
                    img.put_pixel(x, y, image::Luma([gray(v)]));
                }
            }
            Ok(img)
        }
        Some(p) => {
            let p = p.max(1);
            let step = if p > 1 { 1.0 / (p - 1) as f64 } else { 0.0 };
            let mut img = image::GrayImage::new(p, p);
            for x in 0..p {
                for y in 0..p {
                    let v = field.sample(x as f64 * step, y as f64 * step).unwrap_or(0.0);
                    img.put_pixel(x, y, image::Luma([gray(v)]));
                }
            }
            Ok(img)
        }
    }
}

fn render<S: SquareStep>(
    params: GeneratorParams,
    seed: Seed,
    out_dir: &Path,
    file_name: &str,
    args: &Args,
) -> Result<()> {
    let generator = MidpointGenerator::<S>::new(params, seed)
        .with_context(|| format!("failed to generate {} field", S::NAME))?;
    let field = generator
        .field()
        .context("generator returned without a field")?;
    info!(
        variant = S::NAME,
        requested_size = field.requested_size(),
        array_size = field.array_size(),
        "generated"
    );

    let path = out_dir.join(file_name);
    to_image(field, args.pixels)?
        .save(&path)
        .with_context(|| format!("failed to save {}", path.display()))?;
    info!("wrote {}", path.display());

    if args.stats {
        let report = StatsReport {
            variant: S::NAME,
            requested_size: field.requested_size(),
            array_size: field.array_size(),
            stats: compute_stats(field),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = RenderConfig::from_args(&args)?;

    fs::create_dir_all(&args.output)
        .with_context(|| format!("cannot create {}", args.output.display()))?;

    let diamond_seed = Seed::from(config.seed);
    let plasma_seed = Seed::from(config.seed.map(|s| s ^ PLASMA_SEED_SALT));

    if matches!(args.variant, Variant::Diamond | Variant::Both) {
        render::<Noisy>(
            config.diamond,
            diamond_seed,
            &args.output,
            "diamond.png",
            &args,
        )?;
    }
    if matches!(args.variant, Variant::Plasma | Variant::Both) {
        render::<Smooth>(
            config.plasma,
            plasma_seed,
            &args.output,
            "plasma.png",
            &args,
        )?;
    }

    info!("done");
    Ok(())
}
