//! Demo host: opens a window, or renders frames headless into a PNG.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use glam::Vec2;

use particle_field::clock::FrameClock;
use particle_field::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    Constellation,
    Cluster,
    Lattice,
}

impl Preset {
    fn config(self) -> FieldConfig {
        match self {
            Preset::Constellation => FieldConfig::constellation(),
            Preset::Cluster => FieldConfig::cluster(),
            Preset::Lattice => FieldConfig::lattice(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about = "Pointer-reactive particle field demo")]
struct Args {
    #[arg(long, value_enum, default_value = "constellation")]
    preset: Preset,

    /// Option overrides as a JSON object, e.g. '{"alignMode": "circle"}'.
    #[arg(long)]
    options: Option<String>,

    #[arg(long)]
    count: Option<usize>,

    /// Seed for reproducible layouts.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Draw one still frame and never animate.
    #[arg(long)]
    reduced_motion: bool,

    /// Render this many frames without a window.
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u32>,

    /// Pointer position for headless runs, as "x,y" in pixels.
    #[arg(long, value_parser = parse_point)]
    pointer: Option<Vec2>,

    /// Where headless runs write the last frame.
    #[arg(long, default_value = "field.png")]
    output: PathBuf,
}

fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,y\", got {s:?}"))?;
    let parse = |v: &str| v.trim().parse::<f32>().map_err(|e| e.to_string());
    Ok(Vec2::new(parse(x)?, parse(y)?))
}

fn build_config(args: &Args) -> Result<FieldConfig> {
    let mut config = args.preset.config();
    if let Some(json) = &args.options {
        let options = FieldOptions::from_json(json).context("parsing --options")?;
        config.reconfigure(&options);
    }
    if let Some(count) = args.count {
        config = config.with_particle_count(count);
    }
    Ok(config)
}

fn run_headless(args: &Args, config: FieldConfig, frames: u32) -> Result<()> {
    if args.width == 0 || args.height == 0 {
        bail!("headless output needs a non-zero size");
    }
    let environment = Environment {
        reduced_motion: args.reduced_motion,
    };
    let mut controller: FieldController<RasterSurface, _, _> = FieldController::new(
        config,
        ManualFrameDriver::new(),
        DetachedInput::new(),
        environment,
    );
    if let Some(seed) = args.seed {
        controller = controller.with_seed(seed);
    }

    let mut clock = FrameClock::fixed(Duration::from_secs_f64(1.0 / 60.0));
    controller.start(&mut RasterProvider::new(args.width, args.height));

    if let Some(point) = args.pointer {
        controller.on_pointer(PointerEvent::moved(point), clock.now());
    }
    for _ in 0..frames {
        if controller.driver().pending().is_none() {
            break;
        }
        controller.on_frame(clock.tick());
    }
    log::info!("rendered {} frames headless", clock.frame());

    let surface = controller
        .surface()
        .context("no drawing surface was created")?;
    surface.save(&args.output)?;
    log::info!("wrote {}", args.output.display());

    controller.destroy();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = build_config(&args)?;

    match args.headless {
        Some(frames) => run_headless(&args, config, frames),
        None => {
            let options = WindowOptions {
                width: args.width,
                height: args.height,
                environment: Environment {
                    reduced_motion: args.reduced_motion,
                },
                seed: args.seed,
                ..WindowOptions::default()
            };
            window::run(config, options)?;
            Ok(())
        }
    }
}
