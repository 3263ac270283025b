//! zenith_particles: interactive entry point.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use gesture_vision::FrameFormat;
use log::{info, LevelFilter};
use morph_field::{ParticleCount, Shape, Smoothing};

use zenith_particles::app::{run, AppConfig, SourceMode};
use zenith_particles::panel::{Rgb, Settings, DEFAULT_POINT_SIZE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Keyboard simulation (O / C / N)
    Sim,
    /// Frames from --frames classified by --classifier
    Camera,
}

#[derive(Parser, Debug)]
#[command(name = "zenith_particles", version, about = "Gesture-driven 3D particle cloud")]
struct Cli {
    /// Initial shape: sphere, cube, heart, bottle, torus or star
    #[arg(long, default_value = "sphere")]
    shape: Shape,

    /// Number of particles (5000-30000)
    #[arg(long, default_value_t = ParticleCount::DEFAULT)]
    count: usize,

    /// Point size in world units
    #[arg(long, default_value_t = DEFAULT_POINT_SIZE)]
    point_size: f32,

    /// Particle colour as #rrggbb
    #[arg(long, default_value = "#3b82f6")]
    color: Rgb,

    /// Where gestures come from
    #[arg(long, value_enum, default_value_t = SourceKind::Sim)]
    source: SourceKind,

    /// Directory of captured frames (camera source)
    #[arg(long, default_value = "frames")]
    frames: PathBuf,

    /// Program that classifies one frame: JSON request on stdin,
    /// {"state","confidence"} on stdout
    #[arg(long, required_if_eq("source", "camera"))]
    classifier: Option<String>,

    /// Extra argument for the classifier (repeatable)
    #[arg(long = "classifier-arg", allow_hyphen_values = true)]
    classifier_args: Vec<String>,

    /// Milliseconds between classifications
    #[arg(long, default_value_t = 2_000)]
    interval_ms: u64,

    /// Give up on a classification after this many milliseconds
    #[arg(long, default_value_t = 10_000)]
    classify_timeout_ms: u64,

    /// Seed for reproducible shapes
    #[arg(long)]
    seed: Option<u64>,

    /// Scale smoothing by frame time instead of per frame
    #[arg(long)]
    time_scaled: bool,

    /// Stop after this many frames
    #[arg(long)]
    frames_limit: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let cfg = build_config(&cli).context("invalid configuration")?;

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Zenith Particles · gesture-driven particle cloud      ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    match &cfg.source {
        SourceMode::Sim => println!("  Mode: keyboard simulation  (O open, C fist, N no hand)"),
        SourceMode::Camera { frames, program, .. } => {
            println!("  Mode: camera frames from {} via {}", frames.display(), program)
        }
    }
    println!("  Opening visualizer window…");
    println!();

    info!(
        "starting: {} x {}, source {:?}",
        cfg.settings.shape, cfg.settings.count, cli.source
    );
    run(cfg, cli.frames_limit)?;
    Ok(())
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    // RUST_LOG still wins when set.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();
}

fn build_config(cli: &Cli) -> Result<AppConfig, zenith_particles::AppError> {
    let settings = Settings {
        shape:      cli.shape,
        count:      ParticleCount::new(cli.count)?,
        point_size: Settings::point_size_checked(cli.point_size)?,
        color:      cli.color,
    };

    let source = match cli.source {
        SourceKind::Sim => SourceMode::Sim,
        SourceKind::Camera => SourceMode::Camera {
            frames:   cli.frames.clone(),
            // clap enforces --classifier for the camera source
            program:  cli.classifier.clone().unwrap_or_default(),
            args:     cli.classifier_args.clone(),
            interval: Duration::from_millis(cli.interval_ms.max(1)),
            timeout:  Duration::from_millis(cli.classify_timeout_ms.max(1)),
            format:   FrameFormat::default(),
        },
    };

    let smoothing = if cli.time_scaled { Smoothing::time_scaled() } else { Smoothing::default() };

    Ok(AppConfig {
        settings,
        source,
        seed: cli.seed,
        smoothing,
        ..AppConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_build_sim_config() {
        let cli = Cli::parse_from(["zenith_particles"]);
        let cfg = build_config(&cli).unwrap();
        assert_eq!(cfg.settings, Settings::default());
        assert_eq!(cfg.source, SourceMode::Sim);
    }

    #[test]
    fn camera_requires_classifier() {
        assert!(Cli::try_parse_from(["zenith_particles", "--source", "camera"]).is_err());
        let cli = Cli::try_parse_from([
            "zenith_particles", "--source", "camera", "--classifier", "classify.sh",
            "--classifier-arg", "--model", "--classifier-arg", "fast",
        ])
        .unwrap();
        match build_config(&cli).unwrap().source {
            SourceMode::Camera { program, args, .. } => {
                assert_eq!(program, "classify.sh");
                assert_eq!(args, vec!["--model", "fast"]);
            }
            other => panic!("expected camera, got {other:?}"),
        }
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(Cli::try_parse_from(["zenith_particles", "--shape", "pyramid"]).is_err());
        assert!(Cli::try_parse_from(["zenith_particles", "--color", "#12"]).is_err());
        let cli = Cli::parse_from(["zenith_particles", "--count", "40000"]);
        assert!(build_config(&cli).is_err());
    }
}
