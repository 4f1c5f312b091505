//! anim-export - skeletal animation export tool
//!
//! Converts decoded skeleton + animation object dumps to glTF (.gltf) or
//! COLLADA (.dae) scenes, one file per animation.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use anim_export::{ExportFormat, JsonObjectDecoder, batch, config, inspect};

#[derive(Parser)]
#[command(name = "anim-export")]
#[command(about = "Skeletal animation export tool")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one animation file or a directory of them
    Convert {
        /// File holding the skeleton object
        skeleton: PathBuf,

        /// Animation file, or directory searched recursively
        animations: PathBuf,

        /// Output directory (default: next to each animation)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export format
        #[arg(long, value_enum, conflicts_with_all = ["gltf", "dae"])]
        format: Option<ExportFormat>,

        /// Shorthand for --format gltf
        #[arg(long, conflicts_with = "dae")]
        gltf: bool,

        /// Shorthand for --format dae
        #[arg(long)]
        dae: bool,

        /// Config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Frame rate for key times (default: 30, overrides config)
        #[arg(short, long)]
        frame_rate: Option<f32>,
    },

    /// List the objects in a source file
    Inspect {
        /// File to decode
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let decoder = JsonObjectDecoder;

    match cli.command {
        Commands::Convert {
            skeleton,
            animations,
            output,
            format,
            gltf,
            dae,
            config: config_path,
            frame_rate,
        } => {
            let config = match &config_path {
                Some(path) => config::load_config(path)?,
                None => config::ConvertConfig::default(),
            };

            let format = if gltf {
                ExportFormat::Gltf
            } else if dae {
                ExportFormat::Dae
            } else {
                format.or(config.export.format).unwrap_or_default()
            };

            let mut settings = config.export_settings();
            if let Some(rate) = frame_rate {
                if !rate.is_finite() || rate <= 0.0 {
                    bail!("--frame-rate must be a positive number, got {}", rate);
                }
                settings.frame_rate = rate;
            }

            if !skeleton.is_file() {
                bail!("Skeleton file not found: {:?}", skeleton);
            }
            if !animations.exists() {
                bail!("Animation path not found: {:?}", animations);
            }

            let skeleton = batch::load_skeleton(&decoder, &skeleton)?;

            let extension = config.animation_extension();
            let items = batch::discover_animations(&animations, extension);
            if items.is_empty() {
                bail!("No .{} files found in {:?}", extension, animations);
            }
            tracing::info!(
                "Converting {} animation(s) to {} at {} fps",
                items.len(),
                format,
                settings.frame_rate
            );

            let options = batch::BatchOptions {
                format,
                settings,
                output_root: output,
            };
            let input_root = batch::input_root(&animations);
            let report = batch::run_batch(&skeleton, &items, &input_root, &options, &decoder);

            for (item, reason) in &report.failed {
                tracing::warn!("Skipped {:?}: {}", item, reason);
            }
            tracing::info!("Done!");
        }

        Commands::Inspect { input } => {
            inspect::inspect_file(&decoder, &input)?;
        }
    }

    Ok(())
}
