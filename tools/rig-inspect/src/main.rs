//! rig-inspect - inspect glTF/GLB rigs from the command line
//!
//! Prints the node forest, skins, animations and scene bounds of a model, and
//! samples joint matrices of an animation at given timestamps.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rig_inspect::{
    describe_animations, describe_bounds, describe_skins, describe_tree, format_matrix,
    load_model, load_options, sample_joints,
};

#[derive(Parser)]
#[command(name = "rig-inspect")]
#[command(about = "Inspect glTF/GLB rigs")]
#[command(version)]
struct Cli {
    /// Load options (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node forest, skins, animations and bounds
    Info {
        /// Input glTF/GLB file
        input: PathBuf,
    },

    /// Print the node forest
    Tree {
        /// Input glTF/GLB file
        input: PathBuf,
    },

    /// Sample joint matrices of an animation
    Sample {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Animation index (default: first animation)
        #[arg(short, long, default_value_t = 0)]
        animation: usize,

        /// Comma-separated sample times in seconds
        #[arg(short, long, value_delimiter = ',', default_value = "0")]
        times: Vec<f32>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let options = load_options(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { input } => {
            let model = load_model(&input, &options)?;

            tracing::info!("Nodes in {:?}:", input);
            for line in describe_tree(&model) {
                tracing::info!("  {}", line);
            }

            let skins = describe_skins(&model);
            if skins.is_empty() {
                tracing::info!("No skins");
            } else {
                tracing::info!("Skins:");
                for line in skins {
                    tracing::info!("  {}", line);
                }
            }

            let animations = describe_animations(&model);
            if animations.is_empty() {
                tracing::info!("No animations");
            } else {
                tracing::info!("Animations:");
                for line in animations {
                    tracing::info!("  {}", line);
                }
            }

            tracing::info!(
                "{} vertices, {} indices, {} materials",
                model.vertices().len(),
                model.indices().len(),
                model.materials().len()
            );
            tracing::info!("Bounds: {}", describe_bounds(&model));

            for warning in model.warnings() {
                tracing::warn!("{}", warning);
            }
        }

        Commands::Tree { input } => {
            let model = load_model(&input, &options)?;
            for line in describe_tree(&model) {
                tracing::info!("{}", line);
            }
        }

        Commands::Sample {
            input,
            animation,
            times,
        } => {
            let mut model = load_model(&input, &options)?;
            for sample in sample_joints(&mut model, animation, &times)? {
                tracing::info!(
                    "t = {:.3}s {}: {} joints",
                    sample.time,
                    sample.node,
                    sample.matrices.len()
                );
                for (joint, matrix) in sample.matrices.iter().enumerate() {
                    tracing::info!("  joint {}:", joint);
                    for row in format_matrix(matrix) {
                        tracing::info!("    {}", row);
                    }
                }
            }
        }
    }

    Ok(())
}
