//! rig-export - rigged character export tool
//!
//! Converts a prepared rig document (JSON) to the `.skel` and `.skin` text formats

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rig_export::{pipeline, skeleton, skin, ExportConfig, SKEL_EXT, SKIN_EXT};

#[derive(Parser)]
#[command(name = "rig-export")]
#[command(about = "Rigged character export tool")]
#[command(version)]
struct Cli {
    /// Export settings (TOML); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export both .skel and .skin from a rig document
    Build {
        /// Input rig document (JSON)
        input: PathBuf,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the skeleton only
    Skel {
        /// Input rig document (JSON)
        input: PathBuf,

        /// Output .skel file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the skin only
    Skin {
        /// Input rig document (JSON)
        input: PathBuf,

        /// Output .skin file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the export in memory and verify the results without writing files
    Check {
        /// Input rig document (JSON)
        input: PathBuf,
    },

    /// List bones in canonical index order
    Bones {
        /// Input rig document (JSON)
        input: PathBuf,
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
    let config = ExportConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Build { input, output } => {
            tracing::info!("Exporting rig {:?}", input);
            pipeline::convert_rig(&input, output.as_deref(), &config)?;
            tracing::info!("Done!");
        }

        Commands::Skel { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension(SKEL_EXT));
            tracing::info!("Exporting skeleton {:?} -> {:?}", input, output);
            skeleton::convert_skeleton(&input, &output, &config)?;
            tracing::info!("Done!");
        }

        Commands::Skin { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension(SKIN_EXT));
            tracing::info!("Exporting skin {:?} -> {:?}", input, output);
            skin::convert_skin(&input, &output, &config)?;
            tracing::info!("Done!");
        }

        Commands::Check { input } => {
            tracing::info!("Checking rig {:?}", input);
            pipeline::check_rig(&input, &config)?;
            tracing::info!("Rig is valid!");
        }

        Commands::Bones { input } => {
            pipeline::list_bones(&input, &config)?;
        }
    }

    Ok(())
}
