//! gltf-tool - glTF/GLB inspection and conversion
//!
//! Prints document summaries, decodes every accessor to catch broken files,
//! and converts between `.glb`, embedded `.gltf` and `.gltf` + `.bin`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gltf_interchange::{CodecConfig, Container};
use std::path::{Path, PathBuf};

use gltf_tool::{inspect, load_file, repack};

#[derive(Parser)]
#[command(name = "gltf-tool")]
#[command(about = "glTF/GLB inspection and conversion tool")]
#[command(version)]
struct Cli {
    /// Codec options (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of a glTF/GLB file
    Info {
        /// Input .gltf, .glb or .zip file
        input: PathBuf,
    },

    /// Validate a file and decode all of its data
    Check {
        /// Input .gltf, .glb or .zip file
        input: PathBuf,
    },

    /// Pack a .gltf (or a .zip holding one) and its side files into a single .glb
    Pack {
        /// Input .gltf or .zip file
        input: PathBuf,

        /// Output .glb file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Unpack a .glb into .gltf + .bin
    Unpack {
        /// Input .glb file
        input: PathBuf,

        /// Output .gltf file (the .bin is written next to it)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert to the container named here or in the config file
    Convert {
        /// Input .gltf, .glb or .zip file
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Target container (overrides config)
        #[arg(long, value_enum)]
        container: Option<ContainerArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ContainerArg {
    Glb,
    GltfEmbedded,
    GltfSeparate,
}

impl From<ContainerArg> for Container {
    fn from(arg: ContainerArg) -> Self {
        match arg {
            ContainerArg::Glb => Container::Glb,
            ContainerArg::GltfEmbedded => Container::GltfEmbedded,
            ContainerArg::GltfSeparate => Container::GltfSeparate,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CodecConfig::load(path)
            .with_context(|| format!("Failed to load config: {:?}", path))?,
        None => CodecConfig::default(),
    };

    match cli.command {
        Commands::Info { input } => {
            let imported = load_file(&input, &config.import).await?;
            tracing::info!("{:?}:", input);
            inspect::Summary::from_document(imported.document()).log();
        }

        Commands::Check { input } => {
            tracing::info!("Checking {:?}", input);
            let imported = load_file(&input, &config.import).await?;
            let report = inspect::check(&imported)?;
            tracing::info!(
                "Decoded {} accessors ({} values), {} meshes, {} skins, {} animations",
                report.accessors,
                report.values,
                report.meshes,
                report.skins,
                report.animations
            );
            if report.missing_images > 0 {
                tracing::warn!("{} images have no data", report.missing_images);
            }
            tracing::info!("File is valid!");
        }

        Commands::Pack { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension("glb"));
            convert(&input, &output, Container::Glb, &config).await?;
        }

        Commands::Unpack { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension("gltf"));
            convert(&input, &output, Container::GltfSeparate, &config).await?;
        }

        Commands::Convert {
            input,
            output,
            container,
        } => {
            let container = container.map_or(config.export.container, Container::from);
            convert(&input, &output, container, &config).await?;
        }
    }

    Ok(())
}

async fn convert(
    input: &Path,
    output: &Path,
    container: Container,
    config: &CodecConfig,
) -> Result<()> {
    if input == output {
        anyhow::bail!("Refusing to overwrite input {:?}", input);
    }
    tracing::info!("Converting {:?} -> {:?} ({:?})", input, output, container);

    let imported = load_file(input, &config.import).await?;
    let bin_path = output.with_extension("bin");
    let bin_uri = bin_path
        .file_name()
        .and_then(|name| name.to_str())
        .context("Output path has no usable file name")?;

    let (main, side) = repack::repack(&imported, container, bin_uri)?;
    tokio::fs::write(output, &main)
        .await
        .with_context(|| format!("Failed to write {:?}", output))?;
    if let Some(side) = side {
        tokio::fs::write(&bin_path, &side)
            .await
            .with_context(|| format!("Failed to write {:?}", bin_path))?;
        tracing::info!("Wrote {:?} ({} bytes)", bin_path, side.len());
    }

    tracing::info!("Done!");
    Ok(())
}
