//! MemeForge CLI — caption an image and export it.
//!
//! Usage:
//!   memeforge render <IMAGE> [OPTIONS]   Caption an image and save a PNG
//!   memeforge info <IMAGE>               Show image and layout information
//!   memeforge config [--write]           Show or write the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "memeforge",
    about = "Top/bottom caption meme compositor",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Caption an image and export it as PNG
    Render {
        /// Source image (PNG, JPEG, GIF, WebP, BMP)
        image: PathBuf,

        /// Top caption
        #[arg(long)]
        top: Option<String>,

        /// Bottom caption
        #[arg(long)]
        bottom: Option<String>,

        /// Font size in image pixels, applied to both captions
        #[arg(long)]
        font_size: Option<f32>,

        /// Fill color as hex (#RGB, #RRGGBB, #RRGGBBAA)
        #[arg(long)]
        color: Option<String>,

        /// Outline color as hex
        #[arg(long)]
        stroke: Option<String>,

        /// Outline width in image pixels (0 disables the outline)
        #[arg(long)]
        stroke_width: Option<f32>,

        /// Top caption baseline, percent of image height
        #[arg(long)]
        top_y: Option<f32>,

        /// Bottom caption baseline, percent of image height
        #[arg(long)]
        bottom_y: Option<f32>,

        /// Export scale factor (defaults to the configured scale)
        #[arg(long)]
        scale: Option<u32>,

        /// Output directory (defaults to the configured directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TrueType/OpenType font file
        #[arg(long)]
        font: Option<PathBuf>,
    },

    /// Show image dimensions, preview and export sizes
    Info {
        /// Source image
        image: PathBuf,

        /// Sample caption to lay out
        #[arg(long, default_value = "SAMPLE TEXT")]
        caption: String,
    },

    /// Show the effective configuration
    Config {
        /// Write the configuration to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = memeforge_common::config::AppConfig::load();

    // Initialize logging
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    memeforge_common::logging::init_logging(&config.logging);

    let outcome = match cli.command {
        Commands::Render {
            image,
            top,
            bottom,
            font_size,
            color,
            stroke,
            stroke_width,
            top_y,
            bottom_y,
            scale,
            output,
            font,
        } => {
            let args = commands::render::RenderArgs {
                image,
                top,
                bottom,
                font_size,
                color,
                stroke,
                stroke_width,
                top_y,
                bottom_y,
                scale,
                output,
                font,
            };
            commands::render::run(config, args).await
        }
        Commands::Info { image, caption } => commands::info::run(config, image, caption).await,
        Commands::Config { write } => commands::config::run(&config, write),
    };
    outcome?;
    Ok(())
}
