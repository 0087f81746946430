use clap::{Parser, Subcommand};
use octodither::palette::{self, GRAY16};
use octodither::{Color, Quantizer, BLACK, MAX_PALETTE_COLORS, WHITE};
use std::error::Error;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Octree palettes and error-diffusion dithering
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print or save a palette
    Palette {
        #[command(subcommand)]
        kind: PaletteKind,
        /// Write the palette to this file instead of stdout
        #[arg(short, long, global = true)]
        output: Option<PathBuf>,
    },
    /// Dither an image against a palette
    Dither {
        /// Input image path
        img: PathBuf,
        /// Palette file, black and white if omitted
        palette: Option<PathBuf>,
        /// Build the palette from the image itself with at most N colors
        #[arg(long, value_name = "N", conflicts_with = "palette")]
        adaptive: Option<usize>,
        /// Output image path [default: dither-<IMG>]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Map every pixel to its nearest palette color without dithering
    Remap {
        /// Input image path
        img: PathBuf,
        /// Palette file, the 16-level gray table if omitted
        palette: Option<PathBuf>,
        /// Output image path [default: remap-<IMG>]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PaletteKind {
    /// Evenly spaced grays, 2^BITS entries
    Gray { bits: usize },
    /// Even RGB grid, 2^(3*BITS) entries
    Color { bits: usize },
    /// Best matching palette for an image
    Build {
        img: PathBuf,
        #[arg(default_value_t = MAX_PALETTE_COLORS)]
        max_colors: usize,
    },
}

fn prefixed(img: &Path, prefix: &str) -> PathBuf {
    let name = img.file_name().unwrap_or(img.as_os_str()).to_string_lossy();
    img.with_file_name(format!("{prefix}{name}"))
}

fn load_palette(
    path: Option<&Path>,
    default: &[Color],
) -> Result<Vec<Color>, Box<dyn Error>> {
    Ok(match path {
        Some(path) => palette::read(path)?,
        None => default.to_vec(),
    })
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Palette { kind, output } => {
            let colors = match kind {
                PaletteKind::Gray { bits } => palette::gray(bits)?,
                PaletteKind::Color { bits } => palette::color(bits)?,
                PaletteKind::Build { img, max_colors } => {
                    Quantizer::open(&img)?.adaptive_palette(max_colors)?
                }
            };
            match output {
                Some(path) => {
                    let mut w = BufWriter::new(File::create(path)?);
                    palette::write(&mut w, &colors)?;
                    w.flush()?;
                }
                None => palette::write(&mut stdout().lock(), &colors)?,
            }
        }
        Command::Dither {
            img,
            palette,
            adaptive,
            output,
        } => {
            let mut quantizer = Quantizer::open(&img)?;
            let colors = match adaptive {
                Some(max_colors) => quantizer.adaptive_palette(max_colors)?,
                None => load_palette(palette.as_deref(), &[BLACK, WHITE])?,
            };
            quantizer.dither(&colors)?;
            let output = output.unwrap_or_else(|| prefixed(&img, "dither-"));
            quantizer.save(&output)?;
            eprintln!("Saved {}", output.display());
        }
        Command::Remap {
            img,
            palette,
            output,
        } => {
            let mut quantizer = Quantizer::open(&img)?;
            let colors = load_palette(palette.as_deref(), &GRAY16)?;
            quantizer.remap(&colors)?;
            let output = output.unwrap_or_else(|| prefixed(&img, "remap-"));
            quantizer.save(&output)?;
            eprintln!("Saved {}", output.display());
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = run(args.command) {
        eprintln!("octodither: {e}");
        std::process::exit(1);
    }
}
