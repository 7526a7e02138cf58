//! TerraFuse CLI - DEM fusion and earthwork analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use terrafuse_algorithms::convert::{scale_units, ConvertParams, UnitScale, METERS_TO_FEET};
use terrafuse_algorithms::cutfill::{CutFill, CutFillParams};
use terrafuse_algorithms::mosaic::{
    group_by_resolution, warp, Mosaic, MosaicParams, ResampleAlg, WarpParams,
};
use terrafuse_core::crs::Crs;
use terrafuse_core::io::{read_geotiff, read_tile, write_geotiff, GeoTiffOptions};
use terrafuse_core::raster::Bounds;
use terrafuse_core::Algorithm;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "terrafuse")]
#[command(author, version, about = "DEM fusion and earthwork analysis", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Fuse tiles into a seamless DEM with highest-resolution priority
    Mosaic {
        /// Input tile files, in priority order (later overwrites earlier)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Output pixel size (default: finest input resolution)
        #[arg(long)]
        pixel_size: Option<f64>,
        /// Resampling: nearest, bilinear
        #[arg(long, default_value = "bilinear")]
        resample: String,
        /// Reproject the result to this EPSG code
        #[arg(long)]
        target_epsg: Option<u32>,
        /// Clip to "xmin,ymin,xmax,ymax" in output coordinates
        #[arg(long)]
        bounds: Option<String>,
        /// Convert output elevations from metres to feet
        #[arg(long)]
        to_feet: bool,
        /// Fill gaps in the finest group with coarser tiles
        #[arg(long)]
        fallback_to_coarser: bool,
    },
    /// Scale elevation values by a constant factor
    Convert {
        /// Input raster file
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Multiplicative factor (ignored with --to-feet / --to-meters)
        #[arg(short, long)]
        factor: Option<f64>,
        /// Convert metres to feet
        #[arg(long, conflicts_with = "factor")]
        to_feet: bool,
        /// Convert feet to metres
        #[arg(long, conflicts_with_all = ["factor", "to_feet"])]
        to_meters: bool,
        /// Processing window size in pixels
        #[arg(long, default_value = "1024")]
        window: usize,
    },
    /// Difference two DEMs and report cut/fill volumes
    Cutfill {
        /// Existing conditions DEM
        existing: PathBuf,
        /// Proposed conditions DEM
        proposed: PathBuf,
        /// Output difference raster
        #[arg(short, long)]
        output: PathBuf,
        /// Divisor from cubic input units to reporting units (27 = cubic
        /// feet to cubic yards)
        #[arg(long, default_value = "27.0")]
        divisor: f64,
        /// Resampling: nearest, bilinear
        #[arg(long, default_value = "bilinear")]
        resample: String,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_dem(path: &PathBuf) -> Result<terrafuse_core::Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: terrafuse_core::Raster<f64> =
        read_geotiff(path, None).with_context(|| format!("Failed to read {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn write_result(raster: &terrafuse_core::Raster<f64>, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path, Some(GeoTiffOptions::default()))
        .context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_resample(s: &str) -> Result<ResampleAlg> {
    match s.to_lowercase().as_str() {
        "nearest" | "near" | "n" => Ok(ResampleAlg::Nearest),
        "bilinear" | "bi" | "b" => Ok(ResampleAlg::Bilinear),
        _ => anyhow::bail!("Unknown resampling: {}. Use nearest or bilinear.", s),
    }
}

fn parse_bounds(s: &str) -> Result<Bounds> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().context("Invalid bounds value"))
        .collect::<Result<_>>()?;
    if parts.len() != 4 {
        anyhow::bail!("Bounds must be 'xmin,ymin,xmax,ymax', got: {}", s);
    }
    let bounds = Bounds::new(parts[0], parts[1], parts[2], parts[3]);
    if bounds.is_degenerate() {
        anyhow::bail!("Bounds have no area: {}", s);
    }
    Ok(bounds)
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_dem(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len() as f64
            );
        }

        // ── Mosaic ───────────────────────────────────────────────────
        Commands::Mosaic {
            inputs,
            output,
            pixel_size,
            resample,
            target_epsg,
            bounds,
            to_feet,
            fallback_to_coarser,
        } => {
            let resample = parse_resample(&resample)?;
            let clip = bounds.as_deref().map(parse_bounds).transpose()?;

            let pb = spinner("Reading tiles...");
            let tiles = inputs
                .iter()
                .map(|p| read_tile(p).with_context(|| format!("Failed to read {}", p.display())))
                .collect::<Result<Vec<_>>>()?;
            pb.finish_and_clear();

            let groups = group_by_resolution(tiles);
            for group in &groups {
                info!("Resolution group {:.4}: {} tile(s)", group.gsd, group.tiles.len());
            }

            let start = Instant::now();
            let params = MosaicParams {
                pixel_size,
                resample,
                fallback_to_coarser,
                ..MosaicParams::default()
            };
            let mosaic = Mosaic.execute(groups, params).context("Failed to build mosaic")?;

            let mosaic = if target_epsg.is_some() || clip.is_some() {
                warp(
                    &mosaic,
                    &WarpParams {
                        target_crs: target_epsg.map(Crs::from_epsg),
                        bounds: clip,
                        pixel_size,
                        resample,
                        ..WarpParams::default()
                    },
                )
                .context("Failed to warp mosaic")?
            } else {
                mosaic
            };

            if mosaic.band_count() > 1 {
                warn!(
                    "Mosaic has {} bands; only band 1 is written",
                    mosaic.band_count()
                );
            }
            let mut result = mosaic.into_bands().remove(0);
            if to_feet {
                scale_units(&mut result, METERS_TO_FEET, &ConvertParams::default())
                    .context("Failed to convert to feet")?;
            }
            let elapsed = start.elapsed();

            write_result(&result, &output)?;
            done("Mosaic", &output, elapsed);
        }

        // ── Convert ──────────────────────────────────────────────────
        Commands::Convert {
            input,
            output,
            factor,
            to_feet,
            to_meters,
            window,
        } => {
            let factor = if to_feet {
                METERS_TO_FEET
            } else if to_meters {
                1.0 / METERS_TO_FEET
            } else {
                factor.context("Provide --factor, --to-feet, or --to-meters")?
            };

            let raster = read_dem(&input)?;
            let start = Instant::now();
            let params = ConvertParams {
                window_size: window,
                ..ConvertParams::default()
            };
            let raster = UnitScale { factor }
                .execute(raster, params)
                .context("Failed to convert units")?;
            let elapsed = start.elapsed();

            write_result(&raster, &output)?;
            done("Converted raster", &output, elapsed);
        }

        // ── Cutfill ──────────────────────────────────────────────────
        Commands::Cutfill {
            existing,
            proposed,
            output,
            divisor,
            resample,
        } => {
            let resample = parse_resample(&resample)?;
            let existing_dem = read_dem(&existing)?;
            let proposed_dem = read_dem(&proposed)?;

            let start = Instant::now();
            let params = CutFillParams {
                cubic_divisor: divisor,
                resample,
            };
            let (diff, report) = CutFill
                .execute((existing_dem, proposed_dem), params)
                .context("Failed to compute cut/fill")?;
            let elapsed = start.elapsed();

            write_result(&diff, &output)?;
            done("Difference raster", &output, elapsed);
            println!("  Compared cells: {}", report.valid_cells);
            println!("Cut Volume: {:.2} cubic yards", report.cut_magnitude());
            println!("Fill Volume: {:.2} cubic yards", report.fill);
            println!("Net Volume: {:.2} cubic yards", report.net);
        }
    }

    Ok(())
}
