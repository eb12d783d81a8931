//! LstGis CLI - land surface temperature from Landsat 8 scenes

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use lstgis_algorithms::imagery::{
    cloud_mask, emissivity, land_surface_temperature, ndvi, vegetation_proportion,
    EmissivityParams, LstParams,
};
use lstgis_algorithms::pipeline::{LstPipeline, PipelineConfig};
use lstgis_catalog::LocalCatalog;
use lstgis_colormap::{true_color_to_rgba, LayerStyle};
use lstgis_core::io::{read_geotiff, write_geotiff, write_rgba_tiff, GeoTiffOptions};
use lstgis_core::{Raster, RasterElement};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "lstgis")]
#[command(author, version, about = "Land surface temperature from Landsat 8", long_about = None)]
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
    /// Combined cloud / cloud-shadow mask from a QA_PIXEL band (1 = clear)
    QaMask {
        /// QA_PIXEL GeoTIFF
        qa: PathBuf,
        /// Output mask
        output: PathBuf,
    },
    /// Normalized Difference Vegetation Index
    Ndvi {
        /// NIR band (Landsat 8 B5)
        #[arg(long)]
        nir: PathBuf,
        /// Red band (Landsat 8 B4)
        #[arg(long)]
        red: PathBuf,
        /// Output file
        output: PathBuf,
        /// Also write an RGBA quicklook
        #[arg(long)]
        preview: Option<PathBuf>,
    },
    /// Land surface temperature (°C) from brightness temperature and NDVI
    Lst {
        /// Brightness temperature band in Kelvin (Landsat 8 B10)
        #[arg(long)]
        thermal: PathBuf,
        /// NDVI raster
        #[arg(long)]
        ndvi: PathBuf,
        /// Output file
        output: PathBuf,
        /// NDVI lower bound for vegetation proportion (default: raster minimum)
        #[arg(long, allow_hyphen_values = true)]
        ndvi_min: Option<f64>,
        /// NDVI upper bound for vegetation proportion (default: raster maximum)
        #[arg(long, allow_hyphen_values = true)]
        ndvi_max: Option<f64>,
        /// Also write an RGBA quicklook
        #[arg(long)]
        preview: Option<PathBuf>,
    },
    /// Full pipeline over a scene catalog
    Run {
        /// Scene catalog manifest (JSON)
        #[arg(short, long)]
        catalog: PathBuf,
        /// Pipeline configuration (JSON)
        #[arg(short = 'C', long)]
        config: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "lstgis-out")]
        out: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_raster<T: RasterElement>(path: &Path) -> Result<Raster<T>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<T> = read_geotiff(path)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {} ({})", raster.cols(), raster.rows(), path.display());
    Ok(raster)
}

fn write_result<T: RasterElement>(raster: &Raster<T>, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path, Some(GeoTiffOptions::default()))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn write_preview(rgba: &[u8], raster: &Raster<f64>, path: &Path) -> Result<()> {
    write_rgba_tiff(path, rgba, raster.cols(), raster.rows())
        .with_context(|| format!("Failed to write preview {}", path.display()))
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v))
}

// ─── Commands ───────────────────────────────────────────────────────────

fn info_cmd(input: &Path) -> Result<()> {
    let raster: Raster<f64> = read_raster(input)?;
    let (rows, cols) = raster.shape();
    let bounds = raster.bounds();
    let stats = raster.statistics();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
    println!(
        "Cell size: {} ({:.2} m)",
        raster.cell_size(),
        raster.cell_size_meters()
    );
    println!(
        "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        bounds.0, bounds.1, bounds.2, bounds.3
    );
    if let Some(crs) = raster.crs() {
        println!("CRS: {}", crs);
    }
    if let Some(nodata) = raster.nodata() {
        println!("NoData: {}", nodata);
    }
    println!("\nStatistics:");
    println!("  Min: {}", fmt_opt(stats.min));
    println!("  Max: {}", fmt_opt(stats.max));
    println!("  Mean: {}", fmt_opt(stats.mean));
    if !raster.is_empty() {
        println!(
            "  Valid cells: {} ({:.1}%)",
            stats.valid_count,
            100.0 * stats.valid_count as f64 / raster.len() as f64
        );
    }
    Ok(())
}

fn lst_cmd(
    thermal: &Path,
    ndvi_path: &Path,
    output: &Path,
    ndvi_min: Option<f64>,
    ndvi_max: Option<f64>,
    preview: Option<&Path>,
) -> Result<()> {
    let bt = read_raster::<f64>(thermal)?;
    let ndvi_r = read_raster::<f64>(ndvi_path)?;

    let stats = ndvi_r.statistics();
    let (Some(min), Some(max)) = (ndvi_min.or(stats.min), ndvi_max.or(stats.max)) else {
        bail!("NDVI raster {} has no valid pixels", ndvi_path.display());
    };
    info!(ndvi_min = min, ndvi_max = max, "vegetation proportion bounds");

    let start = Instant::now();
    let pv = vegetation_proportion(&ndvi_r, min, max)
        .context("Failed to calculate vegetation proportion")?;
    let em = emissivity(&pv, EmissivityParams::default())
        .context("Failed to calculate emissivity")?;
    let lst = land_surface_temperature(&bt, &em, LstParams::default())
        .context("Failed to calculate LST")?;
    let elapsed = start.elapsed();

    write_result(&lst, output)?;
    if let Some(path) = preview {
        write_preview(&LayerStyle::lst().render(&lst), &lst, path)?;
    }
    done("LST", output, elapsed);
    Ok(())
}

fn run_cmd(catalog: &Path, config: &Path, out: &Path) -> Result<()> {
    let config = PipelineConfig::from_path(config)
        .with_context(|| format!("Failed to load config {}", config.display()))?;
    let catalog = LocalCatalog::open(catalog)
        .with_context(|| format!("Failed to open catalog {}", catalog.display()))?;
    fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;

    let start = Instant::now();
    let pb = spinner("Running LST pipeline...");
    let report = LstPipeline::new(&catalog, &config).run();
    pb.finish_and_clear();
    let report = report.context("LST pipeline failed")?;
    let elapsed = start.elapsed();

    write_result(&report.lst, &out.join("lst.tif"))?;
    write_result(&report.ndvi, &out.join("ndvi.tif"))?;
    write_result(&report.brightness_temperature, &out.join("temperature.tif"))?;

    let lst_style = LayerStyle::lst();
    let ndvi_style = LayerStyle::ndvi();
    write_preview(&lst_style.render(&report.lst), &report.lst, &out.join("lst_preview.tif"))?;
    write_preview(
        &ndvi_style.render(&report.ndvi),
        &report.ndvi,
        &out.join("ndvi_preview.tif"),
    )?;
    match report.true_color(&config.bands) {
        Some((r, g, b)) => {
            let rgba = true_color_to_rgba(r, g, b, 0.0, 0.2)
                .context("Failed to render true color")?;
            write_preview(&rgba, r, &out.join("true_color.tif"))?;
        }
        None => warn!("true-color bands not configured; skipping true_color.tif"),
    }

    let summary = report.summary(&config);
    let doc = json!({
        "summary": summary,
        "layers": [
            { "style": lst_style, "palette": lst_style.palette_hex(), "labels": lst_style.color_bar().labels() },
            { "style": ndvi_style, "palette": ndvi_style.palette_hex(), "labels": ndvi_style.color_bar().labels() },
        ],
    });
    let report_path = out.join("report.json");
    let text = serde_json::to_string_pretty(&doc).context("Failed to serialize report")?;
    fs::write(&report_path, text)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    println!("Scenes composited: {}", report.scene_count);
    println!("Transect scenes: {}", report.transect_scene_count);
    println!(
        "NDVI range: {} .. {}",
        fmt_opt(report.ndvi_range.min),
        fmt_opt(report.ndvi_range.max)
    );
    println!(
        "LST range (°C): {} .. {}",
        fmt_opt(report.lst_range.min),
        fmt_opt(report.lst_range.max)
    );
    println!("Transect samples: {}", report.transect.len());
    done("Report", &report_path, elapsed);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Info { input } => info_cmd(&input)?,

        Commands::QaMask { qa, output } => {
            let qa_r = read_raster::<u16>(&qa)?;
            let start = Instant::now();
            let mask = cloud_mask(&qa_r).context("Failed to build cloud mask")?;
            let elapsed = start.elapsed();
            let clear = mask.data().iter().filter(|&&v| v == 1).count();
            info!(clear, total = mask.len(), "clear pixels");
            write_result(&mask, &output)?;
            done("Cloud mask", &output, elapsed);
        }

        Commands::Ndvi {
            nir,
            red,
            output,
            preview,
        } => {
            let nir_r = read_raster::<f64>(&nir)?;
            let red_r = read_raster::<f64>(&red)?;
            let start = Instant::now();
            let result = ndvi(&nir_r, &red_r).context("Failed to calculate NDVI")?;
            let elapsed = start.elapsed();
            write_result(&result, &output)?;
            if let Some(path) = preview {
                write_preview(&LayerStyle::ndvi().render(&result), &result, &path)?;
            }
            done("NDVI", &output, elapsed);
        }

        Commands::Lst {
            thermal,
            ndvi,
            output,
            ndvi_min,
            ndvi_max,
            preview,
        } => lst_cmd(
            &thermal,
            &ndvi,
            &output,
            ndvi_min,
            ndvi_max,
            preview.as_deref(),
        )?,

        Commands::Run {
            catalog,
            config,
            out,
        } => run_cmd(&catalog, &config, &out)?,
    }

    Ok(())
}
