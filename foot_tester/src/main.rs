use anyhow::{Context, Result};
use clap::Parser;
use foot_vision::core_modules::sizing::{self, SizeGroup, SizeRecommendation};
use foot_vision::{FootPipeline, MeasurementConfig, MeasurementReport, RectifiedImage, SheetSize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Measure a foot photographed on a reference sheet and suggest shoe sizes
#[derive(Parser, Debug)]
#[command(name = "foot_tester")]
#[command(about = "Measure a foot from a rectified top-down photo", long_about = None)]
struct Args {
    /// Rectified image of the sheet with the foot on it
    #[arg(short, long)]
    input: PathBuf,

    /// Directory for the JSON record and the mask images
    #[arg(short, long, default_value = "result")]
    output_dir: PathBuf,

    /// Reference sheet the image spans (overrides the config file)
    #[arg(short, long, value_enum)]
    sheet: Option<SheetArg>,

    /// JSON file with a MeasurementConfig; missing fields take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Intensity at or below which a pixel counts as foot
    #[arg(long)]
    threshold: Option<u8>,

    /// Side of the square morphology kernel in pixels
    #[arg(long)]
    kernel_size: Option<u32>,

    /// Spacing of the width samples in millimeters
    #[arg(long)]
    interval_mm: Option<f64>,

    /// Size chart to recommend from
    #[arg(short, long, value_enum, default_value = "auto")]
    group: GroupArg,

    /// Skip writing the mask images
    #[arg(long)]
    no_masks: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SheetArg {
    A4,
    Letter,
    A3,
}

impl From<SheetArg> for SheetSize {
    fn from(arg: SheetArg) -> Self {
        match arg {
            SheetArg::A4 => SheetSize::A4,
            SheetArg::Letter => SheetSize::Letter,
            SheetArg::A3 => SheetSize::A3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum GroupArg {
    Auto,
    Men,
    Women,
    Kids,
}

impl GroupArg {
    fn size_group(self) -> Option<SizeGroup> {
        match self {
            GroupArg::Auto => None,
            GroupArg::Men => Some(SizeGroup::Men),
            GroupArg::Women => Some(SizeGroup::Women),
            GroupArg::Kids => Some(SizeGroup::Kids),
        }
    }
}

fn setup_logging(base_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(base_level))
        .with_context(|| format!("invalid log filter '{base_level}'"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("logger initialization failed: {e}"))
}

fn load_config(args: &Args) -> Result<MeasurementConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => MeasurementConfig::default(),
    };

    if let Some(sheet) = args.sheet {
        config.sheet = sheet.into();
    }
    if let Some(threshold) = args.threshold {
        config.intensity_threshold = threshold;
    }
    if let Some(kernel_size) = args.kernel_size {
        config.kernel_size = kernel_size;
    }
    if let Some(interval_mm) = args.interval_mm {
        config.measurement_interval_mm = interval_mm;
    }
    Ok(config)
}

fn print_width_profile(report: &MeasurementReport) {
    let result = &report.result;
    println!("\nFoot length: {:.1} mm", result.foot_length_mm);
    match result.max_width {
        Some(max) => println!(
            "Max width:   {:.1} mm at {:.1} mm from the toe",
            max.width_mm, max.distance_from_toe_mm
        ),
        None => println!("Max width:   undefined (no width samples)"),
    }
    if let Some(mean) = result.mean_width_mm {
        println!("Mean width:  {mean:.1} mm");
    }
    println!(
        "Heel correction: {}",
        if result.heel_correction_applied { "applied" } else { "skipped" }
    );

    println!("\n{:>14} {:>12} {:>12}", "Distance (mm)", "Width (mm)", "Width (cm)");
    for sample in &result.samples {
        println!(
            "{:>14.1} {:>12.1} {:>12.2}",
            sample.distance_from_toe_mm,
            sample.width_mm,
            sample.width_mm / 10.0
        );
    }
}

fn print_recommendation(rec: &SizeRecommendation) {
    println!("\n{} sizes for a {:.1} mm foot:", rec.group, rec.foot_length_mm);
    println!("  CN {}  EU {}  US {}  UK {}", rec.sizes.cn, rec.sizes.eu, rec.sizes.us, rec.sizes.uk);
    if let Some(jp) = rec.sizes.jp {
        println!("  JP {jp}");
    }
    if let Some(kr) = rec.sizes.kr {
        println!("  KR {kr:.0}");
    }
    println!(
        "  Width: {} ({}), ratio {:.3}: {}",
        rec.width.width_type.label(),
        rec.width.code,
        rec.width.ratio,
        rec.width.width_type.suggestion()
    );
    if let Some(adjustment) = rec.adjustment {
        println!("  Note: {adjustment}");
    }
}

fn write_outputs(report: &MeasurementReport, output_dir: &Path, write_masks: bool) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

    let json_path = output_dir.join("foot_measurements.json");
    let json = report.to_record().to_json_pretty().context("failed to serialize measurements")?;
    fs::write(&json_path, json).with_context(|| format!("failed to write {}", json_path.display()))?;
    info!(path = %json_path.display(), "measurements saved");

    if write_masks {
        for (name, mask) in [
            ("foot_mask.png", &report.raw_mask),
            ("modified_foot_mask.png", &report.corrected_mask),
        ] {
            let path = output_dir.join(name);
            mask.to_gray_image()
                .save(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "mask saved");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level)?;

    let config = load_config(&args)?;
    let pipeline = FootPipeline::new(config).context("invalid measurement configuration")?;

    println!("Foot Vision - Measurement Runner");
    println!("================================");
    println!("Input: {}", args.input.display());
    println!("Sheet: {}", pipeline.config().sheet);
    println!("Output: {}", args.output_dir.display());

    let decoded = image::open(&args.input)
        .with_context(|| format!("failed to open image {}", args.input.display()))?;
    let image = RectifiedImage::from_dynamic(decoded, pipeline.config().sheet);
    info!(width = image.width(), height = image.height(), "image loaded");

    let report = pipeline
        .measure(&image)
        .with_context(|| format!("measurement failed for {}", args.input.display()))?;

    print_width_profile(&report);
    write_outputs(&report, &args.output_dir, !args.no_masks)?;

    let Some(max) = report.result.max_width else {
        warn!("no width samples, size recommendation skipped");
        return Ok(());
    };
    match args.group.size_group() {
        Some(group) => {
            let rec = sizing::recommend(group, report.result.foot_length_mm, max.width_mm)?;
            print_recommendation(&rec);
        }
        None => {
            let size_report = sizing::size_report(report.result.foot_length_mm, max.width_mm)?;
            println!();
            print!("{size_report}");
            let suggested = match size_report.suggested {
                SizeGroup::Men => &size_report.men,
                SizeGroup::Women => &size_report.women,
                SizeGroup::Kids => size_report.kids.as_ref().unwrap_or(&size_report.women),
            };
            print_recommendation(suggested);
        }
    }

    Ok(())
}
