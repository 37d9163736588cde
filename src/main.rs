use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use pixelforge::cli::{
    Args, BeautifyArgs, Command, CompressArgs, IoArgs, PaletteArgs, PosterArgs, RotateArgs,
    UpscaleArgs,
};
use pixelforge::image_processing::batch::BatchSummary;
use pixelforge::image_processing::{
    beautify, extract_palette, fit_within, generate_poster, load_font, rotate_quarter, upscale,
    ExportFormat, ExportSettings, PaletteStyle, PosterOptions, ProcessingConfig,
    ProcessingEngine, ProcessingResult, UpscaleOptions,
};
use pixelforge::json_output::JsonMessage;
use pixelforge::utils::{
    discover_images, error_println, format_duration, get_file_extension, validate_inputs,
};

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(&args) {
        if args.json {
            JsonMessage::FileFailed {
                input_path: String::new(),
                error: format!("{:#}", e),
            }
            .emit();
        } else {
            error_println(&format!("{:#}", e));
        }
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    let (input, output_dir) = match &args.command {
        Command::Palette(palette) => (&palette.input, PathBuf::from(".")),
        Command::Upscale(UpscaleArgs { io, .. })
        | Command::Beautify(BeautifyArgs { io, .. })
        | Command::Poster(PosterArgs { io, .. })
        | Command::Compress(CompressArgs { io, .. })
        | Command::Rotate(RotateArgs { io, .. }) => (&io.input, io.output_dir.clone()),
    };
    let extensions = input.extensions();

    validate_inputs(&input.input_paths, &extensions)?;
    if !matches!(args.command, Command::Palette(_)) {
        fs::create_dir_all(&output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;
    }

    let config = ProcessingConfig {
        output_dir,
        parallel_jobs: if args.jobs == 0 {
            num_cpus::get()
        } else {
            args.jobs
        },
        json_output: args.json,
        apply_exif_orientation: !input.ignore_exif,
    };

    if !args.json {
        println!("{}", style("pixelforge").bold().blue());
        println!();
    }
    info!(
        "Using {} parallel jobs, output to {}",
        config.parallel_jobs,
        config.output_dir.display()
    );

    let engine = ProcessingEngine::new(config)?;
    let files = discover_images(&input.input_paths, &extensions)?;
    if files.is_empty() {
        if !args.json {
            println!(
                "{}",
                style("No images found with specified extensions").red()
            );
        }
        return Ok(());
    }
    info!("Found {} image(s)", files.len());

    let results = match &args.command {
        Command::Palette(palette) => run_palette(&engine, &files, palette)?,
        Command::Upscale(upscale_args) => run_upscale(&engine, &files, upscale_args)?,
        Command::Beautify(beautify_args) => run_beautify(&engine, &files, beautify_args)?,
        Command::Poster(poster) => run_poster(&engine, &files, poster)?,
        Command::Compress(compress) => run_compress(&engine, &files, compress)?,
        Command::Rotate(rotate) => run_rotate(&engine, &files, rotate)?,
    };

    let summary = BatchSummary::from_results(&results, start_time.elapsed());
    if args.json {
        JsonMessage::summary(
            summary.total_files,
            summary.successful,
            summary.failed,
            summary.total_duration.as_secs_f64(),
        );
    } else {
        print_results(&files, &results, &summary);
    }

    if summary.successful == 0 {
        anyhow::bail!("All {} file(s) failed", summary.total_files);
    }
    Ok(())
}

/// Encoder settings for one input: `--format` when given, otherwise the
/// input's own format, otherwise `fallback`
fn export_settings_for(io: &IoArgs, input: &Path, fallback: ExportFormat) -> ExportSettings {
    let format = io
        .format
        .or_else(|| get_file_extension(input).and_then(|ext| ext.parse().ok()))
        .unwrap_or(fallback);
    let mut settings = ExportSettings {
        format,
        ..ExportSettings::default()
    };
    if let Some(quality) = io.quality {
        settings.quality = quality;
    }
    settings
}

fn check_quality(io: &IoArgs) -> Result<()> {
    if let Some(quality) = io.quality {
        ExportSettings {
            quality,
            ..ExportSettings::default()
        }
        .validate()?;
    }
    Ok(())
}

fn run_palette(
    engine: &ProcessingEngine,
    files: &[PathBuf],
    args: &PaletteArgs,
) -> Result<Vec<Result<ProcessingResult>>> {
    let style_filter: PaletteStyle = args.style;
    Ok(engine.process_batch(files, |path| {
        let raster = engine.load(path)?;
        let palette = extract_palette(&raster, args.colors, style_filter)?;
        if palette.is_empty() {
            warn!("{} has no opaque pixels, palette is empty", path.display());
        }
        Ok(ProcessingResult {
            palette,
            dimensions: raster.dimensions(),
            ..Default::default()
        })
    }))
}

fn run_upscale(
    engine: &ProcessingEngine,
    files: &[PathBuf],
    args: &UpscaleArgs,
) -> Result<Vec<Result<ProcessingResult>>> {
    check_quality(&args.io)?;
    let options = UpscaleOptions {
        scale_factor: args.scale,
        method: args.method,
        aspect_ratio: args.aspect,
        crop_focus: args.focus,
        crop_size: args.crop_size,
        sharpen_amount: args.sharpen,
    };
    options.validate()?;

    Ok(engine.process_batch(files, |path| {
        let raster = engine.load(path)?;
        let output = upscale(&raster, &options)?;
        let settings = export_settings_for(&args.io, path, ExportFormat::Png);
        let output_path = engine.save(&output, path, "upscaled", &settings)?;
        Ok(ProcessingResult {
            output_paths: vec![output_path],
            dimensions: output.dimensions(),
            ..Default::default()
        })
    }))
}

fn run_beautify(
    engine: &ProcessingEngine,
    files: &[PathBuf],
    args: &BeautifyArgs,
) -> Result<Vec<Result<ProcessingResult>>> {
    let options = args.composition_options()?;
    info!(
        "Beautify: {} frame, padding {}x{}, radius {}",
        options.frame, options.padding_x, options.padding_y, options.border_radius
    );

    Ok(engine.process_batch(files, |path| {
        let raster = engine.load(path)?;
        let output = beautify(&raster, &options)?;
        let output_path = engine.save(&output, path, "beautified", &options.export)?;
        Ok(ProcessingResult {
            output_paths: vec![output_path],
            dimensions: output.dimensions(),
            ..Default::default()
        })
    }))
}

fn run_poster(
    engine: &ProcessingEngine,
    files: &[PathBuf],
    args: &PosterArgs,
) -> Result<Vec<Result<ProcessingResult>>> {
    check_quality(&args.io)?;
    let font = load_font(&args.font)
        .with_context(|| format!("Failed to load font '{}'", args.font))?;
    let options = PosterOptions {
        caption: args.caption.clone(),
        ..PosterOptions::default()
    };

    Ok(engine.process_batch(files, |path| {
        let raster = engine.load(path)?;
        let palette = extract_palette(&raster, args.colors, PaletteStyle::All)?;
        let output = generate_poster(&raster, &palette, &options, Some(&font))?;
        let settings = export_settings_for(&args.io, path, ExportFormat::Png);
        let output_path = engine.save(&output, path, "poster", &settings)?;
        Ok(ProcessingResult {
            output_paths: vec![output_path],
            palette,
            dimensions: output.dimensions(),
            ..Default::default()
        })
    }))
}

fn run_compress(
    engine: &ProcessingEngine,
    files: &[PathBuf],
    args: &CompressArgs,
) -> Result<Vec<Result<ProcessingResult>>> {
    check_quality(&args.io)?;
    Ok(engine.process_batch(files, |path| {
        let raster = engine.load(path)?;
        let output = fit_within(&raster, args.max_width, args.max_height)?;
        // Re-encoding to the lossy format is the point of compressing
        let settings = ExportSettings {
            format: args.io.format.unwrap_or(ExportFormat::Jpeg),
            ..export_settings_for(&args.io, path, ExportFormat::Jpeg)
        };
        let output_path = engine.save(&output, path, "compressed", &settings)?;
        Ok(ProcessingResult {
            output_paths: vec![output_path],
            dimensions: output.dimensions(),
            ..Default::default()
        })
    }))
}

fn run_rotate(
    engine: &ProcessingEngine,
    files: &[PathBuf],
    args: &RotateArgs,
) -> Result<Vec<Result<ProcessingResult>>> {
    check_quality(&args.io)?;
    if args.degrees % 90 != 0 {
        anyhow::bail!("Rotation must be a multiple of 90 degrees, got {}", args.degrees);
    }
    Ok(engine.process_batch(files, |path| {
        let raster = engine.load(path)?;
        let output = rotate_quarter(&raster, args.degrees)?;
        let settings = export_settings_for(&args.io, path, ExportFormat::Png);
        let output_path = engine.save(&output, path, "rotated", &settings)?;
        Ok(ProcessingResult {
            output_paths: vec![output_path],
            dimensions: output.dimensions(),
            ..Default::default()
        })
    }))
}

fn print_results(files: &[PathBuf], results: &[Result<ProcessingResult>], summary: &BatchSummary) {
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(done) if !done.palette.is_empty() && done.output_paths.is_empty() => {
                let swatches: Vec<String> = done
                    .palette
                    .iter()
                    .map(|hex| style(hex).bold().to_string())
                    .collect();
                println!("  {} {}", style(path.display()).cyan(), swatches.join(" "));
            }
            Ok(done) => {
                for output in &done.output_paths {
                    println!(
                        "  {} {} ({}x{}, {})",
                        style("✓").green(),
                        output.display(),
                        done.dimensions.0,
                        done.dimensions.1,
                        format_duration(done.processing_time)
                    );
                }
            }
            Err(e) => {
                println!("  {} {}: {:#}", style("✗").red(), path.display(), e);
            }
        }
    }

    println!();
    println!("{}", style("Results Summary:").bold().green());
    println!(
        "  Successfully processed: {}",
        style(summary.successful).bold().green()
    );
    if summary.failed > 0 {
        println!("  Failed: {}", style(summary.failed).bold().red());
    }
    println!(
        "  Success rate: {}",
        style(format!("{:.1}%", summary.success_rate())).bold()
    );
    println!(
        "  Total time: {}",
        style(format_duration(summary.total_duration)).bold()
    );
}
