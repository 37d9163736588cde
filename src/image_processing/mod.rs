pub mod background;
pub mod batch;
pub mod beautify;
pub mod canvas;
pub mod codec;
pub mod color;
pub mod frames;
pub mod orientation;
pub mod palette;
pub mod poster;
pub mod raster;
pub mod resize;
pub mod sharpen;
pub mod text;

pub use background::Background;
pub use beautify::{beautify, CompositionOptions, ShadowOptions};
pub use codec::{Codec, ExportFormat, ExportSettings, RustCodec};
pub use color::HexColor;
pub use frames::{FrameStyle, FrameTheme};
pub use orientation::rotate_quarter;
pub use palette::{extract_palette, PaletteStyle};
pub use poster::{generate_poster, PosterOptions, POSTER_HEIGHT, POSTER_WIDTH};
pub use raster::Raster;
pub use resize::{
    fit_within, resolve_crop_rect, upscale, CropFocus, CropRect, ResampleMethod, UpscaleOptions,
};
pub use sharpen::sharpen;
pub use text::load_font;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::json_output::JsonMessage;
use crate::utils::{create_output_path, create_progress_bar, format_duration};

/// Host-side settings shared by every file of a batch
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub output_dir: PathBuf,
    pub parallel_jobs: usize,
    pub json_output: bool,
    /// Turn decoded images upright according to their EXIF tag
    pub apply_exif_orientation: bool,
}

/// Outcome of one input file
#[derive(Debug, Clone, Default)]
pub struct ProcessingResult {
    pub input_path: PathBuf,
    pub output_paths: Vec<PathBuf>,
    pub palette: Vec<String>,
    pub dimensions: (u32, u32),
    pub processing_time: Duration,
}

/// Decodes inputs, runs one pipeline per file in parallel and writes outputs
pub struct ProcessingEngine {
    config: ProcessingConfig,
    codec: RustCodec,
}

impl ProcessingEngine {
    pub fn new(config: ProcessingConfig) -> Result<Self> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_jobs)
            .build_global()
            .context("Failed to initialize thread pool")?;

        let codec = if config.apply_exif_orientation {
            RustCodec::new()
        } else {
            debug!("EXIF orientation ignored");
            RustCodec::without_orientation()
        };
        Ok(Self { config, codec })
    }

    /// Read and decode one image, EXIF orientation applied
    pub fn load(&self, path: &Path) -> Result<Raster> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let raster = self
            .codec
            .decode(&bytes)
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        debug!(
            "Loaded {} ({}x{})",
            path.display(),
            raster.width(),
            raster.height()
        );
        Ok(raster)
    }

    /// Encode `raster` and write it next to the other outputs as `<stem>_<suffix>.<ext>`
    pub fn save(
        &self,
        raster: &Raster,
        input: &Path,
        suffix: &str,
        settings: &ExportSettings,
    ) -> Result<PathBuf> {
        let bytes = self
            .codec
            .encode(raster, settings)
            .with_context(|| format!("Failed to encode output for {}", input.display()))?;
        let output_path = create_output_path(
            input,
            &self.config.output_dir,
            suffix,
            settings.format.extension(),
        );
        fs::write(&output_path, bytes)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        debug!("Wrote {}", output_path.display());
        Ok(output_path)
    }

    /// Run `process_fn` over every file, reporting through a progress bar or
    /// JSON lines. Results keep the order of `files`.
    pub fn process_batch<F>(&self, files: &[PathBuf], process_fn: F) -> Vec<Result<ProcessingResult>>
    where
        F: Fn(&Path) -> Result<ProcessingResult> + Send + Sync,
    {
        let total = files.len();
        let progress_bar = if self.config.json_output {
            ProgressBar::hidden()
        } else {
            create_progress_bar(total as u64)
        };
        let json_output = self.config.json_output;

        let results = batch::process_files_parallel(
            files,
            |path| {
                let start = Instant::now();
                let mut result = process_fn(path)?;
                result.input_path = path.to_path_buf();
                result.processing_time = start.elapsed();
                Ok(result)
            },
            |completed, progress, eta| {
                let message = progress_message(progress, eta);
                if json_output {
                    JsonMessage::progress(completed, total, message);
                } else {
                    progress_bar.set_position(completed as u64);
                    progress_bar.set_message(message);
                }
            },
        );
        progress_bar.finish_and_clear();

        if json_output {
            for (path, result) in files.iter().zip(&results) {
                match result {
                    Ok(done) => JsonMessage::file_completed(done),
                    Err(e) => JsonMessage::file_failed(path, format!("{:#}", e)),
                }
            }
        }

        results
    }
}

fn progress_message(progress: f64, eta: Option<Duration>) -> String {
    match eta {
        Some(eta) => format!("{:.0}%, {} left", progress * 100.0, format_duration(eta)),
        None => format!("{:.0}%", progress * 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_engine(output_dir: PathBuf) -> ProcessingEngine {
        // The global pool may already be built by another test
        let config = ProcessingConfig {
            output_dir,
            parallel_jobs: 2,
            json_output: true,
            apply_exif_orientation: true,
        };
        ProcessingEngine {
            config,
            codec: RustCodec::new(),
        }
    }

    #[test]
    fn test_progress_message_includes_eta() {
        assert_eq!(progress_message(0.5, Some(Duration::from_secs(90))), "50%, 1m 30s left");
        assert_eq!(progress_message(1.0, Some(Duration::ZERO)), "100%, 0ms left");
        assert_eq!(progress_message(0.25, None), "25%");
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("pixelforge-engine-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let engine = test_engine(dir.clone());

        let raster = Raster::filled(6, 4, [10, 20, 30, 255]).unwrap();
        let input = dir.join("source.png");
        let written = engine
            .save(&raster, &input, "copy", &ExportSettings::default())
            .unwrap();
        assert_eq!(written, dir.join("source_copy.png"));

        let loaded = engine.load(&written).unwrap();
        assert_eq!(loaded, raster);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let engine = test_engine(std::env::temp_dir());
        let err = engine.load(Path::new("/nonexistent/pixelforge.png")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read"));
    }

    #[test]
    fn test_process_batch_keeps_order_and_failures() {
        let engine = test_engine(std::env::temp_dir());
        let files = vec![
            PathBuf::from("a.png"),
            PathBuf::from("bad.png"),
            PathBuf::from("c.png"),
        ];
        let results = engine.process_batch(&files, |path| {
            if path.to_string_lossy().contains("bad") {
                anyhow::bail!("boom");
            }
            Ok(ProcessingResult {
                dimensions: (1, 1),
                ..Default::default()
            })
        });

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().input_path, PathBuf::from("a.png"));
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().input_path, PathBuf::from("c.png"));
    }
}
