//! JSON lines output
//!
//! With `--json` every progress update, per-file result and the final
//! summary are emitted as one JSON object per line on stdout, and the styled
//! console output is suppressed.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::image_processing::ProcessingResult;

/// Last progress emission timestamp (milliseconds since epoch)
/// Used for throttling progress updates to ~25 FPS (40ms between updates)
static LAST_PROGRESS_MS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonMessage {
    /// Progress update
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    /// File processing completed
    FileCompleted {
        input_path: String,
        output_paths: Vec<String>,
        width: u32,
        height: u32,
        processing_time_ms: u64,
    },
    /// Extracted palette of one file
    Palette {
        input_path: String,
        colors: Vec<String>,
    },
    /// File processing failed
    FileFailed { input_path: String, error: String },
    /// Processing summary
    Summary {
        total_files: usize,
        processed: usize,
        failed: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Create and emit progress message, throttled to one every 40ms.
    /// The final update (current == total) is always emitted.
    pub fn progress(current: usize, total: usize, message: impl Into<String>) {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let last_ms = LAST_PROGRESS_MS.load(Ordering::Relaxed);

        if now_ms.saturating_sub(last_ms) >= 40 || current == total {
            LAST_PROGRESS_MS.store(now_ms, Ordering::Relaxed);
            Self::Progress {
                current,
                total,
                message: message.into(),
            }
            .emit();
        }
    }

    /// Per-file message: a palette line when colors were extracted,
    /// a completion line otherwise
    pub fn for_result(result: &ProcessingResult) -> Self {
        let input_path = result.input_path.display().to_string();
        if result.output_paths.is_empty() && !result.palette.is_empty() {
            return Self::Palette {
                input_path,
                colors: result.palette.clone(),
            };
        }
        Self::FileCompleted {
            input_path,
            output_paths: result
                .output_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            width: result.dimensions.0,
            height: result.dimensions.1,
            processing_time_ms: result.processing_time.as_millis() as u64,
        }
    }

    /// Create and emit file completed message
    pub fn file_completed(result: &ProcessingResult) {
        Self::for_result(result).emit();
    }

    /// Create and emit file failed message
    pub fn file_failed(input_path: &Path, error: impl Into<String>) {
        Self::FileFailed {
            input_path: input_path.display().to_string(),
            error: error.into(),
        }
        .emit();
    }

    /// Create and emit summary message
    pub fn summary(total_files: usize, processed: usize, failed: usize, duration_secs: f64) {
        Self::Summary {
            total_files,
            processed,
            failed,
            duration_secs,
        }
        .emit();
    }
}
