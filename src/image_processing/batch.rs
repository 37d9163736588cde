use anyhow::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Batch processing statistics and progress tracking
pub struct BatchProcessor {
    pub total_files: usize,
    pub processed_count: AtomicUsize,
    pub start_time: Instant,
}

impl BatchProcessor {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            processed_count: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Increment processed count and return current count
    pub fn increment(&self) -> usize {
        self.processed_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get current progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_files == 0 {
            1.0
        } else {
            (self.processed_count.load(Ordering::Relaxed) as f64) / (self.total_files as f64)
        }
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Option<Duration> {
        let processed = self.processed_count.load(Ordering::Relaxed);
        if processed == 0 {
            return None;
        }

        let elapsed = self.start_time.elapsed();
        let remaining = self.total_files.saturating_sub(processed);

        if remaining == 0 {
            return Some(Duration::new(0, 0));
        }

        let time_per_item = elapsed / processed as u32;
        Some(time_per_item * remaining as u32)
    }
}

/// Process multiple files in parallel
pub fn process_files_parallel<T, F, P>(
    files: &[PathBuf],
    process_fn: F,
    progress_callback: P,
) -> Vec<Result<T>>
where
    T: Send,
    F: Fn(&Path) -> Result<T> + Send + Sync,
    P: Fn(usize, f64, Option<Duration>) + Send + Sync,
{
    let processor = BatchProcessor::new(files.len());

    files
        .par_iter()
        .map(|file_path| {
            let result = process_fn(file_path);

            let completed = processor.increment();
            let progress = processor.progress();
            let eta = processor.eta();

            progress_callback(completed, progress, eta);

            result
        })
        .collect()
}

/// Totals reported once a batch finishes
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_duration: Duration,
}

impl BatchSummary {
    pub fn from_results<T>(results: &[Result<T>], total_duration: Duration) -> Self {
        let successful = results.iter().filter(|r| r.is_ok()).count();
        Self {
            total_files: results.len(),
            successful,
            failed: results.len() - successful,
            total_duration,
        }
    }

    /// Percentage of files that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.successful as f64 / self.total_files as f64) * 100.0
        }
    }
}
