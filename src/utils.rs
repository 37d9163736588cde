use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

/// Create a styled progress bar
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Check that every input exists and at least one extension is allowed
pub fn validate_inputs(input_paths: &[PathBuf], extensions: &[String]) -> Result<()> {
    for input_path in input_paths {
        if !input_path.exists() {
            return Err(anyhow::anyhow!(
                "Input path does not exist: {}",
                input_path.display()
            ));
        }
        if !input_path.is_dir() && !input_path.is_file() {
            return Err(anyhow::anyhow!(
                "Input path is neither a file nor a directory: {}",
                input_path.display()
            ));
        }
    }

    if extensions.is_empty() {
        return Err(anyhow::anyhow!("No valid extensions specified"));
    }

    Ok(())
}

/// Get file extension in lowercase
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a file has one of the specified extensions
pub fn has_valid_extension(path: &Path, extensions: &[String]) -> bool {
    if let Some(ext) = get_file_extension(path) {
        extensions.contains(&ext)
    } else {
        false
    }
}

/// Collect image files from files and directories, sorted for a stable order.
/// Explicitly named files are accepted regardless of extension.
pub fn discover_images(input_paths: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut image_files = Vec::new();

    for input_path in input_paths {
        if input_path.is_file() {
            image_files.push(input_path.clone());
            continue;
        }

        debug!("Scanning directory: {}", input_path.display());
        let walker = WalkDir::new(input_path).follow_links(false).max_depth(10);
        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if path.is_file() && has_valid_extension(path, extensions) {
                image_files.push(path.to_path_buf());
            }
        }
    }

    image_files.sort();
    image_files.dedup();
    debug!("Found {} image files", image_files.len());
    Ok(image_files)
}

/// Generate a safe filename by removing/replacing invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// `<output_dir>/<stem>_<suffix>.<extension>`
pub fn create_output_path(input: &Path, output_dir: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .map(sanitize_filename)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string());
    output_dir.join(format!("{}_{}.{}", stem, suffix, extension))
}

/// Print error message
pub fn error_println(message: &str) {
    eprintln!("{} {}", style("[ERROR]").red().bold(), message);
}
