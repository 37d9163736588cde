use crate::cli::BeautifyArgs;
use crate::image_processing::{Background, CompositionOptions, ShadowOptions};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Palette size used for `--auto-background`
const AUTO_BACKGROUND_COLORS: usize = 5;

/// Saved preset: a named wrapper around the options, as written by
/// front-ends that keep several presets around
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub name: Option<String>,
    pub last_modified: Option<String>,
    pub config: CompositionOptions,
}

/// Either a preset wrapper or the bare options object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConfigDocument {
    Preset(ConfigFile),
    Bare(CompositionOptions),
}

/// Read composition options from a JSON file. Missing fields keep their
/// defaults.
pub fn load_beautify_config(path: &Path) -> Result<CompositionOptions> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    parse_beautify_config(&contents)
        .with_context(|| format!("Failed to parse config file: {:?}", path))
}

fn parse_beautify_config(contents: &str) -> Result<CompositionOptions> {
    let options = match serde_json::from_str::<ConfigDocument>(contents)? {
        ConfigDocument::Preset(preset) => {
            if let Some(name) = &preset.name {
                debug!("Using preset '{}'", name);
            }
            preset.config
        }
        ConfigDocument::Bare(options) => options,
    };
    options.validate()?;
    Ok(options)
}

impl BeautifyArgs {
    /// Options from `--config` (or defaults) with every explicit flag applied
    /// on top. Command-line values take precedence over the file.
    pub fn composition_options(&self) -> Result<CompositionOptions> {
        let mut options = match &self.config {
            Some(path) => load_beautify_config(path)?,
            None => CompositionOptions::default(),
        };
        self.merge_into(&mut options);
        options.validate().context("Invalid beautify options")?;
        Ok(options)
    }

    fn merge_into(&self, options: &mut CompositionOptions) {
        if let Some(padding) = self.padding {
            options.padding_x = padding;
            options.padding_y = padding;
        }
        if let Some(radius) = self.radius {
            options.border_radius = radius;
        }
        if let Some(frame) = self.frame {
            options.frame = frame;
        }
        if let Some(theme) = self.theme {
            options.frame_theme = theme;
        }
        if let Some(rotation) = self.rotation {
            options.rotation = rotation;
        }
        if let Some(scale) = self.scale {
            options.scale = scale;
        }
        if let Some(inset) = self.inset {
            options.inset = inset;
        }

        // Background flags are mutually exclusive on the command line
        if let Some(color) = self.background {
            options.background = Background::Solid { color };
        } else if let Some(stops) = &self.gradient {
            options.background = Background::Gradient {
                stops: stops.clone(),
            };
        } else if self.auto_background {
            options.background = Background::Extracted {
                colors: AUTO_BACKGROUND_COLORS,
                mesh: true,
            };
        }

        if self.no_shadow {
            options.shadow = ShadowOptions::none();
        } else if let Some(blur) = self.shadow_blur {
            options.shadow.blur = blur;
        }

        if self.noise {
            options.noise = true;
        }
        if self.seed.is_some() {
            options.noise_seed = self.seed;
        }

        if let Some(format) = self.io.format {
            options.export.format = format;
        }
        if let Some(quality) = self.io.quality {
            options.export.quality = quality;
        }
    }
}
