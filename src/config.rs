// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor configuration.
//!
//! Settings are read from an optional YAML file. The path comes from the
//! `LABELPAD_CONFIG` environment variable, falling back to `labelpad.yaml`
//! in the working directory. Every field has a default, so a partial file
//! (or no file at all) is fine.

use crate::models::label::{Point, Rgba};
use crate::models::store::LabelDefaults;
use crate::render::svg::DEFAULT_FONT_FAMILY;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "LABELPAD_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "labelpad.yaml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub labels: LabelConfig,
    pub export: ExportConfig,
    pub window: WindowConfig,
    pub interaction: InteractionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub default_position: Point,
    pub default_font_size: f32,
    pub default_fill: Rgba,
    /// Inclusive range offered by the font size slider.
    pub font_size_range: [f32; 2],
}

impl Default for LabelConfig {
    fn default() -> Self {
        let defaults = LabelDefaults::default();
        Self {
            default_position: defaults.position,
            default_font_size: defaults.font_size,
            default_fill: defaults.fill,
            font_size_range: [8.0, 72.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub pixel_ratio: f32,
    pub png_file_name: String,
    pub svg_file_name: String,
    pub font_family: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 2.0,
            png_file_name: "diagram.png".to_string(),
            svg_file_name: "diagram.svg".to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub side_panel_width: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            side_panel_width: 320.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pointer travel, in scene units, before a press on a label becomes a drag.
    pub drag_threshold: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self { drag_threshold: 3.0 }
    }
}

impl EditorConfig {
    /// Resolve the config file location and load it, or use defaults.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        match explicit {
            Some(path) => Self::load_from(&path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    log::debug!("No {} found, using default configuration", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("read config from '{}'", path.display()))?;
        let config = Self::from_yaml(&yaml)
            .with_context(|| format!("invalid config in '{}'", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = self.export.pixel_ratio;
        if !ratio.is_finite() || ratio < 1.0 {
            bail!("export.pixel_ratio must be at least 1, got {}", ratio);
        }
        let [min, max] = self.labels.font_size_range;
        if !(min > 0.0 && min <= max) {
            bail!("labels.font_size_range must be positive and ordered, got [{}, {}]", min, max);
        }
        if !(self.labels.default_font_size > 0.0) {
            bail!("labels.default_font_size must be positive");
        }
        let names = [&self.export.png_file_name, &self.export.svg_file_name];
        if names.iter().any(|name| name.trim().is_empty()) {
            bail!("export file names must not be empty");
        }
        if self.interaction.drag_threshold < 0.0 {
            bail!("interaction.drag_threshold must not be negative");
        }
        Ok(())
    }

    pub fn label_defaults(&self) -> LabelDefaults {
        LabelDefaults {
            position: self.labels.default_position,
            font_size: self.labels.default_font_size,
            fill: self.labels.default_fill,
        }
    }
}
