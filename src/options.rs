//! Flattening and packing options, loadable from a TOML file.
//!
//! ```toml
//! merge_duplicates = true
//! border_padding = 1
//! spacing = 2
//!
//! [layers]
//! only_visible_layers = true
//! include_background_layer = false
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{name} = {value} is above the limit of {max}")]
    OutOfRange {
        name: &'static str,
        value: u32,
        max: u32,
    },
}

/// Largest accepted padding or spacing, in pixels
pub const MAX_PADDING: u32 = 4096;

/// Which cels take part in flattening a frame
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenOptions {
    /// Skip layers that are hidden, directly or through a hidden group
    pub only_visible_layers: bool,
    pub include_background_layer: bool,
    pub include_tilemap_cels: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            only_visible_layers: true,
            include_background_layer: false,
            include_tilemap_cels: true,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetOptions {
    pub layers: FlattenOptions,
    /// Pack pixel-identical frames once
    pub merge_duplicates: bool,
    /// Empty pixels around the whole sheet
    pub border_padding: u32,
    /// Empty pixels between neighbouring cells
    pub spacing: u32,
    /// Empty pixels around each frame inside its cell
    pub inner_padding: u32,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            layers: FlattenOptions::default(),
            merge_duplicates: true,
            border_padding: 0,
            spacing: 0,
            inner_padding: 0,
        }
    }
}

impl SheetOptions {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(s)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("border_padding", self.border_padding),
            ("spacing", self.spacing),
            ("inner_padding", self.inner_padding),
        ] {
            if value > MAX_PADDING {
                return Err(ConfigError::OutOfRange {
                    name,
                    value,
                    max: MAX_PADDING,
                });
            }
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
