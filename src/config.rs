//! # Mosaic Configuration Files
//!
//! A mosaic can be described once in a YAML file and rebuilt with
//! `vrt-mosaic build --config mosaic.yaml`:
//!
//! ```yaml
//! output: mosaic.vrt
//! inputs: ["tiles/*.tif", "extra/"]
//! relative: true
//! mode: mosaic        # or stack
//! resolution: average # highest | lowest | [6.0, 6.0]
//! ```
//!
//! Only `output` and `inputs` are required. Relative `output` and `inputs`
//! entries are resolved against the directory holding the file, so a
//! configuration behaves the same regardless of where the tool is run.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::path::expand_inputs;
use crate::plan::Mode;
use crate::resolution::Resolution;

/// A parsed mosaic configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MosaicConfig {
    /// Destination of the VRT document.
    pub output: PathBuf,
    /// Tile paths, directories or glob patterns, in source order.
    pub inputs: Vec<String>,
    /// Write source paths relative to the document.
    #[serde(default)]
    pub relative: bool,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub resolution: Resolution,
    /// Directory relative entries are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl MosaicConfig {
    /// Parse a configuration from YAML text.
    pub fn parse(yaml_content: &str) -> Result<Self> {
        let config: MosaicConfig =
            serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
                message: e.to_string(),
                hint: Some(
                    "expected the keys output, inputs and optionally relative, mode, resolution"
                        .to_string(),
                ),
            })?;

        if config.inputs.is_empty() {
            return Err(Error::ConfigParse {
                message: "inputs is empty".to_string(),
                hint: Some("list at least one tile, directory or glob pattern".to_string()),
            });
        }
        Ok(config)
    }

    /// Read and parse a configuration file, anchoring relative entries at
    /// the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut config = Self::parse(&content)?;
        config.base_dir = Some(
            path.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        );
        Ok(config)
    }

    /// Destination path, anchored at the configuration directory.
    pub fn output_path(&self) -> PathBuf {
        match &self.base_dir {
            Some(base) if self.output.is_relative() => base.join(&self.output),
            _ => self.output.clone(),
        }
    }

    /// Expand `inputs` into tile paths, anchored at the configuration
    /// directory.
    pub fn tile_paths(&self) -> Result<Vec<PathBuf>> {
        expand_inputs(&self.inputs, self.base_dir.as_deref())
    }
}
