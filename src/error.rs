//! # Error Handling
//!
//! This module defines the centralized error type for `vrt-mosaic`. It uses
//! the `thiserror` library to describe every failure a mosaic build can hit,
//! with enough context in each variant to point the user at the offending
//! file or value.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum covering all failure modes. The variants fall
//!   into four families:
//!   - empty input (no tiles were supplied),
//!   - invalid configuration (unknown resolution keyword, bad config file,
//!     path preconditions),
//!   - inconsistency between a tile and the reference tile (CRS or band
//!     count), always naming the offending file and both values,
//!   - I/O and decoding failures propagated from the metadata reader or the
//!     document writer.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Every error is fatal to a build. Nothing is retried and no partial
//! document is left on disk.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for vrt-mosaic operations
#[derive(Error, Debug)]
pub enum Error {
    /// No tiles were supplied to the build.
    #[error("There should be at least 1 file to create a vrt")]
    EmptyInput,

    /// The resolution selection is neither a known keyword nor a numeric pair.
    #[error("Invalid resolution \"{value}\": use one of average, highest, lowest or an explicit \"XRES,YRES\" pair")]
    InvalidResolution { value: String },

    /// A tile does not share the CRS of the first tile.
    #[error("The crs ({found}) from file \"{}\" does not match the global one ({expected})", path.display())]
    CrsMismatch {
        path: PathBuf,
        found: String,
        expected: String,
    },

    /// In mosaic mode, a tile does not have the band count of the first tile.
    #[error("The band count ({found}) from file \"{}\" does not match the global one ({expected})", path.display())]
    BandCountMismatch {
        path: PathBuf,
        found: usize,
        expected: usize,
    },

    /// A sample format / bit depth combination has no pixel type.
    #[error("Unsupported pixel type in \"{}\": {code}", path.display())]
    UnsupportedPixelType { path: PathBuf, code: String },

    /// A tile could not be opened or does not carry usable georeferencing.
    #[error("Cannot read raster metadata from \"{}\": {message}", path.display())]
    Metadata { path: PathBuf, message: String },

    /// An error occurred while parsing a mosaic configuration file.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An error occurred with a path-related operation.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A TIFF decoding error, wrapped from `tiff::TiffError`.
    #[error("TIFF decoding error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// An XML tree or serialization error, wrapped from `xot::Error`.
    #[error("XML serialization error: {0}")]
    Xml(#[from] xot::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
