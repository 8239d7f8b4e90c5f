//! # Tile Metadata
//!
//! Value types describing a single georeferenced raster tile, and the
//! [`MetadataReader`] seam through which a build obtains them.
//!
//! A [`TileMetadata`] is read once per input path, consumed by the planner,
//! and dropped. Nothing in it is ever mutated after the reader returns it.
//!
//! Two readers ship with the crate:
//!
//! - [`GeoTiffReader`](crate::geotiff::GeoTiffReader) decodes GeoTIFF tags
//!   from files on disk.
//! - [`MemoryReader`] serves metadata from a map, for tests and for callers
//!   that already hold the metadata from elsewhere.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

/// Bounding extent of a tile in CRS units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Bounds {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Smallest extent covering both `self` and `other`.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }

    /// Whether `other` lies entirely inside `self` (edges included).
    pub fn contains(&self, other: &Bounds) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.bottom >= self.bottom
            && other.top <= self.top
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.bottom, self.right, self.top
        )
    }
}

/// Pixel data type of a band, spelled the way VRT documents expect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PixelType {
    Byte,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    Float64,
    CInt16,
    CInt32,
    CFloat32,
    CFloat64,
}

// TIFF SampleFormat codes
const SAMPLE_FORMAT_UINT: u16 = 1;
const SAMPLE_FORMAT_INT: u16 = 2;
const SAMPLE_FORMAT_IEEEFP: u16 = 3;
const SAMPLE_FORMAT_COMPLEX_INT: u16 = 5;
const SAMPLE_FORMAT_COMPLEX_IEEEFP: u16 = 6;

impl PixelType {
    /// Map a TIFF `SampleFormat` code and `BitsPerSample` value to a pixel type.
    ///
    /// Sub-byte unsigned samples (1 to 7 bits) are exposed as `Byte`. Complex
    /// formats count the bits of the whole sample, so `CInt16` is 32 bits.
    /// Any other combination is rejected with [`Error::UnsupportedPixelType`].
    pub fn from_sample(path: &Path, format: u16, bits: u16) -> Result<Self> {
        let pixel_type = match (format, bits) {
            (SAMPLE_FORMAT_UINT, 1..=8) => PixelType::Byte,
            (SAMPLE_FORMAT_INT, 8) => PixelType::Int8,
            (SAMPLE_FORMAT_UINT, 16) => PixelType::UInt16,
            (SAMPLE_FORMAT_INT, 16) => PixelType::Int16,
            (SAMPLE_FORMAT_UINT, 32) => PixelType::UInt32,
            (SAMPLE_FORMAT_INT, 32) => PixelType::Int32,
            (SAMPLE_FORMAT_UINT, 64) => PixelType::UInt64,
            (SAMPLE_FORMAT_INT, 64) => PixelType::Int64,
            (SAMPLE_FORMAT_IEEEFP, 32) => PixelType::Float32,
            (SAMPLE_FORMAT_IEEEFP, 64) => PixelType::Float64,
            (SAMPLE_FORMAT_COMPLEX_INT, 32) => PixelType::CInt16,
            (SAMPLE_FORMAT_COMPLEX_INT, 64) => PixelType::CInt32,
            (SAMPLE_FORMAT_COMPLEX_IEEEFP, 64) => PixelType::CFloat32,
            (SAMPLE_FORMAT_COMPLEX_IEEEFP, 128) => PixelType::CFloat64,
            _ => {
                return Err(Error::UnsupportedPixelType {
                    path: path.to_path_buf(),
                    code: format!("SampleFormat={} BitsPerSample={}", format, bits),
                })
            }
        };
        Ok(pixel_type)
    }

    /// The `dataType` spelling used in VRT documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            PixelType::Byte => "Byte",
            PixelType::Int8 => "Int8",
            PixelType::UInt16 => "UInt16",
            PixelType::Int16 => "Int16",
            PixelType::UInt32 => "UInt32",
            PixelType::Int32 => "Int32",
            PixelType::UInt64 => "UInt64",
            PixelType::Int64 => "Int64",
            PixelType::Float32 => "Float32",
            PixelType::Float64 => "Float64",
            PixelType::CInt16 => "CInt16",
            PixelType::CInt32 => "CInt32",
            PixelType::CFloat32 => "CFloat32",
            PixelType::CFloat64 => "CFloat64",
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color interpretation of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColorRole {
    Undefined,
    Gray,
    Palette,
    Red,
    Green,
    Blue,
    Alpha,
    Hue,
    Saturation,
    Lightness,
    Cyan,
    Magenta,
    Yellow,
    Black,
    /// An extra sample with no declared meaning, carrying its 1-based band index.
    Unspecified(usize),
}

impl ColorRole {
    /// The `ColorInterp` text for this role.
    ///
    /// `Undefined` and `Unspecified` have no spelling in VRT documents and
    /// return `None`, which suppresses the node.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            ColorRole::Undefined | ColorRole::Unspecified(_) => None,
            ColorRole::Gray => Some("Gray"),
            ColorRole::Palette => Some("Palette"),
            ColorRole::Red => Some("Red"),
            ColorRole::Green => Some("Green"),
            ColorRole::Blue => Some("Blue"),
            ColorRole::Alpha => Some("Alpha"),
            ColorRole::Hue => Some("Hue"),
            ColorRole::Saturation => Some("Saturation"),
            ColorRole::Lightness => Some("Lightness"),
            ColorRole::Cyan => Some("Cyan"),
            ColorRole::Magenta => Some("Magenta"),
            ColorRole::Yellow => Some("Yellow"),
            ColorRole::Black => Some("Black"),
        }
    }

    pub fn is_alpha(&self) -> bool {
        matches!(self, ColorRole::Alpha)
    }
}

impl fmt::Display for ColorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorRole::Undefined => f.write_str("Undefined"),
            ColorRole::Unspecified(index) => write!(f, "Unspecified({})", index),
            other => f.write_str(other.label().unwrap_or_default()),
        }
    }
}

/// Per-band properties of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandInfo {
    pub pixel_type: PixelType,
    pub color_role: ColorRole,
    pub nodata: Option<f64>,
}

impl BandInfo {
    pub fn new(pixel_type: PixelType, color_role: ColorRole) -> Self {
        Self {
            pixel_type,
            color_role,
            nodata: None,
        }
    }

    #[must_use]
    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }
}

/// Everything a build needs to know about one input tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileMetadata {
    /// Coordinate reference system identifier (e.g. `EPSG:32618`).
    pub crs: String,
    pub bounds: Bounds,
    /// Pixel size along x and y, both positive.
    pub resolution: (f64, f64),
    pub width: u32,
    pub height: u32,
    /// Bands in file order; band `i` is at index `i - 1`.
    pub bands: Vec<BandInfo>,
    /// Internal block (tile or strip) size.
    pub block_size: (u32, u32),
}

impl TileMetadata {
    /// Single-band `Byte` gray tile covering `bounds` at `width` x `height`
    /// pixels. The resolution is derived from the extent, and the block is
    /// one full-width row.
    pub fn new(crs: impl Into<String>, bounds: Bounds, width: u32, height: u32) -> Self {
        Self {
            crs: crs.into(),
            bounds,
            resolution: (
                bounds.width() / f64::from(width),
                bounds.height() / f64::from(height),
            ),
            width,
            height,
            bands: vec![BandInfo::new(PixelType::Byte, ColorRole::Gray)],
            block_size: (width, 1),
        }
    }

    #[must_use]
    pub fn with_bands(mut self, bands: Vec<BandInfo>) -> Self {
        self.bands = bands;
        self
    }

    #[must_use]
    pub fn with_block_size(mut self, x: u32, y: u32) -> Self {
        self.block_size = (x, y);
        self
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Band by 1-based index.
    pub fn band(&self, index: usize) -> Option<&BandInfo> {
        index.checked_sub(1).and_then(|i| self.bands.get(i))
    }
}

/// Source of per-tile metadata.
///
/// Implementations open the tile, extract the metadata, and release the
/// underlying handle before returning. A path that cannot be opened as a
/// raster yields an error; nothing is cached between calls.
pub trait MetadataReader {
    fn read(&self, path: &Path) -> Result<TileMetadata>;
}

impl<R: MetadataReader + ?Sized> MetadataReader for &R {
    fn read(&self, path: &Path) -> Result<TileMetadata> {
        (**self).read(path)
    }
}

/// Reader backed by an in-memory map of path to metadata.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    tiles: HashMap<PathBuf, TileMetadata>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for `path`, replacing any previous entry.
    pub fn insert<P: Into<PathBuf>>(&mut self, path: P, metadata: TileMetadata) {
        self.tiles.insert(path.into(), metadata);
    }

    #[must_use]
    pub fn with_tile<P: Into<PathBuf>>(mut self, path: P, metadata: TileMetadata) -> Self {
        self.insert(path, metadata);
        self
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl MetadataReader for MemoryReader {
    fn read(&self, path: &Path) -> Result<TileMetadata> {
        self.tiles.get(path).cloned().ok_or_else(|| Error::Metadata {
            path: path.to_path_buf(),
            message: "not found".to_string(),
        })
    }
}
