//! # Mosaic Planning
//!
//! This module turns a list of tiles into a [`MosaicPlan`]: the unified
//! frame (extent, resolution, geotransform, raster size) plus one
//! [`OutputBand`] per output band, each listing the [`PixelSource`]s that
//! feed it.
//!
//! ## Steps
//!
//! 1. **Validation** ([`validate`]): at least one tile, a single CRS, and in
//!    mosaic mode a single band count. The first offending tile in input
//!    order is reported.
//! 2. **Reconciliation**: the extent is the union of every tile's bounds
//!    ([`union_bounds`]); the pixel size comes from the chosen
//!    [`Resolution`]. The raster size is `round((right - left) / xres)` by
//!    `round((top - bottom) / yres)`.
//! 3. **Planning**: mosaic mode builds one band per source band index with
//!    one source per tile; stack mode builds one band per tile from its
//!    first band.
//!
//! ## Rounding
//!
//! Raster sizes and placement offsets round half to even
//! (`f64::round_ties_even`), so `2.5` becomes `2` and `3.5` becomes `4`.
//! Written documents depend on this exactly.
//!
//! ## Source order
//!
//! Sources are listed in input order. Renderers draw them in that order, so
//! where tiles overlap the later tile wins.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::metadata::{Bounds, ColorRole, PixelType, TileMetadata};
use crate::path::relative_to;
use crate::resolution::Resolution;

/// How tiles are gathered into output bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One output band per source band, fed by every tile.
    #[default]
    Mosaic,
    /// One output band per tile, fed by that tile's first band.
    Stack,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Mosaic => f.write_str("mosaic"),
            Mode::Stack => f.write_str("stack"),
        }
    }
}

/// An input tile: where it lives and what it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub path: PathBuf,
    pub metadata: TileMetadata,
}

impl Tile {
    pub fn new<P: Into<PathBuf>>(path: P, metadata: TileMetadata) -> Self {
        Self {
            path: path.into(),
            metadata,
        }
    }
}

/// How source file names are written into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePathStyle {
    /// The tile path as given (callers pass absolute paths).
    Absolute,
    /// Relative to the directory holding the document.
    RelativeTo(PathBuf),
}

impl SourcePathStyle {
    pub fn is_relative(&self) -> bool {
        matches!(self, SourcePathStyle::RelativeTo(_))
    }

    fn render(&self, path: &Path) -> Result<String> {
        match self {
            SourcePathStyle::Absolute => Ok(path.display().to_string()),
            SourcePathStyle::RelativeTo(base) => relative_to(path, base),
        }
    }
}

/// Affine pixel to CRS transform in GDAL coefficient order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform([f64; 6]);

impl GeoTransform {
    /// North-up transform with its origin at the top-left corner.
    ///
    /// Rows grow downward while northing grows upward, hence the negative
    /// y pixel size.
    pub fn north_up(origin_x: f64, origin_y: f64, xres: f64, yres: f64) -> Self {
        GeoTransform([origin_x, xres, 0.0, origin_y, 0.0, -yres])
    }

    /// `(origin_x, pixel_width, 0, origin_y, 0, -pixel_height)`.
    pub fn to_gdal(&self) -> [f64; 6] {
        self.0
    }
}

impl fmt::Display for GeoTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: Vec<String> = self.0.iter().map(|v| format_decimal(*v)).collect();
        f.write_str(&text.join(", "))
    }
}

/// Shortest round-trip decimal, keeping a `.0` on integral values.
///
/// Magnitudes below `1e-4` or from `1e16` up use exponent notation with a
/// signed, at least two-digit exponent: `1e-05`, `8.983152841195214e-06`,
/// `1e+20`.
pub fn format_decimal(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let text = format!("{:?}", value);
    match text.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => format!(
                "{}e{}{:02}",
                mantissa,
                if exp < 0 { '-' } else { '+' },
                exp.unsigned_abs()
            ),
            Err(_) => text,
        },
        None => text,
    }
}

/// A pixel window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x_off: u64,
    pub y_off: u64,
    pub x_size: u64,
    pub y_size: u64,
}

/// Plain or mask-aware pixel source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Simple,
    Complex,
}

impl SourceKind {
    pub fn tag(&self) -> &'static str {
        match self {
            SourceKind::Simple => "SimpleSource",
            SourceKind::Complex => "ComplexSource",
        }
    }
}

/// One tile band placed into an output band.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelSource {
    /// File name as written in the document.
    pub path: String,
    pub relative: bool,
    /// 1-based band index in the source file.
    pub band: usize,
    pub kind: SourceKind,
    pub pixel_type: PixelType,
    /// Native raster size of the source file.
    pub size: (u32, u32),
    pub block_size: (u32, u32),
    /// Where the source lands in the unified frame.
    pub dst: Rect,
    pub nodata: Option<f64>,
    pub use_mask_band: bool,
}

impl PixelSource {
    /// The region read from the source: always the whole file.
    pub fn src_rect(&self) -> Rect {
        Rect {
            x_off: 0,
            y_off: 0,
            x_size: u64::from(self.size.0),
            y_size: u64::from(self.size.1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputBand {
    /// 1-based band index in the document.
    pub index: usize,
    pub pixel_type: PixelType,
    pub color_role: Option<ColorRole>,
    pub offset: f64,
    pub scale: f64,
    pub sources: Vec<PixelSource>,
}

impl OutputBand {
    fn new(index: usize, pixel_type: PixelType, color_role: Option<ColorRole>) -> Self {
        Self {
            index,
            pixel_type,
            color_role,
            offset: 0.0,
            scale: 1.0,
            sources: Vec::new(),
        }
    }
}

/// The unified frame and band layout of a virtual raster.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicPlan {
    pub mode: Mode,
    pub crs: String,
    pub bounds: Bounds,
    /// Output pixel size `(x, y)`, both positive.
    pub resolution: (f64, f64),
    pub transform: GeoTransform,
    pub width: u64,
    pub height: u64,
    pub bands: Vec<OutputBand>,
}

/// Check that `tiles` can be combined in `mode`.
///
/// The first tile is the reference. Every tile must share its CRS and, in
/// mosaic mode, its band count.
pub fn validate(tiles: &[Tile], mode: Mode) -> Result<()> {
    let reference = tiles.first().ok_or(Error::EmptyInput)?;
    let crs = &reference.metadata.crs;
    let count = reference.metadata.band_count();

    for tile in tiles {
        if &tile.metadata.crs != crs {
            return Err(Error::CrsMismatch {
                path: tile.path.clone(),
                found: tile.metadata.crs.clone(),
                expected: crs.clone(),
            });
        }
        if mode == Mode::Mosaic && tile.metadata.band_count() != count {
            return Err(Error::BandCountMismatch {
                path: tile.path.clone(),
                found: tile.metadata.band_count(),
                expected: count,
            });
        }
    }
    Ok(())
}

/// Union of the bounds of every tile.
pub fn union_bounds(tiles: &[Tile]) -> Result<Bounds> {
    let (first, rest) = tiles.split_first().ok_or(Error::EmptyInput)?;
    Ok(rest
        .iter()
        .fold(first.metadata.bounds, |acc, tile| acc.union(&tile.metadata.bounds)))
}

fn to_pixels(distance: f64, resolution: f64) -> u64 {
    (distance / resolution).round_ties_even().abs() as u64
}

impl MosaicPlan {
    /// Validate `tiles` and plan the virtual raster.
    pub fn build(
        tiles: &[Tile],
        mode: Mode,
        resolution: Resolution,
        paths: &SourcePathStyle,
    ) -> Result<Self> {
        validate(tiles, mode)?;

        let bounds = union_bounds(tiles)?;
        let resolutions: Vec<(f64, f64)> = tiles.iter().map(|t| t.metadata.resolution).collect();
        let (xres, yres) = resolution.reconcile(&resolutions)?;
        let transform = GeoTransform::north_up(bounds.left, bounds.top, xres, yres);
        let width = to_pixels(bounds.width(), xres);
        let height = to_pixels(bounds.height(), yres);
        debug!(
            "Frame {} at {}x{} px ({} resolution {}, {})",
            bounds, width, height, resolution, xres, yres
        );

        let mismatched = resolutions
            .iter()
            .filter(|(x, y)| *x != xres || *y != yres)
            .count();
        if mismatched > 0 {
            warn!(
                "{} tile(s) have a pixel size different from the output ({}, {}); they are placed at native size without resampling",
                mismatched, xres, yres
            );
        }

        let mut plan = MosaicPlan {
            mode,
            crs: tiles[0].metadata.crs.clone(),
            bounds,
            resolution: (xres, yres),
            transform,
            width,
            height,
            bands: Vec::new(),
        };
        plan.bands = match mode {
            Mode::Mosaic => plan.mosaic_bands(tiles, paths)?,
            Mode::Stack => plan.stack_bands(tiles, paths)?,
        };
        Ok(plan)
    }

    fn placement(&self, metadata: &TileMetadata) -> Rect {
        Rect {
            x_off: to_pixels(metadata.bounds.left - self.bounds.left, self.resolution.0),
            y_off: to_pixels(metadata.bounds.top - self.bounds.top, self.resolution.1),
            x_size: u64::from(metadata.width),
            y_size: u64::from(metadata.height),
        }
    }

    fn mosaic_bands(&self, tiles: &[Tile], paths: &SourcePathStyle) -> Result<Vec<OutputBand>> {
        let reference = &tiles[0].metadata;
        let mut bands: Vec<OutputBand> = reference
            .bands
            .iter()
            .enumerate()
            .map(|(i, band)| {
                let role = Some(band.color_role).filter(|r| r.label().is_some());
                OutputBand::new(i + 1, band.pixel_type, role)
            })
            .collect();

        for tile in tiles {
            let path = paths.render(&tile.path)?;
            let dst = self.placement(&tile.metadata);

            for (output, (reference_band, band)) in bands
                .iter_mut()
                .zip(reference.bands.iter().zip(&tile.metadata.bands))
            {
                // roles come from the first tile only
                if band.color_role != reference_band.color_role {
                    warn!(
                        "Band {} of {} is {} but the first tile declares {}",
                        output.index,
                        tile.path.display(),
                        band.color_role,
                        reference_band.color_role
                    );
                }
                let is_alpha = reference_band.color_role.is_alpha();
                output.sources.push(PixelSource {
                    path: path.clone(),
                    relative: paths.is_relative(),
                    band: output.index,
                    kind: if is_alpha {
                        SourceKind::Complex
                    } else {
                        SourceKind::Simple
                    },
                    pixel_type: reference_band.pixel_type,
                    size: (tile.metadata.width, tile.metadata.height),
                    block_size: tile.metadata.block_size,
                    dst,
                    nodata: band.nodata,
                    use_mask_band: is_alpha,
                });
            }
        }
        Ok(bands)
    }

    /// One band per tile, fed by its first band.
    ///
    /// Bands are numbered from 1 in tile order (tile `i` becomes band
    /// `i + 1`), not from 0: GDAL rejects a `VRTRasterBand` with `band="0"`.
    fn stack_bands(&self, tiles: &[Tile], paths: &SourcePathStyle) -> Result<Vec<OutputBand>> {
        tiles
            .iter()
            .enumerate()
            .map(|(i, tile)| {
                let first = tile.metadata.band(1).ok_or_else(|| Error::Metadata {
                    path: tile.path.clone(),
                    message: "raster has no bands".to_string(),
                })?;
                let mut output = OutputBand::new(i + 1, first.pixel_type, None);
                output.sources.push(PixelSource {
                    path: paths.render(&tile.path)?,
                    relative: paths.is_relative(),
                    band: 1,
                    kind: SourceKind::Complex,
                    pixel_type: first.pixel_type,
                    size: (tile.metadata.width, tile.metadata.height),
                    block_size: tile.metadata.block_size,
                    dst: self.placement(&tile.metadata),
                    nodata: first.nodata,
                    use_mask_band: true,
                });
                Ok(output)
            })
            .collect()
    }

    /// Total number of pixel sources across all bands.
    pub fn source_count(&self) -> usize {
        self.bands.iter().map(|b| b.sources.len()).sum()
    }
}
