//! # VRT Mosaic Library
//!
//! Builds GDAL virtual raster (VRT) documents that stitch many georeferenced
//! tiles into one dataset without copying any pixels. Only tile metadata is
//! read: extent, resolution, CRS, band layout, nodata and block size.
//!
//! ## Quick Example
//!
//! ```
//! use vrt_mosaic::metadata::{Bounds, MemoryReader, TileMetadata};
//! use vrt_mosaic::plan::Mode;
//! use vrt_mosaic::vrt::VrtBuilder;
//!
//! let reader = MemoryReader::new()
//!     .with_tile(
//!         "/tiles/west.tif",
//!         TileMetadata::new("EPSG:32618", Bounds::new(0.0, 0.0, 100.0, 100.0), 100, 100),
//!     )
//!     .with_tile(
//!         "/tiles/east.tif",
//!         TileMetadata::new("EPSG:32618", Bounds::new(100.0, 0.0, 200.0, 100.0), 100, 100),
//!     );
//!
//! let plan = VrtBuilder::new(reader)
//!     .mode(Mode::Mosaic)
//!     .plan("/tiles/mosaic.vrt", &["/tiles/west.tif", "/tiles/east.tif"])
//!     .unwrap();
//!
//! assert_eq!((plan.width, plan.height), (200, 100));
//! assert_eq!(plan.bands[0].sources[1].dst.x_off, 100);
//! ```
//!
//! ## Core Concepts
//!
//! - **Metadata (`metadata`, `geotiff`)**: [`TileMetadata`](metadata::TileMetadata)
//!   values produced by a [`MetadataReader`](metadata::MetadataReader). The
//!   GeoTIFF reader decodes tags with the `tiff` crate.
//! - **Resolution (`resolution`)**: how the output pixel size is chosen.
//! - **Planning (`plan`)**: validation, the unified frame, and the per-band
//!   list of pixel sources.
//! - **Documents (`document`)**: the plan as an element tree, serialized to
//!   XML.
//! - **Entry point (`vrt`)**: [`build_vrt`](vrt::build_vrt) and
//!   [`VrtBuilder`](vrt::VrtBuilder).
//! - **Configuration (`config`)**: YAML mosaic files for the CLI.

pub mod config;
pub mod document;
pub mod error;
pub mod geotiff;
pub mod metadata;
pub mod output;
pub mod path;
pub mod plan;
pub mod resolution;
pub mod vrt;

#[cfg(test)]
mod plan_proptest;

pub use error::{Error, Result};
pub use vrt::{build_vrt, VrtBuilder};
