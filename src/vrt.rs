//! # Building Virtual Rasters
//!
//! [`build_vrt`] is the one-call entry point: destination, tiles, and the
//! three options, returning the path of the written document.
//! [`VrtBuilder`] is the same operation with a pluggable
//! [`MetadataReader`] and a separate [`plan`](VrtBuilder::plan) step for
//! callers that want to inspect the result before writing.
//!
//! A build runs in this order:
//!
//! 1. an empty tile list fails immediately;
//! 2. the destination is made absolute, and in relative mode its parent
//!    directory must already exist;
//! 3. each tile is read once, in input order, and released;
//! 4. every tile is validated before any extent is computed;
//! 5. the plan is turned into a document, rendered, and written once.
//!
//! Any failure aborts the build without writing.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::document::{vrt_tree, write_document};
use crate::error::{Error, Result};
use crate::geotiff::GeoTiffReader;
use crate::metadata::MetadataReader;
use crate::path::absolutize;
use crate::plan::{Mode, MosaicPlan, SourcePathStyle, Tile};
use crate::resolution::Resolution;

/// Write a VRT at `dest` combining `files`.
///
/// `relative` writes source paths relative to the document's directory;
/// `mosaic` selects [`Mode::Mosaic`], otherwise [`Mode::Stack`]. Returns the
/// absolute path of the written document.
pub fn build_vrt<D, P>(
    dest: D,
    files: &[P],
    relative: bool,
    mosaic: bool,
    resolution: Resolution,
) -> Result<PathBuf>
where
    D: AsRef<Path>,
    P: AsRef<Path>,
{
    VrtBuilder::new(GeoTiffReader::new())
        .relative(relative)
        .mode(if mosaic { Mode::Mosaic } else { Mode::Stack })
        .resolution(resolution)
        .write(dest, files)
}

/// Configurable VRT build over any metadata source.
#[derive(Debug, Clone)]
pub struct VrtBuilder<R> {
    reader: R,
    relative: bool,
    mode: Mode,
    resolution: Resolution,
}

impl<R: MetadataReader> VrtBuilder<R> {
    /// Absolute paths, mosaic mode, average resolution.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            relative: false,
            mode: Mode::default(),
            resolution: Resolution::default(),
        }
    }

    #[must_use]
    pub fn relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    fn path_style(&self, dest: &Path) -> Result<SourcePathStyle> {
        if !self.relative {
            return Ok(SourcePathStyle::Absolute);
        }
        let parent = dest.parent().ok_or_else(|| Error::Path {
            message: format!("\"{}\" has no parent directory", dest.display()),
        })?;
        if !parent.is_dir() {
            return Err(Error::Path {
                message: format!(
                    "relative paths need an existing destination directory, \"{}\" does not exist",
                    parent.display()
                ),
            });
        }
        Ok(SourcePathStyle::RelativeTo(parent.to_path_buf()))
    }

    /// Read every tile once, in order.
    pub fn read_tiles<P: AsRef<Path>>(&self, files: &[P]) -> Result<Vec<Tile>> {
        files
            .iter()
            .map(|file| {
                let path = absolutize(file.as_ref())?;
                let metadata = self.reader.read(&path)?;
                debug!(
                    "Read {}: {}x{} px, {} band(s), {}",
                    path.display(),
                    metadata.width,
                    metadata.height,
                    metadata.band_count(),
                    metadata.crs
                );
                Ok(Tile::new(path, metadata))
            })
            .collect()
    }

    /// Plan the document for `files` without writing anything.
    pub fn plan<D, P>(&self, dest: D, files: &[P]) -> Result<MosaicPlan>
    where
        D: AsRef<Path>,
        P: AsRef<Path>,
    {
        if files.is_empty() {
            return Err(Error::EmptyInput);
        }
        let dest = absolutize(dest.as_ref())?;
        let style = self.path_style(&dest)?;
        let tiles = self.read_tiles(files)?;
        MosaicPlan::build(&tiles, self.mode, self.resolution, &style)
    }

    /// Plan and write the document, returning its absolute path.
    pub fn write<D, P>(&self, dest: D, files: &[P]) -> Result<PathBuf>
    where
        D: AsRef<Path>,
        P: AsRef<Path>,
    {
        let dest = absolutize(dest.as_ref())?;
        let plan = self.plan(&dest, files)?;
        write_document(&vrt_tree(&plan), &dest)?;
        info!(
            "Wrote {} ({}x{} px, {} band(s), {} source(s))",
            dest.display(),
            plan.width,
            plan.height,
            plan.bands.len(),
            plan.source_count()
        );
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Bounds, MemoryReader, TileMetadata};

    fn reader() -> MemoryReader {
        let mut reader = MemoryReader::new();
        for (i, (left, top)) in [(0.0, 200.0), (100.0, 200.0), (0.0, 100.0), (100.0, 100.0)]
            .into_iter()
            .enumerate()
        {
            let bounds = Bounds::new(left, top - 100.0, left + 100.0, top);
            reader.insert(
                format!("/grid/tile{i}.tif"),
                TileMetadata::new("EPSG:32618", bounds, 100, 100),
            );
        }
        reader
    }

    fn files() -> Vec<String> {
        (0..4).map(|i| format!("/grid/tile{i}.tif")).collect()
    }

    #[test]
    fn test_empty_input_wins_over_everything() {
        let empty: Vec<String> = Vec::new();
        let builder = VrtBuilder::new(MemoryReader::new())
            .relative(true)
            .resolution(Resolution::Highest);
        assert!(matches!(
            builder.plan("/does/not/exist/out.vrt", &empty),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_plan_grid() {
        let plan = VrtBuilder::new(reader()).plan("/grid/out.vrt", &files()).unwrap();
        assert_eq!((plan.width, plan.height), (200, 200));
        assert_eq!(plan.source_count(), 4);
    }

    #[test]
    fn test_missing_tile_is_reported() {
        let mut files = files();
        files.push("/grid/missing.tif".to_string());
        let err = VrtBuilder::new(reader()).plan("/grid/out.vrt", &files).unwrap_err();
        assert!(err.to_string().contains("missing.tif"));
    }

    #[test]
    fn test_relative_requires_existing_parent() {
        let err = VrtBuilder::new(reader())
            .relative(true)
            .plan("/no/such/dir/out.vrt", &files())
            .unwrap_err();
        assert!(matches!(err, Error::Path { .. }));
    }

    #[test]
    fn test_write_creates_document() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("mosaic.vrt");
        let written = VrtBuilder::new(reader())
            .mode(Mode::Stack)
            .write(&dest, &files())
            .unwrap();
        assert!(written.is_absolute());
        let xml = std::fs::read_to_string(&written).unwrap();
        assert_eq!(xml.matches("<VRTRasterBand").count(), 4);
        assert_eq!(xml.matches("<ComplexSource>").count(), 4);
    }

    #[test]
    fn test_failed_build_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("mosaic.vrt");
        let mut files = files();
        files.push("/grid/missing.tif".to_string());
        assert!(VrtBuilder::new(reader()).write(&dest, &files).is_err());
        assert!(!dest.exists());
    }
}
