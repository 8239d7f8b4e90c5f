//! Shared test utilities for integration and E2E tests.
//!
//! Tiles are real GeoTIFF files written with the `tiff` encoder into a
//! temporary directory, so every test exercises the same reader the CLI uses.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_grid();
//!     let mut cmd = cargo_bin_cmd!("vrt-mosaic");
//!     cmd.current_dir(fixture.path()).args(["build", "out.vrt", "tiles"]);
//! }
//! ```

#![allow(dead_code)]

use assert_fs::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use tiff::encoder::{colortype, DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;
use xot::Xot;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    pub use super::{parse_vrt, Layout, TestFixture, TileSpec, VrtView};
}

/// Rows per strip in generated tiles, reported as the block height.
pub const ROWS_PER_STRIP: u32 = 16;

/// Band layout of a generated tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One `Byte` gray band.
    Gray,
    /// Four `Byte` bands: red, green, blue, unassociated alpha.
    Rgba,
}

/// Geometry and content of a generated GeoTIFF.
#[derive(Debug, Clone)]
pub struct TileSpec {
    pub left: f64,
    pub top: f64,
    pub width: u32,
    pub height: u32,
    pub res: f64,
    pub epsg: u16,
    pub layout: Layout,
    pub nodata: Option<String>,
}

impl TileSpec {
    /// 100 x 100 gray tile at 1 unit per pixel in UTM 18N.
    pub fn new(left: f64, top: f64) -> Self {
        Self {
            left,
            top,
            width: 100,
            height: 100,
            res: 1.0,
            epsg: 32618,
            layout: Layout::Gray,
            nodata: None,
        }
    }

    /// Tile at `(col, row)` of a grid of 100 x 100 tiles, row 0 on top.
    pub fn grid(col: u32, row: u32) -> Self {
        Self::new(
            500_000.0 + f64::from(col) * 100.0,
            4_000_200.0 - f64::from(row) * 100.0,
        )
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn res(mut self, res: f64) -> Self {
        self.res = res;
        self
    }

    pub fn epsg(mut self, epsg: u16) -> Self {
        self.epsg = epsg;
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn nodata(mut self, nodata: &str) -> Self {
        self.nodata = Some(nodata.to_string());
        self
    }
}

fn write_georef<W: Write + Seek, K: TiffKind>(dir: &mut DirectoryEncoder<'_, W, K>, spec: &TileSpec) {
    dir.write_tag(Tag::ModelPixelScaleTag, &[spec.res, spec.res, 0.0][..])
        .expect("Failed to write pixel scale");
    dir.write_tag(
        Tag::ModelTiepointTag,
        &[0.0, 0.0, 0.0, spec.left, spec.top, 0.0][..],
    )
    .expect("Failed to write tiepoint");

    // EPSG:4326 is geographic, everything else is treated as projected
    let (model, crs_key) = if spec.epsg == 4326 { (2, 2048) } else { (1, 3072) };
    let geokeys: [u16; 16] = [
        1, 1, 0, 3, //
        1024, 0, 1, model, //
        1025, 0, 1, 1, //
        crs_key, 0, 1, spec.epsg,
    ];
    dir.write_tag(Tag::GeoKeyDirectoryTag, &geokeys[..])
        .expect("Failed to write geokeys");

    if let Some(nodata) = &spec.nodata {
        dir.write_tag(Tag::GdalNodata, nodata.as_str())
            .expect("Failed to write nodata");
    }
}

/// Write `spec` as a stripped, uncompressed GeoTIFF at `path`.
pub fn write_geotiff(path: &Path, spec: &TileSpec) {
    let file = File::create(path).expect("Failed to create tile");
    let mut encoder = TiffEncoder::new(BufWriter::new(file)).expect("Failed to start TIFF");
    let pixels = (spec.width * spec.height) as usize;

    match spec.layout {
        Layout::Gray => {
            let mut image = encoder
                .new_image::<colortype::Gray8>(spec.width, spec.height)
                .expect("Failed to start image");
            image.rows_per_strip(ROWS_PER_STRIP).expect("Failed to set strips");
            write_georef(image.encoder(), spec);
            image.write_data(&vec![0u8; pixels]).expect("Failed to write pixels");
        }
        Layout::Rgba => {
            let mut image = encoder
                .new_image::<colortype::RGBA8>(spec.width, spec.height)
                .expect("Failed to start image");
            image.rows_per_strip(ROWS_PER_STRIP).expect("Failed to set strips");
            write_georef(image.encoder(), spec);
            image
                .encoder()
                .write_tag(Tag::ExtraSamples, &[2u16][..])
                .expect("Failed to write extra samples");
            image
                .write_data(&vec![0u8; pixels * 4])
                .expect("Failed to write pixels");
        }
    }
}

/// A temporary directory populated with generated tiles.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a GeoTIFF at `path` (relative to the fixture root).
    pub fn with_tile(self, path: &str, spec: TileSpec) -> Self {
        let child = self.temp_dir.child(path);
        if let Some(parent) = child.path().parent() {
            std::fs::create_dir_all(parent).expect("Failed to create tile directory");
        }
        write_geotiff(child.path(), &spec);
        self
    }

    /// Add `tiles/tile0.tif` .. `tiles/tile3.tif` forming a complete 2x2
    /// grid, row-major from the top-left tile.
    pub fn with_grid(self) -> Self {
        (0..4).fold(self, |fixture, i| {
            fixture.with_tile(&format!("tiles/tile{i}.tif"), TileSpec::grid(i % 2, i / 2))
        })
    }

    /// Add a text file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `path` inside the fixture.
    pub fn join(&self, path: &str) -> PathBuf {
        self.temp_dir.path().join(path)
    }

    /// Paths of the four grid tiles, in grid order.
    pub fn grid_paths(&self) -> Vec<PathBuf> {
        (0..4).map(|i| self.join(&format!("tiles/tile{i}.tif"))).collect()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Parsed view of a written VRT document.
pub struct VrtView {
    xot: Xot,
    root: xot::Node,
}

/// Parse the VRT document at `path`.
pub fn parse_vrt(path: &Path) -> VrtView {
    let text = std::fs::read_to_string(path).expect("Failed to read VRT");
    let mut xot = Xot::new();
    let doc = xot.parse(&text).expect("VRT is not well-formed XML");
    let root = xot.document_element(doc).expect("VRT has no root element");
    VrtView { xot, root }
}

impl VrtView {
    fn elements(&self, name: &str) -> Vec<xot::Node> {
        let Some(id) = self.xot.name(name) else {
            return Vec::new();
        };
        self.xot
            .descendants(self.root)
            .filter(|n| self.xot.element(*n).is_some_and(|e| e.name() == id))
            .collect()
    }

    fn attr(&self, node: xot::Node, name: &str) -> Option<String> {
        let id = self.xot.name(name)?;
        self.xot.get_attribute(node, id).map(str::to_string)
    }

    /// Root `rasterXSize` and `rasterYSize`.
    pub fn size(&self) -> (u64, u64) {
        let read = |name: &str| {
            self.attr(self.root, name)
                .and_then(|v| v.parse().ok())
                .expect("missing raster size")
        };
        (read("rasterXSize"), read("rasterYSize"))
    }

    /// Number of elements called `name` anywhere in the document.
    pub fn count(&self, name: &str) -> usize {
        self.elements(name).len()
    }

    /// Text of every element called `name`, in document order.
    pub fn texts(&self, name: &str) -> Vec<String> {
        self.elements(name)
            .into_iter()
            .map(|n| self.xot.text_content_str(n).unwrap_or_default().to_string())
            .collect()
    }

    /// Attribute `attr` of every element called `name`, in document order.
    pub fn attrs(&self, name: &str, attr: &str) -> Vec<String> {
        self.elements(name)
            .into_iter()
            .filter_map(|n| self.attr(n, attr))
            .collect()
    }

    /// `(xOff, yOff)` of every `DstRect`, in document order.
    pub fn dst_offsets(&self) -> Vec<(u64, u64)> {
        self.elements("DstRect")
            .into_iter()
            .map(|n| {
                let x = self.attr(n, "xOff").and_then(|v| v.parse().ok());
                let y = self.attr(n, "yOff").and_then(|v| v.parse().ok());
                (x.expect("missing xOff"), y.expect("missing yOff"))
            })
            .collect()
    }
}
