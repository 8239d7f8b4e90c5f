//! # VRT Documents
//!
//! Planning never touches markup. A [`MosaicPlan`] is first turned into a
//! plain tree of [`Element`] records by [`vrt_tree`], and that tree is handed
//! once to the XML serializer ([`to_xml_string`]) built on `xot`.
//!
//! ## Layout
//!
//! ```text
//! VRTDataset[rasterXSize, rasterYSize]
//! ├── SRS[dataAxisToSRSAxisMapping="2,1"]
//! ├── GeoTransform
//! ├── OverviewList[resampling="nearest"]   "2 4 8"
//! └── VRTRasterBand[dataType, band]        (one per output band)
//!     ├── Offset                           "0.0"
//!     ├── Scale                            "1.0"
//!     ├── ColorInterp                      (when the role has a label)
//!     └── SimpleSource | ComplexSource     (one per pixel source)
//!         ├── SourceFilename[relativeToVRT]
//!         ├── SourceBand
//!         ├── SourceProperties[RasterXSize, RasterYSize, DataType, BlockXSize, BlockYSize]
//!         ├── SrcRect[xOff, yOff, xSize, ySize]
//!         ├── DstRect[xOff, yOff, xSize, ySize]
//!         ├── NoDataValue                  (when the tile declares one)
//!         └── UseMaskBand                  "true" (masked sources only)
//! ```
//!
//! Tag and attribute names are read by GDAL and must not change.

use std::fs;
use std::path::Path;

use xot::output::xml::{Declaration, Parameters};
use xot::{Node, Xot};

use crate::error::Result;
use crate::plan::{format_decimal, MosaicPlan, OutputBand, PixelSource, Rect};

/// Levels declared in `OverviewList`.
const OVERVIEW_LEVELS: &str = "2 4 8";

/// A named node with ordered attributes, optional text and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((name.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child called `name`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Direct children called `name`, in order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn rect(name: &str, rect: Rect) -> Element {
    Element::new(name)
        .attr("xOff", rect.x_off)
        .attr("yOff", rect.y_off)
        .attr("xSize", rect.x_size)
        .attr("ySize", rect.y_size)
}

fn source_element(source: &PixelSource) -> Element {
    let mut element = Element::new(source.kind.tag())
        .child(
            Element::new("SourceFilename")
                .attr("relativeToVRT", if source.relative { "1" } else { "0" })
                .text(source.path.as_str()),
        )
        .child(Element::new("SourceBand").text(source.band.to_string()))
        .child(
            Element::new("SourceProperties")
                .attr("RasterXSize", source.size.0)
                .attr("RasterYSize", source.size.1)
                .attr("DataType", source.pixel_type)
                .attr("BlockXSize", source.block_size.0)
                .attr("BlockYSize", source.block_size.1),
        )
        .child(rect("SrcRect", source.src_rect()))
        .child(rect("DstRect", source.dst));

    if let Some(nodata) = source.nodata {
        element = element.child(Element::new("NoDataValue").text(format_decimal(nodata)));
    }
    if source.use_mask_band {
        element = element.child(Element::new("UseMaskBand").text("true"));
    }
    element
}

fn band_element(band: &OutputBand) -> Element {
    let mut element = Element::new("VRTRasterBand")
        .attr("dataType", band.pixel_type)
        .attr("band", band.index)
        .child(Element::new("Offset").text(format_decimal(band.offset)))
        .child(Element::new("Scale").text(format_decimal(band.scale)));

    if let Some(label) = band.color_role.and_then(|role| role.label()) {
        element = element.child(Element::new("ColorInterp").text(label));
    }
    element.children(band.sources.iter().map(source_element))
}

/// Describe `plan` as a VRT element tree.
pub fn vrt_tree(plan: &MosaicPlan) -> Element {
    Element::new("VRTDataset")
        .attr("rasterXSize", plan.width)
        .attr("rasterYSize", plan.height)
        .child(
            Element::new("SRS")
                .attr("dataAxisToSRSAxisMapping", "2,1")
                .text(plan.crs.as_str()),
        )
        .child(Element::new("GeoTransform").text(plan.transform.to_string()))
        .child(
            Element::new("OverviewList")
                .attr("resampling", "nearest")
                .text(OVERVIEW_LEVELS),
        )
        .children(plan.bands.iter().map(band_element))
}

fn to_node(xot: &mut Xot, element: &Element) -> Result<Node> {
    let name = xot.add_name(&element.name);
    let node = xot.new_element(name);
    for (key, value) in &element.attributes {
        let key = xot.add_name(key);
        xot.set_attribute(node, key, value.as_str());
    }
    if let Some(text) = &element.text {
        xot.append_text(node, text)?;
    }
    for child in &element.children {
        let child = to_node(xot, child)?;
        xot.append(node, child)?;
    }
    Ok(node)
}

/// Serialize `root` as an indented XML document with a declaration.
pub fn to_xml_string(root: &Element) -> Result<String> {
    let mut xot = Xot::new();
    let element = to_node(&mut xot, root)?;
    let document = xot.new_document_with_element(element)?;

    let mut xml = xot.serialize_xml_string(
        Parameters {
            indentation: Some(Default::default()),
            declaration: Some(Declaration {
                encoding: Some("UTF-8".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        },
        document,
    )?;
    if !xml.ends_with('\n') {
        xml.push('\n');
    }
    Ok(xml)
}

/// Serialize `root` and write it to `dest`, replacing any existing file.
///
/// The document is fully rendered before the file is touched, so a
/// serialization failure leaves nothing on disk.
pub fn write_document(root: &Element, dest: &Path) -> Result<()> {
    let xml = to_xml_string(root)?;
    fs::write(dest, xml)?;
    Ok(())
}
