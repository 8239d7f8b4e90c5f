//! GeoTIFF metadata reader
//!
//! [`GeoTiffReader`] is the production [`MetadataReader`]. It decodes the
//! first image file directory of a TIFF with the pure Rust `tiff` crate and
//! never touches pixel data.
//!
//! Georeferencing comes from the `ModelPixelScale` + `ModelTiepoint` pair, or
//! from `ModelTransformation` when no scale is present. Only north-up,
//! non-rotated rasters are accepted. The CRS is reported as `EPSG:<code>`
//! from the projected or geographic GeoKey.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::debug;
use tiff::decoder::ifd::Value;
use tiff::decoder::Decoder;
use tiff::tags::Tag;

use crate::error::{Error, Result};
use crate::metadata::{BandInfo, Bounds, ColorRole, MetadataReader, PixelType, TileMetadata};

// GeoKey IDs
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

// GeoKey values
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

// PhotometricInterpretation values
const PHOTOMETRIC_MIN_IS_WHITE: u16 = 0;
const PHOTOMETRIC_MIN_IS_BLACK: u16 = 1;
const PHOTOMETRIC_RGB: u16 = 2;
const PHOTOMETRIC_PALETTE: u16 = 3;
const PHOTOMETRIC_SEPARATED: u16 = 5;
const PHOTOMETRIC_YCBCR: u16 = 6;

// ExtraSamples values
const EXTRA_SAMPLE_UNSPECIFIED: u16 = 0;
const EXTRA_SAMPLE_ASSOCIATED_ALPHA: u16 = 1;
const EXTRA_SAMPLE_UNASSOCIATED_ALPHA: u16 = 2;

/// Reads tile metadata from GeoTIFF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffReader;

impl GeoTiffReader {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataReader for GeoTiffReader {
    fn read(&self, path: &Path) -> Result<TileMetadata> {
        let file = File::open(path).map_err(|e| metadata_error(path, e))?;
        let mut decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| metadata_error(path, e))?;
        let metadata = read_metadata(path, &mut decoder).map_err(|e| match e {
            Error::Tiff(err) => metadata_error(path, err),
            other => other,
        })?;
        debug!(
            "Decoded GeoTIFF {}: bounds {}, blocks {}x{}",
            path.display(),
            metadata.bounds,
            metadata.block_size.0,
            metadata.block_size.1
        );
        Ok(metadata)
    }
}

fn metadata_error(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::Metadata {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn find_u16<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> Result<Option<u16>> {
    Ok(decoder.find_tag(tag)?.map(Value::into_u16).transpose()?)
}

/// SHORT values of `tag`, whether stored as a single scalar or a list.
fn find_u16_vec<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> Result<Option<Vec<u16>>> {
    Ok(decoder.find_tag(tag)?.map(shorts).transpose()?)
}

// a single SHORT decodes as `Unsigned`, longer arrays as a `List`
fn shorts(value: Value) -> tiff::TiffResult<Vec<u16>> {
    match value {
        Value::List(values) => values.into_iter().map(Value::into_u16).collect(),
        scalar => Ok(vec![scalar.into_u16()?]),
    }
}

fn find_f64_vec<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> Result<Option<Vec<f64>>> {
    Ok(decoder.find_tag(tag)?.map(Value::into_f64_vec).transpose()?)
}

fn read_metadata<R: Read + Seek>(path: &Path, decoder: &mut Decoder<R>) -> Result<TileMetadata> {
    let (width, height) = decoder.dimensions()?;
    let samples = usize::from(find_u16(decoder, Tag::SamplesPerPixel)?.unwrap_or(1));

    let bits = find_u16_vec(decoder, Tag::BitsPerSample)?
        .and_then(|v| v.first().copied())
        .unwrap_or(1);
    let format = find_u16_vec(decoder, Tag::SampleFormat)?
        .and_then(|v| v.first().copied())
        .unwrap_or(1);
    let pixel_type = PixelType::from_sample(path, format, bits)?;

    let photometric = find_u16(decoder, Tag::PhotometricInterpretation)?
        .unwrap_or(PHOTOMETRIC_MIN_IS_BLACK);
    let extra_samples = find_u16_vec(decoder, Tag::ExtraSamples)?.unwrap_or_default();
    let roles = color_roles(photometric, samples, &extra_samples);

    let nodata = decoder
        .find_tag(Tag::GdalNodata)?
        .map(Value::into_string)
        .transpose()?
        .and_then(|text| parse_nodata(&text));

    let geokeys = find_u16_vec(decoder, Tag::GeoKeyDirectoryTag)?.unwrap_or_default();
    let pixel_is_point = geokey(&geokeys, GT_RASTER_TYPE_GEO_KEY) == Some(RASTER_PIXEL_IS_POINT);
    let crs = crs_from_geokeys(&geokeys).ok_or_else(|| Error::Metadata {
        path: path.to_path_buf(),
        message: "no EPSG coordinate reference system in GeoKeyDirectory".to_string(),
    })?;

    let (origin_x, origin_y, xres, yres) = georeference(path, decoder)?;
    let (origin_x, origin_y) = if pixel_is_point {
        (origin_x - xres / 2.0, origin_y + yres / 2.0)
    } else {
        (origin_x, origin_y)
    };
    let bounds = Bounds::new(
        origin_x,
        origin_y - f64::from(height) * yres,
        origin_x + f64::from(width) * xres,
        origin_y,
    );

    let bands = roles
        .into_iter()
        .map(|role| BandInfo {
            pixel_type,
            color_role: role,
            nodata,
        })
        .collect();

    Ok(TileMetadata {
        crs,
        bounds,
        resolution: (xres, yres),
        width,
        height,
        bands,
        block_size: decoder.chunk_dimensions(),
    })
}

/// Origin (top-left corner) and positive pixel sizes.
fn georeference<R: Read + Seek>(path: &Path, decoder: &mut Decoder<R>) -> Result<(f64, f64, f64, f64)> {
    let scale = find_f64_vec(decoder, Tag::ModelPixelScaleTag)?;
    let tiepoint = find_f64_vec(decoder, Tag::ModelTiepointTag)?;

    let (origin_x, origin_y, xres, yres) = match (scale, tiepoint) {
        (Some(scale), Some(tiepoint)) if scale.len() >= 2 && tiepoint.len() >= 6 => {
            let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
            (x - i * scale[0], y + j * scale[1], scale[0], scale[1])
        }
        _ => match find_f64_vec(decoder, Tag::ModelTransformationTag)? {
            Some(m) if m.len() >= 8 => {
                if m[1] != 0.0 || m[4] != 0.0 {
                    return Err(Error::Metadata {
                        path: path.to_path_buf(),
                        message: "rotated ModelTransformation is not supported".to_string(),
                    });
                }
                (m[3], m[7], m[0], -m[5])
            }
            _ => {
                return Err(Error::Metadata {
                    path: path.to_path_buf(),
                    message: "no georeferencing tags".to_string(),
                })
            }
        },
    };

    if !(xres > 0.0 && yres > 0.0) {
        return Err(Error::Metadata {
            path: path.to_path_buf(),
            message: format!("raster is not north-up (pixel size {}, {})", xres, -yres),
        });
    }
    Ok((origin_x, origin_y, xres, yres))
}

/// Inline SHORT value of a GeoKey, if present.
///
/// The directory is a header of four shorts followed by one
/// `(key, location, count, value)` quadruple per key. Only keys stored
/// inline (location 0) carry their value directly.
fn geokey(directory: &[u16], key: u16) -> Option<u16> {
    let count = usize::from(*directory.get(3)?);
    directory
        .get(4..)?
        .chunks_exact(4)
        .take(count)
        .find(|entry| entry[0] == key && entry[1] == 0)
        .map(|entry| entry[3])
}

fn crs_from_geokeys(directory: &[u16]) -> Option<String> {
    [PROJECTED_CS_TYPE_GEO_KEY, GEOGRAPHIC_TYPE_GEO_KEY]
        .into_iter()
        .filter_map(|key| geokey(directory, key))
        .find(|code| *code != 0 && *code != USER_DEFINED)
        .map(|code| format!("EPSG:{}", code))
}

fn color_roles(photometric: u16, samples: usize, extra_samples: &[u16]) -> Vec<ColorRole> {
    let base: &[ColorRole] = match photometric {
        PHOTOMETRIC_RGB | PHOTOMETRIC_YCBCR if samples >= 3 => {
            &[ColorRole::Red, ColorRole::Green, ColorRole::Blue]
        }
        PHOTOMETRIC_MIN_IS_WHITE | PHOTOMETRIC_MIN_IS_BLACK => &[ColorRole::Gray],
        PHOTOMETRIC_PALETTE => &[ColorRole::Palette],
        PHOTOMETRIC_SEPARATED if samples >= 4 => &[
            ColorRole::Cyan,
            ColorRole::Magenta,
            ColorRole::Yellow,
            ColorRole::Black,
        ],
        _ => &[],
    };

    (1..=samples)
        .map(|band| {
            if let Some(role) = base.get(band - 1) {
                return *role;
            }
            // extra samples are listed for the bands after the base ones
            let extra_index = (band - 1).checked_sub(samples - extra_samples.len().min(samples));
            match extra_index.and_then(|i| extra_samples.get(i)) {
                Some(&EXTRA_SAMPLE_ASSOCIATED_ALPHA) | Some(&EXTRA_SAMPLE_UNASSOCIATED_ALPHA) => {
                    ColorRole::Alpha
                }
                Some(&EXTRA_SAMPLE_UNSPECIFIED) => ColorRole::Unspecified(band),
                _ => ColorRole::Undefined,
            }
        })
        .collect()
}

fn parse_nodata(text: &str) -> Option<f64> {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .parse()
        .ok()
}
