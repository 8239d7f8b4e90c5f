//! # Inspect Command Implementation
//!
//! This module implements the `inspect` subcommand, which prints the metadata
//! a build would read from each tile: CRS, extent, pixel size, raster size,
//! block size and per-band pixel type, color role and nodata.
//!
//! With `--json` the same information is printed as a JSON array for
//! scripting. This command never writes any file.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use vrt_mosaic::geotiff::GeoTiffReader;
use vrt_mosaic::metadata::{MetadataReader, TileMetadata};
use vrt_mosaic::output::{emoji, OutputConfig};
use vrt_mosaic::path::expand_inputs;
use vrt_mosaic::plan::format_decimal;

/// Show the metadata read from tiles
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Tiles, directories or glob patterns
    #[arg(value_name = "INPUTS", required = true)]
    pub inputs: Vec<String>,

    /// Print metadata as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct TileReport {
    path: String,
    #[serde(flatten)]
    metadata: TileMetadata,
}

fn read_reports<R: MetadataReader>(reader: &R, inputs: &[String]) -> Result<Vec<TileReport>> {
    expand_inputs(inputs, None)?
        .into_iter()
        .map(|path| {
            let metadata = reader
                .read(&path)
                .with_context(|| format!("Failed to inspect {}", path.display()))?;
            Ok(TileReport {
                path: path.display().to_string(),
                metadata,
            })
        })
        .collect()
}

fn render_report(report: &TileReport, out: &OutputConfig) -> String {
    let m = &report.metadata;
    let mut lines = vec![
        format!("{} {}", emoji(out, "📄", "[TILE]"), out.strong(&report.path)),
        format!("   CRS:        {}", m.crs),
        format!("   Size:       {} x {} px", m.width, m.height),
        format!(
            "   Resolution: {}, {}",
            format_decimal(m.resolution.0),
            format_decimal(m.resolution.1)
        ),
        format!("   Extent:     {}", m.bounds),
        format!("   Blocks:     {} x {}", m.block_size.0, m.block_size.1),
    ];
    for (i, band) in m.bands.iter().enumerate() {
        let nodata = band
            .nodata
            .map(|v| format!(", nodata {}", format_decimal(v)))
            .unwrap_or_default();
        lines.push(format!(
            "   Band {}:     {} {}{}",
            i + 1,
            band.pixel_type,
            band.color_role,
            nodata
        ));
    }
    lines.join("\n")
}

/// Execute the `inspect` command.
pub fn execute(args: InspectArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let reports = read_reports(&GeoTiffReader::new(), &args.inputs)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", render_report(report, &out));
        }
    }
    Ok(())
}
