//! # Build Command Implementation
//!
//! This module implements the `build` subcommand, which writes a VRT document
//! combining a list of tiles.
//!
//! ## Inputs
//!
//! Tiles come from positional arguments (files, directories, glob patterns)
//! or from a YAML mosaic file given with `--config` (or the
//! `VRT_MOSAIC_CONFIG` environment variable). Flags given on the command line
//! override the values in the file.
//!
//! ## Dry Run
//!
//! `--dry-run` reads every tile and prints the planned document as a tree of
//! bands and sources without writing anything.

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use ptree::{write_tree, TreeItem};
use std::borrow::Cow;
use std::io::{self, Write};
use std::path::PathBuf;

use vrt_mosaic::config::MosaicConfig;
use vrt_mosaic::document::{vrt_tree, write_document};
use vrt_mosaic::geotiff::GeoTiffReader;
use vrt_mosaic::output::{emoji, plan_summary, OutputConfig};
use vrt_mosaic::path::{absolutize, expand_inputs};
use vrt_mosaic::plan::{format_decimal, Mode, MosaicPlan, OutputBand, PixelSource};
use vrt_mosaic::resolution::Resolution;
use vrt_mosaic::VrtBuilder;

/// Write a VRT mosaic or stack from a list of tiles
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Destination VRT file
    #[arg(value_name = "OUTPUT", required_unless_present = "config")]
    pub output: Option<PathBuf>,

    /// Tiles, directories or glob patterns, in source order
    #[arg(value_name = "INPUTS")]
    pub inputs: Vec<String>,

    /// Write source paths relative to the VRT file
    #[arg(long)]
    pub relative: bool,

    /// One band per tile (first band only) instead of a mosaic
    #[arg(long)]
    pub stack: bool,

    /// Output resolution: average, highest, lowest or "XRES,YRES"
    #[arg(long, value_name = "RES", value_parser = parse_resolution)]
    pub resolution: Option<Resolution>,

    /// YAML mosaic file providing output, inputs and options
    #[arg(short, long, value_name = "FILE", env = "VRT_MOSAIC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the planned document instead of writing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Only report errors
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_resolution(value: &str) -> std::result::Result<Resolution, String> {
    value.parse::<Resolution>().map_err(|e| e.to_string())
}

/// Fully resolved build request.
#[derive(Debug)]
struct Request {
    dest: PathBuf,
    files: Vec<PathBuf>,
    relative: bool,
    mode: Mode,
    resolution: Resolution,
}

fn resolve(args: &BuildArgs) -> Result<Request> {
    let config = args
        .config
        .as_ref()
        .map(|path| {
            MosaicConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        })
        .transpose()?;

    let dest = match (&args.output, &config) {
        (Some(output), _) => output.clone(),
        (None, Some(config)) => config.output_path(),
        (None, None) => bail!("No OUTPUT given and no --config file"),
    };

    let files = if !args.inputs.is_empty() {
        expand_inputs(&args.inputs, None)?
    } else if let Some(config) = &config {
        config.tile_paths()?
    } else {
        Vec::new()
    };

    let mode = if args.stack {
        Mode::Stack
    } else {
        config.as_ref().map(|c| c.mode).unwrap_or_default()
    };

    Ok(Request {
        dest,
        files,
        relative: args.relative || config.as_ref().is_some_and(|c| c.relative),
        mode,
        resolution: args
            .resolution
            .or_else(|| config.as_ref().map(|c| c.resolution))
            .unwrap_or_default(),
    })
}

/// Execute the `build` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: BuildArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let request = resolve(&args)?;
    let dest = absolutize(&request.dest)?;

    let builder = VrtBuilder::new(GeoTiffReader::new())
        .relative(request.relative)
        .mode(request.mode)
        .resolution(request.resolution);
    let plan = builder
        .plan(&dest, &request.files)
        .with_context(|| format!("Failed to build {}", dest.display()))?;

    if args.dry_run {
        println!(
            "{} Planned {} (not written)",
            emoji(&out, "🔍", "[PLAN]"),
            out.strong(dest.display())
        );
        let mut stdout = io::stdout();
        write_tree(&plan_tree(&plan, &dest), &mut stdout)
            .map_err(|e| anyhow!("Failed to display plan: {}", e))?;
        stdout.flush()?;
        return Ok(());
    }

    write_document(&vrt_tree(&plan), &dest)
        .with_context(|| format!("Failed to write {}", dest.display()))?;
    log::info!("Wrote {}", dest.display());

    if !args.quiet {
        println!(
            "{} Wrote {}",
            emoji(&out, "✅", "[OK]"),
            out.strong(dest.display())
        );
        println!("{}", plan_summary(&plan, &out));
    }
    Ok(())
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct PlanNode {
    label: String,
    children: Vec<PlanNode>,
}

impl TreeItem for PlanNode {
    type Child = PlanNode;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &ptree::Style) -> io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}

fn source_node(source: &PixelSource) -> PlanNode {
    let mut label = format!(
        "{} {} band {} at ({}, {}) size {}x{}",
        source.kind.tag(),
        source.path,
        source.band,
        source.dst.x_off,
        source.dst.y_off,
        source.dst.x_size,
        source.dst.y_size
    );
    if let Some(nodata) = source.nodata {
        label.push_str(&format!(" nodata {}", format_decimal(nodata)));
    }
    PlanNode {
        label,
        children: vec![],
    }
}

fn band_node(band: &OutputBand) -> PlanNode {
    let role = band
        .color_role
        .and_then(|r| r.label())
        .map(|l| format!(" {}", l))
        .unwrap_or_default();
    PlanNode {
        label: format!("Band {} {}{}", band.index, band.pixel_type, role),
        children: band.sources.iter().map(source_node).collect(),
    }
}

fn plan_tree(plan: &MosaicPlan, dest: &std::path::Path) -> PlanNode {
    PlanNode {
        label: format!(
            "{} {}x{} px {} [{}]",
            dest.display(),
            plan.width,
            plan.height,
            plan.crs,
            plan.transform
        ),
        children: plan.bands.iter().map(band_node).collect(),
    }
}
