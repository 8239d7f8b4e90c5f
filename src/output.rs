//! # Output Configuration
//!
//! Terminal presentation for the CLI: whether to use colors and emoji, and
//! the human-readable summary printed after a build.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vrt_mosaic::output::{emoji, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Wrote mosaic.vrt", emoji(&out, "✅", "[OK]"));
//! ```

use std::env;
use std::fmt::Display;

use console::style;

use crate::plan::{format_decimal, MosaicPlan};

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve the `--color` flag value against the environment.
    ///
    /// `always` and `never` are taken as given; anything else (normally
    /// `auto`) defers to [`detect_color_support`](Self::detect_color_support).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_ascii_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    /// Colors are off under `NO_COLOR`, `CLICOLOR=0` or `TERM=dumb`, forced
    /// on by `CLICOLOR_FORCE`, and otherwise follow the terminal.
    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    pub fn plain() -> Self {
        Self { use_color: false }
    }

    pub fn colored() -> Self {
        Self { use_color: true }
    }

    /// Bold `value` when colors are enabled.
    pub fn strong<T: Display>(&self, value: T) -> String {
        if self.use_color {
            style(value).bold().to_string()
        } else {
            value.to_string()
        }
    }

    /// Dim `value` when colors are enabled.
    pub fn faint<T: Display>(&self, value: T) -> String {
        if self.use_color {
            style(value).dim().to_string()
        } else {
            value.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// The emoji when colors are enabled, the plain text alternative otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Indented `label: value` lines describing the frame of `plan`.
pub fn plan_summary(plan: &MosaicPlan, out: &OutputConfig) -> String {
    let rows = [
        ("Mode", plan.mode.to_string()),
        ("CRS", plan.crs.clone()),
        ("Size", format!("{} x {} px", plan.width, plan.height)),
        (
            "Resolution",
            format!(
                "{}, {}",
                format_decimal(plan.resolution.0),
                format_decimal(plan.resolution.1)
            ),
        ),
        ("Extent", plan.bounds.to_string()),
        (
            "Bands",
            format!("{} ({} sources)", plan.bands.len(), plan.source_count()),
        ),
    ];
    rows.iter()
        .map(|(label, value)| {
            format!(
                "   {} {}",
                out.faint(format!("{:<11}", format!("{}:", label))),
                out.strong(value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
