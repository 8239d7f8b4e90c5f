//! Output resolution selection.
//!
//! A mosaic has one pixel size per axis. [`Resolution`] chooses it from the
//! pixel sizes of the input tiles, or takes an explicit pair as given.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};

/// How the output pixel size is derived from the tiles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(try_from = "RawResolution")]
pub enum Resolution {
    /// Arithmetic mean of the tile pixel sizes, per axis.
    #[default]
    Average,
    /// Finest pixel size observed, per axis.
    Highest,
    /// Coarsest pixel size observed, per axis.
    Lowest,
    /// Explicit pixel size, used verbatim.
    Explicit { x: f64, y: f64 },
}

impl Resolution {
    pub fn explicit(x: f64, y: f64) -> Result<Self> {
        if !(x.is_finite() && y.is_finite() && x > 0.0 && y > 0.0) {
            return Err(Error::InvalidResolution {
                value: format!("{},{}", x, y),
            });
        }
        Ok(Resolution::Explicit { x, y })
    }

    /// Output pixel size for tiles with the given `(x, y)` pixel sizes.
    ///
    /// x and y are reduced independently. Keyword modes need at least one
    /// tile and fail with [`Error::EmptyInput`] otherwise. An explicit pair
    /// must be positive and finite, since it may be built without
    /// [`Resolution::explicit`].
    pub fn reconcile(&self, resolutions: &[(f64, f64)]) -> Result<(f64, f64)> {
        if let Resolution::Explicit { x, y } = *self {
            Resolution::explicit(x, y)?;
            return Ok((x, y));
        }
        if resolutions.is_empty() {
            return Err(Error::EmptyInput);
        }

        let xs = resolutions.iter().map(|r| r.0);
        let ys = resolutions.iter().map(|r| r.1);
        let reduced = match self {
            Resolution::Average => {
                let n = resolutions.len() as f64;
                (xs.sum::<f64>() / n, ys.sum::<f64>() / n)
            }
            Resolution::Highest => (xs.fold(f64::INFINITY, f64::min), ys.fold(f64::INFINITY, f64::min)),
            Resolution::Lowest => (
                xs.fold(f64::NEG_INFINITY, f64::max),
                ys.fold(f64::NEG_INFINITY, f64::max),
            ),
            Resolution::Explicit { .. } => unreachable!("handled above"),
        };
        Ok(reduced)
    }
}

impl FromStr for Resolution {
    type Err = Error;

    /// Accepts `average`, `highest`, `lowest` (any case) or a numeric pair
    /// such as `6,6` or `6 6`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "average" => return Ok(Resolution::Average),
            "highest" => return Ok(Resolution::Highest),
            "lowest" => return Ok(Resolution::Lowest),
            _ => {}
        }

        let invalid = || Error::InvalidResolution {
            value: s.to_string(),
        };
        let parts: Vec<&str> = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        match parts.as_slice() {
            [x, y] => {
                let x = x.parse::<f64>().map_err(|_| invalid())?;
                let y = y.parse::<f64>().map_err(|_| invalid())?;
                Resolution::explicit(x, y).map_err(|_| invalid())
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Average => f.write_str("average"),
            Resolution::Highest => f.write_str("highest"),
            Resolution::Lowest => f.write_str("lowest"),
            Resolution::Explicit { x, y } => write!(f, "{},{}", x, y),
        }
    }
}

/// Wire form accepted in configuration files: a keyword or `[x, y]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawResolution {
    Keyword(String),
    Pair([f64; 2]),
}

impl TryFrom<RawResolution> for Resolution {
    type Error = Error;

    fn try_from(raw: RawResolution) -> Result<Self> {
        match raw {
            RawResolution::Keyword(keyword) => keyword.parse(),
            RawResolution::Pair([x, y]) => Resolution::explicit(x, y),
        }
    }
}
