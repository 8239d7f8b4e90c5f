//! # CLI Command Implementations
//!
//! Each subcommand of `vrt-mosaic` lives in its own file with:
//! - an `Args` struct defining its arguments, derived using `clap`;
//! - an `execute` function taking the parsed `Args` and calling into the
//!   `vrt_mosaic` library.

pub mod build;
pub mod completions;
pub mod inspect;
