//! Path utilities for vrt-mosaic
//!
//! Lexical normalization, relative source paths, and expansion of input
//! arguments (files, directories, glob patterns) into tile lists.

use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};

/// File extensions picked up when a directory is given as input.
const RASTER_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// Remove `.` components and fold `..` into their parent, without touching
/// the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Absolute form of `path`.
///
/// Existing paths are canonicalized. For a path that does not exist yet
/// (such as a document about to be written) the parent is canonicalized
/// when it exists; otherwise the lexical join with the current directory is
/// returned.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    let joined = if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&std::env::current_dir()?.join(path))
    };
    match (joined.parent(), joined.file_name()) {
        (Some(parent), Some(name)) => match parent.canonicalize() {
            Ok(parent) => Ok(parent.join(name)),
            Err(_) => Ok(joined),
        },
        _ => Ok(joined),
    }
}

/// Express the absolute `path` relative to the absolute directory `base`.
///
/// Computed lexically: symlinks are not resolved.
pub fn relative_to(path: &Path, base: &Path) -> Result<String> {
    if !path.is_absolute() || !base.is_absolute() {
        return Err(Error::Path {
            message: format!(
                "cannot relate \"{}\" to \"{}\": both paths must be absolute",
                path.display(),
                base.display()
            ),
        });
    }
    let path = normalize(path);
    let base = normalize(base);

    let mut path_parts = path.components().peekable();
    let mut base_parts = base.components().peekable();
    // different roots (e.g. drive letters) share no prefix
    if path_parts.peek() != base_parts.peek() {
        return Err(Error::Path {
            message: format!(
                "\"{}\" and \"{}\" do not share a root",
                path.display(),
                base.display()
            ),
        });
    }
    while let (Some(a), Some(b)) = (path_parts.peek(), base_parts.peek()) {
        if a != b {
            break;
        }
        path_parts.next();
        base_parts.next();
    }

    let mut relative = PathBuf::new();
    for _ in base_parts {
        relative.push("..");
    }
    for part in path_parts {
        relative.push(part.as_os_str());
    }
    Ok(relative.display().to_string())
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn has_raster_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| RASTER_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand input arguments into an ordered list of tile paths.
///
/// - a directory contributes every `.tif`/`.tiff` file beneath it, sorted by
///   file name
/// - a glob pattern contributes its matches in sorted order, and must match
///   at least one file
/// - anything else is taken literally, existing or not
///
/// Relative inputs are resolved against `base` when given. The order of the
/// inputs is preserved; it is the order in which sources are written.
pub fn expand_inputs<S: AsRef<str>>(inputs: &[S], base: Option<&Path>) -> Result<Vec<PathBuf>> {
    let anchor = |p: &Path| match base {
        Some(base) if p.is_relative() => base.join(p),
        _ => p.to_path_buf(),
    };

    let mut tiles = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        let path = anchor(Path::new(input));

        if path.is_dir() {
            let before = tiles.len();
            for entry in walkdir::WalkDir::new(&path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if has_raster_extension(entry.path()) {
                    tiles.push(entry.into_path());
                }
            }
            debug!(
                "Directory {} contributed {} tile(s)",
                path.display(),
                tiles.len() - before
            );
        } else if is_glob_pattern(input) {
            let pattern = path.to_string_lossy().into_owned();
            let before = tiles.len();
            for entry in glob::glob(&pattern)? {
                let entry = entry.map_err(|e| Error::Io(e.into()))?;
                if entry.is_file() {
                    tiles.push(entry);
                }
            }
            if tiles.len() == before {
                return Err(Error::Path {
                    message: format!("pattern \"{}\" matched no files", pattern),
                });
            }
        } else {
            tiles.push(path);
        }
    }
    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("./tile.tif")), PathBuf::from("tile.tif"));
    }

    #[test]
    fn test_absolutize_relative_path() {
        let abs = absolutize(Path::new("some/tile.tif")).unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("some/tile.tif"));
    }

    #[test]
    fn test_relative_to_sibling_and_child() {
        assert_eq!(
            relative_to(Path::new("/data/tiles/a.tif"), Path::new("/data/tiles")).unwrap(),
            "a.tif"
        );
        assert_eq!(
            relative_to(Path::new("/data/tiles/a.tif"), Path::new("/data/out")).unwrap(),
            "../tiles/a.tif"
        );
        assert_eq!(
            relative_to(Path::new("/data/a.tif"), Path::new("/other/deep/dir")).unwrap(),
            "../../../data/a.tif"
        );
    }

    #[test]
    fn test_relative_to_requires_absolute_paths() {
        let err = relative_to(Path::new("a.tif"), Path::new("/data")).unwrap_err();
        assert!(matches!(err, Error::Path { .. }));
    }

    #[test]
    fn test_expand_directory_picks_rasters_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.tif", "a.TIFF", "notes.txt", "c.tiff"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let tiles = expand_inputs(&[dir.path().to_string_lossy()], None).unwrap();
        let names: Vec<_> = tiles
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.TIFF", "b.tif", "c.tiff"]);
    }

    #[test]
    fn test_expand_glob_and_literal_keep_argument_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["t1.tif", "t2.tif", "z.tif"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let tiles = expand_inputs(&["z.tif", "t*.tif", "missing.tif"], Some(dir.path())).unwrap();
        assert_eq!(
            tiles,
            vec![
                dir.path().join("z.tif"),
                dir.path().join("t1.tif"),
                dir.path().join("t2.tif"),
                dir.path().join("missing.tif"),
            ]
        );
    }

    #[test]
    fn test_expand_unmatched_glob_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = expand_inputs(&["*.tif"], Some(dir.path())).unwrap_err();
        assert!(err.to_string().contains("matched no files"));
    }

    #[test]
    fn test_absolutize_missing_file_in_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let abs = absolutize(&dir.path().join("out.vrt")).unwrap();
        assert_eq!(abs, dir.path().canonicalize().unwrap().join("out.vrt"));
    }

    #[test]
    fn test_expand_invalid_pattern() {
        let err = expand_inputs(&["[unclosed*"], None).unwrap_err();
        assert!(matches!(err, Error::Glob(_)));
    }
}
