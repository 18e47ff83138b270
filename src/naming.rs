//! Sentinel-2 naming conventions: tile codes in file names, L1C → L2A product
//! names and the location of Sen2Cor scene classification (SCL) files.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use glob::Pattern;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Resolution, TileId};

const TILE_PATTERN: &str = "T([0-9]{2}[A-Z]{3})";

static TILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(TILE_PATTERN).expect("valid tile regex"));

/// Get the tile code from a Sentinel-2 standard file name
pub fn tile_from_fname<P: AsRef<Path>>(fname: P) -> Result<TileId> {
    let fname = fname.as_ref();
    let base = fname
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| fname.to_string_lossy().into_owned());
    TILE_RE
        .captures(&base)
        .and_then(|caps| caps.get(1))
        .map(|m| TileId::new(m.as_str()))
        .ok_or_else(|| Error::TileNotFound {
            name: base.clone(),
            pattern: TILE_PATTERN,
        })
}

/// Convert a product path from L1C to L2A naming.
///
/// Only the last component is rewritten (`L1C` → `L2A`, `OPER` → `USER`);
/// names without the markers pass through unchanged.
pub fn path_l1c_to_l2a<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    let Some(base) = path.file_name() else {
        return path.to_path_buf();
    };
    // Byte-level so names that are not valid UTF-8 survive untouched
    let bytes = replace_ascii(base.as_encoded_bytes(), b"L1C", b"L2A");
    let bytes = replace_ascii(&bytes, b"OPER", b"USER");
    // SAFETY: only ASCII runs were swapped for ASCII runs of equal length,
    // so the buffer is still a valid encoding of an OsStr.
    let converted = unsafe { OsString::from_encoded_bytes_unchecked(bytes) };
    match path.parent() {
        Some(root) => root.join(converted),
        None => PathBuf::from(converted),
    }
}

fn replace_ascii(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    while !rest.is_empty() {
        if rest.starts_with(from) {
            out.extend_from_slice(to);
            rest = &rest[from.len()..];
        } else {
            out.push(rest[0]);
            rest = &rest[1..];
        }
    }
    out
}

/// Glob pattern matching the SCL files Sen2Cor writes below `l2a_path`
pub fn classfile_pattern(l2a_path: &Path, resolution: Resolution) -> String {
    let root = Pattern::escape(&l2a_path.to_string_lossy());
    Path::new(&root)
        .join("GRANULE")
        .join("S2A_*_L2A_*")
        .join("IMG_DATA")
        .join(format!("S2A_USER_SCL_L2A_*_{}m.jp2", resolution))
        .to_string_lossy()
        .into_owned()
}

/// Find the 60 m classification files in an L2A product
pub fn find_classfiles<P: AsRef<Path>>(l2a_path: P) -> Result<Vec<PathBuf>> {
    find_classfiles_at(l2a_path, Resolution::R60)
}

/// Find the classification files of the given resolution, sorted by path
pub fn find_classfiles_at<P: AsRef<Path>>(
    l2a_path: P,
    resolution: Resolution,
) -> Result<Vec<PathBuf>> {
    let l2a_path = l2a_path.as_ref();
    if !l2a_path.is_dir() {
        return Err(Error::ProductDirNotFound(l2a_path.to_path_buf()));
    }

    let pattern = classfile_pattern(l2a_path, resolution);
    let mut classfiles = glob::glob(&pattern)?
        .map(|entry| entry.map_err(|e| Error::Io(e.into_error())))
        .collect::<Result<Vec<_>>>()?;
    if classfiles.is_empty() {
        return Err(Error::NoClassFiles { pattern });
    }
    classfiles.sort();
    debug!("Found {} classification files: {:?}", classfiles.len(), classfiles);
    Ok(classfiles)
}
