//! High-level, ergonomic library API: take an L1C product to georeferenced
//! scene classification files in one call, and batch helpers for directories.
//! Prefer these entrypoints over the lower-level `runner` and `projection` modules.
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::naming::path_l1c_to_l2a;
use crate::projection::set_projection_on_classfiles;
use crate::runner::run_sen2cor_with;
use crate::types::{Resolution, Sen2CorParams};

/// Run sen2cor on an L1C product and georeference the resulting SCL files
/// using the product's own metadata.
pub fn process_l1c(
    input: &Path,
    resolution: Resolution,
    params: &Sen2CorParams,
) -> Result<Vec<PathBuf>> {
    let classfiles = run_sen2cor_with(input, resolution, params)?;
    set_projection_on_classfiles(path_l1c_to_l2a(input), input, resolution)?;
    Ok(classfiles)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

fn is_l1c_product(path: &Path) -> bool {
    path.is_dir()
        && path
            .file_name()
            .map(|n| {
                let name = n.to_string_lossy();
                name.contains("L1C") && name.ends_with(".SAFE")
            })
            .unwrap_or(false)
}

// L1C products below `input_dir` (sorted) and the number of other entries
fn scan_directory(input_dir: &Path) -> Result<(Vec<PathBuf>, usize)> {
    let mut dirs = Vec::new();
    let mut others = 0;
    for entry in std::fs::read_dir(input_dir).map_err(Error::from)? {
        let path = entry.map_err(Error::from)?.path();
        if is_l1c_product(&path) {
            dirs.push(path);
        } else {
            others += 1;
        }
    }
    dirs.sort();
    Ok((dirs, others))
}

/// L1C SAFE directories directly below `input_dir`, sorted by path
pub fn iterate_l1c_products(input_dir: &Path) -> Result<std::vec::IntoIter<PathBuf>> {
    Ok(scan_directory(input_dir)?.0.into_iter())
}

/// Process every L1C product in `input_dir`. Entries that are not L1C
/// products are counted as skipped.
pub fn process_directory(
    input_dir: &Path,
    resolution: Resolution,
    params: &Sen2CorParams,
    continue_on_error: bool,
) -> Result<BatchReport> {
    let (products, skipped) = scan_directory(input_dir)?;
    let mut report = BatchReport {
        skipped,
        ..Default::default()
    };

    for path in products {
        info!("Processing: {:?}", path);
        match process_l1c(&path, resolution, params) {
            Ok(classfiles) => {
                info!("Successfully processed: {:?} ({} files)", path, classfiles.len());
                report.processed += 1;
            }
            Err(e) => {
                warn!("Error processing {:?}: {}", path, e);
                report.errors += 1;
                if !continue_on_error {
                    return Err(e);
                }
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn only_l1c_safe_directories_are_listed_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let later = root.join("S2B_MSIL1C_20200102T000000_N0208_R008_T32PNA.SAFE");
        let earlier = root.join("S2A_OPER_PRD_MSIL1C_PDMC_20151231T145524.SAFE");
        for dir in [&later, &earlier] {
            fs::create_dir_all(dir).unwrap();
        }
        fs::create_dir_all(root.join("S2A_USER_PRD_MSIL2A_PDMC_20151231T145524.SAFE")).unwrap();
        fs::create_dir_all(root.join("S2A_OPER_PRD_MSIL1C_PDMC_20151231T145524.zip.d")).unwrap();
        fs::write(root.join("S2A_OPER_PRD_MSIL1C_PDMC_20160101T000000.SAFE"), "").unwrap();

        let products: Vec<PathBuf> = iterate_l1c_products(root).unwrap().collect();
        assert_eq!(products, vec![earlier, later]);
    }

    #[test]
    fn missing_input_directory_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = iterate_l1c_products(&tmp.path().join("missing"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
