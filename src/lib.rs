#![doc = r#"
sen2cor-wrapper — run Sen2Cor scene classification and georeference its output.

This crate drives the external Sen2Cor processor (`L2A_Process`) on Sentinel-2 L1C
products in "scene classification only" mode, waits for the SCL rasters to appear,
and writes the tile projection and geotransform from the L1C metadata into them.
It powers the `sen2cor-wrapper` CLI and can be embedded in your own Rust applications.

Requirements
------------
- Sen2Cor installed, with `L2A_Process` on `PATH` (or configured via `Sen2CorParams`).
- GDAL development headers and runtime available on your system.
- Rust 2024 edition toolchain.

Quick start: process one L1C product
------------------------------------
```rust,no_run
use std::path::Path;
use sen2cor_wrapper::{api::process_l1c, Resolution, Sen2CorParams};

fn main() -> sen2cor_wrapper::Result<()> {
    let classfiles = process_l1c(
        Path::new("/data/S2A_OPER_PRD_MSIL1C_PDMC_20151231T145524.SAFE"),
        Resolution::R60,
        &Sen2CorParams::default(),
    )?;
    for f in classfiles {
        println!("{}", f.display());
    }
    Ok(())
}
```

Step by step
------------
```rust,no_run
use std::path::Path;
use sen2cor_wrapper::{
    path_l1c_to_l2a, run_sen2cor, set_projection_on_classfiles, Resolution,
};

fn main() -> sen2cor_wrapper::Result<()> {
    let l1c = Path::new("/data/S2A_OPER_PRD_MSIL1C_PDMC_20151231T145524.SAFE");
    let classfiles = run_sen2cor(l1c, Resolution::R60)?;
    println!("sen2cor wrote {} SCL files", classfiles.len());
    set_projection_on_classfiles(path_l1c_to_l2a(l1c), l1c, Resolution::R60)
}
```

Error handling
--------------
All public functions return `sen2cor_wrapper::Result<T>`; match on `sen2cor_wrapper::Error`
to tell a failing Sen2Cor run from missing output or metadata problems.

```rust,no_run
use std::path::Path;
use sen2cor_wrapper::{run_sen2cor, Error, Resolution};

fn main() {
    match run_sen2cor(Path::new("/data/S2A_OPER_PRD_MSIL1C.SAFE"), Resolution::R20) {
        Ok(files) => println!("{} files", files.len()),
        Err(Error::Process { command, code }) => eprintln!("{command} failed with {code:?}"),
        Err(Error::Timeout { path, .. }) => eprintln!("no output in {path:?}"),
        Err(other) => eprintln!("Other error: {other}"),
    }
}
```

Useful modules
--------------
- [`api`] — high-level, ergonomic entry points.
- [`naming`] — tile codes, L1C → L2A names, SCL file discovery.
- [`runner`] — launching and awaiting Sen2Cor.
- [`projection`] — per-tile projection/geotransform and writing it to SCL files.
- [`io`] — metadata XML reader and GDAL adapters.
- [`types`] — `TileId`, `Resolution`, `Sen2CorParams`.
- [`error`] — crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod error;
pub mod io;
pub mod naming;
pub mod projection;
pub mod runner;
pub mod types;

// Types
pub use error::{Error, Result};
pub use types::{Resolution, Sen2CorParams, TileId};

// Readers / GDAL adapters
pub use io::{GdalError, GeoRef, MetadataError, S2Metadata};

// Core operations
pub use naming::{find_classfiles, find_classfiles_at, path_l1c_to_l2a, tile_from_fname};
pub use projection::{
    TileProjTrans, get_tiles_projtrans, set_projection_on_classfiles, tiles_projtrans,
};
pub use runner::{run_sen2cor, run_sen2cor_with};

// High-level API re-exports
pub use api::{BatchReport, iterate_l1c_products, process_directory, process_l1c};
