//! I/O layer: Sentinel-2 metadata documents and GDAL-backed georeferencing.
//! Provides the `metadata` reader (quick-xml) and the `gdal` adapters used to
//! resolve EPSG codes and stamp projections onto classification rasters.
pub mod metadata;
pub use metadata::{GranuleMeta, MetadataError, S2Metadata};

pub mod gdal;
pub use gdal::{GdalError, GeoRef, add_crs, epsg_to_wkt, read_georef};
