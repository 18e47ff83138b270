use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DatasetOptions, GdalOpenFlags, errors::GdalError as GdalCrateError};
use std::path::Path;
use thiserror::Error;

/// Errors encountered when talking to GDAL
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Georeferencing currently attached to a raster
#[derive(Debug, Clone)]
pub struct GeoRef {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Affine geotransform coefficients ([origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height])
    pub geotransform: Option<[f64; 6]>,
    /// Projection in WKT format, empty when none is set
    pub projection: String,
}

impl GeoRef {
    /// EPSG code from the projection's authority tag, if any
    pub fn epsg(&self) -> Option<u32> {
        parse_epsg(&self.projection)
    }
}

// Top-level EPSG authority is the last one in a WKT1 string
fn parse_epsg(wkt: &str) -> Option<u32> {
    const KEY: &str = "AUTHORITY[\"EPSG\",\"";
    let idx = wkt.rfind(KEY)?;
    let start = idx + KEY.len();
    let end = wkt[start..].find('"')?;
    wkt[start..start + end].parse().ok()
}

/// Build a spatial reference from an EPSG code and export it as WKT
pub fn epsg_to_wkt(code: u32) -> Result<String, GdalError> {
    let srs = SpatialRef::from_epsg(code)?;
    Ok(srs.to_wkt()?)
}

/// Read size, geotransform and projection of a raster
pub fn read_georef<P: AsRef<Path>>(path: P) -> Result<GeoRef, GdalError> {
    let dataset = Dataset::open(path.as_ref())?;
    if dataset.raster_count() == 0 {
        return Err(GdalError::UnsupportedFormat("No raster bands found".into()));
    }
    let (size_x, size_y) = dataset.raster_size();
    Ok(GeoRef {
        size_x: size_x as usize,
        size_y: size_y as usize,
        geotransform: dataset.geo_transform().ok(),
        projection: dataset.projection(),
    })
}

/// Write projection and geotransform into an existing raster, in place
pub fn add_crs<P: AsRef<Path>>(
    path: P,
    projection: &str,
    geotransform: &[f64; 6],
) -> Result<(), GdalError> {
    let options = DatasetOptions {
        open_flags: GdalOpenFlags::GDAL_OF_RASTER | GdalOpenFlags::GDAL_OF_UPDATE,
        ..Default::default()
    };
    let mut ds = Dataset::open_ex(path.as_ref(), options)?;
    ds.set_projection(projection)?;
    ds.set_geo_transform(geotransform)?;
    Ok(())
}
