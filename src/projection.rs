//! Per-tile projection and geotransform from Sentinel-2 metadata, and stamping
//! them onto Sen2Cor classification files.
use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::io::{GranuleMeta, S2Metadata, add_crs, epsg_to_wkt, read_georef};
use crate::naming::{find_classfiles_at, tile_from_fname};
use crate::types::{Resolution, granule_key};

/// Projection, geotransform and raster size of one tile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileProjTrans {
    /// Coordinate reference system as WKT
    pub projection: String,
    /// North-up geotransform: (ULX, res, 0, ULY, 0, -res)
    pub geotransform: [f64; 6],
    pub nx: usize,
    pub ny: usize,
}

fn lookup<'a>(granule: &'a GranuleMeta, tile: &str, key: &str) -> Result<&'a str> {
    granule
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| Error::MissingKey {
            granule: tile.to_string(),
            key: key.to_string(),
        })
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Compute projection and geotransform for the requested tiles.
///
/// Tiles may be given with or without the `T` prefix; the result is keyed by
/// the names as given.
pub fn tiles_projtrans<S: AsRef<str>>(
    meta: &S2Metadata,
    tiles: &[S],
    resolution: Resolution,
) -> Result<BTreeMap<String, TileProjTrans>> {
    let res = resolution.to_string();
    let mut projtrans = BTreeMap::new();

    for tile in tiles {
        let tile = tile.as_ref();
        let key = granule_key(tile);
        let granule = meta.granule(&key).ok_or_else(|| Error::MissingKey {
            granule: key.clone(),
            key: format!("granules.{}", key),
        })?;

        let ulx_key = format!("ULX_{}", res);
        let uly_key = format!("ULY_{}", res);
        let cols_key = format!("cols_{}", res);
        let rows_key = format!("rows_{}", res);
        let ulx: f64 = parse_value(&ulx_key, lookup(granule, &key, &ulx_key)?)?;
        let uly: f64 = parse_value(&uly_key, lookup(granule, &key, &uly_key)?)?;
        let nx: usize = parse_value(&cols_key, lookup(granule, &key, &cols_key)?)?;
        let ny: usize = parse_value(&rows_key, lookup(granule, &key, &rows_key)?)?;

        let pixel = f64::from(resolution.meters());
        let geotransform = [ulx, pixel, 0.0, uly, 0.0, -pixel];

        // "EPSG:32632" -> 32632
        let crs = lookup(granule, &key, "projection")?;
        let code: u32 = parse_value("projection", crs.get(5..).unwrap_or_default())?;
        let projection = epsg_to_wkt(code)?;

        projtrans.insert(
            tile.to_string(),
            TileProjTrans {
                projection,
                geotransform,
                nx,
                ny,
            },
        );
    }
    Ok(projtrans)
}

/// Get tile projections and geotransforms from a metadata document
pub fn get_tiles_projtrans<P: AsRef<Path>, S: AsRef<str>>(
    xmlfile: P,
    tiles: &[S],
    resolution: Resolution,
) -> Result<BTreeMap<String, TileProjTrans>> {
    let meta = S2Metadata::open(xmlfile)?;
    tiles_projtrans(&meta, tiles, resolution)
}

/// Write the metadata projection and geotransform into every classification file
/// of an L2A product. Files are modified in place.
pub fn set_projection_on_classfiles<P: AsRef<Path>, Q: AsRef<Path>>(
    l2a_path: P,
    xmlfile: Q,
    resolution: Resolution,
) -> Result<()> {
    let classfiles = find_classfiles_at(l2a_path, resolution)?;
    let tiles = classfiles
        .iter()
        .map(tile_from_fname)
        .collect::<Result<Vec<_>>>()?;
    let projtrans = get_tiles_projtrans(xmlfile, &tiles, resolution)?;

    for (classfile, tile) in classfiles.iter().zip(&tiles) {
        let pt = &projtrans[tile.as_str()];

        let current = read_georef(classfile)?;
        if (current.size_x, current.size_y) != (pt.nx, pt.ny) {
            warn!(
                "Raster size {}x{} of {:?} differs from metadata size {}x{} for tile {}",
                current.size_x, current.size_y, classfile, pt.nx, pt.ny, tile
            );
        }

        add_crs(classfile, &pt.projection, &pt.geotransform)?;
        info!("Set projection of tile {} on {:?}", tile, classfile);
    }
    Ok(())
}
