use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::naming::tile_from_fname;

/// Errors encountered when reading Sentinel-2 metadata documents
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Invalid granule metadata pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("No granule metadata found in {0:?}")]
    NoGranules(PathBuf),
}

/// Flat key/value table describing one granule (`ULX_60`, `rows_60`, `projection`, ...)
pub type GranuleMeta = BTreeMap<String, String>;

/// Granule geocoding parsed from Sentinel-2 L1C metadata, keyed by `T`-prefixed tile
#[derive(Debug, Clone, Default)]
pub struct S2Metadata {
    pub granules: BTreeMap<String, GranuleMeta>,
}

impl S2Metadata {
    /// Build from an already-available granule table
    pub fn from_granules(granules: BTreeMap<String, GranuleMeta>) -> Self {
        Self { granules }
    }

    pub fn granule(&self, key: &str) -> Option<&GranuleMeta> {
        self.granules.get(key)
    }

    /// Find and parse metadata from a tile XML, a product XML or a SAFE directory.
    ///
    /// A tile document is used as-is. Otherwise every `GRANULE/*/*MTD*.xml` of
    /// the product is parsed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let mut meta = S2Metadata::default();

        let product_root = if path.is_dir() {
            path.to_path_buf()
        } else {
            if let Some((key, granule)) = Self::parse_tile_file(path)? {
                meta.granules.insert(key, granule);
                return Ok(meta);
            }
            path.parent().map(Path::to_path_buf).unwrap_or_default()
        };

        for xml in Self::granule_documents(&product_root)? {
            if let Some((key, granule)) = Self::parse_tile_file(&xml)? {
                debug!("Parsed granule {} from {:?}", key, xml);
                meta.granules.insert(key, granule);
            }
        }

        if meta.granules.is_empty() {
            return Err(MetadataError::NoGranules(path.to_path_buf()));
        }
        info!(
            "Loaded metadata for {} granules from {:?}",
            meta.granules.len(),
            path
        );
        Ok(meta)
    }

    fn granule_documents(product_root: &Path) -> Result<Vec<PathBuf>, MetadataError> {
        let granule_dir = product_root.join("GRANULE");
        if !granule_dir.is_dir() {
            return Ok(Vec::new());
        }
        let pattern = Path::new(&glob::Pattern::escape(&granule_dir.to_string_lossy()))
            .join("*")
            .join("*MTD*.xml");
        let mut docs = Vec::new();
        for entry in glob::glob(&pattern.to_string_lossy())? {
            docs.push(entry.map_err(|e| e.into_error())?);
        }
        docs.sort();
        Ok(docs)
    }

    fn parse_tile_file(path: &Path) -> Result<Option<(String, GranuleMeta)>, MetadataError> {
        let mut reader = Reader::from_file(path)?;
        let Some((key, granule)) = parse_tile_geocoding(&mut reader)? else {
            return Ok(None);
        };
        if let Some(key) = key {
            return Ok(Some((key, granule)));
        }
        // Older granule documents without TILE_ID: fall back on the file name
        match tile_from_fname(path) {
            Ok(tile) => Ok(Some((tile.granule_key(), granule))),
            Err(_) => Ok(None),
        }
    }
}

fn resolution_attr(e: &BytesStart) -> Result<Option<String>, quick_xml::Error> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == b"resolution" {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Parse the `Tile_Geocoding` block of a granule metadata document.
///
/// Returns `None` when the document has no geocoding (e.g. a product-level
/// document). The key is the `T`-prefixed tile taken from `TILE_ID`, if present.
pub fn parse_tile_geocoding<R: BufRead>(
    reader: &mut Reader<R>,
) -> Result<Option<(Option<String>, GranuleMeta)>, MetadataError> {
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut curr = String::new();
    let mut in_geocoding = false;
    let mut found_geocoding = false;
    let mut size_res: Option<String> = None;
    let mut geopos_res: Option<String> = None;
    let mut tile_key = None;
    let mut granule = GranuleMeta::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match tag.as_str() {
                    "Tile_Geocoding" => {
                        in_geocoding = true;
                        found_geocoding = true;
                    }
                    "Size" if in_geocoding => size_res = resolution_attr(e)?,
                    "Geoposition" if in_geocoding => geopos_res = resolution_attr(e)?,
                    _ => {}
                }
                curr = tag;
            }
            Event::End(ref e) => {
                match e.local_name().as_ref() {
                    b"Tile_Geocoding" => in_geocoding = false,
                    b"Size" => size_res = None,
                    b"Geoposition" => geopos_res = None,
                    _ => {}
                }
                curr.clear();
            }
            Event::Text(e) => {
                let txt = e.unescape()?.to_string();
                match curr.as_str() {
                    "TILE_ID" if tile_key.is_none() => {
                        tile_key = tile_from_fname(&txt).ok().map(|t| t.granule_key());
                        granule.insert("tile_id".to_string(), txt);
                    }
                    "HORIZONTAL_CS_CODE" if in_geocoding => {
                        granule.insert("projection".to_string(), txt);
                    }
                    "HORIZONTAL_CS_NAME" if in_geocoding => {
                        granule.insert("projection_name".to_string(), txt);
                    }
                    "NROWS" | "NCOLS" => {
                        if let Some(res) = &size_res {
                            let name = if curr == "NROWS" { "rows" } else { "cols" };
                            granule.insert(format!("{}_{}", name, res), txt);
                        }
                    }
                    "ULX" | "ULY" | "XDIM" | "YDIM" => {
                        if let Some(res) = &geopos_res {
                            granule.insert(format!("{}_{}", curr, res), txt);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !found_geocoding {
        return Ok(None);
    }
    Ok(Some((tile_key, granule)))
}
