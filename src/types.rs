//! Shared types used across the wrapper.
//! Includes `TileId`, `Resolution` and the runner configuration `Sen2CorParams`.
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Sentinel-2 MGRS tile code, two digits and three letters (e.g. `32PNA`)
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct TileId(String);

impl TileId {
    pub(crate) fn new(code: &str) -> Self {
        TileId(code.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which the metadata indexes this tile
    pub fn granule_key(&self) -> String {
        granule_key(&self.0)
    }
}

impl AsRef<str> for TileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Prefix a tile name with `T` unless it already carries it.
pub fn granule_key(tile: &str) -> String {
    if tile.starts_with('T') {
        tile.to_string()
    } else {
        format!("T{}", tile)
    }
}

/// Output resolutions Sen2Cor can produce
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize, Deserialize)]
pub enum Resolution {
    #[value(name = "10")]
    #[serde(rename = "10")]
    R10,
    #[value(name = "20")]
    #[serde(rename = "20")]
    R20,
    #[value(name = "60")]
    #[serde(rename = "60")]
    R60,
}

impl Resolution {
    pub fn meters(self) -> u32 {
        match self {
            Resolution::R10 => 10,
            Resolution::R20 => 20,
            Resolution::R60 => 60,
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.meters())
    }
}

impl TryFrom<u32> for Resolution {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(Resolution::R10),
            20 => Ok(Resolution::R20),
            60 => Ok(Resolution::R60),
            other => Err(Error::InvalidArgument {
                arg: "resolution",
                value: other.to_string(),
            }),
        }
    }
}

/// Runner parameters suitable for config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sen2CorParams {
    /// Sen2Cor executable, looked up on `PATH` unless a path is given
    pub command: String,
    /// Pass `--sc_only` so only the scene classification is produced
    pub sc_only: bool,
    /// Delay between two looks for the output files, in seconds in config files
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,
    /// Total time to keep looking before giving up, in seconds in config files
    #[serde(with = "duration_secs")]
    pub max_wait: Duration,
}

/// Durations as plain (possibly fractional) seconds, the unit of the CLI flags
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|e| de::Error::custom(format!("invalid duration {} s: {}", secs, e)))
    }
}

impl Default for Sen2CorParams {
    fn default() -> Self {
        Self {
            command: "L2A_Process".to_string(),
            sc_only: true,
            poll_interval: Duration::from_secs(30),
            max_wait: Duration::from_secs(1800),
        }
    }
}
