//! Tile request options.
//!
//! Options arrive as query parameters:
//!
//! | key           | format            | default   |
//! |---------------|-------------------|-----------|
//! | `bands`       | `b1,b2,b3`        | `2,3,4`   |
//! | `first_clip`  | `min,max`         | `0,2500`  |
//! | `second_clip` | `min,max`         | `0,2500`  |
//! | `third_clip`  | `min,max`         | `0,2500`  |
//! | `zone`        | zone name         | resolved  |
//! | `date`        | `YYYYMMDD`        | resolved  |
//!
//! Unknown keys are ignored. Any malformed value is an
//! [`TileError::InvalidRequest`].

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;

use super::TileError;

/// Default band triple: blue, green, red.
pub const DEFAULT_BANDS: [u8; 3] = [2, 3, 4];

/// Default contrast stretch window.
pub const DEFAULT_CLIP: (f64, f64) = (0.0, 2500.0);

/// Ordered triple of band indices, one per output channel.
///
/// Bands are listed blue, green, red like the default `2,3,4`: the last band
/// fills the red channel and the first one the blue channel. Clip ranges
/// follow the band order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BandTriple([u8; 3]);

impl BandTriple {
    /// Creates a triple. Band indices must be in `1..=99`.
    pub fn new(bands: [u8; 3]) -> Result<Self, TileError> {
        if let Some(band) = bands.iter().find(|&&b| b == 0 || b > 99) {
            return Err(TileError::InvalidRequest(format!(
                "band index {} out of range",
                band
            )));
        }
        Ok(Self(bands))
    }

    pub fn indices(&self) -> [u8; 3] {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    /// Positions in the triple feeding the red, green and blue channels.
    pub const fn rgb_slots() -> [usize; 3] {
        [2, 1, 0]
    }

    /// Parses `"b1,b2,b3"`.
    pub fn parse(value: &str) -> Result<Self, TileError> {
        let parts: Vec<&str> = value.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(TileError::InvalidRequest(format!(
                "bands must list exactly 3 indices, got '{}'",
                value
            )));
        }

        let mut bands = [0u8; 3];
        for (slot, part) in bands.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                TileError::InvalidRequest(format!("invalid band index '{}'", part))
            })?;
        }
        Self::new(bands)
    }
}

impl Default for BandTriple {
    fn default() -> Self {
        Self(DEFAULT_BANDS)
    }
}

impl fmt::Display for BandTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.0[0], self.0[1], self.0[2])
    }
}

/// Linear contrast stretch window for one band. Always `min < max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRange {
    min: f64,
    max: f64,
}

impl ClipRange {
    pub fn new(min: f64, max: f64) -> Result<Self, TileError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(TileError::InvalidRequest(format!(
                "clip bounds must be finite, got ({}, {})",
                min, max
            )));
        }
        if min >= max {
            return Err(TileError::InvalidRequest(format!(
                "clip min {} must be below max {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Parses `"min,max"`.
    pub fn parse(value: &str) -> Result<Self, TileError> {
        let invalid = || TileError::InvalidRequest(format!("invalid clip range '{}'", value));

        let (min, max) = value.split_once(',').ok_or_else(invalid)?;
        let min: f64 = min.trim().parse().map_err(|_| invalid())?;
        let max: f64 = max.trim().parse().map_err(|_| invalid())?;
        Self::new(min, max)
    }
}

impl Default for ClipRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_CLIP.0,
            max: DEFAULT_CLIP.1,
        }
    }
}

/// Parsed per-request options.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TileOptions {
    pub bands: BandTriple,
    pub clips: [ClipRange; 3],
    pub zone: Option<String>,
    pub date: Option<NaiveDate>,
}

impl TileOptions {
    /// Parses query parameters, applying defaults for absent keys.
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self, TileError> {
        let mut options = TileOptions::default();

        if let Some(bands) = query.get("bands") {
            options.bands = BandTriple::parse(bands)?;
        }

        for (slot, key) in ["first_clip", "second_clip", "third_clip"].iter().enumerate() {
            if let Some(clip) = query.get(*key) {
                options.clips[slot] = ClipRange::parse(clip)?;
            }
        }

        if let Some(zone) = query.get("zone") {
            let zone = zone.trim();
            if zone.is_empty() {
                return Err(TileError::InvalidRequest("empty zone".to_string()));
            }
            options.zone = Some(zone.to_string());
        }

        if let Some(date) = query.get("date") {
            options.date = Some(parse_date(date)?);
        }

        Ok(options)
    }

    pub fn with_bands(mut self, bands: BandTriple) -> Self {
        self.bands = bands;
        self
    }

    pub fn with_clips(mut self, clips: [ClipRange; 3]) -> Self {
        self.clips = clips;
        self
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Parses a `YYYYMMDD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, TileError> {
    let value = value.trim();
    if value.len() != 8 {
        return Err(TileError::InvalidRequest(format!(
            "date must be YYYYMMDD, got '{}'",
            value
        )));
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .map_err(|_| TileError::InvalidRequest(format!("invalid date '{}'", value)))
}
