//! In-memory rasters for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{BandArray, GeoTransform, Raster, RasterError, RasterOpener, WGS84_EPSG};

/// Constant-valued geographic raster covering lon 0..1, lat 43..44.
pub struct MockRaster {
    value: f32,
    size: u32,
}

impl Raster for MockRaster {
    fn width(&self) -> u32 {
        self.size
    }

    fn height(&self) -> u32 {
        self.size
    }

    fn geo_transform(&self) -> GeoTransform {
        let step = 1.0 / self.size as f64;
        GeoTransform::new([0.0, step, 0.0, 44.0, 0.0, -step])
    }

    fn epsg(&self) -> u32 {
        WGS84_EPSG
    }

    fn read_band(&self) -> Result<BandArray, RasterError> {
        Ok(BandArray::filled(self.size, self.size, self.value))
    }
}

/// Opens [`MockRaster`]s registered by path. Unknown paths fail.
#[derive(Default)]
pub struct MockOpener {
    rasters: HashMap<PathBuf, (f32, u32)>,
}

impl MockOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a 100×100 band of `value` at `path`.
    pub fn with_band(self, path: impl Into<PathBuf>, value: f32) -> Self {
        self.with_sized_band(path, value, 100)
    }

    pub fn with_sized_band(mut self, path: impl Into<PathBuf>, value: f32, size: u32) -> Self {
        self.rasters.insert(path.into(), (value, size));
        self
    }
}

impl RasterOpener for MockOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn Raster>, RasterError> {
        let (value, size) = self
            .rasters
            .get(path)
            .copied()
            .ok_or_else(|| RasterError::Open {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })?;
        Ok(Box::new(MockRaster { value, size }))
    }
}
