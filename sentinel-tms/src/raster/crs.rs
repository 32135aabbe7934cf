//! Coordinate reference system transforms using proj4rs (pure Rust).

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use super::RasterError;

/// EPSG code of WGS84 geographic coordinates.
pub const WGS84_EPSG: u32 = 4326;

/// Point transform between two EPSG coordinate systems.
///
/// Geographic systems take and return degrees; proj4rs works in radians
/// internally so conversions happen at the edges.
pub struct CrsTransform {
    projection: Option<Projection>,
}

struct Projection {
    source: Proj,
    target: Proj,
    source_is_geographic: bool,
    target_is_geographic: bool,
}

impl CrsTransform {
    /// Builds a transform from `source_epsg` to `target_epsg`.
    ///
    /// Identical codes produce an identity transform without touching the
    /// definitions database.
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, RasterError> {
        if source_epsg == target_epsg {
            return Ok(Self { projection: None });
        }

        let source_def = proj_string(source_epsg)?;
        let target_def = proj_string(target_epsg)?;

        let source = Proj::from_proj_string(source_def)
            .map_err(|e| RasterError::Projection(format!("EPSG:{}: {:?}", source_epsg, e)))?;
        let target = Proj::from_proj_string(target_def)
            .map_err(|e| RasterError::Projection(format!("EPSG:{}: {:?}", target_epsg, e)))?;

        Ok(Self {
            projection: Some(Projection {
                source,
                target,
                source_is_geographic: source_def.contains("+proj=longlat"),
                target_is_geographic: target_def.contains("+proj=longlat"),
            }),
        })
    }

    /// Converts a point from the source CRS to the target CRS.
    pub fn convert(&self, x: f64, y: f64) -> Result<(f64, f64), RasterError> {
        let Some(projection) = &self.projection else {
            return Ok((x, y));
        };

        let mut point = if projection.source_is_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        transform(&projection.source, &projection.target, &mut point)
            .map_err(|e| RasterError::Projection(format!("({}, {}): {:?}", x, y, e)))?;

        if projection.target_is_geographic {
            Ok((point.0.to_degrees(), point.1.to_degrees()))
        } else {
            Ok((point.0, point.1))
        }
    }
}

fn proj_string(epsg: u32) -> Result<&'static str, RasterError> {
    u16::try_from(epsg)
        .ok()
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4)
        .ok_or(RasterError::UnsupportedCrs(epsg))
}
