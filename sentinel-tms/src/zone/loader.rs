//! Zone geometry loading from GeoJSON.
//!
//! The Sentinel-2 tiling grid is distributed as KML; converting it once to a
//! GeoJSON FeatureCollection (e.g. with `ogr2ogr`) gives one Polygon or
//! MultiPolygon feature per zone, with the zone name as a string property.

use std::fs;
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{GeoJson, Geometry, Value};
use tracing::{info, warn};

use super::{Zone, ZoneError};

/// Reads every polygonal feature of a GeoJSON FeatureCollection as a [`Zone`].
///
/// Features without a string `name_property` or without polygon geometry are
/// skipped with a warning. Coordinates are taken as WGS84 lon/lat; any third
/// (altitude) component is ignored.
pub fn load_zones_geojson(path: &Path, name_property: &str) -> Result<Vec<Zone>, ZoneError> {
    let content = fs::read_to_string(path).map_err(|source| ZoneError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let zones = parse_zones(&content, name_property).map_err(|message| ZoneError::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    if zones.is_empty() {
        return Err(ZoneError::Empty(path.to_path_buf()));
    }

    info!(path = %path.display(), zones = zones.len(), "Loaded zone geometry");
    Ok(zones)
}

fn parse_zones(content: &str, name_property: &str) -> Result<Vec<Zone>, String> {
    let geojson: GeoJson = content.parse().map_err(|e| format!("{}", e))?;

    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err("expected a FeatureCollection of named zones".to_string())
        }
    };

    let mut zones = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let Some(name) = feature
            .property(name_property)
            .and_then(|value| value.as_str())
        else {
            warn!(feature = i, property = name_property, "Skipping zone without name");
            continue;
        };

        let Some(geometry) = feature.geometry.as_ref().and_then(geometry_to_multipolygon) else {
            warn!(zone = name, "Skipping zone without polygon geometry");
            continue;
        };

        match Zone::new(name, geometry) {
            Some(zone) => zones.push(zone),
            None => warn!(zone = name, "Skipping zone with empty geometry"),
        }
    }

    Ok(zones)
}

fn geometry_to_multipolygon(geom: &Geometry) -> Option<MultiPolygon<f64>> {
    match &geom.value {
        Value::Polygon(rings) => Some(MultiPolygon::new(vec![polygon_from_rings(rings)?])),
        Value::MultiPolygon(polygons) => {
            let polygons: Vec<Polygon<f64>> = polygons
                .iter()
                .filter_map(|rings| polygon_from_rings(rings))
                .collect();
            (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
        }
        Value::GeometryCollection(members) => {
            let polygons: Vec<Polygon<f64>> = members
                .iter()
                .filter_map(geometry_to_multipolygon)
                .flat_map(|mp| mp.0)
                .collect();
            (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
        }
        _ => None,
    }
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    let exterior = ring_to_linestring(exterior)?;
    let interiors = interiors.iter().filter_map(|r| ring_to_linestring(r)).collect();
    Some(Polygon::new(exterior, interiors))
}

fn ring_to_linestring(ring: &[Vec<f64>]) -> Option<LineString<f64>> {
    let coords: Vec<Coord<f64>> = ring
        .iter()
        .filter(|position| position.len() >= 2)
        .map(|position| Coord {
            x: position[0],
            y: position[1],
        })
        .collect();

    (coords.len() >= 3).then(|| LineString::from(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ZONES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "Name": "31TCJ" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.5, 43.2, 0.0], [1.9, 43.2, 0.0], [1.9, 44.6, 0.0], [0.5, 44.6, 0.0], [0.5, 43.2, 0.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "Name": "01CAA" },
                "geometry": {
                    "type": "GeometryCollection",
                    "geometries": [
                        { "type": "Polygon", "coordinates": [[[179.5, -80.0], [180.0, -80.0], [180.0, -79.0], [179.5, -80.0]]] },
                        { "type": "Point", "coordinates": [179.7, -79.5] }
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": { "other": "x" },
                "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] }
            },
            {
                "type": "Feature",
                "properties": { "Name": "POINT" },
                "geometry": { "type": "Point", "coordinates": [0, 0] }
            }
        ]
    }"#;

    #[test]
    fn test_parse_named_polygons() {
        let zones = parse_zones(ZONES, "Name").unwrap();
        let names: Vec<&str> = zones.iter().map(|z| z.name()).collect();
        assert_eq!(names, vec!["31TCJ", "01CAA"]);
        assert_eq!(zones[0].cell(), (0, 43));
        assert_eq!(zones[1].cell(), (179, -80));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ZONES.as_bytes()).unwrap();

        let zones = load_zones_geojson(file.path(), "Name").unwrap();
        assert_eq!(zones.len(), 2);
        assert!(zones[0].contains(1.433333, 43.6));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_zones_geojson(Path::new("/nonexistent/zones.geojson"), "Name");
        assert!(matches!(result, Err(ZoneError::Io { .. })));
    }

    #[test]
    fn test_load_without_usable_zones() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ZONES.as_bytes()).unwrap();

        let result = load_zones_geojson(file.path(), "Missing");
        assert!(matches!(result, Err(ZoneError::Empty(_))));
    }

    #[test]
    fn test_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let result = load_zones_geojson(file.path(), "Name");
        assert!(matches!(result, Err(ZoneError::Parse { .. })));
    }
}
