//! Integer-degree bucketed zone index.

use std::collections::HashMap;

use geo::{BoundingRect, Contains, MultiPolygon, Point};

/// A named imagery zone. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Zone {
    name: String,
    geometry: MultiPolygon<f64>,
    cell: (i32, i32),
}

impl Zone {
    /// Creates a zone, deriving its grid cell from the floor of the polygon's
    /// south-west bound. Returns `None` for an empty geometry.
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        let cell = (rect.min().x.floor() as i32, rect.min().y.floor() as i32);
        Some(Self {
            name: name.into(),
            geometry,
            cell,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// Integer-degree `(lon, lat)` cell the zone is filed under.
    pub fn cell(&self) -> (i32, i32) {
        self.cell
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.geometry.contains(&Point::new(lon, lat))
    }
}

/// Point to zone lookup over a fixed set of zones.
///
/// When zones overlap the first containing zone wins, visiting cells with
/// longitude offset -1, 0, +1 in the outer loop, latitude offset -1, 0, +1 in
/// the inner loop, and zones within a cell in load order. There is no
/// priority rule beyond that order.
#[derive(Debug, Default)]
pub struct ZoneIndex {
    zones: Vec<Zone>,
    buckets: HashMap<(i32, i32), Vec<usize>>,
}

impl ZoneIndex {
    pub fn new(zones: Vec<Zone>) -> Self {
        let mut buckets: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        for (i, zone) in zones.iter().enumerate() {
            buckets.entry(zone.cell).or_default().push(i);
        }
        Self { zones, buckets }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Finds the zone containing `(lon, lat)`, or `None` when no candidate
    /// polygon contains the point.
    pub fn find_zone(&self, lon: f64, lat: f64) -> Option<&Zone> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }

        let key_x = lon.floor() as i32;
        let key_y = lat.floor() as i32;

        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(candidates) = self.buckets.get(&(key_x + dx, key_y + dy)) else {
                    continue;
                };
                for &i in candidates {
                    let zone = &self.zones[i];
                    if zone.contains(lon, lat) {
                        return Some(zone);
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn square_zone(name: &str, lon: f64, lat: f64, size: f64) -> Zone {
        let poly = polygon![
            (x: lon, y: lat),
            (x: lon + size, y: lat),
            (x: lon + size, y: lat + size),
            (x: lon, y: lat + size),
            (x: lon, y: lat),
        ];
        Zone::new(name, MultiPolygon::new(vec![poly])).unwrap()
    }

    fn toulouse_index() -> ZoneIndex {
        ZoneIndex::new(vec![
            square_zone("31TCJ", 0.5, 43.2, 1.4),
            square_zone("31TDJ", 1.9, 43.2, 1.4),
            square_zone("31THR", 10.0, 40.0, 1.0),
        ])
    }

    #[test]
    fn test_zone_cell_from_bounds() {
        let zone = square_zone("31TCJ", 0.5, 43.2, 1.4);
        assert_eq!(zone.cell(), (0, 43));

        let zone = square_zone("19HCD", -70.5, -33.4, 1.0);
        assert_eq!(zone.cell(), (-71, -34));
    }

    #[test]
    fn test_find_zone_in_own_cell() {
        let index = toulouse_index();
        assert_eq!(index.find_zone(0.7, 43.5).unwrap().name(), "31TCJ");
    }

    #[test]
    fn test_find_zone_in_neighbouring_cell() {
        // Point cell is (1, 43), zone is filed under (0, 43)
        let index = toulouse_index();
        assert_eq!(index.find_zone(1.433333, 43.6).unwrap().name(), "31TCJ");
    }

    #[test]
    fn test_find_zone_none_outside_coverage() {
        let index = toulouse_index();
        assert!(index.find_zone(50.51, -116.0).is_none());
        assert!(index.find_zone(5.0, 43.5).is_none());
    }

    #[test]
    fn test_find_zone_rejects_non_finite() {
        let index = toulouse_index();
        assert!(index.find_zone(f64::NAN, 43.5).is_none());
    }

    #[test]
    fn test_find_zone_overlap_first_in_iteration_order() {
        // Both contain (1.5, 43.5); the zone in the western cell is visited first
        let index = ZoneIndex::new(vec![
            square_zone("EAST", 1.2, 43.2, 1.0),
            square_zone("WEST", 0.8, 43.2, 1.0),
        ]);
        assert_eq!(index.find_zone(1.5, 43.5).unwrap().name(), "WEST");
    }

    #[test]
    fn test_find_zone_is_idempotent() {
        let index = toulouse_index();
        let first = index.find_zone(1.72, 43.62).map(|z| z.name().to_string());
        for _ in 0..10 {
            let again = index.find_zone(1.72, 43.62).map(|z| z.name().to_string());
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_empty_geometry_rejected() {
        assert!(Zone::new("EMPTY", MultiPolygon::new(vec![])).is_none());
    }
}
