use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Visible map bounds used to scope results
///
/// A viewport with `west > east` spans the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Viewport {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Parse "north,south,east,west"
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;

        match parts.as_slice() {
            [north, south, east, west] if parts.iter().all(|v| v.is_finite()) => {
                Some(Self::new(*north, *south, *east, *west))
            }
            _ => None,
        }
    }

    /// Check whether a point lies inside the viewport, bounds inclusive
    pub fn contains(&self, point: &GeoPoint) -> bool {
        if point.latitude < self.south || point.latitude > self.north {
            return false;
        }

        if self.west <= self.east {
            point.longitude >= self.west && point.longitude <= self.east
        } else {
            point.longitude >= self.west || point.longitude <= self.east
        }
    }
}

/// Geospatial scope check
/// Without a viewport everything passes; with one, items lacking a location are dropped
pub fn within_scope(location: Option<&GeoPoint>, viewport: Option<&Viewport>) -> bool {
    match (viewport, location) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(viewport), Some(point)) => viewport.contains(point),
    }
}
