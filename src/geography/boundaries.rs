use serde::{Deserialize, Serialize};

/// Axis-aligned latitude/longitude rectangle approximating a country
///
/// Coarse on purpose: it can include foreign territory and miss outlying
/// parts of the real country.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountryBoundary {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl CountryBoundary {
    pub const fn new(lat_min: f64, lat_max: f64, lng_min: f64, lng_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lng_min,
            lng_max,
        }
    }

    /// Edges are inclusive
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&latitude)
            && (self.lng_min..=self.lng_max).contains(&longitude)
    }

    /// True when the point lies within `tolerance` degrees of the rectangle
    /// (inside it, or outside but close to an edge)
    pub fn within_tolerance(&self, latitude: f64, longitude: f64, tolerance: f64) -> bool {
        self.expanded(tolerance).contains(latitude, longitude)
    }

    fn expanded(&self, by: f64) -> Self {
        Self::new(
            self.lat_min - by,
            self.lat_max + by,
            self.lng_min - by,
            self.lng_max + by,
        )
    }
}
