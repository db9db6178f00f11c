use serde::{Deserialize, Serialize};

pub use shared::{
    ApiError, Coordinate, OptimalRouteQuery, OptimalRouteResponse, ShadeLayerDescriptor,
    ShortestRouteQuery, TimeOfDay,
};

/// Geographic box (WGS84 degrees) where routes can be computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainBounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl DomainBounds {
    pub fn contains(&self, point: Coordinate) -> bool {
        point.lon >= self.min_lon
            && point.lon <= self.max_lon
            && point.lat >= self.min_lat
            && point.lat <= self.max_lat
    }
}

impl Default for DomainBounds {
    /// Central Boston.
    fn default() -> Self {
        Self {
            min_lon: -71.0900,
            max_lon: -71.0400,
            min_lat: 42.3300,
            max_lat: 42.3700,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_contains_edges() {
        let domain = DomainBounds::default();
        assert!(domain.contains(Coordinate::new(42.35, -71.06)));
        assert!(domain.contains(Coordinate::new(domain.min_lat, domain.min_lon)));
        assert!(!domain.contains(Coordinate::new(42.40, -71.06)));
        assert!(!domain.contains(Coordinate::new(42.35, -70.0)));
    }
}
