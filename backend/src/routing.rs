//! Synthetic routes for the development stub.
//!
//! Paths are interpolated between the endpoints with a sideways detour whose
//! size grows with β; sun exposure is path length scaled by a daylight curve.
//! Nothing here searches a street network.

use serde_json::{json, Value};

use crate::models::{Coordinate, TimeOfDay};

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const STEPS: usize = 32;
/// Largest detour amplitude, in degrees, reached at β = 1.
const MAX_DETOUR_DEG: f64 = 0.002;

#[derive(Debug, Clone)]
pub struct SyntheticRoute {
    pub path: Vec<Coordinate>,
    pub length_m: f64,
    pub sun: f64,
}

impl SyntheticRoute {
    /// GeoJSON `LineString` with `[lon, lat]` positions.
    pub fn geometry(&self) -> Value {
        let coordinates: Vec<[f64; 2]> = self.path.iter().map(|c| [c.lon, c.lat]).collect();
        json!({ "type": "LineString", "coordinates": coordinates })
    }
}

pub fn optimal_route(
    start: Coordinate,
    end: Coordinate,
    beta: f64,
    time: TimeOfDay,
) -> SyntheticRoute {
    let path = generate_path(start, end, beta);
    let length_m = path_length_m(&path);
    // Detours buy shade: exposure per meter drops as β rises.
    let sun = length_m * daylight(time) * (1.0 - 0.6 * beta);
    SyntheticRoute { path, length_m, sun }
}

pub fn shortest_route(start: Coordinate, end: Coordinate, time: TimeOfDay) -> SyntheticRoute {
    let path = generate_path(start, end, 0.0);
    let length_m = path_length_m(&path);
    let sun = length_m * daylight(time);
    SyntheticRoute { path, length_m, sun }
}

pub fn generate_path(start: Coordinate, end: Coordinate, beta: f64) -> Vec<Coordinate> {
    let mut path = Vec::with_capacity(STEPS + 1);
    let amplitude = beta.clamp(0.0, 1.0) * MAX_DETOUR_DEG;
    let perp = perpendicular_unit(start, end);

    for i in 0..=STEPS {
        let t = i as f64 / STEPS as f64;
        let mut point = start.interpolate(end, t);
        let bulge = (t * std::f64::consts::PI).sin() * amplitude;
        point.lat += perp.lat * bulge;
        point.lon += perp.lon * bulge;
        path.push(point);
    }

    path
}

/// Relative sun strength: 0 before 06:00 and after 18:00, 1 at noon.
pub fn daylight(time: TimeOfDay) -> f64 {
    let minutes = f64::from(time.minutes_since_midnight());
    let phase = (minutes - 360.0) / 720.0;
    if (0.0..=1.0).contains(&phase) {
        (phase * std::f64::consts::PI).sin()
    } else {
        0.0
    }
}

pub fn path_length_m(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| haversine_m(w[0], w[1])).sum()
}

fn perpendicular_unit(start: Coordinate, end: Coordinate) -> Coordinate {
    let dx = end.lon - start.lon;
    let dy = end.lat - start.lat;
    let len = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
    Coordinate {
        lon: -dy / len,
        lat: dx / len,
    }
}

pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u8, minute: u8) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    #[test]
    fn test_haversine_same_point() {
        let point = Coordinate { lat: 42.35, lon: -71.06 };
        assert_eq!(haversine_m(point, point), 0.0);
    }

    #[test]
    fn test_path_length_empty() {
        assert_eq!(path_length_m(&[]), 0.0);
    }

    #[test]
    fn test_daylight_curve() {
        assert_eq!(daylight(at(5, 0)), 0.0);
        assert_eq!(daylight(at(20, 0)), 0.0);
        assert!((daylight(at(12, 0)) - 1.0).abs() < 1e-12);
        assert!(daylight(at(9, 0)) < daylight(at(11, 0)));
    }

    #[test]
    fn test_path_endpoints_are_exact() {
        let a = Coordinate::new(42.35, -71.06);
        let b = Coordinate::new(42.36, -71.05);
        let path = generate_path(a, b, 1.0);
        assert_eq!(path.first(), Some(&a));
        let last = path.last().unwrap();
        assert!((last.lat - b.lat).abs() < 1e-12 && (last.lon - b.lon).abs() < 1e-12);
    }

    #[test]
    fn test_geometry_is_lon_lat_linestring() {
        let route = shortest_route(
            Coordinate::new(42.35, -71.06),
            Coordinate::new(42.36, -71.05),
            at(12, 0),
        );
        let geometry = route.geometry();
        assert_eq!(geometry["type"], "LineString");
        assert_eq!(geometry["coordinates"][0][0], -71.06);
        assert_eq!(geometry["coordinates"][0][1], 42.35);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn boston_coord() -> impl Strategy<Value = Coordinate> {
            (42.33..=42.37, -71.09..=-71.04).prop_map(|(lat, lon)| Coordinate { lat, lon })
        }

        proptest! {
            #[test]
            fn prop_haversine_symmetric(a in boston_coord(), b in boston_coord()) {
                prop_assert!((haversine_m(a, b) - haversine_m(b, a)).abs() < 1e-6);
            }

            #[test]
            fn prop_optimal_never_shorter_than_shortest(
                a in boston_coord(),
                b in boston_coord(),
                beta in 0.0f64..=1.0,
                hour in 0u8..24,
            ) {
                let time = at(hour, 0);
                let optimal = optimal_route(a, b, beta, time);
                let shortest = shortest_route(a, b, time);
                prop_assert!(optimal.length_m + 1e-3 >= shortest.length_m);
                prop_assert!(optimal.sun >= 0.0);
            }

            #[test]
            fn prop_more_beta_less_sun_per_meter(
                a in boston_coord(),
                b in boston_coord(),
                hour in 7u8..17,
            ) {
                prop_assume!(haversine_m(a, b) > 10.0);
                let time = at(hour, 0);
                let sunny = optimal_route(a, b, 0.0, time);
                let shady = optimal_route(a, b, 1.0, time);
                prop_assert!(shady.sun / shady.length_m < sunny.sun / sunny.length_m);
            }
        }
    }
}
