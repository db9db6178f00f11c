use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }
}

/// Wall-clock time of day at minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    /// Returns `None` unless `hour` is 0..=23 and `minute` is 0..=59.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }

    /// Parses `HH:MM`.
    pub fn parse(text: &str) -> Option<Self> {
        let (hour, minute) = text.trim().split_once(':')?;
        Self::new(hour.trim().parse().ok()?, minute.trim().parse().ok()?)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// One entry of the `/layers` catalog: a time-indexed shade overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadeLayerDescriptor {
    pub hour: u8,
    pub minute: u8,
    pub url: String,
    #[serde(rename = "params", alias = "parameters", default)]
    pub parameters: Map<String, Value>,
}

impl ShadeLayerDescriptor {
    pub fn time(&self) -> TimeOfDay {
        TimeOfDay {
            hour: self.hour,
            minute: self.minute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalRouteQuery {
    pub lat0: f64,
    pub lon0: f64,
    pub lat1: f64,
    pub lon1: f64,
    pub beta: f64,
    pub hour: u8,
    pub minute: u8,
}

impl OptimalRouteQuery {
    pub fn new(origin: Coordinate, destination: Coordinate, beta: f64, time: TimeOfDay) -> Self {
        Self {
            lat0: origin.lat,
            lon0: origin.lon,
            lat1: destination.lat,
            lon1: destination.lon,
            beta,
            hour: time.hour,
            minute: time.minute,
        }
    }

    pub fn origin(&self) -> Coordinate {
        Coordinate::new(self.lat0, self.lon0)
    }

    pub fn destination(&self) -> Coordinate {
        Coordinate::new(self.lat1, self.lon1)
    }

    pub fn time(&self) -> TimeOfDay {
        TimeOfDay {
            hour: self.hour,
            minute: self.minute,
        }
    }

    /// URL query string, without the leading `?`.
    pub fn query_string(&self) -> String {
        format!(
            "lat0={}&lon0={}&lat1={}&lon1={}&beta={}&hour={}&minute={}",
            self.lat0, self.lon0, self.lat1, self.lon1, self.beta, self.hour, self.minute
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortestRouteQuery {
    pub lat0: f64,
    pub lon0: f64,
    pub lat1: f64,
    pub lon1: f64,
    pub hour: u8,
    pub minute: u8,
}

impl ShortestRouteQuery {
    pub fn new(origin: Coordinate, destination: Coordinate, time: TimeOfDay) -> Self {
        Self {
            lat0: origin.lat,
            lon0: origin.lon,
            lat1: destination.lat,
            lon1: destination.lon,
            hour: time.hour,
            minute: time.minute,
        }
    }

    pub fn origin(&self) -> Coordinate {
        Coordinate::new(self.lat0, self.lon0)
    }

    pub fn destination(&self) -> Coordinate {
        Coordinate::new(self.lat1, self.lon1)
    }

    pub fn time(&self) -> TimeOfDay {
        TimeOfDay {
            hour: self.hour,
            minute: self.minute,
        }
    }

    pub fn query_string(&self) -> String {
        format!(
            "lat0={}&lon0={}&lat1={}&lon1={}&hour={}&minute={}",
            self.lat0, self.lon0, self.lat1, self.lon1, self.hour, self.minute
        )
    }
}

/// Body of a successful `/route/optimal` response. `route` is an opaque
/// GeoJSON geometry handed straight to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalRouteResponse {
    pub route: Value,
    pub length: f64,
    pub sun: f64,
}

/// Body of a successful `/route/shortest` response. The backend may also send
/// the geometry; it is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortestRouteResponse {
    pub length: f64,
    pub sun: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
