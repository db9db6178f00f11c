//! Interaction core of the shade-aware route planner.
//!
//! The stores ([`endpoints`], [`params`], [`shade`]) and the
//! [`controller::RouteController`] are composed by [`session::Session`],
//! which turns user input into [`service::Command`]s and applies completed
//! requests. Drawing goes through [`map::MapSurface`].

pub mod config;
pub mod controller;
pub mod endpoints;
pub mod error;
pub mod map;
pub mod params;
pub mod service;
pub mod session;
pub mod shade;

#[cfg(not(target_arch = "wasm32"))]
pub mod driver;
#[cfg(not(target_arch = "wasm32"))]
pub mod http;

pub use controller::{ComparisonMetrics, Generation, ResponseOutcome, RouteResult};
pub use endpoints::Role;
pub use error::ClientError;
pub use map::{InMemorySurface, MapSurface, MarkerHandle, Notice, OverlayHandle};
pub use service::{Command, Event, RouteService, ServiceError};
pub use session::{Handled, Session};

/// Local wall-clock time, truncated to the minute.
pub fn local_time_of_day() -> shared::TimeOfDay {
    use chrono::Timelike;

    let now = chrono::Local::now();
    shared::TimeOfDay {
        hour: now.hour() as u8,
        minute: now.minute() as u8,
    }
}
