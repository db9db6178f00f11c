use std::fmt;

use shared::Coordinate;

use crate::error::ClientError;
use crate::map::{MapSurface, MarkerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Origin,
    Destination,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Origin, Role::Destination];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Origin => "origin",
            Role::Destination => "destination",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    role: Role,
    coordinate: Coordinate,
    marker: MarkerHandle,
}

impl Endpoint {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn marker(&self) -> MarkerHandle {
        self.marker
    }
}

/// Copy of the endpoint coordinates at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EndpointSnapshot {
    pub origin: Option<Coordinate>,
    pub destination: Option<Coordinate>,
}

impl EndpointSnapshot {
    pub fn pair(&self) -> Option<(Coordinate, Coordinate)> {
        Some((self.origin?, self.destination?))
    }

    pub fn len(&self) -> usize {
        usize::from(self.origin.is_some()) + usize::from(self.destination.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// At most one endpoint per role, each owning the marker drawn for it.
#[derive(Debug, Default)]
pub struct EndpointStore {
    origin: Option<Endpoint>,
    destination: Option<Endpoint>,
}

impl EndpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, role: Role) -> &mut Option<Endpoint> {
        match role {
            Role::Origin => &mut self.origin,
            Role::Destination => &mut self.destination,
        }
    }

    pub fn get(&self, role: Role) -> Option<&Endpoint> {
        match role {
            Role::Origin => self.origin.as_ref(),
            Role::Destination => self.destination.as_ref(),
        }
    }

    /// Retires the marker previously drawn for `role`, then draws and stores
    /// the new one.
    pub fn set_endpoint(
        &mut self,
        surface: &mut impl MapSurface,
        role: Role,
        coordinate: Coordinate,
    ) -> Result<&Endpoint, ClientError> {
        if !coordinate.is_finite() {
            return Err(ClientError::InvalidCoordinate {
                lat: coordinate.lat,
                lon: coordinate.lon,
            });
        }
        let slot = self.slot(role);
        if let Some(previous) = slot.take() {
            surface.remove_marker(previous.marker);
        }
        let marker = surface.add_marker(role, coordinate);
        tracing::debug!(%role, lat = coordinate.lat, lon = coordinate.lon, "endpoint set");
        Ok(slot.insert(Endpoint {
            role,
            coordinate,
            marker,
        }))
    }

    /// Removes the endpoint for `role`; returns whether one was present.
    pub fn clear(&mut self, surface: &mut impl MapSurface, role: Role) -> bool {
        match self.slot(role).take() {
            Some(previous) => {
                surface.remove_marker(previous.marker);
                tracing::debug!(%role, "endpoint cleared");
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&mut self, surface: &mut impl MapSurface) {
        for role in Role::ALL {
            self.clear(surface, role);
        }
    }

    pub fn snapshot(&self) -> EndpointSnapshot {
        EndpointSnapshot {
            origin: self.origin.as_ref().map(Endpoint::coordinate),
            destination: self.destination.as_ref().map(Endpoint::coordinate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::InMemorySurface;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon)
    }

    #[test]
    fn test_set_endpoint_replaces_marker() {
        let mut surface = InMemorySurface::new();
        let mut store = EndpointStore::new();

        let first = store
            .set_endpoint(&mut surface, Role::Origin, coord(42.35, -71.06))
            .unwrap()
            .marker();
        let second = store
            .set_endpoint(&mut surface, Role::Origin, coord(42.36, -71.07))
            .unwrap()
            .marker();

        assert_ne!(first, second);
        assert_eq!(surface.marker_count(Role::Origin), 1);
        assert_eq!(store.snapshot().origin, Some(coord(42.36, -71.07)));
    }

    #[test]
    fn test_snapshot_pair_requires_both_roles() {
        let mut surface = InMemorySurface::new();
        let mut store = EndpointStore::new();
        assert!(store.snapshot().is_empty());

        store
            .set_endpoint(&mut surface, Role::Destination, coord(1.0, 2.0))
            .unwrap();
        assert_eq!(store.snapshot().len(), 1);
        assert!(store.snapshot().pair().is_none());

        store
            .set_endpoint(&mut surface, Role::Origin, coord(3.0, 4.0))
            .unwrap();
        assert_eq!(
            store.snapshot().pair(),
            Some((coord(3.0, 4.0), coord(1.0, 2.0)))
        );
    }

    #[test]
    fn test_clear_removes_marker() {
        let mut surface = InMemorySurface::new();
        let mut store = EndpointStore::new();
        store
            .set_endpoint(&mut surface, Role::Origin, coord(1.0, 1.0))
            .unwrap();
        store
            .set_endpoint(&mut surface, Role::Destination, coord(2.0, 2.0))
            .unwrap();

        assert!(store.clear(&mut surface, Role::Origin));
        assert!(!store.clear(&mut surface, Role::Origin));
        assert_eq!(surface.marker_count(Role::Origin), 0);
        assert_eq!(surface.marker_count(Role::Destination), 1);

        store.clear_all(&mut surface);
        assert_eq!(surface.markers().count(), 0);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_non_finite_coordinate_rejected_without_mutation() {
        let mut surface = InMemorySurface::new();
        let mut store = EndpointStore::new();
        store
            .set_endpoint(&mut surface, Role::Origin, coord(1.0, 1.0))
            .unwrap();

        let err = store
            .set_endpoint(&mut surface, Role::Origin, coord(f64::NAN, 1.0))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidCoordinate { .. }));
        assert_eq!(store.snapshot().origin, Some(coord(1.0, 1.0)));
        assert_eq!(surface.marker_count(Role::Origin), 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn valid_coord() -> impl Strategy<Value = Coordinate> {
            (-90.0..=90.0, -180.0..=180.0).prop_map(|(lat, lon)| Coordinate { lat, lon })
        }

        fn role() -> impl Strategy<Value = Role> {
            prop_oneof![Just(Role::Origin), Just(Role::Destination)]
        }

        proptest! {
            #[test]
            fn prop_at_most_one_marker_per_role(
                ops in prop::collection::vec((role(), prop::option::of(valid_coord())), 0..40)
            ) {
                let mut surface = InMemorySurface::new();
                let mut store = EndpointStore::new();
                for (role, target) in ops {
                    match target {
                        Some(at) => { store.set_endpoint(&mut surface, role, at).unwrap(); }
                        None => { store.clear(&mut surface, role); }
                    }
                    for role in Role::ALL {
                        let expected = usize::from(store.get(role).is_some());
                        prop_assert_eq!(surface.marker_count(role), expected);
                    }
                }
            }
        }
    }
}
