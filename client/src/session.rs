use shared::{Coordinate, TimeOfDay};

use crate::controller::{RefreshInputs, RefreshPlan, RouteController};
use crate::endpoints::{EndpointStore, Role};
use crate::error::ClientError;
use crate::map::{MapSurface, Notice};
use crate::params::{Beta, ParameterStore};
use crate::service::{Command, Event};
use crate::shade::ShadeLayerManager;

pub use crate::controller::ResponseOutcome;

/// Result of feeding one completed request back into the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Handled {
    pub outcome: ResponseOutcome,
    /// Follow-up requests, e.g. a refresh after the catalog changed the
    /// effective time.
    pub commands: Vec<Command>,
}

impl Handled {
    fn only(outcome: ResponseOutcome) -> Self {
        Self {
            outcome,
            commands: Vec::new(),
        }
    }
}

/// One interactive session: the stores, the route controller and the map
/// they draw on.
///
/// Every mutation returns the requests it needs issued; the caller runs them
/// and hands each completion to [`Session::handle`]. All calls are expected
/// on a single thread, one at a time.
pub struct Session<S: MapSurface> {
    surface: S,
    endpoints: EndpointStore,
    params: ParameterStore,
    shade: ShadeLayerManager,
    routes: RouteController,
    started_at: TimeOfDay,
}

impl<S: MapSurface> Session<S> {
    /// `started_at` picks the default shade layer and stands in for the
    /// selected time until a catalog is available.
    pub fn new(surface: S, started_at: TimeOfDay, shade_visible: bool) -> Self {
        Self {
            surface,
            endpoints: EndpointStore::new(),
            params: ParameterStore::new(),
            shade: ShadeLayerManager::new(shade_visible),
            routes: RouteController::new(),
            started_at,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn endpoints(&self) -> &EndpointStore {
        &self.endpoints
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn shade(&self) -> &ShadeLayerManager {
        &self.shade
    }

    pub fn routes(&self) -> &RouteController {
        &self.routes
    }

    pub fn beta(&self) -> Beta {
        self.params.beta()
    }

    /// Time used for route requests: the selected layer's time, or the
    /// session start time while no catalog is loaded.
    pub fn effective_time(&self) -> TimeOfDay {
        self.shade.selected_time().unwrap_or(self.started_at)
    }

    /// Requests the catalog unless it is loaded or already being fetched.
    pub fn load_catalog(&mut self) -> Vec<Command> {
        if self.shade.begin_load() {
            vec![Command::FetchCatalog]
        } else {
            Vec::new()
        }
    }

    pub fn refresh(&mut self) -> Vec<Command> {
        let inputs = RefreshInputs {
            endpoints: self.endpoints.snapshot(),
            beta: self.params.beta(),
            time: self.effective_time(),
        };
        match self.routes.refresh(&mut self.surface, inputs) {
            RefreshPlan::Cleared => Vec::new(),
            RefreshPlan::Requests { optimal, shortest } => vec![
                Command::FetchOptimal {
                    generation: optimal.0,
                    query: optimal.1,
                },
                Command::FetchShortest {
                    generation: shortest.0,
                    query: shortest.1,
                },
            ],
        }
    }

    pub fn set_endpoint(
        &mut self,
        role: Role,
        coordinate: Coordinate,
    ) -> Result<Vec<Command>, ClientError> {
        self.endpoints
            .set_endpoint(&mut self.surface, role, coordinate)?;
        Ok(self.refresh())
    }

    pub fn clear_endpoint(&mut self, role: Role) -> Vec<Command> {
        self.endpoints.clear(&mut self.surface, role);
        self.refresh()
    }

    /// Clears both endpoints; the drawn route goes with them.
    pub fn reset(&mut self) -> Vec<Command> {
        self.endpoints.clear_all(&mut self.surface);
        self.refresh()
    }

    pub fn set_beta(&mut self, value: f64) -> Result<Vec<Command>, ClientError> {
        let beta = self.params.set_beta(value)?;
        tracing::debug!(beta = beta.value(), "beta updated");
        Ok(self.refresh())
    }

    /// Switches the shade overlay to catalog entry `index` and recomputes the
    /// route for that time. Invalid indices change nothing.
    pub fn set_time_selection(&mut self, index: usize) -> Result<Vec<Command>, ClientError> {
        let time = self.shade.select_index(&mut self.surface, index)?.time();
        self.params.set_time_index(index);
        tracing::debug!(index, %time, "time selection updated");
        Ok(self.refresh())
    }

    pub fn set_shade_visible(&mut self, visible: bool) {
        self.shade.set_visible(&mut self.surface, visible);
    }

    pub fn handle(&mut self, event: Event) -> Handled {
        match event {
            Event::CatalogFetched(Err(err)) => {
                let err = self.shade.fail_load(err.to_string());
                self.surface.notify(Notice::CatalogUnavailable);
                Handled::only(ResponseOutcome::Failed(err))
            }
            Event::CatalogFetched(Ok(layers)) => {
                let before = self.effective_time();
                match self
                    .shade
                    .install_catalog(&mut self.surface, layers, self.started_at)
                {
                    Ok(index) => {
                        self.params.set_time_index(index);
                        let commands = if self.endpoints.snapshot().pair().is_some()
                            && self.effective_time() != before
                        {
                            self.refresh()
                        } else {
                            Vec::new()
                        };
                        Handled {
                            outcome: ResponseOutcome::Applied,
                            commands,
                        }
                    }
                    Err(err) => {
                        self.surface.notify(Notice::CatalogUnavailable);
                        Handled::only(ResponseOutcome::Failed(err))
                    }
                }
            }
            Event::OptimalFetched {
                generation,
                query,
                result,
            } => Handled::only(self.routes.handle_optimal(
                &mut self.surface,
                generation,
                &query,
                result,
            )),
            Event::ShortestFetched {
                generation,
                query,
                result,
            } => Handled::only(self.routes.handle_shortest(generation, &query, result)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::InMemorySurface;
    use crate::service::ServiceError;
    use serde_json::{json, Map};
    use shared::{OptimalRouteResponse, ShadeLayerDescriptor, ShortestRouteResponse};

    fn layer(hour: u8, minute: u8) -> ShadeLayerDescriptor {
        ShadeLayerDescriptor {
            hour,
            minute,
            url: "http://tiles.local/geoserver/ows".into(),
            parameters: Map::new(),
        }
    }

    fn session() -> Session<InMemorySurface> {
        Session::new(InMemorySurface::new(), TimeOfDay::new(9, 40).unwrap(), false)
    }

    fn loaded_session() -> Session<InMemorySurface> {
        let mut session = session();
        assert_eq!(session.load_catalog(), vec![Command::FetchCatalog]);
        let handled = session.handle(Event::CatalogFetched(Ok(vec![layer(9, 0), layer(10, 0)])));
        assert_eq!(handled.outcome, ResponseOutcome::Applied);
        session
    }

    fn optimal_commands(commands: &[Command]) -> Vec<&Command> {
        commands
            .iter()
            .filter(|c| matches!(c, Command::FetchOptimal { .. }))
            .collect()
    }

    fn answer_optimal(session: &mut Session<InMemorySurface>, command: &Command, tag: &str) -> ResponseOutcome {
        let Command::FetchOptimal { generation, query } = command else {
            panic!("not an optimal command: {command:?}");
        };
        session
            .handle(Event::OptimalFetched {
                generation: *generation,
                query: query.clone(),
                result: Ok(OptimalRouteResponse {
                    route: json!({"type": "LineString", "tag": tag}),
                    length: 120.0,
                    sun: 40.0,
                }),
            })
            .outcome
    }

    #[test]
    fn test_catalog_default_is_nearest_to_start() {
        let session = loaded_session();
        assert_eq!(session.shade().selected_index(), Some(1));
        assert_eq!(session.params().time_index(), Some(1));
        assert_eq!(session.effective_time(), TimeOfDay::new(10, 0).unwrap());
    }

    #[test]
    fn test_load_catalog_is_requested_once() {
        let mut session = session();
        assert_eq!(session.load_catalog().len(), 1);
        assert!(session.load_catalog().is_empty());
    }

    #[test]
    fn test_catalog_failure_is_reported_once() {
        let mut session = session();
        session.load_catalog();
        let handled = session.handle(Event::CatalogFetched(Err(ServiceError::Transport(
            "connection refused".into(),
        ))));
        assert!(matches!(
            handled.outcome,
            ResponseOutcome::Failed(ClientError::CatalogUnavailable(_))
        ));
        assert!(handled.commands.is_empty());
        assert_eq!(session.surface().notices(), &[Notice::CatalogUnavailable]);
        assert!(session.surface().shade_overlays().is_empty());
    }

    #[test]
    fn test_no_fetch_with_fewer_than_two_endpoints() {
        let mut session = loaded_session();
        assert!(session.refresh().is_empty());
        let commands = session
            .set_endpoint(Role::Origin, Coordinate::new(42.35, -71.06))
            .unwrap();
        assert!(commands.is_empty());
    }

    #[test]
    fn test_second_endpoint_triggers_both_requests() {
        let mut session = loaded_session();
        session
            .set_endpoint(Role::Origin, Coordinate::new(42.35, -71.06))
            .unwrap();
        let commands = session
            .set_endpoint(Role::Destination, Coordinate::new(42.36, -71.05))
            .unwrap();
        assert_eq!(commands.len(), 2);
        match &commands[0] {
            Command::FetchOptimal { query, .. } => {
                assert_eq!(query.beta, 0.5);
                assert_eq!((query.hour, query.minute), (10, 0));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(commands[1], Command::FetchShortest { .. }));
    }

    #[test]
    fn test_reset_clears_route_and_markers() {
        let mut session = loaded_session();
        session
            .set_endpoint(Role::Origin, Coordinate::new(42.35, -71.06))
            .unwrap();
        let commands = session
            .set_endpoint(Role::Destination, Coordinate::new(42.36, -71.05))
            .unwrap();
        answer_optimal(&mut session, &commands[0], "r");
        assert_eq!(session.surface().route_overlays().len(), 1);

        assert!(session.reset().is_empty());
        assert!(session.surface().route_overlays().is_empty());
        assert_eq!(session.surface().markers().count(), 0);
        assert!(session.routes().route().is_none());
    }

    #[test]
    fn test_time_selection_refreshes_with_new_time() {
        let mut session = loaded_session();
        session
            .set_endpoint(Role::Origin, Coordinate::new(42.35, -71.06))
            .unwrap();
        session
            .set_endpoint(Role::Destination, Coordinate::new(42.36, -71.05))
            .unwrap();
        let commands = session.set_time_selection(0).unwrap();
        let optimal = optimal_commands(&commands);
        match optimal[0] {
            Command::FetchOptimal { query, .. } => assert_eq!((query.hour, query.minute), (9, 0)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(session.surface().shade_overlays()[0].0.hour, 9);
    }

    #[test]
    fn test_invalid_time_selection_changes_nothing() {
        let mut session = loaded_session();
        let generation = session.routes().optimal_generation();
        assert!(session.set_time_selection(7).is_err());
        assert_eq!(session.params().time_index(), Some(1));
        assert_eq!(session.routes().optimal_generation(), generation);
    }

    #[test]
    fn test_set_beta_clamps_and_refreshes() {
        let mut session = loaded_session();
        session
            .set_endpoint(Role::Origin, Coordinate::new(42.35, -71.06))
            .unwrap();
        session
            .set_endpoint(Role::Destination, Coordinate::new(42.36, -71.05))
            .unwrap();
        let commands = session.set_beta(1.7).unwrap();
        assert_eq!(session.beta().value(), 1.0);
        match optimal_commands(&commands)[0] {
            Command::FetchOptimal { query, .. } => assert_eq!(query.beta, 1.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_catalog_arrival_refreshes_pending_pair() {
        let mut session = session();
        session.load_catalog();
        session
            .set_endpoint(Role::Origin, Coordinate::new(42.35, -71.06))
            .unwrap();
        let early = session
            .set_endpoint(Role::Destination, Coordinate::new(42.36, -71.05))
            .unwrap();
        match &early[0] {
            Command::FetchOptimal { query, .. } => assert_eq!((query.hour, query.minute), (9, 40)),
            other => panic!("unexpected {other:?}"),
        }

        let handled = session.handle(Event::CatalogFetched(Ok(vec![layer(9, 0), layer(10, 0)])));
        assert_eq!(handled.commands.len(), 2);
        // the wall-clock request is now stale
        assert_eq!(
            answer_optimal(&mut session, &early[0], "early"),
            ResponseOutcome::StaleDiscarded
        );
        assert_eq!(
            answer_optimal(&mut session, &handled.commands[0], "catalog"),
            ResponseOutcome::Applied
        );
    }

    #[test]
    fn test_shade_visibility_toggle() {
        let mut session = loaded_session();
        session.set_shade_visible(true);
        assert!(session.shade().is_visible());
        assert!(session.surface().shade_overlays()[0].1);
    }

    #[test]
    fn test_comparison_after_both_responses() {
        let mut session = loaded_session();
        session
            .set_endpoint(Role::Origin, Coordinate::new(42.35, -71.06))
            .unwrap();
        let commands = session
            .set_endpoint(Role::Destination, Coordinate::new(42.36, -71.05))
            .unwrap();
        answer_optimal(&mut session, &commands[0], "r");
        let Command::FetchShortest { generation, query } = &commands[1] else {
            panic!("expected shortest command");
        };
        session.handle(Event::ShortestFetched {
            generation: *generation,
            query: query.clone(),
            result: Ok(ShortestRouteResponse {
                length: 100.0,
                sun: 80.0,
            }),
        });
        let metrics = session.routes().comparison().unwrap();
        assert!((metrics.length_ratio.unwrap() - 1.2).abs() < 1e-12);
        assert!((metrics.sun_ratio.unwrap() - 0.5).abs() < 1e-12);
    }
}
