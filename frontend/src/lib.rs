mod fetch;
mod map;

use client::{
    local_time_of_day, service::execute, ClientError, Command, ComparisonMetrics, Event,
    ResponseOutcome, Role, RouteResult, Session,
};
use seed::{prelude::*, virtual_dom::AtValue, *};
use serde::Deserialize;
use shared::Coordinate;
use wasm_bindgen::{prelude::wasm_bindgen, JsCast};

use crate::fetch::{geocode, FetchService, GeocodeHit};
use crate::map::{init_map, LeafletSurface};

fn api_root() -> String {
    if let Some(url) = option_env!("FRONTEND_API_ROOT") {
        return url.trim_end_matches('/').to_string();
    }
    "http://localhost:5000".to_string()
}

pub struct Model {
    session: Session<LeafletSurface>,
    service: FetchService,
    click_role: Role,
    // Slider position while dragging; committed on release.
    beta_display: f64,
    origin_search: SearchBox,
    destination_search: SearchBox,
    error: Option<String>,
}

impl Model {
    fn search_mut(&mut self, role: Role) -> &mut SearchBox {
        match role {
            Role::Origin => &mut self.origin_search,
            Role::Destination => &mut self.destination_search,
        }
    }

    fn search(&self, role: Role) -> &SearchBox {
        match role {
            Role::Origin => &self.origin_search,
            Role::Destination => &self.destination_search,
        }
    }
}

#[derive(Default, Debug, Clone)]
struct SearchBox {
    query: String,
    pending: bool,
    hits: Vec<GeocodeHit>,
}

pub enum Msg {
    Engine(Event),
    MapClicked { lat: f64, lon: f64 },
    MarkerDragged { role: Role, lat: f64, lon: f64 },
    SetClickRole(Role),
    SearchChanged(Role, String),
    SearchSubmit(Role),
    SearchFetched {
        role: Role,
        query: String,
        result: Result<Vec<GeocodeHit>, String>,
    },
    SearchPicked(Role, usize),
    BetaInput(String),
    BetaCommit(String),
    TimeSelected(String),
    ToggleShade,
    ClearEndpoint(Role),
    ResetEndpoints,
}

pub fn init(_: Url, orders: &mut impl Orders<Msg>) -> Model {
    orders.stream(streams::window_event(Ev::from("map-click"), |event| {
        let payload: MapClickPayload = custom_detail(event)?;
        web_sys::console::debug_1(
            &format!(
                "[frontend] map click lat={:.5} lon={:.5}",
                payload.lat, payload.lon
            )
            .into(),
        );
        Some(Msg::MapClicked {
            lat: payload.lat,
            lon: payload.lon,
        })
    }));
    orders.stream(streams::window_event(Ev::from("marker-dragend"), |event| {
        let payload: MarkerDragPayload = custom_detail(event)?;
        Some(Msg::MarkerDragged {
            role: role_from_key(&payload.role)?,
            lat: payload.lat,
            lon: payload.lon,
        })
    }));

    let service = FetchService::new(&api_root());
    let mut session = Session::new(LeafletSurface::new(), local_time_of_day(), false);
    let commands = session.load_catalog();
    let mut model = Model {
        beta_display: session.beta().value(),
        session,
        service,
        click_role: Role::Origin,
        origin_search: SearchBox::default(),
        destination_search: SearchBox::default(),
        error: None,
    };
    run_commands(&mut model, commands, orders);
    model
}

pub fn update(msg: Msg, model: &mut Model, orders: &mut impl Orders<Msg>) {
    match msg {
        Msg::Engine(event) => {
            let kind = ResponseKind::of(&event);
            let handled = model.session.handle(event);
            if let Some(line) = apply_outcome(&mut model.error, kind, &handled.outcome) {
                web_sys::console::warn_1(&line.into());
            }
            run_commands(model, handled.commands, orders);
        }
        Msg::MapClicked { lat, lon } => {
            web_sys::console::debug_1(
                &format!(
                    "[frontend] MapClicked role={} lat={lat:.5} lon={lon:.5}",
                    model.click_role
                )
                .into(),
            );
            let role = model.click_role;
            set_endpoint(model, role, Coordinate::new(lat, lon), orders);
        }
        Msg::MarkerDragged { role, lat, lon } => {
            set_endpoint(model, role, Coordinate::new(lat, lon), orders);
        }
        Msg::SetClickRole(role) => model.click_role = role,
        Msg::SearchChanged(role, query) => model.search_mut(role).query = query,
        Msg::SearchSubmit(role) => {
            let search = model.search_mut(role);
            let query = search.query.trim().to_string();
            if query.is_empty() || search.pending {
                return;
            }
            search.pending = true;
            orders.perform_cmd(async move {
                let result = geocode(query.clone()).await;
                Msg::SearchFetched {
                    role,
                    query,
                    result,
                }
            });
        }
        Msg::SearchFetched {
            role,
            query,
            result,
        } => {
            let search = model.search_mut(role);
            search.pending = false;
            // the box was edited while the search ran
            if search.query.trim() != query {
                return;
            }
            match result {
                Ok(hits) => search.hits = hits,
                Err(err) => {
                    search.hits.clear();
                    model.error = Some(format!("Address search failed: {err}"));
                }
            }
        }
        Msg::SearchPicked(role, index) => {
            let search = model.search_mut(role);
            let Some(hit) = search.hits.get(index).cloned() else {
                return;
            };
            search.query = hit.display_name.clone();
            search.hits.clear();
            match hit.coordinate() {
                Some(at) => set_endpoint(model, role, at, orders),
                None => model.error = Some(format!("No coordinates for {}", hit.display_name)),
            }
        }
        Msg::BetaInput(raw) => {
            if let Some(value) = parse_beta(&raw) {
                model.beta_display = value;
            }
        }
        Msg::BetaCommit(raw) => {
            let Some(value) = parse_beta(&raw) else {
                return;
            };
            match model.session.set_beta(value) {
                Ok(commands) => {
                    model.beta_display = model.session.beta().value();
                    run_commands(model, commands, orders);
                }
                Err(err) => model.error = Some(err.to_string()),
            }
        }
        Msg::TimeSelected(raw) => {
            let Ok(index) = raw.parse::<usize>() else {
                return;
            };
            match model.session.set_time_selection(index) {
                Ok(commands) => run_commands(model, commands, orders),
                Err(err) => model.error = Some(err.to_string()),
            }
        }
        Msg::ToggleShade => {
            let visible = !model.session.shade().is_visible();
            model.session.set_shade_visible(visible);
        }
        Msg::ClearEndpoint(role) => {
            model.search_mut(role).query.clear();
            let commands = model.session.clear_endpoint(role);
            run_commands(model, commands, orders);
        }
        Msg::ResetEndpoints => {
            for role in Role::ALL {
                model.search_mut(role).query.clear();
            }
            model.error = None;
            let commands = model.session.reset();
            run_commands(model, commands, orders);
        }
    }
}

fn set_endpoint(model: &mut Model, role: Role, at: Coordinate, orders: &mut impl Orders<Msg>) {
    match model.session.set_endpoint(role, at) {
        Ok(commands) => run_commands(model, commands, orders),
        Err(err) => model.error = Some(err.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseKind {
    Catalog,
    Optimal,
    Shortest,
}

impl ResponseKind {
    fn of(event: &Event) -> Self {
        match event {
            Event::CatalogFetched(_) => ResponseKind::Catalog,
            Event::OptimalFetched { .. } => ResponseKind::Optimal,
            Event::ShortestFetched { .. } => ResponseKind::Shortest,
        }
    }
}

/// Updates the error line for one handled response and returns the console
/// warning for a failure.
///
/// Only the optimal route owns the error line: a shortest failure just loses
/// the ratios, and out-of-domain or catalog failures are already map notices.
fn apply_outcome(
    error: &mut Option<String>,
    kind: ResponseKind,
    outcome: &ResponseOutcome,
) -> Option<String> {
    match outcome {
        ResponseOutcome::Applied => {
            if kind == ResponseKind::Optimal {
                *error = None;
            }
            None
        }
        ResponseOutcome::StaleDiscarded => None,
        ResponseOutcome::Failed(err) => {
            if kind == ResponseKind::Optimal && *err != ClientError::EndpointOutOfBounds {
                *error = Some(err.to_string());
            }
            Some(format!("[frontend] {kind:?} request failed: {err}"))
        }
    }
}

/// Issues commands; a new route request clears the previous route error.
fn run_commands(model: &mut Model, commands: Vec<Command>, orders: &mut impl Orders<Msg>) {
    if commands
        .iter()
        .any(|command| matches!(command, Command::FetchOptimal { .. }))
    {
        model.error = None;
    }
    for command in commands {
        let service = model.service.clone();
        orders.perform_cmd(async move { Msg::Engine(execute(&service, command).await) });
    }
}

pub fn view(model: &Model) -> Node<Msg> {
    div![
        C!["app-container"],
        h1!["Parasol: shade-aware routing"],
        view_controls(model),
        view_summary(
            model.session.routes().route(),
            model.session.routes().comparison()
        ),
        if let Some(error) = &model.error {
            p![C!["error"], error]
        } else {
            empty![]
        }
    ]
}

fn view_controls(model: &Model) -> Node<Msg> {
    let beta = model.beta_display;
    form![
        C!["controls"],
        ev(Ev::Submit, |event| {
            event.prevent_default();
        }),
        fieldset![
            legend!["Endpoints"],
            view_search(model, Role::Origin, "Start address"),
            view_search(model, Role::Destination, "Destination address"),
            div![
                C!["click-mode"],
                Role::ALL.iter().map(|&role| label![
                    input![
                        attrs! {
                            At::Type => "radio",
                            At::Name => "click-role",
                            At::Checked => bool_attr(model.click_role == role),
                        },
                        ev(Ev::Change, move |_| Msg::SetClickRole(role)),
                    ],
                    span![role_label(role)],
                ]),
            ],
            small!["Click the map to place the selected endpoint; drag a marker to move it."],
            button![
                "Reset endpoints",
                ev(Ev::Click, |event| {
                    event.prevent_default();
                    Msg::ResetEndpoints
                }),
                C!["reset-btn"],
            ],
        ],
        fieldset![
            legend!["Sun / shade"],
            label![format!("Shade preference: {beta:.2}")],
            input![
                attrs! {
                    At::Type => "range",
                    At::Min => "0",
                    At::Max => "1",
                    At::Step => "0.01",
                    At::Value => format!("{beta:.2}"),
                },
                input_ev(Ev::Input, Msg::BetaInput),
                input_ev(Ev::Change, Msg::BetaCommit),
            ],
        ],
        fieldset![
            legend!["Time of day"],
            view_time_select(model),
            button![
                if model.session.shade().is_visible() {
                    "Hide shade"
                } else {
                    "Show shade"
                },
                ev(Ev::Click, |event| {
                    event.prevent_default();
                    Msg::ToggleShade
                }),
                C!["shade-toggle"],
            ],
        ],
    ]
}

fn view_search(model: &Model, role: Role, placeholder: &str) -> Node<Msg> {
    let search = model.search(role);
    div![
        C!["search"],
        input![
            attrs! {
                At::Value => &search.query,
                At::Placeholder => placeholder,
                At::AutoComplete => "off",
                At::SpellCheck => "false",
            },
            input_ev(Ev::Input, move |query| Msg::SearchChanged(role, query)),
            keyboard_ev(Ev::KeyDown, move |event| {
                (event.key() == "Enter").then(|| Msg::SearchSubmit(role))
            }),
        ],
        button![
            "Search",
            attrs! { At::Disabled => bool_attr(search.pending) },
            ev(Ev::Click, move |event| {
                event.prevent_default();
                Msg::SearchSubmit(role)
            }),
        ],
        button![
            "×",
            ev(Ev::Click, move |event| {
                event.prevent_default();
                Msg::ClearEndpoint(role)
            }),
        ],
        if search.hits.is_empty() {
            empty![]
        } else {
            ul![
                C!["search-hits"],
                search.hits.iter().enumerate().map(|(index, hit)| li![
                    hit.display_name.as_str(),
                    ev(Ev::Click, move |_| Msg::SearchPicked(role, index)),
                ]),
            ]
        },
    ]
}

fn view_time_select(model: &Model) -> Node<Msg> {
    let shade = model.session.shade();
    if !shade.is_loaded() {
        return small!["Shade layers not loaded; using the current time."];
    }
    let selected = shade.selected_index();
    select![
        shade
            .labels()
            .into_iter()
            .enumerate()
            .map(|(index, label)| option![
                attrs! {
                    At::Value => index,
                    At::Selected => bool_attr(selected == Some(index)),
                },
                label,
            ]),
        input_ev(Ev::Change, Msg::TimeSelected),
    ]
}

fn view_summary(route: Option<&RouteResult>, metrics: Option<ComparisonMetrics>) -> Node<Msg> {
    match route {
        Some(route) => div![
            C!["summary"],
            h2!["Route"],
            summary_lines(route, metrics).into_iter().map(|line| p![line]),
        ],
        None => div![
            C!["summary"],
            h2!["No route"],
            p!["Pick a start and a destination to compute a route."]
        ],
    }
}

/// Read-only text of the route summary panel.
fn summary_lines(route: &RouteResult, metrics: Option<ComparisonMetrics>) -> Vec<String> {
    let mut lines = vec![format!("{:.0} m", route.length)];
    if let Some(ratio) = metrics.and_then(|m| m.length_ratio) {
        lines.push(format!("{ratio:.2}× length"));
    }
    if let Some(ratio) = metrics.and_then(|m| m.sun_ratio) {
        lines.push(format!("{ratio:.2}× sun"));
    }
    lines
}

fn parse_beta(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn role_from_key(key: &str) -> Option<Role> {
    Role::ALL.into_iter().find(|role| role.to_string() == key)
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Origin => "Start",
        Role::Destination => "Destination",
    }
}

fn bool_attr(value: bool) -> AtValue {
    if value {
        AtValue::Some("true".into())
    } else {
        AtValue::Ignored
    }
}

fn custom_detail<T: for<'de> Deserialize<'de>>(event: web_sys::Event) -> Option<T> {
    let event = event.dyn_into::<web_sys::CustomEvent>().ok()?;
    serde_wasm_bindgen::from_value(event.detail()).ok()
}

#[derive(Deserialize)]
struct MapClickPayload {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct MarkerDragPayload {
    role: String,
    lat: f64,
    lon: f64,
}

#[wasm_bindgen(start)]
pub fn start() {
    init_map();
    App::start("app", init, update, view);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn route(length: f64) -> RouteResult {
        RouteResult {
            geometry: json!({"type": "LineString", "coordinates": []}),
            length,
            sun_exposure: 12.0,
        }
    }

    #[test]
    fn test_summary_lines_with_comparison() {
        let metrics = ComparisonMetrics {
            length_ratio: Some(1.2345),
            sun_ratio: Some(0.5),
        };
        assert_eq!(
            summary_lines(&route(1234.6), Some(metrics)),
            vec!["1235 m", "1.23× length", "0.50× sun"]
        );
    }

    #[test]
    fn test_summary_lines_skip_missing_ratios() {
        let metrics = ComparisonMetrics {
            length_ratio: Some(1.0),
            sun_ratio: None,
        };
        assert_eq!(
            summary_lines(&route(800.0), Some(metrics)),
            vec!["800 m", "1.00× length"]
        );
        assert_eq!(summary_lines(&route(800.0), None), vec!["800 m"]);
    }

    fn fetch_failed() -> ResponseOutcome {
        ResponseOutcome::Failed(ClientError::RouteFetchFailed("unexpected HTTP status 500".into()))
    }

    #[test]
    fn test_shortest_success_keeps_optimal_failure() {
        let mut error = None;
        let warning = apply_outcome(&mut error, ResponseKind::Optimal, &fetch_failed());
        assert!(warning.unwrap().contains("unexpected HTTP status 500"));
        assert!(error.is_some());

        assert_eq!(
            apply_outcome(&mut error, ResponseKind::Shortest, &ResponseOutcome::Applied),
            None
        );
        assert_eq!(
            error.as_deref(),
            Some("route fetch failed: unexpected HTTP status 500")
        );
    }

    #[test]
    fn test_optimal_success_clears_error() {
        let mut error = Some("route fetch failed: timeout".to_string());
        apply_outcome(&mut error, ResponseKind::Optimal, &ResponseOutcome::Applied);
        assert_eq!(error, None);
    }

    #[test]
    fn test_shortest_failure_is_logged_not_shown() {
        let mut error = None;
        let warning = apply_outcome(&mut error, ResponseKind::Shortest, &fetch_failed());
        assert!(warning.is_some());
        assert_eq!(error, None);
    }

    #[test]
    fn test_out_of_bounds_is_logged_not_shown() {
        let mut error = None;
        let outcome = ResponseOutcome::Failed(ClientError::EndpointOutOfBounds);
        assert!(apply_outcome(&mut error, ResponseKind::Optimal, &outcome).is_some());
        assert_eq!(error, None);
    }

    #[test]
    fn test_stale_outcome_changes_nothing() {
        let mut error = Some("route fetch failed: timeout".to_string());
        let outcome = ResponseOutcome::StaleDiscarded;
        assert_eq!(apply_outcome(&mut error, ResponseKind::Optimal, &outcome), None);
        assert!(error.is_some());
    }

    #[test]
    fn test_parse_beta() {
        assert_eq!(parse_beta("0.35"), Some(0.35));
        assert_eq!(parse_beta(" 1 "), Some(1.0));
        assert_eq!(parse_beta("NaN"), None);
        assert_eq!(parse_beta("shade"), None);
    }

    #[test]
    fn test_role_from_key() {
        assert_eq!(role_from_key("origin"), Some(Role::Origin));
        assert_eq!(role_from_key("destination"), Some(Role::Destination));
        assert_eq!(role_from_key("start"), None);
    }

    #[test]
    fn test_api_root_has_no_trailing_slash() {
        assert!(!api_root().ends_with('/'));
    }
}
