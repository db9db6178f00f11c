use client::{RouteService, ServiceError};
use seed::browser::fetch::{Method, Request};
use serde::{de::DeserializeOwned, Deserialize};
use shared::{
    Coordinate, OptimalRouteQuery, OptimalRouteResponse, ShadeLayerDescriptor, ShortestRouteQuery,
    ShortestRouteResponse,
};

const NOMINATIM_SEARCH: &str = "https://nominatim.openstreetmap.org/search";

/// [`RouteService`] over the browser fetch API.
#[derive(Clone, Debug)]
pub struct FetchService {
    api_root: String,
}

impl FetchService {
    pub fn new(api_root: &str) -> Self {
        Self {
            api_root: api_root.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    async fn get_json<T: DeserializeOwned + 'static>(&self, path: &str) -> Result<T, ServiceError> {
        let url = format!("{}{path}", self.api_root);
        web_sys::console::debug_1(&format!("[frontend] GET {url}").into());
        let response = Request::new(url)
            .method(Method::Get)
            .fetch()
            .await
            .map_err(|err| ServiceError::Transport(format!("{err:?}")))?;
        let code = response.status().code;
        if !(200..300).contains(&code) {
            return Err(ServiceError::from_status(code));
        }
        response
            .json::<T>()
            .await
            .map_err(|err| ServiceError::Decode(format!("{err:?}")))
    }
}

impl RouteService for FetchService {
    async fn layers(&self) -> Result<Vec<ShadeLayerDescriptor>, ServiceError> {
        self.get_json("/layers").await
    }

    async fn optimal_route(
        &self,
        query: &OptimalRouteQuery,
    ) -> Result<OptimalRouteResponse, ServiceError> {
        self.get_json(&format!("/route/optimal?{}", query.query_string()))
            .await
    }

    async fn shortest_route(
        &self,
        query: &ShortestRouteQuery,
    ) -> Result<ShortestRouteResponse, ServiceError> {
        self.get_json(&format!("/route/shortest?{}", query.query_string()))
            .await
    }
}

/// One Nominatim search result. Coordinates arrive as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeHit {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
}

impl GeocodeHit {
    pub fn coordinate(&self) -> Option<Coordinate> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lon = self.lon.trim().parse::<f64>().ok()?;
        let coordinate = Coordinate::new(lat, lon);
        coordinate.is_finite().then_some(coordinate)
    }
}

pub fn search_url(encoded_query: &str) -> String {
    format!("{NOMINATIM_SEARCH}?format=json&limit=5&q={encoded_query}")
}

/// Free-text address search.
pub async fn geocode(query: String) -> Result<Vec<GeocodeHit>, String> {
    let encoded = String::from(js_sys::encode_uri_component(&query));
    let request = Request::new(search_url(&encoded)).method(Method::Get);
    match request.fetch().await {
        Err(err) => Err(format!("{err:?}")),
        Ok(raw) => match raw.check_status() {
            Err(status_err) => Err(format!("{status_err:?}")),
            Ok(resp) => resp
                .json::<Vec<GeocodeHit>>()
                .await
                .map_err(|err| format!("{err:?}")),
        },
    }
}
