use serde::de::DeserializeOwned;
use shared::{
    OptimalRouteQuery, OptimalRouteResponse, ShadeLayerDescriptor, ShortestRouteQuery,
    ShortestRouteResponse,
};

use crate::config::{normalize_root, ClientConfig};
use crate::service::{RouteService, ServiceError};

/// [`RouteService`] over HTTP GET, using reqwest.
#[derive(Clone, Debug)]
pub struct HttpRouteService {
    http: reqwest::Client,
    api_root: String,
}

impl HttpRouteService {
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ServiceError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            api_root: normalize_root(&config.api_root),
        })
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    async fn get_json<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T, ServiceError>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{path}", self.api_root);
        let mut request = self.http.get(&url);
        if let Some(query) = query {
            request = request.query(query);
        }
        tracing::debug!("GET {url}");
        let response = request
            .send()
            .await
            .map_err(|err| ServiceError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::from_status(status.as_u16()));
        }
        response
            .json::<T>()
            .await
            .map_err(|err| ServiceError::Decode(err.to_string()))
    }
}

impl RouteService for HttpRouteService {
    async fn layers(&self) -> Result<Vec<ShadeLayerDescriptor>, ServiceError> {
        self.get_json::<_, ()>("/layers", None).await
    }

    async fn optimal_route(
        &self,
        query: &OptimalRouteQuery,
    ) -> Result<OptimalRouteResponse, ServiceError> {
        self.get_json("/route/optimal", Some(query)).await
    }

    async fn shortest_route(
        &self,
        query: &ShortestRouteQuery,
    ) -> Result<ShortestRouteResponse, ServiceError> {
        self.get_json("/route/shortest", Some(query)).await
    }
}
