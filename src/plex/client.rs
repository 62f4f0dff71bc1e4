use reqwest::{StatusCode, Url, header::ACCEPT};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::{
    common::{HttpClient, PlexError, PlexResult},
    configs::PlexConfig,
};

const TOKEN_HEADER: &str = "X-Plex-Token";
const NOTIFICATIONS_PATH: &str = "/:/websockets/notifications";

/// JSON client for the media server HTTP API. Requests are not retried.
#[derive(Clone)]
pub struct PlexClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl PlexClient {
    pub fn new(config: &PlexConfig) -> PlexResult<Self> {
        let base_url = Url::parse(&config.url).map_err(|e| PlexError::Url(e.to_string()))?;
        let http = HttpClient::new(config.request_timeout(), config.skip_tls_verification)?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> PlexResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| PlexError::Url(format!("{}: {}", path, e)))
    }

    /// `GET` a path relative to the server URL and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> PlexResult<T> {
        let url = self.url(path)?;
        trace!("GET {}", path);

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(PlexError::NotFound),
            status if !status.is_success() => Err(PlexError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            }),
            _ => {
                let body = response.bytes().await?;
                Ok(serde_json::from_slice(&body)?)
            }
        }
    }

    /// Websocket endpoint for server notifications, token included.
    pub fn notifications_url(&self) -> PlexResult<Url> {
        let mut url = self.url(NOTIFICATIONS_PATH)?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| PlexError::Url(format!("cannot use {} for {}", scheme, self.base_url)))?;
        url.query_pairs_mut().append_pair(TOKEN_HEADER, &self.token);
        Ok(url)
    }
}
