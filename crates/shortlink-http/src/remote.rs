// HTTP implementation of RemoteOperations
//
// GET  {base}/api/health  -> 200 means healthy
// POST {base}/api/save    -> 200 with a UrlCollection body
//
// Any other status is a rejection whose message is the response body.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shortlink_contracts::{ShortenUrlRequest, UrlCollection};
use shortlink_dispatch::{RemoteError, RemoteOperations};
use tracing::{debug, instrument};

use crate::config::RemoteConfig;

const HEALTH_PATH: &str = "/api/health";
const SAVE_PATH: &str = "/api/save";

/// Status string reported for a healthy service
pub const HEALTHY: &str = "success";

/// reqwest-backed adapter for the shortlink service
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RemoteError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, &config.base_url))
    }

    /// Use a preconfigured client (its own timeout applies)
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RemoteOperations for HttpRemote {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn shorten_url(&self, request: &ShortenUrlRequest) -> Result<UrlCollection, RemoteError> {
        let response = self
            .client
            .post(self.endpoint(SAVE_PATH))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let body = expect_ok(response).await?;
        let collection: UrlCollection =
            serde_json::from_str(&body).map_err(|e| RemoteError::decode(e.to_string()))?;

        debug!(code = %collection.code, "Short link created");
        Ok(collection)
    }

    #[instrument(skip(self))]
    async fn check_health(&self) -> Result<String, RemoteError> {
        let response = self
            .client
            .get(self.endpoint(HEALTH_PATH))
            .send()
            .await
            .map_err(transport_error)?;

        expect_ok(response).await?;
        Ok(HEALTHY.to_string())
    }
}

/// Read the body, turning any status other than 200 into a rejection
async fn expect_ok(response: Response) -> Result<String, RemoteError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if status != StatusCode::OK {
        return Err(RemoteError::rejected(status.as_u16(), body));
    }
    Ok(body)
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::transport(format!("request timed out: {err}"))
    } else {
        RemoteError::transport(err.to_string())
    }
}
