// Console API HTTP client
//
// Wraps `reqwest::Client` with modelfs-specific URL construction and
// error-body decoding. Every list endpoint returns the `{items: [...]}`
// envelope; this client strips it so callers see plain vectors.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{
    DatasetSummary, ErrorBanner, ItemList, ModelDetail, ModelRequest, ModelSourceDetail,
    ModelSourceRequest, ModelSourceSummary, ModelSummary, NamespaceInfo, SecretValidation,
};

/// Error body the server writes on failure: `{"error": "..."}`.
#[derive(serde::Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

/// Typed client for the modelfs console REST API.
///
/// Cheaply cloneable -- `reqwest::Client` is an `Arc` internally.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl Client {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the console root (e.g. `http://localhost:8090`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The console base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{segments...}`.
    ///
    /// Segments are pushed through `path_segments_mut` so names with
    /// reserved characters are percent-encoded.
    pub(crate) fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .expect("console base URL cannot be a relative URL");
            path.pop_if_empty();
            path.push("api");
            path.extend(segments);
        }
        url
    }

    /// The SSE endpoint for a namespace's event feed.
    pub fn sse_url(&self, namespace: &str) -> Url {
        let mut url = self.api_url(&["sse"]);
        url.query_pairs_mut().append_pair("namespace", namespace);
        url
    }

    // ── Models ───────────────────────────────────────────────────────

    pub async fn list_models(&self, namespace: &str) -> Result<Vec<ModelSummary>, Error> {
        self.get_list(self.api_url(&["models"]), namespace).await
    }

    pub async fn get_model(&self, namespace: &str, name: &str) -> Result<ModelDetail, Error> {
        self.get_json(self.api_url(&["models", namespace, name])).await
    }

    pub async fn create_model(&self, req: &ModelRequest) -> Result<ModelDetail, Error> {
        self.post_json(self.api_url(&["models"]), req).await
    }

    pub async fn update_model(
        &self,
        namespace: &str,
        name: &str,
        req: &ModelRequest,
    ) -> Result<ModelDetail, Error> {
        self.put_json(self.api_url(&["models", namespace, name]), req)
            .await
    }

    /// Delete a model. Fire-and-forget from the mirror's perspective --
    /// the caller decides whether to await or spawn this.
    pub async fn delete_model(&self, namespace: &str, name: &str) -> Result<(), Error> {
        self.delete(self.api_url(&["models", namespace, name])).await
    }

    pub async fn delete_model_version(
        &self,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> Result<(), Error> {
        self.delete(self.api_url(&["models", namespace, name, "versions", version]))
            .await
    }

    pub async fn toggle_share(
        &self,
        namespace: &str,
        name: &str,
        version: &str,
        enabled: bool,
    ) -> Result<(), Error> {
        #[derive(Serialize)]
        struct Body {
            enabled: bool,
        }
        let url = self.api_url(&["models", namespace, name, "versions", version, "share"]);
        self.post_no_response(url, &Body { enabled }).await
    }

    pub async fn trigger_resync(&self, namespace: &str, name: &str) -> Result<(), Error> {
        let url = self.api_url(&["models", namespace, name, "actions", "resync"]);
        self.post_no_body(url).await
    }

    // ── Model sources ────────────────────────────────────────────────

    pub async fn list_model_sources(
        &self,
        namespace: &str,
    ) -> Result<Vec<ModelSourceSummary>, Error> {
        self.get_list(self.api_url(&["modelsources"]), namespace).await
    }

    pub async fn get_model_source(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ModelSourceDetail, Error> {
        self.get_json(self.api_url(&["modelsources", namespace, name]))
            .await
    }

    pub async fn create_model_source(&self, req: &ModelSourceRequest) -> Result<(), Error> {
        self.post_no_response(self.api_url(&["modelsources"]), req)
            .await
    }

    pub async fn update_model_source(
        &self,
        namespace: &str,
        name: &str,
        req: &ModelSourceRequest,
    ) -> Result<(), Error> {
        self.put_no_response(self.api_url(&["modelsources", namespace, name]), req)
            .await
    }

    pub async fn delete_model_source(&self, namespace: &str, name: &str) -> Result<(), Error> {
        self.delete(self.api_url(&["modelsources", namespace, name]))
            .await
    }

    // ── Supporting collections ───────────────────────────────────────

    pub async fn list_errors(&self, namespace: &str) -> Result<Vec<ErrorBanner>, Error> {
        self.get_list(self.api_url(&["errors"]), namespace).await
    }

    pub async fn list_datasets(&self, namespace: &str) -> Result<Vec<DatasetSummary>, Error> {
        self.get_list(self.api_url(&["datasets"]), namespace).await
    }

    pub async fn list_namespaces(&self) -> Result<Vec<NamespaceInfo>, Error> {
        let list: ItemList<NamespaceInfo> = self.get_json(self.api_url(&["namespaces"])).await?;
        Ok(list.items)
    }

    pub async fn validate_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<SecretValidation, Error> {
        let mut url = self.api_url(&["secrets", "validate"]);
        url.query_pairs_mut()
            .append_pair("namespace", namespace)
            .append_pair("name", name);
        self.get_json(url).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET a namespace-filtered list endpoint and unwrap the envelope.
    async fn get_list<T: DeserializeOwned>(
        &self,
        mut url: Url,
        namespace: &str,
    ) -> Result<Vec<T>, Error> {
        url.query_pairs_mut().append_pair("namespace", namespace);
        let list: ItemList<T> = self.get_json(url).await?;
        Ok(list.items)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        Self::decode(Self::check_status(resp).await?).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {url}");
        let resp = self.http.post(url).json(body).send().await?;
        Self::decode(Self::check_status(resp).await?).await
    }

    async fn put_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("PUT {url}");
        let resp = self.http.put(url).json(body).send().await?;
        Self::decode(Self::check_status(resp).await?).await
    }

    async fn post_no_response(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        debug!("POST {url}");
        let resp = self.http.post(url).json(body).send().await?;
        Self::check_status(resp).await.map(|_| ())
    }

    async fn put_no_response(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        debug!("PUT {url}");
        let resp = self.http.put(url).json(body).send().await?;
        Self::check_status(resp).await.map(|_| ())
    }

    async fn post_no_body(&self, url: Url) -> Result<(), Error> {
        debug!("POST {url}");
        let resp = self.http.post(url).send().await?;
        Self::check_status(resp).await.map(|_| ())
    }

    async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {url}");
        let resp = self.http.delete(url).send().await?;
        Self::check_status(resp).await.map(|_| ())
    }

    /// Map non-success statuses to `Error::Api`, decoding the server's
    /// `{"error": "..."}` body when present.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or(body);

        Err(Error::Api {
            message,
            status: status.as_u16(),
        })
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
