use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} returned {status}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{path} returned malformed JSON: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BackendError {
    /// HTTP status for failures that got a response at all.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
    pub authorization: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 10,
            proxy: None,
            authorization: None,
        }
    }
}

/// Read-only client for the stats backend's JSON collection endpoints.
#[derive(Clone, Debug)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
    authorization: Option<String>,
}

impl BackendClient {
    pub fn new(options: ClientOptions) -> Result<Self, BackendError> {
        let base_url = options.base_url.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| BackendError::InvalidUrl {
            url: options.base_url.clone(),
            message: e.to_string(),
        })?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(concat!(
                "foldboard/",
                env!("CARGO_PKG_VERSION")
            )),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let timeout = Duration::from_secs(options.timeout_seconds.max(1));
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout);

        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| BackendError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        } else {
            // only an explicit proxy is used; HTTP_PROXY and friends are ignored
            builder = builder.no_proxy();
        }

        let client = builder
            .build()
            .map_err(|e| BackendError::HttpClientBuild { source: e })?;

        Ok(Self {
            base_url,
            client,
            authorization: options.authorization.filter(|a| !a.trim().is_empty()),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GETs `path` and decodes a JSON array of records. Non-2xx responses
    /// are terminal; the body is logged for diagnostics.
    pub async fn get_records(&self, path: &str) -> Result<Vec<Value>, BackendError> {
        let url = self.url_for(path);
        tracing::debug!(%url, "fetching records");

        let mut request = self.client.get(&url);
        if let Some(auth) = self.authorization.as_deref() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await.map_err(|e| BackendError::Request {
            path: path.to_string(),
            source: e,
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| BackendError::Request {
            path: path.to_string(),
            source: e,
        })?;

        if !status.is_success() {
            tracing::warn!(%status, path, %body, "backend request failed");
            return Err(BackendError::Status {
                path: path.to_string(),
                status,
                body,
            });
        }

        serde_json::from_str::<Vec<Value>>(&body).map_err(|e| BackendError::Decode {
            path: path.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::{serve, Route};

    #[test]
    fn rejects_unparsable_base_url() {
        let err = BackendClient::new(ClientOptions {
            base_url: "not a url".to_string(),
            ..ClientOptions::default()
        })
        .unwrap_err();
        assert!(matches!(err, BackendError::InvalidUrl { .. }));
    }

    #[test]
    fn joins_paths_without_double_slashes() {
        let client = BackendClient::new(ClientOptions {
            base_url: "http://stats.example/api/".to_string(),
            ..ClientOptions::default()
        })
        .unwrap();
        assert_eq!(client.url_for("/teams/fields"), "http://stats.example/api/teams/fields");
    }

    #[tokio::test]
    async fn decodes_record_arrays_and_sends_authorization() {
        let (base_url, requests) = serve(vec![Route::ok(
            "/hardware/fields",
            r#"[{"id":1,"hardwareName":"GeForce RTX 3080"}]"#,
        )])
        .await;
        let client = BackendClient::new(ClientOptions {
            base_url,
            authorization: Some("Basic Zm9sZDpzdGF0cw==".to_string()),
            ..ClientOptions::default()
        })
        .unwrap();

        let records = client.get_records("/hardware/fields").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["hardwareName"], "GeForce RTX 3080");

        let seen = requests.lock().unwrap().clone();
        assert!(seen[0].lines().any(|line| {
            line.to_ascii_lowercase().starts_with("authorization:")
                && line.trim_end().ends_with("Basic Zm9sZDpzdGF0cw==")
        }));
    }

    #[tokio::test]
    async fn non_success_status_is_terminal() {
        let (base_url, _) = serve(vec![Route::status("/teams/fields", 503, "maintenance")]).await;
        let client = BackendClient::new(ClientOptions {
            base_url,
            ..ClientOptions::default()
        })
        .unwrap();

        let err = client.get_records("/teams/fields").await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::SERVICE_UNAVAILABLE));
        match err {
            BackendError::Status { body, .. } => assert_eq!(body, "maintenance"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
