//! `reqwest`-backed [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::Config;
use crate::error::{ClientError, TransportError};
use crate::transport::{Method, Operation, Request, Transport};

/// HTTP transport talking to the configured origin.
///
/// Subscribe long-polls use `subscribe_request_timeout`; every other call
/// uses `non_subscribe_request_timeout`.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
    subscribe_timeout: Duration,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url()).map_err(|e| ClientError::InvalidConfig {
            reason: format!("origin `{}`: {e}", config.origin),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig {
                reason: format!("origin `{}` cannot be a base url", config.origin),
            });
        }
        let http = Client::builder()
            .build()
            .map_err(|e| ClientError::InvalidConfig {
                reason: format!("http client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url,
            subscribe_timeout: config.subscribe_request_timeout,
            request_timeout: config.non_subscribe_request_timeout,
        })
    }

    fn url(&self, request: &Request) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.clear().extend(&request.path);
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        url
    }

    fn timeout(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Subscribe => self.subscribe_timeout,
            Operation::Leave | Operation::Heartbeat => self.request_timeout,
        }
    }

    async fn send(&self, request: Request) -> Result<Value, TransportError> {
        let timeout = self.timeout(request.operation);
        let url = self.url(&request);
        let mut builder = match request.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
        }
        .timeout(timeout);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let res = builder.send().await.map_err(|e| from_reqwest(e, timeout))?;
        let status = res.status();
        let bytes = res.bytes().await.map_err(|e| from_reqwest(e, timeout))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        if bytes.is_empty() {
            return Err(TransportError::malformed("empty body"));
        }
        serde_json::from_slice(&bytes).map_err(|e| TransportError::malformed(e.to_string()))
    }
}

fn from_reqwest(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout { timeout }
    } else {
        TransportError::Network {
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn issue(
        &self,
        request: Request,
        token: CancellationToken,
    ) -> Result<Value, TransportError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(TransportError::Cancelled),
            res = self.send(request) => res,
        }
    }
}
