// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `reqwest`-backed [`Fetcher`].

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::trace;

use crate::fetch::{FetchError, FetchRequest, FetchResponse, Fetcher, Method};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Produces identity headers for a signed request.
pub trait RequestSigner {
    /// Headers to attach to `method url`.
    fn sign(&self, method: Method, url: &str) -> Vec<(String, String)>;
}

/// Fetcher over a shared `reqwest::Client`.
///
/// Without a [`RequestSigner`] signed fetches go out unsigned, like a scene
/// preview that has no wallet attached.
pub struct HttpFetcher {
    client: reqwest::Client,
    signer: Option<Box<dyn RequestSigner>>,
}

impl HttpFetcher {
    /// Client with the default request timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ads-supply-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            signer: None,
        })
    }

    /// Attach a signer used by [`Fetcher::signed_fetch`].
    pub fn with_signer(mut self, signer: impl RequestSigner + 'static) -> Self {
        self.signer = Some(Box::new(signer));
        self
    }

    /// Whether signed fetches actually carry identity.
    pub fn is_signed(&self) -> bool {
        self.signer.is_some()
    }

    async fn send(
        &self,
        request: FetchRequest,
        headers: Vec<(String, String)>,
    ) -> Result<FetchResponse, FetchError> {
        trace!(method = %request.method, url = %request.url, "http");
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        }
        .header(ACCEPT, "application/json");
        if let Some(body) = &request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").json(body);
        }
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.send(request, Vec::new()).await
    }

    async fn signed_fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let headers = self
            .signer
            .as_ref()
            .map(|s| s.sign(request.method, &request.url))
            .unwrap_or_default();
        self.send(request, headers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl RequestSigner for Fixed {
        fn sign(&self, method: Method, url: &str) -> Vec<(String, String)> {
            vec![("x-identity".into(), format!("{method} {url}"))]
        }
    }

    #[test]
    fn signer_is_optional() {
        let plain = HttpFetcher::new().unwrap();
        assert!(!plain.is_signed());
        assert!(plain.with_signer(Fixed).is_signed());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let fetcher = HttpFetcher::with_timeout(Duration::from_millis(200)).unwrap();
        let err = fetcher
            .fetch(FetchRequest::get("http://127.0.0.1:9/unreachable"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
