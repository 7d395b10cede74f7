// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! HTTP fetch capability consumed by the agent.

use std::fmt;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// HTTP method of a [`FetchRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// JSON body, sent with `Content-Type: application/json`.
    pub body: Option<Value>,
}

impl FetchRequest {
    /// `GET url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
        }
    }

    /// `POST url` with a JSON body.
    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
        }
    }
}

/// Status and raw body of a completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// A response with `status` and a JSON body.
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// A call that produced no usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, TLS, timeout or body read failure.
    #[error("{0}")]
    Transport(String),
    /// Non-2xx status whose body carried no parseable error.
    #[error("Error {status} {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Body as lossy UTF-8.
        body: String,
    },
}

/// Outbound HTTP, as offered by the host runtime.
///
/// Hosts that can attach identity to requests override
/// [`Fetcher::signed_fetch`]; everywhere else it degrades to a plain fetch.
/// Non-2xx statuses are returned as responses, not errors.
pub trait Fetcher {
    /// Perform `request` without identity.
    fn fetch(
        &self,
        request: FetchRequest,
    ) -> impl Future<Output = Result<FetchResponse, FetchError>>;

    /// Perform `request` signed with the user's identity, when supported.
    fn signed_fetch(
        &self,
        request: FetchRequest,
    ) -> impl Future<Output = Result<FetchResponse, FetchError>> {
        self.fetch(request)
    }
}
