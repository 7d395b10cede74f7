// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scripted fetcher with a call log.

use ads_supply_agent::{FetchError, FetchRequest, FetchResponse, Fetcher, Method};
use serde_json::Value;
use std::collections::VecDeque;
use std::future::{ready, Future};
use std::sync::{Arc, Mutex};

/// One request seen by a [`ScriptedFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Method.
    pub method: Method,
    /// URL as requested.
    pub url: String,
    /// JSON body, if any.
    pub body: Option<Value>,
    /// Whether it went through `signed_fetch`.
    pub signed: bool,
}

type Reply = Result<FetchResponse, FetchError>;

fn empty_ok() -> Reply {
    Ok(FetchResponse::json(200, &serde_json::json!({})))
}

struct Route {
    pattern: String,
    once: VecDeque<Reply>,
    sticky: Option<Reply>,
}

#[derive(Default)]
struct FetcherState {
    routes: Vec<Route>,
    calls: Vec<RecordedCall>,
}

/// [`Fetcher`] answering from routes keyed by URL substring.
///
/// One-shot replies queued with [`ScriptedFetcher::once`] win over the
/// route's sticky reply. Unrouted URLs get `200 {}`. Clones share routes
/// and the call log.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    inner: Arc<Mutex<FetcherState>>,
}

impl ScriptedFetcher {
    /// Fetcher with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FetcherState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn route_mut<'a>(state: &'a mut FetcherState, pattern: &str) -> &'a mut Route {
        if let Some(i) = state.routes.iter().position(|r| r.pattern == pattern) {
            return &mut state.routes[i];
        }
        state.routes.push(Route {
            pattern: pattern.to_owned(),
            once: VecDeque::new(),
            sticky: None,
        });
        let last = state.routes.len() - 1;
        &mut state.routes[last]
    }

    /// Answer every URL containing `pattern` with `reply`.
    pub fn always(&self, pattern: &str, reply: Reply) -> &Self {
        Self::route_mut(&mut self.lock(), pattern).sticky = Some(reply);
        self
    }

    /// Answer the next URL containing `pattern` with `reply`.
    pub fn once(&self, pattern: &str, reply: Reply) -> &Self {
        Self::route_mut(&mut self.lock(), pattern).once.push_back(reply);
        self
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Calls whose URL contains `pattern`.
    pub fn calls_to(&self, pattern: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.url.contains(pattern))
            .collect()
    }

    /// Forget recorded calls; routes stay.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn answer(&self, request: FetchRequest, signed: bool) -> Reply {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            method: request.method,
            url: request.url.clone(),
            body: request.body,
            signed,
        });
        let route = state
            .routes
            .iter_mut()
            .find(|r| request.url.contains(&r.pattern));
        match route {
            Some(route) => match route.once.pop_front() {
                Some(reply) => reply,
                None => route.sticky.clone().unwrap_or_else(empty_ok),
            },
            None => empty_ok(),
        }
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, request: FetchRequest) -> impl Future<Output = Reply> {
        ready(self.answer(request, false))
    }

    fn signed_fetch(&self, request: FetchRequest) -> impl Future<Output = Reply> {
        ready(self.answer(request, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn once_replies_take_priority_then_fall_back() {
        let fetcher = ScriptedFetcher::new();
        fetcher
            .always("/find", Ok(FetchResponse::json(200, &json!({"data": []}))))
            .once("/find", Ok(FetchResponse::json(500, &json!({}))));

        let first = fetcher.fetch(FetchRequest::get("http://a/find")).await.unwrap();
        let second = fetcher.fetch(FetchRequest::get("http://a/find")).await.unwrap();
        let other = fetcher.signed_fetch(FetchRequest::get("http://a/x")).await.unwrap();

        assert_eq!(first.status, 500);
        assert_eq!(second.status, 200);
        assert_eq!(other.body, b"{}");
        assert_eq!(fetcher.calls_to("/find").len(), 2);
        assert!(fetcher.calls()[2].signed);
    }
}
