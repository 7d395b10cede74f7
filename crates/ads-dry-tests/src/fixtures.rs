// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canned prefs and adserver payloads.

use ads_app_core::prefs::AgentPrefs;
use ads_supply_agent::{FetchResponse, SupplyAgent};
use serde_json::{json, Value};

use crate::{FakeHost, ScriptedFetcher};

/// Adserver base URL used by the fixtures.
pub const TEST_ADSERVER: &str = "https://ads.test";

/// Publisher id used by the fixtures.
pub const TEST_PUBLISHER: &str = "ads:0001-000000F1-6451";

/// Prefs pointing at [`TEST_ADSERVER`] (with a trailing slash) as [`TEST_PUBLISHER`].
pub fn test_prefs() -> AgentPrefs {
    AgentPrefs::new(format!("{TEST_ADSERVER}/"), TEST_PUBLISHER)
}

/// Agent over a fresh [`ScriptedFetcher`] and `host`, returning a fetcher handle.
pub fn test_agent(
    prefs: AgentPrefs,
    host: FakeHost,
) -> (SupplyAgent<ScriptedFetcher, FakeHost>, ScriptedFetcher) {
    let fetcher = ScriptedFetcher::new();
    (SupplyAgent::new(prefs, fetcher.clone(), host), fetcher)
}

/// Wire creative for correlation id `id`.
pub fn creative_json(id: &str, kind: &str, refresh_ms: u64) -> Value {
    json!({
        "id": id,
        "creativeId": format!("bid-{id}"),
        "type": kind,
        "scope": "100x100",
        "serveUrl": format!("http://x/{id}.png"),
        "clickUrl": format!("http://x/click/{id}"),
        "viewUrl": format!("http://x/view/{id}"),
        "infoBox": true,
        "refreshTime": refresh_ms,
    })
}

/// `200 {"data": creatives}`.
pub fn find_ok(creatives: Vec<Value>) -> FetchResponse {
    FetchResponse::json(200, &json!({ "data": creatives }))
}

/// `200` with creatives and a custom command.
pub fn find_ok_with_custom(creatives: Vec<Value>, custom: Value) -> FetchResponse {
    FetchResponse::json(200, &json!({ "data": creatives, "custom": custom }))
}

/// `500 {"code": 500, "message": message}`.
pub fn find_server_error(message: &str) -> FetchResponse {
    FetchResponse::json(500, &json!({ "code": 500, "message": message }))
}
