// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Tracking contexts, user registration and impression beacons.

use std::time::Duration;

use ads_dry_tests::{
    creative_json, find_ok, test_agent, test_prefs, FakeHost, MockPlacement, TEST_ADSERVER,
};
use ads_supply_agent::{FetchError, FetchResponse, Method};
use serde_json::json;

const FIND: &str = "/supply/find";

#[tokio::test]
async fn same_context_fires_once() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());

    assert!(agent.register_context("http://t/ctx", None));
    assert!(!agent.register_context("http://t/ctx", None));
    assert_eq!(agent.flush_beacons().await, 1);
    assert!(!agent.register_context("http://t/ctx", Some("0xabc")));
    assert_eq!(agent.flush_beacons().await, 0);

    let calls = fetcher.calls_to("http://t/ctx");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::Get);
    assert!(calls[0].signed);
}

#[tokio::test]
async fn distinct_contexts_each_fire() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());

    assert!(agent.register_context("http://t/a", None));
    assert!(agent.register_context("http://t/b", None));
    assert_eq!(agent.flush_beacons().await, 2);
    assert_eq!(fetcher.calls().len(), 2);
    assert_eq!(agent.tracking().len(), 2);
}

#[tokio::test]
async fn seed_is_appended_as_stid() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());

    agent.register_context("http://t/ctx?a=1", Some("0xabc"));
    agent.register_context("http://t/plain", Some(""));
    agent.flush_beacons().await;

    let urls: Vec<String> = fetcher.calls().into_iter().map(|c| c.url).collect();
    assert!(urls.contains(&"http://t/ctx?a=1&stid=0xabc".to_owned()));
    assert!(urls.contains(&"http://t/plain".to_owned()));
}

#[tokio::test]
async fn user_is_registered_once_per_session() {
    let host = FakeHost::with_user("0xabc");
    let (mut agent, fetcher) = test_agent(test_prefs(), host);
    agent
        .add_placement([MockPlacement::square("A").registration()])
        .unwrap();
    fetcher.always(FIND, Ok(find_ok(vec![creative_json("plain-A", "image", 5_000)])));

    agent.spawn().await.unwrap();
    agent.tick(Duration::from_millis(5_000)).await;

    let registers = fetcher.calls_to("/supply/register");
    assert_eq!(registers.len(), 1);
    assert_eq!(
        registers[0].url,
        format!(
            "{TEST_ADSERVER}/supply/register?iid={}&stid=0xabc",
            agent.impression_id()
        )
    );
}

#[tokio::test]
async fn view_beacon_fires_per_render_and_its_contexts_once() {
    let host = FakeHost::with_user("0xabc");
    let (mut agent, fetcher) = test_agent(test_prefs(), host);
    agent
        .add_placement([MockPlacement::square("A").registration()])
        .unwrap();
    fetcher
        .always(FIND, Ok(find_ok(vec![creative_json("plain-A", "image", 5_000)])))
        .always(
            "/view/",
            Ok(FetchResponse::json(
                200,
                &json!({"context": ["http://ctx/1", "http://ctx/2"]}),
            )),
        );

    agent.spawn().await.unwrap();
    let views = fetcher.calls_to("http://x/view/plain-A");
    assert_eq!(views.len(), 1);
    assert!(views[0].signed);
    assert!(views[0].url.contains("cid="));
    let contexts = fetcher.calls_to("http://ctx/");
    assert_eq!(contexts.len(), 2);
    assert!(contexts.iter().all(|c| c.url.ends_with("?stid=0xabc")));

    agent.tick(Duration::from_millis(5_000)).await;
    assert_eq!(fetcher.calls_to("http://x/view/plain-A").len(), 2);
    assert_eq!(fetcher.calls_to("http://ctx/").len(), 2);
}

#[tokio::test]
async fn beacon_failures_do_not_fail_the_batch() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    let a = MockPlacement::square("A");
    agent.add_placement([a.registration()]).unwrap();
    fetcher
        .always(FIND, Ok(find_ok(vec![creative_json("plain-A", "image", 5_000)])))
        .always("/view/", Err(FetchError::Transport("reset by peer".into())))
        .always(
            "/supply/register",
            Ok(FetchResponse::json(503, &json!({"message": "busy"}))),
        );

    assert_eq!(agent.spawn().await.unwrap().len(), 1);
    assert_eq!(a.creatives().len(), 1);
    assert_eq!(agent.next_deadline_in(), Some(Duration::from_millis(5_000)));
}
