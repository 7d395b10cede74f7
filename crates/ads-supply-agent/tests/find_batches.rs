// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Plain batch behavior: registration, find requests, render dispatch, refresh.

use std::time::Duration;

use ads_dry_tests::{
    creative_json, find_ok, find_ok_with_custom, find_server_error, test_agent, test_prefs,
    FakeHost, MockPlacement, MockStand, MockSurface, PlacementCall, TEST_ADSERVER,
};
use ads_proto::{PlacementGroup, ProtoError};
use ads_scene_port::{MessageIcon, Placement, PlacementParams, PlainPlacement, Registration};
use ads_supply_agent::{AgentError, FetchError};
use serde_json::json;

const FIND: &str = "/supply/find";

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test]
async fn single_image_renders_with_info_box_and_refreshes_after_its_time() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    let a = MockPlacement::square("A");
    agent.add_placement([a.registration()]).unwrap();
    fetcher.always(
        FIND,
        Ok(find_ok(vec![json!({
            "id": "plain-A", "type": "image", "scope": "100x100",
            "serveUrl": "http://x/img.png", "refreshTime": 10000, "infoBox": true
        })])),
    );

    let creatives = agent.spawn().await.unwrap();
    assert_eq!(creatives.len(), 1);

    let calls = fetcher.calls_to(FIND);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url, format!("{TEST_ADSERVER}{FIND}"));
    let body = calls[0].body.clone().unwrap();
    assert_eq!(body["placements"][0]["id"], "plain-A");
    assert_eq!(body["placements"][0]["name"], "A");
    assert_eq!(body["placements"][0]["width"], 100.0);
    assert_eq!(body["placements"][0]["height"], 100.0);
    assert_eq!(body["context"]["iid"], agent.impression_id());
    assert_eq!(body["context"]["medium"], "metaverse");
    assert_eq!(body["context"]["vendor"], "decentraland");
    assert_eq!(body["context"]["version"], "2.1.0");
    assert_eq!(body["context"]["metamask"], false);
    assert_eq!(body["context"]["uid"], serde_json::Value::Null);

    let rendered = a.calls();
    assert_eq!(rendered[0], PlacementCall::Reset);
    assert!(matches!(&rendered[1], PlacementCall::Creative(c) if c.serve_url == "http://x/img.png"));
    let info = a.last_info_box().unwrap();
    assert!(info.starts_with(&format!(
        "{TEST_ADSERVER}/supply/why?iid={}&bid=plain-A&cid=",
        agent.impression_id()
    )));
    assert!(info.ends_with("&url=http%3A%2F%2Fx%2Fimg.png"));

    assert_eq!(agent.next_deadline_in(), Some(ms(10_000)));
    agent.tick(ms(9_999)).await;
    assert_eq!(fetcher.calls_to(FIND).len(), 1);
    agent.tick(ms(1)).await;
    assert_eq!(fetcher.calls_to(FIND).len(), 2);
}

#[tokio::test]
async fn unsupported_type_shows_invalid_format_without_tracking() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    let surface = MockSurface::new();
    agent
        .add_placement([Registration::placement(PlainPlacement::new(
            "A",
            PlacementParams::default(),
            None,
            Box::new(surface.clone()),
        ))])
        .unwrap();
    fetcher.always(FIND, Ok(find_ok(vec![creative_json("plain-A", "html", 30_000)])));

    agent.spawn().await.unwrap();

    let (icon, text) = surface.message().unwrap();
    assert_eq!(icon, MessageIcon::Error);
    assert!(text.starts_with("Invalid banner format: html"));
    assert_eq!(surface.info_box(), None);
    assert!(surface.image().is_none());
    assert!(fetcher.calls_to("/view/").is_empty());
    // the creative's refresh time is not honored
    assert_eq!(agent.next_deadline_in(), Some(ms(5_000)));
}

#[tokio::test]
async fn refresh_never_comes_sooner_than_five_seconds() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    agent
        .add_placement([MockPlacement::square("A").registration()])
        .unwrap();
    fetcher.always(FIND, Ok(find_ok(vec![creative_json("plain-A", "image", 100)])));
    agent.spawn().await.unwrap();
    assert_eq!(agent.next_deadline_in(), Some(ms(5_000)));
}

#[tokio::test]
async fn every_refresh_mints_a_new_case_id() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    let a = MockPlacement::square("A");
    agent.add_placement([a.registration()]).unwrap();
    fetcher.always(FIND, Ok(find_ok(vec![creative_json("plain-A", "image", 5_000)])));

    agent.spawn().await.unwrap();
    agent.tick(ms(5_000)).await;

    let shown = a.creatives();
    assert_eq!(shown.len(), 2);
    assert_ne!(shown[0].case_id, shown[1].case_id);
    for creative in &shown {
        let cid = format!("cid={}", creative.case_id);
        assert_eq!(creative.click_url.matches(&cid).count(), 1);
        assert_eq!(creative.view_url.matches(&cid).count(), 1);
    }
}

#[tokio::test]
async fn creatives_are_matched_by_id_not_position() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    let placements: Vec<_> = ["A", "B", "C"].map(MockPlacement::square).into();
    agent
        .add_placement(placements.iter().map(MockPlacement::registration))
        .unwrap();
    fetcher.always(
        FIND,
        Ok(find_ok(vec![
            creative_json("plain-C", "image", 5_000),
            creative_json("plain-A", "image", 5_000),
            creative_json("plain-B", "video", 5_000),
        ])),
    );

    agent.spawn().await.unwrap();

    for placement in &placements {
        let shown = placement.creatives();
        assert_eq!(shown.len(), 1, "{}", placement.name());
        assert_eq!(shown[0].id, format!("plain-{}", placement.name()));
    }
}

#[tokio::test]
async fn missing_creative_only_affects_its_placement() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    let a = MockPlacement::square("A");
    let b = MockPlacement::square("B");
    agent
        .add_placement([a.registration(), b.registration()])
        .unwrap();
    fetcher.always(FIND, Ok(find_ok(vec![creative_json("plain-A", "image", 5_000)])));

    agent.spawn().await.unwrap();

    assert_eq!(a.creatives().len(), 1);
    let (text, icon) = b.last_message().unwrap();
    assert_eq!(icon, MessageIcon::NotFound);
    assert!(text.starts_with("We can't match any creative."));
    assert!(text.contains(agent.impression_id()));
    assert!(text.contains(&format!("Adserver: {TEST_ADSERVER}")));
}

#[tokio::test]
async fn empty_response_shows_not_found_with_impression_id() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    let b = MockPlacement::square("B");
    agent.add_placement([b.registration()]).unwrap();
    fetcher.always(FIND, Ok(find_ok(vec![])));

    assert!(agent.spawn().await.unwrap().is_empty());

    let (text, icon) = b.last_message().unwrap();
    assert_eq!(icon, MessageIcon::NotFound);
    assert!(text.contains(&format!("Impression ID: {}", agent.impression_id())));
    assert!(b.creatives().is_empty());
}

#[tokio::test]
async fn server_error_paints_every_placement_and_rejects() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    let a = MockPlacement::square("A");
    let b = MockPlacement::square("B");
    agent
        .add_placement([a.registration(), b.registration()])
        .unwrap();
    fetcher.always(FIND, Ok(find_server_error("Internal Server Error")));

    let err = agent.spawn().await.unwrap_err();
    assert!(matches!(err, AgentError::Proto(ProtoError::Server(_))));

    let (text_a, icon_a) = a.last_message().unwrap();
    let (text_b, _) = b.last_message().unwrap();
    assert_eq!(icon_a, MessageIcon::Error);
    assert_eq!(text_a, text_b);
    assert!(text_a.starts_with("Error 500 Internal Server Error\n\nAdserver: "));
    assert!(text_a.ends_with("\nVersion: 2.1.0"));
    assert_eq!(agent.next_deadline_in(), None);
}

#[tokio::test]
async fn malformed_success_body_is_a_batch_failure() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    let a = MockPlacement::square("A");
    agent.add_placement([a.registration()]).unwrap();
    fetcher.always(
        FIND,
        Ok(ads_supply_agent::FetchResponse {
            status: 200,
            body: b"<html>".to_vec(),
        }),
    );

    let err = agent.spawn().await.unwrap_err();
    assert!(matches!(err, AgentError::Proto(ProtoError::Decode(_))));
    assert_eq!(a.last_message().map(|(_, icon)| icon), Some(MessageIcon::Error));
}

#[tokio::test]
async fn transport_failure_is_returned_and_painted() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    let a = MockPlacement::square("A");
    agent.add_placement([a.registration()]).unwrap();
    fetcher.always(FIND, Err(FetchError::Transport("connection refused".into())));

    let err = agent.spawn().await.unwrap_err();
    assert!(matches!(err, AgentError::Fetch(FetchError::Transport(_))));
    assert!(a.last_message().unwrap().0.starts_with("connection refused"));
}

#[tokio::test]
async fn twenty_placements_fit_and_the_twenty_first_is_rejected() {
    let (mut agent, _fetcher) = test_agent(test_prefs(), FakeHost::new());
    let first: Vec<_> = (0..20)
        .map(|i| MockPlacement::square(&format!("p{i}")))
        .collect();
    agent
        .add_placement(first.iter().map(MockPlacement::registration))
        .unwrap();

    let extra = MockPlacement::square("p20");
    let err = agent.add_placement([extra.registration()]).unwrap_err();
    assert!(matches!(err, AgentError::TooManyPlacements { max: 20 }));

    let expected = "Too many placements, you can add up to 20 placements.";
    assert!(extra.last_message().unwrap().0.starts_with(expected));
    assert!(first[0].last_message().unwrap().0.starts_with(expected));
    assert_eq!(agent.placement_names(PlacementGroup::Plain).len(), 20);
}

#[tokio::test]
async fn duplicate_name_is_rejected_and_prior_registrations_survive() {
    let (mut agent, _fetcher) = test_agent(test_prefs(), FakeHost::new());
    agent
        .add_placement([MockPlacement::square("A").registration()])
        .unwrap();

    let err = agent
        .add_placement([
            MockPlacement::square("B").registration(),
            MockPlacement::square("A").registration(),
        ])
        .unwrap_err();

    assert!(matches!(
        err,
        AgentError::DuplicatePlacement { group: PlacementGroup::Plain, ref name } if name == "A"
    ));
    assert_eq!(agent.placement_names(PlacementGroup::Plain), vec!["A"]);
}

#[tokio::test]
async fn stands_expand_into_their_faces() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    let stand = MockStand::new(&["lobby front", "lobby back"]);
    agent.add_placement([stand.registration()]).unwrap();
    fetcher.always(
        FIND,
        Ok(find_ok(vec![creative_json("plain-lobby back", "image", 5_000)])),
    );

    agent.spawn().await.unwrap();

    assert_eq!(
        agent.placement_names(PlacementGroup::Plain),
        vec!["lobby front", "lobby back"]
    );
    assert_eq!(stand.faces()[1].creatives().len(), 1);
    assert_eq!(
        stand.faces()[0].last_message().map(|(_, icon)| icon),
        Some(MessageIcon::NotFound)
    );
}

#[tokio::test]
async fn manual_find_replaces_the_pending_refresh() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    agent
        .add_placement([MockPlacement::square("A").registration()])
        .unwrap();
    fetcher.always(FIND, Ok(find_ok(vec![creative_json("plain-A", "image", 10_000)])));

    agent.spawn().await.unwrap();
    agent.tick(ms(3_000)).await;
    agent.find(PlacementGroup::Plain).await.unwrap();
    assert_eq!(fetcher.calls_to(FIND).len(), 2);

    agent.tick(ms(7_000)).await;
    assert_eq!(fetcher.calls_to(FIND).len(), 2);
    agent.tick(ms(3_000)).await;
    assert_eq!(fetcher.calls_to(FIND).len(), 3);
}

#[tokio::test]
async fn failed_refresh_stops_unless_backoff_is_configured() {
    let (mut agent, fetcher) = test_agent(test_prefs(), FakeHost::new());
    agent
        .add_placement([MockPlacement::square("A").registration()])
        .unwrap();
    fetcher
        .always(FIND, Ok(find_server_error("down")))
        .once(FIND, Ok(find_ok(vec![creative_json("plain-A", "image", 5_000)])));

    agent.spawn().await.unwrap();
    agent.tick(ms(5_000)).await;
    assert_eq!(fetcher.calls_to(FIND).len(), 2);
    assert_eq!(agent.next_deadline_in(), None);

    let mut prefs = test_prefs();
    prefs.failure_backoff_ms = Some(2_000);
    let (mut agent, fetcher) = test_agent(prefs, FakeHost::new());
    agent
        .add_placement([MockPlacement::square("A").registration()])
        .unwrap();
    fetcher
        .always(FIND, Ok(find_server_error("down")))
        .once(FIND, Ok(find_ok(vec![creative_json("plain-A", "image", 5_000)])));

    agent.spawn().await.unwrap();
    agent.tick(ms(5_000)).await;
    assert_eq!(agent.next_deadline_in(), Some(ms(2_000)));
    agent.tick(ms(2_000)).await;
    assert_eq!(fetcher.calls_to(FIND).len(), 3);
}

#[tokio::test]
async fn teleport_runs_after_its_delay_even_without_matches() {
    let host = FakeHost::new();
    let (mut agent, fetcher) = test_agent(test_prefs(), host.clone());
    agent
        .add_placement([MockPlacement::square("A").registration()])
        .unwrap();
    fetcher.always(
        FIND,
        Ok(find_ok_with_custom(
            vec![],
            json!({"teleportTo": {"coordinates": "10,20", "delay": 1500}}),
        )),
    );

    agent.spawn().await.unwrap();
    assert!(host.teleports().is_empty());
    agent.tick(ms(1_500)).await;
    assert_eq!(host.teleports(), vec!["10,20"]);
}

#[tokio::test]
async fn adserver_trailing_slashes_are_stripped() {
    let mut prefs = test_prefs();
    prefs.adserver = format!("{TEST_ADSERVER}///");
    let (agent, _) = test_agent(prefs, FakeHost::new());
    assert_eq!(agent.adserver(), TEST_ADSERVER);
}
