// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for ad supply crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store
//! - [`fetch`] - Scripted fetcher with a call log
//! - [`fixtures`] - Canned prefs and adserver payloads
//! - [`host`] - Scene host with controllable identity and presence
//! - [`placement`] - Recording placement and stand
//! - [`surface`] - Recording drawing surface

pub mod config;
pub mod fetch;
pub mod fixtures;
pub mod host;
pub mod placement;
pub mod surface;

pub use config::InMemoryConfigStore;
pub use fetch::{RecordedCall, ScriptedFetcher};
pub use fixtures::{
    creative_json, find_ok, find_ok_with_custom, find_server_error, test_agent, test_prefs,
    TEST_ADSERVER, TEST_PUBLISHER,
};
pub use host::FakeHost;
pub use placement::{MockPlacement, MockStand, PlacementCall};
pub use surface::{MockSurface, SurfaceCall};
