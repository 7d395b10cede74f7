// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Supply agent for in-scene advertising.
//!
//! [`SupplyAgent`] owns the registered placements, posts one find request per
//! active group to the adserver, matches returned creatives back to their
//! placements by correlation id, and keeps them fresh on a virtual-time
//! [`TimerQueue`]. Tracking beacons are fired at most once per session.
//!
//! The agent is single-threaded: placements hold `Rc` scene nodes, and the
//! futures it returns are not `Send`.
#![allow(clippy::future_not_send)]

use ads_proto::{PlacementGroup, ProtoError};
use thiserror::Error;

mod agent;
pub mod driver;
mod fetch;
mod http;
mod presence;
mod registry;
mod timer;
mod tracking;

pub use agent::SupplyAgent;
pub use driver::drive;
pub use fetch::{FetchError, FetchRequest, FetchResponse, Fetcher, Method};
pub use http::{HttpFetcher, RequestSigner};
pub use presence::{PresenceEdge, PresenceGate};
pub use timer::{Task, TimerQueue, TimerToken};
pub use tracking::TrackingRegistry;

/// Errors raised to the caller of an agent operation.
///
/// Every variant has already been painted on the affected placements by the
/// time it is returned.
#[derive(Debug, Error)]
pub enum AgentError {
    /// More plain placements than the configured cap.
    #[error("Too many placements, you can add up to {max} placements.")]
    TooManyPlacements {
        /// Configured cap.
        max: usize,
    },
    /// A name already taken within its group.
    #[error("Duplicate placement name: {name} ({group})")]
    DuplicatePlacement {
        /// Group the name collides in.
        group: PlacementGroup,
        /// Colliding name.
        name: String,
    },
    /// The find request never produced a usable response.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The adserver answered with an error or an undecodable body.
    #[error(transparent)]
    Proto(#[from] ProtoError),
}
