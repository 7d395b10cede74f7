// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port contracts between the supply agent and the host scene.
//!
//! The supply agent talks to ad slots only through [`Placement`], and to the
//! host engine only through [`SceneHost`] and [`SurfacePort`]. Concrete
//! spatial ([`PlainPlacement`]) and overlay ([`UiPlacement`]) placements and
//! the stock stands are built on top of those ports.
//!
//! # Design Principles
//!
//! - **Surfaces are dumb**: They draw what they are told. No protocol logic.
//! - **Placements never fail**: Every render operation degrades to a
//!   diagnostic message instead of returning an error.
//! - **No time ownership**: Refresh timing belongs to the agent.

mod host;
mod node;
mod placement;
mod plain;
mod stand;
mod surface;
mod ui;

pub use host::{Player, SceneHost};
pub use node::SceneNode;
pub use placement::{MessageIcon, Placement, Registration, Stand};
pub use plain::{AspectRatio, PlacementParams, PlainPlacement};
pub use stand::{Billboard, Citylight, Frame, StandOptions, SurfaceFactory, Totem};
pub use surface::{fit_scale, MediaFrame, SurfacePort};
pub use ui::{UiPlacement, UI_DEFAULT_SIZE};
