// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Placement capability contract.

use std::fmt;

use ads_proto::{Creative, PlacementProps};

/// Icon shown next to a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageIcon {
    /// Fatal or batch-level failure.
    Error,
    /// No creative matched the placement.
    NotFound,
}

impl MessageIcon {
    /// Stable icon name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::NotFound => "notfound",
        }
    }
}

impl fmt::Display for MessageIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single renderable ad slot.
///
/// Implementors never fail: anything they cannot render degrades to a
/// diagnostic via [`Placement::render_message`].
pub trait Placement {
    /// Stable name, unique within the placement's group.
    fn name(&self) -> &str;

    /// Size/constraint descriptor reflecting the *current* geometry.
    ///
    /// Must be side-effect free; it is called fresh before every request.
    fn props(&self) -> PlacementProps;

    /// Show a textual diagnostic instead of a creative. Safe to call repeatedly.
    fn render_message(&mut self, message: &str, icon: MessageIcon);

    /// Replace the current content with `creative`.
    ///
    /// Resets prior content first. Unsupported creative kinds render an
    /// "invalid format" message instead.
    fn render_creative(&mut self, creative: &Creative);

    /// Overlay the "why this ad" indicator that opens `url` when activated.
    fn render_info_box(&mut self, url: &str);

    /// Tear down every child visual. Idempotent.
    fn reset(&mut self);
}

/// A group of co-located placements sharing one physical prop.
pub trait Stand {
    /// Hand over the stand's placements for registration.
    fn into_placements(self: Box<Self>) -> Vec<Box<dyn Placement>>;
}

/// One argument to `SupplyAgent::add_placement`.
pub enum Registration {
    /// A single placement.
    Placement(Box<dyn Placement>),
    /// A stand, expanded into its placements at registration time.
    Stand(Box<dyn Stand>),
}

impl Registration {
    /// Wrap a placement.
    pub fn placement(placement: impl Placement + 'static) -> Self {
        Self::Placement(Box::new(placement))
    }

    /// Wrap a stand.
    pub fn stand(stand: impl Stand + 'static) -> Self {
        Self::Stand(Box::new(stand))
    }

    /// Expand into the placements to register.
    pub fn into_placements(self) -> Vec<Box<dyn Placement>> {
        match self {
            Self::Placement(placement) => vec![placement],
            Self::Stand(stand) => stand.into_placements(),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placement(p) => f.debug_tuple("Placement").field(&p.name()).finish(),
            Self::Stand(_) => f.write_str("Stand(..)"),
        }
    }
}
