// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Presence edge detection for overlay activation.

use ads_app_core::prefs::UiRearm;

/// Transition observed by one presence sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEdge {
    /// Absent to present: activate overlays.
    Entered,
    /// Present to absent.
    Left,
    /// No change.
    Steady,
}

/// Tracks the last presence sample and whether polling should continue.
#[derive(Debug, Clone)]
pub struct PresenceGate {
    rearm: UiRearm,
    present: bool,
    activations: u32,
}

impl PresenceGate {
    /// Gate starting in the absent state.
    pub fn new(rearm: UiRearm) -> Self {
        Self {
            rearm,
            present: false,
            activations: 0,
        }
    }

    /// Feed one sample.
    pub fn observe(&mut self, present: bool) -> PresenceEdge {
        let edge = match (self.present, present) {
            (false, true) => {
                self.activations += 1;
                PresenceEdge::Entered
            }
            (true, false) => PresenceEdge::Left,
            _ => PresenceEdge::Steady,
        };
        self.present = present;
        edge
    }

    /// Whether another sample is worth taking.
    ///
    /// With [`UiRearm::Never`] polling ends after the first activation.
    pub fn keep_polling(&self) -> bool {
        match self.rearm {
            UiRearm::Never => self.activations == 0,
            UiRearm::OnReentry => true,
        }
    }

    /// Number of absent-to-present transitions seen.
    pub fn activations(&self) -> u32 {
        self.activations
    }
}
