// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Registered placements, split by group.

use std::collections::HashSet;

use ads_proto::{PlacementGroup, UiPosition};
use ads_scene_port::Placement;

use crate::AgentError;

/// An overlay slot. `generation` bumps whenever the slot leaves rotation so
/// timers armed for an older generation become no-ops.
pub(crate) struct UiSlot {
    pub(crate) position: UiPosition,
    pub(crate) placement: Box<dyn Placement>,
    pub(crate) active: bool,
    pub(crate) generation: u64,
}

pub(crate) struct Registry {
    max_plain: usize,
    plain: Vec<Box<dyn Placement>>,
    ui: Vec<UiSlot>,
}

impl Registry {
    pub(crate) fn new(max_plain: usize) -> Self {
        Self {
            max_plain,
            plain: Vec::new(),
            ui: Vec::new(),
        }
    }

    /// Validate a plain registration as a whole; nothing is committed here.
    pub(crate) fn check_plain(&self, incoming: &[Box<dyn Placement>]) -> Result<(), AgentError> {
        if self.plain.len() + incoming.len() > self.max_plain {
            return Err(AgentError::TooManyPlacements {
                max: self.max_plain,
            });
        }
        let mut seen: HashSet<&str> = self.plain.iter().map(|p| p.name()).collect();
        for placement in incoming {
            if !seen.insert(placement.name()) {
                return Err(AgentError::DuplicatePlacement {
                    group: PlacementGroup::Plain,
                    name: placement.name().to_owned(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn commit_plain(&mut self, incoming: Vec<Box<dyn Placement>>) {
        self.plain.extend(incoming);
    }

    pub(crate) fn check_ui(&self, positions: &[UiPosition]) -> Result<(), AgentError> {
        let mut seen: HashSet<UiPosition> = self.ui.iter().map(|s| s.position).collect();
        for &position in positions {
            if !seen.insert(position) {
                return Err(AgentError::DuplicatePlacement {
                    group: PlacementGroup::Ui,
                    name: position.as_str().to_owned(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn commit_ui(&mut self, position: UiPosition, placement: Box<dyn Placement>) {
        self.ui.push(UiSlot {
            position,
            placement,
            active: false,
            generation: 0,
        });
    }

    pub(crate) fn plain(&self) -> &[Box<dyn Placement>] {
        &self.plain
    }

    pub(crate) fn plain_mut(&mut self) -> &mut [Box<dyn Placement>] {
        &mut self.plain
    }

    pub(crate) fn ui(&self) -> &[UiSlot] {
        &self.ui
    }

    pub(crate) fn ui_mut(&mut self) -> &mut [UiSlot] {
        &mut self.ui
    }
}
