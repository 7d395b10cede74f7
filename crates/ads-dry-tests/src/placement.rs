// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording placement and stand doubles.

use ads_proto::{Creative, PlacementProps};
use ads_scene_port::{MessageIcon, Placement, Registration, Stand};
use std::sync::{Arc, Mutex};

/// One render call seen by a [`MockPlacement`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementCall {
    /// `render_message`
    Message(String, MessageIcon),
    /// `render_creative`
    Creative(Creative),
    /// `render_info_box`
    InfoBox(String),
    /// `reset`
    Reset,
}

/// [`Placement`] with fixed props that records every render call.
///
/// Clones share the call log, so keep one clone and register another.
#[derive(Debug, Clone)]
pub struct MockPlacement {
    props: PlacementProps,
    calls: Arc<Mutex<Vec<PlacementCall>>>,
}

impl MockPlacement {
    /// Placement `name` of `width` x `height` protocol units.
    pub fn new(name: &str, width: f64, height: f64) -> Self {
        Self {
            props: PlacementProps {
                name: name.to_owned(),
                width,
                height,
                depth: Some(0.0),
                no: None,
                types: None,
                mimes: None,
            },
            calls: Arc::default(),
        }
    }

    /// 100 x 100 placement.
    pub fn square(name: &str) -> Self {
        Self::new(name, 100.0, 100.0)
    }

    /// Registration wrapping a clone of this placement.
    pub fn registration(&self) -> Registration {
        Registration::placement(self.clone())
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<PlacementCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Most recent message.
    pub fn last_message(&self) -> Option<(String, MessageIcon)> {
        self.calls().into_iter().rev().find_map(|c| match c {
            PlacementCall::Message(text, icon) => Some((text, icon)),
            _ => None,
        })
    }

    /// Every creative rendered, oldest first.
    pub fn creatives(&self) -> Vec<Creative> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PlacementCall::Creative(creative) => Some(creative),
                _ => None,
            })
            .collect()
    }

    /// Most recent info box URL.
    pub fn last_info_box(&self) -> Option<String> {
        self.calls().into_iter().rev().find_map(|c| match c {
            PlacementCall::InfoBox(url) => Some(url),
            _ => None,
        })
    }

    fn push(&self, call: PlacementCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

impl Placement for MockPlacement {
    fn name(&self) -> &str {
        &self.props.name
    }

    fn props(&self) -> PlacementProps {
        self.props.clone()
    }

    fn render_message(&mut self, message: &str, icon: MessageIcon) {
        self.push(PlacementCall::Message(message.to_owned(), icon));
    }

    fn render_creative(&mut self, creative: &Creative) {
        self.push(PlacementCall::Creative(creative.clone()));
    }

    fn render_info_box(&mut self, url: &str) {
        self.push(PlacementCall::InfoBox(url.to_owned()));
    }

    fn reset(&mut self) {
        self.push(PlacementCall::Reset);
    }
}

/// [`Stand`] made of mock placements.
#[derive(Debug, Clone, Default)]
pub struct MockStand {
    faces: Vec<MockPlacement>,
}

impl MockStand {
    /// Stand with one square face per name.
    pub fn new(names: &[&str]) -> Self {
        Self {
            faces: names.iter().map(|n| MockPlacement::square(n)).collect(),
        }
    }

    /// Handles onto the faces.
    pub fn faces(&self) -> &[MockPlacement] {
        &self.faces
    }

    /// Registration wrapping a clone of this stand.
    pub fn registration(&self) -> Registration {
        Registration::stand(self.clone())
    }
}

impl Stand for MockStand {
    fn into_placements(self: Box<Self>) -> Vec<Box<dyn Placement>> {
        self.faces
            .into_iter()
            .map(|p| Box::new(p) as Box<dyn Placement>)
            .collect()
    }
}
