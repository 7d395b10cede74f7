// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stock stands: multi-faced props carrying several placements.

use crate::{AspectRatio, Placement, PlacementParams, PlainPlacement, SceneNode, Stand, SurfacePort};

/// Format constraints shared by every face of a stand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandOptions {
    /// Accepted creative types.
    pub types: Option<Vec<String>>,
    /// Accepted MIME types.
    pub mimes: Option<Vec<String>>,
}

/// Allocates the surface for a named face.
pub type SurfaceFactory<'a> = &'a mut dyn FnMut(&str) -> Box<dyn SurfacePort>;

fn faces(
    root: &SceneNode,
    options: &StandOptions,
    surfaces: SurfaceFactory<'_>,
    layout: &[(String, f64, AspectRatio, u32)],
) -> Vec<PlainPlacement> {
    layout
        .iter()
        .map(|(name, width, ratio, no)| {
            PlainPlacement::new(
                name.clone(),
                PlacementParams {
                    width: *width,
                    ratio: *ratio,
                    no: Some(*no),
                    types: options.types.clone(),
                    mimes: options.mimes.clone(),
                },
                Some(root),
                surfaces(name),
            )
        })
        .collect()
}

fn boxed(placements: Vec<PlainPlacement>) -> Vec<Box<dyn Placement>> {
    placements
        .into_iter()
        .map(|p| Box::new(p) as Box<dyn Placement>)
        .collect()
}

/// Two-sided 9:16 totem (`"<name> front"`, `"<name> back"`).
pub struct Totem {
    node: SceneNode,
    faces: Vec<PlainPlacement>,
}

impl Totem {
    /// Build a totem; `surfaces` is called once per face name.
    pub fn new(name: &str, options: &StandOptions, surfaces: SurfaceFactory<'_>) -> Self {
        let node = SceneNode::new([1.0, 1.0, 1.0]);
        let layout = [
            (format!("{name} front"), 1.65, AspectRatio::Portrait9x16, 1),
            (format!("{name} back"), 1.65, AspectRatio::Portrait9x16, 2),
        ];
        let faces = faces(&node, options, surfaces, &layout);
        Self { node, faces }
    }

    /// Root node of the prop.
    pub fn node(&self) -> &SceneNode {
        &self.node
    }
}

impl Stand for Totem {
    fn into_placements(self: Box<Self>) -> Vec<Box<dyn Placement>> {
        boxed(self.faces)
    }
}

/// Two-sided billboard whose panel width depends on its ratio.
pub struct Billboard {
    node: SceneNode,
    faces: Vec<PlainPlacement>,
}

impl Billboard {
    /// Build a billboard; `surfaces` is called once per face name.
    pub fn new(
        name: &str,
        ratio: AspectRatio,
        options: &StandOptions,
        surfaces: SurfaceFactory<'_>,
    ) -> Self {
        let width = match ratio {
            AspectRatio::Portrait3x4 => 6.0,
            AspectRatio::Landscape4x3 => 6.8,
            AspectRatio::Portrait9x16 => 4.53,
            AspectRatio::Landscape16x9 => 8.65,
            AspectRatio::Square => 6.15,
        };
        let node = SceneNode::new([1.0, 1.0, 1.0]);
        let layout = [
            (format!("{name} front"), width, ratio, 1),
            (format!("{name} back"), width, ratio, 2),
        ];
        let faces = faces(&node, options, surfaces, &layout);
        Self { node, faces }
    }

    /// Root node of the prop.
    pub fn node(&self) -> &SceneNode {
        &self.node
    }
}

impl Stand for Billboard {
    fn into_placements(self: Box<Self>) -> Vec<Box<dyn Placement>> {
        boxed(self.faces)
    }
}

/// Four-sided 9:16 city light (`"<name> 1"` .. `"<name> 4"`).
pub struct Citylight {
    node: SceneNode,
    faces: Vec<PlainPlacement>,
}

impl Citylight {
    /// Build a city light; `surfaces` is called once per face name.
    pub fn new(name: &str, options: &StandOptions, surfaces: SurfaceFactory<'_>) -> Self {
        let node = SceneNode::new([1.0, 1.0, 1.0]);
        let layout: Vec<_> = (1..=4)
            .map(|no| (format!("{name} {no}"), 1.1, AspectRatio::Portrait9x16, no))
            .collect();
        let faces = faces(&node, options, surfaces, &layout);
        Self { node, faces }
    }

    /// Root node of the prop.
    pub fn node(&self) -> &SceneNode {
        &self.node
    }
}

impl Stand for Citylight {
    fn into_placements(self: Box<Self>) -> Vec<Box<dyn Placement>> {
        boxed(self.faces)
    }
}

/// A single framed panel; the visible area is 2 cm narrower than the frame.
pub struct Frame {
    node: SceneNode,
    panel: PlainPlacement,
}

impl Frame {
    /// Build a frame of `params.width` around one placement named `name`.
    pub fn new(name: &str, params: PlacementParams, surface: Box<dyn SurfacePort>) -> Self {
        let node = SceneNode::new([1.0, 1.0, 1.0]);
        let inner = PlacementParams {
            width: params.width - 0.02,
            ..params
        };
        let panel = PlainPlacement::new(name, inner, Some(&node), surface);
        Self { node, panel }
    }

    /// Root node of the frame.
    pub fn node(&self) -> &SceneNode {
        &self.node
    }
}

impl Stand for Frame {
    fn into_placements(self: Box<Self>) -> Vec<Box<dyn Placement>> {
        vec![Box::new(self.panel)]
    }
}
