// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Spatial placements fixed to scene geometry.

use ads_proto::{Creative, CreativeKind, PlacementProps};

use crate::{fit_scale, MediaFrame, MessageIcon, Placement, SceneNode, SurfacePort};

/// Protocol units per scene unit (props are reported in centimetres).
const PROPS_UNITS_PER_METRE: f64 = 100.0;

/// Panel thickness used for the placement's own node.
const PANEL_DEPTH: f64 = 0.1;

/// Supported panel aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    /// Portrait 9:16.
    Portrait9x16,
    /// Portrait 3:4.
    Portrait3x4,
    /// Square.
    #[default]
    Square,
    /// Landscape 4:3.
    Landscape4x3,
    /// Landscape 16:9.
    Landscape16x9,
}

impl AspectRatio {
    /// Width divided by height.
    pub fn value(self) -> f64 {
        match self {
            Self::Portrait9x16 => 9.0 / 16.0,
            Self::Portrait3x4 => 3.0 / 4.0,
            Self::Square => 1.0,
            Self::Landscape4x3 => 4.0 / 3.0,
            Self::Landscape16x9 => 16.0 / 9.0,
        }
    }
}

/// Construction parameters for a [`PlainPlacement`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementParams {
    /// Panel width in scene units.
    pub width: f64,
    /// Panel aspect ratio; height is derived from it.
    pub ratio: AspectRatio,
    /// Slot ordinal on a stand.
    pub no: Option<u32>,
    /// Accepted creative types.
    pub types: Option<Vec<String>>,
    /// Accepted MIME types.
    pub mimes: Option<Vec<String>>,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            width: 1.0,
            ratio: AspectRatio::Square,
            no: None,
            types: None,
            mimes: None,
        }
    }
}

/// A flat panel in the scene that shows one creative at a time.
pub struct PlainPlacement {
    name: String,
    node: SceneNode,
    no: Option<u32>,
    types: Option<Vec<String>>,
    mimes: Option<Vec<String>>,
    surface: Box<dyn SurfacePort>,
}

impl PlainPlacement {
    /// Create a panel named `name`, optionally parented under `parent`.
    ///
    /// The panel's own node is scaled to `(width, width / ratio, 0.1)`.
    pub fn new(
        name: impl Into<String>,
        params: PlacementParams,
        parent: Option<&SceneNode>,
        surface: Box<dyn SurfacePort>,
    ) -> Self {
        let scale = [
            params.width,
            params.width / params.ratio.value(),
            PANEL_DEPTH,
        ];
        let node = match parent {
            Some(parent) => SceneNode::child_of(parent, scale),
            None => SceneNode::new(scale),
        };
        Self {
            name: name.into(),
            node,
            no: params.no,
            types: params.types,
            mimes: params.mimes,
            surface,
        }
    }

    /// The panel's transform node.
    pub fn node(&self) -> &SceneNode {
        &self.node
    }
}

impl Placement for PlainPlacement {
    fn name(&self) -> &str {
        &self.name
    }

    fn props(&self) -> PlacementProps {
        let [x, y, _] = self.node.combined_scale();
        PlacementProps {
            name: self.name.clone(),
            width: x * PROPS_UNITS_PER_METRE,
            height: y * PROPS_UNITS_PER_METRE,
            depth: Some(0.0),
            no: self.no,
            types: self.types.clone(),
            mimes: self.mimes.clone(),
        }
    }

    fn render_message(&mut self, message: &str, icon: MessageIcon) {
        let props = serde_json::to_string_pretty(&self.props()).unwrap_or_default();
        self.surface.clear();
        self.surface
            .show_message(icon, &format!("{message}\n\nProps: {props}"));
    }

    fn render_creative(&mut self, creative: &Creative) {
        self.reset();
        let [w, h, _] = self.node.scale();
        let scale = creative
            .dimensions()
            .map_or([1.0, 1.0], |source| fit_scale((w, h), source));
        let media = MediaFrame {
            url: creative.serve_url.clone(),
            click_url: creative.click_url.clone(),
            scale,
        };
        match &creative.kind {
            CreativeKind::Image => self.surface.show_image(&media),
            CreativeKind::Video => self.surface.show_video(&media),
            CreativeKind::Unsupported(kind) => self.render_message(
                &format!("Invalid banner format: {kind}"),
                MessageIcon::Error,
            ),
        }
    }

    fn render_info_box(&mut self, url: &str) {
        self.surface.show_info_box(url);
    }

    fn reset(&mut self) {
        self.surface.clear();
    }
}
