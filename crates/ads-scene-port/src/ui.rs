// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Screen-space overlay placements.

use ads_proto::{Creative, CreativeKind, PlacementProps, UiPosition};
use tracing::info;

use crate::{fit_scale, MediaFrame, MessageIcon, Placement, SurfacePort};

/// Default logical size of an overlay, in pixels.
pub const UI_DEFAULT_SIZE: (f64, f64) = (500.0, 500.0);

/// An overlay anchored to one screen region. Named after its position.
pub struct UiPlacement {
    position: UiPosition,
    width: f64,
    height: f64,
    surface: Box<dyn SurfacePort>,
}

impl UiPlacement {
    /// Overlay of [`UI_DEFAULT_SIZE`] at `position`.
    pub fn new(position: UiPosition, surface: Box<dyn SurfacePort>) -> Self {
        let (width, height) = UI_DEFAULT_SIZE;
        Self {
            position,
            width,
            height,
            surface,
        }
    }

    /// Override the logical size.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Anchor position.
    pub fn position(&self) -> UiPosition {
        self.position
    }
}

impl Placement for UiPlacement {
    fn name(&self) -> &str {
        self.position.as_str()
    }

    fn props(&self) -> PlacementProps {
        PlacementProps {
            name: self.position.as_str().to_owned(),
            width: self.width,
            height: self.height,
            depth: Some(0.0),
            no: None,
            types: None,
            mimes: None,
        }
    }

    fn render_message(&mut self, message: &str, icon: MessageIcon) {
        info!(position = %self.position, %icon, "{message}");
        self.surface.clear();
        self.surface.show_message(icon, message);
    }

    fn render_creative(&mut self, creative: &Creative) {
        self.reset();
        if creative.kind != CreativeKind::Image {
            self.render_message(
                &format!("Invalid banner format: {}", creative.kind),
                MessageIcon::Error,
            );
            return;
        }
        let scale = creative
            .dimensions()
            .map_or([1.0, 1.0], |source| fit_scale((self.width, self.height), source));
        self.surface.show_image(&MediaFrame {
            url: creative.serve_url.clone(),
            click_url: creative.click_url.clone(),
            scale,
        });
    }

    fn render_info_box(&mut self, url: &str) {
        self.surface.show_info_box(url);
    }

    fn reset(&mut self) {
        self.surface.clear();
    }
}
