// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless host: surfaces that log what they would draw.

use ads_proto::{scene_url_from_parcel, UiPosition};
use ads_scene_port::{MediaFrame, MessageIcon, Player, SceneHost, SurfacePort};
use tracing::info;

/// Surface that reports every draw call through `tracing`.
pub struct LogSurface {
    label: String,
}

impl LogSurface {
    /// Boxed surface tagged with `label` in every log line.
    pub fn boxed(label: &str) -> Box<dyn SurfacePort> {
        Box::new(Self {
            label: label.to_owned(),
        })
    }
}

impl SurfacePort for LogSurface {
    fn show_message(&mut self, icon: MessageIcon, text: &str) {
        info!(surface = %self.label, %icon, "{text}");
    }

    fn show_image(&mut self, media: &MediaFrame) {
        info!(surface = %self.label, url = %media.url, click = %media.click_url, scale = ?media.scale, "image");
    }

    fn show_video(&mut self, media: &MediaFrame) {
        info!(surface = %self.label, url = %media.url, click = %media.click_url, scale = ?media.scale, "video");
    }

    fn show_info_box(&mut self, url: &str) {
        info!(surface = %self.label, %url, "info box");
    }

    fn clear(&mut self) {}
}

/// Scene host for one parcel with a fixed local user.
pub struct LocalHost {
    parcel: String,
    user_id: Option<String>,
    present: bool,
}

impl LocalHost {
    /// Host at `parcel` (`"x,y"`). Overlays only activate when `present`.
    pub fn new(parcel: &str, user_id: Option<String>, present: bool) -> Self {
        Self {
            parcel: parcel.to_owned(),
            user_id,
            present,
        }
    }
}

impl SceneHost for LocalHost {
    fn user_id(&self) -> Option<String> {
        self.user_id.clone()
    }

    fn players_in_scene(&self) -> Vec<Player> {
        match &self.user_id {
            Some(user_id) if self.present => vec![Player {
                user_id: user_id.clone(),
            }],
            _ => Vec::new(),
        }
    }

    fn scene_url(&self) -> String {
        scene_url_from_parcel(&self.parcel)
    }

    fn overlay_surface(&mut self, position: UiPosition) -> Box<dyn SurfacePort> {
        LogSurface::boxed(&format!("ui {position}"))
    }

    fn teleport_to(&mut self, coordinates: &str) {
        info!(from = %self.parcel, to = %coordinates, "teleport");
        self.parcel = coordinates.to_owned();
        self.present = false;
    }
}
