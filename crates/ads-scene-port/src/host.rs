// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host scene collaborator port.

use ads_proto::UiPosition;

use crate::SurfacePort;

/// A player currently in the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Player identity as reported by the host.
    pub user_id: String,
}

/// Narrow view of the host engine consumed by the supply agent.
pub trait SceneHost {
    /// Identity of the local user, if known.
    fn user_id(&self) -> Option<String>;

    /// Players currently present in this scene.
    fn players_in_scene(&self) -> Vec<Player>;

    /// Canonical URL of the running scene.
    fn scene_url(&self) -> String;

    /// Allocate the screen-space surface backing the overlay at `position`.
    fn overlay_surface(&mut self, position: UiPosition) -> Box<dyn SurfacePort>;

    /// Move the local user to `coordinates`.
    fn teleport_to(&mut self, coordinates: &str);

    /// Whether the local user is among [`SceneHost::players_in_scene`].
    ///
    /// User ids are compared case-insensitively (wallet addresses).
    fn is_user_present(&self) -> bool {
        let Some(user) = self.user_id() else {
            return false;
        };
        self.players_in_scene()
            .iter()
            .any(|p| p.user_id.eq_ignore_ascii_case(&user))
    }
}
