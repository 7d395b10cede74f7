// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene host fake with controllable identity and presence.

use ads_proto::UiPosition;
use ads_scene_port::{Player, SceneHost, SurfacePort};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::MockSurface;

struct HostState {
    user_id: Option<String>,
    players: Vec<Player>,
    scene_url: String,
    overlays: BTreeMap<UiPosition, MockSurface>,
    teleports: Vec<String>,
}

/// [`SceneHost`] whose state tests drive directly; clones share state.
#[derive(Clone)]
pub struct FakeHost {
    inner: Arc<Mutex<HostState>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    /// Anonymous user, empty scene at parcel `0,0`.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HostState {
                user_id: None,
                players: Vec::new(),
                scene_url: "https://scene-0-0.decentraland.org/".into(),
                overlays: BTreeMap::new(),
                teleports: Vec::new(),
            })),
        }
    }

    /// Host whose local user is `user_id` (not yet present).
    pub fn with_user(user_id: &str) -> Self {
        let host = Self::new();
        host.set_user(Some(user_id));
        host
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Change the local user.
    pub fn set_user(&self, user_id: Option<&str>) {
        self.lock().user_id = user_id.map(str::to_owned);
    }

    /// Put the local user in or out of the scene.
    pub fn set_present(&self, present: bool) {
        let mut state = self.lock();
        let Some(user) = state.user_id.clone() else {
            return;
        };
        state.players.retain(|p| p.user_id != user);
        if present {
            state.players.push(Player { user_id: user });
        }
    }

    /// Change the canonical scene URL.
    pub fn set_scene_url(&self, url: &str) {
        self.lock().scene_url = url.to_owned();
    }

    /// Surface handed out for the overlay at `position`.
    pub fn overlay(&self, position: UiPosition) -> Option<MockSurface> {
        self.lock().overlays.get(&position).cloned()
    }

    /// Teleport targets, in order.
    pub fn teleports(&self) -> Vec<String> {
        self.lock().teleports.clone()
    }
}

impl SceneHost for FakeHost {
    fn user_id(&self) -> Option<String> {
        self.lock().user_id.clone()
    }

    fn players_in_scene(&self) -> Vec<Player> {
        self.lock().players.clone()
    }

    fn scene_url(&self) -> String {
        self.lock().scene_url.clone()
    }

    fn overlay_surface(&mut self, position: UiPosition) -> Box<dyn SurfacePort> {
        let surface = MockSurface::new();
        self.lock().overlays.insert(position, surface.clone());
        Box::new(surface)
    }

    fn teleport_to(&mut self, coordinates: &str) {
        self.lock().teleports.push(coordinates.to_owned());
    }
}
