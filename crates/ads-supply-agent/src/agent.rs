// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The supply agent: registration, find batches, render dispatch, refresh.

use std::collections::HashMap;
use std::time::Duration;

use ads_app_core::prefs::{AgentPrefs, UiRearm, UiRefresh};
use ads_proto::{
    add_url_param, info_url, mint_token, parse_errors, Creative, CreativeKind, CustomCommand,
    FindRequest, FindResponse, PlacementEntry, PlacementGroup, ProtoError, RequestContext,
    UiPosition, ViewResponse, FIND_PATH, MEDIUM, PROTOCOL_VERSION, REGISTER_PATH,
};
use ads_scene_port::{MessageIcon, Placement, Registration, SceneHost, UiPlacement};
use futures_util::future::join_all;
use serde_json::Value;
use tracing::{debug, info, instrument, trace, warn};

use crate::fetch::{FetchError, FetchRequest, Fetcher};
use crate::presence::{PresenceEdge, PresenceGate};
use crate::registry::Registry;
use crate::timer::{Task, TimerQueue, TimerToken};
use crate::tracking::TrackingRegistry;
use crate::AgentError;

/// Placements fetched together in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Batch {
    Plain,
    Ui(Vec<UiPosition>),
}

impl Batch {
    fn group(&self) -> PlacementGroup {
        match self {
            Self::Plain => PlacementGroup::Plain,
            Self::Ui(_) => PlacementGroup::Ui,
        }
    }
}

#[derive(Debug)]
enum Beacon {
    /// Impression beacon; its response may list further contexts.
    View { url: String, seed: Option<String> },
    /// Tracking context or user registration; response ignored.
    Context { url: String },
}

impl Beacon {
    fn url(&self) -> &str {
        match self {
            Self::View { url, .. } | Self::Context { url } => url,
        }
    }
}

type Member<'a> = (Option<UiPosition>, &'a mut Box<dyn Placement>);

fn members<'a>(registry: &'a mut Registry, batch: &Batch) -> Vec<Member<'a>> {
    match batch {
        Batch::Plain => registry.plain_mut().iter_mut().map(|p| (None, p)).collect(),
        Batch::Ui(positions) => registry
            .ui_mut()
            .iter_mut()
            .filter(|s| positions.contains(&s.position))
            .map(|s| (Some(s.position), &mut s.placement))
            .collect(),
    }
}

/// Orchestrates ad placements for one scene.
///
/// Plain placements are fetched as one batch and refreshed together. Overlay
/// placements are fetched when the user enters the scene and follow
/// [`AgentPrefs::ui_refresh`] and [`AgentPrefs::ui_rearm`]. Time only moves
/// through [`SupplyAgent::tick`].
pub struct SupplyAgent<F, H> {
    prefs: AgentPrefs,
    impression_id: String,
    fetcher: F,
    host: H,
    registry: Registry,
    tracking: TrackingRegistry,
    timers: TimerQueue,
    presence: PresenceGate,
    plain_generation: u64,
    plain_timer: Option<TimerToken>,
    ui_timers: HashMap<UiPosition, TimerToken>,
    presence_timer: Option<TimerToken>,
    outbox: Vec<Beacon>,
    spawned: bool,
}

impl<F, H> std::fmt::Debug for SupplyAgent<F, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupplyAgent")
            .field("impression_id", &self.impression_id)
            .field("plain_generation", &self.plain_generation)
            .field("spawned", &self.spawned)
            .finish_non_exhaustive()
    }
}

impl<F: Fetcher, H: SceneHost> SupplyAgent<F, H> {
    /// Agent for `prefs`; trailing slashes are stripped from the adserver URL
    /// and a fresh impression id is minted.
    pub fn new(mut prefs: AgentPrefs, fetcher: F, host: H) -> Self {
        prefs.adserver = prefs.adserver.trim_end_matches('/').to_owned();
        Self {
            registry: Registry::new(prefs.max_placements),
            presence: PresenceGate::new(prefs.ui_rearm),
            prefs,
            impression_id: mint_token(),
            fetcher,
            host,
            tracking: TrackingRegistry::new(),
            timers: TimerQueue::new(),
            plain_generation: 0,
            plain_timer: None,
            ui_timers: HashMap::new(),
            presence_timer: None,
            outbox: Vec::new(),
            spawned: false,
        }
    }

    /// Session-stable impression id.
    pub fn impression_id(&self) -> &str {
        &self.impression_id
    }

    /// Adserver base URL without trailing slashes.
    pub fn adserver(&self) -> &str {
        &self.prefs.adserver
    }

    /// Publisher id.
    pub fn publisher(&self) -> &str {
        &self.prefs.publisher
    }

    /// Effective settings.
    pub fn prefs(&self) -> &AgentPrefs {
        &self.prefs
    }

    /// The fetch capability.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The host scene.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host scene, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Pending timers.
    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// Tracking contexts claimed so far.
    pub fn tracking(&self) -> &TrackingRegistry {
        &self.tracking
    }

    /// Time until the next scheduled task; `None` when nothing is pending.
    pub fn next_deadline_in(&self) -> Option<Duration> {
        self.timers.next_deadline_in()
    }

    /// Names registered in `group`, in registration order.
    pub fn placement_names(&self, group: PlacementGroup) -> Vec<String> {
        match group {
            PlacementGroup::Plain => self
                .registry
                .plain()
                .iter()
                .map(|p| p.name().to_owned())
                .collect(),
            PlacementGroup::Ui => self
                .registry
                .ui()
                .iter()
                .map(|s| s.placement.name().to_owned())
                .collect(),
        }
    }

    /// Whether the overlay at `position` is currently in rotation.
    pub fn is_ui_active(&self, position: UiPosition) -> bool {
        self.registry
            .ui()
            .iter()
            .any(|s| s.position == position && s.active)
    }

    /// Register placements and stands.
    ///
    /// The call is checked as a whole against the placement cap and for
    /// duplicate names before anything is committed. A rejected call paints
    /// the error on every plain placement, registered or rejected.
    pub fn add_placement<I>(&mut self, items: I) -> Result<&mut Self, AgentError>
    where
        I: IntoIterator<Item = Registration>,
    {
        let incoming: Vec<Box<dyn Placement>> = items
            .into_iter()
            .flat_map(Registration::into_placements)
            .collect();
        if let Err(err) = self.registry.check_plain(&incoming) {
            warn!(%err, "placement registration rejected");
            let message = self.diagnostic(&err.to_string());
            for placement in self.registry.plain_mut() {
                placement.render_message(&message, MessageIcon::Error);
            }
            for mut placement in incoming {
                placement.render_message(&message, MessageIcon::Error);
            }
            return Err(err);
        }
        self.registry.commit_plain(incoming);
        Ok(self)
    }

    /// Create one overlay per position. Each position may be allowed once.
    pub fn allow_ui_placements(
        &mut self,
        positions: &[UiPosition],
    ) -> Result<&mut Self, AgentError> {
        if let Err(err) = self.registry.check_ui(positions) {
            warn!(%err, "overlay registration rejected");
            let message = self.diagnostic(&err.to_string());
            for placement in self.registry.plain_mut() {
                placement.render_message(&message, MessageIcon::Error);
            }
            return Err(err);
        }
        for &position in positions {
            let surface = self.host.overlay_surface(position);
            self.registry
                .commit_ui(position, Box::new(UiPlacement::new(position, surface)));
        }
        if self.spawned && self.presence_timer.is_none() && self.presence.keep_polling() {
            self.presence_timer = Some(self.timers.schedule_after(Duration::ZERO, Task::PollPresence));
        }
        Ok(self)
    }

    /// Start the agent: sample presence for overlays, then fetch the plain batch.
    ///
    /// The returned result is the plain batch's; overlay failures are painted
    /// and logged only.
    pub async fn spawn(&mut self) -> Result<Vec<Creative>, AgentError> {
        if !self.spawned {
            self.spawned = true;
            info!(
                version = PROTOCOL_VERSION,
                publisher = %self.prefs.publisher,
                adserver = %self.prefs.adserver,
                impression = %self.impression_id,
                "ad supply agent started"
            );
            if !self.registry.ui().is_empty() && self.presence_timer.is_none() {
                self.poll_presence().await;
            }
        }
        self.find(PlacementGroup::Plain).await
    }

    /// Fetch and render every active placement of `group`.
    ///
    /// Success arms the group's refresh; failure paints the error on the
    /// whole batch, arms nothing and is returned.
    pub async fn find(&mut self, group: PlacementGroup) -> Result<Vec<Creative>, AgentError> {
        let batch = match group {
            PlacementGroup::Plain => Batch::Plain,
            PlacementGroup::Ui => Batch::Ui(
                self.registry
                    .ui()
                    .iter()
                    .filter(|s| s.active)
                    .map(|s| s.position)
                    .collect(),
            ),
        };
        self.run_batch(batch).await
    }

    /// Advance virtual time by `elapsed` and run every task that came due.
    pub async fn tick(&mut self, elapsed: Duration) {
        self.timers.advance(elapsed);
        while let Some(task) = self.timers.pop_due() {
            self.run_task(task).await;
        }
    }

    /// Queue `url` for firing unless it was already fired this session.
    ///
    /// `seed_tracking_id` is appended as `stid`. Returns whether the URL was
    /// newly queued; queued beacons go out on [`SupplyAgent::flush_beacons`].
    pub fn register_context(&mut self, url: &str, seed_tracking_id: Option<&str>) -> bool {
        match self.tracking.claim(url, seed_tracking_id) {
            Some(target) => {
                debug!(%url, "registering tracking context");
                self.outbox.push(Beacon::Context { url: target });
                true
            }
            None => false,
        }
    }

    /// Queue the session's user registration beacon.
    pub fn register_user(&mut self, user_id: Option<&str>) -> bool {
        let url = add_url_param(
            &format!("{}{REGISTER_PATH}", self.prefs.adserver),
            &[("iid", self.impression_id.as_str())],
        );
        self.register_context(&url, user_id)
    }

    /// Fire every queued beacon concurrently, including contexts announced by
    /// view responses. Failures are logged and dropped. Returns the number of
    /// requests sent.
    pub async fn flush_beacons(&mut self) -> usize {
        let mut sent = 0;
        while !self.outbox.is_empty() {
            let beacons = std::mem::take(&mut self.outbox);
            sent += beacons.len();
            let fetcher = &self.fetcher;
            let results = join_all(beacons.into_iter().map(|beacon| async move {
                let result = fetcher
                    .signed_fetch(FetchRequest::get(beacon.url().to_owned()))
                    .await;
                (beacon, result)
            }))
            .await;
            for (beacon, result) in results {
                let response = match result {
                    Ok(response) if response.is_success() => response,
                    Ok(response) => {
                        warn!(url = %beacon.url(), status = response.status, "beacon rejected");
                        continue;
                    }
                    Err(err) => {
                        warn!(url = %beacon.url(), %err, "beacon failed");
                        continue;
                    }
                };
                if let Beacon::View { seed, .. } = beacon {
                    match response.decode::<ViewResponse>() {
                        Ok(view) => {
                            for context in view.context {
                                self.register_context(&context, seed.as_deref());
                            }
                        }
                        Err(err) => trace!(%err, "view response without contexts"),
                    }
                }
            }
        }
        sent
    }

    fn diagnostic(&self, message: &str) -> String {
        format!(
            "{message}\n\nAdserver: {}\nPublisher: {}\nVersion: {PROTOCOL_VERSION}",
            self.prefs.adserver, self.prefs.publisher
        )
    }

    fn request_context(&self, user_id: Option<String>) -> RequestContext {
        RequestContext {
            iid: self.impression_id.clone(),
            url: self.host.scene_url(),
            publisher: self.prefs.publisher.clone(),
            medium: MEDIUM.to_owned(),
            vendor: self.prefs.vendor.clone(),
            version: PROTOCOL_VERSION.to_owned(),
            metamask: user_id.is_some(),
            uid: user_id,
        }
    }

    async fn request_creatives(
        &self,
        request: &FindRequest,
    ) -> Result<(Vec<Creative>, Option<CustomCommand>), AgentError> {
        let body = serde_json::to_value(request).map_err(ProtoError::from)?;
        let url = format!("{}{FIND_PATH}", self.prefs.adserver);
        let response = self.fetcher.fetch(FetchRequest::post_json(url, body)).await?;
        if !response.is_success() {
            return Err(match response.decode::<Value>() {
                Ok(body) => ProtoError::Server(parse_errors(&body)).into(),
                Err(_) => FetchError::Status {
                    status: response.status,
                    body: String::from_utf8_lossy(&response.body).into_owned(),
                }
                .into(),
            });
        }
        let decoded: FindResponse = response.decode().map_err(ProtoError::from)?;
        Ok(decoded.into_parts())
    }

    #[instrument(skip_all, fields(group = %batch.group()))]
    async fn run_batch(&mut self, batch: Batch) -> Result<Vec<Creative>, AgentError> {
        let group = batch.group();
        let user_id = self.host.user_id();
        self.register_user(user_id.as_deref());

        let placements: Vec<PlacementEntry> = members(&mut self.registry, &batch)
            .iter()
            .map(|(_, p)| PlacementEntry::new(group, p.props()))
            .collect();
        if placements.is_empty() {
            self.flush_beacons().await;
            return Ok(Vec::new());
        }
        info!(placements = placements.len(), "requesting creatives");
        let request = FindRequest {
            context: self.request_context(user_id.clone()),
            placements,
        };

        let (creatives, custom) = match self.request_creatives(&request).await {
            Ok(parts) => parts,
            Err(err) => {
                warn!(%err, "find failed");
                let message = self.diagnostic(&err.to_string());
                for (_, placement) in members(&mut self.registry, &batch) {
                    placement.render_message(&message, MessageIcon::Error);
                }
                self.flush_beacons().await;
                return Err(err);
            }
        };

        let mut by_id: HashMap<&str, &Creative> = HashMap::new();
        for creative in &creatives {
            by_id.entry(creative.id.as_str()).or_insert(creative);
        }
        let not_found = self.diagnostic(&format!(
            "We can't match any creative.\n\nImpression ID: {}",
            self.impression_id
        ));
        let mut refresh = Duration::ZERO;
        let mut overlays = Vec::new();
        for (position, placement) in members(&mut self.registry, &batch) {
            let id = group.correlation_id(placement.name());
            let matched = by_id
                .get(id.as_str())
                .copied()
                .filter(|c| group == PlacementGroup::Plain || c.kind != CreativeKind::Video);
            let Some(creative) = matched else {
                debug!(%id, "no creative matched");
                placement.render_message(&not_found, MessageIcon::NotFound);
                if let Some(position) = position {
                    overlays.push((position, Duration::ZERO));
                }
                continue;
            };
            placement.reset();
            placement.render_creative(creative);
            if let CreativeKind::Unsupported(kind) = &creative.kind {
                warn!(%id, %kind, "unsupported creative type");
                if let Some(position) = position {
                    overlays.push((position, Duration::ZERO));
                }
                continue;
            }
            if creative.info_box {
                placement.render_info_box(&info_url(
                    &self.prefs.adserver,
                    &self.impression_id,
                    creative,
                ));
            }
            if !creative.view_url.is_empty() {
                self.outbox.push(Beacon::View {
                    url: creative.view_url.clone(),
                    seed: user_id.clone(),
                });
            }
            refresh = refresh.max(creative.refresh_time);
            if let Some(position) = position {
                overlays.push((position, creative.refresh_time));
            }
        }

        if let Some(command) = custom {
            self.execute(command);
        }

        let floor = self.prefs.min_refresh();
        match batch {
            Batch::Plain => self.arm_plain(refresh.max(floor)),
            Batch::Ui(_) if self.prefs.ui_refresh == UiRefresh::PerPlacement => {
                for (position, delay) in overlays {
                    self.arm_ui(position, delay.max(floor));
                }
            }
            Batch::Ui(_) => {}
        }

        self.flush_beacons().await;
        Ok(creatives)
    }

    fn execute(&mut self, command: CustomCommand) {
        if let Some(teleport) = command.teleport {
            info!(
                coordinates = %teleport.coordinates,
                delay_ms = teleport.delay.as_millis(),
                "teleport scheduled"
            );
            self.timers.schedule_after(
                teleport.delay,
                Task::Teleport {
                    coordinates: teleport.coordinates,
                },
            );
        }
    }

    fn arm_plain(&mut self, delay: Duration) {
        if let Some(token) = self.plain_timer.take() {
            self.timers.cancel(token);
        }
        self.plain_generation += 1;
        let generation = self.plain_generation;
        debug!(delay_ms = delay.as_millis(), generation, "plain refresh armed");
        self.plain_timer = Some(
            self.timers
                .schedule_after(delay, Task::RefreshPlain { generation }),
        );
    }

    fn arm_ui(&mut self, position: UiPosition, delay: Duration) {
        let Some(generation) = self
            .registry
            .ui()
            .iter()
            .find(|s| s.position == position)
            .map(|s| s.generation)
        else {
            return;
        };
        if let Some(token) = self.ui_timers.remove(&position) {
            self.timers.cancel(token);
        }
        debug!(%position, delay_ms = delay.as_millis(), generation, "overlay refresh armed");
        let token = self.timers.schedule_after(
            delay,
            Task::RefreshUi {
                position,
                generation,
            },
        );
        self.ui_timers.insert(position, token);
    }

    async fn run_task(&mut self, task: Task) {
        match task {
            Task::RefreshPlain { generation } => {
                if generation != self.plain_generation {
                    trace!(generation, "stale plain refresh ignored");
                    return;
                }
                self.plain_timer = None;
                if self.run_batch(Batch::Plain).await.is_err() {
                    if let Some(backoff) = self.prefs.failure_backoff() {
                        self.arm_plain(backoff);
                    }
                }
            }
            Task::RefreshUi {
                position,
                generation,
            } => {
                let live = self
                    .registry
                    .ui()
                    .iter()
                    .any(|s| s.position == position && s.active && s.generation == generation);
                if !live {
                    trace!(%position, generation, "stale overlay refresh ignored");
                    return;
                }
                self.ui_timers.remove(&position);
                if self.run_batch(Batch::Ui(vec![position])).await.is_err() {
                    if let Some(backoff) = self.prefs.failure_backoff() {
                        self.arm_ui(position, backoff);
                    }
                }
            }
            Task::PollPresence => {
                self.presence_timer = None;
                self.poll_presence().await;
            }
            Task::Teleport { coordinates } => {
                info!(%coordinates, "teleporting");
                self.host.teleport_to(&coordinates);
            }
        }
    }

    async fn poll_presence(&mut self) {
        match self.presence.observe(self.host.is_user_present()) {
            PresenceEdge::Entered => {
                info!(activation = self.presence.activations(), "user entered, showing overlays");
                let mut positions = Vec::new();
                for slot in self.registry.ui_mut() {
                    slot.active = true;
                    positions.push(slot.position);
                }
                // Failure is already painted on the overlays.
                let _ = self.run_batch(Batch::Ui(positions)).await;
            }
            PresenceEdge::Left if self.prefs.ui_rearm == UiRearm::OnReentry => {
                debug!("user left, clearing overlays");
                for slot in self.registry.ui_mut() {
                    slot.active = false;
                    slot.generation += 1;
                    slot.placement.reset();
                }
                for (_, token) in self.ui_timers.drain() {
                    self.timers.cancel(token);
                }
            }
            PresenceEdge::Left | PresenceEdge::Steady => {}
        }
        if self.presence.keep_polling() {
            self.presence_timer = Some(
                self.timers
                    .schedule_after(self.prefs.presence_poll(), Task::PollPresence),
            );
        }
    }
}
