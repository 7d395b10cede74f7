// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tokio driver mapping wall-clock time onto the agent's timer queue.

use std::future::Future;

use ads_scene_port::SceneHost;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::{Fetcher, SupplyAgent};

/// Spawn `agent` and keep ticking it until `shutdown` resolves.
///
/// A failed initial fetch is logged; the agent keeps running so overlays and
/// any configured backoff still get their turn. Must run on a current-thread
/// runtime or inside a `LocalSet`, since placements are not `Send`.
pub async fn drive<F, H>(agent: &mut SupplyAgent<F, H>, shutdown: impl Future<Output = ()>)
where
    F: Fetcher,
    H: SceneHost,
{
    tokio::pin!(shutdown);
    if let Err(err) = agent.spawn().await {
        warn!(%err, "initial fetch failed");
    }
    let mut last = Instant::now();
    loop {
        let wait = agent.next_deadline_in();
        let due = async {
            match wait {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            () = &mut shutdown => {
                info!("supply agent stopping");
                return;
            }
            () = due => {
                let now = Instant::now();
                agent.tick(now - last).await;
                last = now;
            }
        }
    }
}
