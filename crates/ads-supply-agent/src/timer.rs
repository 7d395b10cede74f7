// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Virtual-time timer queue.
//!
//! The agent never sleeps. It schedules [`Task`]s on a [`TimerQueue`] and the
//! host advances time explicitly, either from its frame tick or from the tokio
//! driver in [`crate::driver`]. Tests advance it by hand.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::Duration;

use ads_proto::UiPosition;

/// Work the agent defers to a later tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Re-fetch the whole plain batch, if `generation` is still current.
    RefreshPlain {
        /// Plain batch generation the timer was armed for.
        generation: u64,
    },
    /// Re-fetch one overlay, if its slot is still at `generation`.
    RefreshUi {
        /// Overlay position.
        position: UiPosition,
        /// Slot generation the timer was armed for.
        generation: u64,
    },
    /// Sample user presence.
    PollPresence,
    /// Teleport the user.
    Teleport {
        /// Target parcel coordinates.
        coordinates: String,
    },
}

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    deadline: Duration,
    token: TimerToken,
}

/// Timer queue over a manually advanced clock.
///
/// Tasks with equal deadlines run in scheduling order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_token: u64,
    heap: BinaryHeap<Reverse<Entry>>,
    tasks: HashMap<TimerToken, Task>,
    cancelled: HashSet<TimerToken>,
}

impl TimerQueue {
    /// Empty queue at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Run `task` once `delay` has elapsed.
    pub fn schedule_after(&mut self, delay: Duration, task: Task) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.heap.push(Reverse(Entry {
            deadline: self.now + delay,
            token,
        }));
        self.tasks.insert(token, task);
        token
    }

    /// Drop a pending task. Returns `false` if it already ran or was cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        if self.tasks.remove(&token).is_some() {
            self.cancelled.insert(token);
            true
        } else {
            false
        }
    }

    /// Move the clock forward.
    pub fn advance(&mut self, elapsed: Duration) {
        self.now += elapsed;
    }

    /// Pop the earliest task whose deadline has passed.
    pub fn pop_due(&mut self) -> Option<Task> {
        loop {
            let Reverse(head) = self.heap.peek()?;
            if head.deadline > self.now {
                return None;
            }
            let Reverse(entry) = self.heap.pop()?;
            if self.cancelled.remove(&entry.token) {
                continue;
            }
            if let Some(task) = self.tasks.remove(&entry.token) {
                return Some(task);
            }
        }
    }

    /// Time until the earliest pending deadline; `None` when idle.
    pub fn next_deadline_in(&self) -> Option<Duration> {
        self.heap
            .iter()
            .filter(|Reverse(e)| !self.cancelled.contains(&e.token))
            .map(|Reverse(e)| e.deadline.saturating_sub(self.now))
            .min()
    }

    /// Pending tasks in deadline order, with their remaining delay.
    pub fn pending(&self) -> Vec<(Duration, Task)> {
        let mut entries: Vec<_> = self
            .heap
            .iter()
            .filter_map(|Reverse(e)| {
                let task = self.tasks.get(&e.token)?;
                Some((e.deadline, e.token, task.clone()))
            })
            .collect();
        entries.sort_by_key(|(deadline, token, _)| (*deadline, *token));
        entries
            .into_iter()
            .map(|(deadline, _, task)| (deadline.saturating_sub(self.now), task))
            .collect()
    }
}
