// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Once-per-session tracking contexts.

use std::collections::HashSet;

use ads_proto::add_url_param;

/// URLs already fired this session. Grows monotonically.
#[derive(Debug, Default)]
pub struct TrackingRegistry {
    fired: HashSet<String>,
}

impl TrackingRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `url` for firing.
    ///
    /// Returns the URL to fetch (with `stid=<seed>` appended when a seed is
    /// given) the first time `url` is seen, `None` afterwards. Dedup is keyed
    /// on the bare URL, so a later call with a different seed is still a
    /// duplicate.
    pub fn claim(&mut self, url: &str, seed_tracking_id: Option<&str>) -> Option<String> {
        if !self.fired.insert(url.to_owned()) {
            return None;
        }
        Some(match seed_tracking_id.filter(|s| !s.is_empty()) {
            Some(seed) => add_url_param(url, &[("stid", seed)]),
            None => url.to_owned(),
        })
    }

    /// Whether `url` has been claimed.
    pub fn contains(&self, url: &str) -> bool {
        self.fired.contains(url)
    }

    /// Number of distinct contexts claimed.
    pub fn len(&self) -> usize {
        self.fired.len()
    }

    /// Whether nothing has been claimed yet.
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_is_refused() {
        let mut reg = TrackingRegistry::new();
        assert_eq!(
            reg.claim("http://t/ctx?a=1", Some("0xAbC")),
            Some("http://t/ctx?a=1&stid=0xAbC".to_owned())
        );
        assert_eq!(reg.claim("http://t/ctx?a=1", None), None);
        assert_eq!(reg.claim("http://t/other", None), Some("http://t/other".into()));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn empty_seed_is_ignored() {
        let mut reg = TrackingRegistry::new();
        assert_eq!(reg.claim("http://t/x", Some("")), Some("http://t/x".into()));
    }
}
