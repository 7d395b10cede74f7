// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Request/response envelopes for `/supply/find` and the view beacon.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{Creative, CreativeDto, CustomCommand, CustomCommandDto};

/// Placement batch a request entry belongs to.
///
/// The group is part of the correlation key so the spatial batch and the
/// overlay batch can never collide on a placement name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementGroup {
    /// Spatial placements fixed to scene geometry; always active.
    Plain,
    /// Screen-space overlays; gated on player presence.
    Ui,
}

impl PlacementGroup {
    /// Wire name of the group.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Ui => "ui",
        }
    }

    /// Correlation key for a placement in this group: `"<group>-<name>"`.
    pub fn correlation_id(self, name: &str) -> String {
        format!("{}-{}", self.as_str(), name)
    }
}

impl fmt::Display for PlacementGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen region an overlay placement is anchored to.
///
/// Each position hosts at most one overlay; its wire name doubles as the
/// placement name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiPosition {
    /// Top edge.
    Top,
    /// Bottom edge.
    Bottom,
    /// Left edge.
    Left,
    /// Right edge.
    Right,
    /// Screen centre.
    Center,
}

impl UiPosition {
    /// Every position, in declaration order.
    pub const ALL: [Self; 5] = [Self::Top, Self::Bottom, Self::Left, Self::Right, Self::Center];

    /// Wire name of the position.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
        }
    }
}

impl fmt::Display for UiPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UiPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown overlay position `{s}`"))
    }
}

/// Size/constraint descriptor of a placement, computed fresh before every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementProps {
    /// Stable placement name, unique within its group.
    pub name: String,
    /// Width in protocol units (centimetres for spatial, pixels for overlays).
    pub width: f64,
    /// Height in protocol units.
    pub height: f64,
    /// Depth, when meaningful.
    pub depth: Option<f64>,
    /// Slot ordinal on a multi-faced stand.
    pub no: Option<u32>,
    /// Accepted creative types (`image`, `video`); `None` accepts all.
    pub types: Option<Vec<String>>,
    /// Accepted MIME types; `None` accepts all.
    pub mimes: Option<Vec<String>>,
}

/// One entry of the request's `placements` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementEntry {
    /// Placement props, flattened into the entry.
    #[serde(flatten)]
    pub props: PlacementProps,
    /// Correlation key (`"<group>-<name>"`).
    pub id: String,
}

impl PlacementEntry {
    /// Build an entry for `props` in `group`.
    pub fn new(group: PlacementGroup, props: PlacementProps) -> Self {
        let id = group.correlation_id(&props.name);
        Self { props, id }
    }
}

/// Request context shared by every placement in a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestContext {
    /// Session-stable impression id.
    pub iid: String,
    /// Canonical scene URL.
    pub url: String,
    /// Publisher id.
    pub publisher: String,
    /// Always [`crate::MEDIUM`].
    pub medium: String,
    /// Host engine name.
    pub vendor: String,
    /// Protocol version.
    pub version: String,
    /// Current user id, if known.
    pub uid: Option<String>,
    /// Whether a user id is present.
    pub metamask: bool,
}

/// Body of `POST /supply/find`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindRequest {
    /// Batch context.
    pub context: RequestContext,
    /// One entry per placement in the batch.
    pub placements: Vec<PlacementEntry>,
}

/// Successful body of `POST /supply/find`.
///
/// Creatives are kept as raw values so a single malformed entry only costs
/// its own placement, not the whole batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindResponse {
    /// Raw creative entries.
    pub data: Vec<Value>,
    /// Optional server-issued side effect.
    #[serde(default)]
    pub custom: Option<Value>,
}

impl FindResponse {
    /// Decode the creatives and the custom command, skipping malformed entries.
    ///
    /// Every decoded creative gets a freshly minted case id.
    pub fn into_parts(self) -> (Vec<Creative>, Option<CustomCommand>) {
        let creatives = self
            .data
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<CreativeDto>(raw) {
                Ok(dto) => Some(Creative::from_dto(dto)),
                Err(err) => {
                    warn!(%err, "dropping malformed creative");
                    None
                }
            })
            .collect();
        let custom = self.custom.filter(|v| !v.is_null()).and_then(|raw| {
            match serde_json::from_value::<CustomCommandDto>(raw) {
                Ok(dto) => Some(CustomCommand::from(dto)),
                Err(err) => {
                    warn!(%err, "dropping malformed custom command");
                    None
                }
            }
        });
        (creatives, custom)
    }
}

/// Body returned by a creative's view URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewResponse {
    /// Follow-up tracking contexts to register.
    #[serde(default)]
    pub context: Vec<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn props(name: &str) -> PlacementProps {
        PlacementProps {
            name: name.into(),
            width: 100.0,
            height: 100.0,
            depth: Some(0.0),
            no: None,
            types: None,
            mimes: None,
        }
    }

    #[test]
    fn entry_id_combines_group_and_name() {
        assert_eq!(PlacementEntry::new(PlacementGroup::Plain, props("A")).id, "plain-A");
        assert_eq!(PlacementEntry::new(PlacementGroup::Ui, props("top")).id, "ui-top");
    }

    #[test]
    fn entry_serializes_flat_with_nulls() {
        let value = serde_json::to_value(PlacementEntry::new(PlacementGroup::Plain, props("A")))
            .unwrap();
        assert_eq!(
            value,
            json!({
                "name": "A", "width": 100.0, "height": 100.0, "depth": 0.0,
                "no": null, "types": null, "mimes": null, "id": "plain-A"
            })
        );
    }

    #[test]
    fn response_skips_malformed_creatives() {
        let resp: FindResponse = serde_json::from_value(json!({
            "data": [
                {"id": "plain-A", "type": "image", "serveUrl": "http://x/a.png"},
                {"type": "image"},
                42
            ]
        }))
        .unwrap();
        let (creatives, custom) = resp.into_parts();
        assert_eq!(creatives.len(), 1);
        assert_eq!(creatives[0].id, "plain-A");
        assert!(custom.is_none());
    }

    #[test]
    fn response_decodes_custom_teleport() {
        let resp: FindResponse = serde_json::from_value(json!({
            "data": [],
            "custom": {"teleportTo": {"coordinates": "10,20", "delay": 1500}}
        }))
        .unwrap();
        let (_, custom) = resp.into_parts();
        let teleport = custom.and_then(|c| c.teleport).unwrap();
        assert_eq!(teleport.coordinates, "10,20");
        assert_eq!(teleport.delay.as_millis(), 1500);
    }

    #[test]
    fn response_without_data_is_rejected() {
        let err = serde_json::from_value::<FindResponse>(json!({"message": "nope"}));
        assert!(err.is_err());
    }

    #[test]
    fn ui_position_parses_case_insensitively() {
        assert_eq!("Top".parse::<UiPosition>(), Ok(UiPosition::Top));
        assert_eq!(" center ".parse::<UiPosition>(), Ok(UiPosition::Center));
        assert!("middle".parse::<UiPosition>().is_err());
    }

    #[test]
    fn view_response_defaults_to_no_context() {
        let resp: ViewResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.context.is_empty());
    }
}
