// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Creatives and custom commands as returned by the adserver.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::{add_url_param, mint_token};

const DEFAULT_REFRESH_MS: f64 = 30_000.0;

fn default_refresh_time() -> f64 {
    DEFAULT_REFRESH_MS
}

/// Creative entry exactly as it arrives on the wire.
///
/// `id` and `type` are required. Fields this client does not consume are
/// preserved in [`CreativeDto::extra`] instead of failing the decode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeDto {
    /// Correlation key (`"<group>-<name>"`).
    pub id: String,
    /// Banner id; legacy servers omit it and reuse `id`.
    #[serde(default)]
    pub creative_id: Option<String>,
    /// Media type (`image`, `video`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Native size as `"WxH"`.
    #[serde(default)]
    pub scope: String,
    /// Media URL.
    #[serde(default)]
    pub serve_url: String,
    /// Click-through URL.
    #[serde(default)]
    pub click_url: String,
    /// Impression beacon URL.
    #[serde(default)]
    pub view_url: String,
    /// Whether to show the "why this ad" box; absent means yes.
    #[serde(default)]
    pub info_box: Option<bool>,
    /// Milliseconds until the slot should be refreshed.
    #[serde(default = "default_refresh_time")]
    pub refresh_time: f64,
    /// Fields not consumed by this client.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Media type of a creative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreativeKind {
    /// Still image.
    Image,
    /// Looping video.
    Video,
    /// Anything else; placements render an "invalid format" diagnostic.
    Unsupported(String),
}

impl From<String> for CreativeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::Unsupported(value),
        }
    }
}

impl fmt::Display for CreativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Video => f.write_str("video"),
            Self::Unsupported(other) => f.write_str(other),
        }
    }
}

/// One render instance of a server-assigned creative.
///
/// Every instance carries a fresh `case_id` that is also appended to its
/// click and view URLs as `cid=<case_id>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Creative {
    /// Correlation key (`"<group>-<name>"`).
    pub id: String,
    /// Banner id.
    pub creative_id: String,
    /// Client-minted render instance id.
    pub case_id: String,
    /// Media type.
    pub kind: CreativeKind,
    /// Native size as `"WxH"`.
    pub scope: String,
    /// Media URL.
    pub serve_url: String,
    /// Click-through URL including `cid`.
    pub click_url: String,
    /// Impression beacon URL including `cid`.
    pub view_url: String,
    /// Whether to show the info box.
    pub info_box: bool,
    /// Delay until the slot should be refreshed.
    pub refresh_time: Duration,
}

impl Creative {
    /// Project a wire entry into a render instance, minting a new case id.
    pub fn from_dto(dto: CreativeDto) -> Self {
        if !dto.extra.is_empty() {
            trace!(id = %dto.id, fields = ?dto.extra.keys().collect::<Vec<_>>(), "ignoring creative fields");
        }
        let case_id = mint_token();
        let with_cid = |url: String| {
            if url.is_empty() {
                url
            } else {
                add_url_param(&url, &[("cid", case_id.as_str())])
            }
        };
        let view_url = with_cid(dto.view_url);
        let click_url = with_cid(dto.click_url);
        Self {
            creative_id: dto.creative_id.unwrap_or_else(|| dto.id.clone()),
            id: dto.id,
            kind: dto.kind.into(),
            scope: dto.scope,
            serve_url: dto.serve_url,
            click_url,
            view_url,
            info_box: dto.info_box != Some(false),
            refresh_time: millis(dto.refresh_time),
            case_id,
        }
    }

    /// Native `(width, height)` parsed from the `"WxH"` scope.
    pub fn dimensions(&self) -> Option<(f64, f64)> {
        let (w, h) = self.scope.split_once('x')?;
        let w: f64 = w.trim().parse().ok()?;
        let h: f64 = h.trim().parse().ok()?;
        (w > 0.0 && h > 0.0).then_some((w, h))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn millis(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_millis(value.round() as u64)
    } else {
        Duration::ZERO
    }
}

/// `teleportTo` payload on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeleportDto {
    coordinates: String,
    #[serde(default)]
    delay: Option<f64>,
}

/// Custom command entry as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomCommandDto {
    /// Deferred teleport request.
    #[serde(default)]
    pub teleport_to: Option<TeleportDto>,
    /// Commands this client does not understand.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Deferred teleport of the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teleport {
    /// Target coordinates (`"x,y"` parcel).
    pub coordinates: String,
    /// Delay before the teleport fires.
    pub delay: Duration,
}

/// Out-of-band side effect issued by the server alongside a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomCommand {
    /// Teleport to run after its delay, if requested.
    pub teleport: Option<Teleport>,
}

impl From<CustomCommandDto> for CustomCommand {
    fn from(dto: CustomCommandDto) -> Self {
        if !dto.extra.is_empty() {
            trace!(commands = ?dto.extra.keys().collect::<Vec<_>>(), "ignoring custom commands");
        }
        Self {
            teleport: dto.teleport_to.map(|t| Teleport {
                coordinates: t.coordinates,
                delay: millis(t.delay.unwrap_or(0.0)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dto(value: Value) -> CreativeDto {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> Value {
        json!({
            "id": "plain-A",
            "creativeId": "bid-1",
            "type": "image",
            "scope": "100x100",
            "serveUrl": "http://x/img.png",
            "clickUrl": "http://x/click?a=1",
            "viewUrl": "http://x/view",
            "infoBox": true,
            "refreshTime": 10000,
            "rpm": 1.5
        })
    }

    #[test]
    fn case_ids_are_unique_per_instance() {
        let a = Creative::from_dto(dto(sample()));
        let b = Creative::from_dto(dto(sample()));
        assert_ne!(a.case_id, b.case_id);
        assert!(!a.case_id.is_empty());
    }

    #[test]
    fn tracking_urls_carry_exactly_one_case_id() {
        let c = Creative::from_dto(dto(sample()));
        let cid = format!("cid={}", c.case_id);
        assert_eq!(c.view_url, format!("http://x/view?{cid}"));
        assert_eq!(c.click_url, format!("http://x/click?a=1&{cid}"));
        assert_eq!(c.view_url.matches("cid=").count(), 1);
        assert_eq!(c.click_url.matches("cid=").count(), 1);
    }

    #[test]
    fn defaults_apply_for_missing_fields() {
        let c = Creative::from_dto(dto(json!({"id": "ui-top", "type": "video"})));
        assert_eq!(c.creative_id, "ui-top");
        assert_eq!(c.kind, CreativeKind::Video);
        assert!(c.info_box);
        assert_eq!(c.refresh_time, Duration::from_millis(30_000));
        assert!(c.view_url.is_empty());
        assert_eq!(c.dimensions(), None);
    }

    #[test]
    fn unknown_fields_are_kept_aside() {
        let d = dto(sample());
        assert_eq!(d.extra.get("rpm"), Some(&json!(1.5)));
    }

    #[test]
    fn info_box_false_is_respected() {
        let mut raw = sample();
        raw["infoBox"] = json!(false);
        assert!(!Creative::from_dto(dto(raw)).info_box);
    }

    #[test]
    fn missing_type_is_a_decode_error() {
        assert!(serde_json::from_value::<CreativeDto>(json!({"id": "x"})).is_err());
    }

    #[test]
    fn unsupported_kind_keeps_its_name() {
        let c = Creative::from_dto(dto(json!({"id": "a", "type": "html"})));
        assert_eq!(c.kind, CreativeKind::Unsupported("html".into()));
        assert_eq!(c.kind.to_string(), "html");
    }

    #[test]
    fn scope_parses_dimensions() {
        let c = Creative::from_dto(dto(sample()));
        assert_eq!(c.dimensions(), Some((100.0, 100.0)));
    }

    #[test]
    fn teleport_without_delay_fires_immediately() {
        let cmd: CustomCommandDto =
            serde_json::from_value(json!({"teleportTo": {"coordinates": "-3,7"}})).unwrap();
        let cmd = CustomCommand::from(cmd);
        assert_eq!(
            cmd.teleport,
            Some(Teleport {
                coordinates: "-3,7".into(),
                delay: Duration::ZERO
            })
        );
    }
}
