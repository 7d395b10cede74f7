// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire schema for the ad supply protocol.
//!
//! This crate owns everything that crosses the network boundary between a
//! scene plugin and the adserver: the `/supply/find` request and response
//! envelopes, the decoded [`Creative`] and [`CustomCommand`] values, and the
//! small URL/error helpers the protocol relies on. It contains NO scheduling
//! or rendering logic; that lives in `ads-supply-agent` and `ads-scene-port`.

use thiserror::Error;

mod creative;
mod errors;
mod token;
mod url;
mod wire;

pub use creative::{
    Creative, CreativeDto, CreativeKind, CustomCommand, CustomCommandDto, Teleport, TeleportDto,
};
pub use errors::parse_errors;
pub use token::mint_token;
pub use url::{add_url_param, encode_uri_component, info_url, scene_url_from_parcel};
pub use wire::{
    FindRequest, FindResponse, PlacementEntry, PlacementGroup, PlacementProps, RequestContext,
    UiPosition, ViewResponse,
};

/// Protocol version reported in every find request and diagnostic.
pub const PROTOCOL_VERSION: &str = "2.1.0";

/// Medium reported in the request context.
pub const MEDIUM: &str = "metaverse";

/// Path of the creative lookup endpoint, relative to the adserver base URL.
pub const FIND_PATH: &str = "/supply/find";

/// Path of the user registration beacon, relative to the adserver base URL.
pub const REGISTER_PATH: &str = "/supply/register";

/// Path of the "why this ad" page, relative to the adserver base URL.
pub const WHY_PATH: &str = "/supply/why";

/// Error type for protocol decoding.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// The payload was not valid JSON or did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// The server answered with an error body; one entry per message line.
    #[error("{}", .0.join("\n"))]
    Server(Vec<String>),
}
