// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Random identifiers for impressions and render cases.

use uuid::Uuid;

/// Mint a random version-4 UUID string (`xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`).
pub fn mint_token() -> String {
    Uuid::new_v4().to_string()
}
