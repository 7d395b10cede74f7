// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! URL helpers used by the protocol.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::{Creative, WHY_PATH};

/// Bytes `encodeURIComponent` escapes: everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode `value` the way browsers' `encodeURIComponent` does.
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Append query parameters to `url`, preserving any existing query string.
///
/// The first parameter is joined with `?` when the URL has no query yet and
/// with `&` otherwise. Values are percent-encoded; names are taken verbatim.
pub fn add_url_param(url: &str, params: &[(&str, &str)]) -> String {
    let mut out = url.to_owned();
    for (name, value) in params {
        if out.contains('?') {
            if !out.ends_with('?') && !out.ends_with('&') {
                out.push('&');
            }
        } else {
            out.push('?');
        }
        out.push_str(name);
        out.push('=');
        out.push_str(&encode_uri_component(value));
    }
    out
}

/// "Why this ad" page for a rendered creative.
pub fn info_url(adserver: &str, impression_id: &str, creative: &Creative) -> String {
    add_url_param(
        &format!("{adserver}{WHY_PATH}"),
        &[
            ("iid", impression_id),
            ("bid", &creative.creative_id),
            ("cid", &creative.case_id),
            ("url", &creative.serve_url),
        ],
    )
}

/// Canonical scene URL for a parcel base such as `"-10,5"`.
///
/// Minus signs become `n` and the comma a dash:
/// `"-10,5"` → `https://scene-n10-5.decentraland.org/`.
pub fn scene_url_from_parcel(base: &str) -> String {
    let coords = base.trim().replace('-', "n").replacen(',', "-", 1);
    format!("https://scene-{coords}.decentraland.org/")
}
