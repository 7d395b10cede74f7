// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Drawing port implemented by host engines.

use crate::MessageIcon;

/// Media to draw on a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFrame {
    /// Media URL (texture or video source).
    pub url: String,
    /// URL opened when the media is activated.
    pub click_url: String,
    /// Fraction of the surface covered on each axis, `0.0..=1.0`.
    pub scale: [f64; 2],
}

/// Drawing primitives a host engine offers to one placement.
///
/// Implementors receive fully resolved content and draw it. They own every
/// engine resource they create and release it in [`SurfacePort::clear`].
pub trait SurfacePort {
    /// Draw a diagnostic panel.
    fn show_message(&mut self, icon: MessageIcon, text: &str);

    /// Draw a still image.
    fn show_image(&mut self, media: &MediaFrame);

    /// Draw a looping video that starts muted.
    ///
    /// The first activation unmutes it; later activations mute it again and
    /// open the click URL.
    fn show_video(&mut self, media: &MediaFrame);

    /// Draw the info indicator linking to `url`.
    fn show_info_box(&mut self, url: &str);

    /// Release every resource drawn so far. Must be safe on an empty surface.
    fn clear(&mut self);
}

/// Fit a `(width, height)` source into a `(width, height)` frame.
///
/// Returns the covered fraction on each axis, preserving the source aspect
/// ratio and never exceeding `1.0`. Degenerate inputs cover the whole frame.
pub fn fit_scale(frame: (f64, f64), source: (f64, f64)) -> [f64; 2] {
    let (fw, fh) = frame;
    let (sw, sh) = source;
    if fw <= 0.0 || fh <= 0.0 || sw <= 0.0 || sh <= 0.0 {
        return [1.0, 1.0];
    }
    let factor = (fw / sw).min(fh / sh);
    [(factor * sw / fw).min(1.0), (factor * sh / fh).min(1.0)]
}
