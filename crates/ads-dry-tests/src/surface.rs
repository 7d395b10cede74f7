// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording drawing surface.

use ads_scene_port::{MediaFrame, MessageIcon, SurfacePort};
use std::sync::{Arc, Mutex};

/// One drawing call seen by a [`MockSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    /// `show_message`
    Message(MessageIcon, String),
    /// `show_image`
    Image(MediaFrame),
    /// `show_video`
    Video(MediaFrame),
    /// `show_info_box`
    InfoBox(String),
    /// `clear`
    Clear,
}

/// [`SurfacePort`] that records every call; clones share the log.
#[derive(Debug, Clone, Default)]
pub struct MockSurface {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
}

impl MockSurface {
    /// Empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: SurfaceCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Calls made since the last `Clear`, i.e. what is currently on screen.
    pub fn visible(&self) -> Vec<SurfaceCall> {
        let calls = self.calls();
        let start = calls
            .iter()
            .rposition(|c| *c == SurfaceCall::Clear)
            .map_or(0, |i| i + 1);
        calls[start..].to_vec()
    }

    /// The visible message, if any.
    pub fn message(&self) -> Option<(MessageIcon, String)> {
        self.visible().into_iter().find_map(|c| match c {
            SurfaceCall::Message(icon, text) => Some((icon, text)),
            _ => None,
        })
    }

    /// The visible image, if any.
    pub fn image(&self) -> Option<MediaFrame> {
        self.visible().into_iter().find_map(|c| match c {
            SurfaceCall::Image(media) => Some(media),
            _ => None,
        })
    }

    /// The visible info box URL, if any.
    pub fn info_box(&self) -> Option<String> {
        self.visible().into_iter().find_map(|c| match c {
            SurfaceCall::InfoBox(url) => Some(url),
            _ => None,
        })
    }

    /// Whether nothing has been drawn since the last clear.
    pub fn is_blank(&self) -> bool {
        self.visible().is_empty()
    }
}

impl SurfacePort for MockSurface {
    fn show_message(&mut self, icon: MessageIcon, text: &str) {
        self.push(SurfaceCall::Message(icon, text.to_owned()));
    }

    fn show_image(&mut self, media: &MediaFrame) {
        self.push(SurfaceCall::Image(media.clone()));
    }

    fn show_video(&mut self, media: &MediaFrame) {
        self.push(SurfaceCall::Video(media.clone()));
    }

    fn show_info_box(&mut self, url: &str) {
        self.push(SurfaceCall::InfoBox(url.to_owned()));
    }

    fn clear(&mut self) {
        self.push(SurfaceCall::Clear);
    }
}
