use montage_core::error::Result;
use montage_core::types::Timeline;

use crate::media::{DeviceVideo, MediaLister};

/// Selection front-door for building the initial timeline: holds the device
/// listing and the set of picked sources, in toggle order.
#[derive(Debug, Clone, Default)]
pub struct ImportSession {
    videos: Vec<DeviceVideo>,
    selected: Vec<String>,
}

impl ImportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the device listing from the media collaborator.
    pub async fn refresh<L: MediaLister>(&mut self, lister: &L) {
        self.videos = lister.list_videos().await;
    }

    pub fn videos(&self) -> &[DeviceVideo] {
        &self.videos
    }

    /// Selected source URIs, in the order they were picked.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Add `uri` to the selection, or remove it when already selected.
    pub fn toggle_selection(&mut self, uri: &str) {
        if let Some(position) = self.selected.iter().position(|s| s == uri) {
            self.selected.remove(position);
        } else {
            self.selected.push(uri.to_string());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Build the initial timeline from the current selection; each clip gets
    /// `default_clip_duration_ms` until durations are reconciled from media
    /// metadata.
    pub fn build_timeline(&self, default_clip_duration_ms: i64) -> Result<Timeline> {
        Timeline::build_from_selection(&self.selected, default_clip_duration_ms)
    }
}
