use montage_core::types::TimeMs;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A device-local video as reported by the platform media index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceVideo {
    pub uri: String,
    pub display_name: String,
    pub duration_ms: TimeMs,
}

/// Abstraction over device media access. The session layer only consumes the
/// listing to seed the import selection; enumeration itself lives outside
/// the core.
pub trait MediaLister {
    fn list_videos(&self) -> impl Future<Output = Vec<DeviceVideo>> + Send;
}

/// Resolves the real duration of a source, used to reconcile the sequential
/// clip layout after import. `None` means the source could not be probed and
/// the declared duration stays in effect.
pub trait DurationResolver {
    fn duration_ms(&self, source_uri: &str) -> impl Future<Output = Option<TimeMs>> + Send;
}

/// In-memory media catalog. Serves fixed listings and durations, for tests
/// and for embedders that enumerate media themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticMediaLister {
    videos: Vec<DeviceVideo>,
}

impl StaticMediaLister {
    pub fn new(videos: Vec<DeviceVideo>) -> Self {
        Self { videos }
    }
}

impl MediaLister for StaticMediaLister {
    async fn list_videos(&self) -> Vec<DeviceVideo> {
        self.videos.clone()
    }
}

impl DurationResolver for StaticMediaLister {
    async fn duration_ms(&self, source_uri: &str) -> Option<TimeMs> {
        self.videos
            .iter()
            .find(|v| v.uri == source_uri)
            .map(|v| v.duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> StaticMediaLister {
        StaticMediaLister::new(vec![
            DeviceVideo {
                uri: "content://video/1".into(),
                display_name: "beach.mp4".into(),
                duration_ms: TimeMs::new(5_000).unwrap(),
            },
            DeviceVideo {
                uri: "content://video/2".into(),
                display_name: "city.mp4".into(),
                duration_ms: TimeMs::new(3_000).unwrap(),
            },
        ])
    }

    #[tokio::test]
    async fn static_lister_serves_catalog() {
        let videos = catalog().list_videos().await;
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].display_name, "beach.mp4");
    }

    #[tokio::test]
    async fn static_lister_resolves_known_durations() {
        let lister = catalog();
        assert_eq!(
            lister.duration_ms("content://video/2").await,
            Some(TimeMs::new(3_000).unwrap())
        );
        assert_eq!(lister.duration_ms("content://video/99").await, None);
    }

    #[test]
    fn device_video_serde_roundtrip() {
        let video = DeviceVideo {
            uri: "content://video/1".into(),
            display_name: "beach.mp4".into(),
            duration_ms: TimeMs::new(5_000).unwrap(),
        };
        let json = serde_json::to_string(&video).unwrap();
        let back: DeviceVideo = serde_json::from_str(&json).unwrap();
        assert_eq!(video, back);
    }
}
