use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TimeMs
// ---------------------------------------------------------------------------

/// Non-negative count of milliseconds on the composed timeline.
///
/// Construction is validated; deserialization funnels through the same check
/// so a loaded session file cannot smuggle in a negative instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i64", into = "i64")]
pub struct TimeMs(i64);

impl TimeMs {
    pub const ZERO: Self = Self(0);

    pub fn new(value: i64) -> Result<Self> {
        if value < 0 {
            return Err(CoreError::InvalidArgument(format!(
                "time must be >= 0, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for TimeMs {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TimeMs> for i64 {
    fn from(time: TimeMs) -> i64 {
        time.0
    }
}

impl fmt::Display for TimeMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_ms = self.0.unsigned_abs();
        let ms = total_ms % 1_000;
        let total_secs = total_ms / 1_000;
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        let mins = total_mins % 60;
        let hours = total_mins / 60;
        write!(f, "{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
    }
}

// ---------------------------------------------------------------------------
// TimeRange
// ---------------------------------------------------------------------------

/// Half-open interval `[start_ms, end_ms)`; the end must be strictly after
/// the start, so every range has positive duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "RawTimeRange", into = "RawTimeRange")]
pub struct TimeRange {
    start_ms: TimeMs,
    end_ms: TimeMs,
}

#[derive(Serialize, Deserialize)]
struct RawTimeRange {
    start_ms: TimeMs,
    end_ms: TimeMs,
}

impl TimeRange {
    pub fn new(start_ms: TimeMs, end_ms: TimeMs) -> Result<Self> {
        if end_ms.value() <= start_ms.value() {
            return Err(CoreError::InvalidArgument(format!(
                "range end ({end_ms}) must be > start ({start_ms})"
            )));
        }
        Ok(Self { start_ms, end_ms })
    }

    /// Convenience constructor from raw millisecond bounds.
    pub fn from_bounds_ms(start_ms: i64, end_ms: i64) -> Result<Self> {
        Self::new(TimeMs::new(start_ms)?, TimeMs::new(end_ms)?)
    }

    pub fn start_ms(&self) -> TimeMs {
        self.start_ms
    }

    pub fn end_ms(&self) -> TimeMs {
        self.end_ms
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms.value() - self.start_ms.value()
    }

    /// True when the two half-open intervals share at least one instant.
    /// Adjacent ranges (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start_ms.value() < other.end_ms.value()
            && other.start_ms.value() < self.end_ms.value()
    }

    /// True when `start <= time < end`.
    pub fn contains(&self, time: TimeMs) -> bool {
        self.start_ms.value() <= time.value() && time.value() < self.end_ms.value()
    }
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = CoreError;

    fn try_from(raw: RawTimeRange) -> Result<Self> {
        Self::new(raw.start_ms, raw.end_ms)
    }
}

impl From<TimeRange> for RawTimeRange {
    fn from(range: TimeRange) -> Self {
        Self {
            start_ms: range.start_ms,
            end_ms: range.end_ms,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_ms, self.end_ms)
    }
}

// ---------------------------------------------------------------------------
// VideoClip
// ---------------------------------------------------------------------------

/// Reference to a sub-range of a source video, positioned on the composed
/// timeline. Clips are immutable values; edits replace them wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoClip {
    pub id: String,
    pub source_uri: String,
    pub range: TimeRange,
}

// ---------------------------------------------------------------------------
// OverlayKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Sticker,
    Subtitle,
    Music,
}

// ---------------------------------------------------------------------------
// Overlay
// ---------------------------------------------------------------------------

fn default_scale() -> f32 {
    1.0
}

fn default_rotation() -> f32 {
    0.0
}

fn default_volume() -> u8 {
    100
}

/// Timed visual/audio addition layered over the clip sequence. Overlay time
/// ranges may overlap each other freely, unlike clip ranges.
///
/// The session file stores the variant under a `"type"` discriminator
/// (`"sticker" | "subtitle" | "music"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Overlay {
    Sticker {
        id: String,
        time_range: TimeRange,
        asset_id: String,
        x: f32,
        y: f32,
        #[serde(default = "default_scale")]
        scale: f32,
        #[serde(default = "default_rotation")]
        rotation_deg: f32,
    },
    Subtitle {
        id: String,
        time_range: TimeRange,
        text: String,
        x: f32,
        y: f32,
        text_size_sp: f32,
        color_argb: u32,
    },
    Music {
        id: String,
        time_range: TimeRange,
        source_uri: String,
        #[serde(default = "default_volume")]
        volume_percent: u8,
    },
}

impl Overlay {
    pub fn id(&self) -> &str {
        match self {
            Overlay::Sticker { id, .. } => id,
            Overlay::Subtitle { id, .. } => id,
            Overlay::Music { id, .. } => id,
        }
    }

    pub fn time_range(&self) -> TimeRange {
        match self {
            Overlay::Sticker { time_range, .. } => *time_range,
            Overlay::Subtitle { time_range, .. } => *time_range,
            Overlay::Music { time_range, .. } => *time_range,
        }
    }

    pub fn kind(&self) -> OverlayKind {
        match self {
            Overlay::Sticker { .. } => OverlayKind::Sticker,
            Overlay::Subtitle { .. } => OverlayKind::Subtitle,
            Overlay::Music { .. } => OverlayKind::Music,
        }
    }

    /// Same overlay re-timed to `range`.
    pub fn with_time_range(&self, range: TimeRange) -> Self {
        let mut overlay = self.clone();
        match &mut overlay {
            Overlay::Sticker { time_range, .. } => *time_range = range,
            Overlay::Subtitle { time_range, .. } => *time_range = range,
            Overlay::Music { time_range, .. } => *time_range = range,
        }
        overlay
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Non-destructive edit model: ordered clips (playback order) plus a set of
/// timed overlays.
///
/// Invariants, re-checked at every construction boundary including
/// deserialization: at least one clip, and no two clip ranges overlap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawTimeline")]
pub struct Timeline {
    pub(crate) clips: Vec<VideoClip>,
    pub(crate) overlays: Vec<Overlay>,
}

#[derive(Deserialize)]
struct RawTimeline {
    clips: Vec<VideoClip>,
    #[serde(default)]
    overlays: Vec<Overlay>,
}

impl Timeline {
    pub fn new(clips: Vec<VideoClip>, overlays: Vec<Overlay>) -> Result<Self> {
        if clips.is_empty() {
            return Err(CoreError::InvalidArgument(
                "timeline requires at least one clip".into(),
            ));
        }
        let mut ranges: Vec<TimeRange> = clips.iter().map(|c| c.range).collect();
        ranges.sort_by_key(|r| r.start_ms());
        for pair in ranges.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(CoreError::OverlapDetected);
            }
        }
        Ok(Self { clips, overlays })
    }

    pub fn clips(&self) -> &[VideoClip] {
        &self.clips
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// End of the last clip, i.e. the total composed duration.
    pub fn end_ms(&self) -> i64 {
        self.clips
            .last()
            .map(|clip| clip.range.end_ms().value())
            .unwrap_or(0)
    }
}

impl TryFrom<RawTimeline> for Timeline {
    type Error = CoreError;

    fn try_from(raw: RawTimeline) -> Result<Self> {
        Self::new(raw.clips, raw.overlays)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
