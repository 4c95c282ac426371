use montage_core::types::{Overlay, OverlayKind, TimeRange, Timeline, VideoClip};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::export::{ExportEngine, ExportResult};
use crate::media::DurationResolver;

/// Canonical minimum overlay length while a draft is being edited.
const MIN_DRAFT_DURATION_MS: i64 = 100;
/// Minimum separation between the viewport bounds.
const MIN_VIEWPORT_SPAN_MS: i64 = 100;
/// Minimum separation between the trim-selection bounds.
const MIN_TRIM_SPAN_MS: i64 = 1;
const DEFAULT_DRAFT_DURATION_MS: i64 = 1_000;
const DEFAULT_ZOOM_PX_PER_MS: f32 = 0.3;
const MIN_ZOOM_PX_PER_MS: f32 = 0.01;
const MAX_ZOOM_PX_PER_MS: f32 = 10.0;

// ---------------------------------------------------------------------------
// EditorState
// ---------------------------------------------------------------------------

/// Snapshot of the interactive editing session.
///
/// Owned and mutated exclusively by [`EditorSession`]; observers receive
/// clones through the watch channel.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub timeline: Option<Timeline>,
    pub is_exporting: bool,
    pub is_playing: bool,
    pub current_position_ms: i64,
    /// Which overlay editing sheet is open, if any.
    pub overlay_sheet: Option<OverlayKind>,
    pub overlay_draft: Option<OverlayDraft>,
    pub selected_overlay_id: Option<String>,
    pub zoom_px_per_ms: f32,
    pub trim_start_ms: i64,
    pub trim_end_ms: i64,
    /// Scoped sub-range used for scrubbing/preview after a cut.
    pub viewport_start_ms: i64,
    pub viewport_end_ms: i64,
    pub is_trim_editing: bool,
}

impl EditorState {
    fn initial(timeline: Option<Timeline>) -> Self {
        let end = timeline.as_ref().map(|t| t.end_ms()).unwrap_or(0);
        Self {
            timeline,
            is_exporting: false,
            is_playing: false,
            current_position_ms: 0,
            overlay_sheet: None,
            overlay_draft: None,
            selected_overlay_id: None,
            zoom_px_per_ms: DEFAULT_ZOOM_PX_PER_MS,
            trim_start_ms: 0,
            trim_end_ms: end,
            viewport_start_ms: 0,
            viewport_end_ms: end,
            is_trim_editing: false,
        }
    }
}

// ---------------------------------------------------------------------------
// OverlayDraft
// ---------------------------------------------------------------------------

/// In-progress, not-yet-committed overlay field values. Mirrors the
/// [`Overlay`] variants with plain fields plus a placement window.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayDraft {
    Sticker {
        asset_id: String,
        x: f32,
        y: f32,
        scale: f32,
        rotation_deg: f32,
        start_ms: i64,
        duration_ms: i64,
    },
    Subtitle {
        text: String,
        x: f32,
        y: f32,
        text_size_sp: f32,
        color_argb: u32,
        start_ms: i64,
        duration_ms: i64,
    },
    Music {
        source_uri: Option<String>,
        volume_percent: u8,
        start_ms: i64,
        duration_ms: i64,
    },
}

impl OverlayDraft {
    pub fn kind(&self) -> OverlayKind {
        match self {
            OverlayDraft::Sticker { .. } => OverlayKind::Sticker,
            OverlayDraft::Subtitle { .. } => OverlayKind::Subtitle,
            OverlayDraft::Music { .. } => OverlayKind::Music,
        }
    }

    fn placement(&self) -> (i64, i64) {
        match self {
            OverlayDraft::Sticker { start_ms, duration_ms, .. }
            | OverlayDraft::Subtitle { start_ms, duration_ms, .. }
            | OverlayDraft::Music { start_ms, duration_ms, .. } => (*start_ms, *duration_ms),
        }
    }

    fn with_placement(&self, new_start_ms: i64, new_duration_ms: i64) -> Self {
        let mut draft = self.clone();
        match &mut draft {
            OverlayDraft::Sticker { start_ms, duration_ms, .. }
            | OverlayDraft::Subtitle { start_ms, duration_ms, .. }
            | OverlayDraft::Music { start_ms, duration_ms, .. } => {
                *start_ms = new_start_ms;
                *duration_ms = new_duration_ms;
            }
        }
        draft
    }

    fn default_for(kind: OverlayKind) -> Self {
        match kind {
            OverlayKind::Sticker => OverlayDraft::Sticker {
                asset_id: "star".into(),
                x: 0.5,
                y: 0.5,
                scale: 1.0,
                rotation_deg: 0.0,
                start_ms: 0,
                duration_ms: DEFAULT_DRAFT_DURATION_MS,
            },
            OverlayKind::Subtitle => OverlayDraft::Subtitle {
                text: String::new(),
                x: 0.5,
                y: 0.8,
                text_size_sp: 16.0,
                color_argb: 0xFFFF_FFFF,
                start_ms: 0,
                duration_ms: DEFAULT_DRAFT_DURATION_MS,
            },
            OverlayKind::Music => OverlayDraft::Music {
                source_uri: None,
                volume_percent: 100,
                start_ms: 0,
                duration_ms: DEFAULT_DRAFT_DURATION_MS,
            },
        }
    }

    fn from_overlay(overlay: &Overlay) -> Self {
        let start_ms = overlay.time_range().start_ms().value();
        let duration_ms = overlay.time_range().duration_ms();
        match overlay {
            Overlay::Sticker {
                asset_id,
                x,
                y,
                scale,
                rotation_deg,
                ..
            } => OverlayDraft::Sticker {
                asset_id: asset_id.clone(),
                x: *x,
                y: *y,
                scale: *scale,
                rotation_deg: *rotation_deg,
                start_ms,
                duration_ms,
            },
            Overlay::Subtitle {
                text,
                x,
                y,
                text_size_sp,
                color_argb,
                ..
            } => OverlayDraft::Subtitle {
                text: text.clone(),
                x: *x,
                y: *y,
                text_size_sp: *text_size_sp,
                color_argb: *color_argb,
                start_ms,
                duration_ms,
            },
            Overlay::Music {
                source_uri,
                volume_percent,
                ..
            } => OverlayDraft::Music {
                source_uri: Some(source_uri.clone()),
                volume_percent: *volume_percent,
                start_ms,
                duration_ms,
            },
        }
    }

    fn into_overlay(&self, id: String, time_range: TimeRange) -> Overlay {
        match self {
            OverlayDraft::Sticker {
                asset_id,
                x,
                y,
                scale,
                rotation_deg,
                ..
            } => Overlay::Sticker {
                id,
                time_range,
                asset_id: asset_id.clone(),
                x: *x,
                y: *y,
                scale: *scale,
                rotation_deg: *rotation_deg,
            },
            OverlayDraft::Subtitle {
                text,
                x,
                y,
                text_size_sp,
                color_argb,
                ..
            } => Overlay::Subtitle {
                id,
                time_range,
                text: text.clone(),
                x: *x,
                y: *y,
                text_size_sp: *text_size_sp,
                color_argb: *color_argb,
            },
            OverlayDraft::Music {
                source_uri,
                volume_percent,
                ..
            } => Overlay::Music {
                id,
                time_range,
                source_uri: source_uri.clone().unwrap_or_default(),
                volume_percent: *volume_percent,
            },
        }
    }

    /// Merge this draft into an existing overlay of the same variant,
    /// preserving its id. `None` when the variants differ.
    fn merge_into(&self, target: &Overlay, time_range: TimeRange) -> Option<Overlay> {
        match (target, self) {
            (Overlay::Sticker { id, .. }, OverlayDraft::Sticker { .. })
            | (Overlay::Subtitle { id, .. }, OverlayDraft::Subtitle { .. }) => {
                Some(self.into_overlay(id.clone(), time_range))
            }
            (
                Overlay::Music { id, source_uri, .. },
                OverlayDraft::Music {
                    source_uri: draft_uri,
                    volume_percent,
                    ..
                },
            ) => Some(Overlay::Music {
                id: id.clone(),
                time_range,
                source_uri: draft_uri.clone().unwrap_or_else(|| source_uri.clone()),
                volume_percent: *volume_percent,
            }),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// EditorSession
// ---------------------------------------------------------------------------

/// Stateful controller for one editing session.
///
/// All mutation goes through `&mut self`; callers that need cross-thread
/// access must wrap the session in their own mutex or actor. Each mutation
/// publishes a fresh [`EditorState`] snapshot to subscribers.
pub struct EditorSession {
    state: EditorState,
    state_tx: watch::Sender<EditorState>,
    /// Single in-flight export job; re-entry is a no-op while set.
    export_job: Option<JoinHandle<ExportResult>>,
}

impl EditorSession {
    pub fn new(initial_timeline: Option<Timeline>) -> Self {
        let state = EditorState::initial(initial_timeline);
        let (state_tx, _) = watch::channel(state.clone());
        Self {
            state,
            state_tx,
            export_job: None,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Receiver that observes every published state snapshot.
    pub fn subscribe(&self) -> watch::Receiver<EditorState> {
        self.state_tx.subscribe()
    }

    fn publish(&mut self) {
        self.state_tx.send_replace(self.state.clone());
    }

    fn timeline_end(&self) -> Option<i64> {
        self.state.timeline.as_ref().map(|t| t.end_ms())
    }

    // -- timeline ----------------------------------------------------------

    /// Replace the current timeline and reset the transient windows: trim
    /// selection and viewport cover the whole timeline again.
    pub fn set_timeline(&mut self, timeline: Timeline) {
        let end = timeline.end_ms();
        self.state.timeline = Some(timeline);
        self.state.trim_start_ms = 0;
        self.state.trim_end_ms = end;
        self.state.viewport_start_ms = 0;
        self.state.viewport_end_ms = end;
        self.state.is_trim_editing = false;
        self.publish();
    }

    /// Re-lay clips sequentially using real media durations from `resolver`,
    /// falling back to each clip's declared duration when a source cannot be
    /// probed. Applies the result with [`set_timeline`] semantics.
    ///
    /// [`set_timeline`]: EditorSession::set_timeline
    pub async fn reconcile_clip_durations<R: DurationResolver>(&mut self, resolver: &R) {
        let Some(timeline) = self.state.timeline.clone() else {
            return;
        };
        let mut cursor = 0i64;
        let mut clips = Vec::with_capacity(timeline.clips().len());
        for clip in timeline.clips() {
            let declared = clip.range.duration_ms();
            let duration = match resolver.duration_ms(&clip.source_uri).await {
                Some(real) if real.value() > 0 => real.value(),
                _ => declared,
            };
            let Ok(range) = TimeRange::from_bounds_ms(cursor, cursor + duration) else {
                return;
            };
            clips.push(VideoClip {
                id: clip.id.clone(),
                source_uri: clip.source_uri.clone(),
                range,
            });
            cursor += duration;
        }
        match Timeline::new(clips, timeline.overlays().to_vec()) {
            Ok(reconciled) => self.set_timeline(reconciled),
            Err(err) => {
                tracing::warn!(%err, "duration reconciliation produced an invalid timeline")
            }
        }
    }

    // -- overlay draft workflow --------------------------------------------

    /// Open the editing sheet for a fresh overlay draft of `kind`.
    pub fn start_add_overlay(&mut self, kind: OverlayKind) {
        self.state.selected_overlay_id = None;
        self.state.overlay_sheet = Some(kind);
        self.state.overlay_draft = Some(OverlayDraft::default_for(kind));
        self.publish();
    }

    /// Load an existing overlay into a draft for editing. Unknown ids are
    /// ignored.
    pub fn start_edit_overlay(&mut self, overlay_id: &str) {
        let Some(timeline) = self.state.timeline.as_ref() else {
            return;
        };
        let Some(overlay) = timeline.overlays().iter().find(|o| o.id() == overlay_id) else {
            return;
        };
        let draft = OverlayDraft::from_overlay(overlay);
        self.state.selected_overlay_id = Some(overlay_id.to_string());
        self.state.overlay_sheet = Some(draft.kind());
        self.state.overlay_draft = Some(draft);
        self.publish();
    }

    /// Discard the draft and close the sheet without committing.
    pub fn close_sheet(&mut self) {
        self.state.overlay_sheet = None;
        self.state.overlay_draft = None;
        self.publish();
    }

    pub fn update_sticker_draft(
        &mut self,
        asset_id: Option<&str>,
        x: Option<f32>,
        y: Option<f32>,
        scale: Option<f32>,
        rotation_deg: Option<f32>,
    ) {
        let Some(OverlayDraft::Sticker {
            asset_id: cur_asset,
            x: cur_x,
            y: cur_y,
            scale: cur_scale,
            rotation_deg: cur_rotation,
            ..
        }) = self.state.overlay_draft.as_mut()
        else {
            return;
        };
        if let Some(asset_id) = asset_id {
            *cur_asset = asset_id.to_string();
        }
        if let Some(x) = x {
            *cur_x = x.clamp(0.0, 1.0);
        }
        if let Some(y) = y {
            *cur_y = y.clamp(0.0, 1.0);
        }
        if let Some(scale) = scale {
            *cur_scale = scale;
        }
        if let Some(rotation_deg) = rotation_deg {
            *cur_rotation = rotation_deg;
        }
        self.publish();
    }

    pub fn update_subtitle_text(&mut self, text: &str) {
        let Some(OverlayDraft::Subtitle { text: cur_text, .. }) =
            self.state.overlay_draft.as_mut()
        else {
            return;
        };
        *cur_text = text.to_string();
        self.publish();
    }

    pub fn update_subtitle_position(&mut self, x: Option<f32>, y: Option<f32>) {
        let Some(OverlayDraft::Subtitle {
            x: cur_x, y: cur_y, ..
        }) = self.state.overlay_draft.as_mut()
        else {
            return;
        };
        if let Some(x) = x {
            *cur_x = x.clamp(0.0, 1.0);
        }
        if let Some(y) = y {
            *cur_y = y.clamp(0.0, 1.0);
        }
        self.publish();
    }

    pub fn update_subtitle_style(&mut self, text_size_sp: Option<f32>, color_argb: Option<u32>) {
        let Some(OverlayDraft::Subtitle {
            text_size_sp: cur_size,
            color_argb: cur_color,
            ..
        }) = self.state.overlay_draft.as_mut()
        else {
            return;
        };
        if let Some(size) = text_size_sp {
            *cur_size = size.clamp(8.0, 72.0);
        }
        if let Some(color) = color_argb {
            *cur_color = color;
        }
        self.publish();
    }

    pub fn update_music_draft(&mut self, volume_percent: Option<u8>, source_uri: Option<&str>) {
        let Some(OverlayDraft::Music {
            volume_percent: cur_volume,
            source_uri: cur_uri,
            ..
        }) = self.state.overlay_draft.as_mut()
        else {
            return;
        };
        if let Some(volume) = volume_percent {
            *cur_volume = volume.min(100);
        }
        if let Some(uri) = source_uri {
            *cur_uri = Some(uri.to_string());
        }
        self.publish();
    }

    /// Move/resize the active draft's placement window, clamped into the
    /// timeline with the canonical 100ms minimum duration.
    pub fn update_overlay_time(&mut self, start_ms: Option<i64>, duration_ms: Option<i64>) {
        let Some(tl_end) = self.timeline_end() else {
            return;
        };
        let Some(draft) = self.state.overlay_draft.as_ref() else {
            return;
        };
        let (cur_start, cur_duration) = draft.placement();
        let new_start = start_ms.unwrap_or(cur_start).clamp(0, tl_end);
        let max_duration = (tl_end - new_start).max(1);
        let min_duration = MIN_DRAFT_DURATION_MS.min(max_duration);
        let new_duration = duration_ms
            .unwrap_or(cur_duration)
            .clamp(min_duration, max_duration);
        self.state.overlay_draft = Some(draft.with_placement(new_start, new_duration));
        self.publish();
    }

    /// Commit the active draft.
    ///
    /// When an overlay is selected and its variant matches the draft, it is
    /// replaced in place (id preserved). Otherwise a new overlay is appended
    /// with a session-unique id; a selected overlay of a *different* variant
    /// also falls through to append rather than being rejected.
    pub fn confirm_overlay(&mut self) {
        let Some(timeline) = self.state.timeline.clone() else {
            return;
        };
        let Some(draft) = self.state.overlay_draft.clone() else {
            return;
        };
        let tl_end = timeline.end_ms();
        let (start, duration) = draft.placement();
        let end = (start + duration).min(tl_end);
        if end <= start {
            return;
        }
        let Ok(place_range) = TimeRange::from_bounds_ms(start, end) else {
            return;
        };

        if let Some(selected_id) = self.state.selected_overlay_id.clone() {
            if let Some(index) = timeline.overlay_index(&selected_id) {
                let target = &timeline.overlays()[index];
                if let Some(updated) = draft.merge_into(target, place_range) {
                    if let Some(new_timeline) =
                        timeline.with_overlay_replaced(&selected_id, updated)
                    {
                        self.state.timeline = Some(new_timeline);
                        self.state.overlay_sheet = None;
                        self.state.overlay_draft = None;
                        self.publish();
                        return;
                    }
                }
            }
        }

        let id = next_overlay_id();
        let overlay = draft.into_overlay(id.clone(), place_range);
        self.state.timeline = Some(timeline.with_overlay_added(overlay));
        self.state.overlay_sheet = None;
        self.state.overlay_draft = None;
        self.state.selected_overlay_id = Some(id);
        self.publish();
    }

    /// Re-time a committed overlay directly, without the draft workflow.
    /// Unknown ids are ignored; the window is clamped into the timeline.
    pub fn update_overlay_time_by_id(
        &mut self,
        overlay_id: &str,
        start_ms: Option<i64>,
        duration_ms: Option<i64>,
    ) {
        let Some(timeline) = self.state.timeline.clone() else {
            return;
        };
        let tl_end = timeline.end_ms();
        let Some(index) = timeline.overlay_index(overlay_id) else {
            return;
        };
        let target = &timeline.overlays()[index];
        let cur_start = target.time_range().start_ms().value();
        let cur_duration = target.time_range().duration_ms();
        let new_start = start_ms.unwrap_or(cur_start).clamp(0, tl_end);
        let new_end = (new_start + duration_ms.unwrap_or(cur_duration)).min(tl_end);
        if new_end <= new_start {
            return;
        }
        let Ok(range) = TimeRange::from_bounds_ms(new_start, new_end) else {
            return;
        };
        let updated = target.with_time_range(range);
        if let Some(new_timeline) = timeline.with_overlay_replaced(overlay_id, updated) {
            self.state.timeline = Some(new_timeline);
            self.publish();
        }
    }

    pub fn delete_selected_overlay(&mut self) {
        let Some(timeline) = self.state.timeline.clone() else {
            return;
        };
        let Some(selected_id) = self.state.selected_overlay_id.clone() else {
            return;
        };
        self.state.timeline = Some(timeline.without_overlay(&selected_id));
        self.state.overlay_sheet = None;
        self.state.overlay_draft = None;
        self.state.selected_overlay_id = None;
        self.publish();
    }

    pub fn delete_overlay_by_id(&mut self, overlay_id: &str) {
        let Some(timeline) = self.state.timeline.clone() else {
            return;
        };
        self.state.timeline = Some(timeline.without_overlay(overlay_id));
        if self.state.selected_overlay_id.as_deref() == Some(overlay_id) {
            self.state.overlay_sheet = None;
            self.state.overlay_draft = None;
            self.state.selected_overlay_id = None;
        }
        self.publish();
    }

    // -- playback ----------------------------------------------------------

    pub fn set_playing(&mut self, playing: bool) {
        self.state.is_playing = playing;
        self.publish();
    }

    /// Clamp `position_ms` into the effective viewport (the viewport window
    /// when one is set, otherwise the full timeline) and move the playhead.
    pub fn seek_to(&mut self, position_ms: i64) {
        let Some(full_end) = self.timeline_end() else {
            return;
        };
        let vp_start = self.state.viewport_start_ms;
        let vp_end = if self.state.viewport_end_ms > 0 {
            self.state.viewport_end_ms
        } else {
            full_end
        };
        let effective_start = vp_start.max(0).min(full_end);
        let effective_end = vp_end.max(effective_start).min(full_end);
        self.state.current_position_ms = position_ms.max(effective_start).min(effective_end);
        self.publish();
    }

    /// Player position callback; only tracked while playing.
    pub fn on_playback_tick(&mut self, position_ms: i64) {
        if self.state.is_playing {
            self.seek_to(position_ms);
        }
    }

    // -- viewport & trim selection -----------------------------------------

    pub fn set_trim_editing(&mut self, editing: bool) {
        self.state.is_trim_editing = editing;
        self.publish();
    }

    pub fn set_zoom(&mut self, zoom_px_per_ms: f32) {
        self.state.zoom_px_per_ms = zoom_px_per_ms.clamp(MIN_ZOOM_PX_PER_MS, MAX_ZOOM_PX_PER_MS);
        self.publish();
    }

    /// Update the scoped preview window. `move_by_ms` shifts the window
    /// keeping its length; explicit bounds clamp against each other with a
    /// 100ms minimum span. The playhead is re-clamped into the new window.
    pub fn update_viewport_range(
        &mut self,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
        move_by_ms: Option<i64>,
    ) {
        let Some(tl_end) = self.timeline_end() else {
            return;
        };
        let mut vp_start = self.state.viewport_start_ms;
        let mut vp_end = if self.state.viewport_end_ms > 0 {
            self.state.viewport_end_ms
        } else {
            tl_end
        };
        if let Some(delta) = move_by_ms {
            let length = (vp_end - vp_start).max(MIN_VIEWPORT_SPAN_MS);
            let shifted = (vp_start + delta).min((tl_end - length).max(0)).max(0);
            vp_start = shifted;
            vp_end = shifted + length;
        }
        if let Some(start) = start_ms {
            vp_start = start.min(vp_end - MIN_VIEWPORT_SPAN_MS).max(0);
        }
        if let Some(end) = end_ms {
            vp_end = end.max(vp_start + MIN_VIEWPORT_SPAN_MS).min(tl_end);
        }
        self.state.viewport_start_ms = vp_start;
        self.state.viewport_end_ms = vp_end;
        self.state.current_position_ms = self.state.current_position_ms.max(vp_start).min(vp_end);
        self.publish();
    }

    /// Update the pending cut selection; same shape as the viewport update
    /// but with a 1ms minimum span and no playhead adjustment.
    pub fn update_trim_selection(
        &mut self,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
        move_by_ms: Option<i64>,
    ) {
        let Some(tl_end) = self.timeline_end() else {
            return;
        };
        let mut sel_start = self.state.trim_start_ms;
        let mut sel_end = self.state.trim_end_ms;
        if let Some(delta) = move_by_ms {
            let length = (sel_end - sel_start).max(MIN_TRIM_SPAN_MS);
            let shifted = (sel_start + delta).min((tl_end - length).max(0)).max(0);
            sel_start = shifted;
            sel_end = shifted + length;
        }
        if let Some(start) = start_ms {
            sel_start = start.min(sel_end - MIN_TRIM_SPAN_MS).max(0);
        }
        if let Some(end) = end_ms {
            sel_end = end.max(sel_start + MIN_TRIM_SPAN_MS).min(tl_end);
        }
        self.state.trim_start_ms = sel_start;
        self.state.trim_end_ms = sel_end;
        self.publish();
    }

    /// Commit the trim selection `[s, e)`.
    ///
    /// When a single clip fully contains the selection, the timeline is
    /// destructively re-based to one clip spanning `[0, e-s)`; overlays that
    /// intersect the selection are kept, intersected and shifted left, the
    /// rest are dropped. When the selection spans clip boundaries the clip
    /// data is left untouched and only the viewport narrows to the
    /// selection.
    pub fn apply_cut(&mut self) {
        let Some(timeline) = self.state.timeline.clone() else {
            return;
        };
        let sel_start = self.state.trim_start_ms;
        let sel_end = self.state.trim_end_ms;
        if sel_end <= sel_start {
            return;
        }

        let containing = timeline.clips().iter().find(|clip| {
            sel_start >= clip.range.start_ms().value() && sel_end <= clip.range.end_ms().value()
        });
        let Some(target) = containing else {
            // Selection crosses clip boundaries: narrow the viewport only.
            self.state.current_position_ms = sel_start;
            self.state.viewport_start_ms = sel_start;
            self.state.viewport_end_ms = sel_end;
            self.state.is_trim_editing = false;
            self.publish();
            return;
        };

        let Ok(new_range) = TimeRange::from_bounds_ms(0, sel_end - sel_start) else {
            return;
        };
        let new_clip = VideoClip {
            id: target.id.clone(),
            source_uri: target.source_uri.clone(),
            range: new_range,
        };
        let mut kept_overlays = Vec::new();
        for overlay in timeline.overlays() {
            let o_start = overlay.time_range().start_ms().value();
            let o_end = overlay.time_range().end_ms().value();
            let isect_start = sel_start.max(o_start);
            let isect_end = sel_end.min(o_end);
            if isect_end <= isect_start {
                continue;
            }
            let Ok(shifted) =
                TimeRange::from_bounds_ms(isect_start - sel_start, isect_end - sel_start)
            else {
                continue;
            };
            kept_overlays.push(overlay.with_time_range(shifted));
        }
        if let Ok(rebased) = Timeline::new(vec![new_clip], kept_overlays) {
            let end = rebased.end_ms();
            self.set_timeline(rebased);
            self.state.current_position_ms = 0;
            self.state.viewport_start_ms = 0;
            self.state.viewport_end_ms = end;
            self.state.is_trim_editing = false;
            self.publish();
        }
    }

    // -- export ------------------------------------------------------------

    /// Kick off an export of the current timeline on the given engine.
    ///
    /// Returns `false` (and does nothing) when a job is already in flight or
    /// no timeline is loaded. The spawned job is the session's single
    /// in-flight export reference.
    pub fn start_export<E: ExportEngine>(
        &mut self,
        engine: Arc<E>,
        progress: watch::Sender<u8>,
    ) -> bool {
        if self.export_job.is_some() {
            return false;
        }
        let Some(timeline) = self.state.timeline.clone() else {
            return false;
        };
        tracing::info!(
            clips = timeline.clips().len(),
            overlays = timeline.overlays().len(),
            "export started"
        );
        self.state.is_exporting = true;
        self.publish();
        self.export_job = Some(tokio::spawn(async move {
            engine.export(timeline, progress).await
        }));
        true
    }

    /// Wait for the in-flight export and surface its result. Clears
    /// `is_exporting` on every outcome. `None` when no export is running.
    pub async fn await_export(&mut self) -> Option<ExportResult> {
        let job = self.export_job.take()?;
        let result = match job.await {
            Ok(result) => result,
            Err(err) => ExportResult::Failure {
                message: format!("export task failed: {err}"),
            },
        };
        self.state.is_exporting = false;
        self.publish();
        match &result {
            ExportResult::Success { output_uri } => {
                tracing::info!(%output_uri, "export finished")
            }
            ExportResult::Failure { message } => tracing::warn!(%message, "export failed"),
            ExportResult::Cancelled => tracing::info!("export cancelled"),
        }
        Some(result)
    }

    /// Run a full export in place: [`start_export`] + [`await_export`].
    ///
    /// [`start_export`]: EditorSession::start_export
    /// [`await_export`]: EditorSession::await_export
    pub async fn export<E: ExportEngine>(
        &mut self,
        engine: Arc<E>,
        progress: watch::Sender<u8>,
    ) -> Option<ExportResult> {
        if !self.start_export(engine, progress) {
            return None;
        }
        self.await_export().await
    }
}

/// Overlay ids must stay unique across the whole session lifetime, even
/// under rapid consecutive additions.
fn next_overlay_id() -> String {
    format!("ov_{}", Uuid::new_v4().simple())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
