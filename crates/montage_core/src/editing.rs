use crate::error::{CoreError, Result};
use crate::types::*;

impl Timeline {
    /// Build an initial timeline from a list of selected source URIs.
    ///
    /// Each URI becomes one clip of `default_clip_duration_ms`, laid out
    /// sequentially from 0. Real durations are reconciled later from media
    /// metadata.
    pub fn build_from_selection(
        source_uris: &[String],
        default_clip_duration_ms: i64,
    ) -> Result<Timeline> {
        if source_uris.is_empty() {
            return Err(CoreError::InvalidArgument(
                "selection must not be empty".into(),
            ));
        }
        if default_clip_duration_ms <= 0 {
            return Err(CoreError::InvalidArgument(format!(
                "default clip duration must be > 0, got {default_clip_duration_ms}"
            )));
        }
        let clips = source_uris
            .iter()
            .enumerate()
            .map(|(index, uri)| {
                let start = index as i64 * default_clip_duration_ms;
                Ok(VideoClip {
                    id: format!("clip-{index}"),
                    source_uri: uri.clone(),
                    range: TimeRange::from_bounds_ms(start, start + default_clip_duration_ms)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Timeline::new(clips, Vec::new())
    }

    /// Replace the range of the clip at `clip_index` with `new_range`.
    ///
    /// The new range must stay within the original clip's range and must not
    /// cross into the neighbouring clips.
    pub fn trim_clip(&self, clip_index: usize, new_range: TimeRange) -> Result<Timeline> {
        let original = self.clip_at(clip_index)?;
        if new_range.start_ms() < original.range.start_ms()
            || new_range.end_ms() > original.range.end_ms()
        {
            return Err(CoreError::InvalidArgument(format!(
                "new range {new_range} must be within the original clip range {}",
                original.range
            )));
        }
        if clip_index > 0 {
            let prev = &self.clips()[clip_index - 1];
            if new_range.start_ms() < prev.range.end_ms() {
                return Err(CoreError::InvalidArgument(
                    "trim overlaps previous clip".into(),
                ));
            }
        }
        if clip_index + 1 < self.clips().len() {
            let next = &self.clips()[clip_index + 1];
            if new_range.end_ms() > next.range.start_ms() {
                return Err(CoreError::InvalidArgument("trim overlaps next clip".into()));
            }
        }
        let mut clips = self.clips().to_vec();
        clips[clip_index] = VideoClip {
            range: new_range,
            ..original.clone()
        };
        Timeline::new(clips, self.overlays().to_vec())
    }

    /// Split the clip at `clip_index` into `{id}_a` and `{id}_b` around
    /// `split_at`, which must lie strictly inside the clip's open interval.
    pub fn split_clip(&self, clip_index: usize, split_at: TimeMs) -> Result<Timeline> {
        let target = self.clip_at(clip_index)?;
        if split_at <= target.range.start_ms() || split_at >= target.range.end_ms() {
            return Err(CoreError::InvalidArgument(format!(
                "split point {split_at} must be strictly inside the clip range {}",
                target.range
            )));
        }
        let first = VideoClip {
            id: format!("{}_a", target.id),
            source_uri: target.source_uri.clone(),
            range: TimeRange::new(target.range.start_ms(), split_at)?,
        };
        let second = VideoClip {
            id: format!("{}_b", target.id),
            source_uri: target.source_uri.clone(),
            range: TimeRange::new(split_at, target.range.end_ms())?,
        };
        let mut clips = self.clips().to_vec();
        clips.splice(clip_index..=clip_index, [first, second]);
        Timeline::new(clips, self.overlays().to_vec())
    }

    /// Merge the clip at `first_index` with its successor. The two clips
    /// must reference the same source and be exactly adjacent.
    pub fn merge_adjacent(&self, first_index: usize) -> Result<Timeline> {
        let first = self.clip_at(first_index)?;
        let second = self.clip_at(first_index + 1)?;
        if first.source_uri != second.source_uri {
            return Err(CoreError::InvalidArgument(
                "cannot merge clips from different sources".into(),
            ));
        }
        if first.range.end_ms() != second.range.start_ms() {
            return Err(CoreError::InvalidArgument(
                "clips must be exactly adjacent".into(),
            ));
        }
        let merged = VideoClip {
            id: format!("{}+{}", first.id, second.id),
            source_uri: first.source_uri.clone(),
            range: TimeRange::new(first.range.start_ms(), second.range.end_ms())?,
        };
        let mut clips = self.clips().to_vec();
        clips.splice(first_index..=first_index + 1, [merged]);
        Timeline::new(clips, self.overlays().to_vec())
    }

    /// Index of the overlay with `overlay_id`, if present.
    pub fn overlay_index(&self, overlay_id: &str) -> Option<usize> {
        self.overlays().iter().position(|o| o.id() == overlay_id)
    }

    /// Timeline with `overlay` appended. Overlays are exempt from the
    /// overlap rule, so this cannot fail.
    pub fn with_overlay_added(&self, overlay: Overlay) -> Timeline {
        let mut overlays = self.overlays().to_vec();
        overlays.push(overlay);
        self.replace_overlays(overlays)
    }

    /// Timeline with the overlay of matching id swapped for `overlay`, or
    /// `None` when the id is unknown.
    pub fn with_overlay_replaced(&self, overlay_id: &str, overlay: Overlay) -> Option<Timeline> {
        let index = self.overlay_index(overlay_id)?;
        let mut overlays = self.overlays().to_vec();
        overlays[index] = overlay;
        Some(self.replace_overlays(overlays))
    }

    /// Timeline without the overlay of matching id; unchanged overlay set
    /// when the id is unknown.
    pub fn without_overlay(&self, overlay_id: &str) -> Timeline {
        let overlays = self
            .overlays()
            .iter()
            .filter(|o| o.id() != overlay_id)
            .cloned()
            .collect();
        self.replace_overlays(overlays)
    }

    fn replace_overlays(&self, overlays: Vec<Overlay>) -> Timeline {
        // Clips are untouched, so the validated clip invariants still hold.
        Timeline {
            clips: self.clips().to_vec(),
            overlays,
        }
    }

    fn clip_at(&self, index: usize) -> Result<&VideoClip> {
        self.clips()
            .get(index)
            .ok_or(CoreError::ClipIndexOutOfBounds {
                index,
                len: self.clips().len(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(id: &str, source: &str, start: i64, end: i64) -> VideoClip {
        VideoClip {
            id: id.to_string(),
            source_uri: source.to_string(),
            range: TimeRange::from_bounds_ms(start, end).unwrap(),
        }
    }

    fn two_clip_timeline() -> Timeline {
        Timeline::new(
            vec![clip("c0", "uri://a", 0, 1_000), clip("c1", "uri://b", 1_000, 2_000)],
            vec![],
        )
        .unwrap()
    }

    // -----------------------------------------------------------------------
    // build_from_selection
    // -----------------------------------------------------------------------

    #[test]
    fn build_from_selection_lays_clips_out_sequentially() {
        let uris = vec!["uri://a".to_string(), "uri://b".to_string(), "uri://c".to_string()];
        let timeline = Timeline::build_from_selection(&uris, 2_000).unwrap();

        assert_eq!(timeline.clips().len(), 3);
        assert!(timeline.overlays().is_empty());
        for (index, c) in timeline.clips().iter().enumerate() {
            assert_eq!(c.id, format!("clip-{index}"));
            assert_eq!(c.range.start_ms().value(), index as i64 * 2_000);
            assert_eq!(c.range.duration_ms(), 2_000);
        }
        assert_eq!(timeline.end_ms(), 6_000);
    }

    #[test]
    fn build_from_selection_rejects_empty_selection() {
        let result = Timeline::build_from_selection(&[], 2_000);
        assert!(matches!(result.unwrap_err(), CoreError::InvalidArgument(_)));
    }

    #[test]
    fn build_from_selection_rejects_non_positive_duration() {
        let uris = vec!["uri://a".to_string()];
        assert!(Timeline::build_from_selection(&uris, 0).is_err());
        assert!(Timeline::build_from_selection(&uris, -100).is_err());
    }

    // -----------------------------------------------------------------------
    // trim_clip
    // -----------------------------------------------------------------------

    #[test]
    fn trim_clip_shrinks_range_in_place() {
        let timeline = two_clip_timeline();
        let trimmed = timeline
            .trim_clip(0, TimeRange::from_bounds_ms(100, 900).unwrap())
            .unwrap();

        let first = &trimmed.clips()[0];
        assert_eq!(first.id, "c0");
        assert_eq!(first.source_uri, "uri://a");
        assert_eq!(first.range, TimeRange::from_bounds_ms(100, 900).unwrap());
        assert_eq!(trimmed.clips()[1], timeline.clips()[1]);
    }

    #[test]
    fn trim_clip_rejects_range_outside_original() {
        let timeline = two_clip_timeline();
        let result = timeline.trim_clip(0, TimeRange::from_bounds_ms(0, 1_100).unwrap());
        assert!(matches!(result.unwrap_err(), CoreError::InvalidArgument(_)));
    }

    #[test]
    fn trim_clip_rejects_out_of_bounds_index() {
        let timeline = two_clip_timeline();
        let result = timeline.trim_clip(5, TimeRange::from_bounds_ms(0, 100).unwrap());
        assert!(matches!(
            result.unwrap_err(),
            CoreError::ClipIndexOutOfBounds { index: 5, len: 2 }
        ));
    }

    #[test]
    fn trim_clip_does_not_mutate_input() {
        let timeline = two_clip_timeline();
        timeline
            .trim_clip(0, TimeRange::from_bounds_ms(100, 900).unwrap())
            .unwrap();
        assert_eq!(timeline.clips()[0].range, TimeRange::from_bounds_ms(0, 1_000).unwrap());
    }

    // -----------------------------------------------------------------------
    // split_clip
    // -----------------------------------------------------------------------

    #[test]
    fn split_clip_produces_two_halves() {
        let timeline = two_clip_timeline();
        let split = timeline.split_clip(0, TimeMs::new(400).unwrap()).unwrap();

        assert_eq!(split.clips().len(), 3);
        let left = &split.clips()[0];
        let right = &split.clips()[1];
        assert_eq!(left.id, "c0_a");
        assert_eq!(left.range, TimeRange::from_bounds_ms(0, 400).unwrap());
        assert_eq!(right.id, "c0_b");
        assert_eq!(right.range, TimeRange::from_bounds_ms(400, 1_000).unwrap());
        assert_eq!(left.source_uri, right.source_uri);
        assert_eq!(split.clips()[2].id, "c1");
    }

    #[test]
    fn split_clip_rejects_boundary_points() {
        let timeline = two_clip_timeline();
        assert!(timeline.split_clip(0, TimeMs::ZERO).is_err());
        assert!(timeline.split_clip(0, TimeMs::new(1_000).unwrap()).is_err());
    }

    #[test]
    fn split_clip_rejects_out_of_bounds_index() {
        let timeline = two_clip_timeline();
        let result = timeline.split_clip(2, TimeMs::new(1_500).unwrap());
        assert!(matches!(
            result.unwrap_err(),
            CoreError::ClipIndexOutOfBounds { .. }
        ));
    }

    // -----------------------------------------------------------------------
    // merge_adjacent
    // -----------------------------------------------------------------------

    #[test]
    fn merge_adjacent_joins_same_source_clips() {
        let timeline = Timeline::new(
            vec![clip("c0", "uri://a", 0, 1_000), clip("c1", "uri://a", 1_000, 2_000)],
            vec![],
        )
        .unwrap();
        let merged = timeline.merge_adjacent(0).unwrap();

        assert_eq!(merged.clips().len(), 1);
        let only = &merged.clips()[0];
        assert_eq!(only.id, "c0+c1");
        assert_eq!(only.range, TimeRange::from_bounds_ms(0, 2_000).unwrap());
        assert_eq!(only.source_uri, "uri://a");
    }

    #[test]
    fn merge_adjacent_rejects_different_sources() {
        let timeline = two_clip_timeline();
        let result = timeline.merge_adjacent(0);
        assert!(matches!(result.unwrap_err(), CoreError::InvalidArgument(_)));
    }

    #[test]
    fn merge_adjacent_rejects_gap_between_clips() {
        let timeline = Timeline::new(
            vec![clip("c0", "uri://a", 0, 1_000), clip("c1", "uri://a", 1_500, 2_000)],
            vec![],
        )
        .unwrap();
        let result = timeline.merge_adjacent(0);
        assert!(matches!(result.unwrap_err(), CoreError::InvalidArgument(_)));
    }

    #[test]
    fn merge_adjacent_rejects_missing_second_clip() {
        let timeline = two_clip_timeline();
        let result = timeline.merge_adjacent(1);
        assert!(matches!(
            result.unwrap_err(),
            CoreError::ClipIndexOutOfBounds { index: 2, len: 2 }
        ));
    }

    #[test]
    fn split_then_merge_restores_range() {
        let timeline = Timeline::new(vec![clip("c0", "uri://a", 0, 1_000)], vec![]).unwrap();
        let split = timeline.split_clip(0, TimeMs::new(300).unwrap()).unwrap();
        let merged = split.merge_adjacent(0).unwrap();

        assert_eq!(merged.clips().len(), 1);
        assert_eq!(merged.clips()[0].id, "c0_a+c0_b");
        assert_eq!(merged.clips()[0].range, TimeRange::from_bounds_ms(0, 1_000).unwrap());
    }

    // -----------------------------------------------------------------------
    // overlay helpers
    // -----------------------------------------------------------------------

    fn sticker(id: &str, start: i64, end: i64) -> Overlay {
        Overlay::Sticker {
            id: id.to_string(),
            time_range: TimeRange::from_bounds_ms(start, end).unwrap(),
            asset_id: "star".into(),
            x: 0.5,
            y: 0.5,
            scale: 1.0,
            rotation_deg: 0.0,
        }
    }

    #[test]
    fn overlay_add_replace_remove() {
        let timeline = two_clip_timeline().with_overlay_added(sticker("ov1", 0, 500));
        assert_eq!(timeline.overlay_index("ov1"), Some(0));

        let replaced = timeline
            .with_overlay_replaced("ov1", sticker("ov1", 100, 700))
            .unwrap();
        assert_eq!(replaced.overlays()[0].time_range().end_ms().value(), 700);

        let removed = replaced.without_overlay("ov1");
        assert!(removed.overlays().is_empty());
        assert_eq!(removed.clips().len(), 2);
    }

    #[test]
    fn overlay_replace_unknown_id_is_none() {
        let timeline = two_clip_timeline();
        assert!(timeline
            .with_overlay_replaced("missing", sticker("missing", 0, 100))
            .is_none());
    }

    #[test]
    fn remove_unknown_overlay_keeps_set_unchanged() {
        let timeline = two_clip_timeline().with_overlay_added(sticker("ov1", 0, 500));
        let untouched = timeline.without_overlay("missing");
        assert_eq!(untouched.overlays().len(), 1);
    }
}
