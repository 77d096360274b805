use reelcache_model::TimestampedFrame;

/// The frame closest to `target_secs`.
///
/// Ties go to the frame encountered first; frames with a NaN timestamp are
/// never selected.
pub fn nearest_frame<F: TimestampedFrame>(
    frames: &[F],
    target_secs: f64,
) -> Option<&F> {
    let mut best: Option<(&F, f64)> = None;
    for frame in frames {
        let distance = (frame.timestamp_secs() - target_secs).abs();
        if distance.is_nan() {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((frame, distance)),
        }
    }
    best.map(|(frame, _)| frame)
}

#[cfg(test)]
mod tests {
    use super::nearest_frame;
    use reelcache_model::{SubtitleFrame, TimelineFrame};

    fn frames(timestamps: &[f64]) -> Vec<TimelineFrame> {
        timestamps
            .iter()
            .map(|&t| TimelineFrame::new(t, format!("frame-{t}")))
            .collect()
    }

    #[test]
    fn picks_the_closest_frame() {
        let frames = frames(&[0.0, 1.0, 2.0, 3.0]);

        assert_eq!(nearest_frame(&frames, 1.4).unwrap().timestamp, 1.0);
        assert_eq!(nearest_frame(&frames, 1.6).unwrap().timestamp, 2.0);
        assert_eq!(nearest_frame(&frames, -5.0).unwrap().timestamp, 0.0);
        assert_eq!(nearest_frame(&frames, 99.0).unwrap().timestamp, 3.0);
    }

    #[test]
    fn ties_go_to_the_first_frame() {
        let forward = frames(&[1.0, 2.0]);
        assert_eq!(nearest_frame(&forward, 1.5).unwrap().timestamp, 1.0);

        let reversed = frames(&[2.0, 1.0]);
        assert_eq!(nearest_frame(&reversed, 1.5).unwrap().timestamp, 2.0);
    }

    #[test]
    fn empty_and_nan_inputs() {
        assert!(nearest_frame::<TimelineFrame>(&[], 1.0).is_none());
        assert!(nearest_frame(&frames(&[1.0]), f64::NAN).is_none());
        assert_eq!(
            nearest_frame(&frames(&[f64::NAN, 4.0]), 1.0).unwrap().timestamp,
            4.0
        );
    }

    #[test]
    fn works_for_any_timestamped_frame() {
        let subs = vec![
            SubtitleFrame {
                timestamp: 0.0,
                text: "hello".to_string(),
            },
            SubtitleFrame {
                timestamp: 5.0,
                text: "bye".to_string(),
            },
        ];
        assert_eq!(nearest_frame(&subs, 4.0).unwrap().text, "bye");
    }
}
