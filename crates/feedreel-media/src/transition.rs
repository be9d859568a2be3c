//! N-way cross-fade chains.
//!
//! For `n` clips the chain has `n - 1` video `xfade` stages and `n - 1` audio
//! `acrossfade` stages, interleaved. Stage `k` fades the running output of
//! stage `k - 1` (or input `0`) into input `k + 1`.
//!
//! Offsets accumulate strictly in order: the first fade starts at
//! `d[0] - T`, and each later fade starts one clip duration minus `T` after
//! the previous one. The safe margin is subtracted from every start without
//! feeding back into the accumulator.

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, MediaResult};
use crate::filter_graph::{format_seconds, FilterGraph, FilterStage};

/// Default cross-fade length in seconds.
pub const DEFAULT_TRANSITION_DURATION: f64 = 1.0;
/// Default safe margin subtracted from each offset.
pub const DEFAULT_SAFE_MARGIN: f64 = 0.0;

/// Fade curve used on both sides of every audio cross-fade.
const AUDIO_CURVE: &str = "tri";

/// A built transition chain ready for one render invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionPlan {
    pub graph: FilterGraph,
    /// Start time of each cross-fade, in order
    pub offsets: Vec<f64>,
    pub video_label: String,
    pub audio_label: String,
}

impl TransitionPlan {
    /// Number of filter stages (always `2 * (n - 1)`).
    pub fn stage_count(&self) -> usize {
        self.graph.len()
    }

    /// Output labels in the order they should be mapped.
    pub fn output_labels(&self) -> [&str; 2] {
        [&self.video_label, &self.audio_label]
    }
}

/// Build the cross-fade chain for clips with the given measured durations.
///
/// Fails when fewer than two durations are given, or when the transition
/// length is not positive.
pub fn build_chain(
    durations: &[f64],
    transition_duration: f64,
    safe_margin: f64,
) -> MediaResult<TransitionPlan> {
    let n = durations.len();
    if n < 2 {
        return Err(MediaError::invalid_graph(format!(
            "At least two clips are required for cross-fade transitions, got {}",
            n
        )));
    }
    if !(transition_duration > 0.0) {
        return Err(MediaError::invalid_graph(format!(
            "Transition duration must be positive, got {}",
            transition_duration
        )));
    }

    let mut graph = FilterGraph::new();
    let mut offsets = Vec::with_capacity(n - 1);

    let mut accumulator = durations[0] - transition_duration;
    let mut video_in = "0:v".to_string();
    let mut audio_in = "0:a".to_string();

    for i in 1..n {
        if i >= 2 {
            accumulator += durations[i - 1] - transition_duration;
        }
        let offset = accumulator - safe_margin;
        offsets.push(offset);

        let video_out = format!("xfade{}", i - 1);
        let audio_out = format!("afade{}", i - 1);

        graph.push(
            FilterStage::new("xfade")
                .input(video_in)
                .input(format!("{}:v", i))
                .option("transition", "fade")
                .option("duration", format_seconds(transition_duration))
                .option("offset", format_seconds(offset))
                .output(video_out.clone()),
        );
        graph.push(
            FilterStage::new("acrossfade")
                .input(audio_in)
                .input(format!("{}:a", i))
                .option("d", format_seconds(transition_duration))
                .option("c1", AUDIO_CURVE)
                .option("c2", AUDIO_CURVE)
                .output(audio_out.clone()),
        );

        video_in = video_out;
        audio_in = audio_out;
    }

    Ok(TransitionPlan {
        graph,
        offsets,
        video_label: video_in,
        audio_label: audio_in,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_fewer_than_two() {
        assert!(build_chain(&[], 1.0, 0.0).is_err());
        assert!(build_chain(&[5.0], 1.0, 0.0).is_err());
    }

    #[test]
    fn test_rejects_non_positive_transition() {
        assert!(build_chain(&[5.0, 4.0], 0.0, 0.0).is_err());
        assert!(build_chain(&[5.0, 4.0], f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_three_clip_offsets() {
        let plan = build_chain(&[5.0, 4.0, 6.0], 1.0, 0.0).unwrap();

        assert_eq!(plan.stage_count(), 4);
        assert_eq!(plan.offsets, vec![4.0, 7.0]);
        assert_eq!(plan.video_label, "xfade1");
        assert_eq!(plan.audio_label, "afade1");

        let stages = plan.graph.stages();
        assert_eq!(stages[0].inputs, vec!["0:v", "1:v"]);
        assert_eq!(stages[1].inputs, vec!["0:a", "1:a"]);
        assert_eq!(stages[2].inputs, vec!["xfade0", "2:v"]);
        assert_eq!(stages[3].inputs, vec!["afade0", "2:a"]);
        assert_eq!(stages[2].option_value("offset"), Some("7"));
    }

    #[test]
    fn test_stage_count_and_final_labels() {
        for n in 2..12 {
            let durations: Vec<f64> = (0..n).map(|i| 3.0 + i as f64 * 0.5).collect();
            let plan = build_chain(&durations, 1.0, 0.0).unwrap();
            assert_eq!(plan.stage_count(), 2 * (n - 1));
            assert_eq!(plan.video_label, format!("xfade{}", n - 2));
            assert_eq!(plan.audio_label, format!("afade{}", n - 2));
        }
    }

    #[test]
    fn test_margin_does_not_accumulate() {
        let plan = build_chain(&[5.0, 4.0, 6.0, 3.0], 1.0, 0.25).unwrap();
        assert_eq!(plan.offsets, vec![3.75, 6.75, 11.75]);
    }

    #[test]
    fn test_audio_stages_use_triangular_curves() {
        let plan = build_chain(&[2.0, 2.0], 0.5, 0.0).unwrap();
        let rendered = plan.graph.render();
        assert_eq!(
            rendered,
            "[0:v][1:v]xfade=transition=fade:duration=0.5:offset=1.5[xfade0];\
             [0:a][1:a]acrossfade=d=0.5:c1=tri:c2=tri[afade0]"
        );
    }
}
