//! Normalization planning: one shared output frame, one job per clip.

use std::path::Path;

use crate::command::FfmpegInput;
use crate::engine::RenderJob;
use crate::filter_graph::{FilterGraph, FilterStage};
use feedreel_models::{
    EncodingConfig, MediaInfo, SourceId, TargetFrame, VideoStream, MAX_FRAME_HEIGHT,
    MAX_FRAME_WIDTH,
};

/// Vertical offset of the title card from the top edge.
const TITLE_OFFSET_Y: u32 = 20;

/// Solve the output frame for a set of probed video streams.
///
/// Starts from the widest width (capped) at the widest aspect ratio. If that
/// frame is shorter than the tallest source, it is recomputed outward from
/// the tallest height (capped). The result is then clamped to the hard caps,
/// keeping the aspect ratio, and rounded down to even numbers.
///
/// Returns `None` when no stream has usable dimensions.
pub fn solve_target_frame<'a, I>(streams: I) -> Option<TargetFrame>
where
    I: IntoIterator<Item = &'a VideoStream>,
{
    let mut widest_ar: f64 = 0.0;
    let mut widest: u32 = 0;
    let mut tallest: u32 = 0;

    for stream in streams {
        if let Some(ar) = stream.aspect_ratio() {
            widest_ar = widest_ar.max(ar);
            widest = widest.max(stream.width);
            tallest = tallest.max(stream.height);
        }
    }

    if widest_ar <= 0.0 {
        return None;
    }

    let mut width = f64::from(widest.min(MAX_FRAME_WIDTH));
    let mut height = (width / widest_ar).round();

    if height < f64::from(tallest) {
        height = f64::from(tallest.min(MAX_FRAME_HEIGHT));
        width = (height * widest_ar).round();
    }

    let max_w = f64::from(MAX_FRAME_WIDTH);
    let max_h = f64::from(MAX_FRAME_HEIGHT);
    if width > max_w {
        width = max_w;
        height = (width / widest_ar).round();
    }
    if height > max_h {
        height = max_h;
        width = (height * widest_ar).round();
    }

    Some(TargetFrame::new(even_floor(width), even_floor(height)))
}

fn even_floor(value: f64) -> u32 {
    let v = value.max(2.0) as u32;
    v & !1
}

/// Cache file name for a normalized variant.
pub fn normalized_file_name(id: &SourceId, frame: TargetFrame) -> String {
    format!("{}_{}_normalized.mp4", id, frame.key())
}

/// Inputs for one normalization job.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeRequest<'a> {
    pub input: &'a Path,
    pub info: &'a MediaInfo,
    /// Pre-rendered title card, overlaid near the top when present
    pub title_card: Option<&'a Path>,
    pub frame: TargetFrame,
    pub output: &'a Path,
}

/// Build the per-clip normalization job.
///
/// Video is shrunk to fit (never enlarged), padded centered in black to the
/// exact frame, given square pixels and a fixed frame rate. Clips without
/// audio get a synthesized silent stereo track so every output has exactly
/// one audio stream.
pub fn normalize_job(req: &NormalizeRequest<'_>, encoding: &EncodingConfig) -> RenderJob {
    let TargetFrame { width, height } = req.frame;

    let mut job = RenderJob::new("normalize", req.output).input(FfmpegInput::file(req.input));

    let title_input = match req.title_card {
        Some(card) => {
            job = job.input(FfmpegInput::file(card));
            Some(job.inputs.len() - 1)
        }
        None => None,
    };

    let audio_source = if req.info.has_audio {
        "0:a".to_string()
    } else {
        job = job.input(FfmpegInput::lavfi(format!(
            "anullsrc=channel_layout=stereo:sample_rate={}",
            encoding.sample_rate
        )));
        format!("{}:a", job.inputs.len() - 1)
    };

    let mut graph = FilterGraph::new()
        .with(
            FilterStage::new("scale")
                .input("0:v")
                .option("w", format!("min({},iw)", width))
                .option("h", format!("min({},ih)", height))
                .option("force_original_aspect_ratio", "decrease")
                .output("scaled"),
        )
        .with(
            FilterStage::new("pad")
                .input("scaled")
                .option("w", width)
                .option("h", height)
                .option("x", "(ow-iw)/2")
                .option("y", "(oh-ih)/2")
                .option("color", "black")
                .output("padded"),
        )
        .with(
            FilterStage::new("setsar")
                .arg(1)
                .input("padded")
                .output("sar_set"),
        )
        .with(
            FilterStage::new("fps")
                .arg(encoding.fps)
                .input("sar_set")
                .output("final"),
        );

    let video_label = match title_input {
        Some(idx) => {
            graph.push(
                FilterStage::new("overlay")
                    .input("final")
                    .input(format!("{}:v", idx))
                    .option("x", "(main_w-overlay_w)/2")
                    .option("y", TITLE_OFFSET_Y)
                    .output("with_overlay"),
            );
            "with_overlay"
        }
        None => "final",
    };

    graph.push(
        FilterStage::new("anull")
            .input(audio_source)
            .output("audio_out"),
    );

    let job = job
        .graph(graph)
        .map(video_label)
        .map("audio_out")
        .output_args(encoding.to_ffmpeg_args());

    if req.info.duration > 0.0 {
        job.expected_duration(req.info.duration)
    } else {
        job
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(width: u32, height: u32) -> VideoStream {
        VideoStream {
            width,
            height,
            fps: 30.0,
        }
    }

    fn info(has_audio: bool) -> MediaInfo {
        MediaInfo {
            duration: 5.0,
            video: Some(stream(720, 1280)),
            has_audio,
            size: 0,
        }
    }

    #[test]
    fn test_single_landscape_source() {
        let frame = solve_target_frame(&[stream(1280, 720)]).unwrap();
        assert_eq!(frame, TargetFrame::new(1280, 720));
    }

    #[test]
    fn test_large_source_is_capped() {
        let frame = solve_target_frame(&[stream(3840, 2160)]).unwrap();
        assert_eq!(frame, TargetFrame::new(1920, 1080));
    }

    #[test]
    fn test_height_first_fallback() {
        // Widest frame is short; a tall vertical clip forces recomputing from height.
        let frame = solve_target_frame(&[stream(640, 360), stream(480, 854)]).unwrap();
        assert_eq!(frame.height, 854);
        assert_eq!(frame.width, 1518);
    }

    #[test]
    fn test_all_vertical_sources() {
        let frame = solve_target_frame(&[stream(720, 1280), stream(1080, 1920)]).unwrap();
        assert!(frame.fits_caps());
        // Widest AR is 9:16; the height is capped at 1080.
        assert_eq!(frame.height, 1080);
        assert_eq!(frame.width, 608);
    }

    #[test]
    fn test_never_exceeds_caps() {
        let sets: Vec<Vec<VideoStream>> = vec![
            vec![stream(4000, 500)],
            vec![stream(500, 4000), stream(1920, 1080)],
            vec![stream(2560, 1080), stream(1080, 1350)],
            vec![stream(333, 221)],
        ];
        for set in sets {
            let frame = solve_target_frame(&set).unwrap();
            assert!(frame.fits_caps(), "{:?} -> {}", set, frame);
            assert_eq!(frame.width % 2, 0);
            assert_eq!(frame.height % 2, 0);
        }
    }

    #[test]
    fn test_no_usable_streams() {
        assert!(solve_target_frame(std::iter::empty::<&VideoStream>()).is_none());
        assert!(solve_target_frame(&[stream(0, 720)]).is_none());
    }

    #[test]
    fn test_normalized_file_name() {
        let name = normalized_file_name(&SourceId::from("abc"), TargetFrame::new(1280, 720));
        assert_eq!(name, "abc_1280x720_normalized.mp4");
    }

    #[test]
    fn test_job_with_audio_and_title() {
        let info = info(true);
        let req = NormalizeRequest {
            input: Path::new("/out/aww/abc.mp4"),
            info: &info,
            title_card: Some(Path::new("/out/aww/abc_title.png")),
            frame: TargetFrame::new(1280, 720),
            output: Path::new("/out/aww/abc_1280x720_normalized.mp4"),
        };
        let job = normalize_job(&req, &EncodingConfig::default());

        assert_eq!(job.inputs.len(), 2);
        assert_eq!(job.maps, vec!["with_overlay", "audio_out"]);
        assert_eq!(job.expected_duration, Some(5.0));

        let rendered = job.graph.as_ref().unwrap().render();
        assert!(rendered.contains("[0:v]scale=w=min(1280\\,iw):h=min(720\\,ih):force_original_aspect_ratio=decrease[scaled]"));
        assert!(rendered.contains("[scaled]pad=w=1280:h=720:x=(ow-iw)/2:y=(oh-ih)/2:color=black[padded]"));
        assert!(rendered.contains("[final][1:v]overlay=x=(main_w-overlay_w)/2:y=20[with_overlay]"));
        assert!(rendered.contains("[0:a]anull[audio_out]"));
    }

    #[test]
    fn test_job_without_audio_uses_silent_source() {
        let info = info(false);
        let req = NormalizeRequest {
            input: Path::new("/in.mp4"),
            info: &info,
            title_card: Some(Path::new("/title.png")),
            frame: TargetFrame::new(720, 1280),
            output: Path::new("/out.mp4"),
        };
        let job = normalize_job(&req, &EncodingConfig::default());

        assert_eq!(job.inputs.len(), 3);
        assert_eq!(
            job.inputs[2].source,
            "anullsrc=channel_layout=stereo:sample_rate=48000"
        );
        assert!(job
            .graph
            .as_ref()
            .unwrap()
            .render()
            .contains("[2:a]anull[audio_out]"));
    }

    #[test]
    fn test_job_without_title_card() {
        let info = info(false);
        let req = NormalizeRequest {
            input: Path::new("/in.mp4"),
            info: &info,
            title_card: None,
            frame: TargetFrame::new(720, 1280),
            output: Path::new("/out.mp4"),
        };
        let job = normalize_job(&req, &EncodingConfig::default());

        assert_eq!(job.maps, vec!["final", "audio_out"]);
        assert!(job
            .graph
            .as_ref()
            .unwrap()
            .render()
            .contains("[1:a]anull[audio_out]"));
    }
}
