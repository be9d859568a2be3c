//! Compliance rules applied to probed items.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::media_info::MediaInfo;

/// Default Hamming distance at or below which two items count as duplicates.
pub const DEFAULT_DUPLICATE_THRESHOLD: u32 = 10;

/// What to do when the duplicate check itself fails (frame extraction or hashing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashFailurePolicy {
    /// Treat the item as not a duplicate and keep going
    #[default]
    Accept,
    /// Reject the item
    Abort,
}

/// Declarative, individually toggleable compliance rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceOptions {
    /// Reject items longer than this many seconds
    #[serde(default)]
    pub max_duration: Option<f64>,
    /// Reject items shorter than this many seconds
    #[serde(default)]
    pub min_duration: Option<f64>,
    /// Reject items whose pixel area (width * height) is below this
    #[serde(default)]
    pub min_resolution: Option<u64>,
    #[serde(default)]
    pub skip_no_audio: bool,
    #[serde(default)]
    pub vertical_only: bool,
    #[serde(default)]
    pub horizontal_only: bool,
    #[serde(default = "default_true")]
    pub skip_duplicates: bool,
    #[serde(default = "default_threshold")]
    pub duplicate_threshold: u32,
    #[serde(default)]
    pub hash_failure_policy: HashFailurePolicy,
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> u32 {
    DEFAULT_DUPLICATE_THRESHOLD
}

impl Default for ComplianceOptions {
    fn default() -> Self {
        Self {
            max_duration: None,
            min_duration: None,
            min_resolution: None,
            skip_no_audio: false,
            vertical_only: false,
            horizontal_only: false,
            skip_duplicates: true,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
            hash_failure_policy: HashFailurePolicy::Accept,
        }
    }
}

impl ComplianceOptions {
    /// Evaluate every metadata rule and collect the triggered reasons in rule order.
    ///
    /// The duplicate rule is not included; it needs the prior accepted files.
    pub fn metadata_reasons(&self, info: &MediaInfo) -> Vec<RejectReason> {
        let mut reasons = Vec::new();
        let dims = info.dimensions();

        if let Some(max) = self.max_duration {
            if info.duration > max {
                reasons.push(RejectReason::TooLong);
            }
        }

        if let Some(min) = self.min_duration {
            if info.duration < min {
                reasons.push(RejectReason::TooShort);
            }
        }

        if let Some(min_area) = self.min_resolution {
            match dims {
                None => reasons.push(RejectReason::MissingDimensions),
                Some((w, h)) if u64::from(w) * u64::from(h) < min_area => {
                    reasons.push(RejectReason::ResolutionTooLow)
                }
                Some(_) => {}
            }
        }

        if self.skip_no_audio && !info.has_audio {
            reasons.push(RejectReason::NoAudio);
        }

        if let Some((w, h)) = dims {
            if self.vertical_only && w > h {
                reasons.push(RejectReason::NotVertical);
            }
            if self.horizontal_only && w < h {
                reasons.push(RejectReason::NotHorizontal);
            }
        }

        reasons
    }
}

/// Why an item was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    TooLong,
    TooShort,
    MissingDimensions,
    ResolutionTooLow,
    NoAudio,
    NotVertical,
    NotHorizontal,
    Duplicate,
    /// The duplicate check failed and the policy is to reject
    DuplicateCheckFailed(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TooLong => write!(f, "Video is too long"),
            RejectReason::TooShort => write!(f, "Video is too short"),
            RejectReason::MissingDimensions => write!(f, "Could not find video dimensions"),
            RejectReason::ResolutionTooLow => write!(f, "Video resolution is too low"),
            RejectReason::NoAudio => write!(f, "Video has no audio"),
            RejectReason::NotVertical => write!(f, "Video is not vertical"),
            RejectReason::NotHorizontal => write!(f, "Video is not horizontal"),
            RejectReason::Duplicate => write!(f, "Video is a duplicate"),
            RejectReason::DuplicateCheckFailed(msg) => {
                write!(f, "Duplicate check failed: {}", msg)
            }
        }
    }
}

/// Result of evaluating one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "reasons", rename_all = "snake_case")]
pub enum ComplianceVerdict {
    Accept,
    Reject(Vec<RejectReason>),
}

impl ComplianceVerdict {
    pub fn from_reasons(reasons: Vec<RejectReason>) -> Self {
        if reasons.is_empty() {
            ComplianceVerdict::Accept
        } else {
            ComplianceVerdict::Reject(reasons)
        }
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, ComplianceVerdict::Accept)
    }

    pub fn reasons(&self) -> &[RejectReason] {
        match self {
            ComplianceVerdict::Accept => &[],
            ComplianceVerdict::Reject(reasons) => reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_info::VideoStream;

    fn info(duration: f64, width: u32, height: u32, has_audio: bool) -> MediaInfo {
        MediaInfo {
            duration,
            video: Some(VideoStream {
                width,
                height,
                fps: 30.0,
            }),
            has_audio,
            size: 0,
        }
    }

    #[test]
    fn test_default_accepts_everything() {
        let options = ComplianceOptions::default();
        assert!(options.metadata_reasons(&info(120.0, 10, 10, false)).is_empty());
    }

    #[test]
    fn test_reasons_co_trigger_in_order() {
        let options = ComplianceOptions {
            max_duration: Some(30.0),
            min_resolution: Some(640 * 480),
            skip_no_audio: true,
            vertical_only: true,
            ..Default::default()
        };
        let reasons = options.metadata_reasons(&info(45.0, 320, 240, false));
        assert_eq!(
            reasons,
            vec![
                RejectReason::TooLong,
                RejectReason::ResolutionTooLow,
                RejectReason::NoAudio,
                RejectReason::NotVertical,
            ]
        );
    }

    #[test]
    fn test_missing_dimensions() {
        let options = ComplianceOptions {
            min_resolution: Some(1),
            vertical_only: true,
            ..Default::default()
        };
        let no_video = MediaInfo {
            duration: 3.0,
            video: None,
            has_audio: true,
            size: 0,
        };
        assert_eq!(
            options.metadata_reasons(&no_video),
            vec![RejectReason::MissingDimensions]
        );
    }

    #[test]
    fn test_orientation_is_strict() {
        let vertical = ComplianceOptions {
            vertical_only: true,
            ..Default::default()
        };
        let horizontal = ComplianceOptions {
            horizontal_only: true,
            ..Default::default()
        };
        let square = info(5.0, 720, 720, true);

        assert!(vertical.metadata_reasons(&square).is_empty());
        assert!(horizontal.metadata_reasons(&square).is_empty());
        assert_eq!(
            vertical.metadata_reasons(&info(5.0, 1280, 720, true)),
            vec![RejectReason::NotVertical]
        );
        assert_eq!(
            horizontal.metadata_reasons(&info(5.0, 720, 1280, true)),
            vec![RejectReason::NotHorizontal]
        );
    }

    #[test]
    fn test_tightening_never_accepts_more() {
        let item = info(5.0, 640, 360, true);
        let mut previously_rejected = false;
        for floor in [0u64, 100_000, 230_400, 230_401, 1_000_000] {
            let options = ComplianceOptions {
                min_resolution: Some(floor),
                ..Default::default()
            };
            let rejected = !options.metadata_reasons(&item).is_empty();
            assert!(rejected || !previously_rejected);
            previously_rejected = rejected;
        }
        assert!(previously_rejected);
    }

    #[test]
    fn test_verdict_from_reasons() {
        assert!(ComplianceVerdict::from_reasons(vec![]).is_accept());
        let verdict = ComplianceVerdict::from_reasons(vec![RejectReason::Duplicate]);
        assert_eq!(verdict.reasons()[0].to_string(), "Video is a duplicate");
    }
}
