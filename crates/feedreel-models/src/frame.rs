//! The output frame shared by every item in a compilation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Widest output the compilation will ever be rendered at.
pub const MAX_FRAME_WIDTH: u32 = 1920;
/// Tallest output the compilation will ever be rendered at.
pub const MAX_FRAME_HEIGHT: u32 = 1080;

/// Resolved output resolution for one run.
///
/// Always within `MAX_FRAME_WIDTH` x `MAX_FRAME_HEIGHT` and made of even numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetFrame {
    pub width: u32,
    pub height: u32,
}

impl TargetFrame {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Cache key suffix, e.g. `1280x720`.
    pub fn key(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    pub fn fits_caps(&self) -> bool {
        self.width <= MAX_FRAME_WIDTH && self.height <= MAX_FRAME_HEIGHT
    }
}

impl fmt::Display for TargetFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
