//! Title-card images overlaid on each normalized clip.
//!
//! Cards are rendered by the media engine: a translucent canvas sized to the
//! wrapped text, with one centered `drawtext` stage per line.

use std::path::{Path, PathBuf};

use crate::command::FfmpegInput;
use crate::engine::RenderJob;
use crate::filter_graph::{FilterGraph, FilterStage};

/// Titles longer than this many words are cut and suffixed with `...`.
pub const TITLE_MAX_WORDS: usize = 15;

const DEFAULT_FONT_SIZE: u32 = 48;
const DEFAULT_MAX_WIDTH: u32 = 1000;
const PADDING_X: u32 = 40;
const PADDING_Y: u32 = 30;
const LINE_HEIGHT_FACTOR: f64 = 1.2;
/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH_FACTOR: f64 = 0.55;

/// Keep at most `max_words` words, appending `...` when anything was cut.
pub fn truncate_title(title: &str, max_words: usize) -> String {
    let words: Vec<&str> = title.split_whitespace().collect();
    if words.len() > max_words {
        format!("{}...", words[..max_words].join(" "))
    } else {
        words.join(" ")
    }
}

/// Wrapped lines and canvas size for one card.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleLayout {
    pub lines: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub line_height: u32,
}

#[derive(Debug, Clone)]
pub struct TitleCardRenderer {
    font_file: Option<PathBuf>,
    font_size: u32,
    max_width: u32,
}

impl Default for TitleCardRenderer {
    fn default() -> Self {
        Self {
            font_file: None,
            font_size: DEFAULT_FONT_SIZE,
            max_width: DEFAULT_MAX_WIDTH,
        }
    }
}

impl TitleCardRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font_file(mut self, font_file: Option<PathBuf>) -> Self {
        self.font_file = font_file;
        self
    }

    fn glyph_width(&self) -> f64 {
        f64::from(self.font_size) * GLYPH_WIDTH_FACTOR
    }

    /// Greedy word wrap into the canvas width minus padding.
    pub fn layout(&self, text: &str) -> TitleLayout {
        let max_chars =
            ((f64::from(self.max_width - 2 * PADDING_X) / self.glyph_width()).floor() as usize)
                .max(1);

        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        for word in text.split_whitespace() {
            let candidate_len = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if candidate_len <= max_chars || current.is_empty() {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        if lines.is_empty() {
            lines.push(String::new());
        }

        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let text_width = (longest as f64 * self.glyph_width()).ceil() as u32;
        let line_height = (f64::from(self.font_size) * LINE_HEIGHT_FACTOR).round() as u32;

        TitleLayout {
            width: even((text_width + 2 * PADDING_X).min(self.max_width)),
            height: even(lines.len() as u32 * line_height + 2 * PADDING_Y),
            line_height,
            lines,
        }
    }

    /// Job that renders `title` (already truncated) to a PNG at `output`.
    pub fn job(&self, title: &str, output: &Path) -> RenderJob {
        let layout = self.layout(title);
        let mut graph = FilterGraph::new().with(
            FilterStage::new("format")
                .arg("rgba")
                .input("0:v")
                .output("card0"),
        );

        for (i, line) in layout.lines.iter().enumerate() {
            let y = PADDING_Y + i as u32 * layout.line_height
                + layout.line_height.saturating_sub(self.font_size) / 2;
            let mut stage = FilterStage::new("drawtext")
                .input(format!("card{}", i))
                .option("expansion", "none")
                .option("text", line)
                .option("fontcolor", "white")
                .option("fontsize", self.font_size)
                .option("x", "(w-text_w)/2")
                .option("y", y);
            if let Some(font) = &self.font_file {
                stage = stage.option("fontfile", font.to_string_lossy());
            }
            graph.push(stage.output(format!("card{}", i + 1)));
        }

        let last = format!("card{}", layout.lines.len());
        RenderJob::new("title", output)
            .input(FfmpegInput::lavfi(format!(
                "color=c=black@0.5:s={}x{}:d=1",
                layout.width, layout.height
            )))
            .graph(graph)
            .map(last)
            .output_args(["-frames:v", "1"])
    }
}

fn even(value: u32) -> u32 {
    value.max(2) & !1
}
