//! Declarative FFmpeg filter graphs.
//!
//! A graph is an ordered list of [`FilterStage`]s, each naming a filter, its
//! options and its input/output pin labels. Rendering produces the string
//! passed to `-filter_complex`, with option values escaped for both levels
//! of FFmpeg's filtergraph parser.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single filter option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterOption {
    /// `key=value`
    Named { key: String, value: String },
    /// A bare positional argument (e.g. `fps=30`, `setsar=1`)
    Positional(String),
}

/// One named filter with its options and pin labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterStage {
    pub filter: String,
    #[serde(default)]
    pub options: Vec<FilterOption>,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl FilterStage {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            options: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Add a `key=value` option.
    pub fn option(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.options.push(FilterOption::Named {
            key: key.into(),
            value: value.to_string(),
        });
        self
    }

    /// Add a positional argument.
    pub fn arg(mut self, value: impl ToString) -> Self {
        self.options.push(FilterOption::Positional(value.to_string()));
        self
    }

    pub fn input(mut self, label: impl Into<String>) -> Self {
        self.inputs.push(label.into());
        self
    }

    pub fn output(mut self, label: impl Into<String>) -> Self {
        self.outputs.push(label.into());
        self
    }

    /// Value of a named option, if set.
    pub fn option_value(&self, key: &str) -> Option<&str> {
        self.options.iter().find_map(|opt| match opt {
            FilterOption::Named { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Render as `[in]...filter=opts[out]...`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for label in &self.inputs {
            out.push('[');
            out.push_str(label);
            out.push(']');
        }

        out.push_str(&self.filter);

        if !self.options.is_empty() {
            out.push('=');
            let rendered: Vec<String> = self
                .options
                .iter()
                .map(|opt| match opt {
                    FilterOption::Named { key, value } => {
                        format!("{}={}", key, escape_value(value))
                    }
                    FilterOption::Positional(value) => escape_value(value),
                })
                .collect();
            out.push_str(&rendered.join(":"));
        }

        for label in &self.outputs {
            out.push('[');
            out.push_str(label);
            out.push(']');
        }
        out
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// An ordered list of filter stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterGraph {
    stages: Vec<FilterStage>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: FilterStage) {
        self.stages.push(stage);
    }

    pub fn with(mut self, stage: FilterStage) -> Self {
        self.push(stage);
        self
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Render the whole graph for `-filter_complex`.
    pub fn render(&self) -> String {
        self.stages
            .iter()
            .map(FilterStage::render)
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Format seconds with at most millisecond precision and no trailing zeros.
pub fn format_seconds(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Escape an option value for the option parser, then for the graph parser.
fn escape_value(value: &str) -> String {
    let mut option_level = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ':' | '\'') {
            option_level.push('\\');
        }
        option_level.push(c);
    }

    let mut graph_level = String::with_capacity(option_level.len());
    for c in option_level.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            graph_level.push('\\');
        }
        graph_level.push(c);
    }
    graph_level
}
