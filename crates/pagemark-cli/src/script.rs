//! Replay scripts.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// One scripted interaction. Positions are display coordinates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Go to a page by number.
    Page { page: u32 },
    /// Go to a page as typed into the page field.
    PageInput { input: String },
    Next,
    Prev,
    Zoom { level: f64 },
    ZoomIn,
    ZoomOut,
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    /// Save the pending capture.
    Confirm {
        #[serde(default)]
        description: String,
    },
    /// Discard the pending capture.
    Cancel,
    /// Delete the annotation with this 1-based list position.
    Delete { index: usize },
    /// Delete every annotation on the page.
    Clear,
    /// Print the session state as one JSON line.
    Print,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid replay script")
    }

    pub fn read(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps() {
        let script = Script::from_json(
            r#"{"steps":[
                {"op":"page","page":2},
                {"op":"zoom_in"},
                {"op":"down","x":1,"y":2},
                {"op":"confirm"},
                {"op":"delete","index":1}
            ]}"#,
        )
        .unwrap();
        assert_eq!(script.steps[0], Step::Page { page: 2 });
        assert_eq!(script.steps[2], Step::Down { x: 1.0, y: 2.0 });
        assert_eq!(
            script.steps[3],
            Step::Confirm {
                description: String::new()
            }
        );
        assert_eq!(script.steps[4], Step::Delete { index: 1 });
    }

    #[test]
    fn rejects_unknown_op() {
        assert!(Script::from_json(r#"{"steps":[{"op":"teleport"}]}"#).is_err());
    }
}
