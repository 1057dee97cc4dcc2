// ABOUTME: Per-layer stack of conditional frames deciding whether text is currently emitted
// ABOUTME: Effective visibility is the logical AND of every open frame

use super::error::{RenderError, Result};
use crate::parser::Operator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub operator: Operator,
    /// Placeholder text that opened the frame
    pub entry: String,
    pub visible: bool,
    pub flipped: bool,
}

#[derive(Debug)]
pub struct VisibilityStack {
    layer: String,
    frames: Vec<Frame>,
}

impl VisibilityStack {
    pub fn new(layer: &str) -> Self {
        Self {
            layer: layer.to_string(),
            frames: Vec::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.frames.iter().all(|frame| frame.visible)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self, operator: Operator, entry: &str, visible: bool) {
        self.frames.push(Frame {
            operator,
            entry: entry.to_string(),
            visible,
            flipped: false,
        });
    }

    pub fn flip(&mut self, entry: &str) -> Result<()> {
        let Some(frame) = self.frames.last_mut() else {
            return Err(self.broken(entry));
        };
        if frame.flipped {
            return Err(RenderError::TwoElseInRow {
                layer: self.layer.clone(),
                placeholder: entry.to_string(),
            });
        }
        frame.visible = !frame.visible;
        frame.flipped = true;
        Ok(())
    }

    pub fn pop(&mut self, entry: &str) -> Result<Frame> {
        match self.frames.pop() {
            Some(frame) => Ok(frame),
            None => Err(self.broken(entry)),
        }
    }

    /// Fails when frames are still open at the end of the layer.
    pub fn finish(self) -> Result<()> {
        if self.frames.is_empty() {
            return Ok(());
        }
        Err(RenderError::UnclosedOperators {
            layer: self.layer,
            placeholders: self.frames.into_iter().map(|frame| frame.entry).collect(),
        })
    }

    fn broken(&self, entry: &str) -> RenderError {
        RenderError::BrokenControlSequence {
            layer: self.layer.clone(),
            placeholder: entry.to_string(),
            details: format!(
                "The \"{}\" placeholder is not preceded by \"if\" or \"unless\"",
                entry
            ),
        }
    }
}
