// ABOUTME: Mutable bookkeeping of one render call: layers in progress and the fast-mode cache
// ABOUTME: A fresh RenderState is created for every top-level render

use std::collections::HashMap;

use indexmap::IndexSet;

use super::error::{RenderError, Result};
use super::value::Rendered;

#[derive(Debug, Default)]
pub struct RenderState {
    in_progress: IndexSet<String>,
    cache: HashMap<String, Rendered>,
    visited: Vec<String>,
    fast: bool,
}

impl RenderState {
    pub fn new(fast: bool) -> Self {
        Self {
            fast,
            ..Self::default()
        }
    }

    pub fn cached(&self, name: &str) -> Option<Rendered> {
        self.cache.get(name).cloned()
    }

    pub fn store(&mut self, name: &str, value: &Rendered) {
        if self.fast {
            self.cache.insert(name.to_string(), value.clone());
        }
    }

    /// Marks `name` as in progress, failing if it already is.
    pub fn enter(&mut self, name: &str) -> Result<()> {
        if self.in_progress.contains(name) {
            let mut chain: Vec<String> = self.in_progress.iter().cloned().collect();
            chain.push(name.to_string());
            return Err(RenderError::CyclicDependence { chain });
        }
        self.in_progress.insert(name.to_string());
        self.visited.push(name.to_string());
        Ok(())
    }

    pub fn leave(&mut self, name: &str) {
        self.in_progress.shift_remove(name);
    }

    pub fn depth(&self) -> usize {
        self.in_progress.len()
    }

    /// Every layer entered so far, in order.
    pub fn visited(&self) -> &[String] {
        &self.visited
    }
}
