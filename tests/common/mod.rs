// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides layer set builders and temporary data files for render and CLI tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tempfile::TempDir;

use layercake::engine::{Getter, GetterCall, LayerKey, PatternSource};

/// Builds an ordered set of layers for a test
#[derive(Default)]
pub struct LayerSetBuilder {
    layers: IndexMap<String, Value>,
}

impl LayerSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(mut self, name: &str, text: &str) -> Self {
        self.layers
            .insert(name.to_string(), Value::String(text.to_string()));
        self
    }

    pub fn value(mut self, name: &str, value: Value) -> Self {
        self.layers.insert(name.to_string(), value);
        self
    }

    /// Adds a `/expr/` pattern key
    pub fn pattern(mut self, expr: &str, text: &str) -> Self {
        self.layers
            .insert(format!("/{}/", expr), Value::String(text.to_string()));
        self
    }

    pub fn build(self) -> IndexMap<String, Value> {
        self.layers
    }

    pub fn build_source(self) -> PatternSource {
        PatternSource::from_map(self.layers).expect("valid pattern keys")
    }

    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(&self.layers).expect("serializable layers")
    }
}

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.file(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    pub fn write_layers(&self, name: &str, builder: &LayerSetBuilder) -> PathBuf {
        self.write(name, &builder.to_yaml())
    }
}

/// Getter that counts its invocations and wraps the layer text
pub struct CountingGetter {
    pub calls: Arc<AtomicUsize>,
}

impl CountingGetter {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl Getter for CountingGetter {
    async fn get(&self, call: GetterCall<'_>) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(call.value.to_string())
    }
}

pub fn exact(name: &str) -> LayerKey {
    LayerKey::from(name)
}
