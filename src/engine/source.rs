// ABOUTME: Data sources mapping layer names to templates or data leaves
// ABOUTME: Plain maps match exactly; PatternSource also matches /regex/ keys in insertion order

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

/// A matched layer: the key that matched and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: Value,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn is_template(&self) -> bool {
        self.value.is_string()
    }
}

pub trait DataSource: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Entry>;

    /// Every entry in lookup order.
    fn entries(&self) -> Vec<Entry>;
}

impl DataSource for IndexMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Entry> {
        self.get(name).map(|value| Entry::new(name, value.clone()))
    }

    fn entries(&self) -> Vec<Entry> {
        self.iter()
            .map(|(key, value)| Entry::new(key.as_str(), value.clone()))
            .collect()
    }
}

impl DataSource for HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Entry> {
        self.get(name).map(|value| Entry::new(name, value.clone()))
    }

    fn entries(&self) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self
            .iter()
            .map(|(key, value)| Entry::new(key.as_str(), value.clone()))
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }
}

impl DataSource for serde_json::Map<String, Value> {
    fn lookup(&self, name: &str) -> Option<Entry> {
        self.get(name).map(|value| Entry::new(name, value.clone()))
    }

    fn entries(&self) -> Vec<Entry> {
        self.iter()
            .map(|(key, value)| Entry::new(key.as_str(), value.clone()))
            .collect()
    }
}

/// Key of a layer: an exact name or a regular expression.
#[derive(Clone)]
pub enum LayerKey {
    Exact(String),
    Pattern(Regex),
}

impl LayerKey {
    /// Keys written as `/expr/` become patterns, anything else is exact.
    pub fn parse(raw: &str) -> Result<Self, regex::Error> {
        match raw
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            Some(expr) if !expr.is_empty() => Ok(LayerKey::Pattern(Regex::new(expr)?)),
            _ => Ok(LayerKey::Exact(raw.to_string())),
        }
    }

    pub fn pattern(expr: &str) -> Result<Self, regex::Error> {
        Ok(LayerKey::Pattern(Regex::new(expr)?))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            LayerKey::Exact(key) => key == name,
            LayerKey::Pattern(regex) => regex.is_match(name),
        }
    }
}

impl From<&str> for LayerKey {
    fn from(name: &str) -> Self {
        LayerKey::Exact(name.to_string())
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKey::Exact(key) => f.write_str(key),
            LayerKey::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

impl fmt::Debug for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerKey({})", self)
    }
}

impl PartialEq for LayerKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LayerKey::Exact(a), LayerKey::Exact(b)) => a == b,
            (LayerKey::Pattern(a), LayerKey::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// Ordered keys, exact or pattern; the first key matching a name wins.
#[derive(Debug, Clone, Default)]
pub struct PatternSource {
    entries: Vec<(LayerKey, Value)>,
}

impl PatternSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a source from a map whose `/expr/` keys become patterns.
    pub fn from_map(map: IndexMap<String, Value>) -> Result<Self, regex::Error> {
        let mut source = Self::new();
        for (key, value) in map {
            source.insert(LayerKey::parse(&key)?, value);
        }
        Ok(source)
    }

    /// Replaces the value of an equal key in place, otherwise appends.
    pub fn insert(&mut self, key: LayerKey, value: Value) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<LayerKey>, value: Value) -> Self {
        self.insert(key.into(), value);
        self
    }

    pub fn with_pattern(mut self, expr: &str, value: Value) -> Result<Self, regex::Error> {
        self.insert(LayerKey::pattern(expr)?, value);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DataSource for PatternSource {
    fn lookup(&self, name: &str) -> Option<Entry> {
        self.entries
            .iter()
            .find(|(key, _)| key.matches(name))
            .map(|(key, value)| Entry::new(key.to_string(), value.clone()))
    }

    fn entries(&self) -> Vec<Entry> {
        self.entries
            .iter()
            .map(|(key, value)| Entry::new(key.to_string(), value.clone()))
            .collect()
    }
}
