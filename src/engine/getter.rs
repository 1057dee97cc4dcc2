// ABOUTME: Getter capability that computes a layer's text on demand, possibly asynchronously
// ABOUTME: GetterSet selects a getter per layer name: none, one catch-all, or keyed by LayerKey

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::options::RenderOptions;
use super::source::{DataSource, LayerKey};

/// Everything a getter can see when it is invoked for one layer.
pub struct GetterCall<'a> {
    /// Data key that matched the requested name
    pub key: &'a str,
    pub name: &'a str,
    /// Raw layer text from the data source
    pub value: &'a str,
    pub data: &'a dyn DataSource,
    pub options: &'a RenderOptions,
    pub getters: &'a GetterSet,
}

#[async_trait]
pub trait Getter: Send + Sync {
    async fn get(&self, call: GetterCall<'_>) -> anyhow::Result<String>;
}

/// Adapts a synchronous closure into a [`Getter`].
pub struct FnGetter<F>(F);

impl<F> FnGetter<F>
where
    F: Fn(GetterCall<'_>) -> anyhow::Result<String> + Send + Sync,
{
    pub fn new(function: F) -> Self {
        Self(function)
    }
}

#[async_trait]
impl<F> Getter for FnGetter<F>
where
    F: Fn(GetterCall<'_>) -> anyhow::Result<String> + Send + Sync,
{
    async fn get(&self, call: GetterCall<'_>) -> anyhow::Result<String> {
        (self.0)(call)
    }
}

#[derive(Clone, Default)]
pub enum GetterSet {
    #[default]
    None,
    Single(Arc<dyn Getter>),
    Keyed(Vec<(LayerKey, Arc<dyn Getter>)>),
}

impl GetterSet {
    pub fn single(getter: impl Getter + 'static) -> Self {
        GetterSet::Single(Arc::new(getter))
    }

    /// Adds a keyed getter; a catch-all set is replaced by a keyed one.
    pub fn with(self, key: impl Into<LayerKey>, getter: impl Getter + 'static) -> Self {
        let mut keyed = match self {
            GetterSet::Keyed(keyed) => keyed,
            GetterSet::None | GetterSet::Single(_) => Vec::new(),
        };
        keyed.push((key.into(), Arc::new(getter)));
        GetterSet::Keyed(keyed)
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn Getter>> {
        match self {
            GetterSet::None => None,
            GetterSet::Single(getter) => Some(Arc::clone(getter)),
            GetterSet::Keyed(keyed) => keyed
                .iter()
                .find(|(key, _)| key.matches(name))
                .map(|(_, getter)| Arc::clone(getter)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            GetterSet::None => true,
            GetterSet::Single(_) => false,
            GetterSet::Keyed(keyed) => keyed.is_empty(),
        }
    }
}

impl fmt::Debug for GetterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GetterSet::None => f.write_str("GetterSet::None"),
            GetterSet::Single(_) => f.write_str("GetterSet::Single"),
            GetterSet::Keyed(keyed) => f
                .debug_list()
                .entries(keyed.iter().map(|(key, _)| key.to_string()))
                .finish(),
        }
    }
}
