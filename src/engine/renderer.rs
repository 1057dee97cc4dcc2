// ABOUTME: Depth-first layer resolver with cycle detection, fast-mode memoization and getters
// ABOUTME: Walks each layer's placeholders in source order while tracking conditional visibility

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::{debug, info, trace};

use super::error::{RenderError, Result};
use super::getter::{GetterCall, GetterSet};
use super::options::RenderOptions;
use super::source::{DataSource, Entry};
use super::state::RenderState;
use super::value::Rendered;
use super::visibility::VisibilityStack;
use crate::lexer::{PlaceholderSegment, Segment};
use crate::parser::{parse_layer, Directive, Operator, ParsedLayer};

/// Characters of surrounding text shown on either side of a placeholder in errors.
const EXCERPT_TAIL: usize = 20;

static NO_GETTERS: GetterSet = GetterSet::None;

/// Data source with an inline template installed under the entry point.
struct Layered<'a> {
    template: Option<Entry>,
    inner: &'a dyn DataSource,
}

impl DataSource for Layered<'_> {
    fn lookup(&self, name: &str) -> Option<Entry> {
        match self.template {
            Some(ref template) if template.key == name => Some(template.clone()),
            _ => self.inner.lookup(name),
        }
    }

    fn entries(&self) -> Vec<Entry> {
        let installed = self.template.as_ref().map(|template| template.key.as_str());
        let mut entries: Vec<Entry> = self.template.iter().cloned().collect();
        entries.extend(
            self.inner
                .entries()
                .into_iter()
                .filter(|entry| Some(entry.key.as_str()) != installed),
        );
        entries
    }
}

pub struct Renderer<'a> {
    data: Layered<'a>,
    getters: &'a GetterSet,
    options: &'a RenderOptions,
}

impl<'a> Renderer<'a> {
    pub fn new(data: &'a dyn DataSource, options: &'a RenderOptions) -> Self {
        Self {
            data: Layered {
                template: None,
                inner: data,
            },
            getters: &NO_GETTERS,
            options,
        }
    }

    pub fn with_getters(mut self, getters: &'a GetterSet) -> Self {
        self.getters = getters;
        self
    }

    /// Installs `template` as the text of the entry point layer.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.data.template = Some(Entry::new(
            self.options.entry_point.as_str(),
            Value::String(template.into()),
        ));
        self
    }

    /// Renders the entry point with a fresh [`RenderState`].
    pub async fn render(&self) -> Result<Rendered> {
        self.options.validate()?;

        let entry = self.options.entry_point.clone();
        if self.data.lookup(&entry).is_none() {
            return Err(RenderError::MissingEntryPoint { name: entry });
        }

        info!("Rendering entry point '{}'", entry);
        let mut state = RenderState::new(self.options.mode.fast);
        let rendered = self.resolve(entry, &mut state).await?;
        debug!("Rendered {} layer(s)", state.visited().len());
        Ok(rendered)
    }

    /// Parses a layer and checks placeholder arity without resolving anything.
    pub fn check(&self, name: &str, text: &str) -> Result<ParsedLayer> {
        let layer = parse_layer(name, text, &self.options.syntax(), &self.options.report)?;
        for placeholder in layer.placeholders() {
            if let Some(ref directive) = placeholder.directive {
                check_arity(&layer, text, placeholder, directive)?;
            }
        }
        Ok(layer)
    }

    fn resolve<'s>(
        &'s self,
        name: String,
        state: &'s mut RenderState,
    ) -> BoxFuture<'s, Result<Rendered>> {
        async move {
            if let Some(hit) = state.cached(&name) {
                debug!("Cache hit for layer '{}'", name);
                return Ok(hit);
            }

            state.enter(&name)?;
            trace!("Entering layer '{}' at depth {}", name, state.depth());
            let result = self.expand(&name, state).await;
            state.leave(&name);

            let rendered = result?;
            state.store(&name, &rendered);
            Ok(rendered)
        }
        .boxed()
    }

    async fn expand(&self, name: &str, state: &mut RenderState) -> Result<Rendered> {
        let getter = self.getters.find(name);

        let Some(entry) = self.data.lookup(name) else {
            debug!("Layer '{}' is missing, using substitute", name);
            return Ok(self.missing());
        };

        let text = match entry.value {
            Value::String(text) => text,
            other => {
                trace!("Layer '{}' is a data leaf", name);
                return Ok(Rendered::Data(other));
            }
        };

        let text = match getter {
            Some(getter) => {
                debug!("Invoking getter for layer '{}'", name);
                let call = GetterCall {
                    key: &entry.key,
                    name,
                    value: &text,
                    data: &self.data,
                    options: self.options,
                    getters: self.getters,
                };
                getter
                    .get(call)
                    .await
                    .map_err(|source| RenderError::Getter {
                        name: name.to_string(),
                        source,
                    })?
            }
            None => text,
        };

        let layer = parse_layer(name, &text, &self.options.syntax(), &self.options.report)?;
        self.walk(&layer, &text, state).await
    }

    async fn walk(
        &self,
        layer: &ParsedLayer,
        text: &str,
        state: &mut RenderState,
    ) -> Result<Rendered> {
        let mut output = String::with_capacity(text.len());
        let mut stack = VisibilityStack::new(&layer.name);

        for segment in &layer.segments {
            let placeholder = match segment {
                Segment::Text(id) => {
                    if stack.is_visible() {
                        output.push_str(&layer.arena.get(*id).value);
                    }
                    continue;
                }
                Segment::Placeholder(placeholder) => placeholder,
            };
            let Some(ref directive) = placeholder.directive else {
                continue;
            };
            check_arity(layer, text, placeholder, directive)?;

            match directive.operator {
                Operator::Insert => {
                    if stack.is_visible() {
                        let target = target_name(layer, text, placeholder, directive)?;
                        let value = self.resolve(target.to_string(), state).await?;
                        output.push_str(&value.to_text());
                    }
                }
                Operator::If | Operator::Unless => {
                    let visible = if stack.is_visible() {
                        let target = target_name(layer, text, placeholder, directive)?;
                        let value = self.resolve(target.to_string(), state).await?;
                        value.is_truthy() != (directive.operator == Operator::Unless)
                    } else {
                        false
                    };
                    stack.push(directive.operator, &placeholder.entry, visible);
                }
                Operator::Else => stack.flip(&placeholder.entry)?,
                Operator::End => {
                    stack.pop(&placeholder.entry)?;
                }
                Operator::Comment => {}
            }
        }

        stack.finish()?;
        Ok(Rendered::Text(output))
    }

    fn missing(&self) -> Rendered {
        match self.options.missing {
            Some(ref value) => Rendered::from_value(value.clone()),
            None => Rendered::Absent,
        }
    }
}

/// Renders the entry point of `data`, optionally replaced by an inline `template`.
pub async fn render(
    template: Option<&str>,
    data: &dyn DataSource,
    options: &RenderOptions,
    getters: &GetterSet,
) -> Result<Rendered> {
    let mut renderer = Renderer::new(data, options).with_getters(getters);
    if let Some(template) = template {
        renderer = renderer.with_template(template);
    }
    renderer.render().await
}

fn check_arity(
    layer: &ParsedLayer,
    text: &str,
    placeholder: &PlaceholderSegment,
    directive: &Directive,
) -> Result<()> {
    match directive.arity() {
        std::cmp::Ordering::Equal => Ok(()),
        std::cmp::Ordering::Less => Err(RenderError::TooFewParts {
            layer: layer.name.clone(),
            excerpt: excerpt(text, placeholder, &layer.name),
        }),
        std::cmp::Ordering::Greater => Err(RenderError::TooManyParts {
            layer: layer.name.clone(),
            excerpt: excerpt(text, placeholder, &layer.name),
        }),
    }
}

fn target_name<'l>(
    layer: &'l ParsedLayer,
    text: &str,
    placeholder: &PlaceholderSegment,
    directive: &Directive,
) -> Result<&'l str> {
    layer
        .target_name(directive)
        .ok_or_else(|| RenderError::TooFewParts {
            layer: layer.name.clone(),
            excerpt: excerpt(text, placeholder, &layer.name),
        })
}

/// Placeholder with up to [`EXCERPT_TAIL`] characters of context on each side.
fn excerpt(text: &str, placeholder: &PlaceholderSegment, layer: &str) -> String {
    let start = placeholder.span.start.min(text.len());
    let end = placeholder.span.end.min(text.len());
    let before = &text[..start];
    let after = &text[end..];

    let before_len = before.chars().count();
    let head: String = before
        .chars()
        .skip(before_len.saturating_sub(EXCERPT_TAIL))
        .collect();
    let tail: String = after.chars().take(EXCERPT_TAIL).collect();

    format!(
        "{}{}{}{}{} [layer: \"{}\", placeholder: \"{}\"]",
        if before_len > EXCERPT_TAIL { "..." } else { "" },
        head,
        placeholder.entry,
        tail,
        if after.chars().count() > EXCERPT_TAIL { "..." } else { "" },
        layer,
        placeholder.entry
    )
}
