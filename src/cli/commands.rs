// ABOUTME: Command implementations for the layercake CLI
// ABOUTME: Handles execution of the render, check and tree commands

use anyhow::Result;
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::args::TagArgs;
use super::config::Config;
use crate::engine::{render, DataSource, GetterSet, PatternSource, RenderOptions, Rendered, Renderer};
use crate::parser::parse_layer;

/// Options of a single `render` invocation
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub data: PathBuf,
    pub template: Option<PathBuf>,
    pub inline: Option<String>,
    pub entry: Option<String>,
    pub tags: TagArgs,
    pub fast: bool,
    pub missing: Option<String>,
    pub output: Option<PathBuf>,
}

/// Load a data file; keys written as `/expr/` become pattern keys
pub fn load_data(path: &Path) -> Result<PatternSource> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read data file '{}': {}", path.display(), e))?;

    let map: IndexMap<String, Value> = serde_yaml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse data file '{}': {}", path.display(), e))?;

    let source = PatternSource::from_map(map)
        .map_err(|e| anyhow::anyhow!("Invalid pattern key in '{}': {}", path.display(), e))?;

    info!("Loaded {} layer(s) from {}", source.len(), path.display());
    Ok(source)
}

fn apply_tags(options: &mut RenderOptions, tags: &TagArgs) {
    if let Some(ref open) = tags.open {
        options.placeholder.open = open.clone();
    }
    if let Some(ref close) = tags.close {
        options.placeholder.close = close.clone();
    }
}

/// Render the entry point layer and print or write the result
pub async fn render_layers(request: RenderRequest, config: &Config) -> Result<()> {
    let source = load_data(&request.data)?;

    let mut options = config.render.clone();
    apply_tags(&mut options, &request.tags);
    if let Some(entry) = request.entry {
        options.entry_point = entry;
    }
    if request.fast {
        options.mode.fast = true;
    }
    if let Some(missing) = request.missing {
        options.missing = Some(Value::String(missing));
    }

    let template = match (request.template, request.inline) {
        (Some(path), _) => Some(std::fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read template file '{}': {}", path.display(), e)
        })?),
        (None, inline) => inline,
    };

    let rendered = render(template.as_deref(), &source, &options, &GetterSet::None)
        .await
        .map_err(|e| anyhow::anyhow!(e.report(&options.report)))?;

    let text = match rendered {
        Rendered::Data(ref value) => serde_json::to_string_pretty(value)?,
        other => other.into_text(),
    };

    match request.output {
        Some(path) => {
            std::fs::write(&path, &text).map_err(|e| {
                anyhow::anyhow!("Failed to write output file '{}': {}", path.display(), e)
            })?;
            info!("Output written to: {}", path.display());
        }
        None => println!("{}", text),
    }

    Ok(())
}

/// Parse every template layer and report all syntax errors found
pub async fn check_layers(data: PathBuf, tags: TagArgs, config: &Config) -> Result<()> {
    let source = load_data(&data)?;

    let mut options = config.render.clone();
    apply_tags(&mut options, &tags);
    options.validate()?;

    let renderer = Renderer::new(&source, &options);
    let mut checked = 0;
    let mut failed = 0;

    for entry in source.entries() {
        let Value::String(ref text) = entry.value else {
            continue;
        };
        checked += 1;

        match renderer.check(&entry.key, text) {
            Ok(_) => println!("✓ {}", entry.key),
            Err(e) => {
                failed += 1;
                warn!("Layer '{}' failed the check", entry.key);
                println!("✗ {}", entry.key);
                eprintln!("{}", e.report(&options.report));
            }
        }
    }

    if failed > 0 {
        return Err(anyhow::anyhow!(
            "{} of {} layer(s) have errors",
            failed,
            checked
        ));
    }

    println!("All {} layer(s) are valid", checked);
    Ok(())
}

/// Print the control tree outline of one layer
pub async fn print_tree(data: PathBuf, layer: String, tags: TagArgs, config: &Config) -> Result<()> {
    let source = load_data(&data)?;

    let mut options = config.render.clone();
    apply_tags(&mut options, &tags);
    options.validate()?;

    let entry = source
        .lookup(&layer)
        .ok_or_else(|| anyhow::anyhow!("No layer named '{}' in {}", layer, data.display()))?;

    let Value::String(ref text) = entry.value else {
        println!("{} is a data leaf: {}", layer, entry.value);
        return Ok(());
    };

    let parsed = parse_layer(&layer, text, &options.syntax(), &options.report)
        .map_err(|report| anyhow::anyhow!(report.to_string()))?;

    print!("{}", parsed.tree.outline(&parsed.arena));
    Ok(())
}
