use std::path::PathBuf;

use anyhow::{Context, Result};
use ripple::{HeadlessRequest, Renderer, ScriptedPointer, WindowOptions};
use rippleconfig::EffectConfig;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::{ConfigAction, EffectArgs, RenderArgs, RunArgs};
use crate::paths::AppPaths;

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "path", rename_all = "kebab-case")]
pub enum ConfigSource {
    Explicit(PathBuf),
    Discovered(PathBuf),
    Defaults,
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run_window(effect: &EffectArgs, args: RunArgs) -> Result<()> {
    let (config, source) = load_config(effect)?;
    tracing::info!(?source, "starting ripplefx");

    let mut options = WindowOptions::default();
    if let Some(size) = args.window_size {
        options.size = size;
    }
    if let Some(title) = args.title {
        options.title = title;
    }
    Renderer::new(config).run_windowed(options)
}

pub fn render(effect: &EffectArgs, args: RenderArgs) -> Result<()> {
    let (config, source) = load_config(effect)?;
    tracing::info!(?source, output = %args.output.display(), "rendering offscreen");

    let request = HeadlessRequest {
        size: args.size,
        pixel_density: args.density,
        frames: args.frames,
        fps: args.fps,
        pointer: args.pointer.map(|position| ScriptedPointer {
            position,
            frames: args.pointer_frames,
        }),
    };
    let frame = Renderer::new(config).render_headless(&request)?;
    ripple::export_png(&frame, &args.output)?;
    println!("{}", args.output.display());
    Ok(())
}

pub fn config(effect: &EffectArgs, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show { json } => {
            let (config, _) = load_config(effect)?;
            let rendered = if json {
                serde_json::to_string_pretty(&config)?
            } else {
                config.to_toml_string()?
            };
            println!("{}", rendered.trim_end());
        }
        ConfigAction::Path { json: true } => {
            let source = discover_config(effect)?;
            println!("{}", serde_json::to_string_pretty(&source)?);
        }
        ConfigAction::Path { json: false } => match discover_config(effect)? {
            ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => {
                println!("{}", path.display());
            }
            ConfigSource::Defaults => {
                let paths = AppPaths::discover()?;
                println!(
                    "{} (not present; using built-in defaults)",
                    paths.effect_config().display()
                );
            }
        },
    }
    Ok(())
}

/// Resolves the config file, loads it and applies CLI overrides.
pub fn load_config(effect: &EffectArgs) -> Result<(EffectConfig, ConfigSource)> {
    let source = discover_config(effect)?;
    let mut config = match &source {
        ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => EffectConfig::load(path)?,
        ConfigSource::Defaults => EffectConfig::default(),
    };
    apply_overrides(&mut config, effect);
    config
        .validate()
        .context("configuration is invalid after applying command-line overrides")?;
    Ok((config, source))
}

fn discover_config(effect: &EffectArgs) -> Result<ConfigSource> {
    if let Some(path) = &effect.config {
        return Ok(ConfigSource::Explicit(path.clone()));
    }
    let candidate = AppPaths::discover()?.effect_config();
    if candidate.is_file() {
        Ok(ConfigSource::Discovered(candidate))
    } else {
        Ok(ConfigSource::Defaults)
    }
}

fn apply_overrides(config: &mut EffectConfig, effect: &EffectArgs) {
    let label = &mut config.label;
    if let Some(text) = &effect.text {
        label.text = text.clone();
    }
    if let Some(color) = effect.text_color {
        label.text_color = color;
    }
    if let Some(color) = effect.background_color {
        label.background_color = color;
    }
    if let Some(size) = effect.font_size {
        label.font_size = size;
    }
    if let Some(family) = &effect.font_family {
        label.font_family = family.clone();
    }
    if let Some(path) = &effect.font_path {
        label.font_path = Some(path.clone());
    }

    let simulation = &mut config.simulation;
    if let Some(intensity) = effect.intensity {
        simulation.intensity = intensity;
    }
    if let Some(damping) = effect.damping {
        simulation.damping = damping;
    }
    if let Some(radius) = effect.ripple_radius {
        simulation.ripple_radius = radius;
    }
}
