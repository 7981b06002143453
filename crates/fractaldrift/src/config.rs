use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use renderer::{GpuPowerPreference, RendererConfig, VsyncMode, WindowMode};
use serde::Deserialize;

use crate::cli::Cli;

/// Window size used by `--windowed` when no size is given anywhere.
pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (1280, 720);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VsyncSetting {
    On,
    Off,
}

impl From<VsyncSetting> for VsyncMode {
    fn from(value: VsyncSetting) -> Self {
        match value {
            VsyncSetting::On => VsyncMode::On,
            VsyncSetting::Off => VsyncMode::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    Low,
    High,
}

impl From<PowerSetting> for GpuPowerPreference {
    fn from(value: PowerSetting) -> Self {
        match value {
            PowerSetting::Low => GpuPowerPreference::Low,
            PowerSetting::High => GpuPowerPreference::High,
        }
    }
}

/// On-disk configuration. Every key is optional and mirrors a CLI flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub windowed: Option<bool>,
    pub size: Option<String>,
    pub vsync: Option<VsyncSetting>,
    pub gpu_power: Option<PowerSetting>,
    pub attribution: Option<String>,
    pub click_through: Option<bool>,
}

impl FileConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: FileConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("failed to load config file {}", path.display()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(size) = &self.size {
            parse_surface_size(size)
                .map_err(|err| ConfigError::Invalid(format!("size '{size}': {err}")))?;
        }
        Ok(())
    }
}

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32)> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| anyhow!("expected WxH format, e.g. 1920x1080"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid width in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid height in size specification"))?;

    if width == 0 || height == 0 {
        anyhow::bail!("surface dimensions must be greater than zero");
    }

    Ok((width, height))
}

/// Merges flags over the file over built-in defaults.
pub fn resolve_renderer_config(cli: &Cli, file: &FileConfig) -> Result<RendererConfig> {
    let defaults = RendererConfig::default();

    let windowed = cli.windowed || file.windowed.unwrap_or(false);
    let size = match cli.size.as_deref().or(file.size.as_deref()) {
        Some(spec) => Some(
            parse_surface_size(spec).with_context(|| format!("invalid --size value '{spec}'"))?,
        ),
        None => None,
    };

    let window_mode = if windowed {
        let (width, height) = size.unwrap_or(DEFAULT_WINDOW_SIZE);
        WindowMode::Windowed { width, height }
    } else {
        if size.is_some() {
            tracing::warn!("size only applies with --windowed; ignoring");
        }
        WindowMode::Fullscreen
    };

    let attribution = cli
        .attribution
        .clone()
        .or_else(|| file.attribution.clone())
        .filter(|text| !text.trim().is_empty());

    Ok(RendererConfig {
        window_mode,
        gpu_power: cli
            .gpu_power
            .or(file.gpu_power.map(Into::into))
            .unwrap_or(defaults.gpu_power),
        vsync: cli
            .vsync
            .or(file.vsync.map(Into::into))
            .unwrap_or(defaults.vsync),
        attribution,
        click_through: cli
            .click_through
            .or(file.click_through)
            .unwrap_or(defaults.click_through),
    })
}
