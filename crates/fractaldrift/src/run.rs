use anyhow::{Context, Result};
use renderer::{dump_shaders, Renderer, WindowMode};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::{resolve_renderer_config, FileConfig};

pub fn run(cli: Cli) -> Result<()> {
    if let Some(dir) = cli.dump_shaders.as_ref() {
        let written = dump_shaders(dir).context("--dump-shaders failed")?;
        for path in &written {
            println!("{}", path.display());
        }
        tracing::info!(dir = %dir.display(), files = written.len(), "shader sources written");
        return Ok(());
    }

    let file = match cli.config.as_deref() {
        Some(path) => {
            let loaded = FileConfig::load(path)?;
            tracing::debug!(path = %path.display(), config = ?loaded, "loaded config file");
            loaded
        }
        None => FileConfig::default(),
    };

    let config = resolve_renderer_config(&cli, &file)?;
    match config.window_mode {
        WindowMode::Fullscreen => tracing::info!("bootstrapping fullscreen backdrop"),
        WindowMode::Windowed { width, height } => {
            tracing::info!(width, height, "bootstrapping windowed backdrop")
        }
    }
    tracing::debug!(
        vsync = ?config.vsync,
        gpu_power = ?config.gpu_power,
        click_through = config.click_through,
        "resolved renderer config"
    );

    Renderer::new(config).run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
