use std::path::PathBuf;

use clap::Parser;
use renderer::{GpuPowerPreference, VsyncMode};

#[derive(Parser, Debug)]
#[command(
    name = "fractaldrift",
    author,
    version,
    about = "Full-screen animated fractal backdrop"
)]
pub struct Cli {
    /// Render in a regular desktop window instead of borderless fullscreen.
    #[arg(long)]
    pub windowed: bool,

    /// Window size used with `--windowed` (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Present mode: `on` waits for vblank, `off` presents immediately when supported.
    #[arg(long, value_name = "on|off", value_parser = parse_vsync)]
    pub vsync: Option<VsyncMode>,

    /// Adapter preference: `low` (integrated, default) or `high` (discrete).
    #[arg(long, value_name = "low|high", value_parser = parse_gpu_power)]
    pub gpu_power: Option<GpuPowerPreference>,

    /// Credit line for the shader author, shown in the window title.
    #[arg(long, value_name = "TEXT")]
    pub attribution: Option<String>,

    /// Let pointer input pass through the backdrop (`true` by default).
    #[arg(long, value_name = "BOOL")]
    pub click_through: Option<bool>,

    /// TOML configuration file; flags given on the command line take precedence.
    #[arg(long, env = "FRACTALDRIFT_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the vertex and fragment shader sources to DIR and exit.
    #[arg(long, value_name = "DIR")]
    pub dump_shaders: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_vsync(value: &str) -> Result<VsyncMode, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("vsync mode must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "fifo" => Ok(VsyncMode::On),
        "off" | "false" | "0" | "immediate" => Ok(VsyncMode::Off),
        _ => Err(format!("invalid vsync mode '{trimmed}'; use on or off")),
    }
}

pub fn parse_gpu_power(value: &str) -> Result<GpuPowerPreference, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("gpu power preference must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "low" | "integrated" => Ok(GpuPowerPreference::Low),
        "high" | "discrete" => Ok(GpuPowerPreference::High),
        _ => Err(format!(
            "unknown gpu power preference '{trimmed}' (expected low or high)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn vsync_accepts_aliases() {
        assert_eq!(parse_vsync("ON").unwrap(), VsyncMode::On);
        assert_eq!(parse_vsync(" immediate ").unwrap(), VsyncMode::Off);
        assert!(parse_vsync("").is_err());
        assert!(parse_vsync("sometimes").is_err());
    }

    #[test]
    fn gpu_power_accepts_aliases() {
        assert_eq!(parse_gpu_power("high").unwrap(), GpuPowerPreference::High);
        assert_eq!(
            parse_gpu_power("Integrated").unwrap(),
            GpuPowerPreference::Low
        );
        assert!(parse_gpu_power("turbo").is_err());
    }

    #[test]
    fn flags_parse_without_config() {
        let cli = Cli::try_parse_from([
            "fractaldrift",
            "--windowed",
            "--size",
            "800x600",
            "--vsync",
            "off",
            "--click-through",
            "false",
        ])
        .unwrap();
        assert!(cli.windowed);
        assert_eq!(cli.size.as_deref(), Some("800x600"));
        assert_eq!(cli.vsync, Some(VsyncMode::Off));
        assert_eq!(cli.click_through, Some(false));
        assert_eq!(cli.gpu_power, None);
    }
}
