use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rippleconfig::Color;

#[derive(Parser, Debug)]
#[command(
    name = "ripplefx",
    author,
    version,
    about = "Interactive water ripples over a text backdrop",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub effect: EffectArgs,
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Config selection and per-field overrides shared by every command.
#[derive(Args, Debug, Default, Clone)]
pub struct EffectArgs {
    /// Effect config file (TOML). Defaults to `<config dir>/ripplefx/effect.toml` when present.
    #[arg(long, value_name = "FILE", env = "RIPPLEFX_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Text rasterized into the backdrop (empty for a plain background).
    #[arg(long, value_name = "TEXT", global = true)]
    pub text: Option<String>,

    /// Label color as `#rgb`, `#rrggbb` or `#rrggbbaa`.
    #[arg(long, value_name = "HEX", value_parser = parse_color, global = true)]
    pub text_color: Option<Color>,

    /// Backdrop fill color as `#rgb`, `#rrggbb` or `#rrggbbaa`.
    #[arg(long, value_name = "HEX", value_parser = parse_color, global = true)]
    pub background_color: Option<Color>,

    /// Label size in logical pixels.
    #[arg(long, value_name = "PX", global = true)]
    pub font_size: Option<f32>,

    /// Comma-separated family list tried in order (e.g. `"Inter, sans-serif"`).
    #[arg(long, value_name = "FAMILIES", global = true)]
    pub font_family: Option<String>,

    /// Font file used instead of the family list.
    #[arg(long, value_name = "FILE", global = true)]
    pub font_path: Option<PathBuf>,

    /// Pressure injected at the pointer centre.
    #[arg(long, value_name = "VALUE", global = true)]
    pub intensity: Option<f32>,

    /// Per-frame pressure damping in (0, 1].
    #[arg(long, value_name = "FACTOR", global = true)]
    pub damping: Option<f32>,

    /// Impulse radius in normalized surface coordinates.
    #[arg(long, value_name = "RADIUS", global = true)]
    pub ripple_radius: Option<f32>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Initial window size in logical pixels (e.g. `1280x720`).
    #[arg(long = "window-size", value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub window_size: Option<(u32, u32)>,

    /// Window title.
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the effect offscreen on the CPU and write the last frame as PNG.
    Render(RenderArgs),
    /// Inspect the effective configuration.
    Config(ConfigCommand),
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Destination PNG path.
    #[arg(long, short, value_name = "PATH")]
    pub output: PathBuf,

    /// Viewport size in logical pixels.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "800x600")]
    pub size: (u32, u32),

    /// Physical pixels per logical pixel.
    #[arg(long, value_name = "RATIO", value_parser = parse_density, default_value_t = 1.0)]
    pub density: f32,

    /// Number of frame cycles to simulate.
    #[arg(long, value_name = "N", default_value_t = 120)]
    pub frames: u32,

    /// Simulated frame rate.
    #[arg(long, value_name = "FPS", value_parser = parse_fps, default_value_t = 60.0)]
    pub fps: f32,

    /// Hold the pointer at logical `X,Y` (top-left origin).
    #[arg(long, value_name = "X,Y", value_parser = parse_pointer)]
    pub pointer: Option<[f32; 2]>,

    /// Number of leading frames the pointer is held for.
    #[arg(long, value_name = "N", default_value_t = 30)]
    pub pointer_frames: u32,
}

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration after overrides.
    Show {
        /// Emit JSON instead of TOML.
        #[arg(long)]
        json: bool,
    },
    /// Print which config file would be loaded.
    Path {
        /// Emit JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_color(value: &str) -> Result<Color, String> {
    value.parse::<Color>().map_err(|err| err.to_string())
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{value}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{value}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{value}'"))?;
    if width == 0 || height == 0 {
        return Err("size dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

fn parse_density(value: &str) -> Result<f32, String> {
    let density: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid pixel density '{value}'"))?;
    if !density.is_finite() || density <= 0.0 {
        return Err("pixel density must be greater than zero".into());
    }
    Ok(density)
}

fn parse_fps(value: &str) -> Result<f32, String> {
    let fps: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid frame rate '{value}'"))?;
    if !fps.is_finite() || fps <= 0.0 {
        return Err("frame rate must be greater than zero".into());
    }
    Ok(fps)
}

fn parse_pointer(value: &str) -> Result<[f32; 2], String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("invalid pointer '{value}'; expected X,Y"))?;
    let parse = |part: &str| -> Result<f32, String> {
        part.trim()
            .parse::<f32>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| format!("invalid pointer coordinate '{part}'"))
    };
    Ok([parse(x)?, parse(y)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_accepts_either_separator() {
        assert_eq!(parse_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_size("64X48").unwrap(), (64, 48));
    }

    #[test]
    fn parse_size_rejects_zero_and_garbage() {
        assert!(parse_size("0x720").is_err());
        assert!(parse_size("1280").is_err());
        assert!(parse_size("widexhigh").is_err());
    }

    #[test]
    fn parse_pointer_reads_two_coordinates() {
        assert_eq!(parse_pointer("400, 300.5").unwrap(), [400.0, 300.5]);
        assert!(parse_pointer("400").is_err());
        assert!(parse_pointer("nan,1").is_err());
    }

    #[test]
    fn parse_color_reports_bad_hex() {
        assert_eq!(parse_color("#f00").unwrap(), Color::rgb(255, 0, 0));
        let err = parse_color("red").unwrap_err();
        assert!(err.contains("red"), "unexpected error: {err}");
    }

    #[test]
    fn parse_density_and_fps_reject_non_positive() {
        assert!(parse_density("0").is_err());
        assert_eq!(parse_density("2").unwrap(), 2.0);
        assert!(parse_fps("-30").is_err());
    }

    #[test]
    fn overrides_are_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "ripplefx",
            "render",
            "--output",
            "out.png",
            "--text",
            "",
            "--intensity",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.effect.text.as_deref(), Some(""));
        assert_eq!(cli.effect.intensity, Some(3.0));
        match cli.command {
            Some(Command::Render(args)) => {
                assert_eq!(args.size, (800, 600));
                assert_eq!(args.frames, 120);
                assert!(args.pointer.is_none());
            }
            other => panic!("expected render command, got {other:?}"),
        }
    }
}
