use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid color '{0}'; expected #rgb, #rrggbb, or #rrggbbaa")]
    Color(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// 8-bit sRGB color parsed from CSS-style hex notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let hex = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ConfigError::Color(raw.to_string()))?;
        if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(ConfigError::Color(raw.to_string()));
        }

        let nibble = |index: usize| -> u8 {
            let value = u8::from_str_radix(&hex[index..index + 1], 16).unwrap_or(0);
            value * 17
        };
        let byte = |index: usize| -> u8 { u8::from_str_radix(&hex[index..index + 2], 16).unwrap_or(0) };

        match hex.len() {
            3 => Ok(Color::rgb(nibble(0), nibble(1), nibble(2))),
            6 => Ok(Color::rgb(byte(0), byte(2), byte(4))),
            8 => Ok(Color {
                r: byte(0),
                g: byte(2),
                b: byte(4),
                a: byte(6),
            }),
            _ => Err(ConfigError::Color(raw.to_string())),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "#{:02x}{:02x}{:02x}{:02x}",
                self.r, self.g, self.b, self.a
            )
        }
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;
        impl<'de> de::Visitor<'de> for Visitor {
            type Value = Color;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a hex color string such as \"#b8e1fe\"")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(Visitor)
    }
}

/// Text and colors rasterized into the undistorted backdrop.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LabelConfig {
    pub text: String,
    pub text_color: Color,
    pub background_color: Color,
    /// Size in logical pixels; scaled by the pixel density at rasterization.
    pub font_size: f32,
    /// CSS-style family list, tried in order (e.g. `"Inter, Arial, sans-serif"`).
    pub font_family: String,
    /// Explicit font file; takes precedence over `font_family` when it loads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    pub bold: bool,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            text: "Oceanel".to_string(),
            text_color: Color::rgb(0xb8, 0xe1, 0xfe),
            background_color: Color::BLACK,
            font_size: 250.0,
            font_family: "Test Söhne, Arial, sans-serif".to_string(),
            font_path: None,
            bold: true,
        }
    }
}

impl LabelConfig {
    /// Splits `font_family` into trimmed, unquoted family names.
    pub fn families(&self) -> Vec<String> {
        self.font_family
            .split(',')
            .map(|family| family.trim().trim_matches(|ch| ch == '"' || ch == '\''))
            .filter(|family| !family.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Constants of the damped wave update.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Pressure added at the pointer centre, falling off linearly to the radius.
    pub intensity: f32,
    /// Per-step pressure damping.
    pub damping: f32,
    /// Per-step velocity damping.
    pub velocity_damping: f32,
    /// Impulse radius in normalized surface coordinates.
    pub ripple_radius: f32,
    /// Wave propagation constant; the update is unstable above sqrt(2).
    pub propagation: f32,
    /// Spring-back factor pulling pressure toward rest.
    pub restoring_force: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            intensity: 2.0,
            damping: 0.999,
            velocity_damping: 0.998,
            ripple_radius: 0.02,
            propagation: 1.4,
            restoring_force: 0.005,
        }
    }
}

/// Constants of the refraction and specular lighting pass.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompositingConfig {
    pub distortion: f32,
    pub specular_gain: f32,
    pub shininess: f32,
    /// Unnormalized light direction; y points away from the surface.
    pub light_direction: [f32; 3],
}

impl Default for CompositingConfig {
    fn default() -> Self {
        Self {
            distortion: 0.3,
            specular_gain: 1.5,
            shininess: 60.0,
            light_direction: [-3.0, 10.0, 3.0],
        }
    }
}

/// Immutable effect configuration, built once and threaded into each stage.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EffectConfig {
    pub version: u32,
    pub label: LabelConfig,
    pub simulation: SimulationConfig,
    pub compositing: CompositingConfig,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            version: 1,
            label: LabelConfig::default(),
            simulation: SimulationConfig::default(),
            compositing: CompositingConfig::default(),
        }
    }
}

impl EffectConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: EffectConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        let label = &self.label;
        if !label.font_size.is_finite() || label.font_size <= 0.0 {
            return Err(ConfigError::Invalid(
                "label.font_size must be greater than zero".into(),
            ));
        }

        let sim = &self.simulation;
        if !sim.intensity.is_finite() || sim.intensity < 0.0 {
            return Err(ConfigError::Invalid(
                "simulation.intensity must be >= 0".into(),
            ));
        }
        check_unit_interval("simulation.damping", sim.damping)?;
        check_unit_interval("simulation.velocity_damping", sim.velocity_damping)?;
        check_unit_interval("simulation.ripple_radius", sim.ripple_radius)?;
        if !(sim.propagation > 0.0 && sim.propagation <= std::f32::consts::SQRT_2) {
            return Err(ConfigError::Invalid(format!(
                "simulation.propagation must be in (0, {:.4}]; got {}",
                std::f32::consts::SQRT_2,
                sim.propagation
            )));
        }
        if !sim.restoring_force.is_finite() || sim.restoring_force < 0.0 {
            return Err(ConfigError::Invalid(
                "simulation.restoring_force must be >= 0".into(),
            ));
        }

        let comp = &self.compositing;
        if !comp.distortion.is_finite() || !comp.specular_gain.is_finite() {
            return Err(ConfigError::Invalid(
                "compositing constants must be finite".into(),
            ));
        }
        if !comp.shininess.is_finite() || comp.shininess <= 0.0 {
            return Err(ConfigError::Invalid(
                "compositing.shininess must be greater than zero".into(),
            ));
        }
        let [x, y, z] = comp.light_direction;
        if !(x * x + y * y + z * z).is_normal() {
            return Err(ConfigError::Invalid(
                "compositing.light_direction must be a non-zero vector".into(),
            ));
        }

        Ok(())
    }
}

fn check_unit_interval(name: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be in (0, 1]; got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
version = 1

[label]
text = "Tide"
text_color = "#fff"
background_color = "#10203040"
font_size = 120
font_family = "'Fira Sans', sans-serif"

[simulation]
intensity = 1.5
ripple_radius = 0.05

[compositing]
specular_gain = 0.75
"##;

    #[test]
    fn parses_sample_config() {
        let config = EffectConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.label.text, "Tide");
        assert_eq!(config.label.text_color, Color::rgb(255, 255, 255));
        assert_eq!(
            config.label.background_color,
            Color {
                r: 0x10,
                g: 0x20,
                b: 0x30,
                a: 0x40
            }
        );
        assert_eq!(config.label.families(), vec!["Fira Sans", "sans-serif"]);
        assert_eq!(config.simulation.intensity, 1.5);
        assert_eq!(config.simulation.damping, 0.999);
        assert_eq!(config.compositing.specular_gain, 0.75);
        assert_eq!(config.compositing.shininess, 60.0);
    }

    #[test]
    fn empty_document_yields_reference_constants() {
        let config = EffectConfig::from_toml_str("").unwrap();
        assert_eq!(config, EffectConfig::default());
        assert_eq!(config.simulation.propagation, 1.4);
        assert_eq!(config.simulation.ripple_radius, 0.02);
        assert_eq!(config.compositing.distortion, 0.3);
    }

    #[test]
    fn rejects_bad_color() {
        let err = EffectConfig::from_toml_str("[label]\ntext_color = \"blue\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(matches!(
            "#12345".parse::<Color>(),
            Err(ConfigError::Color(_))
        ));
    }

    #[test]
    fn rejects_unstable_propagation() {
        let err =
            EffectConfig::from_toml_str("[simulation]\npropagation = 1.6\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_damping_outside_unit_interval() {
        let err = EffectConfig::from_toml_str("[simulation]\ndamping = 1.01\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = EffectConfig::from_toml_str("[simulation]\nripple_radius = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = EffectConfig::from_toml_str("version = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn serializes_back_to_equivalent_config() {
        let config = EffectConfig::from_toml_str(SAMPLE).unwrap();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("text_color = \"#ffffff\""));
        assert_eq!(EffectConfig::from_toml_str(&text).unwrap(), config);
    }
}
