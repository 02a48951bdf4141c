use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use rippleconfig::EffectConfig;
use tempfile::TempDir;

fn ripplefx(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ripplefx"))
        .env("RIPPLEFX_CONFIG_DIR", config_dir)
        .env_remove("RIPPLEFX_CONFIG")
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to spawn ripplefx")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout is not utf-8")
}

#[test]
fn render_writes_png_of_requested_size() {
    let root = TempDir::new().unwrap();
    let output_path = root.path().join("frames/still.png");

    let output = ripplefx(
        root.path(),
        &[
            "render",
            "--output",
            output_path.to_str().unwrap(),
            "--size",
            "160x120",
            "--frames",
            "8",
            "--pointer",
            "80,60",
            "--pointer-frames",
            "4",
            "--text",
            "",
        ],
    );
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("still.png"));

    let image = image::open(&output_path).unwrap();
    assert_eq!((image.width(), image.height()), (160, 120));
}

#[test]
fn render_scales_output_by_pixel_density() {
    let root = TempDir::new().unwrap();
    let output_path = root.path().join("dense.png");

    let output = ripplefx(
        root.path(),
        &[
            "render",
            "-o",
            output_path.to_str().unwrap(),
            "--size",
            "120x100",
            "--density",
            "2",
            "--frames",
            "2",
            "--text",
            "",
        ],
    );
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let image = image::open(&output_path).unwrap();
    assert_eq!((image.width(), image.height()), (240, 200));
}

#[test]
fn config_show_applies_overrides_to_defaults() {
    let root = TempDir::new().unwrap();

    let output = ripplefx(
        root.path(),
        &["config", "show", "--text-color", "#ff0000", "--intensity", "3"],
    );
    assert!(output.status.success());

    let config = EffectConfig::from_toml_str(&stdout(&output)).unwrap();
    assert_eq!(config.label.text_color.to_rgba8(), [255, 0, 0, 255]);
    assert_eq!(config.simulation.intensity, 3.0);
    assert_eq!(config.simulation.damping, EffectConfig::default().simulation.damping);
}

#[test]
fn discovered_config_file_is_loaded() {
    let root = TempDir::new().unwrap();
    let config_path = root.path().join("effect.toml");
    fs::write(
        &config_path,
        "[label]\ntext = \"Tide\"\n\n[simulation]\nripple_radius = 0.05\n",
    )
    .unwrap();

    let output = ripplefx(root.path(), &["config", "show"]);
    assert!(output.status.success());
    let config = EffectConfig::from_toml_str(&stdout(&output)).unwrap();
    assert_eq!(config.label.text, "Tide");
    assert_eq!(config.simulation.ripple_radius, 0.05);

    let output = ripplefx(root.path(), &["config", "path"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), config_path.display().to_string());
}

#[test]
fn config_path_reports_defaults_as_json() {
    let root = TempDir::new().unwrap();

    let output = ripplefx(root.path(), &["config", "path", "--json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["source"], "defaults");
}

#[test]
fn invalid_override_is_rejected() {
    let root = TempDir::new().unwrap();

    let output = ripplefx(root.path(), &["config", "show", "--damping", "1.5"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("simulation.damping"), "stderr: {stderr}");
}
