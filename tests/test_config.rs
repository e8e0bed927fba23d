//! Tests for `swipekey::config` - TOML parsing, output command merging,
//! layout overrides, device filtering, and error handling.

use std::io::Write;
use tempfile::NamedTempFile;

use swipekey::config::{AppConfig, parse_config_file};
use swipekey::layout::KeyboardLayout;
use swipekey::normalize::NormalizedPoint;

// ── Helpers ──────────────────────────────────────────────────

/// A minimal enabled device section.
const ONE_DEVICE: &str = r#"
[device.pad]
device_usb_id = "1234:5678"
enabled = true
"#;

/// Write TOML to a temp file and parse it.
fn load(toml_content: &str) -> AppConfig {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(toml_content.as_bytes()).unwrap();
    f.flush().unwrap();
    parse_config_file(f.path()).unwrap()
}

/// Parse raw TOML that is expected to fail.
fn load_err(toml_content: &str) -> String {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(toml_content.as_bytes()).unwrap();
    f.flush().unwrap();
    parse_config_file(f.path()).unwrap_err().to_string()
}

// ── Error handling ───────────────────────────────────────────

#[test]
fn test_file_not_found() {
    let msg = parse_config_file(std::path::Path::new("/no/such/file.toml"))
        .unwrap_err()
        .to_string();
    assert!(msg.contains("Failed to read config file"));
    assert!(msg.contains("/no/such/file.toml"));
}

#[test]
fn test_invalid_toml() {
    let msg = load_err("this is not valid toml [[[");
    assert!(msg.contains("Failed to parse config file"));
}

#[test]
fn test_layout_with_descending_bands_rejected() {
    let msg = load_err(
        r#"
[global.layout]
rows = [
  { keys = "abc", band_end = 0.5 },
  { keys = "def", band_end = 0.4 },
]
"#,
    );
    assert!(msg.contains("global.layout"));
    assert!(msg.contains("row 2"));
}

#[test]
fn test_layout_with_empty_row_rejected() {
    let msg = load_err(
        r#"
[global.layout]
rows = [{ keys = "", band_end = 0.8 }]
"#,
    );
    assert!(msg.contains("row 1 has no keys"));
}

#[test]
fn test_layout_without_rows_rejected() {
    let msg = load_err(
        r#"
[global.layout]
rows = []
"#,
    );
    assert!(msg.contains("at least one key row"));
}

#[test]
fn test_crossed_action_zones_rejected() {
    let msg = load_err(
        r#"
[global.layout]
backspace_zone_end = 0.9
newline_zone_start = 0.1
rows = [{ keys = "abc", band_end = 0.8 }]
"#,
    );
    assert!(msg.contains("action zones"));
}

#[test]
fn test_invalid_device_layout_names_device() {
    let msg = load_err(
        r#"
[device.pad]
device_usb_id = "1234:5678"
enabled = true

[device.pad.layout]
rows = [{ keys = "abc", band_end = 1.5 }]
"#,
    );
    assert!(msg.contains("device.pad.layout"));
}

// ── Empty / minimal configs ──────────────────────────────────

#[test]
fn test_empty_config() {
    let cfg = load("");
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.log_file.is_none());
    assert!(cfg.devices.is_empty());
}

#[test]
fn test_global_log_settings() {
    let cfg = load(
        r#"
[global]
log_level = "debug"
log_file = "/tmp/swipekey.log"
"#,
    );
    assert_eq!(cfg.log_level, "debug");
    assert_eq!(cfg.log_file.as_deref(), Some("/tmp/swipekey.log"));
}

#[test]
fn test_unknown_keys_ignored() {
    let cfg = load(&format!(
        r#"
[global]
colour = "blue"
{ONE_DEVICE}
"#
    ));
    assert_eq!(cfg.devices.len(), 1);
}

// ── Device filtering ─────────────────────────────────────────

#[test]
fn test_device_disabled_by_default() {
    let cfg = load(
        r#"
[device.pad]
device_usb_id = "1234:5678"
"#,
    );
    assert!(cfg.devices.is_empty());
}

#[test]
fn test_device_without_usb_id_skipped() {
    let cfg = load(
        r#"
[device.pad]
enabled = true
"#,
    );
    assert!(cfg.devices.is_empty());
}

#[test]
fn test_device_with_empty_usb_id_skipped() {
    let cfg = load(
        r#"
[device.pad]
device_usb_id = ""
enabled = true
"#,
    );
    assert!(cfg.devices.is_empty());
}

#[test]
fn test_enabled_device_gets_default_layout() {
    let cfg = load(ONE_DEVICE);
    let pad = &cfg.devices["pad"];
    assert_eq!(pad.device_usb_id, "1234:5678");
    assert_eq!(pad.layout, KeyboardLayout::default());
    assert!(pad.output.commit_command.is_none());
}

// ── Output command merging ───────────────────────────────────

#[test]
fn test_device_inherits_global_output() {
    let cfg = load(&format!(
        r#"
[global.output]
commit_command = "xdotool type -- \"$1\""
backspace_command = "xdotool key BackSpace"
{ONE_DEVICE}
"#
    ));
    let out = &cfg.devices["pad"].output;
    assert_eq!(out.commit_command.as_deref(), Some("xdotool type -- \"$1\""));
    assert_eq!(out.backspace_command.as_deref(), Some("xdotool key BackSpace"));
    assert!(out.preview_command.is_none());
}

#[test]
fn test_device_overrides_single_output_field() {
    let cfg = load(
        r#"
[global.output]
commit_command = "global-commit"
preview_command = "global-preview"

[device.pad]
device_usb_id = "1234:5678"
enabled = true

[device.pad.output]
preview_command = "pad-preview"
"#,
    );
    let out = &cfg.devices["pad"].output;
    assert_eq!(out.commit_command.as_deref(), Some("global-commit"));
    assert_eq!(out.preview_command.as_deref(), Some("pad-preview"));
}

#[test]
fn test_empty_device_command_disables_global() {
    let cfg = load(
        r#"
[global.output]
preview_command = "global-preview"

[device.pad]
device_usb_id = "1234:5678"
enabled = true

[device.pad.output]
preview_command = ""
"#,
    );
    assert!(cfg.devices["pad"].output.preview_command.is_none());
}

#[test]
fn test_override_does_not_leak_to_other_devices() {
    let cfg = load(
        r#"
[global.output]
commit_command = "global-commit"

[device.a]
device_usb_id = "1111:2222"
enabled = true

[device.a.output]
commit_command = "a-commit"

[device.b]
device_usb_id = "3333:4444"
enabled = true
"#,
    );
    assert_eq!(
        cfg.devices["a"].output.commit_command.as_deref(),
        Some("a-commit")
    );
    assert_eq!(
        cfg.devices["b"].output.commit_command.as_deref(),
        Some("global-commit")
    );
}

// ── Layout overrides ─────────────────────────────────────────

#[test]
fn test_global_layout_applies_to_devices() {
    let cfg = load(&format!(
        r#"
[global.layout]
rows = [
  {{ keys = "abc", band_end = 0.5 }},
  {{ keys = "xyz", band_end = 0.9 }},
]
{ONE_DEVICE}
"#
    ));
    let layout = &cfg.devices["pad"].layout;
    assert_eq!(layout.rows().len(), 2);
    assert_eq!(layout.action_row_top(), 0.9);
    assert_eq!(layout.backspace_zone_end(), 0.20);
    assert_eq!(layout.newline_zone_start(), 0.80);
    assert_eq!(
        layout.resolve_key(NormalizedPoint { x: 0.9, y: 0.6 }),
        Some('z')
    );
}

#[test]
fn test_device_layout_replaces_global() {
    let cfg = load(
        r#"
[global.layout]
rows = [{ keys = "abc", band_end = 0.8 }]

[device.a]
device_usb_id = "1111:2222"
enabled = true

[device.a.layout]
backspace_zone_end = 0.1
rows = [{ keys = "qrs", band_end = 0.7 }]

[device.b]
device_usb_id = "3333:4444"
enabled = true
"#,
    );
    let a = &cfg.devices["a"].layout;
    assert_eq!(a.backspace_zone_end(), 0.1);
    assert_eq!(a.resolve_key(NormalizedPoint { x: 0.0, y: 0.0 }), Some('q'));

    let b = &cfg.devices["b"].layout;
    assert_eq!(b.resolve_key(NormalizedPoint { x: 0.0, y: 0.0 }), Some('a'));
}

// ── Full roundtrip ───────────────────────────────────────────

#[test]
fn test_full_config_roundtrip() {
    let cfg = load(
        r#"
[global]
log_level = "warn"

[global.output]
commit_command = "xdotool type --clearmodifiers -- \"$1\""
backspace_command = "xdotool key BackSpace"

[global.layout]
backspace_zone_end = 0.20
newline_zone_start = 0.80
rows = [
  { keys = "qwertyuiop", band_end = 0.33 },
  { keys = "asdfghjkl", band_end = 0.66 },
  { keys = "zxcvbnm,.", band_end = 0.80 },
]

[device.tablet]
device_usb_id = "USB:ABCD:0001"
enabled = true

[device.tablet.output]
preview_command = "notify-send \"$1\""

[device.spare]
device_usb_id = "1234:5678"
enabled = false
"#,
    );
    assert_eq!(cfg.log_level, "warn");
    assert_eq!(cfg.devices.len(), 1);
    let tablet = &cfg.devices["tablet"];
    assert_eq!(tablet.device_usb_id, "USB:ABCD:0001");
    assert_eq!(tablet.layout, KeyboardLayout::default());
    assert_eq!(
        tablet.output.preview_command.as_deref(),
        Some("notify-send \"$1\"")
    );
    assert!(tablet.output.commit_command.is_some());
}
