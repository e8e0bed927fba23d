//! TOML configuration: raw serde structs, merged and validated into
//! [`AppConfig`].
//!
//! Example:
//!
//! ```toml
//! [global]
//! log_level = "info"
//!
//! [global.output]
//! commit_command = "xdotool type --clearmodifiers -- \"$1\""
//! backspace_command = "xdotool key BackSpace"
//!
//! [global.layout]
//! backspace_zone_end = 0.20
//! newline_zone_start = 0.80
//! rows = [
//!   { keys = "qwertyuiop", band_end = 0.33 },
//!   { keys = "asdfghjkl", band_end = 0.66 },
//!   { keys = "zxcvbnm,.", band_end = 0.80 },
//! ]
//!
//! [device.tablet]
//! device_usb_id = "1234:5678"
//! enabled = true
//!
//! [device.tablet.output]
//! preview_command = "notify-send \"$1\""
//! ```
//!
//! Command strings run through `sh -c`; the text is passed as `$1`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::layout::{KeyRow, KeyboardLayout};

/// Errors surfaced by configuration loading, layout validation and sinks.
#[derive(Debug, Error)]
pub enum SwipekeyError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    #[error("Invalid keyboard layout: {reason}")]
    InvalidLayout { reason: String },

    #[error("Invalid keyboard layout in [{scope}]: {reason}")]
    LayoutConfigError { scope: String, reason: String },

    #[error("No {event} handler available")]
    SinkUnavailable { event: &'static str },

    #[error("Failed to run command '{command}': {source}")]
    SinkCommandFailed {
        command: String,
        source: std::io::Error,
    },

    #[error("Cannot start output thread for {name}: {source}")]
    OutputThreadFailed {
        name: String,
        source: std::io::Error,
    },
}

/// Whole file as deserialized.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    global: RawGlobal,
    #[serde(default)]
    device: HashMap<String, RawDevice>,
}

/// `[global]`: logging plus defaults inherited by every device.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawGlobal {
    log_level: Option<String>,
    log_file: Option<String>,
    #[serde(default)]
    output: RawOutput,
    layout: Option<RawLayout>,
}

/// Output commands - all optional so device sections can partially override.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
struct RawOutput {
    commit_command: Option<String>,
    preview_command: Option<String>,
    backspace_command: Option<String>,
}

/// A `layout` table. Replaces the built-in layout as a whole.
#[derive(Debug, Deserialize, Clone)]
struct RawLayout {
    rows: Vec<RawRow>,
    backspace_zone_end: Option<f32>,
    newline_zone_start: Option<f32>,
}

#[derive(Debug, Deserialize, Clone)]
struct RawRow {
    keys: String,
    band_end: f32,
}

/// `[device.<id>]`.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawDevice {
    device_usb_id: Option<String>,
    enabled: Option<bool>,
    #[serde(default)]
    output: RawOutput,
    layout: Option<RawLayout>,
}

/// Shell commands run for each kind of text event. `None` drops the event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputCommands {
    pub commit_command: Option<String>,
    pub preview_command: Option<String>,
    pub backspace_command: Option<String>,
}

/// Everything a device worker needs.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub device_usb_id: String,
    pub output: OutputCommands,
    pub layout: KeyboardLayout,
}

#[derive(Debug)]
pub struct AppConfig {
    pub log_level: String,
    pub log_file: Option<String>,
    pub devices: HashMap<String, DeviceConfig>,
}

/// Generate field-wise merge and finalization for output command fields.
macro_rules! output_fields {
    ($($field:ident),+ $(,)?) => {
        impl RawOutput {
            fn merge_with_fallback(&self, fallback: &RawOutput) -> RawOutput {
                RawOutput {
                    $($field: self.$field.clone().or_else(|| fallback.$field.clone()),)+
                }
            }

            /// Empty strings disable a command inherited from `[global]`.
            fn into_commands(self) -> OutputCommands {
                OutputCommands {
                    $($field: self.$field.filter(|cmd| !cmd.trim().is_empty()),)+
                }
            }
        }
    };
}

output_fields!(commit_command, preview_command, backspace_command);

impl RawLayout {
    fn into_layout(self, scope: &str) -> Result<KeyboardLayout, SwipekeyError> {
        let defaults = KeyboardLayout::default();
        KeyboardLayout::new(
            self.rows
                .iter()
                .map(|row| KeyRow::new(&row.keys, row.band_end))
                .collect(),
            self.backspace_zone_end
                .unwrap_or(defaults.backspace_zone_end()),
            self.newline_zone_start
                .unwrap_or(defaults.newline_zone_start()),
        )
        .map_err(|e| match e {
            SwipekeyError::InvalidLayout { reason } => SwipekeyError::LayoutConfigError {
                scope: scope.to_string(),
                reason,
            },
            other => other,
        })
    }
}

/// Read, parse and resolve a config file. Disabled devices are dropped.
pub fn parse_config_file(path: &Path) -> Result<AppConfig, SwipekeyError> {
    let raw: RawConfig =
        toml::from_str(
            &fs::read_to_string(path).map_err(|e| SwipekeyError::ConfigReadError {
                path: path.to_path_buf(),
                source: e,
            })?,
        )
        .map_err(|e| SwipekeyError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let global_layout = match raw.global.layout.clone() {
        Some(layout) => layout.into_layout("global.layout")?,
        None => KeyboardLayout::default(),
    };

    let mut devices = HashMap::new();

    for (device_id, raw_dev) in &raw.device {
        if !raw_dev.enabled.unwrap_or(false) {
            debug!("[device.{device_id}] disabled");
            continue;
        }

        let Some(usb_id) = raw_dev.device_usb_id.as_deref().filter(|s| !s.is_empty()) else {
            warn!("[device.{device_id}] enabled without device_usb_id, ignored (see --list-devices)");
            continue;
        };

        let layout = match raw_dev.layout.clone() {
            Some(layout) => layout.into_layout(&format!("device.{device_id}.layout"))?,
            None => global_layout.clone(),
        };

        devices.insert(
            device_id.clone(),
            DeviceConfig {
                device_usb_id: usb_id.to_string(),
                output: raw_dev
                    .output
                    .merge_with_fallback(&raw.global.output)
                    .into_commands(),
                layout,
            },
        );
    }

    Ok(AppConfig {
        log_level: raw.global.log_level.unwrap_or_else(|| "info".to_string()),
        log_file: raw.global.log_file,
        devices,
    })
}
