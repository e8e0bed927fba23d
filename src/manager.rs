//! Touchscreen discovery and per-device keyboard workers (I/O layer).
//!
//! Pure event-processing logic lives in [`crate::event`]; each worker thread
//! owns its own [`KeyboardEngine`] and never shares it.
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use evdev::{AbsoluteAxisType, Device};
use log::{debug, error, info, warn};

use crate::config::{AppConfig, DeviceConfig, SwipekeyError, parse_config_file};
use crate::engine::KeyboardEngine;
use crate::event::{SampleAssembler, classify_event, parse_usb_id};
use crate::sink::CommandSink;

const RECONNECT_ATTEMPTS: usize = 10;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

// -- KeyboardManager ------------------------------------------

/// Owns the parsed configuration and one worker thread per found device.
pub struct KeyboardManager {
    config: AppConfig,
    running: Arc<AtomicBool>,
}

impl KeyboardManager {
    pub fn new(config_path: impl AsRef<Path>) -> Result<Self, SwipekeyError> {
        let config = parse_config_file(config_path.as_ref())?;
        Ok(Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Spawn a worker per configured device and wait for all of them.
    pub fn start(&mut self) {
        if self.config.devices.is_empty() {
            error!("Configuration has no enabled [device.*] sections");
            return;
        }
        self.running.store(true, Ordering::Relaxed);

        let workers: Vec<_> = self
            .config
            .devices
            .iter()
            .filter_map(|(id, cfg)| {
                let device = find_device(id, cfg)?;
                DeviceWorker::new(id, cfg, device, Arc::clone(&self.running))
            })
            .filter_map(|worker| {
                thread::Builder::new()
                    .name(format!("keyboard-{}", worker.device_id))
                    .spawn(move || worker.run())
                    .inspect_err(|e| error!("Cannot spawn keyboard thread: {e}"))
                    .ok()
            })
            .collect();

        if workers.is_empty() {
            error!("None of the configured touchscreens are present");
            return;
        }
        info!("Keyboard running on {} device(s)", workers.len());

        for worker in workers {
            if worker.join().is_err() {
                error!("A keyboard thread panicked");
            }
        }
    }

    /// Flag cleared by the Ctrl-C handler to stop all workers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn config_log_level(&self) -> &str {
        &self.config.log_level
    }

    pub fn config_log_file(&self) -> Option<&str> {
        self.config.log_file.as_deref()
    }
}

// -- Discovery ------------------------------------------------

/// Multi-touch capable input devices with their device node paths.
fn touch_devices() -> impl Iterator<Item = (PathBuf, Device)> {
    evdev::enumerate().filter(|(_, device)| {
        device.supported_absolute_axes().is_some_and(|axes| {
            axes.contains(AbsoluteAxisType::ABS_MT_POSITION_X)
                && axes.contains(AbsoluteAxisType::ABS_MT_POSITION_Y)
        })
    })
}

fn find_device(device_id: &str, config: &DeviceConfig) -> Option<Device> {
    let Some((vendor, product)) = parse_usb_id(&config.device_usb_id) else {
        warn!(
            "[device.{device_id}] device_usb_id '{}' is not vendor:product hex",
            config.device_usb_id
        );
        return None;
    };

    let found = touch_devices().find(|(_, device)| {
        let id = device.input_id();
        (id.vendor(), id.product()) == (vendor, product)
    });
    match found {
        Some((path, device)) => {
            info!(
                "{device_id}: using {} at {}",
                device.name().unwrap_or("unnamed touchscreen"),
                path.display()
            );
            Some(device)
        }
        None => {
            warn!("{device_id}: no touchscreen {vendor:04x}:{product:04x} attached");
            None
        }
    }
}

// -- DeviceWorker ---------------------------------------------

/// Pixel extent of the multi-touch axes.
#[derive(Debug, Clone, Copy)]
struct TouchAxes {
    origin: (f32, f32),
    width: i64,
    height: i64,
}

fn read_axes(device_id: &str, device: &Device) -> Option<TouchAxes> {
    let abs = device
        .get_abs_state()
        .inspect_err(|e| error!("{device_id}: cannot read axis ranges: {e}"))
        .ok()?;
    let x = &abs[AbsoluteAxisType::ABS_MT_POSITION_X.0 as usize];
    let y = &abs[AbsoluteAxisType::ABS_MT_POSITION_Y.0 as usize];
    debug!(
        "{device_id}: x {}..{}, y {}..{}",
        x.minimum, x.maximum, y.minimum, y.maximum
    );
    Some(TouchAxes {
        origin: (x.minimum as f32, y.minimum as f32),
        width: i64::from(x.maximum) - i64::from(x.minimum),
        height: i64::from(y.maximum) - i64::from(y.minimum),
    })
}

/// One touchscreen feeding one keyboard engine.
struct DeviceWorker {
    device_id: String,
    config: DeviceConfig,
    device: Device,
    engine: KeyboardEngine<CommandSink>,
    assembler: SampleAssembler,
    running: Arc<AtomicBool>,
}

impl DeviceWorker {
    fn new(
        device_id: &str,
        config: &DeviceConfig,
        device: Device,
        running: Arc<AtomicBool>,
    ) -> Option<Self> {
        let sink = CommandSink::new(format!("swipekey-{device_id}"), config.output.clone())
            .inspect_err(|e| error!("{device_id}: {e}"))
            .ok()?;
        let mut worker = Self {
            device_id: device_id.to_string(),
            config: config.clone(),
            engine: KeyboardEngine::new(config.layout.clone(), sink),
            assembler: SampleAssembler::default(),
            device,
            running,
        };
        worker.adopt_axes()?;
        Some(worker)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Size the engine and assembler from the current device.
    fn adopt_axes(&mut self) -> Option<()> {
        let axes = read_axes(&self.device_id, &self.device)?;
        self.engine.configure_surface(axes.width, axes.height);
        self.assembler = SampleAssembler::new(axes.origin);
        Some(())
    }

    fn run(mut self) {
        info!(
            "{}: keyboard active (USB {})",
            self.device_id, self.config.device_usb_id
        );
        while self.is_running() {
            if let Err(e) = self.pump() {
                if !self.is_running() {
                    break;
                }
                warn!("{}: device lost: {e}", self.device_id);
                self.assembler.reset();
                if !self.reconnect() {
                    break;
                }
            }
        }
        debug!("{}: worker stopped", self.device_id);
    }

    /// Read one batch of events and feed complete samples to the engine.
    fn pump(&mut self) -> std::io::Result<()> {
        let events: Vec<_> = self.device.fetch_events()?.collect();
        for event in &events {
            let Some(sample) = classify_event(event).and_then(|te| self.assembler.push(&te))
            else {
                continue;
            };
            self.engine.handle_touch(sample.phase, sample.x, sample.y);
        }
        Ok(())
    }

    /// Poll for the device to come back. Returns whether it did.
    fn reconnect(&mut self) -> bool {
        for attempt in 1..=RECONNECT_ATTEMPTS {
            thread::sleep(RECONNECT_DELAY);
            if !self.is_running() {
                return false;
            }
            debug!(
                "{}: reconnect attempt {attempt}/{RECONNECT_ATTEMPTS}",
                self.device_id
            );
            if let Some(device) = find_device(&self.device_id, &self.config) {
                self.device = device;
                if self.adopt_axes().is_some() {
                    info!("{}: reconnected", self.device_id);
                    return true;
                }
            }
        }
        error!(
            "{}: giving up after {RECONNECT_ATTEMPTS} reconnect attempts",
            self.device_id
        );
        false
    }
}

// -- Listing --------------------------------------------------

/// Print every multi-touch device with the USB id to put in the config.
pub fn list_touch_devices() -> ExitCode {
    let devices: Vec<_> = touch_devices().collect();
    if devices.is_empty() {
        println!(
            "No multi-touch input devices are visible.\n\
             Devices under /dev/input usually need root or the 'input' group."
        );
        return ExitCode::FAILURE;
    }

    println!("Touchscreens usable by swipekey:\n");
    for (path, device) in &devices {
        let id = device.input_id();
        println!(
            "  {:04x}:{:04x}  {}  ({})",
            id.vendor(),
            id.product(),
            device.name().unwrap_or("unnamed"),
            path.display()
        );
    }
    println!(
        "\nEnable one in swipekey.toml:\n\n\
         \x20 [device.<name>]\n\
         \x20 device_usb_id = \"vvvv:pppp\"\n\
         \x20 enabled = true"
    );
    ExitCode::SUCCESS
}
