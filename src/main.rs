//! swipekey – swipe and tap keyboard for Linux touchscreens.
//!
//! CLI entry point.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::sync::atomic::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record};

use swipekey::manager::{KeyboardManager, list_touch_devices};

#[derive(Parser)]
#[command(name = "swipekey", about = "Swipe and tap keyboard for touchscreens")]
struct Cli {
    /// TOML configuration file
    #[arg(default_value = "/etc/swipekey/swipekey.toml")]
    config: PathBuf,

    /// Log at debug level regardless of the configured log_level
    #[arg(short, long)]
    verbose: bool,

    /// Print attached multi-touch devices and their USB ids, then exit
    #[arg(short, long)]
    list_devices: bool,
}

/// Writes `[secs LEVEL origin] message` lines to stderr and, if configured,
/// appends them to a log file.
struct SwipekeyLogger {
    level: LevelFilter,
    file: Option<Mutex<File>>,
}

impl SwipekeyLogger {
    fn with_file(&self, write: impl FnOnce(&mut File)) {
        if let Some(mut file) = self.file.as_ref().and_then(|m| m.lock().ok()) {
            write(&mut *file);
        }
    }
}

impl Log for SwipekeyLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("swipekey") && metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        // Worker threads are named `keyboard-<id>`.
        let current = std::thread::current();
        let origin = current.name().unwrap_or("swipekey");
        let line = format!("[{secs} {} {origin}] {}\n", record.level(), record.args());

        eprint!("{line}");
        self.with_file(|f| {
            let _ = f.write_all(line.as_bytes());
        });
    }

    fn flush(&self) {
        self.with_file(|f| {
            let _ = f.flush();
        });
    }
}

/// Install the global logger. `--verbose` wins over the configured level.
fn init_logging(cli: &Cli, manager: &KeyboardManager) -> Result<(), String> {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        let configured = manager.config_log_level();
        configured.parse().unwrap_or_else(|_| {
            eprintln!("Warning: unknown log_level '{configured}', using info");
            LevelFilter::Info
        })
    };

    let file = manager.config_log_file().and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .inspect_err(|e| eprintln!("Warning: logging to stderr only, cannot open '{path}': {e}"))
            .ok()
            .map(Mutex::new)
    });

    log::set_boxed_logger(Box::new(SwipekeyLogger { level, file }))
        .map_err(|e| format!("cannot install logger: {e}"))?;
    log::set_max_level(level);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.list_devices {
        return list_touch_devices();
    }

    // The config decides the log level, so it is read before logging starts.
    let mut manager = match KeyboardManager::new(&cli.config) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Error: {e}\n\nRun 'swipekey --list-devices' to find touchscreen USB ids.");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&cli, &manager) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let running = manager.running_flag();
    if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::Relaxed)) {
        log::error!("Cannot install Ctrl-C handler: {e}");
        return ExitCode::FAILURE;
    }

    log::info!("Using configuration {}", cli.config.display());
    manager.start();
    ExitCode::SUCCESS
}
