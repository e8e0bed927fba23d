//! Destinations for recognized text.
//!
//! The engine never decides how text reaches an editor; it hands every
//! [`TextEvent`] to a [`TextSink`] supplied by the host.
use std::io;
use std::process::Command;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::config::{OutputCommands, SwipekeyError};
use crate::recognizer::TextEvent;

/// Host-side receiver of recognized text.
///
/// An `Err` from any method is logged and dropped by the engine; the gesture
/// session advances regardless.
pub trait TextSink {
    /// Provisional swipe buffer. Each call carries the full buffer.
    fn on_preview(&mut self, text: &str) -> Result<(), SwipekeyError>;

    /// Final text for one interaction.
    fn on_commit(&mut self, text: &str) -> Result<(), SwipekeyError>;

    /// The action-row backspace tap sends `true`: delete back to the
    /// single-character boundary.
    fn on_backspace(&mut self, whole_word: bool) -> Result<(), SwipekeyError>;
}

impl<S: TextSink + ?Sized> TextSink for &mut S {
    fn on_preview(&mut self, text: &str) -> Result<(), SwipekeyError> {
        (**self).on_preview(text)
    }

    fn on_commit(&mut self, text: &str) -> Result<(), SwipekeyError> {
        (**self).on_commit(text)
    }

    fn on_backspace(&mut self, whole_word: bool) -> Result<(), SwipekeyError> {
        (**self).on_backspace(whole_word)
    }
}

impl<S: TextSink + ?Sized> TextSink for Box<S> {
    fn on_preview(&mut self, text: &str) -> Result<(), SwipekeyError> {
        (**self).on_preview(text)
    }

    fn on_commit(&mut self, text: &str) -> Result<(), SwipekeyError> {
        (**self).on_commit(text)
    }

    fn on_backspace(&mut self, whole_word: bool) -> Result<(), SwipekeyError> {
        (**self).on_backspace(whole_word)
    }
}

/// Route one event to the matching sink method.
pub fn deliver<S: TextSink + ?Sized>(sink: &mut S, event: &TextEvent) -> Result<(), SwipekeyError> {
    match event {
        TextEvent::Preview(text) => sink.on_preview(text),
        TextEvent::Commit(text) => sink.on_commit(text),
        TextEvent::Backspace { whole_word } => sink.on_backspace(*whole_word),
    }
}

/// One queued shell invocation.
#[derive(Debug)]
struct Job {
    event: &'static str,
    command: String,
    argument: String,
}

/// Runs a configured shell command per event, passing the text as `$1`.
///
/// Commands run one at a time, in event order, on a dedicated output
/// thread; the `on_*` methods only queue them and never wait for a child
/// process. Dropping the sink waits for the queued commands to finish.
#[derive(Debug)]
pub struct CommandSink {
    name: String,
    commands: OutputCommands,
    queue: Option<Sender<Job>>,
    output: Option<JoinHandle<()>>,
}

impl CommandSink {
    /// `name` is used as `$0` of the spawned shell, as the output thread
    /// name prefix and in log lines.
    pub fn new(name: impl Into<String>, commands: OutputCommands) -> Result<Self, SwipekeyError> {
        let name = name.into();
        let (queue, jobs) = mpsc::channel();
        let shell_name = name.clone();
        let output = thread::Builder::new()
            .name(format!("{name}-output"))
            .spawn(move || drain(&shell_name, jobs))
            .map_err(|source| SwipekeyError::OutputThreadFailed {
                name: name.clone(),
                source,
            })?;
        Ok(Self {
            name,
            commands,
            queue: Some(queue),
            output: Some(output),
        })
    }

    pub fn commands(&self) -> &OutputCommands {
        &self.commands
    }

    fn enqueue(
        &self,
        event: &'static str,
        command: Option<&str>,
        argument: &str,
    ) -> Result<(), SwipekeyError> {
        let command = command.ok_or(SwipekeyError::SinkUnavailable { event })?;
        let stopped = || SwipekeyError::SinkCommandFailed {
            command: command.to_string(),
            source: io::Error::other(format!("{} output thread has stopped", self.name)),
        };
        let queue = self.queue.as_ref().ok_or_else(stopped)?;
        queue
            .send(Job {
                event,
                command: command.to_string(),
                argument: argument.to_string(),
            })
            .map_err(|_| stopped())
    }
}

impl Drop for CommandSink {
    fn drop(&mut self) {
        // Closing the channel ends the output loop once the backlog is run.
        drop(self.queue.take());
        if let Some(output) = self.output.take() {
            if output.join().is_err() {
                warn!("{}: output thread panicked", self.name);
            }
        }
    }
}

fn drain(name: &str, jobs: Receiver<Job>) {
    for job in jobs {
        match run_command(name, &job.command, &job.argument) {
            Ok(()) => debug!("{name}: {} -> {}", job.event, job.command),
            Err(e) => warn!("{name}: {} not applied: {e}", job.event),
        }
    }
}

/// Run `command` through `sh -c` with `$0 = name` and `$1 = argument`,
/// waiting for it to exit. A non-zero exit status is an error.
pub fn run_command(name: &str, command: &str, argument: &str) -> Result<(), SwipekeyError> {
    let failed = |source: io::Error| SwipekeyError::SinkCommandFailed {
        command: command.to_string(),
        source,
    };
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .arg(name)
        .arg(argument)
        .status()
        .map_err(failed)?;
    if status.success() {
        Ok(())
    } else {
        Err(failed(io::Error::other(format!("exited with {status}"))))
    }
}

impl TextSink for CommandSink {
    fn on_preview(&mut self, text: &str) -> Result<(), SwipekeyError> {
        self.enqueue("preview", self.commands.preview_command.as_deref(), text)
    }

    fn on_commit(&mut self, text: &str) -> Result<(), SwipekeyError> {
        self.enqueue("commit", self.commands.commit_command.as_deref(), text)
    }

    /// `$1` is `char` for a single-character delete (`true`, what the
    /// action-row tap sends) and `word` otherwise.
    fn on_backspace(&mut self, whole_word: bool) -> Result<(), SwipekeyError> {
        let mode = if whole_word { "char" } else { "word" };
        self.enqueue("backspace", self.commands.backspace_command.as_deref(), mode)
    }
}
