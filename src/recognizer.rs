//! Swipe/tap state machine for a single keyboard surface.
use log::{debug, trace};
use strum::{Display, EnumString, IntoStaticStr};

use crate::layout::{KeyboardLayout, TapTarget};
use crate::normalize::NormalizedPoint;

/// Phase of a touch sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum TouchPhase {
    #[strum(serialize = "begin")]
    Begin,
    #[strum(serialize = "move")]
    Move,
    #[strum(serialize = "end")]
    End,
}

impl TouchPhase {
    /// Decode the host's action codes (`0` down, `1` move, `2` up).
    pub fn from_action_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Begin),
            1 => Some(Self::Move),
            2 => Some(Self::End),
            _ => None,
        }
    }
}

/// Output of the recognizer, addressed to the text sink.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum TextEvent {
    /// Provisional swipe buffer; supersedes the previous preview.
    #[strum(serialize = "preview")]
    Preview(String),
    /// Final text for the interaction.
    #[strum(serialize = "commit")]
    Commit(String),
    #[strum(serialize = "backspace")]
    Backspace { whole_word: bool },
}

/// State of the touch between a Begin and its End.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GestureSession {
    active: bool,
    buffer: String,
    last_key: Option<char>,
}

impl GestureSession {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Keys accumulated so far, in the order they were crossed.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn last_key(&self) -> Option<char> {
        self.last_key
    }

    fn reset(&mut self) {
        self.active = false;
        self.buffer.clear();
        self.last_key = None;
    }

    /// Append `key` unless it repeats the previous one. Returns whether the
    /// buffer changed.
    fn push_key(&mut self, key: char) -> bool {
        if self.last_key == Some(key) {
            return false;
        }
        self.buffer.push(key);
        self.last_key = Some(key);
        true
    }
}

/// Turns normalized touch samples into preview/commit/backspace events.
#[derive(Debug, Clone, Default)]
pub struct SwipeRecognizer {
    layout: KeyboardLayout,
    session: GestureSession,
}

impl SwipeRecognizer {
    pub fn new(layout: KeyboardLayout) -> Self {
        Self {
            layout,
            session: GestureSession::default(),
        }
    }

    pub fn layout(&self) -> &KeyboardLayout {
        &self.layout
    }

    pub fn session(&self) -> &GestureSession {
        &self.session
    }

    /// Feed one sample. Returns at most one event for the text sink.
    pub fn handle(&mut self, phase: TouchPhase, point: NormalizedPoint) -> Option<TextEvent> {
        trace!("{phase} at ({:.3}, {:.3})", point.x, point.y);
        match phase {
            TouchPhase::Begin => self.begin(point),
            TouchPhase::Move if self.session.active => self.extend(point),
            TouchPhase::End if self.session.active => self.finish(point),
            TouchPhase::Move | TouchPhase::End => None,
        }
    }

    fn begin(&mut self, point: NormalizedPoint) -> Option<TextEvent> {
        if self.session.active {
            debug!("Begin while tracking, discarding '{}'", self.session.buffer);
        }
        self.session.reset();
        self.session.active = true;
        self.extend(point)
    }

    fn extend(&mut self, point: NormalizedPoint) -> Option<TextEvent> {
        let key = self.layout.resolve_key(point)?;
        self.session
            .push_key(key)
            .then(|| TextEvent::Preview(self.session.buffer.clone()))
    }

    fn finish(&mut self, point: NormalizedPoint) -> Option<TextEvent> {
        let event = if self.session.buffer.is_empty() {
            self.tap(point)
        } else {
            Some(TextEvent::Commit(std::mem::take(&mut self.session.buffer)))
        };
        debug!("Session finished: {event:?}");
        self.session.reset();
        event
    }

    fn tap(&self, point: NormalizedPoint) -> Option<TextEvent> {
        Some(match self.layout.classify_tap(point)? {
            TapTarget::Key(c) => TextEvent::Commit(c.to_string()),
            TapTarget::Backspace => TextEvent::Backspace { whole_word: true },
            TapTarget::Newline => TextEvent::Commit("\n".to_string()),
            TapTarget::Space => TextEvent::Commit(" ".to_string()),
        })
    }
}
