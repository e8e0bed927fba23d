//! Touch event classification and sample assembly - no I/O, fully testable.
//!
//! evdev reports multi-touch state as a stream of per-axis updates closed by
//! `SYN_REPORT`. This module turns that stream into the Begin/Move/End
//! samples the engine consumes, following only the first finger down.

use crate::engine::KeyboardEngine;
use crate::recognizer::TouchPhase;
use crate::sink::TextSink;

// -- TouchEvent -----------------------------------------------

/// The slice of the evdev multi-touch protocol the assembler understands.
#[derive(Debug, Clone, PartialEq)]
pub enum TouchEvent {
    Slot(i32),
    PositionX(f32),
    PositionY(f32),
    TrackingId(i32),
    FingerUp,
    SynReport,
}

/// One touch sample in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    pub phase: TouchPhase,
    pub x: f32,
    pub y: f32,
}

// -- SampleAssembler ------------------------------------------

/// Buffers axis updates until `SYN_REPORT` and emits samples for the
/// primary finger.
#[derive(Debug, Clone, Default)]
pub struct SampleAssembler {
    origin: (f32, f32),
    current_slot: i32,
    primary_slot: Option<i32>,
    pending_x: Option<f32>,
    pending_y: Option<f32>,
    pending_begin: bool,
    last: (f32, f32),
}

impl SampleAssembler {
    /// `origin` is the axis minimum, subtracted from every raw position.
    pub fn new(origin: (f32, f32)) -> Self {
        Self {
            origin,
            ..Default::default()
        }
    }

    /// Whether a finger is currently being followed.
    pub fn is_touching(&self) -> bool {
        self.primary_slot.is_some() && !self.pending_begin
    }

    /// Drop all pending and tracked state, e.g. after a device reconnect.
    pub fn reset(&mut self) {
        *self = Self::new(self.origin);
    }

    fn on_primary(&self) -> bool {
        self.primary_slot.is_none_or(|slot| slot == self.current_slot)
    }

    fn apply_pending(&mut self) -> bool {
        if (self.pending_x, self.pending_y) == (None, None) {
            return false;
        }
        self.last = (
            self.pending_x.take().unwrap_or(self.last.0),
            self.pending_y.take().unwrap_or(self.last.1),
        );
        true
    }

    fn sample(&self, phase: TouchPhase) -> TouchSample {
        TouchSample {
            phase,
            x: self.last.0 - self.origin.0,
            y: self.last.1 - self.origin.1,
        }
    }

    /// Feed one event; returns a sample when one is complete.
    pub fn push(&mut self, event: &TouchEvent) -> Option<TouchSample> {
        match event {
            TouchEvent::Slot(slot) => {
                self.current_slot = *slot;
                None
            }
            // Closes the frame regardless of which slot is selected.
            TouchEvent::SynReport => {
                let moved = self.apply_pending();
                if self.pending_begin {
                    self.pending_begin = false;
                    Some(self.sample(TouchPhase::Begin))
                } else if moved && self.primary_slot.is_some() {
                    Some(self.sample(TouchPhase::Move))
                } else {
                    None
                }
            }
            _ if !self.on_primary() => None,
            TouchEvent::PositionX(x) => {
                self.pending_x = Some(*x);
                None
            }
            TouchEvent::PositionY(y) => {
                self.pending_y = Some(*y);
                None
            }
            TouchEvent::TrackingId(_) => {
                if self.primary_slot.is_none() {
                    self.primary_slot = Some(self.current_slot);
                    self.pending_begin = true;
                }
                None
            }
            TouchEvent::FingerUp => {
                self.primary_slot?;
                self.apply_pending();
                let was_begun = !self.pending_begin;
                self.primary_slot = None;
                self.pending_begin = false;
                was_begun.then(|| self.sample(TouchPhase::End))
            }
        }
    }
}

// -- Engine feed ----------------------------------------------

/// Feed a sequence of [`TouchEvent`]s through an assembler into an engine.
/// Returns the samples that were delivered.
pub fn process_touch_events<S: TextSink>(
    assembler: &mut SampleAssembler,
    engine: &mut KeyboardEngine<S>,
    events: &[TouchEvent],
) -> Vec<TouchSample> {
    let mut samples = Vec::new();
    for event in events {
        if let Some(sample) = assembler.push(event) {
            engine.handle_touch(sample.phase, sample.x, sample.y);
            samples.push(sample);
        }
    }
    samples
}

// -- evdev adapters -------------------------------------------

/// Parse `vendor:product` hex (optionally prefixed `usb:`, any case).
pub fn parse_usb_id(raw: &str) -> Option<(u16, u16)> {
    let raw = raw.trim();
    let ids = match raw.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("usb:") => &raw[4..],
        _ => raw,
    };
    let (vendor, product) = ids.split_once(':')?;
    Some((
        u16::from_str_radix(vendor, 16).ok()?,
        u16::from_str_radix(product, 16).ok()?,
    ))
}

/// Map the multi-touch axes and `SYN_REPORT` onto [`TouchEvent`]; everything
/// else is `None`.
pub fn classify_event(event: &evdev::InputEvent) -> Option<TouchEvent> {
    use evdev::{AbsoluteAxisType as Abs, InputEventKind, Synchronization};

    let value = event.value();
    match event.kind() {
        InputEventKind::Synchronization(Synchronization::SYN_REPORT) => {
            Some(TouchEvent::SynReport)
        }
        InputEventKind::AbsAxis(axis) => match axis {
            Abs::ABS_MT_SLOT => Some(TouchEvent::Slot(value)),
            Abs::ABS_MT_POSITION_X => Some(TouchEvent::PositionX(value as f32)),
            Abs::ABS_MT_POSITION_Y => Some(TouchEvent::PositionY(value as f32)),
            // -1 releases the slot.
            Abs::ABS_MT_TRACKING_ID if value < 0 => Some(TouchEvent::FingerUp),
            Abs::ABS_MT_TRACKING_ID => Some(TouchEvent::TrackingId(value)),
            _ => None,
        },
        _ => None,
    }
}
