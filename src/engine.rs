//! The keyboard engine: one owned instance per touch surface.
//!
//! All entry points are synchronous and expect serialized calls from a
//! single thread (the host's input/render thread). There is no internal
//! locking; independent surfaces get independent engines.
use log::{debug, trace, warn};

use crate::config::SwipekeyError;
use crate::layout::KeyboardLayout;
use crate::normalize::{SurfaceSize, normalize};
use crate::recognizer::{GestureSession, SwipeRecognizer, TextEvent, TouchPhase};
use crate::render::{GraphicsBackend, RenderState, Renderer};
use crate::sink::{TextSink, deliver};

pub struct KeyboardEngine<S: TextSink> {
    surface: SurfaceSize,
    recognizer: SwipeRecognizer,
    render_state: RenderState,
    sink: S,
}

impl<S: TextSink> KeyboardEngine<S> {
    pub fn new(layout: KeyboardLayout, sink: S) -> Self {
        Self {
            surface: SurfaceSize::default(),
            recognizer: SwipeRecognizer::new(layout),
            render_state: RenderState::default(),
            sink,
        }
    }

    pub fn with_default_layout(sink: S) -> Self {
        Self::new(KeyboardLayout::default(), sink)
    }

    /// Update the surface size; both sides are clamped to at least 1.
    pub fn configure_surface(&mut self, width: i64, height: i64) {
        self.surface = SurfaceSize::new(width, height);
        debug!(
            "Surface configured: {}x{}",
            self.surface.width(),
            self.surface.height()
        );
    }

    /// Feed one touch sample. Invokes at most one sink callback.
    pub fn handle_touch(&mut self, phase: TouchPhase, x: f32, y: f32) {
        let point = normalize(x, y, self.surface);
        self.render_state = RenderState {
            point,
            touch_down: phase != TouchPhase::End,
        };

        if let Some(event) = self.recognizer.handle(phase, point) {
            self.emit(&event);
        }
    }

    /// Feed a sample tagged with a host action code (`0`/`1`/`2`).
    /// Unknown codes are ignored.
    pub fn handle_action(&mut self, code: i32, x: f32, y: f32) {
        match TouchPhase::from_action_code(code) {
            Some(phase) => self.handle_touch(phase, x, y),
            None => trace!("Ignoring touch action code {code}"),
        }
    }

    /// Draw the current touch state.
    pub fn render_frame<B: GraphicsBackend>(&self, renderer: &mut Renderer<B>) {
        renderer.render(&self.render_state, self.surface);
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render_state
    }

    pub fn session(&self) -> &GestureSession {
        self.recognizer.session()
    }

    pub fn layout(&self) -> &KeyboardLayout {
        self.recognizer.layout()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Sink failures lose the event, never the session state.
    fn emit(&mut self, event: &TextEvent) {
        let kind: &str = event.into();
        match deliver(&mut self.sink, event) {
            Ok(()) => trace!("Passed {kind} to sink"),
            Err(SwipekeyError::SinkUnavailable { .. }) => debug!("No sink for {kind}, dropped"),
            Err(e) => warn!("Dropped {kind}: {e}"),
        }
    }
}
