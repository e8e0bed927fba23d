//! Touch feedback renderer.
//!
//! Draws a small triangle under the finger while a touch is active. The GPU
//! API sits behind [`GraphicsBackend`]; the pipeline is built lazily on the
//! first frame and, if any step fails, the renderer falls back to clearing
//! the background for the rest of its lifetime.
use log::{debug, warn};
use strum::{Display, IntoStaticStr};
use thiserror::Error;

use crate::normalize::{NormalizedPoint, SurfaceSize};

pub const VERTEX_SHADER: &str = r"
attribute vec2 aPos;
uniform vec2 uOffset;
void main() {
    gl_Position = vec4(aPos + uOffset, 0.0, 1.0);
}
";

pub const FRAGMENT_SHADER: &str = r"
precision mediump float;
uniform vec4 uColor;
void main() {
    gl_FragColor = uColor;
}
";

/// Marker triangle in device units, centered on the origin.
pub const MARKER_VERTICES: [f32; 6] = [-0.018, -0.022, 0.018, -0.022, 0.000, 0.028];

/// Failure inside a [`GraphicsBackend`] call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("Program failed to link: {log}")]
    ProgramLink { log: String },

    #[error("Vertex buffer upload failed: {0}")]
    BufferUpload(String),

    #[error("Shader input '{0}' not found in linked program")]
    MissingLocation(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum ShaderStage {
    #[strum(serialize = "vertex")]
    Vertex,
    #[strum(serialize = "fragment")]
    Fragment,
}

/// RGBA, each channel in `[0,1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub [f32; 4]);

/// Colors used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    pub idle_background: Color,
    pub active_background: Color,
    pub marker: Color,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            idle_background: Color([0.02, 0.02, 0.03, 1.0]),
            active_background: Color([0.08, 0.14, 0.20, 1.0]),
            marker: Color([0.95, 0.86, 0.25, 1.0]),
        }
    }
}

/// What the renderer needs from the engine each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub point: NormalizedPoint,
    pub touch_down: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            point: NormalizedPoint::CENTER,
            touch_down: false,
        }
    }
}

/// Minimal GPU surface the renderer drives.
pub trait GraphicsBackend {
    type Shader;
    type Program;
    type Buffer;

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Self::Shader, BackendError>;
    fn delete_shader(&mut self, shader: Self::Shader);
    fn link_program(
        &mut self,
        vertex: &Self::Shader,
        fragment: &Self::Shader,
    ) -> Result<Self::Program, BackendError>;
    fn delete_program(&mut self, program: Self::Program);
    fn upload_vertices(&mut self, vertices: &[f32]) -> Result<Self::Buffer, BackendError>;
    fn delete_buffer(&mut self, buffer: Self::Buffer);
    fn attribute_location(&mut self, program: &Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(&mut self, program: &Self::Program, name: &str) -> Option<i32>;

    fn viewport(&mut self, width: u32, height: u32);
    fn clear(&mut self, color: Color);
    /// Draw `vertex_count` vertices of `pipeline` as triangles.
    fn draw_triangles(
        &mut self,
        pipeline: &Pipeline<Self>,
        vertex_count: usize,
        offset: [f32; 2],
        color: Color,
    );
}

/// Linked program, uploaded marker geometry and resolved shader inputs.
pub struct Pipeline<B: GraphicsBackend + ?Sized> {
    pub program: B::Program,
    pub vertices: B::Buffer,
    pub position_attribute: u32,
    pub offset_uniform: i32,
    pub color_uniform: i32,
}

enum PipelineState<B: GraphicsBackend> {
    Uninitialized,
    Ready(Pipeline<B>),
    Failed,
}

/// Renders engine state through a backend, one call per display tick.
///
/// The host supplies the backend bound to its GPU context; the `swipekey`
/// binary itself has no display and never builds one.
pub struct Renderer<B: GraphicsBackend> {
    backend: B,
    style: RenderStyle,
    pipeline: PipelineState<B>,
}

impl<B: GraphicsBackend> Renderer<B> {
    pub fn new(backend: B) -> Self {
        Self::with_style(backend, RenderStyle::default())
    }

    pub fn with_style(backend: B, style: RenderStyle) -> Self {
        Self {
            backend,
            style,
            pipeline: PipelineState::Uninitialized,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.pipeline, PipelineState::Ready(_))
    }

    /// Whether initialization was attempted and failed.
    pub fn is_degraded(&self) -> bool {
        matches!(self.pipeline, PipelineState::Failed)
    }

    /// Draw one frame.
    pub fn render(&mut self, state: &RenderState, surface: SurfaceSize) {
        self.ensure_pipeline();

        self.backend.viewport(surface.width(), surface.height());
        self.backend.clear(if state.touch_down {
            self.style.active_background
        } else {
            self.style.idle_background
        });

        if !state.touch_down {
            return;
        }
        let PipelineState::Ready(pipeline) = &self.pipeline else {
            return;
        };
        let (ox, oy) = state.point.to_device();
        self.backend.draw_triangles(
            pipeline,
            MARKER_VERTICES.len() / 2,
            [ox, oy],
            self.style.marker,
        );
    }

    fn ensure_pipeline(&mut self) {
        if !matches!(self.pipeline, PipelineState::Uninitialized) {
            return;
        }
        self.pipeline = match build_pipeline(&mut self.backend) {
            Ok(pipeline) => {
                debug!("Feedback pipeline ready");
                PipelineState::Ready(pipeline)
            }
            Err(e) => {
                warn!("Feedback rendering disabled: {e}");
                PipelineState::Failed
            }
        };
    }
}

fn build_pipeline<B: GraphicsBackend>(backend: &mut B) -> Result<Pipeline<B>, BackendError> {
    let vertex = backend.compile_shader(ShaderStage::Vertex, VERTEX_SHADER)?;
    let fragment = match backend.compile_shader(ShaderStage::Fragment, FRAGMENT_SHADER) {
        Ok(fragment) => fragment,
        Err(e) => {
            backend.delete_shader(vertex);
            return Err(e);
        }
    };

    let linked = backend.link_program(&vertex, &fragment);
    backend.delete_shader(vertex);
    backend.delete_shader(fragment);
    let program = linked?;

    let vertices = match backend.upload_vertices(&MARKER_VERTICES) {
        Ok(buffer) => buffer,
        Err(e) => {
            backend.delete_program(program);
            return Err(e);
        }
    };

    match locate_inputs(backend, &program) {
        Ok((position_attribute, offset_uniform, color_uniform)) => Ok(Pipeline {
            program,
            vertices,
            position_attribute,
            offset_uniform,
            color_uniform,
        }),
        Err(e) => {
            backend.delete_buffer(vertices);
            backend.delete_program(program);
            Err(e)
        }
    }
}

fn locate_inputs<B: GraphicsBackend>(
    backend: &mut B,
    program: &B::Program,
) -> Result<(u32, i32, i32), BackendError> {
    Ok((
        backend
            .attribute_location(program, "aPos")
            .ok_or(BackendError::MissingLocation("aPos"))?,
        backend
            .uniform_location(program, "uOffset")
            .ok_or(BackendError::MissingLocation("uOffset"))?,
        backend
            .uniform_location(program, "uColor")
            .ok_or(BackendError::MissingLocation("uColor"))?,
    ))
}
