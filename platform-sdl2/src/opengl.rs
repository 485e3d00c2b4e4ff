// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::ffi::{c_void, CStr};
use std::{cell::RefCell, rc::Rc};

use platform::{
    ClearOptions, Color, DepthFormat, DeviceBackend, GraphicsError, NativeBuffer,
    PresentationParameters, PrimitiveType, Rectangle, SetDataOptions, VertexDeclaration,
    VertexElementFormat, VertexElementUsage, Viewport,
};
use sdl2::{
    video::{GLContext, Window},
    VideoSubsystem,
};
use tracing::{debug, error, info, trace, warn};

use crate::{
    apply_window_parameters,
    gl::{self, FramebufferFns, GLenum, GLint, GLsizei, GLuint, Gl},
};

const POSITION_LOCATION: GLuint = 0;
const COLOR_LOCATION: GLuint = 1;
const FIRST_TEXTURE_COORDINATE_LOCATION: GLuint = 2;
const TEXTURE_COORDINATE_LOCATIONS: u32 = 4;

const VERTEX_SHADER_110: &CStr = c"#version 110
attribute vec4 a_position;
attribute vec4 a_color;
varying vec4 v_color;
void main() {
    gl_Position = a_position;
    v_color = a_color;
}
";

const FRAGMENT_SHADER_110: &CStr = c"#version 110
varying vec4 v_color;
void main() {
    gl_FragColor = v_color;
}
";

const VERTEX_SHADER_150: &CStr = c"#version 150
in vec4 a_position;
in vec4 a_color;
out vec4 v_color;
void main() {
    gl_Position = a_position;
    v_color = a_color;
}
";

const FRAGMENT_SHADER_150: &CStr = c"#version 150
in vec4 v_color;
out vec4 frag_color;
void main() {
    frag_color = v_color;
}
";

/// Settings for [`OpenGlBackend::new`], decided by the platform.
#[derive(Debug, Clone, Copy)]
pub struct OpenGlOptions {
    /// True if the context was requested as a 3.2 core profile context.
    pub core_profile: bool,
    /// True if adaptive vsync (swap interval -1) may be requested.
    pub late_swap_tear: bool,
    /// True if fullscreen uses a borderless desktop-sized window instead of
    /// an exclusive mode change.
    pub desktop_space_fullscreen: bool,
}

/// The vertex attribute setup last sent to GL, to skip redundant
/// `glVertexAttribPointer` calls.
#[derive(Debug, Clone, PartialEq)]
struct AttributeSetup {
    buffer: Option<NativeBuffer>,
    byte_offset: usize,
    declaration: VertexDeclaration,
}

/// Renderbuffers standing in for the window's framebuffer, so the back
/// buffer size doesn't have to match the window.
struct FauxBackBuffer {
    framebuffer: GLuint,
    color: GLuint,
    depth_stencil: Option<GLuint>,
    depth_format: DepthFormat,
    width: GLsizei,
    height: GLsizei,
}

impl FauxBackBuffer {
    fn new(
        fb: FramebufferFns,
        width: GLsizei,
        height: GLsizei,
        depth_format: DepthFormat,
    ) -> Result<FauxBackBuffer, GraphicsError> {
        let mut framebuffer = 0;
        let mut color = 0;
        // Safety: the context is current, and the names written into are
        // valid for one element each.
        unsafe {
            (fb.GenFramebuffers)(1, &mut framebuffer);
            (fb.BindFramebuffer)(gl::FRAMEBUFFER, framebuffer);
            (fb.GenRenderbuffers)(1, &mut color);
            (fb.FramebufferRenderbuffer)(
                gl::FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                gl::RENDERBUFFER,
                color,
            );
        }
        let depth_stencil = renderbuffer_format(depth_format).map(|(_, attachment)| {
            let mut renderbuffer = 0;
            // Safety: as above.
            unsafe {
                (fb.GenRenderbuffers)(1, &mut renderbuffer);
                (fb.FramebufferRenderbuffer)(
                    gl::FRAMEBUFFER,
                    attachment,
                    gl::RENDERBUFFER,
                    renderbuffer,
                );
            }
            renderbuffer
        });

        let mut back_buffer = FauxBackBuffer {
            framebuffer,
            color,
            depth_stencil,
            depth_format,
            width,
            height,
        };
        back_buffer.resize(fb, width, height);

        // Safety: the framebuffer is bound.
        let status = unsafe { (fb.CheckFramebufferStatus)(gl::FRAMEBUFFER) };
        if status != gl::FRAMEBUFFER_COMPLETE {
            back_buffer.delete(fb);
            return Err(GraphicsError::Native(format!(
                "the back buffer framebuffer is incomplete (status 0x{status:X})"
            )));
        }
        Ok(back_buffer)
    }

    /// Reallocates the renderbuffers' storage without recreating them.
    fn resize(&mut self, fb: FramebufferFns, width: GLsizei, height: GLsizei) {
        // Safety: the renderbuffers are alive.
        unsafe {
            (fb.BindRenderbuffer)(gl::RENDERBUFFER, self.color);
            (fb.RenderbufferStorage)(gl::RENDERBUFFER, gl::RGBA8, width, height);
            if let (Some(renderbuffer), Some((format, _))) =
                (self.depth_stencil, renderbuffer_format(self.depth_format))
            {
                (fb.BindRenderbuffer)(gl::RENDERBUFFER, renderbuffer);
                (fb.RenderbufferStorage)(gl::RENDERBUFFER, format, width, height);
            }
            (fb.BindRenderbuffer)(gl::RENDERBUFFER, 0);
        }
        self.width = width;
        self.height = height;
    }

    fn delete(self, fb: FramebufferFns) {
        // Safety: the names were created by this back buffer and are
        // deleted once, since this consumes it.
        unsafe {
            (fb.BindFramebuffer)(gl::FRAMEBUFFER, 0);
            (fb.DeleteFramebuffers)(1, &self.framebuffer);
            (fb.DeleteRenderbuffers)(1, &self.color);
            if let Some(depth_stencil) = &self.depth_stencil {
                (fb.DeleteRenderbuffers)(1, depth_stencil);
            }
        }
    }
}

/// A [`DeviceBackend`] drawing with OpenGL 2.1, or 3.2 core profile, through
/// an SDL GL context.
pub struct OpenGlBackend {
    gl: Gl,
    window: Option<Rc<RefCell<Window>>>,
    context: Option<GLContext>,
    options: OpenGlOptions,
    program: GLuint,
    vertex_array: Option<GLuint>,
    back_buffer: Option<FauxBackBuffer>,
    /// Height of the current render target, for flipping rectangles into
    /// GL's bottom-left origin.
    target_height: i32,
    bound_buffer: Option<NativeBuffer>,
    attributes: Option<AttributeSetup>,
    enabled_attributes: u32,
}

impl OpenGlBackend {
    /// Creates a GL context for the window and loads the GL entry points.
    ///
    /// The window must have been created with the `SDL_WINDOW_OPENGL` flag,
    /// after the GL attributes were set.
    pub fn new(
        video: &VideoSubsystem,
        window: Rc<RefCell<Window>>,
        options: OpenGlOptions,
    ) -> Result<OpenGlBackend, GraphicsError> {
        let context = {
            let window = window.borrow();
            let context = window
                .gl_create_context()
                .map_err(GraphicsError::DeviceCreation)?;
            window
                .gl_make_current(&context)
                .map_err(GraphicsError::DeviceCreation)?;
            context
        };

        let gl = Gl::load(|name| video.gl_get_proc_address(name) as *const c_void)?;
        info!(
            "OpenGL context: {} ({}, {})",
            gl_string(&gl, gl::VERSION),
            gl_string(&gl, gl::RENDERER),
            gl_string(&gl, gl::VENDOR),
        );

        let vertex_array = if options.core_profile {
            let vao = gl
                .vertex_arrays()
                .ok_or(GraphicsError::MissingEntryPoint("glGenVertexArrays"))?;
            let mut vertex_array = 0;
            // Safety: the context is current.
            unsafe {
                (vao.GenVertexArrays)(1, &mut vertex_array);
                (vao.BindVertexArray)(vertex_array);
            }
            Some(vertex_array)
        } else {
            None
        };

        if cfg!(debug_assertions) {
            if let Some(debug_message_callback) = gl.DebugMessageCallback {
                // Safety: the callback is a plain function which ignores the
                // null user parameter.
                unsafe {
                    (gl.Enable)(gl::DEBUG_OUTPUT);
                    (gl.Enable)(gl::DEBUG_OUTPUT_SYNCHRONOUS);
                    debug_message_callback(Some(forward_debug_message), core::ptr::null());
                }
                debug!("Forwarding GL debug output to tracing");
            }
        }

        let program = if options.core_profile {
            compile_program(&gl, VERTEX_SHADER_150, FRAGMENT_SHADER_150)?
        } else {
            compile_program(&gl, VERTEX_SHADER_110, FRAGMENT_SHADER_110)?
        };
        // Safety: the program was just linked successfully.
        unsafe {
            (gl.UseProgram)(program);
            // Vertices without a color element are drawn white.
            (gl.VertexAttrib4f)(COLOR_LOCATION, 1.0, 1.0, 1.0, 1.0);
            (gl.Enable)(gl::SCISSOR_TEST);
        }

        Ok(OpenGlBackend {
            gl,
            window: Some(window),
            context: Some(context),
            options,
            program,
            vertex_array,
            back_buffer: None,
            target_height: 0,
            bound_buffer: None,
            attributes: None,
            enabled_attributes: 0,
        })
    }

    fn check_error(&self, operation: &str) -> Result<(), GraphicsError> {
        // Safety: glGetError has no preconditions.
        let error = unsafe { (self.gl.GetError)() };
        if error == gl::NO_ERROR {
            Ok(())
        } else {
            Err(GraphicsError::Native(format!(
                "{operation} failed with GL error 0x{error:X}"
            )))
        }
    }

    fn bind_buffer(&mut self, buffer: Option<NativeBuffer>) {
        let name = buffer.map(|buffer| buffer.inner() as GLuint).unwrap_or(0);
        // Safety: the name is either 0 or a live buffer.
        unsafe { (self.gl.BindBuffer)(gl::ARRAY_BUFFER, name) };
        self.bound_buffer = buffer;
    }

    /// Points the vertex attributes at the bound buffer, starting at
    /// `byte_offset`, unless they already point there.
    fn apply_attributes(&mut self, byte_offset: usize, declaration: &VertexDeclaration) {
        let setup = AttributeSetup {
            buffer: self.bound_buffer,
            byte_offset,
            declaration: declaration.clone(),
        };
        if self.attributes.as_ref() == Some(&setup) {
            trace!("Vertex attributes already set up, skipping");
            return;
        }

        let stride = declaration.stride() as GLsizei;
        let mut enabled = 0u32;
        for element in declaration.elements() {
            let Some(location) = attribute_location(element.usage, element.usage_index) else {
                continue;
            };
            let (size, kind, normalized) = attribute_format(element.format);
            let pointer = (byte_offset + element.offset) as *const c_void;
            // Safety: the pointer is an offset into the bound buffer.
            unsafe {
                (self.gl.EnableVertexAttribArray)(location);
                (self.gl.VertexAttribPointer)(location, size, kind, normalized, stride, pointer);
            }
            enabled |= 1 << location;
        }
        let stale = self.enabled_attributes & !enabled;
        for location in 0..u32::BITS {
            if stale & (1 << location) != 0 {
                // Safety: the location was enabled previously.
                unsafe { (self.gl.DisableVertexAttribArray)(location) };
            }
        }
        self.enabled_attributes = enabled;
        self.attributes = Some(setup);
    }

    fn apply_window_parameters(
        &mut self,
        parameters: &PresentationParameters,
    ) -> Result<(), GraphicsError> {
        match &self.window {
            Some(window) => {
                apply_window_parameters(window, parameters, self.options.desktop_space_fullscreen)
            }
            None => Err(GraphicsError::Native(String::from(
                "the OpenGL backend has been disposed",
            ))),
        }
    }
}

impl DeviceBackend for OpenGlBackend {
    fn name(&self) -> &'static str {
        "opengl"
    }

    fn is_core_profile(&self) -> bool {
        self.options.core_profile
    }

    fn supports_late_swap_tear(&self) -> bool {
        self.options.late_swap_tear
    }

    fn create_vertex_buffer(
        &mut self,
        size_in_bytes: usize,
        dynamic: bool,
    ) -> Result<NativeBuffer, GraphicsError> {
        let mut name = 0;
        let usage = if dynamic {
            gl::STREAM_DRAW
        } else {
            gl::STATIC_DRAW
        };
        // Safety: the data pointer may be null, which leaves the storage
        // uninitialized.
        unsafe {
            (self.gl.GenBuffers)(1, &mut name);
            (self.gl.BindBuffer)(gl::ARRAY_BUFFER, name);
            (self.gl.BufferData)(
                gl::ARRAY_BUFFER,
                size_in_bytes as isize,
                core::ptr::null(),
                usage,
            );
        }
        let buffer = NativeBuffer::new(name as u64);
        self.bound_buffer = Some(buffer);
        if let Err(err) = self.check_error("glBufferData") {
            self.destroy_vertex_buffer(buffer);
            return Err(err);
        }
        debug!("Created GL buffer {name} ({size_in_bytes} bytes, dynamic: {dynamic})");
        Ok(buffer)
    }

    fn bind_vertex_buffer(&mut self, buffer: Option<NativeBuffer>) {
        self.bind_buffer(buffer);
    }

    fn set_vertex_buffer_data(
        &mut self,
        buffer: NativeBuffer,
        offset_in_bytes: usize,
        data: &[u8],
        buffer_size: usize,
        options: SetDataOptions,
    ) -> Result<(), GraphicsError> {
        if self.bound_buffer != Some(buffer) {
            self.bind_buffer(Some(buffer));
        }
        // Safety: the buffer is bound, and the device has checked that the
        // range fits in it.
        unsafe {
            if options == SetDataOptions::Discard {
                (self.gl.BufferData)(
                    gl::ARRAY_BUFFER,
                    buffer_size as isize,
                    core::ptr::null(),
                    gl::STREAM_DRAW,
                );
            }
            (self.gl.BufferSubData)(
                gl::ARRAY_BUFFER,
                offset_in_bytes as isize,
                data.len() as isize,
                data.as_ptr().cast(),
            );
        }
        self.check_error("glBufferSubData")
    }

    fn destroy_vertex_buffer(&mut self, buffer: NativeBuffer) {
        let name = buffer.inner() as GLuint;
        // Safety: deleting a bound buffer unbinds it.
        unsafe { (self.gl.DeleteBuffers)(1, &name) };
        if self.bound_buffer == Some(buffer) {
            self.bound_buffer = None;
        }
        if self
            .attributes
            .as_ref()
            .is_some_and(|setup| setup.buffer == Some(buffer))
        {
            self.attributes = None;
        }
    }

    fn draw_primitives(
        &mut self,
        primitive: PrimitiveType,
        declaration: &VertexDeclaration,
        base_vertex: usize,
        vertex_start: usize,
        vertex_count: usize,
    ) -> Result<(), GraphicsError> {
        if self.bound_buffer.is_none() {
            return Err(GraphicsError::NoVertexBuffer);
        }
        self.apply_attributes(base_vertex * declaration.stride(), declaration);
        // Safety: the device has checked the vertex range against the
        // buffer.
        unsafe {
            (self.gl.DrawArrays)(
                primitive_mode(primitive),
                vertex_start as GLint,
                vertex_count as GLsizei,
            );
        }
        self.check_error("glDrawArrays")
    }

    fn draw_user_primitives(
        &mut self,
        primitive: PrimitiveType,
        declaration: &VertexDeclaration,
        vertex_data: &[u8],
        vertex_count: usize,
    ) -> Result<(), GraphicsError> {
        let mut name = 0;
        // Safety: the data is copied by glBufferData before it returns.
        unsafe {
            (self.gl.GenBuffers)(1, &mut name);
            (self.gl.BindBuffer)(gl::ARRAY_BUFFER, name);
            (self.gl.BufferData)(
                gl::ARRAY_BUFFER,
                vertex_data.len() as isize,
                vertex_data.as_ptr().cast(),
                gl::STREAM_DRAW,
            );
        }
        let buffer = NativeBuffer::new(name as u64);
        self.bound_buffer = Some(buffer);
        self.attributes = None;
        self.apply_attributes(0, declaration);
        // Safety: the temporary buffer holds exactly vertex_count vertices.
        unsafe {
            (self.gl.DrawArrays)(primitive_mode(primitive), 0, vertex_count as GLsizei);
        }
        let result = self.check_error("drawing user primitives");
        self.bind_buffer(None);
        self.destroy_vertex_buffer(buffer);
        result
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        let (x, y, width, height) = flip_rectangle(&viewport.bounds(), self.target_height);
        // Safety: plain state setters.
        unsafe {
            (self.gl.Viewport)(x, y, width, height);
            (self.gl.DepthRange)(viewport.min_depth as f64, viewport.max_depth as f64);
        }
    }

    fn set_scissor_rectangle(&mut self, scissor_rectangle: &Rectangle) {
        let (x, y, width, height) = flip_rectangle(scissor_rectangle, self.target_height);
        // Safety: plain state setter.
        unsafe { (self.gl.Scissor)(x, y, width, height) };
    }

    fn set_clear_color(&mut self, color: Color) {
        let [r, g, b, a] = color.to_floats();
        // Safety: plain state setter.
        unsafe { (self.gl.ClearColor)(r, g, b, a) };
    }

    fn set_clear_depth(&mut self, depth: f32) {
        // Safety: plain state setter.
        unsafe { (self.gl.ClearDepth)(depth as f64) };
    }

    fn set_clear_stencil(&mut self, stencil: i32) {
        // Safety: plain state setter.
        unsafe { (self.gl.ClearStencil)(stencil) };
    }

    fn clear(&mut self, options: ClearOptions) {
        let mut mask = 0;
        if options.contains(ClearOptions::TARGET) {
            mask |= gl::COLOR_BUFFER_BIT;
        }
        if options.contains(ClearOptions::DEPTH_BUFFER) {
            mask |= gl::DEPTH_BUFFER_BIT;
        }
        if options.contains(ClearOptions::STENCIL) {
            mask |= gl::STENCIL_BUFFER_BIT;
        }
        // Clears are clipped by the scissor test, so it's off for the clear.
        // Safety: plain state changes and a clear of the current target.
        unsafe {
            (self.gl.Disable)(gl::SCISSOR_TEST);
            (self.gl.Clear)(mask);
            (self.gl.Enable)(gl::SCISSOR_TEST);
        }
    }

    fn reset_back_buffer(
        &mut self,
        parameters: &PresentationParameters,
    ) -> Result<(), GraphicsError> {
        self.apply_window_parameters(parameters)?;

        let width = parameters.back_buffer_width as GLsizei;
        let height = parameters.back_buffer_height as GLsizei;
        if let Some(fb) = self.gl.framebuffers() {
            let depth_format = parameters.depth_stencil_format;
            match &mut self.back_buffer {
                Some(back_buffer) if back_buffer.depth_format == depth_format => {
                    debug!("Resizing the back buffer to {width}x{height}");
                    back_buffer.resize(fb, width, height);
                }
                back_buffer => {
                    if let Some(old_back_buffer) = back_buffer.take() {
                        old_back_buffer.delete(fb);
                    }
                    debug!("Creating a {width}x{height} back buffer with {depth_format:?}");
                    *back_buffer = Some(FauxBackBuffer::new(fb, width, height, depth_format)?);
                }
            }
        } else {
            trace!("No framebuffer objects, drawing straight into the window");
        }
        self.target_height = height;
        self.check_error("resetting the back buffer")
    }

    fn set_swap_interval(&mut self, interval: i32) -> Result<(), GraphicsError> {
        // Safety: the context is current.
        let result = unsafe { sdl2_sys::SDL_GL_SetSwapInterval(interval) };
        if result < 0 {
            Err(GraphicsError::Native(sdl2::get_error()))
        } else {
            Ok(())
        }
    }

    fn present(&mut self) -> Result<(), GraphicsError> {
        let Some(window) = &self.window else {
            return Err(GraphicsError::Native(String::from(
                "the OpenGL backend has been disposed",
            )));
        };
        let window = window.borrow();
        match (&self.back_buffer, self.gl.framebuffers()) {
            (Some(back_buffer), Some(fb)) => {
                let (window_width, window_height) = window.drawable_size();
                // Safety: both framebuffers are alive, and the scissor test
                // would clip the blit.
                unsafe {
                    (self.gl.Disable)(gl::SCISSOR_TEST);
                    (fb.BindFramebuffer)(gl::READ_FRAMEBUFFER, back_buffer.framebuffer);
                    (fb.BindFramebuffer)(gl::DRAW_FRAMEBUFFER, 0);
                    (fb.BlitFramebuffer)(
                        0,
                        0,
                        back_buffer.width,
                        back_buffer.height,
                        0,
                        0,
                        window_width as GLint,
                        window_height as GLint,
                        gl::COLOR_BUFFER_BIT,
                        gl::NEAREST,
                    );
                }
                window.gl_swap_window();
                // Safety: as above.
                unsafe {
                    (fb.BindFramebuffer)(gl::FRAMEBUFFER, back_buffer.framebuffer);
                    (self.gl.Enable)(gl::SCISSOR_TEST);
                }
            }
            _ => window.gl_swap_window(),
        }
        drop(window);
        self.check_error("presenting")
    }

    fn dispose(&mut self) {
        if self.context.is_none() {
            return;
        }
        // Safety: the context is still alive, and every name is deleted
        // exactly once since the context is dropped right after.
        unsafe {
            (self.gl.UseProgram)(0);
            (self.gl.DeleteProgram)(self.program);
            if let (Some(vertex_array), Some(vao)) = (self.vertex_array, self.gl.vertex_arrays()) {
                (vao.BindVertexArray)(0);
                (vao.DeleteVertexArrays)(1, &vertex_array);
            }
        }
        if let (Some(back_buffer), Some(fb)) = (self.back_buffer.take(), self.gl.framebuffers()) {
            back_buffer.delete(fb);
        }
        self.context = None;
        self.window = None;
        debug!("Disposed the OpenGL context");
    }
}

/// Where the attribute of the given usage is bound in the pass-through
/// program. Usages the program has no input for are skipped.
pub(crate) fn attribute_location(usage: VertexElementUsage, usage_index: u32) -> Option<GLuint> {
    match (usage, usage_index) {
        (VertexElementUsage::Position, 0) => Some(POSITION_LOCATION),
        (VertexElementUsage::Color, 0) => Some(COLOR_LOCATION),
        (VertexElementUsage::TextureCoordinate, index) if index < TEXTURE_COORDINATE_LOCATIONS => {
            Some(FIRST_TEXTURE_COORDINATE_LOCATION + index)
        }
        _ => None,
    }
}

/// The component count, component type and normalization flag of a vertex
/// element format, as passed to `glVertexAttribPointer`.
pub(crate) fn attribute_format(format: VertexElementFormat) -> (GLint, GLenum, gl::GLboolean) {
    match format {
        VertexElementFormat::Single => (1, gl::FLOAT, gl::FALSE),
        VertexElementFormat::Vector2 => (2, gl::FLOAT, gl::FALSE),
        VertexElementFormat::Vector3 => (3, gl::FLOAT, gl::FALSE),
        VertexElementFormat::Vector4 => (4, gl::FLOAT, gl::FALSE),
        VertexElementFormat::Color => (4, gl::UNSIGNED_BYTE, gl::TRUE),
        VertexElementFormat::Byte4 => (4, gl::UNSIGNED_BYTE, gl::FALSE),
        VertexElementFormat::Short2 => (2, gl::SHORT, gl::FALSE),
        VertexElementFormat::Short4 => (4, gl::SHORT, gl::FALSE),
        VertexElementFormat::NormalizedShort2 => (2, gl::SHORT, gl::TRUE),
        VertexElementFormat::NormalizedShort4 => (4, gl::SHORT, gl::TRUE),
        VertexElementFormat::HalfVector2 => (2, gl::HALF_FLOAT, gl::FALSE),
        VertexElementFormat::HalfVector4 => (4, gl::HALF_FLOAT, gl::FALSE),
    }
}

/// The renderbuffer format and framebuffer attachment point for a depth
/// format, or `None` if no depth buffer is needed.
pub(crate) fn renderbuffer_format(depth_format: DepthFormat) -> Option<(GLenum, GLenum)> {
    match depth_format {
        DepthFormat::None => None,
        DepthFormat::Depth16 => Some((gl::DEPTH_COMPONENT16, gl::DEPTH_ATTACHMENT)),
        DepthFormat::Depth24 => Some((gl::DEPTH_COMPONENT24, gl::DEPTH_ATTACHMENT)),
        DepthFormat::Depth24Stencil8 => Some((gl::DEPTH24_STENCIL8, gl::DEPTH_STENCIL_ATTACHMENT)),
    }
}

pub(crate) fn primitive_mode(primitive: PrimitiveType) -> GLenum {
    match primitive {
        PrimitiveType::TriangleList => gl::TRIANGLES,
        PrimitiveType::TriangleStrip => gl::TRIANGLE_STRIP,
        PrimitiveType::LineList => gl::LINES,
        PrimitiveType::LineStrip => gl::LINE_STRIP,
        PrimitiveType::PointList => gl::POINTS,
    }
}

/// Converts a top-left origin rectangle into GL's bottom-left origin
/// `(x, y, width, height)` for a target `target_height` pixels tall.
pub(crate) fn flip_rectangle(
    rectangle: &Rectangle,
    target_height: i32,
) -> (GLint, GLint, GLsizei, GLsizei) {
    (
        rectangle.x,
        target_height - rectangle.bottom(),
        rectangle.width,
        rectangle.height,
    )
}

fn gl_string(gl: &Gl, name: GLenum) -> String {
    // Safety: glGetString returns null or a static NUL-terminated string.
    let ptr = unsafe { (gl.GetString)(name) };
    if ptr.is_null() {
        String::from("unknown")
    } else {
        // Safety: checked for null above.
        unsafe { CStr::from_ptr(ptr.cast()) }
            .to_string_lossy()
            .into_owned()
    }
}

fn compile_shader(gl: &Gl, kind: GLenum, source: &CStr) -> Result<GLuint, GraphicsError> {
    // Safety: the source is NUL-terminated, so no length array is needed.
    unsafe {
        let shader = (gl.CreateShader)(kind);
        let source_ptr = source.as_ptr();
        (gl.ShaderSource)(shader, 1, &source_ptr, core::ptr::null());
        (gl.CompileShader)(shader);
        let mut status = 0;
        (gl.GetShaderiv)(shader, gl::COMPILE_STATUS, &mut status);
        if status == 0 {
            let mut log_length = 0;
            (gl.GetShaderiv)(shader, gl::INFO_LOG_LENGTH, &mut log_length);
            let mut log = vec![0u8; log_length.max(1) as usize];
            (gl.GetShaderInfoLog)(shader, log.len() as GLsizei, core::ptr::null_mut(), log.as_mut_ptr().cast());
            (gl.DeleteShader)(shader);
            return Err(GraphicsError::Native(format!(
                "shader compilation failed: {}",
                info_log_to_string(&log),
            )));
        }
        Ok(shader)
    }
}

fn compile_program(
    gl: &Gl,
    vertex_source: &CStr,
    fragment_source: &CStr,
) -> Result<GLuint, GraphicsError> {
    let vertex_shader = compile_shader(gl, gl::VERTEX_SHADER, vertex_source)?;
    let fragment_shader = match compile_shader(gl, gl::FRAGMENT_SHADER, fragment_source) {
        Ok(shader) => shader,
        Err(err) => {
            // Safety: the shader was created above.
            unsafe { (gl.DeleteShader)(vertex_shader) };
            return Err(err);
        }
    };
    // Safety: both shaders compiled, and are flagged for deletion once the
    // program no longer needs them.
    unsafe {
        let program = (gl.CreateProgram)();
        (gl.AttachShader)(program, vertex_shader);
        (gl.AttachShader)(program, fragment_shader);
        (gl.BindAttribLocation)(program, POSITION_LOCATION, c"a_position".as_ptr());
        (gl.BindAttribLocation)(program, COLOR_LOCATION, c"a_color".as_ptr());
        (gl.LinkProgram)(program);
        (gl.DeleteShader)(vertex_shader);
        (gl.DeleteShader)(fragment_shader);
        let mut status = 0;
        (gl.GetProgramiv)(program, gl::LINK_STATUS, &mut status);
        if status == 0 {
            let mut log_length = 0;
            (gl.GetProgramiv)(program, gl::INFO_LOG_LENGTH, &mut log_length);
            let mut log = vec![0u8; log_length.max(1) as usize];
            (gl.GetProgramInfoLog)(program, log.len() as GLsizei, core::ptr::null_mut(), log.as_mut_ptr().cast());
            (gl.DeleteProgram)(program);
            return Err(GraphicsError::Native(format!(
                "shader program linking failed: {}",
                info_log_to_string(&log),
            )));
        }
        Ok(program)
    }
}

fn info_log_to_string(log: &[u8]) -> String {
    let end = log.iter().position(|&byte| byte == 0).unwrap_or(log.len());
    String::from_utf8_lossy(&log[..end]).trim_end().to_string()
}

extern "system" fn forward_debug_message(
    _source: GLenum,
    _kind: GLenum,
    id: GLuint,
    severity: GLenum,
    length: GLsizei,
    message: *const gl::GLchar,
    _user_param: *mut c_void,
) {
    if message.is_null() {
        return;
    }
    let message = if length >= 0 {
        // Safety: the driver passes `length` valid bytes.
        let bytes = unsafe { core::slice::from_raw_parts(message.cast::<u8>(), length as usize) };
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        // Safety: a negative length means the message is NUL-terminated.
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    };
    match severity {
        gl::DEBUG_SEVERITY_HIGH => error!("GL debug message {id}: {message}"),
        gl::DEBUG_SEVERITY_MEDIUM => warn!("GL debug message {id}: {message}"),
        gl::DEBUG_SEVERITY_LOW => debug!("GL debug message {id}: {message}"),
        _ => trace!("GL debug message {id}: {message}"),
    }
}
