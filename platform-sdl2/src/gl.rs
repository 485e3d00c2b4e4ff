// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The subset of OpenGL used by [`OpenGlBackend`](crate::OpenGlBackend),
//! loaded at runtime by symbol name.

#![allow(non_snake_case, clippy::upper_case_acronyms, missing_docs)]

use core::ffi::{c_char, c_void};

use platform::GraphicsError;

pub type GLenum = u32;
pub type GLuint = u32;
pub type GLint = i32;
pub type GLsizei = i32;
pub type GLboolean = u8;
pub type GLbitfield = u32;
pub type GLfloat = f32;
pub type GLdouble = f64;
pub type GLsizeiptr = isize;
pub type GLintptr = isize;
pub type GLchar = c_char;

pub type GLDEBUGPROC = Option<
    extern "system" fn(
        source: GLenum,
        kind: GLenum,
        id: GLuint,
        severity: GLenum,
        length: GLsizei,
        message: *const GLchar,
        user_param: *mut c_void,
    ),
>;

pub const FALSE: GLboolean = 0;
pub const TRUE: GLboolean = 1;
pub const NO_ERROR: GLenum = 0;

pub const POINTS: GLenum = 0x0000;
pub const LINES: GLenum = 0x0001;
pub const LINE_STRIP: GLenum = 0x0003;
pub const TRIANGLES: GLenum = 0x0004;
pub const TRIANGLE_STRIP: GLenum = 0x0005;

pub const DEPTH_BUFFER_BIT: GLbitfield = 0x0000_0100;
pub const STENCIL_BUFFER_BIT: GLbitfield = 0x0000_0400;
pub const COLOR_BUFFER_BIT: GLbitfield = 0x0000_4000;

pub const SCISSOR_TEST: GLenum = 0x0C11;
pub const DEBUG_OUTPUT: GLenum = 0x92E0;
pub const DEBUG_OUTPUT_SYNCHRONOUS: GLenum = 0x8242;
pub const DEBUG_SEVERITY_HIGH: GLenum = 0x9146;
pub const DEBUG_SEVERITY_MEDIUM: GLenum = 0x9147;
pub const DEBUG_SEVERITY_LOW: GLenum = 0x9148;

pub const VENDOR: GLenum = 0x1F00;
pub const RENDERER: GLenum = 0x1F01;
pub const VERSION: GLenum = 0x1F02;

pub const BYTE: GLenum = 0x1400;
pub const UNSIGNED_BYTE: GLenum = 0x1401;
pub const SHORT: GLenum = 0x1402;
pub const FLOAT: GLenum = 0x1406;
pub const HALF_FLOAT: GLenum = 0x140B;

pub const ARRAY_BUFFER: GLenum = 0x8892;
pub const STREAM_DRAW: GLenum = 0x88E0;
pub const STATIC_DRAW: GLenum = 0x88E4;
pub const DYNAMIC_DRAW: GLenum = 0x88E8;

pub const FRAGMENT_SHADER: GLenum = 0x8B30;
pub const VERTEX_SHADER: GLenum = 0x8B31;
pub const COMPILE_STATUS: GLenum = 0x8B81;
pub const LINK_STATUS: GLenum = 0x8B82;
pub const INFO_LOG_LENGTH: GLenum = 0x8B84;

pub const FRAMEBUFFER: GLenum = 0x8D40;
pub const READ_FRAMEBUFFER: GLenum = 0x8CA8;
pub const DRAW_FRAMEBUFFER: GLenum = 0x8CA9;
pub const RENDERBUFFER: GLenum = 0x8D41;
pub const FRAMEBUFFER_COMPLETE: GLenum = 0x8CD5;
pub const COLOR_ATTACHMENT0: GLenum = 0x8CE0;
pub const DEPTH_ATTACHMENT: GLenum = 0x8D00;
pub const DEPTH_STENCIL_ATTACHMENT: GLenum = 0x821A;
pub const RGBA8: GLenum = 0x8058;
pub const DEPTH_COMPONENT16: GLenum = 0x81A5;
pub const DEPTH_COMPONENT24: GLenum = 0x81A6;
pub const DEPTH24_STENCIL8: GLenum = 0x88F0;
pub const NEAREST: GLenum = 0x2600;

/// Declares the [`Gl`] function table. Required entry points are plain
/// function pointers, and loading fails without them. Optional ones are
/// `Option`s, `None` if the driver doesn't have them.
macro_rules! gl_functions {
    (
        required { $(fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)?;)* }
        optional { $(fn $opt_name:ident($($opt_arg:ident: $opt_ty:ty),* $(,)?) $(-> $opt_ret:ty)?;)* }
    ) => {
        pub struct Gl {
            $(pub $name: unsafe extern "system" fn($($ty),*) $(-> $ret)?,)*
            $(pub $opt_name: Option<unsafe extern "system" fn($($opt_ty),*) $(-> $opt_ret)?>,)*
        }

        impl Gl {
            /// Loads the entry points with `get_proc_address`, which should
            /// return null for missing symbols.
            pub fn load(
                mut get_proc_address: impl FnMut(&str) -> *const c_void,
            ) -> Result<Gl, GraphicsError> {
                Ok(Gl {
                    $($name: {
                        let symbol = concat!("gl", stringify!($name));
                        let ptr = get_proc_address(symbol);
                        if ptr.is_null() {
                            return Err(GraphicsError::MissingEntryPoint(symbol));
                        }
                        // Safety: the pointer was returned by the GL loader for
                        // this exact symbol, and the signature matches the C
                        // declaration in the GL headers.
                        unsafe {
                            core::mem::transmute::<
                                *const c_void,
                                unsafe extern "system" fn($($ty),*) $(-> $ret)?,
                            >(ptr)
                        }
                    },)*
                    $($opt_name: {
                        let ptr = get_proc_address(concat!("gl", stringify!($opt_name)));
                        if ptr.is_null() {
                            None
                        } else {
                            // Safety: see the required entry points above.
                            Some(unsafe {
                                core::mem::transmute::<
                                    *const c_void,
                                    unsafe extern "system" fn($($opt_ty),*) $(-> $opt_ret)?,
                                >(ptr)
                            })
                        }
                    },)*
                })
            }
        }
    };
}

gl_functions! {
    required {
        fn GetError() -> GLenum;
        fn GetString(name: GLenum) -> *const u8;
        fn Enable(cap: GLenum);
        fn Disable(cap: GLenum);
        fn Viewport(x: GLint, y: GLint, width: GLsizei, height: GLsizei);
        fn DepthRange(near: GLdouble, far: GLdouble);
        fn Scissor(x: GLint, y: GLint, width: GLsizei, height: GLsizei);
        fn ClearColor(r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat);
        fn ClearDepth(depth: GLdouble);
        fn ClearStencil(stencil: GLint);
        fn Clear(mask: GLbitfield);
        fn GenBuffers(n: GLsizei, buffers: *mut GLuint);
        fn DeleteBuffers(n: GLsizei, buffers: *const GLuint);
        fn BindBuffer(target: GLenum, buffer: GLuint);
        fn BufferData(target: GLenum, size: GLsizeiptr, data: *const c_void, usage: GLenum);
        fn BufferSubData(target: GLenum, offset: GLintptr, size: GLsizeiptr, data: *const c_void);
        fn EnableVertexAttribArray(index: GLuint);
        fn DisableVertexAttribArray(index: GLuint);
        fn VertexAttribPointer(
            index: GLuint,
            size: GLint,
            kind: GLenum,
            normalized: GLboolean,
            stride: GLsizei,
            pointer: *const c_void,
        );
        fn VertexAttrib4f(index: GLuint, x: GLfloat, y: GLfloat, z: GLfloat, w: GLfloat);
        fn DrawArrays(mode: GLenum, first: GLint, count: GLsizei);
        fn CreateShader(kind: GLenum) -> GLuint;
        fn ShaderSource(
            shader: GLuint,
            count: GLsizei,
            string: *const *const GLchar,
            length: *const GLint,
        );
        fn CompileShader(shader: GLuint);
        fn GetShaderiv(shader: GLuint, pname: GLenum, params: *mut GLint);
        fn GetShaderInfoLog(shader: GLuint, max_length: GLsizei, length: *mut GLsizei, log: *mut GLchar);
        fn DeleteShader(shader: GLuint);
        fn CreateProgram() -> GLuint;
        fn AttachShader(program: GLuint, shader: GLuint);
        fn BindAttribLocation(program: GLuint, index: GLuint, name: *const GLchar);
        fn LinkProgram(program: GLuint);
        fn GetProgramiv(program: GLuint, pname: GLenum, params: *mut GLint);
        fn GetProgramInfoLog(program: GLuint, max_length: GLsizei, length: *mut GLsizei, log: *mut GLchar);
        fn UseProgram(program: GLuint);
        fn DeleteProgram(program: GLuint);
    }
    optional {
        fn GenFramebuffers(n: GLsizei, framebuffers: *mut GLuint);
        fn DeleteFramebuffers(n: GLsizei, framebuffers: *const GLuint);
        fn BindFramebuffer(target: GLenum, framebuffer: GLuint);
        fn FramebufferRenderbuffer(
            target: GLenum,
            attachment: GLenum,
            renderbuffer_target: GLenum,
            renderbuffer: GLuint,
        );
        fn CheckFramebufferStatus(target: GLenum) -> GLenum;
        fn GenRenderbuffers(n: GLsizei, renderbuffers: *mut GLuint);
        fn DeleteRenderbuffers(n: GLsizei, renderbuffers: *const GLuint);
        fn BindRenderbuffer(target: GLenum, renderbuffer: GLuint);
        fn RenderbufferStorage(target: GLenum, format: GLenum, width: GLsizei, height: GLsizei);
        fn BlitFramebuffer(
            src_x0: GLint,
            src_y0: GLint,
            src_x1: GLint,
            src_y1: GLint,
            dst_x0: GLint,
            dst_y0: GLint,
            dst_x1: GLint,
            dst_y1: GLint,
            mask: GLbitfield,
            filter: GLenum,
        );
        fn GenVertexArrays(n: GLsizei, arrays: *mut GLuint);
        fn DeleteVertexArrays(n: GLsizei, arrays: *const GLuint);
        fn BindVertexArray(array: GLuint);
        fn DebugMessageCallback(callback: GLDEBUGPROC, user_param: *const c_void);
    }
}

/// The framebuffer object entry points, available together or not at all.
#[derive(Clone, Copy)]
pub struct FramebufferFns {
    pub GenFramebuffers: unsafe extern "system" fn(GLsizei, *mut GLuint),
    pub DeleteFramebuffers: unsafe extern "system" fn(GLsizei, *const GLuint),
    pub BindFramebuffer: unsafe extern "system" fn(GLenum, GLuint),
    pub FramebufferRenderbuffer: unsafe extern "system" fn(GLenum, GLenum, GLenum, GLuint),
    pub CheckFramebufferStatus: unsafe extern "system" fn(GLenum) -> GLenum,
    pub GenRenderbuffers: unsafe extern "system" fn(GLsizei, *mut GLuint),
    pub DeleteRenderbuffers: unsafe extern "system" fn(GLsizei, *const GLuint),
    pub BindRenderbuffer: unsafe extern "system" fn(GLenum, GLuint),
    pub RenderbufferStorage: unsafe extern "system" fn(GLenum, GLenum, GLsizei, GLsizei),
    pub BlitFramebuffer: unsafe extern "system" fn(
        GLint,
        GLint,
        GLint,
        GLint,
        GLint,
        GLint,
        GLint,
        GLint,
        GLbitfield,
        GLenum,
    ),
}

/// The vertex array object entry points, required by core profiles.
#[derive(Clone, Copy)]
pub struct VertexArrayFns {
    pub GenVertexArrays: unsafe extern "system" fn(GLsizei, *mut GLuint),
    pub DeleteVertexArrays: unsafe extern "system" fn(GLsizei, *const GLuint),
    pub BindVertexArray: unsafe extern "system" fn(GLuint),
}

impl Gl {
    pub fn framebuffers(&self) -> Option<FramebufferFns> {
        Some(FramebufferFns {
            GenFramebuffers: self.GenFramebuffers?,
            DeleteFramebuffers: self.DeleteFramebuffers?,
            BindFramebuffer: self.BindFramebuffer?,
            FramebufferRenderbuffer: self.FramebufferRenderbuffer?,
            CheckFramebufferStatus: self.CheckFramebufferStatus?,
            GenRenderbuffers: self.GenRenderbuffers?,
            DeleteRenderbuffers: self.DeleteRenderbuffers?,
            BindRenderbuffer: self.BindRenderbuffer?,
            RenderbufferStorage: self.RenderbufferStorage?,
            BlitFramebuffer: self.BlitFramebuffer?,
        })
    }

    pub fn vertex_arrays(&self) -> Option<VertexArrayFns> {
        Some(VertexArrayFns {
            GenVertexArrays: self.GenVertexArrays?,
            DeleteVertexArrays: self.DeleteVertexArrays?,
            BindVertexArray: self.BindVertexArray?,
        })
    }
}
