// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{ffi::c_int, mem::size_of};
use std::{cell::RefCell, collections::HashMap, rc::Rc};

use platform::{
    ClearOptions, Color, DeviceBackend, GraphicsError, NativeBuffer, PresentInterval,
    PresentIntervalValue, PresentationParameters, PrimitiveType, Rectangle, SetDataOptions,
    VertexDeclaration, VertexElementFormat, VertexElementUsage, Viewport,
};
use sdl2::video::Window;
use sdl2_sys::{SDL_Color, SDL_Rect, SDL_Renderer};
use tracing::{debug, trace};

use crate::apply_window_parameters;

/// A [`DeviceBackend`] drawing with `SDL_Renderer`, for systems without
/// usable OpenGL drivers.
///
/// Only triangles with float positions and optional byte colors can be
/// drawn. Positions are in normalized device coordinates, like the
/// pass-through shader of the OpenGL backend expects.
pub struct SdlRendererBackend {
    window: Option<Rc<RefCell<Window>>>,
    renderer: *mut SDL_Renderer,
    desktop_space_fullscreen: bool,
    buffers: HashMap<NativeBuffer, Vec<u8>>,
    next_buffer_id: u64,
    bound_buffer: Option<NativeBuffer>,
    viewport: Viewport,
    clear_color: Color,
    positions: Vec<f32>,
}

impl SdlRendererBackend {
    /// Creates an accelerated `SDL_Renderer` for the window.
    pub fn new(
        window: Rc<RefCell<Window>>,
        desktop_space_fullscreen: bool,
    ) -> Result<SdlRendererBackend, GraphicsError> {
        let flags = sdl2_sys::SDL_RendererFlags::SDL_RENDERER_ACCELERATED as u32;
        // Safety: the window is alive for as long as the Rc is held, and the
        // renderer is destroyed before it's released.
        let renderer = unsafe { sdl2_sys::SDL_CreateRenderer(window.borrow().raw(), -1, flags) };
        if renderer.is_null() {
            return Err(GraphicsError::DeviceCreation(sdl2::get_error()));
        }
        debug!("Created an accelerated SDL renderer");
        Ok(SdlRendererBackend {
            window: Some(window),
            renderer,
            desktop_space_fullscreen,
            buffers: HashMap::new(),
            next_buffer_id: 1,
            bound_buffer: None,
            viewport: Viewport::default(),
            clear_color: Color::BLACK,
            positions: Vec::new(),
        })
    }

    fn check(&self, result: c_int) -> Result<(), GraphicsError> {
        if result < 0 {
            Err(GraphicsError::Native(sdl2::get_error()))
        } else {
            Ok(())
        }
    }

    fn draw_vertices(
        &mut self,
        primitive: PrimitiveType,
        declaration: &VertexDeclaration,
        vertex_data: &[u8],
        vertex_count: usize,
    ) -> Result<(), GraphicsError> {
        let indices = match primitive {
            PrimitiveType::TriangleList => None,
            PrimitiveType::TriangleStrip => Some(triangle_strip_indices(vertex_count)),
            _ => {
                return Err(GraphicsError::Unsupported(
                    "the SDL renderer can only draw triangles",
                ))
            }
        };
        let stride = declaration.stride();
        if vertex_data.len() < vertex_count * stride {
            return Err(GraphicsError::Native(String::from(
                "vertex data is shorter than the vertex count",
            )));
        }

        let position = declaration
            .element(VertexElementUsage::Position, 0)
            .filter(|element| {
                matches!(
                    element.format,
                    VertexElementFormat::Vector2
                        | VertexElementFormat::Vector3
                        | VertexElementFormat::Vector4
                )
            })
            .ok_or(GraphicsError::Unsupported(
                "the SDL renderer needs float vector positions",
            ))?;
        self.positions.clear();
        for vertex in vertex_data.chunks_exact(stride).take(vertex_count) {
            let x: f32 = bytemuck::pod_read_unaligned(&vertex[position.offset..position.offset + 4]);
            let y: f32 =
                bytemuck::pod_read_unaligned(&vertex[position.offset + 4..position.offset + 8]);
            let (x, y) = ndc_to_viewport(x, y, self.viewport.width, self.viewport.height);
            self.positions.push(x);
            self.positions.push(y);
        }

        const WHITE: SDL_Color = SDL_Color {
            r: 0xFF,
            g: 0xFF,
            b: 0xFF,
            a: 0xFF,
        };
        let (colors, color_stride) = match declaration.element(VertexElementUsage::Color, 0) {
            Some(color) if color.format == VertexElementFormat::Color => (
                vertex_data[color.offset..].as_ptr().cast::<SDL_Color>(),
                stride as c_int,
            ),
            _ => (&WHITE as *const SDL_Color, 0),
        };
        let (index_ptr, index_count) = match &indices {
            Some(indices) => (indices.as_ptr().cast(), indices.len() as c_int),
            None => (core::ptr::null(), 0),
        };

        // Safety: positions hold two floats per vertex, and colors point at
        // vertex_count vertices of stride bytes (or a single color with a
        // zero stride). The indices are 32-bit and in range.
        let result = unsafe {
            sdl2_sys::SDL_RenderGeometryRaw(
                self.renderer,
                core::ptr::null_mut(),
                self.positions.as_ptr(),
                (2 * size_of::<f32>()) as c_int,
                colors,
                color_stride,
                core::ptr::null(),
                0,
                vertex_count as c_int,
                index_ptr,
                index_count,
                size_of::<i32>() as c_int,
            )
        };
        self.check(result)
    }
}

impl DeviceBackend for SdlRendererBackend {
    fn name(&self) -> &'static str {
        "sdl-renderer"
    }

    fn supports_late_swap_tear(&self) -> bool {
        false
    }

    fn create_vertex_buffer(
        &mut self,
        size_in_bytes: usize,
        _dynamic: bool,
    ) -> Result<NativeBuffer, GraphicsError> {
        let buffer = NativeBuffer::new(self.next_buffer_id);
        self.next_buffer_id += 1;
        self.buffers.insert(buffer, vec![0; size_in_bytes]);
        self.bound_buffer = Some(buffer);
        Ok(buffer)
    }

    fn bind_vertex_buffer(&mut self, buffer: Option<NativeBuffer>) {
        self.bound_buffer = buffer;
    }

    fn set_vertex_buffer_data(
        &mut self,
        buffer: NativeBuffer,
        offset_in_bytes: usize,
        data: &[u8],
        buffer_size: usize,
        options: SetDataOptions,
    ) -> Result<(), GraphicsError> {
        let contents = self
            .buffers
            .get_mut(&buffer)
            .ok_or_else(|| GraphicsError::Native(format!("unknown buffer {buffer:?}")))?;
        if options == SetDataOptions::Discard {
            contents.clear();
            contents.resize(buffer_size, 0);
        }
        let target = contents
            .get_mut(offset_in_bytes..offset_in_bytes + data.len())
            .ok_or(GraphicsError::BufferOverflow {
                offset: offset_in_bytes,
                len: data.len(),
                capacity: buffer_size,
            })?;
        target.copy_from_slice(data);
        Ok(())
    }

    fn destroy_vertex_buffer(&mut self, buffer: NativeBuffer) {
        self.buffers.remove(&buffer);
        if self.bound_buffer == Some(buffer) {
            self.bound_buffer = None;
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
        let buffer = self.bound_buffer.ok_or(GraphicsError::NoVertexBuffer)?;
        // The buffer is taken out for the draw, so the vertex data can be
        // borrowed while the scratch space is written to.
        let contents = self
            .buffers
            .remove(&buffer)
            .ok_or_else(|| GraphicsError::Native(format!("unknown buffer {buffer:?}")))?;
        let start = (base_vertex + vertex_start) * declaration.stride();
        let result = match contents.get(start..) {
            Some(vertex_data) => self.draw_vertices(primitive, declaration, vertex_data, vertex_count),
            None => Err(GraphicsError::Native(String::from(
                "draw starts past the end of the vertex buffer",
            ))),
        };
        self.buffers.insert(buffer, contents);
        result
    }

    fn draw_user_primitives(
        &mut self,
        primitive: PrimitiveType,
        declaration: &VertexDeclaration,
        vertex_data: &[u8],
        vertex_count: usize,
    ) -> Result<(), GraphicsError> {
        self.draw_vertices(primitive, declaration, vertex_data, vertex_count)
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.viewport = *viewport;
        let rect = sdl_rect(&viewport.bounds());
        // Safety: the renderer is alive until dispose.
        let result = unsafe { sdl2_sys::SDL_RenderSetViewport(self.renderer, &rect) };
        if let Err(err) = self.check(result) {
            debug!("Setting the viewport failed: {err}");
        }
    }

    fn set_scissor_rectangle(&mut self, scissor_rectangle: &Rectangle) {
        let rect = sdl_rect(scissor_rectangle);
        // Safety: the renderer is alive until dispose.
        let result = unsafe { sdl2_sys::SDL_RenderSetClipRect(self.renderer, &rect) };
        if let Err(err) = self.check(result) {
            debug!("Setting the clip rectangle failed: {err}");
        }
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn set_clear_depth(&mut self, _depth: f32) {
        trace!("The SDL renderer has no depth buffer to clear");
    }

    fn set_clear_stencil(&mut self, _stencil: i32) {
        trace!("The SDL renderer has no stencil buffer to clear");
    }

    fn clear(&mut self, options: ClearOptions) {
        if !options.contains(ClearOptions::TARGET) {
            return;
        }
        let Color { r, g, b, a } = self.clear_color;
        // Safety: the renderer is alive until dispose.
        let result = unsafe {
            sdl2_sys::SDL_SetRenderDrawColor(self.renderer, r, g, b, a);
            sdl2_sys::SDL_RenderClear(self.renderer)
        };
        if let Err(err) = self.check(result) {
            debug!("Clearing failed: {err}");
        }
    }

    fn reset_back_buffer(
        &mut self,
        parameters: &PresentationParameters,
    ) -> Result<(), GraphicsError> {
        match &self.window {
            Some(window) => {
                apply_window_parameters(window, parameters, self.desktop_space_fullscreen)
            }
            None => Err(GraphicsError::Native(String::from(
                "the SDL renderer backend has been disposed",
            ))),
        }
    }

    fn set_swap_interval(&mut self, interval: i32) -> Result<(), GraphicsError> {
        let vsync = match interval {
            0 => 0,
            1 => 1,
            2 => {
                return Err(GraphicsError::UnsupportedPresentInterval(
                    PresentIntervalValue::Interval(PresentInterval::Two),
                ))
            }
            _ => {
                return Err(GraphicsError::UnsupportedPresentInterval(
                    PresentIntervalValue::Raw(interval),
                ))
            }
        };
        // Safety: the renderer is alive until dispose.
        let result = unsafe { sdl2_sys::SDL_RenderSetVSync(self.renderer, vsync) };
        self.check(result)
    }

    fn present(&mut self) -> Result<(), GraphicsError> {
        // Safety: the renderer is alive until dispose.
        unsafe { sdl2_sys::SDL_RenderPresent(self.renderer) };
        Ok(())
    }

    fn dispose(&mut self) {
        if !self.renderer.is_null() {
            // Safety: the renderer was created in new and is destroyed once.
            unsafe { sdl2_sys::SDL_DestroyRenderer(self.renderer) };
            self.renderer = core::ptr::null_mut();
            debug!("Disposed the SDL renderer");
        }
        self.buffers.clear();
        self.window = None;
    }
}

impl Drop for SdlRendererBackend {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn sdl_rect(rectangle: &Rectangle) -> SDL_Rect {
    SDL_Rect {
        x: rectangle.x,
        y: rectangle.y,
        w: rectangle.width,
        h: rectangle.height,
    }
}

/// Maps normalized device coordinates (y up) to pixel coordinates inside a
/// `width` by `height` viewport (y down).
pub(crate) fn ndc_to_viewport(x: f32, y: f32, width: i32, height: i32) -> (f32, f32) {
    (
        (x + 1.0) / 2.0 * width as f32,
        (1.0 - y) / 2.0 * height as f32,
    )
}

/// Indices that draw a triangle strip of `vertex_count` vertices as a
/// triangle list, keeping every triangle's winding the same.
pub(crate) fn triangle_strip_indices(vertex_count: usize) -> Vec<i32> {
    let triangles = vertex_count.saturating_sub(2);
    let mut indices = Vec::with_capacity(triangles * 3);
    for i in 0..triangles as i32 {
        if i % 2 == 0 {
            indices.extend_from_slice(&[i, i + 1, i + 2]);
        } else {
            indices.extend_from_slice(&[i + 1, i, i + 2]);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::{ndc_to_viewport, triangle_strip_indices};

    #[test]
    fn strips_expand_with_consistent_winding() {
        assert_eq!(Vec::<i32>::new(), triangle_strip_indices(2));
        assert_eq!(vec![0, 1, 2], triangle_strip_indices(3));
        assert_eq!(
            vec![0, 1, 2, 2, 1, 3, 2, 3, 4],
            triangle_strip_indices(5),
        );
    }

    #[test]
    fn device_coordinates_cover_the_viewport() {
        assert_eq!((0.0, 0.0), ndc_to_viewport(-1.0, 1.0, 800, 480));
        assert_eq!((800.0, 480.0), ndc_to_viewport(1.0, -1.0, 800, 480));
        assert_eq!((400.0, 240.0), ndc_to_viewport(0.0, 0.0, 800, 480));
    }
}
