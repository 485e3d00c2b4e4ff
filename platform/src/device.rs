// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::fmt::Debug;

use bytemuck::Pod;
use tracing::{debug, trace, warn};

use crate::{
    BufferUsage, ClearOptions, Color, GraphicsAdapter, GraphicsError, GraphicsResource,
    NativeBuffer, PresentationParameters, PrimitiveType, Rectangle, ResourceEvent, ResourceId,
    ResourcePool, SetDataOptions, Signal, VertexBuffer, VertexDeclaration, Viewport,
};

/// The native side of a [`GraphicsDevice`]: one implementation per graphics
/// API, selected when the platform creates the device.
///
/// The device does all the validation, state caching and bookkeeping, so
/// implementations can assume that:
/// - calls only happen while the device is [`DeviceState::Ready`] (or
///   resetting, for the reset-related calls),
/// - buffer uploads and draws are in bounds,
/// - [`DeviceBackend::bind_vertex_buffer`] is only called when the binding
///   actually changes.
///
/// The trait is object safe, the device holds it as a `Box<dyn
/// DeviceBackend>`.
pub trait DeviceBackend {
    /// Name of the backend, for logging.
    fn name(&self) -> &'static str;

    /// True if the native context is a "core profile" context.
    fn is_core_profile(&self) -> bool {
        false
    }

    /// True if a negative swap interval (adaptive vsync) may be requested
    /// from [`DeviceBackend::set_swap_interval`].
    fn supports_late_swap_tear(&self) -> bool;

    /// Allocates `size_in_bytes` bytes of vertex storage. The new buffer is
    /// left bound.
    fn create_vertex_buffer(
        &mut self,
        size_in_bytes: usize,
        dynamic: bool,
    ) -> Result<NativeBuffer, GraphicsError>;

    /// Makes `buffer` the source of vertex data for subsequent draws, or
    /// unbinds the current buffer with `None`.
    fn bind_vertex_buffer(&mut self, buffer: Option<NativeBuffer>);

    /// Uploads `data` into the currently bound `buffer`, starting at
    /// `offset_in_bytes`. `buffer_size` is the buffer's full size, for
    /// implementations that reallocate on [`SetDataOptions::Discard`].
    fn set_vertex_buffer_data(
        &mut self,
        buffer: NativeBuffer,
        offset_in_bytes: usize,
        data: &[u8],
        buffer_size: usize,
        options: SetDataOptions,
    ) -> Result<(), GraphicsError>;

    /// Releases the buffer. If it was bound, nothing is bound afterwards.
    fn destroy_vertex_buffer(&mut self, buffer: NativeBuffer);

    /// Draws `vertex_count` vertices from the bound vertex buffer, starting
    /// at vertex `base_vertex + vertex_start`, interpreting the buffer with
    /// `declaration`.
    fn draw_primitives(
        &mut self,
        primitive: PrimitiveType,
        declaration: &VertexDeclaration,
        base_vertex: usize,
        vertex_start: usize,
        vertex_count: usize,
    ) -> Result<(), GraphicsError>;

    /// Draws `vertex_count` vertices straight from `vertex_data`, which holds
    /// exactly `vertex_count * declaration.stride()` bytes. The data is only
    /// borrowed for the duration of the call, and nothing it was uploaded
    /// into may outlive the call. May leave no vertex buffer bound.
    fn draw_user_primitives(
        &mut self,
        primitive: PrimitiveType,
        declaration: &VertexDeclaration,
        vertex_data: &[u8],
        vertex_count: usize,
    ) -> Result<(), GraphicsError>;

    /// Sets the viewport, in top-left origin back buffer coordinates.
    fn set_viewport(&mut self, viewport: &Viewport);

    /// Sets the scissor rectangle, in top-left origin back buffer coordinates.
    fn set_scissor_rectangle(&mut self, scissor_rectangle: &Rectangle);

    #[allow(missing_docs)]
    fn set_clear_color(&mut self, color: Color);

    #[allow(missing_docs)]
    fn set_clear_depth(&mut self, depth: f32);

    #[allow(missing_docs)]
    fn set_clear_stencil(&mut self, stencil: i32);

    /// Clears the parts of the back buffer selected by `options` using the
    /// most recently set clear values.
    fn clear(&mut self, options: ClearOptions);

    /// Reconfigures the back buffer (and the window, where applicable) to
    /// match `parameters`. Whether the backing storage is replaced or
    /// resized in place is up to the implementation.
    fn reset_back_buffer(&mut self, parameters: &PresentationParameters)
        -> Result<(), GraphicsError>;

    /// Sets the native swap interval: 0 for immediate, 1 or 2 to wait for
    /// that many vertical blanks, -1 for adaptive vsync.
    fn set_swap_interval(&mut self, interval: i32) -> Result<(), GraphicsError>;

    /// Shows the back buffer on screen.
    fn present(&mut self) -> Result<(), GraphicsError>;

    /// Releases the native context. Called once, after all resources have
    /// been destroyed.
    fn dispose(&mut self);
}

/// The lifecycle state of a [`GraphicsDevice`].
///
/// Devices are created straight into [`DeviceState::Ready`] by
/// [`Platform::create_graphics_device`](crate::Platform::create_graphics_device).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Draws and resource operations are allowed.
    Ready,
    /// Inside [`GraphicsDevice::reset`], or after a reset failed.
    Resetting,
    /// [`GraphicsDevice::dispose`] has been called.
    Disposed,
}

struct ResourceEntry {
    native: NativeBuffer,
    events: Signal<ResourceEvent>,
}

#[derive(Debug, Clone)]
struct VertexBufferBinding {
    buffer: VertexBuffer,
    vertex_offset: usize,
}

/// Owner of all per-frame graphics state and the entry point for draw
/// submission.
///
/// The device tracks what has been sent to the backend (bound vertex buffer,
/// clear values) and skips redundant native calls. It also owns the registry
/// of live resources, so that resets can be broadcast to them and leaks can
/// be reported when the device goes away.
///
/// Single-threaded: the device and its backend belong to the thread driving
/// the game loop.
pub struct GraphicsDevice {
    backend: Box<dyn DeviceBackend>,
    adapter: GraphicsAdapter,
    parameters: PresentationParameters,
    state: DeviceState,
    viewport: Viewport,
    scissor_rectangle: Rectangle,
    /// The vertex buffer set by the user, used by
    /// [`GraphicsDevice::draw_primitives`].
    vertex_buffer: Option<VertexBufferBinding>,
    /// The last buffer bound in the backend. Always matches the last
    /// [`DeviceBackend::bind_vertex_buffer`] (or implicit bind) issued.
    bound_native_buffer: Option<NativeBuffer>,
    clear_color: Option<Color>,
    clear_depth: Option<f32>,
    clear_stencil: Option<i32>,
    resources: ResourcePool<ResourceEntry>,
    /// Emitted at the start of [`GraphicsDevice::reset`], before anything
    /// has changed.
    pub device_resetting: Signal<()>,
    /// Emitted at the end of a successful [`GraphicsDevice::reset`].
    pub device_reset: Signal<()>,
    /// Emitted once when the device is disposed, before its resources are.
    pub disposing: Signal<()>,
}

impl Debug for GraphicsDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("backend", &self.backend.name())
            .field("adapter", &self.adapter.device_name())
            .field("state", &self.state)
            .field("parameters", &self.parameters)
            .field("viewport", &self.viewport)
            .field("scissor_rectangle", &self.scissor_rectangle)
            .field("live_resources", &self.resources.len())
            .finish_non_exhaustive()
    }
}

impl GraphicsDevice {
    /// Creates a device on top of `backend`, configuring the back buffer,
    /// viewport, scissor rectangle and presentation interval according to
    /// `parameters`.
    pub fn new(
        backend: Box<dyn DeviceBackend>,
        adapter: GraphicsAdapter,
        parameters: PresentationParameters,
    ) -> Result<GraphicsDevice, GraphicsError> {
        parameters.validate()?;
        let bounds = parameters.bounds();
        let mut device = GraphicsDevice {
            backend,
            adapter,
            parameters,
            state: DeviceState::Ready,
            viewport: Viewport::from_bounds(bounds),
            scissor_rectangle: bounds,
            vertex_buffer: None,
            bound_native_buffer: None,
            clear_color: None,
            clear_depth: None,
            clear_stencil: None,
            resources: ResourcePool::new(),
            device_resetting: Signal::new(),
            device_reset: Signal::new(),
            disposing: Signal::new(),
        };
        device.backend.reset_back_buffer(&device.parameters)?;
        device.backend.set_viewport(&device.viewport);
        device.backend.set_scissor_rectangle(&device.scissor_rectangle);
        device.apply_presentation_interval()?;
        debug!(
            backend = device.backend.name(),
            adapter = device.adapter.device_name(),
            width = device.parameters.back_buffer_width,
            height = device.parameters.back_buffer_height,
            "created graphics device"
        );
        Ok(device)
    }

    fn ensure_ready(&self, operation: &'static str) -> Result<(), GraphicsError> {
        if self.state == DeviceState::Ready {
            Ok(())
        } else {
            Err(GraphicsError::InvalidDeviceState {
                operation,
                state: self.state,
            })
        }
    }

    fn ensure_alive(&self, resource: &impl GraphicsResource) -> Result<(), GraphicsError> {
        match self.resources.get(resource.resource_id()) {
            Some(_) => Ok(()),
            None => Err(GraphicsError::StaleResource),
        }
    }

    fn bind_native_buffer(&mut self, buffer: Option<NativeBuffer>) {
        if self.bound_native_buffer == buffer {
            trace!(?buffer, "vertex buffer already bound");
            return;
        }
        self.backend.bind_vertex_buffer(buffer);
        self.bound_native_buffer = buffer;
    }

    /// Creates a vertex buffer with room for `vertex_count` vertices laid out
    /// according to `declaration`.
    ///
    /// The new buffer is bound as a side effect, but not set as the source
    /// for [`GraphicsDevice::draw_primitives`]: use
    /// [`GraphicsDevice::set_vertex_buffer`] for that.
    pub fn create_vertex_buffer(
        &mut self,
        declaration: &VertexDeclaration,
        vertex_count: usize,
        usage: BufferUsage,
    ) -> Result<VertexBuffer, GraphicsError> {
        self.create_vertex_buffer_impl(declaration, vertex_count, usage, false)
    }

    /// Like [`GraphicsDevice::create_vertex_buffer`], but hints the backend
    /// that the contents will be replaced often.
    pub fn create_dynamic_vertex_buffer(
        &mut self,
        declaration: &VertexDeclaration,
        vertex_count: usize,
        usage: BufferUsage,
    ) -> Result<VertexBuffer, GraphicsError> {
        self.create_vertex_buffer_impl(declaration, vertex_count, usage, true)
    }

    fn create_vertex_buffer_impl(
        &mut self,
        declaration: &VertexDeclaration,
        vertex_count: usize,
        usage: BufferUsage,
        dynamic: bool,
    ) -> Result<VertexBuffer, GraphicsError> {
        self.ensure_ready("create_vertex_buffer")?;
        if vertex_count == 0 {
            return Err(GraphicsError::InvalidConfiguration(
                "vertex buffers need room for at least one vertex",
            ));
        }
        let size_in_bytes =
            vertex_count
                .checked_mul(declaration.stride())
                .ok_or(GraphicsError::InvalidConfiguration(
                    "vertex buffer size does not fit in memory",
                ))?;

        let native = self.backend.create_vertex_buffer(size_in_bytes, dynamic)?;
        self.bound_native_buffer = Some(native);

        let id = self.resources.insert(ResourceEntry {
            native,
            events: Signal::new(),
        });
        debug!(?id, ?native, size_in_bytes, dynamic, "created vertex buffer");
        Ok(VertexBuffer {
            id,
            native,
            declaration: declaration.clone(),
            vertex_count,
            usage,
            dynamic,
        })
    }

    /// Sets the vertex buffer [`GraphicsDevice::draw_primitives`] reads from,
    /// with `vertex_offset` being the vertex that counts as the first one.
    /// `None` clears it.
    ///
    /// Setting the same buffer again does not cause a native bind.
    pub fn set_vertex_buffer(
        &mut self,
        buffer: Option<&VertexBuffer>,
        vertex_offset: usize,
    ) -> Result<(), GraphicsError> {
        self.ensure_ready("set_vertex_buffer")?;
        let Some(buffer) = buffer else {
            self.vertex_buffer = None;
            return Ok(());
        };
        self.ensure_alive(buffer)?;
        if vertex_offset >= buffer.vertex_count {
            return Err(GraphicsError::VertexRangeOutOfBounds {
                first: vertex_offset,
                end: vertex_offset.saturating_add(1),
                available: buffer.vertex_count,
            });
        }
        self.vertex_buffer = Some(VertexBufferBinding {
            buffer: buffer.clone(),
            vertex_offset,
        });
        self.bind_native_buffer(Some(buffer.native));
        Ok(())
    }

    /// Uploads `data` into `buffer`, starting `offset_in_bytes` bytes into the
    /// buffer.
    ///
    /// The layout of `T` should match the buffer's declaration, but that is
    /// up to the caller. Writes past the end of the buffer are refused with
    /// [`GraphicsError::BufferOverflow`].
    pub fn set_vertex_buffer_data<T: Pod>(
        &mut self,
        buffer: &VertexBuffer,
        offset_in_bytes: usize,
        data: &[T],
        options: SetDataOptions,
    ) -> Result<(), GraphicsError> {
        self.ensure_ready("set_vertex_buffer_data")?;
        self.ensure_alive(buffer)?;
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let capacity = buffer.size_in_bytes();
        let fits = offset_in_bytes
            .checked_add(bytes.len())
            .is_some_and(|end| end <= capacity);
        if !fits {
            return Err(GraphicsError::BufferOverflow {
                offset: offset_in_bytes,
                len: bytes.len(),
                capacity,
            });
        }
        self.bind_native_buffer(Some(buffer.native));
        self.backend
            .set_vertex_buffer_data(buffer.native, offset_in_bytes, bytes, capacity, options)
    }

    /// Draws `primitive_count` primitives from the vertex buffer set with
    /// [`GraphicsDevice::set_vertex_buffer`], starting at `vertex_start`
    /// (relative to the vertex offset passed in there).
    pub fn draw_primitives(
        &mut self,
        primitive: PrimitiveType,
        vertex_start: usize,
        primitive_count: usize,
    ) -> Result<(), GraphicsError> {
        self.ensure_ready("draw_primitives")?;
        if primitive_count == 0 {
            return Err(GraphicsError::InvalidConfiguration(
                "draws need at least one primitive",
            ));
        }
        let binding = self
            .vertex_buffer
            .as_ref()
            .ok_or(GraphicsError::NoVertexBuffer)?;
        self.ensure_alive(&binding.buffer)?;

        let available = binding.buffer.vertex_count;
        let first = binding.vertex_offset.saturating_add(vertex_start);
        let range = primitive
            .vertex_count(primitive_count)
            .and_then(|vertex_count| {
                let end = binding
                    .vertex_offset
                    .checked_add(vertex_start)?
                    .checked_add(vertex_count)?;
                Some((vertex_count, end))
            });
        let vertex_count = match range {
            Some((vertex_count, end)) if end <= available => vertex_count,
            // Ranges past usize::MAX are reported as ending there.
            _ => {
                return Err(GraphicsError::VertexRangeOutOfBounds {
                    first,
                    end: range.map_or(usize::MAX, |(_, end)| end),
                    available,
                });
            }
        };

        let native = binding.buffer.native;
        let base_vertex = binding.vertex_offset;
        let declaration = binding.buffer.declaration.clone();
        self.bind_native_buffer(Some(native));
        self.backend.draw_primitives(
            primitive,
            &declaration,
            base_vertex,
            vertex_start,
            vertex_count,
        )
    }

    /// Draws `primitive_count` primitives straight from `vertex_data`,
    /// starting at `vertex_data[vertex_offset]`, without a vertex buffer.
    ///
    /// `vertex_data` is only borrowed for the duration of this call.
    /// `declaration` describes `T`; the caller is responsible for them
    /// matching, but the device does make sure the backend never reads past
    /// the end of `vertex_data`.
    pub fn draw_user_primitives<T: Pod>(
        &mut self,
        primitive: PrimitiveType,
        vertex_data: &[T],
        vertex_offset: usize,
        primitive_count: usize,
        declaration: &VertexDeclaration,
    ) -> Result<(), GraphicsError> {
        self.ensure_ready("draw_user_primitives")?;
        if primitive_count == 0 {
            return Err(GraphicsError::InvalidConfiguration(
                "draws need at least one primitive",
            ));
        }
        let vertex_count = primitive.vertex_count(primitive_count);
        let stride = declaration.stride();
        let end = vertex_count
            .and_then(|vertex_count| vertex_offset.checked_add(vertex_count))
            .unwrap_or(usize::MAX);
        let out_of_bounds = |available_bytes: usize| GraphicsError::VertexRangeOutOfBounds {
            first: vertex_offset,
            end,
            available: vertex_offset.saturating_add(available_bytes / stride),
        };

        let Some(vertices) = vertex_data.get(vertex_offset..) else {
            return Err(out_of_bounds(0));
        };
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let sizes = vertex_count.and_then(|vertex_count| {
            let needed = vertex_count.checked_mul(stride)?;
            Some((vertex_count, needed))
        });
        let (vertex_count, needed) = match sizes {
            Some((vertex_count, needed)) if needed <= bytes.len() => (vertex_count, needed),
            _ => return Err(out_of_bounds(bytes.len())),
        };

        let result =
            self.backend
                .draw_user_primitives(primitive, declaration, &bytes[..needed], vertex_count);
        // The backend may have bound (and deleted) a temporary buffer.
        self.bound_native_buffer = None;
        result
    }

    /// Clears the parts of the back buffer selected by `options`.
    ///
    /// The clear values are only sent to the backend when they differ from
    /// the previous clear's values.
    pub fn clear(
        &mut self,
        options: ClearOptions,
        color: Color,
        depth: f32,
        stencil: i32,
    ) -> Result<(), GraphicsError> {
        self.ensure_ready("clear")?;
        if options.contains(ClearOptions::TARGET) && self.clear_color != Some(color) {
            self.backend.set_clear_color(color);
            self.clear_color = Some(color);
        }
        if options.contains(ClearOptions::DEPTH_BUFFER) && self.clear_depth != Some(depth) {
            self.backend.set_clear_depth(depth);
            self.clear_depth = Some(depth);
        }
        if options.contains(ClearOptions::STENCIL) && self.clear_stencil != Some(stencil) {
            self.backend.set_clear_stencil(stencil);
            self.clear_stencil = Some(stencil);
        }
        self.backend.clear(options);
        Ok(())
    }

    /// Reconfigures the device for new presentation parameters and adapter.
    ///
    /// This is the single synchronization point after window resizes,
    /// fullscreen toggles and display changes: afterwards the viewport and
    /// the scissor rectangle cover the whole new back buffer. The device
    /// object and its resources survive, only the back buffer is rebuilt.
    ///
    /// Emits [`GraphicsDevice::device_resetting`] before and
    /// [`GraphicsDevice::device_reset`] after, and notifies every live
    /// resource in between. If the backend fails, the error is returned
    /// as-is and the device stays [`DeviceState::Resetting`] until a reset
    /// succeeds; nothing is rolled back.
    pub fn reset(
        &mut self,
        parameters: PresentationParameters,
        adapter: GraphicsAdapter,
    ) -> Result<(), GraphicsError> {
        if self.state == DeviceState::Disposed {
            return Err(GraphicsError::InvalidDeviceState {
                operation: "reset",
                state: self.state,
            });
        }
        parameters.validate()?;

        self.state = DeviceState::Resetting;
        self.device_resetting.emit(&());
        debug!(
            adapter = adapter.device_name(),
            width = parameters.back_buffer_width,
            height = parameters.back_buffer_height,
            full_screen = parameters.is_full_screen,
            "resetting graphics device"
        );

        self.parameters = parameters;
        self.adapter = adapter;
        self.backend.reset_back_buffer(&self.parameters)?;

        let bounds = self.parameters.bounds();
        self.viewport = Viewport::from_bounds(bounds);
        self.backend.set_viewport(&self.viewport);
        self.scissor_rectangle = bounds;
        self.backend.set_scissor_rectangle(&self.scissor_rectangle);
        self.apply_presentation_interval()?;

        for entry in self.resources.iter_mut() {
            entry.events.emit(&ResourceEvent::DeviceReset);
        }

        self.state = DeviceState::Ready;
        self.device_reset.emit(&());
        Ok(())
    }

    fn apply_presentation_interval(&mut self) -> Result<(), GraphicsError> {
        let interval = self.parameters.presentation_interval;
        let swap_interval = interval.swap_interval(self.backend.supports_late_swap_tear());
        match self.backend.set_swap_interval(swap_interval) {
            Err(err) if swap_interval < 0 => {
                warn!(%err, "late swap tearing was rejected, falling back to regular vsync");
                self.backend.set_swap_interval(1)
            }
            result => result,
        }
    }

    /// Shows the back buffer on screen. May block until the vertical blank,
    /// depending on the presentation interval.
    pub fn present(&mut self) -> Result<(), GraphicsError> {
        self.ensure_ready("present")?;
        self.backend.present()
    }

    #[allow(missing_docs)]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Sets the viewport, pushing it to the backend immediately.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), GraphicsError> {
        self.ensure_ready("set_viewport")?;
        self.viewport = viewport;
        self.backend.set_viewport(&self.viewport);
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn scissor_rectangle(&self) -> Rectangle {
        self.scissor_rectangle
    }

    /// Sets the scissor rectangle, pushing it to the backend immediately.
    pub fn set_scissor_rectangle(&mut self, scissor_rectangle: Rectangle) -> Result<(), GraphicsError> {
        self.ensure_ready("set_scissor_rectangle")?;
        self.scissor_rectangle = scissor_rectangle;
        self.backend.set_scissor_rectangle(&self.scissor_rectangle);
        Ok(())
    }

    /// The adapter the device currently outputs to.
    pub fn adapter(&self) -> &GraphicsAdapter {
        &self.adapter
    }

    /// The live presentation parameters. Clone and pass to
    /// [`GraphicsDevice::reset`] to change them.
    pub fn presentation_parameters(&self) -> &PresentationParameters {
        &self.parameters
    }

    #[allow(missing_docs)]
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Name of the backend driving this device.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// True if the backend runs on a "core profile" context.
    pub fn is_core_profile(&self) -> bool {
        self.backend.is_core_profile()
    }

    /// The amount of resources created on this device and not yet disposed.
    pub fn live_resource_count(&self) -> usize {
        self.resources.len()
    }

    /// True if the resource has not been disposed.
    pub fn is_resource_alive(&self, resource: &impl GraphicsResource) -> bool {
        self.resources.get(resource.resource_id()).is_some()
    }

    /// Registers a handler for the resource's [`ResourceEvent`]s.
    pub fn connect_resource_events(
        &mut self,
        resource: &impl GraphicsResource,
        handler: impl FnMut(&ResourceEvent) + 'static,
    ) -> Result<(), GraphicsError> {
        let entry = self
            .resources
            .get_mut(resource.resource_id())
            .ok_or(GraphicsError::StaleResource)?;
        entry.events.connect(handler);
        Ok(())
    }

    /// Releases the resource. The first call notifies the resource's
    /// handlers with [`ResourceEvent::Disposing`] and returns true, any
    /// further calls (through any clone of the resource) do nothing and
    /// return false.
    pub fn dispose_resource(&mut self, resource: &impl GraphicsResource) -> bool {
        self.dispose_resource_by_id(resource.resource_id())
    }

    fn dispose_resource_by_id(&mut self, id: ResourceId) -> bool {
        let Some(mut entry) = self.resources.remove(id) else {
            return false;
        };
        entry.events.emit(&ResourceEvent::Disposing);

        let is_active = |binding: &VertexBufferBinding| binding.buffer.id == id;
        if self.vertex_buffer.as_ref().is_some_and(is_active) {
            self.vertex_buffer = None;
        }
        if self.bound_native_buffer == Some(entry.native) {
            self.bound_native_buffer = None;
        }
        self.backend.destroy_vertex_buffer(entry.native);
        debug!(?id, native = ?entry.native, "disposed vertex buffer");
        true
    }

    /// Releases every live resource and the native context. Called
    /// automatically on drop; calling it more than once does nothing.
    pub fn dispose(&mut self) {
        if self.state == DeviceState::Disposed {
            return;
        }
        self.disposing.emit(&());

        let leaked = self.resources.len();
        if leaked > 0 {
            warn!(leaked, "graphics resources were still alive when the device was disposed");
        }
        for id in self.resources.ids() {
            self.dispose_resource_by_id(id);
        }

        self.vertex_buffer = None;
        self.bound_native_buffer = None;
        self.backend.dispose();
        self.state = DeviceState::Disposed;
        debug!(backend = self.backend.name(), "disposed graphics device");
    }
}

impl Drop for GraphicsDevice {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::{DeviceState, GraphicsDevice};
    use crate::{
        headless::{HeadlessBackend, NativeCall, NativeCallLog},
        BufferUsage, ClearOptions, Color, DisplayMode, GraphicsAdapter, GraphicsError,
        PresentInterval, PresentationParameters, PrimitiveType, Rectangle, ResourceEvent,
        SetDataOptions, SurfaceFormat, VertexPositionColor, VertexType, Viewport, WindowHandle,
    };

    fn adapter(index: usize) -> GraphicsAdapter {
        let mode = DisplayMode::new(1920, 1080, SurfaceFormat::Color);
        GraphicsAdapter::new(index, format!("display {index}"), "test".into(), [mode], mode)
    }

    fn create_device(
        backend: HeadlessBackend,
        width: u32,
        height: u32,
    ) -> (GraphicsDevice, Rc<RefCell<NativeCallLog>>) {
        let log = backend.log();
        let params = PresentationParameters::new(WindowHandle::new(1), width, height);
        let device = GraphicsDevice::new(Box::new(backend), adapter(0), params).unwrap();
        log.borrow_mut().clear();
        (device, log)
    }

    fn triangle_vertices() -> [VertexPositionColor; 6] {
        let v = |x, y| VertexPositionColor::new([x, y, 0.0], Color::WHITE);
        [
            v(0.0, 0.0),
            v(1.0, 0.0),
            v(0.0, 1.0),
            v(1.0, 0.0),
            v(1.0, 1.0),
            v(0.0, 1.0),
        ]
    }

    #[test]
    fn reset_covers_the_new_back_buffer() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 640, 480);
        device
            .set_viewport(Viewport::new(10, 10, 100, 100))
            .unwrap();
        device
            .set_scissor_rectangle(Rectangle::new(5, 5, 20, 20))
            .unwrap();

        let mut params = device.presentation_parameters().clone();
        params.back_buffer_width = 1280;
        params.back_buffer_height = 720;
        device.reset(params, adapter(0)).unwrap();

        let bounds = Rectangle::new(0, 0, 1280, 720);
        assert_eq!(bounds, device.viewport().bounds());
        assert_eq!(bounds, device.scissor_rectangle());
        assert_eq!(DeviceState::Ready, device.state());

        let log = log.borrow();
        assert!(log
            .calls()
            .contains(&NativeCall::SetViewport(Viewport::from_bounds(bounds))));
        assert!(log.calls().contains(&NativeCall::SetScissorRectangle(bounds)));
    }

    #[test]
    fn reset_fires_events_in_order_and_adopts_the_adapter() {
        let (mut device, _log) = create_device(HeadlessBackend::new(), 800, 480);
        let order = Rc::new(RefCell::new(Vec::new()));
        {
            let order = order.clone();
            device
                .device_resetting
                .connect(move |_| order.borrow_mut().push("resetting"));
        }
        {
            let order = order.clone();
            device
                .device_reset
                .connect(move |_| order.borrow_mut().push("reset"));
        }
        let buffer = device
            .create_vertex_buffer(&VertexPositionColor::declaration(), 3, BufferUsage::None)
            .unwrap();
        {
            let order = order.clone();
            device
                .connect_resource_events(&buffer, move |event| {
                    if *event == ResourceEvent::DeviceReset {
                        order.borrow_mut().push("resource");
                    }
                })
                .unwrap();
        }

        let params = device.presentation_parameters().clone();
        device.reset(params, adapter(1)).unwrap();
        assert_eq!(vec!["resetting", "resource", "reset"], *order.borrow());
        assert_eq!(1, device.adapter().index());
    }

    #[test]
    fn invalid_reset_parameters_fail_before_anything_changes() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        let mut params = device.presentation_parameters().clone();
        params.back_buffer_width = 0;
        assert!(matches!(
            device.reset(params, adapter(0)),
            Err(GraphicsError::InvalidConfiguration(_))
        ));
        assert_eq!(DeviceState::Ready, device.state());
        assert!(log.borrow().calls().is_empty());
    }

    #[test]
    fn failed_reset_blocks_draws_until_a_reset_succeeds() {
        let backend = HeadlessBackend::new();
        let (mut device, log) = create_device(backend, 800, 480);
        log.borrow_mut().fail_next_reset();

        let params = device.presentation_parameters().clone();
        assert!(matches!(
            device.reset(params.clone(), adapter(0)),
            Err(GraphicsError::Native(_))
        ));
        assert_eq!(DeviceState::Resetting, device.state());
        assert!(matches!(
            device.clear(ClearOptions::TARGET, Color::BLACK, 1.0, 0),
            Err(GraphicsError::InvalidDeviceState { .. })
        ));

        device.reset(params, adapter(0)).unwrap();
        assert_eq!(DeviceState::Ready, device.state());
        device
            .clear(ClearOptions::TARGET, Color::BLACK, 1.0, 0)
            .unwrap();
    }

    #[test]
    fn setting_the_same_vertex_buffer_twice_binds_once() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        let declaration = VertexPositionColor::declaration();
        let a = device
            .create_vertex_buffer(&declaration, 6, BufferUsage::WriteOnly)
            .unwrap();
        let b = device
            .create_vertex_buffer(&declaration, 6, BufferUsage::WriteOnly)
            .unwrap();
        log.borrow_mut().clear();

        device.set_vertex_buffer(Some(&a), 0).unwrap();
        device.set_vertex_buffer(Some(&a), 0).unwrap();
        let binds = |log: &NativeCallLog| {
            log.count(|call| matches!(call, NativeCall::BindVertexBuffer(_)))
        };
        assert_eq!(1, binds(&log.borrow()));

        // The buffer created last is already bound by creation.
        log.borrow_mut().clear();
        device.set_vertex_buffer(Some(&b), 0).unwrap();
        device.set_vertex_buffer(Some(&b), 0).unwrap();
        device.set_vertex_buffer(Some(&b), 0).unwrap();
        assert_eq!(1, binds(&log.borrow()));
    }

    #[test]
    fn newly_created_buffers_are_bound() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        let buffer = device
            .create_vertex_buffer(&VertexPositionColor::declaration(), 6, BufferUsage::None)
            .unwrap();
        device.set_vertex_buffer(Some(&buffer), 0).unwrap();
        assert_eq!(
            0,
            log.borrow()
                .count(|call| matches!(call, NativeCall::BindVertexBuffer(_)))
        );
        assert_eq!(96, buffer.size_in_bytes());
    }

    #[test]
    fn draw_primitives_submits_the_vertex_count() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        let buffer = device
            .create_vertex_buffer(&VertexPositionColor::declaration(), 6, BufferUsage::None)
            .unwrap();
        device
            .set_vertex_buffer_data(&buffer, 0, &triangle_vertices(), SetDataOptions::None)
            .unwrap();
        device.set_vertex_buffer(Some(&buffer), 0).unwrap();
        device
            .draw_primitives(PrimitiveType::TriangleList, 0, 2)
            .unwrap();

        assert_eq!(
            Some(&NativeCall::DrawPrimitives {
                primitive: PrimitiveType::TriangleList,
                base_vertex: 0,
                vertex_start: 0,
                vertex_count: 6,
            }),
            log.borrow().calls().last()
        );
    }

    #[test]
    fn draws_past_the_end_of_the_buffer_are_refused() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        let buffer = device
            .create_vertex_buffer(&VertexPositionColor::declaration(), 6, BufferUsage::None)
            .unwrap();
        device.set_vertex_buffer(Some(&buffer), 2).unwrap();
        assert_eq!(
            Err(GraphicsError::VertexRangeOutOfBounds {
                first: 2,
                end: 8,
                available: 6
            }),
            device.draw_primitives(PrimitiveType::TriangleList, 0, 2)
        );
        device
            .draw_primitives(PrimitiveType::TriangleStrip, 0, 2)
            .unwrap();
        assert_eq!(
            1,
            log.borrow()
                .count(|call| matches!(call, NativeCall::DrawPrimitives { .. }))
        );
    }

    #[test]
    fn draws_need_a_vertex_buffer() {
        let (mut device, _log) = create_device(HeadlessBackend::new(), 800, 480);
        assert_eq!(
            Err(GraphicsError::NoVertexBuffer),
            device.draw_primitives(PrimitiveType::PointList, 0, 1)
        );
    }

    #[test]
    fn huge_draw_ranges_are_refused_instead_of_wrapping() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        let buffer = device
            .create_vertex_buffer(&VertexPositionColor::declaration(), 6, BufferUsage::None)
            .unwrap();
        assert_eq!(
            Err(GraphicsError::VertexRangeOutOfBounds {
                first: usize::MAX,
                end: usize::MAX,
                available: 6
            }),
            device.set_vertex_buffer(Some(&buffer), usize::MAX)
        );

        device.set_vertex_buffer(Some(&buffer), 1).unwrap();
        assert_eq!(
            Err(GraphicsError::VertexRangeOutOfBounds {
                first: usize::MAX,
                end: usize::MAX,
                available: 6
            }),
            device.draw_primitives(PrimitiveType::TriangleList, usize::MAX, 1)
        );
        assert_eq!(
            Err(GraphicsError::VertexRangeOutOfBounds {
                first: 1,
                end: usize::MAX,
                available: 6
            }),
            device.draw_primitives(PrimitiveType::TriangleList, 0, usize::MAX / 2)
        );

        let vertices = [VertexPositionColor::new([0.0; 3], Color::WHITE); 3];
        assert_eq!(
            Err(GraphicsError::VertexRangeOutOfBounds {
                first: 0,
                end: usize::MAX / 4,
                available: 3
            }),
            device.draw_user_primitives(
                PrimitiveType::PointList,
                &vertices,
                0,
                usize::MAX / 4,
                &VertexPositionColor::declaration(),
            )
        );

        let log = log.borrow();
        assert_eq!(
            0,
            log.count(|call| matches!(
                call,
                NativeCall::DrawPrimitives { .. } | NativeCall::DrawUserPrimitives { .. }
            ))
        );
    }

    #[test]
    fn uploads_are_bounds_checked() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        let buffer = device
            .create_vertex_buffer(&VertexPositionColor::declaration(), 4, BufferUsage::None)
            .unwrap();
        let vertices = triangle_vertices();

        assert_eq!(
            Err(GraphicsError::BufferOverflow {
                offset: 0,
                len: 96,
                capacity: 64
            }),
            device.set_vertex_buffer_data(&buffer, 0, &vertices, SetDataOptions::None)
        );
        assert_eq!(
            Err(GraphicsError::BufferOverflow {
                offset: 48,
                len: 32,
                capacity: 64
            }),
            device.set_vertex_buffer_data(&buffer, 48, &vertices[..2], SetDataOptions::None)
        );

        device
            .set_vertex_buffer_data(&buffer, 32, &vertices[..2], SetDataOptions::None)
            .unwrap();
        let log = log.borrow();
        let contents = log.buffer_contents(buffer.native()).unwrap();
        assert_eq!(bytemuck::cast_slice::<_, u8>(&vertices[..2]), &contents[32..]);
    }

    #[test]
    fn uploads_rebind_the_target_buffer() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        let declaration = VertexPositionColor::declaration();
        let a = device
            .create_vertex_buffer(&declaration, 6, BufferUsage::None)
            .unwrap();
        let _b = device
            .create_vertex_buffer(&declaration, 6, BufferUsage::None)
            .unwrap();
        log.borrow_mut().clear();

        device
            .set_vertex_buffer_data(&a, 0, &triangle_vertices(), SetDataOptions::Discard)
            .unwrap();
        assert_eq!(
            &NativeCall::BindVertexBuffer(Some(a.native())),
            &log.borrow().calls()[0]
        );
    }

    #[test]
    fn user_primitives_leave_nothing_behind() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        let buffer = device
            .create_vertex_buffer(&VertexPositionColor::declaration(), 6, BufferUsage::None)
            .unwrap();
        device.set_vertex_buffer(Some(&buffer), 0).unwrap();

        let vertices = triangle_vertices();
        device
            .draw_user_primitives(
                PrimitiveType::TriangleList,
                &vertices,
                3,
                1,
                &VertexPositionColor::declaration(),
            )
            .unwrap();
        assert_eq!(
            Some(&NativeCall::DrawUserPrimitives {
                primitive: PrimitiveType::TriangleList,
                vertex_count: 3,
                len: 48,
            }),
            log.borrow().calls().last()
        );
        assert_eq!(1, device.live_resource_count());

        // The binding cache was invalidated, so the buffer is bound again.
        log.borrow_mut().clear();
        device
            .draw_primitives(PrimitiveType::TriangleList, 0, 1)
            .unwrap();
        assert_eq!(
            &NativeCall::BindVertexBuffer(Some(buffer.native())),
            &log.borrow().calls()[0]
        );
    }

    #[test]
    fn user_primitives_never_read_past_the_data() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        let vertices = triangle_vertices();
        assert_eq!(
            Err(GraphicsError::VertexRangeOutOfBounds {
                first: 4,
                end: 7,
                available: 6
            }),
            device.draw_user_primitives(
                PrimitiveType::TriangleList,
                &vertices,
                4,
                1,
                &VertexPositionColor::declaration(),
            )
        );
        assert!(device
            .draw_user_primitives(
                PrimitiveType::LineList,
                &vertices,
                10,
                1,
                &VertexPositionColor::declaration(),
            )
            .is_err());
        assert!(log.borrow().calls().is_empty());
    }

    #[test]
    fn identical_clears_set_clear_values_once() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        device
            .clear(ClearOptions::TARGET, Color::RED, 0.0, 0)
            .unwrap();
        device
            .clear(ClearOptions::TARGET, Color::RED, 0.0, 0)
            .unwrap();

        let log = log.borrow();
        assert_eq!(
            1,
            log.count(|call| matches!(call, NativeCall::SetClearColor(_)))
        );
        assert_eq!(2, log.count(|call| matches!(call, NativeCall::Clear(_))));
        // Depth and stencil weren't cleared, so their values were never sent.
        assert_eq!(
            0,
            log.count(|call| matches!(
                call,
                NativeCall::SetClearDepth(_) | NativeCall::SetClearStencil(_)
            ))
        );
    }

    #[test]
    fn changed_clear_values_are_sent_again() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        let all = ClearOptions::all();
        device.clear(all, Color::RED, 1.0, 0).unwrap();
        device.clear(all, Color::RED, 1.0, 0).unwrap();
        device.clear(all, Color::BLUE, 1.0, 1).unwrap();

        let log = log.borrow();
        assert_eq!(
            vec![
                &NativeCall::SetClearColor(Color::RED),
                &NativeCall::SetClearDepth(1.0),
                &NativeCall::SetClearStencil(0),
                &NativeCall::Clear(all),
                &NativeCall::Clear(all),
                &NativeCall::SetClearColor(Color::BLUE),
                &NativeCall::SetClearStencil(1),
                &NativeCall::Clear(all),
            ],
            log.calls().iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn immediate_interval_requests_swap_interval_zero() {
        let backend = HeadlessBackend::new();
        let log = backend.log();
        let mut params = PresentationParameters::new(WindowHandle::new(1), 800, 480);
        params.presentation_interval = PresentInterval::Immediate;
        let _device = GraphicsDevice::new(Box::new(backend), adapter(0), params).unwrap();
        assert_eq!(
            vec![0],
            log.borrow()
                .calls()
                .iter()
                .filter_map(|call| match call {
                    NativeCall::SetSwapInterval(interval) => Some(*interval),
                    _ => None,
                })
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn rejected_late_swap_tear_falls_back_to_vsync() {
        let backend = HeadlessBackend::new().reject_late_swap_tear();
        let log = backend.log();
        let params = PresentationParameters::new(WindowHandle::new(1), 800, 480);
        let _device = GraphicsDevice::new(Box::new(backend), adapter(0), params).unwrap();
        let intervals: Vec<i32> = log
            .borrow()
            .calls()
            .iter()
            .filter_map(|call| match call {
                NativeCall::SetSwapInterval(interval) => Some(*interval),
                _ => None,
            })
            .collect();
        assert_eq!(vec![-1, 1], intervals);
    }

    #[test]
    fn disallowed_late_swap_tear_goes_straight_to_vsync() {
        let backend = HeadlessBackend::new().allow_late_swap_tear(false);
        let log = backend.log();
        let params = PresentationParameters::new(WindowHandle::new(1), 800, 480);
        let _device = GraphicsDevice::new(Box::new(backend), adapter(0), params).unwrap();
        assert_eq!(
            1,
            log.borrow()
                .count(|call| *call == NativeCall::SetSwapInterval(1))
        );
        assert_eq!(
            0,
            log.borrow()
                .count(|call| *call == NativeCall::SetSwapInterval(-1))
        );
    }

    #[test]
    fn disposing_twice_notifies_once() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        let buffer = device
            .create_vertex_buffer(&VertexPositionColor::declaration(), 3, BufferUsage::None)
            .unwrap();
        let disposing = Rc::new(RefCell::new(0));
        {
            let disposing = disposing.clone();
            device
                .connect_resource_events(&buffer, move |event| {
                    if *event == ResourceEvent::Disposing {
                        *disposing.borrow_mut() += 1;
                    }
                })
                .unwrap();
        }

        let clone = buffer.clone();
        assert!(device.dispose_resource(&buffer));
        assert!(!device.dispose_resource(&buffer));
        assert!(!device.dispose_resource(&clone));
        assert_eq!(1, *disposing.borrow());
        assert!(!device.is_resource_alive(&clone));
        assert_eq!(
            1,
            log.borrow()
                .count(|call| matches!(call, NativeCall::DestroyVertexBuffer(_)))
        );
        assert_eq!(
            Err(GraphicsError::StaleResource),
            device.set_vertex_buffer(Some(&clone), 0)
        );
    }

    #[test]
    fn disposing_the_device_disposes_leaked_resources() {
        let (mut device, log) = create_device(HeadlessBackend::new(), 800, 480);
        let declaration = VertexPositionColor::declaration();
        let disposed = Rc::new(RefCell::new(0));
        for _ in 0..3 {
            let buffer = device
                .create_vertex_buffer(&declaration, 3, BufferUsage::None)
                .unwrap();
            let disposed = disposed.clone();
            device
                .connect_resource_events(&buffer, move |_| *disposed.borrow_mut() += 1)
                .unwrap();
        }

        device.dispose();
        device.dispose();
        assert_eq!(3, *disposed.borrow());
        assert_eq!(DeviceState::Disposed, device.state());
        assert_eq!(0, device.live_resource_count());
        assert_eq!(
            1,
            log.borrow()
                .count(|call| *call == NativeCall::Dispose)
        );
        assert!(matches!(
            device.present(),
            Err(GraphicsError::InvalidDeviceState {
                state: DeviceState::Disposed,
                ..
            })
        ));
    }

    #[test]
    fn end_to_end_1280x720() {
        let backend = HeadlessBackend::new();
        let params = PresentationParameters::new(WindowHandle::new(1), 1280, 720);
        let mut device = GraphicsDevice::new(Box::new(backend), adapter(0), params).unwrap();
        let params = device.presentation_parameters().clone();
        device.reset(params, adapter(0)).unwrap();
        assert_eq!(Viewport::new(0, 0, 1280, 720), device.viewport());
    }
}
