// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! A [`Platform`] and [`DeviceBackend`] that don't open any windows or talk
//! to any GPU, for testing.
//!
//! [`HeadlessBackend`] records every native call it receives into a
//! [`NativeCallLog`], which tests can inspect to check what the device
//! actually sent down. [`HeadlessPlatform`] plays back scripted events one
//! frame at a time with a manually advanced clock.

use core::time::Duration;
use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use tracing::debug;

use crate::{
    dispatch_event, ClearOptions, Color, DepthFormat, DeviceBackend, DisplayMode, EngineCallbacks,
    GameWindow, GraphicsAdapter, GraphicsDevice, GraphicsError, InputState, Instant, NativeBuffer,
    Platform, PlatformConfig, PlatformEvent, PresentIntervalValue, PresentationParameters,
    PrimitiveType, PumpControl, Rectangle, SetDataOptions, SurfaceFormat, VertexDeclaration,
    Viewport, WindowHandle, WindowSystem,
};

/// A call received by a [`HeadlessBackend`].
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum NativeCall {
    CreateVertexBuffer {
        buffer: NativeBuffer,
        size_in_bytes: usize,
        dynamic: bool,
    },
    BindVertexBuffer(Option<NativeBuffer>),
    SetVertexBufferData {
        buffer: NativeBuffer,
        offset_in_bytes: usize,
        len: usize,
        options: SetDataOptions,
    },
    DestroyVertexBuffer(NativeBuffer),
    DrawPrimitives {
        primitive: PrimitiveType,
        base_vertex: usize,
        vertex_start: usize,
        vertex_count: usize,
    },
    DrawUserPrimitives {
        primitive: PrimitiveType,
        vertex_count: usize,
        len: usize,
    },
    SetViewport(Viewport),
    SetScissorRectangle(Rectangle),
    SetClearColor(Color),
    SetClearDepth(f32),
    SetClearStencil(i32),
    Clear(ClearOptions),
    ResetBackBuffer {
        width: u32,
        height: u32,
        depth_stencil_format: DepthFormat,
        is_full_screen: bool,
    },
    SetSwapInterval(i32),
    Present,
    Dispose,
}

/// The calls a [`HeadlessBackend`] has received, and the contents of its
/// buffers. Shared between the backend and the test through an
/// `Rc<RefCell<_>>`, see [`HeadlessBackend::log`].
#[derive(Debug, Default)]
pub struct NativeCallLog {
    calls: Vec<NativeCall>,
    buffers: HashMap<NativeBuffer, Vec<u8>>,
    fail_next_reset: bool,
}

impl NativeCallLog {
    /// Every call received since the log was last cleared, in order.
    pub fn calls(&self) -> &[NativeCall] {
        &self.calls
    }

    /// The amount of calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&NativeCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    /// Forgets the calls received so far. Buffer contents are kept.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// The current contents of a live buffer.
    pub fn buffer_contents(&self, buffer: NativeBuffer) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    /// Makes the next [`DeviceBackend::reset_back_buffer`] call fail with
    /// [`GraphicsError::Native`].
    pub fn fail_next_reset(&mut self) {
        self.fail_next_reset = true;
    }
}

/// A [`DeviceBackend`] which only records the calls it gets.
///
/// It checks the binding rules a real API would silently misbehave on: uploads
/// and draws fail with [`GraphicsError::Native`] if the buffer they're meant
/// for isn't bound.
#[derive(Debug)]
pub struct HeadlessBackend {
    log: Rc<RefCell<NativeCallLog>>,
    allow_late_swap_tear: bool,
    accept_late_swap_tear: bool,
    bound_buffer: Option<NativeBuffer>,
    next_buffer: u64,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        HeadlessBackend::new()
    }
}

impl HeadlessBackend {
    /// Creates a backend with a fresh log, which allows and accepts adaptive
    /// vsync.
    pub fn new() -> HeadlessBackend {
        HeadlessBackend::with_log(Rc::new(RefCell::new(NativeCallLog::default())))
    }

    /// Creates a backend which records into an existing log.
    pub fn with_log(log: Rc<RefCell<NativeCallLog>>) -> HeadlessBackend {
        HeadlessBackend {
            log,
            allow_late_swap_tear: true,
            accept_late_swap_tear: true,
            bound_buffer: None,
            next_buffer: 1,
        }
    }

    /// The log this backend records into.
    pub fn log(&self) -> Rc<RefCell<NativeCallLog>> {
        self.log.clone()
    }

    /// Sets what [`DeviceBackend::supports_late_swap_tear`] returns.
    pub fn allow_late_swap_tear(mut self, allow: bool) -> HeadlessBackend {
        self.allow_late_swap_tear = allow;
        self
    }

    /// Makes the backend claim adaptive vsync support, but fail to set it,
    /// like some drivers do.
    pub fn reject_late_swap_tear(mut self) -> HeadlessBackend {
        self.accept_late_swap_tear = false;
        self
    }

    fn record(&self, call: NativeCall) {
        self.log.borrow_mut().calls.push(call);
    }

    fn ensure_bound(&self, buffer: NativeBuffer) -> Result<(), GraphicsError> {
        if self.bound_buffer == Some(buffer) {
            Ok(())
        } else {
            Err(GraphicsError::Native(format!(
                "{buffer:?} is not bound (bound: {:?})",
                self.bound_buffer
            )))
        }
    }
}

impl DeviceBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn supports_late_swap_tear(&self) -> bool {
        self.allow_late_swap_tear
    }

    fn create_vertex_buffer(
        &mut self,
        size_in_bytes: usize,
        dynamic: bool,
    ) -> Result<NativeBuffer, GraphicsError> {
        let buffer = NativeBuffer::new(self.next_buffer);
        self.next_buffer += 1;
        self.bound_buffer = Some(buffer);
        self.record(NativeCall::CreateVertexBuffer {
            buffer,
            size_in_bytes,
            dynamic,
        });
        self.log
            .borrow_mut()
            .buffers
            .insert(buffer, vec![0; size_in_bytes]);
        Ok(buffer)
    }

    fn bind_vertex_buffer(&mut self, buffer: Option<NativeBuffer>) {
        self.bound_buffer = buffer;
        self.record(NativeCall::BindVertexBuffer(buffer));
    }

    fn set_vertex_buffer_data(
        &mut self,
        buffer: NativeBuffer,
        offset_in_bytes: usize,
        data: &[u8],
        buffer_size: usize,
        options: SetDataOptions,
    ) -> Result<(), GraphicsError> {
        self.ensure_bound(buffer)?;
        self.record(NativeCall::SetVertexBufferData {
            buffer,
            offset_in_bytes,
            len: data.len(),
            options,
        });
        let mut log = self.log.borrow_mut();
        let contents = log
            .buffers
            .get_mut(&buffer)
            .ok_or_else(|| GraphicsError::Native(format!("{buffer:?} does not exist")))?;
        if options == SetDataOptions::Discard {
            *contents = vec![0; buffer_size];
        }
        contents[offset_in_bytes..offset_in_bytes + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn destroy_vertex_buffer(&mut self, buffer: NativeBuffer) {
        if self.bound_buffer == Some(buffer) {
            self.bound_buffer = None;
        }
        self.record(NativeCall::DestroyVertexBuffer(buffer));
        self.log.borrow_mut().buffers.remove(&buffer);
    }

    fn draw_primitives(
        &mut self,
        primitive: PrimitiveType,
        _declaration: &VertexDeclaration,
        base_vertex: usize,
        vertex_start: usize,
        vertex_count: usize,
    ) -> Result<(), GraphicsError> {
        if self.bound_buffer.is_none() {
            return Err(GraphicsError::Native("draw without a bound buffer".into()));
        }
        self.record(NativeCall::DrawPrimitives {
            primitive,
            base_vertex,
            vertex_start,
            vertex_count,
        });
        Ok(())
    }

    fn draw_user_primitives(
        &mut self,
        primitive: PrimitiveType,
        _declaration: &VertexDeclaration,
        vertex_data: &[u8],
        vertex_count: usize,
    ) -> Result<(), GraphicsError> {
        self.record(NativeCall::DrawUserPrimitives {
            primitive,
            vertex_count,
            len: vertex_data.len(),
        });
        Ok(())
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.record(NativeCall::SetViewport(*viewport));
    }

    fn set_scissor_rectangle(&mut self, scissor_rectangle: &Rectangle) {
        self.record(NativeCall::SetScissorRectangle(*scissor_rectangle));
    }

    fn set_clear_color(&mut self, color: Color) {
        self.record(NativeCall::SetClearColor(color));
    }

    fn set_clear_depth(&mut self, depth: f32) {
        self.record(NativeCall::SetClearDepth(depth));
    }

    fn set_clear_stencil(&mut self, stencil: i32) {
        self.record(NativeCall::SetClearStencil(stencil));
    }

    fn clear(&mut self, options: ClearOptions) {
        self.record(NativeCall::Clear(options));
    }

    fn reset_back_buffer(
        &mut self,
        parameters: &PresentationParameters,
    ) -> Result<(), GraphicsError> {
        self.record(NativeCall::ResetBackBuffer {
            width: parameters.back_buffer_width,
            height: parameters.back_buffer_height,
            depth_stencil_format: parameters.depth_stencil_format,
            is_full_screen: parameters.is_full_screen,
        });
        let mut log = self.log.borrow_mut();
        if log.fail_next_reset {
            log.fail_next_reset = false;
            return Err(GraphicsError::Native("back buffer reset failed".into()));
        }
        Ok(())
    }

    fn set_swap_interval(&mut self, interval: i32) -> Result<(), GraphicsError> {
        self.record(NativeCall::SetSwapInterval(interval));
        match interval {
            -1 if !self.accept_late_swap_tear => Err(GraphicsError::Native(
                "late swap tearing is not supported".into(),
            )),
            -1..=2 => Ok(()),
            _ => Err(GraphicsError::UnsupportedPresentInterval(
                PresentIntervalValue::Raw(interval),
            )),
        }
    }

    fn present(&mut self) -> Result<(), GraphicsError> {
        self.record(NativeCall::Present);
        Ok(())
    }

    fn dispose(&mut self) {
        self.bound_buffer = None;
        self.record(NativeCall::Dispose);
    }
}

/// The OS switches of a [`HeadlessPlatform`], as plain fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct HeadlessWindowSystem {
    pub screen_saver_enabled: bool,
    pub fullscreen: bool,
    pub desktop_space_fullscreen: bool,
}

impl Default for HeadlessWindowSystem {
    fn default() -> Self {
        HeadlessWindowSystem {
            screen_saver_enabled: true,
            fullscreen: false,
            desktop_space_fullscreen: true,
        }
    }
}

impl WindowSystem for HeadlessWindowSystem {
    fn set_screen_saver_enabled(&mut self, enabled: bool) {
        self.screen_saver_enabled = enabled;
    }

    fn set_fullscreen(&mut self, _window: WindowHandle, fullscreen: bool) -> Result<(), GraphicsError> {
        self.fullscreen = fullscreen;
        Ok(())
    }

    fn uses_desktop_space_fullscreen(&self) -> bool {
        self.desktop_space_fullscreen
    }
}

/// A [`Platform`] running a fixed amount of frames of scripted events.
///
/// Every frame, the next batch of events pushed with
/// [`HeadlessPlatform::push_frame`] is dispatched, then the engine ticks, and
/// then the clock advances by the frame step. The run loop ends when the
/// engine stops running, or after the frame limit, whichever comes first.
#[derive(Debug)]
pub struct HeadlessPlatform {
    config: PlatformConfig,
    adapters: Vec<GraphicsAdapter>,
    log: Rc<RefCell<NativeCallLog>>,
    reject_late_swap_tear: bool,
    frames: VecDeque<Vec<PlatformEvent>>,
    frame_limit: u32,
    frames_run: u32,
    frame_step: Duration,
    elapsed: Duration,
    input: InputState,
    window_system: HeadlessWindowSystem,
    next_window: u64,
    client_size: (u32, u32),
    disposed_windows: Vec<WindowHandle>,
}

impl HeadlessPlatform {
    /// Creates a platform with two 1080p displays and a 60 Hz clock, which
    /// runs for at most 60 frames.
    pub fn new(config: PlatformConfig) -> HeadlessPlatform {
        let adapters = (0..2)
            .map(|index| {
                let current = DisplayMode::new(1920, 1080, SurfaceFormat::Color);
                let modes = [
                    DisplayMode::new(1280, 720, SurfaceFormat::Color),
                    current,
                ];
                GraphicsAdapter::new(
                    index,
                    format!("headless display {index}"),
                    "Headless".into(),
                    modes,
                    current,
                )
            })
            .collect();
        let window_system = HeadlessWindowSystem {
            desktop_space_fullscreen: config.desktop_space_fullscreen,
            ..Default::default()
        };
        HeadlessPlatform {
            client_size: (config.back_buffer_width, config.back_buffer_height),
            config,
            adapters,
            log: Rc::new(RefCell::new(NativeCallLog::default())),
            reject_late_swap_tear: false,
            frames: VecDeque::new(),
            frame_limit: 60,
            frames_run: 0,
            frame_step: Duration::from_micros(16_667),
            elapsed: Duration::ZERO,
            input: InputState::default(),
            window_system,
            next_window: 1,
            disposed_windows: Vec::new(),
        }
    }

    /// The log shared by every device this platform creates.
    pub fn log(&self) -> Rc<RefCell<NativeCallLog>> {
        self.log.clone()
    }

    /// Queues the events to dispatch in the next frame without events queued.
    pub fn push_frame(&mut self, events: impl IntoIterator<Item = PlatformEvent>) {
        self.frames.push_back(events.into_iter().collect());
    }

    /// Sets the amount of frames after which the run loop stops on its own.
    pub fn set_frame_limit(&mut self, frames: u32) {
        self.frame_limit = frames;
    }

    /// Sets how much the clock advances after each frame.
    pub fn set_frame_step(&mut self, step: Duration) {
        self.frame_step = step;
    }

    /// Moves the clock to `elapsed` after the reference point.
    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// Makes devices created after this reject adaptive vsync.
    pub fn reject_late_swap_tear(&mut self) {
        self.reject_late_swap_tear = true;
    }

    /// The amount of frames run so far, over all run loops.
    pub fn frames_run(&self) -> u32 {
        self.frames_run
    }

    #[allow(missing_docs)]
    pub fn window_system(&self) -> &HeadlessWindowSystem {
        &self.window_system
    }

    /// The windows passed to [`Platform::dispose_window`], in order.
    pub fn disposed_windows(&self) -> &[WindowHandle] {
        &self.disposed_windows
    }
}

impl Platform for HeadlessPlatform {
    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    fn adapters(&self) -> &[GraphicsAdapter] {
        &self.adapters
    }

    fn create_window(&mut self, title: &str) -> Result<GameWindow, GraphicsError> {
        let handle = WindowHandle::new(self.next_window);
        self.next_window += 1;
        self.client_size = (self.config.back_buffer_width, self.config.back_buffer_height);
        let device_name = self
            .adapters
            .get(self.config.adapter_index)
            .map(|adapter| adapter.device_name().to_owned())
            .unwrap_or_default();
        debug!(?handle, title, "created headless window");
        Ok(GameWindow::new(
            handle,
            title.to_owned(),
            device_name,
            self.config.allow_user_resizing,
        ))
    }

    fn create_graphics_device(
        &mut self,
        _window: &GameWindow,
        parameters: PresentationParameters,
        adapter_index: usize,
    ) -> Result<GraphicsDevice, GraphicsError> {
        let adapter = self
            .adapters
            .get(adapter_index)
            .cloned()
            .ok_or(GraphicsError::AdapterUnavailable(adapter_index))?;
        let mut backend = HeadlessBackend::with_log(self.log.clone())
            .allow_late_swap_tear(!self.config.disable_late_swap_tear);
        if self.reject_late_swap_tear {
            backend = backend.reject_late_swap_tear();
        }
        GraphicsDevice::new(Box::new(backend), adapter, parameters)
    }

    fn client_bounds(&self, _window: &GameWindow) -> Rectangle {
        let (width, height) = self.client_size;
        Rectangle::new(0, 0, width as i32, height as i32)
    }

    fn run_loop(&mut self, engine: &mut dyn EngineCallbacks) -> Result<(), GraphicsError> {
        engine.set_active(true);
        let mut frames_this_run = 0;
        while engine.run_application() {
            if frames_this_run >= self.frame_limit {
                debug!(frames_this_run, "headless frame limit reached");
                engine.stop_running();
                break;
            }

            for event in self.frames.pop_front().unwrap_or_default() {
                if let PlatformEvent::Resized { width, height, .. } = event {
                    self.client_size = (width, height);
                }
                let control = dispatch_event(
                    event,
                    engine,
                    &mut self.input,
                    &self.adapters,
                    &mut self.window_system,
                )?;
                if control == PumpControl::Stop {
                    break;
                }
            }

            engine.tick(self.now(), &self.input)?;
            self.elapsed += self.frame_step;
            self.frames_run += 1;
            frames_this_run += 1;
        }
        engine.exit();
        Ok(())
    }

    fn dispose_window(&mut self, window: &mut GameWindow) {
        debug!(handle = ?window.handle(), "disposing headless window");
        self.disposed_windows.push(window.handle());
    }

    fn now(&self) -> Instant {
        Instant::reference() + self.elapsed
    }
}
