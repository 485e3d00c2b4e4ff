// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! [`Platform`] implementation on top of SDL 2, with an OpenGL and an
//! `SDL_Renderer` graphics backend.

mod adapters;
mod events;
mod gl;
mod opengl;
mod renderer;

use std::{cell::RefCell, collections::HashMap, env, rc::Rc};

use platform::{
    dispatch_event, BackendKind, DeviceBackend, EngineCallbacks, GameWindow, GraphicsAdapter,
    GraphicsDevice, GraphicsError, InputState, Instant, Platform, PlatformConfig,
    PresentationParameters, PumpControl, Rectangle, WindowHandle, WindowSystem,
};
use sdl2::{
    video::{FullscreenType, GLProfile, Window},
    EventPump, Sdl, VideoSubsystem,
};
use tracing::{debug, warn};

pub use events::key_for_scancode;
pub use opengl::{OpenGlBackend, OpenGlOptions};
pub use renderer::SdlRendererBackend;
pub use sdl2::keyboard::Scancode;

/// Setting this environment variable to 1 stops the platform from ever
/// requesting adaptive vsync.
pub const DISABLE_LATE_SWAP_TEAR_VAR: &str = "PLATFORM_SDL2_DISABLE_LATE_SWAP_TEAR";

/// Windows, events and displays through SDL 2. Windows are shared with the
/// graphics backends, so a window's native resources are released once both
/// the platform and the device are done with it.
pub struct Sdl2Platform {
    config: PlatformConfig,
    _sdl: Sdl,
    video: VideoSubsystem,
    event_pump: EventPump,
    adapters: Vec<GraphicsAdapter>,
    windows: HashMap<WindowHandle, Rc<RefCell<Window>>>,
    input: InputState,
    start_time: std::time::Instant,
}

impl Sdl2Platform {
    /// Initializes SDL and its video subsystem, and enumerates the displays.
    pub fn new(config: PlatformConfig) -> Result<Sdl2Platform, GraphicsError> {
        let sdl = sdl2::init().map_err(GraphicsError::DeviceCreation)?;
        let video = sdl.video().map_err(GraphicsError::DeviceCreation)?;
        let event_pump = sdl.event_pump().map_err(GraphicsError::DeviceCreation)?;
        let adapters = adapters::enumerate_adapters(&video)?;
        debug!(
            driver = video.current_video_driver(),
            displays = adapters.len(),
            "initialized SDL",
        );
        Ok(Sdl2Platform {
            config,
            _sdl: sdl,
            video,
            event_pump,
            adapters,
            windows: HashMap::new(),
            input: InputState::default(),
            start_time: std::time::Instant::now(),
        })
    }

    fn set_gl_attributes(&self) {
        let attributes = self.video.gl_attr();
        attributes.set_red_size(8);
        attributes.set_green_size(8);
        attributes.set_blue_size(8);
        attributes.set_alpha_size(8);
        attributes.set_depth_size(24);
        attributes.set_stencil_size(8);
        attributes.set_double_buffer(true);
        if cfg!(debug_assertions) {
            attributes.set_context_flags().debug().set();
        }
        if self.config.gl_core_profile {
            attributes.set_context_profile(GLProfile::Core);
            attributes.set_context_version(3, 2);
        }
    }

    fn late_swap_tear_allowed(&self) -> bool {
        late_swap_tear_allowed(
            self.config.disable_late_swap_tear,
            env::var(DISABLE_LATE_SWAP_TEAR_VAR).ok().as_deref(),
            cfg!(target_os = "macos"),
        )
    }
}

impl Platform for Sdl2Platform {
    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    fn adapters(&self) -> &[GraphicsAdapter] {
        &self.adapters
    }

    fn create_window(&mut self, title: &str) -> Result<GameWindow, GraphicsError> {
        let opengl = self.config.backend == BackendKind::OpenGl;
        if opengl {
            self.set_gl_attributes();
        }

        let mut builder = self.video.window(
            title,
            self.config.back_buffer_width,
            self.config.back_buffer_height,
        );
        builder.set_window_flags(
            sdl2_sys::SDL_WindowFlags::SDL_WINDOW_INPUT_FOCUS as u32
                | sdl2_sys::SDL_WindowFlags::SDL_WINDOW_MOUSE_FOCUS as u32,
        );
        builder.hidden().position_centered().allow_highdpi();
        if opengl {
            builder.opengl();
        }
        if self.config.allow_user_resizing {
            builder.resizable();
        }
        let window = builder
            .build()
            .map_err(|err| GraphicsError::DeviceCreation(err.to_string()))?;

        let handle = WindowHandle::new(u64::from(window.id()));
        let device_name = window
            .display_index()
            .ok()
            .and_then(|index| self.adapters.get(index.max(0) as usize))
            .map(|adapter| adapter.device_name().to_owned())
            .unwrap_or_default();
        debug!(?handle, title, opengl, "created window");
        self.windows.insert(handle, Rc::new(RefCell::new(window)));
        Ok(GameWindow::new(
            handle,
            title.to_owned(),
            device_name,
            self.config.allow_user_resizing,
        ))
    }

    fn create_graphics_device(
        &mut self,
        window: &GameWindow,
        parameters: PresentationParameters,
        adapter_index: usize,
    ) -> Result<GraphicsDevice, GraphicsError> {
        let adapter = self
            .adapters
            .get(adapter_index)
            .cloned()
            .ok_or(GraphicsError::AdapterUnavailable(adapter_index))?;
        let native_window = self.windows.get(&window.handle()).cloned().ok_or_else(|| {
            GraphicsError::DeviceCreation(format!("unknown window {:?}", window.handle()))
        })?;

        let backend: Box<dyn DeviceBackend> = match self.config.backend {
            BackendKind::OpenGl => Box::new(OpenGlBackend::new(
                &self.video,
                native_window,
                OpenGlOptions {
                    core_profile: self.config.gl_core_profile,
                    late_swap_tear: self.late_swap_tear_allowed(),
                    desktop_space_fullscreen: self.config.desktop_space_fullscreen,
                },
            )?),
            BackendKind::SdlRenderer => Box::new(SdlRendererBackend::new(
                native_window,
                self.config.desktop_space_fullscreen,
            )?),
        };
        GraphicsDevice::new(backend, adapter, parameters)
    }

    fn client_bounds(&self, window: &GameWindow) -> Rectangle {
        match self.windows.get(&window.handle()) {
            Some(native_window) => {
                let (width, height) = native_window.borrow().size();
                Rectangle::new(0, 0, width as i32, height as i32)
            }
            None => Rectangle::default(),
        }
    }

    fn run_loop(&mut self, engine: &mut dyn EngineCallbacks) -> Result<(), GraphicsError> {
        for window in self.windows.values() {
            window.borrow_mut().show();
        }
        engine.set_active(true);

        while engine.run_application() {
            let Sdl2Platform {
                config,
                video,
                event_pump,
                adapters,
                windows,
                input,
                ..
            } = self;
            let mut window_system = SdlWindowSystem {
                video,
                windows,
                desktop_space_fullscreen: config.desktop_space_fullscreen,
            };
            for sdl_event in event_pump.poll_iter() {
                let Some(translated) = events::translate_event(&sdl_event) else {
                    continue;
                };
                if let Some(window_id) = translated.window_id {
                    if !window_system
                        .windows
                        .contains_key(&WindowHandle::new(u64::from(window_id)))
                    {
                        warn!(window_id, event = ?translated.event, "event for an unknown window");
                        continue;
                    }
                }
                let control = dispatch_event(
                    translated.event,
                    engine,
                    input,
                    adapters,
                    &mut window_system,
                )?;
                if control == PumpControl::Stop {
                    break;
                }
            }

            engine.tick(self.now(), &self.input)?;
        }

        engine.exit();
        Ok(())
    }

    fn dispose_window(&mut self, window: &mut GameWindow) {
        // Without this, SDL would minimize a fullscreen window as it loses
        // focus during destruction.
        sdl2::hint::set("SDL_VIDEO_MINIMIZE_ON_FOCUS_LOSS", "0");
        if self.windows.remove(&window.handle()).is_some() {
            debug!(handle = ?window.handle(), "disposed window");
        }
    }

    fn now(&self) -> Instant {
        Instant::reference() + self.start_time.elapsed()
    }
}

struct SdlWindowSystem<'a> {
    video: &'a VideoSubsystem,
    windows: &'a HashMap<WindowHandle, Rc<RefCell<Window>>>,
    desktop_space_fullscreen: bool,
}

impl WindowSystem for SdlWindowSystem<'_> {
    fn set_screen_saver_enabled(&mut self, enabled: bool) {
        if enabled {
            self.video.enable_screen_saver();
        } else {
            self.video.disable_screen_saver();
        }
    }

    fn set_fullscreen(
        &mut self,
        window: WindowHandle,
        fullscreen: bool,
    ) -> Result<(), GraphicsError> {
        let native_window = self
            .windows
            .get(&window)
            .ok_or_else(|| GraphicsError::Native(format!("unknown window {window:?}")))?;
        let mode = fullscreen_type(fullscreen, self.desktop_space_fullscreen);
        native_window
            .borrow_mut()
            .set_fullscreen(mode)
            .map_err(GraphicsError::Native)
    }

    fn uses_desktop_space_fullscreen(&self) -> bool {
        self.desktop_space_fullscreen
    }
}

/// Makes the window match the presentation parameters: fullscreen state,
/// and the client area size when windowed.
pub(crate) fn apply_window_parameters(
    window: &RefCell<Window>,
    parameters: &PresentationParameters,
    desktop_space_fullscreen: bool,
) -> Result<(), GraphicsError> {
    let mut window = window.borrow_mut();
    let mode = fullscreen_type(parameters.is_full_screen, desktop_space_fullscreen);
    if window.fullscreen_state() != mode {
        window.set_fullscreen(mode).map_err(GraphicsError::Native)?;
    }
    let size = (parameters.back_buffer_width, parameters.back_buffer_height);
    if !parameters.is_full_screen && window.size() != size {
        window
            .set_size(size.0, size.1)
            .map_err(|err| GraphicsError::Native(err.to_string()))?;
    }
    Ok(())
}

fn fullscreen_type(fullscreen: bool, desktop_space_fullscreen: bool) -> FullscreenType {
    match (fullscreen, desktop_space_fullscreen) {
        (false, _) => FullscreenType::Off,
        (true, true) => FullscreenType::Desktop,
        (true, false) => FullscreenType::True,
    }
}

fn late_swap_tear_allowed(
    disabled_by_config: bool,
    environment_override: Option<&str>,
    macos: bool,
) -> bool {
    if disabled_by_config || environment_override == Some("1") {
        return false;
    }
    // Adaptive vsync is unreliable on macOS.
    !macos
}

#[cfg(test)]
mod tests {
    use sdl2::video::FullscreenType;

    use super::{fullscreen_type, late_swap_tear_allowed};

    #[test]
    fn late_swap_tear_can_be_disabled() {
        assert!(late_swap_tear_allowed(false, None, false));
        assert!(!late_swap_tear_allowed(true, None, false));
        assert!(!late_swap_tear_allowed(false, Some("1"), false));
        assert!(!late_swap_tear_allowed(false, None, true));
        assert!(
            late_swap_tear_allowed(false, Some("0"), false),
            "only 1 should disable late swap tearing",
        );
    }

    #[test]
    fn fullscreen_respects_desktop_space_setting() {
        assert_eq!(FullscreenType::Off, fullscreen_type(false, true));
        assert_eq!(FullscreenType::Desktop, fullscreen_type(true, true));
        assert_eq!(FullscreenType::True, fullscreen_type(true, false));
    }
}
