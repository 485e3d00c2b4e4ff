// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use tracing::{debug, trace};

use crate::{
    EngineCallbacks, GraphicsAdapter, GraphicsError, InputState, Key, MouseButton, WindowHandle,
};

/// A window system event, translated into a backend-neutral form by the
/// platform's event pump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlatformEvent {
    /// The user or the OS asked the application to close.
    Quit,
    /// The game window gained input focus.
    FocusGained,
    /// The game window lost input focus.
    FocusLost,
    /// The game window moved to another display.
    DisplayChanged {
        #[allow(missing_docs)]
        display_index: usize,
    },
    /// The game window's client area changed size.
    Resized {
        #[allow(missing_docs)]
        width: u32,
        #[allow(missing_docs)]
        height: u32,
        /// False if the resize was caused by the application itself, e.g.
        /// as a result of a device reset.
        user_initiated: bool,
    },
    #[allow(missing_docs)]
    KeyDown(Key),
    #[allow(missing_docs)]
    KeyUp(Key),
    #[allow(missing_docs)]
    MouseMotion { x: i32, y: i32 },
    #[allow(missing_docs)]
    MouseButtonDown(MouseButton),
    #[allow(missing_docs)]
    MouseButtonUp(MouseButton),
    #[allow(missing_docs)]
    MouseWheel { delta: i32 },
}

/// OS-level switches the event policy in [`dispatch_event`] flips.
pub trait WindowSystem {
    /// Allow or suppress the screen saver.
    fn set_screen_saver_enabled(&mut self, enabled: bool);

    /// Switch the window in or out of (exclusive) fullscreen.
    fn set_fullscreen(&mut self, window: WindowHandle, fullscreen: bool)
        -> Result<(), GraphicsError>;

    /// True if fullscreen windows are borderless desktop-sized windows,
    /// which don't need to be switched on focus changes.
    fn uses_desktop_space_fullscreen(&self) -> bool;
}

/// Whether the event pump should keep processing the current batch of
/// events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpControl {
    #[allow(missing_docs)]
    Continue,
    /// Drop the rest of this pump's events.
    Stop,
}

/// Applies the platform-independent reaction to a window system event.
///
/// - Focus changes update the engine's active state and the screen saver.
///   Exclusive fullscreen is dropped on focus loss and restored on focus
///   gain, following the device's presentation parameters.
/// - A display change resets the graphics device synchronously onto the new
///   display's adapter, keeping the current presentation parameters.
/// - User-initiated resizes reach the engine only if the window is
///   resizable.
/// - Quit stops the engine and the pump, see [`PumpControl::Stop`].
/// - Input events update `input`.
pub fn dispatch_event(
    event: PlatformEvent,
    engine: &mut dyn EngineCallbacks,
    input: &mut InputState,
    adapters: &[GraphicsAdapter],
    system: &mut dyn WindowSystem,
) -> Result<PumpControl, GraphicsError> {
    match event {
        PlatformEvent::Quit => {
            debug!("quit requested, stopping the run loop");
            engine.stop_running();
            return Ok(PumpControl::Stop);
        }

        PlatformEvent::FocusGained => {
            engine.set_active(true);
            if !system.uses_desktop_space_fullscreen() {
                if let Some(device) = engine.graphics_device() {
                    let params = device.presentation_parameters();
                    let (window, fullscreen) = (params.device_window_handle, params.is_full_screen);
                    system.set_fullscreen(window, fullscreen)?;
                }
            }
            system.set_screen_saver_enabled(false);
        }

        PlatformEvent::FocusLost => {
            if !system.uses_desktop_space_fullscreen() {
                if let Some(window) = engine.window().map(|window| window.handle()) {
                    system.set_fullscreen(window, false)?;
                }
            }
            engine.set_active(false);
            system.set_screen_saver_enabled(true);
        }

        PlatformEvent::DisplayChanged { display_index } => {
            let adapter = adapters
                .get(display_index)
                .cloned()
                .ok_or(GraphicsError::AdapterUnavailable(display_index))?;
            if let Some(device) = engine.graphics_device() {
                debug!(display_index, "window moved to another display");
                let params = device.presentation_parameters().clone();
                device.reset(params, adapter)?;
            }
        }

        PlatformEvent::Resized {
            width,
            height,
            user_initiated,
        } => {
            let resizable = engine
                .window()
                .is_some_and(|window| window.allow_user_resizing());
            if user_initiated && resizable {
                engine.client_size_changed(width, height)?;
            } else {
                trace!(width, height, user_initiated, resizable, "ignoring resize");
            }
        }

        PlatformEvent::KeyDown(key) => input.press_key(key),
        PlatformEvent::KeyUp(key) => input.release_key(key),
        PlatformEvent::MouseMotion { x, y } => input.set_mouse_position(x, y),
        PlatformEvent::MouseButtonDown(button) => input.set_button(button, true),
        PlatformEvent::MouseButtonUp(button) => input.set_button(button, false),
        PlatformEvent::MouseWheel { delta } => input.scroll(delta),
    }
    Ok(PumpControl::Continue)
}

#[cfg(test)]
mod tests {
    use super::{dispatch_event, PlatformEvent, PumpControl};
    use crate::{
        headless::{HeadlessBackend, HeadlessWindowSystem},
        DisplayMode, EngineCallbacks, GameWindow, GraphicsAdapter, GraphicsDevice, GraphicsError,
        InputState, Instant, Key, MouseButton, PresentationParameters, SurfaceFormat,
        WindowHandle,
    };

    struct RecordingEngine {
        running: bool,
        active: bool,
        window: GameWindow,
        device: GraphicsDevice,
        resizes: Vec<(u32, u32)>,
    }

    impl EngineCallbacks for RecordingEngine {
        fn run_application(&self) -> bool {
            self.running
        }
        fn stop_running(&mut self) {
            self.running = false;
        }
        fn set_active(&mut self, active: bool) {
            self.active = active;
        }
        fn window(&self) -> Option<&GameWindow> {
            Some(&self.window)
        }
        fn graphics_device(&mut self) -> Option<&mut GraphicsDevice> {
            Some(&mut self.device)
        }
        fn client_size_changed(&mut self, width: u32, height: u32) -> Result<(), GraphicsError> {
            self.resizes.push((width, height));
            Ok(())
        }
        fn tick(&mut self, _: Instant, _: &InputState) -> Result<(), GraphicsError> {
            Ok(())
        }
        fn exit(&mut self) {}
    }

    fn adapters() -> Vec<GraphicsAdapter> {
        (0..2)
            .map(|index| {
                let mode = DisplayMode::new(1920, 1080, SurfaceFormat::Color);
                GraphicsAdapter::new(index, format!("display {index}"), String::new(), [mode], mode)
            })
            .collect()
    }

    fn engine(resizable: bool, full_screen: bool) -> RecordingEngine {
        let handle = WindowHandle::new(1);
        let mut params = PresentationParameters::new(handle, 800, 480);
        params.is_full_screen = full_screen;
        let device =
            GraphicsDevice::new(Box::new(HeadlessBackend::new()), adapters().remove(0), params)
                .unwrap();
        RecordingEngine {
            running: true,
            active: false,
            window: GameWindow::new(handle, "test".into(), "display 0".into(), resizable),
            device,
            resizes: Vec::new(),
        }
    }

    fn dispatch(
        event: PlatformEvent,
        engine: &mut RecordingEngine,
        system: &mut HeadlessWindowSystem,
    ) -> Result<PumpControl, GraphicsError> {
        dispatch_event(event, engine, &mut InputState::default(), &adapters(), system)
    }

    #[test]
    fn focus_toggles_activity_and_screen_saver() {
        let mut engine = engine(false, false);
        let mut system = HeadlessWindowSystem::default();
        dispatch(PlatformEvent::FocusGained, &mut engine, &mut system).unwrap();
        assert!(engine.active);
        assert!(!system.screen_saver_enabled);
        dispatch(PlatformEvent::FocusLost, &mut engine, &mut system).unwrap();
        assert!(!engine.active);
        assert!(system.screen_saver_enabled);
    }

    #[test]
    fn exclusive_fullscreen_follows_focus() {
        let mut engine = engine(false, true);
        let mut system = HeadlessWindowSystem {
            desktop_space_fullscreen: false,
            ..Default::default()
        };
        dispatch(PlatformEvent::FocusGained, &mut engine, &mut system).unwrap();
        assert!(system.fullscreen);
        dispatch(PlatformEvent::FocusLost, &mut engine, &mut system).unwrap();
        assert!(!system.fullscreen);
    }

    #[test]
    fn desktop_fullscreen_is_left_alone() {
        let mut engine = engine(false, true);
        let mut system = HeadlessWindowSystem::default();
        dispatch(PlatformEvent::FocusGained, &mut engine, &mut system).unwrap();
        assert!(!system.fullscreen);
    }

    #[test]
    fn quit_stops_the_pump() {
        let mut engine = engine(false, false);
        let mut system = HeadlessWindowSystem::default();
        assert_eq!(
            Ok(PumpControl::Stop),
            dispatch(PlatformEvent::Quit, &mut engine, &mut system)
        );
        assert!(!engine.run_application());
    }

    #[test]
    fn display_change_resets_onto_the_new_adapter() {
        let mut engine = engine(false, false);
        let mut system = HeadlessWindowSystem::default();
        dispatch(
            PlatformEvent::DisplayChanged { display_index: 1 },
            &mut engine,
            &mut system,
        )
        .unwrap();
        assert_eq!(1, engine.device.adapter().index());
        assert_eq!(
            Err(GraphicsError::AdapterUnavailable(5)),
            dispatch(
                PlatformEvent::DisplayChanged { display_index: 5 },
                &mut engine,
                &mut system,
            )
        );
    }

    #[test]
    fn only_user_resizes_of_resizable_windows_reach_the_engine() {
        let resize = |user_initiated| PlatformEvent::Resized {
            width: 1024,
            height: 768,
            user_initiated,
        };
        let mut system = HeadlessWindowSystem::default();

        let mut fixed = engine(false, false);
        dispatch(resize(true), &mut fixed, &mut system).unwrap();
        assert!(fixed.resizes.is_empty());

        let mut resizable = engine(true, false);
        dispatch(resize(false), &mut resizable, &mut system).unwrap();
        dispatch(resize(true), &mut resizable, &mut system).unwrap();
        assert_eq!(vec![(1024, 768)], resizable.resizes);
    }

    #[test]
    fn input_events_update_the_snapshot() {
        let mut engine = engine(false, false);
        let mut system = HeadlessWindowSystem::default();
        let mut input = InputState::default();
        for event in [
            PlatformEvent::KeyDown(Key::new(27)),
            PlatformEvent::MouseButtonDown(MouseButton::Left),
            PlatformEvent::MouseMotion { x: 4, y: 2 },
            PlatformEvent::MouseWheel { delta: 1 },
        ] {
            dispatch_event(event, &mut engine, &mut input, &adapters(), &mut system).unwrap();
        }
        assert!(input.is_key_down(Key::new(27)));
        assert!(input.is_button_down(MouseButton::Left));
        assert_eq!((4, 2), input.mouse_position());
        assert_eq!(1, input.scroll_wheel_value());
    }
}
