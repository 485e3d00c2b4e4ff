// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! This crate mainly revolves around the [`Platform`] trait and the
//! [`GraphicsDevice`], which together let the engine open a window, draw into
//! it and react to the window system, without depending on any particular
//! platform or graphics API.
//!
//! The device does all the state tracking and validation, and drives a
//! [`DeviceBackend`] for the actual native calls. Platform implementations
//! provide the backends, and translate their window system's events into
//! [`PlatformEvent`]s, which [`dispatch_event`] turns into engine callbacks.
//!
//! This is split off of the main engine crate so that the engine and the
//! platform implementation can be compiled independently, which appears to
//! speed up compilation time.

#![warn(missing_docs)]

mod adapter;
mod buffer;
mod color;
mod config;
mod device;
mod error;
mod event;
mod geom;
#[cfg(any(test, feature = "headless"))]
pub mod headless;
mod input;
mod presentation;
mod render;
mod resource;
mod signal;
mod time;
mod vertex;
mod window;

pub use adapter::*;
pub use buffer::*;
pub use color::*;
pub use config::*;
pub use device::*;
pub use error::*;
pub use event::*;
pub use geom::*;
pub use input::*;
pub use presentation::*;
pub use render::*;
pub use resource::*;
pub use signal::*;
pub use time::*;
pub use vertex::*;
pub use window::*;

/// Interface to the engine for the platform implementation.
///
/// Used by [`Platform::run_loop`] to drive the engine's ticks, and by
/// [`dispatch_event`] to pass window system events to it.
pub trait EngineCallbacks {
    /// True until the engine wants the run loop to end.
    fn run_application(&self) -> bool;

    /// Makes [`EngineCallbacks::run_application`] return false, ending the
    /// run loop at the start of its next iteration.
    fn stop_running(&mut self);

    /// Called when the game window gains or loses focus.
    fn set_active(&mut self, active: bool);

    /// The window the engine is presenting into, if it has one yet.
    fn window(&self) -> Option<&GameWindow>;

    /// The engine's graphics device, if it has one yet.
    fn graphics_device(&mut self) -> Option<&mut GraphicsDevice>;

    /// Called when the user has resized the window's client area.
    fn client_size_changed(&mut self, width: u32, height: u32) -> Result<(), GraphicsError>;

    /// Run one frame of the game loop. `input` is the input state after all
    /// of this frame's events.
    fn tick(&mut self, timestamp: Instant, input: &InputState) -> Result<(), GraphicsError>;

    /// Called once after the run loop has ended.
    fn exit(&mut self);
}

/// A trait for using platform-dependent features from the engine without
/// depending on any platform implementation directly. A platform
/// implementation should implement this trait, and run the engine's callbacks
/// in [`Platform::run_loop`].
///
/// This trait is object safe, and none of these functions are hot, so
/// `&mut dyn Platform` is used everywhere to avoid generics.
pub trait Platform {
    /// The configuration the platform was created with.
    fn config(&self) -> &PlatformConfig;

    /// The displays the platform can output to, enumerated once when the
    /// platform was created. The index of an adapter in this slice is its
    /// [`GraphicsAdapter::index`].
    fn adapters(&self) -> &[GraphicsAdapter];

    /// Creates the game window. The window starts hidden and is shown when
    /// the run loop starts.
    fn create_window(&mut self, title: &str) -> Result<GameWindow, GraphicsError>;

    /// Creates a graphics device presenting into `window`, on the adapter at
    /// `adapter_index`.
    fn create_graphics_device(
        &mut self,
        window: &GameWindow,
        parameters: PresentationParameters,
        adapter_index: usize,
    ) -> Result<GraphicsDevice, GraphicsError>;

    /// The current client area of the window.
    fn client_bounds(&self, window: &GameWindow) -> Rectangle;

    /// Runs the game loop until [`EngineCallbacks::run_application`] returns
    /// false: pump the window system's events through [`dispatch_event`],
    /// then [`EngineCallbacks::tick`], and repeat. Calls
    /// [`EngineCallbacks::exit`] at the end.
    fn run_loop(&mut self, engine: &mut dyn EngineCallbacks) -> Result<(), GraphicsError>;

    /// Destroys the native window.
    fn dispose_window(&mut self, window: &mut GameWindow);

    /// Returns the current point in time according to the platform
    /// implementation.
    fn now(&self) -> Instant;
}
