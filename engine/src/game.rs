// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::time::Duration;

use platform::{GameWindow, GraphicsDevice, GraphicsError, InputState};

/// Time passed in the game, handed to [`Game::update`] and [`Game::draw`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GameTime {
    /// Time since the previous tick. Zero for the first tick.
    pub elapsed: Duration,
    /// Time since the first tick.
    pub total: Duration,
}

/// What the game can reach during its callbacks.
pub struct GameContext<'a> {
    #[allow(missing_docs)]
    pub device: &'a mut GraphicsDevice,
    #[allow(missing_docs)]
    pub window: &'a mut GameWindow,
    /// The input state as of the start of this tick.
    pub input: &'a InputState,
    pub(crate) is_active: bool,
    pub(crate) exit_requested: bool,
}

impl GameContext<'_> {
    /// True if the game window has input focus.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Asks the engine to stop after this tick. The current tick finishes
    /// normally, but nothing more is drawn.
    pub fn exit(&mut self) {
        self.exit_requested = true;
    }
}

/// The game-specific parts of the run loop, driven by an
/// [`Engine`](crate::Engine).
///
/// Each tick runs [`Game::update`], and then, unless the engine is exiting,
/// [`Game::begin_draw`] and [`Game::draw`] (if `begin_draw` returned true).
pub trait Game {
    /// Called once, after the window and the graphics device are created.
    fn initialize(&mut self, context: &mut GameContext) -> Result<(), GraphicsError> {
        let _ = context;
        Ok(())
    }

    /// Called right before the run loop starts.
    fn begin_run(&mut self, context: &mut GameContext) {
        let _ = context;
    }

    /// Advances the game state.
    fn update(&mut self, context: &mut GameContext, time: &GameTime) -> Result<(), GraphicsError>;

    /// Returning false skips this tick's [`Game::draw`] and the present
    /// following it.
    fn begin_draw(&mut self, context: &mut GameContext) -> bool {
        let _ = context;
        true
    }

    /// Draws the frame. The engine presents it afterwards.
    fn draw(&mut self, context: &mut GameContext, time: &GameTime) -> Result<(), GraphicsError>;

    /// Called right after the run loop ends.
    fn end_run(&mut self) {}

    /// Called while the engine is being disposed, before the graphics device
    /// is. Resources the game created should be disposed here, anything left
    /// over is reported as leaked by the device.
    fn unload_content(&mut self, device: &mut GraphicsDevice) {
        let _ = device;
    }

    /// Called when the window gains or loses focus.
    fn active_changed(&mut self, active: bool) {
        let _ = active;
    }
}
