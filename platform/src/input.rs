// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use arrayvec::ArrayVec;
use enum_map::{Enum, EnumMap};
use tracing::trace;

/// A keyboard key, identified by the platform's key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(u32);

impl Key {
    /// Creates a new [`Key`]. Should only be created in the platform
    /// implementation, which also knows how the inner value is going to be
    /// used.
    pub const fn new(code: u32) -> Key {
        Key(code)
    }

    /// Returns the inner value passed into [`Key::new`]. Generally only
    /// relevant to the platform implementation.
    pub const fn inner(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
#[allow(missing_docs)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    X1,
    X2,
}

/// The maximum amount of keys tracked as held down at the same time. Presses
/// beyond this are ignored until some key is released.
pub const MAX_HELD_KEYS: usize = 32;

/// Snapshot of the keyboard and mouse, maintained by the platform's event
/// pump and passed to the engine once per tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    held_keys: ArrayVec<Key, MAX_HELD_KEYS>,
    buttons: EnumMap<MouseButton, bool>,
    mouse_position: (i32, i32),
    scroll_wheel_value: i32,
}

impl InputState {
    #[allow(missing_docs)]
    pub fn is_key_down(&self, key: Key) -> bool {
        self.held_keys.contains(&key)
    }

    /// The keys currently held down, in the order they were pressed.
    pub fn held_keys(&self) -> &[Key] {
        &self.held_keys
    }

    #[allow(missing_docs)]
    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons[button]
    }

    /// The mouse position in window client coordinates.
    pub fn mouse_position(&self) -> (i32, i32) {
        self.mouse_position
    }

    /// The sum of all scroll wheel movement since the platform started.
    pub fn scroll_wheel_value(&self) -> i32 {
        self.scroll_wheel_value
    }

    /// Marks the key as held down.
    pub fn press_key(&mut self, key: Key) {
        if self.is_key_down(key) {
            return;
        }
        if self.held_keys.try_push(key).is_err() {
            trace!(?key, "too many keys held down, ignoring key press");
        }
    }

    #[allow(missing_docs)]
    pub fn release_key(&mut self, key: Key) {
        self.held_keys.retain(|held| *held != key);
    }

    #[allow(missing_docs)]
    pub fn set_button(&mut self, button: MouseButton, down: bool) {
        self.buttons[button] = down;
    }

    #[allow(missing_docs)]
    pub fn set_mouse_position(&mut self, x: i32, y: i32) {
        self.mouse_position = (x, y);
    }

    /// Adds wheel movement to [`InputState::scroll_wheel_value`].
    pub fn scroll(&mut self, delta: i32) {
        self.scroll_wheel_value = self.scroll_wheel_value.saturating_add(delta);
    }
}
