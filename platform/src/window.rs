// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::{Rectangle, Signal};

/// Platform-specific window reference. The window itself is owned by the
/// platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(u64);

impl WindowHandle {
    /// Creates a new [`WindowHandle`]. Should only be created in the platform
    /// implementation, which also knows how the inner value is going to be
    /// used.
    pub const fn new(id: u64) -> WindowHandle {
        WindowHandle(id)
    }

    /// Returns the inner value passed into [`WindowHandle::new`]. Generally
    /// only relevant to the platform implementation.
    pub const fn inner(self) -> u64 {
        self.0
    }
}

/// The window a game is presented in, created with
/// [`Platform::create_window`](crate::Platform::create_window).
///
/// The client area's size is queried live with
/// [`Platform::client_bounds`](crate::Platform::client_bounds), since it can
/// change at any time the OS feels like it.
#[derive(Debug)]
pub struct GameWindow {
    handle: WindowHandle,
    title: String,
    device_name: String,
    allow_user_resizing: bool,
    /// Emitted with the new client bounds when the user resizes the window.
    pub client_size_changed: Signal<Rectangle>,
}

impl GameWindow {
    #[allow(missing_docs)]
    pub fn new(
        handle: WindowHandle,
        title: String,
        device_name: String,
        allow_user_resizing: bool,
    ) -> GameWindow {
        GameWindow {
            handle,
            title,
            device_name,
            allow_user_resizing,
            client_size_changed: Signal::new(),
        }
    }

    #[allow(missing_docs)]
    pub fn handle(&self) -> WindowHandle {
        self.handle
    }

    #[allow(missing_docs)]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Name of the display the window was created on.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// If false, user-initiated resizes are not passed on to the engine.
    pub fn allow_user_resizing(&self) -> bool {
        self.allow_user_resizing
    }
}
