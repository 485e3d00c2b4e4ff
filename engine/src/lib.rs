// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The run loop side of the engine: a [`Game`] is wrapped in an [`Engine`],
//! which creates the window and the graphics device through a
//! [`Platform`](platform::Platform), and then ticks the game from the
//! platform's run loop until it exits.

#![warn(missing_docs)]

mod engine;
mod game;

pub use engine::*;
pub use game::*;
