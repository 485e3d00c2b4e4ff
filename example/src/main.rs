// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

mod cli;
mod game;
mod settings;

#[cfg(feature = "sdl2")]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use engine::Engine;
    use game::{DemoGame, DemoKeys};
    use platform_sdl2::{key_for_scancode, Scancode, Sdl2Platform};

    let options = cli::options().run();
    tracing_subscriber::fmt()
        .with_max_level(options.verbosity_level)
        .init();

    let mut config = settings::read(&options.settings_path)?.into_platform_config();
    options.apply_overrides(&mut config);
    tracing::debug!(?config, "platform configuration");

    let mut platform = Sdl2Platform::new(config).context("Failed to initialize SDL")?;
    let game = DemoGame::new(DemoKeys {
        exit: key_for_scancode(Scancode::Escape),
        toggle_fullscreen: key_for_scancode(Scancode::F),
    })?;
    let mut engine = Engine::new(game, "example game");
    let result = engine.run(&mut platform).context("The game loop failed");
    engine.dispose(&mut platform);
    result
}

#[cfg(not(any(feature = "sdl2")))]
fn main() {
    compile_error!("at least one of the following platform features is required: 'sdl2'");
}
