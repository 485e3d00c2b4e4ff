// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use bpaf::{batteries::verbose_by_slice, construct, long, OptionParser, Parser};
use platform::{BackendKind, PlatformConfig};
use tracing::level_filters::LevelFilter;

#[derive(Debug, Clone)]
pub struct Options {
    pub verbosity_level: LevelFilter,
    pub settings_path: PathBuf,
    pub backend: Option<BackendKind>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fullscreen: bool,
    pub resizable: bool,
    pub core_profile: bool,
}

impl Options {
    /// Overrides the settings file's values with the ones passed on the
    /// command line.
    pub fn apply_overrides(&self, config: &mut PlatformConfig) {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(width) = self.width {
            config.back_buffer_width = width;
        }
        if let Some(height) = self.height {
            config.back_buffer_height = height;
        }
        config.fullscreen |= self.fullscreen;
        config.allow_user_resizing |= self.resizable;
        config.gl_core_profile |= self.core_profile;
    }
}

pub fn options() -> OptionParser<Options> {
    let verbosity_level = verbose_by_slice(
        3,
        [
            LevelFilter::OFF,
            LevelFilter::ERROR,
            LevelFilter::WARN,
            LevelFilter::INFO,
            LevelFilter::DEBUG,
            LevelFilter::TRACE,
        ],
    );

    let settings_path = long("settings")
        .help("The settings file to read, defaults are used if it doesn't exist")
        .argument("FILE")
        .fallback(PathBuf::from("settings.json"));

    let backend = long("backend")
        .help("Graphics backend: opengl or sdl-renderer")
        .argument::<BackendKind>("BACKEND")
        .optional();

    let width = long("width")
        .help("Initial back buffer width")
        .argument::<u32>("PIXELS")
        .optional();

    let height = long("height")
        .help("Initial back buffer height")
        .argument::<u32>("PIXELS")
        .optional();

    let fullscreen = long("fullscreen").help("Start in fullscreen").switch();
    let resizable = long("resizable")
        .help("Let the user resize the window")
        .switch();
    let core_profile = long("core-profile")
        .help("Request an OpenGL 3.2 core profile context")
        .switch();

    construct!(Options {
        verbosity_level,
        settings_path,
        backend,
        width,
        height,
        fullscreen,
        resizable,
        core_profile,
    })
    .to_options()
    .descr("Draws a few triangles through the graphics device")
}

#[cfg(test)]
mod tests {
    use platform::{BackendKind, PlatformConfig};

    use super::options;

    #[test]
    fn check_bpaf_invariants() {
        options().check_invariants(true);
    }

    #[test]
    fn flags_override_settings() {
        let options = options()
            .run_inner(&["--backend", "sdl-renderer", "--width", "1280", "--fullscreen"])
            .unwrap();
        let mut config = PlatformConfig::default();
        options.apply_overrides(&mut config);
        assert_eq!(BackendKind::SdlRenderer, config.backend);
        assert_eq!(1280, config.back_buffer_width);
        assert_eq!(480, config.back_buffer_height);
        assert!(config.fullscreen);
        assert!(!config.allow_user_resizing);
    }
}
