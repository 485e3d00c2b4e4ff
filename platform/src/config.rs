// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DepthFormat, PresentInterval, PresentationParameters, WindowHandle};

/// Which [`DeviceBackend`](crate::DeviceBackend) a platform should create
/// graphics devices with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// OpenGL, through the platform's GL context.
    #[default]
    OpenGl,
    /// The platform's own 2D renderer. Only draws triangles.
    SdlRenderer,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opengl" | "gl" => Ok(BackendKind::OpenGl),
            "sdl-renderer" | "sdl_renderer" | "renderer" => Ok(BackendKind::SdlRenderer),
            _ => Err(format!(
                "unknown backend {s:?}, expected \"opengl\" or \"sdl-renderer\""
            )),
        }
    }
}

/// Startup configuration for platform implementations.
///
/// Missing fields deserialize to their defaults, so configuration files only
/// need to list what they change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    #[allow(missing_docs)]
    pub backend: BackendKind,
    /// Index of the display to create the graphics device on.
    pub adapter_index: usize,
    /// Initial back buffer (and window client area) width.
    pub back_buffer_width: u32,
    /// Initial back buffer (and window client area) height.
    pub back_buffer_height: u32,
    #[allow(missing_docs)]
    pub fullscreen: bool,
    /// Whether the user may resize the window.
    pub allow_user_resizing: bool,
    #[allow(missing_docs)]
    pub presentation_interval: PresentInterval,
    #[allow(missing_docs)]
    pub depth_stencil_format: DepthFormat,
    /// Request a core profile OpenGL context.
    pub gl_core_profile: bool,
    /// Fullscreen is a borderless window covering the display, instead of
    /// an exclusive video mode. Such windows are left alone on focus changes.
    pub desktop_space_fullscreen: bool,
    /// Never request adaptive vsync, even where it's supported.
    pub disable_late_swap_tear: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        PlatformConfig {
            backend: BackendKind::OpenGl,
            adapter_index: 0,
            back_buffer_width: 800,
            back_buffer_height: 480,
            fullscreen: false,
            allow_user_resizing: false,
            presentation_interval: PresentInterval::Default,
            depth_stencil_format: DepthFormat::Depth24Stencil8,
            gl_core_profile: false,
            desktop_space_fullscreen: true,
            disable_late_swap_tear: false,
        }
    }
}

impl PlatformConfig {
    /// The presentation parameters for the first graphics device created
    /// for `window`.
    pub fn presentation_parameters(&self, window: WindowHandle) -> PresentationParameters {
        let mut params =
            PresentationParameters::new(window, self.back_buffer_width, self.back_buffer_height);
        params.depth_stencil_format = self.depth_stencil_format;
        params.is_full_screen = self.fullscreen;
        params.presentation_interval = self.presentation_interval;
        params
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendKind, PlatformConfig};
    use crate::{PresentInterval, WindowHandle};

    #[test]
    fn partial_config_files_use_defaults() {
        let config: PlatformConfig = serde_json::from_str(
            r#"{ "backend": "sdl_renderer", "presentation_interval": "two" }"#,
        )
        .unwrap();
        assert_eq!(BackendKind::SdlRenderer, config.backend);
        assert_eq!(PresentInterval::Two, config.presentation_interval);
        assert_eq!(800, config.back_buffer_width);
        assert!(config.desktop_space_fullscreen);
    }

    #[test]
    fn presentation_parameters_follow_config() {
        let config = PlatformConfig {
            back_buffer_width: 1280,
            back_buffer_height: 720,
            fullscreen: true,
            ..Default::default()
        };
        let params = config.presentation_parameters(WindowHandle::new(3));
        assert_eq!(1280, params.back_buffer_width);
        assert_eq!(720, params.back_buffer_height);
        assert!(params.is_full_screen);
        assert_eq!(WindowHandle::new(3), params.device_window_handle);
    }

    #[test]
    fn backend_names() {
        assert_eq!(Ok(BackendKind::OpenGl), "opengl".parse());
        assert_eq!(Ok(BackendKind::SdlRenderer), "sdl-renderer".parse());
        assert!("vulkan".parse::<BackendKind>().is_err());
    }
}
